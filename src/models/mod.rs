pub mod verification_table;

pub use verification_table::*;
