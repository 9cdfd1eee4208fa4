pub mod body;
pub mod compose;
pub mod markup;
pub mod package;
pub mod styles;

pub use body::{Block, BlockKind, Body, ParagraphInfo};
pub use compose::{compose, heading_level, BodyPlan, ParagraphEdit};
