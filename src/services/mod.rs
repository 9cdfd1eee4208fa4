pub mod aggregator;
pub mod report_assembler;
