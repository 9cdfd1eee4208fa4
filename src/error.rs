//! Error type shared by the statement reader, the docx layer and the pipeline.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Could not open spreadsheet: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    #[error("Invalid docx package: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for ReportError {
    fn from(e: serde_json::Error) -> Self {
        ReportError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
