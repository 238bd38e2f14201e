use std::path::PathBuf;
use thiserror::Error;

pub type BridgeResult<T> = Result<T, BridgeError>;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Unsupported file format '{0}'. Must be .twb or .twbx")]
    UnsupportedFormat(String),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("No .twb workbook entry found in archive {}", .0.display())]
    MissingWorkbookEntry(PathBuf),

    #[error("Workbook is not valid UTF-8: {0}")]
    Encoding(String),

    #[error("XML parsing error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("Formula pattern error: {0}")]
    Pattern(#[from] regex::Error),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
