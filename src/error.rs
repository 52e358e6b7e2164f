use std::time::Duration;

use crate::records::StudentId;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ODT package error: {0}")]
    Package(#[from] zip::result::ZipError),

    #[error("XML parse error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("invalid ODT: {0}")]
    InvalidOdt(String),

    #[error("render oracle failed: {0}")]
    Render(String),

    #[error("render oracle timed out after {0:?}")]
    RenderTimeout(Duration),

    #[error("unusable font {path}: {reason}")]
    Font { path: String, reason: String },

    #[error("cannot count pages of rendered PDF: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("malformed {kind} record {id}: {reason}")]
    MalformedRecord {
        kind: &'static str,
        id: u64,
        reason: String,
    },

    #[error("table row {row} has {found} cells, expected {expected}")]
    RaggedTable {
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("{found} column widths given for a table with {expected} columns")]
    ColumnWidths { found: usize, expected: usize },

    #[error("unknown student {0}")]
    UnknownStudent(StudentId),

    #[error("invalid dataset: {0}")]
    Dataset(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("cannot read logo: {0}")]
    Image(#[from] image::ImageError),
}
