// Resume export: text, DOCX and snapshot PDF formatters plus the dispatcher
// that selects one, reports status and hands the result to delivery.

pub mod delivery;
pub mod dispatcher;
pub mod document;
pub mod docx;
pub mod error;
pub mod pdf;
pub mod surface;
pub mod text;

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

pub use delivery::{FileDelivery, LocalDirDelivery, S3Delivery};
pub use dispatcher::{ExportDispatcher, ExportOutcome, ExportStatus};
pub use pdf::PageGeometry;
pub use surface::{RenderSurface, SnapshotSurface};

/// The three externally selectable output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
    Docx,
    Txt,
}

impl ExportFormat {
    /// Fixed artifact filename; not configurable.
    pub fn filename(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "resume.pdf",
            ExportFormat::Docx => "resume.docx",
            ExportFormat::Txt => "resume.txt",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            ExportFormat::Txt => "text/plain; charset=utf-8",
        }
    }
}

impl fmt::Display for ExportFormat {
    /// Upper-case, as shown to users ("Failed to export as PDF").
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportFormat::Pdf => "PDF",
            ExportFormat::Docx => "DOCX",
            ExportFormat::Txt => "TXT",
        })
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pdf" => Ok(ExportFormat::Pdf),
            "docx" => Ok(ExportFormat::Docx),
            "txt" => Ok(ExportFormat::Txt),
            other => Err(format!("unsupported export format '{other}'")),
        }
    }
}

/// A fully buffered export result, ready for delivery.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub format: ExportFormat,
    pub filename: &'static str,
    pub content_type: &'static str,
    pub bytes: Bytes,
}

impl ExportArtifact {
    pub fn new(format: ExportFormat, bytes: Bytes) -> Self {
        Self {
            format,
            filename: format.filename(),
            content_type: format.content_type(),
            bytes,
        }
    }
}
