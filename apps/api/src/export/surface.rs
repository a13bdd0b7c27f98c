//! Rendered-surface capture for the PDF path.
//!
//! The PDF formatter never inspects UI internals. The platform layer hands it
//! something that can rasterize itself; tests hand it a fixed image.

use async_trait::async_trait;
use bytes::Bytes;
use image::{DynamicImage, ImageFormat};

use crate::export::error::ExportError;

/// A mounted visual representation of a resume that can be captured as pixels.
///
/// Rasterization reads live state, so callers must not run two captures
/// against the same surface at once.
#[async_trait]
pub trait RenderSurface: Send + Sync {
    async fn rasterize(&self) -> Result<DynamicImage, ExportError>;
}

/// A surface captured by the client and uploaded as a PNG screenshot.
pub struct SnapshotSurface {
    png: Bytes,
}

impl SnapshotSurface {
    pub fn from_png(png: Bytes) -> Self {
        Self { png }
    }
}

#[async_trait]
impl RenderSurface for SnapshotSurface {
    async fn rasterize(&self) -> Result<DynamicImage, ExportError> {
        let png = self.png.clone();
        tokio::task::spawn_blocking(move || {
            image::load_from_memory_with_format(&png, ImageFormat::Png)
                .map_err(|e| ExportError::Capture(format!("unreadable snapshot: {e}")))
        })
        .await
        .map_err(|e| ExportError::Capture(format!("snapshot decoder aborted: {e}")))?
    }
}
