//! File delivery backends.
//!
//! Formatters buffer the whole artifact before delivery is called, so a
//! backend only ever sees complete files.

use std::io::Write;
use std::path::PathBuf;

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::export::error::ExportError;
use crate::export::ExportArtifact;

/// Where a delivered artifact ended up.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryReceipt {
    pub filename: String,
    pub location: String,
    pub size_bytes: usize,
}

/// The save/download step at the end of every export.
#[async_trait]
pub trait FileDelivery: Send + Sync {
    async fn deliver(&self, artifact: ExportArtifact) -> Result<DeliveryReceipt, ExportError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Local directory
// ────────────────────────────────────────────────────────────────────────────

/// Writes each artifact to `<dir>/<uuid>/<filename>`, mirroring the S3 key
/// layout, so exports never overwrite one another.
///
/// The file is written to a temp file in the same directory first and renamed
/// into place, so readers never observe a half-written export.
pub struct LocalDirDelivery {
    dir: PathBuf,
}

impl LocalDirDelivery {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl FileDelivery for LocalDirDelivery {
    async fn deliver(&self, artifact: ExportArtifact) -> Result<DeliveryReceipt, ExportError> {
        let export_dir = self.dir.join(Uuid::new_v4().to_string());
        let size_bytes = artifact.bytes.len();
        let filename = artifact.filename;

        let target = tokio::task::spawn_blocking(move || -> std::io::Result<PathBuf> {
            std::fs::create_dir_all(&export_dir)?;
            let mut tmp = tempfile::NamedTempFile::new_in(&export_dir)?;
            tmp.write_all(&artifact.bytes)?;
            tmp.as_file().sync_all()?;
            let target = export_dir.join(artifact.filename);
            tmp.persist(&target).map_err(|e| e.error)?;
            Ok(target)
        })
        .await
        .map_err(|e| ExportError::Delivery(format!("writer task aborted: {e}")))?
        .map_err(|e| ExportError::Delivery(e.to_string()))?;

        info!("Delivered {} to {}", filename, target.display());

        Ok(DeliveryReceipt {
            filename: filename.to_string(),
            location: target.display().to_string(),
            size_bytes,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// S3 / MinIO
// ────────────────────────────────────────────────────────────────────────────

/// Uploads artifacts to `exports/<uuid>/<filename>` in a bucket.
pub struct S3Delivery {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Delivery {
    pub fn new(client: aws_sdk_s3::Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl FileDelivery for S3Delivery {
    async fn deliver(&self, artifact: ExportArtifact) -> Result<DeliveryReceipt, ExportError> {
        let key = format!("exports/{}/{}", Uuid::new_v4(), artifact.filename);
        let size_bytes = artifact.bytes.len();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(artifact.bytes))
            .content_type(artifact.content_type)
            .content_disposition(format!("attachment; filename=\"{}\"", artifact.filename))
            .send()
            .await
            .map_err(|e| ExportError::Delivery(format!("S3 upload failed: {e}")))?;

        info!("Uploaded {} to s3://{}/{}", artifact.filename, self.bucket, key);

        Ok(DeliveryReceipt {
            filename: artifact.filename.to_string(),
            location: format!("s3://{}/{}", self.bucket, key),
            size_bytes,
        })
    }
}
