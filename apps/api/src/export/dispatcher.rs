//! Export dispatcher: the single entry point for exporting a resume.
//!
//! Picks the formatter for the requested format, delivers the finished
//! artifact, and turns every failure into one user-facing message. Each
//! resume has its own `exporting` flag so callers can disable export controls
//! while a run is in flight. A second export of the same resume is refused,
//! not queued; exports of different resumes run independently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::export::delivery::{DeliveryReceipt, FileDelivery};
use crate::export::document::format_as_document;
use crate::export::error::ExportError;
use crate::export::pdf::{format_as_pdf, PageGeometry};
use crate::export::surface::RenderSurface;
use crate::export::text::format_as_text;
use crate::export::{ExportArtifact, ExportFormat};
use crate::models::resume::Resume;

/// Observable per-resume dispatcher state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExportStatus {
    pub exporting: bool,
    /// User-facing message from the most recent failed export, cleared on the next start.
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ExportOutcome {
    /// Preconditions not met (no resume, or PDF without a surface). Nothing ran.
    Skipped,
    /// Another export of the same resume is still running. Nothing ran.
    Busy,
    Delivered(DeliveryReceipt),
    Failed { message: String },
}

pub struct ExportDispatcher {
    delivery: Arc<dyn FileDelivery>,
    geometry: PageGeometry,
    /// Only resumes that are exporting or whose last export failed have an entry.
    statuses: Mutex<HashMap<Uuid, ExportStatus>>,
}

/// Releases the claim on every exit path, including panics and early returns.
struct ExportingGuard<'a> {
    dispatcher: &'a ExportDispatcher,
    key: Uuid,
}

impl Drop for ExportingGuard<'_> {
    fn drop(&mut self) {
        let mut statuses = self.dispatcher.statuses();
        if let Some(status) = statuses.get_mut(&self.key) {
            status.exporting = false;
            if status.last_error.is_none() {
                statuses.remove(&self.key);
            }
        }
    }
}

impl ExportDispatcher {
    pub fn new(delivery: Arc<dyn FileDelivery>, geometry: PageGeometry) -> Self {
        Self {
            delivery,
            geometry,
            statuses: Mutex::new(HashMap::new()),
        }
    }

    // The map is only touched in short non-panicking sections, so a poisoned
    // lock still holds consistent data.
    fn statuses(&self) -> MutexGuard<'_, HashMap<Uuid, ExportStatus>> {
        self.statuses.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn status(&self, key: Uuid) -> ExportStatus {
        self.statuses().get(&key).cloned().unwrap_or_default()
    }

    /// Marks `key` as exporting unless it already is. Check and set happen
    /// under one lock, so of two overlapping callers exactly one wins.
    fn try_claim(&self, key: Uuid) -> Option<ExportingGuard<'_>> {
        let mut statuses = self.statuses();
        let status = statuses.entry(key).or_default();
        if status.exporting {
            return None;
        }
        status.exporting = true;
        status.last_error = None;
        Some(ExportingGuard {
            dispatcher: self,
            key,
        })
    }

    /// Exports `resume` (identified by `key`) as `format` and delivers the result.
    ///
    /// A missing resume, or a missing surface for PDF, is a silent no-op.
    /// Failures are logged and reported as `Failed to export as <FORMAT>`.
    pub async fn export(
        &self,
        key: Uuid,
        resume: Option<&Resume>,
        surface: Option<&dyn RenderSurface>,
        format: ExportFormat,
    ) -> ExportOutcome {
        let Some(resume) = resume else {
            debug!("Export {format} skipped: no resume loaded");
            return ExportOutcome::Skipped;
        };
        if format == ExportFormat::Pdf && surface.is_none() {
            debug!("Export {format} skipped: no rendered surface");
            return ExportOutcome::Skipped;
        }

        let Some(_guard) = self.try_claim(key) else {
            debug!("Export {format} of {key} refused: already exporting");
            return ExportOutcome::Busy;
        };

        match self.run(resume, surface, format).await {
            Ok(receipt) => {
                info!(
                    "Exported {} ({} bytes) to {}",
                    receipt.filename, receipt.size_bytes, receipt.location
                );
                ExportOutcome::Delivered(receipt)
            }
            Err(e) => {
                error!("Export {format} of {key} failed: {e}");
                let message = format!("Failed to export as {format}");
                if let Some(status) = self.statuses().get_mut(&key) {
                    status.last_error = Some(message.clone());
                }
                ExportOutcome::Failed { message }
            }
        }
    }

    async fn run(
        &self,
        resume: &Resume,
        surface: Option<&dyn RenderSurface>,
        format: ExportFormat,
    ) -> Result<DeliveryReceipt, ExportError> {
        let artifact = match format {
            ExportFormat::Txt => {
                ExportArtifact::new(ExportFormat::Txt, Bytes::from(format_as_text(resume)))
            }
            ExportFormat::Docx => format_as_document(resume).await?,
            ExportFormat::Pdf => {
                let surface = surface
                    .ok_or_else(|| ExportError::Capture("no rendered surface".to_string()))?;
                format_as_pdf(surface, &self.geometry).await?
            }
        };
        debug!(
            "Encoded {} artifact ({} bytes)",
            artifact.format,
            artifact.bytes.len()
        );
        self.delivery.deliver(artifact).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use image::{DynamicImage, Rgb, RgbImage};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    use crate::models::resume::PersonalInfo;

    #[derive(Default)]
    struct RecordingDelivery {
        delivered: Mutex<Vec<ExportArtifact>>,
    }

    #[async_trait]
    impl FileDelivery for RecordingDelivery {
        async fn deliver(&self, artifact: ExportArtifact) -> Result<DeliveryReceipt, ExportError> {
            let receipt = DeliveryReceipt {
                filename: artifact.filename.to_string(),
                location: format!("memory://{}", artifact.filename),
                size_bytes: artifact.bytes.len(),
            };
            self.delivered.lock().unwrap().push(artifact);
            Ok(receipt)
        }
    }

    /// Holds the first delivery until `gate` is notified; later deliveries pass straight through.
    #[derive(Default)]
    struct GatedDelivery {
        gate: Notify,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl FileDelivery for GatedDelivery {
        async fn deliver(&self, artifact: ExportArtifact) -> Result<DeliveryReceipt, ExportError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                self.gate.notified().await;
            }
            Ok(DeliveryReceipt {
                filename: artifact.filename.to_string(),
                location: format!("memory://{}", artifact.filename),
                size_bytes: artifact.bytes.len(),
            })
        }
    }

    struct FailingDelivery;

    #[async_trait]
    impl FileDelivery for FailingDelivery {
        async fn deliver(&self, _artifact: ExportArtifact) -> Result<DeliveryReceipt, ExportError> {
            Err(ExportError::Delivery("disk full".to_string()))
        }
    }

    struct FixedSurface;

    #[async_trait]
    impl RenderSurface for FixedSurface {
        async fn rasterize(&self) -> Result<DynamicImage, ExportError> {
            Ok(DynamicImage::ImageRgb8(RgbImage::from_pixel(
                120,
                240,
                Rgb([0, 0, 0]),
            )))
        }
    }

    struct UnmountedSurface;

    #[async_trait]
    impl RenderSurface for UnmountedSurface {
        async fn rasterize(&self) -> Result<DynamicImage, ExportError> {
            Err(ExportError::Capture("surface not mounted".to_string()))
        }
    }

    fn resume() -> Resume {
        Resume {
            personal_info: PersonalInfo {
                full_name: "Jane Roe".to_string(),
                email: "jane@x.com".to_string(),
                phone: "555-0100".to_string(),
                location: "Austin, TX".to_string(),
            },
            skills: vec!["Go".to_string(), "Rust".to_string()],
            ..Default::default()
        }
    }

    fn dispatcher_with(delivery: Arc<RecordingDelivery>) -> ExportDispatcher {
        ExportDispatcher::new(delivery, PageGeometry::A4)
    }

    /// Starts a txt export of `key` on a spawned task and waits until it holds the claim.
    async fn start_gated_export(
        dispatcher: &Arc<ExportDispatcher>,
        key: Uuid,
    ) -> tokio::task::JoinHandle<ExportOutcome> {
        let task = {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move {
                dispatcher
                    .export(key, Some(&resume()), None, ExportFormat::Txt)
                    .await
            })
        };
        while !dispatcher.status(key).exporting {
            tokio::task::yield_now().await;
        }
        task
    }

    #[tokio::test]
    async fn test_pdf_without_surface_is_noop() {
        let delivery = Arc::new(RecordingDelivery::default());
        let dispatcher = dispatcher_with(delivery.clone());
        let key = Uuid::new_v4();

        let outcome = dispatcher
            .export(key, Some(&resume()), None, ExportFormat::Pdf)
            .await;

        assert_eq!(outcome, ExportOutcome::Skipped);
        assert!(delivery.delivered.lock().unwrap().is_empty());
        assert_eq!(dispatcher.status(key), ExportStatus::default());
    }

    #[tokio::test]
    async fn test_missing_resume_is_noop() {
        let delivery = Arc::new(RecordingDelivery::default());
        let dispatcher = dispatcher_with(delivery.clone());

        for format in [ExportFormat::Txt, ExportFormat::Docx, ExportFormat::Pdf] {
            let outcome = dispatcher
                .export(Uuid::new_v4(), None, Some(&FixedSurface), format)
                .await;
            assert_eq!(outcome, ExportOutcome::Skipped);
        }
        assert!(delivery.delivered.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_txt_export_delivers_text() {
        let delivery = Arc::new(RecordingDelivery::default());
        let dispatcher = dispatcher_with(delivery.clone());

        let outcome = dispatcher
            .export(Uuid::new_v4(), Some(&resume()), None, ExportFormat::Txt)
            .await;

        let receipt = match outcome {
            ExportOutcome::Delivered(receipt) => receipt,
            other => panic!("expected delivery, got {other:?}"),
        };
        assert_eq!(receipt.filename, "resume.txt");
        let delivered = delivery.delivered.lock().unwrap();
        assert_eq!(delivered[0].format, ExportFormat::Txt);
        let text = std::str::from_utf8(&delivered[0].bytes).unwrap();
        assert!(text.starts_with("Jane Roe\njane@x.com | 555-0100 | Austin, TX\n"));
    }

    #[tokio::test]
    async fn test_each_format_uses_its_formatter() {
        let delivery = Arc::new(RecordingDelivery::default());
        let dispatcher = dispatcher_with(delivery.clone());
        let resume = resume();
        let key = Uuid::new_v4();

        for format in [ExportFormat::Pdf, ExportFormat::Docx, ExportFormat::Txt] {
            let outcome = dispatcher
                .export(key, Some(&resume), Some(&FixedSurface), format)
                .await;
            assert!(matches!(outcome, ExportOutcome::Delivered(_)));
        }

        let delivered = delivery.delivered.lock().unwrap();
        let names: Vec<&str> = delivered.iter().map(|a| a.filename).collect();
        assert_eq!(names, vec!["resume.pdf", "resume.docx", "resume.txt"]);
        assert!(delivered[0].bytes.starts_with(b"%PDF"));
        assert!(delivered[1].bytes.starts_with(b"PK"));
    }

    #[tokio::test]
    async fn test_capture_failure_reports_user_message() {
        let delivery = Arc::new(RecordingDelivery::default());
        let dispatcher = dispatcher_with(delivery.clone());
        let key = Uuid::new_v4();

        let outcome = dispatcher
            .export(key, Some(&resume()), Some(&UnmountedSurface), ExportFormat::Pdf)
            .await;

        assert_eq!(
            outcome,
            ExportOutcome::Failed {
                message: "Failed to export as PDF".to_string()
            }
        );
        assert!(delivery.delivered.lock().unwrap().is_empty());
        let status = dispatcher.status(key);
        assert!(!status.exporting);
        assert_eq!(status.last_error.as_deref(), Some("Failed to export as PDF"));
    }

    #[tokio::test]
    async fn test_delivery_failure_resets_exporting() {
        let dispatcher = ExportDispatcher::new(Arc::new(FailingDelivery), PageGeometry::A4);
        let key = Uuid::new_v4();

        let outcome = dispatcher
            .export(key, Some(&resume()), None, ExportFormat::Docx)
            .await;

        assert_eq!(
            outcome,
            ExportOutcome::Failed {
                message: "Failed to export as DOCX".to_string()
            }
        );
        assert!(!dispatcher.status(key).exporting);
    }

    #[tokio::test]
    async fn test_second_export_of_same_resume_is_busy() {
        let delivery = Arc::new(GatedDelivery::default());
        let dispatcher = Arc::new(ExportDispatcher::new(delivery.clone(), PageGeometry::A4));
        let key = Uuid::new_v4();

        let first = start_gated_export(&dispatcher, key).await;

        let second = dispatcher
            .export(key, Some(&resume()), None, ExportFormat::Docx)
            .await;
        assert_eq!(second, ExportOutcome::Busy);
        assert!(dispatcher.status(key).exporting);

        delivery.gate.notify_one();
        assert!(matches!(first.await.unwrap(), ExportOutcome::Delivered(_)));
        assert!(!dispatcher.status(key).exporting);
        assert_eq!(delivery.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_different_resumes_export_independently() {
        let delivery = Arc::new(GatedDelivery::default());
        let dispatcher = Arc::new(ExportDispatcher::new(delivery.clone(), PageGeometry::A4));
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        let first = start_gated_export(&dispatcher, a).await;

        let other = dispatcher
            .export(b, Some(&resume()), None, ExportFormat::Txt)
            .await;
        assert!(matches!(other, ExportOutcome::Delivered(_)));
        assert!(dispatcher.status(a).exporting);
        assert_eq!(dispatcher.status(b), ExportStatus::default());

        delivery.gate.notify_one();
        assert!(matches!(first.await.unwrap(), ExportOutcome::Delivered(_)));
    }

    #[tokio::test]
    async fn test_failure_is_scoped_to_its_resume() {
        let delivery = Arc::new(RecordingDelivery::default());
        let dispatcher = dispatcher_with(delivery);
        let (failed, other) = (Uuid::new_v4(), Uuid::new_v4());

        dispatcher
            .export(failed, Some(&resume()), Some(&UnmountedSurface), ExportFormat::Pdf)
            .await;

        assert!(dispatcher.status(failed).last_error.is_some());
        assert_eq!(dispatcher.status(other), ExportStatus::default());
    }

    #[tokio::test]
    async fn test_success_clears_previous_error() {
        let delivery = Arc::new(RecordingDelivery::default());
        let dispatcher = dispatcher_with(delivery.clone());
        let key = Uuid::new_v4();

        dispatcher
            .export(key, Some(&resume()), Some(&UnmountedSurface), ExportFormat::Pdf)
            .await;
        dispatcher
            .export(key, Some(&resume()), None, ExportFormat::Txt)
            .await;

        assert_eq!(dispatcher.status(key), ExportStatus::default());
        assert!(dispatcher.statuses().is_empty());
    }
}
