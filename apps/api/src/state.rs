use std::sync::Arc;

use crate::auth::AuthProvider;
use crate::export::ExportDispatcher;
use crate::resumes::store::ResumeStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ResumeStore>,
    pub auth: Arc<dyn AuthProvider>,
    /// One dispatcher per process; its `exporting` flag gates overlapping export requests.
    pub dispatcher: Arc<ExportDispatcher>,
}
