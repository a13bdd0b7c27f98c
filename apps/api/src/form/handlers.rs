use axum::Json;
use serde::{Deserialize, Serialize};

use crate::form::{reduce, FormAction, FormState};

#[derive(Debug, Deserialize)]
pub struct ReduceRequest {
    /// Omitted on the first edit; the server starts from a fresh form.
    #[serde(default)]
    pub state: Option<FormState>,
    pub action: FormAction,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReduceResponse {
    pub state: FormState,
    pub is_final_step: bool,
}

/// POST /api/v1/form/reduce
///
/// Applies one edit to the client's form state. Stateless: nothing is stored.
pub async fn handle_reduce(Json(req): Json<ReduceRequest>) -> Json<ReduceResponse> {
    let state = reduce(&req.state.unwrap_or_default(), req.action);
    let is_final_step = state.is_final_step();
    Json(ReduceResponse {
        state,
        is_final_step,
    })
}
