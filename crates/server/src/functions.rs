//! Model-backed functions: `POST /functions/v1/<name>` with a JSON body.

use axum::{extract::State, routing::post, Json, Router};
use uuid::Uuid;

use parley_core::domain::analysis::{AnalysisRequest, ContractAnalysis};
use parley_core::domain::contract::{ContractDraftRequest, GeneratedContract};
use parley_core::domain::negotiation::{AssistantReply, AssistantRequest};

use crate::api::Caller;
use crate::error::{ApiError, JsonBody};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/functions/v1/ai-contract-generator", post(generate_contract))
        .route("/functions/v1/ai-negotiation-assistant", post(negotiation_assistant))
        .route("/functions/v1/ai-contract-analyzer", post(analyze_contract))
}

fn correlation_id() -> String {
    Uuid::new_v4().simple().to_string()
}

pub async fn generate_contract(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<ContractDraftRequest>,
) -> Result<Json<GeneratedContract>, ApiError> {
    let correlation_id = correlation_id();
    state
        .drafter
        .generate(request, &correlation_id)
        .await
        .map(Json)
        .map_err(|error| ApiError::from_application(error, &correlation_id))
}

/// Stateless advice needs no caller. Naming a `negotiationId` requires the `x-user-id`
/// header, and the negotiation must belong to that caller.
pub async fn negotiation_assistant(
    State(state): State<AppState>,
    caller: Option<Caller>,
    JsonBody(request): JsonBody<AssistantRequest>,
) -> Result<Json<AssistantReply>, ApiError> {
    let correlation_id = correlation_id();
    let caller = caller.map(|Caller(user_id)| user_id);
    if request.negotiation_id.is_some() && caller.is_none() {
        return Err(Caller::missing());
    }

    state
        .assistant
        .respond(caller.as_ref(), request, &correlation_id)
        .await
        .map(Json)
        .map_err(|error| ApiError::from_application(error, &correlation_id))
}

pub async fn analyze_contract(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<AnalysisRequest>,
) -> Result<Json<ContractAnalysis>, ApiError> {
    let correlation_id = correlation_id();
    state
        .analyzer
        .analyze(request, &correlation_id)
        .await
        .map(Json)
        .map_err(|error| ApiError::from_application(error, &correlation_id))
}
