//! Store REST surface. Every route is scoped to the caller named by the `x-user-id`
//! header, which the fronting auth gateway sets after authentication.

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts, Path, Query, State},
    http::{request::Parts, StatusCode},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use parley_core::domain::contract::{Contract, NewContract};
use parley_core::domain::negotiation::{
    Negotiation, NegotiationId, NegotiationMessage, NewNegotiation,
};
use parley_core::domain::profile::{Profile, UserId};
use parley_core::errors::ApplicationError;
use parley_db::repositories::RepositoryError;

use crate::error::{ApiError, JsonBody};
use crate::state::AppState;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const DASHBOARD_RECENT_LIMIT: u32 = 5;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/negotiations", get(list_negotiations).post(create_negotiation))
        .route("/api/v1/negotiations/{id}", get(get_negotiation))
        .route("/api/v1/negotiations/{id}/messages", get(list_messages))
        .route("/api/v1/contracts", get(list_contracts).post(save_contract))
        .route("/api/v1/profile", get(get_profile))
        .route("/api/v1/dashboard", get(dashboard))
}

/// Authenticated caller taken from the gateway-provided header.
pub struct Caller(pub UserId);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        caller_from_parts(parts).ok_or_else(Caller::missing)
    }
}

/// `Option<Caller>` for routes that also serve anonymous requests.
impl<S> OptionalFromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(caller_from_parts(parts))
    }
}

impl Caller {
    pub fn missing() -> ApiError {
        ApiError::unauthorized(format!("missing {USER_ID_HEADER} header"))
    }
}

fn caller_from_parts(parts: &Parts) -> Option<Caller> {
    let raw = parts.headers.get(USER_ID_HEADER).and_then(|value| value.to_str().ok())?;
    UserId::parse(raw).ok().map(Caller)
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub profile: Option<Profile>,
    pub recent_negotiations: Vec<Negotiation>,
}

fn correlation_id() -> String {
    Uuid::new_v4().simple().to_string()
}

fn store_error(error: RepositoryError, correlation_id: &str) -> ApiError {
    ApiError::from_application(ApplicationError::Persistence(error.to_string()), correlation_id)
}

pub async fn list_negotiations(
    State(state): State<AppState>,
    Caller(user_id): Caller,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Negotiation>>, ApiError> {
    let correlation_id = correlation_id();
    state
        .negotiations
        .list_for_user(&user_id, query.limit)
        .await
        .map(Json)
        .map_err(|error| store_error(error, &correlation_id))
}

pub async fn create_negotiation(
    State(state): State<AppState>,
    Caller(user_id): Caller,
    JsonBody(input): JsonBody<NewNegotiation>,
) -> Result<(StatusCode, Json<Negotiation>), ApiError> {
    let correlation_id = correlation_id();
    let negotiation = Negotiation::draft(user_id, input, Utc::now())
        .map_err(|error| ApiError::from_application(error.into(), &correlation_id))?;

    state
        .negotiations
        .create(negotiation.clone())
        .await
        .map_err(|error| store_error(error, &correlation_id))?;

    tracing::info!(
        event_name = "api.negotiation.created",
        correlation_id = %correlation_id,
        negotiation_id = %negotiation.id,
        "negotiation created"
    );
    Ok((StatusCode::CREATED, Json(negotiation)))
}

async fn owned_negotiation(
    state: &AppState,
    user_id: &UserId,
    id: &NegotiationId,
    correlation_id: &str,
) -> Result<Negotiation, ApiError> {
    state
        .negotiations
        .find_for_user(user_id, id)
        .await
        .map_err(|error| store_error(error, correlation_id))?
        .ok_or_else(|| {
            ApiError::from_application(
                ApplicationError::NotFound(format!("negotiation {id} not found")),
                correlation_id,
            )
        })
}

pub async fn get_negotiation(
    State(state): State<AppState>,
    Caller(user_id): Caller,
    Path(id): Path<String>,
) -> Result<Json<Negotiation>, ApiError> {
    let correlation_id = correlation_id();
    owned_negotiation(&state, &user_id, &NegotiationId(id), &correlation_id).await.map(Json)
}

pub async fn list_messages(
    State(state): State<AppState>,
    Caller(user_id): Caller,
    Path(id): Path<String>,
) -> Result<Json<Vec<NegotiationMessage>>, ApiError> {
    let correlation_id = correlation_id();
    let negotiation =
        owned_negotiation(&state, &user_id, &NegotiationId(id), &correlation_id).await?;
    state
        .messages
        .list_for_negotiation(&negotiation.id)
        .await
        .map(Json)
        .map_err(|error| store_error(error, &correlation_id))
}

pub async fn list_contracts(
    State(state): State<AppState>,
    Caller(user_id): Caller,
) -> Result<Json<Vec<Contract>>, ApiError> {
    let correlation_id = correlation_id();
    state
        .contracts
        .list_for_user(&user_id)
        .await
        .map(Json)
        .map_err(|error| store_error(error, &correlation_id))
}

pub async fn save_contract(
    State(state): State<AppState>,
    Caller(user_id): Caller,
    JsonBody(input): JsonBody<NewContract>,
) -> Result<(StatusCode, Json<Contract>), ApiError> {
    let correlation_id = correlation_id();
    let contract = state
        .drafter
        .save(&user_id, input, &correlation_id)
        .await
        .map_err(|error| ApiError::from_application(error, &correlation_id))?;
    Ok((StatusCode::CREATED, Json(contract)))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Caller(user_id): Caller,
) -> Result<Json<Profile>, ApiError> {
    let correlation_id = correlation_id();
    state
        .profiles
        .find_by_user(&user_id)
        .await
        .map_err(|error| store_error(error, &correlation_id))?
        .map(Json)
        .ok_or_else(|| {
            ApiError::from_application(
                ApplicationError::NotFound("profile not found".to_string()),
                &correlation_id,
            )
        })
}

pub async fn dashboard(
    State(state): State<AppState>,
    Caller(user_id): Caller,
) -> Result<Json<Dashboard>, ApiError> {
    let correlation_id = correlation_id();
    let profile = state
        .profiles
        .find_by_user(&user_id)
        .await
        .map_err(|error| store_error(error, &correlation_id))?;
    let recent_negotiations = state
        .negotiations
        .list_for_user(&user_id, Some(DASHBOARD_RECENT_LIMIT))
        .await
        .map_err(|error| store_error(error, &correlation_id))?;
    Ok(Json(Dashboard { profile, recent_negotiations }))
}
