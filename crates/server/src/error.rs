use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, warn};

use parley_core::errors::{ApplicationError, InterfaceError};

/// Error body shared by every endpoint: `{"error": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    correlation_id: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
            correlation_id: "unassigned".to_string(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: message.into(),
            correlation_id: "unassigned".to_string(),
        }
    }

    pub fn from_application(error: ApplicationError, correlation_id: &str) -> Self {
        error.into_interface(correlation_id).into()
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<InterfaceError> for ApiError {
    fn from(value: InterfaceError) -> Self {
        let status = match &value {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            InterfaceError::NotFound { .. } => StatusCode::NOT_FOUND,
            InterfaceError::UpstreamFailure { .. } => StatusCode::BAD_GATEWAY,
            InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        // Store and internal details stay in the logs.
        let message = match &value {
            InterfaceError::Internal { .. } | InterfaceError::ServiceUnavailable { .. } => {
                error!(
                    event_name = "http.request.detail",
                    correlation_id = %value.correlation_id(),
                    detail = %value.message(),
                    "failure detail withheld from caller"
                );
                value.user_message().to_string()
            }
            _ => value.message().to_string(),
        };
        Self { status, message, correlation_id: value.correlation_id().to_string() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(
                event_name = "http.request.failed",
                correlation_id = %self.correlation_id,
                status = self.status.as_u16(),
                error = %self.message,
                "request failed"
            );
        } else {
            warn!(
                event_name = "http.request.rejected",
                correlation_id = %self.correlation_id,
                status = self.status.as_u16(),
                error = %self.message,
                "request rejected"
            );
        }
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

/// JSON body extractor whose rejection is a 400 `{error}` body instead of axum's plain text.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(request, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::bad_request(rejection.body_text())),
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use parley_core::errors::{ApplicationError, DomainError};

    use super::ApiError;

    #[test]
    fn application_errors_map_to_http_statuses() {
        let cases = [
            (
                ApplicationError::Domain(DomainError::validation("title", "Title required")),
                StatusCode::BAD_REQUEST,
                "Title required",
            ),
            (
                ApplicationError::Integration("status 500".to_string()),
                StatusCode::BAD_GATEWAY,
                "status 500",
            ),
            (
                ApplicationError::NotFound("negotiation n-1".to_string()),
                StatusCode::NOT_FOUND,
                "negotiation n-1",
            ),
        ];

        for (error, status, message) in cases {
            let mapped = ApiError::from_application(error, "req-1");
            assert_eq!(mapped.status(), status);
            assert_eq!(mapped.message(), message);
        }
    }

    #[test]
    fn internal_details_are_not_exposed() {
        let mapped = ApiError::from_application(
            ApplicationError::Configuration("template syntax error at line 3".to_string()),
            "req-1",
        );

        assert_eq!(mapped.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!mapped.message().contains("template"));
    }

    #[test]
    fn store_failures_hide_database_text() {
        let mapped = ApiError::from_application(
            ApplicationError::Persistence(
                "database error: (code: 787) FOREIGN KEY constraint failed".to_string(),
            ),
            "req-1",
        );

        assert_eq!(mapped.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            mapped.message(),
            "The service is temporarily unavailable. Please retry shortly."
        );
        assert!(!mapped.message().contains("FOREIGN KEY"));
    }
}
