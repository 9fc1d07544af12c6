use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, State};
use axum::http::Uri;
use axum::response::{IntoResponse, Response};

use crate::error::AppError;
use crate::state::AppState;

/// Envelope and underlying error text of a 5xx reply, carried as a response
/// extension until [`attach_error_details`] decides whether to show it.
#[derive(Debug, Clone)]
pub struct ErrorDetail {
    body: serde_json::Value,
    detail: String,
}

/// Response layer that writes the underlying error text into 5xx replies.
/// Only active when `AppState::expose_error_details` is set (development).
pub async fn attach_error_details(
    State(state): State<AppState>,
    mut response: Response,
) -> Response {
    if !state.expose_error_details {
        return response;
    }
    match response.extensions_mut().remove::<ErrorDetail>() {
        Some(ErrorDetail { mut body, detail }) => {
            body["detail"] = serde_json::Value::String(detail);
            (response.status(), axum::Json(body)).into_response()
        }
        None => response,
    }
}

/// API-specific error wrapper that converts AppError into HTTP responses.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
            let body = serde_json::json!({
                "message": "An internal error occurred while processing your request",
                "statusCode": status.as_u16(),
                "code": code,
            });
            let mut response = (status, axum::Json(body.clone())).into_response();
            response.extensions_mut().insert(ErrorDetail {
                body,
                detail: self.to_string(),
            });
            return response;
        }

        let body = serde_json::json!({
            "message": self.to_string(),
            "statusCode": status.as_u16(),
            "code": code,
        });
        (status, axum::Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// JSON body extractor whose rejection uses the API error envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Fallback handler for unknown routes.
pub async fn route_not_found(uri: Uri) -> AppError {
    AppError::RouteNotFound(uri.path().to_string())
}
