use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Success envelope: `{ "status": "success", "data": ... }`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: &'static str,
    pub data: T,
}

/// A successful reply carrying its HTTP status.
#[derive(Debug)]
pub struct ApiSuccess<T>(pub StatusCode, pub T);

impl<T: Serialize> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        let ApiSuccess(status, data) = self;
        (
            status,
            axum::Json(ApiResponse {
                status: "success",
                data,
            }),
        )
            .into_response()
    }
}

pub fn ok<T: Serialize>(data: T) -> ApiSuccess<T> {
    ApiSuccess(StatusCode::OK, data)
}

pub fn created<T: Serialize>(data: T) -> ApiSuccess<T> {
    ApiSuccess(StatusCode::CREATED, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let envelope = ApiResponse {
            status: "success",
            data: serde_json::json!({ "token": "abc" }),
        };
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["data"]["token"], "abc");
    }
}
