//! # Error Handling
//!
//! Handlers return [`ApiError`], rendered as `application/problem+json` with the
//! request's trace id. Lower-level errors convert into it here.

use axum::{
    extract::rejection::JsonRejection,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::catalog::CatalogError;
use crate::connectors::ConnectorError;
use crate::telemetry;
use crate::token_issuer::TokenIssuerError;

/// Unified API error response structure
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApiError {
    /// HTTP status code for the response
    #[serde(skip_serializing, skip_deserializing)]
    pub status: StatusCode,
    /// Error code for programmatic handling
    pub code: Box<str>,
    /// Human-readable error message
    pub message: Box<str>,
    /// Additional error details (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Box<serde_json::Value>>,
    /// Correlation trace ID for debugging (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<Box<str>>,
}

impl ApiError {
    /// Create a new API error with the given status code and message
    pub fn new<S: Into<String>>(status: StatusCode, code: S, message: S) -> Self {
        Self {
            status,
            code: code.into().into_boxed_str(),
            message: message.into().into_boxed_str(),
            details: None,
            trace_id: Self::current_trace_id(),
        }
    }

    /// Add details to the error
    pub fn with_details<V: Into<serde_json::Value>>(mut self, details: V) -> Self {
        self.details = Some(Box::new(details.into()));
        self
    }

    /// Extract current trace ID from the active tracing span (falls back to generated correlation ID)
    fn current_trace_id() -> Option<Box<str>> {
        telemetry::current_trace_id()
            .map(|trace_id| trace_id.into_boxed_str())
            .or_else(|| {
                // Fallback: generate a correlation ID for basic client-server log correlation
                Some(format!("corr-{}", &uuid::Uuid::new_v4().to_string()[..8]).into_boxed_str())
            })
    }
}

fn is_unique_violation(error: &sea_orm::DbErr) -> bool {
    use sea_orm::RuntimeErr;

    const PG_UNIQUE: &str = "23505";
    const SQLITE_DUPLICATE_CODES: &[&str] = &["1555", "2067"];

    let runtime_err = match error {
        sea_orm::DbErr::Query(RuntimeErr::SqlxError(sqlx_err))
        | sea_orm::DbErr::Exec(RuntimeErr::SqlxError(sqlx_err)) => sqlx_err,
        _ => return false,
    };

    let Some(db_error) = runtime_err.as_database_error() else {
        return false;
    };

    db_error.is_unique_violation()
        || db_error
            .code()
            .is_some_and(|code| code == PG_UNIQUE || SQLITE_DUPLICATE_CODES.contains(&code.as_ref()))
}

/// Upstream provider error information
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProviderError {
    /// Provider identifier ("paragon", "integration-app" or "merge")
    pub provider: String,
    /// HTTP status code from upstream, absent for network failures
    pub status: Option<u16>,
    /// Upstream response body, JSON when the provider sent JSON
    #[schema(value_type = Object)]
    pub body: serde_json::Value,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();
        headers.insert(
            "content-type",
            HeaderValue::from_static("application/problem+json"),
        );

        (self.status, headers, axum::Json(self)).into_response()
    }
}

// Error mappers for common sources

impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        // Log the full error for debugging
        tracing::error!("Internal error: {:?}", error);

        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_SERVER_ERROR",
            "An internal error occurred",
        )
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let message = match rejection {
            JsonRejection::JsonDataError(err) => format!("Invalid JSON: {}", err),
            JsonRejection::JsonSyntaxError(err) => format!("JSON syntax error: {}", err),
            JsonRejection::MissingJsonContentType(_) => {
                "Missing 'Content-Type: application/json' header".to_string()
            }
            _ => "Invalid request body".to_string(),
        };

        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", &message)
    }
}

impl From<sea_orm::DbErr> for ApiError {
    fn from(error: sea_orm::DbErr) -> Self {
        if is_unique_violation(&error) {
            tracing::debug!(?error, "Unique constraint violation detected");
            return Self::new(StatusCode::CONFLICT, "CONFLICT", "Resource already exists");
        }

        match error {
            sea_orm::DbErr::RecordNotFound(record) => Self::new(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                &format!("Record not found: {}", record),
            ),
            sea_orm::DbErr::Query(query_err) => {
                tracing::error!("Database query error: {:?}", query_err);
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_SERVER_ERROR",
                    "Database error occurred",
                )
            }
            sea_orm::DbErr::Exec(exec_err) => {
                tracing::error!("Database execution error: {:?}", exec_err);
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_SERVER_ERROR",
                    "Database error occurred",
                )
            }
            sea_orm::DbErr::Conn(connection_err) => {
                tracing::error!("Database connection error: {:?}", connection_err);
                Self::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SERVICE_UNAVAILABLE",
                    "Database service unavailable",
                )
            }
            _ => {
                tracing::error!("Database error: {:?}", error);
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_SERVER_ERROR",
                    "Database error occurred",
                )
            }
        }
    }
}

impl From<ConnectorError> for ApiError {
    fn from(error: ConnectorError) -> Self {
        match error {
            ConnectorError::NotConfigured { provider, setting } => {
                not_configured(provider, setting)
            }
            ConnectorError::Upstream {
                provider,
                status,
                body,
            } => provider_error(provider, Some(status), body),
            ConnectorError::Network { provider, source } => {
                tracing::warn!(provider, error = %source, "provider request failed");
                provider_error(provider, None, json!(source.to_string()))
            }
            ConnectorError::InvalidResponse { provider, message } => {
                tracing::warn!(provider, %message, "provider response unreadable");
                provider_error(provider, None, json!(message))
            }
        }
    }
}

impl From<TokenIssuerError> for ApiError {
    fn from(error: TokenIssuerError) -> Self {
        match error {
            TokenIssuerError::NotConfigured { provider, setting } => {
                not_configured(provider, setting)
            }
            other => {
                tracing::error!(error = %other, "token signing failed");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_SERVER_ERROR",
                    "Failed to issue provider token",
                )
            }
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(error: CatalogError) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_FAILED".to_string(),
            error.to_string(),
        )
    }
}

/// Create a provider upstream error (always 502)
pub fn provider_error(provider: &str, status: Option<u16>, body: serde_json::Value) -> ApiError {
    let message = match status {
        Some(status) => format!("Provider {} returned error status {}", provider, status),
        None => format!("Provider {} request failed", provider),
    };
    let details = ProviderError {
        provider: provider.to_string(),
        status,
        body,
    };

    ApiError::new(StatusCode::BAD_GATEWAY, "PROVIDER_ERROR".to_string(), message)
        .with_details(json!(details))
}

/// A provider whose credentials are not configured on this deployment (503)
pub fn not_configured(provider: &str, setting: &str) -> ApiError {
    ApiError::new(
        StatusCode::SERVICE_UNAVAILABLE,
        "SERVICE_UNAVAILABLE".to_string(),
        format!("{} is not configured", provider),
    )
    .with_details(json!({ "provider": provider, "missing": setting }))
}

/// The user's profile lacks a credential the operation needs (400)
pub fn credential_missing(message: &str) -> ApiError {
    ApiError::new(StatusCode::BAD_REQUEST, "CREDENTIAL_MISSING", message)
}

/// Create an unauthorized error (401)
pub fn unauthorized(message: Option<&str>) -> ApiError {
    let msg = message.unwrap_or("Authentication required");
    ApiError::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg)
}

/// Create a validation error with field details
pub fn validation_error(message: &str, field_errors: serde_json::Value) -> ApiError {
    ApiError::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", message).with_details(field_errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde_json::json;

    #[test]
    fn new_error_carries_code_and_trace_id() {
        let error = ApiError::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", "bad input");

        assert_eq!(error.code, Box::from("VALIDATION_FAILED"));
        assert_eq!(error.message, Box::from("bad input"));
        assert!(error.details.is_none());
        assert!(error.trace_id.as_deref().is_some_and(|t| t.starts_with("corr-")));
    }

    #[test]
    fn problem_json_content_type() {
        let response =
            ApiError::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", "bad input").into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/problem+json"
        );
        assert!(response.headers().get("retry-after").is_none());
    }

    #[test]
    fn upstream_connector_error_maps_to_502_with_body() {
        let error: ApiError = ConnectorError::Upstream {
            provider: "paragon",
            status: 401,
            body: json!({"message": "Unauthorized"}),
        }
        .into();

        assert_eq!(error.status, StatusCode::BAD_GATEWAY);
        assert_eq!(error.code, Box::from("PROVIDER_ERROR"));
        let details = error.details.unwrap();
        assert_eq!(details["provider"], "paragon");
        assert_eq!(details["status"], 401);
        assert_eq!(details["body"]["message"], "Unauthorized");
    }

    #[test]
    fn invalid_response_maps_to_502_without_status() {
        let error: ApiError = ConnectorError::InvalidResponse {
            provider: "merge",
            message: "missing 'link_token' in response".to_string(),
        }
        .into();

        assert_eq!(error.status, StatusCode::BAD_GATEWAY);
        assert!(error.details.unwrap()["status"].is_null());
    }

    #[test]
    fn unconfigured_provider_maps_to_503() {
        let error: ApiError = TokenIssuerError::NotConfigured {
            provider: "integration-app",
            setting: "workspace secret",
        }
        .into();

        assert_eq!(error.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(error.code, Box::from("SERVICE_UNAVAILABLE"));
        assert_eq!(error.details.unwrap()["missing"], "workspace secret");
    }

    #[test]
    fn unknown_slug_maps_to_validation_failure() {
        let error: ApiError = CatalogError::UnknownService("zapier".to_string()).into();
        assert_eq!(error.status, StatusCode::BAD_REQUEST);
        assert_eq!(error.code, Box::from("VALIDATION_FAILED"));
        assert!(error.message.contains("zapier"));
    }

    #[test]
    fn credential_missing_is_400() {
        let error = credential_missing("No Paragon token found");
        assert_eq!(error.status, StatusCode::BAD_REQUEST);
        assert_eq!(error.code, Box::from("CREDENTIAL_MISSING"));
    }

    #[test]
    fn anyhow_errors_are_opaque() {
        let error: ApiError = anyhow::anyhow!("db exploded with secret detail").into();
        assert_eq!(error.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.message, Box::from("An internal error occurred"));
    }

    #[test]
    fn record_not_found_maps_to_404() {
        let error: ApiError = sea_orm::DbErr::RecordNotFound("profile".to_string()).into();
        assert_eq!(error.status, StatusCode::NOT_FOUND);
        assert!(error.message.contains("profile"));
    }
}
