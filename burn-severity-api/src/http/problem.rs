//! RFC 9457 Problem Details
//!
//! Les erreurs serveur ne renvoient jamais leur cause : elle est seulement
//! journalisée.

use axum::{
    extract::rejection::JsonRejection,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::error::ApiError;
use crate::store::StoreError;

/// Type de problème : requête invalide
pub const PROBLEM_INVALID_REQUEST: &str = "/problems/invalid-request";
/// Type de problème : ressource absente
pub const PROBLEM_NOT_FOUND: &str = "/problems/not-found";
/// Type de problème : FIRE_NUMBER déjà enregistré
pub const PROBLEM_DUPLICATE: &str = "/problems/duplicate-fire-number";
/// Type de problème : erreur interne
pub const PROBLEM_INTERNAL_ERROR: &str = "/problems/internal-error";

/// Corps `application/problem+json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub type_uri: String,
    pub title: String,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ProblemDetails {
    pub fn new(type_uri: &str, title: &str, status: StatusCode) -> Self {
        Self {
            type_uri: type_uri.to_string(),
            title: title.to_string(),
            status: status.as_u16(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(PROBLEM_INVALID_REQUEST, "Invalid Request", StatusCode::BAD_REQUEST)
            .with_detail(detail)
    }

    pub fn internal_error() -> Self {
        Self::new(
            PROBLEM_INTERNAL_ERROR,
            "Internal Error",
            StatusCode::INTERNAL_SERVER_ERROR,
        )
        .with_detail("The request could not be completed")
    }
}

impl IntoResponse for ProblemDetails {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut response = (status, Json(&self)).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/problem+json"),
        );
        response
    }
}

impl From<&ApiError> for ProblemDetails {
    fn from(err: &ApiError) -> Self {
        match err {
            ApiError::Validation(e) if e.is_client_error() => Self::bad_request(e.to_string()),
            ApiError::Validation(_) | ApiError::Measure(_) => Self::internal_error(),
            ApiError::Body(rejection) => body_problem(rejection),
            ApiError::Query(rejection) => Self::bad_request(rejection.body_text()),
            ApiError::Path(rejection) => Self::bad_request(rejection.body_text()),
            ApiError::InvalidPage(detail) => Self::bad_request(detail.clone()),
            ApiError::NotFound(what) => {
                Self::new(PROBLEM_NOT_FOUND, "Not Found", StatusCode::NOT_FOUND)
                    .with_detail(format!("No burn severity record for {}", what))
            }
            ApiError::Store(StoreError::Duplicate(fire_number)) => Self::new(
                PROBLEM_DUPLICATE,
                "Duplicate Fire Number",
                StatusCode::CONFLICT,
            )
            .with_detail(format!("FIRE_NUMBER {} already exists", fire_number)),
            ApiError::Store(_) => Self::internal_error(),
        }
    }
}

/// JSON illisible ou mal formé : 400 ; autres rejets (content-type, taille) :
/// statut proposé par axum
fn body_problem(rejection: &JsonRejection) -> ProblemDetails {
    match rejection {
        JsonRejection::JsonSyntaxError(_) | JsonRejection::JsonDataError(_) => {
            ProblemDetails::bad_request(rejection.body_text())
        }
        other => ProblemDetails::new(
            PROBLEM_INVALID_REQUEST,
            "Invalid Request",
            other.status(),
        )
        .with_detail(other.body_text()),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let problem = ProblemDetails::from(&self);
        if problem.status >= 500 {
            error!(error = %self, "Request failed");
        } else {
            warn!(status = problem.status, error = %self, "Request rejected");
        }
        problem.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_severity::BurnSeverityError;

    #[test]
    fn test_validation_is_bad_request() {
        let problem = ProblemDetails::from(&ApiError::Validation(BurnSeverityError::EmptyCollection));
        assert_eq!(problem.status, 400);
        assert_eq!(problem.type_uri, PROBLEM_INVALID_REQUEST);
        assert_eq!(problem.detail.as_deref(), Some("FeatureCollection contains no features"));
    }

    #[test]
    fn test_duplicate_is_conflict() {
        let problem =
            ProblemDetails::from(&ApiError::Store(StoreError::Duplicate("K20637".into())));
        assert_eq!(problem.status, 409);
        assert!(problem.detail.unwrap().contains("K20637"));
    }

    #[test]
    fn test_store_failure_hides_cause() {
        let err = ApiError::Store(StoreError::Backend("password authentication failed".into()));
        let problem = ProblemDetails::from(&err);
        assert_eq!(problem.status, 500);
        assert!(!problem.detail.unwrap().contains("password"));
    }

    #[test]
    fn test_not_found() {
        let problem = ProblemDetails::from(&ApiError::NotFound("fire number X".into()));
        assert_eq!(problem.status, 404);
        assert_eq!(problem.type_uri, PROBLEM_NOT_FOUND);
    }

    #[test]
    fn test_response_content_type() {
        let response = ProblemDetails::bad_request("nope").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/problem+json"
        );
    }
}
