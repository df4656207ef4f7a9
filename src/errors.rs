use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::error::ErrorKind;
use thiserror::Error; // Use thiserror for cleaner error definitions
use uuid::Uuid;

// --- Store Errors ---

#[derive(Error, Debug)]
pub enum RepoError {
    #[error("Unique constraint violated: {0}")]
    Integrity(String),

    /// A check, not-null or foreign-key constraint refused the statement, or
    /// the write would change a row's identity.
    #[error("Store rejected operation: {0}")]
    Operation(String),

    /// The row vanished between lookup and write.
    #[error("No stored joke with ID {0}")]
    Missing(Uuid),

    #[error("Stored joke could not be decoded: {0}")]
    DataCorruption(String),

    #[error("Database backend error: {0}")]
    BackendError(#[from] anyhow::Error),
}

/// Classifies by database error kind. Constraint rejections are integrity or
/// operation errors; everything else (busy, read-only, I/O, pool, decoding)
/// is a backend error.
impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        let kind = match &err {
            sqlx::Error::Database(db) => Some(db.kind()),
            _ => None,
        };
        match kind {
            Some(ErrorKind::UniqueViolation) => RepoError::Integrity(err.to_string()),
            Some(
                ErrorKind::CheckViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::ForeignKeyViolation,
            ) => RepoError::Operation(err.to_string()),
            _ => RepoError::BackendError(anyhow::Error::new(err)),
        }
    }
}

// --- Service Errors ---

#[derive(Error, Debug)]
pub enum JokeError {
    #[error("Joke with ID {0} not found")]
    NotFound(Uuid),

    /// Nothing is scheduled for the date. Expected on most empty days.
    #[error("No Joke for date '{0}' exists")]
    NoJokeForDate(NaiveDate),

    #[error("A joke for date '{date}' already exists")]
    DataIntegrity {
        date: NaiveDate,
        #[source]
        source: RepoError,
    },

    #[error("{message}")]
    DataOperation {
        message: String,
        #[source]
        source: Option<RepoError>,
    },

    #[error("{message}")]
    Service {
        message: String,
        #[source]
        source: Option<RepoError>,
    },

    /// Read paths pass store failures through untranslated.
    #[error(transparent)]
    Store(#[from] RepoError),
}

// --- Web Layer Error ---

#[derive(Error, Debug)]
pub enum AppError {
    // Input validation / request parsing errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
    #[error("Missing form field: {0}")]
    MissingFormField(String),
    #[error("Error processing multipart form data: {0}")]
    MultipartError(#[from] axum::extract::multipart::MultipartError),
    #[error("Invalid joke ID format: {0}")]
    InvalidUuid(#[from] uuid::Error),

    // Access control
    #[error("Authentication required")]
    Unauthorized,
    #[error("Insufficient privileges")]
    Forbidden,

    #[error(transparent)]
    Joke(#[from] JokeError),

    #[error("Failed to render page: {0}")]
    Template(#[from] askama::Error),
}

/// Problem details body (RFC 9457 subset).
#[derive(Debug, Serialize)]
pub struct Problem {
    #[serde(rename = "type")]
    pub type_url: &'static str,
    pub title: String,
    pub status: u16,
    pub detail: String,
}

pub const APPLICATION_PROBLEM_JSON: &str = "application/problem+json";

impl Problem {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            type_url: "about:blank",
            title: status.canonical_reason().unwrap_or("Error").to_string(),
            status: status.as_u16(),
            detail: detail.into(),
        }
    }
}

impl IntoResponse for Problem {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut resp = (status, Json(self)).into_response();
        resp.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(APPLICATION_PROBLEM_JSON),
        );
        resp
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_)
            | AppError::Validation(_)
            | AppError::MissingFormField(_)
            | AppError::MultipartError(_)
            | AppError::InvalidUuid(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Joke(JokeError::NotFound(_) | JokeError::NoJokeForDate(_)) => {
                StatusCode::NOT_FOUND
            }
            AppError::Joke(JokeError::DataIntegrity { .. }) => StatusCode::CONFLICT,
            AppError::Joke(JokeError::DataOperation { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Joke(JokeError::Service { .. } | JokeError::Store(_))
            | AppError::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// --- Axum Response Implementation ---

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = if status.is_server_error() {
            tracing::error!(error.detail = %self, error.source = ?std::error::Error::source(&self), "Internal error while handling request");
            "An internal server error occurred".to_string()
        } else {
            tracing::debug!(error.status = %status, error.detail = %self, "Responding with client error");
            self.to_string()
        };

        let mut resp = Problem::new(status, detail).into_response();
        if matches!(self, AppError::Unauthorized) {
            resp.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static(r#"Basic realm="jotd""#),
            );
        }
        resp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[test]
    fn taxonomy_maps_to_http_status() {
        let cases = [
            (AppError::from(JokeError::NotFound(Uuid::nil())), StatusCode::NOT_FOUND),
            (AppError::from(JokeError::NoJokeForDate(date())), StatusCode::NOT_FOUND),
            (
                AppError::from(JokeError::DataIntegrity {
                    date: date(),
                    source: RepoError::Integrity("dup".into()),
                }),
                StatusCode::CONFLICT,
            ),
            (
                AppError::from(JokeError::DataOperation { message: "id changed".into(), source: None }),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                AppError::from(JokeError::Service { message: "boom".into(), source: None }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (AppError::Validation(vec!["date is required".into()]), StatusCode::BAD_REQUEST),
            (AppError::Unauthorized, StatusCode::UNAUTHORIZED),
            (AppError::Forbidden, StatusCode::FORBIDDEN),
        ];
        for (err, expected) in cases {
            assert_eq!(err.status(), expected, "{err}");
        }
    }

    #[test]
    fn not_found_message_names_the_id() {
        let msg = JokeError::NotFound(Uuid::nil()).to_string();
        assert_eq!(msg, "Joke with ID 00000000-0000-0000-0000-000000000000 not found");
        assert_eq!(
            JokeError::NoJokeForDate(date()).to_string(),
            "No Joke for date '2024-01-01' exists"
        );
    }

    #[test]
    fn unauthorized_response_challenges_for_basic_auth() {
        let resp = AppError::Unauthorized.into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            resp.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            r#"Basic realm="jotd""#
        );
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            APPLICATION_PROBLEM_JSON
        );
    }
}
