use crate::auth::AuthError;
use crate::config::ConfigError;
use crate::declarations::{DraftError, RenderError, SubmissionError};
use crate::settings::SettingsError;
use crate::telemetry::TelemetryError;
use crate::users::UserError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Settings(SettingsError),
    Auth(AuthError),
    Draft(DraftError),
    Submission(SubmissionError),
    Render(RenderError),
    Users(UserError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Settings(err) => write!(f, "settings error: {}", err),
            AppError::Auth(err) => write!(f, "authentication error: {}", err),
            AppError::Draft(err) => write!(f, "declaration form error: {}", err),
            AppError::Submission(err) => write!(f, "declaration error: {}", err),
            AppError::Render(err) => write!(f, "document error: {}", err),
            AppError::Users(err) => write!(f, "user management error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Settings(err) => Some(err),
            AppError::Auth(err) => Some(err),
            AppError::Draft(err) => Some(err),
            AppError::Submission(err) => Some(err),
            AppError::Render(err) => Some(err),
            AppError::Users(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Auth(AuthError::NotSignedIn | AuthError::InvalidCredentials) => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Auth(_) => StatusCode::BAD_REQUEST,
            AppError::Draft(_) | AppError::Submission(SubmissionError::Invalid(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Users(UserError::EmailInUse(_)) => StatusCode::CONFLICT,
            AppError::Users(UserError::NotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Io(_) | AppError::Settings(_) | AppError::Users(UserError::Unavailable(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Users(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Submission(_)
            | AppError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<SettingsError> for AppError {
    fn from(value: SettingsError) -> Self {
        Self::Settings(value)
    }
}

impl From<AuthError> for AppError {
    fn from(value: AuthError) -> Self {
        Self::Auth(value)
    }
}

impl From<DraftError> for AppError {
    fn from(value: DraftError) -> Self {
        Self::Draft(value)
    }
}

impl From<SubmissionError> for AppError {
    fn from(value: SubmissionError) -> Self {
        Self::Submission(value)
    }
}

impl From<RenderError> for AppError {
    fn from(value: RenderError) -> Self {
        Self::Render(value)
    }
}

impl From<UserError> for AppError {
    fn from(value: UserError) -> Self {
        Self::Users(value)
    }
}
