use std::fmt;

use axum::{http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::ctx::Ctx;

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct CtxError {
    pub error: AppError,
    pub req_id: Uuid,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppError {
    Generic { description: String },
    AuthenticationFail,
    Forbidden,
    EntityFailIdNotFound { ident: String },
    AuthFailNoJwtCookie,
    AuthFailJwtInvalid { source: String },
    Serde { source: String },
    SurrealDb { source: String },
    ValidationErrors { value: String },
    FileStorage { source: String },
    StepIncomplete { step: u8, reason: String },
    PeriodClosed { activity: String },
    AlreadyVoted,
    AlreadyCompleted,
    AdminEmailTaken,
}

/// CtxError carries the req_id to report to the client and implements IntoResponse.
pub type CtxResult<T> = core::result::Result<T, CtxError>;
/// Any error for storing before composing a response.
pub type AppResult<T> = core::result::Result<T, AppError>;

impl std::error::Error for AppError {}

// for slightly less verbose error mappings
impl CtxError {
    pub fn from<T: Into<AppError>>(ctx: &Ctx) -> impl FnOnce(T) -> CtxError + '_ {
        |err| CtxError {
            req_id: ctx.req_id(),
            error: err.into(),
        }
    }
}

impl From<surrealdb::Error> for CtxError {
    fn from(value: surrealdb::Error) -> Self {
        CtxError {
            req_id: Uuid::new_v4(),
            error: value.into(),
        }
    }
}

impl From<AppError> for CtxError {
    fn from(value: AppError) -> Self {
        CtxError {
            req_id: Uuid::new_v4(),
            error: value,
        }
    }
}

const INTERNAL: &str = "Internal error";

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generic { description } => write!(f, "{description}"),
            Self::AuthenticationFail => write!(f, "Authentication failed"),
            Self::Forbidden => write!(f, "Not authorized"),
            Self::EntityFailIdNotFound { ident } => write!(f, "Record id= {ident} not found"),
            Self::AuthFailNoJwtCookie => write!(f, "You are not logged in"),
            Self::AuthFailJwtInvalid { .. } => write!(f, "The provided JWT token is not valid"),
            Self::Serde { source } => write!(f, "Serde error - {source}"),
            Self::SurrealDb { .. } => write!(f, "{INTERNAL}"),
            Self::ValidationErrors { value } => write!(f, "{value}"),
            Self::FileStorage { source } => write!(f, "File storage error - {source}"),
            Self::StepIncomplete { step, reason } => {
                write!(f, "Step {step} is incomplete: {reason}")
            }
            Self::PeriodClosed { activity } => {
                write!(f, "The {activity} period is currently closed")
            }
            Self::AlreadyVoted => write!(f, "This email address has already voted"),
            Self::AlreadyCompleted => write!(f, "This candidacy was already submitted"),
            Self::AdminEmailTaken => write!(f, "An admin with this email already exists"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorResponseBody {
    error: String,
    req_id: String,
}

impl ErrorResponseBody {
    pub fn new(error: String, req_id: Option<String>) -> Self {
        ErrorResponseBody {
            error,
            req_id: req_id.unwrap_or_else(|| Uuid::new_v4().to_string()),
        }
    }

    pub fn get_err(&self) -> String {
        self.error.clone()
    }
}

impl From<ErrorResponseBody> for String {
    fn from(value: ErrorResponseBody) -> Self {
        serde_json::to_string(&value).unwrap()
    }
}

// REST error response
impl IntoResponse for CtxError {
    fn into_response(self) -> axum::response::Response {
        tracing::error!("->> {:<12} - into_response - {self:?}", "ERROR");
        let status_code = match self.error {
            AppError::EntityFailIdNotFound { .. } => StatusCode::NOT_FOUND,
            AppError::AlreadyVoted | AppError::AlreadyCompleted | AppError::AdminEmailTaken => {
                StatusCode::CONFLICT
            }
            AppError::PeriodClosed { .. } => StatusCode::FORBIDDEN,
            AppError::Serde { .. }
            | AppError::SurrealDb { .. }
            | AppError::Generic { .. }
            | AppError::ValidationErrors { .. }
            | AppError::FileStorage { .. }
            | AppError::StepIncomplete { .. } => StatusCode::BAD_REQUEST,
            AppError::AuthenticationFail
            | AppError::Forbidden
            | AppError::AuthFailNoJwtCookie
            | AppError::AuthFailJwtInvalid { .. } => StatusCode::FORBIDDEN,
        };
        let err = self.error.clone();
        let body: String =
            ErrorResponseBody::new(self.error.to_string(), Some(self.req_id.to_string())).into();
        let mut response = (status_code, body).into_response();
        // Insert the real Error into the response - for the logger
        response.extensions_mut().insert(err);
        response
    }
}

// External Errors
impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serde {
            source: value.to_string(),
        }
    }
}

impl From<surrealdb::Error> for AppError {
    fn from(value: surrealdb::Error) -> Self {
        Self::SurrealDb {
            source: value.to_string(),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(value: validator::ValidationErrors) -> Self {
        Self::ValidationErrors {
            value: value.to_string(),
        }
    }
}

impl From<CtxError> for AppError {
    fn from(value: CtxError) -> Self {
        value.error
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(value: jsonwebtoken::errors::Error) -> Self {
        Self::AuthFailJwtInvalid {
            source: value.to_string(),
        }
    }
}
