use csv::Error as CsvError;
use jsonwebtoken::errors::Error as JwtError;
use log::{error, warn};
use mongodb::error::Error as DbError;
use reqwest::Error as HttpError;
use rocket::{
    http::Status,
    response::{self, Responder},
    serde::json::{json, serde_json::Error as JsonError, Json, Value},
    Request,
};
use thiserror::Error;

use crate::model::submission::SubmissionId;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] JsonError),
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Jwt(#[from] JwtError),
    #[error(transparent)]
    Csv(#[from] CsvError),
    #[error("Submitter '{submitter}' already submitted as {existing_id}")]
    Conflict {
        submitter: String,
        existing_id: SubmissionId,
        existing_date: chrono::DateTime<chrono::Utc>,
    },
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("{action}: {source}")]
    Failed {
        action: &'static str,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Attach the action that was being performed to an internal error, so the
    /// 500 response names it. Client errors pass through unchanged.
    pub fn during(self, action: &'static str) -> Self {
        match self {
            Self::Conflict { .. }
            | Self::BadRequest(_)
            | Self::Unauthorized(_)
            | Self::NotFound(_)
            | Self::Failed { .. } => self,
            other => Self::Failed {
                action,
                source: Box::new(other),
            },
        }
    }

    pub fn status(&self) -> Status {
        match self {
            Self::Conflict { .. } => Status::Conflict,
            Self::BadRequest(_) => Status::BadRequest,
            Self::Unauthorized(_) => Status::Unauthorized,
            Self::NotFound(_) => Status::NotFound,
            Self::Io(_)
            | Self::Json(_)
            | Self::Http(_)
            | Self::Db(_)
            | Self::Jwt(_)
            | Self::Csv(_)
            | Self::Failed { .. } => Status::InternalServerError,
        }
    }

    fn body(&self) -> Value {
        match self {
            Self::Conflict {
                existing_id,
                existing_date,
                ..
            } => json!({
                "success": false,
                "error": "A submission under this name already exists",
                "existingSubmissionId": existing_id,
                "existingSubmissionDate": existing_date,
            }),
            Self::BadRequest(msg) | Self::Unauthorized(msg) => json!({
                "success": false,
                "error": msg,
            }),
            Self::NotFound(what) => json!({
                "success": false,
                "error": format!("{what} not found"),
            }),
            Self::Failed { action, source } => json!({
                "success": false,
                "error": action,
                "details": source.to_string(),
            }),
            other => json!({
                "success": false,
                "error": "Internal server error",
                "details": other.to_string(),
            }),
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'o> {
        let status = self.status();
        if status.code >= 500 {
            error!("{self}");
        } else {
            warn!("{self}");
        }
        (status, Json(self.body())).respond_to(req)
    }
}
