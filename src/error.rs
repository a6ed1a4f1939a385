use std::fmt::{Debug, Display};
use std::io::Error as IoError;

use actix_web::error::{JsonPayloadError, PathError, QueryPayloadError};
use actix_web::http::header::LOCATION;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use derivative::Derivative;
use mongodb::bson::ser::Error as BsonError;
use mongodb::error::Error as DatabaseError;
use serde::{Serialize, Serializer};
use serde_json::Error as JsonError;

use crate::database::Table;
use crate::violations::Violation;

pub const LOGIN_PATH: &str = "/admin";

#[derive(Debug, Serialize, Derivative)]
#[derivative(PartialEq)]
#[serde(untagged)]
pub enum Error {
    // 400
    #[serde(serialize_with = "display")]
    InvalidJson(#[derivative(PartialEq = "ignore")] JsonPayloadError),
    #[serde(serialize_with = "display")]
    InvalidPath(#[derivative(PartialEq = "ignore")] PathError),
    #[serde(serialize_with = "display")]
    InvalidQuery(#[derivative(PartialEq = "ignore")] QueryPayloadError),
    ValidationFailed {
        violations: Vec<Violation>,
    },

    // 303, 401
    SessionRequired,
    InvalidCredentials,

    // 404
    PathNotFound,
    RecordNotFound {
        table: Table,
        id: String,
    },

    // 409
    UnsavedChangesPending,
    DeleteNotConfirmed {
        table: Table,
        id: String,
    },
    CannotRemoveCurrentAdmin {
        email: String,
    },

    // 500
    ExistentialState(String),
    RemoteUnavailable {
        table: Table,
        reason: String,
    },
    #[serde(serialize_with = "display")]
    FailedDatabaseCall(#[derivative(PartialEq = "ignore")] DatabaseError),
    #[serde(serialize_with = "display")]
    FailedToSerializeToBson(#[derivative(PartialEq = "ignore")] BsonError),
    #[serde(serialize_with = "display")]
    StorageFailure(#[derivative(PartialEq = "ignore")] IoError),
    #[serde(serialize_with = "display")]
    InvalidStorageData(#[derivative(PartialEq = "ignore")] JsonError),
    InvalidConfig {
        name: String,
        value: String,
    },
}

impl Error {
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::InvalidJson(_) => "E4001000",
            Error::InvalidPath(_) => "E4001001",
            Error::InvalidQuery(_) => "E4001003",
            Error::ValidationFailed { .. } => "E4001004",
            Error::SessionRequired => "E3031000",
            Error::InvalidCredentials => "E4011000",
            Error::PathNotFound => "E4041000",
            Error::RecordNotFound { .. } => "E4041001",
            Error::UnsavedChangesPending => "E4091000",
            Error::DeleteNotConfirmed { .. } => "E4091001",
            Error::CannotRemoveCurrentAdmin { .. } => "E4091002",
            Error::ExistentialState(_) => "E5001000",
            Error::FailedDatabaseCall(_) => "E5001001",
            Error::FailedToSerializeToBson(_) => "E5001002",
            Error::StorageFailure(_) => "E5001003",
            Error::RemoteUnavailable { .. } => "E5001004",
            Error::InvalidStorageData(_) => "E5001005",
            Error::InvalidConfig { .. } => "E5001006",
        }
    }

    pub fn error_message(&self) -> &'static str {
        match self {
            Error::InvalidJson(_) => "The given json could not be parsed",
            Error::InvalidPath(_) => "The given path could not be parsed",
            Error::InvalidQuery(_) => "The given query could not be parsed",
            Error::ValidationFailed { .. } => "The submitted form has invalid fields",
            Error::SessionRequired => "An admin session is required to access this page",
            Error::InvalidCredentials => "The given email or password is incorrect",
            Error::PathNotFound => "The requested path was not found",
            Error::RecordNotFound { .. } => "The requested record was not found",
            Error::UnsavedChangesPending => {
                "There are unsaved changes, confirm to leave the page anyway"
            }
            Error::DeleteNotConfirmed { .. } => "Deleting a record must be confirmed",
            Error::CannotRemoveCurrentAdmin { .. } => "You cannot remove your own admin user",
            Error::ExistentialState(_) => "The server detected an invalid state",
            Error::FailedDatabaseCall(_) => {
                "An error occurred when communicating with the database"
            }
            Error::FailedToSerializeToBson(_) => {
                "An error occurred when serializing an object to bson"
            }
            Error::StorageFailure(_) => "An error occurred when accessing local storage",
            Error::RemoteUnavailable { .. } => "The remote store is unavailable",
            Error::InvalidStorageData(_) => "The local storage contents could not be parsed",
            Error::InvalidConfig { .. } => "The server configuration is invalid",
        }
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidJson(_) => StatusCode::BAD_REQUEST,
            Error::InvalidPath(_) => StatusCode::BAD_REQUEST,
            Error::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            Error::ValidationFailed { .. } => StatusCode::BAD_REQUEST,
            Error::SessionRequired => StatusCode::SEE_OTHER,
            Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Error::PathNotFound => StatusCode::NOT_FOUND,
            Error::RecordNotFound { .. } => StatusCode::NOT_FOUND,
            Error::UnsavedChangesPending => StatusCode::CONFLICT,
            Error::DeleteNotConfirmed { .. } => StatusCode::CONFLICT,
            Error::CannotRemoveCurrentAdmin { .. } => StatusCode::CONFLICT,
            Error::ExistentialState(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::FailedDatabaseCall(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::FailedToSerializeToBson(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::StorageFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::RemoteUnavailable { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::InvalidStorageData(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::InvalidConfig { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        #[derive(Serialize)]
        struct Dummy<'a> {
            error_code: &'static str,
            error_message: &'static str,
            error_meta: &'a Error,
        }

        let mut builder = HttpResponse::build(self.status_code());
        if let Error::SessionRequired = self {
            // send the visitor back to the login page
            builder.insert_header((LOCATION, LOGIN_PATH));
        }

        builder.json(&Dummy {
            error_code: self.error_code(),
            error_message: self.error_message(),
            error_meta: self,
        })
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        Debug::fmt(self, f)
    }
}

impl From<DatabaseError> for Error {
    fn from(error: DatabaseError) -> Error {
        Error::FailedDatabaseCall(error)
    }
}

impl From<BsonError> for Error {
    fn from(error: BsonError) -> Error {
        Error::FailedToSerializeToBson(error)
    }
}

impl From<IoError> for Error {
    fn from(error: IoError) -> Error {
        Error::StorageFailure(error)
    }
}

impl From<JsonError> for Error {
    fn from(error: JsonError) -> Error {
        Error::InvalidStorageData(error)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InvalidJson(err) => Some(err),
            Error::InvalidPath(err) => Some(err),
            Error::InvalidQuery(err) => Some(err),
            Error::FailedDatabaseCall(err) => Some(err),
            Error::FailedToSerializeToBson(err) => Some(err),
            Error::StorageFailure(err) => Some(err),
            Error::InvalidStorageData(err) => Some(err),
            _ => None,
        }
    }
}

fn display<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Display,
    S: Serializer,
{
    serializer.collect_str(value)
}
