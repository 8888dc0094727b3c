use async_graphql::{Error, ErrorExtensions};
use sales::SalesError;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Sales(#[from] SalesError),
    #[error("bad request: {0}")]
    InvalidInput(String),
    #[error("internal server error")]
    Internal(&'static str),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Sales(err) => err.code(),
            ApiError::InvalidInput(_) => "BAD_REQUEST",
            ApiError::Internal(_) => "INTERNAL",
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Sales(SalesError::Db(_)) | ApiError::Internal(_) => {
                "internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl ErrorExtensions for ApiError {
    fn extend(&self) -> Error {
        if let ApiError::Internal(detail) = self {
            error!(detail = %detail, "internal error while serving graphql");
        }
        let mut err = Error::new(self.message()).extend_with(|_, e| e.set("code", self.code()));
        if let ApiError::Sales(SalesError::Validation(fields)) = self {
            if let Ok(value) = async_graphql::to_value(fields) {
                err = err.extend_with(|_, e| e.set("fields", value));
            }
        }
        err
    }
}

/// Converts a domain error into a GraphQL error, logging what gets masked.
pub fn sales_error(err: SalesError) -> Error {
    if let SalesError::Db(db) = &err {
        error!(error = %db, "database error while serving graphql");
    }
    ApiError::Sales(err).extend()
}
