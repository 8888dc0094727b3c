//! Error model for the sales domain.

use std::collections::BTreeMap;

use sea_orm::DbErr;
use serde::Serialize;
use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

pub type SalesResult<T> = Result<T, SalesError>;

#[derive(Debug, Error)]
pub enum SalesError {
    /// One or more submitted fields are invalid.
    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    /// Another customer already uses this tax id.
    #[error("customer with INN {inn} already exists")]
    UniquenessConflict { inn: String },

    /// The status is still referenced and cannot be deleted.
    #[error("customer status {status_id} is referenced by {customers} customer(s)")]
    ReferentialIntegrity { status_id: i64, customers: u64 },

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("database error: {0}")]
    Db(#[from] DbErr),
}

impl SalesError {
    pub fn code(&self) -> &'static str {
        match self {
            SalesError::Validation(_) => "VALIDATION",
            SalesError::UniquenessConflict { .. } => "CONFLICT",
            SalesError::ReferentialIntegrity { .. } => "REFERENTIAL_INTEGRITY",
            SalesError::NotFound(_) => "NOT_FOUND",
            SalesError::Db(_) => "INTERNAL",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldErrorKind {
    Required,
    Format,
    Conflict,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub kind: FieldErrorKind,
    pub message: String,
}

impl FieldError {
    pub fn required() -> Self {
        Self {
            kind: FieldErrorKind::Required,
            message: "This field is required.".to_string(),
        }
    }

    pub fn format(message: impl Into<String>) -> Self {
        Self {
            kind: FieldErrorKind::Format,
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            kind: FieldErrorKind::Conflict,
            message: message.into(),
        }
    }
}

/// Errors keyed by form field name, kept in field-name order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<FieldError>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, error: FieldError) {
        self.0.entry(field.into()).or_default().push(error);
    }

    /// Folds `validator` output in, keeping only field-level entries.
    pub fn extend_validation(&mut self, errors: &ValidationErrors) {
        for (field, kind) in errors.errors() {
            let ValidationErrorsKind::Field(list) = kind else {
                continue;
            };
            for err in list {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value ({}).", err.code));
                let kind = match err.code.as_ref() {
                    "required" => FieldErrorKind::Required,
                    "unique" => FieldErrorKind::Conflict,
                    _ => FieldErrorKind::Format,
                };
                self.add(field.to_string(), FieldError { kind, message });
            }
        }
    }

    pub fn merge(&mut self, other: FieldErrors) {
        for (field, list) in other.0 {
            self.0.entry(field).or_default().extend(list);
        }
    }

    pub fn get(&self, field: &str) -> &[FieldError] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[FieldError])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn into_result(self) -> SalesResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(SalesError::Validation(self))
        }
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fields: Vec<&str> = self.0.keys().map(String::as_str).collect();
        write!(f, "{}", fields.join(", "))
    }
}
