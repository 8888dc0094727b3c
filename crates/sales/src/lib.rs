//! Lead intake for the sales pipeline.
//!
//! The crate owns the rules around the three sales tables: tax-id
//! validation, the combined customer / decision-maker form and the
//! transactional create flow behind it.

pub mod create;
pub mod error;
pub mod form;
pub mod repo;
pub mod validators;

pub use create::{
    create_customer, render_customer_form, submit_customer_form, CreateOutcome, CreatedCustomer,
};
pub use error::{FieldError, FieldErrorKind, FieldErrors, SalesError, SalesResult};
pub use form::{
    assemble_customer_form, bind_submission, load_customer_form, CustomerFormView,
    CustomerSubmission, FormData,
};
pub use repo::{DbStatusQuery, StatusQuery};
