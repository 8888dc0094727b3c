//! GraphQL surface over the sales domain.

pub mod error;
pub mod schema;

pub use schema::{build_schema, sdl, AppSchema, SalesSchema};
