//! Layout error types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LayoutError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("Required field missing: {field}")]
    MissingField { field: String },

    #[error("Unknown document template: {name}")]
    UnknownTemplate { name: String },
}
