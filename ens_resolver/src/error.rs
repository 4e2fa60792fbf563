use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
    #[error("{name} has no associated wallet")]
    NoAssociatedWallet { name: String },

    #[error("Invalid wallet input: '{input}'")]
    InvalidInput { input: String },

    #[error("Name service error: {0}")]
    Provider(String),
}

pub type Result<T> = std::result::Result<T, ResolveError>;
