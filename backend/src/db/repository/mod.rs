//! Repository trait definitions and error types.

pub mod error;
pub mod store;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};
pub use store::StoreRepository;
