use thiserror::Error;

use crate::generation::GenerationError;
use crate::identity::IdentityError;
use crate::storage::StorageError;

/// Startup failures while building the provider clients.
#[derive(Error, Debug)]
pub enum LocalBoostError {
    #[error("Identity provider setup failed: {0}")]
    Identity(#[from] IdentityError),

    #[error("Storage provider setup failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Generation provider setup failed: {0}")]
    Generation(#[from] GenerationError),
}
