use bson::oid::ObjectId;
use thiserror::Error;

use crate::dao::DaoError;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Store error: {0}")]
    Store(#[from] DaoError),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Missing information: {0}")]
    MissingField(&'static str),
    #[error("Validation: {0}")]
    Validation(String),
    #[error("{entity} {id} is '{actual}', expected '{expected}'")]
    StaleState {
        entity: &'static str,
        id: ObjectId,
        expected: String,
        actual: String,
    },
    /// A multi-write operation failed after some of its writes landed.
    #[error("{operation} failed at {step} (compensated: {compensated}): {source}")]
    PartiallyApplied {
        operation: &'static str,
        step: &'static str,
        compensated: bool,
        source: DaoError,
    },
}

pub type LifecycleResult<T> = Result<T, LifecycleError>;

impl LifecycleError {
    /// Maps a DAO-level `NotFound` onto the named entity.
    pub(crate) fn lookup(entity: &'static str) -> impl FnOnce(DaoError) -> LifecycleError {
        move |e| match e {
            DaoError::NotFound => LifecycleError::NotFound(entity),
            other => LifecycleError::Store(other),
        }
    }
}
