use std::future::Future;
use std::pin::Pin;

use tracing::{error, warn};

use super::error::{LifecycleError, LifecycleResult};
use crate::dao::{DaoError, DaoResult};

type Compensation<'a> = Pin<Box<dyn Future<Output = DaoResult<()>> + Send + 'a>>;

/// Runs the writes of one operation in order and undoes the completed ones
/// when a later write fails.
///
/// A failure before any compensation is registered surfaces as a plain
/// `LifecycleError::Store`. Anything later becomes `PartiallyApplied`, with
/// `compensated` telling whether every undo step succeeded.
pub struct Saga<'a> {
    operation: &'static str,
    compensations: Vec<(&'static str, Compensation<'a>)>,
}

impl<'a> Saga<'a> {
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            compensations: Vec::new(),
        }
    }

    pub async fn run<T>(
        &mut self,
        step: &'static str,
        write: impl Future<Output = DaoResult<T>>,
    ) -> LifecycleResult<T> {
        match write.await {
            Ok(value) => Ok(value),
            Err(e) => Err(self.unwind(step, e).await),
        }
    }

    /// Registers the undo for a write that just succeeded. Undo steps run
    /// newest first.
    pub fn on_rollback(
        &mut self,
        step: &'static str,
        undo: impl Future<Output = DaoResult<()>> + Send + 'a,
    ) {
        self.compensations.push((step, Box::pin(undo)));
    }

    async fn unwind(&mut self, step: &'static str, source: DaoError) -> LifecycleError {
        if self.compensations.is_empty() {
            return LifecycleError::Store(source);
        }

        warn!(operation = self.operation, step, error = %source, "Write failed, compensating");
        let mut compensated = true;
        while let Some((undo_step, undo)) = self.compensations.pop() {
            if let Err(e) = undo.await {
                error!(
                    operation = self.operation,
                    step = undo_step,
                    error = %e,
                    "Compensation failed, data left inconsistent"
                );
                compensated = false;
            }
        }

        LifecycleError::PartiallyApplied {
            operation: self.operation,
            step,
            compensated,
            source,
        }
    }
}
