//! Saga runner for multi-store operations.
//!
//! A saga is an ordered list of named steps. Success of step *k* is the
//! precondition for step *k+1*. When a step fails, the compensators of the
//! steps that already succeeded run in reverse order, best-effort: their
//! errors are logged and never replace the business error. Compensators must
//! be pure deletes of freshly created rows.
//!
//! Steps that share a plane should be packed into a single transaction via
//! `Db::with_tx`; the saga then only carries compensators for effects that
//! crossed a transaction boundary.

use std::future::Future;
use std::pin::Pin;

type UndoFuture<E> = Pin<Box<dyn Future<Output = Result<(), E>> + Send>>;
type Undo<E> = Box<dyn FnOnce() -> UndoFuture<E> + Send>;

pub struct Saga<E> {
    name: &'static str,
    compensations: Vec<(&'static str, Undo<E>)>,
}

impl<E: std::fmt::Display> Saga<E> {
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            compensations: Vec::new(),
        }
    }

    /// Run a step with no compensator of its own (typically because its
    /// effects are already bundled into a transaction, or because it is the
    /// last step). On failure, compensates everything registered so far and
    /// returns the step's error.
    ///
    /// # Errors
    /// Propagates the step's error after compensation.
    pub async fn run<T, Fut>(&mut self, step: &'static str, fut: Fut) -> Result<T, E>
    where
        Fut: Future<Output = Result<T, E>> + Send,
    {
        match fut.await {
            Ok(v) => Ok(v),
            Err(e) => {
                tracing::warn!(saga = self.name, step, error = %e, "saga step failed, compensating");
                self.compensate().await;
                Err(e)
            }
        }
    }

    /// Run a step and, on success, register its compensator.
    ///
    /// # Errors
    /// Propagates the step's error after compensating previous steps.
    pub async fn run_with_undo<T, Fut, U, UFut>(
        &mut self,
        step: &'static str,
        fut: Fut,
        undo: U,
    ) -> Result<T, E>
    where
        Fut: Future<Output = Result<T, E>> + Send,
        U: FnOnce() -> UFut + Send + 'static,
        UFut: Future<Output = Result<(), E>> + Send + 'static,
    {
        let value = self.run(step, fut).await?;
        self.compensations
            .push((step, Box::new(move || Box::pin(undo()))));
        Ok(value)
    }

    /// Run all registered compensators in reverse order, best-effort.
    /// Compensator failures are logged, never propagated.
    pub async fn compensate(&mut self) {
        while let Some((step, undo)) = self.compensations.pop() {
            if let Err(e) = undo().await {
                tracing::warn!(
                    saga = self.name,
                    step,
                    error = %e,
                    "compensator failed, continuing"
                );
            }
        }
    }

    /// Declare the saga complete and discard the compensators.
    pub fn commit(mut self) {
        self.compensations.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Debug)]
    struct StepErr(&'static str);

    impl std::fmt::Display for StepErr {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(self.0)
        }
    }

    fn record(log: &Arc<Mutex<Vec<String>>>, entry: &str) {
        log.lock().unwrap().push(entry.to_owned());
    }

    #[tokio::test]
    async fn failure_compensates_in_reverse_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut saga: Saga<StepErr> = Saga::new("test");

        let l = log.clone();
        saga.run_with_undo("one", async { Ok::<_, StepErr>(()) }, {
            let l = l.clone();
            move || async move {
                record(&l, "undo one");
                Ok(())
            }
        })
        .await
        .unwrap();

        saga.run_with_undo("two", async { Ok::<_, StepErr>(()) }, {
            let l = l.clone();
            move || async move {
                record(&l, "undo two");
                Ok(())
            }
        })
        .await
        .unwrap();

        let err = saga
            .run::<(), _>("three", async { Err(StepErr("boom")) })
            .await
            .unwrap_err();
        assert_eq!(err.0, "boom");

        assert_eq!(*log.lock().unwrap(), vec!["undo two", "undo one"]);
    }

    #[tokio::test]
    async fn compensator_errors_are_swallowed_and_remaining_undos_still_run() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut saga: Saga<StepErr> = Saga::new("test");

        let l = log.clone();
        saga.run_with_undo("one", async { Ok::<_, StepErr>(()) }, {
            let l = l.clone();
            move || async move {
                record(&l, "undo one");
                Ok(())
            }
        })
        .await
        .unwrap();

        saga.run_with_undo("two", async { Ok::<_, StepErr>(()) }, move || async move {
            Err(StepErr("undo failed"))
        })
        .await
        .unwrap();

        let res = saga
            .run::<(), _>("three", async { Err(StepErr("boom")) })
            .await;
        assert!(res.is_err());

        // The failing compensator for step two did not stop step one's.
        assert_eq!(*log.lock().unwrap(), vec!["undo one"]);
    }

    #[tokio::test]
    async fn commit_discards_compensators() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut saga: Saga<StepErr> = Saga::new("test");

        let l = log.clone();
        saga.run_with_undo("one", async { Ok::<_, StepErr>(()) }, move || async move {
            record(&l, "undo one");
            Ok(())
        })
        .await
        .unwrap();

        saga.commit();
        assert!(log.lock().unwrap().is_empty());
    }
}
