use std::{fmt::Display, future::Future, str::FromStr, time::Duration};

use tokio_util::sync::CancellationToken;

use crate::{errors::Error, Result};

/// What to do when a supervised task fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log, wait `restart_delay`, run the task again.
    Restart,
    /// Log and return the error to the caller.
    Exit,
}

impl FromStr for FailurePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "restart" | "continue" => Ok(Self::Restart),
            "exit" | "crash" => Ok(Self::Exit),
            other => Err(Error::Config(format!(
                "unknown failure policy {other:?} (expected \"restart\" or \"exit\")"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct RestartPolicy {
    pub restart_delay: Duration,
    pub on_failure: FailurePolicy,
}

/// Run `task` until it succeeds, `shutdown` fires, or the policy gives up.
///
/// The delay between attempts is fixed. Cancellation is honoured both while the
/// task runs and while waiting to restart it.
pub async fn supervise<F, Fut, E>(
    name: &str,
    policy: RestartPolicy,
    shutdown: CancellationToken,
    mut task: F,
) -> std::result::Result<(), E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<(), E>>,
    E: Display,
{
    let mut attempt: u64 = 0;
    loop {
        attempt += 1;

        let outcome = tokio::select! {
            _ = shutdown.cancelled() => return Ok(()),
            r = task() => r,
        };

        let err = match outcome {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };

        tracing::error!(task = name, attempt, error = %err, "supervised task failed");

        if policy.on_failure == FailurePolicy::Exit {
            return Err(err);
        }

        tokio::select! {
            _ = shutdown.cancelled() => return Ok(()),
            _ = tokio::time::sleep(policy.restart_delay) => {}
        }
        tracing::info!(task = name, "restarting after {:?}", policy.restart_delay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    fn policy(on_failure: FailurePolicy) -> RestartPolicy {
        RestartPolicy {
            restart_delay: Duration::from_millis(1),
            on_failure,
        }
    }

    #[test]
    fn parses_policy_names() {
        assert_eq!(
            "Restart".parse::<FailurePolicy>().unwrap(),
            FailurePolicy::Restart
        );
        assert_eq!(" exit ".parse::<FailurePolicy>().unwrap(), FailurePolicy::Exit);
        assert!("sometimes".parse::<FailurePolicy>().is_err());
    }

    #[tokio::test]
    async fn restarts_until_task_succeeds() {
        let runs = Arc::new(AtomicUsize::new(0));
        let runs2 = runs.clone();

        let out: std::result::Result<(), String> = supervise(
            "poll",
            policy(FailurePolicy::Restart),
            CancellationToken::new(),
            move || {
                let runs = runs2.clone();
                async move {
                    let n = runs.fetch_add(1, Ordering::SeqCst) + 1;
                    if n < 3 {
                        Err(format!("transport failure {n}"))
                    } else {
                        Ok(())
                    }
                }
            },
        )
        .await;

        assert!(out.is_ok());
        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exit_policy_returns_first_error() {
        let runs = Arc::new(AtomicUsize::new(0));
        let runs2 = runs.clone();

        let out = supervise(
            "poll",
            policy(FailurePolicy::Exit),
            CancellationToken::new(),
            move || {
                let runs = runs2.clone();
                async move {
                    runs.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>("boom")
                }
            },
        )
        .await;

        assert_eq!(out, Err("boom"));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancellation_stops_a_failing_loop() {
        let shutdown = CancellationToken::new();
        let token = shutdown.clone();
        let runs = Arc::new(AtomicUsize::new(0));
        let runs2 = runs.clone();

        let out = supervise(
            "poll",
            policy(FailurePolicy::Restart),
            shutdown,
            move || {
                let runs = runs2.clone();
                let token = token.clone();
                async move {
                    if runs.fetch_add(1, Ordering::SeqCst) == 4 {
                        token.cancel();
                    }
                    Err::<(), _>("still down")
                }
            },
        )
        .await;

        assert!(out.is_ok());
        assert_eq!(runs.load(Ordering::SeqCst), 5);
    }
}
