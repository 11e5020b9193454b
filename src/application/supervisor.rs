//! Supervised task execution
//!
//! Every unit of work that crosses an I/O boundary runs as its own tokio task
//! with a deadline. The caller waits on a single `select!` and observes exactly
//! one [`TaskOutcome`]. A task that outlives its deadline is detached, not
//! aborted: it finishes on its own and the runtime drops its result.

use std::any::Any;
use std::future::Future;
use std::time::Duration;

use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;

/// Result of one supervised task
#[derive(Debug)]
pub enum TaskOutcome<T, E> {
    Success(T),
    Failure(E),
    Panic(String),
    TimedOut,
    Canceled,
}

impl<T, E> TaskOutcome<T, E> {
    pub fn label(&self) -> &'static str {
        match self {
            TaskOutcome::Success(_) => "success",
            TaskOutcome::Failure(_) => "failure",
            TaskOutcome::Panic(_) => "panic",
            TaskOutcome::TimedOut => "timed_out",
            TaskOutcome::Canceled => "canceled",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Success(_))
    }
}

/// Runs futures as isolated, time-bounded tasks
#[derive(Debug, Clone, Default)]
pub struct TaskSupervisor {
    shutdown: CancellationToken,
}

impl TaskSupervisor {
    pub fn new(shutdown: CancellationToken) -> Self {
        Self { shutdown }
    }

    /// A supervisor canceled with this one but cancelable on its own.
    pub fn child(&self) -> Self {
        Self {
            shutdown: self.shutdown.child_token(),
        }
    }

    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    pub fn cancel(&self) {
        self.shutdown.cancel();
    }

    pub fn is_canceled(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    pub async fn run<F, T, E>(&self, deadline: Duration, work: F) -> TaskOutcome<T, E>
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        if self.shutdown.is_cancelled() {
            return TaskOutcome::Canceled;
        }

        let mut handle = tokio::spawn(work);

        tokio::select! {
            biased;

            joined = &mut handle => match joined {
                Ok(Ok(value)) => TaskOutcome::Success(value),
                Ok(Err(err)) => TaskOutcome::Failure(err),
                Err(err) => from_join_error(err),
            },
            _ = self.shutdown.cancelled() => TaskOutcome::Canceled,
            _ = tokio::time::sleep(deadline) => TaskOutcome::TimedOut,
        }
    }
}

fn from_join_error<T, E>(err: JoinError) -> TaskOutcome<T, E> {
    if err.is_panic() {
        TaskOutcome::Panic(panic_message(err.into_panic()))
    } else {
        TaskOutcome::Canceled
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn success_is_delivered() {
        let supervisor = TaskSupervisor::default();
        let outcome: TaskOutcome<u32, String> =
            supervisor.run(Duration::from_secs(1), async { Ok(7) }).await;
        assert!(matches!(outcome, TaskOutcome::Success(7)));
    }

    #[tokio::test]
    async fn error_becomes_failure() {
        let supervisor = TaskSupervisor::default();
        let outcome: TaskOutcome<(), String> = supervisor
            .run(Duration::from_secs(1), async { Err("db down".to_string()) })
            .await;
        assert!(matches!(outcome, TaskOutcome::Failure(ref e) if e == "db down"));
        assert_eq!(outcome.label(), "failure");
    }

    #[tokio::test]
    async fn panic_is_contained() {
        let supervisor = TaskSupervisor::default();
        let outcome: TaskOutcome<(), String> = supervisor
            .run(Duration::from_secs(1), async {
                if true {
                    panic!("boom");
                }
                Ok(())
            })
            .await;
        assert!(matches!(outcome, TaskOutcome::Panic(ref msg) if msg == "boom"));
        assert_eq!(outcome.label(), "panic");
    }

    #[tokio::test]
    async fn formatted_panic_message_is_kept() {
        let supervisor = TaskSupervisor::default();
        let id = 42;
        let outcome: TaskOutcome<(), String> = supervisor
            .run(Duration::from_secs(1), async move {
                if id > 0 {
                    panic!("chat {id} exploded");
                }
                Ok(())
            })
            .await;
        assert!(matches!(outcome, TaskOutcome::Panic(ref msg) if msg == "chat 42 exploded"));
    }

    #[tokio::test]
    async fn deadline_yields_timed_out_and_task_keeps_running() {
        let supervisor = TaskSupervisor::default();
        let finished = Arc::new(AtomicBool::new(false));
        let flag = finished.clone();

        let outcome: TaskOutcome<(), String> = supervisor
            .run(Duration::from_millis(20), async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                flag.store(true, Ordering::SeqCst);
                Ok(())
            })
            .await;
        assert!(matches!(outcome, TaskOutcome::TimedOut));

        // the abandoned task is detached, not killed
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn shutdown_is_reported_as_canceled() {
        let supervisor = TaskSupervisor::default();
        let trigger = supervisor.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let outcome: TaskOutcome<(), String> = supervisor
            .run(Duration::from_secs(5), async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok(())
            })
            .await;
        assert!(matches!(outcome, TaskOutcome::Canceled));
    }

    #[tokio::test]
    async fn already_canceled_supervisor_does_not_spawn() {
        let supervisor = TaskSupervisor::default();
        supervisor.cancel();
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();

        let outcome: TaskOutcome<(), String> = supervisor
            .run(Duration::from_secs(1), async move {
                flag.store(true, Ordering::SeqCst);
                Ok(())
            })
            .await;
        assert!(matches!(outcome, TaskOutcome::Canceled));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn child_cancel_does_not_reach_parent() {
        let parent = TaskSupervisor::default();
        let child = parent.child();
        child.cancel();
        assert!(child.is_canceled());
        assert!(!parent.is_canceled());

        parent.cancel();
        let other_child = parent.child();
        assert!(other_child.is_canceled());
    }
}
