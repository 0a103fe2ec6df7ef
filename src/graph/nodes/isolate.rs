// Isolated external calls
// Runs a service call on its own task so a timeout, panic or cancellation
// surfaces as a value instead of unwinding through the graph.

use std::any::Any;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IsolationError {
    #[error("timed out after {0:?}")]
    TimedOut(Duration),
    #[error("panicked: {0}")]
    Panicked(String),
    #[error("cancelled")]
    Cancelled,
}

pub async fn isolated<F>(future: F, limit: Duration) -> Result<F::Output, IsolationError>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    let handle = tokio::spawn(future);
    let abort = handle.abort_handle();

    match tokio::time::timeout(limit, handle).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(join_err)) if join_err.is_panic() => {
            Err(IsolationError::Panicked(panic_message(join_err.into_panic())))
        }
        Ok(Err(_)) => Err(IsolationError::Cancelled),
        Err(_) => {
            abort.abort();
            Err(IsolationError::TimedOut(limit))
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        return (*msg).to_string();
    }
    if let Some(msg) = payload.downcast_ref::<String>() {
        return msg.clone();
    }
    "unknown panic".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn passes_output_through() {
        let out = isolated(async { 41 + 1 }, Duration::from_secs(1)).await;
        assert_eq!(out, Ok(42));
    }

    #[tokio::test]
    async fn reports_timeout() {
        let out = isolated(
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
            },
            Duration::from_millis(20),
        )
        .await;
        assert_eq!(out, Err(IsolationError::TimedOut(Duration::from_millis(20))));
    }

    #[tokio::test]
    async fn captures_panic_message() {
        let out = isolated(
            async {
                if true {
                    panic!("quota exceeded");
                }
                0
            },
            Duration::from_secs(1),
        )
        .await;
        assert_eq!(out, Err(IsolationError::Panicked("quota exceeded".to_string())));
    }
}
