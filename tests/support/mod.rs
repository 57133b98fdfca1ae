use std::future::Future;
use std::time::Duration;

use topic_bus::{CloseReason, Message};

pub(crate) const RECV_DEADLINE: Duration = Duration::from_millis(500);
pub(crate) const SILENCE_WINDOW: Duration = Duration::from_millis(150);

#[allow(dead_code)]
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Awaits one message, failing the test when none arrives in time.
#[allow(dead_code)]
pub(crate) async fn recv_soon<F>(recv: F, context: &str) -> Message
where
    F: Future<Output = Result<Message, CloseReason>>,
{
    tokio::time::timeout(RECV_DEADLINE, recv)
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for a message: {context}"))
        .unwrap_or_else(|reason| panic!("receiver closed ({reason}): {context}"))
}

/// Asserts that no message arrives within the silence window.
#[allow(dead_code)]
pub(crate) async fn assert_silent<F>(recv: F, context: &str)
where
    F: Future<Output = Result<Message, CloseReason>>,
{
    if let Ok(outcome) = tokio::time::timeout(SILENCE_WINDOW, recv).await {
        panic!("expected silence but got {outcome:?}: {context}");
    }
}
