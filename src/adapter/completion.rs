//! Completion bridge: one awaitable settle over the sink's signal channels.
//!
//! Handlers finish through different channels depending on how they stop
//! writing; the bridge subscribes to all of them and settles on whichever
//! fires first. Later signals are silent no-ops, and dropping the
//! subscription unsubscribes, so nothing leaks across invocations.

use crate::adapter::handler::VergeError;
use crate::http::{CompletionSignal, VergeResponse};
use tokio::sync::broadcast::error::RecvError;

/// Wait until the response sink reports completion.
///
/// Resolves immediately without waiting when the sink is already ended or
/// a signal already fired. An error signal rejects with the error it
/// carried; `End` and `Finish` resolve cleanly.
pub async fn await_completion(response: &VergeResponse) -> Result<(), VergeError> {
    // Subscribe before checking recorded state so a signal firing in
    // between cannot be missed.
    let mut signals = response.subscribe();

    if let Some(signal) = response.settled() {
        return settle(signal);
    }
    if response.is_ended() {
        return Ok(());
    }

    loop {
        match signals.recv().await {
            Ok(signal) => return settle(signal),
            // A lagged receiver skipped old signals; any of them would
            // have settled us, so keep reading for the retained ones.
            Err(RecvError::Lagged(_)) => match response.settled() {
                Some(signal) => return settle(signal),
                None => continue,
            },
            Err(RecvError::Closed) => {
                return Err(VergeError::completion("signal channel closed"))
            }
        }
    }
}

fn settle(signal: CompletionSignal) -> Result<(), VergeError> {
    match signal {
        CompletionSignal::End | CompletionSignal::Finish => Ok(()),
        CompletionSignal::Error(message) => Err(VergeError::Completion(message)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_resolves_immediately_when_already_ended() {
        let response = VergeResponse::new("GET");
        response.end();
        assert_ok!(await_completion(&response).await);
    }

    #[tokio::test]
    async fn test_first_signal_wins_over_later_error() {
        let response = VergeResponse::new("GET");
        response.emit(CompletionSignal::End);
        response.emit_error("too late to matter");
        assert_ok!(await_completion(&response).await);
    }

    #[tokio::test]
    async fn test_error_first_rejects() {
        let response = VergeResponse::new("GET");
        response.emit_error("boom");
        response.emit(CompletionSignal::Finish);
        let err = assert_err!(await_completion(&response).await);
        assert_eq!(err, VergeError::Completion("boom".to_string()));
    }

    #[tokio::test]
    async fn test_duplicate_completion_is_a_no_op() {
        let response = VergeResponse::new("GET");
        // Both "end" and "finish" fire, e.g. a handler that calls end()
        // and whose framework also signals finish.
        response.emit(CompletionSignal::Finish);
        response.emit(CompletionSignal::End);
        assert_ok!(await_completion(&response).await);
        // A second wait still settles with the recorded first signal.
        assert_ok!(await_completion(&response).await);
    }

    #[tokio::test]
    async fn test_settles_on_signal_fired_after_waiting_began() {
        let response = VergeResponse::new("GET");
        let waiter = {
            let response = response.clone();
            tokio::spawn(async move { await_completion(&response).await })
        };
        tokio::task::yield_now().await;
        response.end();
        let result = waiter.await.expect("waiter panicked");
        assert_ok!(result);
    }
}
