use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::models::AgentEvent;

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("event receiver has gone away")]
pub struct TransportClosed;

/// Where the orchestrator reports progress. `emit` resolves once the event
/// has been accepted, so events arrive in the order they were emitted.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: AgentEvent) -> Result<(), TransportClosed>;
}

/// Waits for channel capacity, so a slow consumer slows the pipeline down.
#[async_trait]
impl EventSink for mpsc::Sender<AgentEvent> {
    async fn emit(&self, event: AgentEvent) -> Result<(), TransportClosed> {
        self.send(event).await.map_err(|_| TransportClosed)
    }
}

/// Forwards to an inner sink and swallows disconnects, for runs that should
/// finish even when nobody is listening anymore.
pub struct BestEffortSink<S> {
    inner: S,
}

impl<S: EventSink> BestEffortSink<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S: EventSink> EventSink for BestEffortSink<S> {
    async fn emit(&self, event: AgentEvent) -> Result<(), TransportClosed> {
        if self.inner.emit(event).await.is_err() {
            tracing::trace!("Event dropped, listener disconnected");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AgentId;

    #[tokio::test]
    async fn test_sender_reports_closed_receiver() {
        let (tx, rx) = mpsc::channel::<AgentEvent>(1);
        drop(rx);
        let result = tx.emit(AgentEvent::running(AgentId::Image)).await;
        assert_eq!(result, Err(TransportClosed));
    }

    #[tokio::test]
    async fn test_best_effort_sink_ignores_closed_receiver() {
        let (tx, rx) = mpsc::channel::<AgentEvent>(1);
        drop(rx);
        let sink = BestEffortSink::new(tx);
        assert!(sink.emit(AgentEvent::running(AgentId::Image)).await.is_ok());
    }

    #[tokio::test]
    async fn test_sender_preserves_order() {
        let (tx, mut rx) = mpsc::channel::<AgentEvent>(4);
        tx.emit(AgentEvent::running(AgentId::Image)).await.unwrap();
        tx.emit(AgentEvent::completed(AgentId::Image)).await.unwrap();
        drop(tx);

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.status, Some(crate::models::StageStatus::Running));
        assert_eq!(second.status, Some(crate::models::StageStatus::Completed));
        assert!(rx.recv().await.is_none());
    }
}
