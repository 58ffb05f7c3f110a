//! Execution result collaborators
//!
//! The session manager does not own execution persistence or UI delivery;
//! it talks to them through these traits. A sink failure is logged and
//! swallowed: the session state machine completes regardless of whether
//! the outcome could be stored.

use async_trait::async_trait;
use parking_lot::RwLock;
use scenably_common::{ExecutionEvent, ExecutionUpdate, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Receives the final record of a background execution
#[async_trait]
pub trait ExecutionSink: Send + Sync {
    async fn update_execution(&self, execution_id: &str, update: ExecutionUpdate) -> Result<()>;
}

/// Pushes completion events to listening UI surfaces, fire-and-forget
pub trait ExecutionNotifier: Send + Sync {
    fn notify(&self, event: ExecutionEvent);
}

/// Sink that only logs; useful when no persistence layer is wired up
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait]
impl ExecutionSink for LogSink {
    async fn update_execution(&self, execution_id: &str, update: ExecutionUpdate) -> Result<()> {
        info!(
            "Execution {} finished: {} ({})",
            execution_id, update.status, update.result
        );
        Ok(())
    }
}

/// In-memory sink keeping every update per execution id
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    records: Arc<RwLock<HashMap<String, Vec<ExecutionUpdate>>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn updates_for(&self, execution_id: &str) -> Vec<ExecutionUpdate> {
        self.records
            .read()
            .get(execution_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl ExecutionSink for MemorySink {
    async fn update_execution(&self, execution_id: &str, update: ExecutionUpdate) -> Result<()> {
        self.records
            .write()
            .entry(execution_id.to_string())
            .or_default()
            .push(update);
        Ok(())
    }
}

/// Notifier that drops every event
#[derive(Debug, Default)]
pub struct NullNotifier;

impl ExecutionNotifier for NullNotifier {
    fn notify(&self, _event: ExecutionEvent) {}
}

/// Notifier fanning events out to every subscribed listener
///
/// Delivery is best-effort: events sent while nobody is subscribed are
/// dropped, and no acknowledgment is expected.
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    tx: tokio::sync::broadcast::Sender<ExecutionEvent>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = tokio::sync::broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<ExecutionEvent> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(64)
    }
}

impl ExecutionNotifier for BroadcastNotifier {
    fn notify(&self, event: ExecutionEvent) {
        let _ = self.tx.send(event);
    }
}
