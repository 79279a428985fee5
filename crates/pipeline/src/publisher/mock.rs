//! In-memory publisher for testing.

use super::error::{ErrorKind, Result};
use super::{Connector, Publisher};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

/// One delivery that reached a [`MockConnector`] publisher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sent {
    pub token: String,
    pub target_id: String,
    pub filename: String,
    pub caption: String,
    pub data: Vec<u8>,
}

#[derive(Default)]
struct State {
    sent: Vec<Sent>,
    connections: Vec<String>,
    rejecting: HashSet<String>,
    hanging: HashSet<String>,
}

/// Connector whose publishers record every delivery instead of sending it.
///
/// Clones share their state, so a test can keep one handle and give another
/// to the pipeline. Targets can be told to reject deliveries or to never
/// answer.
#[derive(Clone, Default)]
pub struct MockConnector {
    state: Arc<Mutex<State>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Deliveries to `target_id` fail with [`ErrorKind::Rejected`].
    pub fn reject(&self, target_id: impl Into<String>) {
        self.state().rejecting.insert(target_id.into());
    }

    /// Deliveries to `target_id` never complete.
    pub fn hang(&self, target_id: impl Into<String>) {
        self.state().hanging.insert(target_id.into());
    }

    /// Successful deliveries, in the order they finished.
    pub fn sent(&self) -> Vec<Sent> {
        self.state().sent.clone()
    }

    /// Tokens a publisher was created for, in order.
    pub fn connections(&self) -> Vec<String> {
        self.state().connections.clone()
    }
}

impl Connector for MockConnector {
    fn connect(&self, token: &str) -> Result<Arc<dyn Publisher>> {
        self.state().connections.push(token.to_string());
        Ok(Arc::new(MockPublisher { token: token.to_string(), connector: self.clone() }))
    }
}

struct MockPublisher {
    token: String,
    connector: MockConnector,
}

#[async_trait]
impl Publisher for MockPublisher {
    async fn publish(&self, target_id: &str, data: &[u8], filename: &str, caption: &str) -> Result<()> {
        let hang = self.connector.state().hanging.contains(target_id);
        if hang {
            std::future::pending::<()>().await;
        }
        let mut state = self.connector.state();
        if state.rejecting.contains(target_id) {
            exn::bail!(ErrorKind::Rejected { status: 400, description: "Bad Request: chat not found".to_string() });
        }
        state.sent.push(Sent {
            token: self.token.clone(),
            target_id: target_id.to_string(),
            filename: filename.to_string(),
            caption: caption.to_string(),
            data: data.to_vec(),
        });
        Ok(())
    }
}
