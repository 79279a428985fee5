use crate::publisher::error::Result;
use crate::publisher::{Connector, Publisher};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Publishers of one publish run, keyed by token.
///
/// A publisher is created the first time its token is needed and reused for
/// every later delivery with that token. Dropping the pool drops them all.
pub struct PublisherPool {
    connector: Arc<dyn Connector>,
    publishers: Mutex<HashMap<String, Arc<dyn Publisher>>>,
}

impl PublisherPool {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self { connector, publishers: Mutex::new(HashMap::new()) }
    }

    pub fn get(&self, token: &str) -> Result<Arc<dyn Publisher>> {
        let mut publishers = self.publishers.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(publisher) = publishers.get(token) {
            return Ok(Arc::clone(publisher));
        }
        let publisher = self.connector.connect(token)?;
        publishers.insert(token.to_string(), Arc::clone(&publisher));
        Ok(publisher)
    }

    pub fn len(&self) -> usize {
        self.publishers.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
