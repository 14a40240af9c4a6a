//! Latest-wins debounced search
//!
//! Every keystroke calls [`SearchDebouncer::debounce`]. A call only yields a
//! [`SearchTicket`] if no newer call arrived during the delay, and a ticket
//! stays current only until the next call. A response is applied only while
//! its ticket is current, so a late answer to an abandoned query is dropped.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Default delay between the last keystroke and the request
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone)]
pub struct SearchDebouncer {
    delay: Duration,
    latest: Arc<AtomicU64>,
}

/// Token for one debounced query
#[derive(Debug, Clone)]
pub struct SearchTicket {
    generation: u64,
    query: String,
    latest: Arc<AtomicU64>,
}

impl SearchTicket {
    pub fn query(&self) -> &str {
        &self.query
    }

    /// False once a newer query has been typed
    pub fn is_current(&self) -> bool {
        self.latest.load(Ordering::SeqCst) == self.generation
    }
}

impl Default for SearchDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_DEBOUNCE)
    }
}

impl SearchDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            latest: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Wait out the delay; `None` if a newer query superseded this one
    pub async fn debounce(&self, query: impl Into<String>) -> Option<SearchTicket> {
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.delay).await;

        let ticket = SearchTicket {
            generation,
            query: query.into(),
            latest: Arc::clone(&self.latest),
        };
        if ticket.is_current() {
            Some(ticket)
        } else {
            tracing::debug!(query = ticket.query(), "search superseded before sending");
            None
        }
    }

    /// Debounce, fetch, and return the result only if still current
    pub async fn run<T, F, Fut>(&self, query: impl Into<String>, fetch: F) -> Option<T>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = T>,
    {
        let ticket = self.debounce(query).await?;
        let result = fetch(ticket.query().to_string()).await;

        if ticket.is_current() {
            Some(result)
        } else {
            tracing::debug!(query = ticket.query(), "discarding stale search response");
            None
        }
    }

    /// Invalidate any pending or in-flight query
    pub fn cancel(&self) {
        self.latest.fetch_add(1, Ordering::SeqCst);
    }
}
