//! Buffers OS open requests delivered before the application is loaded.
//!
//! The runtime can announce dropped files and deep links long before the
//! application layer exists to receive them. The listener installed during
//! bootstrap parks them here until the application drains the buffer, which
//! also detaches the listener so later requests go to the application's own
//! handler.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;

/// One request delivered by the operating system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenRequest {
    /// A file path handed to the application, typically by a dock drop.
    File(String),
    /// A protocol URL opened through a deep link.
    Url(String),
}

/// Requests collected while the listener was attached.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DrainedOpenRequests {
    /// File paths, in arrival order.
    pub files: Vec<String>,
    /// URLs, in arrival order.
    pub urls: Vec<String>,
}

impl DrainedOpenRequests {
    /// Whether nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.urls.is_empty()
    }
}

#[derive(Debug)]
struct Capture {
    attached: bool,
    requests: DrainedOpenRequests,
}

/// Shared buffer behind the early open-request listener.
#[derive(Debug, Clone)]
pub struct PendingOpenRequests {
    inner: Arc<Mutex<Capture>>,
}

impl Default for PendingOpenRequests {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingOpenRequests {
    /// Creates an attached, empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Capture {
                attached: true,
                requests: DrainedOpenRequests::default(),
            })),
        }
    }

    /// Records `request` while attached.
    ///
    /// # Errors
    ///
    /// Hands the request back once the buffer has been drained so the caller
    /// can route it to the application's own handler.
    pub fn capture(&self, request: OpenRequest) -> Result<(), OpenRequest> {
        let mut capture = self.lock();
        if !capture.attached {
            return Err(request);
        }
        match request {
            OpenRequest::File(path) => capture.requests.files.push(path),
            OpenRequest::Url(url) => capture.requests.urls.push(url),
        }
        Ok(())
    }

    /// Whether the listener still accepts requests.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.lock().attached
    }

    /// Returns everything captured so far and detaches the listener.
    ///
    /// Later calls return an empty set.
    #[must_use]
    pub fn drain_and_detach(&self) -> DrainedOpenRequests {
        let mut capture = self.lock();
        capture.attached = false;
        std::mem::take(&mut capture.requests)
    }

    fn lock(&self) -> MutexGuard<'_, Capture> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
