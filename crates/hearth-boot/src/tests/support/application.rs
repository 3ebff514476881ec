//! Application double that keeps the context it was launched with.

use std::future::{self, Future};
use std::sync::{Arc, Mutex};

use crate::bootstrap::{Application, ApplicationError, LaunchContext};

/// Records the launch context and optionally fails the launch.
#[derive(Debug, Clone, Default)]
pub struct RecordingApplication {
    launched: Arc<Mutex<Option<LaunchContext>>>,
    failure: Option<String>,
}

impl RecordingApplication {
    /// An application whose entry point fails with `message`.
    #[must_use]
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_owned()),
            ..Self::default()
        }
    }

    /// Context passed to the entry point, once launched.
    #[must_use]
    pub fn context(&self) -> Option<LaunchContext> {
        self.launched
            .lock()
            .expect("application mutex poisoned")
            .clone()
    }
}

impl Application for RecordingApplication {
    fn launch(self, context: LaunchContext) -> impl Future<Output = Result<(), ApplicationError>> {
        *self.launched.lock().expect("application mutex poisoned") = Some(context);
        future::ready(self.failure.map_or(Ok(()), |message| {
            Err(ApplicationError::new(message))
        }))
    }
}
