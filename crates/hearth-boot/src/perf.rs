//! Named timing marks recorded along the startup path.

use std::time::{Duration, Instant};

/// Main entry point reached.
pub(crate) const DID_START_MAIN: &str = "hearth/didStartMain";
/// Host runtime signalled readiness.
pub(crate) const MAIN_APP_READY: &str = "hearth/mainAppReady";
/// About to hand control to the application.
pub(crate) const WILL_LOAD_MAIN_BUNDLE: &str = "hearth/willLoadMainBundle";
/// Application entry point returned.
pub(crate) const DID_RUN_MAIN_BUNDLE: &str = "hearth/didRunMainBundle";

/// A single mark, measured from the start of the bootstrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerfMark {
    /// Mark name.
    pub name: &'static str,
    /// Elapsed time since the origin.
    pub offset: Duration,
}

/// Ordered collection of marks sharing one origin.
#[derive(Debug, Clone)]
pub struct PerfMarks {
    origin: Instant,
    marks: Vec<PerfMark>,
}

impl Default for PerfMarks {
    fn default() -> Self {
        Self::new()
    }
}

impl PerfMarks {
    /// Starts a collection with the origin set to now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            marks: Vec::new(),
        }
    }

    /// Records `name` at the current instant.
    pub fn mark(&mut self, name: &'static str) {
        self.marks.push(PerfMark {
            name,
            offset: self.origin.elapsed(),
        });
    }

    /// Recorded marks in insertion order.
    #[must_use]
    pub fn marks(&self) -> &[PerfMark] {
        &self.marks
    }

    /// Names of the recorded marks in insertion order.
    #[must_use]
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.marks.iter().map(|mark| mark.name)
    }
}
