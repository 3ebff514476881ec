//! Test harness utilities for the startup sequence suites.

mod application;
mod environment;
mod host;
mod reporter;
mod world;

pub use application::RecordingApplication;
pub use environment::RecordingEnvironment;
pub use host::{HostEvent, RecordingHost};
pub use reporter::{RecordingStartupReporter, StartupEvent};
pub use world::{TestWorld, world};
