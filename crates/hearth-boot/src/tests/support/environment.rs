//! In-memory [`EnvironmentSink`] capturing published variables.

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::publish::EnvironmentSink;

#[derive(Debug, Default)]
pub struct RecordingEnvironment {
    values: Mutex<BTreeMap<String, String>>,
}

impl RecordingEnvironment {
    /// Value published for `key`, if any.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .expect("environment mutex poisoned")
            .get(key)
            .cloned()
    }
}

impl EnvironmentSink for RecordingEnvironment {
    fn publish(&self, key: &str, value: &str) {
        self.values
            .lock()
            .expect("environment mutex poisoned")
            .insert(key.to_owned(), value.to_owned());
    }
}
