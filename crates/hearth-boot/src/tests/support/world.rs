//! Shared state for the startup sequence scenarios.

use std::cell::RefCell;
use std::fs;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use hearth_config::{Arch, BootEnvironment, BootPaths, HostTarget, Platform, Product, parse_arguments};
use tempfile::TempDir;

use crate::bootstrap::{BootstrapError, BootstrapInputs, BootstrapPlan, StartupReport, run_bootstrap};

use super::{RecordingApplication, RecordingEnvironment, RecordingHost, RecordingStartupReporter};

/// Inputs and collaborators for one bootstrap run, plus its outcome.
pub struct TestWorld {
    _home: TempDir,
    home: Utf8PathBuf,
    pub argv: Vec<String>,
    pub target: HostTarget,
    pub product: Product,
    pub development: bool,
    pub host: RecordingHost,
    pub reporter: Arc<RecordingStartupReporter>,
    pub application: RecordingApplication,
    pub environment: RecordingEnvironment,
    stored: serde_json::Map<String, serde_json::Value>,
    outcome: Option<Result<StartupReport, BootstrapError>>,
}

impl TestWorld {
    /// A Linux x64 launch with no arguments and an empty home directory.
    #[must_use]
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("temp home");
        let home = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 home");
        Self {
            _home: dir,
            home,
            argv: vec!["hearth".to_owned()],
            target: HostTarget::new(Platform::Linux, Arch::X64),
            product: Product::default(),
            development: false,
            host: RecordingHost::default(),
            reporter: Arc::new(RecordingStartupReporter::default()),
            application: RecordingApplication::default(),
            environment: RecordingEnvironment::default(),
            stored: serde_json::Map::new(),
            outcome: None,
        }
    }

    /// Temporary home directory for this run.
    #[must_use]
    pub fn home(&self) -> &Utf8Path {
        &self.home
    }

    /// Appends invocation tokens after the executable.
    pub fn push_args(&mut self, tokens: &[&str]) {
        self.argv.extend(tokens.iter().map(|token| (*token).to_owned()));
    }

    /// Environment rooted at the temporary home directory.
    #[must_use]
    pub fn boot_environment(&self) -> BootEnvironment {
        BootEnvironment::default()
            .with_home_dir(self.home.clone())
            .with_config_dir(self.home.join(".config"))
            .with_development(self.development)
    }

    /// Paths the bootstrap will derive for the current inputs.
    #[must_use]
    pub fn paths(&self) -> BootPaths {
        let args = parse_arguments(self.argv.clone());
        BootPaths::derive(&self.product, &self.boot_environment(), &args)
    }

    /// Writes `contents` to the persistent switch store.
    pub fn write_switch_store(&self, contents: &str) {
        let paths = self.paths();
        let path = paths.argv_config();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create switch store directory");
        }
        fs::write(path, contents).expect("write switch store");
    }

    /// Adds one entry to the switch store and rewrites it.
    ///
    /// `true` and `false` are stored as booleans, anything else as a string.
    pub fn store_switch(&mut self, key: &str, value: &str) {
        let value = match value {
            "true" => serde_json::Value::Bool(true),
            "false" => serde_json::Value::Bool(false),
            other => serde_json::Value::String(other.to_owned()),
        };
        self.stored.insert(key.to_owned(), value);
        let contents = serde_json::Value::Object(self.stored.clone()).to_string();
        self.write_switch_store(&contents);
    }

    /// Runs the bootstrap on a fresh current-thread runtime.
    pub fn bootstrap(&mut self) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("test runtime");
        let plan = BootstrapPlan {
            inputs: BootstrapInputs {
                argv: self.argv.clone(),
                environment: self.boot_environment(),
                product: self.product.clone(),
                target: self.target,
                app_root: self.home.join("app"),
            },
            host: &self.host,
            application: self.application.clone(),
            reporter: self.reporter.clone(),
            environment: &self.environment,
        };
        let outcome = runtime.block_on(run_bootstrap(plan));
        self.outcome = Some(outcome);
    }

    /// Report of a bootstrap run that did not abort.
    #[must_use]
    pub fn report(&self) -> &StartupReport {
        match &self.outcome {
            Some(Ok(report)) => report,
            Some(Err(error)) => panic!("bootstrap aborted: {error}"),
            None => panic!("bootstrap has not run"),
        }
    }

    /// Error of an aborted bootstrap run.
    #[must_use]
    pub fn abort_error(&self) -> Option<&BootstrapError> {
        match &self.outcome {
            Some(Err(error)) => Some(error),
            _ => None,
        }
    }
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture entry point shared by the behaviour suites.
#[must_use]
pub fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::new())
}
