//! Owned copy of the process argument list.
//!
//! Some bootstrap steps forward values to the application layer by adding
//! tokens to the argument list it will later parse. Tokens are always added
//! ahead of a `--` end-of-options marker so they keep option semantics.

/// End-of-options marker.
const END_OF_OPTIONS: &str = "--";

/// Mutable argument list handed to the application layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessArgv {
    tokens: Vec<String>,
}

impl ProcessArgv {
    /// Wraps the raw process arguments, executable first.
    #[must_use]
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    /// Current tokens.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.tokens
    }

    /// Consumes the list and returns the tokens.
    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        self.tokens
    }

    /// Inserts `tokens` before the first `--`, or appends them when absent.
    pub fn insert_before_end_of_options<I>(&mut self, tokens: I)
    where
        I: IntoIterator<Item = String>,
    {
        let position = self
            .tokens
            .iter()
            .position(|token| token == END_OF_OPTIONS)
            .unwrap_or(self.tokens.len());
        self.tokens.splice(position..position, tokens);
    }
}
