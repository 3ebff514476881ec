//! Best-effort parsing of the process invocation tokens.
//!
//! The host hands the bootstrap its full argument vector, including flags
//! meant for the host runtime and the application layer. Parsing therefore
//! never fails: declared options get typed values and defaults, while
//! everything else is kept as a best-effort guess for later consumers.

use std::collections::BTreeMap;

/// Options whose values are always treated as text.
const STRING_OPTIONS: &[&str] = &[
    "user-data-dir",
    "locale",
    "js-flags",
    "crash-reporter-directory",
    "trace-category-filter",
    "trace-options",
];

/// Options whose values are always treated as booleans, with their defaults.
const BOOLEAN_OPTIONS: &[(&str, bool)] = &[
    ("disable-chromium-sandbox", false),
    ("disable-crash-reporter", false),
    ("sandbox", true),
    ("trace", false),
    ("trace-memory-infra", false),
    ("no-cached-data", false),
];

/// Marker separating options from trailing positional input.
const END_OF_OPTIONS: &str = "--";

/// Value recorded for a single option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    /// Boolean switch.
    Flag(bool),
    /// Single textual value.
    Text(String),
    /// Textual values accumulated from a repeated option.
    List(Vec<String>),
}

impl ArgValue {
    /// Returns the most recent textual value, if any.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            Self::List(values) => values.last().map(String::as_str),
            Self::Flag(_) => None,
        }
    }

    /// Interprets the value as a boolean switch.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Flag(value) => *value,
            Self::Text(value) => !value.is_empty() && value != "false",
            Self::List(values) => !values.is_empty(),
        }
    }
}

/// Typed view of the process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedArguments {
    options: BTreeMap<String, ArgValue>,
    positionals: Vec<String>,
}

impl ParsedArguments {
    fn with_defaults() -> Self {
        let options = BOOLEAN_OPTIONS
            .iter()
            .map(|(name, default)| ((*name).to_owned(), ArgValue::Flag(*default)))
            .collect();
        Self {
            options,
            positionals: Vec::new(),
        }
    }

    /// Returns the raw value recorded for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.options.get(name)
    }

    /// Returns the textual value recorded for `name`.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.options.get(name).and_then(ArgValue::as_text)
    }

    /// Returns the boolean value recorded for `name`, `false` when absent.
    #[must_use]
    pub fn flag(&self, name: &str) -> bool {
        self.options.get(name).is_some_and(ArgValue::is_truthy)
    }

    /// Tokens that were not consumed as options or option values.
    #[must_use]
    pub fn positionals(&self) -> &[String] {
        &self.positionals
    }

    /// Iterates over every recorded option in name order.
    pub fn options(&self) -> impl Iterator<Item = (&str, &ArgValue)> {
        self.options
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    /// Explicit `--user-data-dir` override.
    #[must_use]
    pub fn user_data_dir(&self) -> Option<&str> {
        self.non_empty_text("user-data-dir")
    }

    /// Explicit `--locale` override.
    #[must_use]
    pub fn locale(&self) -> Option<&str> {
        self.non_empty_text("locale")
    }

    /// Engine flags supplied through `--js-flags`.
    #[must_use]
    pub fn js_flags(&self) -> Option<&str> {
        self.non_empty_text("js-flags")
    }

    /// Local crash dump directory supplied through `--crash-reporter-directory`.
    #[must_use]
    pub fn crash_reporter_directory(&self) -> Option<&str> {
        self.non_empty_text("crash-reporter-directory")
    }

    /// Category filter for trace recording.
    #[must_use]
    pub fn trace_category_filter(&self) -> Option<&str> {
        self.non_empty_text("trace-category-filter")
    }

    /// Recording options for trace recording.
    #[must_use]
    pub fn trace_options(&self) -> Option<&str> {
        self.non_empty_text("trace-options")
    }

    /// Whether the runtime sandbox was requested (defaults to `true`).
    #[must_use]
    pub fn sandbox(&self) -> bool {
        self.flag("sandbox")
    }

    /// Whether `--disable-chromium-sandbox` was supplied.
    #[must_use]
    pub fn disable_chromium_sandbox(&self) -> bool {
        self.flag("disable-chromium-sandbox")
    }

    /// Whether `--disable-crash-reporter` was supplied.
    #[must_use]
    pub fn disable_crash_reporter(&self) -> bool {
        self.flag("disable-crash-reporter")
    }

    /// Whether trace recording was requested.
    #[must_use]
    pub fn trace(&self) -> bool {
        self.flag("trace")
    }

    /// Whether memory-infra trace recording was requested.
    #[must_use]
    pub fn trace_memory_infra(&self) -> bool {
        self.flag("trace-memory-infra")
    }

    /// Whether the code cache was disabled with `--no-cached-data`.
    #[must_use]
    pub fn no_cached_data(&self) -> bool {
        self.flag("no-cached-data")
    }

    fn non_empty_text(&self, name: &str) -> Option<&str> {
        self.text(name).filter(|value| !value.is_empty())
    }

    fn set_flag(&mut self, name: &str, value: bool) {
        self.options.insert(name.to_owned(), ArgValue::Flag(value));
    }

    fn set_text(&mut self, name: &str, value: String) {
        if is_boolean_option(name) {
            self.set_flag(name, value != "false");
            return;
        }
        let merged = match self.options.remove(name) {
            Some(ArgValue::Text(previous)) => ArgValue::List(vec![previous, value]),
            Some(ArgValue::List(mut values)) => {
                values.push(value);
                ArgValue::List(values)
            }
            Some(ArgValue::Flag(_)) | None => ArgValue::Text(value),
        };
        self.options.insert(name.to_owned(), merged);
    }
}

/// Parses the invocation tokens into [`ParsedArguments`].
///
/// The parser follows the conventions of the common `minimist` dialect:
/// `--key=value`, `--key value`, `--no-key`, clustered short flags and a bare
/// `--` ending option parsing. It is a pure function and never fails.
pub fn parse_arguments<I, S>(tokens: I) -> ParsedArguments
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut parsed = ParsedArguments::with_defaults();
    let mut tokens = tokens.into_iter().map(Into::<String>::into).peekable();

    while let Some(token) = tokens.next() {
        if token == END_OF_OPTIONS {
            parsed.positionals.extend(tokens);
            break;
        }

        if let Some(body) = token.strip_prefix("--") {
            if let Some((name, value)) = body.split_once('=') {
                parsed.set_text(name, value.to_owned());
            } else if let Some(negated) = body.strip_prefix("no-").filter(|_| !is_declared(body))
            {
                parsed.set_flag(negated, false);
            } else if is_boolean_option(body) {
                match tokens.next_if(|next| next == "true" || next == "false") {
                    Some(next) => parsed.set_flag(body, next == "true"),
                    None => parsed.set_flag(body, true),
                }
            } else {
                match tokens.next_if(|next| !looks_like_option(next)) {
                    Some(next) => parsed.set_text(body, next),
                    None if is_string_option(body) => parsed.set_text(body, String::new()),
                    None => parsed.set_flag(body, true),
                }
            }
            continue;
        }

        if let Some(cluster) = token.strip_prefix('-').filter(|rest| !rest.is_empty()) {
            parse_short_cluster(&mut parsed, cluster, &mut tokens);
            continue;
        }

        parsed.positionals.push(token);
    }

    parsed
}

fn parse_short_cluster<I>(
    parsed: &mut ParsedArguments,
    cluster: &str,
    tokens: &mut std::iter::Peekable<I>,
) where
    I: Iterator<Item = String>,
{
    let mut letters = cluster.chars().peekable();
    while let Some(letter) = letters.next() {
        let name = letter.to_string();
        if letters.peek().is_some() {
            parsed.set_flag(&name, true);
            continue;
        }
        match tokens.next_if(|next| !looks_like_option(next)) {
            Some(next) if !is_boolean_option(&name) => parsed.set_text(&name, next),
            Some(next) => {
                parsed.set_flag(&name, true);
                parsed.positionals.push(next);
            }
            None => parsed.set_flag(&name, true),
        }
    }
}

fn looks_like_option(token: &str) -> bool {
    token
        .strip_prefix("--")
        .or_else(|| token.strip_prefix('-'))
        .and_then(|rest| rest.chars().next())
        .is_some_and(|first| first != '-')
}

fn is_string_option(name: &str) -> bool {
    STRING_OPTIONS.contains(&name)
}

fn is_boolean_option(name: &str) -> bool {
    BOOLEAN_OPTIONS.iter().any(|(option, _)| *option == name)
}

fn is_declared(name: &str) -> bool {
    is_string_option(name) || is_boolean_option(name)
}
