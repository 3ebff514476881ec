//! Trace recording requested with `--trace`.

use std::time::Duration;

use hearth_config::ParsedArguments;
use serde::Serialize;
use strum::Display;

const DEFAULT_CATEGORY_FILTER: &str = "*";
const DEFAULT_TRACE_OPTIONS: &str = "record-until-full,enable-sampling";
const MEMORY_INFRA_CATEGORIES: [&str; 2] = [
    "disabled-by-default-memory-infra",
    "disabled-by-default-memory-infra.v8.code_stats",
];

/// Detail level of a periodic memory dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MemoryDumpMode {
    /// Cheap summary dump.
    Light,
    /// Full dump including allocator details.
    Detailed,
}

/// Periodic memory dump schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemoryDumpTrigger {
    /// Dump detail level.
    pub mode: MemoryDumpMode,
    /// Minimum spacing between two dumps.
    pub min_interval: Duration,
}

/// Recording configuration handed to the host runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum TraceConfig {
    /// Category-filtered recording.
    Categories {
        /// Comma-separated category filter.
        category_filter: String,
        /// Comma-separated recorder options.
        trace_options: String,
    },
    /// Memory-infrastructure recording with periodic dumps.
    MemoryInfra {
        /// Categories to record.
        included_categories: Vec<String>,
        /// Categories to suppress.
        excluded_categories: Vec<String>,
        /// Dump schedule.
        triggers: Vec<MemoryDumpTrigger>,
    },
}

impl TraceConfig {
    /// Builds the recording configuration, or `None` without `--trace`.
    #[must_use]
    pub fn from_arguments(args: &ParsedArguments) -> Option<Self> {
        if !args.trace() {
            return None;
        }
        if args.trace_memory_infra() {
            let mut included_categories: Vec<String> = args
                .trace_category_filter()
                .map(|filter| filter.split(',').map(str::to_owned).collect())
                .unwrap_or_default();
            included_categories.extend(MEMORY_INFRA_CATEGORIES.iter().map(|c| (*c).to_owned()));
            return Some(Self::MemoryInfra {
                included_categories,
                excluded_categories: vec![DEFAULT_CATEGORY_FILTER.to_owned()],
                triggers: vec![
                    MemoryDumpTrigger {
                        mode: MemoryDumpMode::Detailed,
                        min_interval: Duration::from_secs(10),
                    },
                    MemoryDumpTrigger {
                        mode: MemoryDumpMode::Light,
                        min_interval: Duration::from_secs(1),
                    },
                ],
            });
        }
        Some(Self::Categories {
            category_filter: args
                .trace_category_filter()
                .unwrap_or(DEFAULT_CATEGORY_FILTER)
                .to_owned(),
            trace_options: args
                .trace_options()
                .unwrap_or(DEFAULT_TRACE_OPTIONS)
                .to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use hearth_config::parse_arguments;

    use super::*;

    #[test]
    fn absent_without_trace_flag() {
        assert_eq!(
            TraceConfig::from_arguments(&parse_arguments(["hearth", "--trace-options", "x"])),
            None
        );
    }

    #[test]
    fn category_recording_uses_defaults() {
        let config = TraceConfig::from_arguments(&parse_arguments(["hearth", "--trace"]));
        assert_eq!(
            config,
            Some(TraceConfig::Categories {
                category_filter: "*".to_owned(),
                trace_options: "record-until-full,enable-sampling".to_owned(),
            })
        );
    }

    #[test]
    fn memory_infra_appends_categories() {
        let args = parse_arguments([
            "hearth",
            "--trace",
            "--trace-memory-infra",
            "--trace-category-filter=blink,v8",
        ]);
        let Some(TraceConfig::MemoryInfra {
            included_categories,
            excluded_categories,
            triggers,
        }) = TraceConfig::from_arguments(&args)
        else {
            panic!("expected memory-infra recording");
        };
        assert_eq!(
            included_categories,
            vec![
                "blink",
                "v8",
                "disabled-by-default-memory-infra",
                "disabled-by-default-memory-infra.v8.code_stats",
            ]
        );
        assert_eq!(excluded_categories, vec!["*"]);
        assert_eq!(triggers.len(), 2);
    }
}
