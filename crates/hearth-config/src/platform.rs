use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Operating system family the host runs on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum Platform {
    /// Microsoft Windows.
    #[strum(serialize = "win32")]
    #[serde(rename = "win32")]
    Windows,
    /// Apple macOS.
    #[strum(serialize = "darwin")]
    #[serde(rename = "darwin")]
    MacOs,
    /// Linux distributions.
    #[strum(serialize = "linux")]
    Linux,
    /// Any other platform; no platform-specific behaviour applies.
    #[strum(serialize = "other")]
    Other,
}

impl Platform {
    /// Platform the binary was compiled for.
    #[must_use]
    pub const fn current() -> Self {
        if cfg!(target_os = "windows") {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(target_os = "linux") {
            Self::Linux
        } else {
            Self::Other
        }
    }
}

/// CPU architecture the host runs on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Arch {
    /// 64-bit x86.
    X64,
    /// 64-bit ARM.
    Arm64,
    /// Any other architecture.
    Other,
}

impl Arch {
    /// Architecture the binary was compiled for.
    #[must_use]
    pub const fn current() -> Self {
        if cfg!(target_arch = "x86_64") {
            Self::X64
        } else if cfg!(target_arch = "aarch64") {
            Self::Arm64
        } else {
            Self::Other
        }
    }
}

/// Platform and architecture pair used for per-target decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HostTarget {
    /// Operating system family.
    pub platform: Platform,
    /// CPU architecture.
    pub arch: Arch,
}

impl HostTarget {
    /// Builds a target from its parts.
    #[must_use]
    pub const fn new(platform: Platform, arch: Arch) -> Self {
        Self { platform, arch }
    }

    /// Target the binary was compiled for.
    #[must_use]
    pub const fn current() -> Self {
        Self::new(Platform::current(), Arch::current())
    }
}

impl Default for HostTarget {
    fn default() -> Self {
        Self::current()
    }
}
