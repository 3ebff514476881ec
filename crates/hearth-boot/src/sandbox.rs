//! Renderer sandbox policy.

use hearth_config::{ParsedArguments, PersistentConfig};
use serde::Serialize;
use strum::Display;
use tracing::debug;

use crate::host::HostRuntime;

const SANDBOX_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::sandbox");
const DISABLE_SANDBOX_KEY: &str = "disable-chromium-sandbox";
const NO_SANDBOX_SWITCH: &str = "no-sandbox";
const DISABLE_GPU_SANDBOX_SWITCH: &str = "disable-gpu-sandbox";

/// Sandbox configuration chosen before readiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SandboxDecision {
    /// Every renderer runs sandboxed.
    Enabled,
    /// The invocation already disabled the sandbox; only the GPU sandbox was
    /// additionally turned off.
    GpuSandboxDisabled,
    /// Both the renderer and GPU sandboxes are off.
    Disabled,
}

/// Applies the sandbox policy to `host`.
pub(crate) fn configure_sandbox<H: HostRuntime>(
    args: &ParsedArguments,
    config: &PersistentConfig,
    host: &H,
) -> SandboxDecision {
    let disabled = args.disable_chromium_sandbox() || config.truthy(DISABLE_SANDBOX_KEY);
    let decision = if args.sandbox() && !disabled {
        host.enable_sandbox();
        SandboxDecision::Enabled
    } else if host.has_switch(NO_SANDBOX_SWITCH) && !host.has_switch(DISABLE_GPU_SANDBOX_SWITCH) {
        host.append_switch(DISABLE_GPU_SANDBOX_SWITCH, None);
        SandboxDecision::GpuSandboxDisabled
    } else {
        host.append_switch(NO_SANDBOX_SWITCH, None);
        host.append_switch(DISABLE_GPU_SANDBOX_SWITCH, None);
        SandboxDecision::Disabled
    };
    debug!(target: SANDBOX_TARGET, %decision, "sandbox policy applied");
    decision
}
