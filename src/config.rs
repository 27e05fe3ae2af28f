//! Scanner configuration constants and the process-wide enhanced-mode toggle.
//!
//! The subprocess timeout and the default SNMP community are fixed at this
//! layer; callers that need different values run the scanner tool themselves.
//! The enhanced-SNMP environment toggle is read exactly once per process and
//! surfaced as an explicit [`ScannerConfig`] flag, so probe calls never
//! consult the environment ad hoc.

use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

/// Name of the external discovery tool, resolved through `PATH`.
pub const DEFAULT_TOOL: &str = "nut-scanner";

/// Fixed wall-clock budget for one tool invocation.
///
/// On expiry the child is killed and the run is reported as failed. Not
/// configurable: the tool itself walks the network and a scan that takes
/// longer than this has effectively hung.
pub const SCAN_TIMEOUT: Duration = Duration::from_secs(10);

/// SNMP community used when the caller supplies none (or an empty one).
pub const DEFAULT_COMMUNITY: &str = "public";

/// Environment variable that forces enhanced SNMP discovery on.
///
/// Set to any value (including empty) to enable. Read once per process at
/// first use; later changes to the environment have no effect.
pub const ENHANCED_SNMP_ENV: &str = "NUTPROBE_SNMP_ENHANCED";

static ENHANCED_SNMP_FORCED: Lazy<bool> =
    Lazy::new(|| env::var_os(ENHANCED_SNMP_ENV).is_some());

/// Configuration for a [`NutScanner`](crate::scanner::NutScanner) instance.
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Tool binary to invoke (name or path).
    pub tool: String,

    /// Always try enhanced SNMP discovery first, even when the probe call
    /// did not ask for it.
    pub force_enhanced_snmp: bool,
}

impl ScannerConfig {
    /// Configuration honoring the [`ENHANCED_SNMP_ENV`] process toggle.
    pub fn from_env() -> Self {
        ScannerConfig {
            tool: DEFAULT_TOOL.to_string(),
            force_enhanced_snmp: *ENHANCED_SNMP_FORCED,
        }
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        ScannerConfig {
            tool: DEFAULT_TOOL.to_string(),
            force_enhanced_snmp: false,
        }
    }
}
