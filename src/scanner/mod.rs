//! Device probing through the external scanner tool.
//!
//! [`NutScanner`] is the public entry point. It builds the tool's argument
//! vector for the requested protocol, runs the tool through a
//! [`ToolRunner`], and parses stdout into relabeled configuration
//! [`Snippet`]s. Two probe flavors exist:
//!
//! - [`NutScanner::probe_snmp`] — SNMP discovery, optionally trying the
//!   enhanced scan mode first and falling back to the legacy mode when it
//!   yields nothing;
//! - [`NutScanner::probe_netxml_http`] — NetXML/HTTP discovery, a single
//!   invocation with no fallback.
//!
//! Each probe call blocks for at most the fixed
//! [`SCAN_TIMEOUT`](crate::config::SCAN_TIMEOUT) and spawns one independent
//! subprocess; there is no shared state between calls and no way to cancel
//! a probe once started.

use log::{debug, error, info};
use std::net::IpAddr;

use crate::config::{DEFAULT_COMMUNITY, SCAN_TIMEOUT, ScannerConfig};
use crate::error::ProbeError;
use crate::parser::{Snippet, parse_scanner_output};

pub use recording::{ScanExchange, ScanRecorder, ScanReplayer};
pub use runner::{KILLED_EXIT_CODE, SystemRunner, ToolOutput, ToolRunner};

mod recording;
mod runner;

/// SNMP discovery flavor understood by the scanner tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SnmpMode {
    /// Enhanced discovery (`-z`): broader device coverage, best-effort.
    Enhanced,
    /// Legacy discovery (`-S`): the always-available baseline.
    Legacy,
}

impl SnmpMode {
    fn flag(self) -> &'static str {
        match self {
            SnmpMode::Enhanced => "-z",
            SnmpMode::Legacy => "-S",
        }
    }
}

/// Prober for SNMP and NetXML/HTTP power devices.
///
/// Generic over the [`ToolRunner`] so tests (and transcript replays) can
/// substitute recorded exchanges for real subprocesses.
pub struct NutScanner<R: ToolRunner = SystemRunner> {
    config: ScannerConfig,
    runner: R,
}

impl NutScanner {
    /// Production scanner honoring the process environment toggle.
    pub fn new() -> Self {
        Self::with_runner(ScannerConfig::from_env(), SystemRunner::new())
    }
}

impl Default for NutScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: ToolRunner> NutScanner<R> {
    /// Scanner with an explicit configuration and runner.
    pub fn with_runner(config: ScannerConfig, runner: R) -> Self {
        Self { config, runner }
    }

    /// Effective configuration of this scanner.
    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// The runner executing tool invocations for this scanner.
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Probes an SNMP device and returns its configuration snippets.
    ///
    /// `community` falls back to
    /// [`DEFAULT_COMMUNITY`](crate::config::DEFAULT_COMMUNITY) when `None`
    /// or empty. When `use_enhanced` is set (or forced by the
    /// configuration), the enhanced scan mode runs first and its success is
    /// returned immediately; on its failure the legacy mode runs and that
    /// outcome — either way — is final. An empty discovery is an error, see
    /// [`ProbeError::NoSuggestions`].
    pub fn probe_snmp(
        &self,
        device: &str,
        address: IpAddr,
        community: Option<&str>,
        use_enhanced: bool,
    ) -> Result<Vec<Snippet>, ProbeError> {
        let community = match community {
            Some(c) if !c.is_empty() => c,
            _ => DEFAULT_COMMUNITY,
        };

        if use_enhanced || self.config.force_enhanced_snmp {
            debug!("Probing SNMP device at {address} using enhanced mode");
            let argv = self.snmp_argv(community, SnmpMode::Enhanced, address);
            match self.run_scanner(&argv, device) {
                Ok(snippets) => return Ok(snippets),
                Err(err) => {
                    debug!("Enhanced probe of {address} failed ({err}), trying legacy mode")
                }
            }
        }

        debug!("Probing SNMP device at {address} using legacy mode");
        let argv = self.snmp_argv(community, SnmpMode::Legacy, address);
        self.run_scanner(&argv, device)
    }

    /// Probes a NetXML/HTTP device and returns its configuration snippets.
    ///
    /// One invocation, no fallback; an empty discovery is an error.
    pub fn probe_netxml_http(
        &self,
        device: &str,
        address: IpAddr,
    ) -> Result<Vec<Snippet>, ProbeError> {
        debug!("Probing NetXML device at {address}");
        let argv = self.netxml_argv(address);
        self.run_scanner(&argv, device)
    }

    /// Runs one tool invocation and parses its stdout for `device`.
    fn run_scanner(&self, argv: &[String], device: &str) -> Result<Vec<Snippet>, ProbeError> {
        let tool = &self.config.tool;
        debug!("START: {tool} with timeout {}s ...", SCAN_TIMEOUT.as_secs());
        let output = self.runner.run(argv)?;
        debug!(
            "       done with code {} and following stdout:\n-----\n{}\n-----\n       ...and stderr:\n-----\n{}\n-----",
            output.exit_code, output.stdout, output.stderr
        );

        if !output.succeeded() {
            if output.stderr.is_empty() {
                error!(
                    "Execution of {tool} FAILED with code {} and no message",
                    output.exit_code
                );
            } else {
                error!(
                    "Execution of {tool} FAILED with code {} and message {}",
                    output.exit_code, output.stderr
                );
            }
            return Err(ProbeError::ToolFailed {
                tool: tool.clone(),
                code: output.exit_code,
                stderr: output.stderr,
            });
        }

        if !output.stderr.is_empty() {
            debug!(
                "Execution of {tool} SUCCEEDED with message {}",
                output.stderr
            );
        }

        let snippets = parse_scanner_output(device, &output.stdout);
        if snippets.is_empty() {
            info!("No suggestions from {tool} for device {device}");
            return Err(ProbeError::NoSuggestions(device.to_string()));
        }
        Ok(snippets)
    }

    fn snmp_argv(&self, community: &str, mode: SnmpMode, address: IpAddr) -> Vec<String> {
        vec![
            self.config.tool.clone(),
            "-q".to_string(),
            "--community".to_string(),
            community.to_string(),
            mode.flag().to_string(),
            "-s".to_string(),
            address.to_string(),
        ]
    }

    fn netxml_argv(&self, address: IpAddr) -> Vec<String> {
        vec![
            self.config.tool.clone(),
            "-q".to_string(),
            "-M".to_string(),
            "-s".to_string(),
            address.to_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &str = "10.0.0.23";

    fn addr() -> IpAddr {
        ADDR.parse().expect("test address")
    }

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    fn exchange(parts: &[&str], exit_code: i32, stdout: &str, stderr: &str) -> ScanExchange {
        ScanExchange {
            ts_ms: 0,
            argv: argv(parts),
            exit_code,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        }
    }

    fn scanner(exchanges: Vec<ScanExchange>) -> NutScanner<ScanReplayer> {
        NutScanner::with_runner(
            ScannerConfig::default(),
            ScanReplayer::from_exchanges(exchanges),
        )
    }

    #[test]
    fn snmp_argv_carries_the_mode_flag() {
        let s = scanner(Vec::new());
        assert_eq!(
            s.snmp_argv("private", SnmpMode::Enhanced, addr()),
            argv(&["nut-scanner", "-q", "--community", "private", "-z", "-s", ADDR])
        );
        assert_eq!(
            s.snmp_argv("private", SnmpMode::Legacy, addr()),
            argv(&["nut-scanner", "-q", "--community", "private", "-S", "-s", ADDR])
        );
    }

    #[test]
    fn netxml_argv_uses_the_xml_mode() {
        let s = scanner(Vec::new());
        assert_eq!(
            s.netxml_argv(addr()),
            argv(&["nut-scanner", "-q", "-M", "-s", ADDR])
        );
    }

    #[test]
    fn snmp_probe_defaults_the_community_to_public() {
        // The replayer rejects any argv other than the recorded one, so a
        // successful probe proves "public" was substituted.
        let legacy = &["nut-scanner", "-q", "--community", "public", "-S", "-s", ADDR];
        for community in [None, Some("")] {
            let s = scanner(vec![exchange(legacy, 0, "[nutdev1]\nport = 1\n", "")]);
            let snippets = s
                .probe_snmp("ups1", addr(), community, false)
                .expect("legacy probe");
            assert_eq!(snippets[0].as_str(), "[ups1]\nport = 1\n");
        }
    }

    #[test]
    fn snmp_probe_without_enhanced_mode_runs_legacy_only() {
        let legacy = &["nut-scanner", "-q", "--community", "sec", "-S", "-s", ADDR];
        let s = scanner(vec![exchange(legacy, 0, "[nutdev1]\nport = 1\n", "")]);

        let snippets = s
            .probe_snmp("ups1", addr(), Some("sec"), false)
            .expect("legacy probe");
        assert_eq!(snippets.len(), 1);
        assert_eq!(s.runner.remaining(), 0);
    }

    #[test]
    fn failed_enhanced_probe_falls_back_to_legacy() {
        let enhanced = &["nut-scanner", "-q", "--community", "public", "-z", "-s", ADDR];
        let legacy = &["nut-scanner", "-q", "--community", "public", "-S", "-s", ADDR];
        let s = scanner(vec![
            exchange(enhanced, 1, "", "unsupported scan mode"),
            exchange(legacy, 0, "[nutdev1]\ndriver = snmp-ups\n", ""),
        ]);

        let snippets = s
            .probe_snmp("ups1", addr(), None, true)
            .expect("fallback probe");
        assert_eq!(snippets.len(), 1);
        assert_eq!(snippets[0].as_str(), "[ups1]\ndriver = snmp-ups\n");
    }

    #[test]
    fn successful_enhanced_probe_skips_legacy_mode() {
        let enhanced = &["nut-scanner", "-q", "--community", "public", "-z", "-s", ADDR];
        let s = scanner(vec![exchange(enhanced, 0, "[nutdev1]\nport = 1\n", "")]);

        let snippets = s
            .probe_snmp("ups1", addr(), None, true)
            .expect("enhanced probe");
        assert_eq!(snippets.len(), 1);
        assert_eq!(s.runner.remaining(), 0);
    }

    #[test]
    fn forced_enhanced_config_enables_the_enhanced_attempt() {
        let enhanced = &["nut-scanner", "-q", "--community", "public", "-z", "-s", ADDR];
        let config = ScannerConfig {
            force_enhanced_snmp: true,
            ..ScannerConfig::default()
        };
        let s = NutScanner::with_runner(
            config,
            ScanReplayer::from_exchanges([exchange(enhanced, 0, "[nutdev1]\nport = 1\n", "")]),
        );

        let snippets = s
            .probe_snmp("ups1", addr(), None, false)
            .expect("forced enhanced probe");
        assert_eq!(snippets.len(), 1);
    }

    #[test]
    fn nonzero_exit_fails_without_parsing_stdout() {
        let netxml = &["nut-scanner", "-q", "-M", "-s", ADDR];
        // Stdout has a valid section, but exit code 1 must win.
        let s = scanner(vec![exchange(netxml, 1, "[nutdev1]\nport = 1\n", "timeout")]);

        let err = s
            .probe_netxml_http("ups1", addr())
            .expect_err("nonzero exit should fail");
        match err {
            ProbeError::ToolFailed { code, stderr, .. } => {
                assert_eq!(code, 1);
                assert_eq!(stderr, "timeout");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn clean_run_with_empty_stdout_reports_no_suggestions() {
        let netxml = &["nut-scanner", "-q", "-M", "-s", ADDR];
        let s = scanner(vec![exchange(netxml, 0, "", "")]);

        let err = s
            .probe_netxml_http("ups1", addr())
            .expect_err("empty discovery should fail");
        assert!(matches!(err, ProbeError::NoSuggestions(device) if device == "ups1"));
    }

    #[test]
    fn netxml_probe_relabels_every_section() {
        let netxml = &["nut-scanner", "-q", "-M", "-s", ADDR];
        let stdout = "[nutdev1]\nport = 1\nmibs = ietf\n[nutdev2]\ndriver = netxml-ups\n";
        let s = scanner(vec![exchange(netxml, 0, stdout, "")]);

        let snippets = s.probe_netxml_http("office-ups", addr()).expect("probe");
        assert_eq!(snippets.len(), 2);
        for snippet in &snippets {
            assert_eq!(snippet.label(), "office-ups");
        }
    }
}
