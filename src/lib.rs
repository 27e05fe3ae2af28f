//! # nutprobe - Power Device Discovery via nut-scanner
//!
//! `nutprobe` is a Rust library for discovering network-attached power
//! devices (UPS and PDU units reachable over SNMP or NetXML/HTTP) by
//! driving the external `nut-scanner` tool as a subprocess and turning its
//! free-form report into ready-to-use monitoring configuration snippets.
//!
//! ## Features
//!
//! - **Two probe flavors**: SNMP (with an enhanced-mode attempt and
//!   automatic legacy fallback) and NetXML/HTTP
//! - **Relabeled output**: every discovered configuration section is
//!   re-headed with the logical device name you chose, never the label the
//!   tool invented
//! - **Bounded execution**: each probe spawns one subprocess under a fixed
//!   10-second deadline, blocking and cancellation-free
//! - **Replayable transcripts**: record real tool exchanges as JSONL and
//!   replay them offline — in tests, or to reproduce a field report without
//!   the hardware
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use nutprobe::scanner::NutScanner;
//! use std::net::IpAddr;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let scanner = NutScanner::new();
//!     let address: IpAddr = "10.0.0.23".parse()?;
//!
//!     // Try SNMP first, fall back to NetXML/HTTP.
//!     let snippets = scanner
//!         .probe_snmp("rack-ups", address, None, false)
//!         .or_else(|_| scanner.probe_netxml_http("rack-ups", address))?;
//!
//!     for snippet in &snippets {
//!         print!("{snippet}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Failures are deliberately coarse at this boundary: a tool that exited
//! non-zero and a tool that ran fine but found nothing both come back as
//! `Err`; the caller's usual reaction to either is the same (try the other
//! protocol, or skip the device). Details land in the [`log`] side-channel.
//!
//! ## Main Components
//!
//! - [`scanner::NutScanner`] - Probe entry points and fallback policy
//! - [`scanner::ToolRunner`] - Subprocess seam (swap in a
//!   [`scanner::ScanReplayer`] for offline runs)
//! - [`parser`] - The report-to-snippet state machine
//! - [`error::ProbeError`] - Error types for probing and replay
//! - [`config`] - Timeout, community and environment-toggle constants

pub mod config;
pub mod error;
pub mod parser;
pub mod scanner;
