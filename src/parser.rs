//! Parser for the scanner tool's textual report.
//!
//! `nut-scanner` prints zero or more bracket-delimited configuration
//! sections to stdout:
//!
//! ```text
//! [nutdev1]
//!         driver = "snmp-ups"
//!         port = "10.0.0.23"
//! ```
//!
//! This module turns that report into discrete [`Snippet`] values, each
//! relabeled with the logical device name chosen by the caller — the label
//! the tool printed is never trusted. A section marker followed by no
//! configuration lines means "nothing really here" and produces no snippet.

use log::warn;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One discovered driver configuration block.
///
/// The text always starts with `[<device>]\n`, followed by the body lines
/// exactly as the tool printed them (indentation and line endings
/// preserved), and is suitable for direct inclusion in a NUT-style
/// configuration file. Immutable once emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Snippet(String);

impl Snippet {
    /// The full snippet text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The label inside the leading `[...]` header.
    pub fn label(&self) -> &str {
        let header = self.0.lines().next().unwrap_or("");
        header
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .unwrap_or(header)
    }

    /// Consumes the snippet, returning the owned text.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Snippet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Snippet {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Lazy line iterator that keeps each line's trailing newline.
///
/// The final line is yielded without one if the input does not end in a
/// newline; empty input yields nothing. Keeping the terminator lets snippet
/// bodies be re-joined verbatim.
fn lines_with_endings(input: &str) -> impl Iterator<Item = &str> {
    input.split_inclusive('\n')
}

/// Parser position while walking the tool report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// No section seen yet (or the previous one was finalized and no new
    /// marker has appeared). Body lines here are stray output and dropped.
    Idle,
    /// A `[`-prefixed marker line was just seen. The relabeled header is
    /// not written until a body line proves the section is non-empty.
    SectionOpened,
    /// Header written, body lines are being appended.
    Accumulating,
}

/// Parses a scanner report into snippets labeled `device`.
///
/// Section markers are lines whose first byte is `[`; everything the tool
/// put between two markers becomes one snippet body. Empty lines are
/// skipped. A marker with no body lines produces nothing — a trailing one
/// additionally logs a warning, since it usually means the tool saw the
/// device but could not suggest a driver for it.
pub fn parse_scanner_output(device: &str, raw: &str) -> Vec<Snippet> {
    let mut snippets = Vec::new();
    let mut buf = String::new();
    let mut state = ParseState::Idle;

    for line in lines_with_endings(raw) {
        if line.is_empty() || line == "\n" {
            continue;
        }

        if line.starts_with('[') {
            if !buf.is_empty() {
                snippets.push(Snippet(std::mem::take(&mut buf)));
            }
            state = ParseState::SectionOpened;
            continue;
        }

        match state {
            // Stray output before any section marker.
            ParseState::Idle => {}
            ParseState::SectionOpened => {
                buf.push('[');
                buf.push_str(device);
                buf.push_str("]\n");
                buf.push_str(line);
                state = ParseState::Accumulating;
            }
            ParseState::Accumulating => buf.push_str(line),
        }
    }

    if state == ParseState::SectionOpened {
        warn!(
            "While parsing scanner output for {device}, got a section tag but no other data"
        );
    }
    if !buf.is_empty() {
        snippets.push(Snippet(buf));
    }

    snippets
}
