//! Recording and offline replay of scanner tool exchanges.
//!
//! A [`ScanRecorder`] wraps any [`ToolRunner`] and captures every exchange
//! with the tool (argv, exit code, both output streams) as a JSONL
//! transcript. A [`ScanReplayer`] plays such a transcript back as a
//! [`ToolRunner`] of its own, which lets probe logic be tested — and field
//! problems be reproduced — without the tool installed or a device on the
//! network.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use super::runner::{ToolOutput, ToolRunner};
use crate::error::ProbeError;

/// One recorded invocation of the scanner tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ScanExchange {
    /// Wall-clock capture time, milliseconds since the Unix epoch.
    #[serde(default)]
    pub ts_ms: u128,
    /// Full argument vector, program included.
    pub argv: Vec<String>,
    pub exit_code: i32,
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
}

impl ScanExchange {
    fn output(&self) -> ToolOutput {
        ToolOutput {
            exit_code: self.exit_code,
            stdout: self.stdout.clone(),
            stderr: self.stderr.clone(),
        }
    }
}

/// A [`ToolRunner`] decorator that records every exchange.
#[derive(Debug, Clone)]
pub struct ScanRecorder<R> {
    inner: R,
    entries: Arc<Mutex<Vec<ScanExchange>>>,
}

impl<R> ScanRecorder<R> {
    /// Wraps `inner`, recording each exchange it performs.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            entries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Snapshot of all recorded exchanges.
    pub fn entries(&self) -> Vec<ScanExchange> {
        self.lock_entries().clone()
    }

    /// Clears all recorded exchanges.
    pub fn clear(&self) {
        self.lock_entries().clear();
    }

    /// Export the transcript as JSONL, one exchange per line.
    pub fn to_jsonl(&self) -> Result<String, ProbeError> {
        let entries = self.entries();
        let mut lines = Vec::with_capacity(entries.len());
        for entry in entries {
            lines.push(serde_json::to_string(&entry)?);
        }
        Ok(lines.join("\n"))
    }

    fn lock_entries(&self) -> std::sync::MutexGuard<'_, Vec<ScanExchange>> {
        // A poisoned lock only means a recording push panicked; the
        // transcript itself is still usable.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<R: ToolRunner> ToolRunner for ScanRecorder<R> {
    fn run(&self, argv: &[String]) -> Result<ToolOutput, ProbeError> {
        let output = self.inner.run(argv)?;
        self.lock_entries().push(ScanExchange {
            ts_ms: now_ms(),
            argv: argv.to_vec(),
            exit_code: output.exit_code,
            stdout: output.stdout.clone(),
            stderr: output.stderr.clone(),
        });
        Ok(output)
    }
}

/// Offline [`ToolRunner`] backed by a recorded transcript.
///
/// Each [`run`](ToolRunner::run) call consumes the next recorded exchange
/// and fails with [`ProbeError::ReplayMismatch`] if the requested argv does
/// not match the recorded one, or if the transcript is exhausted.
#[derive(Debug)]
pub struct ScanReplayer {
    entries: Mutex<VecDeque<ScanExchange>>,
}

impl ScanReplayer {
    /// Build a replayer from in-memory exchanges.
    pub fn from_exchanges<I>(exchanges: I) -> Self
    where
        I: IntoIterator<Item = ScanExchange>,
    {
        Self {
            entries: Mutex::new(exchanges.into_iter().collect()),
        }
    }

    /// Build a replayer from a recorder snapshot.
    pub fn from_recorder<R>(recorder: &ScanRecorder<R>) -> Self {
        Self::from_exchanges(recorder.entries())
    }

    /// Build a replayer from JSONL transcript data.
    ///
    /// Blank lines are skipped, so hand-edited fixtures may be spaced for
    /// readability.
    pub fn from_jsonl(jsonl: &str) -> Result<Self, ProbeError> {
        let mut parsed = VecDeque::new();
        for line in jsonl.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let entry: ScanExchange = serde_json::from_str(line)?;
            parsed.push_back(entry);
        }
        Ok(Self {
            entries: Mutex::new(parsed),
        })
    }

    /// Number of exchanges not yet consumed.
    pub fn remaining(&self) -> usize {
        self.lock_entries().len()
    }

    fn lock_entries(&self) -> std::sync::MutexGuard<'_, VecDeque<ScanExchange>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ToolRunner for ScanReplayer {
    fn run(&self, argv: &[String]) -> Result<ToolOutput, ProbeError> {
        let Some(entry) = self.lock_entries().pop_front() else {
            return Err(ProbeError::ReplayMismatch(format!(
                "transcript exhausted, no recorded exchange for {argv:?}"
            )));
        };
        if entry.argv != argv {
            return Err(ProbeError::ReplayMismatch(format!(
                "recorded exchange {:?} does not match requested {argv:?}",
                entry.argv
            )));
        }
        Ok(entry.output())
    }
}

fn now_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    fn exchange(parts: &[&str], exit_code: i32, stdout: &str) -> ScanExchange {
        ScanExchange {
            ts_ms: 0,
            argv: argv(parts),
            exit_code,
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    #[test]
    fn recorder_captures_exchanges_and_roundtrips_jsonl() {
        let replayer = ScanReplayer::from_exchanges([exchange(
            &["nut-scanner", "-q", "-M", "-s", "10.0.0.5"],
            0,
            "[nutdev1]\nport = 1\n",
        )]);
        let recorder = ScanRecorder::new(replayer);

        let output = recorder
            .run(&argv(&["nut-scanner", "-q", "-M", "-s", "10.0.0.5"]))
            .expect("recorded run");
        assert_eq!(output.exit_code, 0);

        let jsonl = recorder.to_jsonl().expect("encode jsonl");
        let restored = ScanReplayer::from_jsonl(&jsonl).expect("decode jsonl");
        assert_eq!(restored.remaining(), 1);

        let replayed = restored
            .run(&argv(&["nut-scanner", "-q", "-M", "-s", "10.0.0.5"]))
            .expect("replayed run");
        assert_eq!(replayed, output);
    }

    #[test]
    fn recorder_clear_removes_all_entries() {
        let recorder = ScanRecorder::new(ScanReplayer::from_exchanges([exchange(
            &["nut-scanner"],
            0,
            "",
        )]));
        recorder.run(&argv(&["nut-scanner"])).expect("run");
        assert_eq!(recorder.entries().len(), 1);

        recorder.clear();
        assert!(recorder.entries().is_empty());
    }

    #[test]
    fn replayer_rejects_mismatched_argv() {
        let replayer =
            ScanReplayer::from_exchanges([exchange(&["nut-scanner", "-q"], 0, "")]);
        let err = replayer
            .run(&argv(&["nut-scanner", "-M"]))
            .expect_err("mismatch should fail");
        assert!(matches!(err, ProbeError::ReplayMismatch(_)));
    }

    #[test]
    fn replayer_rejects_runs_past_end_of_transcript() {
        let replayer = ScanReplayer::from_exchanges([]);
        let err = replayer
            .run(&argv(&["nut-scanner"]))
            .expect_err("exhausted transcript should fail");
        assert!(matches!(err, ProbeError::ReplayMismatch(_)));
    }

    #[test]
    fn from_jsonl_accepts_empty_and_blank_padded_input() {
        let replayer = ScanReplayer::from_jsonl("").expect("empty transcript");
        assert_eq!(replayer.remaining(), 0);

        let padded = "\n{\"argv\":[\"nut-scanner\"],\"exit_code\":0}\n\n";
        let replayer = ScanReplayer::from_jsonl(padded).expect("padded transcript");
        assert_eq!(replayer.remaining(), 1);
    }

    #[test]
    fn from_jsonl_rejects_garbage() {
        let err = ScanReplayer::from_jsonl("not json").expect_err("garbage should fail");
        assert!(matches!(err, ProbeError::Transcript(_)));
    }
}
