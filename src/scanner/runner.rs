//! Subprocess execution seam for the scanner tool.
//!
//! Probers talk to the tool through the [`ToolRunner`] trait, so parsing and
//! fallback logic can be exercised against scripted outputs without ever
//! spawning a process. [`SystemRunner`] is the production implementation on
//! top of `std::process`.

use log::debug;
use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use crate::config::SCAN_TIMEOUT;
use crate::error::ProbeError;

/// Exit code reported when the child was killed on timeout or died by a
/// signal without a code of its own.
pub const KILLED_EXIT_CODE: i32 = -1;

/// Captured result of one tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    /// Process exit code; [`KILLED_EXIT_CODE`] for timeout/signal deaths.
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// True when the tool reported success.
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}

/// Executes one tool invocation and captures its result.
///
/// `argv[0]` is the program, the rest its arguments. Implementations block
/// until the invocation finishes (or is given up on) and must report
/// abnormal terminations through a non-zero [`ToolOutput::exit_code`];
/// `Err` is reserved for failures to run the tool at all.
pub trait ToolRunner {
    fn run(&self, argv: &[String]) -> Result<ToolOutput, ProbeError>;
}

/// Production runner: spawns the tool with a fixed deadline.
///
/// Stdout and stderr are drained on background threads while the child
/// runs, so a chatty tool cannot deadlock on a full pipe buffer. When the
/// deadline expires the child is killed and reaped, and the run is reported
/// with [`KILLED_EXIT_CODE`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        SystemRunner
    }
}

impl ToolRunner for SystemRunner {
    fn run(&self, argv: &[String]) -> Result<ToolOutput, ProbeError> {
        let Some((program, args)) = argv.split_first() else {
            return Err(ProbeError::Launch {
                tool: String::new(),
                source: std::io::Error::other("empty argument vector"),
            });
        };
        let tool = program.clone();
        let launch = |source| ProbeError::Launch {
            tool: tool.clone(),
            source,
        };

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(launch)?;

        let stdout_thread = child.stdout.take().map(drain_pipe);
        let stderr_thread = child.stderr.take().map(drain_pipe);

        let exit_code = match wait_with_deadline(&mut child, SCAN_TIMEOUT).map_err(launch)? {
            Some(status) => status.code().unwrap_or(KILLED_EXIT_CODE),
            None => {
                debug!("{tool} did not finish within {}s, killing it", SCAN_TIMEOUT.as_secs());
                let _ = child.kill();
                let _ = child.wait();
                KILLED_EXIT_CODE
            }
        };

        let stdout = join_drained(stdout_thread).map_err(launch)?;
        let stderr = join_drained(stderr_thread).map_err(launch)?;

        Ok(ToolOutput {
            exit_code,
            stdout,
            stderr,
        })
    }
}

fn drain_pipe<P: Read + Send + 'static>(
    mut pipe: P,
) -> std::thread::JoinHandle<std::io::Result<Vec<u8>>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

fn join_drained(
    handle: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,
) -> std::io::Result<String> {
    let Some(handle) = handle else {
        return Ok(String::new());
    };
    let buf = handle
        .join()
        .map_err(|_| std::io::Error::other("output drain thread panicked"))??;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn wait_with_deadline(
    child: &mut Child,
    timeout: Duration,
) -> std::io::Result<Option<ExitStatus>> {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if start.elapsed() >= timeout {
            return Ok(None);
        }
        std::thread::sleep(Duration::from_millis(10));
    }
}
