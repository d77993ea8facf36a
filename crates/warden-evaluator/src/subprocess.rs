//! Out-of-process oracle client.
//!
//! `SubprocessEvaluator` owns one persistent oracle process and the pipe
//! pair to it. Each call writes exactly one execute frame and reads exactly
//! one response line: a stateless request/response stream with no
//! multiplexing, which is why callers must serialize access.
//!
//! Failure handling: a dead process (detected by a non-blocking `try_wait`)
//! or a broken pipe triggers one restart with a short bounded backoff and a
//! single retry of the call. If the retry also fails the call returns
//! `EvaluatorUnavailable`; the caller treats that as a denied boolean and
//! the kernel stays alive.

use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::Duration;

use tracing::{debug, info, warn};

use warden_contracts::{WardenError, WardenResult};

use crate::traits::Evaluator;
use crate::wire::encode_frame;

/// Backoff step applied per consecutive start failure, capped at
/// [`MAX_BACKOFF`].
const BACKOFF_STEP: Duration = Duration::from_millis(50);
/// Upper bound on the restart backoff.
const MAX_BACKOFF: Duration = Duration::from_secs(1);

struct OracleProcess {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

/// Client for an external oracle speaking the wire protocol.
pub struct SubprocessEvaluator {
    program: PathBuf,
    process: Option<OracleProcess>,
    /// Consecutive failed start attempts; scales the restart backoff and
    /// resets on any successful round trip.
    consecutive_failures: u32,
}

impl SubprocessEvaluator {
    /// Create a client for the oracle binary at `program` and start it.
    ///
    /// A failed start is not fatal here: the process is retried (with
    /// backoff) on the first evaluation, and every call until a start
    /// succeeds returns `EvaluatorUnavailable`.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        let mut client = Self {
            program: program.into(),
            process: None,
            consecutive_failures: 0,
        };
        if let Err(e) = client.start() {
            warn!(error = %e, "oracle failed to start; evaluations will deny until restart succeeds");
        }
        client
    }

    fn start(&mut self) -> WardenResult<()> {
        if self.consecutive_failures > 0 {
            let backoff =
                (BACKOFF_STEP * self.consecutive_failures).min(MAX_BACKOFF);
            debug!(?backoff, "backing off before oracle restart");
            std::thread::sleep(backoff);
        }

        info!(program = %self.program.display(), "starting oracle process");

        let mut child = Command::new(&self.program)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                self.consecutive_failures += 1;
                WardenError::EvaluatorUnavailable {
                    reason: format!(
                        "failed to spawn '{}': {}",
                        self.program.display(),
                        e
                    ),
                }
            })?;

        // Both pipes are requested above; take() cannot return None here.
        let stdin = child.stdin.take().ok_or_else(|| WardenError::EvaluatorUnavailable {
            reason: "oracle stdin pipe missing".to_string(),
        })?;
        let stdout = child.stdout.take().ok_or_else(|| WardenError::EvaluatorUnavailable {
            reason: "oracle stdout pipe missing".to_string(),
        })?;

        self.process = Some(OracleProcess {
            child,
            stdin,
            stdout: BufReader::new(stdout),
        });
        Ok(())
    }

    /// Non-blocking liveness check; reaps and drops a dead process.
    fn is_alive(&mut self) -> bool {
        match self.process.as_mut() {
            None => false,
            Some(proc) => match proc.child.try_wait() {
                Ok(None) => true,
                Ok(Some(status)) => {
                    warn!(%status, "oracle process exited");
                    self.process = None;
                    false
                }
                Err(e) => {
                    warn!(error = %e, "oracle liveness check failed");
                    self.process = None;
                    false
                }
            },
        }
    }

    /// One frame out, one line back.
    fn round_trip(&mut self, frame: &[u8]) -> std::io::Result<String> {
        let proc = self.process.as_mut().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotConnected, "oracle not running")
        })?;

        proc.stdin.write_all(frame)?;
        proc.stdin.flush()?;

        let mut line = String::new();
        proc.stdout.read_line(&mut line)?;
        Ok(line.trim().to_string())
    }

    fn restart(&mut self) {
        if let Some(mut proc) = self.process.take() {
            let _ = proc.child.kill();
            let _ = proc.child.wait();
        }
        if let Err(e) = self.start() {
            warn!(error = %e, "oracle restart failed");
        }
    }
}

impl Evaluator for SubprocessEvaluator {
    /// Evaluate one token list against the oracle.
    ///
    /// Transparently restarts a dead oracle once and retries the call once.
    /// An empty response line is returned as-is; the policy layer treats
    /// anything other than `"1"` as false.
    fn evaluate(&mut self, tokens: &[String]) -> WardenResult<String> {
        let frame = encode_frame(tokens);

        if !self.is_alive() {
            self.restart();
        }

        match self.round_trip(&frame) {
            Ok(line) => {
                self.consecutive_failures = 0;
                Ok(line)
            }
            Err(first) => {
                // Broken pipe or mid-call death: one restart, one retry.
                warn!(error = %first, "oracle round trip failed; restarting once");
                self.restart();
                match self.round_trip(&frame) {
                    Ok(line) => {
                        self.consecutive_failures = 0;
                        Ok(line)
                    }
                    Err(second) => {
                        self.consecutive_failures += 1;
                        Err(WardenError::EvaluatorUnavailable {
                            reason: format!("round trip failed after restart: {}", second),
                        })
                    }
                }
            }
        }
    }
}

impl Drop for SubprocessEvaluator {
    fn drop(&mut self) {
        if let Some(mut proc) = self.process.take() {
            let _ = proc.child.kill();
            let _ = proc.child.wait();
        }
    }
}
