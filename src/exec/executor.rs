//! External program executor.
//!
//! Runs one child process end to end: spawn, drain stdout and stderr on two
//! drainer threads, feed optional input from a writer thread, wait for exit
//! (bounded by an optional timeout, cut short by an [`InterruptHandle`]), and
//! collect the captured text. The timeout covers the whole call, input and
//! output collection included. The child, both drainers, and the writer are
//! torn down on every exit path; threads still blocked after a short grace
//! period are detached.

use crate::error::{ExecError, Result};
use crate::exec::drainer::{DEFAULT_CHUNK_SIZE, Fetch, StreamDrainer};
use crate::exec::env::EnvOverrides;
use crate::exec::result::OpResult;
use std::io::{self, ErrorKind, Write};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// First poll interval while waiting for the child.
const INITIAL_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Poll interval cap; bounds how late a deadline or interrupt is noticed.
const MAX_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How long streams and the input writer may take to wind down once the
/// child has been killed. Readers still blocked after it (a grandchild holds
/// the pipe) are detached.
const TEARDOWN_GRACE: Duration = Duration::from_millis(250);

/// Shared flag that stops an in-progress [`ProcessExecutor::execute`].
///
/// When raised while the executor is waiting, the child is terminated and the
/// executor returns a best-effort [`OpResult`] with `interrupted` set.
#[derive(Debug, Clone, Default)]
pub struct InterruptHandle {
    flag: Arc<AtomicBool>,
}

impl InterruptHandle {
    /// Request that the associated execution stop waiting.
    pub fn interrupt(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Returns true once [`interrupt`](Self::interrupt) was called.
    pub fn is_interrupted(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Executes a single external program.
///
/// An executor services exactly one invocation: [`execute`](Self::execute)
/// consumes it. Create a fresh one per call.
#[derive(Debug, Default)]
pub struct ProcessExecutor {
    chunk_size: Option<usize>,
    timeout: Option<Duration>,
    working_dir: Option<PathBuf>,
    interrupt: InterruptHandle,
}

/// How the wait for the child ended.
enum WaitOutcome {
    Exited(i32),
    Interrupted,
    TimedOut,
}

impl ProcessExecutor {
    /// Create an executor with the default chunk size and no timeout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Maximum bytes each drainer reads per chunk.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size);
        self
    }

    /// Kill the child and fail with [`ExecError::Timeout`] if it runs longer
    /// than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Run the child in `dir` instead of the current directory.
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Handle that interrupts this executor's wait from another thread.
    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.interrupt.clone()
    }

    /// Execute `command` and capture its output.
    ///
    /// # Arguments
    ///
    /// * `command` - Program followed by its arguments; must not be empty
    /// * `env` - Variables merged into the inherited environment
    /// * `input` - Text written to the child's stdin, which is then closed
    ///
    /// # Returns
    ///
    /// * `Ok(OpResult)` - The child ran to completion (any exit code), or was
    ///   interrupted and `interrupted` is set
    /// * `Err(ExecError::InvalidArgument)` - Empty command or zero chunk size
    /// * `Err(ExecError::Io)` - Spawn, input write, or wait failed
    /// * `Err(ExecError::Timeout)` - The deadline passed and the child was killed
    pub fn execute<S: AsRef<str>>(
        self,
        command: &[S],
        env: Option<&EnvOverrides>,
        input: Option<&str>,
    ) -> Result<OpResult> {
        let Some((program, args)) = command.split_first() else {
            return Err(ExecError::InvalidArgument(
                "command must not be empty".to_string(),
            ));
        };
        let program = program.as_ref();
        let chunk_size = self.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE);
        if chunk_size == 0 {
            return Err(ExecError::InvalidArgument(
                "chunk size must be greater than 0".to_string(),
            ));
        }

        let mut cmd = Command::new(program);
        cmd.args(args.iter().map(AsRef::as_ref))
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // Merge environment variables
        if let Some(env) = env {
            cmd.envs(env.iter());
        }
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        debug!(program, args = args.len(), "spawning child process");
        let child = cmd
            .spawn()
            .map_err(|e| ExecError::io(format!("failed to spawn '{}'", program), e))?;
        let deadline = self.timeout.map(|timeout| Instant::now() + timeout);

        let mut invocation = Invocation::new(program, child);
        invocation.start_drainers(chunk_size)?;

        if let Some(input) = input {
            invocation.feed(input)?;
        }

        match invocation.wait(deadline, &self.interrupt)? {
            WaitOutcome::Exited(exit_code) => {
                debug!(program, exit_code, "child process exited");
                let drained = invocation.drain(deadline, Some(&self.interrupt));
                match drained.end {
                    DrainEnd::Complete => {
                        invocation.finish_input(Instant::now() + TEARDOWN_GRACE)?;
                        Ok(drained.into_result(exit_code, false))
                    }
                    DrainEnd::Interrupted => {
                        warn!(program, exit_code, "interrupted while collecting output");
                        Ok(drained.into_result(exit_code, true))
                    }
                    DrainEnd::DeadlinePassed => {
                        warn!(program, "child exited but its streams were still open at the deadline");
                        Err(self.timed_out(program))
                    }
                }
            }
            WaitOutcome::Interrupted => {
                let exit_code = invocation.terminate();
                let drained = invocation.drain(Some(Instant::now() + TEARDOWN_GRACE), None);
                let _ = invocation.finish_input(Instant::now() + TEARDOWN_GRACE);
                warn!(program, exit_code, "wait interrupted; returning output captured so far");
                Ok(drained.into_result(exit_code, true))
            }
            WaitOutcome::TimedOut => {
                invocation.terminate();
                let _ = invocation.drain(Some(Instant::now() + TEARDOWN_GRACE), None);
                let _ = invocation.finish_input(Instant::now() + TEARDOWN_GRACE);
                warn!(program, timeout = ?self.timeout, "child exceeded its timeout and was killed");
                Err(self.timed_out(program))
            }
        }
    }

    fn timed_out(&self, program: &str) -> ExecError {
        ExecError::Timeout {
            program: program.to_string(),
            timeout: self.timeout.unwrap_or_default(),
        }
    }
}

/// How collecting output ended.
enum DrainEnd {
    /// Both streams reached end-of-stream.
    Complete,
    Interrupted,
    DeadlinePassed,
}

/// Output collected from both streams.
struct Drained {
    output: String,
    errors: String,
    end: DrainEnd,
}

impl Drained {
    fn into_result(self, exit_code: i32, interrupted: bool) -> OpResult {
        OpResult {
            output: self.output,
            errors: self.errors,
            exit_code,
            interrupted,
        }
    }
}

/// One running child plus its drainers and input writer. Dropping it tears
/// everything down.
struct Invocation<'a> {
    program: &'a str,
    child: Child,
    stdout: Option<StreamDrainer>,
    stderr: Option<StreamDrainer>,
    writer: Option<JoinHandle<io::Result<()>>>,
}

impl<'a> Invocation<'a> {
    fn new(program: &'a str, child: Child) -> Self {
        Self {
            program,
            child,
            stdout: None,
            stderr: None,
            writer: None,
        }
    }

    /// Bind and start one drainer per output stream.
    fn start_drainers(&mut self, chunk_size: usize) -> Result<()> {
        let stdout = self.child.stdout.take().ok_or_else(|| {
            ExecError::io(
                format!("stdout of '{}' was not captured", self.program),
                io::Error::other("missing pipe"),
            )
        })?;
        let stderr = self.child.stderr.take().ok_or_else(|| {
            ExecError::io(
                format!("stderr of '{}' was not captured", self.program),
                io::Error::other("missing pipe"),
            )
        })?;

        let mut out = StreamDrainer::new("stdout", stdout)
            .with_program(self.program)
            .with_chunk_size(chunk_size)?;
        let mut err = StreamDrainer::new("stderr", stderr)
            .with_program(self.program)
            .with_chunk_size(chunk_size)?;
        out.start()?;
        err.start()?;
        self.stdout = Some(out);
        self.stderr = Some(err);
        Ok(())
    }

    /// Write the whole input on a writer thread, then close stdin so the child
    /// sees EOF. The caller goes on to wait, so a deadline also covers a child
    /// that never reads its input.
    fn feed(&mut self, input: &str) -> Result<()> {
        let Some(mut stdin) = self.child.stdin.take() else {
            return Ok(());
        };
        let data = input.as_bytes().to_vec();
        let handle = thread::Builder::new()
            .name("stdin-writer".to_string())
            .spawn(move || stdin.write_all(&data).and_then(|()| stdin.flush()))
            .map_err(|e| {
                ExecError::io(format!("failed to start input writer for '{}'", self.program), e)
            })?;
        trace!(program = self.program, bytes = input.len(), "input writer started");
        self.writer = Some(handle);
        Ok(())
    }

    /// Join the input writer, waiting for it until `deadline`.
    ///
    /// A child that exits or closes stdin before consuming everything is not
    /// an error; the rest of the input is discarded. A writer still blocked at
    /// the deadline is detached.
    fn finish_input(&mut self, deadline: Instant) -> Result<()> {
        let Some(handle) = self.writer.take() else {
            return Ok(());
        };
        let mut poll_interval = INITIAL_POLL_INTERVAL;
        while !handle.is_finished() {
            if Instant::now() >= deadline {
                debug!(program = self.program, "detaching input writer still blocked in write");
                return Ok(());
            }
            thread::sleep(poll_interval);
            poll_interval = (poll_interval * 2).min(MAX_POLL_INTERVAL);
        }

        let context = || format!("failed to write input to '{}'", self.program);
        match handle.join() {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) if e.kind() == ErrorKind::BrokenPipe => {
                debug!(program = self.program, "child closed stdin before reading all input");
                Ok(())
            }
            Ok(Err(e)) => Err(ExecError::io(context(), e)),
            Err(_) => Err(ExecError::io(context(), io::Error::other("input writer panicked"))),
        }
    }

    /// Wait for the child to exit, polling so deadlines and interrupts are seen.
    fn wait(&mut self, deadline: Option<Instant>, interrupt: &InterruptHandle) -> Result<WaitOutcome> {
        let mut poll_interval = INITIAL_POLL_INTERVAL;

        loop {
            match self.child.try_wait() {
                Ok(Some(status)) => return Ok(WaitOutcome::Exited(exit_code_of(status))),
                Ok(None) => {}
                Err(e) if e.kind() == ErrorKind::Interrupted => {
                    return Ok(WaitOutcome::Interrupted);
                }
                Err(e) => {
                    return Err(ExecError::io(
                        format!("failed to wait for '{}'", self.program),
                        e,
                    ));
                }
            }

            if interrupt.is_interrupted() {
                return Ok(WaitOutcome::Interrupted);
            }
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                return Ok(WaitOutcome::TimedOut);
            }

            thread::sleep(poll_interval);
            poll_interval = (poll_interval * 2).min(MAX_POLL_INTERVAL);
        }
    }

    /// Kill the child if it is still running and reap it. Returns its exit code.
    fn terminate(&mut self) -> i32 {
        if let Ok(Some(status)) = self.child.try_wait() {
            return exit_code_of(status);
        }
        // On Unix this is SIGKILL; on Windows it is TerminateProcess.
        let _ = self.child.kill();
        match self.child.wait() {
            Ok(status) => exit_code_of(status),
            Err(_) => -1,
        }
    }

    /// Collect both streams until they end, the deadline passes, or the
    /// interrupt fires.
    ///
    /// The streams are read in turns, one chunk each, so a stream that keeps
    /// producing cannot starve the other or outlast the deadline. Bytes are
    /// decoded as UTF-8 (lossy) after concatenation, so characters split
    /// across chunk boundaries survive.
    fn drain(&mut self, deadline: Option<Instant>, interrupt: Option<&InterruptHandle>) -> Drained {
        let mut output = Vec::new();
        let mut errors = Vec::new();
        let mut idle_interval = INITIAL_POLL_INTERVAL;

        let end = loop {
            let mut open = false;
            let mut progressed = false;
            for (drainer, bytes) in [
                (self.stdout.as_mut(), &mut output),
                (self.stderr.as_mut(), &mut errors),
            ] {
                let Some(drainer) = drainer else {
                    continue;
                };
                match drainer.fetch_chunk_timeout(Duration::ZERO) {
                    Ok(Fetch::Chunk(chunk)) => {
                        bytes.extend_from_slice(&chunk);
                        open = true;
                        progressed = true;
                    }
                    Ok(Fetch::Pending) => open = true,
                    Ok(Fetch::End) => {}
                    Err(e) => {
                        warn!(
                            program = self.program,
                            stream = drainer.name(),
                            error = %e,
                            "stream read failed; keeping data captured so far"
                        );
                    }
                }
            }

            if !open {
                break DrainEnd::Complete;
            }
            if interrupt.is_some_and(InterruptHandle::is_interrupted) {
                break DrainEnd::Interrupted;
            }
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                break DrainEnd::DeadlinePassed;
            }
            if progressed {
                idle_interval = INITIAL_POLL_INTERVAL;
            } else {
                thread::sleep(idle_interval);
                idle_interval = (idle_interval * 2).min(MAX_POLL_INTERVAL);
            }
        };

        trace!(
            program = self.program,
            stdout_bytes = output.len(),
            stderr_bytes = errors.len(),
            "collected child output"
        );
        Drained {
            output: String::from_utf8_lossy(&output).into_owned(),
            errors: String::from_utf8_lossy(&errors).into_owned(),
            end,
        }
    }
}

impl Drop for Invocation<'_> {
    fn drop(&mut self) {
        // Normally the child has already exited and been reaped.
        self.terminate();
        let _ = self.finish_input(Instant::now());
        if let Some(drainer) = self.stdout.as_mut() {
            drainer.close();
        }
        if let Some(drainer) = self.stderr.as_mut() {
            drainer.close();
        }
        trace!(program = self.program, "invocation torn down");
    }
}

/// Exit code of a finished child.
fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}

/// Execute `command` with a fresh default executor.
///
/// Convenience for callers that need neither a timeout nor an interrupt handle.
pub fn execute<S: AsRef<str>>(
    command: &[S],
    env: Option<&EnvOverrides>,
    input: Option<&str>,
) -> Result<OpResult> {
    ProcessExecutor::new().execute(command, env, input)
}
