//! Subprocess plumbing: one fresh child per call, optional deadline enforced by a
//! watchdog thread that kills the child.

use std::io::{self, Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};

/// Kills the child if it is still running when the deadline passes.
struct Watchdog {
    done: Sender<()>,
    handle: JoinHandle<bool>,
}

impl Watchdog {
    fn arm(child: Arc<Mutex<Child>>, timeout: Duration) -> Self {
        let (done, rx) = bounded::<()>(1);
        let handle = thread::spawn(move || match rx.recv_timeout(timeout) {
            Err(RecvTimeoutError::Timeout) => {
                if let Ok(mut child) = child.lock() {
                    let _ = child.kill();
                }
                true
            }
            _ => false,
        });
        Self { done, handle }
    }

    /// Stops the watchdog. Returns `true` if it fired.
    fn disarm(self) -> bool {
        let _ = self.done.try_send(());
        self.handle.join().unwrap_or(false)
    }
}

/// How a child process ended.
#[derive(Debug)]
pub struct Finished {
    pub status: ExitStatus,
    pub timed_out: bool,
}

impl Finished {
    /// Exit code, -1 when the process was terminated by a signal.
    pub fn code(&self) -> i32 {
        self.status.code().unwrap_or(-1)
    }
}

fn spawn_guarded(cmd: &mut Command, timeout: Option<Duration>) -> io::Result<(Arc<Mutex<Child>>, Option<Watchdog>)> {
    let child = Arc::new(Mutex::new(cmd.spawn()?));
    let watchdog = timeout.map(|t| Watchdog::arm(child.clone(), t));
    Ok((child, watchdog))
}

fn finish(child: &Arc<Mutex<Child>>, watchdog: Option<Watchdog>) -> io::Result<Finished> {
    let timed_out = watchdog.map(Watchdog::disarm).unwrap_or(false);
    let status = child
        .lock()
        .map_err(|_| io::Error::new(io::ErrorKind::Other, "child handle poisoned"))?
        .wait()?;
    Ok(Finished { status, timed_out })
}

/// Runs `cmd` to completion, returning its stdout followed by its stderr.
pub fn run_captured(cmd: &mut Command, timeout: Option<Duration>) -> io::Result<(Finished, Vec<u8>)> {
    cmd.stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());
    let (child, watchdog) = spawn_guarded(cmd, timeout)?;

    let (stdout, stderr) = {
        let mut guard = child
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "child handle poisoned"))?;
        (guard.stdout.take(), guard.stderr.take())
    };

    let stderr_reader = thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut err) = stderr {
            let _ = err.read_to_end(&mut buf);
        }
        buf
    });

    let mut output = Vec::new();
    if let Some(mut out) = stdout {
        out.read_to_end(&mut output)?;
    }
    output.extend(stderr_reader.join().unwrap_or_default());

    Ok((finish(&child, watchdog)?, output))
}

/// Runs `cmd`, copying its stdout into `sink` as it arrives. Stderr is collected and
/// returned for diagnostics.
pub fn run_streaming(
    cmd: &mut Command,
    sink: &mut dyn Write,
    timeout: Option<Duration>,
) -> io::Result<(Finished, u64, Vec<u8>)> {
    cmd.stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());
    let (child, watchdog) = spawn_guarded(cmd, timeout)?;

    let (stdout, stderr) = {
        let mut guard = child
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "child handle poisoned"))?;
        (guard.stdout.take(), guard.stderr.take())
    };

    let stderr_reader = thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut err) = stderr {
            let _ = err.read_to_end(&mut buf);
        }
        buf
    });

    let copied = match stdout {
        Some(mut out) => match io::copy(&mut out, &mut *sink) {
            Ok(n) => n,
            Err(e) => {
                // The client went away; stop the child instead of letting it block on a full pipe.
                if let Ok(mut c) = child.lock() {
                    let _ = c.kill();
                }
                let _ = finish(&child, watchdog);
                return Err(e);
            }
        },
        None => 0,
    };
    sink.flush()?;
    let stderr_bytes = stderr_reader.join().unwrap_or_default();

    Ok((finish(&child, watchdog)?, copied, stderr_bytes))
}
