//! Asynchronous signal delivery for the read-eval loop.
//!
//! Signals are received on a dedicated thread via `signal-hook`, so the
//! work done per signal runs in ordinary thread context instead of inside
//! a restricted handler. SIGINT redraws the prompt on a fresh line and
//! leaves running children alone; SIGCHLD drains every immediately
//! available child status without blocking, so near-simultaneous exits are
//! not missed, and marks the matching job records done. Removal and
//! reporting stay with the main loop.

use std::io::{self, Write};
use std::thread;

use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;
use signal_hook::consts::{SIGCHLD, SIGINT};
use signal_hook::iterator::Signals;

use crate::jobs::JobTable;
use crate::prompt::Prompt;

pub fn spawn(jobs: JobTable) -> io::Result<()> {
    let mut signals = Signals::new([SIGINT, SIGCHLD])?;

    thread::spawn(move || {
        for signal in signals.forever() {
            match signal {
                SIGINT => {
                    let mut out = io::stdout();
                    let _ = write!(out, "\n{}", Prompt::new().render());
                    let _ = out.flush();
                }
                SIGCHLD => reap(&jobs),
                _ => {}
            }
        }
    });

    Ok(())
}

/// Collect every child status that is available right now. Unknown pids
/// (foreground children, intermediate pipeline stages) are reaped all the
/// same, which is what keeps them from lingering as zombies.
fn reap(jobs: &JobTable) {
    let flags = WaitPidFlag::WNOHANG | WaitPidFlag::WUNTRACED | WaitPidFlag::WCONTINUED;

    loop {
        match waitpid(Pid::from_raw(-1), Some(flags)) {
            Ok(WaitStatus::Exited(pid, _)) | Ok(WaitStatus::Signaled(pid, _, _)) => {
                jobs.mark_done(pid);
            }
            Ok(WaitStatus::StillAlive) | Err(Errno::ECHILD) => break,
            Ok(_) => continue,
            Err(_) => break,
        }
    }
}
