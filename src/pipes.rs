//! Builds and runs a pipeline: splits the clean argument vector into
//! stages, allocates an anonymous pipe between each adjacent pair, and
//! spawns one process per stage with its standard streams rewired.
//!
//! Descriptor discipline: every pipe end and redirection target is an
//! `OwnedFd` with exactly one owner. A descriptor is handed to at most two
//! stages (writer, then reader) and dropped by the parent as soon as both
//! hand-offs happened, so downstream readers observe end-of-stream; the
//! child drops its copies right after `dup2`. Early error returns release
//! everything through the same ownership.

use std::ffi::CString;
use std::os::fd::{AsRawFd, OwnedFd};

use nix::errno::Errno;
use nix::sys::wait::waitpid;
use nix::unistd::{self, fork, ForkResult, Pid};

use crate::error::ShellError;
use crate::jobs::JobTable;
use crate::lexer::Token;
use crate::redirects::Redirections;

/// Split the clean argument vector on pipe markers. Each stage is a plain
/// argument vector; an empty stage means two adjacent pipes and is
/// rejected. A trailing pipe was already rejected by the argument
/// splitter, so a non-empty input always yields a non-empty last stage.
pub fn split_stages(tokens: &[Token]) -> Result<Vec<Vec<String>>, ShellError> {
    let mut stages = Vec::new();
    let mut current = Vec::new();

    for token in tokens {
        match token {
            Token::Word(w) => current.push(w.clone()),
            Token::Pipe => {
                if current.is_empty() {
                    return Err(ShellError::Syntax("|".to_string()));
                }
                stages.push(std::mem::take(&mut current));
            }
            _ => unreachable!("redirections are resolved before stage splitting"),
        }
    }

    if !current.is_empty() {
        stages.push(current);
    }
    Ok(stages)
}

/// Execute the pipeline left to right. The redirection input feeds the
/// first stage, the redirection output receives the last stage; everything
/// in between is connected by anonymous pipes. A foreground pipeline
/// blocks on the last stage only; earlier stages are reaped by the
/// child-exit notification thread. A background pipeline registers its
/// last stage in the job table and returns immediately.
pub fn run_pipeline(
    stages: Vec<Vec<String>>,
    redirs: Redirections,
    background: bool,
    jobs: &JobTable,
) -> Result<(), ShellError> {
    // argv for every stage is prepared up front: a bad argument anywhere
    // in the line costs zero processes, and the forked child only rewires
    // descriptors and execs
    let argvs: Vec<Vec<CString>> = stages
        .iter()
        .map(|stage| cstring_argv(stage))
        .collect::<Result<_, _>>()?;

    let count = argvs.len();
    let mut stdin_fd: Option<OwnedFd> = redirs.input.map(OwnedFd::from);
    let mut final_output: Option<OwnedFd> = redirs.output.map(OwnedFd::from);

    for (i, argv) in argvs.iter().enumerate() {
        let last = i + 1 == count;

        let (next_stdin, stdout_fd) = if last {
            (None, final_output.take())
        } else {
            let (read_end, write_end) = unistd::pipe()?;
            (Some(read_end), Some(write_end))
        };

        // the job record is claimed before the child exists; the
        // notification side blocks on the table until registration is
        // finished, so an instantly exiting child cannot slip past it
        let registration = (last && background).then(|| jobs.reserve());

        match unsafe { fork() }? {
            ForkResult::Child => {
                drop(next_stdin);
                drop(final_output.take());
                exec_stage(argv, stdin_fd.take(), stdout_fd);
            }
            ForkResult::Parent { child } => {
                drop(stdin_fd.take());
                drop(stdout_fd);
                stdin_fd = next_stdin;

                match registration {
                    Some(registration) => registration.add(child),
                    None if last => wait_foreground(child)?,
                    None => {}
                }
            }
        }
    }

    Ok(())
}

fn cstring_argv(stage: &[String]) -> Result<Vec<CString>, ShellError> {
    stage
        .iter()
        .map(|arg| CString::new(arg.as_str()).map_err(ShellError::from))
        .collect()
}

/// Child side of a stage: duplicate the assigned descriptors onto the
/// standard streams, close the originals, and exec. On exec failure the
/// child exits with the conventional not-found status; the parent pipeline
/// is unaffected.
fn exec_stage(argv: &[CString], fd_in: Option<OwnedFd>, fd_out: Option<OwnedFd>) -> ! {
    if let Some(fd) = fd_in {
        if unsafe { libc::dup2(fd.as_raw_fd(), libc::STDIN_FILENO) } < 0 {
            unsafe { libc::_exit(126) }
        }
    }
    if let Some(fd) = fd_out {
        if unsafe { libc::dup2(fd.as_raw_fd(), libc::STDOUT_FILENO) } < 0 {
            unsafe { libc::_exit(126) }
        }
    }

    let _ = unistd::execvp(&argv[0], argv);
    unsafe { libc::_exit(127) }
}

/// Block until the pid terminates. EINTR is retried; ECHILD means the
/// child-exit notification thread reaped it first, which counts as done.
fn wait_foreground(pid: Pid) -> Result<(), ShellError> {
    loop {
        match waitpid(pid, None) {
            Ok(_) => return Ok(()),
            Err(Errno::EINTR) => continue,
            Err(Errno::ECHILD) => return Ok(()),
            Err(e) => return Err(e.into()),
        }
    }
}
