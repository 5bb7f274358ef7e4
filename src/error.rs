use thiserror::Error;

/// Everything that can abort processing of a single input line. None of
/// these are fatal to the shell itself; the read-eval loop reports the
/// error and moves on to the next line.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("syntax error near \"{0}\"")]
    Syntax(String),

    #[error("couldn't open \"{path}\"")]
    FileOpen {
        path: String,
        source: std::io::Error,
    },

    #[error("{0}: command not found")]
    UnknownCommand(String),

    #[error("argument contains an interior NUL byte")]
    Nul(#[from] std::ffi::NulError),

    #[error(transparent)]
    Sys(#[from] nix::Error),
}
