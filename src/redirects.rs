//! Pulls redirection operator/filename pairs out of the token stream and
//! opens the target files, leaving a clean argument vector behind.
//!
//! The open files are plain `std::fs::File`s, so every error return path
//! releases whatever was already opened when the struct is dropped. When
//! the same direction is redirected more than once, the last target wins
//! and the earlier file is closed on replacement.

use std::fs::{File, OpenOptions};

use crate::error::ShellError;
use crate::lexer::{self, Token};

/// Resolved redirections for a whole line: one optional input feeding the
/// pipeline head and one optional output receiving the pipeline tail.
#[derive(Debug, Default)]
pub struct Redirections {
    pub input: Option<File>,
    pub output: Option<File>,
}

fn operator_symbol(token: &Token) -> &'static str {
    match token {
        Token::Pipe => "|",
        Token::RedirectIn => "<",
        Token::RedirectOut => ">",
        Token::RedirectAppend => ">>",
        Token::Word(_) => "",
    }
}

fn open_target(op: &Token, name: &str) -> Result<File, ShellError> {
    let mut options = OpenOptions::new();
    match op {
        Token::RedirectIn => options.read(true),
        Token::RedirectOut => options.write(true).create(true).truncate(true),
        Token::RedirectAppend => options.write(true).create(true).append(true),
        _ => unreachable!("not a redirection operator"),
    };
    options.open(name).map_err(|source| ShellError::FileOpen {
        path: name.to_string(),
        source,
    })
}

/// Walk the expanded token sequence once, consuming redirections and
/// collecting everything else in order. A redirection operator missing its
/// filename, or a trailing pipe, is a syntax error that aborts the line.
pub fn split_args(tokens: Vec<Token>) -> Result<(Vec<Token>, Redirections), ShellError> {
    let mut clean = Vec::new();
    let mut redirs = Redirections::default();
    let mut iter = tokens.into_iter();

    while let Some(token) = iter.next() {
        match token {
            Token::RedirectIn | Token::RedirectOut | Token::RedirectAppend => {
                let name = match iter.next() {
                    Some(Token::Word(name)) => name,
                    Some(op) => return Err(ShellError::Syntax(operator_symbol(&op).to_string())),
                    None => return Err(ShellError::Syntax("newline".to_string())),
                };
                let file = open_target(&token, &lexer::literal(&name))?;
                match token {
                    Token::RedirectIn => redirs.input = Some(file),
                    _ => redirs.output = Some(file),
                }
            }
            other => clean.push(other),
        }
    }

    if clean.last() == Some(&Token::Pipe) {
        return Err(ShellError::Syntax("|".to_string()));
    }

    Ok((clean, redirs))
}
