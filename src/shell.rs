//! The read-eval loop: reads logical lines (with continuation), cuts them
//! into statements on unquoted `;`/`&`, and runs each statement as a
//! builtin or an external pipeline. Job completions noticed since the last
//! iteration are reported at the top of every iteration.

use std::io::{self, BufRead, Write};

use crate::builtins::Builtin;
use crate::error::ShellError;
use crate::expand;
use crate::jobs::JobTable;
use crate::lexer::{self, Continuation};
use crate::lookup;
use crate::pipes;
use crate::prompt::Prompt;
use crate::redirects;
use crate::signals;

struct Statement {
    text: String,
    background: bool,
}

pub struct Shell {
    prompt: Prompt,
    jobs: JobTable,
    /// Statement text left over after a `;` or `&` terminator; consumed
    /// before any new line is read, without showing the prompt again.
    pending: String,
}

impl Shell {
    pub fn new() -> Self {
        Self {
            prompt: Prompt::new(),
            jobs: JobTable::new(),
            pending: String::new(),
        }
    }

    pub fn run(&mut self) {
        if let Err(e) = signals::spawn(self.jobs.clone()) {
            eprintln!("sush: can't install signal handling: {}", e);
        }

        loop {
            self.jobs.reconcile();

            let statement = match self.next_statement() {
                Ok(Some(statement)) => statement,
                Ok(None) => break,
                Err(e) => {
                    eprintln!("sush: read error: {}", e);
                    break;
                }
            };

            if let Err(e) = self.eval(&statement.text, statement.background) {
                eprintln!("{}", e);
            }
        }
    }

    /// Produce the next non-empty statement, reading a new logical line
    /// only when nothing is pending. Returns `None` at end of input.
    fn next_statement(&mut self) -> io::Result<Option<Statement>> {
        loop {
            if self.pending.is_empty() {
                match self.read_logical_line()? {
                    Some(line) => self.pending = line,
                    None => return Ok(None),
                }
            }

            let input = std::mem::take(&mut self.pending);
            let (text, background, rest) = lexer::split_statement(&input);
            let text = text.trim().to_string();
            self.pending = rest.unwrap_or("").to_string();

            if text.is_empty() {
                continue;
            }
            return Ok(Some(Statement { text, background }));
        }
    }

    /// Read one logical line, joining physical lines while a quote is
    /// still open (joined with a newline) or the line ends in a backslash
    /// (spliced with a space). Continuation is indicated with `> `.
    fn read_logical_line(&mut self) -> io::Result<Option<String>> {
        self.prompt.display();

        let mut logical = String::new();
        loop {
            let mut line = String::new();
            if io::stdin().lock().read_line(&mut line)? == 0 {
                // end of input; hand back whatever was accumulated
                return Ok(if logical.is_empty() { None } else { Some(logical) });
            }
            logical.push_str(line.trim_end_matches('\n'));

            match lexer::needs_continuation(&logical) {
                Continuation::Complete => return Ok(Some(logical)),
                Continuation::Quote => logical.push('\n'),
                Continuation::Backslash => {
                    logical.pop();
                    logical.push(' ');
                }
            }

            print!("> ");
            io::stdout().flush()?;
        }
    }

    /// Parse and execute one statement.
    fn eval(&mut self, line: &str, background: bool) -> Result<(), ShellError> {
        let tokens = lexer::tokenize(line);
        let tokens = expand::expand_tokens(tokens);

        let (clean, redirs) = redirects::split_args(tokens)?;
        if clean.is_empty() {
            // a line of pure redirections opens the files and runs nothing
            return Ok(());
        }

        let stages = pipes::split_stages(&clean)?;

        if let Some(builtin) = Builtin::lookup(&stages[0][0]) {
            builtin.run(&stages[0]);
            return Ok(());
        }

        // every stage is checked before anything is spawned, so a typo in
        // the middle of a pipeline costs no processes at all
        for stage in &stages {
            if lookup::find_command(&stage[0]).is_none() {
                return Err(ShellError::UnknownCommand(stage[0].clone()));
            }
        }

        pipes::run_pipeline(stages, redirs, background, &self.jobs)
    }
}
