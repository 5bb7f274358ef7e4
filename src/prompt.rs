use colored::Colorize;
use std::env;
use std::io::{self, Write};

pub struct Prompt;

impl Prompt {
    pub fn new() -> Self {
        Self
    }

    /// Current directory with `$HOME` abbreviated to `~`, in bold green.
    pub fn render(&self) -> String {
        let cwd = env::current_dir()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| String::from("?"));

        let cwd = match env::var("HOME") {
            Ok(home) if cwd == home => String::from("~"),
            Ok(home) if cwd.starts_with(&format!("{}/", home)) => {
                format!("~{}", &cwd[home.len()..])
            }
            _ => cwd,
        };

        format!("{} ", format!("{} λ", cwd).green().bold())
    }

    pub fn display(&self) {
        print!("{}", self.render());
        let _ = io::stdout().flush();
    }
}
