//! Commands handled inside the shell process itself. They are matched by
//! name before the external-command lookup runs.

use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Cd,
    Help,
    Exit,
}

impl Builtin {
    pub fn lookup(name: &str) -> Option<Builtin> {
        match name {
            "cd" => Some(Builtin::Cd),
            "help" => Some(Builtin::Help),
            "exit" => Some(Builtin::Exit),
            _ => None,
        }
    }

    /// Run the builtin with the stage's argument vector (program name at
    /// index 0). Failures are reported and never abort the shell.
    pub fn run(&self, args: &[String]) {
        match self {
            Builtin::Cd => {
                let home = env::var("HOME").unwrap_or_else(|_| "/".to_string());
                let target = args.get(1).cloned().unwrap_or(home);
                if let Err(e) = env::set_current_dir(&target) {
                    eprintln!("cd: {}: {}", target, e);
                }
            }
            Builtin::Help => {
                println!("sush {}, a small pipeline shell", env!("CARGO_PKG_VERSION"));
            }
            Builtin::Exit => {
                println!("exit");
                std::process::exit(0);
            }
        }
    }
}
