use std::env;
use std::process;

mod builtins;
mod error;
mod expand;
mod jobs;
mod lexer;
mod lookup;
mod pipes;
mod prompt;
mod redirects;
mod shell;
mod signals;

fn print_help() {
    println!("sush - a small pipeline shell");
    println!();
    println!("Usage: sush [OPTIONS]");
    println!("  -h, --help       Print this help");
    println!("  -v, --version    Print version");
}

fn print_version() {
    println!("sush {}", env!("CARGO_PKG_VERSION"));
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "-h" || a == "--help") {
        print_help();
        process::exit(0);
    }

    if args.iter().any(|a| a == "-v" || a == "--version" || a == "-V") {
        print_version();
        process::exit(0);
    }

    let mut shell = shell::Shell::new();
    shell.run();
}
