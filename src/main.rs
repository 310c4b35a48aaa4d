#[cfg(feature = "cli")]
use colored::Colorize;
#[cfg(feature = "cli")]
use getcerts::{cli::run_cli, Error};

/// Bad input (unreadable host list, malformed CSV) exits 2; a failed probe
/// in single-target mode exits 1.
#[cfg(feature = "cli")]
fn exit_code(err: &Error) -> i32 {
    match err {
        Error::Csv(_) | Error::InvalidInput(_) | Error::Io(_) => 2,
        _ => 1,
    }
}

#[cfg(feature = "cli")]
fn main() {
    if let Err(e) = run_cli() {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(exit_code(&e));
    }
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("getcerts was built without the 'cli' feature.");
    eprintln!("Rebuild with: cargo build --features cli");
    std::process::exit(1);
}
