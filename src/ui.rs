//! Console output helpers.
//!
//! Progress lines go to stdout, warnings and errors to stderr.

use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

const BANNER: &str = r#"
╔═══════════════════════════════╗
║  b e t t e r                  ║
║  t e r m i n a l              ║
╚═══════════════════════════════╝
"#;

pub fn print_banner() {
    println!("{}", style(BANNER).cyan());
}

pub fn header(title: &str) {
    println!();
    println!("{}", style(title).bold().cyan());
    println!();
}

pub fn step(message: &str) {
    println!("  {} {}", style("▸").cyan(), message);
}

pub fn success(message: &str) {
    println!("  {} {}", style("✓").green().bold(), message);
}

pub fn info(message: &str) {
    println!("  {} {}", style("→").dim(), message);
}

pub fn warn(message: &str) {
    eprintln!("  {} {}", style("!").yellow().bold(), message);
}

pub fn error(message: &str) {
    eprintln!("  {} {}", style("✕").red().bold(), message);
}

pub fn dim(message: &str) {
    println!("  {}", style(message).dim());
}

/// Echo a command before it runs.
pub fn command(cmdline: &str) {
    println!("    {}", style(format!("$ {}", cmdline)).dim());
}

/// Spinner shown while a blocking download or command is in flight.
/// Cleared when dropped, including on early returns.
pub struct Spinner(ProgressBar);

pub fn spinner(message: impl Into<String>) -> Spinner {
    let pb = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::with_template("    {spinner:.cyan} {msg}") {
        pb.set_style(template);
    }
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(80));
    Spinner(pb)
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.0.finish_and_clear();
    }
}
