use colored::*;
use std::io::Write;

pub fn print_header(text: &str) {
    println!("\n{}", text.bright_cyan().bold());
    println!("{}", "=".repeat(text.chars().count()).bright_cyan());
}

pub fn print_success(text: &str) {
    println!("{}", text.green());
}

pub fn print_error(text: &str) {
    eprintln!("{}", text.red().bold());
}

pub fn print_info(text: &str) {
    println!("{}", text.blue());
}

pub fn print_prompt(text: &str) {
    print!("{}", text.yellow().bold());
    let _ = std::io::stdout().flush();
}

/// Suffix of `current` not yet printed, or `None` when `current` no longer
/// extends `shown` and nothing should be printed.
pub fn unseen_suffix<'a>(shown: &str, current: &'a str) -> Option<&'a str> {
    current.strip_prefix(shown).filter(|rest| !rest.is_empty())
}

/// Print the growth of a revealing message, remembering what was printed.
pub fn print_growth(shown: &mut String, current: &str) {
    if let Some(rest) = unseen_suffix(shown, current) {
        print!("{}", rest);
        let _ = std::io::stdout().flush();
        shown.push_str(rest);
    }
}
