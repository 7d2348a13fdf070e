//! Terminal output for the CLI
//!
//! Progress and results go to stdout, errors to stderr. Without colors every
//! status marker becomes a bracketed ASCII tag so logs stay greppable.

use owo_colors::{OwoColorize, Style};

const COLUMN_WIDTH: usize = 15;

/// Kind of status line, deciding its marker and color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    Success,
    Info,
    Warning,
    Error,
}

impl Tone {
    fn glyph(self) -> &'static str {
        match self {
            Tone::Success => "✓",
            Tone::Info => "•",
            Tone::Warning => "⚠",
            Tone::Error => "✗",
        }
    }

    fn tag(self) -> &'static str {
        match self {
            Tone::Success => "[OK]",
            Tone::Info => "[INFO]",
            Tone::Warning => "[WARN]",
            Tone::Error => "[ERROR]",
        }
    }

    fn style(self) -> Style {
        match self {
            Tone::Success => Style::new().green(),
            Tone::Info => Style::new(),
            Tone::Warning => Style::new().yellow(),
            Tone::Error => Style::new().red(),
        }
    }
}

/// Terminal printer; `colored` switches between ANSI styling and plain tags.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    pub fn new() -> Self {
        Self { colored: true }
    }

    pub fn no_color() -> Self {
        Self { colored: false }
    }

    fn paint(&self, text: &str, style: Style) -> String {
        if self.colored {
            text.style(style).to_string()
        } else {
            text.to_string()
        }
    }

    fn status_line(&self, tone: Tone, message: &str) -> String {
        if self.colored {
            let glyph_text = tone.glyph();
            let glyph = glyph_text.style(tone.style().bold());
            format!("  {} {}", glyph, message.style(tone.style()))
        } else {
            format!("  {} {}", tone.tag(), message)
        }
    }

    pub fn banner(&self) {
        let name = self.paint("research-panel", Style::new().bright_cyan().bold());
        let version = self.paint(&format!("v{}", env!("CARGO_PKG_VERSION")), Style::new().dimmed());
        println!("\n  {} {}\n", name, version);
    }

    pub fn success(&self, message: &str) {
        println!("{}", self.status_line(Tone::Success, message));
    }

    pub fn info(&self, message: &str) {
        println!("{}", self.status_line(Tone::Info, message));
    }

    pub fn warning(&self, message: &str) {
        println!("{}", self.status_line(Tone::Warning, message));
    }

    /// Errors go to stderr so a redirected report stays clean.
    pub fn error(&self, message: &str) {
        eprintln!("{}", self.status_line(Tone::Error, message));
    }

    /// `[i/n] message` progress line for iterations.
    pub fn step(&self, current: u32, total: u32, message: &str) {
        let counter = self.paint(&format!("[{}/{}]", current, total), Style::new().dimmed());
        println!("  {} {}", counter, self.paint(message, Style::new().bright_white()));
    }

    pub fn header(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.bright_white().bold().underline());
        } else {
            println!("\n  === {} ===", title);
        }
    }

    pub fn subheader(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.cyan().bold());
        } else {
            println!("\n  --- {} ---", title);
        }
    }

    pub fn kv(&self, key: &str, value: &str) {
        println!(
            "    {}: {}",
            self.paint(key, Style::new().dimmed()),
            self.paint(value, Style::new().bright_white())
        );
    }

    pub fn list_item(&self, item: &str) {
        let bullet = if self.colored { "•".blue().to_string() } else { "-".to_string() };
        println!("    {} {}", bullet, item);
    }

    pub fn hint(&self, message: &str) {
        if self.colored {
            println!("\n  {}", message.dimmed().italic());
        } else {
            println!("\n  [TIP] {}", message);
        }
    }

    pub fn table_header(&self, columns: &[&str]) {
        let rule_char = if self.colored { "─" } else { "-" };
        let rule = rule_char.repeat(columns.len() * (COLUMN_WIDTH + 1));
        println!("    {}", self.paint(&table_line(columns), Style::new().bright_white().bold()));
        println!("    {}", self.paint(&rule, Style::new().dimmed()));
    }

    pub fn table_row(&self, values: &[&str]) {
        println!("    {}", table_line(values));
    }

    /// Report text, printed as-is.
    pub fn document(&self, text: &str) {
        println!("\n{}", text);
    }

    pub fn newline(&self) {
        println!();
    }
}

fn table_line(cells: &[&str]) -> String {
    cells
        .iter()
        .map(|cell| format!("{:<width$}", cell, width = COLUMN_WIDTH))
        .collect::<Vec<_>>()
        .join(" ")
}
