//! Status lines for the CLI. Results go to stdout, problems and progress to
//! stderr; each stream is colored only when it is a terminal.

use console::Term;
use owo_colors::{OwoColorize, Style};
use std::sync::OnceLock;

pub struct Icons;

impl Icons {
    pub const INGEST: &str = "🚀";
    pub const PASS: &str = "✅";
    pub const FAIL: &str = "❌";
    pub const WARN: &str = "⚠️";
    pub const INFO: &str = "ℹ️";
    pub const STORE: &str = "📊";
    pub const RESOLVED: &str = "🔗";
}

#[derive(Debug, Clone)]
pub(crate) struct Palette {
    pub heading: Style,
    pub pass: Style,
    pub fail: Style,
    pub warn: Style,
    pub marker: Style,
    pub muted: Style,
}

impl Palette {
    fn for_term(term: &Term) -> Self {
        if term.is_term() {
            Self::colored()
        } else {
            Self::plain()
        }
    }

    fn colored() -> Self {
        Self {
            heading: Style::new().cyan().bold(),
            pass: Style::new().green().bold(),
            fail: Style::new().red().bold(),
            warn: Style::new().yellow().bold(),
            marker: Style::new().magenta(),
            muted: Style::new().white().dimmed(),
        }
    }

    fn plain() -> Self {
        Self {
            heading: Style::new(),
            pass: Style::new(),
            fail: Style::new(),
            warn: Style::new(),
            marker: Style::new(),
            muted: Style::new(),
        }
    }
}

fn stdout_palette() -> &'static Palette {
    static PALETTE: OnceLock<Palette> = OnceLock::new();
    PALETTE.get_or_init(|| Palette::for_term(&Term::stdout()))
}

pub(crate) fn stderr_palette() -> &'static Palette {
    static PALETTE: OnceLock<Palette> = OnceLock::new();
    PALETTE.get_or_init(|| Palette::for_term(&Term::stderr()))
}

pub fn header(icon: &str, text: &str) {
    println!("{} {}", icon, text.style(stdout_palette().heading.clone()));
}

pub fn success(label: &str) {
    println!("{} {}", Icons::PASS, label.style(stdout_palette().pass.clone()));
}

pub fn error(label: &str) {
    eprintln!("{} {}", Icons::FAIL, label.style(stderr_palette().fail.clone()));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, label.style(stderr_palette().warn.clone()));
}

pub fn info(label: &str, value: &str) {
    let palette = stdout_palette();
    println!(
        "{} {}: {}",
        Icons::INFO.style(palette.marker.clone()),
        label.style(palette.muted.clone()),
        value
    );
}

pub fn section(title: &str) {
    println!();
    println!("━{}━", title.style(stdout_palette().heading.clone()));
}

/// One line per CRUD check
pub fn check_passed(name: &str) {
    println!("  {} {}", Icons::PASS, name.style(stdout_palette().pass.clone()));
}

pub fn check_failed(name: &str, reason: &str) {
    let palette = stdout_palette();
    println!(
        "  {} {} {}",
        Icons::FAIL,
        name.style(palette.fail.clone()),
        reason.style(palette.muted.clone())
    );
}

pub fn summary_row(label: &str, value: &str) {
    println!("  {} {}", label.style(stdout_palette().muted.clone()), value);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_palette_adds_no_escapes() {
        let palette = Palette::plain();
        let shown = format!("{}", "failed".style(palette.fail.clone()));
        assert_eq!(shown, "failed");
    }

    #[test]
    fn test_colored_palette_styles_text() {
        let palette = Palette::colored();
        let shown = format!("{}", "failed".style(palette.fail.clone()));
        assert_ne!(shown, "failed");
        assert!(shown.contains("failed"));
    }
}
