//! Coloured terminal output.

use owo_colors::{OwoColorize, Style};

/// Applies `style` if stdout supports colours.
fn paint(text: &str, style: Style) -> String {
    if supports_color::on(supports_color::Stream::Stdout).is_some() {
        text.style(style).to_string()
    } else {
        text.to_string()
    }
}

/// Styles for the kinds of text the CLI prints.
pub trait Colorize {
    /// Green.
    fn success(&self) -> String;
    /// Yellow.
    fn warning(&self) -> String;
    /// Bold.
    fn heading(&self) -> String;
    /// Dimmed.
    fn dim(&self) -> String;
}

impl Colorize for str {
    fn success(&self) -> String {
        paint(self, Style::new().green())
    }

    fn warning(&self) -> String {
        paint(self, Style::new().yellow())
    }

    fn heading(&self) -> String {
        paint(self, Style::new().bold())
    }

    fn dim(&self) -> String {
        paint(self, Style::new().dimmed())
    }
}
