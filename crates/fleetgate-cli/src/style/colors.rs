//! Semantic palette for permission verdicts.

use owo_colors::{OwoColorize, Style};

fn paint(value: &dyn std::fmt::Display, style: Style) -> String {
    if super::no_color() {
        value.to_string()
    } else {
        value.style(style).to_string()
    }
}

/// Extension applying the CLI palette to anything displayable.
pub trait SemanticStyle {
    /// Granted capability or success (green bold).
    fn granted(&self) -> String;
    /// Denied capability or failure (red bold).
    fn denied(&self) -> String;
    /// Something the user should look at (yellow).
    fn warning(&self) -> String;
    /// Secondary text (dimmed).
    fn muted(&self) -> String;
    /// Section headings (bold).
    fn header(&self) -> String;
    /// Keys, slugs, and paths (blue).
    fn code(&self) -> String;
}

impl<T: std::fmt::Display> SemanticStyle for T {
    fn granted(&self) -> String {
        paint(self, Style::new().green().bold())
    }

    fn denied(&self) -> String {
        paint(self, Style::new().red().bold())
    }

    fn warning(&self) -> String {
        paint(self, Style::new().yellow())
    }

    fn muted(&self) -> String {
        paint(self, Style::new().dimmed())
    }

    fn header(&self) -> String {
        paint(self, Style::new().bold())
    }

    fn code(&self) -> String {
        paint(self, Style::new().blue())
    }
}
