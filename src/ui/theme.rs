use owo_colors::Style;
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

/// What a piece of CLI output is saying, independent of how it is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Heading,
    Recorded,
    Failed,
    Pending,
    Label,
}

/// Styles for each [`Tone`].
#[derive(Debug, Clone)]
pub struct Theme {
    heading: Style,
    recorded: Style,
    failed: Style,
    pending: Style,
    label: Style,
}

impl Theme {
    /// Build the theme for a stream that is (or is not) allowed color.
    pub fn for_terminal(colored: bool) -> Self {
        if !colored {
            return Self {
                heading: Style::new(),
                recorded: Style::new(),
                failed: Style::new(),
                pending: Style::new(),
                label: Style::new(),
            };
        }
        Self {
            heading: Style::new().yellow().bold(),
            recorded: Style::new().green().bold(),
            failed: Style::new().red().bold(),
            pending: Style::new().yellow(),
            label: Style::new().bright_black(),
        }
    }

    pub fn style(&self, tone: Tone) -> Style {
        match tone {
            Tone::Heading => self.heading.clone(),
            Tone::Recorded => self.recorded.clone(),
            Tone::Failed => self.failed.clone(),
            Tone::Pending => self.pending.clone(),
            Tone::Label => self.label.clone(),
        }
    }
}

/// Process-wide theme; honors `NO_COLOR`/`CLICOLOR` and piped stdout.
pub fn theme() -> &'static Theme {
    THEME.get_or_init(|| Theme::for_terminal(console::colors_enabled()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use owo_colors::OwoColorize;

    #[test]
    fn test_plain_theme_leaves_text_untouched() {
        let plain = Theme::for_terminal(false);
        for tone in [Tone::Heading, Tone::Recorded, Tone::Failed, Tone::Pending, Tone::Label] {
            assert_eq!("820 pts".style(plain.style(tone)).to_string(), "820 pts");
        }
    }

    #[test]
    fn test_colored_theme_emits_escapes() {
        let colored = Theme::for_terminal(true);
        let painted = "ada".style(colored.style(Tone::Failed)).to_string();
        assert!(painted.contains("\u{1b}["));
        assert!(painted.contains("ada"));
    }
}
