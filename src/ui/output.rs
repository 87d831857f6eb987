use crate::ui::theme::Tone;
use crate::ui::{theme, Icons};
use owo_colors::OwoColorize;

fn paint(text: &str, tone: Tone) -> String {
    text.style(theme().style(tone)).to_string()
}

pub fn header(text: &str) {
    println!("{} {}", Icons::TROPHY, paint(text, Tone::Heading));
}

pub fn success(label: &str) {
    println!("{} {}", Icons::CHECK, paint(label, Tone::Recorded));
}

pub fn error(label: &str) {
    eprintln!("{} {}", Icons::CROSS, paint(label, Tone::Failed));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, paint(label, Tone::Pending));
}

pub fn info(label: &str, value: &str) {
    println!("{} {}: {}", Icons::INFO, paint(label, Tone::Label), value);
}

pub fn summary_row(label: &str, value: &str) {
    println!("  {} {}", paint(label, Tone::Label), value);
}
