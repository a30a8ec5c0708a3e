//! Terminal utilities for colour and title handling

use console::{Style, StyledObject};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::time::Duration;

use crate::git::Tone;

/// Explicit colour switch threaded through every report.
///
/// Built once in `main` from `--no-color` and `NO_COLOR`; nothing reads
/// global state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    pub enabled: bool,
}

impl Default for Palette {
    fn default() -> Self {
        Self::plain()
    }
}

impl Palette {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn plain() -> Self {
        Self { enabled: false }
    }

    /// Colour on a capable terminal unless `no_color` is set or `NO_COLOR` is present
    pub fn from_env(no_color: bool) -> Self {
        if no_color || std::env::var_os("NO_COLOR").is_some() {
            return Self::plain();
        }
        Self::new(console::Term::stdout().features().colors_supported())
    }

    fn paint<D>(&self, style: Style, value: D) -> StyledObject<D> {
        style.force_styling(self.enabled).apply_to(value)
    }

    pub fn good<D>(&self, value: D) -> StyledObject<D> {
        self.paint(Style::new().green(), value)
    }

    pub fn attention<D>(&self, value: D) -> StyledObject<D> {
        self.paint(Style::new().yellow(), value)
    }

    pub fn bad<D>(&self, value: D) -> StyledObject<D> {
        self.paint(Style::new().red(), value)
    }

    pub fn bold<D>(&self, value: D) -> StyledObject<D> {
        self.paint(Style::new().bold(), value)
    }

    pub fn dim<D>(&self, value: D) -> StyledObject<D> {
        self.paint(Style::new().dim(), value)
    }

    pub fn tone<D>(&self, tone: Tone, value: D) -> StyledObject<D> {
        match tone {
            Tone::Good => self.good(value),
            Tone::Attention => self.attention(value),
            Tone::Bad => self.bad(value),
        }
    }
}

const SPINNER_TEMPLATE: &str = "{spinner} {msg}";
const SPINNER_TICK_MS: u64 = 80;

/// Spinner on stderr for a long scan; hidden when colour is off
pub fn spinner(palette: Palette, message: &str) -> ProgressBar {
    if !palette.enabled {
        return ProgressBar::hidden();
    }
    let style = ProgressStyle::default_spinner()
        .template(SPINNER_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    let pb = ProgressBar::new_spinner();
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
    pb
}

/// Sets the terminal title to the specified text
pub fn set_terminal_title(title: &str) {
    // ANSI escape sequence to set terminal title
    print!("\x1b]0;{}\x07", title);
    let _ = std::io::stdout().flush();
}
