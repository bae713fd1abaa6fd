//! Terminal progress bar for merges.
//!
//! [`ProgressBar`] renders [`MergeProgress`] updates on a single line:
//!
//! ```text
//! Processing b.pdf... [==================>                     ] 45% 0s
//! ```
//!
//! It is disabled when stdout is not a terminal.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use crate::merge::{MergePhase, MergeProgress, ProgressSink};

const BAR_WIDTH: usize = 40;

/// Single-line progress bar.
#[derive(Debug)]
pub struct ProgressBar {
    /// Completion in percent.
    percent: u8,
    /// Message shown before the bar.
    message: Option<String>,
    /// Start time of the operation.
    start_time: Instant,
    /// Whether the progress bar is enabled.
    enabled: bool,
    /// Whether something is currently drawn on the line.
    drawn: bool,
}

impl ProgressBar {
    /// Create a progress bar, enabled if stdout is a terminal.
    pub fn new() -> Self {
        Self {
            percent: 0,
            message: None,
            start_time: Instant::now(),
            enabled: Self::is_terminal(),
            drawn: false,
        }
    }

    /// Create a disabled progress bar (no output).
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new()
        }
    }

    fn is_terminal() -> bool {
        use std::io::IsTerminal;
        io::stdout().is_terminal()
    }

    /// Set the message to display with the progress bar.
    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    /// Move the bar to `percent`, capped at 100.
    pub fn set_percent(&mut self, percent: u8) {
        self.percent = percent.min(100);
        self.render();
    }

    /// Mark the progress bar as finished and end the line.
    pub fn finish(&mut self) {
        self.percent = 100;
        self.render();
        if self.enabled && self.drawn {
            println!();
            self.drawn = false;
        }
    }

    /// Clear the progress bar from the terminal.
    pub fn clear(&mut self) {
        if self.enabled && self.drawn {
            print!("\r\x1b[K");
            io::stdout().flush().ok();
        }
        self.drawn = false;
    }

    /// Current completion in percent.
    pub fn percent(&self) -> u8 {
        self.percent
    }

    /// Get the elapsed time since start.
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    fn render(&mut self) {
        if !self.enabled {
            return;
        }
        print!("\r\x1b[K{}", self.render_line());
        io::stdout().flush().ok();
        self.drawn = true;
    }

    fn render_line(&self) -> String {
        let filled = BAR_WIDTH * self.percent as usize / 100;
        let empty = BAR_WIDTH - filled;

        let bar = format!(
            "[{}{}]",
            "=".repeat(filled.saturating_sub(1)) + if filled > 0 { ">" } else { "" },
            " ".repeat(empty)
        );

        let mut parts = vec![
            bar,
            format!("{}%", self.percent),
            format_duration(self.elapsed()),
        ];

        if let Some(ref msg) = self.message {
            parts.insert(0, msg.clone());
        }

        parts.join(" ")
    }
}

impl Default for ProgressBar {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for ProgressBar {
    fn update(&mut self, progress: &MergeProgress) {
        if progress.phase == MergePhase::Loading {
            self.start_time = Instant::now();
        }
        self.set_message(progress.message.clone());

        match progress.phase {
            MergePhase::Done => self.finish(),
            MergePhase::Failed => self.clear(),
            _ => self.set_percent(progress.percent),
        }
    }

    fn reset(&mut self) {
        self.clear();
        self.percent = 0;
        self.message = None;
    }
}

/// Format a duration as a human-readable string.
fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();

    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}
