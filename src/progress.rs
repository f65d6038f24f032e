//! Progress reporting for long-running operations.
//!
//! Operations report through a [`ProgressSink`]: fire-and-forget, no
//! backpressure, consumed by whatever presentation layer is attached. Each
//! operation maps its per-page position into a fixed percentage window so
//! the overall number is monotone and never reaches 100 before the last
//! step completes.

use std::io::{self, IsTerminal, Write};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Sink for progress reports.
///
/// Implementations must not block the caller; a report is advisory and may
/// be dropped or rate-limited freely.
pub trait ProgressSink: Send + Sync {
    /// Report progress.
    ///
    /// # Arguments
    ///
    /// * `percent` - overall completion, 0-100, monotone per operation
    /// * `stage` - short label for the current stage ("Assembling", ...)
    /// * `current` - items completed within the stage
    /// * `total` - total items in the stage
    fn report(&self, percent: u8, stage: &str, current: usize, total: usize);
}

/// Sink that discards all reports.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn report(&self, _percent: u8, _stage: &str, _current: usize, _total: usize) {}
}

/// A percentage window an operation maps its per-item progress into.
///
/// Document export reports pages in 10..=90, archive export in 0..=80 and
/// import in 20..=95, leaving headroom for finalize steps; these are the
/// windows the desktop progress overlay was built around.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressWindow {
    start: u8,
    end: u8,
}

/// Window used while pages are added to a combined document.
pub const DOCUMENT_WINDOW: ProgressWindow = ProgressWindow { start: 10, end: 90 };

/// Window used while per-page archive entries are produced.
pub const ARCHIVE_WINDOW: ProgressWindow = ProgressWindow { start: 0, end: 80 };

/// Window used while source files are imported.
pub const IMPORT_WINDOW: ProgressWindow = ProgressWindow { start: 20, end: 95 };

impl ProgressWindow {
    /// Create a window from `start` to `end` percent (inclusive).
    pub fn new(start: u8, end: u8) -> Self {
        let end = end.clamp(start, 100);
        Self { start, end }
    }

    /// Percentage after `current` of `total` items have completed.
    ///
    /// Monotone in `current`; clamps at the window end, and an empty total
    /// reports the window end directly.
    pub fn at(&self, current: usize, total: usize) -> u8 {
        if total == 0 || current >= total {
            return self.end;
        }
        let span = f64::from(self.end - self.start);
        let fraction = current as f64 / total as f64;
        self.start + (span * fraction).round() as u8
    }

    /// The starting percentage of the window.
    pub fn start(&self) -> u8 {
        self.start
    }

    /// The ending percentage of the window.
    pub fn end(&self) -> u8 {
        self.end
    }
}

/// Terminal progress bar implementing [`ProgressSink`].
///
/// Renders a classic `[=====>    ]` bar with the stage label and item
/// counter. Output is suppressed when stdout is not a terminal; updates
/// are rate-limited so tight loops don't flood the terminal.
pub struct ConsoleProgress {
    state: Mutex<ConsoleState>,
    enabled: bool,
}

struct ConsoleState {
    last_update: Instant,
    last_percent: u8,
}

const BAR_WIDTH: usize = 40;
const UPDATE_INTERVAL: Duration = Duration::from_millis(100);

impl ConsoleProgress {
    /// Create a progress bar; disabled automatically when stdout is not a
    /// terminal.
    pub fn new() -> Self {
        Self::with_enabled(io::stdout().is_terminal())
    }

    /// Create a progress bar with output explicitly enabled or disabled.
    pub fn with_enabled(enabled: bool) -> Self {
        Self {
            state: Mutex::new(ConsoleState {
                last_update: Instant::now()
                    .checked_sub(UPDATE_INTERVAL)
                    .unwrap_or_else(Instant::now),
                last_percent: 0,
            }),
            enabled,
        }
    }

    /// Erase the bar and move to a fresh line.
    pub fn finish(&self) {
        if self.enabled {
            print!("\r\x1b[K");
            io::stdout().flush().ok();
        }
    }

    fn render(percent: u8, stage: &str, current: usize, total: usize) -> String {
        let filled = BAR_WIDTH * usize::from(percent) / 100;
        let bar = format!(
            "[{}{}{}]",
            "=".repeat(filled.saturating_sub(1)),
            if filled > 0 { ">" } else { "" },
            " ".repeat(BAR_WIDTH - filled)
        );
        if total > 0 {
            format!("{stage} {bar} {percent}% ({current}/{total})")
        } else {
            format!("{stage} {bar} {percent}%")
        }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for ConsoleProgress {
    fn report(&self, percent: u8, stage: &str, current: usize, total: usize) {
        if !self.enabled {
            return;
        }

        let Ok(mut state) = self.state.lock() else {
            return;
        };

        // Rate limit intermediate updates; terminal percentages always render.
        if percent < 100
            && percent == state.last_percent
            && state.last_update.elapsed() < UPDATE_INTERVAL
        {
            return;
        }
        state.last_update = Instant::now();
        state.last_percent = percent;

        print!("\r\x1b[K{}", Self::render(percent, stage, current, total));
        io::stdout().flush().ok();
    }
}
