use std::time::Duration;

use log::LevelFilter;

/// Settings for a CPU session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Time between two timer ticks
    pub timer_period: Duration,
    /// The timer renders the display every this many ticks
    pub render_every: u32,
    /// Whether the timer runs at all during a session
    pub timer_enabled: bool,
    /// Render the display after every DRAW
    pub render_after_draw: bool,
    /// Level handed to the logger by the binary
    pub log_level: LevelFilter,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timer_period: Duration::from_millis(16),
            render_every: 60,
            timer_enabled: true,
            render_after_draw: true,
            log_level: LevelFilter::Info,
        }
    }
}

impl Config {
    pub fn with_timer_period(mut self, period: Duration) -> Self {
        self.timer_period = period;
        self
    }

    pub fn with_render_every(mut self, ticks: u32) -> Self {
        self.render_every = ticks.max(1);
        self
    }

    pub fn with_timer(mut self, enabled: bool) -> Self {
        self.timer_enabled = enabled;
        self
    }

    pub fn with_render_after_draw(mut self, enabled: bool) -> Self {
        self.render_after_draw = enabled;
        self
    }

    pub fn with_log_level(mut self, level: LevelFilter) -> Self {
        self.log_level = level;
        self
    }
}
