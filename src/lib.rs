use std::time::Duration;

pub mod app_core;
pub mod bus;
pub mod config;
pub mod domain;
pub mod error;
pub mod player;
pub mod waveform;

pub use app_core::Studio;
pub use config::Config;

// ~30fps
pub const REFRESH_RATE: u64 = 33;

pub enum DurationStyle {
    Clean,
    Compact,
}

pub fn get_readable_duration(duration: Duration, style: DurationStyle) -> String {
    let mut secs = duration.as_secs();
    let mins = secs / 60;
    secs %= 60;

    match style {
        DurationStyle::Clean => match mins {
            0 => format!("{secs:02}s"),
            _ => format!("{mins}m {secs:02}s"),
        },
        DurationStyle::Compact => format!("{mins}:{secs:02}"),
    }
}
