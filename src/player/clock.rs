use crate::domain::AudioSource;
use anyhow::Result;

/// The external media clock the controller drives. The engine never discovers
/// a clock itself; one is supplied at wiring time. `RodioClock` backs real
/// playback, `ManualClock` backs headless use and tests.
pub trait MediaClock {
    /// Replaces the loaded stream and starts it from position 0.
    fn load(&mut self, source: &AudioSource) -> Result<()>;

    fn has_source(&self) -> bool;

    /// Current position in seconds. 0.0 while nothing is loaded.
    fn position(&self) -> f64;

    /// Total length in seconds, if the backend knows it.
    fn duration(&self) -> Option<f64>;

    fn set_position(&mut self, secs: f64);

    fn set_rate(&mut self, rate: f64);

    fn pause(&mut self);

    fn resume(&mut self);

    fn is_paused(&self) -> bool;

    /// True once the loaded stream has played to its end.
    fn finished(&self) -> bool;
}

/// A clock advanced explicitly by its owner. Useful wherever real audio
/// output is unavailable or unwanted.
#[derive(Debug, Default)]
pub struct ManualClock {
    position: f64,
    duration: Option<f64>,
    rate: f64,
    paused: bool,
    loaded: bool,
}

impl ManualClock {
    pub fn new() -> Self {
        ManualClock {
            rate: 1.0,
            paused: true,
            ..Default::default()
        }
    }

    /// Moves the clock forward by `secs` of wall time, scaled by the current
    /// rate, saturating at the known duration.
    pub fn advance(&mut self, secs: f64) {
        if !self.loaded || self.paused {
            return;
        }

        self.position += secs * self.rate;
        if let Some(duration) = self.duration {
            self.position = self.position.min(duration);
        }
    }
}

impl MediaClock for ManualClock {
    fn load(&mut self, source: &AudioSource) -> Result<()> {
        self.position = 0.0;
        self.duration = source.duration_secs;
        self.paused = false;
        self.loaded = true;
        Ok(())
    }

    fn has_source(&self) -> bool {
        self.loaded
    }

    fn position(&self) -> f64 {
        self.position
    }

    fn duration(&self) -> Option<f64> {
        self.duration
    }

    fn set_position(&mut self, secs: f64) {
        self.position = secs.max(0.0);
    }

    fn set_rate(&mut self, rate: f64) {
        self.rate = rate;
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn resume(&mut self) {
        self.paused = false;
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn finished(&self) -> bool {
        match (self.loaded, self.duration) {
            (true, Some(duration)) => self.position >= duration,
            _ => false,
        }
    }
}
