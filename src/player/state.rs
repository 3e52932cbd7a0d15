/// Authoritative playback state. Written only by the controller; every other
/// component observes it through [`AppEvent::TimeChange`] emissions, never by
/// reading it directly.
///
/// [`AppEvent::TimeChange`]: crate::bus::AppEvent::TimeChange
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    /// Seconds from the start of the stream. Clamped to [0, duration]
    /// whenever the duration is known.
    pub position: f64,
    /// Total length in seconds; `None` until metadata reveals it.
    pub duration: Option<f64>,
    /// Positive, finite multiplier; invalid input falls back to 1.0.
    pub rate: f64,
    pub paused: bool,
}

impl Default for PlaybackState {
    fn default() -> Self {
        PlaybackState {
            position: 0.0,
            duration: None,
            rate: 1.0,
            paused: true,
        }
    }
}
