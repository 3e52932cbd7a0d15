mod backend_rodio;
mod clock;
mod controller;
mod state;

pub use backend_rodio::RodioClock;
pub use clock::{ManualClock, MediaClock};
pub use controller::PlaybackController;
pub use state::PlaybackState;
