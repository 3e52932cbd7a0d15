use super::MediaClock;
use crate::domain::AudioSource;
use anyhow::{Context, Result};
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink};
use std::{io::Cursor, time::Duration};
use tracing::warn;

/// Production [`MediaClock`] backed by a rodio sink.
///
/// Total duration comes from the source's container metadata rather than the
/// sink, which only reports elapsed time.
pub struct RodioClock {
    sink: Sink,
    duration: Option<f64>,
    loaded: bool,
    _stream: OutputStream,
}

impl RodioClock {
    pub fn new() -> Result<Self> {
        let _stream = OutputStreamBuilder::open_default_stream()
            .context("could not open an audio output stream")?;
        let sink = Sink::connect_new(_stream.mixer());

        Ok(RodioClock {
            sink,
            duration: None,
            loaded: false,
            _stream,
        })
    }
}

impl MediaClock for RodioClock {
    fn load(&mut self, source: &AudioSource) -> Result<()> {
        let bytes: Vec<u8> = source.bytes.to_vec();
        let decoder =
            Decoder::new(Cursor::new(bytes)).context("audio stream could not be decoded")?;

        self.sink.clear();
        self.sink.append(decoder);
        self.sink.play();

        self.duration = source.duration_secs;
        self.loaded = true;
        Ok(())
    }

    fn has_source(&self) -> bool {
        self.loaded
    }

    fn position(&self) -> f64 {
        self.sink.get_pos().as_secs_f64()
    }

    fn duration(&self) -> Option<f64> {
        self.duration
    }

    fn set_position(&mut self, secs: f64) {
        // Some decoders cannot seek; treat that as a skipped request rather
        // than a playback failure.
        if let Err(e) = self.sink.try_seek(Duration::from_secs_f64(secs.max(0.0))) {
            warn!("seek failed: {e}");
        }
    }

    fn set_rate(&mut self, rate: f64) {
        self.sink.set_speed(rate as f32);
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn resume(&mut self) {
        self.sink.play();
    }

    fn is_paused(&self) -> bool {
        self.sink.is_paused()
    }

    fn finished(&self) -> bool {
        self.loaded && self.sink.empty()
    }
}
