mod extract;
mod renderer;
mod surface;
mod worker;

pub use extract::{extract, DecodeBackend, DecodedAudio, RodioBackend, ANALYSIS_SAMPLE_RATE};
pub use renderer::{WaveStyle, WaveformRenderer};
pub use surface::{DrawSurface, PixelSurface, Rgb};
pub use worker::{Completion, ExtractionService, ThreadedExtractor};
