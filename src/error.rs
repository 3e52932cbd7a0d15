use thiserror::Error;

/// Wiring-time contract violations on the event bus. These indicate a bug in
/// application construction and are meant to propagate, not be recovered.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BusError {
    #[error("blocked attempt to register a listener on a sealed event bus")]
    Sealed,
}

/// Failures of the waveform extraction pipeline.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The bytes could not be decoded (corrupt file, unsupported codec).
    /// Recoverable; the caller keeps whatever envelope it already has.
    #[error("could not decode audio: {0}")]
    Decode(String),

    /// No decode backend is available at all. Fatal for the waveform
    /// feature, reported once; playback continues without it.
    #[error("no audio decode backend available")]
    Unsupported,
}
