mod envelope;
mod source;

pub use envelope::{Envelope, ENVELOPE_LEN};
pub use source::{calculate_signature, AudioBlob, AudioSource, SourceId};
