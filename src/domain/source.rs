use anyhow::{Context, Result};
use lofty::file::{AudioFile, TaggedFileExt};
use std::{fmt, fs, ops::Deref, path::Path, sync::Arc, time::UNIX_EPOCH};
use xxhash_rust::xxh3::xxh3_64;

/// Opaque identity of "which audio is currently loaded". Cache freshness is
/// decided by equality on this token, never by content inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(u64);

impl SourceId {
    pub fn from_raw(raw: u64) -> Self {
        SourceId(raw)
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Create an identity based on...
///  - date of last modification (millis)
///  - file size (bytes)
///  - path as str as bytes
pub fn calculate_signature<P: AsRef<Path>>(path: P) -> Result<SourceId> {
    let metadata = fs::metadata(&path)?;

    let last_mod = metadata.modified()?.duration_since(UNIX_EPOCH)?.as_millis() as i64;
    let size = metadata.len();

    let mut data = Vec::with_capacity(path.as_ref().as_os_str().len() + 16);

    data.extend_from_slice(path.as_ref().as_os_str().as_encoded_bytes());
    data.extend_from_slice(&last_mod.to_le_bytes());
    data.extend_from_slice(&size.to_le_bytes());

    Ok(SourceId(xxh3_64(&data)))
}

/// Shared handle on the raw encoded bytes of a source. Cheap to clone; the
/// `Debug` impl deliberately elides the contents since events get logged.
#[derive(Clone)]
pub struct AudioBlob(Arc<[u8]>);

impl AudioBlob {
    pub fn new(bytes: Vec<u8>) -> Self {
        AudioBlob(bytes.into())
    }
}

impl Deref for AudioBlob {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for AudioBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AudioBlob({} bytes)", self.0.len())
    }
}

/// A loaded audio file: identity, raw bytes, and whatever metadata the tag
/// reader could recover. Duration comes from the container metadata because
/// an output sink cannot report total stream length.
pub struct AudioSource {
    pub id: SourceId,
    pub bytes: AudioBlob,
    pub duration_secs: Option<f64>,
    pub title: Option<String>,
}

impl AudioSource {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let id = calculate_signature(path)?;
        let bytes = fs::read(path)
            .with_context(|| format!("could not read audio file: {}", path.display()))?;

        let (duration_secs, title) = match lofty::read_from_path(path) {
            Ok(tagged) => {
                use lofty::tag::Accessor;

                let duration = tagged.properties().duration().as_secs_f64();
                let title = tagged
                    .primary_tag()
                    .and_then(|t| t.title().map(|s| s.to_string()));
                (Some(duration), title)
            }
            // Unreadable tags are not fatal; playback can still work and the
            // clock simply reports an unknown duration.
            Err(_) => (None, None),
        };

        Ok(AudioSource {
            id,
            bytes: AudioBlob::new(bytes),
            duration_secs,
            title,
        })
    }
}
