use super::{extract, DecodeBackend};
use crate::{
    domain::{AudioBlob, Envelope, SourceId},
    error::ExtractError,
};
use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use tracing::debug;

/// A finished extraction, still stamped with the source it was started for.
/// The consumer decides at completion time whether the result is stale.
pub struct Completion {
    pub source: SourceId,
    pub result: Result<Envelope, ExtractError>,
}

/// Seam between the renderer and however extraction actually runs. The
/// production implementation is [`ThreadedExtractor`]; tests drive the
/// renderer with a hand-rolled stub instead.
pub trait ExtractionService {
    fn request(&self, source: SourceId, bytes: AudioBlob);

    /// Non-blocking; the owner polls this once per tick.
    fn try_complete(&self) -> Option<Completion>;
}

/// Runs extractions one at a time on a dedicated worker thread and hands
/// results back over a channel. There is no cancellation; superseded requests
/// still complete and are discarded by the consumer's staleness check.
pub struct ThreadedExtractor {
    request_tx: Sender<(SourceId, AudioBlob)>,
    completion_rx: Receiver<Completion>,
    _thread_handle: JoinHandle<()>,
}

impl ThreadedExtractor {
    pub fn new(backend: Box<dyn DecodeBackend>) -> Self {
        let (request_tx, request_rx) = unbounded::<(SourceId, AudioBlob)>();
        let (completion_tx, completion_rx) = unbounded();

        let thread_handle = thread::spawn(move || {
            while let Ok((source, bytes)) = request_rx.recv() {
                debug!(%source, "extraction started");
                let result = extract(&bytes, backend.as_ref());

                if completion_tx.send(Completion { source, result }).is_err() {
                    break;
                }
            }
        });

        ThreadedExtractor {
            request_tx,
            completion_rx,
            _thread_handle: thread_handle,
        }
    }
}

impl ExtractionService for ThreadedExtractor {
    fn request(&self, source: SourceId, bytes: AudioBlob) {
        // A dropped worker means the process is shutting down; nothing to do.
        let _ = self.request_tx.send((source, bytes));
    }

    fn try_complete(&self) -> Option<Completion> {
        match self.completion_rx.try_recv() {
            Ok(completion) => Some(completion),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }
}
