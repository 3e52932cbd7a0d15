use super::{Completion, DrawSurface, ExtractionService, Rgb};
use crate::{
    bus::{AppEvent, EventBus},
    domain::{AudioBlob, Envelope, SourceId, ENVELOPE_LEN},
    error::ExtractError,
};
use std::{cell::RefCell, rc::Rc};
use tracing::{error, trace, warn};

/// Visual parameters of the waveform display.
#[derive(Debug, Clone)]
pub struct WaveStyle {
    pub envelope_fill: Rgb,
    pub progress_fill: Rgb,
    /// Vertical flattening so peaks never touch the top edge.
    pub flatten: f64,
}

impl Default for WaveStyle {
    fn default() -> Self {
        WaveStyle {
            envelope_fill: Rgb(0x00, 0x33, 0x99),
            progress_fill: Rgb(0xaa, 0xff, 0x00),
            flatten: 0.9 * 0.95,
        }
    }
}

/// Owns the envelope cache, draws envelope + progress indicator, and turns
/// pointer input into seek requests. Never touches playback state directly;
/// everything crosses the bus.
///
/// Mutable state sits behind a `RefCell` so listeners can hold an `Rc` of the
/// renderer while a pointer-input emission recurses back through the bus.
pub struct WaveformRenderer {
    bus: Rc<EventBus>,
    service: Box<dyn ExtractionService>,
    style: WaveStyle,
    inner: RefCell<RenderState>,
}

struct RenderState {
    surface: Box<dyn DrawSurface>,
    /// Envelope of the last extraction that survived the staleness check,
    /// kept alongside the identity it belongs to.
    cache: Option<(SourceId, Envelope)>,
    /// The live "currently selected source"; completions are compared
    /// against this, not against whatever was current when they started.
    current: Option<SourceId>,
    progress: Option<f64>,
    loading: bool,
    disabled: bool,
}

impl WaveformRenderer {
    pub fn new(
        bus: Rc<EventBus>,
        surface: Box<dyn DrawSurface>,
        service: Box<dyn ExtractionService>,
        style: WaveStyle,
    ) -> Self {
        WaveformRenderer {
            bus,
            service,
            style,
            inner: RefCell::new(RenderState {
                surface,
                cache: None,
                current: None,
                progress: None,
                loading: false,
                disabled: false,
            }),
        }
    }

    /// A new source was selected. Kicks off extraction unless the cached
    /// envelope already belongs to it.
    pub fn on_file_change(&self, source: SourceId, bytes: AudioBlob) {
        let mut state = self.inner.borrow_mut();
        state.current = Some(source);
        state.progress = None;

        if state.disabled {
            return;
        }

        if state.cache.as_ref().is_some_and(|(id, _)| *id == source) {
            state.loading = false;
            self.redraw(&mut state);
            return;
        }

        state.loading = true;
        self.service.request(source, bytes);

        // Previous visual state stays up while the new envelope decodes.
        self.redraw(&mut state);
    }

    /// Drains completed extractions. Called once per application tick.
    pub fn poll(&self) {
        while let Some(Completion { source, result }) = self.service.try_complete() {
            let mut state = self.inner.borrow_mut();

            if state.current != Some(source) {
                trace!(%source, "discarding stale extraction");
                continue;
            }

            match result {
                Ok(envelope) => {
                    state.cache = Some((source, envelope));
                    state.loading = false;
                    self.redraw(&mut state);
                }
                Err(ExtractError::Unsupported) => {
                    if !state.disabled {
                        error!("audio decoding unavailable; waveform display disabled");
                    }
                    state.disabled = true;
                    state.loading = false;
                }
                Err(e) => {
                    // Recoverable; keep whatever envelope is on screen.
                    warn!(%source, "waveform extraction failed: {e}");
                    state.loading = false;
                }
            }
        }
    }

    /// Playback progressed; repaint envelope and progress indicator. The
    /// envelope is redrawn too — redundant but cheap next to a decode.
    pub fn on_time_change(&self, position: f64, duration: Option<f64>) {
        let mut state = self.inner.borrow_mut();
        state.progress = duration
            .filter(|d| *d > 0.0)
            .map(|d| (position / d).clamp(0.0, 1.0));
        self.redraw(&mut state);
    }

    /// Pointer input at `offset_x` logical pixels from the surface's left
    /// edge becomes a seek request. Dragging is just repeated calls.
    pub fn pointer_input(&self, offset_x: f64) {
        let (css_width, _) = self.inner.borrow().surface.css_size();
        if css_width <= 0.0 {
            return;
        }

        let fraction = (offset_x / css_width).clamp(0.0, 1.0);
        self.bus.emit(&AppEvent::SeekRequest { fraction });
    }

    pub fn is_loading(&self) -> bool {
        self.inner.borrow().loading
    }

    pub fn is_disabled(&self) -> bool {
        self.inner.borrow().disabled
    }

    pub fn cached_source(&self) -> Option<SourceId> {
        self.inner.borrow().cache.as_ref().map(|(id, _)| *id)
    }

    pub fn envelope(&self) -> Option<Envelope> {
        self.inner.borrow().cache.as_ref().map(|(_, env)| env.clone())
    }

    /// Full repaint: size the backing store from the logical size and the
    /// device pixel ratio, then envelope polygon, then progress bar.
    fn redraw(&self, state: &mut RenderState) {
        let (css_w, css_h) = state.surface.css_size();
        let dpr = state.surface.device_pixel_ratio();
        let width = ((css_w * dpr).floor() as u32).max(1);
        let height = ((css_h * dpr).floor() as u32).max(1);

        state.surface.resize_backing(width, height);
        state.surface.clear();

        let (w, h) = (width as f64, height as f64);

        if let Some((_, envelope)) = &state.cache {
            let mut points = Vec::with_capacity(ENVELOPE_LEN + 2);
            for (i, &amp) in envelope.values().iter().enumerate() {
                let x = i as f64 / (ENVELOPE_LEN - 1) as f64 * w;
                let y = (1.0 - amp as f64) * h * self.style.flatten;
                points.push((x, y));
            }
            // Close down to the bottom edge: an area chart, not a line.
            points.push((w, h));
            points.push((0.0, h));

            state.surface.fill_polygon(&points, self.style.envelope_fill);
        }

        if let Some(fraction) = state.progress {
            let x = fraction * w;
            state
                .surface
                .fill_rect(x, 0.0, 2.0 * dpr, h, self.style.progress_fill);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        bus::EventKind,
        waveform::PixelSurface,
    };
    use std::collections::VecDeque;

    #[derive(Clone, Default)]
    struct StubService {
        requests: Rc<RefCell<Vec<SourceId>>>,
        completions: Rc<RefCell<VecDeque<Completion>>>,
    }

    impl StubService {
        fn complete(&self, source: SourceId, result: Result<Envelope, ExtractError>) {
            self.completions
                .borrow_mut()
                .push_back(Completion { source, result });
        }
    }

    impl ExtractionService for StubService {
        fn request(&self, source: SourceId, _bytes: AudioBlob) {
            self.requests.borrow_mut().push(source);
        }

        fn try_complete(&self) -> Option<Completion> {
            self.completions.borrow_mut().pop_front()
        }
    }

    fn spiked_envelope(value: f32) -> Envelope {
        let mut samples = vec![0.0f32; ENVELOPE_LEN];
        samples[0] = value;
        Envelope::from_interleaved(&samples, 1)
    }

    fn renderer() -> (WaveformRenderer, StubService, Rc<EventBus>) {
        let bus = Rc::new(EventBus::new());
        let service = StubService::default();
        let renderer = WaveformRenderer::new(
            Rc::clone(&bus),
            Box::new(PixelSurface::new(200.0, 50.0, 1.0)),
            Box::new(service.clone()),
            WaveStyle::default(),
        );
        (renderer, service, bus)
    }

    fn blob() -> AudioBlob {
        AudioBlob::new(vec![0u8; 8])
    }

    #[test]
    fn stale_completion_is_discarded() {
        let (renderer, service, _) = renderer();
        let (a, b) = (SourceId::from_raw(1), SourceId::from_raw(2));

        renderer.on_file_change(a, blob());
        renderer.on_file_change(b, blob());

        // A's extraction resolves after B became current.
        service.complete(a, Ok(spiked_envelope(0.4)));
        renderer.poll();
        assert_eq!(renderer.cached_source(), None);
        assert!(renderer.is_loading());

        service.complete(b, Ok(spiked_envelope(0.8)));
        renderer.poll();
        assert_eq!(renderer.cached_source(), Some(b));
        assert!(!renderer.is_loading());
    }

    #[test]
    fn decode_failure_keeps_previous_envelope() {
        let (renderer, service, _) = renderer();
        let (a, b) = (SourceId::from_raw(1), SourceId::from_raw(2));

        renderer.on_file_change(a, blob());
        service.complete(a, Ok(spiked_envelope(0.4)));
        renderer.poll();
        assert_eq!(renderer.cached_source(), Some(a));

        renderer.on_file_change(b, blob());
        service.complete(b, Err(ExtractError::Decode("corrupt".into())));
        renderer.poll();

        assert_eq!(renderer.cached_source(), Some(a));
        assert!(!renderer.is_loading());
    }

    #[test]
    fn cached_source_skips_re_extraction() {
        let (renderer, service, _) = renderer();
        let a = SourceId::from_raw(1);

        renderer.on_file_change(a, blob());
        service.complete(a, Ok(spiked_envelope(0.4)));
        renderer.poll();

        renderer.on_file_change(a, blob());
        assert_eq!(service.requests.borrow().len(), 1);
        assert!(!renderer.is_loading());
    }

    #[test]
    fn unsupported_backend_disables_waveform_for_the_session() {
        let (renderer, service, _) = renderer();
        let a = SourceId::from_raw(1);

        renderer.on_file_change(a, blob());
        service.complete(a, Err(ExtractError::Unsupported));
        renderer.poll();
        assert!(renderer.is_disabled());

        // Later file changes stop requesting extractions entirely.
        renderer.on_file_change(SourceId::from_raw(2), blob());
        assert_eq!(service.requests.borrow().len(), 1);
    }

    #[test]
    fn pointer_input_emits_clamped_seek_fractions() {
        let (renderer, _, bus) = renderer();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let log = Rc::clone(&seen);
        bus.register(
            EventKind::SeekRequest,
            Rc::new(move |e| {
                if let AppEvent::SeekRequest { fraction } = *e {
                    log.borrow_mut().push(fraction);
                }
            }),
        )
        .unwrap();

        renderer.pointer_input(50.0); // 200px wide surface
        renderer.pointer_input(-13.0);
        renderer.pointer_input(900.0);

        assert_eq!(*seen.borrow(), [0.25, 0.0, 1.0]);
    }
}
