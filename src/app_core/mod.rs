//! Application root. Wires the controller and renderer onto one event bus,
//! then seals it; owns no domain logic of its own.

use crate::{
    bus::{AppEvent, EventBus, EventKind},
    domain::AudioSource,
    player::{MediaClock, PlaybackController},
    waveform::{DrawSurface, ExtractionService, WaveStyle, WaveformRenderer},
};
use anyhow::Result;
use std::{cell::RefCell, path::Path, rc::Rc};

pub struct Studio {
    bus: Rc<EventBus>,
    controller: Rc<RefCell<PlaybackController>>,
    renderer: Rc<WaveformRenderer>,
}

impl Studio {
    /// Builds and wires the engine against externally supplied collaborators.
    /// Registration happens here and nowhere else; the bus is sealed before
    /// this returns.
    pub fn new(
        clock: Box<dyn MediaClock>,
        surface: Box<dyn DrawSurface>,
        service: Box<dyn ExtractionService>,
        style: WaveStyle,
    ) -> Result<Self> {
        let bus = Rc::new(EventBus::new());
        let controller = Rc::new(RefCell::new(PlaybackController::new(
            Rc::clone(&bus),
            clock,
        )));
        let renderer = Rc::new(WaveformRenderer::new(
            Rc::clone(&bus),
            surface,
            service,
            style,
        ));

        let ctl = Rc::clone(&controller);
        bus.register(
            EventKind::SeekRequest,
            Rc::new(move |e| {
                if let AppEvent::SeekRequest { fraction } = *e {
                    ctl.borrow_mut().seek_to_fraction(fraction);
                }
            }),
        )?;

        let rend = Rc::clone(&renderer);
        bus.register(
            EventKind::FileChange,
            Rc::new(move |e| {
                if let AppEvent::FileChange { source, bytes } = e {
                    rend.on_file_change(*source, bytes.clone());
                }
            }),
        )?;

        let rend = Rc::clone(&renderer);
        bus.register(
            EventKind::TimeChange,
            Rc::new(move |e| {
                if let AppEvent::TimeChange { position, duration } = *e {
                    rend.on_time_change(position, duration);
                }
            }),
        )?;

        bus.seal();

        Ok(Studio {
            bus,
            controller,
            renderer,
        })
    }

    /// Reads an audio file, derives its identity and metadata, and hands it
    /// to the playback controller (which announces it on the bus).
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<AudioSource> {
        let source = AudioSource::load(path)?;
        self.controller.borrow_mut().set_source(&source)?;
        Ok(source)
    }

    /// One cooperative turn: poll the playback clock, then drain any
    /// finished extractions.
    pub fn tick(&self) {
        self.controller.borrow_mut().tick();
        self.renderer.poll();
    }

    pub fn controller(&self) -> Rc<RefCell<PlaybackController>> {
        Rc::clone(&self.controller)
    }

    pub fn renderer(&self) -> Rc<WaveformRenderer> {
        Rc::clone(&self.renderer)
    }

    pub fn bus(&self) -> Rc<EventBus> {
        Rc::clone(&self.bus)
    }
}
