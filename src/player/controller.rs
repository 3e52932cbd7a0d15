use super::{MediaClock, PlaybackState};
use crate::{
    bus::{AppEvent, EventBus},
    domain::{AudioSource, SourceId},
};
use anyhow::Result;
use std::rc::Rc;
use tracing::debug;

/// Single writer of [`PlaybackState`]. Applies seek requests coming off the
/// bus, drives the external clock, and emits `TimeChange` whenever the clock
/// moves — the only channel by which other components observe progress.
pub struct PlaybackController {
    bus: Rc<EventBus>,
    clock: Box<dyn MediaClock>,
    state: PlaybackState,
    current: Option<SourceId>,
    last_emitted: Option<(f64, Option<f64>)>,
}

impl PlaybackController {
    pub fn new(bus: Rc<EventBus>, clock: Box<dyn MediaClock>) -> Self {
        PlaybackController {
            bus,
            clock,
            state: PlaybackState::default(),
            current: None,
            last_emitted: None,
        }
    }

    /// Loads a new source, resets the position to 0, re-applies the
    /// configured rate and announces the change. An explicit call always
    /// resets, even for an identity that is already loaded; de-duplication is
    /// the caller's concern.
    pub fn set_source(&mut self, source: &AudioSource) -> Result<()> {
        self.clock.load(source)?;
        self.clock.set_rate(self.state.rate);

        self.current = Some(source.id);
        self.state.position = 0.0;
        self.state.duration = source.duration_secs.or(self.clock.duration());
        self.state.paused = false;
        self.last_emitted = None;

        debug!(source = %source.id, "source changed");
        self.bus.emit(&AppEvent::FileChange {
            source: source.id,
            bytes: source.bytes.clone(),
        });
        Ok(())
    }

    /// Rate is a cosmetic control and must never break playback: anything
    /// that is not a positive finite number falls back to 1.0.
    pub fn set_rate(&mut self, rate: f64) {
        let rate = match rate.is_finite() && rate > 0.0 {
            true => rate,
            false => 1.0,
        };

        self.state.rate = rate;
        if self.current.is_some() {
            self.clock.set_rate(rate);
        }
    }

    /// Seeks by a signed number of seconds from the current position.
    pub fn seek_relative(&mut self, delta_secs: f64) {
        if self.current.is_none() {
            return;
        }
        self.apply_seek(self.state.position + delta_secs);
    }

    /// Seeks to a normalized position within the total duration. The fraction
    /// is clamped to [0, 1] first; with an unknown duration there is nothing
    /// to scale against and the request is dropped.
    pub fn seek_to_fraction(&mut self, fraction: f64) {
        if self.current.is_none() {
            return;
        }

        let Some(duration) = self.state.duration else {
            return;
        };
        self.apply_seek(fraction.clamp(0.0, 1.0) * duration);
    }

    /// Flips the paused flag; a no-op while nothing is loaded, since an
    /// absent file is a normal startup state rather than an error.
    pub fn toggle_pause(&mut self) {
        if !self.clock.has_source() {
            return;
        }

        match self.state.paused {
            true => self.clock.resume(),
            false => self.clock.pause(),
        }
        self.state.paused = !self.state.paused;
    }

    /// Polls the clock and emits `TimeChange` if position or duration moved
    /// since the last emission.
    pub fn tick(&mut self) {
        if !self.clock.has_source() {
            return;
        }

        let duration = self.clock.duration().or(self.state.duration);
        let mut position = self.clock.position();
        if let Some(d) = duration {
            position = position.clamp(0.0, d);
        }

        self.state.position = position;
        self.state.duration = duration;

        if self.last_emitted != Some((position, duration)) {
            self.last_emitted = Some((position, duration));
            self.bus.emit(&AppEvent::TimeChange { position, duration });
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn current_source(&self) -> Option<SourceId> {
        self.current
    }

    pub fn is_finished(&self) -> bool {
        self.clock.finished()
    }

    fn apply_seek(&mut self, target_secs: f64) {
        let target = match self.state.duration {
            Some(duration) => target_secs.clamp(0.0, duration),
            None => target_secs.max(0.0),
        };

        self.clock.set_position(target);
        self.state.position = target;

        self.last_emitted = Some((target, self.state.duration));
        self.bus.emit(&AppEvent::TimeChange {
            position: target,
            duration: self.state.duration,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        bus::EventKind,
        domain::AudioBlob,
        player::ManualClock,
    };
    use std::cell::RefCell;

    fn source(secs: f64) -> AudioSource {
        AudioSource {
            id: SourceId::from_raw(0xA1),
            bytes: AudioBlob::new(vec![0u8; 16]),
            duration_secs: Some(secs),
            title: None,
        }
    }

    fn controller_with_log() -> (PlaybackController, Rc<RefCell<Vec<AppEvent>>>) {
        let bus = Rc::new(EventBus::new());
        let log = Rc::new(RefCell::new(Vec::new()));

        for kind in [EventKind::TimeChange, EventKind::FileChange] {
            let log = Rc::clone(&log);
            bus.register(kind, Rc::new(move |e| log.borrow_mut().push(e.clone())))
                .unwrap();
        }

        let controller = PlaybackController::new(bus, Box::new(ManualClock::new()));
        (controller, log)
    }

    #[test]
    fn set_source_resets_and_announces() {
        let (mut ctl, log) = controller_with_log();
        ctl.set_source(&source(10.0)).unwrap();

        assert_eq!(ctl.state().position, 0.0);
        assert_eq!(ctl.state().duration, Some(10.0));
        assert!(!ctl.state().paused);

        let events = log.borrow();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            AppEvent::FileChange { source, .. } if source == SourceId::from_raw(0xA1)
        ));
    }

    #[test]
    fn seek_fraction_is_clamped_at_both_ends() {
        let (mut ctl, _) = controller_with_log();
        ctl.set_source(&source(10.0)).unwrap();

        ctl.seek_to_fraction(-0.3);
        assert_eq!(ctl.state().position, 0.0);

        ctl.seek_to_fraction(1.7);
        assert_eq!(ctl.state().position, 10.0);

        ctl.seek_to_fraction(0.25);
        assert_eq!(ctl.state().position, 2.5);
    }

    #[test]
    fn relative_seek_clamps_into_duration() {
        let (mut ctl, _) = controller_with_log();
        ctl.set_source(&source(10.0)).unwrap();

        ctl.seek_relative(-5.0);
        assert_eq!(ctl.state().position, 0.0);

        ctl.seek_relative(25.0);
        assert_eq!(ctl.state().position, 10.0);

        ctl.seek_relative(-0.5);
        assert_eq!(ctl.state().position, 9.5);
    }

    #[test]
    fn seeks_without_a_source_are_noops() {
        let (mut ctl, log) = controller_with_log();

        ctl.seek_to_fraction(0.5);
        ctl.seek_relative(3.0);
        ctl.toggle_pause();

        assert_eq!(ctl.state().position, 0.0);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn invalid_rate_falls_back_to_one() {
        let (mut ctl, _) = controller_with_log();

        for bad in [0.0, -2.0, f64::NAN, f64::INFINITY] {
            ctl.set_rate(bad);
            assert_eq!(ctl.state().rate, 1.0);
        }

        ctl.set_rate(1.5);
        assert_eq!(ctl.state().rate, 1.5);
    }

    #[test]
    fn tick_emits_only_on_change() {
        let (mut ctl, log) = controller_with_log();
        ctl.set_source(&source(10.0)).unwrap();
        log.borrow_mut().clear();

        ctl.tick();
        ctl.tick();
        assert_eq!(log.borrow().len(), 1, "unchanged position re-emitted");

        ctl.seek_relative(4.0);
        assert_eq!(log.borrow().len(), 2);
        assert!(matches!(
            log.borrow()[1],
            AppEvent::TimeChange { position, duration: Some(d) }
                if position == 4.0 && d == 10.0
        ));
    }

    #[test]
    fn toggle_pause_flips_state() {
        let (mut ctl, _) = controller_with_log();
        ctl.set_source(&source(10.0)).unwrap();

        assert!(!ctl.state().paused);
        ctl.toggle_pause();
        assert!(ctl.state().paused);
        ctl.toggle_pause();
        assert!(!ctl.state().paused);
    }
}
