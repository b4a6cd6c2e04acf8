use std::time::{Duration, Instant};

use super::scheduler::{DeferredQueue, TimerSlot};
use super::state::{reduce, Effect, IslandEvent, IslandModel, IslandTimings, TimerKind};
use crate::geometry::{DisplaySource, GeometryResolver, Rect};
use crate::power::ChargeSnapshot;

/// Moves the island window. Implemented by the AppKit window on macOS.
pub trait FrameSink {
    fn animate_frame(&mut self, frame: Rect, duration: Duration);
}

pub type ExpansionCallback = Box<dyn FnMut(bool)>;

/// Owns the island's expansion state and keeps the window in step with it.
///
/// Must live on the main thread; every method takes `now` so callers (and
/// tests) control the clock.
pub struct ExpansionController<D> {
    model: IslandModel,
    timings: IslandTimings,
    animation: Duration,
    expand_on_plug: bool,
    geometry: GeometryResolver<D>,
    queue: DeferredQueue<IslandEvent>,
    hover_slot: TimerSlot,
    collapse_slot: TimerSlot,
    frame_sink: Box<dyn FrameSink>,
    on_change: Option<ExpansionCallback>,
    last_charge: Option<ChargeSnapshot>,
}

impl<D: DisplaySource> ExpansionController<D> {
    pub fn new(geometry: GeometryResolver<D>, frame_sink: Box<dyn FrameSink>) -> Self {
        Self {
            model: IslandModel::default(),
            timings: IslandTimings::default(),
            animation: Duration::from_millis(400),
            expand_on_plug: true,
            geometry,
            queue: DeferredQueue::new(),
            hover_slot: TimerSlot::default(),
            collapse_slot: TimerSlot::default(),
            frame_sink,
            on_change: None,
            last_charge: None,
        }
    }

    /// Registers the callback fired on every change of [`Self::is_expanded`].
    pub fn on_expansion_change(&mut self, callback: impl FnMut(bool) + 'static) {
        self.on_change = Some(Box::new(callback));
    }

    /// New delays apply to timers scheduled from now on.
    pub fn set_timings(&mut self, timings: IslandTimings) {
        self.timings = timings;
    }

    pub fn set_animation_duration(&mut self, duration: Duration) {
        self.animation = duration;
    }

    pub fn set_expand_on_plug(&mut self, enabled: bool) {
        self.expand_on_plug = enabled;
    }

    #[cfg(test)]
    pub fn state(&self) -> super::state::IslandState {
        self.model.state
    }

    pub fn model(&self) -> IslandModel {
        self.model
    }

    pub fn is_expanded(&self) -> bool {
        self.model.state.is_expanded()
    }

    pub fn geometry(&self) -> &GeometryResolver<D> {
        &self.geometry
    }

    #[cfg(test)]
    pub fn last_charge(&self) -> Option<ChargeSnapshot> {
        self.last_charge
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.queue.next_deadline()
    }

    #[cfg(test)]
    pub fn pending_timers(&self) -> usize {
        self.queue.pending()
    }

    pub fn hover_changed(&mut self, hovering: bool, now: Instant) {
        if hovering == self.model.hovering {
            return;
        }
        self.dispatch(IslandEvent::HoverChanged(hovering), now);
    }

    pub fn tap(&mut self, now: Instant) {
        self.dispatch(IslandEvent::Tap, now);
    }

    pub fn expand(&mut self, now: Instant) {
        self.dispatch(IslandEvent::ManualExpand, now);
    }

    pub fn collapse(&mut self, now: Instant) {
        self.dispatch(IslandEvent::ManualCollapse, now);
    }

    /// Feeds a new battery snapshot. The first snapshot is only a baseline.
    pub fn charge_changed(&mut self, snapshot: ChargeSnapshot, now: Instant) {
        let previous = self.last_charge.replace(snapshot);
        let Some(previous) = previous else {
            return;
        };
        let Some(transition) = snapshot.transition_from(&previous) else {
            return;
        };

        log::debug!("Charge transition: {:?}", transition);
        if !self.expand_on_plug {
            return;
        }
        self.dispatch(IslandEvent::ChargeChanged(transition), now);
    }

    /// Fires every deferred action that is due.
    pub fn tick(&mut self, now: Instant) {
        for (handle, event) in self.queue.drain_due(now) {
            // An earlier action in this batch may have canceled this one
            if handle.is_cancelled() {
                continue;
            }
            match event {
                IslandEvent::HoverSettled(_) => self.hover_slot.release(),
                IslandEvent::AutoCollapseDue => self.collapse_slot.release(),
                _ => {}
            }
            self.dispatch(event, now);
        }
    }

    /// Drops cached geometry and moves the window to match the current state.
    pub fn reposition(&mut self) {
        self.geometry.invalidate_cache();
        self.apply_frame();
    }

    /// Called when the OS reports a display configuration change.
    pub fn display_changed(&mut self) {
        log::info!("Display configuration changed; repositioning island");
        self.reposition();
    }

    fn dispatch(&mut self, event: IslandEvent, now: Instant) {
        let was_expanded = self.is_expanded();
        let previous = self.model.state;

        let reduction = reduce(self.model, event, &self.timings);
        self.model = reduction.model;
        for effect in reduction.effects {
            self.apply_effect(effect, now);
        }

        if self.model.state != previous {
            log::debug!(
                "Island {} -> {} on {:?}",
                previous.as_str(),
                self.model.state.as_str(),
                event
            );
        }

        let expanded = self.is_expanded();
        if expanded != was_expanded {
            if let Some(callback) = self.on_change.as_mut() {
                callback(expanded);
            }
            self.apply_frame();
        }
    }

    fn apply_effect(&mut self, effect: Effect, now: Instant) {
        match effect {
            Effect::Schedule { kind, delay, event } => {
                let handle = self.queue.schedule(now, delay, event);
                self.slot(kind).replace(handle);
            }
            Effect::Cancel(kind) => self.slot(kind).cancel(),
        }
    }

    fn slot(&mut self, kind: TimerKind) -> &mut TimerSlot {
        match kind {
            TimerKind::Hover => &mut self.hover_slot,
            TimerKind::AutoCollapse => &mut self.collapse_slot,
        }
    }

    fn apply_frame(&mut self) {
        let expanded = self.is_expanded();
        match self.geometry.island_frame(expanded) {
            Some(frame) => self.frame_sink.animate_frame(frame, self.animation),
            None => log::debug!("No display; skipping island frame update"),
        }
    }
}
