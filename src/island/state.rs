//! Expansion states and the reducer that moves between them.
//!
//! Exactly one trigger owns a non-collapsed island. All transitions go through
//! [`reduce`]; timers are requested as [`Effect`]s and come back later as
//! events.

use std::time::Duration;

use crate::power::ChargeTransition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IslandState {
    #[default]
    Collapsed,
    HoverExpanded,
    ManualExpanded,
    ChargeExpanded,
}

impl IslandState {
    pub fn is_expanded(&self) -> bool {
        !matches!(self, IslandState::Collapsed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IslandState::Collapsed => "collapsed",
            IslandState::HoverExpanded => "hover",
            IslandState::ManualExpanded => "manual",
            IslandState::ChargeExpanded => "charge",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IslandEvent {
    /// Raw pointer enter (`true`) or exit (`false`).
    HoverChanged(bool),
    /// Pointer state after the debounce delay.
    HoverSettled(bool),
    Tap,
    ManualExpand,
    ManualCollapse,
    ChargeChanged(ChargeTransition),
    AutoCollapseDue,
}

/// Timer categories. At most one task per category is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    Hover,
    AutoCollapse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Schedule {
        kind: TimerKind,
        delay: Duration,
        event: IslandEvent,
    },
    Cancel(TimerKind),
}

/// Delays used by the reducer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IslandTimings {
    pub hover_debounce: Duration,
    /// Auto-collapse after a plug-in that started charging.
    pub charging_collapse: Duration,
    /// Auto-collapse after a plug-in that did not start charging.
    pub plugged_collapse: Duration,
    /// Collapse after charging stops while still on AC.
    pub full_charge_collapse: Duration,
}

impl Default for IslandTimings {
    fn default() -> Self {
        Self {
            hover_debounce: Duration::from_millis(80),
            charging_collapse: Duration::from_secs(2),
            plugged_collapse: Duration::from_secs(5),
            full_charge_collapse: Duration::from_secs(3),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IslandModel {
    pub state: IslandState,
    /// Pointer is over the island right now (not debounced).
    pub hovering: bool,
    /// A plug-in arrived while hover or manual control owned the island.
    pub suppressed_charge: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reduction {
    pub model: IslandModel,
    pub effects: Vec<Effect>,
}

pub fn reduce(model: IslandModel, event: IslandEvent, timings: &IslandTimings) -> Reduction {
    use IslandState::*;

    let mut next = model;
    let mut effects = Vec::new();

    match event {
        IslandEvent::HoverChanged(hovering) => {
            next.hovering = hovering;
            effects.push(Effect::Schedule {
                kind: TimerKind::Hover,
                delay: timings.hover_debounce,
                event: IslandEvent::HoverSettled(hovering),
            });
        }
        // A settle that disagrees with the live pointer is stale.
        IslandEvent::HoverSettled(hovering) if hovering != model.hovering => {}
        IslandEvent::HoverSettled(true) => match model.state {
            Collapsed => next.state = HoverExpanded,
            ChargeExpanded => {
                next.state = HoverExpanded;
                effects.push(Effect::Cancel(TimerKind::AutoCollapse));
            }
            HoverExpanded | ManualExpanded => {}
        },
        IslandEvent::HoverSettled(false) => {
            if model.state == HoverExpanded {
                next.state = Collapsed;
            }
        }
        IslandEvent::Tap => {
            next.state = if model.state == ManualExpanded {
                Collapsed
            } else {
                ManualExpanded
            };
            effects.push(Effect::Cancel(TimerKind::AutoCollapse));
        }
        IslandEvent::ManualExpand => {
            next.state = ManualExpanded;
            effects.push(Effect::Cancel(TimerKind::AutoCollapse));
        }
        IslandEvent::ManualCollapse => {
            next.state = Collapsed;
            effects.push(Effect::Cancel(TimerKind::AutoCollapse));
        }
        IslandEvent::ChargeChanged(ChargeTransition::PluggedIn { charging }) => match model.state {
            Collapsed | ChargeExpanded => {
                next.state = ChargeExpanded;
                let delay = if charging {
                    timings.charging_collapse
                } else {
                    timings.plugged_collapse
                };
                effects.push(Effect::Schedule {
                    kind: TimerKind::AutoCollapse,
                    delay,
                    event: IslandEvent::AutoCollapseDue,
                });
            }
            HoverExpanded | ManualExpanded => next.suppressed_charge = true,
        },
        IslandEvent::ChargeChanged(ChargeTransition::Unplugged) => {
            next.suppressed_charge = false;
            if model.state == ChargeExpanded {
                next.state = Collapsed;
                effects.push(Effect::Cancel(TimerKind::AutoCollapse));
            }
        }
        IslandEvent::ChargeChanged(ChargeTransition::ChargingStopped) => {
            if model.state == ChargeExpanded {
                effects.push(Effect::Schedule {
                    kind: TimerKind::AutoCollapse,
                    delay: timings.full_charge_collapse,
                    event: IslandEvent::AutoCollapseDue,
                });
            }
        }
        IslandEvent::AutoCollapseDue if model.state == ChargeExpanded => {
            if model.hovering {
                // Check again once the pending hover settle has landed.
                effects.push(Effect::Schedule {
                    kind: TimerKind::AutoCollapse,
                    delay: timings.hover_debounce,
                    event: IslandEvent::AutoCollapseDue,
                });
            } else {
                next.state = Collapsed;
            }
        }
        IslandEvent::AutoCollapseDue => {}
    }

    Reduction {
        model: next,
        effects,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(state: IslandState) -> IslandModel {
        IslandModel {
            state,
            ..Default::default()
        }
    }

    fn run(model: IslandModel, event: IslandEvent) -> Reduction {
        reduce(model, event, &IslandTimings::default())
    }

    #[test]
    fn test_hover_change_only_schedules() {
        let r = run(model(IslandState::Collapsed), IslandEvent::HoverChanged(true));
        assert_eq!(r.model.state, IslandState::Collapsed);
        assert!(r.model.hovering);
        assert_eq!(
            r.effects,
            vec![Effect::Schedule {
                kind: TimerKind::Hover,
                delay: Duration::from_millis(80),
                event: IslandEvent::HoverSettled(true),
            }]
        );
    }

    #[test]
    fn test_hover_settle_expands_and_collapses() {
        let hovering = IslandModel {
            hovering: true,
            ..Default::default()
        };
        let r = run(hovering, IslandEvent::HoverSettled(true));
        assert_eq!(r.model.state, IslandState::HoverExpanded);

        let left = IslandModel {
            hovering: false,
            ..r.model
        };
        let r = run(left, IslandEvent::HoverSettled(false));
        assert_eq!(r.model.state, IslandState::Collapsed);
    }

    #[test]
    fn test_stale_settle_is_ignored() {
        let r = run(model(IslandState::Collapsed), IslandEvent::HoverSettled(true));
        assert_eq!(r.model.state, IslandState::Collapsed);
        assert!(r.effects.is_empty());
    }

    #[test]
    fn test_manual_keeps_priority_over_hover() {
        let m = IslandModel {
            state: IslandState::ManualExpanded,
            hovering: false,
            ..Default::default()
        };
        let r = run(m, IslandEvent::HoverSettled(false));
        assert_eq!(r.model.state, IslandState::ManualExpanded);
    }

    #[test]
    fn test_hover_takes_over_charge() {
        let m = IslandModel {
            state: IslandState::ChargeExpanded,
            hovering: true,
            ..Default::default()
        };
        let r = run(m, IslandEvent::HoverSettled(true));
        assert_eq!(r.model.state, IslandState::HoverExpanded);
        assert_eq!(r.effects, vec![Effect::Cancel(TimerKind::AutoCollapse)]);
    }

    #[test]
    fn test_tap_toggles() {
        let r = run(model(IslandState::Collapsed), IslandEvent::Tap);
        assert_eq!(r.model.state, IslandState::ManualExpanded);
        let r = run(r.model, IslandEvent::Tap);
        assert_eq!(r.model.state, IslandState::Collapsed);
    }

    #[test]
    fn test_tap_takes_ownership_from_charge() {
        let r = run(model(IslandState::ChargeExpanded), IslandEvent::Tap);
        assert_eq!(r.model.state, IslandState::ManualExpanded);
        assert!(r.effects.contains(&Effect::Cancel(TimerKind::AutoCollapse)));
    }

    #[test]
    fn test_plug_in_schedules_by_charging() {
        let r = run(
            model(IslandState::Collapsed),
            IslandEvent::ChargeChanged(ChargeTransition::PluggedIn { charging: true }),
        );
        assert_eq!(r.model.state, IslandState::ChargeExpanded);
        assert_eq!(
            r.effects,
            vec![Effect::Schedule {
                kind: TimerKind::AutoCollapse,
                delay: Duration::from_secs(2),
                event: IslandEvent::AutoCollapseDue,
            }]
        );

        let r = run(
            model(IslandState::Collapsed),
            IslandEvent::ChargeChanged(ChargeTransition::PluggedIn { charging: false }),
        );
        assert!(matches!(
            r.effects[..],
            [Effect::Schedule { delay, .. }] if delay == Duration::from_secs(5)
        ));
    }

    #[test]
    fn test_plug_in_suppressed_while_owned() {
        for state in [IslandState::HoverExpanded, IslandState::ManualExpanded] {
            let r = run(
                model(state),
                IslandEvent::ChargeChanged(ChargeTransition::PluggedIn { charging: true }),
            );
            assert_eq!(r.model.state, state);
            assert!(r.model.suppressed_charge);
            assert!(r.effects.is_empty());
        }
    }

    #[test]
    fn test_unplug_collapses_charge_only() {
        let r = run(
            model(IslandState::ChargeExpanded),
            IslandEvent::ChargeChanged(ChargeTransition::Unplugged),
        );
        assert_eq!(r.model.state, IslandState::Collapsed);

        let r = run(
            model(IslandState::ManualExpanded),
            IslandEvent::ChargeChanged(ChargeTransition::Unplugged),
        );
        assert_eq!(r.model.state, IslandState::ManualExpanded);
    }

    #[test]
    fn test_auto_collapse_waits_for_hover() {
        let hovered = IslandModel {
            state: IslandState::ChargeExpanded,
            hovering: true,
            ..Default::default()
        };
        let r = run(hovered, IslandEvent::AutoCollapseDue);
        assert_eq!(r.model.state, IslandState::ChargeExpanded);
        assert_eq!(
            r.effects,
            vec![Effect::Schedule {
                kind: TimerKind::AutoCollapse,
                delay: Duration::from_millis(80),
                event: IslandEvent::AutoCollapseDue,
            }]
        );

        let r = run(model(IslandState::ChargeExpanded), IslandEvent::AutoCollapseDue);
        assert_eq!(r.model.state, IslandState::Collapsed);

        let r = run(model(IslandState::ManualExpanded), IslandEvent::AutoCollapseDue);
        assert_eq!(r.model.state, IslandState::ManualExpanded);
        assert!(r.effects.is_empty());
    }
}
