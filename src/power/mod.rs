//! Battery state as seen by the island.
//!
//! A [`PowerSource`] produces raw readings; [`ChargeSnapshot`] turns them into
//! the few facts the expansion logic cares about, and [`BatteryMonitor`]
//! reports only the snapshots that actually changed.

mod pmset;

pub use pmset::PmsetSource;

/// Raw fields from the power collaborator. Any of them may be missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PowerReading {
    /// Drawing from an external adapter.
    pub on_ac: bool,
    /// Explicit charging flag, when the source reports one.
    pub is_charging: Option<bool>,
    /// Capacity in percent.
    pub level: Option<u8>,
    /// Minutes until full: -1 while the OS is still estimating, 0 when full.
    pub minutes_to_full: Option<i32>,
}

pub trait PowerSource {
    /// Reads the internal battery. `None` on machines without one.
    fn read(&self) -> Option<PowerReading>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChargingState {
    Charging,
    NotCharging,
    FullyCharged,
    #[default]
    Unknown,
}

impl ChargingState {
    pub fn label(&self) -> &'static str {
        match self {
            ChargingState::Charging => "Charging",
            ChargingState::NotCharging => "On Battery",
            ChargingState::FullyCharged => "Charged",
            ChargingState::Unknown => "Unknown",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChargingState::Charging => "charging",
            ChargingState::NotCharging => "notCharging",
            ChargingState::FullyCharged => "fullyCharged",
            ChargingState::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeRemaining {
    Calculating,
    Full,
    Minutes(u32),
    #[default]
    Unknown,
}

impl TimeRemaining {
    pub fn from_minutes(minutes: Option<i32>) -> Self {
        match minutes {
            Some(m) if m < 0 => TimeRemaining::Calculating,
            Some(0) => TimeRemaining::Full,
            Some(m) => TimeRemaining::Minutes(m as u32),
            None => TimeRemaining::Unknown,
        }
    }
}

/// What changed between two snapshots, from the island's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeTransition {
    PluggedIn { charging: bool },
    Unplugged,
    /// Still on AC but no longer charging, usually because the battery is full.
    ChargingStopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChargeSnapshot {
    pub is_plugged_in: bool,
    pub is_charging: bool,
    pub level: u8,
    pub time_remaining: TimeRemaining,
    pub state: ChargingState,
}

impl ChargeSnapshot {
    pub fn from_reading(reading: &PowerReading) -> Self {
        let level = reading.level.unwrap_or(0).min(100);
        let time_remaining = TimeRemaining::from_minutes(reading.minutes_to_full);

        if !reading.on_ac {
            return Self {
                is_plugged_in: false,
                is_charging: false,
                level,
                time_remaining,
                state: ChargingState::NotCharging,
            };
        }

        // Without an explicit flag, anything below full on AC counts as charging.
        // This misreads a battery held back by a charge limit.
        let is_charging = reading.is_charging.unwrap_or(level < 100);
        let state = if is_charging {
            ChargingState::Charging
        } else {
            ChargingState::FullyCharged
        };

        Self {
            is_plugged_in: true,
            is_charging,
            level,
            time_remaining,
            state,
        }
    }

    pub fn transition_from(&self, previous: &ChargeSnapshot) -> Option<ChargeTransition> {
        match (previous.is_plugged_in, self.is_plugged_in) {
            (false, true) => Some(ChargeTransition::PluggedIn {
                charging: self.is_charging,
            }),
            (true, false) => Some(ChargeTransition::Unplugged),
            (true, true) if previous.is_charging && !self.is_charging => {
                Some(ChargeTransition::ChargingStopped)
            }
            _ => None,
        }
    }

    pub fn time_remaining_label(&self) -> String {
        if !self.is_charging {
            return "Not charging".to_string();
        }
        match self.time_remaining {
            TimeRemaining::Calculating => "Calculating...".to_string(),
            TimeRemaining::Full => "Fully charged".to_string(),
            TimeRemaining::Minutes(total) => {
                let hours = total / 60;
                let minutes = total % 60;
                if hours > 0 {
                    format!("{}h {}m", hours, minutes)
                } else {
                    format!("{}m", minutes)
                }
            }
            TimeRemaining::Unknown => "Unknown".to_string(),
        }
    }

    /// One-line summary drawn inside the expanded island.
    pub fn summary(&self) -> String {
        if self.is_charging {
            format!(
                "\u{26A1} {}%  {}  {}",
                self.level,
                self.state.label(),
                self.time_remaining_label()
            )
        } else {
            format!("{}%  {}", self.level, self.state.label())
        }
    }
}

/// Polls a [`PowerSource`] and reports snapshots that differ from the last one.
pub struct BatteryMonitor<S> {
    source: S,
    last: Option<ChargeSnapshot>,
}

impl<S: PowerSource> BatteryMonitor<S> {
    pub fn new(source: S) -> Self {
        Self { source, last: None }
    }

    pub fn poll(&mut self) -> Option<ChargeSnapshot> {
        let reading = self.source.read()?;
        let snapshot = ChargeSnapshot::from_reading(&reading);
        if self.last == Some(snapshot) {
            return None;
        }

        if let Some(previous) = self.last {
            if previous.is_plugged_in != snapshot.is_plugged_in
                || previous.is_charging != snapshot.is_charging
            {
                log::info!(
                    "Battery state changed: {} -> {} ({}%)",
                    previous.state.as_str(),
                    snapshot.state.as_str(),
                    snapshot.level
                );
            }
        } else {
            log::info!(
                "Initial battery state: {} ({}%)",
                snapshot.state.as_str(),
                snapshot.level
            );
        }

        self.last = Some(snapshot);
        Some(snapshot)
    }

    pub fn last(&self) -> Option<ChargeSnapshot> {
        self.last
    }
}
