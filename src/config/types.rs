use std::fmt;
use std::time::Duration;

use serde::Deserialize;

use crate::island::IslandTimings;

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub island: IslandConfig,
    #[serde(default)]
    pub charging: ChargingConfig,
}

/// Appearance and interaction of the island itself
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct IslandConfig {
    /// Delay before hover enter/exit takes effect (milliseconds)
    #[serde(default = "default_hover_debounce_ms")]
    pub hover_debounce_ms: u64,
    /// Duration of the expand/collapse frame animation (milliseconds)
    #[serde(default = "default_animation_ms")]
    pub animation_ms: u64,
    /// Island fill color (#RRGGBB or #RRGGBBAA)
    #[serde(default = "default_background_color")]
    pub background_color: String,
    /// Battery text color
    #[serde(default = "default_text_color")]
    pub text_color: String,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
}

impl Default for IslandConfig {
    fn default() -> Self {
        Self {
            hover_debounce_ms: default_hover_debounce_ms(),
            animation_ms: default_animation_ms(),
            background_color: default_background_color(),
            text_color: default_text_color(),
            font_family: default_font_family(),
            font_size: default_font_size(),
        }
    }
}

/// Charging-triggered expansion
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ChargingConfig {
    /// Expand the island when the adapter is plugged in
    #[serde(default = "default_expand_on_plug")]
    pub expand_on_plug: bool,
    /// Auto-collapse delay when plugging in starts charging (milliseconds)
    #[serde(default = "default_charging_collapse_ms")]
    pub charging_collapse_ms: u64,
    /// Auto-collapse delay when plugged in but not charging (milliseconds)
    #[serde(default = "default_plugged_collapse_ms")]
    pub plugged_collapse_ms: u64,
    /// Collapse delay once charging stops on AC, i.e. battery full (milliseconds)
    #[serde(default = "default_full_charge_collapse_ms")]
    pub full_charge_collapse_ms: u64,
    /// How often the battery is polled (milliseconds)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for ChargingConfig {
    fn default() -> Self {
        Self {
            expand_on_plug: default_expand_on_plug(),
            charging_collapse_ms: default_charging_collapse_ms(),
            plugged_collapse_ms: default_plugged_collapse_ms(),
            full_charge_collapse_ms: default_full_charge_collapse_ms(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_hover_debounce_ms() -> u64 {
    80
}

fn default_animation_ms() -> u64 {
    400
}

fn default_background_color() -> String {
    "#000000".to_string()
}

fn default_text_color() -> String {
    "#ffffff".to_string()
}

fn default_font_family() -> String {
    "Helvetica".to_string()
}

fn default_font_size() -> f64 {
    13.0
}

fn default_expand_on_plug() -> bool {
    true
}

fn default_charging_collapse_ms() -> u64 {
    2000
}

fn default_plugged_collapse_ms() -> u64 {
    5000
}

fn default_full_charge_collapse_ms() -> u64 {
    3000
}

fn default_poll_interval_ms() -> u64 {
    2000
}

/// A problem found while validating the config.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigIssue {
    pub field: &'static str,
    pub message: String,
    pub is_error: bool,
}

impl ConfigIssue {
    fn error(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
            is_error: true,
        }
    }

    fn warning(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
            is_error: false,
        }
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = if self.is_error { "error" } else { "warning" };
        write!(f, "{} in '{}': {}", level, self.field, self.message)
    }
}

impl Config {
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        let island = &self.island;
        let charging = &self.charging;

        if island.hover_debounce_ms > 1000 {
            issues.push(ConfigIssue::error(
                "island.hover_debounce_ms",
                format!("{} ms is too long (max 1000)", island.hover_debounce_ms),
            ));
        } else if !(40..=150).contains(&island.hover_debounce_ms) {
            issues.push(ConfigIssue::warning(
                "island.hover_debounce_ms",
                format!(
                    "{} ms is outside the recommended 40-150 ms range",
                    island.hover_debounce_ms
                ),
            ));
        }

        if island.animation_ms > 2000 {
            issues.push(ConfigIssue::warning(
                "island.animation_ms",
                format!("{} ms will feel sluggish", island.animation_ms),
            ));
        }

        for (field, value) in [
            ("island.background_color", &island.background_color),
            ("island.text_color", &island.text_color),
        ] {
            if parse_hex_color(value).is_none() {
                issues.push(ConfigIssue::error(
                    field,
                    format!("'{}' is not a #RRGGBB or #RRGGBBAA color", value),
                ));
            }
        }

        if island.font_size <= 0.0 {
            issues.push(ConfigIssue::error(
                "island.font_size",
                "must be greater than zero",
            ));
        }

        for (field, value) in [
            ("charging.charging_collapse_ms", charging.charging_collapse_ms),
            ("charging.plugged_collapse_ms", charging.plugged_collapse_ms),
            (
                "charging.full_charge_collapse_ms",
                charging.full_charge_collapse_ms,
            ),
        ] {
            if value == 0 {
                issues.push(ConfigIssue::error(field, "must be greater than zero"));
            }
        }

        if charging.poll_interval_ms < 250 {
            issues.push(ConfigIssue::warning(
                "charging.poll_interval_ms",
                format!(
                    "{} ms polls pmset very often; 2000 is recommended",
                    charging.poll_interval_ms
                ),
            ));
        }

        issues
    }

    pub fn timings(&self) -> IslandTimings {
        IslandTimings {
            hover_debounce: Duration::from_millis(self.island.hover_debounce_ms),
            charging_collapse: Duration::from_millis(self.charging.charging_collapse_ms),
            plugged_collapse: Duration::from_millis(self.charging.plugged_collapse_ms),
            full_charge_collapse: Duration::from_millis(self.charging.full_charge_collapse_ms),
        }
    }

    pub fn animation_duration(&self) -> Duration {
        Duration::from_millis(self.island.animation_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.charging.poll_interval_ms.max(1))
    }
}

/// Parse a hex color string into RGBA components (0.0-1.0)
pub fn parse_hex_color(hex: &str) -> Option<(f64, f64, f64, f64)> {
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if !hex.is_ascii() {
        return None;
    }

    let channel = |i: usize| -> Option<f64> {
        u8::from_str_radix(hex.get(i..i + 2)?, 16)
            .ok()
            .map(|v| v as f64 / 255.0)
    };

    match hex.len() {
        6 => Some((channel(0)?, channel(2)?, channel(4)?, 1.0)),
        8 => Some((channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
        _ => None,
    }
}
