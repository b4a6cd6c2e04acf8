//! Reads the internal battery through `pmset -g batt`.

use std::process::Command;

use super::{PowerReading, PowerSource};

#[derive(Debug, Default, Clone, Copy)]
pub struct PmsetSource;

impl PowerSource for PmsetSource {
    fn read(&self) -> Option<PowerReading> {
        let output = match Command::new("pmset").args(["-g", "batt"]).output() {
            Ok(output) => output,
            Err(e) => {
                log::debug!("Failed to run pmset: {}", e);
                return None;
            }
        };
        parse_pmset(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Parses output such as:
///
/// ```text
/// Now drawing from 'AC Power'
///  -InternalBattery-0 (id=4653155)	85%; charging; 1:23 remaining present: true
/// ```
pub(crate) fn parse_pmset(text: &str) -> Option<PowerReading> {
    let on_ac = text.contains("'AC Power'");

    let line = text
        .lines()
        .find(|l| l.contains("InternalBattery"))
        .or_else(|| text.lines().find(|l| l.contains('%')))?;

    let mut fields = line.split(';');

    // "-InternalBattery-0 (id=4653155)\t85%"
    let level = fields.next().and_then(|field| {
        let head = &field[..field.find('%')?];
        let prefix = head.trim_end_matches(|c: char| c.is_ascii_digit());
        head[prefix.len()..].parse::<u8>().ok()
    });

    let is_charging = fields.next().and_then(|field| parse_state(field.trim()));
    let minutes_to_full = fields.next().and_then(parse_remaining);

    Some(PowerReading {
        on_ac,
        is_charging,
        level,
        minutes_to_full,
    })
}

fn parse_state(state: &str) -> Option<bool> {
    match state {
        "charging" | "finishing charge" => Some(true),
        // "AC attached; not charging" splits into two fields.
        "discharging" | "charged" | "AC attached" => Some(false),
        s if s.contains("not charging") => Some(false),
        _ => None,
    }
}

/// "1:23 remaining present: true" -> 83, "(no estimate)" -> -1.
fn parse_remaining(field: &str) -> Option<i32> {
    if field.contains("(no estimate)") {
        return Some(-1);
    }
    let token = field.split_whitespace().find(|t| t.contains(':'))?;
    let (hours, minutes) = token.split_once(':')?;
    Some(hours.parse::<i32>().ok()? * 60 + minutes.parse::<i32>().ok()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_charging() {
        let out = "Now drawing from 'AC Power'\n -InternalBattery-0 (id=4653155)\t85%; charging; 1:23 remaining present: true\n";
        let reading = parse_pmset(out).unwrap();
        assert!(reading.on_ac);
        assert_eq!(reading.level, Some(85));
        assert_eq!(reading.is_charging, Some(true));
        assert_eq!(reading.minutes_to_full, Some(83));
    }

    #[test]
    fn test_parse_no_estimate() {
        let out = "Now drawing from 'AC Power'\n -InternalBattery-0 (id=1)\t12%; charging; (no estimate) present: true\n";
        let reading = parse_pmset(out).unwrap();
        assert_eq!(reading.minutes_to_full, Some(-1));
    }

    #[test]
    fn test_parse_discharging() {
        let out = "Now drawing from 'Battery Power'\n -InternalBattery-0 (id=1)\t100%; discharging; 9:02 remaining present: true\n";
        let reading = parse_pmset(out).unwrap();
        assert!(!reading.on_ac);
        assert_eq!(reading.level, Some(100));
        assert_eq!(reading.is_charging, Some(false));
    }

    #[test]
    fn test_parse_held_by_charge_limit() {
        let out = "Now drawing from 'AC Power'\n -InternalBattery-0 (id=1)\t80%; AC attached; not charging present: true\n";
        let reading = parse_pmset(out).unwrap();
        assert!(reading.on_ac);
        assert_eq!(reading.is_charging, Some(false));
        assert_eq!(reading.minutes_to_full, None);
    }

    #[test]
    fn test_parse_unknown_state_leaves_flag_empty() {
        let out = "Now drawing from 'AC Power'\n -InternalBattery-0 (id=1)\t64%; something new; 0:40 remaining\n";
        let reading = parse_pmset(out).unwrap();
        assert_eq!(reading.is_charging, None);
        assert_eq!(reading.minutes_to_full, Some(40));
    }

    #[test]
    fn test_parse_non_ascii_before_level() {
        let out = "Now drawing from 'AC Power'\n -InternalBattery-0 (id=1)\u{a0}85%; charging; 1:00 remaining\n";
        let reading = parse_pmset(out).unwrap();
        assert_eq!(reading.level, Some(85));
        assert_eq!(reading.minutes_to_full, Some(60));

        let lossy = String::from_utf8_lossy(b" -InternalBattery-0 (id=1)\xff42%; discharging\n");
        assert_eq!(parse_pmset(&lossy).unwrap().level, Some(42));
    }

    #[test]
    fn test_parse_desktop_without_battery() {
        assert_eq!(parse_pmset("Now drawing from 'AC Power'\n"), None);
    }
}
