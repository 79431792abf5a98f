// ── Security states and wire parsing ──
//
// The hub's four-state security model plus the read-only triggered
// state, and the lenient integer parsing applied to mapped response
// bodies. The wire encoding is the identity: remote endpoints are
// expected to speak these integers directly (after mapping).

use std::fmt;

/// States the hub may command the system into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetState {
    StayArm,
    AwayArm,
    NightArm,
    Disarm,
}

impl TargetState {
    /// The integer exchanged with the remote endpoint.
    pub fn wire_code(self) -> i64 {
        match self {
            Self::StayArm => 0,
            Self::AwayArm => 1,
            Self::NightArm => 2,
            Self::Disarm => 3,
        }
    }

    pub fn from_wire(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::StayArm),
            1 => Some(Self::AwayArm),
            2 => Some(Self::NightArm),
            3 => Some(Self::Disarm),
            _ => None,
        }
    }
}

impl fmt::Display for TargetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::StayArm => "stay",
            Self::AwayArm => "away",
            Self::NightArm => "night",
            Self::Disarm => "disarm",
        };
        f.write_str(name)
    }
}

/// States the system may report back, including the read-only
/// alarm-triggered state that is never a valid write target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CurrentState {
    StayArm,
    AwayArm,
    NightArm,
    Disarmed,
    AlarmTriggered,
}

impl CurrentState {
    pub fn wire_code(self) -> i64 {
        match self {
            Self::StayArm => 0,
            Self::AwayArm => 1,
            Self::NightArm => 2,
            Self::Disarmed => 3,
            Self::AlarmTriggered => 4,
        }
    }

    pub fn from_wire(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::StayArm),
            1 => Some(Self::AwayArm),
            2 => Some(Self::NightArm),
            3 => Some(Self::Disarmed),
            4 => Some(Self::AlarmTriggered),
            _ => None,
        }
    }
}

impl fmt::Display for CurrentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::StayArm => "stay-armed",
            Self::AwayArm => "away-armed",
            Self::NightArm => "night-armed",
            Self::Disarmed => "disarmed",
            Self::AlarmTriggered => "alarm-triggered",
        };
        f.write_str(name)
    }
}

/// Lenient leading-digit integer parsing.
///
/// Skips leading whitespace, accepts an optional sign, consumes base-10
/// digits up to the first non-digit and ignores everything after, so
/// `"3 OK"` parses as `3`. Input with no leading digits yields `None`,
/// the defined not-a-number value that callers must treat as an invalid
/// state rather than an error. Downstream change comparisons depend on
/// exactly this leniency; do not substitute strict parsing.
pub fn parse_state_code(input: &str) -> Option<i64> {
    let trimmed = input.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits: &str = {
        let end = rest
            .as_bytes()
            .iter()
            .position(|b| !b.is_ascii_digit())
            .unwrap_or(rest.len());
        &rest[..end]
    };

    if digits.is_empty() {
        return None;
    }

    // Saturate rather than fail on absurdly long digit runs.
    let magnitude = digits.parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}
