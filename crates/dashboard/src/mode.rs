//! Display mode selection
//!
//! A timed state machine: a recognized command arms a mode for a fixed
//! hold period, after which the map silently reverts to temperature.

use time::{Duration, OffsetDateTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    Temperature,
    WindSpeed,
    WindDirection,
    Humidity,
    Dewpoint,
    /// Precipitation accumulated over the given number of hours
    Precip(i64),
    /// Temperature trend over the given number of hours
    Trend(i64),
    Pressure,
    Visibility,
}

pub const PRECIP_HOURS: [i64; 4] = [1, 3, 6, 24];
pub const TREND_HOURS: [i64; 8] = [1, 2, 3, 6, 9, 12, 18, 24];

pub const COMMAND_HELP: &str =
    "WS, WD, H, D, P1, P3, P6, P24, T1, T2, T3, T6, T9, T12, T18, T24, PRES, VIS";

impl DisplayMode {
    pub fn token(&self) -> String {
        match self {
            DisplayMode::Temperature => "TEMP".to_string(),
            DisplayMode::WindSpeed => "WS".to_string(),
            DisplayMode::WindDirection => "WD".to_string(),
            DisplayMode::Humidity => "H".to_string(),
            DisplayMode::Dewpoint => "D".to_string(),
            DisplayMode::Precip(hours) => format!("P{}", hours),
            DisplayMode::Trend(hours) => format!("T{}", hours),
            DisplayMode::Pressure => "PRES".to_string(),
            DisplayMode::Visibility => "VIS".to_string(),
        }
    }

    /// Parse a command token, case-insensitively. The default mode has no
    /// token; it is reached only by expiry.
    pub fn parse(token: &str) -> Option<DisplayMode> {
        let token = token.trim().to_uppercase();
        match token.as_str() {
            "WS" => return Some(DisplayMode::WindSpeed),
            "WD" => return Some(DisplayMode::WindDirection),
            "H" => return Some(DisplayMode::Humidity),
            "D" => return Some(DisplayMode::Dewpoint),
            "PRES" => return Some(DisplayMode::Pressure),
            "VIS" => return Some(DisplayMode::Visibility),
            _ => {}
        }
        if let Some(rest) = token.strip_prefix('P') {
            let hours: i64 = rest.parse().ok()?;
            if PRECIP_HOURS.contains(&hours) {
                return Some(DisplayMode::Precip(hours));
            }
        }
        if let Some(rest) = token.strip_prefix('T') {
            let hours: i64 = rest.parse().ok()?;
            if TREND_HOURS.contains(&hours) {
                return Some(DisplayMode::Trend(hours));
            }
        }
        None
    }
}

/// A parsed input line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SetMode(DisplayMode),
    Exit,
}

/// First word of the line decides; unrecognized input maps to `None` and
/// must not mutate any state.
pub fn parse_command(line: &str) -> Option<Command> {
    let word = line.split_whitespace().next()?;
    let upper = word.to_uppercase();
    if upper == "EXIT" || upper == "QUIT" {
        return Some(Command::Exit);
    }
    DisplayMode::parse(&upper).map(Command::SetMode)
}

pub struct ModeController {
    mode: DisplayMode,
    expires_at: Option<OffsetDateTime>,
    hold: Duration,
}

impl ModeController {
    pub fn new(hold: Duration) -> ModeController {
        ModeController {
            mode: DisplayMode::Temperature,
            expires_at: None,
            hold,
        }
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    /// Arm a mode (or re-arm the current one) for the hold period
    pub fn set(&mut self, mode: DisplayMode, now: OffsetDateTime) {
        self.mode = mode;
        self.expires_at = Some(now + self.hold);
    }

    /// Revert to the default once the hold expires. Returns true when a
    /// revert happened on this call.
    pub fn refresh(&mut self, now: OffsetDateTime) -> bool {
        if self.mode == DisplayMode::Temperature {
            return false;
        }
        match self.expires_at {
            Some(expiry) if now > expiry => {
                self.mode = DisplayMode::Temperature;
                self.expires_at = None;
                true
            }
            _ => false,
        }
    }

    /// Time left before revert; `None` while the default mode is active
    pub fn remaining(&self, now: OffsetDateTime) -> Option<Duration> {
        if self.mode == DisplayMode::Temperature {
            return None;
        }
        self.expires_at.map(|expiry| expiry - now)
    }
}
