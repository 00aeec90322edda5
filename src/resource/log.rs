//! Log records and severity levels

use super::{Identity, Kind, Resource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::Location;

/// Severity of a log record. The values are bit flags so that sinks can
/// subscribe to any combination of levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Level {
    Trace = 0x01,
    Debug = 0x02,
    #[default]
    Info = 0x04,
    /// Needs operator attention.
    Alarm = 0x08,
    /// Noteworthy lifecycle change, such as a service becoming ready.
    Event = 0x10,
    Metric = 0x20,
}

impl Level {
    pub const ALL: [Level; 6] = [
        Level::Trace,
        Level::Debug,
        Level::Info,
        Level::Alarm,
        Level::Event,
        Level::Metric,
    ];

    pub fn bits(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Level::Trace => "Trace",
            Level::Debug => "Debug",
            Level::Info => "Info",
            Level::Alarm => "Alarm",
            Level::Event => "Event",
            Level::Metric => "Metric",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> u8 {
        level.bits()
    }
}

impl TryFrom<u8> for Level {
    type Error = String;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        Level::ALL
            .into_iter()
            .find(|level| level.bits() == bits)
            .ok_or_else(|| format!("unknown log level {:#04x}", bits))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Log {
    #[serde(flatten)]
    pub identity: Identity,
    #[serde(default)]
    pub level: Level,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub process: String,
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub function: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub metric: String,
}

impl Log {
    /// Record stamped with the caller's source location.
    #[track_caller]
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        let location = Location::caller();
        let mut log = Self {
            level,
            timestamp: Utc::now(),
            process: std::env::args().next().unwrap_or_default(),
            file: location.file().to_string(),
            line: location.line(),
            message: message.into(),
            ..Self::default()
        };
        log.init();
        log
    }
}

impl Resource for Log {
    const KIND: Kind = Kind::LOG;

    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn identity_mut(&mut self) -> &mut Identity {
        &mut self.identity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_level_bits_and_names() {
        let expected = [
            (Level::Trace, 0x01, "Trace"),
            (Level::Debug, 0x02, "Debug"),
            (Level::Info, 0x04, "Info"),
            (Level::Alarm, 0x08, "Alarm"),
            (Level::Event, 0x10, "Event"),
            (Level::Metric, 0x20, "Metric"),
        ];
        for (level, bits, name) in expected {
            assert_eq!(level.bits(), bits);
            assert_eq!(level.to_string(), name);
            assert_eq!(Level::try_from(bits), Ok(level));
        }
        assert!(Level::try_from(0x03).is_err());
    }

    #[test]
    fn test_new_records_location() {
        let log = Log::new(Level::Alarm, "disk full");

        assert_eq!(log.level, Level::Alarm);
        assert!(log.file.ends_with("log.rs"));
        assert!(log.line > 0);
        assert_eq!(log.identity.kind, Kind::LOG);

        let json = serde_json::to_value(&log).unwrap();
        assert_eq!(json["level"], 8);
        assert_eq!(json["message"], "disk full");
    }
}
