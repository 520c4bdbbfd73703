use crate::shared::error::AnalysisError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Class-file format version (`major.minor`) found in a package's bytecode.
///
/// Ordering is numeric on (major, minor), so `61.65536 > 61.0 > 52.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BytecodeVersion {
    major: u32,
    minor: u32,
}

impl BytecodeVersion {
    /// Minor version marking a class file compiled with preview features
    const PREVIEW_MINOR: u32 = 0xFFFF;

    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    pub fn major(&self) -> u32 {
        self.major
    }

    pub fn minor(&self) -> u32 {
        self.minor
    }

    /// Human-readable Java release needed to load this class-file version
    pub fn java_release_label(&self) -> String {
        match (self.major, self.minor) {
            (45, 0) => "java 1.0".to_string(),
            (45, 3) => "java 1.1".to_string(),
            (46, 0) => "java 1.2".to_string(),
            (47, 0) => "java 1.3".to_string(),
            (48, 0) => "java 1.4".to_string(),
            (major, minor) => {
                let release = major.saturating_sub(44);
                if minor == Self::PREVIEW_MINOR {
                    format!("java {} (preview)", release)
                } else {
                    format!("java {}", release)
                }
            }
        }
    }
}

impl fmt::Display for BytecodeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for BytecodeVersion {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AnalysisError::validation(format!("Invalid bytecode version '{}'", s));
        let (major, minor) = s.trim().split_once('.').ok_or_else(invalid)?;
        Ok(Self {
            major: major.parse().map_err(|_| invalid())?,
            minor: minor.parse().map_err(|_| invalid())?,
        })
    }
}

impl Serialize for BytecodeVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BytecodeVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> BytecodeVersion {
        s.parse().unwrap()
    }

    #[test]
    fn test_numeric_minor_ordering() {
        assert!(v("61.65536") > v("61.0"));
        assert!(v("61.0") > v("52.0"));
        assert!(v("52.10") > v("52.9"));
        assert!(v("65.0") > v("61.65536"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("61".parse::<BytecodeVersion>().is_err());
        assert!("a.b".parse::<BytecodeVersion>().is_err());
        assert!("".parse::<BytecodeVersion>().is_err());
    }

    #[test]
    fn test_display_round_trips_text() {
        assert_eq!(v("61.65536").to_string(), "61.65536");
    }

    #[test]
    fn test_java_release_label() {
        assert_eq!(v("45.0").java_release_label(), "java 1.0");
        assert_eq!(v("45.3").java_release_label(), "java 1.1");
        assert_eq!(v("48.0").java_release_label(), "java 1.4");
        assert_eq!(v("52.0").java_release_label(), "java 8");
        assert_eq!(v("65.0").java_release_label(), "java 21");
        assert_eq!(v("65.65535").java_release_label(), "java 21 (preview)");
    }

    #[test]
    fn test_serializes_as_string() {
        let json = serde_json::to_string(&v("55.0")).unwrap();
        assert_eq!(json, "\"55.0\"");
        let back: BytecodeVersion = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v("55.0"));
    }
}
