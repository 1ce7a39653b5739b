//! Version - NatNet 协议版本
//!
//! 版本号格式 `major.minor[.revision[.build]]`，缺省分量按 0 处理，
//! 按分量逐个比较大小。

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Protocol version advertised by the capture server.
///
/// Field order matters: the derived `Ord` compares major, minor, revision,
/// build in that order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub revision: u32,
    pub build: u32,
}

/// Version string could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseVersionError {
    #[error("version '{0}' must have between 2 and 4 components")]
    ComponentCount(String),

    #[error("version '{input}' has a non-numeric component '{component}'")]
    InvalidComponent { input: String, component: String },
}

impl Version {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self {
            major,
            minor,
            revision: 0,
            build: 0,
        }
    }

    pub const fn with_build(major: u32, minor: u32, revision: u32, build: u32) -> Self {
        Self {
            major,
            minor,
            revision,
            build,
        }
    }
}

impl FromStr for Version {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        let parts: Vec<&str> = input.split('.').collect();
        if !(2..=4).contains(&parts.len()) {
            return Err(ParseVersionError::ComponentCount(input.to_string()));
        }

        let mut components = [0u32; 4];
        for (slot, part) in components.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| ParseVersionError::InvalidComponent {
                    input: input.to_string(),
                    component: part.to_string(),
                })?;
        }

        let [major, minor, revision, build] = components;
        Ok(Self::with_build(major, minor, revision, build))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)?;
        if self.revision != 0 || self.build != 0 {
            write!(f, ".{}.{}", self.revision, self.build)?;
        }
        Ok(())
    }
}

impl Serialize for Version {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_two_components() {
        let v: Version = "1.7".parse().unwrap();
        assert_eq!(v, Version::new(1, 7));
    }

    #[test]
    fn test_parse_four_components() {
        let v: Version = "3.1.0.4".parse().unwrap();
        assert_eq!(v, Version::with_build(3, 1, 0, 4));
        assert_eq!(v.to_string(), "3.1.0.4");
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            "3".parse::<Version>(),
            Err(ParseVersionError::ComponentCount(_))
        ));
        assert!(matches!(
            "3.x".parse::<Version>(),
            Err(ParseVersionError::InvalidComponent { .. })
        ));
    }

    #[test]
    fn test_ordering() {
        let threshold = Version::new(1, 7);
        assert!(Version::new(1, 6) < threshold);
        assert!(Version::new(1, 7) >= threshold);
        assert!(Version::new(1, 10) > threshold);
        assert!(Version::new(2, 0) > threshold);
        assert!(Version::with_build(1, 6, 9, 9) < threshold);
    }

    #[test]
    fn test_serde() {
        let v = Version::new(2, 0);
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, "\"2.0\"");
        let parsed: Version = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, v);
    }
}
