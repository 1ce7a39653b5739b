//! Stamp - opaque frame timestamp

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// Frame timestamp (seconds + nanoseconds since an arbitrary epoch).
///
/// The dispatcher never interprets a stamp; it copies it into every header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Stamp {
    pub sec: i32,
    pub nanosec: u32,
}

impl Stamp {
    pub const fn new(sec: i32, nanosec: u32) -> Self {
        Self { sec, nanosec }
    }

    /// Build a stamp from floating-point seconds.
    pub fn from_secs_f64(secs: f64) -> Self {
        let whole = secs.floor();
        let nanosec = ((secs - whole) * NANOS_PER_SEC).round() as u32;
        // rounding can carry into the next second
        if nanosec >= 1_000_000_000 {
            Self::new(whole as i32 + 1, 0)
        } else {
            Self::new(whole as i32, nanosec)
        }
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.sec as f64 + self.nanosec as f64 / NANOS_PER_SEC
    }

    /// Current wall-clock time.
    pub fn now() -> Self {
        Self::from(Utc::now())
    }
}

impl From<DateTime<Utc>> for Stamp {
    fn from(time: DateTime<Utc>) -> Self {
        Self::new(time.timestamp() as i32, time.timestamp_subsec_nanos())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_secs_f64() {
        let stamp = Stamp::from_secs_f64(12.25);
        assert_eq!(stamp.sec, 12);
        assert_eq!(stamp.nanosec, 250_000_000);
        assert!((stamp.as_secs_f64() - 12.25).abs() < 1e-9);
    }

    #[test]
    fn test_rounding_carry() {
        let stamp = Stamp::from_secs_f64(0.999_999_999_9);
        assert_eq!(stamp, Stamp::new(1, 0));
    }

    #[test]
    fn test_ordering() {
        assert!(Stamp::new(1, 5) < Stamp::new(2, 0));
        assert!(Stamp::new(1, 5) > Stamp::new(1, 4));
    }
}
