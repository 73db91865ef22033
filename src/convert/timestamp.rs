use std::fmt;

/// Position in a track with millisecond precision. Not related to any
/// calendar, hours keep counting past 24.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp {
    millis: u64,
}

impl Timestamp {
    /// Truncate `seconds` to whole milliseconds. Negative and non-finite
    /// values become zero.
    pub fn from_seconds(seconds: f64) -> Timestamp {
        let millis = (seconds * 1000.0).trunc();

        Timestamp {
            millis: if millis.is_finite() && millis > 0.0 {
                millis as u64
            } else {
                0
            },
        }
    }

    /// Format as `HH:MM:SS<separator>mmm`.
    pub fn display(self, separator: char) -> impl fmt::Display {
        Display {
            timestamp: self,
            separator,
        }
    }
}

struct Display {
    timestamp: Timestamp,
    separator: char,
}

impl fmt::Display for Display {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ms = self.timestamp.millis;

        write!(
            f,
            "{:02}:{:02}:{:02}{}{:03}",
            ms / 3_600_000,
            ms / 60_000 % 60,
            ms / 1000 % 60,
            self.separator,
            ms % 1000
        )
    }
}
