//! Packed DOS date/time as stored in the VDF header

use std::fmt;

/// Calendar date and time decoded from a packed DOS timestamp.
///
/// Layout (LSB first): seconds/2 (5 bits), minute (6), hour (5), day (5),
/// month (4), years since 1980 (7). The packed value sorts in chronological
/// order, which is what package override ordering relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DosDateTime {
    /// Full year (1980..=2107)
    pub year: u16,
    /// Month (1..=12)
    pub month: u8,
    /// Day of month (1..=31)
    pub day: u8,
    /// Hour (0..=23)
    pub hour: u8,
    /// Minute (0..=59)
    pub minute: u8,
    /// Second (0..=58, two second resolution)
    pub second: u8,
}

impl DosDateTime {
    /// Earliest representable timestamp, 1980-01-01 00:00:00
    pub const EPOCH: Self = Self {
        year: 1980,
        month: 1,
        day: 1,
        hour: 0,
        minute: 0,
        second: 0,
    };

    /// Create a timestamp from calendar fields.
    ///
    /// Returns `None` if any field is out of range for the packed format.
    pub fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Option<Self> {
        let value = Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        };
        value.is_valid().then_some(value)
    }

    /// Decode a packed DOS timestamp. Fields are taken as stored, even when
    /// out of range; use [`is_valid`](Self::is_valid) to check them.
    pub const fn from_packed(value: u32) -> Self {
        Self {
            year: 1980 + ((value >> 25) & 0x7F) as u16,
            month: ((value >> 21) & 0x0F) as u8,
            day: ((value >> 16) & 0x1F) as u8,
            hour: ((value >> 11) & 0x1F) as u8,
            minute: ((value >> 5) & 0x3F) as u8,
            second: ((value & 0x1F) * 2) as u8,
        }
    }

    /// Encode into the packed DOS representation.
    pub const fn to_packed(self) -> u32 {
        ((self.year.saturating_sub(1980) as u32 & 0x7F) << 25)
            | ((self.month as u32 & 0x0F) << 21)
            | ((self.day as u32 & 0x1F) << 16)
            | ((self.hour as u32 & 0x1F) << 11)
            | ((self.minute as u32 & 0x3F) << 5)
            | ((self.second as u32 / 2) & 0x1F)
    }

    /// Whether all fields are within their calendar ranges.
    pub const fn is_valid(self) -> bool {
        self.year >= 1980
            && self.year <= 2107
            && self.month >= 1
            && self.month <= 12
            && self.day >= 1
            && self.day <= 31
            && self.hour < 24
            && self.minute < 60
            && self.second < 60
    }

    /// Seconds since the Unix epoch, interpreting the timestamp as UTC.
    ///
    /// Returns `None` for timestamps with out-of-range fields.
    pub fn to_unix_seconds(self) -> Option<u64> {
        if !self.is_valid() {
            return None;
        }
        let days = days_from_civil(
            i64::from(self.year),
            i64::from(self.month),
            i64::from(self.day),
        );
        let seconds = days * 86_400
            + i64::from(self.hour) * 3_600
            + i64::from(self.minute) * 60
            + i64::from(self.second);
        u64::try_from(seconds).ok()
    }
}

impl Default for DosDateTime {
    fn default() -> Self {
        Self::EPOCH
    }
}

impl fmt::Display for DosDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

/// Days since 1970-01-01 for a proleptic Gregorian date.
fn days_from_civil(year: i64, month: i64, day: i64) -> i64 {
    let year = if month <= 2 { year - 1 } else { year };
    let era = year.div_euclid(400);
    let year_of_era = year - era * 400;
    let month_index = (month + 9) % 12;
    let day_of_year = (153 * month_index + 2) / 5 + day - 1;
    let day_of_era = year_of_era * 365 + year_of_era / 4 - year_of_era / 100 + day_of_year;
    era * 146_097 + day_of_era - 719_468
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_decode_known_timestamp() {
        let ts = DosDateTime::from_packed(763_191_296);
        assert_eq!(ts, DosDateTime::new(2002, 11, 29, 12, 0, 0).unwrap());
        assert_eq!(ts.to_string(), "2002-11-29 12:00:00");
    }

    #[test]
    fn test_unix_seconds() {
        assert_eq!(DosDateTime::EPOCH.to_unix_seconds(), Some(315_532_800));

        let ts = DosDateTime::new(2002, 11, 29, 12, 0, 0).unwrap();
        assert_eq!(ts.to_unix_seconds(), Some(1_038_571_200));
    }

    #[test]
    fn test_invalid_fields_rejected() {
        assert!(DosDateTime::new(2001, 13, 1, 0, 0, 0).is_none());
        assert!(DosDateTime::new(1979, 1, 1, 0, 0, 0).is_none());
        assert_eq!(DosDateTime::from_packed(0).to_unix_seconds(), None);
    }

    proptest! {
        #[test]
        fn packed_order_matches_chronological_order(a in any::<u32>(), b in any::<u32>()) {
            let (x, y) = (DosDateTime::from_packed(a), DosDateTime::from_packed(b));
            // Days past the end of a short month roll into the next one
            if x.day <= 28 && y.day <= 28
                && let (Some(sx), Some(sy)) = (x.to_unix_seconds(), y.to_unix_seconds())
            {
                prop_assert_eq!(sx.cmp(&sy), a.cmp(&b));
            }
        }
    }
}
