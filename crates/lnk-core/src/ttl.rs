use crate::error::CoreError;
use std::time::Duration;

/// TTL applied to records created without an explicit ttl.
pub const DEFAULT_TTL: Duration = Duration::from_secs(12 * 60 * 60);

/// Literal token meaning "no expiry", bypassing the ttl grammar.
pub const NO_EXPIRY_TOKEN: &str = "inf";

/// Time unit suffix of a ttl string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Days,
    Hours,
    Minutes,
    Seconds,
}

impl TimeUnit {
    fn from_suffix(suffix: char) -> Option<Self> {
        match suffix {
            'd' => Some(Self::Days),
            'h' => Some(Self::Hours),
            'm' => Some(Self::Minutes),
            's' => Some(Self::Seconds),
            _ => None,
        }
    }

    fn suffix(self) -> char {
        match self {
            Self::Days => 'd',
            Self::Hours => 'h',
            Self::Minutes => 'm',
            Self::Seconds => 's',
        }
    }
}

/// Parses a ttl string of the form `<digits><unit>` with
/// `unit ∈ {d, h, m, s}`.
///
/// The whole string must match: no whitespace, no sign, no fractional
/// amounts. `"11d"` parses to `(11, Days)`; `"11 d"`, `"0.1s"` and a
/// bare `"11"` are rejected.
pub fn parse_ttl(input: &str) -> Result<(u64, TimeUnit), CoreError> {
    let invalid = || CoreError::InvalidTtl(input.to_string());

    let suffix = input.chars().next_back().ok_or_else(invalid)?;
    let unit = TimeUnit::from_suffix(suffix).ok_or_else(invalid)?;

    let digits = &input[..input.len() - suffix.len_utf8()];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let amount: u64 = digits.parse().map_err(|_| invalid())?;

    Ok((amount, unit))
}

/// Converts a parsed ttl to seconds.
///
/// The grammar accepts any digit run that fits in a `u64`, so an amount
/// whose conversion overflows is rejected like unparseable input rather
/// than wrapping.
pub fn to_seconds(amount: u64, unit: TimeUnit) -> Result<u64, CoreError> {
    let per_unit: u64 = match unit {
        TimeUnit::Days => 24 * 60 * 60,
        TimeUnit::Hours => 60 * 60,
        TimeUnit::Minutes => 60,
        TimeUnit::Seconds => 1,
    };

    amount
        .checked_mul(per_unit)
        .ok_or_else(|| CoreError::InvalidTtl(format!("{amount}{}", unit.suffix())))
}

/// Resolved expiry for a record, fixed at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// The record never expires.
    Never,
    /// The record expires this long after creation.
    After(Duration),
}

impl Expiry {
    /// Resolves a raw ttl field into an expiry.
    ///
    /// The three cases are distinct: an absent field falls back to
    /// [`DEFAULT_TTL`], the [`NO_EXPIRY_TOKEN`] literal means no expiry,
    /// and anything else must satisfy the ttl grammar.
    pub fn resolve(raw: Option<&str>) -> Result<Self, CoreError> {
        match raw {
            None => Ok(Self::After(DEFAULT_TTL)),
            Some(NO_EXPIRY_TOKEN) => Ok(Self::Never),
            Some(input) => {
                let (amount, unit) = parse_ttl(input)?;
                Ok(Self::After(Duration::from_secs(to_seconds(amount, unit)?)))
            }
        }
    }

    /// The ttl to hand to the storage backend; `None` means no expiry.
    pub fn as_ttl(&self) -> Option<Duration> {
        match self {
            Self::Never => None,
            Self::After(duration) => Some(*duration),
        }
    }
}
