//! New note ids.
//!
//! An id is a 14 digit timestamp `YYYYMMDDHHMMSS`. A new id starts from a date prefix of 4, 6, 8,
//! 10, 12 or 14 digits; missing month and day become `01`, and missing hours, minutes and seconds
//! are drawn at random so that several notes made from the same prefix get different ids. A
//! 14 digit prefix keeps everything but its seconds.

use crate::error::BacklinkError;
use chrono::{Local, NaiveDateTime};
use std::{collections::BTreeSet, fmt::Write};

/// Layout of a complete id.
pub const ID_FORMAT: &str = "%Y%m%d%H%M%S";

/// Layout of the default prefix: the current local time to the minute.
pub const PREFIX_FORMAT: &str = "%Y%m%d%H%M";

const MAX_ATTEMPTS: usize = 1000;

/// The current local time as an id prefix.
pub fn default_prefix() -> String {
    Local::now().format(PREFIX_FORMAT).to_string()
}

/// A uniformly drawn number in `0..=max` from the operating system's random source.
pub fn os_random(max: u32) -> Result<u32, BacklinkError> {
    let mut buf = [0u8; 4];
    getrandom::getrandom(&mut buf)?;
    Ok(u32::from_le_bytes(buf) % (max + 1))
}

/// Builds an id from `prefix`, drawing each missing field with `random(max)`.
pub fn suggest_id_with<F>(prefix: &str, mut random: F) -> Result<String, BacklinkError>
where
    F: FnMut(u32) -> Result<u32, BacklinkError>,
{
    let prefix = prefix.trim();
    if !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return Err(BacklinkError::InvalidDate(format!("'{prefix}' is not a number")));
    }
    let (base, fixed, drawn): (&str, &str, &[u32]) = match prefix.len() {
        4 => (prefix, "0101", &[23, 59, 59]),
        6 => (prefix, "01", &[23, 59, 59]),
        8 => (prefix, "", &[23, 59, 59]),
        10 => (prefix, "", &[59, 59]),
        12 => (prefix, "", &[59]),
        14 => (&prefix[..12], "", &[59]),
        n => {
            return Err(BacklinkError::InvalidDate(format!(
                "'{prefix}' has {n} digits, expected 4, 6, 8, 10, 12 or 14"
            )));
        }
    };

    let mut id = format!("{base}{fixed}");
    for max in drawn {
        let value = random(*max)?.min(*max);
        write!(id, "{value:02}")?;
    }

    NaiveDateTime::parse_from_str(&id, ID_FORMAT)
        .map_err(|e| BacklinkError::InvalidDate(format!("'{prefix}': {e}")))?;
    Ok(id)
}

pub fn suggest_id(prefix: &str) -> Result<String, BacklinkError> {
    suggest_id_with(prefix, os_random)
}

/// Draws ids from `prefix` until one is not in `used`.
pub fn generate_unused_id_with<F>(
    prefix: &str,
    used: &BTreeSet<String>,
    mut random: F,
) -> Result<String, BacklinkError>
where
    F: FnMut(u32) -> Result<u32, BacklinkError>,
{
    for attempt in 0..MAX_ATTEMPTS {
        let id = suggest_id_with(prefix, &mut random)?;
        if !used.contains(&id) {
            tracing::debug!("[idgen] {} after {} attempts", id, attempt + 1);
            return Ok(id);
        }
    }
    Err(BacklinkError::Custom(format!(
        "No unused id found for prefix '{prefix}' after {MAX_ATTEMPTS} attempts"
    )))
}

pub fn generate_unused_id(prefix: &str, used: &BTreeSet<String>) -> Result<String, BacklinkError> {
    generate_unused_id_with(prefix, used, os_random)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn always(value: u32) -> impl FnMut(u32) -> Result<u32, BacklinkError> {
        move |max| Ok(value.min(max))
    }

    #[test]
    fn test_prefix_lengths() {
        assert_eq!(suggest_id_with("2020", always(99)).unwrap(), "20200101235959");
        assert_eq!(suggest_id_with("202010", always(0)).unwrap(), "20201001000000");
        assert_eq!(suggest_id_with("20201020", always(7)).unwrap(), "20201020070707");
        assert_eq!(suggest_id_with("2020102009", always(35)).unwrap(), "20201020093535");
        assert_eq!(suggest_id_with("202010200935", always(36)).unwrap(), "20201020093536");
        assert_eq!(
            suggest_id_with("20201020093536", always(12)).unwrap(),
            "20201020093512"
        );
    }

    #[test]
    fn test_invalid_prefixes() {
        for prefix in ["", "202", "2020102", "20201340", "2020-10", "202010200935361"] {
            let err = suggest_id_with(prefix, always(0)).unwrap_err();
            assert!(matches!(err, BacklinkError::InvalidDate(_)), "{prefix}");
        }
    }

    #[test]
    fn test_unused_id_skips_taken_ones() {
        let used: BTreeSet<String> = ["20201020093500".to_string()].into_iter().collect();
        let mut draws = vec![0, 0, 1].into_iter();
        let id = generate_unused_id_with("202010200935", &used, |_| {
            Ok(draws.next().unwrap_or(59))
        })
        .unwrap();
        assert_eq!(id, "20201020093501");
    }

    #[test]
    fn test_gives_up_when_every_draw_is_taken() {
        let used: BTreeSet<String> = ["20201020093500".to_string()].into_iter().collect();
        let err = generate_unused_id_with("202010200935", &used, always(0)).unwrap_err();
        assert!(matches!(err, BacklinkError::Custom(_)));
    }

    #[test]
    fn test_os_random_ids_are_valid() {
        let id = generate_unused_id(&default_prefix(), &BTreeSet::new()).unwrap();
        assert_eq!(id.len(), 14);
        assert!(NaiveDateTime::parse_from_str(&id, ID_FORMAT).is_ok());
    }
}
