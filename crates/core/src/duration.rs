//! Lecture duration helpers: rounding probed values, parsing clock-style
//! input and formatting seconds for display.

use crate::content::CourseContent;
use crate::error::CoreError;

/// Round a probed duration up to whole seconds.
///
/// Returns `None` for non-finite or non-positive values, which callers treat
/// as "could not detect".
pub fn ceil_seconds(seconds: f64) -> Option<u32> {
    if !seconds.is_finite() || seconds <= 0.0 || seconds > u32::MAX as f64 {
        return None;
    }
    Some(seconds.ceil() as u32)
}

/// Parse `mm:ss` or `hh:mm:ss` into seconds.
///
/// Each field has one or two digits; minutes and seconds must be below 60
/// and the result must be positive.
pub fn parse_duration(input: &str) -> Result<u32, CoreError> {
    let invalid = || {
        CoreError::Validation(format!(
            "Invalid duration '{input}'. Use mm:ss or hh:mm:ss (e.g. 5:30 or 1:05:30)"
        ))
    };

    let parts: Vec<&str> = input.trim().split(':').collect();
    if !(2..=3).contains(&parts.len()) {
        return Err(invalid());
    }
    let mut numbers = Vec::with_capacity(parts.len());
    for part in &parts {
        if part.is_empty() || part.len() > 2 || !part.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        numbers.push(part.parse::<u32>().map_err(|_| invalid())?);
    }

    let (hours, minutes, seconds) = match numbers[..] {
        [m, s] => (0, m, s),
        [h, m, s] => (h, m, s),
        _ => return Err(invalid()),
    };
    if minutes >= 60 || seconds >= 60 {
        return Err(invalid());
    }

    let total = hours * 3600 + minutes * 60 + seconds;
    if total == 0 {
        return Err(CoreError::Validation(
            "Duration must be greater than 0".to_string(),
        ));
    }
    Ok(total)
}

/// Sum of every lecture duration. Widened so long courses cannot overflow.
pub fn total_duration_seconds(tree: &CourseContent) -> u64 {
    tree.lectures()
        .map(|(_, lecture)| u64::from(lecture.duration_seconds()))
        .sum()
}

/// Format seconds as `mm:ss`, or `hh:mm:ss` from one hour up.
pub fn format_duration(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ceil_rounds_up() {
        assert_eq!(ceil_seconds(12.0), Some(12));
        assert_eq!(ceil_seconds(12.01), Some(13));
        assert_eq!(ceil_seconds(0.2), Some(1));
    }

    #[test]
    fn ceil_rejects_unusable_values() {
        assert_eq!(ceil_seconds(0.0), None);
        assert_eq!(ceil_seconds(-3.0), None);
        assert_eq!(ceil_seconds(f64::NAN), None);
        assert_eq!(ceil_seconds(f64::INFINITY), None);
    }

    #[test]
    fn parse_minutes_seconds() {
        assert_eq!(parse_duration("5:30").unwrap(), 330);
        assert_eq!(parse_duration(" 05:07 ").unwrap(), 307);
    }

    #[test]
    fn parse_hours_minutes_seconds() {
        assert_eq!(parse_duration("1:05:30").unwrap(), 3930);
        assert_eq!(parse_duration("10:00:00").unwrap(), 36000);
    }

    #[test]
    fn parse_rejects_out_of_range_fields() {
        assert!(parse_duration("5:60").is_err());
        assert!(parse_duration("1:60:00").is_err());
    }

    #[test]
    fn parse_rejects_malformed_input() {
        for input in ["", "5", "abc", "1:2:3:4", "123:00", "5:", ":30", "5:3a", "-1:30"] {
            assert!(parse_duration(input).is_err(), "{input} should be rejected");
        }
    }

    #[test]
    fn parse_rejects_zero() {
        assert!(parse_duration("0:00").is_err());
    }

    #[test]
    fn format_short_and_long() {
        assert_eq!(format_duration(0), "00:00");
        assert_eq!(format_duration(330), "05:30");
        assert_eq!(format_duration(3930), "01:05:30");
    }

    #[test]
    fn format_then_parse_agrees() {
        for seconds in [1, 59, 61, 3599, 3600, 7322] {
            assert_eq!(u64::from(parse_duration(&format_duration(seconds)).unwrap()), seconds);
        }
    }

    #[test]
    fn format_long_totals() {
        assert_eq!(format_duration(6_000_000_000), "1666666:40:00");
    }

    #[test]
    fn total_of_large_lectures_does_not_overflow() {
        use crate::persistence::{hydrate, SectionDocument};

        let docs: Vec<SectionDocument> = serde_json::from_value(serde_json::json!([{
            "_id": "s1",
            "sectionContents": [
                { "_id": "l1", "videoLength": 3_000_000_000u32 },
                { "_id": "l2", "videoLength": 3_000_000_000u32 }
            ]
        }]))
        .unwrap();
        let tree = hydrate(&docs).unwrap();
        assert_eq!(total_duration_seconds(&tree), 6_000_000_000);
        assert_eq!(total_duration_seconds(&CourseContent::new()), 0);
    }
}
