//! Inline style values written to the transformable element
//!
//! Offsets are stored as CSS pixel lengths and scale as a `scale()`
//! transform, the same text a browser would see. Parsing is lenient: it
//! reads the leading number and ignores whatever unit follows.

use std::time::Duration;

pub const LEFT: &str = "left";
pub const TOP: &str = "top";
pub const TRANSFORM: &str = "transform";
pub const TRANSFORM_ORIGIN: &str = "transform-origin";
pub const TRANSITION: &str = "transition";

/// Format a pixel length, e.g. `-12.5px`.
pub fn format_px(value: f32) -> String {
    format!("{}px", value)
}

/// Read the leading number of a CSS length. `None` when there is none.
pub fn parse_px(value: &str) -> Option<f32> {
    leading_number(value.trim())
}

/// Format a uniform scale transform.
pub fn format_scale(scale: f32) -> String {
    format!("scale({})", scale)
}

/// Extract the factor from a `scale(<n>)` transform.
pub fn parse_scale(value: &str) -> Option<f32> {
    let inner = value.trim().strip_prefix("scale(")?;
    let end = inner.find(')')?;
    inner[..end].trim().parse().ok()
}

/// Transition animating both offset axes over `duration`.
pub fn slide_transition(duration: Duration) -> String {
    let secs = duration.as_secs_f32();
    format!("top {secs}s ease, left {secs}s ease")
}

fn leading_number(text: &str) -> Option<f32> {
    let bytes = text.as_bytes();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    let mut seen_exp = false;

    while end < bytes.len() {
        let c = bytes[end];
        match c {
            b'0'..=b'9' => seen_digit = true,
            b'+' | b'-' if end == 0 => {}
            b'+' | b'-' if seen_exp && matches!(bytes[end - 1], b'e' | b'E') => {}
            b'.' if !seen_dot && !seen_exp => seen_dot = true,
            b'e' | b'E' if seen_digit && !seen_exp => {
                // Only an exponent when digits follow, otherwise it is a unit like "em"
                let rest = &bytes[end + 1..];
                let digits_follow = match rest.first() {
                    Some(b'+') | Some(b'-') => rest.get(1).is_some_and(u8::is_ascii_digit),
                    Some(d) => d.is_ascii_digit(),
                    None => false,
                };
                if !digits_follow {
                    break;
                }
                seen_exp = true;
            }
            _ => break,
        }
        end += 1;
    }

    if !seen_digit {
        return None;
    }
    text[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_px_round_trip_is_exact() {
        for value in [0.0_f32, 12.0, -50.5, 0.1 + 0.2, 1234.5678, -0.000_25] {
            assert_eq!(parse_px(&format_px(value)), Some(value));
        }
    }

    #[test]
    fn test_parse_px_lenient() {
        assert_eq!(parse_px("42px"), Some(42.0));
        assert_eq!(parse_px("  -7.5px "), Some(-7.5));
        assert_eq!(parse_px("3"), Some(3.0));
        assert_eq!(parse_px("1e2px"), Some(100.0));
        assert_eq!(parse_px("2em"), Some(2.0));
        assert_eq!(parse_px(""), None);
        assert_eq!(parse_px("auto"), None);
        assert_eq!(parse_px("-px"), None);
    }

    #[test]
    fn test_scale_transform() {
        assert_eq!(format_scale(1.5), "scale(1.5)");
        assert_eq!(parse_scale("scale(1.5)"), Some(1.5));
        assert_eq!(parse_scale(" scale( 0.25 ) "), Some(0.25));
        assert_eq!(parse_scale("translate(10px)"), None);
    }

    #[test]
    fn test_slide_transition_text() {
        assert_eq!(
            slide_transition(Duration::from_millis(250)),
            "top 0.25s ease, left 0.25s ease"
        );
    }
}
