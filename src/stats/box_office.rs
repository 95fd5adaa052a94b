// Box office string parsing
// Handles scraped values like "$12.3M", "$1.2B", "450K" and OMDb's "$1,234,567"

use crate::error::BoxOfficeParseError;

/// Values that mean "no box office data" rather than a malformed number
const NO_DATA: &[&str] = &["", "-", "-1"];

/// Parse a box office string into dollars.
///
/// Returns `Ok(None)` for missing data (`None`, empty, `"-"`, `"-1"`), `Ok(Some(dollars))`
/// for recognised amounts, and an error for anything else, negative amounts included.
/// Suffixes are case-sensitive: only `B`, `M` and `K` are understood.
pub fn parse_box_office(raw: Option<&str>) -> Result<Option<f64>, BoxOfficeParseError> {
    let Some(raw) = raw else {
        return Ok(None);
    };

    let trimmed = raw.trim();
    if NO_DATA.contains(&trimmed) {
        return Ok(None);
    }

    let cleaned = trimmed.replace(['$', ','], "");

    let (number, multiplier) = if cleaned.contains('B') {
        (cleaned.replace('B', ""), 1e9)
    } else if cleaned.contains('M') {
        (cleaned.replace('M', ""), 1e6)
    } else if cleaned.contains('K') {
        (cleaned.replace('K', ""), 1e3)
    } else {
        (cleaned, 1.0)
    };

    number
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| Some(v * multiplier))
        .ok_or_else(|| BoxOfficeParseError::new(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6 * b.abs().max(1.0)
    }

    #[test]
    fn test_suffixes() {
        assert!(approx(parse_box_office(Some("$1.5B")).unwrap().unwrap(), 1.5e9));
        assert!(approx(parse_box_office(Some("$250M")).unwrap().unwrap(), 2.5e8));
        assert!(approx(parse_box_office(Some("900K")).unwrap().unwrap(), 9e5));
        assert!(approx(parse_box_office(Some("$12.3M")).unwrap().unwrap(), 12.3e6));
    }

    #[test]
    fn test_plain_numbers() {
        assert_eq!(parse_box_office(Some("1234.5")).unwrap(), Some(1234.5));
        assert_eq!(
            parse_box_office(Some("$306,169,268")).unwrap(),
            Some(306_169_268.0)
        );
        assert_eq!(parse_box_office(Some("  $42 ")).unwrap(), Some(42.0));
    }

    #[test]
    fn test_no_data() {
        assert_eq!(parse_box_office(None).unwrap(), None);
        assert_eq!(parse_box_office(Some("")).unwrap(), None);
        assert_eq!(parse_box_office(Some("-")).unwrap(), None);
        assert_eq!(parse_box_office(Some("   ")).unwrap(), None);
        assert_eq!(parse_box_office(Some("-1")).unwrap(), None);
    }

    #[test]
    fn test_negative_amounts_rejected() {
        assert!(parse_box_office(Some("-5M")).is_err());
        assert!(parse_box_office(Some("$-250")).is_err());
        assert!(parse_box_office(Some("-1.5")).is_err());
    }

    #[test]
    fn test_malformed() {
        assert!(parse_box_office(Some("N/A")).is_err());
        assert!(parse_box_office(Some("$abcM")).is_err());
        // lowercase suffixes are not recognised
        assert!(parse_box_office(Some("$1.2m")).is_err());

        let err = parse_box_office(Some("twelve")).unwrap_err();
        assert_eq!(err.raw, "twelve");
    }
}
