// Display strings for rendered and exported statistics

/// Scores at or above this are "fresh"
pub const FRESH_THRESHOLD: u8 = 60;

/// Which review source a score comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreKind {
    Critic,
    Audience,
}

/// Icon file name for a score, e.g. "FreshTomato.png"
pub fn score_icon(kind: ScoreKind, score: u8) -> &'static str {
    let fresh = score >= FRESH_THRESHOLD;
    match (kind, fresh) {
        (ScoreKind::Critic, true) => "FreshTomato.png",
        (ScoreKind::Critic, false) => "RottenTomato.png",
        (ScoreKind::Audience, true) => "FreshPopcorn.png",
        (ScoreKind::Audience, false) => "RottenPopcorn.png",
    }
}

/// "87%"
pub fn format_percent(score: u32) -> String {
    format!("{}%", score)
}

/// Compact number with up to two decimals: 1_234_567.0 -> "1.23M"
pub fn compact_number(value: f64) -> String {
    const UNITS: &[(f64, &str)] = &[(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];

    let magnitude = value.abs();
    for &(scale, suffix) in UNITS {
        // Round first so 999_999 becomes "1M" rather than "1000K"
        let scaled = round2(magnitude / scale);
        if scaled >= 1.0 {
            return format!("{}{}{}", sign(value), trim_decimals(scaled), suffix);
        }
    }
    format!("{}{}", sign(value), trim_decimals(round2(magnitude)))
}

/// "$1.23M"
pub fn format_dollars(value: f64) -> String {
    format!("${}", compact_number(value))
}

fn sign(value: f64) -> &'static str {
    if value < 0.0 {
        "-"
    } else {
        ""
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn trim_decimals(value: f64) -> String {
    let text = format!("{:.2}", value);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_number() {
        assert_eq!(compact_number(1_234_567.0), "1.23M");
        assert_eq!(compact_number(1_500_000_000.0), "1.5B");
        assert_eq!(compact_number(900_000.0), "900K");
        assert_eq!(compact_number(999_999.0), "1M");
        assert_eq!(compact_number(650.0), "650");
        assert_eq!(compact_number(0.0), "0");
        assert_eq!(compact_number(-2_500.0), "-2.5K");
    }

    #[test]
    fn test_format_dollars() {
        assert_eq!(format_dollars(105_000_000.0), "$105M");
        assert_eq!(format_dollars(2.1e12), "$2.1T");
    }

    #[test]
    fn test_score_icon() {
        assert_eq!(score_icon(ScoreKind::Critic, 60), "FreshTomato.png");
        assert_eq!(score_icon(ScoreKind::Critic, 59), "RottenTomato.png");
        assert_eq!(score_icon(ScoreKind::Audience, 95), "FreshPopcorn.png");
        assert_eq!(score_icon(ScoreKind::Audience, 10), "RottenPopcorn.png");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(63), "63%");
    }
}
