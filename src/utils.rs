// Utility functions
use chrono::{DateTime, Utc};

/// Parses an RFC 3339 timestamp into `DateTime<Utc>`, if possible.
pub fn parse_datetime(date_str: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(date_str)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Trims and collapses every whitespace run into a single space.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Collapses whitespace and returns `None` for blank input.
pub fn clean_optional(value: Option<&str>) -> Option<String> {
    value
        .map(collapse_whitespace)
        .filter(|v| !v.is_empty())
}

/// "land   cruiser" -> "Land Cruiser"
pub fn to_title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(|c| c.to_lowercase()))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339_into_utc() {
        let dt = parse_datetime("2025-03-01T10:00:00-05:00").unwrap();
        assert_eq!(dt.to_rfc3339(), "2025-03-01T15:00:00+00:00");
        assert!(parse_datetime("next tuesday").is_none());
    }

    #[test]
    fn collapses_whitespace_runs() {
        assert_eq!(collapse_whitespace("  Land \n\t Cruiser  "), "Land Cruiser");
        assert_eq!(clean_optional(Some("   ")), None);
        assert_eq!(clean_optional(Some(" SR5 ")), Some("SR5".to_string()));
    }

    #[test]
    fn title_cases_words() {
        assert_eq!(to_title_case("land   CRUISER"), "Land Cruiser");
        assert_eq!(to_title_case(""), "");
    }
}
