//! Per-field value normalizers applied to extractor output before it is
//! stored or compared field-by-field.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

// A Korean unit may be followed by spaces; other separators are one char.
static YMD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{4})(?:[.\-/\s]|[년월]\s*)(\d{1,2})(?:[.\-/\s]|[년월]\s*)(\d{1,2})")
        .expect("valid year-month-day regex")
});
static YM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{4})(?:[.\-/\s]|[년월]\s*)(\d{1,2})").expect("valid year-month regex")
});
static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}").expect("valid year regex"));

const ENGLISH_DATE_FORMATS: &[&str] = &[
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%d %B, %Y",
    "%b. %d, %Y",
];

/// Normalize a date to `YYYY-MM-DD`.
///
/// Numeric forms (`2025.05.06`, `2025/5/6`, `2025년 5월 6일`) take the first
/// match in the text; a bare year-month becomes the first of that month.
/// English month forms are parsed whole. A match that is not a real
/// calendar date (`2025-2026`, `2025.13.45`) falls through to the next rule.
/// Anything else comes back trimmed but otherwise unchanged.
pub fn normalize_date(s: &str) -> String {
    let s = s.trim();
    if s.is_empty() {
        return String::new();
    }

    // An impossible day does not degrade to the first of the month.
    let numeric = match YMD_RE.captures(s) {
        Some(caps) => calendar_date(&caps[1], &caps[2], Some(&caps[3])),
        None => YM_RE
            .captures(s)
            .and_then(|caps| calendar_date(&caps[1], &caps[2], None)),
    };
    numeric
        .or_else(|| {
            ENGLISH_DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        })
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| s.to_string())
}

fn calendar_date(year: &str, month: &str, day: Option<&str>) -> Option<NaiveDate> {
    let year = year.parse().ok()?;
    let month = month.parse().ok()?;
    let day = match day {
        Some(d) => d.parse().ok()?,
        None => 1,
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Keep only the first four-digit run, e.g. `"1968년"` → `"1968"`.
pub fn normalize_year(s: &str) -> String {
    YEAR_RE
        .find(s)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Strip wrapping brackets and keep only http(s) URLs; anything else is
/// dropped to empty.
pub fn normalize_url(s: &str) -> String {
    let s = s
        .trim()
        .trim_matches(|c: char| matches!(c, '[' | ']' | '(' | ')'))
        .trim();
    if s.starts_with("http://") || s.starts_with("https://") {
        s.to_string()
    } else {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotted_date() {
        assert_eq!(normalize_date("2025.05.06"), "2025-05-06");
    }

    #[test]
    fn slashed_unpadded_date() {
        assert_eq!(normalize_date("2025/5/6"), "2025-05-06");
    }

    #[test]
    fn korean_date() {
        assert_eq!(normalize_date("2027년 05월 03일(월)"), "2027-05-03");
    }

    #[test]
    fn range_takes_first_date() {
        assert_eq!(normalize_date("2025.05.06 - 2025.05.08"), "2025-05-06");
    }

    #[test]
    fn year_month_only() {
        assert_eq!(normalize_date("2025.5"), "2025-05-01");
    }

    #[test]
    fn year_ranges_are_not_dates() {
        assert_eq!(normalize_date("2025-2026"), "2025-2026");
        assert_eq!(normalize_date("2025 - 2026 season"), "2025 - 2026 season");
    }

    #[test]
    fn impossible_dates_are_kept() {
        assert_eq!(normalize_date("2025.13.45"), "2025.13.45");
        assert_eq!(normalize_date("2025.02.30"), "2025.02.30");
    }

    #[test]
    fn english_dates() {
        assert_eq!(normalize_date("May 6, 2025"), "2025-05-06");
        assert_eq!(normalize_date("6 May 2025"), "2025-05-06");
    }

    #[test]
    fn unknown_date_is_kept() {
        assert_eq!(normalize_date("  TBD "), "TBD");
        assert_eq!(normalize_date(""), "");
    }

    #[test]
    fn year_extraction() {
        assert_eq!(normalize_year("1968년"), "1968");
        assert_eq!(normalize_year("since 1990, biennial"), "1990");
        assert_eq!(normalize_year("unknown"), "");
    }

    #[test]
    fn url_cleanup() {
        assert_eq!(normalize_url("[www.wasteexpo.com]"), "");
        assert_eq!(
            normalize_url(" (https://www.wasteexpo.com) "),
            "https://www.wasteexpo.com"
        );
        assert_eq!(normalize_url("http://a.example"), "http://a.example");
        assert_eq!(normalize_url("ftp://a.example"), "");
    }
}
