use std::cmp::Ordering;

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Case-insensitive substring check
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Case-insensitive ordering for sorting names
pub fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format an optional string, returning a default if None or blank
pub fn format_optional(value: &Option<String>, default: &str) -> String {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(default)
        .to_string()
}

/// Format a date for display
pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%b %d, %Y").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

/// Format a dollar amount with two decimal places
pub fn format_money(amount: Decimal) -> String {
    format!("${:.2}", amount.round_dp(2))
}

/// Loose email shape check: `local@domain.tld` with no spaces
pub fn looks_like_email(s: &str) -> bool {
    let s = s.trim();
    if s.contains(char::is_whitespace) {
        return false;
    }
    match s.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
        }
        None => false,
    }
}

/// Trim a form value, mapping blank input to None
pub fn non_blank(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Hello", 10), "Hello");
        assert_eq!(truncate("Hello World", 8), "Hello...");
        assert_eq!(truncate("Hi", 2), "Hi");
        assert_eq!(truncate("Temperance", 3), "Tem");
    }

    #[test]
    fn test_contains_ignore_case() {
        assert!(contains_ignore_case("Luna Grey", "GREY"));
        assert!(!contains_ignore_case("Luna Grey", "ash"));
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(dec!(35)), "$35.00");
        assert_eq!(format_money(dec!(547.5)), "$547.50");
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank("  "), None);
        assert_eq!(non_blank(" moon "), Some("moon".to_string()));
    }

    #[test]
    fn test_looks_like_email() {
        assert!(looks_like_email("seeker@example.com"));
        assert!(looks_like_email("a.b@mail.example.co.uk"));
        assert!(!looks_like_email("seeker@example"));
        assert!(!looks_like_email("@example.com"));
        assert!(!looks_like_email("seeker@.com"));
        assert!(!looks_like_email("seeker @example.com"));
        assert!(!looks_like_email("seeker@example."));
    }

    #[test]
    fn test_format_optional() {
        assert_eq!(format_optional(&None, "None"), "None");
        assert_eq!(format_optional(&Some(" ".to_string()), "None"), "None");
        assert_eq!(format_optional(&Some("Notes".to_string()), "None"), "Notes");
    }
}
