//! Rendered-text field extractors
//!
//! The stat dashboards render values near labels rather than serving an
//! API, so each extractor is a small "keyword -> nearby numeric token"
//! strategy over the page's body text.

use regex::Regex;
use std::sync::OnceLock;

fn number_re() -> &'static Regex {
    static NUMBER_RE: OnceLock<Regex> = OnceLock::new();
    NUMBER_RE.get_or_init(|| Regex::new(r"[\d.]+").expect("number pattern"))
}

/// Find `keyword`, then scan the following lines for the first numeric
/// token. `must_prefix` restricts candidate lines (e.g. dollar amounts).
pub fn first_number_after(text: &str, keyword: &str, must_prefix: Option<&str>) -> Option<f64> {
    let lines: Vec<&str> = text.lines().collect();
    for (i, line) in lines.iter().enumerate() {
        if !line.contains(keyword) {
            continue;
        }
        for candidate in &lines[i + 1..] {
            let trimmed = candidate.trim();
            if trimmed.is_empty() {
                continue;
            }
            if let Some(prefix) = must_prefix {
                if !trimmed.starts_with(prefix) {
                    continue;
                }
            }
            let cleaned = trimmed.replace(',', "");
            if let Some(m) = number_re().find(&cleaned) {
                return m.as_str().parse().ok();
            }
        }
    }
    None
}

/// Find a bare "<amount> <suffix>" line (e.g. "1,234.56 USDT") and scan
/// backwards for the dollar value printed above it.
pub fn dollar_amount_above(text: &str, suffix: &str) -> Option<f64> {
    let anchor = Regex::new(&format!(r"^[\d,]+\.\d{{2}}\s+{}$", regex::escape(suffix))).ok()?;
    let lines: Vec<&str> = text.lines().collect();
    for (i, line) in lines.iter().enumerate() {
        if !anchor.is_match(line.trim()) {
            continue;
        }
        for candidate in lines[..i].iter().rev() {
            let trimmed = candidate.trim();
            if !trimmed.starts_with('$') {
                continue;
            }
            let cleaned = trimmed.replace(',', "");
            if let Some(m) = number_re().find(&cleaned) {
                return m.as_str().parse().ok();
            }
        }
    }
    None
}

/// Find `keyword` (case-insensitive) and scan backwards up to `lookback`
/// lines for a bare integer line. Leaderboard pages print the value above
/// its label.
pub fn integer_before_keyword(text: &str, keyword: &str, lookback: usize) -> Option<u64> {
    let keyword_upper = keyword.to_uppercase();
    let lines: Vec<&str> = text.lines().collect();
    for (i, line) in lines.iter().enumerate() {
        if !line.to_uppercase().contains(&keyword_upper) {
            continue;
        }
        let start = i.saturating_sub(lookback);
        for candidate in lines[start..i].iter().rev() {
            let cleaned = candidate.trim().replace(',', "");
            if !cleaned.is_empty() && cleaned.chars().all(|c| c.is_ascii_digit()) {
                return cleaned.parse().ok();
            }
        }
    }
    None
}

/// Find the first percentage following `keyword`, e.g. "Current APY: 4.21%".
/// Case-insensitive and tolerant of markup between keyword and value.
pub fn percent_near(text: &str, keyword: &str) -> Option<f64> {
    let pattern = format!(r"(?is){}.*?([\d.]+)%", regex::escape(keyword));
    let re = Regex::new(&pattern).ok()?;
    re.captures(text)?.get(1)?.as_str().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const VAULT_PAGE: &str = "\
Stats
Total Value Locked
$1,234,567.89
Wrapped SOL
holdings
$456,789.12
Total Supply
987,654.32 JLP
APR
12.5%
Deposit
$321.00
1,111.22 USDT
";

    #[test]
    fn number_after_keyword_with_prefix() {
        let tvl = first_number_after(VAULT_PAGE, "Total Value Locked", Some("$"));
        assert_eq!(tvl, Some(1234567.89));
        // prefix filter skips the "holdings" line
        let sol = first_number_after(VAULT_PAGE, "Wrapped SOL", Some("$"));
        assert_eq!(sol, Some(456789.12));
    }

    #[test]
    fn number_after_keyword_without_prefix() {
        assert_eq!(
            first_number_after(VAULT_PAGE, "Total Supply", None),
            Some(987654.32)
        );
        assert_eq!(first_number_after(VAULT_PAGE, "APR", None), Some(12.5));
    }

    #[test]
    fn missing_keyword_yields_none() {
        assert_eq!(first_number_after(VAULT_PAGE, "No Such Label", None), None);
    }

    #[test]
    fn dollar_value_above_suffix_line() {
        assert_eq!(dollar_amount_above(VAULT_PAGE, "USDT"), Some(321.00));
        assert_eq!(dollar_amount_above(VAULT_PAGE, "USDC"), None);
    }

    #[test]
    fn integer_above_label_within_lookback() {
        let page = "\
Season 2
8,123,456
POINTS EARNED IN SEASON 2
42,000
Total Participants
";
        assert_eq!(
            integer_before_keyword(page, "points earned in season 2", 10),
            Some(8_123_456)
        );
        assert_eq!(
            integer_before_keyword(page, "TOTAL PARTICIPANTS", 10),
            Some(42_000)
        );
        assert_eq!(integer_before_keyword(page, "TOTAL PARTICIPANTS", 0), None);
    }

    #[test]
    fn percent_near_keyword() {
        let page = "rates <b>Current APY</b>: 4.21% as of today";
        assert_eq!(percent_near(page, "current apy"), Some(4.21));
        assert_eq!(percent_near(page, "8 week"), None);
    }
}
