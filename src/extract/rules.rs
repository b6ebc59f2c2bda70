use once_cell::sync::Lazy;
use regex::Regex;

/// One extraction attempt for a field: a named pure function over the
/// normalized text. Rules for a field are tried in order and the first
/// match wins, so earlier rules carry higher precedence.
pub struct FieldRule<T: 'static> {
    pub name: &'static str,
    matcher: fn(&str) -> Option<T>,
}

impl<T> FieldRule<T> {
    pub const fn new(name: &'static str, matcher: fn(&str) -> Option<T>) -> Self {
        Self { name, matcher }
    }

    pub fn apply(&self, text: &str) -> Option<T> {
        (self.matcher)(text)
    }
}

pub fn first_match<T>(rules: &[FieldRule<T>], text: &str) -> Option<T> {
    rules.iter().find_map(|rule| rule.apply(text))
}

pub static ACCOUNT_RULES: &[FieldRule<String>] = &[
    FieldRule::new("at-marker", at_marker_account),
    FieldRule::new("digit-adjacent", digit_adjacent_account),
];

pub static PROOF_ID_RULES: &[FieldRule<String>] = &[
    FieldRule::new("id-label", labeled_proof_id),
    FieldRule::new("hash-prefix", hash_proof_id),
];

pub static VOTE_COUNT_RULES: &[FieldRule<u64>] = &[
    FieldRule::new("labeled", labeled_count),
    FieldRule::new("unit-suffix", unit_suffix_count),
    FieldRule::new("account-adjacent", account_adjacent_count),
];

pub static DATE_RULES: &[FieldRule<String>] = &[
    FieldRule::new("kanji", kanji_date),
    FieldRule::new("dot-slash", dot_slash_date),
];

static AT_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9._-]*@[A-Za-z0-9][A-Za-z0-9._-]*").unwrap());

static ADJACENT_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Za-z][A-Za-z]+)\s*[0-9]").unwrap());

static LABELED_PROOF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:ID|No)\.?\s*:?\s*([0-9]{6,})").unwrap());

static HASH_PROOF: Lazy<Regex> = Lazy::new(|| Regex::new(r"#\s*([0-9]{6,})").unwrap());

static LABELED_COUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:投票回数|投票数|vote count|total usage|votes|count)\s*:\s*([0-9][0-9,]*)")
        .unwrap()
});

static UNIT_COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9][0-9,]*)\s*(?:票|回|votes?\b)").unwrap());

static ADJACENT_COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Za-z][A-Za-z]+)\s*([0-9][0-9,]*)").unwrap());

static KANJI_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]{4})年([0-9]{1,2})月([0-9]{1,2})日").unwrap());

static DOT_SLASH_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([0-9]{4})[./]([0-9]{1,2})[./]([0-9]{1,2})\b").unwrap());

/// A token containing "@" is taken verbatim as the account. Label prefixes
/// like "acct:" fall outside the token character class and are not captured.
fn at_marker_account(text: &str) -> Option<String> {
    AT_TOKEN.find(text).map(|m| m.as_str().to_string())
}

/// Letter token (len >= 2) immediately followed by a digit run: the
/// `<account><count>` layout where OCR dropped the icon separator. Tokens
/// are letters-only so the digit run stays whole, and the proof-id marker
/// words are skipped so "No 123456" never claims an account.
fn digit_adjacent_account(text: &str) -> Option<String> {
    for caps in ADJACENT_TOKEN.captures_iter(text) {
        let token = caps.get(1).expect("group 1").as_str();
        if is_marker_token(token) {
            continue;
        }
        return Some(token.to_string());
    }
    None
}

fn labeled_proof_id(text: &str) -> Option<String> {
    LABELED_PROOF
        .captures(text)
        .map(|caps| caps[1].to_string())
}

fn hash_proof_id(text: &str) -> Option<String> {
    HASH_PROOF.captures(text).map(|caps| caps[1].to_string())
}

fn labeled_count(text: &str) -> Option<u64> {
    LABELED_COUNT
        .captures(text)
        .and_then(|caps| parse_count(&caps[1]))
}

fn unit_suffix_count(text: &str) -> Option<u64> {
    UNIT_COUNT
        .captures(text)
        .and_then(|caps| parse_count(&caps[1]))
}

/// Lowest precedence: a bare digit run right after an account-shaped token.
/// Runs of proof-id length (6+ digits) and runs that begin a date are left
/// alone.
fn account_adjacent_count(text: &str) -> Option<u64> {
    for caps in ADJACENT_COUNT.captures_iter(text) {
        let token = caps.get(1).expect("group 1").as_str();
        if is_marker_token(token) {
            continue;
        }
        let digits = caps.get(2).expect("group 2");
        if digits.as_str().replace(',', "").len() > 5 {
            continue;
        }
        if starts_date_tail(text, digits.end()) {
            continue;
        }
        return parse_count(digits.as_str());
    }
    None
}

fn kanji_date(text: &str) -> Option<String> {
    KANJI_DATE
        .captures(text)
        .map(|caps| format!("{}.{}.{}", &caps[1], &caps[2], &caps[3]))
}

fn dot_slash_date(text: &str) -> Option<String> {
    DOT_SLASH_DATE
        .captures(text)
        .map(|caps| format!("{}.{}.{}", &caps[1], &caps[2], &caps[3]))
}

fn is_marker_token(token: &str) -> bool {
    token.eq_ignore_ascii_case("id") || token.eq_ignore_ascii_case("no")
}

fn starts_date_tail(text: &str, end: usize) -> bool {
    matches!(
        text[end..].chars().next(),
        Some('.') | Some('/') | Some('年') | Some('月') | Some('日')
    )
}

/// Grouping commas are stripped before the integer parse. A run that
/// overflows u64 counts as a miss, not an error.
fn parse_count(raw: &str) -> Option<u64> {
    raw.replace(',', "").parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn account_at_marker_skips_label_prefix() {
        let account = first_match(ACCOUNT_RULES, "acct:alice@x #000123 5票");
        assert_eq!(account.as_deref(), Some("alice@x"));
    }

    #[test]
    fn account_at_marker_wins_over_adjacency() {
        // Both rules could fire; the @ token has precedence.
        let account = first_match(ACCOUNT_RULES, "carol 3票 alice@x");
        assert_eq!(account.as_deref(), Some("alice@x"));
    }

    #[test]
    fn account_adjacency_needs_trailing_digits() {
        assert_eq!(first_match(ACCOUNT_RULES, "bob 200").as_deref(), Some("bob"));
        assert_eq!(first_match(ACCOUNT_RULES, "carol 3票").as_deref(), Some("carol"));
        assert_eq!(first_match(ACCOUNT_RULES, "just words here"), None);
    }

    #[test]
    fn account_adjacency_ignores_marker_words() {
        assert_eq!(first_match(ACCOUNT_RULES, "No 123456"), None);
    }

    #[test]
    fn proof_id_strips_markers() {
        assert_eq!(
            first_match(PROOF_ID_RULES, "ID: 987654").as_deref(),
            Some("987654")
        );
        assert_eq!(
            first_match(PROOF_ID_RULES, "No.123456").as_deref(),
            Some("123456")
        );
        assert_eq!(
            first_match(PROOF_ID_RULES, "#000123").as_deref(),
            Some("000123")
        );
    }

    #[test]
    fn proof_id_requires_six_digits() {
        assert_eq!(first_match(PROOF_ID_RULES, "#12345"), None);
        assert_eq!(first_match(PROOF_ID_RULES, "ID: 12345"), None);
    }

    #[test]
    fn vote_count_labeled_form_strips_commas() {
        assert_eq!(first_match(VOTE_COUNT_RULES, "投票回数: 1,234"), Some(1234));
        assert_eq!(first_match(VOTE_COUNT_RULES, "total usage: 42"), Some(42));
    }

    #[test]
    fn vote_count_labeled_wins_over_unit_suffix() {
        let count = first_match(VOTE_COUNT_RULES, "5票 投票回数: 9");
        assert_eq!(count, Some(9));
    }

    #[test]
    fn vote_count_unit_suffix() {
        assert_eq!(first_match(VOTE_COUNT_RULES, "alice@x 5票"), Some(5));
        assert_eq!(first_match(VOTE_COUNT_RULES, "200 votes"), Some(200));
    }

    #[test]
    fn vote_count_account_adjacent_fallback() {
        assert_eq!(first_match(VOTE_COUNT_RULES, "bob 200"), Some(200));
    }

    #[test]
    fn vote_count_adjacent_leaves_proof_length_runs() {
        assert_eq!(first_match(VOTE_COUNT_RULES, "bob 1234567"), None);
    }

    #[test]
    fn vote_count_adjacent_leaves_dates() {
        assert_eq!(first_match(VOTE_COUNT_RULES, "bob 2025.8.6"), None);
    }

    #[test]
    fn date_forms_normalize_to_dotted() {
        assert_eq!(
            first_match(DATE_RULES, "2025年8月6日").as_deref(),
            Some("2025.8.6")
        );
        assert_eq!(
            first_match(DATE_RULES, "2025.8.6").as_deref(),
            Some("2025.8.6")
        );
        assert_eq!(
            first_match(DATE_RULES, "2025/8/6").as_deref(),
            Some("2025.8.6")
        );
    }

    #[test]
    fn date_is_not_range_validated() {
        assert_eq!(
            first_match(DATE_RULES, "2025.13.40").as_deref(),
            Some("2025.13.40")
        );
    }

    #[test]
    fn first_occurrence_wins_within_a_rule() {
        assert_eq!(
            first_match(DATE_RULES, "2025/1/2 and 2024/3/4").as_deref(),
            Some("2025.1.2")
        );
    }

    #[test]
    fn misses_are_none_not_defaults() {
        assert_eq!(first_match(ACCOUNT_RULES, ""), None);
        assert_eq!(first_match(PROOF_ID_RULES, ""), None);
        assert_eq!(first_match(VOTE_COUNT_RULES, ""), None);
        assert_eq!(first_match(DATE_RULES, ""), None);
    }
}
