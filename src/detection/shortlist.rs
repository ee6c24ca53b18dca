//! Shortlist-intent detector.
//!
//! Recognises when a participant names their final candidates (letters from
//! a fixed range, `A`–`G` by default) as opposed to asking which candidate is
//! better. Used by shortlist tasks to raise a pending selection that the
//! participant must still confirm.
//!
//! Intent comes in two strengths:
//! - **Strong**: explicit shortlist markers (`最终入围：`, `final shortlist`).
//!   These count even when the text reads as a question.
//! - **Weak**: decision phrases and selection verbs (`我决定选`, `请安排`,
//!   `选`, `推荐`, `we'll go with`, `pick`). Ignored in interrogative text.
//!
//! Letters are returned only with intent and at least `min_picks` distinct
//! letters, so `"我该选择A还是B？"` and `"Should I pick A or B?"` stay empty.

use std::sync::LazyLock;

use regex::Regex;

use super::errors::DetectionError;

static MARKER_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"最终(入围|候选)\s*[:：]", r"(?i)\bfinal\s+shortlist\b"]
        .iter()
        .map(|p| Regex::new(p).expect("valid shortlist marker regex"))
        .collect()
});

static INTENT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"我.{0,6}(选择|决定|确认|推荐|入围|入选)",
        r"请.{0,6}(入围|安排|确认|选择)",
        r"(?i)\bfinal\s+(picks?|choices?)\b",
        r"(?i)\b(i|we)('ll|'ve| will| have)?\s+(choose|chose|pick|picked|select|selected|decided?|go with|shortlist)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid shortlist intent regex"))
    .collect()
});

const DEFAULT_STRONG: &[&str] = &["最终入围：", "最终入围:", "最终候选：", "final shortlist"];

const DEFAULT_WEAK: &[&str] = &[
    "决定",
    "安排进入",
    "进入最终面试",
    "进入面试",
    "请入围",
    "请安排",
    "入围",
    "入选",
    "选",
    "确认",
    "确定",
    "推荐",
    "shortlist",
    "choose",
    "pick",
    "select",
];

const DEFAULT_QUESTIONS: &[&str] = &[
    "你觉得",
    "哪个更好",
    "哪个更适合",
    "建议哪个",
    "推荐哪个",
    "哪个好",
    "还是",
    "which",
    "what do you think",
    "should we",
    "should i",
];

// ─── Rules ───────────────────────────────────────────────────────────────────

/// Phrase lists the detector scans for. Matching is on lowercased text.
///
/// `strong_intent` holds explicit markers that bypass the question filter;
/// `weak_intent` phrases only count in statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortlistRules {
    pub strong_intent: Vec<String>,
    pub weak_intent: Vec<String>,
    pub question_markers: Vec<String>,
}

impl Default for ShortlistRules {
    fn default() -> Self {
        let owned = |list: &[&str]| list.iter().map(|s| s.to_string()).collect();
        Self {
            strong_intent: owned(DEFAULT_STRONG),
            weak_intent: owned(DEFAULT_WEAK),
            question_markers: owned(DEFAULT_QUESTIONS),
        }
    }
}

// ─── Detector ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ShortlistDetector {
    first: char,
    last: char,
    min_picks: usize,
    rules: ShortlistRules,
    token_letter: Regex,
    any_letter: Regex,
}

impl ShortlistDetector {
    /// Build a detector for candidates `first..=last` (uppercase ASCII).
    pub fn new(
        first: char,
        last: char,
        min_picks: usize,
        rules: ShortlistRules,
    ) -> Result<Self, DetectionError> {
        if !first.is_ascii_uppercase() || !last.is_ascii_uppercase() || first > last {
            return Err(DetectionError::InvalidLetterRange { first, last });
        }
        Ok(Self {
            first,
            last,
            min_picks: min_picks.max(2),
            rules,
            token_letter: Regex::new(&format!(r"\b([{first}-{last}])\b"))?,
            any_letter: Regex::new(&format!("([{first}-{last}])"))?,
        })
    }

    /// `A`–`G`, two picks, default phrase lists.
    pub fn standard() -> Self {
        Self {
            first: 'A',
            last: 'G',
            min_picks: 2,
            rules: ShortlistRules::default(),
            token_letter: Regex::new(r"\b([A-G])\b").expect("valid letter regex"),
            any_letter: Regex::new("([A-G])").expect("valid letter regex"),
        }
    }

    pub fn letter_range(&self) -> (char, char) {
        (self.first, self.last)
    }

    pub fn min_picks(&self) -> usize {
        self.min_picks
    }

    /// The letters the participant committed to, or empty.
    pub fn detect(&self, text: &str) -> Vec<char> {
        let lower = text.to_lowercase();
        let marked = self.has_explicit_marker(&lower);
        let intent = marked || self.has_decision_phrase(&lower);

        if !intent {
            return Vec::new();
        }
        if !marked && self.is_question(&lower) {
            tracing::debug!("shortlist: intent phrase in a question, ignored");
            return Vec::new();
        }

        let letters = self.extract_letters(text);
        if letters.len() < self.min_picks {
            return Vec::new();
        }
        letters
    }

    /// Candidate letters in order of appearance, deduplicated.
    ///
    /// Standalone uppercase letters are preferred, so the English article
    /// `a` is not read as `A`. Failing that, standalone letters of either
    /// case (`final shortlist: b and e`), then any in-range letter for
    /// Chinese text such as `选A和C`.
    pub fn extract_letters(&self, text: &str) -> Vec<char> {
        let mut letters = collect_letters(&self.token_letter, text);
        if letters.is_empty() {
            let upper = text.to_uppercase();
            letters = collect_letters(&self.token_letter, &upper);
            if letters.is_empty() {
                letters = collect_letters(&self.any_letter, &upper);
            }
        }
        letters
    }

    fn has_explicit_marker(&self, lower: &str) -> bool {
        contains_any(lower, &self.rules.strong_intent)
            || MARKER_PATTERNS.iter().any(|re| re.is_match(lower))
    }

    fn has_decision_phrase(&self, lower: &str) -> bool {
        contains_any(lower, &self.rules.weak_intent)
            || INTENT_PATTERNS.iter().any(|re| re.is_match(lower))
    }

    fn is_question(&self, lower: &str) -> bool {
        let trimmed = lower.trim_end();
        trimmed.ends_with(['?', '？', '吗', '呢'])
            || contains_any(lower, &self.rules.question_markers)
    }
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles.iter().any(|n| haystack.contains(n.as_str()))
}

fn collect_letters(pattern: &Regex, text: &str) -> Vec<char> {
    let mut letters = Vec::new();
    for caps in pattern.captures_iter(text) {
        if let Some(c) = caps.get(1).and_then(|m| m.as_str().chars().next()) {
            if !letters.contains(&c) {
                letters.push(c);
            }
        }
    }
    letters
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_final_shortlist_marker() {
        let d = ShortlistDetector::standard();
        assert_eq!(d.detect("最终入围：A、B"), vec!['A', 'B']);
    }

    #[test]
    fn test_comparison_question_is_empty() {
        let d = ShortlistDetector::standard();
        assert!(d.detect("A还是B哪个更好？").is_empty());
    }

    #[test]
    fn test_question_with_weak_verb_is_empty() {
        let d = ShortlistDetector::standard();
        assert!(d.detect("你觉得A和B哪个更好？我们选哪个？").is_empty());
    }

    #[test]
    fn test_advice_requests_are_empty() {
        let d = ShortlistDetector::standard();
        assert!(d.detect("我该选择A还是B？").is_empty());
        assert!(d.detect("请帮我选择：A还是B更合适？").is_empty());
        assert!(d.detect("Should I pick A or B?").is_empty());
    }

    #[test]
    fn test_explicit_marker_survives_question_form() {
        let d = ShortlistDetector::standard();
        assert_eq!(d.detect("最终入围：A、B，可以吗？"), vec!['A', 'B']);
        assert_eq!(d.detect("Final shortlist: C and D, ok?"), vec!['C', 'D']);
    }

    #[test]
    fn test_english_article_is_not_a_candidate() {
        let d = ShortlistDetector::standard();
        assert_eq!(d.detect("I pick a strong pair: C and E"), vec!['C', 'E']);
        assert_eq!(d.extract_letters("a shortlist of b and d"), vec!['A', 'B', 'D']);
    }

    #[test]
    fn test_decision_without_spaces_uses_fallback_letters() {
        let d = ShortlistDetector::standard();
        assert_eq!(d.detect("我决定选A和C"), vec!['A', 'C']);
    }

    #[test]
    fn test_single_letter_is_not_enough() {
        let d = ShortlistDetector::standard();
        assert!(d.detect("最终入围：A").is_empty());
    }

    #[test]
    fn test_out_of_range_letters_ignored() {
        let d = ShortlistDetector::standard();
        assert!(d.detect("最终入围：H、K").is_empty());
        assert_eq!(d.detect("最终入围：H、B、D"), vec!['B', 'D']);
    }

    #[test]
    fn test_letters_deduplicated_in_order() {
        let d = ShortlistDetector::standard();
        assert_eq!(d.detect("请安排 E 和 C 进入最终面试，E 优先"), vec!['E', 'C']);
    }

    #[test]
    fn test_english_intent_lowercase_letters() {
        let d = ShortlistDetector::standard();
        assert_eq!(d.detect("Final shortlist: b and e"), vec!['B', 'E']);
        assert_eq!(d.detect("We'll go with A and F."), vec!['A', 'F']);
        assert!(d.detect("Which is better, A or B?").is_empty());
    }

    #[test]
    fn test_weak_intent_statement_counts() {
        let d = ShortlistDetector::standard();
        assert_eq!(d.detect("那就选 B 和 D 吧"), vec!['B', 'D']);
    }

    #[test]
    fn test_no_intent_is_empty() {
        let d = ShortlistDetector::standard();
        assert!(d.detect("A 的经验更丰富，B 的沟通更好").is_empty());
    }

    #[test]
    fn test_custom_range() {
        let d = ShortlistDetector::new('A', 'C', 2, ShortlistRules::default()).unwrap();
        assert!(d.detect("最终入围：D、E").is_empty());
        assert_eq!(d.detect("最终入围：C、A"), vec!['C', 'A']);
        assert!(ShortlistDetector::new('G', 'A', 2, ShortlistRules::default()).is_err());
        assert!(ShortlistDetector::new('a', 'g', 2, ShortlistRules::default()).is_err());
    }
}
