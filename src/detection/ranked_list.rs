//! Ranked-list parser.
//!
//! Extracts `(ordinal, item)` pairs from free text using two shapes:
//!
//! - **Line entries**: a line that starts with an ordinal marker, an optional
//!   delimiter, then the rest of the line as the item phrase
//!   (`1. 淡水`, `② 信号镜`, `10 渔网`).
//! - **Inline entries**: an ordinal marker at start-of-text or after
//!   whitespace, a mandatory delimiter, then a phrase running up to the next
//!   comma, enumeration comma or newline (`… 3、尼龙绳，…`).
//!
//! Both shapes are scanned over the whole text and their pairs combined; the
//! same entry seen by both shapes is harmless because ordinals and items are
//! collected as sets. Markers are `1`–`10` or the circled numerals `①`–`⑩`.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use super::alias_table::AliasTable;

/// Highest ordinal a marker can express.
pub const MAX_ORDINAL: u8 = 10;

static LINE_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*((?:10|[1-9])|[①-⑩])[.．。、:：）)]?\s*([^\n]+)$")
        .expect("valid line-entry regex")
});

static INLINE_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s)((?:10|[1-9])|[①-⑩])[.．。、:：）)]\s*([^，,、\n]+)")
        .expect("valid inline-entry regex")
});

// ─── Types ───────────────────────────────────────────────────────────────────

/// One ordinal paired with the item its phrase resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedEntry {
    pub ordinal: u8,
    pub item: String,
}

/// Everything the parser pulled out of one message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankedSubmission {
    /// Distinct ordinals that carried a resolvable item.
    pub ordinals: BTreeSet<u8>,
    /// Distinct canonical items that were attached to an ordinal.
    pub items: BTreeSet<String>,
    /// Resolved pairs in discovery order (line entries first).
    pub entries: Vec<RankedEntry>,
    /// Raw `(marker, phrase)` pairs seen, resolvable or not.
    pub pair_count: usize,
}

impl RankedSubmission {
    /// Ordinals are exactly `{1..=n}` and `n` distinct items were named.
    pub fn is_complete(&self, n: usize) -> bool {
        if n == 0 || n > MAX_ORDINAL as usize {
            return false;
        }
        self.items.len() == n
            && self.ordinals.len() == n
            && self.ordinals.iter().copied().eq(1..=n as u8)
    }

    /// The submitted order, taking the first item seen for each ordinal.
    ///
    /// `None` unless ordinals `1..=n` each map to a distinct item.
    pub fn ranking(&self, n: usize) -> Option<Vec<String>> {
        let mut ranking = Vec::with_capacity(n);
        for ordinal in 1..=n as u8 {
            let entry = self.entries.iter().find(|e| e.ordinal == ordinal)?;
            if ranking.contains(&entry.item) {
                return None;
            }
            ranking.push(entry.item.clone());
        }
        Some(ranking)
    }
}

// ─── Parsing ─────────────────────────────────────────────────────────────────

/// Numeric value of an ordinal marker: `"1"`–`"10"` or `①`–`⑩`.
pub fn ordinal_value(marker: &str) -> Option<u8> {
    if let Ok(n) = marker.parse::<u8>() {
        return (1..=MAX_ORDINAL).contains(&n).then_some(n);
    }
    let mut chars = marker.chars();
    let c = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    match c {
        '①'..='⑩' => Some((c as u32 - '①' as u32) as u8 + 1),
        _ => None,
    }
}

/// Parse every ordinal/item pair in `text` against `table`.
///
/// Never fails: text with no markers, or markers whose phrases name no known
/// item, yields an empty submission.
pub fn parse_ranked_items(text: &str, table: &AliasTable) -> RankedSubmission {
    let mut submission = RankedSubmission::default();

    let pairs = LINE_ENTRY
        .captures_iter(text)
        .chain(INLINE_ENTRY.captures_iter(text));

    for caps in pairs {
        submission.pair_count += 1;
        let (Some(marker), Some(phrase)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let Some(ordinal) = ordinal_value(marker.as_str()) else {
            continue;
        };
        let Some(item) = table.normalize_phrase(phrase.as_str()) else {
            continue;
        };
        submission.ordinals.insert(ordinal);
        submission.items.insert(item.to_string());
        submission.entries.push(RankedEntry {
            ordinal,
            item: item.to_string(),
        });
    }

    submission
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::presets::island_survival_items;

    fn table() -> AliasTable {
        AliasTable::new(island_survival_items()).unwrap()
    }

    const FULL_LIST: &str = "1. 淡水\n2. 信号镜\n3. 压缩饼干\n4. 塑料布\n5. 打火机\n\
                             6. 尼龙绳\n7. 急救包\n8. 渔网\n9. 匕首\n10. 鲨鱼驱赶剂";

    #[test]
    fn test_ordinal_value() {
        assert_eq!(ordinal_value("1"), Some(1));
        assert_eq!(ordinal_value("10"), Some(10));
        assert_eq!(ordinal_value("①"), Some(1));
        assert_eq!(ordinal_value("⑩"), Some(10));
        assert_eq!(ordinal_value("0"), None);
        assert_eq!(ordinal_value("11"), None);
        assert_eq!(ordinal_value("x"), None);
    }

    #[test]
    fn test_full_numbered_list_is_complete() {
        let sub = parse_ranked_items(FULL_LIST, &table());
        assert!(sub.is_complete(10), "got {sub:?}");
        assert_eq!(sub.ranking(10).unwrap()[0], "淡水");
        assert_eq!(sub.ranking(10).unwrap()[9], "鲨鱼驱赶剂");
    }

    #[test]
    fn test_permuted_line_order_is_complete() {
        let text = "3. 压缩饼干\n1. 淡水\n10. 鲨鱼驱赶剂\n2. 信号镜\n7. 急救包\n\
                    5. 打火机\n9. 匕首\n4. 塑料布\n8. 渔网\n6. 尼龙绳";
        let sub = parse_ranked_items(text, &table());
        assert!(sub.is_complete(10), "got {sub:?}");
        let ranking = sub.ranking(10).unwrap();
        assert_eq!(ranking[0], "淡水");
        assert_eq!(ranking[2], "压缩饼干");
        assert_eq!(ranking[9], "鲨鱼驱赶剂");
    }

    #[test]
    fn test_circled_markers_and_aliases() {
        let text = "①水 ②镜子 ③饼干 ④塑胶布 ⑤打火机 ⑥绳子 ⑦医药包 ⑧捕鱼网 ⑨小刀 ⑩驱鲨剂";
        let lines = text.replace(' ', "\n");
        let sub = parse_ranked_items(&lines, &table());
        assert!(sub.is_complete(10), "got {sub:?}");
    }

    #[test]
    fn test_missing_ordinal_is_incomplete() {
        let text = FULL_LIST.replace("7. 急救包\n", "");
        let sub = parse_ranked_items(&text, &table());
        assert!(!sub.is_complete(10));
        assert!(!sub.ordinals.contains(&7));
    }

    #[test]
    fn test_duplicate_item_is_incomplete() {
        // Ordinal 10 repeats water: ten ordinals, nine distinct items.
        let text = FULL_LIST.replace("10. 鲨鱼驱赶剂", "10. 水");
        let sub = parse_ranked_items(&text, &table());
        assert_eq!(sub.ordinals.len(), 10);
        assert_eq!(sub.items.len(), 9);
        assert!(!sub.is_complete(10));
    }

    #[test]
    fn test_unresolvable_phrase_contributes_nothing() {
        let sub = parse_ranked_items("1. 雨伞\n2. 淡水", &table());
        assert!(sub.pair_count >= 2);
        assert_eq!(sub.ordinals, BTreeSet::from([2]));
        assert_eq!(sub.items.len(), 1);
    }

    #[test]
    fn test_inline_entries_after_whitespace() {
        let sub = parse_ranked_items("排序： 1.淡水， 2、信号镜， 3)饼干", &table());
        assert!(sub.ordinals.contains(&1));
        assert!(sub.ordinals.contains(&2));
        assert!(sub.ordinals.contains(&3));
        assert!(sub.items.contains("压缩饼干"));
    }

    #[test]
    fn test_no_markers_yields_empty() {
        let sub = parse_ranked_items("我觉得淡水最重要，其次是信号镜", &table());
        assert!(sub.entries.is_empty());
        assert!(!sub.is_complete(10));
    }

    #[test]
    fn test_is_complete_for_smaller_task() {
        let small = AliasTable::new(vec![
            crate::detection::Item::new("a", &["apple"]),
            crate::detection::Item::new("b", &["banana"]),
        ])
        .unwrap();
        let sub = parse_ranked_items("1. banana\n2. apple", &small);
        assert!(sub.is_complete(2));
        assert_eq!(sub.ranking(2).unwrap(), vec!["b".to_string(), "a".to_string()]);
        assert!(!sub.is_complete(3));
    }
}
