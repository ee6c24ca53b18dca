//! Unordered-mention parser.
//!
//! Finds item aliases anywhere in free text, without ordinals. A match only
//! counts when it stands alone: the characters immediately before and after
//! it must be separators or the text boundary, so an alias embedded in an
//! unrelated word (`水` inside `水平`) is skipped.

use std::collections::HashSet;

use super::alias_table::AliasTable;

/// Characters that may border a standalone alias.
pub const SEPARATORS: &[char] = &[
    ' ', '，', ',', '、', '\n', '\r', '\t', '。', '.', '；', ';', ':', '：', '(', ')', '（', '）',
    '[', ']', '【', '】', '<', '>', '-', '—', '*', '_', '!', '！', '?', '？', '"', '“', '”',
];

pub fn is_separator(c: char) -> bool {
    SEPARATORS.contains(&c)
}

/// One standalone alias occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mention {
    /// Byte offsets of the alias in the scanned text.
    pub start: usize,
    pub end: usize,
    pub alias: String,
    pub item: String,
}

/// Scan `text` left to right and return the first standalone mention of each
/// distinct item, stopping once `limit` distinct items are found.
///
/// At each position the longest alias is preferred. A match with a bad
/// boundary is discarded and scanning resumes one character later, so a
/// shorter alias starting inside it still gets a chance.
pub fn scan_mentions(text: &str, table: &AliasTable, limit: usize) -> Vec<Mention> {
    let mut found: Vec<Mention> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    let pattern = table.alternation();
    let mut pos = 0;

    while pos < text.len() && found.len() < limit {
        let Some(m) = pattern.find_at(text, pos) else {
            break;
        };

        let before_ok = text[..m.start()].chars().next_back().map_or(true, is_separator);
        let after_ok = text[m.end()..].chars().next().map_or(true, is_separator);

        if before_ok && after_ok {
            if let Some(item) = table.resolve_alias(m.as_str()) {
                if seen.insert(item) {
                    found.push(Mention {
                        start: m.start(),
                        end: m.end(),
                        alias: m.as_str().to_string(),
                        item: item.to_string(),
                    });
                }
            }
            pos = m.end();
        } else {
            let step = text[m.start()..].chars().next().map_or(1, char::len_utf8);
            pos = m.start() + step;
        }
    }

    found
}

/// Distinct items in order of first standalone mention.
pub fn mentioned_items(text: &str, table: &AliasTable) -> Vec<String> {
    scan_mentions(text, table, table.len())
        .into_iter()
        .map(|m| m.item)
        .collect()
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::alias_table::Item;
    use crate::tasks::presets::island_survival_items;

    fn table() -> AliasTable {
        AliasTable::new(island_survival_items()).unwrap()
    }

    #[test]
    fn test_separated_mentions_in_order() {
        let items = mentioned_items("淡水、信号镜、打火机", &table());
        assert_eq!(items, vec!["淡水", "信号镜", "打火机"]);
    }

    #[test]
    fn test_alias_maps_to_canonical_and_dedupes() {
        let items = mentioned_items("水，淡水，镜子，信号镜", &table());
        assert_eq!(items, vec!["淡水", "信号镜"]);
    }

    #[test]
    fn test_embedded_alias_does_not_count() {
        // `水` sits inside `水平` and `网` inside `网络`.
        assert!(mentioned_items("我们的水平 网络", &table()).is_empty());
    }

    #[test]
    fn test_longest_alias_preferred() {
        let mentions = scan_mentions("尼龙绳", &table(), 10);
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].alias, "尼龙绳");
    }

    #[test]
    fn test_longer_alias_of_other_item_wins() {
        // `水杯` embeds `水`, which belongs to a different item.
        let table = AliasTable::new(vec![
            Item::new("drop", &["水"]),
            Item::new("cup", &["水杯"]),
        ])
        .unwrap();
        assert_eq!(mentioned_items("一个 水杯 吧", &table), vec!["cup"]);
        assert_eq!(mentioned_items("一个 水 吧", &table), vec!["drop"]);
    }

    #[test]
    fn test_bad_boundary_retries_inner_alias() {
        // `匕首刀` fails at `匕首` (followed by `刀`), and `刀` alone then
        // has `首` before it, so nothing is found.
        assert!(mentioned_items("匕首刀", &table()).is_empty());
        // With a separator the inner alias stands alone.
        assert_eq!(mentioned_items("匕首 刀", &table()), vec!["匕首"]);
    }

    #[test]
    fn test_limit_stops_scan() {
        let mentions = scan_mentions("水 镜子 绳子 刀", &table(), 2);
        assert_eq!(mentions.len(), 2);
    }

    #[test]
    fn test_all_ten_unordered() {
        let text = "渔网 急救包 匕首 塑料布 尼龙绳 鲨鱼驱赶剂 信号镜 淡水 压缩饼干 打火机";
        assert_eq!(mentioned_items(text, &table()).len(), 10);
    }
}
