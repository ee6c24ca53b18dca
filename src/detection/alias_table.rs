//! Item alias table.
//!
//! Maps every surface form a participant might write for an item to the
//! item's canonical id. The table is immutable once built and owned by the
//! detectors that read it.
//!
//! Three lookups are offered:
//! - `resolve_alias`: exact alias → canonical id
//! - `normalize_phrase`: free-text phrase → first item (in table order) with
//!   an alias contained in the phrase
//! - `find_word`: whole-word, case-insensitive match in table order (used by
//!   step-wise tasks written in space-delimited languages)

use std::collections::HashMap;

use regex::Regex;

use super::errors::DetectionError;

// ─── Types ───────────────────────────────────────────────────────────────────

/// One rankable item: a canonical id and the aliases that name it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: String,
    pub aliases: Vec<String>,
}

impl Item {
    pub fn new(id: impl Into<String>, aliases: &[&str]) -> Self {
        Self {
            id: id.into(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Immutable alias table for one task.
#[derive(Debug, Clone)]
pub struct AliasTable {
    items: Vec<Item>,
    alias_index: HashMap<String, usize>,
    /// Every alias in one alternation, longest first.
    alternation: Regex,
    /// One whole-word pattern per item, in table order.
    word_patterns: Vec<Regex>,
}

impl AliasTable {
    /// Build a table, rejecting empty items, blank aliases and aliases that
    /// would resolve to more than one item.
    pub fn new(items: Vec<Item>) -> Result<Self, DetectionError> {
        if items.is_empty() {
            return Err(DetectionError::Empty);
        }

        let mut alias_index: HashMap<String, usize> = HashMap::new();
        let mut seen_ids: Vec<&str> = Vec::with_capacity(items.len());

        for (idx, item) in items.iter().enumerate() {
            if seen_ids.contains(&item.id.as_str()) {
                return Err(DetectionError::DuplicateItem {
                    item: item.id.clone(),
                });
            }
            seen_ids.push(&item.id);

            if item.aliases.is_empty() {
                return Err(DetectionError::NoAliases {
                    item: item.id.clone(),
                });
            }
            for alias in &item.aliases {
                if alias.trim().is_empty() {
                    return Err(DetectionError::BlankAlias {
                        item: item.id.clone(),
                    });
                }
                match alias_index.get(alias) {
                    Some(&other) if other != idx => {
                        return Err(DetectionError::AmbiguousAlias {
                            alias: alias.clone(),
                            first: items[other].id.clone(),
                            second: item.id.clone(),
                        });
                    }
                    _ => {
                        alias_index.insert(alias.clone(), idx);
                    }
                }
            }
        }

        let alternation = build_alternation(&alias_index)?;
        let word_patterns = items
            .iter()
            .map(|item| {
                let alts: Vec<String> = item.aliases.iter().map(|a| regex::escape(a)).collect();
                Regex::new(&format!(r"(?i)\b(?:{})\b", alts.join("|")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            items,
            alias_index,
            alternation,
            word_patterns,
        })
    }

    /// Number of items (N).
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in table order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Aliases of the item `id`, as configured.
    pub fn aliases_for(&self, id: &str) -> Option<&[String]> {
        self.items
            .iter()
            .find(|i| i.id == id)
            .map(|i| i.aliases.as_slice())
    }

    /// Whether `id` is one of this table's canonical ids.
    pub fn contains_item(&self, id: &str) -> bool {
        self.items.iter().any(|i| i.id == id)
    }

    /// Canonical id for an exact alias.
    pub fn resolve_alias(&self, alias: &str) -> Option<&str> {
        self.alias_index
            .get(alias)
            .map(|&idx| self.items[idx].id.as_str())
    }

    /// Resolve a free-text phrase to a canonical item.
    ///
    /// The phrase is trimmed, then items are tried in table order; the first
    /// item with any alias occurring inside the phrase wins.
    pub fn normalize_phrase(&self, phrase: &str) -> Option<&str> {
        let phrase = phrase.trim();
        if phrase.is_empty() {
            return None;
        }
        self.items
            .iter()
            .find(|item| item.aliases.iter().any(|a| phrase.contains(a.as_str())))
            .map(|item| item.id.as_str())
    }

    /// First item (in table order) named as a whole word, case-insensitive.
    pub fn find_word(&self, text: &str) -> Option<&str> {
        self.word_patterns
            .iter()
            .position(|re| re.is_match(text))
            .map(|idx| self.items[idx].id.as_str())
    }

    /// Alternation of every alias, longest first.
    pub(crate) fn alternation(&self) -> &Regex {
        &self.alternation
    }
}

/// Join all aliases into one pattern, longest first so that at any start
/// position the longest alias is preferred. Ties break lexically to keep the
/// pattern stable across runs.
fn build_alternation(alias_index: &HashMap<String, usize>) -> Result<Regex, DetectionError> {
    let mut aliases: Vec<&str> = alias_index.keys().map(String::as_str).collect();
    aliases.sort_by(|a, b| {
        b.chars()
            .count()
            .cmp(&a.chars().count())
            .then_with(|| a.cmp(b))
    });
    let escaped: Vec<String> = aliases.iter().map(|a| regex::escape(a)).collect();
    Ok(Regex::new(&escaped.join("|"))?)
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> AliasTable {
        AliasTable::new(vec![
            Item::new("淡水", &["淡水", "水"]),
            Item::new("信号镜", &["信号镜", "镜子"]),
            Item::new("尼龙绳", &["尼龙绳", "绳子", "绳"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_resolve_alias_exact() {
        let table = sample_table();
        assert_eq!(table.resolve_alias("镜子"), Some("信号镜"));
        assert_eq!(table.resolve_alias("绳"), Some("尼龙绳"));
        assert_eq!(table.resolve_alias("绳子呢"), None);
    }

    #[test]
    fn test_normalize_phrase_containment() {
        let table = sample_table();
        assert_eq!(table.normalize_phrase("  一面镜子（反光）"), Some("信号镜"));
        assert_eq!(table.normalize_phrase("尼龙绳可以固定"), Some("尼龙绳"));
        assert_eq!(table.normalize_phrase("打火机"), None);
        assert_eq!(table.normalize_phrase("   "), None);
    }

    #[test]
    fn test_normalize_phrase_table_order_wins() {
        let table = sample_table();
        // Mentions both rope and water: water is earlier in the table.
        assert_eq!(table.normalize_phrase("绳子和水"), Some("淡水"));
    }

    #[test]
    fn test_find_word_case_insensitive_whole_word() {
        let table = AliasTable::new(vec![
            Item::new("water", &["water"]),
            Item::new("map", &["map"]),
        ])
        .unwrap();
        assert_eq!(table.find_word("I'd take the WATER first"), Some("water"));
        assert_eq!(table.find_word("the map."), Some("map"));
        assert_eq!(table.find_word("watermelon and maps"), None);
    }

    #[test]
    fn test_rejects_ambiguous_alias() {
        let result = AliasTable::new(vec![
            Item::new("a", &["x"]),
            Item::new("b", &["x"]),
        ]);
        assert!(matches!(result, Err(DetectionError::AmbiguousAlias { .. })));
    }

    #[test]
    fn test_rejects_empty_and_blank() {
        assert!(matches!(AliasTable::new(vec![]), Err(DetectionError::Empty)));
        assert!(matches!(
            AliasTable::new(vec![Item::new("a", &[" "])]),
            Err(DetectionError::BlankAlias { .. })
        ));
        assert!(matches!(
            AliasTable::new(vec![Item::new("a", &[])]),
            Err(DetectionError::NoAliases { .. })
        ));
    }

    #[test]
    fn test_aliases_for() {
        let table = sample_table();
        assert_eq!(
            table.aliases_for("尼龙绳").unwrap(),
            &["尼龙绳".to_string(), "绳子".to_string(), "绳".to_string()]
        );
        assert!(table.aliases_for("绳子").is_none());
        assert!(table.aliases_for("指南针").is_none());
    }

    #[test]
    fn test_alternation_prefers_longest_alias() {
        let table = sample_table();
        let m = table.alternation().find("要尼龙绳").unwrap();
        assert_eq!(m.as_str(), "尼龙绳");
    }
}
