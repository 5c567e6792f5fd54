//! Static name index over the administrative-region gazetteer.

use lagebot_common::types::{Region, RegionId};

/// One gazetteer hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionMatch {
    pub id: RegionId,
    pub matched_name: String,
}

/// Name lookup over the immutable region gazetteer.
///
/// Substring semantics, case-insensitive and diacritic-tolerant: `koln`,
/// `Koeln` and `Köln` all find Köln. Results keep gazetteer order, so the
/// first match is stable across calls.
pub trait RegionIndex: Send + Sync {
    fn search_by_name(&self, text: &str) -> Vec<RegionMatch>;
}

/// [`RegionIndex`] over a `Vec<Region>` loaded once at startup.
pub struct InMemoryRegionIndex {
    entries: Vec<Entry>,
}

struct Entry {
    id: RegionId,
    name: String,
    // Both folded spellings of the name, to match either way a user types.
    base: String,
    translit: String,
}

impl InMemoryRegionIndex {
    pub fn new(regions: impl IntoIterator<Item = Region>) -> Self {
        let entries = regions
            .into_iter()
            .map(|region| Entry {
                base: fold(&region.name, false),
                translit: fold(&region.name, true),
                id: region.id,
                name: region.name,
            })
            .collect();
        Self { entries }
    }
}

impl RegionIndex for InMemoryRegionIndex {
    fn search_by_name(&self, text: &str) -> Vec<RegionMatch> {
        let base = fold(text, false);
        let translit = fold(text, true);
        if base.is_empty() {
            return Vec::new();
        }
        self.entries
            .iter()
            .filter(|e| {
                e.base.contains(&base)
                    || e.translit.contains(&translit)
                    || e.translit.contains(&base)
            })
            .map(|e| RegionMatch {
                id: e.id,
                matched_name: e.name.clone(),
            })
            .collect()
    }
}

/// Lowercase and fold diacritics. With `translit` set, German umlauts become
/// their two-letter spellings (`ö` → `oe`), otherwise the bare base letter.
fn fold(text: &str, translit: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.to_lowercase().chars() {
        match c {
            'ä' => out.push_str(if translit { "ae" } else { "a" }),
            'ö' => out.push_str(if translit { "oe" } else { "o" }),
            'ü' => out.push_str(if translit { "ue" } else { "u" }),
            'ß' => out.push_str(if translit { "ss" } else { "s" }),
            'á' | 'à' | 'â' => out.push('a'),
            'é' | 'è' | 'ê' => out.push('e'),
            'í' | 'ì' | 'î' => out.push('i'),
            'ó' | 'ò' | 'ô' => out.push('o'),
            'ú' | 'ù' | 'û' => out.push('u'),
            _ => out.push(c),
        }
    }
    out
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> InMemoryRegionIndex {
        InMemoryRegionIndex::new([
            Region {
                id: RegionId(1),
                name: "Köln".into(),
                parent: None,
            },
            Region {
                id: RegionId(2),
                name: "Region Hannover".into(),
                parent: None,
            },
            Region {
                id: RegionId(3),
                name: "Hannover".into(),
                parent: Some(RegionId(2)),
            },
            Region {
                id: RegionId(4),
                name: "Bad Segeberg".into(),
                parent: None,
            },
        ])
    }

    #[test]
    fn search_is_case_insensitive() {
        let hits = index().search_by_name("KÖLN");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, RegionId(1));
    }

    #[test]
    fn search_tolerates_missing_diacritics() {
        assert_eq!(index().search_by_name("koln").len(), 1);
        assert_eq!(index().search_by_name("koeln").len(), 1);
    }

    #[test]
    fn substring_matches_shared_name_prefixes() {
        // "Hannover" is a substring of both the city and the Region.
        let hits = index().search_by_name("hannover");
        assert_eq!(hits.len(), 2);
        // Gazetteer order is preserved.
        assert_eq!(hits[0].id, RegionId(2));
        assert_eq!(hits[1].id, RegionId(3));
    }

    #[test]
    fn multi_word_names_match_as_one_query() {
        let hits = index().search_by_name("bad segeberg");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].matched_name, "Bad Segeberg");
    }

    #[test]
    fn empty_query_returns_nothing() {
        assert!(index().search_by_name("").is_empty());
        assert!(index().search_by_name("atlantis").is_empty());
    }
}
