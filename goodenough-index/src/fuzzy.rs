//! Fuzzy matching over raw symbol names.
//!
//!     Matching is delegated to `nucleo-matcher`: a name matches when every query character
//!     occurs in it, in order, ignoring case. The matched character positions are then ranked:
//!
//!         - exact match: 1
//!         - multi-character query: 2 + distance between first and last matched character
//!         - single-character query: 2 + index of the match
//!
//!     Lower scores rank first and equal scores keep snapshot order. A snapshot is immutable;
//!     the index builds a new one after every mutation.

use nucleo_matcher::pattern::{Atom, AtomKind, CaseMatching, Normalization};
use nucleo_matcher::{Config, Matcher, Utf32String};

use crate::symbol::SymbolRecord;

struct Candidate {
    haystack: Utf32String,
    record: SymbolRecord,
}

/// Immutable search structure built from one index generation.
#[derive(Default)]
pub struct FuzzySearch {
    candidates: Vec<Candidate>,
}

impl FuzzySearch {
    pub fn new(records: Vec<SymbolRecord>) -> Self {
        let candidates = records
            .into_iter()
            .map(|record| Candidate {
                haystack: Utf32String::from(record.raw_name.as_str()),
                record,
            })
            .collect();
        Self { candidates }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Best matches first. The empty query returns every record.
    pub fn search(&self, query: &str) -> Vec<SymbolRecord> {
        if query.is_empty() {
            return self
                .candidates
                .iter()
                .map(|candidate| candidate.record.clone())
                .collect();
        }

        let folded = query.to_lowercase();
        let atom = Atom::new(
            &folded,
            CaseMatching::Ignore,
            Normalization::Never,
            AtomKind::Fuzzy,
            false,
        );
        let mut matcher = Matcher::new(Config::DEFAULT);
        let mut indices = Vec::new();

        let mut scored: Vec<(usize, &SymbolRecord)> = self
            .candidates
            .iter()
            .filter_map(|candidate| {
                indices.clear();
                atom.indices(candidate.haystack.slice(..), &mut matcher, &mut indices)?;
                let exact = candidate.record.raw_name.to_lowercase() == folded;
                rank(exact, &mut indices).map(|score| (score, &candidate.record))
            })
            .collect();
        scored.sort_by_key(|(score, _)| *score);
        scored.into_iter().map(|(_, record)| record.clone()).collect()
    }
}

fn rank(exact: bool, indices: &mut Vec<u32>) -> Option<usize> {
    if exact {
        return Some(1);
    }
    indices.sort_unstable();
    indices.dedup();
    let first = *indices.first()? as usize;
    let last = *indices.last()? as usize;
    if indices.len() > 1 {
        Some(2 + (last - first))
    } else {
        Some(2 + first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract;
    use crate::testing::source_file;

    fn snapshot(contents: &str) -> FuzzySearch {
        FuzzySearch::new(extract(&source_file("A.scala"), contents))
    }

    fn names(records: &[SymbolRecord]) -> Vec<&str> {
        records.iter().map(|r| r.raw_name.as_str()).collect()
    }

    #[test]
    fn matching_is_case_insensitive() {
        let search = snapshot("class FooBar\nval other = 1");
        assert_eq!(names(&search.search("foobar")), ["FooBar"]);
        assert_eq!(names(&search.search("FOOB")), ["FooBar"]);
    }

    #[test]
    fn exact_match_ranks_first() {
        let search = snapshot("class MapperFoo\nclass Map\nclass Mapper");
        assert_eq!(names(&search.search("map")), ["Map", "MapperFoo", "Mapper"]);
        assert_eq!(names(&search.search("mapper")), ["Mapper", "MapperFoo"]);
    }

    #[test]
    fn tighter_matches_rank_before_spread_out_ones() {
        let search = snapshot("class AxxBxxC\nclass ABC_Long\nclass Abc");
        let results = search.search("abc");
        assert_eq!(names(&results), ["Abc", "ABC_Long", "AxxBxxC"]);
    }

    #[test]
    fn single_character_queries_rank_by_position() {
        let search = snapshot("class Zebra\nclass Buzz\nclass Az");
        assert_eq!(names(&search.search("z")), ["Zebra", "Az", "Buzz"]);
    }

    #[test]
    fn characters_must_appear_in_order() {
        let search = snapshot("class Foo");
        assert!(search.search("oof").is_empty());
        assert_eq!(names(&search.search("fo")), ["Foo"]);
        assert!(search.search("foox").is_empty());
    }

    #[test]
    fn rank_uses_the_span_of_matched_positions() {
        assert_eq!(rank(true, &mut vec![0, 1, 2]), Some(1));
        assert_eq!(rank(false, &mut vec![6, 0, 3, 3]), Some(8));
        assert_eq!(rank(false, &mut vec![4]), Some(6));
        assert_eq!(rank(false, &mut Vec::new()), None);
    }

    #[test]
    fn positions_count_characters_not_bytes() {
        let mut records = extract(
            &source_file("A.scala"),
            "class UberZ\nclass AbcdZ\nclass Abcdez",
        );
        records[0].raw_name = "ÜberZ".to_string();
        let search = FuzzySearch::new(records);
        assert_eq!(names(&search.search("z")), ["ÜberZ", "AbcdZ", "Abcdez"]);
    }

    #[test]
    fn empty_query_returns_everything_in_order() {
        let search = snapshot("class One\nclass Two");
        assert_eq!(names(&search.search("")), ["One", "Two"]);
        assert_eq!(search.len(), 2);
        assert!(FuzzySearch::default().is_empty());
    }
}
