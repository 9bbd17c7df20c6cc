//! Reconciling external station names with the canonical graph.
//!
//! The delay API names stations loosely ("Oslo S", "Oslo stasjon",
//! "oslo s", ...). Matching goes in two directions:
//! - inward: [`find_canonical_match`] maps a name seen in a journey record
//!   onto a canonical station;
//! - outward: [`generate_variants`] lists spellings to probe the API with for
//!   a canonical station.

use std::collections::HashSet;

use crate::network::StationGraph;

/// Suffixes dropped by [`normalize`], matched after lowercasing.
const NAME_SUFFIXES: &[&str] = &[" stasjon", " s"];

/// Result of resolving an external name against the canonical graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<'a> {
    Resolved(&'a str),
    Unresolved,
}

impl<'a> Resolution<'a> {
    pub fn station(self) -> Option<&'a str> {
        match self {
            Resolution::Resolved(name) => Some(name),
            Resolution::Unresolved => None,
        }
    }
}

/// Maps external station names onto canonical ones.
pub trait StationMatcher {
    fn resolve(&self, external: &str) -> Resolution<'_>;
}

impl StationMatcher for StationGraph {
    fn resolve(&self, external: &str) -> Resolution<'_> {
        find_canonical_match(self, external)
    }
}

/// Comparison key for a station name.
///
/// Lowercases, trims, and strips trailing ` stasjon` and standalone ` s`
/// until neither applies, so `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(name: &str) -> String {
    let mut key = name.trim().to_lowercase();

    loop {
        let before = key.len();

        for suffix in NAME_SUFFIXES {
            if key.ends_with(suffix) {
                let len = key.len() - suffix.len();
                key.truncate(len);
            }
        }

        let len = key.trim_end().len();
        key.truncate(len);

        if key.len() == before {
            return key;
        }
    }
}

/// Finds the canonical station an external name refers to.
///
/// Exact normalized matches win. Otherwise a substring match in either
/// direction is accepted, as long as the shorter name starts a word in the
/// longer one ("strøm" finds "strømmen", "ås" does not find "dombås").
/// Among several, the longest overlap wins, then the closest length, then
/// graph order.
pub fn find_canonical_match<'g>(graph: &'g StationGraph, external: &str) -> Resolution<'g> {
    let key = normalize(external);
    if key.is_empty() {
        return Resolution::Unresolved;
    }

    if let Some((name, _)) = graph.normalized_names().find(|(_, n)| *n == key) {
        return Resolution::Resolved(name);
    }

    let key_len = key.chars().count();
    // (name, overlap, length difference)
    let mut best: Option<(&str, usize, usize)> = None;

    for (name, canonical) in graph.normalized_names() {
        if canonical.is_empty() || !(starts_word_in(&key, canonical) || starts_word_in(canonical, &key)) {
            continue;
        }

        let canonical_len = canonical.chars().count();
        let overlap = key_len.min(canonical_len);
        let diff = key_len.abs_diff(canonical_len);

        let better = match best {
            None => true,
            Some((_, o, d)) => overlap > o || (overlap == o && diff < d),
        };
        if better {
            best = Some((name, overlap, diff));
        }
    }

    best.map_or(Resolution::Unresolved, |(name, _, _)| Resolution::Resolved(name))
}

/// Whether `needle` occurs in `haystack` at the start of a word.
fn starts_word_in(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(i, _)| {
        haystack[..i]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric())
    })
}

/// Spellings to try against the API for a canonical station, most likely
/// first and without duplicates.
pub fn generate_variants(canonical: &str) -> Vec<String> {
    let mut variants = vec![canonical.to_string()];

    if !canonical.to_lowercase().contains("stasjon") {
        variants.push(format!("{canonical} stasjon"));
    }

    if let Some(base) = canonical.strip_suffix(" S") {
        variants.push(format!("{base} stasjon"));
        variants.push(base.to_string());
    }

    variants.push(canonical.to_lowercase());

    let mut seen = HashSet::new();
    variants.retain(|v| seen.insert(v.clone()));
    variants
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{Position, Station};

    fn graph_of(names: &[&str]) -> StationGraph {
        let stations = names
            .iter()
            .map(|n| Station {
                name: n.to_string(),
                position: Position::default(),
            })
            .collect();
        StationGraph::new(stations, vec![])
    }

    #[test]
    fn test_normalize_terminal_suffixes() {
        assert_eq!(normalize("Oslo S"), "oslo");
        assert_eq!(normalize("oslo stasjon"), "oslo");
        assert_eq!(normalize("Trondheim S"), "trondheim");
        assert_eq!(normalize("  Drammen Stasjon "), "drammen");
    }

    #[test]
    fn test_normalize_keeps_inner_words() {
        assert_eq!(normalize("Oslo lufthavn"), "oslo lufthavn");
        assert_eq!(normalize("Oslo sentralstasjon"), "oslo sentralstasjon");
        assert_eq!(normalize("Ski"), "ski");
        assert_eq!(normalize("s"), "s");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = [
            "Oslo S",
            "oslo stasjon",
            " Oslo S ",
            "Hamar S stasjon",
            "Hamar stasjon stasjon",
            "Lillestrøm  s",
            "Halden stasjon s",
            "STASJON",
            "   ",
            "Ås",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "input {input:?}");
        }
    }

    #[test]
    fn test_exact_match_before_substring() {
        let graph = graph_of(&["Oslo lufthavn", "Oslo S"]);
        assert_eq!(
            find_canonical_match(&graph, "Oslo stasjon"),
            Resolution::Resolved("Oslo S")
        );
        assert_eq!(
            find_canonical_match(&graph, "Oslo Lufthavn stasjon"),
            Resolution::Resolved("Oslo lufthavn")
        );
    }

    #[test]
    fn test_substring_either_direction() {
        let graph = StationGraph::builtin();
        assert_eq!(
            find_canonical_match(&graph, "Oslo sentralstasjon"),
            Resolution::Resolved("Oslo S")
        );
        assert_eq!(
            find_canonical_match(&graph, "Bergen"),
            Resolution::Resolved("Bergen")
        );
        assert_eq!(
            find_canonical_match(&graph, "Lillehamme"),
            Resolution::Resolved("Lillehammer")
        );
    }

    #[test]
    fn test_mid_word_substring_ignored() {
        let graph = StationGraph::builtin();
        // Inside "lillestrøm" too, but only starts a word in "strømmen".
        assert_eq!(
            find_canonical_match(&graph, "Strøm"),
            Resolution::Resolved("Strømmen")
        );
    }

    #[test]
    fn test_ambiguous_substring_prefers_longest_overlap() {
        let graph = graph_of(&["Oslo S", "Oslo lufthavn"]);
        // Both canonical keys are inside the external name.
        assert_eq!(
            find_canonical_match(&graph, "Oslo lufthavn terminal"),
            Resolution::Resolved("Oslo lufthavn")
        );
    }

    #[test]
    fn test_tie_keeps_graph_order() {
        let graph = graph_of(&["Nord Aa", "Nord Bb"]);
        assert_eq!(find_canonical_match(&graph, "Nord"), Resolution::Resolved("Nord Aa"));
    }

    #[test]
    fn test_substring_must_start_a_word() {
        let graph = StationGraph::builtin();
        // Ås is not on the built-in network; it must not land on Dombås.
        assert_eq!(
            find_canonical_match(&graph, "Ås stasjon"),
            Resolution::Unresolved
        );
        assert_eq!(
            find_canonical_match(&graph, "Dombås"),
            Resolution::Resolved("Dombås")
        );

        let graph = graph_of(&["Ås", "Dombås"]);
        assert_eq!(find_canonical_match(&graph, "Ås stasjon"), Resolution::Resolved("Ås"));
        assert_eq!(
            find_canonical_match(&graph, "Dombås stasjon"),
            Resolution::Resolved("Dombås")
        );
    }

    #[test]
    fn test_starts_word_in() {
        assert!(starts_word_in("oslo lufthavn", "lufthavn"));
        assert!(starts_word_in("strømmen", "strøm"));
        assert!(!starts_word_in("lillestrøm", "strøm"));
        assert!(!starts_word_in("dombås", "ås"));
        assert!(starts_word_in("bergen-voss", "voss"));
    }

    #[test]
    fn test_unresolved() {
        let graph = StationGraph::builtin();
        assert_eq!(
            find_canonical_match(&graph, "Stockholm C"),
            Resolution::Unresolved
        );
        assert_eq!(find_canonical_match(&graph, "  "), Resolution::Unresolved);
        assert_eq!(Resolution::Unresolved.station(), None);
    }

    #[test]
    fn test_variants_for_terminal_station() {
        let variants = generate_variants("Oslo S");
        assert_eq!(variants[0], "Oslo S");
        for expected in ["Oslo S", "Oslo stasjon", "oslo s"] {
            assert!(variants.iter().any(|v| v == expected), "missing {expected}");
        }
        assert!(variants.iter().any(|v| v == "Oslo"));

        let unique: HashSet<_> = variants.iter().collect();
        assert_eq!(unique.len(), variants.len());
    }

    #[test]
    fn test_variants_for_plain_station() {
        assert_eq!(
            generate_variants("Drammen"),
            vec!["Drammen", "Drammen stasjon", "drammen"]
        );
    }

    #[test]
    fn test_variants_skip_duplicate_lowercase() {
        assert_eq!(
            generate_variants("hamar stasjon"),
            vec!["hamar stasjon"]
        );
    }
}
