//! Name-hint matching for track sub-meshes.
//!
//! Hints are trimmed and compared case-insensitively. Word-boundary mode
//! requires the characters on either side of a hit to be outside `[a-z0-9]`,
//! so `"ground"` matches `"Ground_01"` and `"road ground"` but not
//! `"UndergroundPipe"`. Non-ASCII characters count as boundaries, but an ASCII
//! letter or digit next to a CJK hint still blocks a word match: `"柱01"`
//! only matches `"柱"` in substring mode.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HintMode {
    WordBoundary,
    Substring,
}

/// Whether `name` contains `hint` as a whole word. Every occurrence is tried.
pub fn word_match(name: &str, hint: &str) -> bool {
    let hint = hint.trim().to_lowercase();
    if hint.is_empty() {
        return false;
    }
    let name = name.to_lowercase();
    let bytes = name.as_bytes();

    name.match_indices(hint.as_str()).any(|(start, hit)| {
        let end = start + hit.len();
        let before_ok = start == 0 || !bytes[start - 1].is_ascii_alphanumeric();
        let after_ok = end >= bytes.len() || !bytes[end].is_ascii_alphanumeric();
        before_ok && after_ok
    })
}

pub fn substring_match(name: &str, hint: &str) -> bool {
    let hint = hint.trim().to_lowercase();
    !hint.is_empty() && name.to_lowercase().contains(&hint)
}

#[inline]
pub fn matches(name: &str, hint: &str, mode: HintMode) -> bool {
    match mode {
        HintMode::WordBoundary => word_match(name, hint),
        HintMode::Substring => substring_match(name, hint),
    }
}

/// First hint matching any of `names`, in hint order.
pub fn find_hint<'h, 'n>(
    names: impl IntoIterator<Item = &'n str> + Clone,
    hints: &'h [String],
    mode: HintMode,
) -> Option<&'h str> {
    hints
        .iter()
        .map(String::as_str)
        .find(|hint| names.clone().into_iter().any(|n| matches(n, hint, mode)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_boundary_rejects_embedded_hits() {
        assert!(!word_match("UndergroundPipe", "ground"));
        assert!(!word_match("Groundwork", "ground"));
        assert!(word_match("Ground", "ground"));
        assert!(word_match("track_GROUND.001", "ground"));
        assert!(word_match("road ground", "ground"));
    }

    #[test]
    fn word_boundary_tries_later_occurrences() {
        assert!(word_match("underground_ground", "ground"));
    }

    #[test]
    fn word_boundary_treats_non_ascii_as_separator() {
        assert!(word_match("地面ground", "ground"));
        assert!(word_match("柱_01", "柱"));
        assert!(word_match("柱 01", "柱"));
    }

    #[test]
    fn cjk_hint_followed_by_digit_needs_substring_mode() {
        assert!(!word_match("柱01", "柱"));
        assert!(substring_match("柱01", "柱"));
        assert!(matches("柱01", "柱", HintMode::Substring));
    }

    #[test]
    fn substring_is_case_insensitive() {
        assert!(substring_match("BigPillar_3", "pillar"));
        assert!(substring_match("UndergroundPipe", "ground"));
        assert!(!substring_match("Wall", "pillar"));
        assert!(!substring_match("Wall", "  "));
    }

    #[test]
    fn find_hint_searches_every_name() {
        let hints = vec!["start".to_owned(), "startline".to_owned()];
        let chain = ["Plane.004", "StartLine"];
        assert_eq!(
            find_hint(chain, &hints, HintMode::WordBoundary),
            Some("startline")
        );
        assert_eq!(find_hint(["Restart"], &hints, HintMode::WordBoundary), None);
    }
}
