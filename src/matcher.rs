//! Fuzzy answer matching
//!
//! Compares the ranked candidates produced by the recognizer (or a typed
//! answer) against the expected translation. Recognizers routinely over- or
//! under-capture a word, drop a letter or pick a near homophone, so an exact
//! comparison is far too strict.

/// Letter folded onto its base form before comparison (`ё` is written as `е`
/// by most recognizers)
const FOLDED_LETTER: (char, char) = ('ё', 'е');

/// Both sides need at least this many characters before a single edit is
/// tolerated; shorter words must match exactly or by containment. Three-letter
/// words are included, so `cot` matches `cat` and `код` matches `кот`.
const MIN_FUZZY_LEN: usize = 3;

/// Maximum positional edit distance still accepted
const MAX_EDITS: usize = 1;

/// Normalize a transcript or expected answer for comparison
///
/// Lowercases, folds `ё` to `е`, keeps only Latin/Cyrillic letters and
/// whitespace, and trims the result.
#[must_use]
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .trim()
        .chars()
        .map(|c| if c == FOLDED_LETTER.0 { FOLDED_LETTER.1 } else { c })
        .filter(|c| is_alphabet(*c) || c.is_whitespace())
        .collect::<String>()
        .trim()
        .to_string()
}

const fn is_alphabet(c: char) -> bool {
    matches!(c, 'a'..='z' | 'а'..='я')
}

/// Check whether any candidate matches the expected answer
///
/// Candidates are tried in rank order and the first match wins.
#[must_use]
pub fn matches<S: AsRef<str>>(candidates: &[S], expected: &str) -> bool {
    let expected = normalize(expected);
    candidates
        .iter()
        .any(|candidate| candidate_matches(&normalize(candidate.as_ref()), &expected))
}

/// Compare one normalized candidate against the normalized expected answer
fn candidate_matches(candidate: &str, expected: &str) -> bool {
    if candidate == expected {
        return true;
    }

    // An empty candidate would be "contained" in every answer
    if candidate.is_empty() || expected.is_empty() {
        return false;
    }

    if expected.contains(candidate) || candidate.contains(expected) {
        return true;
    }

    within_one_edit(candidate, expected)
}

/// Literal positional comparison: mismatches over the shared prefix plus the
/// length difference. A transposition therefore counts as two edits.
fn within_one_edit(a: &str, b: &str) -> bool {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.len() < MIN_FUZZY_LEN || b.len() < MIN_FUZZY_LEN {
        return false;
    }

    let length_diff = a.len().abs_diff(b.len());
    if length_diff > MAX_EDITS {
        return false;
    }

    let mismatches = a.iter().zip(&b).filter(|(x, y)| x != y).count();
    mismatches + length_diff <= MAX_EDITS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_folds_and_strips() {
        assert_eq!(normalize("  Ёлка! "), "елка");
        assert_eq!(normalize("Hello, World 42"), "hello world");
        assert_eq!(normalize("!!!"), "");
    }

    #[test]
    fn exact_and_reflexive() {
        for word in ["яблоко", "кот", "Солнце", "a", ""] {
            assert!(matches(&[word], word), "{word} should match itself");
        }
    }

    #[test]
    fn substring_either_direction() {
        assert!(matches(&["ca"], "cat"));
        assert!(matches(&["это кот"], "кот"));
        assert!(matches(&["соб"], "собака"));
    }

    #[test]
    fn empty_candidate_never_matches_a_word() {
        assert!(!matches(&["123"], "кот"));
        assert!(!matches::<&str>(&[], "кот"));
    }

    #[test]
    fn single_substitution_tolerated() {
        assert!(matches(&["cot"], "cat"));
        assert!(matches(&["сабака"], "собака"));
    }

    #[test]
    fn single_insertion_or_deletion_at_end_tolerated() {
        assert!(matches(&["книги"], "книга"));
        assert!(matches(&["дерев"], "дерево"));
        assert!(matches(&["лунаа"], "луна"));
    }

    #[test]
    fn positional_mismatch_after_shift_rejected() {
        // length diff 1 plus two positional mismatches
        assert!(!matches(&["coat"], "cat"));
        assert!(!matches(&["звзда"], "звезда"));
    }

    #[test]
    fn transposition_counts_as_two() {
        assert!(!matches(&["рбыа"], "рыба"));
    }

    #[test]
    fn length_difference_over_one_rejected() {
        assert!(!matches(&["солнышко"], "солнце"));
        assert!(!matches(&["abxdef"], "abcd"));
    }

    #[test]
    fn three_letter_near_miss_tolerated() {
        assert!(matches(&["код"], "кот"));
        assert!(!matches(&["дом"], "кот"));
    }

    #[test]
    fn short_words_need_exact_or_containment() {
        assert!(!matches(&["до"], "ты"));
        assert!(!matches(&["ab"], "ac"));
    }

    #[test]
    fn any_ranked_candidate_can_match() {
        assert!(matches(&["код", "кит", "кот"], "кот"));
        assert!(!matches(&["дом", "сон"], "кот"));
    }

    #[test]
    fn folded_letter_matches_plain_form() {
        assert!(matches(&["ежик"], "ёжик"));
    }
}
