//! Prompt classification
//!
//! A pure, side-effect-free classifier over single output lines. It only ever
//! annotates a line - classification never alters, withholds, or reorders
//! captured output. The pattern set is a conservative, English-only heuristic:
//! a missed prompt surfaces as a stall the caller diagnoses via cancellation,
//! and a false positive at worst asks the collaborator one needless question.

use crate::types::result::DefaultAnswer;

/// Yes/no answer tokens, matched case-insensitively; the original casing at
/// the matched site drives default inference.
const YES_NO_TOKENS: &[&str] = &["(y/n)", "[y/n]", "yes/no"];

/// Bare question patterns carrying no answer token.
const QUESTION_PATTERNS: &[&str] = &["overwrite?", "continue?", "proceed?", "replace?"];

/// Free-text cues; only honored when the trimmed line also ends with a colon.
const FREE_TEXT_PATTERNS: &[&str] = &["enter ", "specify "];

/// Outcome of classifying one output line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Ordinary output, not a prompt
    None,
    /// Yes/no question with its inferred default
    YesNo(DefaultAnswer),
    /// Question expecting arbitrary text
    FreeText,
}

/// Classify one line of process output
///
/// Matching is case-insensitive substring search over a fixed pattern set.
/// Default inference for yes/no tokens reads the actual casing at the match:
/// a capitalized token before the slash (`(Y/n)`) means default yes, after
/// the slash (`(y/N)`) means default no, no capitalization means no default.
///
/// # Examples
/// ```
/// use vintner_exec::classifier::{classify, Classification};
/// use vintner_exec::DefaultAnswer;
///
/// assert_eq!(
///     classify("'foo' exists. Overwrite? (y/N)"),
///     Classification::YesNo(DefaultAnswer::No)
/// );
/// assert_eq!(classify("Unpacking cabextract..."), Classification::None);
/// ```
#[must_use]
pub fn classify(line: &str) -> Classification {
    if let Some(default) = yes_no_default(line) {
        return Classification::YesNo(default);
    }

    let bytes = line.as_bytes();
    if QUESTION_PATTERNS
        .iter()
        .any(|p| find_ignore_ascii_case(bytes, p.as_bytes()).is_some())
    {
        return Classification::YesNo(DefaultAnswer::None);
    }

    if line.trim_end().ends_with(':')
        && FREE_TEXT_PATTERNS
            .iter()
            .any(|p| find_ignore_ascii_case(bytes, p.as_bytes()).is_some())
    {
        return Classification::FreeText;
    }

    Classification::None
}

/// Locate a yes/no token and infer its default from the original casing
fn yes_no_default(line: &str) -> Option<DefaultAnswer> {
    let bytes = line.as_bytes();
    for token in YES_NO_TOKENS {
        let Some(at) = find_ignore_ascii_case(bytes, token.as_bytes()) else {
            continue;
        };
        let matched = &bytes[at..at + token.len()];
        // Position of the yes and no letters inside the token: bracketed
        // forms are `(y/n)`, the bare form is `yes/no`.
        let (yes_at, no_at) = if token.len() == 5 { (1, 3) } else { (0, 4) };
        if matched[yes_at] == b'Y' {
            return Some(DefaultAnswer::Yes);
        }
        if matched[no_at] == b'N' {
            return Some(DefaultAnswer::No);
        }
        return Some(DefaultAnswer::None);
    }
    None
}

/// Byte-wise case-insensitive substring search
fn find_ignore_ascii_case(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    (0..=haystack.len() - needle.len())
        .find(|&i| haystack[i..i + needle.len()].eq_ignore_ascii_case(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capitalization_drives_default() {
        assert_eq!(classify("Proceed? (Y/n)"), Classification::YesNo(DefaultAnswer::Yes));
        assert_eq!(classify("Proceed? (y/N)"), Classification::YesNo(DefaultAnswer::No));
        assert_eq!(classify("Proceed? (y/n)"), Classification::YesNo(DefaultAnswer::None));
    }

    #[test]
    fn bracketed_and_bare_tokens_match() {
        assert_eq!(classify("Replace? [y/N]"), Classification::YesNo(DefaultAnswer::No));
        assert_eq!(classify("Delete all data? yes/no"), Classification::YesNo(DefaultAnswer::None));
    }

    #[test]
    fn question_patterns_without_token_have_no_default() {
        assert_eq!(
            classify("Overwrite? This deletes the existing prefix"),
            Classification::YesNo(DefaultAnswer::None)
        );
        // Literal substring only: the keyword must carry its question mark
        assert_eq!(classify("overwrite existing prefix?"), Classification::None);
    }

    #[test]
    fn free_text_requires_trailing_colon() {
        assert_eq!(classify("Enter installation path:"), Classification::FreeText);
        assert_eq!(classify("Enter pressed, resuming"), Classification::None);
    }

    #[test]
    fn ordinary_output_is_none() {
        assert_eq!(classify("Extracting archive 3 of 7"), Classification::None);
        assert_eq!(classify(""), Classification::None);
    }
}
