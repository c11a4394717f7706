//! Safe, bounded file names for archive entries and stored files.

use std::collections::HashSet;

use unicode_normalization::UnicodeNormalization;

/// Replacement used when sanitizing leaves nothing behind.
pub const UNTITLED: &str = "untitled";

const RESERVED: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Produces a file name that is safe on common filesystems.
///
/// - Composes to NFC so visually identical names share one encoding
/// - Replaces ASCII control characters and `\ / : * ? " < > |` with `_`
/// - Trims surrounding whitespace and trailing dots
/// - Substitutes `"untitled"` for an empty result
/// - Truncates to `max_len` characters
///
/// `max_len` must be at least 1. A `max_len` of 0 is treated as 1, so the
/// result is never empty.
///
/// # Examples
///
/// ```
/// use simplynote::infra::sanitize_filename;
///
/// assert_eq!(sanitize_filename("a/b:c?.txt", 100), "a_b_c_.txt");
/// assert_eq!(sanitize_filename("  notes.. ", 100), "notes");
/// assert_eq!(sanitize_filename("", 100), "untitled");
/// assert_eq!(sanitize_filename("abcdef", 3), "abc");
/// ```
pub fn sanitize_filename(name: &str, max_len: usize) -> String {
    let replaced: String = name
        .nfc()
        .map(|c| {
            if c.is_ascii_control() || RESERVED.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect();

    let trimmed = replaced
        .trim()
        .trim_end_matches(|c: char| c == '.' || c.is_whitespace());

    let name = if trimmed.is_empty() { UNTITLED } else { trimmed };
    name.chars().take(max_len.max(1)).collect()
}

/// Splits a name at its last dot into stem and extension (dot included).
///
/// A name without a dot has an empty extension.
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(pos) => name.split_at(pos),
        None => (name, ""),
    }
}

/// Returns `name`, or the first of `stem-1.ext`, `stem-2.ext`, ... not yet in
/// `taken`, and records the result in `taken`.
pub fn dedup_name(name: &str, taken: &mut HashSet<String>) -> String {
    let (stem, ext) = split_extension(name);
    let mut candidate = name.to_string();
    let mut n = 1;
    while taken.contains(&candidate) {
        candidate = format!("{stem}-{n}{ext}");
        n += 1;
    }
    taken.insert(candidate.clone());
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // ===========================================
    // Phase 1: Substitutions
    // ===========================================

    #[test]
    fn replaces_reserved_characters() {
        assert_eq!(
            sanitize_filename(r#"a\b/c:d*e?f"g<h>i|j"#, 100),
            "a_b_c_d_e_f_g_h_i_j"
        );
    }

    #[test]
    fn replaces_control_characters() {
        assert_eq!(sanitize_filename("line\nbreak\ttab\u{7f}", 100), "line_break_tab_");
    }

    #[test]
    fn composes_to_nfc() {
        assert_eq!(sanitize_filename("cafe\u{0301}.txt", 100), "caf\u{00e9}.txt");
    }

    #[test]
    fn keeps_non_ascii_text() {
        assert_eq!(sanitize_filename("買い物リスト", 80), "買い物リスト");
    }

    // ===========================================
    // Phase 2: Trimming & Fallback
    // ===========================================

    #[test]
    fn trims_whitespace_and_trailing_dots() {
        assert_eq!(sanitize_filename("  report...  ", 100), "report");
        assert_eq!(sanitize_filename("report . .", 100), "report");
    }

    #[test]
    fn keeps_leading_dot() {
        assert_eq!(sanitize_filename(".env", 100), ".env");
    }

    #[test]
    fn empty_becomes_untitled() {
        assert_eq!(sanitize_filename("", 100), "untitled");
        assert_eq!(sanitize_filename("   ", 100), "untitled");
        assert_eq!(sanitize_filename("...", 100), "untitled");
    }

    // ===========================================
    // Phase 3: Truncation
    // ===========================================

    #[test]
    fn truncates_by_characters() {
        let long = "あ".repeat(120);
        let out = sanitize_filename(&long, 80);
        assert_eq!(out.chars().count(), 80);
    }

    #[test]
    fn truncation_happens_after_substitution() {
        assert_eq!(sanitize_filename("a/b/c/d", 3), "a_b");
    }

    #[test]
    fn zero_max_still_yields_a_character() {
        assert_eq!(sanitize_filename("abc", 0), "a");
    }

    #[test]
    fn output_invariants_hold_for_hostile_inputs() {
        let inputs = [
            "", " ", ".", "..", "\u{0}\u{1}\u{1f}", "<>:\"/\\|?*", "a\r\nb", " .x. ",
            "名前.txt", "e\u{0301}\u{0301}", "CON", "a".repeat(300).as_str(),
        ]
        .map(str::to_string);
        for input in inputs {
            for max in [1, 5, 80, 100] {
                let out = sanitize_filename(&input, max);
                assert!(!out.is_empty(), "empty output for {input:?}");
                assert!(out.chars().count() <= max, "too long for {input:?}");
                assert!(
                    !out.chars().any(|c| c.is_ascii_control() || RESERVED.contains(&c)),
                    "forbidden char in {out:?}"
                );
            }
        }
    }

    // ===========================================
    // Phase 4: split_extension
    // ===========================================

    #[test]
    fn split_extension_uses_last_dot() {
        assert_eq!(split_extension("photo.jpg"), ("photo", ".jpg"));
        assert_eq!(split_extension("archive.tar.gz"), ("archive.tar", ".gz"));
        assert_eq!(split_extension("README"), ("README", ""));
    }

    #[test]
    fn dedup_name_suffixes_before_extension() {
        let mut taken = HashSet::new();
        assert_eq!(dedup_name("photo.jpg", &mut taken), "photo.jpg");
        assert_eq!(dedup_name("photo.jpg", &mut taken), "photo-1.jpg");
        assert_eq!(dedup_name("photo.jpg", &mut taken), "photo-2.jpg");
        assert_eq!(dedup_name("notes", &mut taken), "notes");
        assert_eq!(dedup_name("notes", &mut taken), "notes-1");
    }

    #[test]
    fn dedup_name_skips_names_already_taken_literally() {
        let mut taken = HashSet::from(["a.txt".to_string(), "a-1.txt".to_string()]);
        assert_eq!(dedup_name("a.txt", &mut taken), "a-2.txt");
    }
}
