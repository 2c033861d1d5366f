//! Text helpers shared by match evaluation and permalink building.

use crate::errors::{JaxpError, Result};

/// Substitutions applied, in order, before lowercasing a friendly URL.
const FRIENDLY_URL_TABLE: &[(&str, &str)] = &[
    ("á", "a"), ("é", "e"), ("í", "i"), ("ó", "o"), ("ú", "u"), ("ñ", "n"),
    ("ä", "a"), ("ë", "e"), ("ï", "i"), ("ö", "o"), ("ü", "u"),
    (" ", "_"), ("\"", ""), ("'", ""),
    ("Á", "a"), ("É", "e"), ("Í", "i"), ("Ó", "o"), ("Ú", "u"),
    ("Ä", "a"), ("Ë", "e"), ("Ï", "i"), ("Ö", "o"), ("Ü", "u"), ("Ñ", "n"),
    (":", "_"), (",", "_"), ("“", ""), ("”", ""),
];

/// Lowercased slug for use in permalinks. Accented vowels and `ñ` fold to
/// ASCII, quotes are dropped, spaces and `:`/`,` become `_`, hyphens stay.
pub fn to_friendly_url(text: &str) -> String {
    let mut slug = text.to_string();
    for (from, to) in FRIENDLY_URL_TABLE {
        slug = slug.replace(from, to);
    }
    slug.to_lowercase()
}

pub fn contains(haystack: &str, needle: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        haystack.contains(needle)
    } else {
        haystack.to_lowercase().contains(&needle.to_lowercase())
    }
}

pub fn starts_with(haystack: &str, needle: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        haystack.starts_with(needle)
    } else {
        haystack.to_lowercase().starts_with(&needle.to_lowercase())
    }
}

pub fn ends_with(haystack: &str, needle: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        haystack.ends_with(needle)
    } else {
        haystack.to_lowercase().ends_with(&needle.to_lowercase())
    }
}

/// Number of space-separated chunks.
pub fn word_count(text: &str) -> usize {
    text.split(' ').count()
}

/// Byte offset of the first occurrence. Without `case_sensitive` only ASCII
/// letters fold, so offsets always index into `haystack`.
pub fn first_position(haystack: &str, needle: &str, case_sensitive: bool) -> Option<usize> {
    if case_sensitive {
        haystack.find(needle)
    } else {
        haystack
            .to_ascii_lowercase()
            .find(&needle.to_ascii_lowercase())
    }
}

/// Byte offsets of every non-overlapping occurrence, folding as
/// [`first_position`] does.
pub fn search(haystack: &str, needle: &str, case_sensitive: bool) -> Vec<usize> {
    if needle.is_empty() {
        return Vec::new();
    }
    if case_sensitive {
        haystack.match_indices(needle).map(|(i, _)| i).collect()
    } else {
        haystack
            .to_ascii_lowercase()
            .match_indices(&needle.to_ascii_lowercase())
            .map(|(i, _)| i)
            .collect()
    }
}

pub fn remove_chars(text: &str, chars: &[&str]) -> String {
    chars
        .iter()
        .fold(text.to_string(), |acc, c| acc.replace(c, ""))
}

pub fn to_hex(text: &str) -> String {
    hex::encode(text.as_bytes())
}

pub fn from_hex(encoded: &str) -> Result<String> {
    let bytes = hex::decode(encoded)
        .map_err(|e| JaxpError::InvalidArgument(format!("invalid hex text: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| JaxpError::InvalidArgument(format!("hex text is not UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_friendly_url() {
        assert_eq!(to_friendly_url("Año Nuevo en Córdoba"), "ano_nuevo_en_cordoba");
        assert_eq!(to_friendly_url("Fútbol: \"River\", Boca"), "futbol__river__boca");
        assert_eq!(to_friendly_url("post-mortem"), "post-mortem");
        assert_eq!(to_friendly_url("ÑANDÚ"), "nandu");
    }

    #[test]
    fn test_case_insensitive_matching() {
        assert!(contains("Gamma", "AM", false));
        assert!(!contains("Gamma", "AM", true));
        assert!(starts_with("Alpha", "AL", false));
        assert!(ends_with("Beta", "TA", false));
        assert!(!ends_with("Beta", "TA", true));
        assert!(contains("anything", "", false));
    }

    #[test]
    fn test_search_positions() {
        assert_eq!(search("abcabcab", "ab", true), vec![0, 3, 6]);
        assert_eq!(search("Ab ab AB", "ab", false), vec![0, 3, 6]);
        assert_eq!(search("abc", "", false), Vec::<usize>::new());
        assert_eq!(first_position("xxAB", "ab", false), Some(2));
        assert_eq!(first_position("xxAB", "ab", true), None);
    }

    #[test]
    fn test_search_offsets_index_original_text() {
        // KELVIN SIGN is three bytes and lowercases to a one-byte 'k'
        let text = "\u{212A}ab Año AB";
        assert_eq!(search(text, "ab", false), vec![3, 11]);
        assert_eq!(first_position(text, "AB", false), Some(3));
        for offset in search(text, "ab", false) {
            assert!(text[offset..].to_ascii_lowercase().starts_with("ab"));
        }
        assert_eq!(first_position("Ñandú", "ú", false), Some(5));
    }

    #[test]
    fn test_word_count_and_remove_chars() {
        assert_eq!(word_count("uno dos tres"), 3);
        assert_eq!(remove_chars("a-b_c d", &["-", "_"]), "abc d");
    }

    #[test]
    fn test_hex() {
        assert_eq!(to_hex("jaxp"), "6a617870");
        assert_eq!(from_hex("6a617870").unwrap(), "jaxp");
        assert!(from_hex("zz").is_err());
    }
}
