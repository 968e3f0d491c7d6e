use unicode_normalization::UnicodeNormalization;

/// Normalize extracted node text to NFC and trim surrounding whitespace.
///
/// Titles on the listing page mix precomposed and combining accents
/// ("Amélie", "Léon"), so the same film can otherwise appear with two
/// different byte sequences across runs.
pub fn normalize_text(input: &str) -> String {
    input.nfc().collect::<String>().trim().to_string()
}
