//! Mixed-script homograph detection and Latin normalization.
//!
//! A label is considered a homograph candidate when it mixes Latin-script
//! characters with lookalike characters from another script. A label written
//! entirely in one foreign script is not flagged; it is not trying to pass
//! for a Latin brand name.

/// Lookalike characters and the ASCII character they render as.
const CONFUSABLES: &[(char, char)] = &[
    // Cyrillic
    ('\u{0430}', 'a'), // а
    ('\u{0435}', 'e'), // е
    ('\u{043e}', 'o'), // о
    ('\u{0440}', 'p'), // р
    ('\u{0441}', 'c'), // с
    ('\u{0443}', 'y'), // у
    ('\u{0445}', 'x'), // х
    ('\u{0456}', 'i'), // і
    ('\u{0455}', 's'), // ѕ
    ('\u{0458}', 'j'), // ј
    ('\u{04bb}', 'h'), // һ
    ('\u{0501}', 'd'), // ԁ
    ('\u{051b}', 'q'), // ԛ
    ('\u{051d}', 'w'), // ԝ
    ('\u{0475}', 'v'), // ѵ
    ('\u{043a}', 'k'), // к
    ('\u{043c}', 'm'), // м
    ('\u{0442}', 't'), // т
    ('\u{043d}', 'h'), // н
    ('\u{0432}', 'b'), // в
    ('\u{0433}', 'r'), // г
    // Greek
    ('\u{03bf}', 'o'), // ο
    ('\u{03b1}', 'a'), // α
    ('\u{03b5}', 'e'), // ε
    ('\u{03b9}', 'i'), // ι
    ('\u{03ba}', 'k'), // κ
    ('\u{03bd}', 'v'), // ν
    ('\u{03c1}', 'p'), // ρ
    ('\u{03c4}', 't'), // τ
    ('\u{03c5}', 'u'), // υ
    ('\u{03c7}', 'x'), // χ
    ('\u{03b7}', 'n'), // η
    ('\u{03c9}', 'w'), // ω
];

fn latin_equivalent(ch: char) -> Option<char> {
    CONFUSABLES
        .iter()
        .find(|(confusable, _)| *confusable == ch)
        .map(|(_, latin)| *latin)
}

fn is_latin_script(ch: char) -> bool {
    // ASCII letters plus Latin-1 Supplement and Latin Extended-A/B letters.
    ch.is_ascii_alphabetic() || ('\u{00c0}'..='\u{024f}').contains(&ch)
}

/// True when the label mixes Latin characters with known confusables.
pub fn contains_homograph(label: &str) -> bool {
    let mut has_latin = false;
    let mut has_confusable = false;
    for ch in label.chars() {
        if is_latin_script(ch) {
            has_latin = true;
        } else if latin_equivalent(ch).is_some() {
            has_confusable = true;
        }
    }
    has_latin && has_confusable
}

/// Map every non-Latin character to its closest ASCII homoglyph.
///
/// Latin-script characters pass through unchanged, as does anything the
/// table has no entry for (digits, hyphens, unmapped scripts).
pub fn to_latin(label: &str) -> String {
    label
        .chars()
        .map(|ch| {
            if is_latin_script(ch) {
                ch
            } else {
                latin_equivalent(ch).unwrap_or(ch)
            }
        })
        .collect()
}
