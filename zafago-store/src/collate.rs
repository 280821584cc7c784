//! Locale-style title ordering.
//!
//! Approximates a root-locale collator without pulling in ICU: the primary pass
//! ignores case and common Latin diacritics and ranks separators and
//! punctuation before digits before letters. Remaining ties fall back to case
//! (lowercase first) and then raw code points, so the ordering is total.

use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum CharClass {
    Separator,
    Digit,
    Letter,
}

/// Compare two titles the way a listing sorted "A-Z" should read.
#[must_use]
pub fn compare_titles(a: &str, b: &str) -> Ordering {
    primary_keys(a)
        .cmp(primary_keys(b))
        .then_with(|| case_keys(a).cmp(case_keys(b)))
        .then_with(|| a.cmp(b))
}

fn primary_keys(s: &str) -> impl Iterator<Item = (CharClass, char)> + '_ {
    s.chars().map(|c| {
        let base = fold_diacritic(c).to_lowercase().next().unwrap_or(c);
        (classify(base), base)
    })
}

/// Lowercase sorts before uppercase at the tertiary level.
fn case_keys(s: &str) -> impl Iterator<Item = u8> + '_ {
    s.chars().map(|c| u8::from(c.is_uppercase()))
}

fn classify(c: char) -> CharClass {
    if c.is_alphabetic() {
        CharClass::Letter
    } else if c.is_numeric() {
        CharClass::Digit
    } else {
        CharClass::Separator
    }
}

fn fold_diacritic(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'A',
        'ç' => 'c',
        'Ç' => 'C',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'È' | 'É' | 'Ê' | 'Ë' => 'E',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'Ì' | 'Í' | 'Î' | 'Ï' => 'I',
        'ñ' => 'n',
        'Ñ' => 'N',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => 'o',
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' => 'O',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'Ù' | 'Ú' | 'Û' | 'Ü' => 'U',
        'ý' | 'ÿ' => 'y',
        'Ý' => 'Y',
        _ => c,
    }
}
