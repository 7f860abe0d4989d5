//! Post-OCR label correction.
//!
//! Fuzzy-matches words against the single-word aliases of the pattern
//! catalog so that OCR noise like "Haemog1obin" or "Creatiniue" does not
//! hide a result from the extractor. Only corrects when confidence is high:
//! edit distance <= 2, word at least 5 letters, a unique best match, and
//! no known non-label word at least as close.

use crate::catalog::PatternCatalog;

const MIN_WORD_LEN: usize = 5;
const MAX_DISTANCE: u32 = 2;

/// Real words that sit close to a test label but name something else
/// ("creatine" vs "creatinine"). Never rewritten, and a label is not
/// chosen when one of these is at least as close. Sorted.
const KNOWN_WORDS: &[&str] = &[
    "albumin", "alkaline", "amylase", "antigen", "bicarbonate", "bilirubin",
    "calcium", "chloride", "concentration", "corpuscular", "cortisol", "count",
    "creatine", "direct", "estradiol", "fasting", "ferritin", "fibrinogen",
    "folate", "gamma", "globulin", "glucose", "glycated", "glycosylated",
    "hormone", "hydroxy", "indirect", "insulin", "kinase", "lactate",
    "leucocyte", "leucocytes", "leukocyte", "lipase", "magnesium", "method",
    "packed", "phosphatase", "phosphate", "phosphorus", "plasma", "platelet",
    "potassium", "procalcitonin", "prolactin", "prostate", "protein", "random",
    "ratio", "serum", "sodium", "specific", "stimulating", "testosterone",
    "thyroid", "total", "transferrin", "troponin", "urine", "volume", "white",
];

/// Dictionary of correctable labels, built from a catalog.
#[derive(Debug, Clone, Default)]
pub struct TermCorrector {
    /// Lowercase, sorted, deduplicated.
    terms: Vec<String>,
}

/// Maps char offsets in corrected text back to the text as it was before
/// correction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffsetMap {
    /// (end of a rewritten word in the output, output minus input length
    /// up to that point), ascending.
    shifts: Vec<(usize, isize)>,
}

impl OffsetMap {
    pub fn is_identity(&self) -> bool {
        self.shifts.is_empty()
    }

    /// Input offset for an output offset that starts a word or lies
    /// outside any rewritten word.
    pub fn original(&self, corrected: usize) -> usize {
        let applied = self.shifts.partition_point(|&(end, _)| end <= corrected);
        match applied.checked_sub(1) {
            Some(i) => corrected.saturating_add_signed(-self.shifts[i].1),
            None => corrected,
        }
    }
}

impl TermCorrector {
    pub fn from_catalog(catalog: &PatternCatalog) -> Self {
        let mut terms: Vec<String> = catalog
            .all_rules()
            .flat_map(|r| r.aliases.iter())
            .map(|a| a.trim())
            .filter(|a| a.chars().count() >= MIN_WORD_LEN && a.chars().all(char::is_alphabetic))
            .map(str::to_lowercase)
            .collect();
        terms.sort();
        terms.dedup();
        Self { terms }
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Apply correction to every word of `text`; everything else is kept
    /// as is.
    pub fn correct(&self, text: &str) -> String {
        self.correct_mapped(text).0
    }

    /// Like `correct`, plus the map from corrected offsets back to `text`.
    pub fn correct_mapped(&self, text: &str) -> (String, OffsetMap) {
        let mut result = String::with_capacity(text.len());
        let mut map = OffsetMap::default();
        let mut out_chars = 0usize;
        let mut drift = 0isize;
        let mut word_buf = String::new();

        let mut flush = |word: &mut String, result: &mut String, out_chars: &mut usize| {
            let fixed = self.correct_word(word);
            let (before, after) = (word.chars().count(), fixed.chars().count());
            *out_chars += after;
            if before != after {
                drift += after as isize - before as isize;
                map.shifts.push((*out_chars, drift));
            }
            result.push_str(&fixed);
            word.clear();
        };

        for ch in text.chars() {
            if ch.is_alphanumeric() {
                word_buf.push(ch);
            } else {
                if !word_buf.is_empty() {
                    flush(&mut word_buf, &mut result, &mut out_chars);
                }
                result.push(ch);
                out_chars += 1;
            }
        }
        if !word_buf.is_empty() {
            flush(&mut word_buf, &mut result, &mut out_chars);
        }
        (result, map)
    }

    fn correct_word(&self, word: &str) -> String {
        let len = word.chars().count();
        if len < MIN_WORD_LEN || self.terms.is_empty() {
            return word.to_string();
        }
        // Digits inside a word are left alone unless surrounded by letters
        // (OCR reads "l" as "1" and "O" as "0").
        let letters = word.chars().filter(|c| c.is_alphabetic()).count();
        if letters * 2 <= len {
            return word.to_string();
        }

        let lower = word.to_lowercase();
        if self.terms.binary_search(&lower).is_ok()
            || KNOWN_WORDS.binary_search(&lower.as_str()).is_ok()
        {
            return word.to_string();
        }

        let Some((term, distance)) = closest(&lower, self.terms.iter().map(String::as_str)) else {
            return word.to_string();
        };
        let shadowed = KNOWN_WORDS
            .iter()
            .any(|known| within_reach(&lower, known) && edit_distance(&lower, known) <= distance);
        if shadowed {
            tracing::debug!(word, label = term, "Closer to a known word, not corrected");
            return word.to_string();
        }

        tracing::debug!(from = word, to = term, distance, "OCR label corrected");
        preserve_case(word, term)
    }
}

fn within_reach(word: &str, term: &str) -> bool {
    let diff = (word.chars().count() as i64 - term.chars().count() as i64).unsigned_abs();
    diff <= u64::from(MAX_DISTANCE)
}

/// Unique closest term within `MAX_DISTANCE`; ties mean no match.
fn closest<'a>(word: &str, terms: impl Iterator<Item = &'a str>) -> Option<(&'a str, u32)> {
    let mut best: Option<&str> = None;
    let mut best_distance = MAX_DISTANCE + 1;
    let mut ambiguous = false;

    for term in terms {
        if !within_reach(word, term) {
            continue;
        }
        let dist = edit_distance(word, term);
        if dist < best_distance {
            best_distance = dist;
            best = Some(term);
            ambiguous = false;
        } else if dist == best_distance && best.is_some() {
            ambiguous = true;
        }
    }

    match best {
        Some(term) if !ambiguous => Some((term, best_distance)),
        _ => None,
    }
}

/// Preserve the original word's capitalization pattern when applying correction.
fn preserve_case(original: &str, correction: &str) -> String {
    if original.chars().all(|c| c.is_uppercase() || !c.is_alphabetic()) {
        return correction.to_uppercase();
    }

    let first_upper = original.chars().next().is_some_and(|c| c.is_uppercase());
    if first_upper {
        let mut chars = correction.chars();
        match chars.next() {
            Some(c) => {
                let mut s = c.to_uppercase().to_string();
                s.extend(chars);
                s
            }
            None => correction.to_string(),
        }
    } else {
        correction.to_string()
    }
}

/// Levenshtein distance over chars.
fn edit_distance(a: &str, b: &str) -> u32 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len() as u32;
    }
    if b.is_empty() {
        return a.len() as u32;
    }

    let mut prev: Vec<u32> = (0..=b.len() as u32).collect();
    let mut curr = vec![0u32; b.len() + 1];

    for (i, &a_ch) in a.iter().enumerate() {
        curr[0] = (i + 1) as u32;
        for (j, &b_ch) in b.iter().enumerate() {
            let cost = u32::from(a_ch != b_ch);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}
