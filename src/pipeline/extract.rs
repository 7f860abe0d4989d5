//! Alias-driven value extraction.
//!
//! Every alias occurrence of every rule is located first. Overlapping
//! occurrences are resolved in favour of the longer label ("HDL
//! Cholesterol" over "Cholesterol"), then each kept occurrence looks for
//! the first number that follows it, within the adjacency window and
//! before the next kept label.

use std::collections::BTreeMap;

use crate::catalog::{canonicalize_unit, PatternCatalog};
use crate::models::{PipelineWarning, RawMatch};

/// Extractor output: matches in text order plus recoverable anomalies.
#[derive(Debug, Clone, Default)]
pub struct ExtractionOutcome {
    pub matches: Vec<RawMatch>,
    pub warnings: Vec<PipelineWarning>,
}

/// One alias occurrence, in byte offsets.
#[derive(Debug, Clone, Copy)]
struct Occurrence {
    rule: usize,
    start: usize,
    end: usize,
}

/// Result of scanning the text after one label.
#[derive(Debug, PartialEq)]
enum ValueScan<'t> {
    Found { value: &'t str, unit: Option<&'t str> },
    /// A number was adjacent but is part of a date, time, range or ID.
    Rejected(&'t str),
    /// No usable number; the reason is only logged.
    Missing(&'static str),
}

/// Scan `text` for test values. Never fails: noisy text yields fewer
/// matches, not an error. `default_window` applies to rules without their
/// own window.
pub fn extract(text: &str, catalog: &PatternCatalog, default_window: usize) -> ExtractionOutcome {
    let mut outcome = ExtractionOutcome::default();
    if text.trim().is_empty() || catalog.is_empty() {
        return outcome;
    }

    let occurrences = resolve_overlaps(find_occurrences(text, catalog));
    let rules = catalog.compiled();
    let mut cursor = CharCursor::default();

    for (i, occ) in occurrences.iter().enumerate() {
        let rule = &rules[occ.rule].rule;
        let limit = occurrences.get(i + 1).map_or(text.len(), |next| next.start);
        let window = rule.window.unwrap_or(default_window);
        let position = cursor.advance_to(text, occ.start);

        match scan_value(&text[occ.end..limit], window) {
            ValueScan::Found { value, unit } => outcome.matches.push(RawMatch {
                test_key: rule.test_key.clone(),
                raw_value_text: value.to_string(),
                raw_unit_text: unit.map(String::from),
                position,
            }),
            ValueScan::Rejected(raw) => {
                tracing::debug!(test_key = %rule.test_key, position, raw, "Rejected adjacent number");
                outcome.warnings.push(PipelineWarning::RejectedValue {
                    test_key: rule.test_key.clone(),
                    raw_text: raw.to_string(),
                    position,
                });
            }
            ValueScan::Missing(reason) => {
                tracing::debug!(test_key = %rule.test_key, position, reason, "Label without value");
            }
        }
    }

    tracing::debug!(
        labels = occurrences.len(),
        match_count = outcome.matches.len(),
        "Extraction complete"
    );
    outcome
}

fn find_occurrences(text: &str, catalog: &PatternCatalog) -> Vec<Occurrence> {
    catalog
        .compiled()
        .iter()
        .enumerate()
        .flat_map(|(rule, compiled)| {
            compiled.recognizer.find_iter(text).map(move |m| Occurrence {
                rule,
                start: m.start(),
                end: m.end(),
            })
        })
        .filter(|occ| occ.end > occ.start)
        .collect()
}

/// Keep a set of non-overlapping occurrences: longer labels first, then
/// earlier start, then catalog order. Returned sorted by start.
fn resolve_overlaps(mut occurrences: Vec<Occurrence>) -> Vec<Occurrence> {
    occurrences.sort_by(|a, b| {
        (b.end - b.start)
            .cmp(&(a.end - a.start))
            .then(a.start.cmp(&b.start))
            .then(a.rule.cmp(&b.rule))
    });

    // start -> occurrence; kept intervals are disjoint.
    let mut kept: BTreeMap<usize, Occurrence> = BTreeMap::new();
    for occ in occurrences {
        let overlaps = kept
            .range(..occ.end)
            .next_back()
            .is_some_and(|(_, prev)| prev.end > occ.start);
        if !overlaps {
            kept.insert(occ.start, occ);
        }
    }
    kept.into_values().collect()
}

fn scan_value(region: &str, window: usize) -> ValueScan<'_> {
    let mut prev: Option<char> = None;
    let mut skip_until = 0;
    for (count, (i, c)) in region.char_indices().enumerate() {
        if count > window {
            break;
        }
        if i < skip_until || !c.is_ascii_digit() {
            prev = Some(c);
            continue;
        }
        // "Hb A1c": the digit belongs to another word.
        if prev.is_some_and(char::is_alphabetic) {
            return ValueScan::Missing("number glued to a word");
        }

        let rest = &region[i..];
        let token_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == ','))
            .unwrap_or(rest.len());
        let token = rest[..token_len].trim_end_matches(['.', ',']);
        let after = &rest[token.len()..];

        // "TSH (3rd Generation)", "Vitamin D, 25-Hydroxy": part of the label.
        if is_label_number(token, after) {
            let word_len = rest
                .find(|c: char| !(c.is_alphanumeric() || c == '-'))
                .unwrap_or(rest.len());
            skip_until = i + word_len;
            prev = Some(c);
            continue;
        }

        let mut tail = after.chars();
        if let (Some(sep), Some(next)) = (tail.next(), tail.next()) {
            if matches!(sep, '/' | '-' | ':' | '.' | '\u{2013}') && next.is_ascii_digit() {
                let raw_end = after
                    .char_indices()
                    .skip(1)
                    .find(|(_, c)| !(c.is_ascii_digit() || matches!(c, '.' | ',' | '/' | '-' | ':')))
                    .map_or(after.len(), |(j, _)| j);
                return ValueScan::Rejected(&rest[..token.len() + raw_end]);
            }
        }

        return ValueScan::Found {
            value: token,
            unit: scan_unit(after),
        };
    }
    ValueScan::Missing("no number within window")
}

/// An integer that names part of the test rather than its result: an
/// ordinal ("3rd") or a hyphenated prefix ("25-OH").
fn is_label_number(token: &str, after: &str) -> bool {
    if !token.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let mut tail = after.chars();
    match tail.next() {
        Some('-') => tail.next().is_some_and(char::is_alphabetic),
        Some(c) if c.is_alphabetic() => {
            let suffix: String = after.chars().take_while(|c| c.is_alphanumeric()).collect();
            ORDINAL_SUFFIXES.contains(&suffix.to_lowercase().as_str())
        }
        _ => false,
    }
}

const ORDINAL_SUFFIXES: &[&str] = &["nd", "rd", "st", "th"];

/// Result flags that may follow a value on the same line.
const FLAG_WORDS: &[&str] = &["a", "abnormal", "borderline", "h", "high", "l", "low", "n", "n/a", "normal"];

/// Unit text after a value: a recognized unit if there is one, else a
/// unit-shaped token that normalization will report as unknown.
fn scan_unit(after: &str) -> Option<&str> {
    known_unit(after).or_else(|| unit_like_token(after))
}

/// Longest run of up to three tokens on the same line that the unit table
/// recognizes, e.g. `g/dL`, `mill/cmm`, `x 10^3 /µL`.
fn known_unit(after: &str) -> Option<&str> {
    const MAX_UNIT_TOKENS: usize = 3;
    let line = same_line(after);

    let mut ends = Vec::with_capacity(MAX_UNIT_TOKENS);
    let mut pos = 0;
    while ends.len() < MAX_UNIT_TOKENS {
        let start = pos + (line[pos..].len() - line[pos..].trim_start_matches([' ', '\t']).len());
        let end = line[start..]
            .find(char::is_whitespace)
            .map_or(line.len(), |n| start + n);
        if end == start {
            break;
        }
        ends.push(end);
        pos = end;
    }

    ends.iter().rev().find_map(|&end| {
        let candidate = trim_unit(&line[..end]);
        canonicalize_unit(candidate).map(|_| candidate)
    })
}

/// First token after the value when it reads like a unit the table does
/// not know: it carries `/`, `%` or `^`, or it is a short word that ends
/// the line and is not a result flag.
fn unit_like_token(after: &str) -> Option<&str> {
    let line = same_line(after);
    let end = line.find(char::is_whitespace).unwrap_or(line.len());
    let token = trim_unit(&line[..end]);
    if token.is_empty() || token.starts_with(|c: char| c.is_ascii_digit() || c == '-') {
        return None;
    }
    let lower = token.to_lowercase();
    if FLAG_WORDS.contains(&lower.as_str()) {
        return None;
    }
    if token.contains(['/', '%', '^']) {
        return Some(token);
    }
    let last_on_line = line[end..].trim().is_empty();
    let short_word = token.chars().count() <= 5 && token.chars().all(char::is_alphabetic);
    (short_word && last_on_line).then_some(token)
}

/// Text up to the end of the line, leading blanks removed.
fn same_line(after: &str) -> &str {
    let line = after.split(['\n', '\r']).next().unwrap_or("");
    line.trim_start_matches([' ', '\t'])
}

fn trim_unit(raw: &str) -> &str {
    raw.trim_end_matches([',', ';', ':', ')', ']'])
        .trim_start_matches(['(', '['])
}

/// Converts increasing byte offsets into char offsets in one pass.
#[derive(Debug, Default)]
struct CharCursor {
    byte: usize,
    chars: usize,
}

impl CharCursor {
    fn advance_to(&mut self, text: &str, byte: usize) -> usize {
        if byte > self.byte {
            self.chars += text[self.byte..byte].chars().count();
            self.byte = byte;
        }
        self.chars
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{builtin, PatternRule};

    fn make_rule(key: &str, aliases: &[&str], unit: Option<&str>) -> PatternRule {
        PatternRule {
            test_key: key.into(),
            display_name: key.into(),
            category: "Test".into(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            expected_unit: unit.map(String::from),
            window: None,
            plausible_range: None,
        }
    }

    fn bundled(text: &str) -> ExtractionOutcome {
        extract(text, &builtin::catalog().unwrap(), 32)
    }

    fn keys(outcome: &ExtractionOutcome) -> Vec<&str> {
        outcome.matches.iter().map(|m| m.test_key.as_str()).collect()
    }

    #[test]
    fn value_and_unit_after_label() {
        let out = bundled("Hemoglobin: 10.2 g/dL");
        assert_eq!(out.matches.len(), 1);
        let m = &out.matches[0];
        assert_eq!(m.test_key, "hemoglobin");
        assert_eq!(m.raw_value_text, "10.2");
        assert_eq!(m.raw_unit_text.as_deref(), Some("g/dL"));
        assert_eq!(m.position, 0);
    }

    #[test]
    fn missing_unit_is_none() {
        let out = bundled("TSH 2.5");
        assert_eq!(out.matches[0].raw_value_text, "2.5");
        assert_eq!(out.matches[0].raw_unit_text, None);
    }

    #[test]
    fn no_data_yields_empty() {
        assert!(bundled("").matches.is_empty());
        assert!(bundled("Thank you for choosing our laboratory.").matches.is_empty());
        assert!(bundled("Hemoglobin was not measured").matches.is_empty());
    }

    #[test]
    fn dates_and_ranges_next_to_labels_are_rejected() {
        let out = bundled("TSH 12/03/2024 collected");
        assert!(out.matches.is_empty());
        assert!(matches!(
            &out.warnings[0],
            PipelineWarning::RejectedValue { raw_text, .. } if raw_text == "12/03/2024"
        ));

        let out = bundled("Hemoglobin 13.0-17.0");
        assert!(out.matches.is_empty());
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn numbers_outside_window_are_ignored() {
        let text = format!("Hemoglobin{}13.2", " ".repeat(40));
        assert!(bundled(&text).matches.is_empty());

        let rule = PatternRule {
            window: Some(60),
            ..make_rule("hemoglobin", &["Hemoglobin"], Some("g/dL"))
        };
        let catalog = PatternCatalog::new(vec![rule]).unwrap();
        assert_eq!(extract(&text, &catalog, 32).matches.len(), 1);
    }

    #[test]
    fn value_is_first_number_after_label() {
        let out = bundled("Serum Creatinine (enzymatic) 1.1 mg/dL 0.7 - 1.3");
        assert_eq!(out.matches.len(), 1);
        assert_eq!(out.matches[0].test_key, "creatinine");
        assert_eq!(out.matches[0].raw_value_text, "1.1");
    }

    #[test]
    fn digit_glued_to_word_does_not_count() {
        let out = bundled("Hb A1c pending");
        assert!(out.matches.is_empty());
    }

    #[test]
    fn longer_label_wins_overlap() {
        let out = bundled("HDL Cholesterol 45 mg/dL\nTotal Cholesterol 190 mg/dL\nCHO/HDL Ratio 4.2");
        assert_eq!(keys(&out), vec!["hdl", "cholesterol_total", "cho_hdl_ratio"]);
        assert_eq!(out.matches[2].raw_unit_text, None);
    }

    #[test]
    fn label_search_stops_at_next_label() {
        let out = bundled("MCHC MCV 88 fL");
        assert_eq!(keys(&out), vec!["mcv"]);
    }

    #[test]
    fn report_style_units() {
        let out = bundled("Total WBC Count 5600 /cumm\nPlatelet Count 250000 cells/cumm\nRBC 4.8 mill/cmm");
        let units: Vec<_> = out.matches.iter().map(|m| m.raw_unit_text.as_deref()).collect();
        assert_eq!(units, vec![Some("/cumm"), Some("cells/cumm"), Some("mill/cmm")]);
    }

    #[test]
    fn multi_token_and_bracketed_units() {
        let out = bundled("Hemoglobin 13.2 (gm/dl)\nCholesterol 5.2 mg / dL");
        assert_eq!(out.matches[0].raw_unit_text.as_deref(), Some("gm/dl"));
        assert_eq!(out.matches[1].raw_unit_text.as_deref(), Some("mg / dL"));
    }

    #[test]
    fn unit_must_be_on_same_line() {
        let out = bundled("TSH 2.5\nmg/dL");
        assert_eq!(out.matches[0].raw_unit_text, None);
    }

    #[test]
    fn trailing_punctuation_trimmed_from_value() {
        let out = bundled("TSH: 2.5, Hemoglobin 13.");
        assert_eq!(out.matches[0].raw_value_text, "2.5");
        assert_eq!(out.matches[1].raw_value_text, "13");
    }

    #[test]
    fn positions_are_char_offsets_in_order() {
        let text = "Résumé µ\nTSH 2.5\nHemoglobin 13.2\nTSH 3.1";
        let out = bundled(text);
        let positions: Vec<usize> = out.matches.iter().map(|m| m.position).collect();
        // "Résumé µ\n" is 9 chars but 12 bytes.
        assert_eq!(text.find("TSH"), Some(12));
        assert_eq!(positions, vec![9, 17, 33]);
        assert_eq!(keys(&out), vec!["tsh", "hemoglobin", "tsh"]);
    }

    #[test]
    fn grouped_thousands_kept_in_token() {
        let out = bundled("Platelets 2,50,000 /cumm");
        assert_eq!(out.matches[0].raw_value_text, "2,50,000");
    }

    #[test]
    fn ordinal_and_hyphenated_label_numbers_skipped() {
        let out = bundled("TSH (3rd Generation) 2.5 uIU/mL");
        assert_eq!(out.matches[0].raw_value_text, "2.5");
        assert_eq!(out.matches[0].raw_unit_text.as_deref(), Some("uIU/mL"));

        let out = bundled("Vitamin D, 25-Hydroxy 18.4 ng/mL");
        assert_eq!(keys(&out), vec!["vitamin_d"]);
        assert_eq!(out.matches[0].raw_value_text, "18.4");
        assert!(out.warnings.is_empty());

        // A range is still a range.
        let out = bundled("TSH 13-17");
        assert!(out.matches.is_empty());
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn unit_glued_to_value() {
        let out = bundled("Hemoglobin 13.2g/dL");
        assert_eq!(out.matches[0].raw_value_text, "13.2");
        assert_eq!(out.matches[0].raw_unit_text.as_deref(), Some("g/dL"));
    }

    #[test]
    fn unknown_unit_text_is_passed_on() {
        let out = bundled("Hemoglobin 13.2 gms");
        assert_eq!(out.matches[0].raw_unit_text.as_deref(), Some("gms"));

        let out = bundled("Hemoglobin 13.2 xyz/abc 13.0 - 17.0");
        assert_eq!(out.matches[0].raw_unit_text.as_deref(), Some("xyz/abc"));
    }

    #[test]
    fn flags_and_trailing_words_are_not_units() {
        let out = bundled("TSH 7.9 High\nHemoglobin 10.2 L 13.0-17.0\nCreatinine 1.1 fasting sample");
        let units: Vec<_> = out.matches.iter().map(|m| m.raw_unit_text.as_deref()).collect();
        assert_eq!(units, vec![None, None, None]);
    }

    #[test]
    fn thousand_and_lakh_count_units() {
        let out = bundled("Total WBC Count 7.5 thou/cumm\nPlatelet Count 2.5 lakhs/cumm");
        assert_eq!(keys(&out), vec!["wbc", "platelets"]);
        assert_eq!(out.matches[0].raw_unit_text.as_deref(), Some("thou/cumm"));
        assert_eq!(out.matches[1].raw_unit_text.as_deref(), Some("lakhs/cumm"));
    }
}
