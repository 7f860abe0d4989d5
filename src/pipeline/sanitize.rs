/// Sanitize extracted report text before pattern matching.
/// Removes control and stray symbol characters, trims each line and drops
/// blank lines. Medical punctuation and unit symbols are preserved.
pub fn sanitize_extracted_text(raw: &str) -> String {
    raw.chars()
        .filter(|c| {
            c.is_alphanumeric()
                || c.is_whitespace()
                || matches!(
                    c,
                    '.' | ','
                        | ';'
                        | ':'
                        | '-'
                        | '/'
                        | '('
                        | ')'
                        | '['
                        | ']'
                        | '+'
                        | '='
                        | '%'
                        | '#'
                        | '&'
                        | '\''
                        | '"'
                        | '<'
                        | '>'
                        | '*'
                        | '_'
                        | '^'
                        | '×'
                        | '°'
                        | '²'
                        | '³'
                        | 'µ'
                        | 'μ'
                        | '\u{2013}' // En-dash
                )
        })
        .collect::<String>()
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_control_characters() {
        let raw = "Hemoglobin\x00: 13.2\x01\x02 g/dL\nDate: 12-03-2024";
        let clean = sanitize_extracted_text(raw);
        assert!(!clean.contains('\x00'));
        assert!(!clean.contains('\x01'));
        assert!(clean.contains("13.2 g/dL"));
        assert!(clean.contains("12-03-2024"));
    }

    #[test]
    fn preserves_unit_symbols() {
        let raw = "RBC 4.8 x10^6/µL, Creatinine 88 μmol/L, Temp 37.5°C";
        let clean = sanitize_extracted_text(raw);
        assert!(clean.contains("x10^6/µL"));
        assert!(clean.contains("88 μmol/L"));
        assert!(clean.contains("37.5°C"));
    }

    #[test]
    fn collapses_blank_lines_and_trims() {
        let raw = "  Hemoglobin 13.2  \n\n\n   TSH 2.1\n";
        assert_eq!(sanitize_extracted_text(raw), "Hemoglobin 13.2\nTSH 2.1");
    }

    #[test]
    fn preserves_ranges() {
        let raw = "Potassium: 4.2 mmol/L (3.5-5.0)";
        assert_eq!(sanitize_extracted_text(raw), raw);
    }

    #[test]
    fn empty_and_control_only_input() {
        assert_eq!(sanitize_extracted_text(""), "");
        assert_eq!(sanitize_extracted_text("\x00\x01\x02"), "");
    }
}
