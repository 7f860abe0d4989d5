use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::models::{PatientInfo, Sex};

static RE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)\b(?:Patient\s+)?Name\s*:\s*([A-Za-z][A-Za-z .']*?)\s*(?:\s{2,}|\b(?:Age|Sex|Gender|Date|Lab)\b|$)",
    )
    .unwrap()
});
static RE_AGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bAge(?:\s*/\s*(?:Sex|Gender))?\s*:\s*(\d{1,3})\b").unwrap()
});
static RE_SEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:Sex|Gender)\s*:\s*([A-Za-z]+)").unwrap());
/// "Age/Sex : 45 Y / M"
static RE_AGE_SEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bAge\s*/\s*(?:Sex|Gender)\s*:\s*\d{1,3}\s*(?:Years|Yrs|Yr|Y)?\s*/\s*([A-Za-z]+)")
        .unwrap()
});
static RE_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\bDate\s*:\s*(\d{1,2}[-/ ][A-Za-z]{3}[-/ ]\d{4}|\d{1,2}[-/]\d{1,2}[-/]\d{4}|\d{4}-\d{2}-\d{2})",
    )
    .unwrap()
});
static RE_LAB_NO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bLab\s*(?:No|Number)\.?\s*:\s*([A-Za-z0-9][A-Za-z0-9/\-]*)").unwrap()
});

const DATE_FORMATS: &[&str] = &["%d-%b-%Y", "%d %b %Y", "%d/%b/%Y", "%d/%m/%Y", "%d-%m-%Y", "%Y-%m-%d"];
const MAX_AGE: u32 = 130;

/// Read labelled header fields (`Name :`, `Age : 45 Years`, `Sex : Male`,
/// `Date : 12-Mar-2024`, `Lab No. :`). Absent or malformed fields are
/// left empty.
pub fn extract_patient_info(text: &str) -> PatientInfo {
    let age = capture(&RE_AGE, text)
        .and_then(|a| a.parse::<u32>().ok())
        .filter(|a| *a <= MAX_AGE);
    let sex = capture(&RE_SEX, text)
        .or_else(|| capture(&RE_AGE_SEX, text))
        .map(|s| Sex::parse_loose(&s))
        .unwrap_or_default();

    PatientInfo {
        name: capture(&RE_NAME, text),
        age,
        sex,
        report_date: capture(&RE_DATE, text).and_then(|d| parse_report_date(&d)),
        lab_number: capture(&RE_LAB_NO, text),
    }
}

fn capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Parse a date in any of the formats seen on report headers.
pub fn parse_report_date(raw: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw.trim(), fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Name : MR. RAVI KUMAR\nAge : 45 Years\nSex : Male\nDate : 12-Mar-2024\nLab No. : 24/0315-A\n";

    #[test]
    fn reads_labelled_header() {
        let info = extract_patient_info(HEADER);
        assert_eq!(info.name.as_deref(), Some("MR. RAVI KUMAR"));
        assert_eq!(info.age, Some(45));
        assert_eq!(info.sex, Sex::Male);
        assert_eq!(info.report_date, NaiveDate::from_ymd_opt(2024, 3, 12));
        assert_eq!(info.lab_number.as_deref(), Some("24/0315-A"));
    }

    #[test]
    fn fields_on_one_line() {
        let info = extract_patient_info("Patient Name : Asha Rao   Age : 32 Yrs   Gender : F");
        assert_eq!(info.name.as_deref(), Some("Asha Rao"));
        assert_eq!(info.age, Some(32));
        assert_eq!(info.sex, Sex::Female);
    }

    #[test]
    fn combined_age_sex_field() {
        let info = extract_patient_info("Age/Sex : 61 Y / M");
        assert_eq!(info.age, Some(61));
        assert_eq!(info.sex, Sex::Male);
    }

    #[test]
    fn missing_fields_stay_empty() {
        let info = extract_patient_info("Hemoglobin 13.2 g/dL");
        assert_eq!(info, PatientInfo::default());
    }

    #[test]
    fn implausible_age_ignored() {
        assert_eq!(extract_patient_info("Age : 450").age, None);
    }

    #[test]
    fn date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 12);
        assert_eq!(parse_report_date("12-Mar-2024"), expected);
        assert_eq!(parse_report_date("12 MAR 2024"), expected);
        assert_eq!(parse_report_date("12/03/2024"), expected);
        assert_eq!(parse_report_date("2024-03-12"), expected);
        assert_eq!(parse_report_date("31/02/2024"), None);
    }
}
