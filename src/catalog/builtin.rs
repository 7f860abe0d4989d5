//! Bundled default tables.
//!
//! Ranges follow common Indian laboratory references. Sites with their own
//! references override these through `pattern_catalog.json` and
//! `reference_ranges.json` (see `loader`).

use super::pattern::{PatternCatalog, PatternRule};
use super::reference::{Applicability, RangeBand, ReferenceTable, ReferenceTableData, UnitConversion};
use super::CatalogError;
use crate::models::Sex;

pub const HEMATOLOGY: &str = "Hematology";
pub const LIPID_PROFILE: &str = "Lipid Profile";
pub const KIDNEY_FUNCTION: &str = "Kidney Function";
pub const LIVER_FUNCTION: &str = "Liver Function";
pub const THYROID_FUNCTION: &str = "Thyroid Function";
pub const CANCER_MARKERS: &str = "Cancer Markers";
pub const VITAMINS: &str = "Vitamins";
pub const DIABETES_MARKERS: &str = "Diabetes Markers";
pub const CARDIAC: &str = "Cardiac";

fn rule(
    test_key: &str,
    display_name: &str,
    category: &str,
    aliases: &[&str],
    expected_unit: Option<&str>,
    plausible_range: (f64, f64),
) -> PatternRule {
    PatternRule {
        test_key: test_key.into(),
        display_name: display_name.into(),
        category: category.into(),
        aliases: aliases.iter().map(|a| a.to_string()).collect(),
        expected_unit: expected_unit.map(String::from),
        window: None,
        plausible_range: Some(plausible_range),
    }
}

pub fn pattern_rules() -> Vec<PatternRule> {
    vec![
        // Hematology
        rule("hemoglobin", "Hemoglobin", HEMATOLOGY,
            &["Hemoglobin", "Haemoglobin", "Hgb", "Hb"], Some("g/dL"), (1.0, 25.0)),
        rule("rbc", "RBC Count", HEMATOLOGY,
            &["RBC", "R.B.C.", "RBC Count", "Red Blood Cell Count", "Red Cell Count", "Erythrocytes"],
            Some("10^6/µL"), (0.5, 10.0)),
        rule("hematocrit", "Hematocrit (PCV)", HEMATOLOGY,
            &["Hematocrit", "Haematocrit", "Hct", "PCV", "P.C.V", "Packed Cell Volume"],
            Some("%"), (5.0, 75.0)),
        rule("mcv", "MCV", HEMATOLOGY,
            &["MCV", "M.C.V", "Mean Corpuscular Volume"], Some("fL"), (40.0, 150.0)),
        rule("mch", "MCH", HEMATOLOGY,
            &["MCH", "M.C.H", "Mean Corpuscular Hemoglobin"], Some("pg"), (10.0, 50.0)),
        rule("mchc", "MCHC", HEMATOLOGY,
            &["MCHC", "M.C.H.C", "Mean Corpuscular Hemoglobin Concentration"],
            Some("g/dL"), (20.0, 45.0)),
        rule("wbc", "Total WBC Count", HEMATOLOGY,
            &["WBC", "W.B.C.", "Total W.B.C. Count", "Total WBC Count", "WBC Count",
              "Total Leucocyte Count", "TLC", "White Blood Cell Count", "Leukocytes"],
            Some("/µL"), (100.0, 500_000.0)),
        rule("neutrophils", "Neutrophils", HEMATOLOGY,
            &["Neutrophils", "Neutrophil", "Polymorphs"], Some("%"), (0.0, 100.0)),
        rule("eosinophils", "Eosinophils", HEMATOLOGY,
            &["Eosinophils", "Eosinophil"], Some("%"), (0.0, 100.0)),
        rule("basophils", "Basophils", HEMATOLOGY,
            &["Basophils", "Basophil"], Some("%"), (0.0, 100.0)),
        rule("lymphocytes", "Lymphocytes", HEMATOLOGY,
            &["Lymphocytes", "Lymphocyte"], Some("%"), (0.0, 100.0)),
        rule("monocytes", "Monocytes", HEMATOLOGY,
            &["Monocytes", "Monocyte"], Some("%"), (0.0, 100.0)),
        rule("platelets", "Platelet Count", HEMATOLOGY,
            &["Platelets", "Platelet Count", "Platelets Count", "PLT", "Thrombocytes"],
            Some("/µL"), (1_000.0, 2_000_000.0)),
        // Lipid profile
        rule("cholesterol_total", "Total Cholesterol", LIPID_PROFILE,
            &["Total Cholesterol", "Cholesterol Total", "Cholesterol, Total", "Serum Cholesterol", "Cholesterol"],
            Some("mg/dL"), (20.0, 1000.0)),
        rule("triglycerides", "Triglycerides", LIPID_PROFILE,
            &["Triglycerides", "Serum Triglycerides", "TG"], Some("mg/dL"), (5.0, 5000.0)),
        rule("hdl", "HDL Cholesterol", LIPID_PROFILE,
            &["HDL Cholesterol", "Cholesterol - HDL", "HDL-C", "HDL"], Some("mg/dL"), (5.0, 200.0)),
        rule("ldl", "LDL Cholesterol", LIPID_PROFILE,
            &["LDL Cholesterol", "Cholesterol - LDL", "LDL-C", "LDL"], Some("mg/dL"), (5.0, 600.0)),
        rule("vldl", "VLDL Cholesterol", LIPID_PROFILE,
            &["VLDL Cholesterol", "Cholesterol - VLDL", "VLDL"], Some("mg/dL"), (1.0, 300.0)),
        rule("cho_hdl_ratio", "Cholesterol/HDL Ratio", LIPID_PROFILE,
            &["CHO/HDL Ratio", "Cholesterol/HDL Ratio", "Total Cholesterol/HDL Ratio", "TC/HDL Ratio"],
            None, (0.5, 30.0)),
        rule("ldl_hdl_ratio", "LDL/HDL Ratio", LIPID_PROFILE,
            &["LDL/HDL Ratio"], None, (0.1, 20.0)),
        // Kidney function
        rule("creatinine", "Serum Creatinine", KIDNEY_FUNCTION,
            &["S.Creatinine", "Serum Creatinine", "Creatinine"], Some("mg/dL"), (0.05, 25.0)),
        // Liver function
        rule("alkaline_phosphatase", "Alkaline Phosphatase", LIVER_FUNCTION,
            &["Alkaline Phosphatase", "Alkaline Phosphate", "ALP"], Some("U/L"), (0.0, 5000.0)),
        rule("sgpt", "SGPT (ALT)", LIVER_FUNCTION,
            &["SGPT", "S.G.P.T", "ALT", "Alanine Aminotransferase"], Some("U/L"), (0.0, 10_000.0)),
        // Thyroid
        rule("tsh", "TSH", THYROID_FUNCTION,
            &["TSH", "Thyroid Stimulating Hormone"], Some("mIU/L"), (0.01, 200.0)),
        // Cancer markers
        rule("psa", "PSA", CANCER_MARKERS,
            &["PSA", "PSA - Prostate Specific Antigen", "Prostate Specific Antigen"],
            Some("ng/mL"), (0.0, 10_000.0)),
        // Vitamins
        rule("vitamin_b12", "Vitamin B12", VITAMINS,
            &["Vitamin B12", "Vit B12", "Vit. B12", "Cobalamin"], Some("pg/mL"), (0.0, 5000.0)),
        rule("vitamin_d", "Vitamin D3 (25-OH)", VITAMINS,
            &["Vitamin D3", "Vitamin D", "Vit D3", "Vit. D", "25-OH Vitamin D"], Some("ng/mL"), (0.0, 200.0)),
        // Diabetes
        rule("hba1c", "HbA1c", DIABETES_MARKERS,
            &["HbA1c", "Glycosylated HbA1c", "Glycated Hemoglobin", "Glycosylated Hemoglobin", "Hemoglobin A1c"],
            Some("%"), (2.0, 20.0)),
        // Cardiac
        rule("heart_rate", "Heart Rate", CARDIAC,
            &["Heart Rate", "Pulse Rate", "Ventricular Rate"], Some("bpm"), (20.0, 300.0)),
    ]
}

struct BandSpec<'a> {
    test_key: &'a str,
    applicability: Applicability,
    bounds: [Option<f64>; 4],
    unit: Option<&'a str>,
    low_concern: &'a str,
    high_concern: &'a str,
}

impl BandSpec<'_> {
    fn build(self) -> RangeBand {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        RangeBand {
            test_key: self.test_key.into(),
            applicability: self.applicability,
            low_abnormal: self.bounds[0],
            low_borderline: self.bounds[1],
            high_borderline: self.bounds[2],
            high_abnormal: self.bounds[3],
            unit: self.unit.map(String::from),
            low_concern: non_empty(self.low_concern),
            high_concern: non_empty(self.high_concern),
        }
    }
}

/// Band with only a normal interval: below `low` is abnormal-low, above
/// `high` is abnormal-high.
fn simple(
    test_key: &str,
    applicability: Applicability,
    low: Option<f64>,
    high: Option<f64>,
    unit: Option<&str>,
    low_concern: &str,
    high_concern: &str,
) -> RangeBand {
    BandSpec {
        test_key,
        applicability,
        bounds: [low, low, high, high],
        unit,
        low_concern,
        high_concern,
    }
    .build()
}

fn tiered(
    test_key: &str,
    bounds: [Option<f64>; 4],
    unit: &str,
    low_concern: &str,
    high_concern: &str,
) -> RangeBand {
    BandSpec {
        test_key,
        applicability: Applicability::any(),
        bounds,
        unit: Some(unit),
        low_concern,
        high_concern,
    }
    .build()
}

pub fn range_bands() -> Vec<RangeBand> {
    let any = Applicability::any();
    let male = Applicability::for_sex(Sex::Male);
    let female = Applicability::for_sex(Sex::Female);
    // Paediatric bands carry the sex too when known, so they outrank the
    // sex-only adult bands.
    let child = |sex: Option<Sex>| Applicability {
        sex,
        min_age: Some(1),
        max_age: Some(12),
    };

    vec![
        simple("hemoglobin", male, Some(13.0), Some(16.5), Some("g/dL"),
            "Anemia possible", "Polycythemia possible"),
        simple("hemoglobin", female, Some(12.0), Some(15.5), Some("g/dL"),
            "Anemia possible", "Polycythemia possible"),
        simple("hemoglobin", child(Some(Sex::Male)), Some(11.0), Some(14.5), Some("g/dL"),
            "Anemia possible", "Polycythemia possible"),
        simple("hemoglobin", child(Some(Sex::Female)), Some(11.0), Some(14.5), Some("g/dL"),
            "Anemia possible", "Polycythemia possible"),
        simple("hemoglobin", child(None), Some(11.0), Some(14.5), Some("g/dL"),
            "Anemia possible", "Polycythemia possible"),
        simple("hemoglobin", any, Some(12.0), Some(16.5), Some("g/dL"),
            "Anemia possible", "Polycythemia possible"),
        simple("rbc", male, Some(4.2), Some(5.4), Some("10^6/µL"),
            "Low RBC count", "Elevated RBC count"),
        simple("rbc", female, Some(3.6), Some(5.0), Some("10^6/µL"),
            "Low RBC count", "Elevated RBC count"),
        simple("rbc", any, Some(3.6), Some(5.4), Some("10^6/µL"),
            "Low RBC count", "Elevated RBC count"),
        simple("hematocrit", male, Some(38.0), Some(42.0), Some("%"),
            "Low hematocrit", "Elevated hematocrit"),
        simple("hematocrit", female, Some(36.0), Some(40.0), Some("%"),
            "Low hematocrit", "Elevated hematocrit"),
        simple("hematocrit", any, Some(36.0), Some(42.0), Some("%"),
            "Low hematocrit", "Elevated hematocrit"),
        simple("mcv", any, Some(78.0), Some(100.0), Some("fL"),
            "Microcytic anemia possible", "Macrocytic anemia possible"),
        simple("mch", any, Some(27.0), Some(31.0), Some("pg"),
            "Hypochromic anemia possible", "Hyperchromic anemia possible"),
        simple("mchc", any, Some(32.0), Some(36.0), Some("g/dL"),
            "Decreased hemoglobin concentration", "Increased hemoglobin concentration"),
        simple("wbc", any, Some(4500.0), Some(10_000.0), Some("/µL"),
            "Leukopenia - impaired immune response",
            "Leukocytosis - infection or inflammation possible"),
        simple("neutrophils", any, Some(40.0), Some(75.0), Some("%"),
            "Neutropenia", "Neutrophilia - bacterial infection possible"),
        simple("eosinophils", any, Some(0.0), Some(6.0), Some("%"),
            "", "Eosinophilia - allergy or parasitic infection possible"),
        simple("basophils", any, Some(0.0), Some(1.0), Some("%"),
            "", "Basophilia - inflammatory or allergic reaction possible"),
        simple("lymphocytes", any, Some(20.0), Some(45.0), Some("%"),
            "Lymphopenia", "Lymphocytosis - viral infection possible"),
        simple("monocytes", any, Some(2.0), Some(10.0), Some("%"),
            "", "Monocytosis - chronic inflammation possible"),
        simple("platelets", any, Some(140_000.0), Some(450_000.0), Some("/µL"),
            "Thrombocytopenia - bleeding risk", "Thrombocytosis - clotting risk"),
        tiered("cholesterol_total", [Some(70.0), Some(70.0), Some(200.0), Some(240.0)], "mg/dL",
            "", "Hypercholesterolemia - increased cardiovascular risk"),
        tiered("triglycerides", [Some(40.0), Some(40.0), Some(150.0), Some(200.0)], "mg/dL",
            "", "Hypertriglyceridemia - increased cardiovascular risk"),
        simple("hdl", any, Some(35.0), Some(120.0), Some("mg/dL"),
            "Low HDL - increased cardiovascular risk", ""),
        tiered("ldl", [None, None, Some(100.0), Some(130.0)], "mg/dL",
            "", "Elevated LDL - increased cardiovascular risk"),
        simple("vldl", any, Some(5.0), Some(35.0), Some("mg/dL"),
            "", "Elevated VLDL - increased cardiovascular risk"),
        simple("cho_hdl_ratio", any, Some(3.0), Some(5.0), None,
            "", "Elevated ratio - increased cardiovascular risk"),
        simple("ldl_hdl_ratio", any, Some(2.5), Some(3.5), None,
            "", "Elevated ratio - increased cardiovascular risk"),
        simple("creatinine", male, Some(0.7), Some(1.3), Some("mg/dL"),
            "", "Elevated creatinine - possible kidney dysfunction"),
        simple("creatinine", female, Some(0.6), Some(1.1), Some("mg/dL"),
            "", "Elevated creatinine - possible kidney dysfunction"),
        simple("creatinine", any, Some(0.6), Some(1.3), Some("mg/dL"),
            "", "Elevated creatinine - possible kidney dysfunction"),
        simple("alkaline_phosphatase", any, Some(15.0), Some(112.0), Some("U/L"),
            "", "Elevated ALP - possible liver or bone disorder"),
        simple("sgpt", any, Some(0.0), Some(45.0), Some("U/L"),
            "", "Elevated SGPT - possible liver damage"),
        simple("tsh", any, Some(0.39), Some(6.11), Some("mIU/L"),
            "Low TSH - possible hyperthyroidism", "Elevated TSH - possible hypothyroidism"),
        simple("psa", male, Some(0.0), Some(4.0), Some("ng/mL"),
            "", "Elevated PSA - prostate abnormality possible, including cancer"),
        simple("vitamin_b12", any, Some(200.0), Some(900.0), Some("pg/mL"),
            "B12 deficiency - neurological issues possible", "Elevated B12 levels"),
        tiered("vitamin_d", [Some(20.0), Some(30.0), Some(80.0), Some(80.0)], "ng/mL",
            "Vitamin D deficiency - bone health risk", "Vitamin D excess - hypercalcemia risk"),
        tiered("hba1c", [None, None, Some(5.7), Some(6.5)], "%",
            "", "Elevated HbA1c - diabetes or prediabetes"),
        simple("heart_rate", any, Some(60.0), Some(100.0), Some("bpm"),
            "Bradycardia", "Tachycardia"),
    ]
}

fn conversion(test_key: Option<&str>, from: &str, to: &str, factor: f64) -> UnitConversion {
    UnitConversion {
        test_key: test_key.map(String::from),
        from: from.into(),
        to: to.into(),
        factor,
    }
}

pub fn unit_conversions() -> Vec<UnitConversion> {
    const LIPID_MMOL_TO_MG: f64 = 38.67;
    vec![
        conversion(None, "g/L", "g/dL", 0.1),
        conversion(None, "mg/L", "mg/dL", 0.1),
        conversion(None, "/µL", "10^3/µL", 0.001),
        conversion(None, "lakh/µL", "/µL", 100_000.0),
        conversion(None, "lakh/µL", "10^3/µL", 100.0),
        conversion(Some("mchc"), "%", "g/dL", 1.0),
        conversion(Some("cholesterol_total"), "mmol/L", "mg/dL", LIPID_MMOL_TO_MG),
        conversion(Some("hdl"), "mmol/L", "mg/dL", LIPID_MMOL_TO_MG),
        conversion(Some("ldl"), "mmol/L", "mg/dL", LIPID_MMOL_TO_MG),
        conversion(Some("vldl"), "mmol/L", "mg/dL", LIPID_MMOL_TO_MG),
        conversion(Some("triglycerides"), "mmol/L", "mg/dL", 88.57),
        conversion(Some("creatinine"), "µmol/L", "mg/dL", 1.0 / 88.4),
        conversion(Some("vitamin_d"), "nmol/L", "ng/mL", 0.4),
        conversion(Some("vitamin_b12"), "pmol/L", "pg/mL", 1.355),
    ]
}

pub fn reference_data() -> ReferenceTableData {
    ReferenceTableData {
        bands: range_bands(),
        conversions: unit_conversions(),
    }
}

pub fn catalog() -> Result<PatternCatalog, CatalogError> {
    PatternCatalog::new(pattern_rules())
}

pub fn reference_table() -> Result<ReferenceTable, CatalogError> {
    ReferenceTable::from_data(reference_data())
}
