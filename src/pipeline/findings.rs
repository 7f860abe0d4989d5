//! Risk factors and follow-up recommendations.
//!
//! A fixed rule list over the classified results. Each rule reads the
//! status of one or more tests and contributes a risk factor plus the
//! recommendations that go with it.

use std::collections::HashMap;

use crate::models::{ClassifiedResult, ClinicalFindings, PatientInfo, ResultStatus, Sex};

/// LDL above this (mg/dL) warrants a specialist referral.
const LDL_VERY_HIGH: f64 = 170.0;

const LIFESTYLE: &str = "Lifestyle modifications recommended; consider dietary changes and exercise";
const THYROID_PROFILE: &str = "Consider thyroid profile (T3, T4)";

#[derive(Default)]
struct FindingsBuilder {
    risk_factors: Vec<String>,
    recommendations: Vec<String>,
}

impl FindingsBuilder {
    fn add(&mut self, risk: &str, recommendations: &[&str]) {
        self.risk_factors.push(risk.to_string());
        for rec in recommendations {
            self.add_recommendation(rec);
        }
    }

    /// Recommendations keep their first occurrence only.
    fn add_recommendation(&mut self, rec: &str) {
        if !self.recommendations.iter().any(|r| r == rec) {
            self.recommendations.push(rec.to_string());
        }
    }

    fn finish(mut self) -> ClinicalFindings {
        if self.risk_factors.is_empty() {
            self.add(
                "No significant risk factors identified",
                &["Routine follow-up as per age and gender appropriate guidelines"],
            );
        }
        ClinicalFindings {
            risk_factors: self.risk_factors,
            recommendations: self.recommendations,
        }
    }
}

pub fn derive_findings(results: &[ClassifiedResult], patient: &PatientInfo) -> ClinicalFindings {
    let by_key: HashMap<&str, &ClassifiedResult> =
        results.iter().map(|r| (r.test_key(), r)).collect();
    let status = |key: &str| by_key.get(key).map(|r| r.status);
    let is = |key: &str, wanted: ResultStatus| status(key) == Some(wanted);

    let mut f = FindingsBuilder::default();

    // Anemia, typed by red cell size
    if is("hemoglobin", ResultStatus::AbnormalLow) {
        match status("mcv") {
            Some(ResultStatus::AbnormalLow) => f.add(
                "Microcytic anemia possible - consider iron deficiency",
                &["Further investigation for iron deficiency anemia recommended"],
            ),
            Some(ResultStatus::AbnormalHigh) => f.add(
                "Macrocytic anemia possible - consider B12/folate deficiency",
                &["Further investigation for vitamin B12 or folate deficiency recommended"],
            ),
            Some(_) => f.add("Normocytic anemia possible", &[]),
            // No MCV: only the band concern applies.
            None => {}
        }
    }

    if is("wbc", ResultStatus::AbnormalHigh) {
        f.add(
            "Elevated white blood cell count - possible infection or inflammation",
            &["Monitor for signs of infection or inflammatory conditions"],
        );
    }

    // Cardiovascular
    let dyslipidemia = is("cholesterol_total", ResultStatus::AbnormalHigh)
        || is("ldl", ResultStatus::AbnormalHigh)
        || is("hdl", ResultStatus::AbnormalLow)
        || is("triglycerides", ResultStatus::AbnormalHigh);
    if dyslipidemia {
        f.add("Dyslipidemia - increased cardiovascular risk", &[LIFESTYLE]);
        let ldl_very_high = by_key
            .get("ldl")
            .and_then(|r| r.compared_value)
            .is_some_and(|v| v > LDL_VERY_HIGH);
        if ldl_very_high {
            f.add_recommendation("Consider consultation with cardiologist for lipid management");
        }
    }

    match status("hba1c") {
        Some(ResultStatus::BorderlineHigh) => f.add(
            "Prediabetes",
            &[LIFESTYLE, "Follow-up HbA1c test in 3-6 months"],
        ),
        Some(ResultStatus::AbnormalHigh) => f.add(
            "Diabetes mellitus",
            &[
                "Consultation with endocrinologist recommended",
                "Regular blood glucose monitoring",
            ],
        ),
        _ => {}
    }

    if patient.sex == Sex::Male && is("psa", ResultStatus::AbnormalHigh) {
        f.add(
            "Elevated PSA - prostate abnormality possible",
            &["Urologist consultation recommended"],
        );
    }

    // Vitamins
    match status("vitamin_d") {
        Some(ResultStatus::AbnormalLow) => f.add(
            "Severe Vitamin D deficiency",
            &["Vitamin D supplementation recommended"],
        ),
        Some(ResultStatus::BorderlineLow) => f.add(
            "Vitamin D insufficiency",
            &["Consider Vitamin D supplementation"],
        ),
        _ => {}
    }
    if is("vitamin_b12", ResultStatus::AbnormalLow) {
        f.add(
            "Vitamin B12 deficiency",
            &["Vitamin B12 supplementation recommended"],
        );
    }

    if is("creatinine", ResultStatus::AbnormalHigh) {
        f.add(
            "Elevated creatinine - possible kidney dysfunction",
            &["Follow-up kidney function tests recommended"],
        );
    }

    if is("sgpt", ResultStatus::AbnormalHigh) || is("alkaline_phosphatase", ResultStatus::AbnormalHigh) {
        f.add(
            "Possible liver function abnormalities",
            &["Follow-up liver function tests recommended"],
        );
    }

    match status("tsh") {
        Some(ResultStatus::AbnormalHigh) => {
            f.add("Elevated TSH - possible hypothyroidism", &[THYROID_PROFILE])
        }
        Some(ResultStatus::AbnormalLow) => {
            f.add("Low TSH - possible hyperthyroidism", &[THYROID_PROFILE])
        }
        _ => {}
    }

    f.finish()
}
