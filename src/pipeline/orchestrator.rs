use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::aggregate::aggregate;
use super::classify::classify;
use super::correction::{OffsetMap, TermCorrector};
use super::extract::extract;
use super::findings::derive_findings;
use super::normalize::normalize;
use super::patient::extract_patient_info;
use super::sanitize::sanitize_extracted_text;
use crate::catalog::{builtin, CatalogError, LoadedTables, PatternCatalog, ReferenceTable};
use crate::config::PipelineOptions;
use crate::models::{PatientInfo, PatientMetadata, PipelineWarning, Report};

/// Namespace for report ids; ids are derived from the input, not random.
const REPORT_ID_NAMESPACE: Uuid = Uuid::from_u128(0x6d65_6472_6570_4f52_a7e1_0c3b_5f2d_9e41);

/// One report to analyze: text plus caller-supplied metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportInput {
    pub text: String,
    #[serde(default)]
    pub metadata: PatientMetadata,
}

/// Text-to-report pipeline over shared, read-only tables.
/// Cheap to clone; safe to use from many threads at once.
#[derive(Debug, Clone)]
pub struct ReportPipeline {
    catalog: Arc<PatternCatalog>,
    table: Arc<ReferenceTable>,
    corrector: Arc<TermCorrector>,
    options: PipelineOptions,
}

impl ReportPipeline {
    pub fn new(
        catalog: Arc<PatternCatalog>,
        table: Arc<ReferenceTable>,
        options: PipelineOptions,
    ) -> Self {
        let corrector = Arc::new(TermCorrector::from_catalog(&catalog));
        Self {
            catalog,
            table,
            corrector,
            options,
        }
    }

    /// Pipeline over the bundled tables with default options.
    pub fn bundled() -> Result<Self, CatalogError> {
        Ok(Self::new(
            Arc::new(builtin::catalog()?),
            Arc::new(builtin::reference_table()?),
            PipelineOptions::default(),
        ))
    }

    pub fn from_tables(tables: LoadedTables, options: PipelineOptions) -> Self {
        Self::new(Arc::new(tables.catalog), Arc::new(tables.reference), options)
    }

    pub fn catalog(&self) -> &PatternCatalog {
        &self.catalog
    }

    pub fn reference_table(&self) -> &ReferenceTable {
        &self.table
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Analyze one report. Never fails: every per-report anomaly ends up
    /// in `Report::warnings` or as an `unclassifiable` result.
    pub fn analyze(&self, text: &str, metadata: &PatientMetadata) -> Report {
        let report_id = report_id(text, metadata);
        let sanitized = sanitize_extracted_text(text);

        let patient = if self.options.extract_patient_info {
            extract_patient_info(&sanitized)
        } else {
            PatientInfo::default()
        }
        .with_metadata(metadata);

        let (scan_text, offsets) = if self.options.ocr_correction {
            self.corrector.correct_mapped(&sanitized)
        } else {
            (sanitized, OffsetMap::default())
        };

        let mut extraction = extract(&scan_text, &self.catalog, self.options.adjacency_window);
        // Positions refer to the sanitized text, not the corrected one.
        if !offsets.is_identity() {
            for m in &mut extraction.matches {
                m.position = offsets.original(m.position);
            }
            for w in &mut extraction.warnings {
                if let PipelineWarning::RejectedValue { position, .. } = w {
                    *position = offsets.original(*position);
                }
            }
        }
        let normalized = normalize(&extraction.matches, &self.catalog);

        let mut warnings = extraction.warnings;
        warnings.extend(normalized.warnings);

        let mut results = normalized.results;
        let max = self.options.max_results;
        if max > 0 && results.len() > max {
            warnings.push(PipelineWarning::ResultsCapped {
                found: results.len(),
                kept: max,
            });
            results.truncate(max);
        }

        let classified = classify(results, &self.table, &patient.metadata());
        let findings = derive_findings(&classified, &patient);
        let report = aggregate(classified, &self.catalog);

        tracing::info!(
            report_id = %report_id,
            match_count = extraction.matches.len(),
            result_count = report.classified_results.len(),
            flagged = report.flagged.len(),
            warning_count = warnings.len(),
            "Report analyzed"
        );
        if !warnings.is_empty() {
            tracing::warn!(report_id = %report_id, warning_count = warnings.len(), "Report has warnings");
        }

        Report {
            report_id,
            patient,
            findings,
            warnings,
            ..report
        }
    }

    /// Analyze independent reports in parallel. Output order matches input.
    pub fn analyze_batch(&self, inputs: &[ReportInput]) -> Vec<Report> {
        tracing::info!(reports = inputs.len(), "Starting batch analysis");
        inputs
            .par_iter()
            .map(|input| self.analyze(&input.text, &input.metadata))
            .collect()
    }
}

/// Deterministic id: identical text and metadata give identical ids.
fn report_id(text: &str, metadata: &PatientMetadata) -> Uuid {
    let age = metadata.age.map(|a| a.to_string()).unwrap_or_default();
    let name = format!("{}\u{0}{}\u{0}{}", metadata.sex, age, text);
    Uuid::new_v5(&REPORT_ID_NAMESPACE, name.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ResultStatus, Sex};

    const SAMPLE: &str = "\
Name : Test Patient
Age : 52 Years
Sex : Male
HAEMOGLOBIN 11.8 gm%
MCV 72 fL
Total Cholesterol 248 mg/dL
LDL Cholesterol 182 mg/dL
HbA1c 6.1 %
PSA 5.2 ng/mL
";

    fn pipeline() -> ReportPipeline {
        ReportPipeline::bundled().unwrap()
    }

    #[test]
    fn end_to_end_sample() {
        let report = pipeline().analyze(SAMPLE, &PatientMetadata::default());

        assert_eq!(report.patient.sex, Sex::Male);
        assert_eq!(report.patient.age, Some(52));
        assert_eq!(report.classified_results.len(), 6);

        let hb = report.result("hemoglobin").unwrap();
        assert_eq!(hb.status, ResultStatus::AbnormalLow);
        assert_eq!(report.result("hba1c").unwrap().status, ResultStatus::BorderlineHigh);
        assert_eq!(report.result("ldl").unwrap().status, ResultStatus::AbnormalHigh);
        assert_eq!(report.result("psa").unwrap().status, ResultStatus::AbnormalHigh);

        assert!(report.findings.risk_factors.iter().any(|r| r.starts_with("Microcytic")));
        assert!(report.findings.risk_factors.iter().any(|r| r == "Prediabetes"));
        assert!(report.findings.risk_factors.iter().any(|r| r.contains("PSA")));
        assert!(report
            .findings
            .recommendations
            .iter()
            .any(|r| r.contains("cardiologist")));
    }

    #[test]
    fn caller_metadata_wins_over_text() {
        let report = pipeline().analyze(SAMPLE, &PatientMetadata::new(Sex::Female, Some(30)));
        assert_eq!(report.patient.sex, Sex::Female);
        assert_eq!(report.patient.age, Some(30));
        // PSA bands are male-only.
        assert_eq!(report.result("psa").unwrap().status, ResultStatus::Unclassifiable);
    }

    #[test]
    fn ocr_noise_corrected_before_extraction() {
        let p = pipeline();
        let report = p.analyze("Creatiniue 2.1 mg/dL", &PatientMetadata::default());
        assert_eq!(report.result("creatinine").unwrap().status, ResultStatus::AbnormalHigh);

        let strict = ReportPipeline::new(
            Arc::clone(&p.catalog),
            Arc::clone(&p.table),
            PipelineOptions {
                ocr_correction: false,
                ..PipelineOptions::default()
            },
        );
        assert!(strict
            .analyze("Creatiniue 2.1 mg/dL", &PatientMetadata::default())
            .classified_results
            .is_empty());
    }

    #[test]
    fn positions_refer_to_sanitized_text() {
        let text = "Hemoglobn 12.1 g/dL\nTSH 2.5";
        let report = pipeline().analyze(text, &PatientMetadata::default());
        let hb = report.result("hemoglobin").unwrap();
        assert_eq!(hb.test_result.position, 0);
        let tsh = report.result("tsh").unwrap();
        assert_eq!(tsh.test_result.position, text.find("TSH").unwrap());
    }

    #[test]
    fn creatine_kinase_does_not_become_creatinine() {
        let p = pipeline();
        let report = p.analyze(
            "Serum Creatinine 1.0 mg/dL\nCreatine Kinase 150 U/L",
            &PatientMetadata::default(),
        );
        let creatinine = report.result("creatinine").unwrap();
        assert_eq!(creatinine.test_result.value, 1.0);
        assert_eq!(creatinine.status, ResultStatus::Normal);
        assert!(!report
            .warnings
            .iter()
            .any(|w| matches!(w, PipelineWarning::ConflictingDuplicate { .. })));

        let alone = p.analyze("Creatine Kinase 150", &PatientMetadata::default());
        assert!(alone.result("creatinine").is_none());
        assert!(!alone.findings.risk_factors.iter().any(|r| r.contains("creatinine")));
    }

    #[test]
    fn results_capped_with_warning() {
        let p = ReportPipeline::new(
            Arc::new(builtin::catalog().unwrap()),
            Arc::new(builtin::reference_table().unwrap()),
            PipelineOptions {
                max_results: 2,
                ..PipelineOptions::default()
            },
        );
        let report = p.analyze("TSH 2.1\nHemoglobin 14\nMCV 90", &PatientMetadata::default());
        assert_eq!(report.classified_results.len(), 2);
        assert!(report
            .warnings
            .iter()
            .any(|w| matches!(w, PipelineWarning::ResultsCapped { found: 3, kept: 2 })));
    }

    #[test]
    fn report_id_is_deterministic() {
        let meta = PatientMetadata::new(Sex::Male, Some(40));
        assert_eq!(report_id("TSH 2.1", &meta), report_id("TSH 2.1", &meta));
        assert_ne!(report_id("TSH 2.1", &meta), report_id("TSH 2.2", &meta));
        assert_ne!(
            report_id("TSH 2.1", &meta),
            report_id("TSH 2.1", &PatientMetadata::default())
        );
    }

    #[test]
    fn adversarial_text_still_yields_report() {
        let p = pipeline();
        for text in ["", "\x00\x01", "::::////----", "Hb Hb Hb Hb", "1 2 3 4 5"] {
            let report = p.analyze(text, &PatientMetadata::default());
            assert_eq!(report.totals().abnormal, 0);
        }
    }
}
