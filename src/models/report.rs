use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{Sex, StatusTier};
use super::lab::ClassifiedResult;
use super::warning::PipelineWarning;

/// Patient metadata supplied alongside the report text by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientMetadata {
    pub sex: Sex,
    pub age: Option<u32>,
}

impl PatientMetadata {
    pub fn new(sex: Sex, age: Option<u32>) -> Self {
        Self { sex, age }
    }
}

/// Patient details as resolved for one report: caller metadata first,
/// labelled fields in the text for anything the caller left out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientInfo {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub sex: Sex,
    pub report_date: Option<NaiveDate>,
    pub lab_number: Option<String>,
}

impl PatientInfo {
    /// Overlay explicit caller metadata on top of text-derived info.
    pub fn with_metadata(mut self, metadata: &PatientMetadata) -> Self {
        if metadata.sex != Sex::Unspecified {
            self.sex = metadata.sex;
        }
        if metadata.age.is_some() {
            self.age = metadata.age;
        }
        self
    }

    pub fn metadata(&self) -> PatientMetadata {
        PatientMetadata {
            sex: self.sex,
            age: self.age,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCounts {
    pub normal: usize,
    pub borderline: usize,
    pub abnormal: usize,
    pub unclassified: usize,
}

impl CategoryCounts {
    pub fn record(&mut self, tier: StatusTier) {
        match tier {
            StatusTier::Normal => self.normal += 1,
            StatusTier::Borderline => self.borderline += 1,
            StatusTier::Abnormal => self.abnormal += 1,
            StatusTier::Unclassified => self.unclassified += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.normal + self.borderline + self.abnormal + self.unclassified
    }
}

/// Risk factors and follow-up recommendations derived from the results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClinicalFindings {
    pub risk_factors: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Structured summary of one report. Built once; not mutated afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Report {
    pub report_id: Uuid,
    pub patient: PatientInfo,
    /// In extraction order.
    pub classified_results: Vec<ClassifiedResult>,
    /// Borderline and abnormal results, in the same order.
    pub flagged: Vec<ClassifiedResult>,
    pub category_counts: BTreeMap<String, CategoryCounts>,
    pub findings: ClinicalFindings,
    pub warnings: Vec<PipelineWarning>,
}

impl Report {
    pub fn result(&self, test_key: &str) -> Option<&ClassifiedResult> {
        self.classified_results
            .iter()
            .find(|r| r.test_key() == test_key)
    }

    pub fn totals(&self) -> CategoryCounts {
        self.category_counts
            .values()
            .fold(CategoryCounts::default(), |acc, c| CategoryCounts {
                normal: acc.normal + c.normal,
                borderline: acc.borderline + c.borderline,
                abnormal: acc.abnormal + c.abnormal,
                unclassified: acc.unclassified + c.unclassified,
            })
    }
}
