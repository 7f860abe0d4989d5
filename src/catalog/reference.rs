use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::units::is_canonical;
use super::CatalogError;
use crate::models::{ResultStatus, Sex};

/// Sex/age condition under which a band is valid. Age bounds are inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Applicability {
    #[serde(default)]
    pub sex: Option<Sex>,
    #[serde(default)]
    pub min_age: Option<u32>,
    #[serde(default)]
    pub max_age: Option<u32>,
}

impl Applicability {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn for_sex(sex: Sex) -> Self {
        Self {
            sex: Some(sex),
            ..Self::default()
        }
    }

    pub fn is_age_qualified(&self) -> bool {
        self.min_age.is_some() || self.max_age.is_some()
    }

    /// A sex-qualified band never matches an unspecified sex, and an
    /// age-qualified band never matches an unknown age.
    pub fn matches(&self, sex: Sex, age: Option<u32>) -> bool {
        if let Some(required) = self.sex {
            if required != sex {
                return false;
            }
        }
        if self.is_age_qualified() {
            let Some(age) = age else {
                return false;
            };
            if self.min_age.is_some_and(|min| age < min) {
                return false;
            }
            if self.max_age.is_some_and(|max| age > max) {
                return false;
            }
        }
        true
    }

    /// sex+age = 3, sex only = 2, age only = 1, unconditional = 0.
    pub fn specificity(&self) -> u8 {
        match (self.sex.is_some(), self.is_age_qualified()) {
            (true, true) => 3,
            (true, false) => 2,
            (false, true) => 1,
            (false, false) => 0,
        }
    }
}

/// One reference-table entry. `None` bounds are unbounded on that side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeBand {
    pub test_key: String,
    #[serde(default)]
    pub applicability: Applicability,
    pub low_abnormal: Option<f64>,
    pub low_borderline: Option<f64>,
    pub high_borderline: Option<f64>,
    pub high_abnormal: Option<f64>,
    pub unit: Option<String>,
    #[serde(default)]
    pub low_concern: Option<String>,
    #[serde(default)]
    pub high_concern: Option<String>,
}

impl RangeBand {
    /// Place a value (already in this band's unit) into a status band.
    /// A value sitting exactly on a bound goes to the less severe side.
    pub fn status_of(&self, value: f64) -> ResultStatus {
        if self.low_abnormal.is_some_and(|b| value < b) {
            return ResultStatus::AbnormalLow;
        }
        if self.high_abnormal.is_some_and(|b| value > b) {
            return ResultStatus::AbnormalHigh;
        }
        if self.low_borderline.is_some_and(|b| value < b) {
            return ResultStatus::BorderlineLow;
        }
        if self.high_borderline.is_some_and(|b| value > b) {
            return ResultStatus::BorderlineHigh;
        }
        ResultStatus::Normal
    }

    /// Signed distance from the normal interval: negative below, positive
    /// above, zero inside.
    pub fn margin(&self, value: f64) -> f64 {
        if let Some(low) = self.low_borderline.or(self.low_abnormal) {
            if value < low {
                return value - low;
            }
        }
        if let Some(high) = self.high_borderline.or(self.high_abnormal) {
            if value > high {
                return value - high;
            }
        }
        0.0
    }

    pub fn concern_for(&self, status: ResultStatus) -> Option<&str> {
        let concern = if status.is_low() {
            self.low_concern.as_deref()
        } else if status.is_high() {
            self.high_concern.as_deref()
        } else {
            None
        };
        concern.filter(|c| !c.is_empty())
    }

    fn normal_low(&self) -> Option<f64> {
        self.low_borderline.or(self.low_abnormal)
    }

    fn normal_high(&self) -> Option<f64> {
        self.high_borderline.or(self.high_abnormal)
    }

    /// Human-readable range, e.g. `13-16.5 g/dL` or
    /// `<=5.7 normal; 5.7-6.5 borderline high %`.
    pub fn describe(&self) -> String {
        let normal = match (self.normal_low(), self.normal_high()) {
            (Some(l), Some(h)) => format!("{l}-{h}"),
            (Some(l), None) => format!(">={l}"),
            (None, Some(h)) => format!("<={h}"),
            (None, None) => "any".to_string(),
        };

        let mut parts = Vec::new();
        if let (Some(la), Some(lb)) = (self.low_abnormal, self.low_borderline) {
            if la < lb {
                parts.push(format!("{la}-{lb} borderline low"));
            }
        }
        if let (Some(hb), Some(ha)) = (self.high_borderline, self.high_abnormal) {
            if hb < ha {
                parts.push(format!("{hb}-{ha} borderline high"));
            }
        }

        let mut text = if parts.is_empty() {
            normal
        } else {
            format!("{normal} normal; {}", parts.join("; "))
        };
        if let Some(unit) = &self.unit {
            text.push(' ');
            text.push_str(unit);
        }
        text
    }

    fn validate(&self) -> Result<(), CatalogError> {
        let bounds = [
            self.low_abnormal,
            self.low_borderline,
            self.high_borderline,
            self.high_abnormal,
        ];
        if bounds.iter().flatten().any(|b| !b.is_finite()) {
            return Err(CatalogError::NonFiniteBound(self.test_key.clone()));
        }
        let present: Vec<f64> = bounds.iter().flatten().copied().collect();
        if present.windows(2).any(|w| w[0] > w[1]) {
            return Err(CatalogError::NonMonotonicBounds(self.test_key.clone()));
        }
        if let (Some(min), Some(max)) = (self.applicability.min_age, self.applicability.max_age) {
            if min > max {
                return Err(CatalogError::InvertedAgeRange {
                    test_key: self.test_key.clone(),
                    min,
                    max,
                });
            }
        }
        if let Some(unit) = &self.unit {
            if !is_canonical(unit) {
                return Err(CatalogError::UnknownUnit {
                    unit: unit.clone(),
                    context: format!("reference band '{}'", self.test_key),
                });
            }
        }
        Ok(())
    }
}

/// Declared conversion between two canonical units. With no `test_key` the
/// conversion applies to every test; the inverse direction is implied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitConversion {
    #[serde(default)]
    pub test_key: Option<String>,
    pub from: String,
    pub to: String,
    pub factor: f64,
}

impl UnitConversion {
    fn validate(&self) -> Result<(), CatalogError> {
        for unit in [&self.from, &self.to] {
            if !is_canonical(unit) {
                return Err(CatalogError::UnknownUnit {
                    unit: unit.clone(),
                    context: "unit conversion".into(),
                });
            }
        }
        if !self.factor.is_finite() || self.factor <= 0.0 || self.from == self.to {
            return Err(CatalogError::InvalidConversion {
                from: self.from.clone(),
                to: self.to.clone(),
                factor: self.factor,
            });
        }
        Ok(())
    }

    /// Factor taking a value from `from` to `to`, if this entry covers it.
    fn factor_between(&self, from: &str, to: &str) -> Option<f64> {
        if self.from == from && self.to == to {
            Some(self.factor)
        } else if self.from == to && self.to == from {
            Some(1.0 / self.factor)
        } else {
            None
        }
    }
}

/// On-disk shape of `reference_ranges.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceTableData {
    pub bands: Vec<RangeBand>,
    #[serde(default)]
    pub conversions: Vec<UnitConversion>,
}

/// Immutable range definitions, grouped per test key in declaration order.
#[derive(Debug, Default)]
pub struct ReferenceTable {
    bands: HashMap<String, Vec<Arc<RangeBand>>>,
    conversions: Vec<UnitConversion>,
    band_count: usize,
}

impl ReferenceTable {
    pub fn new(
        bands: Vec<RangeBand>,
        conversions: Vec<UnitConversion>,
    ) -> Result<Self, CatalogError> {
        let band_count = bands.len();
        let mut grouped: HashMap<String, Vec<Arc<RangeBand>>> = HashMap::new();
        for band in bands {
            band.validate()?;
            grouped
                .entry(band.test_key.clone())
                .or_default()
                .push(Arc::new(band));
        }
        for conversion in &conversions {
            conversion.validate()?;
        }
        Ok(Self {
            bands: grouped,
            conversions,
            band_count,
        })
    }

    pub fn from_data(data: ReferenceTableData) -> Result<Self, CatalogError> {
        Self::new(data.bands, data.conversions)
    }

    /// The single most specific applicable band. Ties at equal specificity
    /// go to the band declared first.
    pub fn lookup(&self, test_key: &str, sex: Sex, age: Option<u32>) -> Option<&Arc<RangeBand>> {
        self.applicable(test_key, sex, age).into_iter().next()
    }

    /// Every applicable band, most specific first, declaration order
    /// within equal specificity.
    pub fn applicable(&self, test_key: &str, sex: Sex, age: Option<u32>) -> Vec<&Arc<RangeBand>> {
        let mut found: Vec<&Arc<RangeBand>> = self
            .bands
            .get(test_key)
            .map(|bands| {
                bands
                    .iter()
                    .filter(|b| b.applicability.matches(sex, age))
                    .collect()
            })
            .unwrap_or_default();
        // sort_by is stable, so declaration order survives within a rank.
        found.sort_by(|a, b| {
            b.applicability
                .specificity()
                .cmp(&a.applicability.specificity())
        });
        found
    }

    pub fn bands_for(&self, test_key: &str) -> &[Arc<RangeBand>] {
        self.bands.get(test_key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Express `value` (in `from`) in the unit `to`. Test-specific
    /// conversions win over generic ones. `None` means incompatible.
    pub fn convert(
        &self,
        test_key: &str,
        value: f64,
        from: Option<&str>,
        to: Option<&str>,
    ) -> Option<f64> {
        let (from, to) = match (from, to) {
            (None, None) => return Some(value),
            (Some(f), Some(t)) if f == t => return Some(value),
            (Some(f), Some(t)) => (f, t),
            _ => return None,
        };

        let specific = self
            .conversions
            .iter()
            .filter(|c| c.test_key.as_deref() == Some(test_key))
            .find_map(|c| c.factor_between(from, to));
        let factor = specific.or_else(|| {
            self.conversions
                .iter()
                .filter(|c| c.test_key.is_none())
                .find_map(|c| c.factor_between(from, to))
        })?;
        Some(value * factor)
    }

    pub fn conversions(&self) -> &[UnitConversion] {
        &self.conversions
    }

    pub fn len(&self) -> usize {
        self.band_count
    }

    pub fn is_empty(&self) -> bool {
        self.band_count == 0
    }

    pub fn test_keys(&self) -> impl Iterator<Item = &str> {
        self.bands.keys().map(String::as_str)
    }
}
