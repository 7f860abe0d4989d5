//! Fixed unit-alias table.
//!
//! Every unit the pipeline understands has one canonical token and a list of
//! spellings seen in lab reports. Spellings are stored in lookup-key form:
//! lowercase, no whitespace, no dots, micro sign folded to `u`.

use std::collections::HashMap;
use std::sync::LazyLock;

struct UnitAlias {
    canonical: &'static str,
    spellings: &'static [&'static str],
}

const UNIT_ALIASES: &[UnitAlias] = &[
    UnitAlias { canonical: "g/dL", spellings: &["g/dl", "gm/dl", "gms/dl", "gram/dl", "gm%", "gms%", "g%"] },
    UnitAlias { canonical: "g/L", spellings: &["g/l", "gm/l"] },
    UnitAlias { canonical: "mg/dL", spellings: &["mg/dl", "mgdl", "mg%", "mg/100ml"] },
    UnitAlias { canonical: "mmol/L", spellings: &["mmol/l", "mmol/ltr"] },
    UnitAlias { canonical: "µmol/L", spellings: &["umol/l"] },
    UnitAlias { canonical: "nmol/L", spellings: &["nmol/l"] },
    UnitAlias { canonical: "pmol/L", spellings: &["pmol/l"] },
    UnitAlias { canonical: "mg/L", spellings: &["mg/l"] },
    UnitAlias { canonical: "ng/mL", spellings: &["ng/ml"] },
    UnitAlias { canonical: "pg/mL", spellings: &["pg/ml"] },
    UnitAlias { canonical: "ng/dL", spellings: &["ng/dl"] },
    UnitAlias { canonical: "µg/dL", spellings: &["ug/dl", "mcg/dl"] },
    UnitAlias { canonical: "mIU/L", spellings: &["miu/l", "uiu/ml", "mu/l", "uu/ml"] },
    UnitAlias { canonical: "U/L", spellings: &["u/l", "iu/l", "units/l"] },
    UnitAlias { canonical: "%", spellings: &["%"] },
    UnitAlias { canonical: "fL", spellings: &["fl", "femtoliters"] },
    UnitAlias { canonical: "pg", spellings: &["pg", "picograms"] },
    UnitAlias {
        canonical: "10^6/µL",
        spellings: &[
            "10^6/ul", "x10^6/ul", "10^12/l", "x10^12/l", "mill/cmm", "mill/cumm",
            "million/cmm", "million/cumm", "millions/cmm", "millions/cumm",
        ],
    },
    UnitAlias {
        canonical: "10^3/µL",
        spellings: &[
            "10^3/ul", "x10^3/ul", "10^9/l", "x10^9/l", "thou/cmm", "thou/cumm", "thou/ul",
            "thou/mm3", "thousand/cmm", "thousand/cumm", "k/ul",
        ],
    },
    UnitAlias {
        canonical: "lakh/µL",
        spellings: &[
            "lakh/ul", "lakhs/ul", "lakh/cmm", "lakhs/cmm", "lakh/cumm", "lakhs/cumm",
            "lac/cumm", "lacs/cumm",
        ],
    },
    UnitAlias {
        canonical: "/µL",
        spellings: &["/ul", "/cmm", "/cumm", "cells/cumm", "cells/ul", "/mm3", "/mm^3"],
    },
    UnitAlias { canonical: "mEq/L", spellings: &["meq/l"] },
    UnitAlias { canonical: "sec", spellings: &["sec", "secs", "seconds", "s"] },
    UnitAlias { canonical: "bpm", spellings: &["bpm", "/min", "beats/min", "b/min"] },
    UnitAlias { canonical: "mm/hr", spellings: &["mm/hr", "mm/h", "mm/1sthr"] },
];

static LOOKUP: LazyLock<HashMap<String, &'static str>> = LazyLock::new(|| {
    let mut map = HashMap::new();
    for alias in UNIT_ALIASES {
        map.insert(lookup_key(alias.canonical), alias.canonical);
        for spelling in alias.spellings {
            map.insert((*spelling).to_string(), alias.canonical);
        }
    }
    map
});

/// Fold a raw unit into lookup-key form.
fn lookup_key(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != '.')
        .map(|c| match c {
            'µ' | 'μ' => 'u',
            '³' => '3',
            _ => c,
        })
        .collect::<String>()
        .to_lowercase()
}

/// Map any recognized spelling to its canonical token.
pub fn canonicalize_unit(raw: &str) -> Option<&'static str> {
    let key = lookup_key(raw.trim());
    if key.is_empty() {
        return None;
    }
    LOOKUP.get(&key).copied()
}

/// True if `unit` is exactly one of the canonical tokens.
pub fn is_canonical(unit: &str) -> bool {
    UNIT_ALIASES.iter().any(|a| a.canonical == unit)
}

pub fn canonical_units() -> impl Iterator<Item = &'static str> {
    UNIT_ALIASES.iter().map(|a| a.canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mg_per_dl_spellings_share_one_token() {
        for raw in ["mg/dl", "mg/dL", "mgdl", "MG/DL", "mg / dL", "mg%"] {
            assert_eq!(canonicalize_unit(raw), Some("mg/dL"), "{raw}");
        }
    }

    #[test]
    fn micro_sign_variants() {
        assert_eq!(canonicalize_unit("µmol/L"), Some("µmol/L"));
        assert_eq!(canonicalize_unit("μmol/l"), Some("µmol/L"));
        assert_eq!(canonicalize_unit("umol/L"), Some("µmol/L"));
        assert_eq!(canonicalize_unit("µIU/mL"), Some("mIU/L"));
    }

    #[test]
    fn report_style_count_units() {
        assert_eq!(canonicalize_unit("mill/c.mm."), Some("10^6/µL"));
        assert_eq!(canonicalize_unit("/c.mm."), Some("/µL"));
        assert_eq!(canonicalize_unit("10^9/L"), Some("10^3/µL"));
        assert_eq!(canonicalize_unit("gm%"), Some("g/dL"));
        assert_eq!(canonicalize_unit("thou/cumm"), Some("10^3/µL"));
        assert_eq!(canonicalize_unit("Lakhs/c.mm"), Some("lakh/µL"));
    }

    #[test]
    fn unknown_units_rejected() {
        assert_eq!(canonicalize_unit("furlongs"), None);
        assert_eq!(canonicalize_unit(""), None);
        assert_eq!(canonicalize_unit("  "), None);
        assert_eq!(canonicalize_unit("High"), None);
    }

    #[test]
    fn canonical_tokens_resolve_to_themselves() {
        for unit in canonical_units() {
            assert!(is_canonical(unit));
            assert_eq!(canonicalize_unit(unit), Some(unit), "{unit}");
        }
        assert!(!is_canonical("mg/dl"));
    }
}
