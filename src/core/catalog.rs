//! Static partition of supported currencies into direct and derived codes.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a derived currency is computed from the base currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedCurrency {
    /// Direct currency whose snapshot gets scaled. Must be the catalog base.
    pub base: String,
    /// Key of the multiplier in the rate table, e.g. `KZT`.
    pub rate_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CurrencyKind<'a> {
    Direct,
    Derived(&'a DerivedCurrency),
}

#[derive(Debug, Clone)]
pub struct CurrencyCatalog {
    base: String,
    direct: Vec<String>,
    derived: BTreeMap<String, DerivedCurrency>,
    tracked_rates: Vec<String>,
}

impl CurrencyCatalog {
    pub fn new(
        base: &str,
        direct: &[String],
        derived: &BTreeMap<String, DerivedCurrency>,
        extra_rates: &[String],
    ) -> Result<Self> {
        let base = base.to_lowercase();
        let direct: Vec<String> = direct.iter().map(|c| c.to_lowercase()).collect();

        if direct.is_empty() {
            bail!("At least one direct currency is required");
        }
        if !direct.contains(&base) {
            bail!("Base currency {base} must be a direct currency");
        }

        let mut normalized = BTreeMap::new();
        for (code, spec) in derived {
            let code = code.to_lowercase();
            let spec_base = spec.base.to_lowercase();
            if direct.contains(&code) {
                bail!("Currency {code} cannot be both direct and derived");
            }
            if spec_base != base {
                bail!("Derived currency {code} must be computed from base currency {base}, not {spec_base}");
            }
            normalized.insert(
                code,
                DerivedCurrency {
                    base: spec_base,
                    rate_key: spec.rate_key.to_uppercase(),
                },
            );
        }

        let mut tracked_rates: Vec<String> = normalized
            .values()
            .map(|d| d.rate_key.clone())
            .chain(extra_rates.iter().map(|r| r.to_uppercase()))
            .collect();
        tracked_rates.sort();
        tracked_rates.dedup();

        Ok(Self {
            base,
            direct,
            derived: normalized,
            tracked_rates,
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn direct(&self) -> &[String] {
        &self.direct
    }

    pub fn derived(&self) -> impl Iterator<Item = (&String, &DerivedCurrency)> {
        self.derived.iter()
    }

    /// Rate keys the rate fetcher keeps from each upstream table.
    pub fn tracked_rates(&self) -> &[String] {
        &self.tracked_rates
    }

    pub fn kind(&self, code: &str) -> Option<CurrencyKind<'_>> {
        if self.direct.iter().any(|c| c == code) {
            Some(CurrencyKind::Direct)
        } else {
            self.derived.get(code).map(CurrencyKind::Derived)
        }
    }

    pub fn is_supported(&self, code: &str) -> bool {
        self.kind(code).is_some()
    }

    pub fn is_direct(&self, code: &str) -> bool {
        matches!(self.kind(code), Some(CurrencyKind::Direct))
    }

    /// Direct codes first, then derived codes.
    pub fn all(&self) -> Vec<String> {
        self.direct
            .iter()
            .chain(self.derived.keys())
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn kzt_from(base: &str) -> BTreeMap<String, DerivedCurrency> {
        BTreeMap::from([(
            "KZT".to_string(),
            DerivedCurrency {
                base: base.to_string(),
                rate_key: "kzt".to_string(),
            },
        )])
    }

    #[test]
    fn test_catalog_normalizes_codes() {
        let catalog =
            CurrencyCatalog::new("USD", &codes(&["USD", "Eur"]), &kzt_from("usd"), &codes(&["eur"]))
                .unwrap();

        assert_eq!(catalog.base(), "usd");
        assert_eq!(catalog.direct(), &codes(&["usd", "eur"])[..]);
        assert_eq!(catalog.all(), codes(&["usd", "eur", "kzt"]));
        assert_eq!(catalog.tracked_rates(), &codes(&["EUR", "KZT"])[..]);

        match catalog.kind("kzt") {
            Some(CurrencyKind::Derived(spec)) => {
                assert_eq!(spec.base, "usd");
                assert_eq!(spec.rate_key, "KZT");
            }
            other => panic!("Expected derived currency, got {other:?}"),
        }
        assert!(catalog.is_direct("eur"));
        assert!(!catalog.is_supported("gbp"));
    }

    #[test]
    fn test_catalog_rejects_invalid_partitions() {
        let err = CurrencyCatalog::new("usd", &[], &BTreeMap::new(), &[]).unwrap_err();
        assert!(err.to_string().contains("At least one direct currency"));

        let err = CurrencyCatalog::new("gbp", &codes(&["usd"]), &BTreeMap::new(), &[]).unwrap_err();
        assert!(err.to_string().contains("must be a direct currency"));

        let err = CurrencyCatalog::new("usd", &codes(&["usd", "eur"]), &kzt_from("eur"), &[])
            .unwrap_err();
        assert!(err.to_string().contains("must be computed from base currency usd"));

        let overlap = BTreeMap::from([(
            "eur".to_string(),
            DerivedCurrency {
                base: "usd".to_string(),
                rate_key: "EUR".to_string(),
            },
        )]);
        let err = CurrencyCatalog::new("usd", &codes(&["usd", "eur"]), &overlap, &[]).unwrap_err();
        assert!(err.to_string().contains("both direct and derived"));
    }
}
