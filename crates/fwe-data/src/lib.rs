#![deny(warnings)]

//! Reference data providers: commodity prices/nutrition and contract volumes.
//!
//! Providers hand out owned copies; the pipeline never caches them.

use anyhow::{Context, Result};
use fwe_core::{validate_reference_tables, CommodityRecord, ContractRecord};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Both reference tables.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceTables {
    pub commodities: Vec<CommodityRecord>,
    pub contracts: Vec<ContractRecord>,
}

/// Read-only source of reference tables.
pub trait ReferenceDataProvider: Send + Sync {
    /// A fresh copy of both tables.
    fn tables(&self) -> ReferenceTables;
}

/// The built-in four-commodity baseline.
#[derive(Clone, Copy, Debug, Default)]
pub struct BaselineReferenceData;

fn commodity(name: &str, price: f64, kcal: f64, protein: f64) -> CommodityRecord {
    CommodityRecord {
        name: name.to_string(),
        unit_price_usd: price,
        kcal_per_kg: kcal,
        protein_g_per_kg: protein,
    }
}

fn contract(name: &str, tons: f64) -> ContractRecord {
    ContractRecord {
        commodity: name.to_string(),
        tons,
    }
}

/// Baseline prices (USD/ton) and nutrition per kg.
pub fn baseline_prices() -> Vec<CommodityRecord> {
    vec![
        commodity("rice", 500.0, 3600.0, 70.0),
        commodity("wheat", 330.0, 3400.0, 110.0),
        commodity("poultry_eq", 1800.0, 2390.0, 270.0),
        commodity("edible_oil", 1000.0, 8840.0, 0.0),
    ]
}

/// Baseline contracted tonnage ceilings.
pub fn baseline_contracts() -> Vec<ContractRecord> {
    vec![
        contract("rice", 300_000.0),
        contract("wheat", 400_000.0),
        contract("poultry_eq", 80_000.0),
        contract("edible_oil", 60_000.0),
    ]
}

impl ReferenceDataProvider for BaselineReferenceData {
    fn tables(&self) -> ReferenceTables {
        ReferenceTables {
            commodities: baseline_prices(),
            contracts: baseline_contracts(),
        }
    }
}

/// Tables loaded once from a JSON document.
///
/// Expected shape:
/// `{"commodities": [{"commodity", "price", "kcal_per_kg", "protein_g_per_kg"}],
///   "contracts": [{"commodity", "tons"}]}`
#[derive(Clone, Debug, PartialEq)]
pub struct FileReferenceData {
    tables: ReferenceTables,
}

impl FileReferenceData {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let tables: ReferenceTables =
            serde_json::from_str(text).context("parsing reference tables")?;
        validate_reference_tables(&tables.commodities, &tables.contracts)
            .context("validating reference tables")?;
        Ok(Self { tables })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading reference data from {}", path.display()))?;
        let data = Self::from_json_str(&text)
            .with_context(|| format!("loading {}", path.display()))?;
        info!(
            path = %path.display(),
            commodities = data.tables.commodities.len(),
            contracts = data.tables.contracts.len(),
            "reference data loaded"
        );
        Ok(data)
    }
}

impl ReferenceDataProvider for FileReferenceData {
    fn tables(&self) -> ReferenceTables {
        self.tables.clone()
    }
}
