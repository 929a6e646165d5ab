use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::error::SeedError;
use crate::record::{Fetched, TokenRecord};

/// The built-in table of well-known tokens per chain.
const BUILTIN: &str = include_str!("../data/tokens.json");

/// One entry of the static seed configuration.
///
/// Fields may be omitted, leaving them unset so the store will still fetch
/// the token. `exchangeAddress: null` is a settled answer (the token is
/// known to have no exchange), distinct from the key being absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u8>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_with::rust::double_option"
    )]
    pub exchange_address: Option<Option<Address>>,
}

impl From<SeedRecord> for TokenRecord {
    fn from(seed: SeedRecord) -> Self {
        Self {
            name: seed.name.map_or(Fetched::Unset, Fetched::Known),
            symbol: seed.symbol.map_or(Fetched::Unset, Fetched::Known),
            decimals: seed.decimals.map_or(Fetched::Unset, Fetched::Known),
            exchange_address: match seed.exchange_address {
                None => Fetched::Unset,
                Some(None) => Fetched::Missing,
                Some(Some(address)) => Fetched::Known(address),
            },
        }
    }
}

/// Static per-chain token tables consumed once at store construction.
///
/// JSON shape: `{chainId: {address: {name, symbol, decimals, exchangeAddress}}}`.
/// Seed records are overridden by fetched records, never the reverse.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeedTable(HashMap<u64, HashMap<Address, SeedRecord>>);

impl SeedTable {
    /// Parse a seed table from its JSON configuration shape.
    pub fn from_json(json: &str) -> Result<Self, SeedError> {
        serde_json::from_str(json).map_err(|e| SeedError::Parse(e.to_string()))
    }

    /// The table embedded in the crate. The data is static and covered by
    /// test, so a parse failure here is a packaging defect.
    pub fn builtin() -> Self {
        Self::from_json(BUILTIN).expect("built-in seed table parses")
    }

    pub fn insert(&mut self, chain_id: u64, address: Address, record: SeedRecord) {
        self.0.entry(chain_id).or_default().insert(address, record);
    }

    pub fn chain_count(&self) -> usize {
        self.0.len()
    }

    pub(crate) fn into_records(self) -> HashMap<u64, HashMap<Address, TokenRecord>> {
        self.0
            .into_iter()
            .map(|(chain_id, tokens)| {
                let records = tokens
                    .into_iter()
                    .map(|(address, seed)| (address, seed.into()))
                    .collect();
                (chain_id, records)
            })
            .collect()
    }
}
