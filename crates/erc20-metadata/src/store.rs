use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::address::Address;
use crate::reader::ChainReader;
use crate::record::{Fetched, TokenRecord};
use crate::seed::SeedTable;

/// Buffered commits per subscriber before it starts lagging. Subscribers
/// re-read the store on every message, so a lagged receiver only skips
/// redundant wake-ups.
const UPDATE_CHANNEL_CAPACITY: usize = 64;

/// The chain's intrinsic gas currency.
///
/// It is not a token contract: reads of its key are answered synthetically
/// for every chain id, without ever touching the per-chain map or issuing a
/// fetch.
#[derive(Debug, Clone)]
pub struct NativeAsset {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl NativeAsset {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            decimals,
        }
    }

    fn record(&self) -> TokenRecord {
        TokenRecord {
            name: Fetched::Known(self.name.clone()),
            symbol: Fetched::Known(self.symbol.clone()),
            decimals: Fetched::Known(self.decimals),
            // The native asset has no exchange contract; that is a settled
            // answer, not an unresolved field.
            exchange_address: Fetched::Missing,
        }
    }
}

impl Default for NativeAsset {
    fn default() -> Self {
        Self::new("Ether", "ETH", 18)
    }
}

#[derive(Debug, Default)]
struct State {
    records: HashMap<u64, HashMap<Address, TokenRecord>>,
    in_flight: HashSet<(u64, Address)>,
}

/// In-memory token metadata cache, keyed by (chain id, token address).
///
/// The store is a cheaply cloneable handle: construct one at startup and
/// pass clones to consumers. Reads are synchronous; absent records are
/// populated lazily via [`TokenStore::ensure_fetched`], which schedules at
/// most one concurrent fetch per key and announces every commit on a
/// broadcast channel.
#[derive(Debug, Clone)]
pub struct TokenStore {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    state: Mutex<State>,
    native: NativeAsset,
    updates: broadcast::Sender<()>,
}

impl TokenStore {
    pub fn new(seed: SeedTable, native: NativeAsset) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    records: seed.into_records(),
                    in_flight: HashSet::new(),
                }),
                native,
                updates,
            }),
        }
    }

    /// A store seeded with the built-in well-known token tables and an
    /// Ether native asset.
    pub fn with_builtin_seed() -> Self {
        Self::new(SeedTable::builtin(), NativeAsset::default())
    }

    /// Register for store-wide change notifications. One message is sent
    /// per commit; consumers re-read via [`TokenStore::get`].
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.inner.updates.subscribe()
    }

    /// Look up a record by chain id and token key.
    ///
    /// The native asset key (the native symbol, any case) resolves to the
    /// synthetic native record on every chain. A key that is not a valid
    /// address yields an all-unset record, as does a valid address with no
    /// entry yet. Lookup is case-insensitive.
    pub fn get(&self, chain_id: u64, key: &str) -> TokenRecord {
        if self.is_native_key(key) {
            return self.inner.native.record();
        }
        let Ok(address) = key.parse::<Address>() else {
            return TokenRecord::default();
        };
        self.state()
            .records
            .get(&chain_id)
            .and_then(|tokens| tokens.get(&address))
            .cloned()
            .unwrap_or_default()
    }

    /// All records for a chain, keyed by checksummed address, with the
    /// native record merged in under its symbol. The native entry is
    /// synthesized here and never persisted.
    pub fn all_for_chain(&self, chain_id: u64) -> HashMap<String, TokenRecord> {
        let mut all: HashMap<String, TokenRecord> = self
            .state()
            .records
            .get(&chain_id)
            .map(|tokens| {
                tokens
                    .iter()
                    .map(|(address, record)| (address.to_checksum(), record.clone()))
                    .collect()
            })
            .unwrap_or_default();
        all.insert(self.inner.native.symbol.clone(), self.inner.native.record());
        all
    }

    /// Schedule a metadata fetch for a key unless one is unnecessary.
    ///
    /// No-op for the native key, for syntactically invalid addresses, for
    /// records whose fields have all settled, and for keys with a fetch
    /// already in flight. Otherwise the key is marked in flight and a task
    /// is spawned that issues the four reader calls concurrently, waits for
    /// every one of them to settle, commits the merged record atomically,
    /// and sends one change notification. Read failures become missing
    /// fields and are never surfaced or retried.
    ///
    /// The spawned task always runs to completion, so a caller losing
    /// interest (dropping its subscription) cannot leak the in-flight
    /// marker or strand a half-fetched record. Returns true when a fetch
    /// was scheduled.
    ///
    /// Must be called from within a tokio runtime.
    pub fn ensure_fetched(
        &self,
        chain_id: u64,
        key: &str,
        reader: Arc<dyn ChainReader>,
    ) -> bool {
        if self.is_native_key(key) {
            return false;
        }
        let Ok(address) = key.parse::<Address>() else {
            debug!(chain_id, key, "ignoring fetch for invalid address");
            return false;
        };

        {
            let mut state = self.state();
            let settled = state
                .records
                .get(&chain_id)
                .and_then(|tokens| tokens.get(&address))
                .is_some_and(TokenRecord::is_complete);
            if settled {
                return false;
            }
            if !state.in_flight.insert((chain_id, address)) {
                debug!(chain_id, token = %address, "fetch already in flight");
                return false;
            }
        }

        debug!(chain_id, token = %address, "scheduling metadata fetch");
        let store = self.clone();
        tokio::spawn(async move {
            let record = fetch_record(reader.as_ref(), chain_id, address).await;
            store.commit(chain_id, address, record);
        });
        true
    }

    /// Commit one fetched record, clear its in-flight marker, and notify.
    /// A fetched record replaces any seed record for the key entirely.
    fn commit(&self, chain_id: u64, address: Address, record: TokenRecord) {
        {
            let mut state = self.state();
            // A commit with no matching marker means the dedup guard is
            // broken; that is a logic error, not a recoverable condition.
            assert!(
                state.in_flight.remove(&(chain_id, address)),
                "commit without in-flight marker for chain {chain_id}, token {address}"
            );
            state.records.entry(chain_id).or_default().insert(address, record);
        }
        // No receivers is fine; the record is still cached for later reads.
        let _ = self.inner.updates.send(());
    }

    fn is_native_key(&self, key: &str) -> bool {
        key.eq_ignore_ascii_case(&self.inner.native.symbol)
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.inner.state.lock().expect("store state lock poisoned")
    }
}

/// Issue the four field reads concurrently and merge once every one of them
/// has settled, success or failure.
async fn fetch_record(reader: &dyn ChainReader, chain_id: u64, token: Address) -> TokenRecord {
    let (name, symbol, decimals, exchange) = tokio::join!(
        reader.name(token),
        reader.symbol(token),
        reader.decimals(token),
        reader.exchange_address(token, chain_id),
    );

    TokenRecord {
        name: settle(&token, "name", name),
        symbol: settle(&token, "symbol", symbol),
        decimals: settle(&token, "decimals", decimals),
        exchange_address: match exchange {
            Ok(Some(address)) => Fetched::Known(address),
            Ok(None) => Fetched::Missing,
            Err(err) => {
                warn!(token = %token, error = %err, "exchange registry read failed");
                Fetched::Missing
            }
        },
    }
}

fn settle<T>(token: &Address, field: &'static str, result: Result<T, crate::error::ReadError>) -> Fetched<T> {
    if let Err(err) = &result {
        warn!(token = %token, field, error = %err, "metadata read failed");
    }
    Fetched::from_read(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAI: &str = "0x6B175474E89094C44Da98b954EedeAC495271d0F";

    #[test]
    fn test_native_record_is_synthesized_for_every_chain() {
        let store = TokenStore::with_builtin_seed();
        for chain_id in [1, 4, 7007, 424242] {
            let record = store.get(chain_id, "ETH");
            assert_eq!(record.symbol.known().map(String::as_str), Some("ETH"));
            assert_eq!(record.decimals.known(), Some(&18));
            assert_eq!(record.exchange_address, Fetched::Missing);
        }
        // Case-insensitive, like address keys.
        assert_eq!(store.get(1, "eth"), store.get(1, "ETH"));
    }

    #[test]
    fn test_custom_native_asset() {
        let store = TokenStore::new(SeedTable::default(), NativeAsset::new("BSTC COIN", "BSTC", 18));
        let record = store.get(1, "bstc");
        assert_eq!(record.name.known().map(String::as_str), Some("BSTC COIN"));
        // "ETH" is just an invalid address key for this store.
        assert_eq!(store.get(1, "ETH"), TokenRecord::default());
    }

    #[test]
    fn test_invalid_key_yields_empty_record() {
        let store = TokenStore::with_builtin_seed();
        assert_eq!(store.get(1, "not an address"), TokenRecord::default());
        assert_eq!(store.get(1, "0x1234"), TokenRecord::default());
    }

    #[test]
    fn test_seed_precedence_before_any_fetch() {
        let store = TokenStore::with_builtin_seed();
        let record = store.get(1, DAI);
        assert_eq!(record.name.known().map(String::as_str), Some("Dai Stablecoin"));
        assert_eq!(record.symbol.known().map(String::as_str), Some("DAI"));
        assert_eq!(record.decimals.known(), Some(&18));
        assert_eq!(
            record.exchange_address.known().map(Address::to_checksum),
            Some("0x2a1530C4C41db0B0b2bB646CB5Eb1A67b7158667".to_string())
        );
    }

    #[test]
    fn test_case_varied_lookup_matches_canonical() {
        let store = TokenStore::with_builtin_seed();
        let canonical = store.get(1, DAI);
        let lower = store.get(1, &DAI.to_lowercase());
        let upper = store.get(1, &DAI.to_uppercase().replace("0X", "0x"));
        assert_eq!(canonical, lower);
        assert_eq!(canonical, upper);
    }

    #[test]
    fn test_unknown_chain_starts_empty() {
        let store = TokenStore::with_builtin_seed();
        assert_eq!(store.get(999, DAI), TokenRecord::default());
    }

    #[test]
    fn test_all_for_chain_merges_native() {
        let store = TokenStore::with_builtin_seed();
        let all = store.all_for_chain(1);
        assert!(all.contains_key(DAI));
        let native = &all["ETH"];
        assert_eq!(native.symbol.known().map(String::as_str), Some("ETH"));

        // Chains without a seed table still expose the native asset.
        let sparse = store.all_for_chain(999);
        assert_eq!(sparse.len(), 1);
        assert!(sparse.contains_key("ETH"));
    }
}
