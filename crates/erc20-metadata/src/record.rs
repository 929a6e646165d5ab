use crate::address::Address;
use crate::error::ReadError;

/// Resolution state of a single metadata field.
///
/// `Unset` means the field has never been resolved and a fetch may still
/// populate it. `Missing` means a fetch settled without a value — either the
/// chain has no answer or the read failed — and is terminal: the store never
/// retries a resolved field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched<T> {
    Unset,
    Missing,
    Known(T),
}

impl<T> Fetched<T> {
    pub const fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    /// True once a fetch has settled this field, with or without a value.
    pub const fn is_resolved(&self) -> bool {
        !self.is_unset()
    }

    pub const fn known(&self) -> Option<&T> {
        match self {
            Self::Known(value) => Some(value),
            _ => None,
        }
    }

    /// Settle a field from a chain read. Failures become `Missing`.
    pub(crate) fn from_read(result: Result<T, ReadError>) -> Self {
        match result {
            Ok(value) => Self::Known(value),
            Err(_) => Self::Missing,
        }
    }
}

impl<T> Default for Fetched<T> {
    fn default() -> Self {
        Self::Unset
    }
}

/// Cached metadata for one (chain, token) pair.
///
/// `exchange_address` is `Missing` when the registry reports the token has
/// no exchange, which is a settled answer, not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenRecord {
    pub name: Fetched<String>,
    pub symbol: Fetched<String>,
    pub decimals: Fetched<u8>,
    pub exchange_address: Fetched<Address>,
}

impl TokenRecord {
    /// True when every field has settled. Complete records are never
    /// re-fetched or overwritten with unset fields.
    pub const fn is_complete(&self) -> bool {
        self.name.is_resolved()
            && self.symbol.is_resolved()
            && self.decimals.is_resolved()
            && self.exchange_address.is_resolved()
    }
}
