pub mod address;
pub mod error;
pub mod reader;
pub mod record;
pub mod seed;
pub mod store;

// Re-exports for convenience
pub use address::Address;
pub use error::{AddressError, ReadError, SeedError};
pub use reader::ChainReader;
pub use record::{Fetched, TokenRecord};
pub use seed::{SeedRecord, SeedTable};
pub use store::{NativeAsset, TokenStore};
