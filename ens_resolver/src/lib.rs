pub mod cache;
pub mod error;
pub mod resolver;
pub mod service;

pub use cache::NameCache;
pub use error::ResolveError;
pub use resolver::{ResolvedWallet, WalletResolver};
pub use service::{EthersNameService, NameService};
