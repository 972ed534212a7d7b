// lp-pool-core: LP pool ledger for a perpetual futures exchange.
// NAV-first architecture: share issuance and redemption are always priced
// off a freshly computed NAV, never a cached one.
// all computation is deterministic with no external I/O.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: PoolId, MarketId, DepositorId, Quote, Shares, Price
//   2.x  math.rs: checked fixed-point arithmetic over scaled integers
//   3.x  vault.rs: collateral balance, share supply, per-depositor balances
//   4.x  price_feed.rs: oracle price provider (trait + mock)
//   5.x  position_feed.rs: market position provider + attributed-pnl adapter
//   6.x  nav.rs: ephemeral NAV snapshots
//   7.x  pool.rs: pool record, params, lifecycle state machine, admin policy
//   8.x  ledger/: pool arena, fund/withdraw/settle protocol, receipts
//   9.x  events.rs: state transition events for audit
//   10.x config.rs: ledger configuration

// core ledger modules
pub mod ledger;
pub mod math;
pub mod nav;
pub mod pool;
pub mod types;
pub mod vault;

// integration modules
pub mod config;
pub mod events;
pub mod position_feed;
pub mod price_feed;

// re exports for convenience
pub use config::*;
pub use events::*;
pub use ledger::*;
pub use math::{MathError, BASE_PRECISION, PRICE_PRECISION, QUOTE_PRECISION, SHARE_PRECISION};
pub use nav::*;
pub use pool::*;
pub use position_feed::*;
pub use price_feed::*;
pub use types::*;
pub use vault::{Vault, VaultError};
