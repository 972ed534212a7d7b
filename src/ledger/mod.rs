// 8.x ledger/: the pool arena and its settlement protocol.
//   core.rs: PoolLedger, per-pool locking, lifecycle ops, queries
//   settlement.rs: fund/withdraw/settle_pnl sequences and share math
//   results.rs: receipts and the aggregated error type

mod core;
mod results;
mod settlement;

pub use self::core::{PoolLedger, PoolState};
pub use self::results::{FundReceipt, LedgerError, PnlSettlement, Receipt, WithdrawReceipt};
