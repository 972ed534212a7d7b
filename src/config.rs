// 10.0 config.rs: ledger-wide settings in one place. per-pool knobs live in
// PoolParams (pool.rs).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    // Oldest oracle observation a settlement will price against (ms)
    pub max_oracle_staleness_ms: i64,
    // One pool per market unless explicitly configured otherwise
    pub allow_multiple_pools_per_market: bool,
    // Event log cap; oldest entries are dropped past this
    pub max_events: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_oracle_staleness_ms: 60_000,
            allow_multiple_pools_per_market: false,
            max_events: 10_000,
        }
    }
}
