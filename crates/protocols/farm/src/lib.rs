//! Halo Farm
//!
//! Rewards program reads and actions against the pool-address keyed rewards
//! contract, and the farm valuation summary.

pub mod rewards;
pub mod state;
pub mod summary;

pub use rewards::RewardsProgram;
pub use state::{FarmError, FarmPositions, PerPool};
pub use summary::{farm_pools, fetch_farm_summary, rewards_token_price};
