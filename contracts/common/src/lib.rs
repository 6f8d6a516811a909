//! # Saver Common
//!
//! Types shared by every contract of the Saver workspace:
//!
//! - [`SaverError`]: the single error enum, so failures raised inside an adapter
//!   or a venue reach the vault with their original code
//! - [`fixed`]: WAD fixed-point helpers with floor/ceil rounding
//! - [`rate_model`]: the WhitePaper and TripleSlope interest-rate curves
//! - cross-contract interfaces ([`adapter`], [`venue`], [`registry`]) from
//!   which the `*Client` types used by the vault and adapters are generated
//!
//! ## Fixed-point conventions
//!
//! ```text
//! WAD          = 1e18             rates, utilization, exchange rates
//! FULL_SCALE   = 100_000          allocation weights (20% = 20_000)
//! PERCENT_SCALE = 100 * WAD       reported allocations (20% = 20e18)
//! ```

#![no_std]

pub mod adapter;
pub mod error;
pub mod fixed;
pub mod rate_model;
pub mod registry;
pub mod venue;

use soroban_sdk::{symbol_short, Symbol};

pub use adapter::{AdapterClient, LendingAdapter};
pub use error::{settle, SaverError};
pub use fixed::WAD;
pub use rate_model::{RateModel, TripleSlopeModel, WhitePaperModel};
pub use registry::{AllocationTableClient, AllocationTableInterface, RouterClient, RouterInterface};
pub use venue::{CTokenClient, CTokenInterface, IbTokenClient, IbTokenInterface};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Sum every allocation table must reach: 100% of the managed amount.
pub const FULL_SCALE: i128 = 100_000;

/// Scale of allocations reported to callers: percentage points times WAD.
pub const PERCENT_SCALE: i128 = 100 * WAD;

/// Router key of cToken-style venues.
pub const VENUS: Symbol = symbol_short!("venus");

/// Router key of ibToken-style venues.
pub const ALPACA: Symbol = symbol_short!("alpaca");

/// Instance storage is extended once its TTL drops under this many ledgers.
pub const TTL_THRESHOLD: u32 = 17_280; // ~1 day at 5s/ledger

/// Ledger count instance storage is extended to.
pub const TTL_EXTEND_TO: u32 = 518_400; // ~30 days
