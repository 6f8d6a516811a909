use soroban_sdk::{contractclient, Address, Env, Symbol, Vec};

use crate::error::SaverError;

/// Lookup of the lending pool serving `asset` on a named venue.
#[contractclient(name = "RouterClient")]
pub trait RouterInterface {
    fn resolve(env: Env, asset: Address, venue: Symbol) -> Result<Address, SaverError>;
}

/// Read side of the allocation table consumed by the vault.
#[contractclient(name = "AllocationTableClient")]
pub trait AllocationTableInterface {
    /// Adapters and their weights, in table order. Weights sum to `FULL_SCALE`.
    fn get_allocations(env: Env) -> (Vec<Address>, Vec<i128>);
}
