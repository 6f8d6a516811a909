//! # Saver Rebalancer
//!
//! Holds the target allocation of one asset across the vault's adapters.
//!
//! The allocation authority is set once at construction and is deliberately
//! not the vault owner: an off-chain bot can move targets without holding any
//! custody over vault funds. The vault only reads this table, during
//! `rebalance` and `current_allocations`.
//!
//! Weights are integers summing to `FULL_SCALE` (100_000 = 100%). A table
//! that was never updated allocates 100% to the first adapter given at
//! construction; that default is written explicitly by `initialize`.

#![no_std]

use saver_common::{AllocationTableInterface, SaverError, FULL_SCALE, TTL_EXTEND_TO, TTL_THRESHOLD};
use soroban_sdk::{
    contract, contractimpl, contracttype, symbol_short, Address, Env, Vec,
};

// ============================================================================
// STORAGE KEYS
// ============================================================================

#[contracttype]
pub enum DataKey {
    /// Only address allowed to call `set_allocations`
    Authority,
    /// Adapters, in table order
    Adaptors,
    /// Weight of each adapter, same order as `Adaptors`
    Weights,
}

// ============================================================================
// EVENTS
// ============================================================================

/// Emitted when the authority replaces the table.
///
/// # Topics
/// - `SymbolShort("alloc")`
#[contracttype]
pub struct AllocationsSetEvent {
    pub adaptors: Vec<Address>,
    pub weights: Vec<i128>,
}

// ============================================================================
// CONTRACT
// ============================================================================

#[contract]
pub struct Rebalancer;

#[contractimpl]
impl Rebalancer {
    /// Creates the table with its authority and the default allocation.
    ///
    /// # Arguments
    /// * `authority` - Address allowed to replace the allocation
    /// * `adaptors` - Candidate adapters; the first one receives 100%
    ///
    /// # Errors
    /// - `AlreadyInitialized` on a second call
    /// - `EmptyAllocation` if `adaptors` is empty
    /// - `DuplicateAdapter` if an adapter is listed twice
    pub fn initialize(
        env: Env,
        authority: Address,
        adaptors: Vec<Address>,
    ) -> Result<(), SaverError> {
        if env.storage().instance().has(&DataKey::Authority) {
            return Err(SaverError::AlreadyInitialized);
        }
        if adaptors.is_empty() {
            return Err(SaverError::EmptyAllocation);
        }
        require_unique(&adaptors)?;

        let mut weights = Vec::new(&env);
        for index in 0..adaptors.len() {
            weights.push_back(if index == 0 { FULL_SCALE } else { 0 });
        }

        env.storage().instance().set(&DataKey::Authority, &authority);
        env.storage().instance().set(&DataKey::Adaptors, &adaptors);
        env.storage().instance().set(&DataKey::Weights, &weights);
        env.storage().instance().extend_ttl(TTL_THRESHOLD, TTL_EXTEND_TO);
        Ok(())
    }

    /// Atomically replaces the whole allocation table.
    ///
    /// Every check runs before anything is written: a rejected call leaves
    /// the previous table in place.
    ///
    /// # Arguments
    /// * `caller` - Must be the table authority
    /// * `weights` - One weight per adapter, summing to `FULL_SCALE`
    /// * `adaptors` - Adapters in the new table order
    ///
    /// # Errors
    /// - `Unauthorized` if `caller` is not the authority
    /// - `LengthMismatch` if the vectors differ in length
    /// - `EmptyAllocation` if the vectors are empty
    /// - `DuplicateAdapter` if an adapter appears twice
    /// - `NegativeWeight` if a weight is below zero
    /// - `InvalidWeightSum` if weights do not sum to `FULL_SCALE`
    ///
    /// # Events
    /// Emits `AllocationsSetEvent`
    pub fn set_allocations(
        env: Env,
        caller: Address,
        weights: Vec<i128>,
        adaptors: Vec<Address>,
    ) -> Result<(), SaverError> {
        caller.require_auth();
        let authority: Address = env.storage()
            .instance()
            .get(&DataKey::Authority)
            .ok_or(SaverError::NotInitialized)?;
        if caller != authority {
            return Err(SaverError::Unauthorized);
        }

        validate_allocations(&weights, &adaptors)?;

        env.storage().instance().set(&DataKey::Adaptors, &adaptors);
        env.storage().instance().set(&DataKey::Weights, &weights);
        env.storage().instance().extend_ttl(TTL_THRESHOLD, TTL_EXTEND_TO);

        env.events().publish(
            (symbol_short!("alloc"),),
            AllocationsSetEvent { adaptors, weights },
        );
        Ok(())
    }

    pub fn authority(env: Env) -> Result<Address, SaverError> {
        env.storage()
            .instance()
            .get(&DataKey::Authority)
            .ok_or(SaverError::NotInitialized)
    }

    pub fn full_scale(_env: Env) -> i128 {
        FULL_SCALE
    }
}

#[contractimpl]
impl AllocationTableInterface for Rebalancer {
    /// Returns `(adaptors, weights)` in table order.
    fn get_allocations(env: Env) -> (Vec<Address>, Vec<i128>) {
        let adaptors = env.storage()
            .instance()
            .get(&DataKey::Adaptors)
            .unwrap_or(Vec::new(&env));
        let weights = env.storage()
            .instance()
            .get(&DataKey::Weights)
            .unwrap_or(Vec::new(&env));
        (adaptors, weights)
    }
}

// ============================================================================
// VALIDATION
// ============================================================================

fn validate_allocations(weights: &Vec<i128>, adaptors: &Vec<Address>) -> Result<(), SaverError> {
    if weights.len() != adaptors.len() {
        return Err(SaverError::LengthMismatch);
    }
    if adaptors.is_empty() {
        return Err(SaverError::EmptyAllocation);
    }
    require_unique(adaptors)?;

    let mut sum: i128 = 0;
    for weight in weights.iter() {
        if weight < 0 {
            return Err(SaverError::NegativeWeight);
        }
        sum = sum.checked_add(weight).ok_or(SaverError::ArithmeticOverflow)?;
    }
    if sum != FULL_SCALE {
        return Err(SaverError::InvalidWeightSum);
    }
    Ok(())
}

fn require_unique(adaptors: &Vec<Address>) -> Result<(), SaverError> {
    for (index, adaptor) in adaptors.iter().enumerate() {
        if adaptors.iter().skip(index + 1).any(|other| other == adaptor) {
            return Err(SaverError::DuplicateAdapter);
        }
    }
    Ok(())
}
