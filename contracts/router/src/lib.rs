//! # Venue Router
//!
//! Registry mapping `(asset, venue name)` to the lending pool that serves the
//! asset on that venue. Adapters receive the router address at construction
//! and resolve their pool on every call, so re-pointing an asset to a new pool
//! needs no adapter redeployment.
//!
//! ## Storage Layout
//!
//! - Instance: `Admin`
//! - Persistent: `Pair(asset, venue)` → pool address

#![no_std]

use saver_common::{RouterInterface, SaverError, TTL_EXTEND_TO, TTL_THRESHOLD};
use soroban_sdk::{
    contract, contractimpl, contracttype, symbol_short, Address, Env, Symbol,
};

// ============================================================================
// STORAGE KEYS
// ============================================================================

#[contracttype]
pub enum DataKey {
    /// Address allowed to register and remove pairs
    Admin,
    /// Pool serving an asset on a venue
    Pair(Address, Symbol),
}

// ============================================================================
// EVENTS
// ============================================================================

/// Emitted when a pair is registered or overwritten.
///
/// # Topics
/// - `SymbolShort("pair_add")`
#[contracttype]
pub struct PairAddedEvent {
    pub asset: Address,
    pub venue: Symbol,
    pub pool: Address,
}

/// Emitted when a pair is removed.
///
/// # Topics
/// - `SymbolShort("pair_rm")`
#[contracttype]
pub struct PairRemovedEvent {
    pub asset: Address,
    pub venue: Symbol,
}

// ============================================================================
// CONTRACT
// ============================================================================

#[contract]
pub struct VenueRouter;

#[contractimpl]
impl VenueRouter {
    /// Sets the router admin. Callable once.
    ///
    /// # Errors
    /// - `AlreadyInitialized` if an admin is already stored
    pub fn initialize(env: Env, admin: Address) -> Result<(), SaverError> {
        if env.storage().instance().has(&DataKey::Admin) {
            return Err(SaverError::AlreadyInitialized);
        }
        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage().instance().extend_ttl(TTL_THRESHOLD, TTL_EXTEND_TO);
        Ok(())
    }

    /// Registers `pool` as the venue pool for `asset`.
    ///
    /// Registering an existing pair overwrites it; registering the same
    /// triple twice leaves the registry unchanged.
    ///
    /// # Arguments
    /// * `caller` - Must be the router admin
    /// * `asset` - Underlying asset contract
    /// * `venue` - Venue name, as returned by the adapter's `venue_name()`
    /// * `pool` - Lending pool contract for this asset on this venue
    ///
    /// # Errors
    /// - `Unauthorized` if `caller` is not the admin
    ///
    /// # Events
    /// Emits `PairAddedEvent`
    pub fn add_pair(
        env: Env,
        caller: Address,
        asset: Address,
        venue: Symbol,
        pool: Address,
    ) -> Result<(), SaverError> {
        Self::require_admin(&env, &caller)?;

        let key = DataKey::Pair(asset.clone(), venue.clone());
        env.storage().persistent().set(&key, &pool);
        env.storage().persistent().extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);

        env.events().publish(
            (symbol_short!("pair_add"),),
            PairAddedEvent { asset, venue, pool },
        );
        Ok(())
    }

    /// Removes a registered pair.
    ///
    /// # Errors
    /// - `Unauthorized` if `caller` is not the admin
    /// - `PairNotFound` if the pair was never registered
    pub fn remove_pair(
        env: Env,
        caller: Address,
        asset: Address,
        venue: Symbol,
    ) -> Result<(), SaverError> {
        Self::require_admin(&env, &caller)?;

        let key = DataKey::Pair(asset.clone(), venue.clone());
        if !env.storage().persistent().has(&key) {
            return Err(SaverError::PairNotFound);
        }
        env.storage().persistent().remove(&key);

        env.events().publish(
            (symbol_short!("pair_rm"),),
            PairRemovedEvent { asset, venue },
        );
        Ok(())
    }

    pub fn has_pair(env: Env, asset: Address, venue: Symbol) -> bool {
        env.storage().persistent().has(&DataKey::Pair(asset, venue))
    }

    pub fn admin(env: Env) -> Result<Address, SaverError> {
        env.storage()
            .instance()
            .get(&DataKey::Admin)
            .ok_or(SaverError::NotInitialized)
    }

    #[inline]
    fn require_admin(env: &Env, caller: &Address) -> Result<(), SaverError> {
        caller.require_auth();
        let admin: Address = env.storage()
            .instance()
            .get(&DataKey::Admin)
            .ok_or(SaverError::NotInitialized)?;
        if *caller != admin {
            return Err(SaverError::Unauthorized);
        }
        env.storage().instance().extend_ttl(TTL_THRESHOLD, TTL_EXTEND_TO);
        Ok(())
    }
}

#[contractimpl]
impl RouterInterface for VenueRouter {
    /// Returns the pool registered for `(asset, venue)`.
    ///
    /// # Errors
    /// - `PairNotFound` if the pair is not registered
    fn resolve(env: Env, asset: Address, venue: Symbol) -> Result<Address, SaverError> {
        env.storage()
            .persistent()
            .get(&DataKey::Pair(asset, venue))
            .ok_or(SaverError::PairNotFound)
    }
}
