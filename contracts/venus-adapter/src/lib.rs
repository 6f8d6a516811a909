//! # Venus Adapter
//!
//! Connects the Saver vault to cToken-style pools. cTokens carry 8 decimals
//! and are priced by `exchange_rate` (underlying per cToken, scaled by 1e18),
//! so the adapter's position is worth `ctokens * exchange_rate / 1e18`.
//! The pool for each asset is looked up in the venue router under `"venus"`.

#![no_std]

use saver_common::fixed::{mul_div_ceil, mul_div_floor, WAD};
use saver_common::{
    settle, CTokenClient, LendingAdapter, RouterClient, SaverError, TTL_EXTEND_TO, TTL_THRESHOLD,
    VENUS,
};
use soroban_sdk::{
    contract, contractimpl, contracttype, symbol_short, token, Address, Env, Symbol,
};

// ============================================================================
// STORAGE KEYS
// ============================================================================

#[contracttype]
pub enum DataKey {
    /// Venue router used to find the pool of each asset
    Router,
    /// Vault allowed to move funds through this adapter
    Saver,
}

// ============================================================================
// EVENTS
// ============================================================================

/// Emitted on every supply (`a_dep`) and redemption (`a_wd`).
#[contracttype]
pub struct AdapterEvent {
    pub asset: Address,
    pub pool: Address,
    pub amount: i128,
    pub ctokens: i128,
}

// ============================================================================
// CONTRACT
// ============================================================================

#[contract]
pub struct VenusAdapter;

#[contractimpl]
impl VenusAdapter {
    /// Binds the adapter to its router and to the vault it serves.
    ///
    /// # Errors
    /// - `AlreadyInitialized` on a second call
    pub fn initialize(env: Env, router: Address, saver: Address) -> Result<(), SaverError> {
        if env.storage().instance().has(&DataKey::Saver) {
            return Err(SaverError::AlreadyInitialized);
        }
        env.storage().instance().set(&DataKey::Router, &router);
        env.storage().instance().set(&DataKey::Saver, &saver);
        env.storage().instance().extend_ttl(TTL_THRESHOLD, TTL_EXTEND_TO);
        Ok(())
    }

    pub fn router(env: Env) -> Result<Address, SaverError> {
        env.storage().instance().get(&DataKey::Router).ok_or(SaverError::NotInitialized)
    }

    pub fn saver(env: Env) -> Result<Address, SaverError> {
        env.storage().instance().get(&DataKey::Saver).ok_or(SaverError::NotInitialized)
    }
}

#[contractimpl]
impl LendingAdapter for VenusAdapter {
    fn venue_name(_env: Env) -> Symbol {
        VENUS
    }

    /// Mints cTokens with `amount` of `asset` held by the adapter.
    ///
    /// # Errors
    /// - fails authorization unless invoked by the vault
    /// - `PairNotFound` if the router has no venus pool for `asset`
    /// - pool errors (`InvalidAmount` for sub-cToken amounts)
    fn deposit(env: Env, asset: Address, amount: i128) -> Result<(), SaverError> {
        require_saver(&env)?;
        if amount <= 0 {
            return Err(SaverError::InvalidAmount);
        }

        let pool = resolve_pool(&env, &asset)?;
        let adapter = env.current_contract_address();
        token::Client::new(&env, &asset).transfer(&adapter, &pool, &amount);
        let ctokens = settle(CTokenClient::new(&env, &pool).try_mint(&adapter, &amount))?;

        env.events().publish(
            (symbol_short!("a_dep"),),
            AdapterEvent { asset, pool, amount, ctokens },
        );
        Ok(())
    }

    /// Redeems exactly `amount` of underlying and forwards it to the vault.
    ///
    /// # Errors
    /// - `InsufficientLiquidity` if the pool's cash is below `amount`
    /// - `InsufficientBalance` if the position is worth less than `amount`
    fn withdraw(env: Env, asset: Address, amount: i128) -> Result<i128, SaverError> {
        let saver = require_saver(&env)?;
        if amount <= 0 {
            return Err(SaverError::InvalidAmount);
        }

        let pool = resolve_pool(&env, &asset)?;
        let adapter = env.current_contract_address();
        let client = CTokenClient::new(&env, &pool);
        let ctokens = settle(client.try_redeem_underlying(&adapter, &amount))?;
        token::Client::new(&env, &asset).transfer(&adapter, &saver, &amount);

        env.events().publish(
            (symbol_short!("a_wd"),),
            AdapterEvent { asset, pool, amount, ctokens },
        );
        Ok(amount)
    }

    fn balance(env: Env, asset: Address) -> Result<i128, SaverError> {
        let pool = CTokenClient::new(&env, &resolve_pool(&env, &asset)?);
        let ctokens = pool.balance_of(&env.current_contract_address());
        if ctokens == 0 {
            return Ok(0);
        }
        let rate = settle(pool.try_exchange_rate())?;
        mul_div_floor(&env, ctokens, rate, WAD)
    }

    fn max_withdraw(env: Env, asset: Address) -> Result<i128, SaverError> {
        let balance = Self::balance(env.clone(), asset.clone())?;
        let pool = CTokenClient::new(&env, &resolve_pool(&env, &asset)?);
        Ok(balance.min(pool.cash()))
    }

    /// Underlying needed to mint one cToken: `ceil(exchange_rate / 1e18)`.
    fn min_deposit(env: Env, asset: Address) -> Result<i128, SaverError> {
        let pool = CTokenClient::new(&env, &resolve_pool(&env, &asset)?);
        let rate = settle(pool.try_exchange_rate())?;
        mul_div_ceil(&env, rate, 1, WAD)
    }

    /// Supply rate per block of the venus pool after a hypothetical `delta`.
    fn projected_rate(env: Env, asset: Address, delta: i128) -> Result<i128, SaverError> {
        let pool = CTokenClient::new(&env, &resolve_pool(&env, &asset)?);
        settle(pool.try_rate_model())?.supply_rate(
            &env,
            pool.cash(),
            pool.total_borrows(),
            pool.total_reserves(),
            delta,
        )
    }
}

// ============================================================================
// INTERNAL HELPERS
// ============================================================================

fn require_saver(env: &Env) -> Result<Address, SaverError> {
    let saver: Address = env.storage()
        .instance()
        .get(&DataKey::Saver)
        .ok_or(SaverError::NotInitialized)?;
    saver.require_auth();
    Ok(saver)
}

fn resolve_pool(env: &Env, asset: &Address) -> Result<Address, SaverError> {
    let router: Address = env.storage()
        .instance()
        .get(&DataKey::Router)
        .ok_or(SaverError::NotInitialized)?;
    settle(RouterClient::new(env, &router).try_resolve(asset, &VENUS))
}
