//! # Alpaca Adapter
//!
//! Connects the Saver vault to ibToken-style pools. ibTokens share the
//! underlying's decimals and are priced by `total_token / total_supply`.
//! The pool redeems by share count, so `withdraw(amount)` burns
//! `ceil(amount * total_supply / total_token)` shares, which yields at least
//! `amount`. When that payout would exceed the pool's cash, the share count
//! is rounded down instead and the payout falls short of `amount` by less
//! than one share's value. The whole payout is forwarded to the vault.

#![no_std]

use saver_common::fixed::{mul_div_ceil, mul_div_floor};
use saver_common::{
    settle, IbTokenClient, LendingAdapter, RouterClient, SaverError, ALPACA, TTL_EXTEND_TO,
    TTL_THRESHOLD,
};
use soroban_sdk::{
    contract, contractimpl, contracttype, symbol_short, token, Address, Env, Symbol,
};

#[contracttype]
pub enum DataKey {
    Router,
    Saver,
}

/// Emitted on every supply (`a_dep`) and redemption (`a_wd`).
#[contracttype]
pub struct AdapterEvent {
    pub asset: Address,
    pub pool: Address,
    pub amount: i128,
    pub shares: i128,
}

#[contract]
pub struct AlpacaAdapter;

#[contractimpl]
impl AlpacaAdapter {
    /// Binds the adapter to its router and to the vault it serves.
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
impl LendingAdapter for AlpacaAdapter {
    fn venue_name(_env: Env) -> Symbol {
        ALPACA
    }

    fn deposit(env: Env, asset: Address, amount: i128) -> Result<(), SaverError> {
        require_saver(&env)?;
        if amount <= 0 {
            return Err(SaverError::InvalidAmount);
        }

        let pool = resolve_pool(&env, &asset)?;
        let adapter = env.current_contract_address();
        token::Client::new(&env, &asset).transfer(&adapter, &pool, &amount);
        let shares = settle(IbTokenClient::new(&env, &pool).try_deposit(&adapter, &amount))?;

        env.events().publish(
            (symbol_short!("a_dep"),),
            AdapterEvent { asset, pool, amount, shares },
        );
        Ok(())
    }

    /// Burns the shares worth `amount` and forwards the payout to the vault.
    ///
    /// # Errors
    /// - `InsufficientLiquidity` if the pool's cash is below `amount`
    /// - `InsufficientBalance` if the position is worth less than `amount`
    fn withdraw(env: Env, asset: Address, amount: i128) -> Result<i128, SaverError> {
        let saver = require_saver(&env)?;
        if amount <= 0 {
            return Err(SaverError::InvalidAmount);
        }

        let pool_id = resolve_pool(&env, &asset)?;
        let pool = IbTokenClient::new(&env, &pool_id);
        if pool.cash() < amount {
            return Err(SaverError::InsufficientLiquidity);
        }

        let total_token = settle(pool.try_total_token())?;
        let supply = pool.total_supply();
        let mut shares = mul_div_ceil(&env, amount, supply, total_token)?;
        if mul_div_floor(&env, shares, total_token, supply)? > pool.cash() {
            shares = mul_div_floor(&env, amount, supply, total_token)?;
        }
        if shares == 0 {
            return Ok(0);
        }

        let adapter = env.current_contract_address();
        let received = settle(pool.try_withdraw(&adapter, &shares))?;
        token::Client::new(&env, &asset).transfer(&adapter, &saver, &received);

        env.events().publish(
            (symbol_short!("a_wd"),),
            AdapterEvent { asset, pool: pool_id, amount: received, shares },
        );
        Ok(received)
    }

    fn balance(env: Env, asset: Address) -> Result<i128, SaverError> {
        let pool = IbTokenClient::new(&env, &resolve_pool(&env, &asset)?);
        let shares = pool.balance_of(&env.current_contract_address());
        if shares == 0 {
            return Ok(0);
        }
        mul_div_floor(&env, shares, settle(pool.try_total_token())?, pool.total_supply())
    }

    fn max_withdraw(env: Env, asset: Address) -> Result<i128, SaverError> {
        let balance = Self::balance(env.clone(), asset.clone())?;
        let pool = IbTokenClient::new(&env, &resolve_pool(&env, &asset)?);
        Ok(balance.min(pool.cash()))
    }

    /// Underlying needed to mint one share: `ceil(total_token / total_supply)`,
    /// or 1 while the pool is empty.
    fn min_deposit(env: Env, asset: Address) -> Result<i128, SaverError> {
        let pool = IbTokenClient::new(&env, &resolve_pool(&env, &asset)?);
        let supply = pool.total_supply();
        let total_token = settle(pool.try_total_token())?;
        if supply == 0 || total_token <= 0 {
            return Ok(1);
        }
        mul_div_ceil(&env, total_token, 1, supply)
    }

    /// Supply rate per second of the alpaca pool after a hypothetical `delta`.
    fn projected_rate(env: Env, asset: Address, delta: i128) -> Result<i128, SaverError> {
        let pool = IbTokenClient::new(&env, &resolve_pool(&env, &asset)?);
        settle(pool.try_rate_model())?.supply_rate(
            &env,
            pool.cash(),
            pool.vault_debt_val(),
            pool.reserve_pool(),
            delta,
        )
    }
}

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
    settle(RouterClient::new(env, &router).try_resolve(asset, &ALPACA))
}
