//! # ibToken Pool
//!
//! Alpaca-style lending vault. Depositors receive interest-bearing shares
//! ("ibTokens") with the underlying's decimals, priced by
//!
//! ```text
//! total_token = cash + vault_debt_val - reserve_pool
//! share price = total_token / total_supply
//! ```
//!
//! Unlike cToken pools, withdrawals are expressed in shares. Depositors
//! transfer underlying first and then call `deposit`, which books the amount.
//! Leveraged-farming debt is simulated by the admin (`borrow`, `repay`,
//! `accrue`).

#![no_std]

use saver_common::fixed::{checked_add, checked_sub, mul_div_floor, WAD};
use saver_common::{IbTokenInterface, RateModel, SaverError, TTL_EXTEND_TO, TTL_THRESHOLD};
use soroban_sdk::{
    contract, contractimpl, contracttype, symbol_short, token, Address, Env,
};

// ============================================================================
// STORAGE KEYS
// ============================================================================

#[contracttype]
pub enum DataKey {
    Admin,
    Token,
    RateModel,
    TotalSupply,
    Cash,
    VaultDebtVal,
    ReservePool,
    /// Share balance of a holder (persistent)
    Balance(Address),
}

// ============================================================================
// EVENTS
// ============================================================================

/// # Topics
/// - `SymbolShort("deposit")` or `SymbolShort("withdraw")`
#[contracttype]
pub struct ShareEvent {
    pub account: Address,
    pub amount: i128,
    pub shares: i128,
}

/// # Topics
/// - `SymbolShort("borrow")`, `SymbolShort("repay")` or `SymbolShort("accrue")`
#[contracttype]
pub struct DebtEvent {
    pub amount: i128,
    pub vault_debt_val: i128,
    pub reserve_pool: i128,
}

// ============================================================================
// CONTRACT
// ============================================================================

#[contract]
pub struct IbTokenPool;

#[contractimpl]
impl IbTokenPool {
    /// Creates the pool.
    ///
    /// # Errors
    /// - `AlreadyInitialized` on a second call
    /// - `InvalidRateModel` for out-of-range model parameters
    pub fn initialize(
        env: Env,
        admin: Address,
        token: Address,
        rate_model: RateModel,
    ) -> Result<(), SaverError> {
        if env.storage().instance().has(&DataKey::Admin) {
            return Err(SaverError::AlreadyInitialized);
        }
        rate_model.validate()?;

        let storage = env.storage().instance();
        storage.set(&DataKey::Admin, &admin);
        storage.set(&DataKey::Token, &token);
        storage.set(&DataKey::RateModel, &rate_model);
        storage.set(&DataKey::TotalSupply, &0_i128);
        storage.set(&DataKey::Cash, &0_i128);
        storage.set(&DataKey::VaultDebtVal, &0_i128);
        storage.set(&DataKey::ReservePool, &0_i128);
        storage.extend_ttl(TTL_THRESHOLD, TTL_EXTEND_TO);
        Ok(())
    }

    /// Current lender rate per second.
    pub fn supply_rate(env: Env) -> Result<i128, SaverError> {
        Self::rate_model(env.clone())?.supply_rate(
            &env,
            read_i128(&env, &DataKey::Cash),
            read_i128(&env, &DataKey::VaultDebtVal),
            read_i128(&env, &DataKey::ReservePool),
            0,
        )
    }

    /// Current borrower rate per second.
    pub fn borrow_rate(env: Env) -> Result<i128, SaverError> {
        Self::rate_model(env.clone())?.borrow_rate(
            &env,
            read_i128(&env, &DataKey::Cash),
            read_i128(&env, &DataKey::VaultDebtVal),
            read_i128(&env, &DataKey::ReservePool),
            0,
        )
    }

    /// Opens `amount` of debt against the pool, paid out to `to`.
    ///
    /// # Errors
    /// - `InsufficientLiquidity` if the pool holds less cash than `amount`
    pub fn borrow(env: Env, to: Address, amount: i128) -> Result<(), SaverError> {
        require_admin(&env)?;
        require_positive(amount)?;

        let cash = read_i128(&env, &DataKey::Cash);
        if cash < amount {
            return Err(SaverError::InsufficientLiquidity);
        }
        let debt = checked_add(read_i128(&env, &DataKey::VaultDebtVal), amount)?;
        env.storage().instance().set(&DataKey::Cash, &(cash - amount));
        env.storage().instance().set(&DataKey::VaultDebtVal, &debt);

        token_client(&env)?.transfer(&env.current_contract_address(), &to, &amount);

        publish_debt(&env, symbol_short!("borrow"), amount);
        Ok(())
    }

    pub fn repay(env: Env, from: Address, amount: i128) -> Result<(), SaverError> {
        from.require_auth();
        require_positive(amount)?;

        let debt = read_i128(&env, &DataKey::VaultDebtVal);
        if amount > debt {
            return Err(SaverError::InvalidAmount);
        }
        token_client(&env)?.transfer(&from, &env.current_contract_address(), &amount);

        let cash = checked_add(read_i128(&env, &DataKey::Cash), amount)?;
        env.storage().instance().set(&DataKey::Cash, &cash);
        env.storage().instance().set(&DataKey::VaultDebtVal, &(debt - amount));

        publish_debt(&env, symbol_short!("repay"), amount);
        Ok(())
    }

    /// Adds `interest` to the debt; the reserve-factor share goes to the
    /// reserve pool.
    pub fn accrue(env: Env, interest: i128) -> Result<(), SaverError> {
        require_admin(&env)?;
        require_positive(interest)?;

        let model = Self::rate_model(env.clone())?;
        let to_reserve = mul_div_floor(&env, interest, model.reserve_factor(), WAD)?;
        let debt = checked_add(read_i128(&env, &DataKey::VaultDebtVal), interest)?;
        let reserve = checked_add(read_i128(&env, &DataKey::ReservePool), to_reserve)?;
        env.storage().instance().set(&DataKey::VaultDebtVal, &debt);
        env.storage().instance().set(&DataKey::ReservePool, &reserve);

        publish_debt(&env, symbol_short!("accrue"), interest);
        Ok(())
    }

    pub fn set_rate_model(env: Env, rate_model: RateModel) -> Result<(), SaverError> {
        require_admin(&env)?;
        rate_model.validate()?;
        env.storage().instance().set(&DataKey::RateModel, &rate_model);
        Ok(())
    }
}

#[contractimpl]
impl IbTokenInterface for IbTokenPool {
    fn token(env: Env) -> Result<Address, SaverError> {
        env.storage().instance().get(&DataKey::Token).ok_or(SaverError::NotInitialized)
    }

    /// Books `amount` previously transferred by `from` and mints shares at
    /// the current share price, rounded down. The first deposit mints 1:1.
    ///
    /// # Errors
    /// - `InsufficientBalance` if the pool did not receive `amount`
    /// - `InvalidAmount` if `amount` buys no share
    fn deposit(env: Env, from: Address, amount: i128) -> Result<i128, SaverError> {
        from.require_auth();
        require_positive(amount)?;

        let cash = read_i128(&env, &DataKey::Cash);
        let held = token_client(&env)?.balance(&env.current_contract_address());
        if held < checked_add(cash, amount)? {
            return Err(SaverError::InsufficientBalance);
        }

        let supply = read_i128(&env, &DataKey::TotalSupply);
        let total = Self::total_token(env.clone())?;
        let shares = if supply == 0 || total <= 0 {
            amount
        } else {
            mul_div_floor(&env, amount, supply, total)?
        };
        if shares == 0 {
            return Err(SaverError::InvalidAmount);
        }

        let balance = checked_add(Self::balance_of(env.clone(), from.clone()), shares)?;
        write_balance(&env, &from, balance);
        env.storage().instance().set(&DataKey::TotalSupply, &checked_add(supply, shares)?);
        env.storage().instance().set(&DataKey::Cash, &(cash + amount));
        env.storage().instance().extend_ttl(TTL_THRESHOLD, TTL_EXTEND_TO);

        env.events().publish(
            (symbol_short!("deposit"),),
            ShareEvent { account: from, amount, shares },
        );
        Ok(shares)
    }

    /// Burns `share` shares of `to` and pays out their value, rounded down.
    ///
    /// # Errors
    /// - `InsufficientBalance` if `to` holds fewer than `share` shares
    /// - `InsufficientLiquidity` if pool cash cannot cover the payout
    fn withdraw(env: Env, to: Address, share: i128) -> Result<i128, SaverError> {
        to.require_auth();
        require_positive(share)?;

        let balance = Self::balance_of(env.clone(), to.clone());
        if balance < share {
            return Err(SaverError::InsufficientBalance);
        }
        let supply = read_i128(&env, &DataKey::TotalSupply);
        let amount = mul_div_floor(&env, share, Self::total_token(env.clone())?, supply)?;
        let cash = read_i128(&env, &DataKey::Cash);
        if cash < amount {
            return Err(SaverError::InsufficientLiquidity);
        }

        write_balance(&env, &to, balance - share);
        env.storage().instance().set(&DataKey::TotalSupply, &checked_sub(supply, share)?);
        env.storage().instance().set(&DataKey::Cash, &(cash - amount));
        env.storage().instance().extend_ttl(TTL_THRESHOLD, TTL_EXTEND_TO);

        if amount > 0 {
            token_client(&env)?.transfer(&env.current_contract_address(), &to, &amount);
        }

        env.events().publish(
            (symbol_short!("withdraw"),),
            ShareEvent { account: to, amount, shares: share },
        );
        Ok(amount)
    }

    fn balance_of(env: Env, id: Address) -> i128 {
        env.storage()
            .persistent()
            .get(&DataKey::Balance(id))
            .unwrap_or(0)
    }

    fn total_supply(env: Env) -> i128 {
        read_i128(&env, &DataKey::TotalSupply)
    }

    fn total_token(env: Env) -> Result<i128, SaverError> {
        checked_sub(
            checked_add(read_i128(&env, &DataKey::Cash), read_i128(&env, &DataKey::VaultDebtVal))?,
            read_i128(&env, &DataKey::ReservePool),
        )
    }

    fn cash(env: Env) -> i128 {
        read_i128(&env, &DataKey::Cash)
    }

    fn vault_debt_val(env: Env) -> i128 {
        read_i128(&env, &DataKey::VaultDebtVal)
    }

    fn reserve_pool(env: Env) -> i128 {
        read_i128(&env, &DataKey::ReservePool)
    }

    fn rate_model(env: Env) -> Result<RateModel, SaverError> {
        env.storage().instance().get(&DataKey::RateModel).ok_or(SaverError::NotInitialized)
    }
}

// ============================================================================
// INTERNAL HELPERS
// ============================================================================

fn read_i128(env: &Env, key: &DataKey) -> i128 {
    env.storage().instance().get(key).unwrap_or(0)
}

fn write_balance(env: &Env, holder: &Address, balance: i128) {
    let key = DataKey::Balance(holder.clone());
    env.storage().persistent().set(&key, &balance);
    env.storage().persistent().extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
}

fn token_client(env: &Env) -> Result<token::Client<'_>, SaverError> {
    let token: Address = env.storage()
        .instance()
        .get(&DataKey::Token)
        .ok_or(SaverError::NotInitialized)?;
    Ok(token::Client::new(env, &token))
}

fn publish_debt(env: &Env, topic: soroban_sdk::Symbol, amount: i128) {
    env.events().publish(
        (topic,),
        DebtEvent {
            amount,
            vault_debt_val: read_i128(env, &DataKey::VaultDebtVal),
            reserve_pool: read_i128(env, &DataKey::ReservePool),
        },
    );
}

fn require_admin(env: &Env) -> Result<(), SaverError> {
    let admin: Address = env.storage()
        .instance()
        .get(&DataKey::Admin)
        .ok_or(SaverError::NotInitialized)?;
    admin.require_auth();
    Ok(())
}

#[inline]
fn require_positive(amount: i128) -> Result<(), SaverError> {
    if amount <= 0 {
        return Err(SaverError::InvalidAmount);
    }
    Ok(())
}
