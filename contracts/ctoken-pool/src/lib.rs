//! # cToken Pool
//!
//! Compound/Venus-style lending pool. Suppliers receive 8-decimal cTokens
//! priced by an exchange rate that grows as borrowers pay interest:
//!
//! ```text
//! exchange_rate = (cash + total_borrows - total_reserves) * 1e18 / total_supply
//! ```
//!
//! Suppliers transfer underlying to the pool and then call `mint`, which books
//! the difference between the pool's token balance and its tracked cash.
//! Borrowing is driven by the admin (`borrow`, `repay`, `accrue`) so the pool
//! can stand in for a live venue on local networks and in tests.

#![no_std]

use saver_common::fixed::{checked_add, checked_sub, mul_div_ceil, mul_div_floor, WAD};
use saver_common::{CTokenInterface, RateModel, SaverError, TTL_EXTEND_TO, TTL_THRESHOLD};
use soroban_sdk::{
    contract, contractimpl, contracttype, symbol_short, token, Address, Env,
};

/// 0.02 underlying (18 decimals) per cToken (8 decimals), scaled by 1e18.
pub const INITIAL_EXCHANGE_RATE: i128 = 200_000_000_000_000_000_000_000_000;

// ============================================================================
// STORAGE KEYS
// ============================================================================

#[contracttype]
pub enum DataKey {
    Admin,
    Underlying,
    RateModel,
    InitialExchangeRate,
    TotalSupply,
    Cash,
    Borrows,
    Reserves,
    /// cToken balance of a holder (persistent)
    Balance(Address),
}

// ============================================================================
// EVENTS
// ============================================================================

/// # Topics
/// - `SymbolShort("mint")`
#[contracttype]
pub struct MintEvent {
    pub minter: Address,
    pub amount: i128,
    pub ctokens: i128,
}

/// # Topics
/// - `SymbolShort("redeem")`
#[contracttype]
pub struct RedeemEvent {
    pub redeemer: Address,
    pub amount: i128,
    pub ctokens: i128,
}

/// # Topics
/// - `SymbolShort("borrow")` for borrows, `SymbolShort("repay")` for repayments
#[contracttype]
pub struct BorrowEvent {
    pub account: Address,
    pub amount: i128,
    pub total_borrows: i128,
}

/// # Topics
/// - `SymbolShort("accrue")`
#[contracttype]
pub struct AccrueEvent {
    pub interest: i128,
    pub total_borrows: i128,
    pub total_reserves: i128,
}

// ============================================================================
// CONTRACT
// ============================================================================

#[contract]
pub struct CTokenPool;

#[contractimpl]
impl CTokenPool {
    /// Creates the pool.
    ///
    /// # Arguments
    /// * `admin` - Drives borrows and interest accrual
    /// * `underlying` - Token supplied to the pool
    /// * `rate_model` - Curve used for `supply_rate`/`borrow_rate`
    /// * `initial_exchange_rate` - Price of the first cToken, scaled by 1e18
    ///
    /// # Errors
    /// - `AlreadyInitialized` on a second call
    /// - `InvalidRateModel` for out-of-range model parameters
    /// - `InvalidAmount` for a non-positive exchange rate
    pub fn initialize(
        env: Env,
        admin: Address,
        underlying: Address,
        rate_model: RateModel,
        initial_exchange_rate: i128,
    ) -> Result<(), SaverError> {
        if env.storage().instance().has(&DataKey::Admin) {
            return Err(SaverError::AlreadyInitialized);
        }
        rate_model.validate()?;
        if initial_exchange_rate <= 0 {
            return Err(SaverError::InvalidAmount);
        }

        let storage = env.storage().instance();
        storage.set(&DataKey::Admin, &admin);
        storage.set(&DataKey::Underlying, &underlying);
        storage.set(&DataKey::RateModel, &rate_model);
        storage.set(&DataKey::InitialExchangeRate, &initial_exchange_rate);
        storage.set(&DataKey::TotalSupply, &0_i128);
        storage.set(&DataKey::Cash, &0_i128);
        storage.set(&DataKey::Borrows, &0_i128);
        storage.set(&DataKey::Reserves, &0_i128);
        storage.extend_ttl(TTL_THRESHOLD, TTL_EXTEND_TO);
        Ok(())
    }

    pub fn total_supply(env: Env) -> i128 {
        read_i128(&env, &DataKey::TotalSupply)
    }

    /// Current supply rate per block.
    pub fn supply_rate(env: Env) -> Result<i128, SaverError> {
        let model = Self::rate_model(env.clone())?;
        model.supply_rate(
            &env,
            read_i128(&env, &DataKey::Cash),
            read_i128(&env, &DataKey::Borrows),
            read_i128(&env, &DataKey::Reserves),
            0,
        )
    }

    /// Current borrow rate per block.
    pub fn borrow_rate(env: Env) -> Result<i128, SaverError> {
        let model = Self::rate_model(env.clone())?;
        model.borrow_rate(
            &env,
            read_i128(&env, &DataKey::Cash),
            read_i128(&env, &DataKey::Borrows),
            read_i128(&env, &DataKey::Reserves),
            0,
        )
    }

    /// Lends `amount` of pool cash to `to`.
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
        let borrows = checked_add(read_i128(&env, &DataKey::Borrows), amount)?;
        env.storage().instance().set(&DataKey::Cash, &(cash - amount));
        env.storage().instance().set(&DataKey::Borrows, &borrows);

        underlying_client(&env)?.transfer(&env.current_contract_address(), &to, &amount);

        env.events().publish(
            (symbol_short!("borrow"),),
            BorrowEvent { account: to, amount, total_borrows: borrows },
        );
        Ok(())
    }

    /// Pulls `amount` from `from` and pays down borrows.
    ///
    /// # Errors
    /// - `InvalidAmount` if `amount` exceeds outstanding borrows
    pub fn repay(env: Env, from: Address, amount: i128) -> Result<(), SaverError> {
        from.require_auth();
        require_positive(amount)?;

        let borrows = read_i128(&env, &DataKey::Borrows);
        if amount > borrows {
            return Err(SaverError::InvalidAmount);
        }
        underlying_client(&env)?.transfer(&from, &env.current_contract_address(), &amount);

        let cash = checked_add(read_i128(&env, &DataKey::Cash), amount)?;
        env.storage().instance().set(&DataKey::Cash, &cash);
        env.storage().instance().set(&DataKey::Borrows, &(borrows - amount));

        env.events().publish(
            (symbol_short!("repay"),),
            BorrowEvent { account: from, amount, total_borrows: borrows - amount },
        );
        Ok(())
    }

    /// Adds `interest` to borrows; the reserve-factor share goes to reserves.
    pub fn accrue(env: Env, interest: i128) -> Result<(), SaverError> {
        require_admin(&env)?;
        require_positive(interest)?;

        let model = Self::rate_model(env.clone())?;
        let to_reserves = mul_div_floor(&env, interest, model.reserve_factor(), WAD)?;
        let borrows = checked_add(read_i128(&env, &DataKey::Borrows), interest)?;
        let reserves = checked_add(read_i128(&env, &DataKey::Reserves), to_reserves)?;
        env.storage().instance().set(&DataKey::Borrows, &borrows);
        env.storage().instance().set(&DataKey::Reserves, &reserves);

        env.events().publish(
            (symbol_short!("accrue"),),
            AccrueEvent { interest, total_borrows: borrows, total_reserves: reserves },
        );
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
impl CTokenInterface for CTokenPool {
    fn underlying(env: Env) -> Result<Address, SaverError> {
        env.storage().instance().get(&DataKey::Underlying).ok_or(SaverError::NotInitialized)
    }

    /// Books `amount` of underlying previously transferred by `minter`.
    ///
    /// # Errors
    /// - `InsufficientBalance` if the pool did not receive `amount`
    /// - `InvalidAmount` if `amount` is worth less than one cToken unit
    ///
    /// # Events
    /// Emits `MintEvent`
    fn mint(env: Env, minter: Address, amount: i128) -> Result<i128, SaverError> {
        minter.require_auth();
        require_positive(amount)?;

        let cash = read_i128(&env, &DataKey::Cash);
        let held = underlying_client(&env)?.balance(&env.current_contract_address());
        if held < checked_add(cash, amount)? {
            return Err(SaverError::InsufficientBalance);
        }

        let rate = Self::exchange_rate(env.clone())?;
        let ctokens = mul_div_floor(&env, amount, WAD, rate)?;
        if ctokens == 0 {
            return Err(SaverError::InvalidAmount);
        }

        let balance = checked_add(Self::balance_of(env.clone(), minter.clone()), ctokens)?;
        let supply = checked_add(read_i128(&env, &DataKey::TotalSupply), ctokens)?;
        write_balance(&env, &minter, balance);
        env.storage().instance().set(&DataKey::TotalSupply, &supply);
        env.storage().instance().set(&DataKey::Cash, &(cash + amount));
        env.storage().instance().extend_ttl(TTL_THRESHOLD, TTL_EXTEND_TO);

        env.events().publish(
            (symbol_short!("mint"),),
            MintEvent { minter, amount, ctokens },
        );
        Ok(ctokens)
    }

    /// Sends exactly `amount` of underlying to `redeemer`, burning the cTokens
    /// it is worth rounded up.
    ///
    /// # Errors
    /// - `InsufficientLiquidity` if pool cash is below `amount`
    /// - `InsufficientBalance` if `redeemer` holds too few cTokens
    ///
    /// # Events
    /// Emits `RedeemEvent`
    fn redeem_underlying(env: Env, redeemer: Address, amount: i128) -> Result<i128, SaverError> {
        redeemer.require_auth();
        require_positive(amount)?;

        let cash = read_i128(&env, &DataKey::Cash);
        if cash < amount {
            return Err(SaverError::InsufficientLiquidity);
        }

        let rate = Self::exchange_rate(env.clone())?;
        let ctokens = mul_div_ceil(&env, amount, WAD, rate)?;
        let balance = Self::balance_of(env.clone(), redeemer.clone());
        if balance < ctokens {
            return Err(SaverError::InsufficientBalance);
        }

        let supply = checked_sub(read_i128(&env, &DataKey::TotalSupply), ctokens)?;
        write_balance(&env, &redeemer, balance - ctokens);
        env.storage().instance().set(&DataKey::TotalSupply, &supply);
        env.storage().instance().set(&DataKey::Cash, &(cash - amount));
        env.storage().instance().extend_ttl(TTL_THRESHOLD, TTL_EXTEND_TO);

        underlying_client(&env)?.transfer(&env.current_contract_address(), &redeemer, &amount);

        env.events().publish(
            (symbol_short!("redeem"),),
            RedeemEvent { redeemer, amount, ctokens },
        );
        Ok(ctokens)
    }

    fn balance_of(env: Env, id: Address) -> i128 {
        env.storage()
            .persistent()
            .get(&DataKey::Balance(id))
            .unwrap_or(0)
    }

    fn exchange_rate(env: Env) -> Result<i128, SaverError> {
        let supply = read_i128(&env, &DataKey::TotalSupply);
        if supply == 0 {
            return Ok(read_i128(&env, &DataKey::InitialExchangeRate));
        }
        let assets = checked_sub(
            checked_add(read_i128(&env, &DataKey::Cash), read_i128(&env, &DataKey::Borrows))?,
            read_i128(&env, &DataKey::Reserves),
        )?;
        mul_div_floor(&env, assets, WAD, supply)
    }

    fn cash(env: Env) -> i128 {
        read_i128(&env, &DataKey::Cash)
    }

    fn total_borrows(env: Env) -> i128 {
        read_i128(&env, &DataKey::Borrows)
    }

    fn total_reserves(env: Env) -> i128 {
        read_i128(&env, &DataKey::Reserves)
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

fn underlying_client(env: &Env) -> Result<token::Client<'_>, SaverError> {
    let underlying: Address = env.storage()
        .instance()
        .get(&DataKey::Underlying)
        .ok_or(SaverError::NotInitialized)?;
    Ok(token::Client::new(env, &underlying))
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

mod test;
