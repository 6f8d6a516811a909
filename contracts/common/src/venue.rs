//! Interfaces of the lending pools the adapters integrate with.
//!
//! The two conventions differ on purpose:
//!
//! | | cToken | ibToken |
//! |---|---|---|
//! | venue token decimals | 8 | same as underlying |
//! | price of one venue token | `exchange_rate / 1e18` | `total_token / total_supply` |
//! | redeem argument | underlying amount | shares |
//! | borrows / reserves | `total_borrows` / `total_reserves` | `vault_debt_val` / `reserve_pool` |
//!
//! In both, funds are transferred to the pool before `mint`/`deposit` is
//! called; the pool books whatever it received above its tracked cash.

use soroban_sdk::{contractclient, Address, Env};

use crate::error::SaverError;
use crate::rate_model::RateModel;

#[contractclient(name = "CTokenClient")]
pub trait CTokenInterface {
    fn underlying(env: Env) -> Result<Address, SaverError>;

    /// Books `amount` of underlying already sent by `minter`. Returns cTokens minted.
    fn mint(env: Env, minter: Address, amount: i128) -> Result<i128, SaverError>;

    /// Sends exactly `amount` of underlying to `redeemer`. Returns cTokens burned.
    fn redeem_underlying(env: Env, redeemer: Address, amount: i128) -> Result<i128, SaverError>;

    fn balance_of(env: Env, id: Address) -> i128;

    /// Underlying per cToken, scaled by 1e18.
    fn exchange_rate(env: Env) -> Result<i128, SaverError>;

    fn cash(env: Env) -> i128;

    fn total_borrows(env: Env) -> i128;

    fn total_reserves(env: Env) -> i128;

    fn rate_model(env: Env) -> Result<RateModel, SaverError>;
}

#[contractclient(name = "IbTokenClient")]
pub trait IbTokenInterface {
    fn token(env: Env) -> Result<Address, SaverError>;

    /// Books `amount` of underlying already sent by `from`. Returns shares minted.
    fn deposit(env: Env, from: Address, amount: i128) -> Result<i128, SaverError>;

    /// Burns `share` shares of `to` and sends their value to `to`. Returns the amount sent.
    fn withdraw(env: Env, to: Address, share: i128) -> Result<i128, SaverError>;

    fn balance_of(env: Env, id: Address) -> i128;

    fn total_supply(env: Env) -> i128;

    /// `cash + vault_debt_val - reserve_pool`.
    fn total_token(env: Env) -> Result<i128, SaverError>;

    fn cash(env: Env) -> i128;

    fn vault_debt_val(env: Env) -> i128;

    fn reserve_pool(env: Env) -> i128;

    fn rate_model(env: Env) -> Result<RateModel, SaverError>;
}
