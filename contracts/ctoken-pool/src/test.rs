#![cfg(test)]

use super::*;
use saver_common::WhitePaperModel;
use soroban_sdk::{testutils::Address as _, token, Address, Env};

const ONE: i128 = WAD;

struct Setup<'a> {
    env: Env,
    pool_id: Address,
    pool: CTokenPoolClient<'a>,
    token: token::Client<'a>,
    supplier: Address,
}

fn setup_pool<'a>() -> Setup<'a> {
    let env = Env::default();
    env.mock_all_auths();

    let admin = Address::generate(&env);
    let token_id = env.register_stellar_asset_contract(admin.clone());
    let token = token::Client::new(&env, &token_id);
    let supplier = Address::generate(&env);
    token::StellarAssetClient::new(&env, &token_id).mint(&supplier, &(1_000 * ONE));

    let pool_id = env.register_contract(None, CTokenPool);
    let pool = CTokenPoolClient::new(&env, &pool_id);
    let model = RateModel::WhitePaper(WhitePaperModel {
        base_rate: ONE / 20,
        multiplier: ONE / 5,
        reserve_factor: ONE / 10,
    });
    pool.initialize(&admin, &token_id, &model, &INITIAL_EXCHANGE_RATE);

    Setup { env, pool_id, pool, token, supplier }
}

fn supply(s: &Setup, from: &Address, amount: i128) -> i128 {
    s.token.transfer(from, &s.pool_id, &amount);
    s.pool.mint(from, &amount)
}

#[test]
fn test_mint_at_initial_exchange_rate() {
    let s = setup_pool();

    let ctokens = supply(&s, &s.supplier, 100 * ONE);

    // 100 underlying at 0.02 per cToken = 5000 cTokens of 8 decimals
    assert_eq!(ctokens, 500_000_000_000);
    assert_eq!(s.pool.balance_of(&s.supplier), 500_000_000_000);
    assert_eq!(s.pool.cash(), 100 * ONE);
    assert_eq!(s.pool.exchange_rate(), INITIAL_EXCHANGE_RATE);
}

#[test]
fn test_mint_requires_transfer() {
    let s = setup_pool();

    assert_eq!(
        s.pool.try_mint(&s.supplier, &(10 * ONE)),
        Err(Ok(SaverError::InsufficientBalance))
    );
}

#[test]
fn test_mint_dust_rejected() {
    let s = setup_pool();

    s.token.transfer(&s.supplier, &s.pool_id, &1);
    assert_eq!(s.pool.try_mint(&s.supplier, &1), Err(Ok(SaverError::InvalidAmount)));
}

#[test]
fn test_redeem_underlying_round_trip() {
    let s = setup_pool();
    supply(&s, &s.supplier, 100 * ONE);

    let burned = s.pool.redeem_underlying(&s.supplier, &(40 * ONE));

    assert_eq!(burned, 200_000_000_000);
    assert_eq!(s.pool.balance_of(&s.supplier), 300_000_000_000);
    assert_eq!(s.token.balance(&s.supplier), 940 * ONE);
    assert_eq!(s.pool.cash(), 60 * ONE);
}

#[test]
fn test_borrowed_cash_cannot_be_redeemed() {
    let s = setup_pool();
    let borrower = Address::generate(&s.env);
    supply(&s, &s.supplier, 100 * ONE);

    s.pool.borrow(&borrower, &(70 * ONE));

    assert_eq!(s.pool.cash(), 30 * ONE);
    assert_eq!(s.pool.total_borrows(), 70 * ONE);
    assert_eq!(
        s.pool.try_redeem_underlying(&s.supplier, &(31 * ONE)),
        Err(Ok(SaverError::InsufficientLiquidity))
    );
    assert_eq!(
        s.pool.try_borrow(&borrower, &(31 * ONE)),
        Err(Ok(SaverError::InsufficientLiquidity))
    );

    s.pool.repay(&borrower, &(20 * ONE));
    assert_eq!(s.pool.cash(), 50 * ONE);
    s.pool.redeem_underlying(&s.supplier, &(50 * ONE));
}

#[test]
fn test_accrue_raises_exchange_rate() {
    let s = setup_pool();
    let borrower = Address::generate(&s.env);
    supply(&s, &s.supplier, 100 * ONE);
    s.pool.borrow(&borrower, &(50 * ONE));

    s.pool.accrue(&(10 * ONE));

    // 1 of the 10 goes to reserves: assets = 50 + 60 - 1
    assert_eq!(s.pool.total_reserves(), ONE);
    assert_eq!(s.pool.exchange_rate(), 109 * ONE * ONE / 500_000_000_000);
}

#[test]
fn test_supply_rate_follows_model() {
    let s = setup_pool();
    let borrower = Address::generate(&s.env);
    supply(&s, &s.supplier, 100 * ONE);

    assert_eq!(s.pool.supply_rate(), 0);

    s.pool.borrow(&borrower, &(50 * ONE));
    assert_eq!(s.pool.borrow_rate(), 150_000_000_000_000_000);
    assert_eq!(s.pool.supply_rate(), 67_500_000_000_000_000);
}

#[test]
fn test_initialize_once() {
    let s = setup_pool();
    let model = s.pool.rate_model();

    assert_eq!(
        s.pool.try_initialize(
            &Address::generate(&s.env),
            &s.token.address,
            &model,
            &INITIAL_EXCHANGE_RATE,
        ),
        Err(Ok(SaverError::AlreadyInitialized))
    );
}

#[test]
fn test_uninitialized_pool_reports_error() {
    let env = Env::default();
    env.mock_all_auths();
    let pool = CTokenPoolClient::new(&env, &env.register_contract(None, CTokenPool));

    assert_eq!(pool.try_underlying(), Err(Ok(SaverError::NotInitialized)));
    assert_eq!(pool.try_rate_model(), Err(Ok(SaverError::NotInitialized)));
    assert_eq!(
        pool.try_mint(&Address::generate(&env), &ONE),
        Err(Ok(SaverError::NotInitialized))
    );
}
