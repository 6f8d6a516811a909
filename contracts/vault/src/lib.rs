//! # Saver Vault Contract
//!
//! Single-asset yield vault on Soroban. The vault holds a set of lending
//! adapters and, per asset, a link to an allocation table. On `rebalance` it
//! moves funds between the adapters so that each one holds its target share
//! of everything the vault manages for that asset.
//!
//! ## Architecture Overview
//!
//! ```text
//!                     ┌────────────────────┐
//!   owner / agent ──▶ │       Saver        │ ──reads──▶ AllocationTable(asset)
//!                     └─────────┬──────────┘
//!                               │ LendingAdapter
//!                 ┌─────────────┴─────────────┐
//!          VenusAdapter                 AlpacaAdapter
//!                 │   VenueRouter.resolve     │
//!          CTokenPool(asset)            IbTokenPool(asset)
//! ```
//!
//! ## Accounting Model
//!
//! The vault keeps no ledger of its own. The amount managed for an asset is
//! recomputed on every call:
//!
//! ```text
//! get_amount(asset) = idle + Σ adapter_i.balance(asset)
//! ```
//!
//! where `idle` is the vault's own token balance. Funds enter through
//! `deposit` and leave only through `withdraw`, which the owner authorizes.
//!
//! ## Rebalance
//!
//! 1. Snapshot idle, each adapter's balance and its withdrawable amount
//! 2. `target_i = total * weight_i / FULL_SCALE`, rounded down; adapters the
//!    table does not list target 0
//! 3. Withdraw every excess, capped by what the venue can pay out
//! 4. Deposit into every deficit in table order, capped by idle funds;
//!    a deficit worth less than one venue token unit stays idle
//!
//! Whatever an illiquid venue could not release is reported as `shortfall`
//! and picked up by a later call. Idle funds left behind are the `N - 1`
//! units of target rounding plus deficits below a venue's `min_deposit`.
//!
//! ## Storage Layout
//!
//! ### Instance Storage
//! - `Owner`: administrative and custody authority
//! - `Agent`: may trigger `rebalance`
//! - `Adaptors`: the adapter set, in vault order
//! - `Paused`: emergency switch for deposit, withdraw and rebalance
//! - `Version`: contract version for upgrade tracking
//!
//! ### Persistent Storage
//! - `Rebalancer(asset)`: allocation table bound to an asset
//!
//! # Examples
//!
//! ```ignore
//! vault.deposit(&user, &asset, &amount);
//! vault.rebalance(&agent, &asset);
//! vault.withdraw(&owner, &asset, &amount, &recipient);
//! ```

#![no_std]

use saver_common::fixed::{checked_add, checked_sub, mul_div_floor};
use saver_common::{
    settle, AdapterClient, AllocationTableClient, SaverError, FULL_SCALE, PERCENT_SCALE,
    TTL_EXTEND_TO, TTL_THRESHOLD,
};
use soroban_sdk::{
    contract, contractimpl, contracttype, log, symbol_short, token, Address, Env, Vec,
};

/// Current contract version.
pub const VERSION: u32 = 1;

// ============================================================================
// STORAGE KEYS
// ============================================================================

#[contracttype]
pub enum DataKey {
    /// Administrative and custody authority
    Owner,
    /// Address allowed to call `rebalance` besides the owner
    Agent,
    /// Adapter set, in vault order
    Adaptors,
    /// When true, deposit, withdraw and rebalance are disabled
    Paused,
    Version,
    /// Allocation table of an asset (persistent)
    Rebalancer(Address),
}

// ============================================================================
// EVENTS
// ============================================================================

/// Emitted when funds enter the vault.
///
/// # Topics
/// - `SymbolShort("deposit")`
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DepositEvent {
    pub from: Address,
    pub asset: Address,
    pub amount: i128,
}

/// Emitted when the owner takes funds out of the vault.
///
/// # Topics
/// - `SymbolShort("withdraw")`
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WithdrawEvent {
    pub asset: Address,
    pub recipient: Address,
    pub amount: i128,
}

/// Outcome of one `rebalance` call, also published as its event payload.
///
/// # Topics
/// - `SymbolShort("rebalance")`
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RebalanceSummary {
    pub asset: Address,
    /// Managed amount at snapshot time
    pub total: i128,
    /// Received from adapters above target
    pub withdrawn: i128,
    /// Placed into adapters below target
    pub deposited: i128,
    /// Excess an illiquid venue could not release
    pub shortfall: i128,
    /// Idle balance left in the vault
    pub idle: i128,
}

/// # Topics
/// - `SymbolShort("pause")`
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PauseEvent {
    pub paused: bool,
    pub caller: Address,
}

/// # Topics
/// - `SymbolShort("agent")`
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AgentUpdatedEvent {
    pub old_agent: Address,
    pub new_agent: Address,
}

/// # Topics
/// - `SymbolShort("adaptors")`
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AdaptorsSetEvent {
    pub adaptors: Vec<Address>,
}

/// # Topics
/// - `SymbolShort("tbl_set")`
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RebalancerSetEvent {
    pub asset: Address,
    pub table: Address,
}

// ============================================================================
// CONTRACT
// ============================================================================

/// Saver - allocation-driven lending vault
///
/// # Security Model
///
/// - Only the owner wires adapters and tables, pauses, and withdraws
/// - The agent (or the owner) may rebalance; rebalancing never moves funds
///   out of the vault's own positions
/// - Allocation weights are set by the table authority, who holds no custody
/// - Every privileged entry point takes the caller explicitly, requires its
///   authorization and compares it with the stored role
#[contract]
pub struct Saver;

#[contractimpl]
impl Saver {
    // ==========================================================================
    // INITIALIZATION
    // ==========================================================================

    /// Initializes the vault with its two roles.
    ///
    /// # Arguments
    /// * `owner` - Administrative and custody authority
    /// * `agent` - Address allowed to call `rebalance`
    ///
    /// # Errors
    /// - `AlreadyInitialized` on a second call
    pub fn initialize(env: Env, owner: Address, agent: Address) -> Result<(), SaverError> {
        if env.storage().instance().has(&DataKey::Owner) {
            return Err(SaverError::AlreadyInitialized);
        }

        let storage = env.storage().instance();
        storage.set(&DataKey::Owner, &owner);
        storage.set(&DataKey::Agent, &agent);
        storage.set(&DataKey::Adaptors, &Vec::<Address>::new(&env));
        storage.set(&DataKey::Paused, &false);
        storage.set(&DataKey::Version, &VERSION);
        bump_instance(&env);
        Ok(())
    }

    // ==========================================================================
    // CONFIGURATION
    // ==========================================================================

    /// Replaces the adapter set. The order given is the vault order used by
    /// `get_rates`, `current_amounts` and the withdraw phase of `rebalance`.
    ///
    /// # Errors
    /// - `Unauthorized` if `caller` is not the owner
    /// - `EmptyAdapterSet` if `adaptors` is empty
    /// - `DuplicateAdapter` if an adapter is listed twice
    pub fn set_adaptors(
        env: Env,
        caller: Address,
        adaptors: Vec<Address>,
    ) -> Result<(), SaverError> {
        require_owner(&env, &caller)?;
        if adaptors.is_empty() {
            return Err(SaverError::EmptyAdapterSet);
        }
        for (i, adaptor) in adaptors.iter().enumerate() {
            if adaptors.first_index_of(&adaptor) != Some(i as u32) {
                return Err(SaverError::DuplicateAdapter);
            }
        }

        env.storage().instance().set(&DataKey::Adaptors, &adaptors);
        bump_instance(&env);

        env.events().publish(
            (symbol_short!("adaptors"),),
            AdaptorsSetEvent { adaptors },
        );
        Ok(())
    }

    pub fn all_adaptors(env: Env) -> Vec<Address> {
        read_adaptors(&env)
    }

    /// Binds `asset` to the allocation table that drives its rebalancing.
    pub fn set_token_rebalancer(
        env: Env,
        caller: Address,
        asset: Address,
        table: Address,
    ) -> Result<(), SaverError> {
        require_owner(&env, &caller)?;

        let key = DataKey::Rebalancer(asset.clone());
        env.storage().persistent().set(&key, &table);
        env.storage().persistent().extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
        bump_instance(&env);

        env.events().publish(
            (symbol_short!("tbl_set"),),
            RebalancerSetEvent { asset, table },
        );
        Ok(())
    }

    /// # Errors
    /// - `RebalancerNotSet` if no table is bound to `asset`
    pub fn token_rebalancer(env: Env, asset: Address) -> Result<Address, SaverError> {
        env.storage()
            .persistent()
            .get(&DataKey::Rebalancer(asset))
            .ok_or(SaverError::RebalancerNotSet)
    }

    // ==========================================================================
    // CORE LIFECYCLE - DEPOSIT
    // ==========================================================================

    /// Moves `amount` of `asset` from `from` into the vault's idle balance.
    /// Funds reach the venues on the next `rebalance`.
    ///
    /// # Errors
    /// - `Paused` while the vault is paused
    /// - `InvalidAmount` if `amount` is not positive
    ///
    /// # Events
    /// Emits `DepositEvent`
    pub fn deposit(
        env: Env,
        from: Address,
        asset: Address,
        amount: i128,
    ) -> Result<(), SaverError> {
        from.require_auth();
        require_not_paused(&env)?;
        require_positive(amount)?;

        token::Client::new(&env, &asset).transfer(&from, &env.current_contract_address(), &amount);
        bump_instance(&env);

        env.events().publish(
            (symbol_short!("deposit"),),
            DepositEvent { from, asset, amount },
        );
        Ok(())
    }

    // ==========================================================================
    // CORE LIFECYCLE - REBALANCE
    // ==========================================================================

    /// Moves funds between adapters until each holds its target share of the
    /// managed amount, as far as venue liquidity allows.
    ///
    /// Safe to call repeatedly: once targets are reached it moves nothing.
    ///
    /// # Arguments
    /// * `caller` - The agent or the owner
    /// * `asset` - Asset whose allocation table is applied
    ///
    /// # Errors
    /// - `Unauthorized` if `caller` is neither agent nor owner
    /// - `Paused` while the vault is paused
    /// - `RebalancerNotSet` if no table is bound to `asset`
    /// - `UnknownAdapter` if the table lists an adapter outside the vault set
    /// - any adapter error, unchanged
    ///
    /// # Events
    /// Emits the returned `RebalanceSummary`
    pub fn rebalance(
        env: Env,
        caller: Address,
        asset: Address,
    ) -> Result<RebalanceSummary, SaverError> {
        caller.require_auth();
        if caller != read_owner(&env)? && caller != read_agent(&env)? {
            return Err(SaverError::Unauthorized);
        }
        require_not_paused(&env)?;

        let table = Self::token_rebalancer(env.clone(), asset.clone())?;
        let (table_adaptors, weights) = AllocationTableClient::new(&env, &table).get_allocations();
        let adaptors = read_adaptors(&env);
        if adaptors.is_empty() {
            return Err(SaverError::EmptyAdapterSet);
        }
        for adaptor in table_adaptors.iter() {
            if !adaptors.contains(&adaptor) {
                return Err(SaverError::UnknownAdapter);
            }
        }

        let vault = env.current_contract_address();
        let token = token::Client::new(&env, &asset);
        let idle = token.balance(&vault);

        let mut currents = Vec::<i128>::new(&env);
        let mut withdrawable = Vec::<i128>::new(&env);
        let mut total = idle;
        for adaptor in adaptors.iter() {
            let client = AdapterClient::new(&env, &adaptor);
            let current = settle(client.try_balance(&asset))?;
            currents.push_back(current);
            withdrawable.push_back(settle(client.try_max_withdraw(&asset))?);
            total = checked_add(total, current)?;
        }

        let mut targets = Vec::<i128>::new(&env);
        for adaptor in adaptors.iter() {
            let weight = match table_adaptors.first_index_of(&adaptor) {
                Some(i) => weights.get(i).unwrap_or(0),
                None => 0,
            };
            targets.push_back(mul_div_floor(&env, total, weight, FULL_SCALE)?);
        }
        log!(&env, "rebalance targets", asset, total, targets);

        let mut withdrawn = 0_i128;
        let mut shortfall = 0_i128;
        for (i, adaptor) in adaptors.iter().enumerate() {
            let i = i as u32;
            let current = currents.get(i).unwrap_or(0);
            let target = targets.get(i).unwrap_or(0);
            if current <= target {
                continue;
            }
            let excess = current - target;
            let amount = excess.min(withdrawable.get(i).unwrap_or(0));
            if amount < excess {
                log!(&env, "venue illiquid", adaptor, excess - amount);
                shortfall = checked_add(shortfall, excess - amount)?;
            }
            if amount > 0 {
                let client = AdapterClient::new(&env, &adaptor);
                let received = settle(client.try_withdraw(&asset, &amount))?;
                withdrawn = checked_add(withdrawn, received)?;
            }
        }

        let mut deposited = 0_i128;
        for adaptor in table_adaptors.iter() {
            let Some(i) = adaptors.first_index_of(&adaptor) else {
                continue;
            };
            let current = currents.get(i).unwrap_or(0);
            let target = targets.get(i).unwrap_or(0);
            if current >= target {
                continue;
            }
            let amount = (target - current).min(token.balance(&vault));
            if amount <= 0 {
                continue;
            }
            let client = AdapterClient::new(&env, &adaptor);
            if amount < settle(client.try_min_deposit(&asset))? {
                log!(&env, "below venue unit", adaptor, amount);
                continue;
            }
            token.transfer(&vault, &adaptor, &amount);
            settle(client.try_deposit(&asset, &amount))?;
            deposited = checked_add(deposited, amount)?;
        }

        let summary = RebalanceSummary {
            asset,
            total,
            withdrawn,
            deposited,
            shortfall,
            idle: token.balance(&vault),
        };
        bump_instance(&env);

        env.events().publish((symbol_short!("rebalance"),), summary.clone());
        Ok(summary)
    }

    // ==========================================================================
    // CORE LIFECYCLE - WITHDRAW
    // ==========================================================================

    /// Sends exactly `amount` of `asset` to `recipient`.
    ///
    /// Idle funds are used first, then adapters in table order, then the
    /// adapters the table does not list. Each adapter gives at most its
    /// balance. The remaining positions are not rebalanced.
    ///
    /// # Errors
    /// - `Unauthorized` if `caller` is not the owner
    /// - `Paused` while the vault is paused
    /// - `InvalidAmount` if `amount` is not positive
    /// - `InsufficientLiquidity` if the vault manages less than `amount`, or
    ///   if a venue cannot pay out its part
    ///
    /// # Events
    /// Emits `WithdrawEvent`
    pub fn withdraw(
        env: Env,
        caller: Address,
        asset: Address,
        amount: i128,
        recipient: Address,
    ) -> Result<(), SaverError> {
        require_owner(&env, &caller)?;
        require_not_paused(&env)?;
        require_positive(amount)?;

        let order = withdraw_order(&env, &asset);
        let vault = env.current_contract_address();
        let token = token::Client::new(&env, &asset);
        let idle = token.balance(&vault);

        let mut balances = Vec::<i128>::new(&env);
        let mut total = idle;
        for adaptor in order.iter() {
            let balance = settle(AdapterClient::new(&env, &adaptor).try_balance(&asset))?;
            balances.push_back(balance);
            total = checked_add(total, balance)?;
        }
        if total < amount {
            return Err(SaverError::InsufficientLiquidity);
        }

        let mut remaining = amount - idle.min(amount);
        for (i, adaptor) in order.iter().enumerate() {
            if remaining == 0 {
                break;
            }
            let take = remaining.min(balances.get(i as u32).unwrap_or(0));
            if take > 0 {
                let client = AdapterClient::new(&env, &adaptor);
                let received = settle(client.try_withdraw(&asset, &take))?;
                remaining = checked_sub(remaining, received.min(remaining))?;
            }
        }
        if remaining > 0 {
            return Err(SaverError::InsufficientLiquidity);
        }

        token.transfer(&vault, &recipient, &amount);
        bump_instance(&env);

        env.events().publish(
            (symbol_short!("withdraw"),),
            WithdrawEvent { asset, recipient, amount },
        );
        Ok(())
    }

    // ==========================================================================
    // ADMINISTRATIVE - PAUSE CONTROL
    // ==========================================================================

    /// Pauses the vault. Deposits, withdrawals and rebalancing are rejected
    /// with `Paused`; read functions keep working.
    pub fn pause(env: Env, caller: Address) -> Result<(), SaverError> {
        require_owner(&env, &caller)?;
        set_paused(&env, caller, true);
        Ok(())
    }

    pub fn unpause(env: Env, caller: Address) -> Result<(), SaverError> {
        require_owner(&env, &caller)?;
        set_paused(&env, caller, false);
        Ok(())
    }

    pub fn is_paused(env: Env) -> bool {
        env.storage().instance()
            .get(&DataKey::Paused)
            .unwrap_or(false)
    }

    /// Hands the rebalancing role to `agent`.
    pub fn update_agent(env: Env, caller: Address, agent: Address) -> Result<(), SaverError> {
        require_owner(&env, &caller)?;

        let old_agent = read_agent(&env)?;
        env.storage().instance().set(&DataKey::Agent, &agent);
        bump_instance(&env);

        env.events().publish(
            (symbol_short!("agent"),),
            AgentUpdatedEvent { old_agent, new_agent: agent },
        );
        Ok(())
    }

    // ==========================================================================
    // READ FUNCTIONS
    // ==========================================================================

    /// Total managed for `asset`: idle balance plus every adapter's balance.
    pub fn get_amount(env: Env, asset: Address) -> Result<i128, SaverError> {
        let mut total = token::Client::new(&env, &asset).balance(&env.current_contract_address());
        for balance in Self::current_amounts(env.clone(), asset)?.iter() {
            total = checked_add(total, balance)?;
        }
        Ok(total)
    }

    /// Balance-weighted supply rate of the managed amount, per second, WAD
    /// scaled. Idle funds count with a rate of 0.
    pub fn get_rate(env: Env, asset: Address) -> Result<i128, SaverError> {
        let total = Self::get_amount(env.clone(), asset.clone())?;
        if total == 0 {
            return Ok(0);
        }

        let rates = Self::get_rates(env.clone(), asset.clone())?;
        let amounts = Self::current_amounts(env.clone(), asset)?;
        let mut rate = 0_i128;
        for (rate_i, amount_i) in rates.iter().zip(amounts.iter()) {
            rate = checked_add(rate, mul_div_floor(&env, rate_i, amount_i, total)?)?;
        }
        Ok(rate)
    }

    /// Current supply rate of each adapter's venue, in vault order.
    pub fn get_rates(env: Env, asset: Address) -> Result<Vec<i128>, SaverError> {
        let mut rates = Vec::new(&env);
        for adaptor in read_adaptors(&env).iter() {
            let client = AdapterClient::new(&env, &adaptor);
            rates.push_back(settle(client.try_projected_rate(&asset, &0))?);
        }
        Ok(rates)
    }

    /// Target allocation of `asset` in table order, each weight expressed in
    /// percentage points times 1e18 (20% = 20e18).
    pub fn current_allocations(
        env: Env,
        asset: Address,
    ) -> Result<(Vec<Address>, Vec<i128>), SaverError> {
        let table = Self::token_rebalancer(env.clone(), asset)?;
        let (adaptors, weights) = AllocationTableClient::new(&env, &table).get_allocations();

        let mut percents = Vec::new(&env);
        for weight in weights.iter() {
            percents.push_back(mul_div_floor(&env, weight, PERCENT_SCALE, FULL_SCALE)?);
        }
        Ok((adaptors, percents))
    }

    /// Balance of each adapter, in vault order.
    pub fn current_amounts(env: Env, asset: Address) -> Result<Vec<i128>, SaverError> {
        let mut amounts = Vec::new(&env);
        for adaptor in read_adaptors(&env).iter() {
            amounts.push_back(settle(AdapterClient::new(&env, &adaptor).try_balance(&asset))?);
        }
        Ok(amounts)
    }

    pub fn get_owner(env: Env) -> Result<Address, SaverError> {
        read_owner(&env)
    }

    pub fn get_agent(env: Env) -> Result<Address, SaverError> {
        read_agent(&env)
    }

    pub fn get_version(env: Env) -> u32 {
        env.storage().instance()
            .get(&DataKey::Version)
            .unwrap_or(VERSION)
    }
}

// ============================================================================
// INTERNAL HELPERS
// ============================================================================

fn read_owner(env: &Env) -> Result<Address, SaverError> {
    env.storage().instance().get(&DataKey::Owner).ok_or(SaverError::NotInitialized)
}

fn read_agent(env: &Env) -> Result<Address, SaverError> {
    env.storage().instance().get(&DataKey::Agent).ok_or(SaverError::NotInitialized)
}

fn read_adaptors(env: &Env) -> Vec<Address> {
    env.storage().instance()
        .get(&DataKey::Adaptors)
        .unwrap_or(Vec::new(env))
}

/// Table adapters first, in table order, then the rest of the vault set.
/// Without a table the vault order is used.
fn withdraw_order(env: &Env, asset: &Address) -> Vec<Address> {
    let adaptors = read_adaptors(env);
    let key = DataKey::Rebalancer(asset.clone());
    let table: Option<Address> = env.storage().persistent().get(&key);
    let Some(table) = table else {
        return adaptors;
    };

    let (table_adaptors, _) = AllocationTableClient::new(env, &table).get_allocations();
    let mut order = Vec::new(env);
    for adaptor in table_adaptors.iter() {
        if adaptors.contains(&adaptor) {
            order.push_back(adaptor);
        }
    }
    for adaptor in adaptors.iter() {
        if !order.contains(&adaptor) {
            order.push_back(adaptor);
        }
    }
    order
}

fn set_paused(env: &Env, caller: Address, paused: bool) {
    env.storage().instance().set(&DataKey::Paused, &paused);
    bump_instance(env);

    env.events().publish(
        (symbol_short!("pause"),),
        PauseEvent { paused, caller },
    );
}

/// Requires `caller`'s authorization and that it is the stored owner.
fn require_owner(env: &Env, caller: &Address) -> Result<(), SaverError> {
    caller.require_auth();
    if *caller != read_owner(env)? {
        return Err(SaverError::Unauthorized);
    }
    Ok(())
}

#[inline]
fn require_not_paused(env: &Env) -> Result<(), SaverError> {
    let paused: bool = env.storage().instance()
        .get(&DataKey::Paused)
        .unwrap_or(false);
    if paused {
        return Err(SaverError::Paused);
    }
    Ok(())
}

#[inline]
fn require_positive(amount: i128) -> Result<(), SaverError> {
    if amount <= 0 {
        return Err(SaverError::InvalidAmount);
    }
    Ok(())
}

fn bump_instance(env: &Env) {
    env.storage().instance().extend_ttl(TTL_THRESHOLD, TTL_EXTEND_TO);
}
