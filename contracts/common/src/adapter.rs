use soroban_sdk::{contractclient, Address, Env, Symbol};

use crate::error::SaverError;

/// Capability set every venue adapter exposes to the vault.
///
/// Amounts are always in units of the underlying asset; each adapter converts
/// to and from its venue's own accounting. An adapter holds no funds between
/// calls: the vault transfers `amount` to it right before `deposit`, and
/// `withdraw` forwards everything it received back to the vault.
#[contractclient(name = "AdapterClient")]
pub trait LendingAdapter {
    /// Router key of the venue this adapter talks to.
    fn venue_name(env: Env) -> Symbol;

    /// Supplies `amount` of `asset`, already held by the adapter, to the venue.
    fn deposit(env: Env, asset: Address, amount: i128) -> Result<(), SaverError>;

    /// Redeems `amount` of `asset` and sends it to the vault. Returns the
    /// amount actually forwarded, which may differ from `amount` by the
    /// venue's share rounding.
    fn withdraw(env: Env, asset: Address, amount: i128) -> Result<i128, SaverError>;

    /// Underlying-equivalent of the vault's position, rounded down.
    fn balance(env: Env, asset: Address) -> Result<i128, SaverError>;

    /// Largest amount `withdraw` can currently honour.
    fn max_withdraw(env: Env, asset: Address) -> Result<i128, SaverError>;

    /// Smallest amount `deposit` accepts: the price of one venue token unit.
    fn min_deposit(env: Env, asset: Address) -> Result<i128, SaverError>;

    /// Venue supply rate if `delta` of cash were added (or removed).
    fn projected_rate(env: Env, asset: Address, delta: i128) -> Result<i128, SaverError>;
}
