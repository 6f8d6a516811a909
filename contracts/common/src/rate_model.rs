//! Interest-rate curves of the supported lending venues.
//!
//! Both curves take the pool state `(cash, borrows, reserves)` plus a
//! hypothetical `delta` of cash (positive for a deposit, negative for a
//! withdrawal) and return a per-period rate scaled by [`WAD`]. Every
//! multiplication and division rounds down, in the order written below, so
//! results match the venues' own accounting to the unit.
//!
//! ```text
//! utilization = borrows / (cash + delta + borrows - reserves)   in [0, 1]
//! supply      = utilization * (borrow * (1 - reserve_factor))
//! ```

use soroban_sdk::{contracttype, Env};

use crate::error::SaverError;
use crate::fixed::{checked_add, checked_sub, mul_div_floor, wad_mul, WAD};

/// BSC block count per year (3 second blocks).
pub const BLOCKS_PER_YEAR: i128 = 10_512_000;

pub const SECONDS_PER_YEAR: i128 = 31_536_000;

/// Two-segment linear model used by cToken venues.
///
/// `borrow = base_rate + utilization * multiplier`
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WhitePaperModel {
    /// Borrow rate at zero utilization, per period.
    pub base_rate: i128,
    /// Borrow rate increase per unit of utilization, per period.
    pub multiplier: i128,
    /// Share of borrow interest kept by the pool.
    pub reserve_factor: i128,
}

/// Three-segment model with two utilization kinks, used by ibToken venues.
///
/// Below `kink_one` the borrow rate follows `slope_one` from `base_rate`;
/// between the kinks it follows `slope_two` from the rate at `kink_one`;
/// above `kink_two` it follows `slope_three` from the rate at `kink_two`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TripleSlopeModel {
    pub base_rate: i128,
    pub kink_one: i128,
    pub kink_two: i128,
    pub slope_one: i128,
    pub slope_two: i128,
    pub slope_three: i128,
    pub reserve_factor: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RateModel {
    WhitePaper(WhitePaperModel),
    TripleSlope(TripleSlopeModel),
}

impl WhitePaperModel {
    /// Builds a model from yearly rates, floored to per-period values.
    pub const fn from_annual(
        base_per_year: i128,
        multiplier_per_year: i128,
        reserve_factor: i128,
        periods_per_year: i128,
    ) -> Self {
        Self {
            base_rate: base_per_year / periods_per_year,
            multiplier: multiplier_per_year / periods_per_year,
            reserve_factor,
        }
    }

    pub fn borrow_rate(&self, env: &Env, utilization: i128) -> Result<i128, SaverError> {
        checked_add(self.base_rate, wad_mul(env, utilization, self.multiplier)?)
    }
}

impl TripleSlopeModel {
    /// Alpaca's curve: 0-50% utilization climbs to 20% APR, 50-90% stays at
    /// 20%, 90-100% climbs to 150%. Rates are per second.
    pub const fn alpaca(reserve_factor: i128) -> Self {
        Self {
            base_rate: 0,
            kink_one: WAD / 2,
            kink_two: WAD / 10 * 9,
            slope_one: (WAD / 10 * 4) / SECONDS_PER_YEAR,
            slope_two: 0,
            slope_three: (13 * WAD) / SECONDS_PER_YEAR,
            reserve_factor,
        }
    }

    pub fn borrow_rate(&self, env: &Env, utilization: i128) -> Result<i128, SaverError> {
        if utilization <= self.kink_one {
            return checked_add(self.base_rate, wad_mul(env, utilization, self.slope_one)?);
        }
        let at_kink_one =
            checked_add(self.base_rate, wad_mul(env, self.kink_one, self.slope_one)?)?;
        if utilization <= self.kink_two {
            let above = checked_sub(utilization, self.kink_one)?;
            return checked_add(at_kink_one, wad_mul(env, above, self.slope_two)?);
        }
        let middle = checked_sub(self.kink_two, self.kink_one)?;
        let at_kink_two = checked_add(at_kink_one, wad_mul(env, middle, self.slope_two)?)?;
        let above = checked_sub(utilization, self.kink_two)?;
        checked_add(at_kink_two, wad_mul(env, above, self.slope_three)?)
    }
}

impl RateModel {
    pub fn reserve_factor(&self) -> i128 {
        match self {
            RateModel::WhitePaper(model) => model.reserve_factor,
            RateModel::TripleSlope(model) => model.reserve_factor,
        }
    }

    /// Rejects negative parameters, a reserve factor above 100% and kinks
    /// outside `0 < kink_one < kink_two <= 1`.
    pub fn validate(&self) -> Result<(), SaverError> {
        let valid = match self {
            RateModel::WhitePaper(m) => {
                m.base_rate >= 0 && m.multiplier >= 0 && (0..=WAD).contains(&m.reserve_factor)
            }
            RateModel::TripleSlope(m) => {
                m.base_rate >= 0
                    && m.slope_one >= 0
                    && m.slope_two >= 0
                    && m.slope_three >= 0
                    && (0..=WAD).contains(&m.reserve_factor)
                    && 0 < m.kink_one
                    && m.kink_one < m.kink_two
                    && m.kink_two <= WAD
            }
        };
        if valid {
            Ok(())
        } else {
            Err(SaverError::InvalidRateModel)
        }
    }

    /// Share of the pool's assets that is lent out, after applying `delta`.
    ///
    /// An empty or fully reserved pool has zero utilization; a withdrawal
    /// larger than the pool's cash saturates at 100%.
    pub fn utilization(
        env: &Env,
        cash: i128,
        borrows: i128,
        reserves: i128,
        delta: i128,
    ) -> Result<i128, SaverError> {
        if borrows <= 0 {
            return Ok(0);
        }
        let cash = checked_add(cash, delta)?;
        let assets = checked_sub(checked_add(cash, borrows)?, reserves)?;
        if assets <= 0 {
            return Ok(0);
        }
        Ok(mul_div_floor(env, borrows, WAD, assets)?.min(WAD))
    }

    pub fn borrow_rate(
        &self,
        env: &Env,
        cash: i128,
        borrows: i128,
        reserves: i128,
        delta: i128,
    ) -> Result<i128, SaverError> {
        let utilization = Self::utilization(env, cash, borrows, reserves, delta)?;
        self.borrow_rate_at(env, utilization)
    }

    pub fn supply_rate(
        &self,
        env: &Env,
        cash: i128,
        borrows: i128,
        reserves: i128,
        delta: i128,
    ) -> Result<i128, SaverError> {
        let utilization = Self::utilization(env, cash, borrows, reserves, delta)?;
        let borrow_rate = self.borrow_rate_at(env, utilization)?;
        let to_pool = checked_sub(WAD, self.reserve_factor())?;
        let rate_to_pool = mul_div_floor(env, borrow_rate, to_pool, WAD)?;
        wad_mul(env, utilization, rate_to_pool)
    }

    fn borrow_rate_at(&self, env: &Env, utilization: i128) -> Result<i128, SaverError> {
        match self {
            RateModel::WhitePaper(model) => model.borrow_rate(env, utilization),
            RateModel::TripleSlope(model) => model.borrow_rate(env, utilization),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn pct(value: i128) -> i128 {
        value * WAD / 100
    }

    fn white_paper() -> RateModel {
        RateModel::WhitePaper(WhitePaperModel {
            base_rate: pct(5),
            multiplier: pct(20),
            reserve_factor: pct(10),
        })
    }

    /// Alpaca's shape with yearly slopes, so expected values stay readable.
    fn triple_slope(reserve_factor: i128) -> RateModel {
        RateModel::TripleSlope(TripleSlopeModel {
            base_rate: 0,
            kink_one: pct(50),
            kink_two: pct(90),
            slope_one: pct(40),
            slope_two: 0,
            slope_three: 13 * WAD,
            reserve_factor,
        })
    }

    #[test]
    fn test_utilization_edges() {
        let env = Env::default();
        assert_eq!(RateModel::utilization(&env, 50, 50, 0, 0), Ok(pct(50)));
        assert_eq!(RateModel::utilization(&env, 0, 0, 0, 0), Ok(0));
        // reserves swallow the whole pool
        assert_eq!(RateModel::utilization(&env, 0, 10, 10, 0), Ok(0));
        // withdrawing more cash than the pool holds saturates
        assert_eq!(RateModel::utilization(&env, 10, 100, 0, -20), Ok(WAD));
    }

    #[test]
    fn test_white_paper_supply_rate() {
        let env = Env::default();
        let model = white_paper();

        // u = 50%, borrow = 5% + 10%, supply = 50% * 15% * 90%
        assert_eq!(model.borrow_rate(&env, 50, 50, 0, 0), Ok(pct(15)));
        assert_eq!(model.supply_rate(&env, 50, 50, 0, 0), Ok(67_500_000_000_000_000));
    }

    #[test]
    fn test_white_paper_delta_moves_utilization() {
        let env = Env::default();
        let model = white_paper();

        // deposit of 100: u = 25%, borrow = 10%, supply = 25% * 9%
        assert_eq!(model.supply_rate(&env, 50, 50, 0, 100), Ok(22_500_000_000_000_000));
        // withdrawal of all cash: u = 100%, borrow = 25%, supply = 22.5%
        assert_eq!(model.supply_rate(&env, 50, 50, 0, -50), Ok(225_000_000_000_000_000));
    }

    #[test]
    fn test_white_paper_empty_pool_pays_nothing() {
        let env = Env::default();
        assert_eq!(white_paper().supply_rate(&env, 0, 0, 0, 0), Ok(0));
        assert_eq!(white_paper().borrow_rate(&env, 0, 0, 0, 0), Ok(pct(5)));
    }

    #[test]
    fn test_white_paper_from_annual() {
        let model = WhitePaperModel::from_annual(pct(2), pct(10), pct(20), BLOCKS_PER_YEAR);
        assert_eq!(model.base_rate, pct(2) / BLOCKS_PER_YEAR);
        assert_eq!(model.multiplier, 9_512_937_595);
        assert_eq!(model.reserve_factor, pct(20));
    }

    #[test]
    fn test_triple_slope_segments() {
        let env = Env::default();
        let model = triple_slope(0);

        // below the first kink: 25% * 0.4
        assert_eq!(model.borrow_rate(&env, 75, 25, 0, 0), Ok(pct(10)));
        // flat between the kinks
        assert_eq!(model.borrow_rate(&env, 30, 70, 0, 0), Ok(pct(20)));
        // above the second kink: 20% + 5% * 13
        assert_eq!(model.borrow_rate(&env, 5, 95, 0, 0), Ok(pct(85)));

        assert_eq!(model.supply_rate(&env, 30, 70, 0, 0), Ok(pct(14)));
        assert_eq!(model.supply_rate(&env, 5, 95, 0, 0), Ok(807_500_000_000_000_000));
    }

    #[test]
    fn test_triple_slope_reserve_factor() {
        let env = Env::default();
        // 70% * 20% * 90%
        assert_eq!(
            triple_slope(pct(10)).supply_rate(&env, 30, 70, 0, 0),
            Ok(126_000_000_000_000_000)
        );
    }

    #[test]
    fn test_triple_slope_steepens_past_second_kink() {
        let env = Env::default();
        let models = [
            triple_slope(0),
            triple_slope(pct(19)),
            RateModel::TripleSlope(TripleSlopeModel::alpaca(pct(19))),
        ];

        for model in models.iter() {
            let low = [(90, 10), (80, 20), (60, 40)];
            let high = [(5, 95), (2, 98), (1, 99)];
            for &(cash_hi, borrows_hi) in high.iter() {
                // a deposit small enough to stay above the second kink
                let (cash_hi, borrows_hi) = (cash_hi * WAD, borrows_hi * WAD);
                let steep = model.supply_rate(&env, cash_hi, borrows_hi, 0, WAD / 2).unwrap();
                let utilization =
                    RateModel::utilization(&env, cash_hi, borrows_hi, 0, WAD / 2).unwrap();
                assert!(utilization > pct(90));
                for &(cash_lo, borrows_lo) in low.iter() {
                    let gentle =
                        model.supply_rate(&env, cash_lo * WAD, borrows_lo * WAD, 0, 0).unwrap();
                    assert!(steep >= gentle);
                }
            }
        }
    }

    #[test]
    fn test_alpaca_preset() {
        let model = TripleSlopeModel::alpaca(pct(19));
        assert_eq!(model.kink_one, pct(50));
        assert_eq!(model.kink_two, pct(90));
        assert_eq!(model.slope_one, 12_683_916_793);
        assert_eq!(model.slope_two, 0);
        assert!(RateModel::TripleSlope(model).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_kinks() {
        let mut model = TripleSlopeModel::alpaca(0);
        model.kink_two = model.kink_one;
        assert_eq!(
            RateModel::TripleSlope(model).validate(),
            Err(SaverError::InvalidRateModel)
        );

        let bad_reserve = RateModel::WhitePaper(WhitePaperModel {
            base_rate: 0,
            multiplier: 0,
            reserve_factor: WAD + 1,
        });
        assert_eq!(bad_reserve.validate(), Err(SaverError::InvalidRateModel));
    }
}
