//! Supply-adequacy KPIs.

use crate::EconError;
use fwe_core::keys;
use std::collections::BTreeMap;

/// Indicators reported for one scenario.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Kpis {
    pub days_of_supply_calories: f64,
    pub mean_logistics_delay_days: f64,
}

impl Kpis {
    /// KPI mapping keyed by the public result names.
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            (keys::DAYS_OF_SUPPLY.to_string(), self.days_of_supply_calories),
            (keys::MEAN_DELAY_DAYS.to_string(), self.mean_logistics_delay_days),
        ])
    }
}

/// Days of supply = total calories / (population × demand per day).
///
/// Returns [`EconError::Division`] when the daily need is not strictly
/// positive instead of producing NaN or infinity. The delay passes through.
pub fn aggregate(
    total_calories: f64,
    population_millions: f64,
    demand_cal_per_cap_day: u32,
    delay_days: f64,
) -> Result<Kpis, EconError> {
    if !total_calories.is_finite() {
        return Err(EconError::NonFinite("total_calories"));
    }
    if !delay_days.is_finite() {
        return Err(EconError::NonFinite("delay_days"));
    }
    let need = population_millions * 1_000_000.0 * f64::from(demand_cal_per_cap_day);
    if !need.is_finite() {
        return Err(EconError::NonFinite("daily caloric need"));
    }
    if need <= 0.0 {
        return Err(EconError::Division { need });
    }
    Ok(Kpis {
        days_of_supply_calories: total_calories / need,
        mean_logistics_delay_days: delay_days,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn days_of_supply_basic() {
        // 5.9M people × 2200 kcal = 12.98e9 kcal/day
        let k = aggregate(12.98e9 * 30.0, 5.9, 2200, 4.5).unwrap();
        assert!((k.days_of_supply_calories - 30.0).abs() < 1e-9);
        assert_eq!(k.mean_logistics_delay_days, 4.5);
    }

    #[test]
    fn zero_population_is_division_error() {
        assert_eq!(
            aggregate(1.0e12, 0.0, 2200, 1.0),
            Err(EconError::Division { need: 0.0 })
        );
    }

    #[test]
    fn zero_demand_is_division_error() {
        assert!(matches!(
            aggregate(1.0e12, 5.9, 0, 1.0),
            Err(EconError::Division { .. })
        ));
    }

    #[test]
    fn nan_population_is_rejected() {
        assert_eq!(
            aggregate(1.0, f64::NAN, 2200, 1.0),
            Err(EconError::NonFinite("daily caloric need"))
        );
    }

    #[test]
    fn map_has_exact_keys() {
        let k = aggregate(0.0, 1.0, 2000, 0.0).unwrap();
        let map = k.to_map();
        let names: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(names, vec![keys::DAYS_OF_SUPPLY, keys::MEAN_DELAY_DAYS]);
        assert_eq!(map[keys::DAYS_OF_SUPPLY], 0.0);
    }
}
