//! Reduction result for a range of ticks.

/// Count/volume/price reduction over a queried range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregateResult {
    count: u64,
    total_volume: u64,
    max_price: f64,
    min_price: f64,
    avg_price: f64,
    vwap: f64,
}

impl AggregateResult {
    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn total_volume(&self) -> u64 {
        self.total_volume
    }

    pub fn max_price(&self) -> f64 {
        self.max_price
    }

    pub fn min_price(&self) -> f64 {
        self.min_price
    }

    pub fn avg_price(&self) -> f64 {
        self.avg_price
    }

    pub fn vwap(&self) -> f64 {
        self.vwap
    }

    pub fn set_count(&mut self, count: u64) {
        self.count = count;
    }

    pub fn set_total_volume(&mut self, total_volume: u64) {
        self.total_volume = total_volume;
    }

    pub fn set_max_price(&mut self, max_price: f64) {
        self.max_price = max_price;
    }

    pub fn set_min_price(&mut self, min_price: f64) {
        self.min_price = min_price;
    }

    pub fn set_avg_price(&mut self, avg_price: f64) {
        self.avg_price = avg_price;
    }

    pub fn set_vwap(&mut self, vwap: f64) {
        self.vwap = vwap;
    }
}

impl Default for AggregateResult {
    fn default() -> Self {
        Self {
            count: 0,
            total_volume: 0,
            max_price: 0.0,
            min_price: 0.0,
            avg_price: 0.0,
            vwap: 0.0,
        }
    }
}

/// Reduces ticks, which must already be in the order they should be folded
/// (timestamp-ascending, per the range query contract).
pub fn reduce<'a>(ticks: impl Iterator<Item = &'a crate::tick::Tick>) -> AggregateResult {
    let mut count = 0u64;
    let mut total_volume = 0u64;
    let mut sum_price = 0.0f64;
    let mut sum_pv = 0.0f64;
    let mut min_price = 0.0f64;
    let mut max_price = 0.0f64;

    for (i, tick) in ticks.enumerate() {
        count += 1;
        total_volume += tick.volume as u64;
        sum_price += tick.price;
        sum_pv += tick.price * tick.volume as f64;
        if i == 0 {
            min_price = tick.price;
            max_price = tick.price;
        } else {
            if tick.price < min_price {
                min_price = tick.price;
            }
            if tick.price > max_price {
                max_price = tick.price;
            }
        }
    }

    let avg_price = if count > 0 {
        sum_price / count as f64
    } else {
        0.0
    };
    let vwap = if total_volume > 0 {
        sum_pv / total_volume as f64
    } else {
        0.0
    };

    AggregateResult {
        count,
        total_volume,
        max_price,
        min_price,
        avg_price,
        vwap,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tick::Tick;
    use crate::trade_condition::TradeCondition;

    fn tick(ts: u64, price: f64, volume: u32) -> Tick {
        Tick::new(ts, 1, 1, price, volume, TradeCondition::None)
    }

    #[test]
    fn empty_range_is_all_zero() {
        let ticks: Vec<Tick> = Vec::new();
        let result = reduce(ticks.iter());
        assert_eq!(result.count(), 0);
        assert_eq!(result.vwap(), 0.0);
        assert_eq!(result.avg_price(), 0.0);
    }

    #[test]
    fn basic_reduction_matches_expected_identities() {
        let ticks = vec![tick(100, 100.0, 10), tick(101, 150.0, 20), tick(102, 120.0, 30)];
        let result = reduce(ticks.iter());
        assert_eq!(result.count(), 3);
        assert_eq!(result.total_volume(), 60);
        assert_eq!(result.max_price(), 150.0);
        assert_eq!(result.min_price(), 100.0);
        assert!((result.avg_price() - (100.0 + 150.0 + 120.0) / 3.0).abs() < 1e-9);
        let expected_vwap = (100.0 * 10.0 + 150.0 * 20.0 + 120.0 * 30.0) / 60.0;
        assert!((result.vwap() - expected_vwap).abs() < 1e-9);
    }

    #[test]
    fn setters_overwrite_each_field_independently() {
        let mut result = AggregateResult::default();
        result.set_count(3);
        result.set_total_volume(60);
        result.set_max_price(150.0);
        result.set_min_price(100.0);
        result.set_avg_price(123.0);
        result.set_vwap(125.0);
        assert_eq!(result.count(), 3);
        assert_eq!(result.total_volume(), 60);
        assert_eq!(result.max_price(), 150.0);
        assert_eq!(result.min_price(), 100.0);
        assert_eq!(result.avg_price(), 123.0);
        assert_eq!(result.vwap(), 125.0);
    }

    #[test]
    fn zero_volume_tick_excluded_from_vwap_denominator() {
        let ticks = vec![tick(103, 110.0, 60), tick(104, 130.0, 0)];
        let result = reduce(ticks.iter());
        assert_eq!(result.count(), 2);
        assert_eq!(result.vwap(), 110.0);
    }
}
