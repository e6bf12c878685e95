/// Rounds half away from zero to whole cents.
///
/// Values too large to scale by 100 have no fractional cents left to round
/// and come back unchanged.
pub fn round_price(value: f64) -> f64 {
    let cents = value * 100.0;
    if !cents.is_finite() {
        return value;
    }
    cents.round() / 100.0
}

/// Applies a percentage discount: `calc_discount(100.0, 10.0) == 90.0`.
pub fn calc_discount(price: f64, discount: f64) -> f64 {
    round_price(price - price * discount / 100.0)
}

/// A change applied to the price of every item a bulk update selects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PriceChange {
    /// Percentage off the current price.
    Discount(f64),
    /// Replace the price outright.
    Set(f64),
}

impl PriceChange {
    pub fn apply(self, price: f64) -> f64 {
        match self {
            PriceChange::Discount(discount) => calc_discount(price, discount),
            PriceChange::Set(price) => round_price(price),
        }
    }
}
