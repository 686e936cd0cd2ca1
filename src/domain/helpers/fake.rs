use fake::{Dummy, Fake};
use rust_decimal::Decimal;

/// Prices between 1.00 and 99.99.
pub struct Price;

impl Dummy<Price> for Decimal {
    fn dummy_with_rng<R: fake::Rng + ?Sized>(_config: &Price, rng: &mut R) -> Self {
        let cents: i64 = (100..10_000).fake_with_rng(rng);
        Decimal::new(cents, 2)
    }
}

/// A syntactically valid buyer email.
pub struct BuyerEmail;

impl Dummy<BuyerEmail> for String {
    fn dummy_with_rng<R: fake::Rng + ?Sized>(_config: &BuyerEmail, rng: &mut R) -> Self {
        let local: u32 = (1..1_000_000).fake_with_rng(rng);
        format!("buyer{local}@example.com")
    }
}
