//! # Settlement Distribution
//!
//! The pure math of a successful sale: how `price` plus the buyer-side fee
//! surcharge is split between seller, platform revenue, the burn sink, and
//! the royalty receiver. Computing the whole [`Distribution`] up front —
//! before any ledger is touched — lets the engine validate the buyer's
//! total outlay and then apply every credit knowing the splits are
//! consistent (they re-sum to exactly `price + fee`; integer division
//! remainders always land with a party, never vanish).

use serde::{Deserialize, Serialize};

use crate::Address;

/// Basis-point share of an amount, computed in u128 to avoid overflow on
/// large prices. The result always fits back into u64 since rate <= 10_000.
fn bps_share(amount: u64, rate_bps: u16) -> u64 {
    (amount as u128 * rate_bps as u128 / 10_000) as u64
}

/// The complete split of one sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    /// The sale price.
    pub price: u64,
    /// Buyer-side fee surcharge on top of the price.
    pub fee: u64,
    /// Portion of the fee routed to the burn sink.
    pub fee_burn: u64,
    /// Portion of the fee credited to revenue.
    pub fee_revenue: u64,
    /// Total royalty carved out of the price.
    pub royalty_gross: u64,
    /// Protocol cut of the royalty, credited to revenue.
    pub royalty_cut: u64,
    /// Royalty net of the protocol cut, credited to the creator.
    pub royalty_net: u64,
    /// The royalty receiver, when a royalty applies.
    pub royalty_receiver: Option<Address>,
    /// What the seller is credited: price minus the gross royalty. The fee
    /// is buyer-funded and never deducted here.
    pub seller_proceeds: u64,
}

impl Distribution {
    /// Computes the split for a sale at `price`.
    ///
    /// `royalty` is the registry's `(receiver, amount)` answer for this
    /// asset and price; the amount is clamped to the price so a
    /// misconfigured registry can never drive seller proceeds negative.
    pub fn compute(
        price: u64,
        fee_rate_bps: u16,
        fee_burn_rate_bps: u16,
        royalty_cut_bps: u16,
        royalty: Option<(Address, u64)>,
    ) -> Self {
        let fee = bps_share(price, fee_rate_bps);
        let fee_burn = bps_share(fee, fee_burn_rate_bps);
        let fee_revenue = fee - fee_burn;

        let (royalty_receiver, royalty_gross) = match royalty {
            Some((receiver, amount)) if amount > 0 => (Some(receiver), amount.min(price)),
            _ => (None, 0),
        };
        let royalty_cut = bps_share(royalty_gross, royalty_cut_bps);
        let royalty_net = royalty_gross - royalty_cut;

        Self {
            price,
            fee,
            fee_burn,
            fee_revenue,
            royalty_gross,
            royalty_cut,
            royalty_net,
            royalty_receiver,
            seller_proceeds: price - royalty_gross,
        }
    }

    /// What the buyer must pay in total: price plus the fee surcharge.
    pub fn total_outlay(&self) -> u64 {
        self.price + self.fee
    }

    /// Everything credited to the revenue account.
    pub fn revenue_total(&self) -> u64 {
        self.fee_revenue + self.royalty_cut
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regression_full_split() {
        // price 20_000_000, fee 2.5%, 50% of the fee burned, 20% royalty
        // with a 10% protocol cut.
        let dist = Distribution::compute(
            20_000_000,
            250,
            5_000,
            1_000,
            Some(("creator".to_string(), 4_000_000)),
        );

        assert_eq!(dist.fee, 500_000);
        assert_eq!(dist.fee_burn, 250_000);
        assert_eq!(dist.fee_revenue, 250_000);
        assert_eq!(dist.royalty_gross, 4_000_000);
        assert_eq!(dist.royalty_cut, 400_000);
        assert_eq!(dist.royalty_net, 3_600_000);
        assert_eq!(dist.seller_proceeds, 16_000_000);
        assert_eq!(dist.total_outlay(), 20_500_000);
    }

    #[test]
    fn splits_re_sum_to_the_outlay() {
        for price in [1, 97, 9_999, 20_000_000, u64::MAX / 20_000] {
            let dist = Distribution::compute(
                price,
                250,
                3_333,
                1_000,
                Some(("creator".to_string(), price / 7)),
            );
            let credited = dist.seller_proceeds
                + dist.royalty_net
                + dist.royalty_cut
                + dist.fee_revenue
                + dist.fee_burn;
            assert_eq!(credited, dist.total_outlay());
        }
    }

    #[test]
    fn no_royalty_means_full_seller_proceeds() {
        let dist = Distribution::compute(1_000_000, 250, 0, 1_000, None);
        assert_eq!(dist.seller_proceeds, 1_000_000);
        assert_eq!(dist.royalty_receiver, None);
        assert_eq!(dist.royalty_net, 0);
        assert_eq!(dist.fee_revenue, 25_000);
    }

    #[test]
    fn zero_royalty_amount_is_treated_as_absent() {
        let dist = Distribution::compute(1_000, 250, 0, 0, Some(("creator".to_string(), 0)));
        assert_eq!(dist.royalty_receiver, None);
        assert_eq!(dist.seller_proceeds, 1_000);
    }

    #[test]
    fn oversized_royalty_is_clamped_to_the_price() {
        let dist = Distribution::compute(1_000, 0, 0, 0, Some(("creator".to_string(), 5_000)));
        assert_eq!(dist.royalty_gross, 1_000);
        assert_eq!(dist.seller_proceeds, 0);
    }

    #[test]
    fn large_prices_do_not_overflow() {
        let price = u64::MAX / 2;
        let dist = Distribution::compute(price, 250, 5_000, 1_000, None);
        assert_eq!(dist.fee, (price as u128 * 250 / 10_000) as u64);
    }
}
