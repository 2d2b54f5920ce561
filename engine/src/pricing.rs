//! # Pricing
//!
//! Effective-price computation for the three sale modes. Prices are always
//! recomputed from the supplied `now` at the moment of purchase — nothing
//! here is cached, so a Dutch-auction buyer always pays the price of the
//! interval the purchase lands in.

use chrono::{DateTime, Utc};

use crate::listing::{Listing, SaleMode};

/// The effective asking price of a listing at `now`.
///
/// - `FixedPrice`: the stored price, unconditionally.
/// - `Auction`: the starting price. The engine substitutes the current
///   highest bid where one exists; purchase is via claim, not buy-now.
/// - `DutchAuction`: `max(0, price - floor(elapsed / interval) * step)`,
///   with elapsed clamped to zero before the sale starts. Non-increasing
///   and piecewise-constant within each interval.
pub fn effective_price(listing: &Listing, now: DateTime<Utc>) -> u64 {
    match listing.mode {
        SaleMode::FixedPrice | SaleMode::Auction => listing.price,
        SaleMode::DutchAuction => {
            let elapsed = (now - listing.start_time).num_seconds().max(0) as u64;
            if listing.discount_interval_secs == 0 {
                return listing.price;
            }
            let steps = elapsed / listing.discount_interval_secs;
            let discount = steps.saturating_mul(listing.discount_step);
            listing.price.saturating_sub(discount)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn dutch(price: u64, interval_secs: u64, step: u64) -> Listing {
        Listing {
            id: 1,
            seller: "seller".into(),
            registry: "nft".into(),
            asset_id: 1,
            collection_tag: "tag".into(),
            mode: SaleMode::DutchAuction,
            price,
            start_time: Utc.timestamp_opt(1_000_000, 0).unwrap(),
            duration_secs: 7 * 86_400,
            discount_interval_secs: interval_secs,
            discount_step: step,
            top_bid: None,
            created_at: Utc.timestamp_opt(1_000_000, 0).unwrap(),
        }
    }

    #[test]
    fn dutch_price_after_twelve_intervals() {
        let listing = dutch(10_000_000, 3_600, 100_000);
        let now = listing.start_time + Duration::seconds(43_200);
        assert_eq!(effective_price(&listing, now), 8_800_000);
    }

    #[test]
    fn dutch_price_is_piecewise_constant() {
        let listing = dutch(10_000_000, 3_600, 100_000);
        let start = listing.start_time;

        // Same interval, same price.
        assert_eq!(effective_price(&listing, start), 10_000_000);
        assert_eq!(
            effective_price(&listing, start + Duration::seconds(3_599)),
            10_000_000
        );
        // Next interval, one step down.
        assert_eq!(
            effective_price(&listing, start + Duration::seconds(3_600)),
            9_900_000
        );
    }

    #[test]
    fn dutch_price_is_monotonically_non_increasing() {
        let listing = dutch(1_000_000, 600, 90_000);
        let mut previous = u64::MAX;
        for minutes in 0..240 {
            let now = listing.start_time + Duration::minutes(minutes);
            let price = effective_price(&listing, now);
            assert!(price <= previous);
            previous = price;
        }
    }

    #[test]
    fn dutch_price_clamps_at_zero() {
        let listing = dutch(500_000, 60, 100_000);
        let now = listing.start_time + Duration::seconds(60 * 100);
        assert_eq!(effective_price(&listing, now), 0);
    }

    #[test]
    fn dutch_price_before_start_is_the_full_price() {
        let listing = dutch(10_000_000, 3_600, 100_000);
        let before = listing.start_time - Duration::hours(5);
        assert_eq!(effective_price(&listing, before), 10_000_000);
    }

    #[test]
    fn fixed_price_is_unconditional() {
        let mut listing = dutch(42_000, 3_600, 100);
        listing.mode = SaleMode::FixedPrice;
        let late = listing.start_time + Duration::days(30);
        assert_eq!(effective_price(&listing, late), 42_000);
    }
}
