//! Integration tests for settlement distribution, the restricted
//! collection, and participation gates.
//!
//! The distribution math has its own unit tests; these scenarios verify
//! that a real sale actually credits every party the computed amounts,
//! routes the burn split to the right sink, and that configuration and
//! blacklist changes take effect on the very next operation.

use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use sam_engine::{
    Marketplace, MarketError, RestrictedCollection, SaleMode, SingleCopyRegistry,
    CUSTODY_ACCOUNT,
};

fn t0() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap()
}

/// Helper: a marketplace settling in LFG with one whitelisted single-copy
/// registry under `registry_addr` holding asset 1 owned by "seller".
fn setup(registry_addr: &str) -> Result<Marketplace> {
    let mut market = Marketplace::new("owner", "LFG", "revenue", "burnpile");
    let mut nft = SingleCopyRegistry::new();
    nft.mint("seller", 1)?;
    nft.set_royalty(1, "creator", 2_000)?;
    market.register_registry(registry_addr, Box::new(nft));
    market
        .access_mut()
        .set_registry_whitelist("owner", registry_addr, true)?;
    market.token_mut().mint("buyer", 100_000_000)?;
    market
        .token_mut()
        .approve("buyer", CUSTODY_ACCOUNT, 100_000_000);
    Ok(market)
}

// ---------------------------------------------------------------------------
// Full distribution
// ---------------------------------------------------------------------------

#[test]
fn sale_credits_every_party_of_the_split() -> Result<()> {
    let mut market = setup("nft")?;
    // 2.5% fee, half of it burned; 10% protocol cut of the 20% royalty.
    market.config_mut().set_fee_burn_rate("owner", 5_000)?;
    market.config_mut().set_royalty_cut_rate("owner", 1_000)?;

    let id = market.add_listing(
        "seller", "nft", 1, 1, SaleMode::FixedPrice, 20_000_000, t0(), 0, 0, 0, t0(),
    )?[0];
    market.buy_now(id, "buyer", t0())?;

    // price 20M: fee 500k (250k burned, 250k revenue), royalty 4M
    // (400k cut to revenue, 3.6M to the creator), 16M to the seller.
    assert_eq!(market.token().balance_of("buyer"), 100_000_000 - 20_500_000);
    assert_eq!(market.escrow_balance("seller"), 16_000_000);
    assert_eq!(market.escrow_balance("creator"), 3_600_000);
    assert_eq!(market.revenue_amount(), 650_000);
    // Unrestricted registry: the burn split goes straight to the sink.
    assert_eq!(market.token().balance_of("burnpile"), 250_000);
    assert_eq!(market.total_burn_amount(), 0);

    // Custody backs exactly what is still claimable.
    assert_eq!(
        market.token().balance_of(market.account()),
        market.escrow_total()
    );

    // Everyone can pull their share out.
    assert_eq!(market.claim_balance("creator")?, 3_600_000);
    assert_eq!(market.claim_balance("revenue")?, 650_000);
    assert_eq!(market.claim_balance("seller")?, 16_000_000);
    assert_eq!(market.escrow_total(), 0);
    Ok(())
}

#[test]
fn royalty_free_asset_pays_the_seller_in_full() -> Result<()> {
    let mut market = Marketplace::new("owner", "LFG", "revenue", "burnpile");
    let mut nft = SingleCopyRegistry::new();
    nft.mint("seller", 1)?;
    market.register_registry("nft", Box::new(nft));
    market
        .access_mut()
        .set_registry_whitelist("owner", "nft", true)?;
    market.token_mut().mint("buyer", 10_000_000)?;
    market
        .token_mut()
        .approve("buyer", CUSTODY_ACCOUNT, 10_000_000);

    let id = market.add_listing(
        "seller", "nft", 1, 1, SaleMode::FixedPrice, 1_000_000, t0(), 0, 0, 0, t0(),
    )?[0];
    market.buy_now(id, "buyer", t0())?;

    assert_eq!(market.escrow_balance("seller"), 1_000_000);
    assert_eq!(market.escrow_balance("creator"), 0);
    assert_eq!(market.revenue_amount(), 25_000);
    Ok(())
}

// ---------------------------------------------------------------------------
// Restricted collection
// ---------------------------------------------------------------------------

#[test]
fn restricted_collection_rejects_the_wrong_payment_unit() -> Result<()> {
    let mut market = setup("fire")?;
    // The designated collection may only settle in OTHER, but this engine
    // settles in LFG.
    market.config_mut().set_restricted_collection(
        "owner",
        Some(RestrictedCollection {
            registry: "fire".to_string(),
            unit: "OTHER".to_string(),
        }),
    )?;

    let result = market.add_listing(
        "seller", "fire", 1, 1, SaleMode::FixedPrice, 1_000_000, t0(), 0, 0, 0, t0(),
    );
    assert!(matches!(
        result,
        Err(MarketError::RestrictedCollection { unit }) if unit == "OTHER"
    ));
    Ok(())
}

#[test]
fn restricted_collection_routes_burn_through_the_vault() -> Result<()> {
    let mut market = setup("fire")?;
    market.config_mut().set_restricted_collection(
        "owner",
        Some(RestrictedCollection {
            registry: "fire".to_string(),
            unit: "LFG".to_string(),
        }),
    )?;
    // Burn the entire fee.
    market.config_mut().set_fee_burn_rate("owner", 10_000)?;

    let id = market.add_listing(
        "seller", "fire", 1, 1, SaleMode::FixedPrice, 1_000_000, t0(), 0, 0, 0, t0(),
    )?[0];
    market.buy_now(id, "buyer", t0())?;

    // fee 25_000 forwarded into the vault, which burns 5% of its balance.
    let vault_account = market.burn_vault().account().to_string();
    assert_eq!(market.total_burn_amount(), 1_250);
    assert_eq!(market.token().balance_of(&vault_account), 23_750);
    assert_eq!(market.token().balance_of("burnpile"), 1_250);
    // Nothing of the fee reached revenue; the royalty cut is zero here.
    assert_eq!(market.revenue_amount(), 0);
    Ok(())
}

// ---------------------------------------------------------------------------
// Participation gates
// ---------------------------------------------------------------------------

#[test]
fn blacklisted_accounts_cannot_trade() -> Result<()> {
    let mut market = setup("nft")?;
    let id = market.add_listing(
        "seller", "nft", 1, 1, SaleMode::FixedPrice, 1_000_000, t0(), 0, 0, 0, t0(),
    )?[0];

    market
        .access_mut()
        .set_user_blacklist("owner", &["buyer".to_string()], &[true])?;
    let result = market.buy_now(id, "buyer", t0());
    assert!(matches!(result, Err(MarketError::Blacklisted(_))));

    // Lifting the ban takes effect immediately.
    market
        .access_mut()
        .set_user_blacklist("owner", &["buyer".to_string()], &[false])?;
    market.buy_now(id, "buyer", t0())?;
    Ok(())
}

#[test]
fn fee_changes_apply_to_the_next_sale_only() -> Result<()> {
    let mut market = setup("nft")?;
    let id = market.add_listing(
        "seller", "nft", 1, 1, SaleMode::FixedPrice, 1_000_000, t0(), 0, 0, 0, t0(),
    )?[0];

    market.config_mut().set_fee_rate("owner", 1_000)?; // 10%
    market.buy_now(id, "buyer", t0())?;
    assert_eq!(market.token().balance_of("buyer"), 100_000_000 - 1_100_000);

    let royalty = 200_000; // 20% of 1M
    assert_eq!(market.escrow_balance("seller"), 1_000_000 - royalty);
    assert_eq!(market.revenue_amount(), 100_000);
    Ok(())
}

#[test]
fn configuration_stays_owner_gated_through_the_engine() {
    let mut market = setup("nft").unwrap();
    assert!(market.config_mut().set_fee_rate("mallory", 100).is_err());
    assert!(market
        .burn_vault_mut()
        .set_burn_rate("mallory", 100)
        .is_err());
    assert!(market
        .access_mut()
        .set_registry_whitelist("mallory", "nft", false)
        .is_err());
    assert_eq!(market.config().fee_rate_bps(), 250);
}
