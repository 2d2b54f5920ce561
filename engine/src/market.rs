//! # The Marketplace Engine
//!
//! The aggregate that owns every persisted table — listings, biddings,
//! the escrow ledger — plus the collaborators a sale touches: the token ledger, the asset registries, the access flags, the
//! configuration store, and the burn vault.
//!
//! Execution model: serialized transactions. Each public operation runs to
//! completion against `&mut self`; deadlines are judged against the `now`
//! argument, never an ambient clock. Every operation validates first and
//! mutates second, so an error always means nothing changed. Funds enter
//! custody only through allowance-based pulls, leave only through explicit
//! escrow withdrawal — with the single exception of the burn-sink push,
//! which the burn accumulator's own accounting requires.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::access::AccessRegistry;
use crate::asset::{AssetId, AssetRegistry, RegistryKind};
use crate::burn::BurnVault;
use crate::config::MarketConfig;
use crate::error::MarketError;
use crate::escrow::EscrowLedger;
use crate::listing::{Bidding, BiddingId, Listing, ListingId, SaleMode};
use crate::payment::TokenLedger;
use crate::pricing;
use crate::settlement::Distribution;
use crate::Address;

/// The engine's custody account on the token ledger. Holds live bids and
/// the backing for every claimable escrow balance.
pub const CUSTODY_ACCOUNT: &str = "sam.market";

/// The burn accumulator's account on the token ledger.
pub const BURN_VAULT_ACCOUNT: &str = "sam.burn.vault";

/// The marketplace settlement engine.
#[derive(Debug)]
pub struct Marketplace {
    /// Custody account identifier.
    account: Address,
    /// Fee, duration, and address configuration.
    config: MarketConfig,
    /// Blacklist and registry whitelist.
    access: AccessRegistry,
    /// Registered asset registries by address.
    registries: HashMap<Address, Box<dyn AssetRegistry>>,
    /// The payment facility.
    token: TokenLedger,
    /// Claimable balances (pull payment).
    escrow: EscrowLedger,
    /// The burn accumulator.
    burn_vault: BurnVault,
    /// Active listings by id.
    listings: HashMap<ListingId, Listing>,
    /// Live biddings by id (at most one per listing).
    biddings: HashMap<BiddingId, Bidding>,
    /// Seller -> active listing ids.
    listings_of_seller: HashMap<Address, Vec<ListingId>>,
    /// Bidder -> live bidding ids.
    biddings_of_bidder: HashMap<Address, Vec<BiddingId>>,
    /// Next listing id to assign. Ids are never reused.
    next_listing_id: ListingId,
    /// Sum of live bid amounts currently held in custody.
    bids_in_custody: u64,
}

impl Marketplace {
    /// Creates an engine settling in `unit`, owned (for configuration and
    /// access purposes) by `owner`.
    pub fn new(
        owner: &str,
        unit: &str,
        revenue_address: &str,
        burn_address: &str,
    ) -> Self {
        Self {
            account: CUSTODY_ACCOUNT.to_string(),
            config: MarketConfig::new(owner, revenue_address, burn_address),
            access: AccessRegistry::new(owner),
            registries: HashMap::new(),
            token: TokenLedger::new(unit),
            escrow: EscrowLedger::new(),
            burn_vault: BurnVault::new(owner, BURN_VAULT_ACCOUNT, burn_address),
            listings: HashMap::new(),
            biddings: HashMap::new(),
            listings_of_seller: HashMap::new(),
            biddings_of_bidder: HashMap::new(),
            next_listing_id: 1,
            bids_in_custody: 0,
        }
    }

    // -- wiring & component access -------------------------------------------

    /// Registers an asset registry under `address`. Listing against it
    /// additionally requires whitelisting through the access registry.
    pub fn register_registry(
        &mut self,
        address: impl Into<Address>,
        registry: Box<dyn AssetRegistry>,
    ) {
        self.registries.insert(address.into(), registry);
    }

    /// The engine's custody account identifier.
    pub fn account(&self) -> &str {
        &self.account
    }

    /// The configuration store.
    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    /// Mutable configuration store (setters are owner-gated internally).
    pub fn config_mut(&mut self) -> &mut MarketConfig {
        &mut self.config
    }

    /// The access registry.
    pub fn access(&self) -> &AccessRegistry {
        &self.access
    }

    /// Mutable access registry (setters are operator/owner-gated internally).
    pub fn access_mut(&mut self) -> &mut AccessRegistry {
        &mut self.access
    }

    /// The payment facility.
    pub fn token(&self) -> &TokenLedger {
        &self.token
    }

    /// Mutable payment facility, for issuance and approvals.
    pub fn token_mut(&mut self) -> &mut TokenLedger {
        &mut self.token
    }

    /// The burn accumulator.
    pub fn burn_vault(&self) -> &BurnVault {
        &self.burn_vault
    }

    /// Mutable burn accumulator (configuration is owner-gated internally).
    pub fn burn_vault_mut(&mut self) -> &mut BurnVault {
        &mut self.burn_vault
    }

    /// A registered asset registry, if any.
    pub fn registry(&self, address: &str) -> Option<&dyn AssetRegistry> {
        self.registries.get(address).map(Box::as_ref)
    }

    // -- listing lifecycle ----------------------------------------------------

    /// Creates one listing row per unit offered and escrows the units.
    ///
    /// Multi-copy assets fan out into `copies` independent rows sharing a
    /// collection tag, so each unit can be bought or cancelled on its own.
    /// Returns the new listing ids.
    #[allow(clippy::too_many_arguments)]
    pub fn add_listing(
        &mut self,
        seller: &str,
        registry: &str,
        asset_id: AssetId,
        copies: u64,
        mode: SaleMode,
        price: u64,
        start_time: DateTime<Utc>,
        duration_secs: u64,
        discount_interval_secs: u64,
        discount_step: u64,
        now: DateTime<Utc>,
    ) -> Result<Vec<ListingId>, MarketError> {
        if !self.access.is_whitelisted_registry(registry) {
            return Err(MarketError::RegistryNotWhitelisted(registry.to_string()));
        }
        if self.access.is_blacklisted(seller) {
            return Err(MarketError::Blacklisted(seller.to_string()));
        }
        if price == 0 {
            return Err(MarketError::ZeroPrice);
        }
        if copies == 0 {
            return Err(MarketError::ZeroCopies);
        }
        let reg = self
            .registries
            .get_mut(registry)
            .ok_or_else(|| MarketError::UnknownRegistry(registry.to_string()))?;
        if reg.kind() == RegistryKind::SingleCopy && copies != 1 {
            return Err(MarketError::TooManyCopies);
        }
        if let Some(restricted) = self.config.restricted() {
            if restricted.registry == registry && restricted.unit != self.token.unit() {
                return Err(MarketError::RestrictedCollection {
                    unit: restricted.unit.clone(),
                });
            }
        }
        // Auctions always expire; fixed price may run open-ended.
        let needs_expiry = mode != SaleMode::FixedPrice || duration_secs > 0;
        if needs_expiry && !self.config.is_valid_duration(duration_secs) {
            return Err(MarketError::InvalidDuration {
                duration_secs,
                min_secs: self.config.min_duration_secs(),
                max_secs: self.config.max_duration_secs(),
            });
        }
        if mode == SaleMode::DutchAuction
            && (discount_interval_secs == 0 || discount_step == 0 || discount_step >= price)
        {
            return Err(MarketError::InvalidDutchParams {
                interval_secs: discount_interval_secs,
                step: discount_step,
            });
        }

        // Last fallible step: custody for all units, atomically.
        reg.escrow_units(seller, asset_id, copies)?;

        let collection_tag = Uuid::new_v4().to_string();
        let (interval, step) = match mode {
            SaleMode::DutchAuction => (discount_interval_secs, discount_step),
            _ => (0, 0),
        };
        let mut ids = Vec::with_capacity(copies as usize);
        for _ in 0..copies {
            let id = self.next_listing_id;
            self.next_listing_id += 1;
            self.listings.insert(
                id,
                Listing {
                    id,
                    seller: seller.to_string(),
                    registry: registry.to_string(),
                    asset_id,
                    collection_tag: collection_tag.clone(),
                    mode,
                    price,
                    start_time,
                    duration_secs,
                    discount_interval_secs: interval,
                    discount_step: step,
                    top_bid: None,
                    created_at: now,
                },
            );
            self.listings_of_seller
                .entry(seller.to_string())
                .or_default()
                .push(id);
            ids.push(id);
        }

        info!(
            seller = %seller,
            registry = %registry,
            asset_id = asset_id,
            copies = copies,
            mode = %mode,
            price = price,
            "listing created"
        );
        Ok(ids)
    }

    /// Cancels a listing and returns custody to the seller.
    ///
    /// Only the seller may cancel. A FixedPrice listing with no bids can be
    /// cancelled at any time; time-boxed modes must have expired, and a
    /// listing with a live bid can never be cancelled (the winner claims).
    pub fn remove_listing(
        &mut self,
        id: ListingId,
        caller: &str,
        now: DateTime<Utc>,
    ) -> Result<(), MarketError> {
        let listing = self
            .listings
            .get(&id)
            .ok_or(MarketError::ListingNotFound(id))?;
        if listing.seller != caller {
            return Err(MarketError::NotSeller);
        }
        if listing.top_bid.is_some() {
            return Err(MarketError::ActiveBid);
        }
        if listing.mode != SaleMode::FixedPrice && !listing.has_expired(now) {
            return Err(MarketError::NotExpired);
        }

        let (registry, asset_id, seller) =
            (listing.registry.clone(), listing.asset_id, listing.seller.clone());
        self.release_escrowed_unit(&registry, &seller, &seller, asset_id)?;
        self.retire_listing(id);

        info!(listing_id = id, seller = %seller, "listing removed");
        Ok(())
    }

    // -- bidding --------------------------------------------------------------

    /// Places a bid on an Auction listing, pulling the amount into custody
    /// and instantly refunding any displaced bid into the previous
    /// bidder's escrow balance.
    pub fn place_bid(
        &mut self,
        listing_id: ListingId,
        bidder: &str,
        amount: u64,
        now: DateTime<Utc>,
    ) -> Result<BiddingId, MarketError> {
        let listing = self
            .listings
            .get(&listing_id)
            .ok_or(MarketError::ListingNotFound(listing_id))?;
        if listing.mode != SaleMode::Auction {
            return Err(MarketError::NotAnAuction);
        }
        if listing.seller == bidder {
            return Err(MarketError::BidderIsSeller);
        }
        if self.access.is_blacklisted(bidder) {
            return Err(MarketError::Blacklisted(bidder.to_string()));
        }
        if !listing.has_started(now) {
            return Err(MarketError::NotStarted);
        }
        if listing.has_expired(now) {
            return Err(MarketError::ListingExpired);
        }
        let floor = match &listing.top_bid {
            Some(bid_id) => {
                self.biddings
                    .get(bid_id)
                    .ok_or_else(|| {
                        MarketError::Invariant(format!("top bid {bid_id} has no record"))
                    })?
                    .amount
            }
            None => listing.price,
        };
        // Strictly greater: ties lose.
        if amount <= floor {
            return Err(MarketError::BidTooLow { offered: amount, floor });
        }

        // Pull the funds before touching any engine state.
        let account = self.account.clone();
        self.token.transfer_from(&account, bidder, &account, amount)?;
        self.bids_in_custody += amount;

        // Displace-and-credit: the outbid amount becomes claimable
        // immediately, and the displaced record ceases to exist.
        let displaced = self
            .listings
            .get_mut(&listing_id)
            .and_then(|l| l.top_bid.take());
        if let Some(prev_id) = displaced {
            let prev = self.remove_bid_record(&prev_id).ok_or_else(|| {
                MarketError::Invariant(format!("displaced bid {prev_id} has no record"))
            })?;
            self.bids_in_custody -= prev.amount;
            self.escrow
                .credit(&prev.bidder, prev.amount)
                .map_err(|e| MarketError::Invariant(e.to_string()))?;
            debug!(
                listing_id = listing_id,
                bidder = %prev.bidder,
                refunded = prev.amount,
                "bid displaced and refunded"
            );
        }

        let bid_id = Uuid::new_v4().to_string();
        self.biddings.insert(
            bid_id.clone(),
            Bidding {
                id: bid_id.clone(),
                listing_id,
                bidder: bidder.to_string(),
                amount,
                placed_at: now,
            },
        );
        self.biddings_of_bidder
            .entry(bidder.to_string())
            .or_default()
            .push(bid_id.clone());
        if let Some(listing) = self.listings.get_mut(&listing_id) {
            listing.top_bid = Some(bid_id.clone());
        }

        info!(listing_id = listing_id, bidder = %bidder, amount = amount, "bid placed");
        Ok(bid_id)
    }

    /// Resolves an expired auction: the winning bidder pays the fee
    /// surcharge, receives the asset, and settlement distributes the bid
    /// amount.
    pub fn claim_nft(
        &mut self,
        bidding_id: &str,
        caller: &str,
        now: DateTime<Utc>,
    ) -> Result<(), MarketError> {
        let bid = self
            .biddings
            .get(bidding_id)
            .ok_or_else(|| MarketError::BiddingNotFound(bidding_id.to_string()))?;
        if bid.bidder != caller {
            return Err(MarketError::NotBidder);
        }
        let listing = self.listings.get(&bid.listing_id).ok_or_else(|| {
            MarketError::Invariant(format!("bidding {bidding_id} references a missing listing"))
        })?;
        if !listing.has_expired(now) {
            return Err(MarketError::BiddingInProgress);
        }
        if listing.top_bid.as_deref() != Some(bidding_id) {
            return Err(MarketError::NotHighestBid);
        }

        let price = bid.amount;
        let listing_id = listing.id;
        let (seller, registry, asset_id) =
            (listing.seller.clone(), listing.registry.clone(), listing.asset_id);
        let dist = self.distribution_for(&registry, asset_id, price)?;

        // The bid amount is already in custody; pull only the fee.
        let account = self.account.clone();
        self.token.transfer_from(&account, caller, &account, dist.fee)?;
        self.bids_in_custody -= price;

        self.release_escrowed_unit(&registry, &seller, caller, asset_id)?;
        self.apply_distribution(&dist, &seller, &registry)?;

        self.remove_bid_record(bidding_id);
        self.retire_listing(listing_id);

        info!(
            listing_id = listing_id,
            winner = %caller,
            price = price,
            fee = dist.fee,
            "auction claimed"
        );
        Ok(())
    }

    // -- immediate purchase ---------------------------------------------------

    /// Buys a FixedPrice or DutchAuction listing at its effective price,
    /// pulling `price + fee` from the buyer and settling immediately.
    pub fn buy_now(
        &mut self,
        listing_id: ListingId,
        buyer: &str,
        now: DateTime<Utc>,
    ) -> Result<(), MarketError> {
        let listing = self
            .listings
            .get(&listing_id)
            .ok_or(MarketError::ListingNotFound(listing_id))?;
        if listing.mode == SaleMode::Auction {
            return Err(MarketError::NotBuyable);
        }
        if listing.seller == buyer {
            return Err(MarketError::BuyerIsSeller);
        }
        if self.access.is_blacklisted(buyer) {
            return Err(MarketError::Blacklisted(buyer.to_string()));
        }
        if !listing.has_started(now) {
            return Err(MarketError::NotStarted);
        }
        if listing.has_expired(now) {
            return Err(MarketError::ListingExpired);
        }

        let price = pricing::effective_price(listing, now);
        let (seller, registry, asset_id) =
            (listing.seller.clone(), listing.registry.clone(), listing.asset_id);
        let dist = self.distribution_for(&registry, asset_id, price)?;
        let outlay = price
            .checked_add(dist.fee)
            .ok_or_else(|| MarketError::Invariant("sale outlay overflows".to_string()))?;

        // Pull the full outlay before touching any engine state.
        let account = self.account.clone();
        self.token.transfer_from(&account, buyer, &account, outlay)?;

        self.release_escrowed_unit(&registry, &seller, buyer, asset_id)?;
        self.apply_distribution(&dist, &seller, &registry)?;
        self.retire_listing(listing_id);

        info!(
            listing_id = listing_id,
            buyer = %buyer,
            price = price,
            fee = dist.fee,
            "listing bought"
        );
        Ok(())
    }

    // -- escrow withdrawal ----------------------------------------------------

    /// Withdraws the caller's entire claimable balance. A no-op (returning
    /// zero) on an empty balance. Returns the amount paid out.
    pub fn claim_balance(&mut self, caller: &str) -> Result<u64, MarketError> {
        // Zero the balance before pushing: nothing downstream of this
        // point may observe the old claimable amount.
        let amount = self.escrow.take_all(caller);
        if amount == 0 {
            return Ok(0);
        }
        let account = self.account.clone();
        self.token
            .transfer(&account, caller, amount)
            .map_err(|e| MarketError::Invariant(format!("escrow backing missing: {e}")))?;

        info!(claimer = %caller, amount = amount, "escrow balance claimed");
        Ok(amount)
    }

    // -- reads ----------------------------------------------------------------

    /// The effective price of a listing at `now` — the current highest bid
    /// for an auction with bids, the decayed asking price for a Dutch
    /// auction, the stored price otherwise.
    pub fn get_price(&self, listing_id: ListingId, now: DateTime<Utc>) -> Result<u64, MarketError> {
        let listing = self
            .listings
            .get(&listing_id)
            .ok_or(MarketError::ListingNotFound(listing_id))?;
        if listing.mode == SaleMode::Auction {
            if let Some(bid) = listing.top_bid.as_ref().and_then(|id| self.biddings.get(id)) {
                return Ok(bid.amount);
            }
        }
        Ok(pricing::effective_price(listing, now))
    }

    /// An active listing by id.
    pub fn listing(&self, id: ListingId) -> Option<&Listing> {
        self.listings.get(&id)
    }

    /// All active listings of a seller, in creation order.
    pub fn listing_of_addr(&self, seller: &str) -> Vec<&Listing> {
        self.listings_of_seller
            .get(seller)
            .map(|ids| ids.iter().filter_map(|id| self.listings.get(id)).collect())
            .unwrap_or_default()
    }

    /// All live biddings of a bidder.
    pub fn bidding_of_addr(&self, bidder: &str) -> Vec<&Bidding> {
        self.biddings_of_bidder
            .get(bidder)
            .map(|ids| ids.iter().filter_map(|id| self.biddings.get(id)).collect())
            .unwrap_or_default()
    }

    /// The live bidding against a listing, if any.
    pub fn bidding_of_listing(&self, listing_id: ListingId) -> Option<&Bidding> {
        self.listings
            .get(&listing_id)?
            .top_bid
            .as_ref()
            .and_then(|id| self.biddings.get(id))
    }

    /// Claimable escrow balance of an address.
    pub fn escrow_balance(&self, address: &str) -> u64 {
        self.escrow.balance_of(address)
    }

    /// Claimable balance of the configured revenue account.
    pub fn revenue_amount(&self) -> u64 {
        self.escrow.balance_of(self.config.revenue_address())
    }

    /// Lifetime total burned through the burn accumulator.
    pub fn total_burn_amount(&self) -> u64 {
        self.burn_vault.total_burned()
    }

    /// Sum of all claimable escrow balances.
    pub fn escrow_total(&self) -> u64 {
        self.escrow.total_claimable()
    }

    /// Sum of live bid amounts currently held in custody.
    pub fn bids_in_custody(&self) -> u64 {
        self.bids_in_custody
    }

    // -- internals ------------------------------------------------------------

    fn distribution_for(
        &self,
        registry: &str,
        asset_id: AssetId,
        price: u64,
    ) -> Result<Distribution, MarketError> {
        let reg = self
            .registries
            .get(registry)
            .ok_or_else(|| MarketError::Invariant(format!("registry {registry} vanished")))?;
        Ok(Distribution::compute(
            price,
            self.config.fee_rate_bps(),
            self.config.fee_burn_rate_bps(),
            self.config.royalty_cut_bps(),
            reg.royalty_info(asset_id, price),
        ))
    }

    /// Credits every party of a settled sale and routes the burn portion.
    ///
    /// Called only after the buyer's funds are in custody; any failure past
    /// that point is an invariant violation, not a caller error.
    fn apply_distribution(
        &mut self,
        dist: &Distribution,
        seller: &str,
        registry: &str,
    ) -> Result<(), MarketError> {
        let fatal = |e: &dyn std::fmt::Display| MarketError::Invariant(e.to_string());

        self.escrow
            .credit(seller, dist.seller_proceeds)
            .map_err(|e| fatal(&e))?;
        let revenue_address = self.config.revenue_address().to_string();
        self.escrow
            .credit(&revenue_address, dist.revenue_total())
            .map_err(|e| fatal(&e))?;
        if let Some(receiver) = &dist.royalty_receiver {
            self.escrow
                .credit(receiver, dist.royalty_net)
                .map_err(|e| fatal(&e))?;
        }

        if dist.fee_burn > 0 {
            let account = self.account.clone();
            let restricted = self
                .config
                .restricted()
                .is_some_and(|r| r.registry == registry);
            if restricted {
                // The accumulator's accounting requires receipt before its
                // balance-relative burn, so this one credit is a push.
                self.burn_vault
                    .deposit_and_burn(&mut self.token, &account, dist.fee_burn)
                    .map_err(|e| fatal(&e))?;
            } else {
                let burn_address = self.config.burn_address().to_string();
                self.token
                    .transfer(&account, &burn_address, dist.fee_burn)
                    .map_err(|e| fatal(&e))?;
            }
        }
        Ok(())
    }

    fn release_escrowed_unit(
        &mut self,
        registry: &str,
        seller: &str,
        to: &str,
        asset_id: AssetId,
    ) -> Result<(), MarketError> {
        let reg = self
            .registries
            .get_mut(registry)
            .ok_or_else(|| MarketError::Invariant(format!("registry {registry} vanished")))?;
        reg.release_unit(seller, to, asset_id)
            .map_err(|e| MarketError::Invariant(format!("escrowed unit missing: {e}")))
    }

    fn retire_listing(&mut self, id: ListingId) {
        if let Some(listing) = self.listings.remove(&id) {
            if let Some(ids) = self.listings_of_seller.get_mut(&listing.seller) {
                ids.retain(|existing| *existing != id);
                if ids.is_empty() {
                    self.listings_of_seller.remove(&listing.seller);
                }
            }
        }
    }

    fn remove_bid_record(&mut self, id: &str) -> Option<Bidding> {
        let bid = self.biddings.remove(id)?;
        if let Some(ids) = self.biddings_of_bidder.get_mut(&bid.bidder) {
            ids.retain(|existing| existing != id);
            if ids.is_empty() {
                self.biddings_of_bidder.remove(&bid.bidder);
            }
        }
        Some(bid)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
