use serde::Serialize;

use super::domain::{CleanerId, GeoPoint, JobId, PropertyConfiguration};

/// Failure surfaced by any payment-gateway call. Callers map these to the
/// domain states (`failed`, `capture_failed`, `held`) rather than letting
/// them escape a batch.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayError {
    #[error("gateway declined the request: {0}")]
    Declined(String),
    #[error("gateway unavailable: {0}")]
    Unavailable(String),
}

/// Result of capturing a previously authorized payment intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureReceipt {
    pub amount_cents: i64,
    pub transaction_id: String,
}

/// Audit metadata attached to every cleaner transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferMetadata {
    pub job_id: JobId,
    pub cleaner_id: CleanerId,
    pub base_cents: i64,
    pub urgent_bonus_cents: i64,
    pub laundry_bonus_cents: i64,
}

/// External payment processor boundary: manual-capture authorization,
/// capture, and connected-account transfers.
pub trait PaymentGateway: Send + Sync {
    fn authorize(
        &self,
        customer_id: &str,
        payment_method_id: &str,
        amount_cents: i64,
    ) -> Result<String, GatewayError>;

    fn capture(&self, intent_id: &str) -> Result<CaptureReceipt, GatewayError>;

    fn transfer(
        &self,
        connected_account_id: &str,
        amount_cents: i64,
        metadata: &TransferMetadata,
    ) -> Result<String, GatewayError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum GeocodeError {
    #[error("geocoding service unavailable: {0}")]
    Unavailable(String),
}

/// Black-box address-to-coordinates lookup; `Ok(None)` means the provider
/// could not place the address.
pub trait GeocodeResolver: Send + Sync {
    fn resolve(&self, address: &str) -> Result<Option<GeoPoint>, GeocodeError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum FeedError {
    #[error("failed to fetch calendar feed: {0}")]
    Fetch(String),
}

/// External calendar feed; returns the raw feed body for parsing.
pub trait CalendarFeed: Send + Sync {
    fn fetch(&self, url: &str) -> Result<String, FeedError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum PricingError {
    #[error("no price available for property: {0}")]
    Unpriceable(String),
}

/// Price quote for one clean, in integer cents. The same calculator backs
/// the customer-facing preview, so amounts must match bit for bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceQuote {
    pub total_per_clean_cents: i64,
}

pub trait PricingCalculator: Send + Sync {
    fn calculate(&self, property: &PropertyConfiguration) -> Result<PriceQuote, PricingError>;
}
