use super::product::Product;
use super::tax::TaxRateProfile;
use super::zone::{ChannelToggles, ProductZoneRestriction, ZoneId};
use crate::error::Result;
use async_trait::async_trait;

/// Read-only access to externally owned reference data: catalog, tax
/// profiles, visibility rows, the zone/pincode directory and channel
/// configuration.
///
/// Implementations may perform blocking or asynchronous lookups; the
/// engine awaits each lookup before taking the dependent decision.
#[async_trait]
pub trait ReferenceData: Send + Sync {
    async fn product(&self, sku: &str) -> Result<Option<Product>>;

    async fn tax_profile(&self, profile_id: &str) -> Result<Option<TaxRateProfile>>;

    /// `Ok(None)` means no visibility row exists for the pair.
    async fn product_visibility(&self, sku: &str, channel: &str) -> Result<Option<bool>>;

    async fn zone_restrictions(&self, sku: &str) -> Result<Vec<ProductZoneRestriction>>;

    /// A pincode maps to at most one zone per country.
    async fn zone_for_pincode(&self, pincode: &str, country_code: &str) -> Result<Option<ZoneId>>;

    /// `None` asks for the single `is_default = true` record.
    async fn channel_toggles(&self, channel: Option<&str>) -> Result<Option<ChannelToggles>>;

    /// Resolves a country name or ISO code (case-insensitive) to the
    /// canonical code.
    async fn resolve_country_code(&self, name_or_code: &str) -> Result<Option<String>>;
}

pub type ReferenceDataBox = Box<dyn ReferenceData>;
