use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZoneId(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RestrictionMode {
    /// Allow-list: the product ships only to the listed zones.
    Include,
    /// Deny-list: the product ships anywhere except the listed zones.
    Exclude,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductZoneRestriction {
    pub mode: RestrictionMode,
    pub zone: ZoneId,
}

/// Delivery configuration for one customer-group/selling-channel pair,
/// with a single `is_default` record acting as the global fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelToggles {
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    /// Either a literal country name or [`DELIVER_WORLDWIDE`].
    pub default_delivery_zone: String,
}

/// Sentinel default-delivery-zone value meaning no country restriction.
pub const DELIVER_WORLDWIDE: &str = "All over world";
