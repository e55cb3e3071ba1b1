use crate::domain::ports::ReferenceData;
use crate::domain::product::Product;
use crate::domain::tax::TaxRateProfile;
use crate::domain::zone::{ChannelToggles, ProductZoneRestriction, RestrictionMode, ZoneId};
use crate::error::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;

/// Flat fixture rows, friendly to a JSON file.
#[derive(Debug, Clone, Deserialize)]
pub struct VisibilityRow {
    pub sku: String,
    pub channel: String,
    pub is_visible: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ZoneRestrictionRow {
    pub sku: String,
    pub mode: RestrictionMode,
    pub zone: ZoneId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PincodeZoneRow {
    pub pincode: String,
    pub country_code: String,
    pub zone: ZoneId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CountryRow {
    /// Canonical ISO code, e.g. "IN".
    pub code: String,
    /// Display names that should resolve to the code.
    #[serde(default)]
    pub names: Vec<String>,
}

/// Deserializable bundle of reference data, as loaded from a JSON fixture.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReferenceFixture {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub tax_profiles: Vec<TaxRateProfile>,
    #[serde(default)]
    pub visibility: Vec<VisibilityRow>,
    #[serde(default)]
    pub zone_restrictions: Vec<ZoneRestrictionRow>,
    #[serde(default)]
    pub pincode_zones: Vec<PincodeZoneRow>,
    #[serde(default)]
    pub channel_toggles: Vec<ChannelToggles>,
    #[serde(default)]
    pub countries: Vec<CountryRow>,
}

/// In-memory [`ReferenceData`] backed by hash maps.
///
/// Used by the CLI (loaded from a JSON fixture) and throughout the tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReferenceData {
    products: HashMap<String, Product>,
    tax_profiles: HashMap<String, TaxRateProfile>,
    visibility: HashMap<(String, String), bool>,
    zone_restrictions: HashMap<String, Vec<ProductZoneRestriction>>,
    pincode_zones: HashMap<(String, String), ZoneId>,
    channel_toggles: HashMap<String, ChannelToggles>,
    default_toggles: Option<ChannelToggles>,
    // Lowercased country name or code -> canonical code.
    countries: HashMap<String, String>,
}

impl InMemoryReferenceData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixture(fixture: ReferenceFixture) -> Self {
        let mut data = Self::new();
        for product in fixture.products {
            data = data.with_product(product);
        }
        for profile in fixture.tax_profiles {
            data = data.with_tax_profile(profile);
        }
        for row in fixture.visibility {
            data = data.with_visibility(&row.sku, &row.channel, row.is_visible);
        }
        for row in fixture.zone_restrictions {
            data = data.with_zone_restriction(&row.sku, row.mode, row.zone);
        }
        for row in fixture.pincode_zones {
            data = data.with_pincode_zone(&row.pincode, &row.country_code, row.zone);
        }
        for toggles in fixture.channel_toggles {
            data = data.with_channel_toggles(toggles);
        }
        for country in fixture.countries {
            data = data.with_country(&country.code, &country.names);
        }
        data
    }

    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self> {
        let fixture: ReferenceFixture = serde_json::from_reader(reader)?;
        Ok(Self::from_fixture(fixture))
    }

    pub fn with_product(mut self, product: Product) -> Self {
        self.products.insert(product.sku.clone(), product);
        self
    }

    pub fn with_tax_profile(mut self, profile: TaxRateProfile) -> Self {
        self.tax_profiles.insert(profile.id.clone(), profile);
        self
    }

    pub fn with_visibility(mut self, sku: &str, channel: &str, is_visible: bool) -> Self {
        self.visibility
            .insert((sku.to_owned(), channel.to_owned()), is_visible);
        self
    }

    pub fn with_zone_restriction(mut self, sku: &str, mode: RestrictionMode, zone: ZoneId) -> Self {
        self.zone_restrictions
            .entry(sku.to_owned())
            .or_default()
            .push(ProductZoneRestriction { mode, zone });
        self
    }

    pub fn with_pincode_zone(mut self, pincode: &str, country_code: &str, zone: ZoneId) -> Self {
        self.pincode_zones
            .insert((pincode.to_owned(), country_code.to_owned()), zone);
        self
    }

    pub fn with_channel_toggles(mut self, toggles: ChannelToggles) -> Self {
        if toggles.is_default {
            self.default_toggles = Some(toggles.clone());
        }
        if let Some(channel) = &toggles.channel {
            self.channel_toggles.insert(channel.clone(), toggles);
        }
        self
    }

    pub fn with_country(mut self, code: &str, names: &[String]) -> Self {
        self.countries
            .insert(code.to_lowercase(), code.to_owned());
        for name in names {
            self.countries.insert(name.to_lowercase(), code.to_owned());
        }
        self
    }
}

#[async_trait]
impl ReferenceData for InMemoryReferenceData {
    async fn product(&self, sku: &str) -> Result<Option<Product>> {
        Ok(self.products.get(sku).cloned())
    }

    async fn tax_profile(&self, profile_id: &str) -> Result<Option<TaxRateProfile>> {
        Ok(self.tax_profiles.get(profile_id).cloned())
    }

    async fn product_visibility(&self, sku: &str, channel: &str) -> Result<Option<bool>> {
        Ok(self
            .visibility
            .get(&(sku.to_owned(), channel.to_owned()))
            .copied())
    }

    async fn zone_restrictions(&self, sku: &str) -> Result<Vec<ProductZoneRestriction>> {
        Ok(self.zone_restrictions.get(sku).cloned().unwrap_or_default())
    }

    async fn zone_for_pincode(&self, pincode: &str, country_code: &str) -> Result<Option<ZoneId>> {
        Ok(self
            .pincode_zones
            .get(&(pincode.to_owned(), country_code.to_owned()))
            .cloned())
    }

    async fn channel_toggles(&self, channel: Option<&str>) -> Result<Option<ChannelToggles>> {
        match channel {
            Some(channel) => Ok(self.channel_toggles.get(channel).cloned()),
            None => Ok(self.default_toggles.clone()),
        }
    }

    async fn resolve_country_code(&self, name_or_code: &str) -> Result<Option<String>> {
        Ok(self
            .countries
            .get(&name_or_code.trim().to_lowercase())
            .cloned())
    }
}
