use crate::application::cache::VisibilityCache;
use crate::domain::ports::ReferenceData;
use crate::domain::product::DeliveryLocation;
use crate::domain::zone::{DELIVER_WORLDWIDE, RestrictionMode, ZoneId};
use crate::error::Result;

pub const REASON_NOT_AVAILABLE: &str = "not available for delivery";
pub const REASON_LOCATION_BLOCKED: &str = "product not available for delivery to this location";
pub const REASON_NO_ZONES_CONFIGURED: &str = "product has no delivery zones configured";
pub const REASON_SETTINGS_MISSING: &str = "delivery settings not configured for this channel";

/// Outcome of one eligibility check. An eligible verdict carries an
/// empty reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub eligible: bool,
    pub reason: String,
}

impl Verdict {
    fn eligible() -> Self {
        Self {
            eligible: true,
            reason: String::new(),
        }
    }

    fn blocked(reason: impl Into<String>) -> Self {
        Self {
            eligible: false,
            reason: reason.into(),
        }
    }
}

/// Decides whether a product may be delivered to a location on a channel.
///
/// Checks run in a fixed order: visibility, then zone restrictions, then
/// the channel's default delivery zone. Each check carries an explicit
/// failure posture: visibility fails closed (a product must prove it is
/// visible), while zone and settings lookups fail open (a flaky zone
/// directory must not block a whole cart). Both postures are load-bearing
/// product behavior, not incidental error handling.
pub struct EligibilityResolver<'a> {
    port: &'a dyn ReferenceData,
    cache: VisibilityCache,
}

impl<'a> EligibilityResolver<'a> {
    /// Creates a resolver with a fresh pass-scoped visibility cache.
    pub fn new(port: &'a dyn ReferenceData) -> Self {
        Self {
            port,
            cache: VisibilityCache::new(),
        }
    }

    pub async fn check(
        &mut self,
        sku: &str,
        location: &DeliveryLocation,
        channel: Option<&str>,
    ) -> Verdict {
        // No channel context means no visibility can be proven. Fail closed.
        let Some(channel) = channel else {
            return Verdict::blocked(REASON_NOT_AVAILABLE);
        };

        match self.cache.is_visible(self.port, sku, channel).await {
            Ok(true) => {}
            Ok(false) => return Verdict::blocked(REASON_NOT_AVAILABLE),
            Err(err) => {
                tracing::warn!(%sku, %channel, error = %err, "visibility lookup failed, failing closed");
                return Verdict::blocked(REASON_NOT_AVAILABLE);
            }
        }

        match self.check_delivery_zones(sku, location, channel).await {
            Ok(verdict) => verdict,
            Err(err) => {
                tracing::warn!(%sku, error = %err, "zone eligibility lookup failed, failing open");
                Verdict::eligible()
            }
        }
    }

    async fn check_delivery_zones(
        &self,
        sku: &str,
        location: &DeliveryLocation,
        channel: &str,
    ) -> Result<Verdict> {
        let country_code = self
            .port
            .resolve_country_code(&location.country)
            .await?
            .unwrap_or_default();

        let restrictions = self.port.zone_restrictions(sku).await?;
        if restrictions.is_empty() {
            return self.check_default_zone(location, channel).await;
        }

        let Some(zone) = self
            .port
            .zone_for_pincode(&location.pincode, &country_code)
            .await?
        else {
            return Ok(Verdict::blocked(format!(
                "delivery not available to pincode {}",
                location.pincode
            )));
        };

        let (includes, excludes): (Vec<&ZoneId>, Vec<&ZoneId>) = {
            let mut includes = Vec::new();
            let mut excludes = Vec::new();
            for restriction in &restrictions {
                match restriction.mode {
                    RestrictionMode::Include => includes.push(&restriction.zone),
                    RestrictionMode::Exclude => excludes.push(&restriction.zone),
                }
            }
            (includes, excludes)
        };

        let verdict = if !includes.is_empty() {
            if includes.contains(&&zone) {
                Verdict::eligible()
            } else {
                Verdict::blocked(REASON_LOCATION_BLOCKED)
            }
        } else if !excludes.is_empty() {
            if excludes.contains(&&zone) {
                Verdict::blocked(REASON_LOCATION_BLOCKED)
            } else {
                Verdict::eligible()
            }
        } else {
            Verdict::blocked(REASON_NO_ZONES_CONFIGURED)
        };
        Ok(verdict)
    }

    /// Fallback for products with no zone restrictions: the channel's
    /// default delivery zone decides, with the `is_default` record as a
    /// second fallback.
    async fn check_default_zone(
        &self,
        location: &DeliveryLocation,
        channel: &str,
    ) -> Result<Verdict> {
        let toggles = match self.port.channel_toggles(Some(channel)).await? {
            Some(toggles) => Some(toggles),
            None => self.port.channel_toggles(None).await?,
        };
        let Some(toggles) = toggles else {
            return Ok(Verdict::blocked(REASON_SETTINGS_MISSING));
        };

        let zone = &toggles.default_delivery_zone;
        if zone == DELIVER_WORLDWIDE || zone == &location.country {
            Ok(Verdict::eligible())
        } else {
            Ok(Verdict::blocked(format!(
                "product only available for delivery to {zone}"
            )))
        }
    }
}
