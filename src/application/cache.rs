use crate::domain::ports::ReferenceData;
use crate::error::Result;
use std::collections::HashMap;

/// Memoizes product-visibility lookups for the lifetime of one
/// aggregation pass.
///
/// The cache must be recreated per pass: visibility configuration can
/// change between requests, and the key carries no tenant component, so a
/// process-wide instance would serve stale or foreign rows.
#[derive(Debug, Default)]
pub struct VisibilityCache {
    entries: HashMap<(String, String), bool>,
}

impl VisibilityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the product is visible on the channel, hitting the port at
    /// most once per `(sku, channel)` pair. A missing row counts as not
    /// visible and negative results are cached too. Port errors are not
    /// cached and surface to the caller.
    pub async fn is_visible(
        &mut self,
        port: &dyn ReferenceData,
        sku: &str,
        channel: &str,
    ) -> Result<bool> {
        let key = (sku.to_owned(), channel.to_owned());
        if let Some(&visible) = self.entries.get(&key) {
            return Ok(visible);
        }
        let visible = port.product_visibility(sku, channel).await?.unwrap_or(false);
        self.entries.insert(key, visible);
        Ok(visible)
    }
}
