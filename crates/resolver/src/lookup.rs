//! External geocoder seam.

use std::time::Duration;

use {
    async_trait::async_trait,
    lagebot_common::types::RegionId,
    tracing::{debug, warn},
};

use crate::Result;

/// External place-lookup (geocoding) service, network-bound.
///
/// With `restrict_to_admin_type` set, results are limited to administrative
/// place categories. That is the second, narrowed query used when a free
/// search is ambiguous.
#[async_trait]
pub trait PlaceLookupService: Send + Sync {
    async fn find(&self, text: &str, restrict_to_admin_type: bool) -> Result<Vec<RegionId>>;
}

/// Query the lookup service with a bounded timeout. An error or timeout
/// degrades to "no hits": an unresolvable query must produce a no-match
/// reply, not a fault.
pub(crate) async fn find_bounded(
    service: &dyn PlaceLookupService,
    text: &str,
    restrict_to_admin_type: bool,
    timeout: Duration,
) -> Vec<RegionId> {
    match tokio::time::timeout(timeout, service.find(text, restrict_to_admin_type)).await {
        Ok(Ok(hits)) => hits,
        Ok(Err(error)) => {
            warn!(query = text, error = %error, "place lookup failed");
            Vec::new()
        },
        Err(_) => {
            debug!(
                query = text,
                timeout_ms = timeout.as_millis() as u64,
                "place lookup timed out"
            );
            Vec::new()
        },
    }
}
