//! Traits and interfaces for portal-agnostic listing submission

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{GeneratedListing, ProductRow};

/// The opaque "submit one listing" operation, backed by whatever drives the
/// seller portal's multi-step form.
#[async_trait]
pub trait ListingSubmitter: Send + Sync {
    /// Submits one prepared listing: the original row, the generated copy
    /// and the locally cached product image.
    ///
    /// # Returns
    /// * `Result<()>` - Ok once the listing has been placed, or the submission error
    async fn submit_listing(
        &self,
        row: &ProductRow,
        listing: &GeneratedListing,
        image: &Path,
    ) -> Result<()>;
}
