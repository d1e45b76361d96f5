use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{error, info};

use crate::catalog::CatalogClient;
use crate::content::ContentClient;
use crate::images::ImageFetcher;
use crate::models::{GeneratedListing, ProductRow};
use crate::traits::ListingSubmitter;

pub struct ListingBot {
    catalog: CatalogClient,
    content: ContentClient,
    images: ImageFetcher,
    step_interval: Duration,
}

enum RowOutcome {
    Submitted,
    AlreadyListed,
}

impl ListingBot {
    pub fn new(
        catalog: CatalogClient,
        content: ContentClient,
        images: ImageFetcher,
        step_interval: Duration,
    ) -> Self {
        Self {
            catalog,
            content,
            images,
            step_interval,
        }
    }

    /// Processes every product row in order. A per-row failure is logged and
    /// the batch moves on; no row failure is fatal.
    pub async fn run_batch<S: ListingSubmitter>(
        &self,
        rows: &[ProductRow],
        submitter: &S,
    ) -> Result<()> {
        let mut submitted = 0;
        let mut skipped = 0;
        let mut failed = 0;

        for (index, row) in rows.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.step_interval).await;
            }

            match self.process_row(row, submitter).await {
                Ok(RowOutcome::Submitted) => {
                    info!("Listed: {}", row.name);
                    submitted += 1;
                }
                Ok(RowOutcome::AlreadyListed) => {
                    info!("Already in the catalog, skipping: {}", row.name);
                    skipped += 1;
                }
                Err(e) => {
                    error!("Failed to list '{}': {e:#}", row.name);
                    failed += 1;
                }
            }
        }

        info!("Batch finished: {submitted} submitted, {skipped} already listed, {failed} failed");
        Ok(())
    }

    async fn process_row<S: ListingSubmitter>(
        &self,
        row: &ProductRow,
        submitter: &S,
    ) -> Result<RowOutcome> {
        if let Some(code) = &row.code {
            let matches = self
                .catalog
                .lookup_by_code(code)
                .await
                .context("duplicate check failed")?;
            if matches > 0 {
                return Ok(RowOutcome::AlreadyListed);
            }
        }

        let seed = serde_json::to_string(row)?;
        let payload = self
            .content
            .generate(&seed)
            .await
            .context("content generation failed")?;
        let listing: GeneratedListing = serde_json::from_value(payload)
            .context("generated content did not match the expected schema")?;

        let image = self
            .images
            .download(&row.image_url)
            .await
            .context("image download failed")?;

        submitter
            .submit_listing(row, &listing, &image)
            .await
            .context("listing submission failed")?;

        Ok(RowOutcome::Submitted)
    }
}
