//! Console-confirmed listing submission.
//!
//! Stands in for the browser-driven form when running attended: each
//! prepared listing is printed and the batch blocks until the operator
//! types `continue`.

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use crate::models::{GeneratedListing, ProductRow};
use crate::traits::ListingSubmitter;

pub struct ConsoleSubmitter {
    seller_email: String,
}

impl ConsoleSubmitter {
    pub fn new(seller_email: String) -> Self {
        Self { seller_email }
    }

    async fn wait_for_continue(&self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        println!("Type 'continue' once the listing has been placed on the portal:");
        while let Some(line) = lines.next_line().await? {
            if line.trim().eq_ignore_ascii_case("continue") {
                return Ok(());
            }
            println!("Please type exactly 'continue' to proceed.");
        }
        anyhow::bail!("input closed before the listing was confirmed")
    }
}

#[async_trait]
impl ListingSubmitter for ConsoleSubmitter {
    async fn submit_listing(
        &self,
        row: &ProductRow,
        listing: &GeneratedListing,
        image: &Path,
    ) -> Result<()> {
        info!("Prepared listing for seller account {}", self.seller_email);

        println!("----------------------------------------");
        println!("Name:        {}", listing.name);
        println!("Description: {}", listing.description);
        if let Some(product_type) = &listing.product_type {
            println!("Type:        {product_type}");
        }
        if let Some(code) = &row.code {
            println!("Code:        {code}");
        }
        println!("Price:       {}   Quantity: {}", row.price, row.quantity);
        println!("Image:       {}", image.display());
        println!("----------------------------------------");

        self.wait_for_continue().await
    }
}
