//! Duplicate-check client for the seller catalog API.

use reqwest::Client;
use tracing::{debug, warn};

use crate::credentials::CredentialStore;
use crate::error::Error;
use crate::models::CatalogSearchResult;

const CATALOG_URL: &str = "https://sellingpartnerapi-na.amazon.com/catalog/2022-04-01/items";
const MARKETPLACE_ID: &str = "A2Q3Y263D00KWC";
const LOCALE: &str = "pt_BR";
const IDENTIFIER_TYPE: &str = "EAN";

pub struct CatalogClient {
    client: Client,
    base_url: String,
    store: CredentialStore,
}

impl CatalogClient {
    pub fn new(store: CredentialStore) -> Self {
        Self::with_url(store, CATALOG_URL.to_string())
    }

    /// Creates a client against a custom catalog endpoint.
    pub fn with_url(store: CredentialStore, base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            store,
        }
    }

    /// Counts catalog entries matching a product identifier code.
    ///
    /// Uses whatever token the store currently holds, stale or absent; an
    /// unauthenticated request is expected to be rejected upstream and
    /// surfaces as an error. A malformed body on a successful response is
    /// logged and treated as zero matches.
    pub async fn lookup_by_code(&self, code: &str) -> Result<u64, Error> {
        let url = format!(
            "{}?marketplaceIds={}&locale={}&identifiers={}&identifiersType={}",
            self.base_url,
            MARKETPLACE_ID,
            LOCALE,
            urlencoding::encode(code),
            IDENTIFIER_TYPE
        );

        let mut request = self.client.get(&url);
        if let Some(credential) = self.store.current().await {
            debug!("Using seller token obtained at {}", credential.obtained_at);
            request = request
                .header("x-amz-access-token", &credential.access_token)
                .bearer_auth(&credential.access_token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let text = response.text().await?;
        match serde_json::from_str::<CatalogSearchResult>(&text) {
            Ok(result) => Ok(result.number_of_results),
            Err(e) => {
                warn!("Catalog response did not match the expected shape, treating as no matches: {e}");
                Ok(0)
            }
        }
    }
}

impl Clone for CatalogClient {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            store: self.store.clone(),
        }
    }
}
