// Generic resource endpoints
//
// Every catalog collection shares one REST shape:
//   GET    {collection}?limit&offset&sort&order&<filters>  -> Page<T>
//   POST   {collection}                                    -> T
//   PATCH  {collection}/{id}                               -> T
//   DELETE {collection}/{id}

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::client::CatalogClient;
use crate::error::Error;

/// One page of a list response.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    #[serde(alias = "totalCount", alias = "total")]
    pub total_count: u64,
}

impl CatalogClient {
    /// Fetch one page of `collection`. `params` are sent verbatim as the
    /// query string.
    pub async fn list<T: DeserializeOwned>(
        &self,
        collection: &str,
        params: &[(String, String)],
    ) -> Result<Page<T>, Error> {
        self.get_with_params(collection, params).await
    }

    pub async fn create<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        collection: &str,
        body: &B,
    ) -> Result<T, Error> {
        self.post(collection, body).await
    }

    pub async fn update<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        collection: &str,
        id: &str,
        body: &B,
    ) -> Result<T, Error> {
        self.patch(self.record_url(collection, id)?, body).await
    }

    pub async fn remove(&self, collection: &str, id: &str) -> Result<(), Error> {
        self.delete(self.record_url(collection, id)?).await
    }
}
