// ── Resource data port ──
//
// Typed list / create / update / delete per catalog resource. The table
// and modal controllers depend only on `ResourcePort`, so tests can drive
// them with in-memory fakes while production code goes through
// `RemotePort` and the HTTP client.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use strum::{AsRefStr, Display, EnumIter, EnumString};
use tracing::{debug, warn};

use marquee_api::{CatalogClient, Page};

use crate::error::CoreError;
use crate::model::EntityId;
use crate::query::PageRequest;
use crate::table::ColumnDescriptor;
use crate::validate::Validate;

// ── Resource kinds ──────────────────────────────────────────────────

/// Catalog collections. The lowercase name is both the API path segment
/// and the permission-grant resource name.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, AsRefStr, Serialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Genres,
    Tags,
    Movies,
    Rentals,
    Users,
}

impl ResourceKind {
    /// API collection path (`genres`, `movies`, ...).
    pub fn collection(self) -> &'static str {
        match self {
            Self::Genres => "genres",
            Self::Tags => "tags",
            Self::Movies => "movies",
            Self::Rentals => "rentals",
            Self::Users => "users",
        }
    }

    /// Singular, human-facing name.
    pub fn singular(self) -> &'static str {
        match self {
            Self::Genres => "genre",
            Self::Tags => "tag",
            Self::Movies => "movie",
            Self::Rentals => "rental",
            Self::Users => "user",
        }
    }
}

/// A catalog record type with its own inputs and table columns.
pub trait Resource: Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: ResourceKind;

    type Create: Validate + Serialize + Default + Clone + fmt::Debug + Send + Sync + 'static;
    type Update: Validate + Serialize + Default + Clone + fmt::Debug + Send + Sync + 'static;

    fn id(&self) -> &EntityId;

    fn columns() -> Vec<ColumnDescriptor<Self>>;
}

// ── Page result ─────────────────────────────────────────────────────

/// One page of records plus the server-side total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageResult<T> {
    pub data: Vec<T>,
    pub total_count: u64,
}

impl<T> PageResult<T> {
    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            total_count: 0,
        }
    }
}

impl<T> From<Page<T>> for PageResult<T> {
    fn from(page: Page<T>) -> Self {
        Self {
            data: page.data,
            total_count: page.total_count,
        }
    }
}

// ── Port ────────────────────────────────────────────────────────────

/// Data access for resource `R`. Every failure carries a message; there is
/// no partial-success shape.
#[async_trait]
pub trait ResourcePort<R: Resource>: Send + Sync {
    async fn list(&self, request: &PageRequest) -> Result<PageResult<R>, CoreError>;

    async fn create(&self, input: &R::Create) -> Result<R, CoreError>;

    async fn update(&self, id: &EntityId, input: &R::Update) -> Result<R, CoreError>;

    async fn delete(&self, id: &EntityId) -> Result<(), CoreError>;
}

/// [`ResourcePort`] over the catalog HTTP API.
pub struct RemotePort<R> {
    client: Arc<CatalogClient>,
    _resource: PhantomData<fn() -> R>,
}

impl<R> RemotePort<R> {
    pub fn new(client: Arc<CatalogClient>) -> Self {
        Self {
            client,
            _resource: PhantomData,
        }
    }
}

impl<R> Clone for RemotePort<R> {
    fn clone(&self) -> Self {
        Self::new(Arc::clone(&self.client))
    }
}

impl<R: Resource> RemotePort<R> {
    /// Attach the resource kind and id to a bare 404.
    fn not_found(err: CoreError, id: &EntityId) -> CoreError {
        match err {
            CoreError::NotFound { .. } => CoreError::NotFound {
                resource: R::KIND.singular().into(),
                identifier: id.to_string(),
            },
            other => other,
        }
    }
}

#[async_trait]
impl<R: Resource> ResourcePort<R> for RemotePort<R> {
    async fn list(&self, request: &PageRequest) -> Result<PageResult<R>, CoreError> {
        debug!(resource = %R::KIND, %request, "listing");
        let page: Page<R> = self
            .client
            .list(R::KIND.collection(), &request.to_api_params())
            .await?;

        let result = PageResult::from(page);
        if usize::try_from(result.total_count).is_ok_and(|total| total < result.data.len()) {
            warn!(
                resource = %R::KIND,
                total = result.total_count,
                rows = result.data.len(),
                "server reported fewer total rows than it returned"
            );
        }
        Ok(result)
    }

    async fn create(&self, input: &R::Create) -> Result<R, CoreError> {
        debug!(resource = %R::KIND, "creating");
        Ok(self.client.create(R::KIND.collection(), input).await?)
    }

    async fn update(&self, id: &EntityId, input: &R::Update) -> Result<R, CoreError> {
        debug!(resource = %R::KIND, %id, "updating");
        self.client
            .update(R::KIND.collection(), &id.to_path_segment(), input)
            .await
            .map_err(|e| Self::not_found(e.into(), id))
    }

    async fn delete(&self, id: &EntityId) -> Result<(), CoreError> {
        debug!(resource = %R::KIND, %id, "deleting");
        self.client
            .remove(R::KIND.collection(), &id.to_path_segment())
            .await
            .map_err(|e| Self::not_found(e.into(), id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::Genre;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn port(server: &MockServer) -> RemotePort<Genre> {
        let credentials = marquee_api::Credentials::ApiKey {
            key: "test-key".to_string().into(),
        };
        let client = CatalogClient::new(
            &format!("{}/api", server.uri()),
            &credentials,
            &marquee_api::TransportConfig::default(),
        )
        .unwrap();
        RemotePort::new(Arc::new(client))
    }

    #[test]
    fn kind_names_match_collections() {
        use strum::IntoEnumIterator;
        for kind in ResourceKind::iter() {
            assert_eq!(kind.to_string(), kind.collection());
            assert_eq!(kind.collection().parse::<ResourceKind>().unwrap(), kind);
        }
    }

    #[tokio::test]
    async fn list_sends_window_and_sort() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/genres"))
            .and(query_param("limit", "10"))
            .and(query_param("offset", "10"))
            .and(query_param("sort", "name"))
            .and(query_param("order", "desc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "id": "g11", "name": "Noir" }],
                "total_count": 11
            })))
            .mount(&server)
            .await;

        let mut request = PageRequest::first_page(10).with_sort(crate::SortSpec::desc("name"));
        request.offset = 10;
        let page = port(&server).await.list(&request).await.unwrap();
        assert_eq!(page.total_count, 11);
        assert_eq!(page.data[0].name, "Noir");
    }

    #[tokio::test]
    async fn delete_of_missing_record_names_it() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/genres/g-gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = port(&server)
            .await
            .delete(&EntityId::from("g-gone"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "genre not found: g-gone");
    }

    #[tokio::test]
    async fn delete_cannot_escape_its_collection() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/users/u1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let result = port(&server)
            .await
            .delete(&EntityId::from("../users/u1"))
            .await;
        assert!(matches!(result, Err(CoreError::NotFound { .. })), "got: {result:?}");

        let paths: Vec<String> = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .map(|r| r.url.path().to_owned())
            .collect();
        assert_eq!(paths, ["/api/genres/..%2Fusers%2Fu1"]);
    }
}
