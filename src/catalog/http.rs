use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use super::models::{InsuranceCase, Product, Receipt, Sequence, Vehicle, Warehouse};
use super::{Catalog, ListResponse, Page, SearchQuery};
use crate::config::ApiConfig;
use crate::error::Error;
use crate::selector::Candidate;
use crate::session::SessionState;
use crate::types::EntityId;

/// Authenticated REST client for the workshop backend.
///
/// Every request carries `Authorization: Bearer <token>` while the session
/// holds a token, and goes out unauthenticated otherwise.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

struct Inner {
    config: ApiConfig,
    http: reqwest::Client,
    session: Arc<SessionState>,
}

impl ApiClient {
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the HTTP client cannot be built.
    pub fn new(config: ApiConfig, session: Arc<SessionState>) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self::with_http_client(config, session, http))
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    #[must_use]
    pub fn with_http_client(
        config: ApiConfig,
        session: Arc<SessionState>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                http,
                session,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn session(&self) -> &Arc<SessionState> {
        &self.inner.session
    }

    #[must_use]
    pub fn warehouses(&self) -> HttpCatalog<Warehouse> {
        HttpCatalog::new(self.clone(), "bodegas", "warehouse")
    }

    #[must_use]
    pub fn vehicles(&self) -> HttpCatalog<Vehicle> {
        HttpCatalog::new(self.clone(), "vehiculos", "vehicle")
    }

    #[must_use]
    pub fn receipts(&self) -> HttpCatalog<Receipt> {
        HttpCatalog::new(self.clone(), "recepciones", "receipt")
    }

    #[must_use]
    pub fn insurance_cases(&self) -> HttpCatalog<InsuranceCase> {
        HttpCatalog::new(self.clone(), "siniestros", "insurance case")
    }

    #[must_use]
    pub fn sequences(&self) -> HttpCatalog<Sequence> {
        HttpCatalog::new(self.clone(), "consecutivos", "sequence")
    }

    #[must_use]
    pub fn products(&self) -> HttpCatalog<Product> {
        HttpCatalog::new(self.clone(), "productos", "product")
    }

    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, Error> {
        self.inner.config.endpoint(path)
    }

    /// Endpoint for one record of a catalog, with `id` as a single
    /// percent-encoded path segment.
    fn item_endpoint(&self, path: &str, id: &EntityId) -> Result<Url, Error> {
        let mut url = self.endpoint(path)?;
        url.path_segments_mut()
            .map_err(|()| Error::Config(format!("endpoint {path}: not a hierarchical URL")))?
            .pop_if_empty()
            .push(id.as_str());
        Ok(url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.inner.session.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// GET `path` with query pairs, decoding the JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on network failure, or [`Error::Api`] if the
    /// backend answers with a non-success status.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        operation: &'static str,
    ) -> Result<T, Error> {
        self.get_url_json(self.endpoint(path)?, query, operation).await
    }

    async fn get_url_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
        operation: &'static str,
    ) -> Result<T, Error> {
        let response = self
            .authorize(self.inner.http.get(url).query(query))
            .send()
            .await?;
        let response = ensure_success(response, operation).await?;
        response.json::<T>().await.map_err(Into::into)
    }

    /// POST a JSON body to `path`, decoding the JSON response.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on network failure, or [`Error::Api`] if the
    /// backend answers with a non-success status.
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        operation: &'static str,
    ) -> Result<T, Error> {
        let url = self.endpoint(path)?;
        let response = self
            .authorize(self.inner.http.post(url).json(body))
            .send()
            .await?;
        let response = ensure_success(response, operation).await?;
        response.json::<T>().await.map_err(Into::into)
    }
}

/// Checks HTTP response status; returns the response on success or an error with details.
pub(crate) async fn ensure_success(
    response: reqwest::Response,
    operation: &'static str,
) -> Result<reqwest::Response, Error> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    tracing::warn!(operation, status, "Backend request failed");
    Err(Error::Api {
        operation,
        status: Some(status),
        detail: body,
    })
}

/// One REST catalog: `GET {base}/{path}` to search, `GET {base}/{path}/{id}` to look up.
pub struct HttpCatalog<T> {
    client: ApiClient,
    path: &'static str,
    name: &'static str,
    _item: PhantomData<fn() -> T>,
}

impl<T> Clone for HttpCatalog<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            path: self.path,
            name: self.name,
            _item: PhantomData,
        }
    }
}

impl<T> HttpCatalog<T> {
    #[must_use]
    pub fn new(client: ApiClient, path: &'static str, name: &'static str) -> Self {
        Self {
            client,
            path,
            name,
            _item: PhantomData,
        }
    }

    #[must_use]
    pub fn path(&self) -> &'static str {
        self.path
    }
}

impl<T> Catalog for HttpCatalog<T>
where
    T: Candidate + DeserializeOwned,
{
    type Item = T;

    async fn search(&self, query: &SearchQuery) -> Result<Page<T>, Error> {
        let mut params = vec![
            ("limit", query.limit.to_string()),
            ("offset", query.offset.to_string()),
        ];
        let text = query.text.trim();
        if !text.is_empty() {
            params.push(("search", text.to_string()));
        }
        let response: ListResponse<T> = self
            .client
            .get_json(self.path, &params, "catalog search")
            .await
            .inspect_err(|e| tracing::debug!(catalog = self.name, error = %e, "Search failed"))?;
        Ok(response.into())
    }

    async fn fetch(&self, id: &EntityId) -> Result<T, Error> {
        let url = self.client.item_endpoint(self.path, id)?;
        self.client.get_url_json(url, &[], "catalog lookup").await
    }
}

#[cfg(test)]
mod tests {
    use axum::Json;
    use axum::Router;
    use axum::extract::{Path, Query};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use serde_json::{Value, json};
    use std::collections::HashMap;

    use super::*;
    use crate::types::{UserId, UserProfile};

    async fn list_vehicles(
        headers: HeaderMap,
        Query(params): Query<HashMap<String, String>>,
    ) -> Json<Value> {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let search = params.get("search").cloned().unwrap_or_default();
        Json(json!({
            "data": [{"id": 1, "placa": format!("{search}-1"), "cliente": auth}],
            "total": 40,
            "limit": params.get("limit").and_then(|l| l.parse::<u64>().ok()).unwrap_or(0),
            "offset": params.get("offset").and_then(|o| o.parse::<u64>().ok()).unwrap_or(0),
        }))
    }

    async fn get_vehicle(Path(id): Path<String>) -> Result<Json<Value>, StatusCode> {
        if id == "7" {
            Ok(Json(json!({"id": 7, "placa": "QWE45"})))
        } else if id.starts_with("FAC/") {
            Ok(Json(json!({"id": id, "placa": id})))
        } else {
            Err(StatusCode::NOT_FOUND)
        }
    }

    async fn list_warehouses() -> Json<Value> {
        Json(json!([
            {"id": 1, "nombre": "Bodega Central"},
            {"id": 2, "nombre": "Bodega Norte"}
        ]))
    }

    async fn serve() -> String {
        let app = Router::new()
            .route("/api/vehiculos", get(list_vehicles))
            .route("/api/vehiculos/{id}", get(get_vehicle))
            .route("/api/bodegas", get(list_warehouses));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/api")
    }

    fn client(base: &str, session: Arc<SessionState>) -> ApiClient {
        ApiClient::new(ApiConfig::new(base.parse().unwrap()), session).unwrap()
    }

    #[tokio::test]
    async fn search_sends_bearer_and_paging() {
        let base = serve().await;
        let session = Arc::new(SessionState::in_memory());
        session
            .establish("h.p.s", &UserProfile::new(UserId(1), "Admin"))
            .unwrap();

        let page = client(&base, session)
            .vehicles()
            .search(&SearchQuery::new("abc", 20).at_offset(20))
            .await
            .unwrap();

        assert_eq!(page.data[0].plate, "abc-1");
        assert_eq!(page.data[0].owner.as_deref(), Some("Bearer h.p.s"));
        assert_eq!(page.offset, 20);
        assert_eq!(page.limit, 20);
        assert_eq!(page.total, 40);
    }

    #[tokio::test]
    async fn anonymous_requests_have_no_authorization() {
        let base = serve().await;
        let page = client(&base, Arc::new(SessionState::in_memory()))
            .vehicles()
            .search(&SearchQuery::new("", 10))
            .await
            .unwrap();

        assert_eq!(page.data[0].owner.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn flat_lists_become_complete_pages() {
        let base = serve().await;
        let page = client(&base, Arc::new(SessionState::in_memory()))
            .warehouses()
            .search(&SearchQuery::new("", 10))
            .await
            .unwrap();

        assert_eq!(page.data.len(), 2);
        assert!(!page.has_more());
    }

    #[tokio::test]
    async fn point_lookup_and_not_found() {
        let base = serve().await;
        let vehicles = client(&base, Arc::new(SessionState::in_memory())).vehicles();

        let found = vehicles.fetch(&EntityId::from(7_i64)).await.unwrap();
        assert_eq!(found.plate, "QWE45");

        let err = vehicles.fetch(&EntityId::from(8_i64)).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn text_ids_stay_one_path_segment() {
        let base = serve().await;
        let api = client(&base, Arc::new(SessionState::in_memory()));
        let id = EntityId::try_from("FAC/2024?x#1").unwrap();

        assert_eq!(
            api.item_endpoint("vehiculos", &id).unwrap().path(),
            "/api/vehiculos/FAC%2F2024%3Fx%231"
        );
        let found = api.vehicles().fetch(&id).await.unwrap();
        assert_eq!(found.plate, "FAC/2024?x#1");
    }
}
