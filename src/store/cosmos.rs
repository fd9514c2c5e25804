//! Cosmos REST Client
//!
//! [`DocumentStore`] implementation over the SQL-over-REST surface of a
//! Cosmos-style document store. Requests are signed with the account
//! master key (HMAC-SHA256 over the canonical resource string); the key is
//! held in a `SecretString` and never logged.
//!
//! Sampling uses `SELECT TOP n`, distinct values use
//! `SELECT DISTINCT VALUE`, and existence checks use an `ARRAY_CONTAINS`
//! query over `c.id`. Cross-partition queries are always enabled.

use std::time::Duration;

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use hmac::{Hmac, Mac};
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Value, json};
use sha2::Sha256;
use tracing::{debug, warn};
use url::Url;

use crate::types::{MapError, Result, StoreError, StoreErrorCategory};

use super::DocumentStore;

const API_VERSION: &str = "2018-12-31";
const MAX_RETRIES: usize = 2;

// =============================================================================
// Configuration
// =============================================================================

#[derive(Clone)]
pub struct CosmosClientConfig {
    /// Account endpoint, e.g. `https://myaccount.documents.azure.com`
    pub endpoint: String,
    /// Account master key (base64)
    pub key: SecretString,
    /// Per-call timeout
    pub timeout: Duration,
    /// Skip TLS verification (local emulators only)
    pub accept_invalid_certs: bool,
}

impl std::fmt::Debug for CosmosClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CosmosClientConfig")
            .field("endpoint", &self.endpoint)
            .field("key", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .finish()
    }
}

// =============================================================================
// Client
// =============================================================================

pub struct CosmosClient {
    base_url: Url,
    key_bytes: Vec<u8>,
    client: reqwest::Client,
}

impl std::fmt::Debug for CosmosClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CosmosClient")
            .field("base_url", &self.base_url.as_str())
            .field("key_bytes", &"[REDACTED]")
            .finish()
    }
}

impl CosmosClient {
    pub fn new(config: CosmosClientConfig) -> Result<Self> {
        let base_url = Url::parse(&config.endpoint)
            .map_err(|e| MapError::Config(format!("Invalid endpoint URL: {}", e)))?;

        let key_bytes = BASE64
            .decode(config.key.expose_secret())
            .map_err(|e| MapError::Config(format!("Account key is not valid base64: {}", e)))?;

        if config.accept_invalid_certs {
            warn!("TLS certificate verification is disabled");
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| MapError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            key_bytes,
            client,
        })
    }

    /// Canonical master-key signature:
    /// HMAC-SHA256 over `verb\ntype\nlink\ndate\n\n`, all lower-case.
    fn auth_token(&self, verb: &str, resource_type: &str, resource_link: &str, date: &str) -> String {
        let payload = format!(
            "{}\n{}\n{}\n{}\n\n",
            verb.to_lowercase(),
            resource_type.to_lowercase(),
            resource_link,
            date.to_lowercase()
        );

        let mut mac = Hmac::<Sha256>::new_from_slice(&self.key_bytes)
            .expect("HMAC accepts keys of any length");
        mac.update(payload.as_bytes());
        let signature = BASE64.encode(mac.finalize().into_bytes());

        let token = format!("type=master&ver=1.0&sig={}", signature);
        url::form_urlencoded::byte_serialize(token.as_bytes()).collect()
    }

    fn headers(
        &self,
        verb: &str,
        resource_type: &str,
        resource_link: &str,
        query: bool,
    ) -> Result<HeaderMap> {
        let date = chrono::Utc::now()
            .format("%a, %d %b %Y %H:%M:%S GMT")
            .to_string()
            .to_lowercase();

        let mut headers = HeaderMap::new();
        let mut set = |name: &'static str, value: String| -> Result<()> {
            headers.insert(
                name,
                HeaderValue::from_str(&value)
                    .map_err(|e| MapError::Config(format!("Invalid header value: {}", e)))?,
            );
            Ok(())
        };

        set(
            "authorization",
            self.auth_token(verb, resource_type, resource_link, &date),
        )?;
        set("x-ms-date", date)?;
        set("x-ms-version", API_VERSION.to_string())?;
        if query {
            set("content-type", "application/query+json".to_string())?;
            set("x-ms-documentdb-isquery", "True".to_string())?;
            set(
                "x-ms-documentdb-query-enablecrosspartition",
                "True".to_string(),
            )?;
        }
        Ok(headers)
    }

    async fn get(&self, path: &str, resource_type: &str, resource_link: &str) -> Result<Value> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| MapError::Config(format!("Invalid resource path: {}", e)))?;
        let headers = self.headers("GET", resource_type, resource_link, false)?;

        let operation = format!("GET {}", path);
        let send = || async {
            let response = self
                .client
                .get(url.clone())
                .headers(headers.clone())
                .send()
                .await
                .map_err(|e| MapError::Store(StoreError::network(operation.clone(), e.to_string())))?;
            Self::read_json(response, &operation).await
        };
        send.retry(Self::backoff())
            .when(MapError::is_retryable)
            .await
    }

    /// POST a SQL query against a container's document feed, following
    /// continuation tokens until `limit` rows are collected.
    async fn query_documents(
        &self,
        database: &str,
        container: &str,
        query: Value,
        limit: usize,
    ) -> Result<Vec<Value>> {
        let resource_link = format!("dbs/{}/colls/{}", database, container);
        let path = format!("{}/docs", resource_link);
        let url = self
            .base_url
            .join(&path)
            .map_err(|e| MapError::Config(format!("Invalid resource path: {}", e)))?;

        let operation = format!("query {}/{}", database, container);
        let mut documents = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let mut headers = self.headers("POST", "docs", &resource_link, true)?;
            if let Some(token) = &continuation {
                headers.insert(
                    "x-ms-continuation",
                    HeaderValue::from_str(token).map_err(|e| {
                        MapError::Store(StoreError::new(
                            StoreErrorCategory::BadRequest,
                            operation.clone(),
                            format!("invalid continuation token: {}", e),
                        ))
                    })?,
                );
            }

            let send = || async {
                let response = self
                    .client
                    .post(url.clone())
                    .headers(headers.clone())
                    .json(&query)
                    .send()
                    .await
                    .map_err(|e| {
                        MapError::Store(StoreError::network(operation.clone(), e.to_string()))
                    })?;
                let next = response
                    .headers()
                    .get("x-ms-continuation")
                    .and_then(|v| v.to_str().ok())
                    .map(String::from);
                let body = Self::read_json(response, &operation).await?;
                Ok::<_, MapError>((body, next))
            };
            let (body, next) = send
                .retry(Self::backoff())
                .when(MapError::is_retryable)
                .await?;

            let page: DocumentsPage = serde_json::from_value(body)?;
            documents.extend(page.documents);

            continuation = next;
            if documents.len() >= limit || continuation.is_none() {
                break;
            }
        }

        documents.truncate(limit);
        Ok(documents)
    }

    async fn read_json(response: reqwest::Response, operation: &str) -> Result<Value> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let category = StoreErrorCategory::from_http_status(status.as_u16());
            return Err(StoreError::new(
                category,
                operation,
                format!("HTTP {}: {}", status, truncate_body(&body)),
            )
            .into());
        }
        Ok(response.json().await?)
    }

    fn backoff() -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(250))
            .with_max_times(MAX_RETRIES)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        format!("{}...", &body[..MAX])
    } else {
        body.to_string()
    }
}

// =============================================================================
// Response Shapes
// =============================================================================

#[derive(Debug, Deserialize)]
struct NamedResource {
    id: String,
}

#[derive(Debug, Deserialize)]
struct DatabasesPage {
    #[serde(rename = "Databases", default)]
    databases: Vec<NamedResource>,
}

#[derive(Debug, Deserialize)]
struct CollectionsPage {
    #[serde(rename = "DocumentCollections", default)]
    collections: Vec<NamedResource>,
}

#[derive(Debug, Deserialize)]
struct DocumentsPage {
    #[serde(rename = "Documents", default)]
    documents: Vec<Value>,
}

// =============================================================================
// Query Construction
// =============================================================================

/// Cosmos SQL projection for a dotted path. One array marker is supported
/// through a JOIN alias; deeper array nesting is not queryable this way.
fn path_projection(path: &str) -> Option<(String, String)> {
    match path.split_once("[]") {
        None => Some((format!("c.{}", path), "FROM c".to_string())),
        Some((head, tail)) => {
            let tail = tail.strip_prefix('.').unwrap_or(tail);
            if tail.contains("[]") {
                return None;
            }
            let projection = if tail.is_empty() {
                "i".to_string()
            } else {
                format!("i.{}", tail)
            };
            Some((projection, format!("FROM c JOIN i IN c.{}", head)))
        }
    }
}

// =============================================================================
// DocumentStore Implementation
// =============================================================================

#[async_trait]
impl DocumentStore for CosmosClient {
    async fn list_databases(&self) -> Result<Vec<String>> {
        let body = self.get("dbs", "dbs", "").await?;
        let page: DatabasesPage = serde_json::from_value(body)?;
        debug!("Listed {} databases", page.databases.len());
        Ok(page.databases.into_iter().map(|d| d.id).collect())
    }

    async fn list_containers(&self, database: &str) -> Result<Vec<String>> {
        let link = format!("dbs/{}", database);
        let body = self.get(&format!("{}/colls", link), "colls", &link).await?;
        let page: CollectionsPage = serde_json::from_value(body)?;
        Ok(page.collections.into_iter().map(|c| c.id).collect())
    }

    async fn sample_documents(
        &self,
        database: &str,
        container: &str,
        n: usize,
    ) -> Result<Vec<Value>> {
        let query = json!({
            "query": format!("SELECT TOP {} * FROM c", n),
            "parameters": []
        });
        self.query_documents(database, container, query, n).await
    }

    async fn get_distinct_values(
        &self,
        database: &str,
        container: &str,
        path: &str,
        max: usize,
    ) -> Result<Vec<Value>> {
        let Some((projection, from_clause)) = path_projection(path) else {
            return Err(StoreError::new(
                StoreErrorCategory::BadRequest,
                "getDistinctValues",
                format!("path {} is too deeply nested to query", path),
            )
            .into());
        };
        let query = json!({
            "query": format!(
                "SELECT DISTINCT TOP {} VALUE {} {} WHERE IS_DEFINED({})",
                max, projection, from_clause, projection
            ),
            "parameters": []
        });
        self.query_documents(database, container, query, max).await
    }

    async fn check_ids_exist(
        &self,
        database: &str,
        container: &str,
        ids: &[Value],
    ) -> Result<Vec<Value>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = json!({
            "query": "SELECT VALUE c.id FROM c WHERE ARRAY_CONTAINS(@ids, c.id)",
            "parameters": [{"name": "@ids", "value": ids}]
        });
        self.query_documents(database, container, query, ids.len())
            .await
    }
}
