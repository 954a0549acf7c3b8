//! # RestStore
//!
//! [`OrderStore`] over HTTP against `orderdesk-api`.
//!
//! The bearer token from `login` is kept inside the store and attached to
//! every later request; `logout` drops it after the server has revoked it.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;
use url::Url;

use orderdesk_core::{
    Client, ClientInput, LoginRequest, LoginResponse, NewInvoice, NewPayment, Product,
    ProductInput, Settings, Transaction, TransactionDetail, TransactionFilter, Vendor,
    VendorInput,
};

use crate::error::{ClientError, ClientResult, ErrorBody};
use crate::store::OrderStore;

const MAX_RAW_ERROR_CHARS: usize = 200;

#[derive(Debug)]
pub struct RestStore {
    base_url: Url,
    http: reqwest::Client,
    token: RwLock<Option<String>>,
}

impl RestStore {
    /// `base_url` is the server root, e.g. `http://127.0.0.1:8080/`.
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(RestStore {
            base_url,
            http: reqwest::Client::new(),
            token: RwLock::new(None),
        })
    }

    /// Reuses a token obtained elsewhere.
    pub async fn set_token(&self, token: impl Into<String>) {
        *self.token.write().await = Some(token.into());
    }

    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    /// Downloads the PDF of an invoice or receipt.
    pub async fn transaction_pdf(&self, id: &str) -> ClientResult<Vec<u8>> {
        let res = self
            .request(Method::GET, &format!("api/transactions/{id}/pdf"))
            .await?
            .send()
            .await?;
        let res = check(res).await?;
        Ok(res.bytes().await?.to_vec())
    }

    fn endpoint(&self, path: &str) -> ClientResult<Url> {
        Ok(self.base_url.join(path)?)
    }

    async fn request(&self, method: Method, path: &str) -> ClientResult<RequestBuilder> {
        self.request_url(method, self.endpoint(path)?).await
    }

    async fn request_url(&self, method: Method, url: Url) -> ClientResult<RequestBuilder> {
        debug!(%method, %url, "API request");
        let builder = self.http.request(method, url);
        Ok(match self.token.read().await.as_deref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let res = self.request(Method::GET, path).await?.send().await?;
        parse(res).await
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let res = self.request(method, path).await?.json(body).send().await?;
        parse(res).await
    }

    async fn delete(&self, path: &str) -> ClientResult<()> {
        let res = self.request(Method::DELETE, path).await?.send().await?;
        check(res).await?;
        Ok(())
    }

    async fn search<T: DeserializeOwned>(&self, path: &str, query: &str, limit: u32) -> ClientResult<T> {
        let mut url = self.endpoint(path)?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("limit", &limit.to_string());

        let res = self.request_url(Method::GET, url).await?.send().await?;
        parse(res).await
    }
}

/// Turns a non-success response into a classified error.
async fn check(res: Response) -> ClientResult<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    let body = res.text().await.unwrap_or_default();
    let message = error_message(status, &body);

    Err(ClientError::from_status(status.as_u16(), message))
}

/// The `message` of an API error body, else the raw body (proxies answer
/// in plain text), else the status reason.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        return parsed.message;
    }

    let body = body.trim();
    if body.is_empty() {
        status.canonical_reason().unwrap_or("unknown error").to_string()
    } else {
        body.chars().take(MAX_RAW_ERROR_CHARS).collect()
    }
}

async fn parse<T: DeserializeOwned>(res: Response) -> ClientResult<T> {
    let res = check(res).await?;
    res.json::<T>()
        .await
        .map_err(|err| ClientError::Network(format!("unreadable response: {err}")))
}

#[async_trait]
impl OrderStore for RestStore {
    async fn login(&self, request: &LoginRequest) -> ClientResult<LoginResponse> {
        let response: LoginResponse = self
            .send_json(Method::POST, "api/auth/login", request)
            .await?;
        *self.token.write().await = Some(response.token.clone());
        Ok(response)
    }

    async fn logout(&self) -> ClientResult<()> {
        let res = self.request(Method::POST, "api/auth/logout").await?.send().await?;
        // An already-invalid token still counts as logged out.
        if res.status() != StatusCode::UNAUTHORIZED {
            check(res).await?;
        }
        *self.token.write().await = None;
        Ok(())
    }

    async fn list_products(&self, query: &str, limit: u32) -> ClientResult<Vec<Product>> {
        self.search("api/products", query, limit).await
    }

    async fn get_product(&self, id: &str) -> ClientResult<Product> {
        self.get(&format!("api/products/{id}")).await
    }

    async fn create_product(&self, input: &ProductInput) -> ClientResult<Product> {
        self.send_json(Method::POST, "api/products", input).await
    }

    async fn update_product(&self, id: &str, input: &ProductInput) -> ClientResult<Product> {
        self.send_json(Method::PUT, &format!("api/products/{id}"), input)
            .await
    }

    async fn delete_product(&self, id: &str) -> ClientResult<()> {
        self.delete(&format!("api/products/{id}")).await
    }

    async fn list_clients(&self, query: &str, limit: u32) -> ClientResult<Vec<Client>> {
        self.search("api/clients", query, limit).await
    }

    async fn get_client(&self, id: &str) -> ClientResult<Client> {
        self.get(&format!("api/clients/{id}")).await
    }

    async fn create_client(&self, input: &ClientInput) -> ClientResult<Client> {
        self.send_json(Method::POST, "api/clients", input).await
    }

    async fn update_client(&self, id: &str, input: &ClientInput) -> ClientResult<Client> {
        self.send_json(Method::PUT, &format!("api/clients/{id}"), input)
            .await
    }

    async fn delete_client(&self, id: &str) -> ClientResult<()> {
        self.delete(&format!("api/clients/{id}")).await
    }

    async fn list_vendors(&self) -> ClientResult<Vec<Vendor>> {
        self.get("api/vendors").await
    }

    async fn get_vendor(&self, id: &str) -> ClientResult<Vendor> {
        self.get(&format!("api/vendors/{id}")).await
    }

    async fn create_vendor(&self, input: &VendorInput) -> ClientResult<Vendor> {
        self.send_json(Method::POST, "api/vendors", input).await
    }

    async fn update_vendor(&self, id: &str, input: &VendorInput) -> ClientResult<Vendor> {
        self.send_json(Method::PUT, &format!("api/vendors/{id}"), input)
            .await
    }

    async fn delete_vendor(&self, id: &str) -> ClientResult<()> {
        self.delete(&format!("api/vendors/{id}")).await
    }

    async fn get_settings(&self) -> ClientResult<Settings> {
        self.get("api/settings").await
    }

    async fn update_settings(&self, settings: &Settings) -> ClientResult<Settings> {
        self.send_json(Method::PUT, "api/settings", settings).await
    }

    async fn list_transactions(&self, filter: &TransactionFilter) -> ClientResult<Vec<Transaction>> {
        let mut url = self.endpoint("api/transactions")?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(client_id) = &filter.client_id {
                pairs.append_pair("client_id", client_id);
            }
            if let Some(kind) = filter.kind {
                pairs.append_pair("kind", kind.as_str());
            }
            if let Some(status) = filter.status {
                pairs.append_pair("status", status.as_str());
            }
            if let Some(limit) = filter.limit {
                pairs.append_pair("limit", &limit.to_string());
            }
        }

        let res = self.request_url(Method::GET, url).await?.send().await?;
        parse(res).await
    }

    async fn get_transaction(&self, id: &str) -> ClientResult<TransactionDetail> {
        self.get(&format!("api/transactions/{id}")).await
    }

    async fn create_invoice(&self, input: &NewInvoice) -> ClientResult<TransactionDetail> {
        self.send_json(Method::POST, "api/transactions/invoices", input)
            .await
    }

    async fn record_payment(
        &self,
        invoice_id: &str,
        input: &NewPayment,
    ) -> ClientResult<TransactionDetail> {
        self.send_json(
            Method::POST,
            &format!("api/transactions/{invoice_id}/payments"),
            input,
        )
        .await
    }
}
