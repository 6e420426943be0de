use std::time::Duration;

use anyhow::Context;
use orders_types::domain::order::{NewOrder, Order, OrderStatus};
use orders_types::domain::payment::{PaymentIntentHandle, PaymentIntentRequest};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{RequestBuilder, Url};
use serde::{Deserialize, Serialize};

pub const ADMIN_KEY_HEADER: &str = "x-api-key";

#[derive(Clone)]
pub struct OrdersClientBuilder {
    base: Url,
    headers: HeaderMap,
    timeout: Option<Duration>,
    admin_key: Option<String>,
    client: Option<reqwest::Client>,
}

/// Typed client for the public and `/manage` routes.
#[derive(Clone)]
pub struct OrdersClient {
    base: Url,
    admin_key: Option<String>,
    client: reqwest::Client,
}

impl OrdersClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        Self::builder(base_url)?.build()
    }

    pub fn builder(base_url: &str) -> anyhow::Result<OrdersClientBuilder> {
        let base = Url::parse(base_url).context("invalid base url")?;
        Ok(OrdersClientBuilder {
            base,
            headers: HeaderMap::new(),
            timeout: None,
            admin_key: None,
            client: None,
        })
    }

    fn url(&self, path: &str) -> anyhow::Result<Url> {
        self.base.join(path).context("failed to join url")
    }

    fn admin(&self, req: RequestBuilder) -> anyhow::Result<RequestBuilder> {
        let key = self
            .admin_key
            .as_deref()
            .context("admin key not configured on this client")?;
        Ok(req.header(ADMIN_KEY_HEADER, key))
    }

    pub async fn create_order(&self, order: &NewOrder) -> anyhow::Result<Order> {
        let res = self
            .client
            .post(self.url("orders")?)
            .json(order)
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json().await?)
    }

    pub async fn get_order(&self, id: &str) -> anyhow::Result<Order> {
        let res = self
            .client
            .get(self.url(&format!("orders/{id}"))?)
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json().await?)
    }

    pub async fn create_payment_intent(
        &self,
        req: &PaymentIntentRequest,
    ) -> anyhow::Result<PaymentIntentHandle> {
        let res = self
            .client
            .post(self.url("payments/create-payment-intent")?)
            .json(req)
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json().await?)
    }

    pub async fn list_orders(&self) -> anyhow::Result<Vec<Order>> {
        let req = self.admin(self.client.get(self.url("manage/orders")?))?;
        let res = req.send().await?.error_for_status()?;
        Ok(res.json().await?)
    }

    pub async fn manage_order(&self, id: &str) -> anyhow::Result<Order> {
        let req = self.admin(self.client.get(self.url(&format!("manage/orders/{id}"))?))?;
        let res = req.send().await?.error_for_status()?;
        Ok(res.json().await?)
    }

    pub async fn update_order_status(
        &self,
        id: &str,
        order_status: OrderStatus,
    ) -> anyhow::Result<Order> {
        let req = self.admin(
            self.client
                .patch(self.url(&format!("manage/orders/{id}/status"))?)
                .json(&UpdateStatusRequest { order_status }),
        )?;
        let res = req.send().await?.error_for_status()?;
        Ok(res.json().await?)
    }
}

impl OrdersClientBuilder {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_admin_key(mut self, key: impl Into<String>) -> Self {
        self.admin_key = Some(key.into());
        self
    }

    pub fn with_header(
        mut self,
        key: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> anyhow::Result<Self> {
        let header_name =
            HeaderName::from_bytes(key.as_ref().as_bytes()).context("invalid header name")?;
        let header_value = HeaderValue::from_str(value.as_ref()).context("invalid header value")?;
        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    pub fn with_reqwest_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> anyhow::Result<OrdersClient> {
        if let Some(client) = self.client {
            return Ok(OrdersClient {
                base: self.base,
                admin_key: self.admin_key,
                client,
            });
        }

        let mut builder = reqwest::Client::builder();
        if !self.headers.is_empty() {
            builder = builder.default_headers(self.headers);
        }
        if let Some(t) = self.timeout {
            builder = builder.timeout(t);
        }
        let client = builder.build()?;
        Ok(OrdersClient {
            base: self.base,
            admin_key: self.admin_key,
            client,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct UpdateStatusRequest {
    order_status: OrderStatus,
}
