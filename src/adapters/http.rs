//! reqwest-backed clients for the cart and order endpoints

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::adapters::dto::{RawCart, RawCartLine, RawCreatedOrder, RawOrderList, WireCreateOrder, WireNewCartLine, WirePayment, WireQuantity, WireStatus};
use crate::config::ClientConfig;
use crate::domain::aggregates::{Cart, CartLine, NewCartLine, Order, OrderStatus};
use crate::domain::value_objects::{CartItemId, OrderId, Quantity, UserId};
use crate::ports::{CartApi, CreateOrderRequest, CreatedOrder, OrderService, RecordPaymentRequest};
use crate::session::Session;
use crate::ServiceError;

/// Shared transport: base URL, bearer token and status-code mapping.
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpClient {
    pub fn new(config: &ClientConfig) -> Self {
        Self { client: Client::new(), base_url: config.api_url.trim_end_matches('/').to_string(), token: None }
    }

    pub fn with_session(mut self, session: &Session) -> Self {
        self.token = session.auth_token().map(str::to_string);
        self
    }

    fn url(&self, path: &str) -> String { format!("{}/{}", self.base_url, path.trim_start_matches('/')) }

    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ServiceError> {
        let response = builder.send().await.map_err(|e| ServiceError::Network(e.to_string()))?;
        let status = response.status();
        debug!(%status, url = %response.url(), "Response received");
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(map_status(status, body))
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ServiceError> {
        let response = self.send(builder).await?;
        let bytes = response.bytes().await.map_err(|e| ServiceError::Network(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| ServiceError::Decode(e.to_string()))
    }
}

fn map_status(status: StatusCode, body: String) -> ServiceError {
    let detail = if body.trim().is_empty() { status.to_string() } else { body };
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ServiceError::Validation(detail),
        StatusCode::NOT_FOUND => ServiceError::NotFound(detail),
        StatusCode::CONFLICT | StatusCode::FORBIDDEN => ServiceError::Rejected(detail),
        _ => ServiceError::Network(format!("{}: {}", status, detail)),
    }
}

pub struct HttpCartApi {
    http: HttpClient,
}

impl HttpCartApi {
    pub fn new(http: HttpClient) -> Self { Self { http } }
}

#[async_trait]
impl CartApi for HttpCartApi {
    #[instrument(skip(self))]
    async fn fetch_cart(&self, user_id: &UserId) -> Result<Cart, ServiceError> {
        let raw: RawCart = self.http.send_json(self.http.request(reqwest::Method::GET, &format!("cart/{}", user_id))).await?;
        raw.into_cart(user_id)
    }

    #[instrument(skip(self, line))]
    async fn add_line(&self, user_id: &UserId, line: &NewCartLine) -> Result<CartLine, ServiceError> {
        let builder = self.http.request(reqwest::Method::POST, &format!("cart/{}/items", user_id)).json(&WireNewCartLine::from(line));
        let raw: RawCartLine = self.http.send_json(builder).await?;
        raw.into_line()
    }

    #[instrument(skip(self))]
    async fn update_quantity(&self, cart_item_id: &CartItemId, quantity: Quantity) -> Result<(), ServiceError> {
        let builder = self.http.request(reqwest::Method::PUT, &format!("cart/items/{}", cart_item_id)).json(&WireQuantity { quantity: quantity.value() });
        self.http.send(builder).await.map(|_| ())
    }

    #[instrument(skip(self))]
    async fn remove_line(&self, cart_item_id: &CartItemId) -> Result<(), ServiceError> {
        self.http.send(self.http.request(reqwest::Method::DELETE, &format!("cart/items/{}", cart_item_id))).await.map(|_| ())
    }

    #[instrument(skip(self))]
    async fn clear_cart(&self, user_id: &UserId) -> Result<(), ServiceError> {
        match self.http.send(self.http.request(reqwest::Method::DELETE, &format!("cart/{}", user_id))).await {
            Ok(_) | Err(ServiceError::NotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

pub struct HttpOrderService {
    http: HttpClient,
}

impl HttpOrderService {
    pub fn new(http: HttpClient) -> Self { Self { http } }
}

#[async_trait]
impl OrderService for HttpOrderService {
    #[instrument(skip(self, request), fields(user_id = %request.user_id))]
    async fn create_order(&self, request: CreateOrderRequest) -> Result<CreatedOrder, ServiceError> {
        let builder = self.http.request(reqwest::Method::POST, "orders").json(&WireCreateOrder::from(&request));
        let raw: RawCreatedOrder = self.http.send_json(builder).await?;
        Ok(raw.into())
    }

    #[instrument(skip(self, request), fields(order_id = %request.order_id))]
    async fn record_payment(&self, request: RecordPaymentRequest) -> Result<(), ServiceError> {
        let builder = self.http.request(reqwest::Method::POST, "payments").json(&WirePayment::from(&request));
        self.http.send(builder).await.map(|_| ())
    }

    #[instrument(skip(self))]
    async fn orders_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, ServiceError> {
        let raw: RawOrderList = self.http.send_json(self.http.request(reqwest::Method::GET, &format!("orders/user/{}", user_id))).await?;
        raw.into_orders(user_id)
    }

    #[instrument(skip(self))]
    async fn cancel_order(&self, order_id: &OrderId) -> Result<(), ServiceError> {
        self.http.send(self.http.request(reqwest::Method::PUT, &format!("orders/{}/cancel", order_id))).await.map(|_| ())
    }

    #[instrument(skip(self))]
    async fn update_status(&self, order_id: &OrderId, status: OrderStatus) -> Result<(), ServiceError> {
        let builder = self.http.request(reqwest::Method::PUT, &format!("orders/{}/status", order_id)).json(&WireStatus::from(status));
        self.http.send(builder).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(map_status(StatusCode::CONFLICT, "already shipped".into()), ServiceError::Rejected("already shipped".into()));
        assert_eq!(map_status(StatusCode::UNPROCESSABLE_ENTITY, "".into()), ServiceError::Validation("422 Unprocessable Entity".into()));
        assert!(matches!(map_status(StatusCode::BAD_GATEWAY, "".into()), ServiceError::Network(_)));
    }

    #[test]
    fn test_url_joining() {
        let config = ClientConfig { api_url: "http://shop.test/api/".into(), ..ClientConfig::default() };
        assert_eq!(HttpClient::new(&config).url("/orders"), "http://shop.test/api/orders");
    }
}
