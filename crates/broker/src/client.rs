//! Brokerage capability trait and the REST implementation.

use crate::config::BrokerConfig;
use crate::error::{BrokerError, BrokerResult};
use crate::types::{Account, LatestQuotes, Order, OrderRequest, OrderStatusFilter, Position, Quote};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;
use url::Url;

const API_KEY_HEADER: &str = "APCA-API-KEY-ID";
const SECRET_KEY_HEADER: &str = "APCA-API-SECRET-KEY";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Operations the tool layer needs from a trading venue.
///
/// Implementations must be safe for concurrent use: every in-flight
/// call builds its own request and reads its own response, so the only
/// sharing is the handle itself.
#[async_trait::async_trait]
pub trait Brokerage: Send + Sync {
    /// Fetch the account snapshot.
    async fn get_account(&self) -> BrokerResult<Account>;

    /// List all open positions.
    async fn list_positions(&self) -> BrokerResult<Vec<Position>>;

    /// List orders, optionally filtered by status. `None` sends no
    /// filter and returns the venue's unfiltered view.
    async fn list_orders(&self, status: Option<OrderStatusFilter>) -> BrokerResult<Vec<Order>>;

    /// Submit a new order.
    async fn submit_order(&self, order: &OrderRequest) -> BrokerResult<Order>;

    /// Cancel an open order by id.
    async fn cancel_order(&self, order_id: &str) -> BrokerResult<()>;

    /// Fetch the latest quote for each requested symbol. Symbols the
    /// venue has no quote for are simply absent from the map.
    async fn latest_quotes(&self, symbols: &[&str]) -> BrokerResult<HashMap<String, Quote>>;

    /// Liquidate the position in one symbol. Returns the closing order.
    async fn close_position(&self, symbol: &str) -> BrokerResult<Order>;

    /// Liquidate every open position, optionally cancelling open orders
    /// first.
    async fn close_all_positions(&self, cancel_orders: bool) -> BrokerResult<()>;
}

/// REST client for an Alpaca-compatible venue.
///
/// Holds one `reqwest::Client`, which is internally reference-counted
/// and safe to share across concurrent calls.
pub struct AlpacaClient {
    http: reqwest::Client,
    trading_url: Url,
    data_url: Url,
}

impl AlpacaClient {
    pub fn new(config: &BrokerConfig) -> BrokerResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, header_value(&config.api_key, "API key")?);
        headers.insert(
            SECRET_KEY_HEADER,
            header_value(&config.secret_key, "secret key")?,
        );

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            trading_url: Url::parse(config.trading_url())?,
            data_url: Url::parse(config.data_url())?,
        })
    }

    fn trading_endpoint(&self, path: &str) -> BrokerResult<Url> {
        Ok(self.trading_url.join(path)?)
    }

    fn data_endpoint(&self, path: &str) -> BrokerResult<Url> {
        Ok(self.data_url.join(path)?)
    }
}

fn header_value(raw: &str, what: &str) -> BrokerResult<HeaderValue> {
    HeaderValue::from_str(raw)
        .map_err(|_| BrokerError::Config(format!("{what} contains invalid header characters")))
}

/// Read a JSON body, turning non-success statuses into `Api` errors.
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> BrokerResult<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(BrokerError::from_response(status.as_u16(), &body));
    }
    Ok(response.json().await?)
}

/// Status check for endpoints whose body we discard.
async fn read_empty(response: reqwest::Response) -> BrokerResult<()> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(BrokerError::from_response(status.as_u16(), &body));
    }
    Ok(())
}

#[async_trait::async_trait]
impl Brokerage for AlpacaClient {
    async fn get_account(&self) -> BrokerResult<Account> {
        let url = self.trading_endpoint("/v2/account")?;
        debug!(url = %url, "GET account");
        read_json(self.http.get(url).send().await?).await
    }

    async fn list_positions(&self) -> BrokerResult<Vec<Position>> {
        let url = self.trading_endpoint("/v2/positions")?;
        debug!(url = %url, "GET positions");
        read_json(self.http.get(url).send().await?).await
    }

    async fn list_orders(&self, status: Option<OrderStatusFilter>) -> BrokerResult<Vec<Order>> {
        let url = self.trading_endpoint("/v2/orders")?;
        debug!(url = %url, status = ?status, "GET orders");
        let mut request = self.http.get(url);
        if let Some(filter) = status {
            request = request.query(&[("status", filter.as_str())]);
        }
        read_json(request.send().await?).await
    }

    async fn submit_order(&self, order: &OrderRequest) -> BrokerResult<Order> {
        let url = self.trading_endpoint("/v2/orders")?;
        debug!(url = %url, symbol = %order.symbol, side = %order.side, "POST order");
        read_json(self.http.post(url).json(order).send().await?).await
    }

    async fn cancel_order(&self, order_id: &str) -> BrokerResult<()> {
        let url = self.trading_endpoint(&format!("/v2/orders/{order_id}"))?;
        debug!(url = %url, "DELETE order");
        read_empty(self.http.delete(url).send().await?).await
    }

    async fn latest_quotes(&self, symbols: &[&str]) -> BrokerResult<HashMap<String, Quote>> {
        let url = self.data_endpoint("/v2/stocks/quotes/latest")?;
        debug!(url = %url, symbols = ?symbols, "GET latest quotes");
        let response = self
            .http
            .get(url)
            .query(&[("symbols", symbols.join(","))])
            .send()
            .await?;
        let latest: LatestQuotes = read_json(response).await?;
        Ok(latest.quotes)
    }

    async fn close_position(&self, symbol: &str) -> BrokerResult<Order> {
        let url = self.trading_endpoint(&format!("/v2/positions/{symbol}"))?;
        debug!(url = %url, "DELETE position");
        read_json(self.http.delete(url).send().await?).await
    }

    async fn close_all_positions(&self, cancel_orders: bool) -> BrokerResult<()> {
        let url = self.trading_endpoint("/v2/positions")?;
        debug!(url = %url, cancel_orders, "DELETE all positions");
        let request = self
            .http
            .delete(url)
            .query(&[("cancel_orders", if cancel_orders { "true" } else { "false" })]);
        read_empty(request.send().await?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OrderSide;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> AlpacaClient {
        let config = BrokerConfig::new("test-key", "test-secret", true)
            .with_trading_url(server.uri())
            .with_data_url(server.uri());
        AlpacaClient::new(&config).unwrap()
    }

    fn order_body(status: &str) -> serde_json::Value {
        json!({
            "id": "904837e3-3b76-47ec-b432-046db621571b",
            "symbol": "AAPL",
            "qty": "1",
            "side": "buy",
            "type": "market",
            "time_in_force": "day",
            "status": status,
            "created_at": "2024-03-04T09:30:00Z",
            "updated_at": "2024-03-04T09:30:00Z"
        })
    }

    #[tokio::test]
    async fn test_get_account_sends_auth_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/account"))
            .and(header(API_KEY_HEADER, "test-key"))
            .and(header(SECRET_KEY_HEADER, "test-secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "account_number": "PA3ABC123",
                "status": "ACTIVE",
                "currency": "USD",
                "buying_power": "200000.50",
                "cash": "100000.25",
                "portfolio_value": "105000",
                "equity": "105000",
                "last_equity": "104500",
                "long_market_value": "5000",
                "short_market_value": "0",
                "pattern_day_trader": false,
                "trading_blocked": false,
                "transfers_blocked": false,
                "account_blocked": false,
                "trade_suspended_by_user": false,
                "daytrade_count": 0
            })))
            .mount(&server)
            .await;

        let account = client_for(&server).get_account().await.unwrap();
        assert_eq!(account.account_number, "PA3ABC123");
        assert_eq!(account.buying_power, "200000.50");
        assert!(account.daytrading_buying_power.is_none());
    }

    #[tokio::test]
    async fn test_list_orders_with_filter() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/orders"))
            .and(query_param("status", "closed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([order_body("filled")])))
            .mount(&server)
            .await;

        let orders = client_for(&server)
            .list_orders(Some(OrderStatusFilter::Closed))
            .await
            .unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].status, "filled");
    }

    #[tokio::test]
    async fn test_list_orders_unfiltered_sends_no_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/orders"))
            .and(query_param_is_missing("status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let orders = client_for(&server).list_orders(None).await.unwrap();
        assert!(orders.is_empty());
    }

    #[tokio::test]
    async fn test_submit_market_order_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/orders"))
            .and(body_json(json!({
                "symbol": "AAPL",
                "qty": 1.0,
                "side": "buy",
                "type": "market",
                "time_in_force": "day"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(order_body("accepted")))
            .mount(&server)
            .await;

        let order = client_for(&server)
            .submit_order(&OrderRequest::market("AAPL", 1.0, OrderSide::Buy))
            .await
            .unwrap();
        assert_eq!(order.status, "accepted");
        assert_eq!(order.order_type, "market");
    }

    #[tokio::test]
    async fn test_cancel_order() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v2/orders/904837e3-3b76-47ec-b432-046db621571b"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        client_for(&server)
            .cancel_order("904837e3-3b76-47ec-b432-046db621571b")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_latest_quotes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/stocks/quotes/latest"))
            .and(query_param("symbols", "MSFT"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "quotes": {
                    "MSFT": {
                        "ap": 415.2,
                        "as": 2,
                        "bp": 415.1,
                        "bs": 4,
                        "t": "2024-03-04T15:59:59.527Z"
                    }
                }
            })))
            .mount(&server)
            .await;

        let quotes = client_for(&server).latest_quotes(&["MSFT"]).await.unwrap();
        assert_eq!(quotes["MSFT"].ask_price, 415.2);
        assert_eq!(quotes["MSFT"].bid_size, 4);
    }

    #[tokio::test]
    async fn test_close_all_positions_query() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v2/positions"))
            .and(query_param("cancel_orders", "true"))
            .respond_with(ResponseTemplate::new(207).set_body_json(json!([])))
            .mount(&server)
            .await;

        client_for(&server).close_all_positions(true).await.unwrap();
    }

    #[tokio::test]
    async fn test_api_error_surfaces_venue_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/orders"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "code": 40310000,
                "message": "insufficient buying power"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .submit_order(&OrderRequest::market("AAPL", 1_000_000.0, OrderSide::Buy))
            .await
            .unwrap_err();
        match err {
            BrokerError::Api { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "insufficient buying power");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }
}
