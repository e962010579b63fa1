//! Shared test fixtures: an in-memory `Brokerage` with canned
//! responses and call recording.

use std::collections::HashMap;
use std::sync::Mutex;
use tradedesk_broker::types::{
    Account, Order, OrderRequest, OrderStatusFilter, OrderType, Position, Quote,
};
use tradedesk_broker::{BrokerError, BrokerResult, Brokerage};

pub(crate) struct MockBrokerage {
    pub account: Option<Account>,
    pub positions: Vec<Position>,
    pub orders: Vec<Order>,
    pub quotes: HashMap<String, Quote>,
    /// When set, every call fails with this venue message.
    pub fail_with: Option<String>,
    pub submitted: Mutex<Vec<OrderRequest>>,
    pub order_filters: Mutex<Vec<Option<OrderStatusFilter>>>,
    pub cancelled: Mutex<Vec<String>>,
    pub closed_positions: Mutex<Vec<String>>,
    pub close_all_calls: Mutex<Vec<bool>>,
}

impl MockBrokerage {
    pub fn new() -> Self {
        Self {
            account: None,
            positions: Vec::new(),
            orders: Vec::new(),
            quotes: HashMap::new(),
            fail_with: None,
            submitted: Mutex::new(Vec::new()),
            order_filters: Mutex::new(Vec::new()),
            cancelled: Mutex::new(Vec::new()),
            closed_positions: Mutex::new(Vec::new()),
            close_all_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        let mut mock = Self::new();
        mock.fail_with = Some(message.to_string());
        mock
    }

    fn check_failure(&self) -> BrokerResult<()> {
        match &self.fail_with {
            Some(message) => Err(venue_error(message)),
            None => Ok(()),
        }
    }
}

fn venue_error(message: &str) -> BrokerError {
    BrokerError::Api {
        status: 422,
        message: message.to_string(),
    }
}

#[async_trait::async_trait]
impl Brokerage for MockBrokerage {
    async fn get_account(&self) -> BrokerResult<Account> {
        self.check_failure()?;
        Ok(self.account.clone().expect("account fixture not set"))
    }

    async fn list_positions(&self) -> BrokerResult<Vec<Position>> {
        self.check_failure()?;
        Ok(self.positions.clone())
    }

    async fn list_orders(&self, status: Option<OrderStatusFilter>) -> BrokerResult<Vec<Order>> {
        self.check_failure()?;
        self.order_filters.lock().unwrap().push(status);
        Ok(self.orders.clone())
    }

    async fn submit_order(&self, order: &OrderRequest) -> BrokerResult<Order> {
        self.check_failure()?;
        self.submitted.lock().unwrap().push(order.clone());
        Ok(Order {
            id: "904837e3-3b76-47ec-b432-046db621571b".to_string(),
            symbol: order.symbol.clone(),
            qty: order.qty.to_string(),
            filled_qty: None,
            side: order.side.as_str().to_string(),
            order_type: match order.order_type {
                OrderType::Market => "market",
                OrderType::Limit => "limit",
            }
            .to_string(),
            time_in_force: "day".to_string(),
            limit_price: order.limit_price.map(|p| p.to_string()),
            stop_price: None,
            status: "accepted".to_string(),
            created_at: "2024-03-04T09:30:00Z".to_string(),
            updated_at: "2024-03-04T09:30:00Z".to_string(),
            filled_at: None,
            expired_at: None,
            canceled_at: None,
            failed_at: None,
            filled_avg_price: None,
        })
    }

    async fn cancel_order(&self, order_id: &str) -> BrokerResult<()> {
        self.check_failure()?;
        self.cancelled.lock().unwrap().push(order_id.to_string());
        Ok(())
    }

    async fn latest_quotes(&self, _symbols: &[&str]) -> BrokerResult<HashMap<String, Quote>> {
        self.check_failure()?;
        Ok(self.quotes.clone())
    }

    async fn close_position(&self, symbol: &str) -> BrokerResult<Order> {
        self.check_failure()?;
        self.closed_positions.lock().unwrap().push(symbol.to_string());
        Ok(sample_order())
    }

    async fn close_all_positions(&self, cancel_orders: bool) -> BrokerResult<()> {
        self.check_failure()?;
        self.close_all_calls.lock().unwrap().push(cancel_orders);
        Ok(())
    }
}

pub(crate) fn sample_account() -> Account {
    Account {
        account_number: "PA3ABC123".to_string(),
        status: "ACTIVE".to_string(),
        currency: "USD".to_string(),
        buying_power: "200000.50".to_string(),
        cash: "100000.25".to_string(),
        portfolio_value: "105000".to_string(),
        equity: "105000".to_string(),
        last_equity: "104500".to_string(),
        long_market_value: "5000".to_string(),
        short_market_value: "0".to_string(),
        pattern_day_trader: false,
        trading_blocked: false,
        transfers_blocked: false,
        account_blocked: false,
        trade_suspended_by_user: false,
        daytrade_count: 0,
        daytrading_buying_power: None,
    }
}

pub(crate) fn sample_position() -> Position {
    Position {
        symbol: "AAPL".to_string(),
        qty: "10".to_string(),
        avg_entry_price: "150.00".to_string(),
        market_value: "1725.00".to_string(),
        cost_basis: "1500.00".to_string(),
        unrealized_pl: Some("225.00".to_string()),
        unrealized_plpc: Some("0.15".to_string()),
        current_price: Some("172.50".to_string()),
        lastday_price: Some("170.10".to_string()),
        change_today: Some("0.0141".to_string()),
        side: "long".to_string(),
    }
}

pub(crate) fn sample_order() -> Order {
    Order {
        id: "61e69015-8549-4bfd-b9c3-01e75843f47d".to_string(),
        symbol: "AAPL".to_string(),
        qty: "10".to_string(),
        filled_qty: Some("10".to_string()),
        side: "buy".to_string(),
        order_type: "limit".to_string(),
        time_in_force: "day".to_string(),
        limit_price: Some("150.00".to_string()),
        stop_price: None,
        status: "filled".to_string(),
        created_at: "2024-03-04T09:30:00Z".to_string(),
        updated_at: "2024-03-04T09:30:05Z".to_string(),
        filled_at: Some("2024-03-04T09:30:05Z".to_string()),
        expired_at: None,
        canceled_at: None,
        failed_at: None,
        filled_avg_price: Some("149.98".to_string()),
    }
}

pub(crate) fn sample_quote() -> Quote {
    Quote {
        ask_price: 415.2,
        ask_size: 2,
        bid_price: 415.1,
        bid_size: 4,
        timestamp: "2024-03-04T15:59:59.527Z".to_string(),
    }
}
