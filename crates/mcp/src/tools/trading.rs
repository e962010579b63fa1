// Trade-side tools: order placement, cancellation, liquidation.
// Every tool here has a real-world effect on the account; none of them
// is idempotent or reversible from this layer.

use crate::error::ToolError;
use crate::normalize::{money, money_opt};
use crate::protocol::ToolSchema;
use crate::tools::registry::{
    json_schema_boolean_with_default, json_schema_enum, json_schema_number, json_schema_object,
    json_schema_string, parse_args, Tool,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tradedesk_broker::types::{OrderRequest, OrderSide};
use tradedesk_broker::Brokerage;

/// Tool to submit a day market order.
pub struct MarketOrderTool {
    broker: Arc<dyn Brokerage>,
}

impl MarketOrderTool {
    pub fn new(broker: Arc<dyn Brokerage>) -> Self {
        Self { broker }
    }
}

#[derive(Debug, Deserialize)]
struct MarketOrderArgs {
    symbol: String,
    quantity: f64,
    side: OrderSide,
}

#[async_trait::async_trait]
impl Tool for MarketOrderTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "place_market_order".to_string(),
            description: "Place a market order to buy or sell a stock".to_string(),
            input_schema: json_schema_object(
                json!({
                    "symbol": json_schema_string("Stock ticker symbol"),
                    "quantity": json_schema_number("Number of shares to trade"),
                    "side": json_schema_enum("Order side (buy or sell)", &["buy", "sell"]),
                }),
                vec!["symbol", "quantity", "side"],
            ),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<Value, ToolError> {
        let args: MarketOrderArgs = parse_args("place_market_order", arguments)?;
        let request = OrderRequest::market(args.symbol, args.quantity, args.side);
        let order = self.broker.submit_order(&request).await?;
        Ok(json!({
            "success": true,
            "order_id": order.id,
            "symbol": order.symbol,
            "quantity": money("qty", &order.qty)?,
            "side": order.side,
            "order_type": order.order_type,
            "time_in_force": order.time_in_force,
            "status": order.status,
            "created_at": order.created_at,
        }))
    }

    fn is_mutating(&self) -> bool {
        true
    }
}

/// Tool to submit a day limit order.
pub struct LimitOrderTool {
    broker: Arc<dyn Brokerage>,
}

impl LimitOrderTool {
    pub fn new(broker: Arc<dyn Brokerage>) -> Self {
        Self { broker }
    }
}

#[derive(Debug, Deserialize)]
struct LimitOrderArgs {
    symbol: String,
    quantity: f64,
    side: OrderSide,
    limit_price: f64,
}

#[async_trait::async_trait]
impl Tool for LimitOrderTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "place_limit_order".to_string(),
            description: "Place a limit order with a specific price".to_string(),
            input_schema: json_schema_object(
                json!({
                    "symbol": json_schema_string("Stock ticker symbol"),
                    "quantity": json_schema_number("Number of shares to trade"),
                    "side": json_schema_enum("Order side (buy or sell)", &["buy", "sell"]),
                    "limit_price": json_schema_number("Limit price for the order"),
                }),
                vec!["symbol", "quantity", "side", "limit_price"],
            ),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<Value, ToolError> {
        let args: LimitOrderArgs = parse_args("place_limit_order", arguments)?;
        let request = OrderRequest::limit(args.symbol, args.quantity, args.side, args.limit_price);
        let order = self.broker.submit_order(&request).await?;
        Ok(json!({
            "success": true,
            "order_id": order.id,
            "symbol": order.symbol,
            "quantity": money("qty", &order.qty)?,
            "side": order.side,
            "order_type": order.order_type,
            "time_in_force": order.time_in_force,
            "limit_price": money_opt("limit_price", order.limit_price.as_ref())?,
            "status": order.status,
            "created_at": order.created_at,
        }))
    }

    fn is_mutating(&self) -> bool {
        true
    }
}

/// Tool to cancel an open order by id.
pub struct CancelOrderTool {
    broker: Arc<dyn Brokerage>,
}

impl CancelOrderTool {
    pub fn new(broker: Arc<dyn Brokerage>) -> Self {
        Self { broker }
    }
}

#[derive(Debug, Deserialize)]
struct CancelOrderArgs {
    order_id: String,
}

#[async_trait::async_trait]
impl Tool for CancelOrderTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "cancel_order".to_string(),
            description: "Cancel an open order by its ID".to_string(),
            input_schema: json_schema_object(
                json!({
                    "order_id": json_schema_string("The ID of the order to cancel"),
                }),
                vec!["order_id"],
            ),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<Value, ToolError> {
        let args: CancelOrderArgs = parse_args("cancel_order", arguments)?;
        self.broker.cancel_order(&args.order_id).await?;
        Ok(json!({
            "success": true,
            "message": format!("Order {} cancelled successfully", args.order_id),
        }))
    }

    fn is_mutating(&self) -> bool {
        true
    }
}

/// Tool to liquidate the position in one symbol.
pub struct ClosePositionTool {
    broker: Arc<dyn Brokerage>,
}

impl ClosePositionTool {
    pub fn new(broker: Arc<dyn Brokerage>) -> Self {
        Self { broker }
    }
}

#[derive(Debug, Deserialize)]
struct ClosePositionArgs {
    symbol: String,
}

#[async_trait::async_trait]
impl Tool for ClosePositionTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "close_position".to_string(),
            description: "Close a position for a specific symbol".to_string(),
            input_schema: json_schema_object(
                json!({
                    "symbol": json_schema_string("Stock ticker symbol to close position for"),
                }),
                vec!["symbol"],
            ),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<Value, ToolError> {
        let args: ClosePositionArgs = parse_args("close_position", arguments)?;
        self.broker.close_position(&args.symbol).await?;
        Ok(json!({
            "success": true,
            "message": format!("Position for {} closed successfully", args.symbol),
        }))
    }

    fn is_mutating(&self) -> bool {
        true
    }
}

/// Tool to liquidate every open position.
pub struct CloseAllPositionsTool {
    broker: Arc<dyn Brokerage>,
}

impl CloseAllPositionsTool {
    pub fn new(broker: Arc<dyn Brokerage>) -> Self {
        Self { broker }
    }
}

#[derive(Debug, Deserialize)]
struct CloseAllPositionsArgs {
    #[serde(default)]
    cancel_orders: bool,
}

#[async_trait::async_trait]
impl Tool for CloseAllPositionsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "close_all_positions".to_string(),
            description: "Close all open positions in the account".to_string(),
            input_schema: json_schema_object(
                json!({
                    "cancel_orders": json_schema_boolean_with_default(
                        "Also cancel all open orders",
                        false,
                    ),
                }),
                vec![],
            ),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<Value, ToolError> {
        let args: CloseAllPositionsArgs = parse_args("close_all_positions", arguments)?;
        self.broker.close_all_positions(args.cancel_orders).await?;
        Ok(json!({
            "success": true,
            "message": "All positions closed successfully",
            "orders_cancelled": args.cancel_orders,
        }))
    }

    fn is_mutating(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockBrokerage;
    use tradedesk_broker::types::OrderType;

    #[tokio::test]
    async fn test_market_order_success_payload() {
        let mock = Arc::new(MockBrokerage::new());
        let tool = MarketOrderTool::new(mock.clone());

        let payload = tool
            .execute(json!({"symbol": "AAPL", "quantity": 1, "side": "buy"}))
            .await
            .unwrap();
        assert_eq!(payload["success"], json!(true));
        assert_eq!(payload["side"], "buy");
        assert_eq!(payload["quantity"], json!(1.0));
        assert_eq!(payload["order_type"], "market");
        assert_eq!(payload["time_in_force"], "day");

        let submitted = mock.submitted.lock().unwrap();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].side, OrderSide::Buy);
        assert_eq!(submitted[0].order_type, OrderType::Market);
    }

    #[tokio::test]
    async fn test_market_order_rejects_unrecognized_side() {
        // An unrecognized side is an input error; it must never be
        // coerced into a sell the caller did not ask for.
        let mock = Arc::new(MockBrokerage::new());
        let tool = MarketOrderTool::new(mock.clone());

        let err = tool
            .execute(json!({"symbol": "AAPL", "quantity": 1, "side": "BOGUS"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
        assert!(err.to_string().contains("BOGUS"));
        assert!(mock.submitted.lock().unwrap().is_empty(), "nothing reached the venue");
    }

    #[tokio::test]
    async fn test_market_order_side_is_case_insensitive() {
        let mock = Arc::new(MockBrokerage::new());
        let tool = MarketOrderTool::new(mock.clone());

        tool.execute(json!({"symbol": "AAPL", "quantity": 2, "side": "SELL"}))
            .await
            .unwrap();
        assert_eq!(mock.submitted.lock().unwrap()[0].side, OrderSide::Sell);
    }

    #[tokio::test]
    async fn test_market_order_missing_required_argument() {
        let tool = MarketOrderTool::new(Arc::new(MockBrokerage::new()));
        let err = tool
            .execute(json!({"quantity": 1, "side": "buy"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
        assert!(err.to_string().contains("symbol"));
    }

    #[tokio::test]
    async fn test_limit_order_payload_includes_price() {
        let mock = Arc::new(MockBrokerage::new());
        let tool = LimitOrderTool::new(mock.clone());

        let payload = tool
            .execute(json!({
                "symbol": "MSFT",
                "quantity": 2,
                "side": "sell",
                "limit_price": 415.5
            }))
            .await
            .unwrap();
        assert_eq!(payload["success"], json!(true));
        assert_eq!(payload["limit_price"], json!(415.5));
        assert_eq!(payload["order_type"], "limit");

        let submitted = mock.submitted.lock().unwrap();
        assert_eq!(submitted[0].limit_price, Some(415.5));
    }

    #[tokio::test]
    async fn test_cancel_order_message() {
        let mock = Arc::new(MockBrokerage::new());
        let tool = CancelOrderTool::new(mock.clone());

        let payload = tool.execute(json!({"order_id": "abc-123"})).await.unwrap();
        assert_eq!(payload["success"], json!(true));
        assert_eq!(payload["message"], "Order abc-123 cancelled successfully");
        assert_eq!(mock.cancelled.lock().unwrap().as_slice(), &["abc-123"]);
    }

    #[tokio::test]
    async fn test_close_position_message() {
        let mock = Arc::new(MockBrokerage::new());
        let tool = ClosePositionTool::new(mock.clone());

        let payload = tool.execute(json!({"symbol": "AAPL"})).await.unwrap();
        assert_eq!(payload["message"], "Position for AAPL closed successfully");
        assert_eq!(mock.closed_positions.lock().unwrap().as_slice(), &["AAPL"]);
    }

    #[tokio::test]
    async fn test_close_all_positions_defaults_and_flag() {
        let mock = Arc::new(MockBrokerage::new());
        let tool = CloseAllPositionsTool::new(mock.clone());

        let payload = tool.execute(json!({})).await.unwrap();
        assert_eq!(payload["orders_cancelled"], json!(false));

        let payload = tool.execute(json!({"cancel_orders": true})).await.unwrap();
        assert_eq!(payload["orders_cancelled"], json!(true));
        assert_eq!(payload["message"], "All positions closed successfully");

        assert_eq!(mock.close_all_calls.lock().unwrap().as_slice(), &[false, true]);
    }

    #[tokio::test]
    async fn test_rejected_order_surfaces_venue_message() {
        let tool = MarketOrderTool::new(Arc::new(MockBrokerage::failing("market is closed")));
        let err = tool
            .execute(json!({"symbol": "AAPL", "quantity": 1, "side": "buy"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Broker(_)));
        assert!(err.to_string().contains("market is closed"));
    }

    #[test]
    fn test_all_trading_tools_are_mutating() {
        let broker: Arc<dyn Brokerage> = Arc::new(MockBrokerage::new());
        assert!(MarketOrderTool::new(broker.clone()).is_mutating());
        assert!(LimitOrderTool::new(broker.clone()).is_mutating());
        assert!(CancelOrderTool::new(broker.clone()).is_mutating());
        assert!(ClosePositionTool::new(broker.clone()).is_mutating());
        assert!(CloseAllPositionsTool::new(broker).is_mutating());
    }
}
