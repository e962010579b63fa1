// Read-side tools: account snapshot, positions, orders.

use crate::error::ToolError;
use crate::normalize::{money, money_opt, money_or_zero, timestamp_opt};
use crate::protocol::ToolSchema;
use crate::tools::registry::{
    json_schema_enum_with_default, json_schema_object, parse_args, Tool,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tradedesk_broker::types::{Order, OrderStatusFilter};
use tradedesk_broker::Brokerage;

/// Tool to fetch the account snapshot.
pub struct AccountInfoTool {
    broker: Arc<dyn Brokerage>,
}

impl AccountInfoTool {
    pub fn new(broker: Arc<dyn Brokerage>) -> Self {
        Self { broker }
    }
}

#[async_trait::async_trait]
impl Tool for AccountInfoTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_account_info".to_string(),
            description: "Get account information including balance and buying power".to_string(),
            input_schema: json_schema_object(json!({}), vec![]),
        }
    }

    async fn execute(&self, _arguments: Value) -> Result<Value, ToolError> {
        let account = self.broker.get_account().await?;
        Ok(json!({
            "account_number": account.account_number,
            "status": account.status,
            "currency": account.currency,
            "buying_power": money("buying_power", &account.buying_power)?,
            "cash": money("cash", &account.cash)?,
            "portfolio_value": money("portfolio_value", &account.portfolio_value)?,
            "equity": money("equity", &account.equity)?,
            "last_equity": money("last_equity", &account.last_equity)?,
            "long_market_value": money("long_market_value", &account.long_market_value)?,
            "short_market_value": money("short_market_value", &account.short_market_value)?,
            "pattern_day_trader": account.pattern_day_trader,
            "trading_blocked": account.trading_blocked,
            "transfers_blocked": account.transfers_blocked,
            "account_blocked": account.account_blocked,
            "trade_suspended_by_user": account.trade_suspended_by_user,
            "daytrade_count": account.daytrade_count,
            "daytrading_buying_power": money_or_zero(
                "daytrading_buying_power",
                account.daytrading_buying_power.as_ref(),
            )?,
        }))
    }
}

/// Tool to list all open positions.
pub struct PositionsTool {
    broker: Arc<dyn Brokerage>,
}

impl PositionsTool {
    pub fn new(broker: Arc<dyn Brokerage>) -> Self {
        Self { broker }
    }
}

#[async_trait::async_trait]
impl Tool for PositionsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_positions".to_string(),
            description: "Get all current positions in the portfolio".to_string(),
            input_schema: json_schema_object(json!({}), vec![]),
        }
    }

    async fn execute(&self, _arguments: Value) -> Result<Value, ToolError> {
        let positions = self.broker.list_positions().await?;
        let mut rows = Vec::with_capacity(positions.len());
        for position in &positions {
            rows.push(json!({
                "symbol": position.symbol,
                "quantity": money("qty", &position.qty)?,
                "avg_entry_price": money("avg_entry_price", &position.avg_entry_price)?,
                "market_value": money("market_value", &position.market_value)?,
                "cost_basis": money("cost_basis", &position.cost_basis)?,
                "unrealized_pl": money_opt("unrealized_pl", position.unrealized_pl.as_ref())?,
                "unrealized_plpc": money_opt("unrealized_plpc", position.unrealized_plpc.as_ref())?,
                "current_price": money_opt("current_price", position.current_price.as_ref())?,
                "lastday_price": money_opt("lastday_price", position.lastday_price.as_ref())?,
                "change_today": money_opt("change_today", position.change_today.as_ref())?,
                "side": position.side,
            }));
        }
        Ok(Value::Array(rows))
    }
}

/// Tool to list orders with an optional status filter.
pub struct OrdersTool {
    broker: Arc<dyn Brokerage>,
}

impl OrdersTool {
    pub fn new(broker: Arc<dyn Brokerage>) -> Self {
        Self { broker }
    }
}

#[derive(Debug, Deserialize)]
struct OrdersArgs {
    #[serde(default = "default_status")]
    status: String,
}

fn default_status() -> String {
    "open".to_string()
}

#[async_trait::async_trait]
impl Tool for OrdersTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_orders".to_string(),
            description: "Get orders with optional status filter".to_string(),
            input_schema: json_schema_object(
                json!({
                    "status": json_schema_enum_with_default(
                        "Filter orders by status (open, closed, all)",
                        &["open", "closed", "all"],
                        "open",
                    )
                }),
                vec![],
            ),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<Value, ToolError> {
        let args: OrdersArgs = parse_args("get_orders", arguments)?;
        let filter = OrderStatusFilter::from_request(&args.status);
        let orders = self.broker.list_orders(filter).await?;
        let mut rows = Vec::with_capacity(orders.len());
        for order in &orders {
            rows.push(order_row(order)?);
        }
        Ok(Value::Array(rows))
    }
}

fn order_row(order: &Order) -> Result<Value, ToolError> {
    Ok(json!({
        "id": order.id,
        "symbol": order.symbol,
        "quantity": money("qty", &order.qty)?,
        "filled_qty": money_opt("filled_qty", order.filled_qty.as_ref())?,
        "side": order.side,
        "order_type": order.order_type,
        "time_in_force": order.time_in_force,
        "limit_price": money_opt("limit_price", order.limit_price.as_ref())?,
        "stop_price": money_opt("stop_price", order.stop_price.as_ref())?,
        "status": order.status,
        "created_at": order.created_at,
        "updated_at": order.updated_at,
        "filled_at": timestamp_opt(order.filled_at.as_ref()),
        "expired_at": timestamp_opt(order.expired_at.as_ref()),
        "canceled_at": timestamp_opt(order.canceled_at.as_ref()),
        "failed_at": timestamp_opt(order.failed_at.as_ref()),
        "filled_avg_price": money_opt("filled_avg_price", order.filled_avg_price.as_ref())?,
    }))
}
