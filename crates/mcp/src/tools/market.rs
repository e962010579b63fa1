// Market-data tools.

use crate::error::ToolError;
use crate::protocol::ToolSchema;
use crate::tools::registry::{json_schema_object, json_schema_string, parse_args, Tool};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tradedesk_broker::Brokerage;

/// Tool to fetch the latest quote for a stock.
pub struct StockQuoteTool {
    broker: Arc<dyn Brokerage>,
}

impl StockQuoteTool {
    pub fn new(broker: Arc<dyn Brokerage>) -> Self {
        Self { broker }
    }
}

#[derive(Debug, Deserialize)]
struct StockQuoteArgs {
    symbol: String,
}

#[async_trait::async_trait]
impl Tool for StockQuoteTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_stock_quote".to_string(),
            description: "Get the latest quote for a stock".to_string(),
            input_schema: json_schema_object(
                json!({
                    "symbol": json_schema_string("Stock ticker symbol"),
                }),
                vec!["symbol"],
            ),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<Value, ToolError> {
        let args: StockQuoteArgs = parse_args("get_stock_quote", arguments)?;
        let quotes = self.broker.latest_quotes(&[args.symbol.as_str()]).await?;
        // The batch is keyed by symbol; a missing entry is a lookup
        // failure, not a fault.
        let quote = quotes.get(&args.symbol).ok_or_else(|| {
            ToolError::NotFound(format!("no quote returned for symbol {}", args.symbol))
        })?;
        Ok(json!({
            "symbol": args.symbol,
            "ask_price": quote.ask_price,
            "ask_size": quote.ask_size,
            "bid_price": quote.bid_price,
            "bid_size": quote.bid_size,
            "timestamp": quote.timestamp,
        }))
    }
}
