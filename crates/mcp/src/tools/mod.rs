pub mod account;
pub mod market;
pub mod trading;
mod registry;

pub use account::{AccountInfoTool, OrdersTool, PositionsTool};
pub use market::StockQuoteTool;
pub use registry::{
    json_schema_boolean_with_default, json_schema_enum, json_schema_enum_with_default,
    json_schema_number, json_schema_object, json_schema_string, Tool, ToolRegistry,
};
pub use trading::{
    CancelOrderTool, CloseAllPositionsTool, ClosePositionTool, LimitOrderTool, MarketOrderTool,
};

use std::sync::Arc;
use tradedesk_broker::Brokerage;

/// Build the full tool catalog in its advertised order.
pub fn standard_registry(broker: Arc<dyn Brokerage>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(AccountInfoTool::new(broker.clone())));
    registry.register(Arc::new(PositionsTool::new(broker.clone())));
    registry.register(Arc::new(OrdersTool::new(broker.clone())));
    registry.register(Arc::new(MarketOrderTool::new(broker.clone())));
    registry.register(Arc::new(LimitOrderTool::new(broker.clone())));
    registry.register(Arc::new(CancelOrderTool::new(broker.clone())));
    registry.register(Arc::new(StockQuoteTool::new(broker.clone())));
    registry.register(Arc::new(ClosePositionTool::new(broker.clone())));
    registry.register(Arc::new(CloseAllPositionsTool::new(broker)));
    registry
}
