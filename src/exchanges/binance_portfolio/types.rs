use crate::core::types::{OrderSide, OrderStatus, OrderType, TimeInForce};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Cross-margin order held in a portfolio-margin account
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarginOrder {
    pub symbol: String,
    pub order_id: i64,
    pub client_order_id: String,
    pub price: Decimal,
    pub orig_qty: Decimal,
    pub executed_qty: Decimal,
    pub cummulative_quote_qty: Decimal,
    pub status: OrderStatus,
    pub time_in_force: TimeInForce,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub side: OrderSide,
    #[serde(default)]
    pub stop_price: Option<Decimal>,
    #[serde(default)]
    pub iceberg_qty: Option<Decimal>,
    pub time: i64,
    pub update_time: i64,
    #[serde(default)]
    pub is_working: bool,
    #[serde(default)]
    pub account_id: Option<i64>,
    #[serde(default)]
    pub self_trade_prevention_mode: Option<String>,
    #[serde(default)]
    pub prevented_match_id: Option<i64>,
    #[serde(default)]
    pub prevented_quantity: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_margin_order_with_null_prevention_fields() {
        let raw = r#"{
            "clientOrderId": "ZwfQzuDIGpceVhKW5DvCmO",
            "cummulativeQuoteQty": "0.00000000",
            "executedQty": "0.00000000",
            "icebergQty": "0.00000000",
            "isWorking": true,
            "orderId": 213205622,
            "origQty": "0.30000000",
            "price": "0.00493630",
            "side": "SELL",
            "status": "NEW",
            "stopPrice": "0.00000000",
            "symbol": "BNBBTC",
            "time": 1562133008725,
            "timeInForce": "GTC",
            "type": "LIMIT",
            "updateTime": 1562133008725,
            "accountId": 152950866,
            "selfTradePreventionMode": "EXPIRE_TAKER",
            "preventedMatchId": null,
            "preventedQuantity": null
        }"#;

        let order: MarginOrder = serde_json::from_str(raw).unwrap();
        assert_eq!(order.symbol, "BNBBTC");
        assert_eq!(order.order_id, 213_205_622);
        assert_eq!(order.side, OrderSide::Sell);
        assert_eq!(order.order_type, OrderType::Limit);
        assert_eq!(order.status, OrderStatus::New);
        assert!(order.is_working);
        assert!(order.prevented_match_id.is_none());
        assert_eq!(order.self_trade_prevention_mode.as_deref(), Some("EXPIRE_TAKER"));
    }
}
