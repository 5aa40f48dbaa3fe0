use crate::core::types::{OrderSide, OrderStatus, OrderType, TimeInForce};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionSide {
    Both,
    Long,
    Short,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkingType {
    MarkPrice,
    ContractPrice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceMatch {
    None,
    Opponent,
    #[serde(rename = "OPPONENT_5")]
    Opponent5,
    #[serde(rename = "OPPONENT_10")]
    Opponent10,
    #[serde(rename = "OPPONENT_20")]
    Opponent20,
    Queue,
    #[serde(rename = "QUEUE_5")]
    Queue5,
    #[serde(rename = "QUEUE_10")]
    Queue10,
    #[serde(rename = "QUEUE_20")]
    Queue20,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlgoType {
    Conditional,
}

/// Order types accepted by `algoOrder.place`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlgoOrderType {
    Stop,
    StopMarket,
    TakeProfit,
    TakeProfitMarket,
    TrailingStopMarket,
}

/// Result of `algoOrder.place`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinanceAlgoOrder {
    pub algo_id: i64,
    pub client_algo_id: String,
}

/// Result of `algoOrder.cancel`; `code` is a string, `"200"` on success
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinanceAlgoOrderCancel {
    pub algo_id: i64,
    pub client_algo_id: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub msg: String,
}

impl BinanceAlgoOrderCancel {
    pub fn is_success(&self) -> bool {
        self.code == "200"
    }
}

/// Order as returned by futures `order.place`, `order.cancel` and `order.status`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinancePerpOrder {
    pub order_id: i64,
    pub symbol: String,
    pub status: OrderStatus,
    pub client_order_id: String,
    pub price: Decimal,
    #[serde(default)]
    pub avg_price: Option<Decimal>,
    pub orig_qty: Decimal,
    pub executed_qty: Decimal,
    #[serde(default)]
    pub cum_qty: Option<Decimal>,
    pub cum_quote: Decimal,
    pub time_in_force: TimeInForce,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    #[serde(default)]
    pub orig_type: Option<OrderType>,
    #[serde(default)]
    pub reduce_only: bool,
    #[serde(default)]
    pub close_position: bool,
    pub side: OrderSide,
    pub position_side: PositionSide,
    #[serde(default)]
    pub stop_price: Option<Decimal>,
    #[serde(default)]
    pub activate_price: Option<Decimal>,
    #[serde(default)]
    pub price_rate: Option<Decimal>,
    #[serde(default)]
    pub working_type: Option<WorkingType>,
    #[serde(default)]
    pub price_protect: bool,
    #[serde(default)]
    pub price_match: Option<PriceMatch>,
    #[serde(default)]
    pub self_trade_prevention_mode: Option<String>,
    #[serde(default)]
    pub good_till_date: Option<i64>,
    #[serde(default)]
    pub time: Option<i64>,
    pub update_time: i64,
}

impl BinancePerpOrder {
    pub fn is_open(&self) -> bool {
        matches!(self.status, OrderStatus::New | OrderStatus::PartiallyFilled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::WsApiResponse;

    #[test]
    fn test_order_status_response() {
        let raw = r#"{
            "id": "605a6d20-6588-4cb9-afa0-b0ab087507ba",
            "status": 200,
            "result": {
                "avgPrice": "0.00000", "clientOrderId": "abc", "cumQuote": "0",
                "executedQty": "0", "orderId": 1917641, "origQty": "0.40",
                "origType": "TRAILING_STOP_MARKET", "price": "0", "reduceOnly": false,
                "side": "BUY", "positionSide": "SHORT", "status": "NEW",
                "stopPrice": "9300", "closePosition": false, "symbol": "BTCUSDT",
                "time": 1579276756075, "timeInForce": "GTC", "type": "TRAILING_STOP_MARKET",
                "activatePrice": "9020", "priceRate": "0.3", "updateTime": 1579276756075,
                "workingType": "CONTRACT_PRICE", "priceProtect": false,
                "priceMatch": "NONE", "selfTradePreventionMode": "NONE", "goodTillDate": 0
            },
            "rateLimits": [{"rateLimitType": "REQUEST_WEIGHT", "interval": "MINUTE", "intervalNum": 1, "limit": 2400, "count": 2}]
        }"#;

        let response: WsApiResponse<BinancePerpOrder> = serde_json::from_str(raw).unwrap();
        assert_eq!(response.rate_limits.len(), 1);
        let order = response.into_result().unwrap();
        assert_eq!(order.order_id, 1_917_641);
        assert_eq!(order.position_side, PositionSide::Short);
        assert_eq!(order.orig_type, Some(OrderType::TrailingStopMarket));
        assert_eq!(order.working_type, Some(WorkingType::ContractPrice));
        assert_eq!(order.price_rate.unwrap().to_string(), "0.3");
        assert!(order.is_open());
    }

    #[test]
    fn test_algo_results() {
        let placed: WsApiResponse<BinanceAlgoOrder> = serde_json::from_str(
            r#"{"id":"a1","status":200,"result":{"algoId":2146760,"clientAlgoId":"6B2I9XVcJpCjqPAJ4YoFX7"}}"#,
        )
        .unwrap();
        let placed = placed.into_result().unwrap();
        assert_eq!(placed.algo_id, 2_146_760);
        assert_eq!(placed.client_algo_id, "6B2I9XVcJpCjqPAJ4YoFX7");

        let canceled: BinanceAlgoOrderCancel = serde_json::from_str(
            r#"{"algoId":2146760,"clientAlgoId":"6B2I9XVcJpCjqPAJ4YoFX7","code":"200","msg":"success"}"#,
        )
        .unwrap();
        assert!(canceled.is_success());
    }

    #[test]
    fn test_canceled_order_is_not_open() {
        let raw = r#"{
            "orderId": 1, "symbol": "ETHUSDT", "status": "CANCELED", "clientOrderId": "x",
            "price": "1500", "origQty": "1", "executedQty": "0", "cumQuote": "0",
            "timeInForce": "GTX", "type": "LIMIT", "side": "SELL", "positionSide": "BOTH",
            "updateTime": 2
        }"#;
        let order: BinancePerpOrder = serde_json::from_str(raw).unwrap();
        assert!(!order.is_open());
        assert_eq!(order.time_in_force, TimeInForce::GTX);
        assert!(order.stop_price.is_none());
    }
}
