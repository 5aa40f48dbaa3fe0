use super::service::WsApiCall;
use super::trading::{generate_client_order_id, put, put_decimal, put_enum, put_opt};
use super::types::BinanceOrderListResult;
use crate::core::errors::ExchangeError;
use crate::core::types::{
    wire_name, NewOrderRespType, OrderSide, OrderType, Params, SelfTradePreventionMode,
    TimeInForce, WsApiMethod,
};
use rust_decimal::Decimal;

pub const ORDER_LIST_PLACE: WsApiMethod = WsApiMethod("orderList.place");
pub const ORDER_LIST_PLACE_OCO: WsApiMethod = WsApiMethod("orderList.place.oco");
pub const ORDER_LIST_PLACE_OTO: WsApiMethod = WsApiMethod("orderList.place.oto");
pub const ORDER_LIST_PLACE_OTOCO: WsApiMethod = WsApiMethod("orderList.place.otoco");

fn missing(field: String) -> ExchangeError {
    ExchangeError::InvalidParameters(format!("{} is required", field))
}

fn require_symbol(symbol: &str) -> Result<(), ExchangeError> {
    if symbol.is_empty() {
        return Err(missing("symbol".to_string()));
    }
    Ok(())
}

/// One order of an order list
///
/// Fields are sent under the prefix of the leg's role in the list, so the
/// `price` of the `above` leg goes out as `abovePrice`. A leg without a client
/// order id gets a generated one.
#[derive(Debug, Clone)]
pub struct OrderListLeg {
    order_type: OrderType,
    side: Option<OrderSide>,
    price: Option<Decimal>,
    quantity: Option<Decimal>,
    stop_price: Option<Decimal>,
    trailing_delta: Option<i64>,
    time_in_force: Option<TimeInForce>,
    iceberg_qty: Option<Decimal>,
    strategy_id: Option<i64>,
    strategy_type: Option<i64>,
    client_order_id: Option<String>,
}

impl OrderListLeg {
    pub fn new(order_type: OrderType) -> Self {
        Self {
            order_type,
            side: None,
            price: None,
            quantity: None,
            stop_price: None,
            trailing_delta: None,
            time_in_force: None,
            iceberg_qty: None,
            strategy_id: None,
            strategy_type: None,
            client_order_id: None,
        }
    }

    pub fn side(mut self, side: OrderSide) -> Self {
        self.side = Some(side);
        self
    }

    pub fn price(mut self, price: Decimal) -> Self {
        self.price = Some(price);
        self
    }

    pub fn quantity(mut self, quantity: Decimal) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn stop_price(mut self, stop_price: Decimal) -> Self {
        self.stop_price = Some(stop_price);
        self
    }

    pub fn trailing_delta(mut self, trailing_delta: i64) -> Self {
        self.trailing_delta = Some(trailing_delta);
        self
    }

    pub fn time_in_force(mut self, time_in_force: TimeInForce) -> Self {
        self.time_in_force = Some(time_in_force);
        self
    }

    pub fn iceberg_qty(mut self, iceberg_qty: Decimal) -> Self {
        self.iceberg_qty = Some(iceberg_qty);
        self
    }

    pub fn strategy_id(mut self, strategy_id: i64) -> Self {
        self.strategy_id = Some(strategy_id);
        self
    }

    pub fn strategy_type(mut self, strategy_type: i64) -> Self {
        self.strategy_type = Some(strategy_type);
        self
    }

    pub fn client_order_id(mut self, id: impl Into<String>) -> Self {
        self.client_order_id = Some(id.into());
        self
    }

    /// Side and quantity are always required for a leg that stands on its own
    fn require(&self, prefix: &str, with_price: bool) -> Result<(), ExchangeError> {
        if self.side.is_none() {
            return Err(missing(format!("{}Side", prefix)));
        }
        if with_price && self.price.is_none() {
            return Err(missing(format!("{}Price", prefix)));
        }
        if self.quantity.is_none() {
            return Err(missing(format!("{}Quantity", prefix)));
        }
        Ok(())
    }

    fn write(&self, params: &mut Params, prefix: &str) -> Result<(), ExchangeError> {
        let key = |name: &str| format!("{}{}", prefix, name);

        put(params, &key("Type"), wire_name(&self.order_type)?);
        put_enum(params, &key("Side"), self.side.as_ref())?;
        put_decimal(params, &key("Price"), self.price);
        put_decimal(params, &key("Quantity"), self.quantity);
        put_decimal(params, &key("StopPrice"), self.stop_price);
        put_opt(params, &key("TrailingDelta"), self.trailing_delta);
        put_enum(params, &key("TimeInForce"), self.time_in_force.as_ref())?;
        put_decimal(params, &key("IcebergQty"), self.iceberg_qty);
        put_opt(params, &key("StrategyId"), self.strategy_id);
        put_opt(params, &key("StrategyType"), self.strategy_type);
        put(
            params,
            &key("ClientOrderId"),
            self.client_order_id
                .clone()
                .unwrap_or_else(generate_client_order_id),
        );
        Ok(())
    }
}

/// List-level parameters shared by every `orderList.place*` method
#[derive(Debug, Clone, Default)]
struct ListOptions {
    list_client_order_id: Option<String>,
    new_order_resp_type: Option<NewOrderRespType>,
    self_trade_prevention_mode: Option<SelfTradePreventionMode>,
    recv_window: Option<u64>,
}

impl ListOptions {
    fn write(&self, params: &mut Params) -> Result<(), ExchangeError> {
        put(
            params,
            "listClientOrderId",
            self.list_client_order_id
                .clone()
                .unwrap_or_else(generate_client_order_id),
        );
        put_enum(params, "newOrderRespType", self.new_order_resp_type.as_ref())?;
        put_enum(
            params,
            "selfTradePreventionMode",
            self.self_trade_prevention_mode.as_ref(),
        )?;
        put_opt(params, "recvWindow", self.recv_window);
        Ok(())
    }
}

macro_rules! list_options {
    ($request:ty) => {
        impl $request {
            pub fn list_client_order_id(mut self, id: impl Into<String>) -> Self {
                self.options.list_client_order_id = Some(id.into());
                self
            }

            pub fn new_order_resp_type(mut self, resp_type: NewOrderRespType) -> Self {
                self.options.new_order_resp_type = Some(resp_type);
                self
            }

            pub fn self_trade_prevention_mode(mut self, mode: SelfTradePreventionMode) -> Self {
                self.options.self_trade_prevention_mode = Some(mode);
                self
            }

            pub fn recv_window(mut self, recv_window: u64) -> Self {
                self.options.recv_window = Some(recv_window);
                self
            }
        }
    };
}

/// Parameters for the legacy OCO method `orderList.place`
///
/// A limit order at `price` paired with a stop order at `stop_price`; with
/// `stop_limit_price` set the stop leg becomes a stop-limit order.
#[derive(Debug, Clone)]
pub struct OrderListPlaceRequest {
    symbol: String,
    side: OrderSide,
    price: Decimal,
    quantity: Decimal,
    limit_client_order_id: Option<String>,
    limit_iceberg_qty: Option<Decimal>,
    limit_strategy_id: Option<i64>,
    limit_strategy_type: Option<i64>,
    stop_price: Option<Decimal>,
    trailing_delta: Option<i64>,
    stop_client_order_id: Option<String>,
    stop_limit_price: Option<Decimal>,
    stop_limit_time_in_force: Option<TimeInForce>,
    stop_iceberg_qty: Option<Decimal>,
    stop_strategy_id: Option<i64>,
    stop_strategy_type: Option<i64>,
    options: ListOptions,
}

impl OrderListPlaceRequest {
    pub fn new(symbol: impl Into<String>, side: OrderSide, price: Decimal, quantity: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            price,
            quantity,
            limit_client_order_id: None,
            limit_iceberg_qty: None,
            limit_strategy_id: None,
            limit_strategy_type: None,
            stop_price: None,
            trailing_delta: None,
            stop_client_order_id: None,
            stop_limit_price: None,
            stop_limit_time_in_force: None,
            stop_iceberg_qty: None,
            stop_strategy_id: None,
            stop_strategy_type: None,
            options: ListOptions::default(),
        }
    }

    pub fn limit_client_order_id(mut self, id: impl Into<String>) -> Self {
        self.limit_client_order_id = Some(id.into());
        self
    }

    pub fn limit_iceberg_qty(mut self, qty: Decimal) -> Self {
        self.limit_iceberg_qty = Some(qty);
        self
    }

    pub fn limit_strategy_id(mut self, strategy_id: i64) -> Self {
        self.limit_strategy_id = Some(strategy_id);
        self
    }

    pub fn limit_strategy_type(mut self, strategy_type: i64) -> Self {
        self.limit_strategy_type = Some(strategy_type);
        self
    }

    pub fn stop_price(mut self, stop_price: Decimal) -> Self {
        self.stop_price = Some(stop_price);
        self
    }

    pub fn trailing_delta(mut self, trailing_delta: i64) -> Self {
        self.trailing_delta = Some(trailing_delta);
        self
    }

    pub fn stop_client_order_id(mut self, id: impl Into<String>) -> Self {
        self.stop_client_order_id = Some(id.into());
        self
    }

    pub fn stop_limit_price(mut self, price: Decimal) -> Self {
        self.stop_limit_price = Some(price);
        self
    }

    pub fn stop_limit_time_in_force(mut self, time_in_force: TimeInForce) -> Self {
        self.stop_limit_time_in_force = Some(time_in_force);
        self
    }

    pub fn stop_iceberg_qty(mut self, qty: Decimal) -> Self {
        self.stop_iceberg_qty = Some(qty);
        self
    }

    pub fn stop_strategy_id(mut self, strategy_id: i64) -> Self {
        self.stop_strategy_id = Some(strategy_id);
        self
    }

    pub fn stop_strategy_type(mut self, strategy_type: i64) -> Self {
        self.stop_strategy_type = Some(strategy_type);
        self
    }
}

list_options!(OrderListPlaceRequest);

impl WsApiCall for OrderListPlaceRequest {
    type Response = BinanceOrderListResult;

    fn method(&self) -> WsApiMethod {
        ORDER_LIST_PLACE
    }

    fn params(&self) -> Result<Params, ExchangeError> {
        require_symbol(&self.symbol)?;
        if self.stop_price.is_none() && self.trailing_delta.is_none() {
            return Err(ExchangeError::InvalidParameters(
                "either stopPrice or trailingDelta must be set".to_string(),
            ));
        }

        let mut params = Params::new();
        put(&mut params, "symbol", self.symbol.as_str());
        put(&mut params, "side", wire_name(&self.side)?);
        put_decimal(&mut params, "price", Some(self.price));
        put_decimal(&mut params, "quantity", Some(self.quantity));
        put(
            &mut params,
            "limitClientOrderId",
            self.limit_client_order_id
                .clone()
                .unwrap_or_else(generate_client_order_id),
        );
        put_decimal(&mut params, "limitIcebergQty", self.limit_iceberg_qty);
        put_opt(&mut params, "limitStrategyId", self.limit_strategy_id);
        put_opt(&mut params, "limitStrategyType", self.limit_strategy_type);
        put_decimal(&mut params, "stopPrice", self.stop_price);
        put_opt(&mut params, "trailingDelta", self.trailing_delta);
        put(
            &mut params,
            "stopClientOrderId",
            self.stop_client_order_id
                .clone()
                .unwrap_or_else(generate_client_order_id),
        );
        put_decimal(&mut params, "stopLimitPrice", self.stop_limit_price);
        put_enum(&mut params, "stopLimitTimeInForce", self.stop_limit_time_in_force.as_ref())?;
        put_decimal(&mut params, "stopIcebergQty", self.stop_iceberg_qty);
        put_opt(&mut params, "stopStrategyId", self.stop_strategy_id);
        put_opt(&mut params, "stopStrategyType", self.stop_strategy_type);
        self.options.write(&mut params)?;
        Ok(params)
    }
}

/// Parameters for `orderList.place.oco`: one order above and one below the market
#[derive(Debug, Clone)]
pub struct OrderListPlaceOcoRequest {
    symbol: String,
    side: OrderSide,
    quantity: Decimal,
    above: OrderListLeg,
    below: OrderListLeg,
    options: ListOptions,
}

impl OrderListPlaceOcoRequest {
    /// `side` and `quantity` apply to both legs
    pub fn new(
        symbol: impl Into<String>,
        side: OrderSide,
        quantity: Decimal,
        above: OrderListLeg,
        below: OrderListLeg,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            quantity,
            above,
            below,
            options: ListOptions::default(),
        }
    }
}

list_options!(OrderListPlaceOcoRequest);

impl WsApiCall for OrderListPlaceOcoRequest {
    type Response = BinanceOrderListResult;

    fn method(&self) -> WsApiMethod {
        ORDER_LIST_PLACE_OCO
    }

    fn params(&self) -> Result<Params, ExchangeError> {
        require_symbol(&self.symbol)?;

        let mut params = Params::new();
        put(&mut params, "symbol", self.symbol.as_str());
        put(&mut params, "side", wire_name(&self.side)?);
        put_decimal(&mut params, "quantity", Some(self.quantity));
        self.above.write(&mut params, "above")?;
        self.below.write(&mut params, "below")?;
        // side and quantity are list-level here
        for key in ["aboveSide", "aboveQuantity", "belowSide", "belowQuantity"] {
            params.remove(key);
        }
        self.options.write(&mut params)?;
        Ok(params)
    }
}

/// Parameters for `orderList.place.oto`: the pending order is placed once the working order fills
#[derive(Debug, Clone)]
pub struct OrderListPlaceOtoRequest {
    symbol: String,
    working: OrderListLeg,
    pending: OrderListLeg,
    options: ListOptions,
}

impl OrderListPlaceOtoRequest {
    /// `working` needs side, price and quantity; `pending` needs side and quantity
    pub fn new(symbol: impl Into<String>, working: OrderListLeg, pending: OrderListLeg) -> Self {
        Self {
            symbol: symbol.into(),
            working,
            pending,
            options: ListOptions::default(),
        }
    }
}

list_options!(OrderListPlaceOtoRequest);

impl WsApiCall for OrderListPlaceOtoRequest {
    type Response = BinanceOrderListResult;

    fn method(&self) -> WsApiMethod {
        ORDER_LIST_PLACE_OTO
    }

    fn params(&self) -> Result<Params, ExchangeError> {
        require_symbol(&self.symbol)?;
        self.working.require("working", true)?;
        self.pending.require("pending", false)?;

        let mut params = Params::new();
        put(&mut params, "symbol", self.symbol.as_str());
        self.working.write(&mut params, "working")?;
        self.pending.write(&mut params, "pending")?;
        params.remove("workingStopPrice");
        params.remove("workingTrailingDelta");
        self.options.write(&mut params)?;
        Ok(params)
    }
}

/// Parameters for `orderList.place.otoco`: a working order that triggers a pending OCO pair
#[derive(Debug, Clone)]
pub struct OrderListPlaceOtocoRequest {
    symbol: String,
    working: OrderListLeg,
    pending_side: OrderSide,
    pending_quantity: Decimal,
    pending_above: OrderListLeg,
    pending_below: Option<OrderListLeg>,
    options: ListOptions,
}

impl OrderListPlaceOtocoRequest {
    /// `working` needs side, price and quantity; the pending pair shares `pending_side` and `pending_quantity`
    pub fn new(
        symbol: impl Into<String>,
        working: OrderListLeg,
        pending_side: OrderSide,
        pending_quantity: Decimal,
        pending_above: OrderListLeg,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            working,
            pending_side,
            pending_quantity,
            pending_above,
            pending_below: None,
            options: ListOptions::default(),
        }
    }

    pub fn pending_below(mut self, leg: OrderListLeg) -> Self {
        self.pending_below = Some(leg);
        self
    }
}

list_options!(OrderListPlaceOtocoRequest);

impl WsApiCall for OrderListPlaceOtocoRequest {
    type Response = BinanceOrderListResult;

    fn method(&self) -> WsApiMethod {
        ORDER_LIST_PLACE_OTOCO
    }

    fn params(&self) -> Result<Params, ExchangeError> {
        require_symbol(&self.symbol)?;
        self.working.require("working", true)?;

        let mut params = Params::new();
        put(&mut params, "symbol", self.symbol.as_str());
        self.working.write(&mut params, "working")?;
        params.remove("workingStopPrice");
        params.remove("workingTrailingDelta");

        put(&mut params, "pendingSide", wire_name(&self.pending_side)?);
        put_decimal(&mut params, "pendingQuantity", Some(self.pending_quantity));
        self.pending_above.write(&mut params, "pendingAbove")?;
        if let Some(below) = &self.pending_below {
            below.write(&mut params, "pendingBelow")?;
        }
        for key in [
            "pendingAboveSide",
            "pendingAboveQuantity",
            "pendingBelowSide",
            "pendingBelowQuantity",
        ] {
            params.remove(key);
        }
        self.options.write(&mut params)?;
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::WsApiResponse;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_legacy_order_list_place_params() {
        let request = OrderListPlaceRequest::new("BTCUSDT", OrderSide::Sell, dec("23420.00"), dec("0.00650000"))
            .stop_price(dec("23410"))
            .stop_limit_price(dec("23405"))
            .stop_limit_time_in_force(TimeInForce::GTC)
            .limit_client_order_id("limit-1")
            .new_order_resp_type(NewOrderRespType::Result);
        let params = request.params().unwrap();

        assert_eq!(request.method(), ORDER_LIST_PLACE);
        assert_eq!(params["side"], "SELL");
        assert_eq!(params["price"], "23420");
        assert_eq!(params["quantity"], "0.0065");
        assert_eq!(params["stopPrice"], "23410");
        assert_eq!(params["stopLimitPrice"], "23405");
        assert_eq!(params["stopLimitTimeInForce"], "GTC");
        assert_eq!(params["limitClientOrderId"], "limit-1");
        assert_eq!(params["stopClientOrderId"].as_str().unwrap().len(), 32);
        assert_eq!(params["listClientOrderId"].as_str().unwrap().len(), 32);
        assert_eq!(params["newOrderRespType"], "RESULT");
    }

    #[test]
    fn test_legacy_order_list_place_requires_a_stop() {
        let err = OrderListPlaceRequest::new("BTCUSDT", OrderSide::Buy, dec("1"), dec("1"))
            .params()
            .unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidParameters(_)));
    }

    #[test]
    fn test_oco_prefixes_each_leg() {
        let above = OrderListLeg::new(OrderType::LimitMaker).price(dec("31000"));
        let below = OrderListLeg::new(OrderType::StopLossLimit)
            .price(dec("28900"))
            .stop_price(dec("29000"))
            .time_in_force(TimeInForce::GTC)
            .client_order_id("below-1");
        let request = OrderListPlaceOcoRequest::new("BTCUSDT", OrderSide::Sell, dec("0.1"), above, below)
            .list_client_order_id("list-1")
            .recv_window(5000);
        let params = request.params().unwrap();

        assert_eq!(request.method(), ORDER_LIST_PLACE_OCO);
        assert_eq!(params["side"], "SELL");
        assert_eq!(params["quantity"], "0.1");
        assert_eq!(params["aboveType"], "LIMIT_MAKER");
        assert_eq!(params["abovePrice"], "31000");
        assert_eq!(params["belowType"], "STOP_LOSS_LIMIT");
        assert_eq!(params["belowStopPrice"], "29000");
        assert_eq!(params["belowTimeInForce"], "GTC");
        assert_eq!(params["belowClientOrderId"], "below-1");
        assert_eq!(params["listClientOrderId"], "list-1");
        assert_eq!(params["recvWindow"], 5000);
        assert!(!params.contains_key("aboveSide"));
        assert!(!params.contains_key("belowQuantity"));
    }

    #[test]
    fn test_oto_requires_working_price() {
        let working = OrderListLeg::new(OrderType::Limit)
            .side(OrderSide::Buy)
            .quantity(dec("1"));
        let pending = OrderListLeg::new(OrderType::Market)
            .side(OrderSide::Sell)
            .quantity(dec("1"));
        let err = OrderListPlaceOtoRequest::new("BTCUSDT", working.clone(), pending.clone())
            .params()
            .unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidParameters(ref m) if m == "workingPrice is required"));

        let request = OrderListPlaceOtoRequest::new(
            "BTCUSDT",
            working.price(dec("30000")).time_in_force(TimeInForce::GTC),
            pending,
        );
        let params = request.params().unwrap();
        assert_eq!(request.method(), ORDER_LIST_PLACE_OTO);
        assert_eq!(params["workingType"], "LIMIT");
        assert_eq!(params["workingSide"], "BUY");
        assert_eq!(params["workingPrice"], "30000");
        assert_eq!(params["workingTimeInForce"], "GTC");
        assert_eq!(params["pendingType"], "MARKET");
        assert_eq!(params["pendingSide"], "SELL");
        assert_eq!(params["pendingQuantity"], "1");
        assert!(params["workingClientOrderId"].is_string());
        assert!(params["pendingClientOrderId"].is_string());
    }

    #[test]
    fn test_otoco_pending_pair() {
        let working = OrderListLeg::new(OrderType::Limit)
            .side(OrderSide::Buy)
            .price(dec("30000"))
            .quantity(dec("0.5"))
            .time_in_force(TimeInForce::GTC);
        let above = OrderListLeg::new(OrderType::LimitMaker).price(dec("32000"));
        let below = OrderListLeg::new(OrderType::StopLoss).stop_price(dec("29000"));
        let request = OrderListPlaceOtocoRequest::new("BTCUSDT", working, OrderSide::Sell, dec("0.5"), above)
            .pending_below(below);
        let params = request.params().unwrap();

        assert_eq!(request.method(), ORDER_LIST_PLACE_OTOCO);
        assert_eq!(params["pendingSide"], "SELL");
        assert_eq!(params["pendingQuantity"], "0.5");
        assert_eq!(params["pendingAboveType"], "LIMIT_MAKER");
        assert_eq!(params["pendingAbovePrice"], "32000");
        assert_eq!(params["pendingBelowType"], "STOP_LOSS");
        assert_eq!(params["pendingBelowStopPrice"], "29000");
        assert!(!params.contains_key("pendingAboveSide"));
        assert!(params["pendingBelowClientOrderId"].is_string());
    }

    #[test]
    fn test_order_list_place_response() {
        let raw = r#"{
            "id": "56374b46-3061-486b-a311-89ee972eb648",
            "status": 200,
            "result": {
                "orderListId": 1274512, "contingencyType": "OCO", "listStatusType": "EXEC_STARTED",
                "listOrderStatus": "EXECUTING", "listClientOrderId": "08985fedd9ea2cf6b28996",
                "transactionTime": 1660801713793, "symbol": "BTCUSDT",
                "orders": [
                    {"symbol": "BTCUSDT", "orderId": 12569138901, "clientOrderId": "BqtFCj5odMoWtSqGk2X9tU"},
                    {"symbol": "BTCUSDT", "orderId": 12569138902, "clientOrderId": "jLnZpj5enfMXTuhKB1d0us"}
                ],
                "orderReports": [{
                    "symbol": "BTCUSDT", "orderId": 12569138901, "orderListId": 1274512,
                    "clientOrderId": "BqtFCj5odMoWtSqGk2X9tU", "transactTime": 1660801713793,
                    "price": "23410.00000000", "origQty": "0.00650000", "executedQty": "0.00000000",
                    "cummulativeQuoteQty": "0.00000000", "status": "NEW", "timeInForce": "GTC",
                    "type": "STOP_LOSS_LIMIT", "side": "SELL", "stopPrice": "23405.00000000",
                    "workingTime": -1, "selfTradePreventionMode": "NONE"
                }]
            },
            "rateLimits": []
        }"#;

        let response: WsApiResponse<BinanceOrderListResult> = serde_json::from_str(raw).unwrap();
        let result = response.into_result().unwrap();
        assert_eq!(result.order_list_id, 1_274_512);
        assert_eq!(result.contingency_type, "OCO");
        assert_eq!(result.orders.len(), 2);
        assert_eq!(result.order_reports[0].order_type, OrderType::StopLossLimit);
        assert_eq!(result.order_reports[0].working_time, Some(-1));
    }
}
