use super::types::{BinancePerpOrder, PositionSide, PriceMatch, WorkingType};
use crate::core::errors::ExchangeError;
use crate::core::types::{
    NewOrderRespType, OrderSide, OrderType, Params, SelfTradePreventionMode, TimeInForce,
    WsApiMethod,
};
use crate::exchanges::binance::service::WsApiCall;
use crate::exchanges::binance::trading::{
    generate_client_order_id, put, put_decimal, put_enum, put_opt,
};
use rust_decimal::Decimal;

pub const ORDER_PLACE: WsApiMethod = WsApiMethod("order.place");
pub const ORDER_CANCEL: WsApiMethod = WsApiMethod("order.cancel");
pub const ORDER_STATUS: WsApiMethod = WsApiMethod("order.status");

fn require_symbol(symbol: &str) -> Result<(), ExchangeError> {
    if symbol.is_empty() {
        return Err(ExchangeError::InvalidParameters("symbol is required".to_string()));
    }
    Ok(())
}

/// Adds the order reference; at least one of the two must be set
fn put_order_ref(
    params: &mut Params,
    order_id: Option<i64>,
    orig_client_order_id: Option<&str>,
) -> Result<(), ExchangeError> {
    if order_id.is_none() && orig_client_order_id.is_none() {
        return Err(ExchangeError::InvalidParameters(
            "either orderId or origClientOrderId must be sent".to_string(),
        ));
    }
    put_opt(params, "orderId", order_id);
    put_opt(params, "origClientOrderId", orig_client_order_id);
    Ok(())
}

/// Parameters for futures `order.place`
#[derive(Debug, Clone)]
pub struct FuturesOrderPlaceRequest {
    symbol: String,
    side: OrderSide,
    order_type: OrderType,
    position_side: Option<PositionSide>,
    time_in_force: Option<TimeInForce>,
    quantity: Option<Decimal>,
    reduce_only: Option<bool>,
    price: Option<Decimal>,
    new_client_order_id: Option<String>,
    stop_price: Option<Decimal>,
    close_position: Option<bool>,
    activation_price: Option<Decimal>,
    callback_rate: Option<Decimal>,
    working_type: Option<WorkingType>,
    price_protect: Option<bool>,
    new_order_resp_type: Option<NewOrderRespType>,
    price_match: Option<PriceMatch>,
    self_trade_prevention_mode: Option<SelfTradePreventionMode>,
    good_till_date: Option<i64>,
    recv_window: Option<u64>,
}

impl FuturesOrderPlaceRequest {
    pub fn new(symbol: impl Into<String>, side: OrderSide, order_type: OrderType) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            order_type,
            position_side: None,
            time_in_force: None,
            quantity: None,
            reduce_only: None,
            price: None,
            new_client_order_id: None,
            stop_price: None,
            close_position: None,
            activation_price: None,
            callback_rate: None,
            working_type: None,
            price_protect: None,
            new_order_resp_type: None,
            price_match: None,
            self_trade_prevention_mode: None,
            good_till_date: None,
            recv_window: None,
        }
    }

    pub fn position_side(mut self, position_side: PositionSide) -> Self {
        self.position_side = Some(position_side);
        self
    }

    pub fn time_in_force(mut self, time_in_force: TimeInForce) -> Self {
        self.time_in_force = Some(time_in_force);
        self
    }

    pub fn quantity(mut self, quantity: Decimal) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn reduce_only(mut self, reduce_only: bool) -> Self {
        self.reduce_only = Some(reduce_only);
        self
    }

    pub fn price(mut self, price: Decimal) -> Self {
        self.price = Some(price);
        self
    }

    pub fn new_client_order_id(mut self, id: impl Into<String>) -> Self {
        self.new_client_order_id = Some(id.into());
        self
    }

    pub fn stop_price(mut self, stop_price: Decimal) -> Self {
        self.stop_price = Some(stop_price);
        self
    }

    /// Close the whole position; used with `STOP_MARKET` / `TAKE_PROFIT_MARKET`
    pub fn close_position(mut self, close_position: bool) -> Self {
        self.close_position = Some(close_position);
        self
    }

    pub fn activation_price(mut self, activation_price: Decimal) -> Self {
        self.activation_price = Some(activation_price);
        self
    }

    /// Trailing stop callback in percent, 0.1 to 10
    pub fn callback_rate(mut self, callback_rate: Decimal) -> Self {
        self.callback_rate = Some(callback_rate);
        self
    }

    pub fn working_type(mut self, working_type: WorkingType) -> Self {
        self.working_type = Some(working_type);
        self
    }

    pub fn price_protect(mut self, price_protect: bool) -> Self {
        self.price_protect = Some(price_protect);
        self
    }

    pub fn new_order_resp_type(mut self, resp_type: NewOrderRespType) -> Self {
        self.new_order_resp_type = Some(resp_type);
        self
    }

    pub fn price_match(mut self, price_match: PriceMatch) -> Self {
        self.price_match = Some(price_match);
        self
    }

    pub fn self_trade_prevention_mode(mut self, mode: SelfTradePreventionMode) -> Self {
        self.self_trade_prevention_mode = Some(mode);
        self
    }

    /// Expiry in milliseconds for `GTD` orders
    pub fn good_till_date(mut self, good_till_date: i64) -> Self {
        self.good_till_date = Some(good_till_date);
        self
    }

    pub fn recv_window(mut self, recv_window: u64) -> Self {
        self.recv_window = Some(recv_window);
        self
    }
}

impl WsApiCall for FuturesOrderPlaceRequest {
    type Response = BinancePerpOrder;

    fn method(&self) -> WsApiMethod {
        ORDER_PLACE
    }

    fn params(&self) -> Result<Params, ExchangeError> {
        require_symbol(&self.symbol)?;
        if self.time_in_force == Some(TimeInForce::GTD) && self.good_till_date.is_none() {
            return Err(ExchangeError::InvalidParameters(
                "goodTillDate is required for GTD orders".to_string(),
            ));
        }

        let mut params = Params::new();
        put(&mut params, "symbol", self.symbol.as_str());
        put_enum(&mut params, "side", Some(&self.side))?;
        put_enum(&mut params, "type", Some(&self.order_type))?;
        put_enum(&mut params, "positionSide", self.position_side.as_ref())?;
        put_enum(&mut params, "timeInForce", self.time_in_force.as_ref())?;
        put_decimal(&mut params, "quantity", self.quantity);
        put_opt(&mut params, "reduceOnly", self.reduce_only);
        put_decimal(&mut params, "price", self.price);
        put(
            &mut params,
            "newClientOrderId",
            self.new_client_order_id
                .clone()
                .unwrap_or_else(generate_client_order_id),
        );
        put_decimal(&mut params, "stopPrice", self.stop_price);
        put_opt(&mut params, "closePosition", self.close_position);
        put_decimal(&mut params, "activationPrice", self.activation_price);
        put_decimal(&mut params, "callbackRate", self.callback_rate);
        put_enum(&mut params, "workingType", self.working_type.as_ref())?;
        put_opt(&mut params, "priceProtect", self.price_protect);
        put_enum(&mut params, "newOrderRespType", self.new_order_resp_type.as_ref())?;
        put_enum(&mut params, "priceMatch", self.price_match.as_ref())?;
        put_enum(
            &mut params,
            "selfTradePreventionMode",
            self.self_trade_prevention_mode.as_ref(),
        )?;
        put_opt(&mut params, "goodTillDate", self.good_till_date);
        put_opt(&mut params, "recvWindow", self.recv_window);
        Ok(params)
    }
}

/// Parameters for futures `order.cancel`
#[derive(Debug, Clone, Default)]
pub struct FuturesOrderCancelRequest {
    symbol: String,
    order_id: Option<i64>,
    orig_client_order_id: Option<String>,
    recv_window: Option<u64>,
}

impl FuturesOrderCancelRequest {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Self::default()
        }
    }

    pub fn order_id(mut self, order_id: i64) -> Self {
        self.order_id = Some(order_id);
        self
    }

    pub fn orig_client_order_id(mut self, id: impl Into<String>) -> Self {
        self.orig_client_order_id = Some(id.into());
        self
    }

    pub fn recv_window(mut self, recv_window: u64) -> Self {
        self.recv_window = Some(recv_window);
        self
    }
}

impl WsApiCall for FuturesOrderCancelRequest {
    type Response = BinancePerpOrder;

    fn method(&self) -> WsApiMethod {
        ORDER_CANCEL
    }

    fn params(&self) -> Result<Params, ExchangeError> {
        require_symbol(&self.symbol)?;
        let mut params = Params::new();
        put(&mut params, "symbol", self.symbol.as_str());
        put_order_ref(
            &mut params,
            self.order_id,
            self.orig_client_order_id.as_deref(),
        )?;
        put_opt(&mut params, "recvWindow", self.recv_window);
        Ok(params)
    }
}

/// Parameters for futures `order.status`
#[derive(Debug, Clone, Default)]
pub struct FuturesOrderStatusRequest {
    symbol: String,
    order_id: Option<i64>,
    orig_client_order_id: Option<String>,
    recv_window: Option<u64>,
}

impl FuturesOrderStatusRequest {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Self::default()
        }
    }

    pub fn order_id(mut self, order_id: i64) -> Self {
        self.order_id = Some(order_id);
        self
    }

    pub fn orig_client_order_id(mut self, id: impl Into<String>) -> Self {
        self.orig_client_order_id = Some(id.into());
        self
    }

    pub fn recv_window(mut self, recv_window: u64) -> Self {
        self.recv_window = Some(recv_window);
        self
    }
}

impl WsApiCall for FuturesOrderStatusRequest {
    type Response = BinancePerpOrder;

    fn method(&self) -> WsApiMethod {
        ORDER_STATUS
    }

    fn params(&self) -> Result<Params, ExchangeError> {
        require_symbol(&self.symbol)?;
        let mut params = Params::new();
        put(&mut params, "symbol", self.symbol.as_str());
        put_order_ref(
            &mut params,
            self.order_id,
            self.orig_client_order_id.as_deref(),
        )?;
        put_opt(&mut params, "recvWindow", self.recv_window);
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    fn dec(raw: &str) -> Decimal {
        Decimal::from_str(raw).unwrap()
    }

    #[test]
    fn test_place_params() {
        let request = FuturesOrderPlaceRequest::new("BTCUSDT", OrderSide::Buy, OrderType::Limit)
            .position_side(PositionSide::Long)
            .time_in_force(TimeInForce::GTC)
            .quantity(dec("0.010"))
            .price(dec("43000.50"))
            .new_client_order_id("my-order")
            .new_order_resp_type(NewOrderRespType::Result);

        let params = request.params().unwrap();
        assert_eq!(request.method(), ORDER_PLACE);
        assert_eq!(params["symbol"], json!("BTCUSDT"));
        assert_eq!(params["side"], json!("BUY"));
        assert_eq!(params["type"], json!("LIMIT"));
        assert_eq!(params["positionSide"], json!("LONG"));
        assert_eq!(params["quantity"], json!("0.01"));
        assert_eq!(params["price"], json!("43000.5"));
        assert_eq!(params["newClientOrderId"], json!("my-order"));
        assert_eq!(params["newOrderRespType"], json!("RESULT"));
        assert!(!params.contains_key("reduceOnly"));
        assert!(!params.contains_key("stopPrice"));
    }

    #[test]
    fn test_trailing_stop_params() {
        let request =
            FuturesOrderPlaceRequest::new("ETHUSDT", OrderSide::Sell, OrderType::TrailingStopMarket)
                .quantity(dec("1"))
                .activation_price(dec("2500"))
                .callback_rate(dec("1.5"))
                .working_type(WorkingType::MarkPrice)
                .reduce_only(true);

        let params = request.params().unwrap();
        assert_eq!(params["type"], json!("TRAILING_STOP_MARKET"));
        assert_eq!(params["activationPrice"], json!("2500"));
        assert_eq!(params["callbackRate"], json!("1.5"));
        assert_eq!(params["workingType"], json!("MARK_PRICE"));
        assert_eq!(params["reduceOnly"], json!(true));
        assert_eq!(params["newClientOrderId"].as_str().unwrap().len(), 32);
    }

    #[test]
    fn test_gtd_requires_good_till_date() {
        let request = FuturesOrderPlaceRequest::new("BTCUSDT", OrderSide::Buy, OrderType::Limit)
            .time_in_force(TimeInForce::GTD);
        assert!(matches!(
            request.params(),
            Err(ExchangeError::InvalidParameters(_))
        ));

        let params = request.good_till_date(1_700_000_000_000).params().unwrap();
        assert_eq!(params["timeInForce"], json!("GTD"));
        assert_eq!(params["goodTillDate"], json!(1_700_000_000_000_i64));
    }

    #[test]
    fn test_cancel_requires_order_reference() {
        let err = FuturesOrderCancelRequest::new("BTCUSDT").params().unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidParameters(_)));

        let params = FuturesOrderCancelRequest::new("BTCUSDT")
            .orig_client_order_id("abc")
            .params()
            .unwrap();
        assert_eq!(params["origClientOrderId"], json!("abc"));
        assert!(!params.contains_key("orderId"));
    }

    #[test]
    fn test_status_params() {
        let request = FuturesOrderStatusRequest::new("BTCUSDT")
            .order_id(1_917_641)
            .recv_window(5000);
        let params = request.params().unwrap();
        assert_eq!(request.method(), ORDER_STATUS);
        assert_eq!(params["orderId"], json!(1_917_641));
        assert_eq!(params["recvWindow"], json!(5000));

        assert!(FuturesOrderStatusRequest::new("").order_id(1).params().is_err());
    }
}
