use super::types::{BinanceAccountStatus, BinanceOrderListResult, BinanceOrderResult};
use super::service::WsApiCall;
use crate::core::errors::ExchangeError;
use crate::core::types::{
    wire_name, NewOrderRespType, OrderSide, OrderType, Params, SelfTradePreventionMode,
    TimeInForce, WsApiMethod,
};
use rust_decimal::Decimal;
use serde_json::Value;

pub const ORDER_PLACE: WsApiMethod = WsApiMethod("order.place");
pub const ORDER_TEST: WsApiMethod = WsApiMethod("order.test");
pub const SOR_ORDER_PLACE: WsApiMethod = WsApiMethod("sor.order.place");
pub const SOR_ORDER_TEST: WsApiMethod = WsApiMethod("sor.order.test");
pub const ORDER_LIST_CANCEL: WsApiMethod = WsApiMethod("orderList.cancel");
pub const ACCOUNT_STATUS: WsApiMethod = WsApiMethod("account.status");

/// Client order id for orders placed without one
pub fn generate_client_order_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

pub(crate) fn put(params: &mut Params, key: &str, value: impl Into<Value>) {
    params.insert(key.to_string(), value.into());
}

pub(crate) fn put_opt(params: &mut Params, key: &str, value: Option<impl Into<Value>>) {
    if let Some(value) = value {
        put(params, key, value);
    }
}

pub(crate) fn put_decimal(params: &mut Params, key: &str, value: Option<Decimal>) {
    put_opt(params, key, value.map(|d| d.normalize().to_string()));
}

pub(crate) fn put_enum<T: serde::Serialize>(
    params: &mut Params,
    key: &str,
    value: Option<&T>,
) -> Result<(), ExchangeError> {
    if let Some(value) = value {
        put(params, key, wire_name(value)?);
    }
    Ok(())
}

/// Parameters for `order.place`
#[derive(Debug, Clone, Default)]
pub struct OrderPlaceRequest {
    symbol: String,
    side: Option<OrderSide>,
    order_type: Option<OrderType>,
    time_in_force: Option<TimeInForce>,
    price: Option<Decimal>,
    quantity: Option<Decimal>,
    quote_order_qty: Option<Decimal>,
    new_client_order_id: Option<String>,
    new_order_resp_type: Option<NewOrderRespType>,
    stop_price: Option<Decimal>,
    trailing_delta: Option<i64>,
    iceberg_qty: Option<Decimal>,
    strategy_id: Option<i64>,
    strategy_type: Option<i64>,
    self_trade_prevention_mode: Option<SelfTradePreventionMode>,
    recv_window: Option<u64>,
}

impl OrderPlaceRequest {
    pub fn new(symbol: impl Into<String>, side: OrderSide, order_type: OrderType) -> Self {
        Self {
            symbol: symbol.into(),
            side: Some(side),
            order_type: Some(order_type),
            ..Self::default()
        }
    }

    pub fn time_in_force(mut self, time_in_force: TimeInForce) -> Self {
        self.time_in_force = Some(time_in_force);
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

    pub fn quote_order_qty(mut self, quote_order_qty: Decimal) -> Self {
        self.quote_order_qty = Some(quote_order_qty);
        self
    }

    pub fn new_client_order_id(mut self, id: impl Into<String>) -> Self {
        self.new_client_order_id = Some(id.into());
        self
    }

    pub fn new_order_resp_type(mut self, resp_type: NewOrderRespType) -> Self {
        self.new_order_resp_type = Some(resp_type);
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

    pub fn self_trade_prevention_mode(mut self, mode: SelfTradePreventionMode) -> Self {
        self.self_trade_prevention_mode = Some(mode);
        self
    }

    pub fn recv_window(mut self, recv_window: u64) -> Self {
        self.recv_window = Some(recv_window);
        self
    }

    /// Same parameters, validated by `order.test` without reaching the matching engine
    pub fn test(self) -> OrderTestRequest {
        OrderTestRequest {
            order: self,
            compute_commission_rates: false,
        }
    }
}

impl WsApiCall for OrderPlaceRequest {
    type Response = BinanceOrderResult;

    fn method(&self) -> WsApiMethod {
        ORDER_PLACE
    }

    fn params(&self) -> Result<Params, ExchangeError> {
        if self.symbol.is_empty() {
            return Err(ExchangeError::InvalidParameters("symbol is required".to_string()));
        }

        let mut params = Params::new();
        put(&mut params, "symbol", self.symbol.as_str());
        put_enum(&mut params, "side", self.side.as_ref())?;
        put_enum(&mut params, "type", self.order_type.as_ref())?;
        put_enum(&mut params, "timeInForce", self.time_in_force.as_ref())?;
        put_decimal(&mut params, "price", self.price);
        put_decimal(&mut params, "quantity", self.quantity);
        put_decimal(&mut params, "quoteOrderQty", self.quote_order_qty);
        put(
            &mut params,
            "newClientOrderId",
            self.new_client_order_id
                .clone()
                .unwrap_or_else(generate_client_order_id),
        );
        put_enum(&mut params, "newOrderRespType", self.new_order_resp_type.as_ref())?;
        put_decimal(&mut params, "stopPrice", self.stop_price);
        put_opt(&mut params, "trailingDelta", self.trailing_delta);
        put_decimal(&mut params, "icebergQty", self.iceberg_qty);
        put_opt(&mut params, "strategyId", self.strategy_id);
        put_opt(&mut params, "strategyType", self.strategy_type);
        put_enum(
            &mut params,
            "selfTradePreventionMode",
            self.self_trade_prevention_mode.as_ref(),
        )?;
        put_opt(&mut params, "recvWindow", self.recv_window);
        Ok(params)
    }
}

/// Parameters for `order.test`
#[derive(Debug, Clone)]
pub struct OrderTestRequest {
    order: OrderPlaceRequest,
    compute_commission_rates: bool,
}

impl OrderTestRequest {
    pub fn compute_commission_rates(mut self, compute: bool) -> Self {
        self.compute_commission_rates = compute;
        self
    }
}

impl WsApiCall for OrderTestRequest {
    /// Empty object, or commission rates when requested
    type Response = Value;

    fn method(&self) -> WsApiMethod {
        ORDER_TEST
    }

    fn params(&self) -> Result<Params, ExchangeError> {
        let mut params = self.order.params()?;
        if self.compute_commission_rates {
            put(&mut params, "computeCommissionRates", true);
        }
        Ok(params)
    }
}

/// Parameters for `sor.order.place`, limited to what smart order routing accepts
#[derive(Debug, Clone)]
pub struct SorOrderPlaceRequest {
    symbol: String,
    side: OrderSide,
    order_type: OrderType,
    quantity: Decimal,
    time_in_force: Option<TimeInForce>,
    price: Option<Decimal>,
    new_client_order_id: Option<String>,
    new_order_resp_type: Option<NewOrderRespType>,
    iceberg_qty: Option<Decimal>,
    strategy_id: Option<i64>,
    strategy_type: Option<i64>,
    self_trade_prevention_mode: Option<SelfTradePreventionMode>,
    recv_window: Option<u64>,
}

impl SorOrderPlaceRequest {
    pub fn new(
        symbol: impl Into<String>,
        side: OrderSide,
        order_type: OrderType,
        quantity: Decimal,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            order_type,
            quantity,
            time_in_force: None,
            price: None,
            new_client_order_id: None,
            new_order_resp_type: None,
            iceberg_qty: None,
            strategy_id: None,
            strategy_type: None,
            self_trade_prevention_mode: None,
            recv_window: None,
        }
    }

    pub fn time_in_force(mut self, time_in_force: TimeInForce) -> Self {
        self.time_in_force = Some(time_in_force);
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

    pub fn new_order_resp_type(mut self, resp_type: NewOrderRespType) -> Self {
        self.new_order_resp_type = Some(resp_type);
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

    pub fn self_trade_prevention_mode(mut self, mode: SelfTradePreventionMode) -> Self {
        self.self_trade_prevention_mode = Some(mode);
        self
    }

    pub fn recv_window(mut self, recv_window: u64) -> Self {
        self.recv_window = Some(recv_window);
        self
    }

    pub fn test(self) -> SorOrderTestRequest {
        SorOrderTestRequest {
            order: self,
            compute_commission_rates: false,
        }
    }
}

impl WsApiCall for SorOrderPlaceRequest {
    type Response = Vec<BinanceOrderResult>;

    fn method(&self) -> WsApiMethod {
        SOR_ORDER_PLACE
    }

    fn params(&self) -> Result<Params, ExchangeError> {
        if self.symbol.is_empty() {
            return Err(ExchangeError::InvalidParameters("symbol is required".to_string()));
        }

        let mut params = Params::new();
        put(&mut params, "symbol", self.symbol.as_str());
        put(&mut params, "side", wire_name(&self.side)?);
        put(&mut params, "type", wire_name(&self.order_type)?);
        put_decimal(&mut params, "quantity", Some(self.quantity));
        put_enum(&mut params, "timeInForce", self.time_in_force.as_ref())?;
        put_decimal(&mut params, "price", self.price);
        put(
            &mut params,
            "newClientOrderId",
            self.new_client_order_id
                .clone()
                .unwrap_or_else(generate_client_order_id),
        );
        put_enum(&mut params, "newOrderRespType", self.new_order_resp_type.as_ref())?;
        put_decimal(&mut params, "icebergQty", self.iceberg_qty);
        put_opt(&mut params, "strategyId", self.strategy_id);
        put_opt(&mut params, "strategyType", self.strategy_type);
        put_enum(
            &mut params,
            "selfTradePreventionMode",
            self.self_trade_prevention_mode.as_ref(),
        )?;
        put_opt(&mut params, "recvWindow", self.recv_window);
        Ok(params)
    }
}

/// Parameters for `sor.order.test`
#[derive(Debug, Clone)]
pub struct SorOrderTestRequest {
    order: SorOrderPlaceRequest,
    compute_commission_rates: bool,
}

impl SorOrderTestRequest {
    pub fn compute_commission_rates(mut self, compute: bool) -> Self {
        self.compute_commission_rates = compute;
        self
    }
}

impl WsApiCall for SorOrderTestRequest {
    type Response = Value;

    fn method(&self) -> WsApiMethod {
        SOR_ORDER_TEST
    }

    fn params(&self) -> Result<Params, ExchangeError> {
        let mut params = self.order.params()?;
        if self.compute_commission_rates {
            put(&mut params, "computeCommissionRates", true);
        }
        Ok(params)
    }
}

/// Parameters for `orderList.cancel`; one of `order_list_id` or `list_client_order_id` is required
#[derive(Debug, Clone, Default)]
pub struct OrderListCancelRequest {
    symbol: String,
    order_list_id: Option<i64>,
    list_client_order_id: Option<String>,
    new_client_order_id: Option<String>,
    recv_window: Option<u64>,
}

impl OrderListCancelRequest {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Self::default()
        }
    }

    pub fn order_list_id(mut self, order_list_id: i64) -> Self {
        self.order_list_id = Some(order_list_id);
        self
    }

    pub fn list_client_order_id(mut self, id: impl Into<String>) -> Self {
        self.list_client_order_id = Some(id.into());
        self
    }

    pub fn new_client_order_id(mut self, id: impl Into<String>) -> Self {
        self.new_client_order_id = Some(id.into());
        self
    }

    pub fn recv_window(mut self, recv_window: u64) -> Self {
        self.recv_window = Some(recv_window);
        self
    }
}

impl WsApiCall for OrderListCancelRequest {
    type Response = BinanceOrderListResult;

    fn method(&self) -> WsApiMethod {
        ORDER_LIST_CANCEL
    }

    fn params(&self) -> Result<Params, ExchangeError> {
        if self.order_list_id.is_none() && self.list_client_order_id.is_none() {
            return Err(ExchangeError::InvalidParameters(
                "either orderListId or listClientOrderId must be set".to_string(),
            ));
        }

        let mut params = Params::new();
        put(&mut params, "symbol", self.symbol.as_str());
        put_opt(&mut params, "orderListId", self.order_list_id);
        put_opt(&mut params, "listClientOrderId", self.list_client_order_id.clone());
        put_opt(&mut params, "newClientOrderId", self.new_client_order_id.clone());
        put_opt(&mut params, "recvWindow", self.recv_window);
        Ok(params)
    }
}

/// Parameters for `account.status`
#[derive(Debug, Clone, Default)]
pub struct AccountStatusRequest {
    omit_zero_balances: Option<bool>,
    recv_window: Option<u64>,
}

impl AccountStatusRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn omit_zero_balances(mut self, omit: bool) -> Self {
        self.omit_zero_balances = Some(omit);
        self
    }

    pub fn recv_window(mut self, recv_window: u64) -> Self {
        self.recv_window = Some(recv_window);
        self
    }
}

impl WsApiCall for AccountStatusRequest {
    type Response = BinanceAccountStatus;

    fn method(&self) -> WsApiMethod {
        ACCOUNT_STATUS
    }

    fn params(&self) -> Result<Params, ExchangeError> {
        let mut params = Params::new();
        put_opt(&mut params, "omitZeroBalances", self.omit_zero_balances);
        put_opt(&mut params, "recvWindow", self.recv_window);
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_order_place_params() {
        let request = OrderPlaceRequest::new("BTCUSDT", OrderSide::Buy, OrderType::Limit)
            .time_in_force(TimeInForce::GTC)
            .price(dec("23416.10000000"))
            .quantity(dec("0.00847"))
            .new_client_order_id("my-id")
            .recv_window(5000);
        let params = request.params().unwrap();

        assert_eq!(params["symbol"], "BTCUSDT");
        assert_eq!(params["side"], "BUY");
        assert_eq!(params["type"], "LIMIT");
        assert_eq!(params["timeInForce"], "GTC");
        assert_eq!(params["price"], "23416.1");
        assert_eq!(params["quantity"], "0.00847");
        assert_eq!(params["newClientOrderId"], "my-id");
        assert_eq!(params["recvWindow"], 5000);
        assert!(!params.contains_key("stopPrice"));
        assert_eq!(request.method(), ORDER_PLACE);
    }

    #[test]
    fn test_order_place_generates_client_order_id() {
        let params = OrderPlaceRequest::new("BTCUSDT", OrderSide::Sell, OrderType::Market)
            .quantity(dec("1"))
            .params()
            .unwrap();
        let id = params["newClientOrderId"].as_str().unwrap();
        assert_eq!(id.len(), 32);
    }

    #[test]
    fn test_order_test_uses_test_method() {
        let request = OrderPlaceRequest::new("BTCUSDT", OrderSide::Buy, OrderType::Market)
            .quantity(dec("1"))
            .test()
            .compute_commission_rates(true);
        assert_eq!(request.method(), ORDER_TEST);
        assert_eq!(request.params().unwrap()["computeCommissionRates"], true);
    }

    #[test]
    fn test_sor_order_params() {
        let request = SorOrderPlaceRequest::new("BTCUSDT", OrderSide::Buy, OrderType::Limit, dec("0.5"))
            .price(dec("31000"))
            .time_in_force(TimeInForce::IOC);
        let params = request.params().unwrap();
        assert_eq!(params["quantity"], "0.5");
        assert_eq!(params["timeInForce"], "IOC");
        assert_eq!(request.method(), SOR_ORDER_PLACE);
        assert_eq!(request.test().method(), SOR_ORDER_TEST);
    }

    #[test]
    fn test_order_list_cancel_requires_an_id() {
        let err = OrderListCancelRequest::new("BTCUSDT").params().unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidParameters(_)));

        let params = OrderListCancelRequest::new("BTCUSDT")
            .order_list_id(1274512)
            .params()
            .unwrap();
        assert_eq!(params["orderListId"], 1_274_512);
    }

    #[test]
    fn test_account_status_params() {
        let params = AccountStatusRequest::new().omit_zero_balances(true).params().unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(params["omitZeroBalances"], true);
    }
}
