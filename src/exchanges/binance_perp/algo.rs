use super::types::{
    AlgoOrderType, AlgoType, BinanceAlgoOrder, BinanceAlgoOrderCancel, PositionSide, WorkingType,
};
use crate::core::errors::ExchangeError;
use crate::core::types::{NewOrderRespType, OrderSide, Params, TimeInForce, WsApiMethod};
use crate::exchanges::binance::service::WsApiCall;
use crate::exchanges::binance::trading::{put, put_decimal, put_enum, put_opt};
use rust_decimal::Decimal;

pub const ALGO_ORDER_PLACE: WsApiMethod = WsApiMethod("algoOrder.place");
pub const ALGO_ORDER_CANCEL: WsApiMethod = WsApiMethod("algoOrder.cancel");

/// Parameters for `algoOrder.place`, a conditional order held until `trigger_price` is hit
#[derive(Debug, Clone)]
pub struct AlgoOrderPlaceRequest {
    algo_type: AlgoType,
    symbol: String,
    side: OrderSide,
    order_type: AlgoOrderType,
    trigger_price: Decimal,
    position_side: Option<PositionSide>,
    time_in_force: Option<TimeInForce>,
    quantity: Option<Decimal>,
    price: Option<Decimal>,
    working_type: Option<WorkingType>,
    close_position: Option<bool>,
    reduce_only: Option<bool>,
    new_client_order_id: Option<String>,
    new_order_resp_type: Option<NewOrderRespType>,
    recv_window: Option<u64>,
}

impl AlgoOrderPlaceRequest {
    pub fn new(
        symbol: impl Into<String>,
        side: OrderSide,
        order_type: AlgoOrderType,
        trigger_price: Decimal,
    ) -> Self {
        Self {
            algo_type: AlgoType::Conditional,
            symbol: symbol.into(),
            side,
            order_type,
            trigger_price,
            position_side: None,
            time_in_force: None,
            quantity: None,
            price: None,
            working_type: None,
            close_position: None,
            reduce_only: None,
            new_client_order_id: None,
            new_order_resp_type: None,
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

    pub fn price(mut self, price: Decimal) -> Self {
        self.price = Some(price);
        self
    }

    pub fn working_type(mut self, working_type: WorkingType) -> Self {
        self.working_type = Some(working_type);
        self
    }

    pub fn close_position(mut self, close_position: bool) -> Self {
        self.close_position = Some(close_position);
        self
    }

    pub fn reduce_only(mut self, reduce_only: bool) -> Self {
        self.reduce_only = Some(reduce_only);
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

    pub fn recv_window(mut self, recv_window: u64) -> Self {
        self.recv_window = Some(recv_window);
        self
    }
}

impl WsApiCall for AlgoOrderPlaceRequest {
    type Response = BinanceAlgoOrder;

    fn method(&self) -> WsApiMethod {
        ALGO_ORDER_PLACE
    }

    fn params(&self) -> Result<Params, ExchangeError> {
        if self.symbol.is_empty() {
            return Err(ExchangeError::InvalidParameters("symbol is required".to_string()));
        }
        if self.quantity.is_none() && self.close_position != Some(true) {
            return Err(ExchangeError::InvalidParameters(
                "quantity is required unless closePosition is set".to_string(),
            ));
        }

        let mut params = Params::new();
        put_enum(&mut params, "algoType", Some(&self.algo_type))?;
        put(&mut params, "symbol", self.symbol.as_str());
        put_enum(&mut params, "side", Some(&self.side))?;
        put_enum(&mut params, "type", Some(&self.order_type))?;
        put_decimal(&mut params, "triggerPrice", Some(self.trigger_price));
        put_enum(&mut params, "positionSide", self.position_side.as_ref())?;
        put_enum(&mut params, "timeInForce", self.time_in_force.as_ref())?;
        put_decimal(&mut params, "quantity", self.quantity);
        put_decimal(&mut params, "price", self.price);
        put_enum(&mut params, "workingType", self.working_type.as_ref())?;
        put_opt(&mut params, "closePosition", self.close_position);
        put_opt(&mut params, "reduceOnly", self.reduce_only);
        put_opt(&mut params, "newClientOrderId", self.new_client_order_id.clone());
        put_enum(&mut params, "newOrderRespType", self.new_order_resp_type.as_ref())?;
        put_opt(&mut params, "recvWindow", self.recv_window);
        Ok(params)
    }
}

/// Parameters for `algoOrder.cancel`; one of `algo_id` or `client_algo_id` is required
#[derive(Debug, Clone, Default)]
pub struct AlgoOrderCancelRequest {
    algo_id: Option<i64>,
    client_algo_id: Option<String>,
    recv_window: Option<u64>,
}

impl AlgoOrderCancelRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn algo_id(mut self, algo_id: i64) -> Self {
        self.algo_id = Some(algo_id);
        self
    }

    pub fn client_algo_id(mut self, id: impl Into<String>) -> Self {
        self.client_algo_id = Some(id.into());
        self
    }

    pub fn recv_window(mut self, recv_window: u64) -> Self {
        self.recv_window = Some(recv_window);
        self
    }
}

impl WsApiCall for AlgoOrderCancelRequest {
    type Response = BinanceAlgoOrderCancel;

    fn method(&self) -> WsApiMethod {
        ALGO_ORDER_CANCEL
    }

    fn params(&self) -> Result<Params, ExchangeError> {
        if self.algo_id.is_none() && self.client_algo_id.is_none() {
            return Err(ExchangeError::InvalidParameters(
                "either algoid or clientalgoid must be sent".to_string(),
            ));
        }

        // the exchange spells these two in lower case
        let mut params = Params::new();
        put_opt(&mut params, "algoid", self.algo_id);
        put_opt(&mut params, "clientalgoid", self.client_algo_id.clone());
        put_opt(&mut params, "recvWindow", self.recv_window);
        Ok(params)
    }
}
