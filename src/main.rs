use anyhow::Context;
use binance_wsapi::core::config::ExchangeConfig;
use binance_wsapi::core::kernel::new_request_id;
use binance_wsapi::core::types::{OrderSide, OrderType, TimeInForce};
use binance_wsapi::exchanges::binance::{connect_ws_api, AccountStatusRequest, OrderPlaceRequest};
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    // BINANCE_API_KEY / BINANCE_SECRET_KEY; set BINANCE_TESTNET=true for safety
    let config = ExchangeConfig::from_env("BINANCE").context("loading BINANCE_* settings")?;
    let service = connect_ws_api(config).await?;

    let status = service
        .sync_do(&new_request_id(), &AccountStatusRequest::new().omit_zero_balances(true))
        .await?;
    match status.into_result() {
        Ok(account) => info!(
            can_trade = account.can_trade,
            balances = account.balances.len(),
            "account status"
        ),
        Err(e) => warn!("account.status rejected: {}", e),
    }

    // order.test validates without touching the book; the response arrives on the read channel
    let mut responses = service
        .read_channel()
        .context("read channel already taken")?;
    let order = OrderPlaceRequest::new("BTCUSDT", OrderSide::Buy, OrderType::Limit)
        .time_in_force(TimeInForce::GTC)
        .quantity(Decimal::new(1, 3))
        .price(Decimal::new(10_000, 0))
        .test();
    service.do_async(&new_request_id(), &order).await?;

    if service.receive_all_data_before_stop(Duration::from_secs(5)).await {
        while let Ok(frame) = responses.try_recv() {
            info!("order.test response: {}", String::from_utf8_lossy(&frame));
        }
    } else {
        warn!("order.test response did not arrive in time");
    }

    service.close().await;
    Ok(())
}
