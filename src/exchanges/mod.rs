pub mod binance;
pub mod binance_perp;
pub mod binance_portfolio;
