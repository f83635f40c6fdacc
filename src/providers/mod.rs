pub mod exchange_rate;
pub mod steam_store;

pub use exchange_rate::ExchangeRateProvider;
pub use steam_store::SteamStoreProvider;
