use std::collections::HashMap;

use super::models::SymbolInfo;

/// Two-way mapping between Binance market ids (`BTCUSDT`) and unified
/// symbols (`BTC/USDT`).
#[derive(Debug, Clone, Default)]
pub(crate) struct SymbolMap {
    by_id: HashMap<String, String>,
    by_symbol: HashMap<String, String>,
}

impl SymbolMap {
    pub fn from_markets(markets: &[SymbolInfo]) -> Self {
        let mut map = Self::default();
        for market in markets {
            let unified = market.unified();
            map.by_id.insert(market.symbol.clone(), unified.clone());
            map.by_symbol.insert(unified, market.symbol.clone());
        }
        map
    }

    /// Unified symbol for a market id; unknown ids pass through.
    pub fn unified(&self, market_id: &str) -> String {
        self.by_id
            .get(market_id)
            .cloned()
            .unwrap_or_else(|| market_id.to_string())
    }

    /// Market id for a unified symbol. Unknown symbols lose their separator.
    pub fn market_id(&self, symbol: &str) -> String {
        self.by_symbol
            .get(symbol)
            .cloned()
            .unwrap_or_else(|| symbol.replace('/', ""))
    }
}
