use crate::config::MAX_SELECTED_PER_CATEGORY;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Category {
    Stocks,
    Forex,
    Indices,
}

impl Category {
    pub fn all() -> &'static [Category] {
        &[Category::Stocks, Category::Forex, Category::Indices]
    }

    pub fn title(self) -> &'static str {
        match self {
            Category::Stocks => "Stocks",
            Category::Forex => "Forex",
            Category::Indices => "Indices",
        }
    }
}

/// Outcome of a checkbox toggle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
    /// The category already holds the maximum; the list is unchanged.
    RejectedFull,
}

/// The user's chosen symbols per category. Order is insertion order, symbols
/// are unique within a category, and each list holds at most
/// `MAX_SELECTED_PER_CATEGORY` entries.
///
/// Serializes to the `/api/market-data` request body.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SelectionState {
    pub stocks: Vec<String>,
    pub forex: Vec<String>,
    pub indices: Vec<String>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn symbols(&self, category: Category) -> &[String] {
        match category {
            Category::Stocks => &self.stocks,
            Category::Forex => &self.forex,
            Category::Indices => &self.indices,
        }
    }

    fn symbols_mut(&mut self, category: Category) -> &mut Vec<String> {
        match category {
            Category::Stocks => &mut self.stocks,
            Category::Forex => &mut self.forex,
            Category::Indices => &mut self.indices,
        }
    }

    pub fn contains(&self, category: Category, symbol: &str) -> bool {
        self.symbols(category).iter().any(|s| s == symbol)
    }

    pub fn count(&self, category: Category) -> usize {
        self.symbols(category).len()
    }

    pub fn total_selected(&self) -> usize {
        self.stocks.len() + self.forex.len() + self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total_selected() == 0
    }

    /// Add or remove a symbol. Adding to a full category is rejected and
    /// leaves the list untouched; adding an already-present symbol is a
    /// no-op reported as `Added`.
    pub fn toggle(&mut self, category: Category, symbol: &str) -> ToggleOutcome {
        let list = self.symbols_mut(category);
        if let Some(pos) = list.iter().position(|s| s == symbol) {
            list.remove(pos);
            return ToggleOutcome::Removed;
        }
        if list.len() >= MAX_SELECTED_PER_CATEGORY {
            return ToggleOutcome::RejectedFull;
        }
        list.push(symbol.to_string());
        ToggleOutcome::Added
    }

    /// Fill each empty category with its first `MAX_SELECTED_PER_CATEGORY`
    /// catalog symbols. Used when the market tab is first opened with
    /// nothing selected.
    pub fn select_defaults(&mut self, catalog: &crate::api::AssetCatalog) {
        for &category in Category::all() {
            if !self.symbols(category).is_empty() {
                continue;
            }
            let assets = catalog.assets(category);
            let list = self.symbols_mut(category);
            for asset in assets.iter().take(MAX_SELECTED_PER_CATEGORY) {
                list.push(asset.symbol.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Asset, AssetCatalog};

    fn asset(symbol: &str) -> Asset {
        Asset {
            symbol: symbol.to_string(),
            name: format!("{} Inc.", symbol),
        }
    }

    #[test]
    fn test_toggle_adds_and_removes() {
        let mut sel = SelectionState::new();
        assert_eq!(sel.toggle(Category::Stocks, "AAPL"), ToggleOutcome::Added);
        assert!(sel.contains(Category::Stocks, "AAPL"));
        assert_eq!(sel.toggle(Category::Stocks, "AAPL"), ToggleOutcome::Removed);
        assert!(sel.is_empty());
    }

    #[test]
    fn test_sixth_selection_rejected() {
        let mut sel = SelectionState::new();
        for sym in ["AAPL", "MSFT", "GOOGL", "AMZN", "TSLA"] {
            assert_eq!(sel.toggle(Category::Stocks, sym), ToggleOutcome::Added);
        }
        assert_eq!(sel.toggle(Category::Stocks, "META"), ToggleOutcome::RejectedFull);
        assert_eq!(sel.count(Category::Stocks), 5);
        assert!(!sel.contains(Category::Stocks, "META"));
    }

    #[test]
    fn test_cap_is_per_category() {
        let mut sel = SelectionState::new();
        for sym in ["AAPL", "MSFT", "GOOGL", "AMZN", "TSLA"] {
            sel.toggle(Category::Stocks, sym);
        }
        assert_eq!(sel.toggle(Category::Forex, "EURUSD=X"), ToggleOutcome::Added);
    }

    #[test]
    fn test_toggle_twice_restores_order() {
        let mut sel = SelectionState::new();
        sel.toggle(Category::Indices, "^GSPC");
        sel.toggle(Category::Indices, "^DJI");
        sel.toggle(Category::Indices, "^IXIC");
        let before: Vec<String> = sel.indices.clone();

        sel.toggle(Category::Indices, "^DJI");
        sel.toggle(Category::Indices, "^DJI");
        assert_ne!(sel.indices, before); // removed then re-appended at the end
        assert_eq!(sel.indices, vec!["^GSPC", "^IXIC", "^DJI"]);

        // check/uncheck of a new symbol leaves the list exactly as it was
        let before: Vec<String> = sel.indices.clone();
        sel.toggle(Category::Indices, "^FTSE");
        sel.toggle(Category::Indices, "^FTSE");
        assert_eq!(sel.indices, before);
    }

    #[test]
    fn test_select_defaults_takes_first_five() {
        let catalog = AssetCatalog {
            stocks: ["AAPL", "MSFT", "GOOGL", "AMZN", "TSLA", "META", "NVDA"]
                .iter()
                .map(|s| asset(s))
                .collect(),
            forex: vec![asset("EURUSD=X"), asset("GBPUSD=X")],
            indices: vec![],
        };
        let mut sel = SelectionState::new();
        sel.toggle(Category::Forex, "USDJPY=X");
        sel.select_defaults(&catalog);

        assert_eq!(sel.stocks, vec!["AAPL", "MSFT", "GOOGL", "AMZN", "TSLA"]);
        // non-empty categories are left alone
        assert_eq!(sel.forex, vec!["USDJPY=X"]);
        assert!(sel.indices.is_empty());
    }

    #[test]
    fn test_serializes_to_wire_shape() {
        let mut sel = SelectionState::new();
        sel.toggle(Category::Stocks, "AAPL");
        sel.toggle(Category::Forex, "EURUSD=X");
        let json = serde_json::to_value(&sel).unwrap();
        assert_eq!(json["stocks"][0], "AAPL");
        assert_eq!(json["forex"][0], "EURUSD=X");
        assert_eq!(json["indices"].as_array().unwrap().len(), 0);
    }
}
