use std::collections::HashSet;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::{Symbol, UtcDateTime, ValidationError};

pub const DEFAULT_CURRENCY: &str = "USD";

/// Instrument class stored alongside each snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    Stock,
    Crypto,
}

impl AssetType {
    /// Derive the class from the ticker suffix convention (`-USD` means crypto).
    pub fn from_symbol(symbol: &Symbol) -> Self {
        if symbol.is_crypto_pair() {
            Self::Crypto
        } else {
            Self::Stock
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stock => "stock",
            Self::Crypto => "crypto",
        }
    }
}

impl Display for AssetType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Latest price snapshot for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRecord {
    pub ticker_symbol: Symbol,
    pub name: String,
    pub asset_type: AssetType,
    pub current_price: f64,
    pub percent_change_today: f64,
    pub price_updated_at: UtcDateTime,
    pub currency: String,
}

impl QuoteRecord {
    /// Build a record, substituting defaults for blank name and currency.
    pub fn new(
        ticker_symbol: Symbol,
        name: impl Into<String>,
        current_price: f64,
        percent_change_today: f64,
        price_updated_at: UtcDateTime,
        currency: impl AsRef<str>,
    ) -> Result<Self, ValidationError> {
        if !current_price.is_finite() {
            return Err(ValidationError::NonFiniteValue {
                field: "current_price",
            });
        }
        if current_price < 0.0 {
            return Err(ValidationError::NegativeValue {
                field: "current_price",
            });
        }
        if !percent_change_today.is_finite() {
            return Err(ValidationError::NonFiniteValue {
                field: "percent_change_today",
            });
        }

        let name = name.into();
        let name = if name.trim().is_empty() {
            ticker_symbol.as_str().to_owned()
        } else {
            name.trim().to_owned()
        };
        let currency = currency.as_ref().trim();
        let currency = if currency.is_empty() {
            DEFAULT_CURRENCY.to_owned()
        } else {
            currency.to_owned()
        };

        Ok(Self {
            asset_type: AssetType::from_symbol(&ticker_symbol),
            ticker_symbol,
            name,
            current_price,
            percent_change_today,
            price_updated_at,
            currency,
        })
    }
}

/// Ordered, duplicate-free list of instruments for one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstrumentBatch {
    symbols: Vec<Symbol>,
}

impl InstrumentBatch {
    /// Keep the first occurrence of each symbol, preserving order.
    pub fn new(symbols: impl IntoIterator<Item = Symbol>) -> Self {
        let mut seen = HashSet::new();
        let symbols = symbols
            .into_iter()
            .filter(|symbol| seen.insert(symbol.clone()))
            .collect();
        Self { symbols }
    }

    /// Parse raw tickers; the first invalid entry fails the whole batch.
    pub fn parse<I, S>(raw: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let symbols = raw
            .into_iter()
            .map(|value| Symbol::parse(value.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(symbols))
    }

    /// Parse a ticker list with one entry per line in listing notation.
    ///
    /// Blank lines and lines starting with `#` are ignored.
    pub fn from_listing_text(text: &str) -> Result<Self, ValidationError> {
        let symbols = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(Symbol::from_listing)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(symbols))
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }
}
