use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ValidationError;

const MAX_SYMBOL_LEN: usize = 15;
const CRYPTO_SUFFIX: &str = "-USD";

/// Normalized provider ticker, e.g. `AAPL`, `BRK-B`, `BTC-USD`, `^GSPC`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Parse and normalize a symbol to uppercase.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptySymbol);
        }

        let normalized = trimmed.to_ascii_uppercase();
        let len = normalized.chars().count();
        if len > MAX_SYMBOL_LEN {
            return Err(ValidationError::SymbolTooLong {
                len,
                max: MAX_SYMBOL_LEN,
            });
        }

        if let Some(first) = normalized.chars().next() {
            if !(first.is_ascii_alphabetic() || first == '^') {
                return Err(ValidationError::SymbolInvalidStart { ch: first });
            }
        }

        for (index, ch) in normalized.chars().enumerate() {
            let valid = ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '^' | '=');
            if !valid {
                return Err(ValidationError::SymbolInvalidChar { ch, index });
            }
        }

        Ok(Self(normalized))
    }

    /// Parse a ticker written in exchange listing notation (`BRK.B`) into
    /// provider notation (`BRK-B`).
    pub fn from_listing(input: &str) -> Result<Self, ValidationError> {
        Self::parse(&input.trim().replace('.', "-"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Provider convention: pairs quoted against the dollar end in `-USD`.
    pub fn is_crypto_pair(&self) -> bool {
        self.0.ends_with(CRYPTO_SUFFIX) && self.0.len() > CRYPTO_SUFFIX.len()
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Symbol {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for Symbol {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_normalizes_symbol() {
        let parsed = Symbol::parse(" btc-usd ").expect("symbol should parse");
        assert_eq!(parsed.as_str(), "BTC-USD");
    }

    #[test]
    fn accepts_index_and_fx_notation() {
        assert!(Symbol::parse("^GSPC").is_ok());
        assert!(Symbol::parse("EURUSD=X").is_ok());
    }

    #[test]
    fn listing_notation_uses_dashes() {
        let parsed = Symbol::from_listing("brk.b").expect("symbol should parse");
        assert_eq!(parsed.as_str(), "BRK-B");
    }

    #[test]
    fn rejects_invalid_start() {
        let err = Symbol::parse("1AAPL").expect_err("must fail");
        assert!(matches!(err, ValidationError::SymbolInvalidStart { .. }));
    }

    #[test]
    fn rejects_invalid_chars() {
        let err = Symbol::parse("AAPL$").expect_err("must fail");
        assert!(matches!(err, ValidationError::SymbolInvalidChar { .. }));
    }

    #[test]
    fn crypto_pairs_need_a_base_asset() {
        assert!(Symbol::parse("ETH-USD").expect("valid").is_crypto_pair());
        assert!(!Symbol::parse("AAPL").expect("valid").is_crypto_pair());
        assert!(!Symbol::parse("USD").expect("valid").is_crypto_pair());
    }
}
