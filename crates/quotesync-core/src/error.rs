use thiserror::Error;

/// Validation and contract errors exposed by `quotesync-core`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol '{value}' is longer than {max} characters")]
    SymbolTooLong { value: String, max: usize },
    #[error("symbol '{value}' must start with an ASCII letter")]
    SymbolInvalidStart { value: String },
    #[error("symbol '{value}' contains invalid character '{ch}'")]
    SymbolInvalidChar { value: String, ch: char },

    #[error("price field '{field}' must be finite")]
    NonFinitePrice { field: &'static str },
    #[error("price field '{field}' must be non-negative")]
    NegativePrice { field: &'static str },
    #[error("high {high} is below low {low}")]
    InvalidPriceRange { high: f64, low: f64 },

    #[error("market window must open before it closes")]
    InvalidMarketWindow,

    #[error("invalid download tier '{value}'")]
    InvalidTier { value: String },
}
