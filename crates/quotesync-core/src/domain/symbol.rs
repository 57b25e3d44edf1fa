use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ValidationError;

const MAX_TICKER_LEN: usize = 12;

/// Normalized, validated ticker symbol.
///
/// Symbols are uppercased on parse and are immutable once assigned to a
/// company.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Parse and normalize a raw ticker string.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let normalized = input.trim().to_ascii_uppercase();

        if normalized.is_empty() {
            return Err(ValidationError::EmptySymbol);
        }
        if normalized.chars().count() > MAX_TICKER_LEN {
            return Err(ValidationError::SymbolTooLong {
                value: normalized,
                max: MAX_TICKER_LEN,
            });
        }

        let mut chars = normalized.chars();
        match chars.next() {
            Some(first) if !first.is_ascii_alphabetic() => {
                return Err(ValidationError::SymbolInvalidStart { value: normalized });
            }
            _ => {}
        }
        if let Some(ch) = normalized
            .chars()
            .find(|ch| !ch.is_ascii_alphanumeric() && *ch != '.' && *ch != '-')
        {
            return Err(ValidationError::SymbolInvalidChar {
                value: normalized.clone(),
                ch,
            });
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
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
