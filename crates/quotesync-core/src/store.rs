//! Store boundary consumed by the sync engine.
//!
//! The engine only reads snapshots and applies reconcile outcomes; the
//! backing store owns persistence, serializes its own writes, and upholds
//! the uniqueness and monotonic-validity invariants.

use thiserror::Error;

use crate::domain::{Company, CompanyId, Granularity, QuoteId, QuotePoint, Symbol};
use time::PrimitiveDateTime;

/// Predicate for listing companies by their sync opt-in flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompanyFilter {
    pub retrieve_quotes: Option<bool>,
    pub download_details: Option<bool>,
}

impl CompanyFilter {
    /// Every stored company.
    pub const fn any() -> Self {
        Self {
            retrieve_quotes: None,
            download_details: None,
        }
    }

    /// Companies opted in to quote synchronization.
    pub const fn quote_sync() -> Self {
        Self {
            retrieve_quotes: Some(true),
            download_details: None,
        }
    }

    /// Companies flagged for a detail refresh.
    pub const fn detail_sync() -> Self {
        Self {
            retrieve_quotes: None,
            download_details: Some(true),
        }
    }

    pub fn matches(&self, company: &Company) -> bool {
        self.retrieve_quotes
            .map_or(true, |wanted| company.retrieve_quotes == wanted)
            && self
                .download_details
                .map_or(true, |wanted| company.download_details == wanted)
    }
}

/// Errors surfaced by a store backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("company '{0}' is not stored")]
    UnknownCompany(CompanyId),
    #[error("a company with symbol '{0}' is already stored")]
    DuplicateSymbol(Symbol),
    #[error("company '{company}' already holds a {granularity} point at {stamp}")]
    DuplicateQuote {
        company: CompanyId,
        granularity: Granularity,
        stamp: PrimitiveDateTime,
    },
    #[error("quote '{0}' is not stored")]
    UnknownQuote(QuoteId),
    #[error("quote '{0}' is valid and cannot be regressed")]
    ValidityRegression(QuoteId),
    #[error("store backend failure: {0}")]
    Backend(String),
}

/// Persistence contract for companies and their quote series.
///
/// All methods are synchronous: the engine never holds a store handle
/// across a network suspension point, so a blocking backend is fine.
pub trait CompanyStore: Send + Sync {
    fn list_companies(&self, filter: CompanyFilter) -> Result<Vec<Company>, StoreError>;

    fn find_company(&self, id: CompanyId) -> Result<Option<Company>, StoreError>;

    fn find_company_by_symbol(&self, symbol: &Symbol) -> Result<Option<Company>, StoreError>;

    /// Full quote series for one company, ordered by granularity then stamp.
    fn quotes_for(&self, id: CompanyId) -> Result<Vec<QuotePoint>, StoreError>;

    /// Insert brand-new points. Fails on any `(company, granularity, stamp)`
    /// collision; nothing is partially applied on failure.
    fn add_quotes(&self, points: Vec<QuotePoint>) -> Result<(), StoreError>;

    /// Overwrite existing points in place, typically invalid-to-valid
    /// promotions. A stored valid point never reverts to invalid.
    fn update_quotes(&self, points: Vec<QuotePoint>) -> Result<(), StoreError>;

    fn update_company(&self, company: Company) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_select_on_individual_flags() {
        let symbol = Symbol::parse("AAPL").expect("valid symbol");
        let mut company = Company::new(symbol, "Apple Inc.");
        company.retrieve_quotes = true;

        assert!(CompanyFilter::any().matches(&company));
        assert!(CompanyFilter::quote_sync().matches(&company));
        assert!(!CompanyFilter::detail_sync().matches(&company));

        company.download_details = true;
        assert!(CompanyFilter::detail_sync().matches(&company));
    }
}
