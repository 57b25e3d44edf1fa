use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use quotesync_core::{
    Company, CompanyFilter, CompanyId, CompanyStore, QuoteKey, QuotePoint, StoreError, Symbol,
};

#[derive(Default)]
struct Inner {
    companies: HashMap<CompanyId, Company>,
    // Quote rows keyed under their owning company; a company's series
    // cannot outlive it and iterates in (granularity, stamp) order.
    quotes: HashMap<CompanyId, BTreeMap<QuoteKey, QuotePoint>>,
}

/// In-memory store guarded by a single `RwLock`, which serializes writes
/// the way the engine expects of any backend.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a company. Symbols are unique across the store.
    pub fn insert_company(&self, company: Company) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        if inner
            .companies
            .values()
            .any(|existing| existing.symbol == company.symbol)
        {
            return Err(StoreError::DuplicateSymbol(company.symbol));
        }
        inner.quotes.entry(company.id).or_default();
        inner.companies.insert(company.id, company);
        Ok(())
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Inner>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Backend(String::from("store lock poisoned")))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Inner>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::Backend(String::from("store lock poisoned")))
    }
}

impl CompanyStore for MemoryStore {
    fn list_companies(&self, filter: CompanyFilter) -> Result<Vec<Company>, StoreError> {
        let inner = self.read()?;
        let mut companies: Vec<Company> = inner
            .companies
            .values()
            .filter(|company| filter.matches(company))
            .cloned()
            .collect();
        companies.sort_by(|a, b| a.symbol.as_str().cmp(b.symbol.as_str()));
        Ok(companies)
    }

    fn find_company(&self, id: CompanyId) -> Result<Option<Company>, StoreError> {
        Ok(self.read()?.companies.get(&id).cloned())
    }

    fn find_company_by_symbol(&self, symbol: &Symbol) -> Result<Option<Company>, StoreError> {
        Ok(self
            .read()?
            .companies
            .values()
            .find(|company| company.symbol == *symbol)
            .cloned())
    }

    fn quotes_for(&self, id: CompanyId) -> Result<Vec<QuotePoint>, StoreError> {
        let inner = self.read()?;
        let series = inner
            .quotes
            .get(&id)
            .ok_or(StoreError::UnknownCompany(id))?;
        Ok(series.values().cloned().collect())
    }

    fn add_quotes(&self, points: Vec<QuotePoint>) -> Result<(), StoreError> {
        let mut inner = self.write()?;

        // Validate the whole batch before touching anything so a rejected
        // point does not leave a partial insert behind.
        for point in &points {
            let series = inner
                .quotes
                .get(&point.company_id)
                .ok_or(StoreError::UnknownCompany(point.company_id))?;
            if series.contains_key(&point.key()) {
                return Err(StoreError::DuplicateQuote {
                    company: point.company_id,
                    granularity: point.granularity,
                    stamp: point.stamp,
                });
            }
        }

        for point in points {
            inner
                .quotes
                .get_mut(&point.company_id)
                .expect("batch was validated against this company")
                .insert(point.key(), point);
        }
        Ok(())
    }

    fn update_quotes(&self, points: Vec<QuotePoint>) -> Result<(), StoreError> {
        let mut inner = self.write()?;

        for point in points {
            let series = inner
                .quotes
                .get_mut(&point.company_id)
                .ok_or(StoreError::UnknownCompany(point.company_id))?;
            let stored = series
                .get_mut(&point.key())
                .ok_or(StoreError::UnknownQuote(point.id))?;
            if stored.is_valid && !point.is_valid {
                return Err(StoreError::ValidityRegression(stored.id));
            }
            *stored = point;
        }
        Ok(())
    }

    fn update_company(&self, company: Company) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        if !inner.companies.contains_key(&company.id) {
            return Err(StoreError::UnknownCompany(company.id));
        }
        inner.companies.insert(company.id, company);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use quotesync_core::QuoteSample;

    use super::*;

    fn seeded_company(ticker: &str) -> Company {
        let symbol = Symbol::parse(ticker).expect("valid symbol");
        let mut company = Company::new(symbol, ticker);
        company.retrieve_quotes = true;
        company
    }

    fn day_point(company: &Company, day: u8, close: f64) -> QuotePoint {
        let sample = QuoteSample::day(
            date!(2026-03-01).replace_day(day).expect("valid day"),
            None,
            None,
            None,
            close,
            None,
        )
        .expect("sample should validate");
        QuotePoint::from_sample(company.id, sample)
    }

    #[test]
    fn rejects_duplicate_symbols() {
        let store = MemoryStore::new();
        store
            .insert_company(seeded_company("AAPL"))
            .expect("first insert succeeds");

        let err = store
            .insert_company(seeded_company("AAPL"))
            .expect_err("must fail");
        assert!(matches!(err, StoreError::DuplicateSymbol(_)));
    }

    #[test]
    fn listing_filters_on_flags_and_sorts_by_symbol() {
        let store = MemoryStore::new();
        let mut idle = seeded_company("MSFT");
        idle.retrieve_quotes = false;
        store.insert_company(idle).expect("insert succeeds");
        store
            .insert_company(seeded_company("GPRO"))
            .expect("insert succeeds");
        store
            .insert_company(seeded_company("AAPL"))
            .expect("insert succeeds");

        let synced = store
            .list_companies(CompanyFilter::quote_sync())
            .expect("list succeeds");
        let symbols: Vec<&str> = synced.iter().map(|c| c.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AAPL", "GPRO"]);
    }

    #[test]
    fn add_quotes_upholds_the_uniqueness_invariant() {
        let store = MemoryStore::new();
        let company = seeded_company("AAPL");
        store.insert_company(company.clone()).expect("insert succeeds");

        let point = day_point(&company, 2, 10.0);
        store
            .add_quotes(vec![point.clone()])
            .expect("first add succeeds");

        let err = store
            .add_quotes(vec![day_point(&company, 3, 11.0), day_point(&company, 2, 12.0)])
            .expect_err("duplicate stamp must fail");
        assert!(matches!(err, StoreError::DuplicateQuote { .. }));

        // The whole batch was rejected, including the fresh day-3 point.
        let series = store.quotes_for(company.id).expect("series readable");
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn update_quotes_never_regresses_a_valid_point() {
        let store = MemoryStore::new();
        let company = seeded_company("AAPL");
        store.insert_company(company.clone()).expect("insert succeeds");

        let point = day_point(&company, 2, 10.0);
        store.add_quotes(vec![point.clone()]).expect("add succeeds");

        let regressed = QuotePoint {
            is_valid: false,
            ..point
        };
        let err = store
            .update_quotes(vec![regressed])
            .expect_err("regression must fail");
        assert!(matches!(err, StoreError::ValidityRegression(_)));
    }

    #[test]
    fn promotion_overwrites_an_invalid_point_in_place() {
        let store = MemoryStore::new();
        let company = seeded_company("AAPL");
        store.insert_company(company.clone()).expect("insert succeeds");

        let invalid = QuotePoint {
            is_valid: false,
            ..day_point(&company, 2, 10.0)
        };
        store.add_quotes(vec![invalid.clone()]).expect("add succeeds");

        let promoted = QuotePoint {
            is_valid: true,
            close: 10.5,
            ..invalid
        };
        store
            .update_quotes(vec![promoted])
            .expect("promotion succeeds");

        let series = store.quotes_for(company.id).expect("series readable");
        assert_eq!(series.len(), 1);
        assert!(series[0].is_valid);
        assert_eq!(series[0].close, 10.5);
    }

    #[test]
    fn quotes_require_their_company() {
        let store = MemoryStore::new();
        let orphan = seeded_company("AAPL");

        let err = store
            .add_quotes(vec![day_point(&orphan, 2, 10.0)])
            .expect_err("must fail");
        assert!(matches!(err, StoreError::UnknownCompany(_)));
    }

    #[test]
    fn updating_an_unknown_company_fails() {
        let store = MemoryStore::new();
        let err = store
            .update_company(seeded_company("AAPL"))
            .expect_err("must fail");
        assert!(matches!(err, StoreError::UnknownCompany(_)));
    }
}
