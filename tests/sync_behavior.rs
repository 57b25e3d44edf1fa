//! Behavior-driven tests for the quote synchronization orchestrator.
//!
//! These tests verify HOW a sync pass behaves end to end: gating, window
//! selection, reconciliation, incremental persistence, and partial-failure
//! isolation across companies.

use std::sync::Arc;

use time::macros::{date, datetime};
use time::PrimitiveDateTime;

use quotesync_core::{FixedClock, SyncOrchestrator, SyncReport};
use quotesync_tests::*;

fn orchestrator(
    downloader: ScriptedDownloader,
    store: Arc<MemoryStore>,
    now: PrimitiveDateTime,
) -> SyncOrchestrator {
    SyncOrchestrator::new(Arc::new(downloader), store, Arc::new(FixedClock::at(now)))
}

fn seed_days(store: &MemoryStore, company: &Company, samples: Vec<QuoteSample>) {
    let points = samples
        .into_iter()
        .map(|sample| QuotePoint::from_sample(company.id, sample))
        .collect();
    store.add_quotes(points).expect("seeding must succeed");
}

// =============================================================================
// Partial-failure isolation
// =============================================================================

#[tokio::test]
async fn when_one_symbol_fails_the_others_still_persist() {
    // Given: three companies with no history, one of which the provider
    // cannot serve.
    let store = Arc::new(MemoryStore::new());
    let aapl = quote_company("AAPL");
    let bby = quote_company("BBY");
    let cat = quote_company("CAT");
    for company in [&aapl, &bby, &cat] {
        store.insert_company(company.clone()).expect("seed company");
    }

    let downloader = ScriptedDownloader::new()
        .with_window("AAPL", Ok(day_series(date!(2026-02-10), 3)))
        .with_window("BBY", Err(DownloadError::unavailable("provider outage")))
        .with_window("CAT", Ok(day_series(date!(2026-02-10), 2)));

    // When: a full pass runs before the market opens.
    let result = orchestrator(downloader, store.clone(), datetime!(2026-03-02 08:00))
        .sync_all()
        .await;

    // Then: exactly one aggregate error mentioning only the failed symbol,
    // while the other companies' quotes are already persisted.
    let (report, failures) = match result {
        Err(SyncError::Partial { report, failures }) => (report, failures),
        other => panic!("expected a partial failure, got {other:?}"),
    };

    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].symbol.as_str(), "BBY");
    assert!(matches!(failures[0].error, UnitError::Download(_)));

    assert_eq!(report.companies, 3);
    assert_eq!(report.units, 3);
    assert_eq!(report.points_added, 5);

    assert_eq!(store.quotes_for(aapl.id).expect("readable").len(), 3);
    assert_eq!(store.quotes_for(bby.id).expect("readable").len(), 0);
    assert_eq!(store.quotes_for(cat.id).expect("readable").len(), 2);
}

// =============================================================================
// Incremental download windows
// =============================================================================

#[tokio::test]
async fn when_no_history_exists_a_month_is_backfilled_without_duplicates() {
    // Given: a company with an empty series.
    let store = Arc::new(MemoryStore::new());
    let company = quote_company("AAPL");
    store.insert_company(company.clone()).expect("seed company");

    let downloader = ScriptedDownloader::new()
        .with_window("AAPL", Ok(day_series(date!(2026-02-01), 30)));

    // When: the pass runs with nothing stored.
    let report = orchestrator(downloader, store.clone(), datetime!(2026-03-02 08:00))
        .sync_all()
        .await
        .expect("pass should succeed");

    // Then: the default one-month window is requested and stored intact.
    assert_eq!(report, SyncReport {
        companies: 1,
        units: 1,
        points_added: 30,
        points_updated: 0,
    });
    assert_eq!(store.quotes_for(company.id).expect("readable").len(), 30);
}

#[tokio::test]
async fn when_a_window_overlaps_stored_history_only_new_dates_are_added() {
    // Given: ten stored days ending 2026-02-10.
    let store = Arc::new(MemoryStore::new());
    let company = quote_company("AAPL");
    store.insert_company(company.clone()).expect("seed company");
    seed_days(&store, &company, day_series(date!(2026-02-01), 10));

    // Provider redelivers 2026-02-05 through 2026-02-19.
    let downloader = ScriptedDownloader::new()
        .with_window("AAPL", Ok(day_series(date!(2026-02-05), 15)));

    // When: the pass runs ten days later.
    let report = orchestrator(downloader, store.clone(), datetime!(2026-02-20 08:00))
        .sync_all()
        .await
        .expect("pass should succeed");

    // Then: only the nine unseen dates landed.
    assert_eq!(report.points_added, 9);
    assert_eq!(report.points_updated, 0);
    assert_eq!(store.quotes_for(company.id).expect("readable").len(), 19);
}

#[tokio::test]
async fn when_the_same_batch_is_redelivered_nothing_is_added() {
    let store = Arc::new(MemoryStore::new());
    let company = quote_company("AAPL");
    store.insert_company(company.clone()).expect("seed company");
    seed_days(&store, &company, day_series(date!(2026-02-05), 15));

    // The provider serves the identical fifteen days again.
    let downloader = ScriptedDownloader::new()
        .with_window("AAPL", Ok(day_series(date!(2026-02-05), 15)));

    let report = orchestrator(downloader, store.clone(), datetime!(2026-02-22 08:00))
        .sync_all()
        .await
        .expect("pass should succeed");

    assert_eq!(report.units, 1);
    assert_eq!(report.points_added, 0);
    assert_eq!(store.quotes_for(company.id).expect("readable").len(), 15);
}

#[tokio::test]
async fn when_only_yesterday_is_missing_the_previous_day_endpoint_is_used() {
    // Given: day history through yesterday-1 is complete and today's minute
    // session already runs through the close.
    let store = Arc::new(MemoryStore::new());
    let company = quote_company("AAPL");
    store.insert_company(company.clone()).expect("seed company");
    seed_days(&store, &company, day_series(date!(2026-02-25), 5)); // ends 2026-03-01
    seed_days(
        &store,
        &company,
        minute_series(datetime!(2026-03-02 09:30), 390), // ends 15:59
    );

    let downloader = ScriptedDownloader::new()
        .with_previous("AAPL", Ok(day_sample(date!(2026-03-02), 13.0)));

    // When: the pass runs after the close.
    let orchestrator = orchestrator(downloader, store.clone(), datetime!(2026-03-02 18:00));
    let report = orchestrator.sync_all().await.expect("pass should succeed");

    // Then: a single previous-day call fills the gap; the complete minute
    // session is left alone.
    assert_eq!(report.units, 1);
    assert_eq!(report.points_added, 1);
}

// =============================================================================
// Minute-granularity follow-along
// =============================================================================

#[tokio::test]
async fn when_the_session_is_live_only_fresh_minutes_are_fetched() {
    // Given: yesterday's settlement stored, minute series through 11:59.
    let store = Arc::new(MemoryStore::new());
    let company = quote_company("AAPL");
    store.insert_company(company.clone()).expect("seed company");
    seed_days(&store, &company, vec![day_sample(date!(2026-03-01), 12.0)]);
    seed_days(
        &store,
        &company,
        minute_series(datetime!(2026-03-02 09:30), 150), // ends 11:59
    );

    let downloader = ScriptedDownloader::new()
        .with_minutes("AAPL", Ok(minute_series(datetime!(2026-03-02 09:30), 151)));
    let recorded_handle = Arc::new(downloader);

    // When: the pass runs at noon.
    let orchestrator = SyncOrchestrator::new(
        recorded_handle.clone(),
        store.clone(),
        Arc::new(FixedClock::at(datetime!(2026-03-02 12:00))),
    );
    let report = orchestrator.sync_all().await.expect("pass should succeed");

    // Then: one minute unit ran, no day window was requested, and only the
    // 12:00 bar is new.
    assert_eq!(recorded_handle.recorded(), vec![String::from("minutes:AAPL")]);
    assert_eq!(report.units, 1);
    assert_eq!(report.points_added, 1);
}

// =============================================================================
// Validity reconciliation
// =============================================================================

#[tokio::test]
async fn when_a_valid_reading_arrives_an_invalid_point_is_promoted() {
    // Given: a valid point for Feb 26 and a partial one for Feb 27.
    let store = Arc::new(MemoryStore::new());
    let company = quote_company("AAPL");
    store.insert_company(company.clone()).expect("seed company");
    seed_days(&store, &company, vec![day_sample(date!(2026-02-26), 10.0)]);
    seed_days(
        &store,
        &company,
        vec![day_sample(date!(2026-02-27), 9.0).invalid()],
    );

    // Provider redelivers both days settled, plus two new ones.
    let downloader = ScriptedDownloader::new().with_window(
        "AAPL",
        Ok(vec![
            day_sample(date!(2026-02-26), 99.0),
            day_sample(date!(2026-02-27), 11.5),
            day_sample(date!(2026-02-28), 12.0),
            day_sample(date!(2026-03-01), 12.5),
        ]),
    );

    // When: the pass runs before the next open.
    let report = orchestrator(downloader, store.clone(), datetime!(2026-03-02 08:00))
        .sync_all()
        .await
        .expect("pass should succeed");

    // Then: the invalid point was promoted with the downloaded values, the
    // valid point was left untouched, and the new dates were added.
    assert_eq!(report.points_added, 2);
    assert_eq!(report.points_updated, 1);

    let series = store.quotes_for(company.id).expect("readable");
    let feb26 = series
        .iter()
        .find(|p| p.stamp.date() == date!(2026-02-26))
        .expect("point exists");
    let feb27 = series
        .iter()
        .find(|p| p.stamp.date() == date!(2026-02-27))
        .expect("point exists");

    assert_eq!(feb26.close, 10.0, "valid stored data is authoritative");
    assert_eq!(feb27.close, 11.5);
    assert!(feb27.is_valid);
}

// =============================================================================
// Single-company operations
// =============================================================================

#[tokio::test]
async fn when_the_company_id_is_unknown_the_call_fails_alone() {
    let store = Arc::new(MemoryStore::new());
    let orchestrator = orchestrator(
        ScriptedDownloader::new(),
        store,
        datetime!(2026-03-02 08:00),
    );

    let error = orchestrator
        .sync_company(CompanyId::generate())
        .await
        .expect_err("must fail");
    assert!(matches!(error, SyncError::UnknownCompany(_)));
}

#[tokio::test]
async fn syncing_one_company_ignores_its_opt_in_flag() {
    // A direct per-company sync works even when the company is excluded
    // from full passes.
    let store = Arc::new(MemoryStore::new());
    let mut company = quote_company("AAPL");
    company.retrieve_quotes = false;
    store.insert_company(company.clone()).expect("seed company");

    let downloader = ScriptedDownloader::new()
        .with_window("AAPL", Ok(day_series(date!(2026-02-10), 4)));

    let report = orchestrator(downloader, store.clone(), datetime!(2026-03-02 08:00))
        .sync_company(company.id)
        .await
        .expect("pass should succeed");

    assert_eq!(report.points_added, 4);
}

#[tokio::test]
async fn excluded_companies_are_skipped_by_the_full_pass() {
    let store = Arc::new(MemoryStore::new());
    let mut company = quote_company("AAPL");
    company.retrieve_quotes = false;
    store.insert_company(company.clone()).expect("seed company");

    let report = orchestrator(
        ScriptedDownloader::new(),
        store.clone(),
        datetime!(2026-03-02 08:00),
    )
    .sync_all()
    .await
    .expect("pass should succeed");

    assert_eq!(report.companies, 0);
    assert_eq!(report.units, 0);
    assert!(store.quotes_for(company.id).expect("readable").is_empty());
}

#[tokio::test]
async fn a_current_series_produces_a_quiet_pass() {
    // Day point from yesterday before the open: nothing to do.
    let store = Arc::new(MemoryStore::new());
    let company = quote_company("AAPL");
    store.insert_company(company.clone()).expect("seed company");
    seed_days(&store, &company, vec![day_sample(date!(2026-03-01), 12.0)]);

    let report = orchestrator(
        ScriptedDownloader::new(),
        store.clone(),
        datetime!(2026-03-02 08:00),
    )
    .sync_all()
    .await
    .expect("pass should succeed");

    assert_eq!(report.units, 0);
    assert_eq!(report.points_added, 0);
}

#[tokio::test]
async fn downloading_a_company_validates_the_ticker_first() {
    let store = Arc::new(MemoryStore::new());
    let orchestrator = orchestrator(
        ScriptedDownloader::new().with_details("NFLX", Ok(details_for("NFLX"))),
        store.clone(),
        datetime!(2026-03-02 08:00),
    );

    let error = orchestrator
        .download_company("  ")
        .await
        .expect_err("blank ticker must fail");
    assert!(matches!(error, SyncError::Symbol(_)));

    let details = orchestrator
        .download_company("nflx")
        .await
        .expect("download should succeed");
    assert_eq!(details.name, "NFLX Incorporated");

    // Nothing was persisted on behalf of the caller.
    assert!(store
        .list_companies(CompanyFilter::any())
        .expect("list succeeds")
        .is_empty());
}
