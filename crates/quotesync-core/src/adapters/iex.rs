//! IEX-style REST adapter.
//!
//! Supports two modes: a real HTTP mode against an IEX-compatible API, and
//! a deterministic offline mode used by tests and local development. The
//! offline mode generates seeded data through the same normalization path
//! the real mode uses.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;
use time::macros::format_description;
use time::{Date, Duration, PrimitiveDateTime, Time};
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::domain::{CompanyDetails, QuoteSample, Symbol};
use crate::downloader::{DownloadError, MarketDownloader};
use crate::http::{HttpClient, HttpRequest, NoopHttpClient, ReqwestHttpClient};
use crate::market_hours::MarketHours;
use crate::retry::RetryPolicy;
use crate::throttle::RequestBudget;
use crate::tier::DownloadTier;

const DATE_FORMAT: &[time::format_description::BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]");
const MINUTE_FORMAT: &[time::format_description::BorrowedFormatItem<'static>] =
    format_description!("[hour]:[minute]");

type AdapterFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, DownloadError>> + Send + 'a>>;

/// Market downloader speaking the IEX REST dialect.
pub struct IexDownloader {
    http: Arc<dyn HttpClient>,
    clock: Arc<dyn Clock>,
    hours: MarketHours,
    base_url: String,
    token: Option<String>,
    budget: RequestBudget,
    retry: RetryPolicy,
    use_real_api: bool,
}

impl IexDownloader {
    /// Deterministic offline adapter; no socket is ever opened.
    pub fn offline() -> Self {
        Self {
            http: Arc::new(NoopHttpClient),
            clock: Arc::new(SystemClock::utc()),
            hours: MarketHours::default(),
            base_url: String::from("https://cloud.iexapis.test/v1"),
            token: None,
            budget: RequestBudget::default(),
            retry: RetryPolicy::none(),
            use_real_api: false,
        }
    }

    /// Real adapter against `base_url` authenticated by `token`.
    pub fn live(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: Arc::new(ReqwestHttpClient::new()),
            clock: Arc::new(SystemClock::utc()),
            hours: MarketHours::default(),
            base_url: base_url.into(),
            token: Some(token.into()),
            budget: RequestBudget::default(),
            retry: RetryPolicy::default(),
            use_real_api: true,
        }
    }

    pub fn with_http_client(mut self, http: Arc<dyn HttpClient>) -> Self {
        self.http = http;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_market_hours(mut self, hours: MarketHours) -> Self {
        self.hours = hours;
        self
    }

    pub fn with_budget(mut self, budget: RequestBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn endpoint(&self, symbol: &Symbol, resource: &str) -> String {
        let mut url = format!(
            "{}/stock/{}/{}",
            self.base_url,
            urlencoding::encode(symbol.as_str()),
            resource,
        );
        if let Some(token) = &self.token {
            url.push_str(&format!("?token={}", urlencoding::encode(token)));
        }
        url
    }

    /// Issue one GET within the request budget, retrying transient failures
    /// per the retry policy.
    async fn fetch_body(&self, url: &str) -> Result<String, DownloadError> {
        let mut attempt = 0;
        loop {
            if !self.budget.try_acquire() {
                return Err(DownloadError::rate_limited(
                    "request budget exhausted for this window",
                ));
            }

            debug!(url, attempt, "issuing provider request");
            let result = self.http.execute(HttpRequest::get(url)).await;

            let error = match result {
                Ok(response) if response.is_success() => return Ok(response.body),
                Ok(response) if response.status == 404 => {
                    return Err(DownloadError::not_found(format!(
                        "provider has no listing at {url}"
                    )));
                }
                Ok(response) if response.status == 429 => {
                    DownloadError::rate_limited("provider returned 429")
                }
                Ok(response) => DownloadError::unavailable(format!(
                    "provider returned status {}",
                    response.status
                )),
                Err(transport) if transport.retryable() => {
                    DownloadError::unavailable(format!("transport error: {transport}"))
                }
                Err(transport) => {
                    return Err(DownloadError::internal(format!(
                        "transport error: {transport}"
                    )));
                }
            };

            match self.retry.delay_for(attempt) {
                Some(delay) => {
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                None => return Err(error),
            }
        }
    }
}

impl MarketDownloader for IexDownloader {
    fn fetch_details<'a>(&'a self, symbol: &'a Symbol) -> AdapterFuture<'a, CompanyDetails> {
        Box::pin(async move {
            if self.use_real_api {
                let body = self.fetch_body(&self.endpoint(symbol, "company")).await?;
                let payload: IexCompanyPayload = parse_payload(&body)?;
                Ok(payload.into_details(symbol))
            } else {
                self.fetch_body(&self.endpoint(symbol, "company")).await?;
                Ok(fake_details(symbol))
            }
        })
    }

    fn fetch_window<'a>(
        &'a self,
        symbol: &'a Symbol,
        tier: DownloadTier,
    ) -> AdapterFuture<'a, Vec<QuoteSample>> {
        Box::pin(async move {
            let resource = format!("chart/{tier}");
            if self.use_real_api {
                let body = self.fetch_body(&self.endpoint(symbol, &resource)).await?;
                let rows: Vec<IexDayRow> = parse_payload(&body)?;
                Ok(rows.into_iter().filter_map(IexDayRow::into_sample).collect())
            } else {
                self.fetch_body(&self.endpoint(symbol, &resource)).await?;
                Ok(fake_day_window(symbol, tier, self.clock.today()))
            }
        })
    }

    fn fetch_intraday_minutes<'a>(
        &'a self,
        symbol: &'a Symbol,
    ) -> AdapterFuture<'a, Vec<QuoteSample>> {
        Box::pin(async move {
            if self.use_real_api {
                let body = self
                    .fetch_body(&self.endpoint(symbol, "intraday-prices"))
                    .await?;
                let rows: Vec<IexMinuteRow> = parse_payload(&body)?;
                Ok(rows
                    .into_iter()
                    .filter_map(IexMinuteRow::into_sample)
                    .collect())
            } else {
                self.fetch_body(&self.endpoint(symbol, "intraday-prices"))
                    .await?;
                Ok(fake_minute_session(symbol, self.clock.now(), self.hours))
            }
        })
    }

    fn fetch_previous_day<'a>(&'a self, symbol: &'a Symbol) -> AdapterFuture<'a, QuoteSample> {
        Box::pin(async move {
            if self.use_real_api {
                let body = self.fetch_body(&self.endpoint(symbol, "previous")).await?;
                let row: IexDayRow = parse_payload(&body)?;
                row.into_sample().ok_or_else(|| {
                    DownloadError::internal("previous-day payload failed validation")
                })
            } else {
                self.fetch_body(&self.endpoint(symbol, "previous")).await?;
                let yesterday = self.clock.today() - Duration::days(1);
                fake_day_sample(symbol, yesterday)
                    .ok_or_else(|| DownloadError::internal("offline sample failed validation"))
            }
        })
    }
}

fn parse_payload<'de, T: Deserialize<'de>>(body: &'de str) -> Result<T, DownloadError> {
    serde_json::from_str(body)
        .map_err(|error| DownloadError::internal(format!("malformed provider payload: {error}")))
}

// ============================================================================
// Real-mode payloads
// ============================================================================

#[derive(Debug, Deserialize)]
struct IexDayRow {
    date: String,
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: Option<f64>,
    volume: Option<u64>,
}

impl IexDayRow {
    fn into_sample(self) -> Option<QuoteSample> {
        let date = Date::parse(&self.date, DATE_FORMAT).ok()?;
        let settled = self.close.is_some();
        let close = self.close.or(self.open).unwrap_or(0.0);

        let sample = QuoteSample::day(date, self.open, self.high, self.low, close, self.volume)
            .ok()?;
        Some(if settled { sample } else { sample.invalid() })
    }
}

#[derive(Debug, Deserialize)]
struct IexMinuteRow {
    date: String,
    minute: String,
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: Option<f64>,
    volume: Option<u64>,
}

impl IexMinuteRow {
    fn into_sample(self) -> Option<QuoteSample> {
        let date = Date::parse(&self.date, DATE_FORMAT).ok()?;
        let minute = Time::parse(&self.minute, MINUTE_FORMAT).ok()?;
        let settled = self.close.is_some();
        let close = self.close.or(self.open).unwrap_or(0.0);

        let sample = QuoteSample::minute(
            PrimitiveDateTime::new(date, minute),
            self.open,
            self.high,
            self.low,
            close,
            self.volume,
        )
        .ok()?;
        Some(if settled { sample } else { sample.invalid() })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IexCompanyPayload {
    company_name: Option<String>,
    exchange: Option<String>,
    industry: Option<String>,
    website: Option<String>,
    description: Option<String>,
    #[serde(rename = "CEO")]
    ceo: Option<String>,
    security_name: Option<String>,
    issue_type: Option<String>,
    sector: Option<String>,
    employees: Option<u32>,
    #[serde(default)]
    tags: Vec<String>,
}

impl IexCompanyPayload {
    fn into_details(self, symbol: &Symbol) -> CompanyDetails {
        CompanyDetails {
            name: self
                .company_name
                .unwrap_or_else(|| symbol.as_str().to_owned()),
            exchange: self.exchange,
            industry: self.industry,
            website: self.website,
            description: self.description,
            chief_executive: self.ceo,
            security_name: self.security_name,
            issue_type: self.issue_type,
            sector: self.sector,
            employees: self.employees,
            tags: self.tags,
        }
    }
}

// ============================================================================
// Offline mode
// ============================================================================

fn symbol_seed(symbol: &Symbol) -> u64 {
    symbol
        .as_str()
        .bytes()
        .fold(1_469_598_103u64, |acc, byte| {
            (acc ^ u64::from(byte)).wrapping_mul(1_099_511_628_211)
        })
}

fn fake_day_sample(symbol: &Symbol, date: Date) -> Option<QuoteSample> {
    let seed = symbol_seed(symbol).wrapping_add(date.to_julian_day() as u64);
    let close = 40.0 + (seed % 4_000) as f64 / 20.0;

    QuoteSample::day(
        date,
        Some(close - 0.35),
        Some(close + 0.90),
        Some(close - 1.10),
        close,
        Some(10_000 + seed % 90_000),
    )
    .ok()
}

fn fake_day_window(symbol: &Symbol, tier: DownloadTier, today: Date) -> Vec<QuoteSample> {
    let mut samples = Vec::with_capacity(tier.span_days() as usize);
    let mut date = today - tier.span();
    let yesterday = today - Duration::days(1);

    while date <= yesterday {
        samples.extend(fake_day_sample(symbol, date));
        date += Duration::days(1);
    }
    samples
}

fn fake_minute_session(
    symbol: &Symbol,
    now: PrimitiveDateTime,
    hours: MarketHours,
) -> Vec<QuoteSample> {
    if now.time() < hours.open() {
        return Vec::new();
    }

    let seed = symbol_seed(symbol);
    let end = now.time().min(hours.close());
    let mut samples = Vec::new();
    let mut stamp = PrimitiveDateTime::new(now.date(), hours.open());

    while stamp.time() <= end {
        let wiggle = (seed.wrapping_add(stamp.time().minute() as u64) % 120) as f64 / 100.0;
        let close = 40.0 + (seed % 4_000) as f64 / 20.0 + wiggle;
        samples.extend(
            QuoteSample::minute(
                stamp,
                Some(close - 0.05),
                Some(close + 0.10),
                Some(close - 0.10),
                close,
                Some(500 + seed % 2_000),
            )
            .ok(),
        );
        stamp += Duration::minutes(1);
    }
    samples
}

fn fake_details(symbol: &Symbol) -> CompanyDetails {
    let seed = symbol_seed(symbol);
    CompanyDetails {
        name: format!("{} Incorporated", symbol.as_str()),
        exchange: Some(String::from("NASDAQ")),
        industry: Some(String::from("Software & Services")),
        website: Some(format!("https://{}.example.com", symbol.as_str().to_ascii_lowercase())),
        description: Some(format!("Offline listing for {}.", symbol.as_str())),
        chief_executive: Some(String::from("A. Founder")),
        security_name: Some(format!("{} Common Stock", symbol.as_str())),
        issue_type: Some(String::from("cs")),
        sector: Some(String::from("Technology")),
        employees: Some(1_000 + (seed % 200_000) as u32),
        tags: vec![String::from("Technology")],
    }
}
