//! # NOAA CO-OPS Prediction Fetching and Caching
//!
//! This module fetches tide and current predictions from the NOAA CO-OPS
//! `datagetter` API and prefetches everything an almanac run needs into
//! [`AlmanacData`] before any page is composed.
//!
//! ## Products
//! - **Tide hi-lo**: `product=predictions&interval=hilo`, heights in feet above MLLW
//! - **Tide hourly**: `product=predictions&interval=h`, used for tide curves
//! - **Currents**: `product=currents_predictions&interval=MAX_SLACK`, max flood,
//!   max ebb and slack events in knots
//!
//! All requests ask for station-local time (`lst_ldt`), so timestamps can be
//! bucketed by day without any timezone handling.
//!
//! ## Caching Strategy
//! - **Location**: one JSON file per product, station and date range under the
//!   configured cache directory
//! - **TTL**: file modification time checked before loading
//! - **Failures**: cache read and write errors are logged and otherwise ignored
//!
//! ## Error Handling
//! Every fetch returns a [`FetchError`]. [`fetch_almanac_data`] turns a failed
//! station into an empty series with a warning, so one bad station never
//! affects the others.

use crate::bucket::AlmanacData;
use crate::config::Config;
use crate::{
    CurrentKind, HourlySample, PredictionEvent, StationKind, StationSeries, TideKind,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use std::{fs, io};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur while fetching predictions.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Request failed (network, timeout, or non-success status)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with an error payload
    #[error("provider error: {0}")]
    Provider(String),

    /// The response body was not the JSON we expected
    #[error("decode failed: {0}")]
    Decode(#[from] serde_json::Error),

    /// Cache file operations failed
    #[error("cache IO: {0}")]
    Cache(#[from] io::Error),
}

/// The three provider products an almanac uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Product {
    TideHiLo,
    TideHourly,
    Currents,
}

impl Product {
    fn query(self) -> [(&'static str, &'static str); 3] {
        match self {
            Product::TideHiLo => [("product", "predictions"), ("datum", "MLLW"), ("interval", "hilo")],
            Product::TideHourly => [("product", "predictions"), ("datum", "MLLW"), ("interval", "h")],
            Product::Currents => [
                ("product", "currents_predictions"),
                ("interval", "MAX_SLACK"),
                ("vel_type", "default"),
            ],
        }
    }

    fn cache_tag(self) -> &'static str {
        match self {
            Product::TideHiLo => "hilo",
            Product::TideHourly => "hourly",
            Product::Currents => "currents",
        }
    }
}

/// One product for one station over an inclusive date range.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    pub product: Product,
    pub station: String,
    pub begin: NaiveDate,
    pub end: NaiveDate,
}

impl Request {
    pub fn new(product: Product, station: &str, begin: NaiveDate, end: NaiveDate) -> Self {
        Self {
            product,
            station: station.to_string(),
            begin,
            end,
        }
    }

    /// Query parameters for the `datagetter` endpoint.
    pub fn query(&self, application: &str) -> Vec<(&'static str, String)> {
        let mut params: Vec<(&'static str, String)> = self
            .product
            .query()
            .iter()
            .map(|(k, v)| (*k, v.to_string()))
            .collect();
        params.extend([
            ("begin_date", self.begin.format("%Y%m%d").to_string()),
            ("end_date", self.end.format("%Y%m%d").to_string()),
            ("station", self.station.clone()),
            ("units", "english".to_string()),
            ("time_zone", "lst_ldt".to_string()),
            ("format", "json".to_string()),
            ("application", application.to_string()),
        ]);
        params
    }

    fn cache_file_name(&self) -> String {
        let station: String = self
            .station
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        format!(
            "{}_{}_{}_{}.json",
            self.product.cache_tag(),
            station,
            self.begin.format("%Y%m%d"),
            self.end.format("%Y%m%d")
        )
    }
}

/// On-disk cache of raw provider responses.
#[derive(Clone, Debug)]
pub struct ResponseCache {
    dir: PathBuf,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new<P: AsRef<Path>>(dir: P, ttl: Duration) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            ttl,
        }
    }

    pub fn path(&self, request: &Request) -> PathBuf {
        self.dir.join(request.cache_file_name())
    }

    /// Cached body if the file exists and is younger than the TTL.
    pub fn load(&self, request: &Request) -> Result<String, io::Error> {
        let path = self.path(request);
        let meta = fs::metadata(&path)?;

        let age = SystemTime::now()
            .duration_since(meta.modified()?)
            .map_err(|_| io::Error::other("time error"))?;
        if age >= self.ttl {
            return Err(io::Error::other("stale"));
        }

        fs::read_to_string(path)
    }

    pub fn store(&self, request: &Request, body: &str) -> Result<(), io::Error> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path(request), body)
    }
}

#[derive(Deserialize)]
struct ProviderErrorBody {
    message: String,
}

#[derive(Deserialize)]
struct PredictionsResponse {
    #[serde(default)]
    predictions: Vec<RawPrediction>,
    error: Option<ProviderErrorBody>,
}

#[derive(Deserialize)]
struct RawPrediction {
    t: String,
    v: String,
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Deserialize)]
struct CurrentsResponse {
    current_predictions: Option<CurrentPredictions>,
    error: Option<ProviderErrorBody>,
}

#[derive(Deserialize)]
struct CurrentPredictions {
    #[serde(default)]
    cp: Vec<RawCurrent>,
}

#[derive(Deserialize)]
struct RawCurrent {
    #[serde(rename = "Time")]
    time: String,
    /// Sent as a number by the API but as a string by some mirrors
    #[serde(rename = "Velocity_Major")]
    velocity: serde_json::Value,
    #[serde(rename = "Type")]
    kind: String,
}

fn provider_error(error: Option<ProviderErrorBody>) -> Result<(), FetchError> {
    match error {
        Some(body) => Err(FetchError::Provider(body.message)),
        None => Ok(()),
    }
}

/// Reject bodies carrying a provider error payload.
fn check_body(body: &str) -> Result<(), FetchError> {
    #[derive(Deserialize)]
    struct Probe {
        error: Option<ProviderErrorBody>,
    }
    provider_error(serde_json::from_str::<Probe>(body)?.error)
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Decode a hi-lo tide response.
pub fn parse_tide_events(body: &str) -> Result<Vec<PredictionEvent>, FetchError> {
    let response: PredictionsResponse = serde_json::from_str(body)?;
    provider_error(response.error)?;

    Ok(response
        .predictions
        .into_iter()
        .filter_map(|p| match parse_number(&p.v) {
            Some(height) => Some(PredictionEvent::tide(
                p.t,
                height,
                TideKind::from_raw(p.kind.as_deref().unwrap_or("")),
            )),
            None => {
                warn!(timestamp = %p.t, value = %p.v, "skipping tide event with bad height");
                None
            }
        })
        .collect())
}

/// Decode an hourly height response.
pub fn parse_hourly(body: &str) -> Result<Vec<HourlySample>, FetchError> {
    let response: PredictionsResponse = serde_json::from_str(body)?;
    provider_error(response.error)?;

    Ok(response
        .predictions
        .into_iter()
        .filter_map(|p| match parse_number(&p.v) {
            Some(height) => Some(HourlySample::new(p.t, height)),
            None => {
                warn!(timestamp = %p.t, value = %p.v, "skipping hourly sample with bad height");
                None
            }
        })
        .collect())
}

/// Decode a MAX_SLACK current response.
pub fn parse_current_events(body: &str) -> Result<Vec<PredictionEvent>, FetchError> {
    let response: CurrentsResponse = serde_json::from_str(body)?;
    provider_error(response.error)?;

    let records = response.current_predictions.map(|c| c.cp).unwrap_or_default();
    Ok(records
        .into_iter()
        .filter_map(|c| {
            let velocity = match &c.velocity {
                serde_json::Value::Number(n) => n.as_f64(),
                serde_json::Value::String(s) => parse_number(s),
                _ => None,
            };
            match velocity {
                Some(v) => Some(PredictionEvent::current(c.time, v, CurrentKind::from_raw(&c.kind))),
                None => {
                    warn!(timestamp = %c.time, value = %c.velocity, "skipping current event with bad velocity");
                    None
                }
            }
        })
        .collect())
}

/// Where the prefetch gets its predictions from.
#[allow(async_fn_in_trait)]
pub trait PredictionSource {
    async fn tide_events(
        &self,
        station: &str,
        begin: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PredictionEvent>, FetchError>;

    async fn hourly_heights(
        &self,
        station: &str,
        begin: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<HourlySample>, FetchError>;

    async fn current_events(
        &self,
        station: &str,
        begin: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PredictionEvent>, FetchError>;
}

/// HTTP client for the CO-OPS `datagetter` endpoint.
pub struct NoaaClient {
    http: reqwest::Client,
    base_url: String,
    application: String,
    cache: Option<ResponseCache>,
}

impl NoaaClient {
    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.provider.timeout_secs))
            .build()?;
        let cache = config.cache.enabled.then(|| {
            ResponseCache::new(
                &config.cache.dir,
                Duration::from_secs(config.cache.ttl_minutes * 60),
            )
        });
        Ok(Self {
            http,
            base_url: config.provider.base_url.clone(),
            application: config.provider.application.clone(),
            cache,
        })
    }

    /// Raw response body, from the cache when fresh.
    pub async fn fetch(&self, request: &Request) -> Result<String, FetchError> {
        if let Some(cache) = &self.cache {
            match cache.load(request) {
                Ok(body) => {
                    debug!(station = %request.station, product = ?request.product, "cache hit");
                    return Ok(body);
                }
                Err(e) => debug!(station = %request.station, "cache miss: {e}"),
            }
        }

        let body = self
            .http
            .get(&self.base_url)
            .query(&request.query(&self.application))
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        check_body(&body)?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.store(request, &body) {
                warn!(path = %cache.path(request).display(), "cache write failed: {e}");
            }
        }
        Ok(body)
    }
}

impl PredictionSource for NoaaClient {
    async fn tide_events(
        &self,
        station: &str,
        begin: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PredictionEvent>, FetchError> {
        let body = self.fetch(&Request::new(Product::TideHiLo, station, begin, end)).await?;
        parse_tide_events(&body)
    }

    async fn hourly_heights(
        &self,
        station: &str,
        begin: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<HourlySample>, FetchError> {
        let body = self.fetch(&Request::new(Product::TideHourly, station, begin, end)).await?;
        parse_hourly(&body)
    }

    async fn current_events(
        &self,
        station: &str,
        begin: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PredictionEvent>, FetchError> {
        let body = self.fetch(&Request::new(Product::Currents, station, begin, end)).await?;
        parse_current_events(&body)
    }
}

/// Fetch every configured station for `start..=end`, one request at a time.
///
/// A station whose fetch fails gets an empty series; a graph station whose
/// hourly fetch fails simply has no curve.
pub async fn fetch_almanac_data<S: PredictionSource>(
    source: &S,
    config: &Config,
    start: NaiveDate,
    end: NaiveDate,
) -> AlmanacData {
    let mut data = AlmanacData::new();

    for station in &config.current_stations {
        let events = source
            .current_events(&station.id, start, end)
            .await
            .unwrap_or_else(|e| {
                warn!(station = %station.name, id = %station.id, "current fetch failed: {e}");
                Vec::new()
            });
        debug!(station = %station.name, events = events.len(), "currents fetched");
        data.insert_series(StationSeries {
            station_id: station.id.clone(),
            station_name: station.name.clone(),
            kind: StationKind::Current,
            events,
        });
    }

    for station in &config.tide_stations {
        let events = source
            .tide_events(&station.id, start, end)
            .await
            .unwrap_or_else(|e| {
                warn!(station = %station.name, id = %station.id, "tide fetch failed: {e}");
                Vec::new()
            });
        debug!(station = %station.name, events = events.len(), "tides fetched");
        data.insert_series(StationSeries {
            station_id: station.id.clone(),
            station_name: station.name.clone(),
            kind: StationKind::Tide,
            events,
        });

        if station.graph {
            match source.hourly_heights(&station.id, start, end).await {
                Ok(samples) => data.insert_hourly(&station.id, samples),
                Err(e) => warn!(station = %station.name, id = %station.id, "hourly fetch failed: {e}"),
            }
        }
    }

    info!(
        currents = config.current_stations.len(),
        tides = config.tide_stations.len(),
        %start,
        %end,
        "prefetch complete"
    );
    data
}
