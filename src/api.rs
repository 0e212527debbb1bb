/// Synchronous client for the **UN Comtrade API** (legacy `api/get` endpoint).
///
/// Each call returns a JSON envelope `{ "validation": {...}, "dataset": [...] }`;
/// this module turns the dataset into a [`TradeTable`].
///
/// ### Notes
/// - Calls are issued one after another; there is no retry. A non-200 status
///   is logged and treated as an empty result for that call.
/// - `dataset` rows may be objects keyed by column, or arrays whose first row
///   is a header naming the columns. Both shapes are accepted.
/// - Network failures and undecodable JSON are returned as errors.
///
/// Typical usage:
/// ```no_run
/// # use comtrade_rs::{Client, TradeQuery, YearRange};
/// let client = Client::default();
/// let query = TradeQuery::new(["842"], ["124"], ["TOTAL"], YearRange::new(2015, 2017));
/// let table = client.fetch_report(&query)?;
/// # Ok::<(), anyhow::Error>(())
/// ```
use crate::models::{DATASET_COLUMNS, Envelope, RawRecord, TradeRecord, TradeTable};
use crate::net_exports::derive_net_exports;
use crate::query::{DEFAULT_BASE_URL, TradeQuery};
use anyhow::{Context, Result, anyhow, bail};
use log::{debug, info, warn};
use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use reqwest::redirect::Policy;
use serde_json::{Map, Value};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Client {
    pub base_url: String,
    http: HttpClient,
}

impl Default for Client {
    fn default() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }
}

impl Client {
    /// Client against a different API root (mirrors, local test servers).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(30)) // total request timeout
            .connect_timeout(Duration::from_secs(10)) // connect timeout
            .redirect(Policy::limited(5)) // cap redirects
            .user_agent(concat!("comtrade_rs/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("reqwest client build");
        Self {
            base_url: base_url.into(),
            http,
        }
    }

    /// URLs `query` expands to against this client's base URL.
    pub fn urls(&self, query: &TradeQuery) -> Result<Vec<String>> {
        Ok(query.urls(&self.base_url)?)
    }

    /// Run one call and extract its trade records.
    ///
    /// Returns an empty table when the server answers with anything but 200
    /// or when the dataset is empty.
    pub fn fetch_table(&self, url: &str) -> Result<TradeTable> {
        let resp = self
            .http
            .get(url)
            .send()
            .with_context(|| format!("GET {}", url))?;

        let status = resp.status();
        if status != StatusCode::OK {
            warn!("GET {} returned HTTP {}, treating as empty", url, status);
            return Ok(TradeTable::new());
        }

        let v: Value = resp
            .json()
            .with_context(|| format!("decode json from {}", url))?;
        let table = parse_response(v).with_context(|| format!("parse response of {}", url))?;
        debug!("GET {} -> {} rows", url, table.len());
        Ok(table)
    }

    /// Fetch every URL in order and concatenate the results.
    pub fn fetch_all(&self, urls: &[String]) -> Result<TradeTable> {
        urls.iter().try_fold(TradeTable::new(), |mut acc, url| {
            acc.append(self.fetch_table(url)?);
            Ok(acc)
        })
    }

    /// Fetch all calls of `query` and append derived net-export rows.
    pub fn fetch_report(&self, query: &TradeQuery) -> Result<TradeTable> {
        let urls = self.urls(query)?;
        info!("fetching {} call(s) for years {}", urls.len(), query.years);
        let table = self.fetch_all(&urls)?;
        Ok(derive_net_exports(table))
    }

    /// Per-chapter (AG2) report for the last year of `query`.
    pub fn fetch_breakdown(&self, query: &TradeQuery) -> Result<TradeTable> {
        self.fetch_report(&query.commodity_breakdown()?)
    }
}

/// Turn a decoded response envelope into a table.
///
/// An empty or missing `dataset` yields an empty table and logs the API's
/// validation status. When rows are arrays the first one is the header; when
/// rows are objects they carry their own column names, so the first row is
/// data too. A `null` trade value becomes NaN rather than failing the call.
pub fn parse_response(v: Value) -> Result<TradeTable> {
    if !v.is_object() {
        bail!("unexpected response shape: not a JSON object");
    }
    let envelope: Envelope = serde_json::from_value(v).context("parse envelope")?;

    let dataset = match envelope.dataset.as_deref() {
        Some(rows) if !rows.is_empty() => rows,
        _ => {
            warn!(
                "empty dataset (validation status: {})",
                envelope.status_name().unwrap_or("unknown")
            );
            return Ok(TradeTable::new());
        }
    };

    let objects = match &dataset[0] {
        Value::Array(header) => rows_from_header(header, &dataset[1..])?,
        Value::Object(_) => dataset.to_vec(),
        other => bail!("unexpected dataset row: {}", other),
    };

    let mut table = TradeTable::new();
    for (i, obj) in objects.into_iter().enumerate() {
        let raw: RawRecord =
            serde_json::from_value(obj).with_context(|| format!("parse dataset row {}", i))?;
        let flow = raw.rg_desc.clone();
        match TradeRecord::from_raw(raw) {
            Some(rec) => table.push(rec),
            None => debug!("skipping row {} with unknown flow {:?}", i, flow),
        }
    }
    Ok(table)
}

/// Zip array rows with the header row, keeping only the columns we read.
fn rows_from_header(header: &[Value], rows: &[Value]) -> Result<Vec<Value>> {
    let names: Vec<&str> = header
        .iter()
        .map(|h| h.as_str().ok_or_else(|| anyhow!("non-string header cell: {}", h)))
        .collect::<Result<_>>()?;

    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let cells = row
                .as_array()
                .ok_or_else(|| anyhow!("dataset row {} is not an array", i + 1))?;
            let obj: Map<String, Value> = names
                .iter()
                .zip(cells)
                .filter(|(name, _)| DATASET_COLUMNS.contains(*name))
                .map(|(name, cell)| (name.to_string(), cell.clone()))
                .collect();
            Ok(Value::Object(obj))
        })
        .collect()
}
