//! Query construction for the Comtrade `api/get` endpoint.
//!
//! A [`TradeQuery`] is the typed selection behind a report: which reporters,
//! partners and commodities to ask for over which years. The API is picky about
//! call size, so a query expands to one URL per group of at most
//! [`MAX_YEARS_PER_CALL`] years.
//!
//! ```
//! # use comtrade_rs::query::{TradeQuery, YearRange, DEFAULT_BASE_URL};
//! let q = TradeQuery::new(["842"], ["0"], ["TOTAL"], YearRange::new(2015, 2017));
//! let urls = q.urls(DEFAULT_BASE_URL)?;
//! assert_eq!(urls.len(), 1);
//! assert!(urls[0].contains("ps=2015%2C2016"));
//! # Ok::<(), comtrade_rs::query::QueryError>(())
//! ```

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://comtrade.un.org/api";

/// The API rejects calls spanning more periods than this.
pub const MAX_YEARS_PER_CALL: usize = 5;

/// Row cap of a single call.
pub const MAX_RECORDS: u32 = 10_000;

/// URL-encoded comma, the list separator the API expects.
pub const SEPARATOR: &str = "%2C";

/// Commodity code requesting all 2-digit HS chapters.
pub const AG2: &str = "AG2";

/// Years accepted by [`TradeQuery::validate`], inclusive.
pub const MIN_YEAR: i32 = 1900;
pub const MAX_YEAR: i32 = 2100;

/// Reporters kept in a commodity breakdown.
pub const MAX_BREAKDOWN_REPORTERS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("at least one reporter code required")]
    NoReporters,
    #[error("at least one partner code required")]
    NoPartners,
    #[error("at least one commodity code required")]
    NoCommodities,
    #[error("year range {start}..{end} contains no years")]
    EmptyYears { start: i32, end: i32 },
    #[error("year range {start}..{end} outside 1900..=2100")]
    YearsOutOfRange { start: i32, end: i32 },
    #[error("invalid {kind} code: {code:?}")]
    InvalidCode { kind: &'static str, code: String },
    #[error("invalid year range {0:?}, expected YYYY or YYYY:YYYY")]
    InvalidYearRange(String),
}

/// Half-open year range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    pub fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    /// A range covering exactly one year.
    pub fn single(year: i32) -> Self {
        Self::new(year, year.saturating_add(1))
    }

    pub fn years(&self) -> std::ops::Range<i32> {
        self.start..self.end
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Last year covered by the range.
    pub fn last(&self) -> Option<i32> {
        (!self.is_empty()).then(|| self.end - 1)
    }

    /// Parse `YYYY` (one year) or `YYYY:YYYY` (half-open).
    pub fn parse(s: &str) -> Result<Self, QueryError> {
        let bad = || QueryError::InvalidYearRange(s.to_string());
        if let Some((a, b)) = s.split_once(':') {
            let start = a.trim().parse::<i32>().map_err(|_| bad())?;
            let end = b.trim().parse::<i32>().map_err(|_| bad())?;
            Ok(Self::new(start, end))
        } else {
            s.trim().parse::<i32>().map(Self::single).map_err(|_| bad())
        }
    }

    /// Period groups of at most [`MAX_YEARS_PER_CALL`] years, each joined with [`SEPARATOR`].
    pub fn period_groups(&self) -> Vec<String> {
        let years: Vec<String> = self.years().map(|y| y.to_string()).collect();
        years
            .chunks(MAX_YEARS_PER_CALL)
            .map(|chunk| chunk.join(SEPARATOR))
            .collect()
    }
}

impl fmt::Display for YearRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

/// Trade regime filter (`rg`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeRegime {
    #[default]
    All,
    Imports,
    Exports,
    ReExports,
    ReImports,
}

impl TradeRegime {
    pub fn to_query_param(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Imports => "1",
            Self::Exports => "2",
            Self::ReExports => "3",
            Self::ReImports => "4",
        }
    }
}

/// Reporting frequency (`freq`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    #[default]
    Annual,
    Monthly,
}

impl Frequency {
    pub fn to_query_param(&self) -> &'static str {
        match self {
            Self::Annual => "A",
            Self::Monthly => "M",
        }
    }
}

fn default_classification() -> String {
    "HS".into()
}

fn default_max_records() -> u32 {
    MAX_RECORDS
}

/// Selection of trade flows to fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeQuery {
    pub reporters: Vec<String>,
    pub partners: Vec<String>,
    pub commodities: Vec<String>,
    pub years: YearRange,
    /// Product classification (`px`), e.g. `HS`, `H4`, `S3`.
    #[serde(default = "default_classification")]
    pub classification: String,
    #[serde(default)]
    pub frequency: Frequency,
    #[serde(default)]
    pub regime: TradeRegime,
    /// Clamped to [`MAX_RECORDS`].
    #[serde(default = "default_max_records")]
    pub max_records: u32,
}

static AREA_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?i:all|\d{1,4})$").expect("area code regex"));
static COMMODITY_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i:all|total|ag[1-6]|\d{1,6})$").expect("commodity code regex")
});
static CLASSIFICATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9]{0,3}$").expect("classification regex"));

// Allow -, _, . unescaped in codes
const SAFE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

fn enc_join<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .map(|s| percent_encoding::utf8_percent_encode(s.trim(), SAFE).to_string())
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

fn check_codes(kind: &'static str, codes: &[String], re: &Regex) -> Result<(), QueryError> {
    match codes.iter().find(|c| !re.is_match(c.trim())) {
        Some(bad) => Err(QueryError::InvalidCode {
            kind,
            code: bad.clone(),
        }),
        None => Ok(()),
    }
}

impl TradeQuery {
    pub fn new<R, P, C>(
        reporters: impl IntoIterator<Item = R>,
        partners: impl IntoIterator<Item = P>,
        commodities: impl IntoIterator<Item = C>,
        years: YearRange,
    ) -> Self
    where
        R: Into<String>,
        P: Into<String>,
        C: Into<String>,
    {
        Self {
            reporters: reporters.into_iter().map(Into::into).collect(),
            partners: partners.into_iter().map(Into::into).collect(),
            commodities: commodities.into_iter().map(Into::into).collect(),
            years,
            classification: default_classification(),
            frequency: Frequency::default(),
            regime: TradeRegime::default(),
            max_records: MAX_RECORDS,
        }
    }

    /// Check that the query can be turned into at least one valid call.
    pub fn validate(&self) -> Result<(), QueryError> {
        if self.reporters.is_empty() {
            return Err(QueryError::NoReporters);
        }
        if self.partners.is_empty() {
            return Err(QueryError::NoPartners);
        }
        if self.commodities.is_empty() {
            return Err(QueryError::NoCommodities);
        }
        if self.years.is_empty() {
            return Err(QueryError::EmptyYears {
                start: self.years.start,
                end: self.years.end,
            });
        }
        if self.years.start < MIN_YEAR || self.years.end > MAX_YEAR + 1 {
            return Err(QueryError::YearsOutOfRange {
                start: self.years.start,
                end: self.years.end,
            });
        }
        check_codes("reporter", &self.reporters, &AREA_CODE)?;
        check_codes("partner", &self.partners, &AREA_CODE)?;
        check_codes("commodity", &self.commodities, &COMMODITY_CODE)?;
        if !CLASSIFICATION.is_match(&self.classification) {
            return Err(QueryError::InvalidCode {
                kind: "classification",
                code: self.classification.clone(),
            });
        }
        Ok(())
    }

    /// One URL per period group, in year order.
    pub fn urls(&self, base_url: &str) -> Result<Vec<String>, QueryError> {
        self.validate()?;

        let reporters = enc_join(self.reporters.iter().map(|s| s.as_str()));
        let partners = enc_join(self.partners.iter().map(|s| s.as_str()));
        let commodities = enc_join(self.commodities.iter().map(|s| s.as_str()));
        let base = base_url.trim_end_matches('/');
        let max = self.max_records.min(MAX_RECORDS);

        Ok(self
            .years
            .period_groups()
            .into_iter()
            .map(|ps| {
                format!(
                    "{base}/get?max={max}&type=C&freq={freq}&px={px}&ps={ps}&r={reporters}&p={partners}&rg={rg}&cc={commodities}",
                    freq = self.frequency.to_query_param(),
                    px = self.classification.trim(),
                    rg = self.regime.to_query_param(),
                )
            })
            .collect())
    }

    /// Per-chapter (`AG2`) query for the last year of the range, limited to the
    /// first [`MAX_BREAKDOWN_REPORTERS`] reporters.
    ///
    /// The year is `end - 1`, the last year inside the range, not the
    /// exclusive `end` bound itself.
    pub fn commodity_breakdown(&self) -> Result<TradeQuery, QueryError> {
        let year = self.years.last().ok_or(QueryError::EmptyYears {
            start: self.years.start,
            end: self.years.end,
        })?;
        Ok(TradeQuery {
            reporters: self
                .reporters
                .iter()
                .take(MAX_BREAKDOWN_REPORTERS)
                .cloned()
                .collect(),
            commodities: vec![AG2.to_string()],
            years: YearRange::single(year),
            ..self.clone()
        })
    }
}
