use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a trade flow as labelled by the Comtrade API (`rgDesc`).
///
/// `NetExport` is never returned by the API; it is derived by
/// [`crate::net_exports::derive_net_exports`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FlowType {
    Import,
    Export,
    #[serde(rename = "Re-Import")]
    ReImport,
    #[serde(rename = "Re-Export")]
    ReExport,
    #[serde(rename = "Net Export")]
    NetExport,
}

impl FlowType {
    /// Parse the API label. Unknown labels yield `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Import" => Some(Self::Import),
            "Export" => Some(Self::Export),
            "Re-Import" => Some(Self::ReImport),
            "Re-Export" => Some(Self::ReExport),
            "Net Export" => Some(Self::NetExport),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Import => "Import",
            Self::Export => "Export",
            Self::ReImport => "Re-Import",
            Self::ReExport => "Re-Export",
            Self::NetExport => "Net Export",
        }
    }
}

impl fmt::Display for FlowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Serde helper: parse a `String` from either a JSON string or a number.
///
/// Comtrade encodes reporter/partner codes as numbers and commodity codes as
/// strings (`"TOTAL"`, `"01"`), so both shapes have to be accepted.
fn de_string_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    struct CodeVisitor;

    impl<'de> Visitor<'de> for CodeVisitor {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "a string or number code")
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(v.to_string())
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(v.to_string())
        }

        fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(s.trim().to_string())
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(String::new())
        }
    }

    deserializer.deserialize_any(CodeVisitor)
}

/// Serde helper: parse an `i32` year from either a JSON number or a string.
fn de_year<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let code = de_string_from_string_or_number(deserializer)?;
    code.parse::<i32>().map_err(D::Error::custom)
}

/// Serde helper: a trade value that may be `null`; missing values become NaN.
fn de_value_or_nan<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

/// Raw row from the `dataset` array, restricted to the columns this crate keeps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "pfCode", default, deserialize_with = "de_string_from_string_or_number")]
    pub pf_code: String,
    #[serde(rename = "yr", deserialize_with = "de_year")]
    pub yr: i32,
    #[serde(rename = "rgDesc")]
    pub rg_desc: String,
    #[serde(rename = "rtCode", deserialize_with = "de_string_from_string_or_number")]
    pub rt_code: String,
    #[serde(rename = "rtTitle", default, deserialize_with = "de_string_from_string_or_number")]
    pub rt_title: String,
    #[serde(rename = "ptCode", deserialize_with = "de_string_from_string_or_number")]
    pub pt_code: String,
    #[serde(rename = "ptTitle", default, deserialize_with = "de_string_from_string_or_number")]
    pub pt_title: String,
    #[serde(rename = "cmdCode", deserialize_with = "de_string_from_string_or_number")]
    pub cmd_code: String,
    #[serde(rename = "cmdDescE", default, deserialize_with = "de_string_from_string_or_number")]
    pub cmd_desc_e: String,
    #[serde(rename = "TradeValue", deserialize_with = "de_value_or_nan")]
    pub trade_value: f64,
}

/// Columns read from each dataset row, in output order.
pub const DATASET_COLUMNS: [&str; 10] = [
    "pfCode", "yr", "rgDesc", "rtCode", "rtTitle", "ptCode", "ptTitle", "cmdCode", "cmdDescE",
    "TradeValue",
];

/// Tidy structure used by this crate (one row = one flow for one year).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradeRecord {
    pub classification: String,
    pub year: i32,
    pub flow: FlowType,
    pub reporter_code: String,
    pub reporter_name: String,
    pub partner_code: String,
    pub partner_name: String,
    pub commodity_code: String,
    pub commodity_name: String,
    /// NaN when the API reported no value; written as `null` in JSON.
    #[serde(deserialize_with = "de_value_or_nan")]
    pub trade_value: f64,
}

impl TradeRecord {
    /// Convert a raw row. Rows with an unrecognised `rgDesc` are rejected.
    pub fn from_raw(raw: RawRecord) -> Option<Self> {
        let flow = FlowType::from_label(&raw.rg_desc)?;
        Some(Self {
            classification: raw.pf_code,
            year: raw.yr,
            flow,
            reporter_code: raw.rt_code,
            reporter_name: raw.rt_title,
            partner_code: raw.pt_code,
            partner_name: raw.pt_title,
            commodity_code: raw.cmd_code,
            commodity_name: raw.cmd_desc_e,
            trade_value: raw.trade_value,
        })
    }

    /// Key shared by the export, import and net-export rows of one pairing.
    pub fn pair_key(&self) -> PairKey {
        PairKey {
            year: self.year,
            reporter_code: self.reporter_code.clone(),
            partner_code: self.partner_code.clone(),
            commodity_code: self.commodity_code.clone(),
        }
    }
}

/// (year, reporter, partner, commodity): the record identity without its flow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PairKey {
    pub year: i32,
    pub reporter_code: String,
    pub partner_code: String,
    pub commodity_code: String,
}

/// Ordered collection of trade records. No uniqueness is enforced.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct TradeTable {
    rows: Vec<TradeRecord>,
}

impl TradeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[TradeRecord] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TradeRecord> {
        self.rows.iter()
    }

    pub fn push(&mut self, record: TradeRecord) {
        self.rows.push(record);
    }

    /// Move all rows of `other` to the end of this table.
    pub fn append(&mut self, mut other: TradeTable) {
        self.rows.append(&mut other.rows);
    }

    /// Concatenate tables in order.
    pub fn concat(tables: impl IntoIterator<Item = TradeTable>) -> TradeTable {
        tables.into_iter().fold(TradeTable::new(), |mut acc, t| {
            acc.append(t);
            acc
        })
    }

    pub fn into_rows(self) -> Vec<TradeRecord> {
        self.rows
    }
}

impl From<Vec<TradeRecord>> for TradeTable {
    fn from(rows: Vec<TradeRecord>) -> Self {
        Self { rows }
    }
}

impl FromIterator<TradeRecord> for TradeTable {
    fn from_iter<I: IntoIterator<Item = TradeRecord>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

impl Extend<TradeRecord> for TradeTable {
    fn extend<I: IntoIterator<Item = TradeRecord>>(&mut self, iter: I) {
        self.rows.extend(iter);
    }
}

impl IntoIterator for TradeTable {
    type Item = TradeRecord;
    type IntoIter = std::vec::IntoIter<TradeRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a TradeTable {
    type Item = &'a TradeRecord;
    type IntoIter = std::slice::Iter<'a, TradeRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Response envelope of the `api/get` endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub validation: Option<Validation>,
    #[serde(default)]
    pub dataset: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Validation {
    #[serde(default)]
    pub status: Option<ValidationStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationStatus {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Option<i64>,
}

impl Envelope {
    /// Human-readable validation status, if the API sent one.
    pub fn status_name(&self) -> Option<&str> {
        self.validation
            .as_ref()
            .and_then(|v| v.status.as_ref())
            .and_then(|s| s.name.as_deref())
    }
}

/// Grouping key used by stats.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey {
    pub reporter_code: String,
    pub partner_code: String,
    pub flow: FlowType,
}
