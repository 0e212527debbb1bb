use crate::models::TradeTable;
use anyhow::{Context, Result};
use csv::WriterBuilder;
use std::borrow::Cow;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Prefix cells that spreadsheet apps would evaluate as formulas.
fn sanitize(cell: &str) -> Cow<'_, str> {
    match cell.chars().next() {
        Some('=' | '+' | '-' | '@' | '\t' | '\r') => Cow::Owned(format!("'{}", cell)),
        _ => Cow::Borrowed(cell),
    }
}

/// Save trade records as CSV with header.
pub fn save_csv<P: AsRef<Path>>(table: &TradeTable, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("create {}", path.display()))?;
    wtr.serialize((
        "classification",
        "year",
        "flow",
        "reporter_code",
        "reporter_name",
        "partner_code",
        "partner_name",
        "commodity_code",
        "commodity_name",
        "trade_value",
    ))?;
    for r in table {
        wtr.serialize((
            sanitize(&r.classification),
            r.year,
            r.flow.label(),
            sanitize(&r.reporter_code),
            sanitize(&r.reporter_name),
            sanitize(&r.partner_code),
            sanitize(&r.partner_name),
            sanitize(&r.commodity_code),
            sanitize(&r.commodity_name),
            r.trade_value,
        ))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save trade records as pretty JSON array.
pub fn save_json<P: AsRef<Path>>(table: &TradeTable, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let s = serde_json::to_string_pretty(table)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}
