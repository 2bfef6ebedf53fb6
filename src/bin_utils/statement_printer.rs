use std::io::Write;

use chrono::{DateTime, Utc};
use csv::Writer;
use serde::Serialize;

use crate::{account::LedgerEntry, money::Money};

#[derive(Debug, Serialize)]
struct StatementRow {
    operation: &'static str,
    previous: Option<Money>,
    amount: Option<Money>,
    new: Option<Money>,
    at: DateTime<Utc>,
}

impl From<&LedgerEntry> for StatementRow {
    fn from(entry: &LedgerEntry) -> Self {
        let amounts = entry.amounts();
        Self {
            operation: entry.operation(),
            previous: amounts.map(|(previous, _, _)| previous),
            amount: amounts.map(|(_, amount, _)| amount),
            new: amounts.map(|(_, _, new)| new),
            at: entry.at(),
        }
    }
}

/// Writes the history as CSV, oldest entry first.
pub fn print_statement<W>(output: &mut W, entries: &[LedgerEntry]) -> anyhow::Result<()>
where
    W: Write,
{
    let mut writer = Writer::from_writer(output);
    for entry in entries {
        if let Err(err) = writer.serialize(StatementRow::from(entry)) {
            anyhow::bail!("Failed to write statement: {err}")
        }
    }
    if let Err(err) = writer.flush() {
        anyhow::bail!("Failed to flush statement: {err}")
    }
    Ok(())
}
