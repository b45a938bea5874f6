//! Parsing for the `resultSets` container returned by stats.nba.com.
//!
//! Every endpoint answers with something like:
//! ```text
//! { "resultSets": [ { "name": "WinProbPBP",
//!                     "headers": ["GAME_ID", "HOME_PCT", ...],
//!                     "rowSet": [["0022200601", 0.52, ...], ...] } ] }
//! ```
//! A few endpoints use a singular `resultSet` object instead, so both are
//! accepted. Headers are lowercased on the way in.
//!
//! Only presence is checked. A result set that cannot be read is kept as an
//! error and only surfaces if a caller asks for it; rows that are not arrays
//! are dropped and rows of the wrong width are padded with nulls or cut.

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::models::Table;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResultSetError {
    #[error("result set #{index} is not a JSON object")]
    NotAnObject { index: usize },

    #[error("result set '{name}' has no '{field}' array")]
    MissingField { name: String, field: &'static str },

    #[error("result set '{name}' header #{column} is not a string")]
    BadHeader { name: String, column: usize },
}

/// Every result set of one response, in upstream order.
#[derive(Debug)]
pub struct ResultSets {
    entries: Vec<(String, Result<Table, ResultSetError>)>,
}

impl ResultSets {
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove the set called `name` (case-sensitive, as the upstream spells
    /// it). `Ok(None)` when no such set exists.
    pub fn take(&mut self, name: &str) -> Result<Option<Table>, ResultSetError> {
        match self.entries.iter().position(|(n, _)| n == name) {
            Some(pos) => self.entries.remove(pos).1.map(Some),
            None => Ok(None),
        }
    }

    /// Remove the first set, whatever its name.
    pub fn take_first(&mut self) -> Result<Option<Table>, ResultSetError> {
        if self.entries.is_empty() {
            return Ok(None);
        }
        self.entries.remove(0).1.map(Some)
    }
}

/// Parse the result-set container of a response.
///
/// Returns `None` when the response has no container at all.
pub fn parse_result_sets(raw: &Value) -> Option<ResultSets> {
    let items: Vec<&Value> = match raw.get("resultSets").or_else(|| raw.get("resultSet")) {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(obj @ Value::Object(_)) => vec![obj],
        _ => return None,
    };

    let entries = items
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let name = entry
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let table = parse_table(index, &name, entry);
            if let Err(e) = &table {
                debug!("Unreadable result set: {}", e);
            }
            (name, table)
        })
        .collect();
    Some(ResultSets { entries })
}

fn parse_table(index: usize, name: &str, entry: &Value) -> Result<Table, ResultSetError> {
    let obj = entry
        .as_object()
        .ok_or(ResultSetError::NotAnObject { index })?;

    let headers = obj
        .get("headers")
        .and_then(Value::as_array)
        .ok_or_else(|| ResultSetError::MissingField {
            name: name.to_string(),
            field: "headers",
        })?;
    let columns = headers
        .iter()
        .enumerate()
        .map(|(column, h)| {
            h.as_str()
                .map(str::to_lowercase)
                .ok_or_else(|| ResultSetError::BadHeader {
                    name: name.to_string(),
                    column,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let row_set = obj
        .get("rowSet")
        .and_then(Value::as_array)
        .ok_or_else(|| ResultSetError::MissingField {
            name: name.to_string(),
            field: "rowSet",
        })?;

    let mut rows = Vec::with_capacity(row_set.len());
    let mut dropped = 0;
    let mut resized = 0;
    for row in row_set {
        let Some(values) = row.as_array() else {
            dropped += 1;
            continue;
        };
        let mut values = values.clone();
        if values.len() != columns.len() {
            values.resize(columns.len(), Value::Null);
            resized += 1;
        }
        rows.push(values);
    }
    if dropped > 0 || resized > 0 {
        debug!(
            "Result set '{}': dropped {} non-array row(s), resized {} row(s) to {} column(s)",
            name,
            dropped,
            resized,
            columns.len()
        );
    }

    Ok(Table { columns, rows })
}
