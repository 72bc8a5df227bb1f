//! A small dynamic table: ordered columns, JSON cells, optional row labels.
//!
//! Column sets differ between units (a model version may add a source
//! category or a metadata field), so columns are kept in first-appearance
//! order and appending a table with new columns widens the whole table.

use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::io::Write;

use crate::flatten::FlattenError;

/// One row; `label` carries the row key of label-indexed tables and is
/// not written out.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    pub label: Option<String>,
    pub values: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    pub fn new() -> Self {
        Table::default()
    }

    /// Build a table from the shapes the model returns:
    ///
    /// - a list of objects: one row per object
    /// - an object of lists: one column per key, one row per list index
    /// - an object of scalars: a single row
    pub fn from_value(value: &Value, what: &str) -> Result<Table, FlattenError> {
        match value {
            Value::Array(records) => {
                let mut table = Table::new();
                for record in records {
                    let values = record.as_object().ok_or_else(|| FlattenError::Shape {
                        what: what.to_string(),
                        expected: "a list of objects",
                    })?;
                    table.push(Row {
                        label: None,
                        values: values.clone(),
                    });
                }
                Ok(table)
            }
            Value::Object(map) if map.values().any(Value::is_array) => {
                let height = map
                    .values()
                    .filter_map(Value::as_array)
                    .map(Vec::len)
                    .max()
                    .unwrap_or(0);
                let mut table = Table::new();
                for i in 0..height {
                    let values = map
                        .iter()
                        .map(|(k, v)| {
                            let cell = match v {
                                Value::Array(items) => items.get(i).cloned().unwrap_or(Value::Null),
                                scalar => scalar.clone(),
                            };
                            (k.clone(), cell)
                        })
                        .collect();
                    table.push(Row { label: None, values });
                }
                Ok(table)
            }
            Value::Object(map) => Ok(Table::single_row(map)),
            _ => Err(FlattenError::Shape {
                what: what.to_string(),
                expected: "a list or an object",
            }),
        }
    }

    /// One row holding every member of `map`.
    pub fn single_row(map: &Map<String, Value>) -> Table {
        let mut table = Table::new();
        table.push(Row {
            label: None,
            values: map.clone(),
        });
        table
    }

    /// One labeled row per member of `map`, its object members as columns.
    /// A scalar member lands in a column named `0`.
    pub fn from_labeled_rows(map: &Map<String, Value>) -> Table {
        let mut table = Table::new();
        for (label, inner) in map {
            let values = match inner {
                Value::Object(fields) => fields.clone(),
                scalar => {
                    let mut fields = Map::new();
                    fields.insert("0".to_string(), scalar.clone());
                    fields
                }
            };
            table.push(Row {
                label: Some(label.clone()),
                values,
            });
        }
        table
    }

    pub fn push(&mut self, row: Row) {
        for key in row.values.keys() {
            if !self.columns.iter().any(|c| c == key) {
                self.columns.push(key.clone());
            }
        }
        self.rows.push(row);
    }

    /// Set `column` to `value` on every row.
    pub fn set_column(&mut self, column: &str, value: Value) {
        if !self.columns.iter().any(|c| c == column) {
            self.columns.push(column.to_string());
        }
        for row in &mut self.rows {
            row.values.insert(column.to_string(), value.clone());
        }
    }

    /// Number the rows in `column`, starting at `first`.
    pub fn set_position_column(&mut self, column: &str, first: u64) {
        if !self.columns.iter().any(|c| c == column) {
            self.columns.push(column.to_string());
        }
        for (i, row) in self.rows.iter_mut().enumerate() {
            row.values
                .insert(column.to_string(), Value::from(first + i as u64));
        }
    }

    /// Append all rows of `other`, widening the column set as needed.
    pub fn append(&mut self, other: Table) {
        for column in other.columns {
            if !self.columns.contains(&column) {
                self.columns.push(column);
            }
        }
        self.rows.extend(other.rows);
    }

    /// Rows whose label equals `label`, labels dropped; all columns kept.
    pub fn with_label(&self, label: &str) -> Table {
        let rows = self
            .rows
            .iter()
            .filter(|r| r.label.as_deref() == Some(label))
            .map(|r| Row {
                label: None,
                values: r.values.clone(),
            })
            .collect();
        Table {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Stable sort by the given columns; missing and null cells sort last.
    pub fn sort_by_columns(&mut self, keys: &[&str]) {
        self.rows.sort_by(|a, b| {
            keys.iter()
                .map(|key| compare_cells(a.values.get(*key), b.values.get(*key)))
                .find(|ordering| *ordering != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });
    }

    /// Write as CSV: a leading unnamed row-number column, then every column.
    pub fn write_csv<W: Write>(&self, writer: W) -> anyhow::Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        let mut header = vec![String::new()];
        header.extend(self.columns.iter().cloned());
        wtr.write_record(&header)?;
        for (i, row) in self.rows.iter().enumerate() {
            let mut record = Vec::with_capacity(self.columns.len() + 1);
            record.push(i.to_string());
            for column in &self.columns {
                record.push(format_cell(row.values.get(column)));
            }
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of `column`, `None` where a row lacks it.
    pub fn column(&self, column: &str) -> Vec<Option<&Value>> {
        self.rows.iter().map(|r| r.values.get(column)).collect()
    }
}

fn compare_cells(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::Number(_)), Some(_)) => Ordering::Less,
        (Some(_), Some(Value::Number(_))) => Ordering::Greater,
        (Some(x), Some(y)) => format_cell(Some(x)).cmp(&format_cell(Some(y))),
    }
}

fn format_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(true)) => "True".to_string(),
        Some(Value::Bool(false)) => "False".to_string(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn csv_string(table: &Table) -> String {
        let mut out = Vec::new();
        table.write_csv(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_from_value_list_of_objects() {
        let table = Table::from_value(
            &json!([{"Source": "Hay/Pasture", "TotalN": 1.5}, {"Source": "Cropland", "TotalP": 0.2}]),
            "Loads",
        )
        .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.columns(), &["Source", "TotalN", "TotalP"]);
    }

    #[test]
    fn test_from_value_object_of_lists() {
        let table =
            Table::from_value(&json!({"AvPrecipitation": [1.0, 2.0], "units": "cm"}), "monthly")
                .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[1].values["AvPrecipitation"], json!(2.0));
        assert_eq!(table.rows()[1].values["units"], json!("cm"));
    }

    #[test]
    fn test_from_value_rejects_scalars() {
        assert!(Table::from_value(&json!(3), "meta").is_err());
        assert!(Table::from_value(&json!([1, 2]), "Loads").is_err());
    }

    #[test]
    fn test_append_widens_columns_and_blanks_missing() {
        let mut table = Table::from_value(&json!([{"a": 1}]), "t").unwrap();
        table.append(Table::from_value(&json!([{"b": "x"}]), "t").unwrap());
        assert_eq!(csv_string(&table), ",a,b\n0,1,\n1,,x\n");
    }

    #[test]
    fn test_labeled_rows_and_label_filter() {
        let catchment = json!({
            "TotalLoadingRates": {"TotalN": 10.0, "TotalP": 1.0},
            "LoadingRateConcentrations": {"TotalN": 2.5},
        });
        let table = Table::from_labeled_rows(catchment.as_object().unwrap());
        assert_eq!(table.len(), 2);
        let rates = table.with_label("TotalLoadingRates");
        assert_eq!(rates.len(), 1);
        assert_eq!(rates.rows()[0].values["TotalP"], json!(1.0));
        let concs = table.with_label("LoadingRateConcentrations");
        assert_eq!(concs.len(), 1);
        assert_eq!(concs.columns(), &["TotalN", "TotalP"]);
        assert!(table.with_label("Other").is_empty());
    }

    #[test]
    fn test_sort_numeric_then_text_with_nulls_last() {
        let mut table = Table::from_value(
            &json!([
                {"huc": "020402", "month": 2},
                {"huc": "020401", "month": 10},
                {"huc": "020401", "month": 9},
                {"huc": null, "month": 1},
            ]),
            "monthly",
        )
        .unwrap();
        table.sort_by_columns(&["huc", "month"]);
        let months: Vec<_> = table.column("month").into_iter().map(|v| v.cloned()).collect();
        assert_eq!(
            months,
            vec![Some(json!(9)), Some(json!(10)), Some(json!(2)), Some(json!(1))]
        );
    }

    #[test]
    fn test_position_column_and_set_column() {
        let mut table = Table::from_value(&json!([{"q": 1}, {"q": 2}]), "monthly").unwrap();
        table.set_position_column("month", 1);
        table.set_column("huc", json!("020401010101"));
        assert_eq!(
            csv_string(&table),
            ",q,month,huc\n0,1,1,020401010101\n1,2,2,020401010101\n"
        );
    }

    #[test]
    fn test_format_cells() {
        assert_eq!(format_cell(Some(&json!(true))), "True");
        assert_eq!(format_cell(Some(&json!(1.25))), "1.25");
        assert_eq!(format_cell(Some(&json!([1, 2]))), "[1,2]");
        assert_eq!(format_cell(None), "");
    }
}
