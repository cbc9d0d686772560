//! Row-oriented numeric feature table
//!
//! Built fresh per request from an uploaded CSV or a manual JSON payload,
//! discarded after the response. Only numeric columns are kept; the scaler
//! alignment in `preprocess` works purely on column names.

use anyhow::Context;

/// Numeric columns in their original order, all of length `n_rows`.
#[derive(Debug, Clone)]
pub struct FeatureTable {
    n_rows: usize,
    columns: Vec<(String, Vec<f32>)>,
}

impl FeatureTable {
    /// Parse a CSV byte buffer into a table, keeping only the columns whose
    /// non-empty cells all parse as numbers. Empty cells become 0.0.
    pub fn from_csv(bytes: &[u8]) -> anyhow::Result<Self> {
        let mut reader = csv::Reader::from_reader(bytes);
        let headers: Vec<String> = reader
            .headers()
            .context("reading CSV header row")?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut records = Vec::new();
        for record in reader.records() {
            records.push(record.context("reading CSV record")?);
        }
        let n_rows = records.len();

        let mut columns = Vec::new();
        'columns: for (idx, name) in headers.iter().enumerate() {
            let mut values = Vec::with_capacity(n_rows);
            for record in &records {
                let raw = record.get(idx).unwrap_or("").trim();
                if raw.is_empty() {
                    values.push(0.0);
                    continue;
                }
                match raw.parse::<f32>() {
                    Ok(v) => values.push(v),
                    // Non-numeric column, drop it entirely
                    Err(_) => continue 'columns,
                }
            }
            columns.push((name.clone(), values));
        }

        Ok(Self { n_rows, columns })
    }

    /// Build a single-row table from named values, preserving order.
    pub fn from_row(values: Vec<(String, f32)>) -> Self {
        Self {
            n_rows: 1,
            columns: values.into_iter().map(|(name, v)| (name, vec![v])).collect(),
        }
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Column values by name, if the column exists (and is numeric).
    pub fn column(&self, name: &str) -> Option<&[f32]> {
        self.columns
            .iter()
            .find(|(col, _)| col == name)
            .map(|(_, values)| values.as_slice())
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &[f32])> {
        self.columns
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_numeric_columns_only() {
        let csv = b"pktcount,proto,bytecount\n10,tcp,500\n20,udp,900\n";
        let table = FeatureTable::from_csv(csv).unwrap();

        assert_eq!(table.n_rows(), 2);
        assert_eq!(table.n_columns(), 2);
        assert_eq!(table.column("pktcount"), Some(&[10.0, 20.0][..]));
        assert_eq!(table.column("bytecount"), Some(&[500.0, 900.0][..]));
        assert!(table.column("proto").is_none());
    }

    #[test]
    fn test_csv_empty_cells_become_zero() {
        let csv = b"duration,flows\n1.5,\n,3\n";
        let table = FeatureTable::from_csv(csv).unwrap();

        assert_eq!(table.column("duration"), Some(&[1.5, 0.0][..]));
        assert_eq!(table.column("flows"), Some(&[0.0, 3.0][..]));
    }

    #[test]
    fn test_csv_no_data_rows() {
        let csv = b"pktcount,bytecount\n";
        let table = FeatureTable::from_csv(csv).unwrap();

        assert_eq!(table.n_rows(), 0);
        assert_eq!(table.n_columns(), 2);
    }

    #[test]
    fn test_from_row_preserves_order() {
        let table = FeatureTable::from_row(vec![
            ("pktcount".to_string(), 100.0),
            ("bytecount".to_string(), 500.0),
        ]);

        assert_eq!(table.n_rows(), 1);
        let names: Vec<&str> = table.columns().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["pktcount", "bytecount"]);
        assert_eq!(table.column("bytecount"), Some(&[500.0][..]));
    }
}
