//! The immutable, parsed and sanitized representation of a Zinc grid.

use crate::builder::ColumnData;
use crate::dict::Dict;
use crate::error::Result;
use crate::scalar::Scalar;
use indexmap::IndexMap;

/// A parsed grid: grid-level metadata, ordered column metadata (the `ts`
/// index column first), the index itself, and one sanitized [`ColumnData`]
/// per remaining column.
///
/// Built exclusively by [`crate::builder::GridBuilder::build`]; there is no
/// public constructor, so a `Grid` in hand has already passed sanitization.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    version: u8,
    grid_info: Dict,
    column_info: IndexMap<String, Dict>,
    index: Vec<Scalar>,
    columns: Vec<(String, ColumnData)>,
}

impl Grid {
    pub(crate) fn new(
        version: u8,
        grid_info: Dict,
        columns_meta: Vec<(String, Dict)>,
        index: Vec<Scalar>,
        columns: Vec<(String, ColumnData)>,
    ) -> Result<Self> {
        let column_info = columns_meta.into_iter().collect();
        Ok(Grid {
            version,
            grid_info,
            column_info,
            index,
            columns,
        })
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn grid_info(&self) -> &Dict {
        &self.grid_info
    }

    /// Column metadata in declaration order, keyed by column name. The
    /// index column (`ts`) is included, first.
    pub fn column_info(&self) -> &IndexMap<String, Dict> {
        &self.column_info
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.column_info.keys().map(String::as_str)
    }

    pub fn row_count(&self) -> usize {
        self.index.len()
    }

    /// The cell at `(col, row)`, `col` counting the `ts` column as `0`.
    pub fn cell(&self, col: usize, row: usize) -> Scalar {
        if col == 0 {
            return self.index[row].clone();
        }
        let (name, data) = &self.columns[col - 1];
        let unit = self
            .column_info
            .get(name)
            .and_then(|meta| meta.get("unit"))
            .map(column_unit_text);
        data.reconstruct(row, unit.as_deref())
    }

    /// Reconstructs every row as a vector of cells, `ts` first.
    pub fn rows(&self) -> Vec<Vec<Scalar>> {
        (0..self.row_count())
            .map(|row| (0..=self.columns.len()).map(|col| self.cell(col, row)).collect())
            .collect()
    }

    pub(crate) fn data_columns(&self) -> &[(String, ColumnData)] {
        &self.columns
    }

    /// The sanitized column-major representation of one non-`ts` column, as
    /// chosen by [`crate::builder::GridBuilder::build`]. This is the
    /// collaborator interface a tabular back-end reads to build its own
    /// frame; this crate does not itself build one (see §1's Non-goals).
    pub fn data(&self, name: &str) -> Option<&ColumnData> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, d)| d)
    }
}

fn column_unit_text(unit: &Scalar) -> String {
    match unit {
        Scalar::Str(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GridBuilder;
    use crate::scalar::NumberValue;

    #[test]
    fn reconstructs_numeric_cells_with_unit() {
        let mut builder = GridBuilder::new(3);
        builder.add_col("ts", Dict::new()).unwrap();
        let mut meta = Dict::new();
        meta.insert("kind", Scalar::Str("Number".to_string()));
        builder.add_col("v0", meta).unwrap();
        builder
            .add_row(vec![
                Scalar::Null,
                Scalar::Number(NumberValue::Float(2.5), Some("kW".to_string())),
            ])
            .unwrap();
        let grid = builder.build().unwrap();
        assert_eq!(
            grid.cell(1, 0),
            Scalar::Number(NumberValue::Float(2.5), Some("kW".to_string()))
        );
    }
}
