//! Accumulates grid metadata, column metadata, and row cells, performing
//! per-column type sanitization when [`GridBuilder::build`] is called.

use crate::dict::Dict;
use crate::error::{Result, ZincError};
use crate::grid::Grid;
use crate::scalar::{NumberValue, Scalar};

/// The sanitized representation of one non-index column, chosen by
/// [`GridBuilder::build`] from the column's `kind`/`enum` meta (or, absent
/// both, by sampling up to 1000 leading non-missing cells).
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Number(Vec<Option<NumberValue>>),
    Bool(Vec<Option<bool>>),
    Enum {
        categories: Vec<String>,
        values: Vec<Option<String>>,
    },
    Raw(Vec<Scalar>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Number(v) => v.len(),
            ColumnData::Bool(v) => v.len(),
            ColumnData::Enum { values, .. } => values.len(),
            ColumnData::Raw(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reconstructs the cell at `row` as a [`Scalar`], reattaching the
    /// column's declared unit to numeric cells. Used both by the emitter
    /// and by round-trip tests.
    pub(crate) fn reconstruct(&self, row: usize, unit: Option<&str>) -> Scalar {
        match self {
            ColumnData::Number(values) => match values[row] {
                Some(value) => Scalar::Number(value, unit.map(str::to_string)),
                None => Scalar::Null,
            },
            ColumnData::Bool(values) => match values[row] {
                Some(value) => Scalar::Bool(value),
                None => Scalar::Null,
            },
            ColumnData::Enum { values, .. } => match &values[row] {
                Some(value) => Scalar::Str(value.clone()),
                None => Scalar::Null,
            },
            ColumnData::Raw(values) => values[row].clone(),
        }
    }
}

const SAMPLE_LIMIT: usize = 1000;

/// The one in-progress column before sanitization: its declared meta plus
/// the raw cells collected row by row.
struct RawColumn {
    name: String,
    meta: Dict,
    cells: Vec<Scalar>,
}

pub struct GridBuilder {
    version: u8,
    grid_info: Dict,
    columns: Vec<RawColumn>,
    row_count: usize,
}

impl GridBuilder {
    pub fn new(version: u8) -> Self {
        GridBuilder {
            version,
            grid_info: Dict::new(),
            columns: Vec::new(),
            row_count: 0,
        }
    }

    pub fn add_meta(&mut self, meta: Dict) {
        self.grid_info = meta;
    }

    pub fn add_col(&mut self, name: impl Into<String>, meta: Dict) -> Result<()> {
        let name = name.into();
        if self.columns.iter().any(|c| c.name == name) {
            return Err(ZincError::parse(0, format!("duplicate column name: {name}")));
        }
        self.columns.push(RawColumn {
            name,
            meta,
            cells: Vec::new(),
        });
        Ok(())
    }

    pub fn add_row(&mut self, cells: Vec<Scalar>) -> Result<()> {
        if cells.len() != self.columns.len() {
            return Err(ZincError::parse(
                0,
                format!(
                    "row has {} cells but grid declares {} columns",
                    cells.len(),
                    self.columns.len()
                ),
            ));
        }
        for (col, cell) in self.columns.iter_mut().zip(cells) {
            col.cells.push(cell);
        }
        self.row_count += 1;
        Ok(())
    }

    pub fn build(mut self) -> Result<Grid> {
        if self.columns.is_empty() {
            return Err(ZincError::parse(0, "no columns defined"));
        }

        let ts = self.columns.remove(0);
        if ts.name != "ts" {
            return Err(ZincError::parse(
                0,
                format!("first column must be named 'ts', found '{}'", ts.name),
            ));
        }

        let mut columns_order = vec![(ts.name.clone(), ts.meta.clone())];
        let mut data = Vec::with_capacity(self.columns.len());

        for col in self.columns {
            let (name, meta, sanitized) = sanitize_column(col, self.row_count);
            columns_order.push((name.clone(), meta));
            data.push((name, sanitized));
        }

        Grid::new(
            self.version,
            self.grid_info,
            columns_order,
            ts.cells,
            data,
        )
    }
}

fn sanitize_column(col: RawColumn, row_count: usize) -> (String, Dict, ColumnData) {
    let RawColumn { name, mut meta, cells } = col;

    let kind = meta
        .get("kind")
        .and_then(as_str)
        .map(str::to_string);
    let enum_spec = meta.get("enum").and_then(as_str).map(str::to_string);

    let data = if let Some(categories_csv) = enum_spec {
        let categories: Vec<String> = categories_csv.split(',').map(str::to_string).collect();
        let values = cells
            .iter()
            .map(|c| match c {
                Scalar::Str(s) => Some(s.clone()),
                _ => None,
            })
            .collect();
        ColumnData::Enum { categories, values }
    } else {
        match kind.as_deref() {
            Some("Number") => coerce_numeric(&cells, &mut meta),
            Some("Str") => ColumnData::Raw(cells),
            Some(_) => ColumnData::Raw(cells),
            None => infer_and_coerce(&cells, &mut meta, row_count),
        }
    };

    let _ = row_count;
    let name = meta.get("id").map(Scalar::to_string).unwrap_or(name);
    (name, meta, data)
}

fn infer_and_coerce(cells: &[Scalar], meta: &mut Dict, row_count: usize) -> ColumnData {
    let sample_len = row_count.min(SAMPLE_LIMIT);
    let sample = cells.iter().take(sample_len).filter(|c| !c.is_missing());

    let mut saw_number = false;
    let mut saw_bool = false;
    for cell in sample {
        match cell {
            Scalar::Number(..) => saw_number = true,
            Scalar::Bool(_) => saw_bool = true,
            _ => {}
        }
    }

    if saw_number {
        coerce_numeric(cells, meta)
    } else if saw_bool {
        let values = cells
            .iter()
            .map(|c| match c {
                Scalar::Bool(b) => Some(*b),
                _ => None,
            })
            .collect();
        ColumnData::Bool(values)
    } else {
        ColumnData::Raw(cells.to_vec())
    }
}

fn coerce_numeric(cells: &[Scalar], meta: &mut Dict) -> ColumnData {
    let mut unit_seen: Option<String> = None;
    let values = cells
        .iter()
        .map(|c| match c {
            Scalar::Number(value, unit) => {
                if unit_seen.is_none() {
                    unit_seen = unit.clone();
                }
                Some(*value)
            }
            _ => None,
        })
        .collect();
    if !meta.contains_key("unit") {
        if let Some(unit) = unit_seen {
            meta.insert("unit", Scalar::Str(unit));
        }
    }
    ColumnData::Number(values)
}

fn as_str(scalar: &Scalar) -> Option<&str> {
    match scalar {
        Scalar::Str(s) => Some(s.as_str()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_declared_number_column_and_drops_unit_into_meta() {
        let mut builder = GridBuilder::new(3);
        builder.add_col("ts", Dict::new()).unwrap();
        let mut meta = Dict::new();
        meta.insert("kind", Scalar::Str("Number".to_string()));
        builder.add_col("v0", meta).unwrap();
        builder
            .add_row(vec![Scalar::Null, Scalar::Number(NumberValue::Float(1.0), Some("kW".to_string()))])
            .unwrap();
        let grid = builder.build().unwrap();
        let unit = grid.column_info().get("v0").unwrap().get("unit").unwrap();
        assert_eq!(unit, &Scalar::Str("kW".to_string()));
    }

    #[test]
    fn infers_bool_column_without_kind_tag() {
        let mut builder = GridBuilder::new(3);
        builder.add_col("ts", Dict::new()).unwrap();
        builder.add_col("v0", Dict::new()).unwrap();
        builder.add_row(vec![Scalar::Null, Scalar::Bool(false)]).unwrap();
        builder.add_row(vec![Scalar::Null, Scalar::Null]).unwrap();
        builder.add_row(vec![Scalar::Null, Scalar::Bool(true)]).unwrap();
        let grid = builder.build().unwrap();
        assert_eq!(grid.cell(1, 0), Scalar::Bool(false));
        assert_eq!(grid.cell(1, 1), Scalar::Null);
        assert_eq!(grid.cell(1, 2), Scalar::Bool(true));
    }

    #[test]
    fn renames_column_to_printed_id_ref() {
        let mut builder = GridBuilder::new(3);
        builder.add_col("ts", Dict::new()).unwrap();
        let mut v0_meta = Dict::new();
        v0_meta.insert(
            "id",
            Scalar::Ref {
                uid: "x".to_string(),
                display: None,
            },
        );
        builder.add_col("v0", v0_meta).unwrap();
        let mut v1_meta = Dict::new();
        v1_meta.insert(
            "id",
            Scalar::Ref {
                uid: "y".to_string(),
                display: Some("Building One".to_string()),
            },
        );
        builder.add_col("v1", v1_meta).unwrap();
        builder.add_row(vec![Scalar::Null, Scalar::Null, Scalar::Null]).unwrap();
        let grid = builder.build().unwrap();
        let names: Vec<&str> = grid.column_info().keys().map(String::as_str).collect();
        assert_eq!(names, vec!["ts", "@x", "@y \"Building One\""]);
    }

    #[test]
    fn rejects_row_width_mismatch() {
        let mut builder = GridBuilder::new(3);
        builder.add_col("ts", Dict::new()).unwrap();
        assert!(builder.add_row(vec![Scalar::Null, Scalar::Null]).is_err());
    }

    #[test]
    fn rejects_missing_ts_column() {
        let mut builder = GridBuilder::new(3);
        builder.add_col("v0", Dict::new()).unwrap();
        assert!(builder.build().is_err());
    }
}
