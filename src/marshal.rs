//! Conversion between host values and the engine's wire and literal forms.

use std::sync::Arc;

use crate::data_type::TypeId;
use crate::error::{Error, Result};
use crate::registry::{TypeRegistry, registry};
use crate::value::{Cell, TypedValue};
use crate::wire::{ColumnData, WireTable, WireValue, WireVector};

/// Cells of one row, in column order.
pub type Row = Vec<Cell>;

/// Rows of a table, in engine order.
pub type Table = Vec<Row>;

/// Converts values one at a time and whole results in bulk, always through
/// the [TypeRegistry].
#[derive(Debug, Clone, Copy)]
pub struct ValueMarshaler {
    registry: &'static TypeRegistry,
}

impl Default for ValueMarshaler {
    fn default() -> Self {
        Self::new(registry())
    }
}

impl ValueMarshaler {
    pub fn new(registry: &'static TypeRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'static TypeRegistry {
        self.registry
    }

    /// Literal text of a cell; `None` renders as the null literal of `id`.
    pub fn to_query_literal(&self, cell: Option<&TypedValue>, id: TypeId) -> String {
        self.registry.encode_cell(cell, id)
    }

    /// Decodes a single value: an atom, a one-element vector or the generic
    /// null.
    ///
    /// # Errors
    /// Returns [Error::Type] for anything wider than one value.
    pub fn from_wire_value(&self, wire: &WireValue) -> Result<Cell> {
        match wire {
            WireValue::Unit => Ok(None),
            WireValue::Atom(v) => self.first(v),
            WireValue::Vector(v) if v.len() == 1 => self.first(v),
            other => Err(Error::type_error(format!(
                "expected a single value, found {} of length {}",
                other.kind(),
                other.len()
            ))),
        }
    }

    fn first(&self, vector: &WireVector) -> Result<Cell> {
        if vector.is_empty() {
            return Ok(None);
        }
        self.registry.decode(vector, 0)
    }

    /// Decodes an element of a general list as a length-one value.
    ///
    /// A char vector inside a list is a string and is kept whole, as a
    /// symbol.
    fn element(&self, wire: &WireValue) -> Result<Cell> {
        match wire {
            WireValue::Vector(v) if v.type_code() == TypeId::Char.code() => match v.data() {
                ColumnData::Char(bytes) => {
                    let text = String::from_utf8_lossy(bytes);
                    Ok((!text.is_empty()).then(|| TypedValue::Symbol(Arc::from(text.as_ref()))))
                }
                _ => self.first(v),
            },
            WireValue::Vector(v) => self.first(v),
            WireValue::List(items) => items.first().map_or(Ok(None), |item| self.element(item)),
            other => self.from_wire_value(other),
        }
    }

    /// Decodes position `index` of a column, `None` when the column is
    /// shorter than `index`.
    fn cell_at(&self, column: &WireValue, index: usize) -> Result<Cell> {
        match column {
            WireValue::Vector(v) => {
                if index < v.len() {
                    self.registry.decode(v, index)
                } else {
                    Ok(None)
                }
            }
            WireValue::List(items) => items.get(index).map_or(Ok(None), |item| self.element(item)),
            WireValue::Atom(v) if index == 0 => self.first(v),
            WireValue::Atom(_) | WireValue::Unit => Ok(None),
            other => Err(Error::type_error(format!(
                "a {} cannot be a table column",
                other.kind()
            ))),
        }
    }

    /// Decodes a list into one row.
    ///
    /// Homogeneous vectors decode position by position; every element of a
    /// general list is decoded on its own.
    pub fn list_from_wire(&self, wire: &WireValue) -> Result<Row> {
        match wire {
            WireValue::Vector(v) => (0..v.len()).map(|i| self.registry.decode(v, i)).collect(),
            WireValue::List(items) => items.iter().map(|item| self.element(item)).collect(),
            WireValue::Atom(_) | WireValue::Unit => Ok(vec![self.from_wire_value(wire)?]),
            WireValue::Dict { values, .. } => self.list_from_wire(values),
            other => Err(Error::type_error(format!(
                "expected a list, found {}",
                other.kind()
            ))),
        }
    }

    /// Converts a column-major table into rows.
    ///
    /// The row count is the first column's length; cells of shorter columns
    /// are filled with null.
    ///
    /// # Example
    /// ```
    /// # use qframe::marshal::ValueMarshaler;
    /// # use qframe::wire::{WireTable, WireValue};
    /// # use qframe::TypedValue;
    /// let table = WireTable::new(
    ///     vec!["ticker".into(), "price".into()],
    ///     vec![WireValue::symbols(["GOOG", "MSFT"]), WireValue::longs([20])],
    /// );
    /// let rows = ValueMarshaler::default().table_from_wire(&table).unwrap();
    /// assert_eq!(rows[1], vec![Some(TypedValue::symbol("MSFT")), None]);
    /// ```
    pub fn table_from_wire(&self, table: &WireTable) -> Result<Table> {
        if table.columns.len() != table.data.len() {
            return Err(Error::type_error(format!(
                "table declares {} columns but carries {}",
                table.columns.len(),
                table.data.len()
            )));
        }
        (0..table.row_count())
            .map(|i| table.data.iter().map(|column| self.cell_at(column, i)).collect())
            .collect()
    }

    /// Transposes a list of column lists into rows; the longest column sets
    /// the row count.
    pub fn columns_to_rows(&self, columns: &[WireValue]) -> Result<Table> {
        let count = columns.iter().map(WireValue::len).max().unwrap_or(0);
        (0..count)
            .map(|i| columns.iter().map(|column| self.cell_at(column, i)).collect())
            .collect()
    }

    /// Reads a non-negative count from an integral atom.
    pub fn count_from_wire(&self, wire: &WireValue) -> Result<usize> {
        let cell = self.from_wire_value(wire)?;
        cell.as_ref()
            .and_then(TypedValue::as_i64)
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| Error::type_error(format!("expected a count, found {cell:?}")))
    }

    /// Reads a symbol vector (or a single symbol) as names.
    pub fn symbols_from_wire(&self, wire: &WireValue) -> Result<Vec<String>> {
        self.list_from_wire(wire)?
            .into_iter()
            .map(|cell| match cell {
                Some(TypedValue::Symbol(s)) => Ok(s.to_string()),
                other => Err(Error::type_error(format!("expected a symbol, found {other:?}"))),
            })
            .collect()
    }

    /// Renders host rows as an unkeyed table literal, `([] a:(..); b:(..))`.
    ///
    /// Each column takes the type of its first non-null cell, and its nulls
    /// render as that type's null literal. Columns without any value are
    /// filled with the generic null `::`.
    ///
    /// # Errors
    /// Returns [Error::Validation] when there are no columns or rows, or when
    /// a row's width differs from the column count.
    pub fn table_literal<S: AsRef<str>>(&self, columns: &[S], rows: &[Row]) -> Result<String> {
        if columns.is_empty() {
            return Err(Error::validation("a table needs at least one column"));
        }
        if rows.is_empty() {
            return Err(Error::validation("a table needs at least one row"));
        }
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != columns.len()) {
            return Err(Error::validation(format!(
                "row {i} has {} cells but the table has {} columns",
                row.len(),
                columns.len()
            )));
        }

        let mut parts = Vec::with_capacity(columns.len());
        for (j, name) in columns.iter().enumerate() {
            let column_type = rows
                .iter()
                .find_map(|row| row[j].as_ref())
                .map(TypedValue::type_id);
            let cells: Vec<String> = rows
                .iter()
                .map(|row| match column_type {
                    Some(id) => self.to_query_literal(row[j].as_ref(), id),
                    None => "::".to_string(),
                })
                .collect();
            let body = if cells.len() == 1 {
                format!("enlist {}", cells[0])
            } else {
                format!("({})", cells.join(";"))
            };
            parts.push(format!("{}:{body}", name.as_ref()));
        }
        Ok(format!("([] {})", parts.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marshaler() -> ValueMarshaler {
        ValueMarshaler::default()
    }

    #[test]
    fn test_from_wire_value() {
        let m = marshaler();
        assert_eq!(m.from_wire_value(&WireValue::long(5)).unwrap(), Some(TypedValue::Long(5)));
        assert_eq!(m.from_wire_value(&WireValue::Unit).unwrap(), None);
        assert_eq!(
            m.from_wire_value(&WireValue::symbols(["x"])).unwrap(),
            Some(TypedValue::symbol("x"))
        );
        assert!(matches!(
            m.from_wire_value(&WireValue::longs([1, 2])),
            Err(Error::Type(_))
        ));
    }

    #[test]
    fn test_table_from_wire_fills_short_columns() {
        let m = marshaler();
        let table = WireTable::new(
            vec!["ticker".into(), "price".into(), "size".into()],
            vec![
                WireValue::symbols(["GOOG", "MSFT", "AAPL"]),
                WireValue::longs([20, i64::MIN, 40]),
                WireValue::longs([10]),
            ],
        );
        let rows = m.table_from_wire(&table).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[0],
            vec![
                Some(TypedValue::symbol("GOOG")),
                Some(TypedValue::Long(20)),
                Some(TypedValue::Long(10))
            ]
        );
        assert_eq!(rows[1][1], None);
        assert_eq!(rows[2][2], None);
    }

    #[test]
    fn test_table_from_wire_rejects_ragged_header() {
        let table = WireTable::new(vec!["a".into()], vec![]);
        assert!(matches!(marshaler().table_from_wire(&table), Err(Error::Type(_))));
    }

    #[test]
    fn test_list_from_wire() {
        let m = marshaler();
        assert_eq!(
            m.list_from_wire(&WireValue::longs([1, 2])).unwrap(),
            vec![Some(TypedValue::Long(1)), Some(TypedValue::Long(2))]
        );

        let mixed = WireValue::List(vec![
            WireValue::atom(TypedValue::symbol("MSFT")),
            WireValue::long(30),
            WireValue::chars("Microsoft"),
            WireValue::longs([]),
        ]);
        assert_eq!(
            m.list_from_wire(&mixed).unwrap(),
            vec![
                Some(TypedValue::symbol("MSFT")),
                Some(TypedValue::Long(30)),
                Some(TypedValue::symbol("Microsoft")),
                None
            ]
        );
    }

    #[test]
    fn test_columns_to_rows() {
        let m = marshaler();
        let rows = m
            .columns_to_rows(&[WireValue::symbols(["GOOG", "MSFT"]), WireValue::longs([20, 30])])
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec![Some(TypedValue::symbol("MSFT")), Some(TypedValue::Long(30))]);
    }

    #[test]
    fn test_counts_and_symbols() {
        let m = marshaler();
        assert_eq!(m.count_from_wire(&WireValue::long(3)).unwrap(), 3);
        assert!(m.count_from_wire(&WireValue::long(-1)).is_err());
        assert!(m.count_from_wire(&WireValue::atom(TypedValue::symbol("x"))).is_err());
        assert_eq!(
            m.symbols_from_wire(&WireValue::symbols(["bid", "ask"])).unwrap(),
            vec!["bid", "ask"]
        );
        assert!(m.symbols_from_wire(&WireValue::longs([1])).is_err());
    }

    #[test]
    fn test_table_literal() {
        let m = marshaler();
        let rows = vec![
            vec![Some(TypedValue::symbol("GOOG")), Some(TypedValue::Long(20)), None],
            vec![Some(TypedValue::symbol("MSFT")), None, None],
        ];
        assert_eq!(
            m.table_literal(&["ticker", "price", "note"], &rows).unwrap(),
            "([] ticker:(`GOOG;`MSFT); price:(20j;0Nj); note:(::;::))"
        );

        let single = vec![vec![Some(TypedValue::Float(1.5))]];
        assert_eq!(m.table_literal(&["px"], &single).unwrap(), "([] px:enlist 1.5f)");
    }

    #[test]
    fn test_table_literal_validation() {
        let m = marshaler();
        let empty: &[&str] = &[];
        assert!(matches!(m.table_literal(empty, &[vec![]]), Err(Error::Validation(_))));
        assert!(matches!(m.table_literal(&["a"], &[]), Err(Error::Validation(_))));
        let ragged = vec![vec![Some(TypedValue::Long(1)), None]];
        assert!(matches!(m.table_literal(&["a"], &ragged), Err(Error::Validation(_))));
    }
}
