//! Normalization of raw engine results into values, rows and tables.

use tracing::debug;

use crate::error::{Error, Result};
use crate::marshal::{Row, Table, ValueMarshaler};
use crate::table::flatten_keyed;
use crate::value::Cell;
use crate::wire::WireValue;

/// A result in the most specific shape it fits.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultShape {
    Value(Cell),
    Row(Row),
    Table(Table),
}

impl ResultShape {
    pub fn is_value(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    pub fn is_row(&self) -> bool {
        matches!(self, Self::Row(_))
    }

    pub fn is_table(&self) -> bool {
        matches!(self, Self::Table(_))
    }

    pub fn as_value(&self) -> Option<&Cell> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_row(&self) -> Option<&Row> {
        match self {
            Self::Row(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Self::Table(t) => Some(t),
            _ => None,
        }
    }

    /// Widens any shape back to rows.
    pub fn into_rows(self) -> Table {
        match self {
            Self::Value(v) => vec![vec![v]],
            Self::Row(r) => vec![r],
            Self::Table(t) => t,
        }
    }

    pub fn row_count(&self) -> usize {
        match self {
            Self::Value(_) | Self::Row(_) => 1,
            Self::Table(t) => t.len(),
        }
    }
}

/// Picks the narrowest [ResultShape] for engine results.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultShaper {
    marshaler: ValueMarshaler,
}

impl ResultShaper {
    pub fn new(marshaler: ValueMarshaler) -> Self {
        Self { marshaler }
    }

    /// Zero rows stay an (empty) table, one row collapses to a row, more
    /// rows stay a table.
    pub fn collapse(rows: Table) -> ResultShape {
        match rows.len() {
            1 => ResultShape::Row(rows.into_iter().next().unwrap_or_default()),
            _ => ResultShape::Table(rows),
        }
    }

    /// Shapes a tabular result (plain or keyed table).
    ///
    /// # Errors
    /// Returns [Error::Type] when the result is not a table.
    pub fn shape_table(&self, wire: &WireValue) -> Result<ResultShape> {
        let rows = match wire {
            WireValue::Table(t) => self.marshaler.table_from_wire(t)?,
            WireValue::Dict { keys, values } => {
                self.marshaler.table_from_wire(&flatten_keyed(keys, values)?)?
            }
            other => {
                return Err(Error::type_error(format!(
                    "expected a table, found {}",
                    other.kind()
                )));
            }
        };
        log_size(&rows);
        Ok(Self::collapse(rows))
    }

    /// Shapes the result of a positional selection.
    ///
    /// - an atom becomes a value
    /// - a vector, a dictionary or a list of atoms becomes a row
    /// - a list of lists holds one list per selected column and becomes a
    ///   table, collapsed like [Self::shape_table]
    pub fn shape_selection(&self, wire: &WireValue) -> Result<ResultShape> {
        match wire {
            WireValue::Atom(_) | WireValue::Unit => {
                Ok(ResultShape::Value(self.marshaler.from_wire_value(wire)?))
            }
            WireValue::Vector(_) | WireValue::Dict { .. } => {
                Ok(ResultShape::Row(self.marshaler.list_from_wire(wire)?))
            }
            WireValue::List(items) if items.is_empty() => Ok(ResultShape::Row(Vec::new())),
            WireValue::List(items) if items.iter().all(is_column) => {
                let rows = self.marshaler.columns_to_rows(items)?;
                log_size(&rows);
                Ok(Self::collapse(rows))
            }
            WireValue::List(_) => Ok(ResultShape::Row(self.marshaler.list_from_wire(wire)?)),
            WireValue::Table(_) => self.shape_table(wire),
            WireValue::Error(msg) => Err(Error::type_error(format!(
                "cannot shape an error payload: {msg}"
            ))),
        }
    }
}

/// Char vectors are strings, not columns.
fn is_column(wire: &WireValue) -> bool {
    match wire {
        WireValue::Vector(v) => v.type_code() != crate::TypeId::Char.code(),
        WireValue::List(_) => true,
        _ => false,
    }
}

fn log_size(rows: &Table) {
    debug!(
        rows = rows.len(),
        bytes = allocative::size_of_unique_allocated_data(rows),
        "shaped result"
    );
}
