use crate::data_type::TypeId;
use crate::error::{Error, Result};
use crate::marshal::ValueMarshaler;
use crate::value::TypedValue;
use crate::wire::{WireTable, WireValue};

/// Column definition as reported by the engine's `meta`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMeta {
    pub name: String,
    /// Raw type char; upper case for nested vector columns, blank for
    /// general lists.
    pub type_char: char,
    /// `None` when the column does not hold atoms of a single type.
    pub type_id: Option<TypeId>,
}

impl ColumnMeta {
    pub fn new(name: impl Into<String>, type_char: char) -> Self {
        Self {
            name: name.into(),
            type_char,
            type_id: TypeId::from_char(type_char),
        }
    }
}

/// Ordered column definitions of one table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableMeta {
    pub columns: Vec<ColumnMeta>,
}

impl TableMeta {
    pub fn new(columns: Vec<ColumnMeta>) -> Self {
        Self { columns }
    }

    /// Reads the `c`/`t` columns of a `meta` result.
    ///
    /// # Errors
    /// Returns [Error::Type] if the result does not look like `meta` output.
    pub fn from_wire(wire: &WireValue, marshaler: &ValueMarshaler) -> Result<Self> {
        let table = match wire {
            WireValue::Table(t) => t.clone(),
            WireValue::Dict { keys, values } => flatten_keyed(keys, values)?,
            other => {
                return Err(Error::type_error(format!(
                    "expected column metadata table, found {}",
                    other.kind()
                )));
            }
        };
        let names = table
            .column("c")
            .ok_or_else(|| Error::type_error("metadata has no `c` column"))?;
        let types = table
            .column("t")
            .ok_or_else(|| Error::type_error("metadata has no `t` column"))?;

        let names = marshaler.symbols_from_wire(names)?;
        let types = marshaler.list_from_wire(types)?;
        if names.len() != types.len() {
            return Err(Error::type_error(format!(
                "metadata lists {} names but {} types",
                names.len(),
                types.len()
            )));
        }

        let columns = names
            .into_iter()
            .zip(types)
            .map(|(name, t)| {
                let type_char = match t {
                    Some(TypedValue::Char(c)) => c,
                    _ => ' ',
                };
                ColumnMeta::new(name, type_char)
            })
            .collect();
        Ok(Self { columns })
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnMeta> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn name_at(&self, index: usize) -> Option<&str> {
        self.columns.get(index).map(|c| c.name.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Whether `name` is declared as a symbol column.
    pub fn is_symbol(&self, name: &str) -> bool {
        self.column(name)
            .is_some_and(|c| c.type_id == Some(TypeId::Symbol))
    }
}

/// Joins the key and value halves of a keyed table, key columns first.
pub fn flatten_keyed(keys: &WireValue, values: &WireValue) -> Result<WireTable> {
    match (keys, values) {
        (WireValue::Table(k), WireValue::Table(v)) => {
            let mut columns = k.columns.clone();
            columns.extend(v.columns.iter().cloned());
            let mut data = k.data.clone();
            data.extend(v.data.iter().cloned());
            Ok(WireTable::new(columns, data))
        }
        _ => Err(Error::type_error(format!(
            "dictionary of {} to {} is not a keyed table",
            keys.kind(),
            values.kind()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta_result() -> WireValue {
        WireValue::table([
            ("c", WireValue::symbols(["ticker", "price", "name"])),
            ("t", WireValue::chars("sjC")),
        ])
    }

    #[test]
    fn test_from_wire() {
        let meta = TableMeta::from_wire(&meta_result(), &ValueMarshaler::default()).unwrap();
        assert_eq!(meta.len(), 3);
        assert_eq!(meta.name_at(1), Some("price"));
        assert_eq!(meta.name_at(3), None);
        assert_eq!(meta.columns[0].type_id, Some(TypeId::Symbol));
        assert_eq!(meta.columns[1].type_id, Some(TypeId::Long));
        assert_eq!(meta.columns[2].type_id, None);
        assert_eq!(meta.columns[2].type_char, 'C');
        assert!(meta.is_symbol("ticker"));
        assert!(!meta.is_symbol("price"));
        assert!(!meta.is_symbol("missing"));
        assert_eq!(meta.names().collect::<Vec<_>>(), vec!["ticker", "price", "name"]);
    }

    #[test]
    fn test_from_wire_keyed() {
        let keyed = WireValue::Dict {
            keys: Box::new(WireValue::table([("c", WireValue::symbols(["ticker"]))])),
            values: Box::new(WireValue::table([("t", WireValue::chars("s"))])),
        };
        let meta = TableMeta::from_wire(&keyed, &ValueMarshaler::default()).unwrap();
        assert_eq!(meta.columns, vec![ColumnMeta::new("ticker", 's')]);
    }

    #[test]
    fn test_from_wire_rejects_other_shapes() {
        let m = ValueMarshaler::default();
        assert!(TableMeta::from_wire(&WireValue::long(1), &m).is_err());
        let no_types = WireValue::table([("c", WireValue::symbols(["a"]))]);
        assert!(TableMeta::from_wire(&no_types, &m).is_err());
    }
}
