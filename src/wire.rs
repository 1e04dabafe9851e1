use std::sync::Arc;

use bitvec::prelude::*;

use crate::data_type::{Storage, TypeId};
use crate::error::{Error, Result};
use crate::value::TypedValue;

/// Physical storage of a wire vector.
/// Each variant wraps a contiguous collection; temporal types reuse the
/// integer or float storage of their engine encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    /// Compact bit-vector for boolean values.
    Bool(BitVec),
    Byte(Vec<u8>),
    Short(Vec<i16>),
    /// Ints, months, dates, minutes, seconds and times.
    Int(Vec<i32>),
    /// Longs, timestamps and timespans.
    Long(Vec<i64>),
    Real(Vec<f32>),
    /// Floats and datetimes.
    Float(Vec<f64>),
    Char(Vec<u8>),
    /// Interned strings, shared between rows and results.
    Symbol(Vec<Arc<str>>),
}

impl ColumnData {
    /// Creates empty storage for values of `id`.
    pub fn for_type(id: TypeId) -> Self {
        match id.storage() {
            Storage::Bool => ColumnData::Bool(bitvec!()),
            Storage::Byte => ColumnData::Byte(vec![]),
            Storage::Short => ColumnData::Short(vec![]),
            Storage::Int => ColumnData::Int(vec![]),
            Storage::Long => ColumnData::Long(vec![]),
            Storage::Real => ColumnData::Real(vec![]),
            Storage::Float => ColumnData::Float(vec![]),
            Storage::Char => ColumnData::Char(vec![]),
            Storage::Symbol => ColumnData::Symbol(vec![]),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnData::Bool(v) => v.len(),
            ColumnData::Byte(v) | ColumnData::Char(v) => v.len(),
            ColumnData::Short(v) => v.len(),
            ColumnData::Int(v) => v.len(),
            ColumnData::Long(v) => v.len(),
            ColumnData::Real(v) => v.len(),
            ColumnData::Float(v) => v.len(),
            ColumnData::Symbol(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn storage_name(&self) -> &'static str {
        match self {
            ColumnData::Bool(_) => "boolean",
            ColumnData::Byte(_) => "byte",
            ColumnData::Short(_) => "short",
            ColumnData::Int(_) => "int",
            ColumnData::Long(_) => "long",
            ColumnData::Real(_) => "real",
            ColumnData::Float(_) => "float",
            ColumnData::Char(_) => "char",
            ColumnData::Symbol(_) => "symbol",
        }
    }
}

/// A typed vector (or, with a negative code, an atom) as carried on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct WireVector {
    type_code: i8,
    data: ColumnData,
}

impl WireVector {
    pub fn new(type_code: i8, data: ColumnData) -> Self {
        Self { type_code, data }
    }

    /// Creates an empty vector of type `id`.
    pub fn empty(id: TypeId) -> Self {
        Self::new(id.code(), ColumnData::for_type(id))
    }

    /// Builds a vector of type `id` from cells, writing the type's null
    /// sentinel for every `None`.
    ///
    /// # Errors
    /// Returns an error if a value's type does not match `id`.
    ///
    /// # Example
    /// ```
    /// # use qframe::wire::WireVector;
    /// # use qframe::{TypeId, TypedValue};
    /// let v = WireVector::from_cells(TypeId::Long, [Some(TypedValue::Long(1)), None]).unwrap();
    /// assert_eq!(v.len(), 2);
    /// ```
    pub fn from_cells<I>(id: TypeId, cells: I) -> Result<Self>
    where
        I: IntoIterator<Item = Option<TypedValue>>,
    {
        let mut vector = Self::empty(id);
        for cell in cells {
            vector.push(cell.as_ref())?;
        }
        Ok(vector)
    }

    pub fn type_code(&self) -> i8 {
        self.type_code
    }

    pub fn type_id(&self) -> Option<TypeId> {
        TypeId::from_code(self.type_code)
    }

    pub fn is_atom(&self) -> bool {
        self.type_code < 0
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Turns a one-element vector into the corresponding atom.
    pub fn into_atom(self) -> Self {
        Self {
            type_code: if self.type_code > 0 {
                -self.type_code
            } else {
                self.type_code
            },
            data: self.data,
        }
    }

    /// Appends a value, or the type's null sentinel for `None`.
    ///
    /// # Errors
    /// Returns an error if the value's type does not match the vector's type.
    pub fn push(&mut self, value: Option<&TypedValue>) -> Result<()> {
        let Some(id) = self.type_id() else {
            return Err(Error::type_error(format!(
                "cannot append to vector of unknown type {}",
                self.type_code
            )));
        };

        let Some(value) = value else {
            // The sentinel keeps positions aligned; booleans and bytes have none
            match &mut self.data {
                ColumnData::Bool(v) => v.push(false),
                ColumnData::Byte(v) => v.push(0),
                ColumnData::Short(v) => v.push(i16::MIN),
                ColumnData::Int(v) => v.push(i32::MIN),
                ColumnData::Long(v) => v.push(i64::MIN),
                ColumnData::Real(v) => v.push(f32::NAN),
                ColumnData::Float(v) => v.push(f64::NAN),
                ColumnData::Char(v) => v.push(b' '),
                ColumnData::Symbol(v) => v.push(Arc::from("")),
            }
            return Ok(());
        };

        if value.type_id() != id {
            return Err(Error::type_error(format!(
                "value {value:?} has type {:?} while vector type is {id:?}",
                value.type_id()
            )));
        }

        let storage = self.data.storage_name();
        match (&mut self.data, value) {
            (ColumnData::Bool(col), TypedValue::Boolean(v)) => col.push(*v),
            (ColumnData::Byte(col), TypedValue::Byte(v)) => col.push(*v),
            (ColumnData::Short(col), TypedValue::Short(v)) => col.push(*v),
            (
                ColumnData::Int(col),
                TypedValue::Int(v)
                | TypedValue::Month(v)
                | TypedValue::Date(v)
                | TypedValue::Minute(v)
                | TypedValue::Second(v)
                | TypedValue::Time(v),
            ) => col.push(*v),
            (
                ColumnData::Long(col),
                TypedValue::Long(v) | TypedValue::Timestamp(v) | TypedValue::Timespan(v),
            ) => col.push(*v),
            (ColumnData::Real(col), TypedValue::Real(v)) => col.push(*v),
            (ColumnData::Float(col), TypedValue::Float(v) | TypedValue::Datetime(v)) => {
                col.push(*v)
            }
            (ColumnData::Char(col), TypedValue::Char(c)) => {
                let byte = u8::try_from(u32::from(*c)).map_err(|_| {
                    Error::type_error(format!("char {c:?} does not fit in one byte"))
                })?;
                col.push(byte);
            }
            (ColumnData::Symbol(col), TypedValue::Symbol(s)) => col.push(Arc::clone(s)),
            _ => {
                return Err(Error::type_error(format!(
                    "{storage} storage cannot hold {value:?}"
                )));
            }
        }
        Ok(())
    }
}

/// A column-major table as returned by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct WireTable {
    pub columns: Vec<String>,
    /// One entry per column, usually a [WireValue::Vector] (general list
    /// columns arrive as [WireValue::List]).
    pub data: Vec<WireValue>,
}

impl WireTable {
    pub fn new(columns: Vec<String>, data: Vec<WireValue>) -> Self {
        Self { columns, data }
    }

    /// Row count, taken from the first column.
    pub fn row_count(&self) -> usize {
        self.data.first().map_or(0, WireValue::len)
    }

    pub fn column(&self, name: &str) -> Option<&WireValue> {
        let index = self.columns.iter().position(|c| c == name)?;
        self.data.get(index)
    }
}

/// Everything the engine can answer with.
#[derive(Debug, Clone, PartialEq)]
pub enum WireValue {
    /// The generic null returned by assignments and deletions.
    Unit,
    /// A single typed value; its vector holds exactly one element.
    Atom(WireVector),
    Vector(WireVector),
    /// A general (mixed) list.
    List(Vec<WireValue>),
    Dict {
        keys: Box<WireValue>,
        values: Box<WireValue>,
    },
    Table(WireTable),
    /// An error payload raised by the engine.
    Error(String),
}

impl WireValue {
    pub fn atom(value: TypedValue) -> Self {
        let mut vector = WireVector::empty(value.type_id()).into_atom();
        // A value always fits storage built from its own type
        let _ = vector.push(Some(&value));
        WireValue::Atom(vector)
    }

    pub fn long(v: i64) -> Self {
        Self::atom(TypedValue::Long(v))
    }

    pub fn longs(values: impl IntoIterator<Item = i64>) -> Self {
        WireValue::Vector(WireVector::new(
            TypeId::Long.code(),
            ColumnData::Long(values.into_iter().collect()),
        ))
    }

    pub fn floats(values: impl IntoIterator<Item = f64>) -> Self {
        WireValue::Vector(WireVector::new(
            TypeId::Float.code(),
            ColumnData::Float(values.into_iter().collect()),
        ))
    }

    pub fn symbols<S: AsRef<str>>(values: impl IntoIterator<Item = S>) -> Self {
        WireValue::Vector(WireVector::new(
            TypeId::Symbol.code(),
            ColumnData::Symbol(values.into_iter().map(|s| Arc::from(s.as_ref())).collect()),
        ))
    }

    pub fn chars(text: &str) -> Self {
        WireValue::Vector(WireVector::new(
            TypeId::Char.code(),
            ColumnData::Char(text.bytes().collect()),
        ))
    }

    pub fn table<S: Into<String>>(columns: impl IntoIterator<Item = (S, WireValue)>) -> Self {
        let (names, data): (Vec<String>, Vec<WireValue>) =
            columns.into_iter().map(|(n, d)| (n.into(), d)).unzip();
        WireValue::Table(WireTable::new(names, data))
    }

    /// Element count: 1 for atoms, the row count for tables.
    pub fn len(&self) -> usize {
        match self {
            WireValue::Unit | WireValue::Error(_) => 0,
            WireValue::Atom(_) => 1,
            WireValue::Vector(v) => v.len(),
            WireValue::List(items) => items.len(),
            WireValue::Dict { keys, .. } => keys.len(),
            WireValue::Table(t) => t.row_count(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> &'static str {
        match self {
            WireValue::Unit => "unit",
            WireValue::Atom(_) => "atom",
            WireValue::Vector(_) => "vector",
            WireValue::List(_) => "list",
            WireValue::Dict { .. } => "dictionary",
            WireValue::Table(_) => "table",
            WireValue::Error(_) => "error",
        }
    }
}
