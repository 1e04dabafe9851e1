//! Per-type marshaling rules, resolved once per process.
//!
//! Every supported [TypeId] has one [TypeDescriptor] holding its null
//! conventions, the validator used for type inference and the parser used to
//! turn raw text into a [TypedValue]. Dispatch on wire type codes goes through
//! a single lookup table instead of being repeated at each call site.

use std::sync::Arc;

use bitvec::prelude::*;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::data_type::{Storage, TypeId};
use crate::error::{Axis, Error, Result};
use crate::temporal;
use crate::value::{Cell, TypedValue};
use crate::wire::{ColumnData, WireVector};

/// The in-band value the engine uses to mark a null of a given type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NullSentinel {
    /// Booleans and bytes have no null.
    None,
    Short(i16),
    Int(i32),
    Long(i64),
    /// Reals, floats and datetimes.
    NaN,
    /// Chars: a blank.
    Space,
    /// Symbols: the empty symbol.
    EmptySymbol,
}

/// Marshaling rules for one engine type.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    pub id: TypeId,
    pub name: &'static str,
    pub null_literal: &'static str,
    pub null_sentinel: NullSentinel,
    validator: fn(&str) -> bool,
    parser: fn(&str) -> Cell,
}

impl TypeDescriptor {
    pub fn code(&self) -> i8 {
        self.id.code()
    }

    pub fn type_char(&self) -> char {
        self.id.type_char()
    }

    /// Whether `raw` has the textual shape of this type.
    pub fn validate(&self, raw: &str) -> bool {
        (self.validator)(raw)
    }

    /// Parses raw text into a value of this type, `None` if it does not parse
    /// or denotes the null.
    pub fn parse(&self, raw: &str) -> Cell {
        (self.parser)(raw)
    }
}

/// Order in which types are tried by [TypeRegistry::infer_type].
pub const INFERENCE_ORDER: [TypeId; 13] = [
    TypeId::Boolean,
    TypeId::Int,
    TypeId::Long,
    TypeId::Float,
    TypeId::Date,
    TypeId::Datetime,
    TypeId::Time,
    TypeId::Timestamp,
    TypeId::Month,
    TypeId::Timespan,
    TypeId::Minute,
    TypeId::Second,
    TypeId::Symbol,
];

static DATE_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("regex"));
static DATETIME_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}:\d{2}(\.\d+)?$").expect("regex")
});
static TIME_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}:\d{2}:\d{2}(\.\d+)?$").expect("regex"));
static TIMESTAMP_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}\.\d{2}\.\d{2}D\d{2}:\d{2}:\d{2}\.\d{9}$").expect("regex")
});
static MONTH_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}\.\d{2}m$").expect("regex"));
static TIMESPAN_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+D\d{2}:\d{2}:\d{2}\.\d{9}$").expect("regex"));
static MINUTE_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{2}:\d{2}$").expect("regex"));
static SECOND_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}:\d{2}:\d{2}$").expect("regex"));

static REGISTRY: Lazy<TypeRegistry> = Lazy::new(TypeRegistry::build);

/// The process-wide registry.
pub fn registry() -> &'static TypeRegistry {
    &REGISTRY
}

fn is_boolean(s: &str) -> bool {
    matches!(s.to_ascii_lowercase().as_str(), "true" | "false" | "1" | "0")
}

fn is_single_char(s: &str) -> bool {
    s.chars().count() == 1
}

fn parse_boolean(s: &str) -> Cell {
    let truthy = matches!(
        s.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "t" | "yes" | "y" | "1b"
    );
    Some(TypedValue::Boolean(truthy))
}

fn parse_byte(s: &str) -> Cell {
    let s = s.trim();
    let byte = match s.strip_prefix("0x") {
        Some(hex) => u8::from_str_radix(hex, 16).ok(),
        None => s.parse::<u8>().ok().or_else(|| {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii() => Some(c as u8),
                _ => None,
            }
        }),
    };
    byte.map(TypedValue::Byte)
}

fn parse_char(s: &str) -> Cell {
    s.chars().next().filter(|c| *c != ' ').map(TypedValue::Char)
}

fn parse_symbol(s: &str) -> Cell {
    (!s.is_empty()).then(|| TypedValue::Symbol(Arc::from(s)))
}

fn parse_real(s: &str) -> Cell {
    s.trim().parse::<f32>().ok().filter(|v| !v.is_nan()).map(TypedValue::Real)
}

fn parse_float(s: &str) -> Cell {
    s.trim().parse::<f64>().ok().filter(|v| !v.is_nan()).map(TypedValue::Float)
}

fn parse_datetime(s: &str) -> Cell {
    temporal::parse_datetime(s).map(TypedValue::Datetime)
}

impl TypeRegistry {
    fn build() -> Self {
        let descriptors = vec![
            TypeDescriptor {
                id: TypeId::Boolean,
                name: "boolean",
                null_literal: "0b",
                null_sentinel: NullSentinel::None,
                validator: is_boolean,
                parser: parse_boolean,
            },
            TypeDescriptor {
                id: TypeId::Byte,
                name: "byte",
                null_literal: "0x00",
                null_sentinel: NullSentinel::None,
                validator: is_single_char,
                parser: parse_byte,
            },
            TypeDescriptor {
                id: TypeId::Short,
                name: "short",
                null_literal: "0Nh",
                null_sentinel: NullSentinel::Short(i16::MIN),
                validator: |s| s.parse::<i16>().is_ok(),
                parser: |s| {
                    let v = s.trim().parse::<i16>().ok()?;
                    (v != i16::MIN).then_some(TypedValue::Short(v))
                },
            },
            TypeDescriptor {
                id: TypeId::Int,
                name: "int",
                null_literal: "0Ni",
                null_sentinel: NullSentinel::Int(i32::MIN),
                validator: |s| s.parse::<i32>().is_ok(),
                parser: |s| {
                    let v = s.trim().parse::<i32>().ok()?;
                    (v != i32::MIN).then_some(TypedValue::Int(v))
                },
            },
            TypeDescriptor {
                id: TypeId::Long,
                name: "long",
                null_literal: "0Nj",
                null_sentinel: NullSentinel::Long(i64::MIN),
                validator: |s| s.parse::<i64>().is_ok(),
                parser: |s| {
                    let v = s.trim().parse::<i64>().ok()?;
                    (v != i64::MIN).then_some(TypedValue::Long(v))
                },
            },
            TypeDescriptor {
                id: TypeId::Real,
                name: "real",
                null_literal: "0Ne",
                null_sentinel: NullSentinel::NaN,
                validator: |s| s.parse::<f32>().is_ok_and(f32::is_finite),
                parser: parse_real,
            },
            TypeDescriptor {
                id: TypeId::Float,
                name: "float",
                null_literal: "0n",
                null_sentinel: NullSentinel::NaN,
                validator: |s| s.parse::<f64>().is_ok_and(f64::is_finite),
                parser: parse_float,
            },
            TypeDescriptor {
                id: TypeId::Char,
                name: "char",
                null_literal: "\" \"",
                null_sentinel: NullSentinel::Space,
                validator: is_single_char,
                parser: parse_char,
            },
            TypeDescriptor {
                id: TypeId::Symbol,
                name: "symbol",
                null_literal: "`",
                null_sentinel: NullSentinel::EmptySymbol,
                validator: |_| true,
                parser: parse_symbol,
            },
            TypeDescriptor {
                id: TypeId::Timestamp,
                name: "timestamp",
                null_literal: "0Np",
                null_sentinel: NullSentinel::Long(i64::MIN),
                validator: |s| TIMESTAMP_SHAPE.is_match(s),
                parser: |s| temporal::parse_timestamp(s).map(TypedValue::Timestamp),
            },
            TypeDescriptor {
                id: TypeId::Month,
                name: "month",
                null_literal: "0Nm",
                null_sentinel: NullSentinel::Int(i32::MIN),
                validator: |s| MONTH_SHAPE.is_match(s),
                parser: |s| temporal::parse_month(s).map(TypedValue::Month),
            },
            TypeDescriptor {
                id: TypeId::Date,
                name: "date",
                null_literal: "0Nd",
                null_sentinel: NullSentinel::Int(i32::MIN),
                validator: |s| DATE_SHAPE.is_match(s),
                parser: |s| temporal::parse_date(s).map(TypedValue::Date),
            },
            TypeDescriptor {
                id: TypeId::Datetime,
                name: "datetime",
                null_literal: "0Nz",
                null_sentinel: NullSentinel::NaN,
                validator: |s| DATETIME_SHAPE.is_match(s),
                parser: parse_datetime,
            },
            TypeDescriptor {
                id: TypeId::Timespan,
                name: "timespan",
                null_literal: "0Nn",
                null_sentinel: NullSentinel::Long(i64::MIN),
                validator: |s| TIMESPAN_SHAPE.is_match(s),
                parser: |s| temporal::parse_timespan(s).map(TypedValue::Timespan),
            },
            TypeDescriptor {
                id: TypeId::Minute,
                name: "minute",
                null_literal: "0Nu",
                null_sentinel: NullSentinel::Int(i32::MIN),
                validator: |s| MINUTE_SHAPE.is_match(s),
                parser: |s| temporal::parse_minute(s).map(TypedValue::Minute),
            },
            TypeDescriptor {
                id: TypeId::Second,
                name: "second",
                null_literal: "0Nv",
                null_sentinel: NullSentinel::Int(i32::MIN),
                validator: |s| SECOND_SHAPE.is_match(s),
                parser: |s| temporal::parse_second(s).map(TypedValue::Second),
            },
            TypeDescriptor {
                id: TypeId::Time,
                name: "time",
                null_literal: "0Nt",
                null_sentinel: NullSentinel::Int(i32::MIN),
                validator: |s| TIME_SHAPE.is_match(s),
                parser: |s| temporal::parse_time(s).map(TypedValue::Time),
            },
        ];

        let mut by_code = [None; 20];
        for d in &descriptors {
            by_code[d.code() as usize] = Some(d.id);
        }
        Self {
            descriptors,
            by_code,
        }
    }
}

/// Immutable table of [TypeDescriptor]s, indexed by type id and type code.
#[derive(Debug)]
pub struct TypeRegistry {
    /// Ordered like [TypeId::ALL], so `id as usize` indexes it.
    descriptors: Vec<TypeDescriptor>,
    by_code: [Option<TypeId>; 20],
}

impl TypeRegistry {
    pub fn descriptor(&self, id: TypeId) -> &TypeDescriptor {
        &self.descriptors[id as usize]
    }

    /// Resolves a wire type code, atoms (negative codes) included.
    pub fn by_code(&self, code: i8) -> Option<&TypeDescriptor> {
        let index = usize::try_from(code.checked_abs()?).ok()?;
        let id = (*self.by_code.get(index)?)?;
        Some(self.descriptor(id))
    }

    pub fn by_char(&self, c: char) -> Option<&TypeDescriptor> {
        TypeId::from_char(c).map(|id| self.descriptor(id))
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.descriptors.iter()
    }

    pub fn validate(&self, raw: &str, id: TypeId) -> bool {
        self.descriptor(id).validate(raw)
    }

    pub fn null_sentinel(&self, id: TypeId) -> NullSentinel {
        self.descriptor(id).null_sentinel
    }

    pub fn null_literal(&self, id: TypeId) -> &'static str {
        self.descriptor(id).null_literal
    }

    /// Renders raw text as a literal of type `id`.
    ///
    /// Text that does not parse as the type becomes the type's null literal:
    /// `encode_literal("abc", TypeId::Int)` is `0Ni`, not an error.
    ///
    /// # Example
    /// ```
    /// # use qframe::registry::registry;
    /// # use qframe::TypeId;
    /// assert_eq!(registry().encode_literal("42", TypeId::Long), "42j");
    /// assert_eq!(registry().encode_literal("GOOG", TypeId::Symbol), "`GOOG");
    /// assert_eq!(registry().encode_literal("oops", TypeId::Int), "0Ni");
    /// ```
    pub fn encode_literal(&self, raw: &str, id: TypeId) -> String {
        self.encode_cell(self.descriptor(id).parse(raw).as_ref(), id)
    }

    /// Renders a value, or the null literal of `id` for an empty cell.
    pub fn encode_cell(&self, cell: Option<&TypedValue>, id: TypeId) -> String {
        match cell {
            Some(value) => value.to_literal(),
            None => self.null_literal(id).to_string(),
        }
    }

    /// Parses literal text as produced by [Self::encode_literal] back into a
    /// value; null literals give `None`.
    pub fn decode_literal(&self, text: &str, id: TypeId) -> Cell {
        let descriptor = self.descriptor(id);
        let text = text.trim();
        if descriptor.null_sentinel != NullSentinel::None && text == descriptor.null_literal {
            return None;
        }
        let body = match id {
            TypeId::Boolean => {
                return match text {
                    "1b" => Some(TypedValue::Boolean(true)),
                    "0b" => Some(TypedValue::Boolean(false)),
                    other => descriptor.parse(other),
                };
            }
            TypeId::Byte => text,
            TypeId::Char => {
                let inner = text
                    .strip_prefix('"')
                    .and_then(|t| t.strip_suffix('"'))
                    .unwrap_or(text);
                return descriptor.parse(&unescape_text(inner));
            }
            TypeId::Symbol => {
                let inner = text.strip_prefix('`').unwrap_or(text);
                return descriptor.parse(&inner.replace("``", "`"));
            }
            _ => text.strip_suffix(id.type_char()).unwrap_or(text),
        };
        descriptor.parse(body)
    }

    /// Decodes one position of a wire vector.
    ///
    /// # Errors
    /// - [Error::Type] if the vector's type code is unknown or its storage
    ///   does not match the code.
    /// - [Error::Bounds] if `index` is past the end of the vector.
    pub fn decode(&self, vector: &WireVector, index: usize) -> Result<Cell> {
        let descriptor = self.by_code(vector.type_code()).ok_or_else(|| {
            Error::type_error(format!("unknown type code {}", vector.type_code()))
        })?;
        if index >= vector.len() {
            return Err(Error::Bounds {
                axis: Axis::Row,
                index,
                extent: vector.len(),
            });
        }
        decode_cell(descriptor.id, vector.data(), index)
    }

    /// Display text of a cell; empty cells show as `NULL`.
    pub fn format(&self, cell: Option<&TypedValue>) -> String {
        cell.map_or_else(|| "NULL".to_string(), ToString::to_string)
    }

    /// Picks the narrowest type every non-empty sample validates as.
    ///
    /// Candidates are tried in [INFERENCE_ORDER]; when every sample is empty,
    /// or nothing but symbol fits, the result is symbol.
    ///
    /// # Example
    /// ```
    /// # use qframe::registry::registry;
    /// # use qframe::TypeId;
    /// assert_eq!(registry().infer_type(&["1", "2", "300"]).id, TypeId::Int);
    /// assert_eq!(registry().infer_type(&["2024-01-15", ""]).id, TypeId::Date);
    /// assert_eq!(registry().infer_type::<&str>(&[]).id, TypeId::Symbol);
    /// ```
    pub fn infer_type<S: AsRef<str>>(&self, samples: &[S]) -> &TypeDescriptor {
        let mut candidates = bitvec![1; TypeId::ALL.len()];
        let mut any = false;

        for sample in samples.iter().map(AsRef::as_ref).filter(|s| !s.is_empty()) {
            any = true;
            for id in INFERENCE_ORDER {
                let slot = id as usize;
                if candidates[slot] && !self.validate(sample, id) {
                    candidates.set(slot, false);
                }
            }
        }

        let symbol = self.descriptor(TypeId::Symbol);
        if !any {
            return symbol;
        }
        INFERENCE_ORDER
            .into_iter()
            .find(|id| candidates[*id as usize])
            .map_or(symbol, |id| self.descriptor(id))
    }
}

fn unescape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn decode_cell(id: TypeId, data: &ColumnData, i: usize) -> Result<Cell> {
    let cell = match (id, data) {
        (TypeId::Boolean, ColumnData::Bool(bits)) => Some(TypedValue::Boolean(bits[i])),
        (TypeId::Byte, ColumnData::Byte(v)) => Some(TypedValue::Byte(v[i])),
        (TypeId::Short, ColumnData::Short(v)) => {
            (v[i] != i16::MIN).then_some(TypedValue::Short(v[i]))
        }
        (_, ColumnData::Int(v)) if id.storage() == Storage::Int => {
            let raw = v[i];
            if raw == i32::MIN {
                None
            } else {
                Some(match id {
                    TypeId::Month => TypedValue::Month(raw),
                    TypeId::Date => TypedValue::Date(raw),
                    TypeId::Minute => TypedValue::Minute(raw),
                    TypeId::Second => TypedValue::Second(raw),
                    TypeId::Time => TypedValue::Time(raw),
                    _ => TypedValue::Int(raw),
                })
            }
        }
        (_, ColumnData::Long(v)) if id.storage() == Storage::Long => {
            let raw = v[i];
            if raw == i64::MIN {
                None
            } else {
                Some(match id {
                    TypeId::Timestamp => TypedValue::Timestamp(raw),
                    TypeId::Timespan => TypedValue::Timespan(raw),
                    _ => TypedValue::Long(raw),
                })
            }
        }
        (TypeId::Real, ColumnData::Real(v)) => {
            (!v[i].is_nan()).then_some(TypedValue::Real(v[i]))
        }
        (TypeId::Float, ColumnData::Float(v)) => {
            (!v[i].is_nan()).then_some(TypedValue::Float(v[i]))
        }
        (TypeId::Datetime, ColumnData::Float(v)) => {
            (!v[i].is_nan()).then_some(TypedValue::Datetime(v[i]))
        }
        (TypeId::Char, ColumnData::Char(v)) => {
            (v[i] != b' ').then_some(TypedValue::Char(char::from(v[i])))
        }
        (TypeId::Symbol, ColumnData::Symbol(v)) => {
            (!v[i].is_empty()).then(|| TypedValue::Symbol(Arc::clone(&v[i])))
        }
        (id, data) => {
            return Err(Error::type_error(format!(
                "{} storage cannot hold values of type {id:?}",
                data.storage_name()
            )));
        }
    };
    Ok(cell)
}
