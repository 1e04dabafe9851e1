use std::fmt;
use std::sync::Arc;

use allocative::Allocative;
use chrono::{NaiveDate, NaiveDateTime};

use crate::data_type::TypeId;
use crate::temporal;

/// A single non-null value exchanged with the engine.
///
/// Temporal variants keep the engine's native encoding (see [temporal]) so a
/// value decoded from the wire renders back to exactly the same literal.
/// Absence is modelled by [Cell] rather than by a variant.
#[derive(Debug, Clone, PartialEq, Allocative)]
pub enum TypedValue {
    Boolean(bool),
    Byte(u8),
    Short(i16),
    Int(i32),
    Long(i64),
    Real(f32),
    Float(f64),
    Char(#[allocative(skip)] char),
    /// Interned string, shared cheaply between rows.
    Symbol(Arc<str>),
    /// Nanoseconds since 2000.01.01D00:00.
    Timestamp(i64),
    /// Months since 2000.01.
    Month(i32),
    /// Days since 2000.01.01.
    Date(i32),
    /// Fractional days since 2000.01.01.
    Datetime(f64),
    /// Nanoseconds.
    Timespan(i64),
    /// Minutes since midnight.
    Minute(i32),
    /// Seconds since midnight.
    Second(i32),
    /// Milliseconds since midnight.
    Time(i32),
}

/// One position of a row or vector: `None` is the engine's typed null.
pub type Cell = Option<TypedValue>;

impl TypedValue {
    pub fn symbol(s: &str) -> Self {
        Self::Symbol(Arc::from(s))
    }

    /// Returns the [TypeId] of this value.
    pub fn type_id(&self) -> TypeId {
        match self {
            Self::Boolean(_) => TypeId::Boolean,
            Self::Byte(_) => TypeId::Byte,
            Self::Short(_) => TypeId::Short,
            Self::Int(_) => TypeId::Int,
            Self::Long(_) => TypeId::Long,
            Self::Real(_) => TypeId::Real,
            Self::Float(_) => TypeId::Float,
            Self::Char(_) => TypeId::Char,
            Self::Symbol(_) => TypeId::Symbol,
            Self::Timestamp(_) => TypeId::Timestamp,
            Self::Month(_) => TypeId::Month,
            Self::Date(_) => TypeId::Date,
            Self::Datetime(_) => TypeId::Datetime,
            Self::Timespan(_) => TypeId::Timespan,
            Self::Minute(_) => TypeId::Minute,
            Self::Second(_) => TypeId::Second,
            Self::Time(_) => TypeId::Time,
        }
    }

    /// Returns the value as an `i64` for every integral or integer-encoded
    /// temporal variant.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Byte(v) => Some(i64::from(*v)),
            Self::Short(v) => Some(i64::from(*v)),
            Self::Int(v)
            | Self::Month(v)
            | Self::Date(v)
            | Self::Minute(v)
            | Self::Second(v)
            | Self::Time(v) => Some(i64::from(*v)),
            Self::Long(v) | Self::Timestamp(v) | Self::Timespan(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Real(v) => Some(f64::from(*v)),
            Self::Float(v) | Self::Datetime(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Calendar date of a date, timestamp or datetime value.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => temporal::date_from_days(*d),
            Self::Timestamp(_) | Self::Datetime(_) => self.as_datetime().map(|dt| dt.date()),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Timestamp(ns) => temporal::datetime_from_nanos(*ns),
            Self::Datetime(days) => temporal::datetime_from_days(*days),
            Self::Date(d) => temporal::date_from_days(*d)?.and_hms_opt(0, 0, 0),
            _ => None,
        }
    }

    /// Renders the value as engine literal text, suffixed with its type.
    ///
    /// Values that cannot be represented (non-finite floats, dates outside
    /// the calendar) render as the type's null literal.
    pub fn to_literal(&self) -> String {
        let null = || crate::registry::registry().null_literal(self.type_id()).to_string();
        match self {
            Self::Boolean(b) => if *b { "1b" } else { "0b" }.to_string(),
            Self::Byte(v) => format!("0x{v:02x}"),
            Self::Short(v) => format!("{v}h"),
            Self::Int(v) => format!("{v}i"),
            Self::Long(v) => format!("{v}j"),
            Self::Real(v) => float_literal(f64::from(*v), 'e'),
            Self::Float(v) => float_literal(*v, 'f'),
            Self::Char(c) => format!("\"{}\"", escape_text(&c.to_string())),
            Self::Symbol(s) => format!("`{}", s.replace('`', "``")),
            Self::Timestamp(ns) => temporal::format_timestamp(*ns).map_or_else(null, |s| s + "p"),
            Self::Month(m) => format!("{}m", temporal::format_month(*m)),
            Self::Date(d) => temporal::format_date(*d).map_or_else(null, |s| s + "d"),
            Self::Datetime(days) => temporal::format_datetime(*days).map_or_else(null, |s| s + "z"),
            Self::Timespan(ns) => format!("{}n", temporal::format_timespan(*ns)),
            Self::Minute(m) => format!("{}u", temporal::format_minute(*m)),
            Self::Second(s) => format!("{}v", temporal::format_second(*s)),
            Self::Time(t) => format!("{}t", temporal::format_time(*t)),
        }
    }
}

/// Escapes `"` and `\` for use inside an engine string literal.
pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

fn float_literal(v: f64, suffix: char) -> String {
    if v.is_nan() {
        return if suffix == 'f' { "0n" } else { "0Ne" }.to_string();
    }
    if v.is_infinite() {
        let sign = if v < 0.0 { "-" } else { "" };
        return format!("{sign}0w{suffix}");
    }
    format!("{}{suffix}", significant_digits(v, 15))
}

/// Formats a finite float with at most `digits` significant digits, without
/// trailing zeros.
fn significant_digits(v: f64, digits: i32) -> String {
    if v == 0.0 {
        return "0".to_string();
    }
    let exponent = v.abs().log10().floor() as i32;
    if !(-5..digits).contains(&exponent) {
        return v.to_string();
    }
    let decimals = (digits - 1 - exponent).max(0) as usize;
    let text = format!("{v:.decimals$}");
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Byte(v) => write!(f, "0x{v:02x}"),
            Self::Short(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Long(v) => write!(f, "{v}"),
            Self::Real(v) => write!(f, "{v:.7}"),
            Self::Float(v) => write!(f, "{v:.7}"),
            Self::Char(c) => write!(f, "{c}"),
            Self::Symbol(s) => write!(f, "{s}"),
            Self::Timestamp(ns) => match temporal::format_timestamp(*ns) {
                Some(s) => f.write_str(&s),
                None => write!(f, "{ns}"),
            },
            Self::Month(m) => f.write_str(&temporal::format_month(*m)),
            Self::Date(d) => match temporal::display_date(*d) {
                Some(s) => f.write_str(&s),
                None => write!(f, "{d}"),
            },
            Self::Datetime(days) => match temporal::display_datetime(*days) {
                Some(s) => f.write_str(&s),
                None => write!(f, "{days}"),
            },
            Self::Timespan(ns) => f.write_str(&temporal::format_timespan(*ns)),
            Self::Minute(m) => f.write_str(&temporal::format_minute(*m)),
            Self::Second(s) => f.write_str(&temporal::format_second(*s)),
            Self::Time(t) => f.write_str(&temporal::display_time(*t)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ─────────────────────────────────────────────────────────────
    // Test 1 : type_id
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_type_id() {
        assert_eq!(TypedValue::Long(1).type_id(), TypeId::Long);
        assert_eq!(TypedValue::symbol("a").type_id(), TypeId::Symbol);
        assert_eq!(TypedValue::Date(0).type_id(), TypeId::Date);
        assert_eq!(TypedValue::Datetime(0.5).type_id(), TypeId::Datetime);
    }

    // ─────────────────────────────────────────────────────────────
    // Test 2 : accessors
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_accessors() {
        assert_eq!(TypedValue::Short(-3).as_i64(), Some(-3));
        assert_eq!(TypedValue::Timestamp(7).as_i64(), Some(7));
        assert_eq!(TypedValue::Float(1.5).as_i64(), None);
        assert_eq!(TypedValue::Real(0.5).as_f64(), Some(0.5));
        assert_eq!(TypedValue::symbol("GOOG").as_str(), Some("GOOG"));
        assert_eq!(TypedValue::Boolean(true).as_bool(), Some(true));
        assert_eq!(TypedValue::Int(1).as_bool(), None);
    }

    // ─────────────────────────────────────────────────────────────
    // Test 3 : chrono views
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_chrono_views() {
        let d = TypedValue::Date(1);
        assert_eq!(d.as_date(), NaiveDate::from_ymd_opt(2000, 1, 2));

        let ts = TypedValue::Timestamp(temporal::NANOS_PER_DAY);
        assert_eq!(ts.as_date(), NaiveDate::from_ymd_opt(2000, 1, 2));
        assert_eq!(TypedValue::Long(1).as_datetime(), None);
    }

    // ─────────────────────────────────────────────────────────────
    // Test 4 : literals
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_literals() {
        assert_eq!(TypedValue::Boolean(true).to_literal(), "1b");
        assert_eq!(TypedValue::Byte(42).to_literal(), "0x2a");
        assert_eq!(TypedValue::Short(5).to_literal(), "5h");
        assert_eq!(TypedValue::Int(-5).to_literal(), "-5i");
        assert_eq!(TypedValue::Long(20).to_literal(), "20j");
        assert_eq!(TypedValue::Float(20.0).to_literal(), "20f");
        assert_eq!(TypedValue::Float(0.1).to_literal(), "0.1f");
        assert_eq!(TypedValue::Real(1.5).to_literal(), "1.5e");
        assert_eq!(TypedValue::Char('"').to_literal(), "\"\\\"\"");
        assert_eq!(TypedValue::symbol("a`b").to_literal(), "`a``b");
        assert_eq!(TypedValue::Date(0).to_literal(), "2000.01.01d");
        assert_eq!(TypedValue::Month(0).to_literal(), "2000.01m");
        assert_eq!(TypedValue::Time(34_200_000).to_literal(), "09:30:00.000t");
        assert_eq!(TypedValue::Minute(630).to_literal(), "10:30u");
        assert_eq!(TypedValue::Second(37_815).to_literal(), "10:30:15v");
        assert_eq!(
            TypedValue::Timestamp(0).to_literal(),
            "2000.01.01D00:00:00.000000000p"
        );
        assert_eq!(TypedValue::Datetime(1.5).to_literal(), "2000.01.02T12:00:00.000z");
        assert_eq!(TypedValue::Timespan(0).to_literal(), "0D00:00:00.000000000n");
    }

    // ─────────────────────────────────────────────────────────────
    // Test 5 : non-finite floats
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_non_finite_literals() {
        assert_eq!(TypedValue::Float(f64::NAN).to_literal(), "0n");
        assert_eq!(TypedValue::Real(f32::NAN).to_literal(), "0Ne");
        assert_eq!(TypedValue::Float(f64::INFINITY).to_literal(), "0wf");
        assert_eq!(TypedValue::Real(f32::NEG_INFINITY).to_literal(), "-0we");
    }

    // ─────────────────────────────────────────────────────────────
    // Test 6 : significant digits
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_significant_digits() {
        assert_eq!(significant_digits(3.14159265358979323, 15), "3.14159265358979");
        assert_eq!(significant_digits(0.30000000000000004, 15), "0.3");
        assert_eq!(significant_digits(-2.5, 15), "-2.5");
        assert_eq!(significant_digits(123456.0, 15), "123456");
    }

    // ─────────────────────────────────────────────────────────────
    // Test 7 : display
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_display() {
        assert_eq!(TypedValue::Boolean(false).to_string(), "false");
        assert_eq!(TypedValue::Float(2.5).to_string(), "2.5000000");
        assert_eq!(TypedValue::Date(0).to_string(), "2000-01-01");
        assert_eq!(TypedValue::Datetime(1.5).to_string(), "2000-01-02 12:00:00");
        assert_eq!(TypedValue::Time(34_200_500).to_string(), "09:30:00");
        assert_eq!(TypedValue::symbol("MSFT").to_string(), "MSFT");
    }
}
