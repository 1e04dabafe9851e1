/// The engine's atom/vector types, identified by their numeric type code.
///
/// Vectors of these types carry the positive code; atoms carry the negated
/// code on the wire. Only the types the client layer knows how to marshal are
/// listed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeId {
    /// Boolean, code 1, char `b`.
    Boolean,
    /// Unsigned 8-bit byte, code 4, char `x`.
    Byte,
    /// Signed 16-bit integer, code 5, char `h`.
    Short,
    /// Signed 32-bit integer, code 6, char `i`.
    Int,
    /// Signed 64-bit integer, code 7, char `j`.
    Long,
    /// 32-bit float, code 8, char `e`.
    Real,
    /// 64-bit float, code 9, char `f`.
    Float,
    /// Single character, code 10, char `c`.
    Char,
    /// Interned string, code 11, char `s`.
    Symbol,
    /// Nanoseconds since 2000.01.01, code 12, char `p`.
    Timestamp,
    /// Months since 2000.01, code 13, char `m`.
    Month,
    /// Days since 2000.01.01, code 14, char `d`.
    Date,
    /// Fractional days since 2000.01.01, code 15, char `z`.
    Datetime,
    /// Nanosecond duration, code 16, char `n`.
    Timespan,
    /// Minutes since midnight, code 17, char `u`.
    Minute,
    /// Seconds since midnight, code 18, char `v`.
    Second,
    /// Milliseconds since midnight, code 19, char `t`.
    Time,
}

/// How values of a type are laid out inside a wire vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    Bool,
    Byte,
    Short,
    Int,
    Long,
    Real,
    Float,
    Char,
    Symbol,
}

impl TypeId {
    pub const ALL: [TypeId; 17] = [
        TypeId::Boolean,
        TypeId::Byte,
        TypeId::Short,
        TypeId::Int,
        TypeId::Long,
        TypeId::Real,
        TypeId::Float,
        TypeId::Char,
        TypeId::Symbol,
        TypeId::Timestamp,
        TypeId::Month,
        TypeId::Date,
        TypeId::Datetime,
        TypeId::Timespan,
        TypeId::Minute,
        TypeId::Second,
        TypeId::Time,
    ];

    /// The engine's type code (positive, vector form).
    pub fn code(self) -> i8 {
        match self {
            TypeId::Boolean => 1,
            TypeId::Byte => 4,
            TypeId::Short => 5,
            TypeId::Int => 6,
            TypeId::Long => 7,
            TypeId::Real => 8,
            TypeId::Float => 9,
            TypeId::Char => 10,
            TypeId::Symbol => 11,
            TypeId::Timestamp => 12,
            TypeId::Month => 13,
            TypeId::Date => 14,
            TypeId::Datetime => 15,
            TypeId::Timespan => 16,
            TypeId::Minute => 17,
            TypeId::Second => 18,
            TypeId::Time => 19,
        }
    }

    /// Resolves a type code; atom (negative) codes map to the same type.
    pub fn from_code(code: i8) -> Option<TypeId> {
        let code = code.checked_abs()?;
        TypeId::ALL.into_iter().find(|t| t.code() == code)
    }

    /// The lowercase type char used by `meta` and by load format strings.
    pub fn type_char(self) -> char {
        match self {
            TypeId::Boolean => 'b',
            TypeId::Byte => 'x',
            TypeId::Short => 'h',
            TypeId::Int => 'i',
            TypeId::Long => 'j',
            TypeId::Real => 'e',
            TypeId::Float => 'f',
            TypeId::Char => 'c',
            TypeId::Symbol => 's',
            TypeId::Timestamp => 'p',
            TypeId::Month => 'm',
            TypeId::Date => 'd',
            TypeId::Datetime => 'z',
            TypeId::Timespan => 'n',
            TypeId::Minute => 'u',
            TypeId::Second => 'v',
            TypeId::Time => 't',
        }
    }

    /// Resolves a type char. Upper-case chars describe nested vector columns
    /// and therefore do not resolve to a single atom type.
    pub fn from_char(c: char) -> Option<TypeId> {
        // `g` (guid) is read as bytes by the loaders
        if c == 'g' {
            return Some(TypeId::Byte);
        }
        TypeId::ALL.into_iter().find(|t| t.type_char() == c)
    }

    pub fn storage(self) -> Storage {
        match self {
            TypeId::Boolean => Storage::Bool,
            TypeId::Byte => Storage::Byte,
            TypeId::Short => Storage::Short,
            TypeId::Int
            | TypeId::Month
            | TypeId::Date
            | TypeId::Minute
            | TypeId::Second
            | TypeId::Time => Storage::Int,
            TypeId::Long | TypeId::Timestamp | TypeId::Timespan => Storage::Long,
            TypeId::Real => Storage::Real,
            TypeId::Float | TypeId::Datetime => Storage::Float,
            TypeId::Char => Storage::Char,
            TypeId::Symbol => Storage::Symbol,
        }
    }

    pub fn is_temporal(self) -> bool {
        matches!(
            self,
            TypeId::Timestamp
                | TypeId::Month
                | TypeId::Date
                | TypeId::Datetime
                | TypeId::Timespan
                | TypeId::Minute
                | TypeId::Second
                | TypeId::Time
        )
    }

    /// Symbols and chars are compared through symbol literals in filters.
    pub fn is_textual(self) -> bool {
        matches!(self, TypeId::Symbol | TypeId::Char)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_round_trip() {
        for t in TypeId::ALL {
            assert_eq!(TypeId::from_code(t.code()), Some(t));
            assert_eq!(TypeId::from_code(-t.code()), Some(t));
            assert_eq!(TypeId::from_char(t.type_char()), Some(t));
        }
    }

    #[test]
    fn test_unknown_codes() {
        assert_eq!(TypeId::from_code(0), None);
        assert_eq!(TypeId::from_code(98), None);
        assert_eq!(TypeId::from_code(i8::MIN), None);
        assert_eq!(TypeId::from_char('J'), None);
        assert_eq!(TypeId::from_char(' '), None);
    }

    #[test]
    fn test_storage_classes() {
        assert_eq!(TypeId::Date.storage(), Storage::Int);
        assert_eq!(TypeId::Timestamp.storage(), Storage::Long);
        assert_eq!(TypeId::Datetime.storage(), Storage::Float);
        assert!(TypeId::Time.is_temporal());
        assert!(!TypeId::Long.is_temporal());
    }
}
