//! Query-text construction for selections and table management.
//!
//! Every function here is pure: it renders text and never talks to the
//! engine, so inputs can be rejected before anything is submitted.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ast::{Expr, Predicate};
use crate::data_type::TypeId;
use crate::error::{Error, Result};
use crate::marshal::{Row, ValueMarshaler};
use crate::parser::Parser;
use crate::table::TableMeta;

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z.][A-Za-z0-9_.]*$").expect("identifier regex"));

/// Rejects names that are not engine identifiers.
///
/// # Errors
/// Returns [Error::Validation] naming `what` the identifier was for.
pub fn validate_identifier(name: &str, what: &str) -> Result<()> {
    if IDENTIFIER.is_match(name) {
        Ok(())
    } else {
        Err(Error::validation(format!("invalid {what} name `{name}`")))
    }
}

/// Renders names as one symbol list: `` `a`b ``.
pub fn symbol_list<S: AsRef<str>>(names: &[S]) -> String {
    names.iter().map(|n| format!("`{}", n.as_ref())).collect()
}

/// Builds selection and table-management queries.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryBuilder {
    marshaler: ValueMarshaler,
}

impl QueryBuilder {
    pub fn new(marshaler: ValueMarshaler) -> Self {
        Self { marshaler }
    }

    pub fn count(&self, table: &str) -> String {
        format!("count {table}")
    }

    /// Column names and type chars of `table`, unkeyed.
    pub fn meta(&self, table: &str) -> String {
        format!("select c, t from 0!meta `{table}")
    }

    pub fn shape(&self, table: &str) -> String {
        format!("(count {table};count cols {table})")
    }

    pub fn assign(&self, name: &str, expr: &str) -> String {
        format!("{name}: {expr}")
    }

    /// Removes a global from the root namespace.
    pub fn delete(&self, name: &str) -> String {
        format!("delete {name} from `.")
    }

    /// Positional selection `(0!t)[rows;columns]`.
    ///
    /// Empty `rows` selects every row and empty `columns` every column. One
    /// row or one column is rendered as an atom index, so the engine drops
    /// that dimension.
    ///
    /// # Example
    /// ```
    /// # use qframe::query::QueryBuilder;
    /// let q = QueryBuilder::default();
    /// assert_eq!(q.iloc("t", &[1], &["ticker", "price"]), "(0!t)[(1);`ticker`price]");
    /// assert_eq!(q.iloc("t", &[], &[] as &[&str]), "(0!t)[til count t;cols t]");
    /// ```
    pub fn iloc<S: AsRef<str>>(&self, table: &str, rows: &[usize], columns: &[S]) -> String {
        let rows = if rows.is_empty() {
            format!("til count {table}")
        } else {
            let list: Vec<String> = rows.iter().map(usize::to_string).collect();
            format!("({})", list.join(";"))
        };
        let columns = if columns.is_empty() {
            format!("cols {table}")
        } else {
            symbol_list(columns)
        };
        format!("(0!{table})[{rows};{columns}]")
    }

    /// Splits a comma-separated condition list and parses every entry.
    ///
    /// # Errors
    /// Returns [Error::Validation] if any condition is malformed or none is
    /// given.
    pub fn parse_conditions(&self, conditions: &str) -> Result<Vec<Predicate>> {
        let predicates = conditions
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(Parser::parse_condition)
            .collect::<Result<Vec<_>>>()?;
        if predicates.is_empty() {
            return Err(Error::validation("no condition given"));
        }
        Ok(predicates)
    }

    /// Chains predicates as successive filters, each one applied to the
    /// result of the previous:
    /// `(0!select from ((0!select from (t) where p0)) where p1)`.
    pub fn loc(&self, table: &str, predicates: &[Predicate], meta: &TableMeta) -> String {
        predicates.iter().fold(table.to_string(), |query, predicate| {
            format!(
                "(0!select from ({query}) where {})",
                self.render_predicate(predicate, meta)
            )
        })
    }

    /// `lhs op rhs`, with a bare identifier compared to a symbol column
    /// rendered as a symbol.
    pub fn render_predicate(&self, predicate: &Predicate, meta: &TableMeta) -> String {
        let lhs = render_expr(&predicate.lhs);
        let symbol_rhs = predicate
            .lhs
            .as_column()
            .is_some_and(|column| meta.is_symbol(column));
        let rhs = match (&predicate.rhs, symbol_rhs) {
            (Expr::Column(word), true) => self
                .marshaler
                .registry()
                .encode_literal(word, TypeId::Symbol),
            (rhs, _) => render_expr(rhs),
        };
        format!("{lhs} {} {rhs}", predicate.op.symbol())
    }

    /// `name: ([] ...)` from host rows.
    ///
    /// # Errors
    /// Returns [Error::Validation] on bad names or non-rectangular rows.
    pub fn make_table<S: AsRef<str>>(&self, name: &str, columns: &[S], rows: &[Row]) -> Result<String> {
        validate_identifier(name, "table")?;
        for column in columns {
            validate_identifier(column.as_ref(), "column")?;
        }
        let literal = self.marshaler.table_literal(columns, rows)?;
        Ok(self.assign(name, &literal))
    }
}

/// Operands as written; every arithmetic node parenthesized with spaced
/// operators, since the engine evaluates right to left.
pub fn render_expr(expr: &Expr) -> String {
    match expr {
        Expr::Column(name) => name.clone(),
        Expr::Number(n) => n.clone(),
        Expr::Binary { op, lhs, rhs } => {
            format!("({} {} {})", render_expr(lhs), op.symbol(), render_expr(rhs))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::ColumnMeta;
    use crate::value::TypedValue;

    fn meta() -> TableMeta {
        TableMeta::new(vec![
            ColumnMeta::new("ticker", 's'),
            ColumnMeta::new("price", 'j'),
            ColumnMeta::new("size", 'j'),
        ])
    }

    #[test]
    fn test_identifiers() {
        assert!(validate_identifier("trades", "table").is_ok());
        assert!(validate_identifier(".ns.trades", "table").is_ok());
        assert!(validate_identifier("t_1", "table").is_ok());
        assert!(validate_identifier("", "table").is_err());
        assert!(validate_identifier("1t", "table").is_err());
        assert!(validate_identifier("t;delete", "table").is_err());
        assert_eq!(symbol_list(&["a", "b"]), "`a`b");
    }

    #[test]
    fn test_simple_queries() {
        let q = QueryBuilder::default();
        assert_eq!(q.count("t"), "count t");
        assert_eq!(q.meta("t"), "select c, t from 0!meta `t");
        assert_eq!(q.shape("t"), "(count t;count cols t)");
        assert_eq!(q.delete("t_unkeyed"), "delete t_unkeyed from `.");
        assert_eq!(q.assign("r", "0!(t)"), "r: 0!(t)");
    }

    #[test]
    fn test_iloc_rendering() {
        let q = QueryBuilder::default();
        assert_eq!(q.iloc("t", &[0, 2], &["price"]), "(0!t)[(0;2);`price]");
        assert_eq!(q.iloc("t", &[], &["ticker", "size"]), "(0!t)[til count t;`ticker`size]");
        assert_eq!(q.iloc("t", &[1], &[] as &[&str]), "(0!t)[(1);cols t]");
    }

    #[test]
    fn test_loc_chain() {
        let q = QueryBuilder::default();
        let predicates = q.parse_conditions("price>1, size<5").unwrap();
        assert_eq!(
            q.loc("t", &predicates, &meta()),
            "(0!select from ((0!select from (t) where price > 1)) where size < 5)"
        );
    }

    #[test]
    fn test_symbol_comparison() {
        let q = QueryBuilder::default();
        let predicates = q.parse_conditions("ticker == GOOG").unwrap();
        assert_eq!(
            q.loc("t", &predicates, &meta()),
            "(0!select from (t) where ticker = `GOOG)"
        );

        // non-symbol column: the identifier stays a column reference
        let predicates = q.parse_conditions("price != size").unwrap();
        assert_eq!(
            q.loc("t", &predicates, &meta()),
            "(0!select from (t) where price <> size)"
        );
    }

    #[test]
    fn test_expression_rendering() {
        let q = QueryBuilder::default();
        let predicates = q.parse_conditions("price * 2 + 1 >= size / 2").unwrap();
        assert_eq!(
            q.render_predicate(&predicates[0], &meta()),
            "((price * 2) + 1) >= (size % 2)"
        );
        let predicates = q.parse_conditions("price > -3").unwrap();
        assert_eq!(q.render_predicate(&predicates[0], &meta()), "price > -3");
    }

    #[test]
    fn test_parse_conditions_rejects() {
        let q = QueryBuilder::default();
        assert!(matches!(q.parse_conditions(""), Err(Error::Validation(_))));
        assert!(matches!(q.parse_conditions(" , "), Err(Error::Validation(_))));
        assert!(matches!(q.parse_conditions("price > 1, size"), Err(Error::Validation(_))));
        assert!(matches!(q.parse_conditions("price > 1; delete t"), Err(Error::Validation(_))));
    }

    #[test]
    fn test_make_table() {
        let q = QueryBuilder::default();
        let rows = vec![
            vec![Some(TypedValue::symbol("GOOG")), Some(TypedValue::Long(20))],
            vec![Some(TypedValue::symbol("MSFT")), Some(TypedValue::Long(30))],
        ];
        assert_eq!(
            q.make_table("t", &["ticker", "price"], &rows).unwrap(),
            "t: ([] ticker:(`GOOG;`MSFT); price:(20j;30j))"
        );
        assert!(q.make_table("bad name", &["a", "b"], &rows).is_err());
        assert!(q.make_table("t", &["a", "b c"], &rows).is_err());
    }
}
