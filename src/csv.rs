//! Bulk loading of CSV files into engine tables.
//!
//! The engine reads the file itself; the client only samples the first rows
//! to pick column types and renders the load command.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use ::csv::{ReaderBuilder, Trim};
use tracing::debug;

use crate::data_type::TypeId;
use crate::error::{Error, Result};
use crate::query::{QueryBuilder, symbol_list, validate_identifier};
use crate::registry::{TypeRegistry, registry};
use crate::value::escape_text;

/// Headers and the first rows of a CSV file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsvSample {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvSample {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Reads the header line (or names columns `col1..colN` when there is
    /// none) and at most `max_rows` data rows. Blank lines are skipped.
    ///
    /// Fields follow RFC 4180 quoting: a quoted field may hold the delimiter,
    /// and `""` inside quotes is one literal quote.
    pub fn read<R: Read>(reader: R, delimiter: char, has_header: bool, max_rows: usize) -> Result<Self> {
        let delimiter = u8::try_from(delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| Error::validation(format!("csv delimiter `{delimiter}` is not ascii")))?;
        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(has_header)
            .flexible(true)
            .trim(Trim::Headers)
            .from_reader(reader);

        let mut sample = Self::default();
        if has_header {
            sample.headers = reader
                .headers()
                .map_err(read_error)?
                .iter()
                .map(str::to_string)
                .collect();
        }
        for record in reader.records().take(max_rows) {
            let record = record.map_err(read_error)?;
            if sample.headers.is_empty() {
                sample.headers = (1..=record.len()).map(|i| format!("col{i}")).collect();
            }
            sample.rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(sample)
    }

    pub fn from_path(path: &Path, delimiter: char, has_header: bool, max_rows: usize) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| Error::validation(format!("cannot open {}: {e}", path.display())))?;
        Self::read(file, delimiter, has_header, max_rows)
    }

    /// Sampled values of column `index`; short rows contribute nothing.
    pub fn column(&self, index: usize) -> Vec<&str> {
        self.rows
            .iter()
            .filter_map(|row| row.get(index).map(String::as_str))
            .collect()
    }
}

fn read_error(e: ::csv::Error) -> Error {
    Error::validation(format!("cannot read csv: {e}"))
}

/// What to load and how.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvOptions {
    pub table: String,
    pub path: PathBuf,
    pub delimiter: char,
    pub has_header: bool,
    /// Column the table is keyed on; without one, an `idx` row-number key
    /// is added.
    pub key: Option<String>,
    /// Explicit column types, as type chars (`"j"`) or names (`"long"`).
    /// Types are inferred from the sample when empty.
    pub types: Vec<String>,
}

impl CsvOptions {
    pub fn new(table: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            table: table.into(),
            path: path.into(),
            delimiter: ',',
            has_header: true,
            key: None,
            types: Vec::new(),
        }
    }

    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn has_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types = types.into_iter().map(Into::into).collect();
        self
    }
}

/// A validated load: column names, their types and the key.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvLoadPlan {
    pub options: CsvOptions,
    pub columns: Vec<String>,
    pub types: Vec<TypeId>,
}

impl CsvLoadPlan {
    /// Resolves column types from explicit options or from the sample.
    ///
    /// # Errors
    /// - [Error::Validation] for bad table, column or key names, a key that
    ///   is not a column, a type count that differs from the column count,
    ///   or a sample with no data rows to infer from
    /// - [Error::Type] for an unknown explicit type
    pub fn build(options: CsvOptions, sample: &CsvSample) -> Result<Self> {
        Self::build_with(registry(), options, sample)
    }

    pub fn build_with(registry: &TypeRegistry, options: CsvOptions, sample: &CsvSample) -> Result<Self> {
        validate_identifier(&options.table, "table")?;
        if sample.headers.is_empty() {
            return Err(Error::validation(format!(
                "{} has no columns",
                options.path.display()
            )));
        }
        for header in &sample.headers {
            validate_identifier(header, "column")?;
        }
        if let Some(key) = &options.key {
            if !sample.headers.contains(key) {
                return Err(Error::validation(format!(
                    "key column `{key}` not found in csv headers"
                )));
            }
        }

        let types = if options.types.is_empty() {
            if sample.rows.is_empty() {
                return Err(Error::validation("no data rows to infer column types from"));
            }
            (0..sample.headers.len())
                .map(|i| registry.infer_type(&sample.column(i)).id)
                .collect()
        } else {
            if options.types.len() != sample.headers.len() {
                return Err(Error::validation(format!(
                    "{} types given for {} columns",
                    options.types.len(),
                    sample.headers.len()
                )));
            }
            options
                .types
                .iter()
                .map(|t| explicit_type(registry, t))
                .collect::<Result<Vec<_>>>()?
        };

        debug!(table = %options.table, ?types, "csv load plan");
        Ok(Self {
            columns: sample.headers.clone(),
            types,
            options,
        })
    }

    /// Type chars in the upper case the engine's text loader expects.
    pub fn type_string(&self) -> String {
        self.types
            .iter()
            .map(|id| id.type_char().to_ascii_uppercase())
            .collect()
    }

    /// The load command, replacing any table of the same name.
    ///
    /// ```
    /// # use qframe::csv::{CsvLoadPlan, CsvOptions, CsvSample};
    /// let sample = CsvSample::new(
    ///     vec!["sym".into(), "qty".into()],
    ///     vec![vec!["a".into(), "1".into()]],
    /// );
    /// let plan = CsvLoadPlan::build(CsvOptions::new("t", "/data/t.csv").key("sym"), &sample).unwrap();
    /// assert_eq!(
    ///     plan.query(),
    ///     "delete t from `.; t: (\"SI\"; enlist \",\") 0: hsym `$\"/data/t.csv\"; `sym xkey `t"
    /// );
    /// ```
    pub fn query(&self) -> String {
        let table = &self.options.table;
        let path = escape_text(&self.options.path.to_string_lossy());
        let delimiter = escape_text(&self.options.delimiter.to_string());
        let types = self.type_string();

        let load = if self.options.has_header {
            format!("(\"{types}\"; enlist \"{delimiter}\") 0: hsym `$\"{path}\"")
        } else {
            format!(
                "flip {}!(\"{types}\"; \"{delimiter}\") 0: hsym `$\"{path}\"",
                symbol_list_parenthesized(&self.columns)
            )
        };
        let key = match &self.options.key {
            Some(key) => format!("`{key} xkey `{table}"),
            None => format!("`idx xkey update idx:til count i from `{table}"),
        };
        let queries = QueryBuilder::default();
        format!(
            "{}; {}; {key}",
            queries.delete(table),
            queries.assign(table, &load)
        )
    }
}

fn symbol_list_parenthesized(names: &[String]) -> String {
    format!("({})", symbol_list(names))
}

fn explicit_type(registry: &TypeRegistry, spec: &str) -> Result<TypeId> {
    let mut chars = spec.chars();
    let by_char = match (chars.next(), chars.next()) {
        (Some(c), None) => registry.by_char(c.to_ascii_lowercase()),
        _ => None,
    };
    by_char
        .or_else(|| registry.descriptors().find(|d| d.name.eq_ignore_ascii_case(spec)))
        .map(|d| d.id)
        .ok_or_else(|| Error::type_error(format!("invalid column type `{spec}`")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CsvSample {
        let text = "ticker,price,size,day\nGOOG,20.5,10,2024-01-15\n\"MS,FT\",30,20,2024-01-16\nAAPL,40,30,\n";
        CsvSample::read(text.as_bytes(), ',', true, 5).unwrap()
    }

    #[test]
    fn test_read_sample() {
        let sample = sample();
        assert_eq!(sample.headers, vec!["ticker", "price", "size", "day"]);
        assert_eq!(sample.rows.len(), 3);
        assert_eq!(sample.rows[1][0], "MS,FT");
        assert_eq!(sample.column(3), vec!["2024-01-15", "2024-01-16", ""]);
    }

    #[test]
    fn test_sample_limit_and_headerless() {
        let text = "1,a\n2,b\n\n3,c\n4,d\n";
        let sample = CsvSample::read(text.as_bytes(), ',', false, 2).unwrap();
        assert_eq!(sample.headers, vec!["col1", "col2"]);
        assert_eq!(sample.rows, vec![vec!["1", "a"], vec!["2", "b"]]);
    }

    #[test]
    fn test_escaped_quotes() {
        let text = "name,qty\n\"say \"\"hi\"\"\",1\n\"a;b\",2\n";
        let sample = CsvSample::read(text.as_bytes(), ',', true, 5).unwrap();
        assert_eq!(sample.rows[0], vec!["say \"hi\"", "1"]);
        assert_eq!(sample.rows[1][0], "a;b");
        assert_eq!(registry().infer_type(&sample.column(1)).id, TypeId::Int);
    }

    #[test]
    fn test_non_ascii_delimiter() {
        let result = CsvSample::read("a\n".as_bytes(), '§', true, 5);
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_inferred_plan() {
        let plan = CsvLoadPlan::build(CsvOptions::new("trades", "/tmp/trades.csv"), &sample()).unwrap();
        assert_eq!(
            plan.types,
            vec![TypeId::Symbol, TypeId::Float, TypeId::Int, TypeId::Date]
        );
        assert_eq!(
            plan.query(),
            "delete trades from `.; trades: (\"SFID\"; enlist \",\") 0: hsym `$\"/tmp/trades.csv\"; \
             `idx xkey update idx:til count i from `trades"
        );
    }

    #[test]
    fn test_explicit_types_and_headerless() {
        let sample = CsvSample::new(
            vec!["col1".into(), "col2".into()],
            vec![vec!["1".into(), "x".into()]],
        );
        let options = CsvOptions::new("t", "d\\t.csv")
            .has_header(false)
            .delimiter('|')
            .types(["long", "s"])
            .key("col1");
        let plan = CsvLoadPlan::build(options, &sample).unwrap();
        assert_eq!(plan.types, vec![TypeId::Long, TypeId::Symbol]);
        assert_eq!(
            plan.query(),
            "delete t from `.; t: flip (`col1`col2)!(\"JS\"; \"|\") 0: hsym `$\"d\\\\t.csv\"; `col1 xkey `t"
        );
    }

    #[test]
    fn test_plan_errors() {
        let sample = sample();
        let missing_key = CsvOptions::new("t", "a.csv").key("bid");
        assert!(matches!(CsvLoadPlan::build(missing_key, &sample), Err(Error::Validation(_))));

        let few_types = CsvOptions::new("t", "a.csv").types(["s", "f"]);
        assert!(matches!(CsvLoadPlan::build(few_types, &sample), Err(Error::Validation(_))));

        let bad_type = CsvOptions::new("t", "a.csv").types(["s", "f", "q", "d"]);
        assert!(matches!(CsvLoadPlan::build(bad_type, &sample), Err(Error::Type(_))));

        let bad_table = CsvOptions::new("1t", "a.csv");
        assert!(matches!(CsvLoadPlan::build(bad_table, &sample), Err(Error::Validation(_))));

        let no_rows = CsvSample::new(vec!["a".into()], Vec::new());
        assert!(matches!(
            CsvLoadPlan::build(CsvOptions::new("t", "a.csv"), &no_rows),
            Err(Error::Validation(_))
        ));
    }
}
