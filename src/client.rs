//! The public entry point: table operations over one shared connection.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::connection::ConnectionManager;
use crate::csv::{CsvLoadPlan, CsvOptions, CsvSample};
use crate::error::{Axis, EngineError, Error, Result};
use crate::join::{JoinOrchestrator, JoinSpec};
use crate::marshal::{Row, ValueMarshaler};
use crate::query::{QueryBuilder, validate_identifier};
use crate::shape::{ResultShape, ResultShaper};
use crate::table::TableMeta;
use crate::transport::Connector;
use crate::value::TypedValue;
use crate::wire::WireValue;

/// Selection, filtering, joins and loading against engine tables.
///
/// ```
/// # use qframe::{Client, ClientConfig};
/// # use qframe::transport::ScriptedEngine;
/// # use qframe::wire::WireValue;
/// let engine = ScriptedEngine::new();
/// engine.on_exact("count t", WireValue::long(2));
/// let client = Client::connect(ClientConfig::default(), engine.connector()).unwrap();
/// assert_eq!(client.row_count("t").unwrap(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    connection: Arc<ConnectionManager>,
    marshaler: ValueMarshaler,
    queries: QueryBuilder,
    shaper: ResultShaper,
}

impl Client {
    pub fn new(connection: Arc<ConnectionManager>) -> Self {
        let marshaler = ValueMarshaler::default();
        Self {
            connection,
            marshaler,
            queries: QueryBuilder::new(marshaler),
            shaper: ResultShaper::new(marshaler),
        }
    }

    /// Opens a connection and wraps it.
    pub fn connect(config: ClientConfig, connector: impl Connector + 'static) -> Result<Self> {
        let connection = ConnectionManager::new(config, connector);
        connection.connect()?;
        Ok(Self::new(Arc::new(connection)))
    }

    pub fn connection(&self) -> &Arc<ConnectionManager> {
        &self.connection
    }

    /// Submits raw query text.
    pub fn query(&self, text: &str) -> Result<WireValue> {
        Ok(self.connection.submit(text)?)
    }

    pub fn row_count(&self, table: &str) -> Result<usize> {
        validate_identifier(table, "table")?;
        let wire = self.query(&self.queries.count(table))?;
        self.marshaler.count_from_wire(&wire)
    }

    pub fn metadata(&self, table: &str) -> Result<TableMeta> {
        validate_identifier(table, "table")?;
        let wire = self.query(&self.queries.meta(table))?;
        TableMeta::from_wire(&wire, &self.marshaler)
    }

    /// `(rows, columns)` of a table.
    pub fn shape(&self, table: &str) -> Result<(usize, usize)> {
        validate_identifier(table, "table")?;
        let query = self.queries.shape(table);
        let wire = self.query(&query)?;
        let counts: Vec<Option<i64>> = self
            .marshaler
            .list_from_wire(&wire)?
            .iter()
            .map(|cell| cell.as_ref().and_then(TypedValue::as_i64))
            .collect();
        match counts.as_slice() {
            [Some(rows), Some(columns)] => Ok((
                usize::try_from(*rows).unwrap_or_default(),
                usize::try_from(*columns).unwrap_or_default(),
            )),
            _ => Err(EngineError::UnexpectedResult {
                query,
                expected: "two counts",
            }
            .into()),
        }
    }

    /// Selects rows and columns by position.
    ///
    /// Empty `rows` or `columns` select everything along that axis. Indices
    /// are checked against the table's current extent before the selection
    /// is submitted.
    ///
    /// ```
    /// # use qframe::{Client, ClientConfig};
    /// # use qframe::transport::ScriptedEngine;
    /// # use qframe::wire::WireValue;
    /// let engine = ScriptedEngine::new();
    /// engine
    ///     .on_exact("count t", WireValue::long(3))
    ///     .on_exact(
    ///         "select c, t from 0!meta `t",
    ///         WireValue::table([("c", WireValue::symbols(["ticker"])), ("t", WireValue::chars("s"))]),
    ///     );
    /// let client = Client::connect(ClientConfig::default(), engine.connector()).unwrap();
    /// assert!(client.iloc("t", &[5], &[0]).is_err());
    /// assert!(engine.submitted_containing("(0!t)").is_empty());
    /// ```
    ///
    /// # Errors
    /// [Error::Bounds] for an index past the extent of its axis.
    pub fn iloc(&self, table: &str, rows: &[usize], columns: &[usize]) -> Result<ResultShape> {
        validate_identifier(table, "table")?;
        if !rows.is_empty() {
            let extent = self.row_count(table)?;
            check_bounds(Axis::Row, rows, extent)?;
        }

        let meta = self.metadata(table)?;
        if meta.is_empty() {
            return Err(Error::validation(format!("table `{table}` has no columns")));
        }
        check_bounds(Axis::Column, columns, meta.len())?;
        let names: Vec<&str> = columns
            .iter()
            .filter_map(|&i| meta.name_at(i))
            .collect();

        let wire = self.query(&self.queries.iloc(table, rows, &names))?;
        self.shaper.shape_selection(&wire)
    }

    /// Filters rows by comma-separated conditions, applied one after the
    /// other: `"price>20, size<30"`.
    ///
    /// # Errors
    /// [Error::Validation] for a malformed condition, before anything is
    /// submitted.
    pub fn loc(&self, table: &str, conditions: &str) -> Result<ResultShape> {
        validate_identifier(table, "table")?;
        let predicates = self.queries.parse_conditions(conditions)?;
        let meta = self.metadata(table)?;
        let wire = self.query(&self.queries.loc(table, &predicates, &meta))?;
        self.shaper.shape_table(&wire)
    }

    /// Creates (or replaces) a table from host rows.
    pub fn make_table<S: AsRef<str>>(&self, name: &str, columns: &[S], rows: &[Row]) -> Result<()> {
        let query = self.queries.make_table(name, columns, rows)?;
        self.query(&query)?;
        info!(table = name, rows = rows.len(), "created table");
        Ok(())
    }

    pub fn join(&self, spec: &JoinSpec) -> Result<ResultShape> {
        JoinOrchestrator::new(&self.connection, self.marshaler).join(spec)
    }

    pub fn inner_join(&self, left: &str, right: &str, result: &str, on: &[&str]) -> Result<ResultShape> {
        self.join(&JoinSpec::inner(left, right, result).on(on.iter().copied()))
    }

    pub fn left_join(&self, left: &str, right: &str, result: &str, on: &[&str]) -> Result<ResultShape> {
        self.join(&JoinSpec::left(left, right, result).on(on.iter().copied()))
    }

    pub fn right_join(&self, left: &str, right: &str, result: &str, on: &[&str]) -> Result<ResultShape> {
        self.join(&JoinSpec::right(left, right, result).on(on.iter().copied()))
    }

    pub fn asof_join(
        &self,
        left: &str,
        right: &str,
        result: &str,
        on: &[&str],
        time: (&str, &str),
    ) -> Result<ResultShape> {
        self.join(
            &JoinSpec::asof(left, right, result)
                .on(on.iter().copied())
                .time_columns(time.0, time.1),
        )
    }

    pub fn window_join(
        &self,
        left: &str,
        right: &str,
        result: &str,
        on: &[&str],
        time: (&str, &str),
        window: Duration,
    ) -> Result<ResultShape> {
        self.join(
            &JoinSpec::window(left, right, result)
                .on(on.iter().copied())
                .time_columns(time.0, time.1)
                .duration(window),
        )
    }

    pub fn union_join(&self, left: &str, right: &str, result: &str) -> Result<ResultShape> {
        self.join(&JoinSpec::union(left, right, result))
    }

    /// Loads a CSV file into a table, sampling the file for column types.
    pub fn load_csv(&self, options: CsvOptions) -> Result<CsvLoadPlan> {
        let sample = CsvSample::from_path(
            &options.path,
            options.delimiter,
            options.has_header,
            self.connection.config().csv_sample_rows,
        )?;
        self.load_csv_sample(options, &sample)
    }

    /// Loads a CSV file whose headers and first rows were read elsewhere.
    pub fn load_csv_sample(&self, options: CsvOptions, sample: &CsvSample) -> Result<CsvLoadPlan> {
        let plan = CsvLoadPlan::build(options, sample)?;
        self.query(&plan.query())?;
        debug!(table = %plan.options.table, types = %plan.type_string(), "loaded csv");
        Ok(plan)
    }
}

fn check_bounds(axis: Axis, indices: &[usize], extent: usize) -> Result<()> {
    match indices.iter().find(|&&i| i >= extent) {
        Some(&index) => Err(Error::Bounds {
            axis,
            index,
            extent,
        }),
        None => Ok(()),
    }
}
