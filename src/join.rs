//! Joins between engine tables.
//!
//! Every join works on unkeyed copies of its inputs, held in temporaries that
//! are deleted when the call returns:
//!
//! | kind   | engine form                             |
//! |--------|-----------------------------------------|
//! | inner  | `` L ij `k xkey R ``                    |
//! | left   | `` L lj `k xkey R ``                    |
//! | right  | `` R lj `k xkey L ``                    |
//! | asof   | `` aj[`k`t;L;R] ``                      |
//! | window | `` wj[w;`k`t;L;(R;(last;`c)..)] ``      |
//! | union  | `L uj R`                                |
//!
//! Without join columns, inner, left and right joins key on every column
//! name the two sides share.

use std::fmt;
use std::time::Duration;

use tracing::debug;

use crate::artifact::TemporaryArtifact;
use crate::connection::ConnectionManager;
use crate::error::{Error, Result};
use crate::marshal::ValueMarshaler;
use crate::query::{QueryBuilder, symbol_list, validate_identifier};
use crate::shape::{ResultShape, ResultShaper};
use crate::temporal::format_second;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    AsOf,
    Window,
    Union,
}

impl fmt::Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JoinKind::Inner => "inner",
            JoinKind::Left => "left",
            JoinKind::Right => "right",
            JoinKind::AsOf => "asof",
            JoinKind::Window => "window",
            JoinKind::Union => "union",
        };
        f.write_str(name)
    }
}

/// What to join and how.
///
/// ```
/// # use qframe::join::{JoinKind, JoinSpec};
/// # use std::time::Duration;
/// let spec = JoinSpec::window("trades", "quotes", "r")
///     .on(["sym"])
///     .time_columns("time", "time")
///     .duration(Duration::from_secs(1));
/// assert_eq!(spec.kind, JoinKind::Window);
/// assert!(spec.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct JoinSpec {
    pub kind: JoinKind,
    pub left: String,
    pub right: String,
    /// Global the result is assigned to.
    pub result: String,
    /// Join columns, in order.
    pub on: Vec<String>,
    /// Left and right time columns of asof and window joins.
    pub time: Option<(String, String)>,
    pub window: Option<Duration>,
}

impl JoinSpec {
    pub fn new(
        kind: JoinKind,
        left: impl Into<String>,
        right: impl Into<String>,
        result: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            left: left.into(),
            right: right.into(),
            result: result.into(),
            on: Vec::new(),
            time: None,
            window: None,
        }
    }

    pub fn inner(left: impl Into<String>, right: impl Into<String>, result: impl Into<String>) -> Self {
        Self::new(JoinKind::Inner, left, right, result)
    }

    pub fn left(left: impl Into<String>, right: impl Into<String>, result: impl Into<String>) -> Self {
        Self::new(JoinKind::Left, left, right, result)
    }

    pub fn right(left: impl Into<String>, right: impl Into<String>, result: impl Into<String>) -> Self {
        Self::new(JoinKind::Right, left, right, result)
    }

    pub fn asof(left: impl Into<String>, right: impl Into<String>, result: impl Into<String>) -> Self {
        Self::new(JoinKind::AsOf, left, right, result)
    }

    pub fn window(left: impl Into<String>, right: impl Into<String>, result: impl Into<String>) -> Self {
        Self::new(JoinKind::Window, left, right, result)
    }

    pub fn union(left: impl Into<String>, right: impl Into<String>, result: impl Into<String>) -> Self {
        Self::new(JoinKind::Union, left, right, result)
    }

    pub fn on<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.on = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn time_columns(mut self, left: impl Into<String>, right: impl Into<String>) -> Self {
        self.time = Some((left.into(), right.into()));
        self
    }

    pub fn duration(mut self, window: Duration) -> Self {
        self.window = Some(window);
        self
    }

    /// Checks everything that can be checked without the engine.
    ///
    /// # Errors
    /// Returns [Error::Validation] for bad names, a window join without join
    /// columns or duration, and asof or window joins without time columns.
    pub fn validate(&self) -> Result<()> {
        validate_identifier(&self.left, "table")?;
        validate_identifier(&self.right, "table")?;
        validate_identifier(&self.result, "result")?;
        for column in &self.on {
            validate_identifier(column, "join column")?;
        }
        if let Some((left, right)) = &self.time {
            validate_identifier(left, "time column")?;
            validate_identifier(right, "time column")?;
        }

        match self.kind {
            JoinKind::Window => {
                if self.on.is_empty() {
                    return Err(Error::validation("window join needs join columns"));
                }
                if self.time.is_none() {
                    return Err(Error::validation("window join needs time columns"));
                }
                match self.window {
                    None => return Err(Error::validation("window join needs a window duration")),
                    Some(w) if i32::try_from(w.as_secs()).is_err() => {
                        return Err(Error::validation(format!(
                            "window of {}s is longer than the engine's second type holds",
                            w.as_secs()
                        )));
                    }
                    Some(_) => {}
                }
            }
            JoinKind::AsOf if self.time.is_none() => {
                return Err(Error::validation("asof join needs time columns"));
            }
            _ => {}
        }
        Ok(())
    }
}

/// Where a join call stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinState {
    Prepared,
    Executed,
    Failed,
    CleanedUp,
}

/// Runs joins through one connection.
#[derive(Debug)]
pub struct JoinOrchestrator<'a> {
    connection: &'a ConnectionManager,
    marshaler: ValueMarshaler,
    queries: QueryBuilder,
    shaper: ResultShaper,
}

impl<'a> JoinOrchestrator<'a> {
    pub fn new(connection: &'a ConnectionManager, marshaler: ValueMarshaler) -> Self {
        Self {
            connection,
            marshaler,
            queries: QueryBuilder::new(marshaler),
            shaper: ResultShaper::new(marshaler),
        }
    }

    /// Runs the join, assigns it to `spec.result` and returns the result.
    ///
    /// # Errors
    /// - [Error::Validation] before any engine call for an invalid spec
    /// - [Error::Resource] when a temporary cannot be created
    /// - [Error::Engine] when the join itself or the retrieval fails
    ///
    /// Temporaries are deleted in every case.
    pub fn join(&self, spec: &JoinSpec) -> Result<ResultShape> {
        spec.validate()?;
        let result = self.run(spec);
        transition(spec, JoinState::CleanedUp);
        result
    }

    fn run(&self, spec: &JoinSpec) -> Result<ResultShape> {
        let left = self.unkeyed(&spec.left)?;
        let right = if spec.right == spec.left {
            None
        } else {
            Some(self.unkeyed(&spec.right)?)
        };
        let lu = left.name();
        let ru = right.as_ref().map_or(lu, TemporaryArtifact::name);
        transition(spec, JoinState::Prepared);

        // extra temporaries of asof and window joins
        let mut extra: Vec<TemporaryArtifact<'a>> = Vec::new();
        let expr = match spec.kind {
            JoinKind::Inner | JoinKind::Left => keyed_join(spec, lu, ru),
            JoinKind::Right => keyed_join(spec, ru, lu),
            JoinKind::Union => format!("{lu} uj {ru}"),
            JoinKind::AsOf => {
                let (tl, tr) = time_columns(spec)?;
                let copy = if tl == tr { format!("{tr}2") } else { tl.to_string() };
                let adjusted = TemporaryArtifact::create(
                    self.connection,
                    self.artifact_name(&format!("{}_adj", spec.right)),
                    &format!("update {copy}:{tr} from {ru}"),
                )?;
                let expr = format!(
                    "aj[{};{lu};{}]",
                    join_columns_with(&spec.on, tl),
                    adjusted.name()
                );
                extra.push(adjusted);
                expr
            }
            JoinKind::Window => {
                let (tl, tr) = time_columns(spec)?;
                let duration = spec
                    .window
                    .ok_or_else(|| Error::validation("window join needs a window duration"))?;
                let windows = TemporaryArtifact::create(
                    self.connection,
                    self.artifact_name(&format!("{}_window", spec.result)),
                    &window_intervals(duration, lu, tl),
                )?;

                let mut excluded = vec![tr.to_string()];
                excluded.extend(spec.on.iter().cloned());
                let aggregated = self
                    .connection
                    .submit(&format!("(cols {ru}) except {}", symbol_list(&excluded)))
                    .map_err(Error::from)
                    .and_then(|wire| self.marshaler.symbols_from_wire(&wire));
                let aggregated = match aggregated {
                    Ok(columns) => columns,
                    Err(e) => {
                        transition(spec, JoinState::Failed);
                        return Err(e);
                    }
                };

                let expr = format!(
                    "wj[{};{};{lu};{}]",
                    windows.name(),
                    join_columns_with(&spec.on, tl),
                    aggregations(ru, &aggregated)
                );
                extra.push(windows);
                expr
            }
        };

        let query = self.queries.assign(&spec.result, &expr);
        if let Err(e) = self.connection.submit(&query) {
            transition(spec, JoinState::Failed);
            return Err(e.into());
        }
        transition(spec, JoinState::Executed);

        let shaped = self
            .connection
            .submit(&spec.result)
            .map_err(Error::from)
            .and_then(|wire| self.shaper.shape_table(&wire));
        let shaped = match shaped {
            Ok(shaped) => shaped,
            Err(e) => {
                transition(spec, JoinState::Failed);
                return Err(e);
            }
        };

        // newest temporaries first
        while let Some(artifact) = extra.pop() {
            drop(artifact);
        }
        drop(right);
        drop(left);
        Ok(shaped)
    }

    fn unkeyed(&self, table: &str) -> Result<TemporaryArtifact<'a>> {
        let name = self.artifact_name(&format!(
            "{table}{}",
            self.connection.config().artifact_suffix
        ));
        TemporaryArtifact::create(self.connection, name, &format!("0!({table})"))
    }

    fn artifact_name(&self, base: &str) -> String {
        if self.connection.config().unique_artifact_names {
            format!("{base}_{}", self.connection.next_token())
        } else {
            base.to_string()
        }
    }
}

fn transition(spec: &JoinSpec, state: JoinState) {
    debug!(kind = %spec.kind, result = %spec.result, state = ?state, "join");
}

fn time_columns(spec: &JoinSpec) -> Result<(&str, &str)> {
    spec.time
        .as_ref()
        .map(|(l, r)| (l.as_str(), r.as_str()))
        .ok_or_else(|| Error::validation(format!("{} join needs time columns", spec.kind)))
}

/// `L ij `k xkey R`, or keyed on the shared column names without explicit
/// columns.
fn keyed_join(spec: &JoinSpec, left: &str, right: &str) -> String {
    let op = if spec.kind == JoinKind::Inner { "ij" } else { "lj" };
    let keys = if spec.on.is_empty() {
        format!("(cols[{left}] inter cols[{right}])")
    } else {
        symbol_list(&spec.on)
    };
    format!("{left} {op} {keys} xkey {right}")
}

fn join_columns_with(on: &[String], time: &str) -> String {
    format!("{}`{time}", symbol_list(on))
}

/// `(-00:00:01.000 00:00:01.000) +\: L`t`, the window cut to whole seconds
fn window_intervals(window: Duration, table: &str, time: &str) -> String {
    let secs = i32::try_from(window.as_secs()).unwrap_or(i32::MAX);
    let span = format!("{}.000", format_second(secs));
    format!("(-{span} {span}) +\\: {table}`{time}")
}

fn aggregations(table: &str, columns: &[String]) -> String {
    if columns.is_empty() {
        return format!("enlist {table}");
    }
    let aggs: Vec<String> = columns.iter().map(|c| format!("(last;`{c})")).collect();
    format!("({table};{})", aggs.join(";"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::transport::ScriptedEngine;
    use crate::value::TypedValue;
    use crate::wire::WireValue;
    use parking_lot::Mutex;
    use std::io;
    use std::sync::Arc;

    fn connected(engine: &ScriptedEngine, unique: bool) -> ConnectionManager {
        let config = ClientConfig::default().unique_artifact_names(unique);
        let manager = ConnectionManager::new(config, engine.connector());
        manager.connect().unwrap();
        manager
    }

    fn joined() -> WireValue {
        WireValue::table([
            ("ticker", WireValue::symbols(["GOOG", "AAPL"])),
            ("price", WireValue::longs([20, 40])),
            ("bid", WireValue::longs([19, 39])),
        ])
    }

    fn run(engine: &ScriptedEngine, spec: &JoinSpec) -> Result<ResultShape> {
        let manager = connected(engine, false);
        JoinOrchestrator::new(&manager, ValueMarshaler::default()).join(spec)
    }

    /// Every assigned temporary is deleted, newest first.
    fn assert_cleaned(engine: &ScriptedEngine) {
        let created: Vec<String> = engine
            .submitted()
            .iter()
            .filter(|q| q.contains("_unkeyed:") || q.contains("_adj:") || q.contains("_window:"))
            .map(|q| q.split(':').next().unwrap_or_default().to_string())
            .collect();
        let deleted: Vec<String> = engine
            .submitted_containing("delete ")
            .iter()
            .map(|q| q.trim_start_matches("delete ").trim_end_matches(" from `.").to_string())
            .collect();
        let mut reversed = created.clone();
        reversed.reverse();
        assert_eq!(deleted, reversed);
    }

    // ─── Test 1 : inner join with explicit columns ───
    #[test]
    fn test_inner_join() {
        let engine = ScriptedEngine::new();
        engine.on_exact("r", joined());
        let shape = run(&engine, &JoinSpec::inner("t1", "t2", "r").on(["ticker"])).unwrap();

        assert_eq!(
            engine.submitted(),
            vec![
                ".z.P",
                "t1_unkeyed: 0!(t1)",
                "t2_unkeyed: 0!(t2)",
                "r: t1_unkeyed ij `ticker xkey t2_unkeyed",
                "r",
                "delete t2_unkeyed from `.",
                "delete t1_unkeyed from `.",
            ]
        );
        let rows = shape.as_table().unwrap();
        assert_eq!(rows[1][0], Some(TypedValue::symbol("AAPL")));
        assert_eq!(rows[1][2], Some(TypedValue::Long(39)));
    }

    // ─── Test 2 : natural, left and right joins ───
    #[test]
    fn test_keyed_join_forms() {
        let engine = ScriptedEngine::new();
        engine.on_exact("r", joined());
        run(&engine, &JoinSpec::inner("t1", "t2", "r")).unwrap();
        assert_eq!(
            engine.submitted_containing("r: "),
            vec!["r: t1_unkeyed ij (cols[t1_unkeyed] inter cols[t2_unkeyed]) xkey t2_unkeyed"]
        );

        let engine = ScriptedEngine::new();
        engine.on_exact("r", joined());
        run(&engine, &JoinSpec::left("t1", "t2", "r").on(["ticker"])).unwrap();
        assert_eq!(
            engine.submitted_containing("r: "),
            vec!["r: t1_unkeyed lj `ticker xkey t2_unkeyed"]
        );

        let engine = ScriptedEngine::new();
        engine.on_exact("r", joined());
        run(&engine, &JoinSpec::right("t1", "t2", "r").on(["ticker"])).unwrap();
        assert_eq!(
            engine.submitted_containing("r: "),
            vec!["r: t2_unkeyed lj `ticker xkey t1_unkeyed"]
        );
        assert_cleaned(&engine);
    }

    // ─── Test 3 : asof join adjusts the right time column ───
    #[test]
    fn test_asof_join() {
        let engine = ScriptedEngine::new();
        engine.on_exact("r", joined());
        let spec = JoinSpec::asof("trades", "quotes", "r")
            .on(["sym"])
            .time_columns("time", "time");
        run(&engine, &spec).unwrap();

        assert_eq!(
            engine.submitted_containing("_adj:"),
            vec!["quotes_adj: update time2:time from quotes_unkeyed"]
        );
        assert_eq!(
            engine.submitted_containing("r: "),
            vec!["r: aj[`sym`time;trades_unkeyed;quotes_adj]"]
        );
        assert_cleaned(&engine);

        let engine = ScriptedEngine::new();
        engine.on_exact("r", joined());
        let spec = JoinSpec::asof("trades", "quotes", "r").time_columns("ttime", "qtime");
        run(&engine, &spec).unwrap();
        assert_eq!(
            engine.submitted_containing("_adj:"),
            vec!["quotes_adj: update ttime:qtime from quotes_unkeyed"]
        );
        assert_eq!(
            engine.submitted_containing("r: "),
            vec!["r: aj[`ttime;trades_unkeyed;quotes_adj]"]
        );
    }

    // ─── Test 4 : window join with a one second window ───
    #[test]
    fn test_window_join() {
        let engine = ScriptedEngine::new();
        engine
            .on_prefix("(cols ", WireValue::symbols(["bid"]))
            .on_exact("r", joined());
        let spec = JoinSpec::window("trades", "quotes", "r")
            .on(["sym"])
            .time_columns("time", "time")
            .duration(Duration::from_millis(1500));
        run(&engine, &spec).unwrap();

        assert_eq!(
            engine.submitted_containing("_window:"),
            vec!["r_window: (-00:00:01.000 00:00:01.000) +\\: trades_unkeyed`time"]
        );
        assert_eq!(
            engine.submitted_containing("except"),
            vec!["(cols quotes_unkeyed) except `time`sym"]
        );
        assert_eq!(
            engine.submitted_containing("r: "),
            vec!["r: wj[r_window;`sym`time;trades_unkeyed;(quotes_unkeyed;(last;`bid))]"]
        );
        assert_cleaned(&engine);
    }

    // ─── Test 5 : invalid window join never reaches the engine ───
    #[test]
    fn test_window_join_validation() {
        let engine = ScriptedEngine::new();
        let manager = connected(&engine, true);
        let orchestrator = JoinOrchestrator::new(&manager, ValueMarshaler::default());

        let no_columns = JoinSpec::window("trades", "quotes", "r")
            .time_columns("time", "time")
            .duration(Duration::from_secs(1));
        assert!(matches!(orchestrator.join(&no_columns), Err(Error::Validation(_))));

        let no_duration = JoinSpec::window("trades", "quotes", "r")
            .on(["sym"])
            .time_columns("time", "time");
        assert!(matches!(orchestrator.join(&no_duration), Err(Error::Validation(_))));

        let no_time = JoinSpec::asof("trades", "quotes", "r");
        assert!(matches!(orchestrator.join(&no_time), Err(Error::Validation(_))));

        let bad_name = JoinSpec::union("trades", "quotes", "r; delete");
        assert!(matches!(orchestrator.join(&bad_name), Err(Error::Validation(_))));

        assert_eq!(engine.submitted(), vec![".z.P"]);
    }

    // ─── Test 6 : union join ───
    #[test]
    fn test_union_join() {
        let engine = ScriptedEngine::new();
        engine.on_exact("r", joined());
        run(&engine, &JoinSpec::union("t1", "t2", "r")).unwrap();
        assert_eq!(
            engine.submitted_containing("r: "),
            vec!["r: t1_unkeyed uj t2_unkeyed"]
        );
        assert_cleaned(&engine);
    }

    // ─── Test 7 : failures still clean up ───
    #[test]
    fn test_cleanup_on_failure() {
        // the join itself fails
        let engine = ScriptedEngine::new();
        engine.reject_containing(" ij ", "mismatch");
        let err = run(&engine, &JoinSpec::inner("t1", "t2", "r").on(["ticker"])).unwrap_err();
        assert!(matches!(err, Error::Engine(_)));
        assert_cleaned(&engine);
        assert_eq!(engine.submitted_containing("delete").len(), 2);

        // the second temporary cannot be created
        let engine = ScriptedEngine::new();
        engine.reject_containing("0!(t2)", "t2");
        let err = run(&engine, &JoinSpec::inner("t1", "t2", "r")).unwrap_err();
        assert!(matches!(err, Error::Resource { ref artifact, .. } if artifact == "t2_unkeyed"));
        assert_eq!(engine.submitted_containing("delete"), vec!["delete t1_unkeyed from `."]);

        // the window artifact cannot be created
        let engine = ScriptedEngine::new();
        engine.reject_containing("+\\:", "type");
        let spec = JoinSpec::window("trades", "quotes", "r")
            .on(["sym"])
            .time_columns("time", "time")
            .duration(Duration::from_secs(1));
        assert!(matches!(run(&engine, &spec), Err(Error::Resource { .. })));
        assert_eq!(engine.submitted_containing("delete").len(), 2);

        // the column fetch breaks the transport
        let engine = ScriptedEngine::new();
        engine.break_on("except");
        assert!(matches!(run(&engine, &spec), Err(Error::Engine(_))));
        assert_eq!(engine.submitted_containing("delete").len(), 3);
        assert!(engine.submitted_containing("wj[").is_empty());
    }

    // ─── Test 8 : temporaries carry a per-call token ───
    #[test]
    fn test_unique_artifact_names() {
        let engine = ScriptedEngine::new();
        engine.on_exact("r", joined());
        let manager = connected(&engine, true);
        let orchestrator = JoinOrchestrator::new(&manager, ValueMarshaler::default());
        let spec = JoinSpec::union("t1", "t2", "r");
        orchestrator.join(&spec).unwrap();
        orchestrator.join(&spec).unwrap();

        assert_eq!(
            engine.submitted_containing(" uj "),
            vec!["r: t1_unkeyed_0 uj t2_unkeyed_1", "r: t1_unkeyed_2 uj t2_unkeyed_3"]
        );
        assert_eq!(engine.submitted_containing("delete").len(), 4);
    }

    #[test]
    fn test_self_join_uses_one_temporary() {
        let engine = ScriptedEngine::new();
        engine.on_exact("r", joined());
        run(&engine, &JoinSpec::inner("t1", "t1", "r").on(["ticker"])).unwrap();
        assert_eq!(
            engine.submitted_containing("r: "),
            vec!["r: t1_unkeyed ij `ticker xkey t1_unkeyed"]
        );
        assert_eq!(engine.submitted_containing("delete"), vec!["delete t1_unkeyed from `."]);
    }

    #[test]
    fn test_window_intervals() {
        assert_eq!(
            window_intervals(Duration::from_secs(1), "l", "t"),
            "(-00:00:01.000 00:00:01.000) +\\: l`t"
        );
        assert_eq!(
            window_intervals(Duration::from_secs(3725), "l", "t"),
            "(-01:02:05.000 01:02:05.000) +\\: l`t"
        );
        assert_eq!(
            window_intervals(Duration::from_secs(90_000), "l", "t"),
            "(-25:00:00.000 25:00:00.000) +\\: l`t"
        );
        assert_eq!(
            window_intervals(Duration::from_millis(999), "l", "t"),
            "(-00:00:00.000 00:00:00.000) +\\: l`t"
        );
        assert_eq!(aggregations("q", &[]), "enlist q");

        let huge = JoinSpec::window("l", "r", "out")
            .on(["sym"])
            .time_columns("time", "time")
            .duration(Duration::from_secs(u64::from(u32::MAX)));
        assert!(matches!(huge.validate(), Err(Error::Validation(_))));
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    // ─── Test 9 : a failed retrieval is logged as Failed ───
    #[test]
    fn test_retrieval_failure_is_logged() {
        let engine = ScriptedEngine::new();
        engine.on_exact("r", WireValue::Error("r".into()));
        let logs = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer({
                let logs = logs.clone();
                move || logs.clone()
            })
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .finish();

        let err = tracing::subscriber::with_default(subscriber, || {
            run(&engine, &JoinSpec::inner("t1", "t2", "r").on(["ticker"])).unwrap_err()
        });
        assert!(matches!(err, Error::Engine(_)));
        assert_cleaned(&engine);

        let text = String::from_utf8(logs.0.lock().clone()).unwrap();
        let states: Vec<&str> = text
            .lines()
            .filter_map(|line| line.split("state=").nth(1))
            .map(|rest| rest.split_whitespace().next().unwrap_or_default())
            .collect();
        assert_eq!(states, vec!["Prepared", "Executed", "Failed", "CleanedUp"]);
    }
}
