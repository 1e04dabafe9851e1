use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use super::{Connector, Transport};
use crate::error::{EngineError, EngineResult};
use crate::wire::WireValue;

#[derive(Debug, Clone)]
enum Matcher {
    Exact(String),
    Prefix(String),
    Contains(String),
}

impl Matcher {
    fn matches(&self, query: &str) -> bool {
        match self {
            Matcher::Exact(q) => query == q,
            Matcher::Prefix(p) => query.starts_with(p.as_str()),
            Matcher::Contains(f) => query.contains(f.as_str()),
        }
    }
}

#[derive(Debug, Clone)]
enum Reply {
    Value(WireValue),
    Broken(String),
}

#[derive(Debug)]
struct Rule {
    matcher: Matcher,
    reply: Reply,
}

#[derive(Debug, Default)]
struct State {
    rules: Vec<Rule>,
    journal: Vec<String>,
    refusal: Option<String>,
    connects: usize,
    closes: usize,
}

/// An in-process stand-in for the engine.
///
/// Queries are answered by the most recently registered matching rule;
/// unmatched queries answer [WireValue::Unit], like an assignment does.
/// Every submitted query is journaled. Clones share the same state.
///
/// ```
/// # use qframe::transport::ScriptedEngine;
/// # use qframe::wire::WireValue;
/// let engine = ScriptedEngine::new();
/// engine.on_exact("count t", WireValue::long(3));
/// assert!(engine.submitted().is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScriptedEngine {
    state: Arc<Mutex<State>>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn rule(&self, matcher: Matcher, reply: Reply) -> &Self {
        self.state.lock().rules.push(Rule { matcher, reply });
        self
    }

    /// Answers `query` exactly.
    pub fn on_exact(&self, query: &str, value: WireValue) -> &Self {
        self.rule(Matcher::Exact(query.into()), Reply::Value(value))
    }

    pub fn on_prefix(&self, prefix: &str, value: WireValue) -> &Self {
        self.rule(Matcher::Prefix(prefix.into()), Reply::Value(value))
    }

    pub fn on_contains(&self, fragment: &str, value: WireValue) -> &Self {
        self.rule(Matcher::Contains(fragment.into()), Reply::Value(value))
    }

    /// Makes the engine answer queries containing `fragment` with an error
    /// payload.
    pub fn reject_containing(&self, fragment: &str, message: &str) -> &Self {
        self.on_contains(fragment, WireValue::Error(message.into()))
    }

    /// Makes the transport itself fail on queries containing `fragment`.
    pub fn break_on(&self, fragment: &str) -> &Self {
        self.rule(
            Matcher::Contains(fragment.into()),
            Reply::Broken(format!("connection reset while sending `{fragment}`")),
        )
    }

    pub fn refuse_connections(&self, reason: &str) -> &Self {
        self.state.lock().refusal = Some(reason.into());
        self
    }

    /// Every query submitted so far, in order.
    pub fn submitted(&self) -> Vec<String> {
        self.state.lock().journal.clone()
    }

    pub fn submitted_containing(&self, fragment: &str) -> Vec<String> {
        self.state
            .lock()
            .journal
            .iter()
            .filter(|q| q.contains(fragment))
            .cloned()
            .collect()
    }

    pub fn connect_count(&self) -> usize {
        self.state.lock().connects
    }

    pub fn close_count(&self) -> usize {
        self.state.lock().closes
    }

    pub fn connector(&self) -> ScriptedConnector {
        ScriptedConnector {
            engine: self.clone(),
        }
    }

    fn answer(&self, query: &str) -> EngineResult<WireValue> {
        let mut state = self.state.lock();
        state.journal.push(query.to_string());
        let reply = state
            .rules
            .iter()
            .rev()
            .find(|rule| rule.matcher.matches(query))
            .map(|rule| rule.reply.clone());
        trace!(query, matched = reply.is_some(), "scripted engine");
        match reply {
            Some(Reply::Value(value)) => Ok(value),
            Some(Reply::Broken(reason)) => Err(EngineError::Transport(reason)),
            None => Ok(WireValue::Unit),
        }
    }
}

/// [Connector] handing out handles to a [ScriptedEngine].
#[derive(Debug, Clone)]
pub struct ScriptedConnector {
    engine: ScriptedEngine,
}

impl Connector for ScriptedConnector {
    fn connect(&self, host: &str, port: u16) -> EngineResult<Box<dyn Transport>> {
        let mut state = self.engine.state.lock();
        if let Some(reason) = &state.refusal {
            return Err(EngineError::ConnectionFailed {
                host: host.to_string(),
                port,
                reason: reason.clone(),
            });
        }
        state.connects += 1;
        Ok(Box::new(ScriptedHandle {
            engine: self.engine.clone(),
        }))
    }
}

struct ScriptedHandle {
    engine: ScriptedEngine,
}

impl Transport for ScriptedHandle {
    fn submit(&mut self, query: &str) -> EngineResult<WireValue> {
        self.engine.answer(query)
    }

    fn close(&mut self) {
        self.engine.state.lock().closes += 1;
    }
}
