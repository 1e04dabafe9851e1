pub mod artifact;
pub mod ast;
pub mod client;
pub mod config;
pub mod connection;
pub mod csv;
pub mod data_type;
pub mod error;
pub mod join;
pub mod marshal;
pub mod parser;
pub mod query;
pub mod registry;
pub mod shape;
pub mod table;
pub mod temporal;
pub mod tokenizer;
pub mod transport;
pub mod value;
pub mod wire;

pub use client::Client;
pub use config::ClientConfig;
pub use connection::ConnectionManager;
pub use csv::{CsvLoadPlan, CsvOptions, CsvSample};
pub use data_type::TypeId;
pub use error::{EngineError, Error, Result};
pub use join::{JoinKind, JoinSpec};
pub use marshal::{Row, Table, ValueMarshaler};
pub use registry::{TypeRegistry, registry};
pub use shape::ResultShape;
pub use table::TableMeta;
pub use value::{Cell, TypedValue};
pub use wire::WireValue;
