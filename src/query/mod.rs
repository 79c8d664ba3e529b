// ABOUTME: Declarative query layer over decoded device trees
// ABOUTME: Clause model, configuration, matching and the resolution engine

pub mod clause;
pub mod config;
pub mod error;
pub mod matcher;
pub mod resolver;

pub use clause::{Clause, Expected, PropertySelector, Scalar, Selector, SelectorIndex};
pub use config::QueryConfig;
pub use error::{Error, LookupError, QueryError, Result};
pub use resolver::{
    DtbQuery, QueryResult, ResultEntry, THIS_ADDRESS_CELLS, THIS_NODE_PATH, THIS_SIZE_CELLS,
};
