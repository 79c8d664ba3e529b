// ABOUTME: Device tree query library answering declarative clauses over DTB blobs
// ABOUTME: Decodes the flattened tree once and resolves alias, path and property queries

//! # DTB Query
//!
//! Decode a Device Tree Blob (DTB) and answer queries against it. Each query
//! clause selects one node by alias, by path pattern or by property values,
//! and yields that node's decoded properties together with the cell sizes
//! that apply to it and its full path.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! # use dtb_query::{Clause, DtbQuery, Error};
//! # fn main() -> Result<(), Error> {
//! let dtb_data = std::fs::read("path/to/your.dtb").unwrap();
//!
//! let engine = DtbQuery::new(&dtb_data)?;
//! let result = engine.resolve(&[
//!     Clause::alias("serial1"),
//!     Clause::path("/soc/usb.*"),
//!     Clause::properties([("compatible[0]", "brcm,bcm2711-pcie")]),
//! ])?;
//!
//! for entry in &result.query {
//!     println!("{:?}", entry.get("this-node-path"));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Main Types
//!
//! - [`DtbQuery`] - Query engine owning a decoded tree
//! - [`Clause`] - One alias, path or property query
//! - [`QueryResult`] - Result entries plus the blob size
//! - [`DeviceTreeParser`] - Low-level blob decoder
//! - [`DeviceTree`] - Decoded tree with path and alias indexes
//! - [`PropertyValue`] - Decoded property values

pub mod dtb;
pub mod query;

#[cfg(test)]
mod test_fixtures;

pub use dtb::{
    CellSizes, DeviceTree, DeviceTreeNode, DeviceTreeParser, DtbHeader, DtbToken, FormatError,
    NodeIterator, Property, PropertyDecoder, PropertyValue,
};
pub use query::{
    Clause, DtbQuery, Error, Expected, LookupError, PropertySelector, QueryConfig, QueryError,
    QueryResult, Result, ResultEntry, Scalar, Selector, SelectorIndex,
};
