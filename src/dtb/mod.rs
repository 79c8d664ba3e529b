// ABOUTME: Device tree blob decoding module
// ABOUTME: Header, token and structure parsing plus alias, cell and value resolution

pub mod aliases;
pub mod cells;
pub mod error;
pub mod header;
pub mod parser;
pub mod property;
pub mod reader;
pub mod tokens;
pub mod translate;
pub mod tree;

pub use cells::CellSizes;
pub use error::FormatError;
pub use header::DtbHeader;
pub use parser::DeviceTreeParser;
pub use property::{PropertyDecoder, PropertyValue};
pub use tokens::DtbToken;
pub use tree::{DeviceTree, DeviceTreeNode, NodeIterator, Property};
