// ABOUTME: Query resolution engine over a decoded device tree
// ABOUTME: Answers alias, path and property clauses with decoded property maps

use super::clause::{Clause, Selector};
use super::config::QueryConfig;
use super::error::{Error, LookupError, QueryError, Result};
use super::matcher::{PathMatcher, property_matches};
use crate::dtb::translate::translate_reg;
use crate::dtb::{
    DeviceTree, DeviceTreeNode, DeviceTreeParser, FormatError, PropertyDecoder, PropertyValue,
};
use indexmap::IndexMap;
use log::debug;
use serde::Serialize;

/// Resolved attribute: address cells that apply to the node's `reg`
pub const THIS_ADDRESS_CELLS: &str = "this-address-cells";
/// Resolved attribute: size cells that apply to the node's `reg`
pub const THIS_SIZE_CELLS: &str = "this-size-cells";
/// Resolved attribute: the node's own path
pub const THIS_NODE_PATH: &str = "this-node-path";

/// Decoded properties of one matched node, plus the resolved attributes.
/// Empty for an empty clause.
pub type ResultEntry = IndexMap<String, PropertyValue>;

/// Answer to one `resolve` call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryResult {
    /// One entry per clause, in clause order
    pub query: Vec<ResultEntry>,
    /// Blob length in bytes, as a single-element list
    #[serde(rename = "dtb-size")]
    pub dtb_size: Vec<usize>,
}

/// Query engine owning a decoded tree.
///
/// Resolution only reads the tree, so one engine can serve any number of
/// threads at once.
#[derive(Debug, Clone)]
pub struct DtbQuery {
    tree: DeviceTree,
    config: QueryConfig,
    decoder: PropertyDecoder,
}

impl DtbQuery {
    /// Decode `data` with the default configuration
    pub fn new(data: &[u8]) -> core::result::Result<Self, FormatError> {
        Self::with_config(data, QueryConfig::default())
    }

    /// Decode `data` with `config`
    pub fn with_config(data: &[u8], config: QueryConfig) -> core::result::Result<Self, FormatError> {
        let tree = DeviceTreeParser::new(data)
            .with_root_cells(config.root_cells())
            .parse_tree()?;
        Ok(Self::from_tree(tree, config))
    }

    /// Wrap an already decoded tree
    pub fn from_tree(tree: DeviceTree, config: QueryConfig) -> Self {
        let decoder = config.decoder();
        Self {
            tree,
            config,
            decoder,
        }
    }

    /// The decoded tree
    pub fn tree(&self) -> &DeviceTree {
        &self.tree
    }

    /// The active configuration
    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Resolve every clause, producing one entry per clause.
    ///
    /// Every clause, path patterns included, is validated before any lookup
    /// runs, so a malformed selector anywhere in the list is reported as a [`QueryError`] even when
    /// an earlier clause would have failed its lookup.
    pub fn resolve(&self, clauses: &[Clause]) -> Result<QueryResult> {
        if clauses.is_empty() {
            return Err(QueryError::NoClauses.into());
        }

        let selectors = clauses
            .iter()
            .enumerate()
            .map(|(index, clause)| -> core::result::Result<_, QueryError> {
                let selector = clause.selector(index)?;
                let matcher = match &selector {
                    Selector::Path(pattern) => Some(PathMatcher::new(pattern)?),
                    _ => None,
                };
                Ok((selector, matcher))
            })
            .collect::<core::result::Result<Vec<_>, QueryError>>()?;

        let query = selectors
            .iter()
            .enumerate()
            .map(|(index, (selector, matcher))| -> Result<ResultEntry> {
                let entry = self
                    .find(index, selector, matcher.as_ref())?
                    .map(|node| self.entry(node))
                    .unwrap_or_default();
                Ok(entry)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(QueryResult {
            query,
            dtb_size: vec![self.tree.dtb_size()],
        })
    }

    /// Find the node a validated selector refers to. `matcher` is the
    /// compiled form of a path selector. `Ok(None)` only for the empty
    /// selector.
    pub(crate) fn find(
        &self,
        index: usize,
        selector: &Selector,
        matcher: Option<&PathMatcher>,
    ) -> Result<Option<&DeviceTreeNode>> {
        let no_match = || -> Error {
            LookupError::NoMatch {
                clause: index,
                selector: selector.to_string(),
            }
            .into()
        };

        let node = match selector {
            Selector::Empty => return Ok(None),
            Selector::Alias(alias) => {
                let path = self.tree.alias(alias).ok_or_else(|| LookupError::UnknownAlias {
                    clause: index,
                    alias: alias.clone(),
                })?;
                self.tree
                    .node(path)
                    .ok_or_else(|| LookupError::DanglingAlias {
                        clause: index,
                        alias: alias.clone(),
                        path: path.to_string(),
                    })?
            }
            Selector::Path(_) => {
                let matcher = matcher.ok_or_else(no_match)?;
                self.tree
                    .iter_nodes()
                    .find(|node| matcher.matches(node))
                    .ok_or_else(no_match)?
            }
            Selector::Properties(selectors) => self
                .tree
                .iter_nodes()
                .find(|node| {
                    selectors.iter().all(|(selector, expected)| {
                        property_matches(&self.decoder, node, selector, expected)
                    })
                })
                .ok_or_else(no_match)?,
        };

        debug!("clause {}: {} -> {}", index, selector, node.path);
        Ok(Some(node))
    }

    /// Decode every property of `node` and append the resolved attributes
    pub fn entry(&self, node: &DeviceTreeNode) -> ResultEntry {
        let cells = self
            .tree
            .cell_sizes(&node.path)
            .unwrap_or_else(|| self.config.root_cells());

        let mut entry: ResultEntry = node
            .iter_properties()
            .map(|property| {
                let mut value = self.decoder.decode(&property.name, &property.data);
                if property.name == "reg"
                    && self.config.translate_reg
                    && let PropertyValue::Cells(raw) = &value
                    && let Some(words) = translate_reg(&self.tree, node, raw)
                {
                    value = PropertyValue::Reg(words);
                }
                (property.name.clone(), value)
            })
            .collect();

        entry.insert(
            THIS_ADDRESS_CELLS.to_string(),
            PropertyValue::Cells(vec![cells.address]),
        );
        entry.insert(
            THIS_SIZE_CELLS.to_string(),
            PropertyValue::Cells(vec![cells.size]),
        );
        entry.insert(
            THIS_NODE_PATH.to_string(),
            PropertyValue::String(node.path.clone()),
        );
        entry
    }
}
