// ABOUTME: Core DTB decoder building the immutable DeviceTree
// ABOUTME: Walks the structure block with an explicit node stack and resolves aliases and cells

use super::aliases::resolve_aliases;
use super::cells::{CellSizes, resolve_cell_sizes};
use super::error::FormatError;
use super::header::DtbHeader;
use super::reader::{BlockReader, string_at};
use super::tokens::DtbToken;
use super::tree::{DeviceTree, DeviceTreeNode, Property};
use log::{debug, trace};

/// Main device tree parser struct
#[derive(Debug)]
pub struct DeviceTreeParser<'a> {
    data: &'a [u8],
    root_cells: CellSizes,
}

impl<'a> DeviceTreeParser<'a> {
    /// Create a new parser from DTB data
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            root_cells: CellSizes::ROOT_DEFAULT,
        }
    }

    /// Override the cell counts assumed at the root when it declares none
    pub fn with_root_cells(mut self, root_cells: CellSizes) -> Self {
        self.root_cells = root_cells;
        self
    }

    /// Get the underlying data slice
    pub fn data(&self) -> &[u8] {
        self.data
    }

    /// Parse and validate the DTB header
    pub fn parse_header(&self) -> Result<DtbHeader, FormatError> {
        let (_remaining, header) = DtbHeader::parse(self.data)?;
        header.validate(self.data.len())?;
        Ok(header)
    }

    /// Parse the complete device tree.
    ///
    /// Only names and raw payloads are extracted here; value interpretation
    /// happens at query time so it can never hide a structural fault.
    pub fn parse_tree(&self) -> Result<DeviceTree, FormatError> {
        let header = self.parse_header()?;

        let strings_block = &self.data[header.strings_block_range()];
        let reader = BlockReader::new(self.data, header.struct_block_range());
        let root = parse_structure_block(reader, strings_block)?;

        let aliases = resolve_aliases(&root);
        let cells = resolve_cell_sizes(&root, self.root_cells);
        let tree = DeviceTree::new(root, aliases, cells, self.data.len());

        debug!(
            "decoded DTB: {} bytes, {} nodes, {} aliases",
            tree.dtb_size(),
            tree.node_count(),
            tree.aliases().len()
        );
        Ok(tree)
    }
}

/// Parse device tree structure using an iterative approach with a stack
fn parse_structure_block(
    mut reader: BlockReader<'_>,
    strings_block: &[u8],
) -> Result<DeviceTreeNode, FormatError> {
    let mut node_stack: Vec<DeviceTreeNode> = Vec::new();
    let mut root: Option<DeviceTreeNode> = None;

    loop {
        let (offset, token) = reader.read_token()?;
        trace!("{} token at offset {}", token.name(), offset);

        match token {
            DtbToken::BeginNode => {
                let name = reader.read_node_name()?;
                if root.is_some() {
                    return Err(FormatError::UnexpectedToken {
                        offset,
                        token: token.name(),
                    });
                }

                let node = match node_stack.last() {
                    None => DeviceTreeNode::root(),
                    Some(parent) => {
                        let node = DeviceTreeNode::new(name, &parent.path);
                        if parent.find_child(&node.name).is_some() {
                            return Err(FormatError::DuplicateNode {
                                offset,
                                path: node.path,
                            });
                        }
                        node
                    }
                };
                node_stack.push(node);
            }
            DtbToken::Property => {
                let record = reader.read_property()?;
                let Some(current_node) = node_stack.last_mut() else {
                    return Err(FormatError::UnexpectedToken {
                        offset,
                        token: token.name(),
                    });
                };

                let name = string_at(strings_block, record.name_offset, offset)?;
                if current_node.has_property(&name) {
                    return Err(FormatError::DuplicateProperty { offset, name });
                }
                current_node.add_property(Property {
                    name,
                    data: record.data.to_vec(),
                });
            }
            DtbToken::EndNode => {
                let completed_node = node_stack
                    .pop()
                    .ok_or(FormatError::UnmatchedEndNode { offset })?;
                match node_stack.last_mut() {
                    Some(parent_node) => parent_node.add_child(completed_node),
                    None => root = Some(completed_node),
                }
            }
            DtbToken::Nop => {}
            DtbToken::End => {
                if !node_stack.is_empty() {
                    return Err(FormatError::UnclosedNode {
                        offset,
                        open: node_stack.len(),
                    });
                }
                return root.ok_or(FormatError::UnexpectedToken {
                    offset,
                    token: token.name(),
                });
            }
        }
    }
}
