// ABOUTME: Address/size cell count resolution for every node
// ABOUTME: Cell counts flow top-down from each parent's #address-cells/#size-cells

use super::tree::DeviceTreeNode;
use log::warn;
use std::collections::HashMap;

/// Property declaring how many cells a child's address occupies
pub const ADDRESS_CELLS: &str = "#address-cells";
/// Property declaring how many cells a child's size occupies
pub const SIZE_CELLS: &str = "#size-cells";

/// Cell counts used to interpret a node's `reg`-shaped properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellSizes {
    /// Cells per address
    pub address: u32,
    /// Cells per size
    pub size: u32,
}

impl CellSizes {
    /// Defaults applied at the root when nothing is declared
    pub const ROOT_DEFAULT: CellSizes = CellSizes {
        address: 2,
        size: 1,
    };

    /// Create cell counts
    pub const fn new(address: u32, size: u32) -> Self {
        Self { address, size }
    }

    /// The counts `node` hands to its children: its own declarations where
    /// present, otherwise `self` (what the node inherited).
    pub fn overridden_by(self, node: &DeviceTreeNode) -> CellSizes {
        CellSizes {
            address: declared(node, ADDRESS_CELLS).unwrap_or(self.address),
            size: declared(node, SIZE_CELLS).unwrap_or(self.size),
        }
    }
}

impl Default for CellSizes {
    fn default() -> Self {
        Self::ROOT_DEFAULT
    }
}

fn declared(node: &DeviceTreeNode, name: &str) -> Option<u32> {
    let property = node.find_property(name)?;
    match <[u8; 4]>::try_from(property.data.as_slice()) {
        Ok(bytes) => Some(u32::from_be_bytes(bytes)),
        Err(_) => {
            warn!(
                "ignoring {} on {}: expected 4 bytes, found {}",
                name,
                node.path,
                property.data.len()
            );
            None
        }
    }
}

/// Compute the cell counts that apply to every node in the tree.
///
/// The root gets `root_default`; each other node gets its parent's
/// declarations, falling back per field to what the parent itself inherited.
pub fn resolve_cell_sizes(
    root: &DeviceTreeNode,
    root_default: CellSizes,
) -> HashMap<String, CellSizes> {
    let mut resolved = HashMap::new();
    let mut stack = vec![(root, root_default)];

    while let Some((node, this)) = stack.pop() {
        let for_children = this.overridden_by(node);
        stack.extend(node.children.iter().map(|child| (child, for_children)));
        resolved.insert(node.path.clone(), this);
    }

    resolved
}
