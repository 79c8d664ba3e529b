// ABOUTME: Device tree node structure and the immutable decoded tree
// ABOUTME: Provides path indexing, alias/cell lookups and depth-first traversal

use super::cells::CellSizes;
use super::property::{decode_cells, split_strings};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::ops::Index;

/// Device tree property with its undecoded payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    /// Property name
    pub name: String,
    /// Raw payload bytes
    pub data: Vec<u8>,
}

/// Device tree node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceTreeNode {
    /// Node name (unit address included), empty for the root
    pub name: String,
    /// Full path from the root, `/` for the root itself
    pub path: String,
    /// Path of the parent node, `None` for the root
    pub parent: Option<String>,
    /// Node properties in declaration order
    pub properties: Vec<Property>,
    /// Child nodes in declaration order
    pub children: Vec<DeviceTreeNode>,
}

impl DeviceTreeNode {
    /// Create the root node
    pub fn root() -> Self {
        Self {
            name: String::new(),
            path: "/".to_string(),
            parent: None,
            properties: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Create a node named `name` under the node at `parent_path`
    pub fn new(name: String, parent_path: &str) -> Self {
        let path = child_path(parent_path, &name);
        Self {
            name,
            path,
            parent: Some(parent_path.to_string()),
            properties: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Add a property to the node
    pub fn add_property(&mut self, property: Property) {
        self.properties.push(property);
    }

    /// Add a child node
    pub fn add_child(&mut self, child: DeviceTreeNode) {
        self.children.push(child);
    }

    /// Whether this is the root node
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Find a property by name
    pub fn find_property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Find a child node by name
    pub fn find_child(&self, name: &str) -> Option<&DeviceTreeNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Find a descendant by path relative to this node (e.g., "cpus/cpu@0").
    /// Names must match exactly, unit address included.
    pub fn find_node(&self, path: &str) -> Option<&DeviceTreeNode> {
        path.split('/')
            .filter(|part| !part.is_empty())
            .try_fold(self, |node, part| node.find_child(part))
    }

    /// Get property value as a single u32 cell
    pub fn prop_u32(&self, name: &str) -> Option<u32> {
        self.find_property(name)
            .and_then(|p| decode_cells(&p.data))
            .and_then(|cells| (cells.len() == 1).then(|| cells[0]))
    }

    /// Get property value as a u32 cell array
    pub fn prop_u32_array(&self, name: &str) -> Option<Vec<u32>> {
        self.find_property(name).and_then(|p| decode_cells(&p.data))
    }

    /// Get property value as a list of strings
    pub fn prop_strings(&self, name: &str) -> Option<Vec<String>> {
        self.find_property(name).and_then(|p| split_strings(&p.data))
    }

    /// Check if property exists
    pub fn has_property(&self, name: &str) -> bool {
        self.find_property(name).is_some()
    }

    /// Get all nodes with a specific compatible string
    pub fn find_compatible_nodes(&self, compatible: &str) -> Vec<&DeviceTreeNode> {
        self.iter_nodes()
            .filter(|node| {
                node.prop_strings("compatible")
                    .is_some_and(|list| list.iter().any(|c| c == compatible))
            })
            .collect()
    }

    /// Get iterator over all nodes (depth-first, pre-order)
    pub fn iter_nodes(&self) -> NodeIterator<'_> {
        NodeIterator::new(self)
    }

    /// Get iterator over all properties
    pub fn iter_properties(&self) -> core::slice::Iter<'_, Property> {
        self.properties.iter()
    }

    /// Get iterator over child nodes
    pub fn iter_children(&self) -> core::slice::Iter<'_, DeviceTreeNode> {
        self.children.iter()
    }
}

impl Index<&str> for DeviceTreeNode {
    type Output = Property;

    /// Panics if the property does not exist; use `find_property` otherwise.
    fn index(&self, name: &str) -> &Self::Output {
        self.find_property(name)
            .unwrap_or_else(|| panic!("property '{}' not found on {}", name, self.path))
    }
}

impl<'a> IntoIterator for &'a DeviceTreeNode {
    type Item = &'a DeviceTreeNode;
    type IntoIter = core::slice::Iter<'a, DeviceTreeNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.children.iter()
    }
}

/// Join a parent path and a child name
pub fn child_path(parent_path: &str, name: &str) -> String {
    if parent_path == "/" {
        format!("/{name}")
    } else {
        format!("{parent_path}/{name}")
    }
}

/// Iterator for depth-first traversal of device tree nodes
pub struct NodeIterator<'a> {
    stack: Vec<&'a DeviceTreeNode>,
}

impl<'a> NodeIterator<'a> {
    fn new(root: &'a DeviceTreeNode) -> Self {
        Self { stack: vec![root] }
    }
}

impl<'a> Iterator for NodeIterator<'a> {
    type Item = &'a DeviceTreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        // Reverse so the first child is visited next
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// A fully decoded device tree.
///
/// Built once by [`DeviceTreeParser`](super::DeviceTreeParser) and never
/// mutated afterwards, so it can be shared between threads freely.
#[derive(Debug, Clone)]
pub struct DeviceTree {
    root: DeviceTreeNode,
    aliases: IndexMap<String, String>,
    index: HashMap<String, Vec<usize>>,
    cells: HashMap<String, CellSizes>,
    dtb_size: usize,
}

impl DeviceTree {
    pub(crate) fn new(
        root: DeviceTreeNode,
        aliases: IndexMap<String, String>,
        cells: HashMap<String, CellSizes>,
        dtb_size: usize,
    ) -> Self {
        let mut index = HashMap::new();
        build_index(&root, &mut Vec::new(), &mut index);
        Self {
            root,
            aliases,
            index,
            cells,
            dtb_size,
        }
    }

    /// The root node
    pub fn root(&self) -> &DeviceTreeNode {
        &self.root
    }

    /// Length in bytes of the blob the tree was decoded from
    pub fn dtb_size(&self) -> usize {
        self.dtb_size
    }

    /// Number of nodes, root included
    pub fn node_count(&self) -> usize {
        self.index.len()
    }

    /// Look up a node by its full path
    pub fn node(&self, path: &str) -> Option<&DeviceTreeNode> {
        let route = self.index.get(path)?;
        route
            .iter()
            .try_fold(&self.root, |node, &i| node.children.get(i))
    }

    /// The parent of `node`, if it has one
    pub fn parent(&self, node: &DeviceTreeNode) -> Option<&DeviceTreeNode> {
        node.parent.as_deref().and_then(|path| self.node(path))
    }

    /// Alias name to target path, in declaration order
    pub fn aliases(&self) -> &IndexMap<String, String> {
        &self.aliases
    }

    /// Target path of an alias
    pub fn alias(&self, name: &str) -> Option<&str> {
        self.aliases.get(name).map(String::as_str)
    }

    /// Address/size cell counts that apply to `path`'s own `reg`-like
    /// properties, as declared by its ancestors.
    pub fn cell_sizes(&self, path: &str) -> Option<CellSizes> {
        self.cells.get(path).copied()
    }

    /// Cell counts the node at `path` imposes on its children.
    pub fn child_cell_sizes(&self, path: &str) -> Option<CellSizes> {
        let node = self.node(path)?;
        let inherited = self.cell_sizes(path)?;
        Some(inherited.overridden_by(node))
    }

    /// Depth-first, pre-order traversal starting at the root
    pub fn iter_nodes(&self) -> NodeIterator<'_> {
        self.root.iter_nodes()
    }
}

fn build_index(
    node: &DeviceTreeNode,
    route: &mut Vec<usize>,
    index: &mut HashMap<String, Vec<usize>>,
) {
    index.insert(node.path.clone(), route.clone());
    for (i, child) in node.children.iter().enumerate() {
        route.push(i);
        build_index(child, route, index);
        route.pop();
    }
}
