// ABOUTME: Alias table extraction from the /aliases node
// ABOUTME: Maps each alias property name to the node path stored in its payload

use super::tree::DeviceTreeNode;
use indexmap::IndexMap;
use log::warn;

/// Name of the alias container, a direct child of the root
pub const ALIASES_NODE: &str = "aliases";

/// Build the alias map from the root's `aliases` child.
///
/// A missing container yields an empty map. Each payload has a single
/// trailing NUL trimmed; payloads that are not UTF-8 are skipped.
pub fn resolve_aliases(root: &DeviceTreeNode) -> IndexMap<String, String> {
    let Some(container) = root.find_child(ALIASES_NODE) else {
        return IndexMap::new();
    };

    container
        .iter_properties()
        .filter_map(|property| {
            let raw = property.data.strip_suffix(&[0u8]).unwrap_or(property.data.as_slice());
            match core::str::from_utf8(raw) {
                Ok(path) => Some((property.name.clone(), path.to_string())),
                Err(_) => {
                    warn!("skipping alias {}: target is not UTF-8", property.name);
                    None
                }
            }
        })
        .collect()
}
