// ABOUTME: Tunable settings for decoding query results
// ABOUTME: Always-list property names, root cell defaults and reg translation switch

use crate::dtb::{CellSizes, PropertyDecoder};
use serde::Deserialize;

/// Settings for a [`DtbQuery`](super::DtbQuery).
///
/// Deserializable so callers can keep it next to their clause files.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct QueryConfig {
    /// Property names always surfaced as string lists
    pub list_properties: Vec<String>,
    /// `#address-cells` assumed at the root when undeclared
    pub default_address_cells: u32,
    /// `#size-cells` assumed at the root when undeclared
    pub default_size_cells: u32,
    /// Translate `reg` addresses through ancestor `ranges`
    pub translate_reg: bool,
}

impl QueryConfig {
    /// Root cell defaults as a [`CellSizes`]
    pub fn root_cells(&self) -> CellSizes {
        CellSizes::new(self.default_address_cells, self.default_size_cells)
    }

    /// Build the property decoder for this configuration
    pub fn decoder(&self) -> PropertyDecoder {
        PropertyDecoder::new(self.list_properties.iter().cloned())
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            list_properties: PropertyDecoder::DEFAULT_LIST_PROPERTIES
                .iter()
                .map(|name| name.to_string())
                .collect(),
            default_address_cells: CellSizes::ROOT_DEFAULT.address,
            default_size_cells: CellSizes::ROOT_DEFAULT.size,
            translate_reg: true,
        }
    }
}
