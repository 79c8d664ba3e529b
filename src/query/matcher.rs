// ABOUTME: Evaluation of path patterns and property selectors against nodes
// ABOUTME: Compares decoded property values element-wise with expected scalars

use super::clause::{Expected, PropertySelector, Scalar, SelectorIndex};
use super::error::QueryError;
use crate::dtb::{DeviceTreeNode, PropertyDecoder, PropertyValue};
use regex::Regex;

/// Anchored path pattern.
///
/// A node matches when the pattern matches its whole path or its whole
/// local name.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    regex: Regex,
}

impl PathMatcher {
    /// Compile `pattern`, anchoring it at both ends.
    ///
    /// The raw pattern must compile on its own; otherwise an unbalanced group
    /// could close the anchoring group early and escape the anchors.
    pub fn new(pattern: &str) -> Result<Self, QueryError> {
        let invalid = |err: regex::Error| QueryError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: err.to_string(),
        };
        Regex::new(pattern).map_err(invalid)?;
        let regex = Regex::new(&format!("^(?:{pattern})$")).map_err(invalid)?;
        Ok(Self { regex })
    }

    /// Whether `node` is selected by the pattern
    pub fn matches(&self, node: &DeviceTreeNode) -> bool {
        self.regex.is_match(&node.path) || self.regex.is_match(&node.name)
    }
}

/// One element of a decoded list value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Element<'a> {
    Cell(u32),
    Str(&'a str),
}

impl Element<'_> {
    fn matches(self, expected: &Scalar) -> bool {
        match (self, expected) {
            (Element::Cell(cell), Scalar::Integer(n)) => u64::from(cell) == *n,
            (Element::Str(s), Scalar::String(t)) => s == t,
            _ => false,
        }
    }
}

/// View a decoded value as a list. A bare string is a one-element list and
/// the empty marker an empty one; opaque bytes have no list view.
fn elements(value: &PropertyValue) -> Option<Vec<Element<'_>>> {
    match value {
        PropertyValue::Empty => Some(Vec::new()),
        PropertyValue::String(s) => Some(vec![Element::Str(s.as_str())]),
        PropertyValue::StringList(list) => Some(list.iter().map(|s| Element::Str(s.as_str())).collect()),
        PropertyValue::Cells(cells) => Some(cells.iter().map(|&c| Element::Cell(c)).collect()),
        PropertyValue::Reg(_) | PropertyValue::Bytes(_) => None,
    }
}

fn list_matches(actual: &[Element<'_>], expected: &[Scalar]) -> bool {
    actual.len() == expected.len()
        && actual
            .iter()
            .zip(expected)
            .all(|(element, scalar)| element.matches(scalar))
}

/// Whether the value of `selector` on `node` equals `expected`.
///
/// Selectors always see the untranslated decoded value. A missing property
/// or an out-of-range index is a mismatch, not an error.
pub fn property_matches(
    decoder: &PropertyDecoder,
    node: &DeviceTreeNode,
    selector: &PropertySelector,
    expected: &Expected,
) -> bool {
    let Some(property) = node.find_property(&selector.name) else {
        return false;
    };
    let value = decoder.decode(&property.name, &property.data);
    let Some(actual) = elements(&value) else {
        return false;
    };

    match selector.index {
        SelectorIndex::Whole if value == PropertyValue::Empty => {
            matches!(expected, Expected::Scalar(Scalar::String(s)) if s.is_empty())
                || matches!(expected, Expected::List(list) if list.is_empty())
        }
        SelectorIndex::Whole | SelectorIndex::All => list_matches(&actual, expected.as_list()),
        SelectorIndex::Element(i) => match expected {
            Expected::Scalar(scalar) => actual.get(i).is_some_and(|element| element.matches(scalar)),
            Expected::List(_) => false,
        },
    }
}
