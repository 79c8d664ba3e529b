// ABOUTME: Query clause model and property selector grammar
// ABOUTME: Parses `name`, `name[i]` and `name[*]` selectors and validates clause shape

use super::error::QueryError;
use indexmap::IndexMap;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// One query clause. At most one of the three selectors may be populated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Clause {
    /// Alias name looked up under `/aliases`
    #[serde(default)]
    pub aliases: Option<String>,
    /// Regular expression matched against node paths
    #[serde(default)]
    pub path: Option<String>,
    /// Property selector to expected value; all must hold on one node
    #[serde(default)]
    pub properties: Option<IndexMap<String, Expected>>,
}

impl Clause {
    /// Clause selecting the target of an alias
    pub fn alias(name: impl Into<String>) -> Self {
        Self {
            aliases: Some(name.into()),
            ..Self::default()
        }
    }

    /// Clause selecting the first node whose path matches `pattern`
    pub fn path(pattern: impl Into<String>) -> Self {
        Self {
            path: Some(pattern.into()),
            ..Self::default()
        }
    }

    /// Clause selecting the first node satisfying every property selector
    pub fn properties<I, K, V>(selectors: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Expected>,
    {
        Self {
            properties: Some(
                selectors
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
            ..Self::default()
        }
    }

    /// Validate the clause and turn it into a [`Selector`].
    ///
    /// `index` is the clause position, used in error messages.
    pub fn selector(&self, index: usize) -> Result<Selector, QueryError> {
        let populated = [
            self.aliases.is_some(),
            self.path.is_some(),
            self.properties.is_some(),
        ]
        .into_iter()
        .filter(|&p| p)
        .count();
        if populated > 1 {
            return Err(QueryError::ConflictingSelectors { clause: index });
        }

        if let Some(alias) = &self.aliases {
            return Ok(Selector::Alias(alias.clone()));
        }
        if let Some(pattern) = &self.path {
            return Ok(Selector::Path(pattern.clone()));
        }
        match &self.properties {
            Some(properties) if !properties.is_empty() => properties
                .iter()
                .map(|(selector, expected)| -> Result<_, QueryError> {
                    Ok((selector.parse::<PropertySelector>()?, expected.clone()))
                })
                .collect::<Result<Vec<_>, QueryError>>()
                .map(Selector::Properties),
            _ => Ok(Selector::Empty),
        }
    }
}

/// A validated clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Resolve an alias
    Alias(String),
    /// Match node paths against a pattern
    Path(String),
    /// Match property values
    Properties(Vec<(PropertySelector, Expected)>),
    /// Matches nothing; yields an empty result entry
    Empty,
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Alias(alias) => write!(f, "alias '{alias}'"),
            Selector::Path(pattern) => write!(f, "path '{pattern}'"),
            Selector::Properties(selectors) => {
                let parts: Vec<_> = selectors
                    .iter()
                    .map(|(selector, expected)| format!("{selector} = {expected}"))
                    .collect();
                write!(f, "properties {{{}}}", parts.join(", "))
            }
            Selector::Empty => write!(f, "empty clause"),
        }
    }
}

/// Which part of a property value a selector addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorIndex {
    /// `name`: the whole decoded value
    Whole,
    /// `name[i]`: one element of a cell or string list
    Element(usize),
    /// `name[*]`: the whole list, element by element
    All,
}

/// A parsed property selector such as `reg[0]` or `clock-names[*]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySelector {
    /// Property name
    pub name: String,
    /// Addressed part
    pub index: SelectorIndex,
}

impl FromStr for PropertySelector {
    type Err = QueryError;

    fn from_str(selector: &str) -> Result<Self, Self::Err> {
        let invalid = |reason| QueryError::InvalidSelector {
            selector: selector.to_string(),
            reason,
        };

        let (name, index) = match selector.split_once('[') {
            None => {
                if selector.contains(']') {
                    return Err(invalid("unbalanced ']'"));
                }
                (selector, SelectorIndex::Whole)
            }
            Some((name, rest)) => {
                let inner = rest
                    .strip_suffix(']')
                    .ok_or_else(|| invalid("index must end the selector with ']'"))?;
                let index = match inner {
                    "*" => SelectorIndex::All,
                    "" => return Err(invalid("empty index")),
                    digits if digits.bytes().all(|b| b.is_ascii_digit()) => SelectorIndex::Element(
                        digits.parse().map_err(|_| invalid("index out of range"))?,
                    ),
                    _ => return Err(invalid("index must be a non-negative integer or '*'")),
                };
                (name, index)
            }
        };

        if name.is_empty() {
            return Err(invalid("missing property name"));
        }

        Ok(PropertySelector {
            name: name.to_string(),
            index,
        })
    }
}

impl fmt::Display for PropertySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            SelectorIndex::Whole => write!(f, "{}", self.name),
            SelectorIndex::Element(i) => write!(f, "{}[{}]", self.name, i),
            SelectorIndex::All => write!(f, "{}[*]", self.name),
        }
    }
}

/// A single expected value
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Integer(u64),
    String(String),
}

/// Expected value of a property selector
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Expected {
    Scalar(Scalar),
    List(Vec<Scalar>),
}

impl Expected {
    /// The expected value as a list; a scalar is a one-element list
    pub fn as_list(&self) -> &[Scalar] {
        match self {
            Expected::Scalar(scalar) => core::slice::from_ref(scalar),
            Expected::List(list) => list,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Integer(n) => write!(f, "0x{n:x}"),
            Scalar::String(s) => write!(f, "\"{s}\""),
        }
    }
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Scalar(scalar) => write!(f, "{scalar}"),
            Expected::List(list) => {
                let parts: Vec<_> = list.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}

impl From<u64> for Scalar {
    fn from(value: u64) -> Self {
        Scalar::Integer(value)
    }
}

impl From<u32> for Scalar {
    fn from(value: u32) -> Self {
        Scalar::Integer(value.into())
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::String(value)
    }
}

macro_rules! expected_from_scalar {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Expected {
            fn from(value: $ty) -> Self {
                Expected::Scalar(value.into())
            }
        })*
    };
}

expected_from_scalar!(u64, u32, &str, String, Scalar);

impl<T: Into<Scalar>> From<Vec<T>> for Expected {
    fn from(values: Vec<T>) -> Self {
        Expected::List(values.into_iter().map(Into::into).collect())
    }
}
