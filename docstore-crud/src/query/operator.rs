//! Comparison operators and their translation to native store syntax
//!
//! Requests speak the closed [`FilterOperator`] vocabulary. Document stores
//! speak [`NativeOperator`]. [`FilterOperator::to_native`] is the only bridge
//! between the two and is an exhaustive match, so adding an operator without a
//! translation fails to compile.
//!
//! # Example
//!
//! ```rust
//! use docstore_crud::query::{FilterOperator, NativeOperator};
//!
//! let op: FilterOperator = "$notin".parse().unwrap();
//! assert_eq!(op.to_native(), NativeOperator::NotIn);
//! assert_eq!(op.to_native().as_str(), "not-in");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Abstract comparison operator carried by a filter condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOperator {
    /// Equal to
    #[serde(alias = "$eq")]
    Eq,
    /// Not equal to
    #[serde(alias = "$ne")]
    Ne,
    /// Greater than
    #[serde(alias = "$gt")]
    Gt,
    /// Less than
    #[serde(alias = "$lt")]
    Lt,
    /// Greater than or equal to
    #[serde(alias = "$gte")]
    Gte,
    /// Less than or equal to
    #[serde(alias = "$lte")]
    Lte,
    /// Value is one of a list
    #[serde(alias = "$in")]
    In,
    /// Value is none of a list
    #[serde(alias = "$notin", alias = "notin")]
    NotIn,
}

impl FilterOperator {
    /// Every abstract operator, in declaration order
    pub const ALL: [FilterOperator; 8] = [
        Self::Eq,
        Self::Ne,
        Self::Gt,
        Self::Lt,
        Self::Gte,
        Self::Lte,
        Self::In,
        Self::NotIn,
    ];

    /// Translate to the store's native operator
    pub const fn to_native(self) -> NativeOperator {
        match self {
            Self::Eq => NativeOperator::Equal,
            Self::Ne => NativeOperator::NotEqual,
            Self::Gt => NativeOperator::GreaterThan,
            Self::Lt => NativeOperator::LessThan,
            Self::Gte => NativeOperator::GreaterThanOrEqual,
            Self::Lte => NativeOperator::LessThanOrEqual,
            Self::In => NativeOperator::In,
            Self::NotIn => NativeOperator::NotIn,
        }
    }

    /// Request-level name of the operator (e.g. "notIn")
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Gt => "gt",
            Self::Lt => "lt",
            Self::Gte => "gte",
            Self::Lte => "lte",
            Self::In => "in",
            Self::NotIn => "notIn",
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an operator name that is not part of the closed set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown filter operator '{0}'")]
pub struct UnknownOperator(pub String);

impl FromStr for FilterOperator {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.strip_prefix('$').unwrap_or(s);
        match name.to_ascii_lowercase().as_str() {
            "eq" => Ok(Self::Eq),
            "ne" => Ok(Self::Ne),
            "gt" => Ok(Self::Gt),
            "lt" => Ok(Self::Lt),
            "gte" => Ok(Self::Gte),
            "lte" => Ok(Self::Lte),
            "in" => Ok(Self::In),
            "notin" | "not-in" => Ok(Self::NotIn),
            _ => Err(UnknownOperator(s.to_string())),
        }
    }
}

/// Operator in the document store's own syntax
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeOperator {
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `>`
    GreaterThan,
    /// `<`
    LessThan,
    /// `>=`
    GreaterThanOrEqual,
    /// `<=`
    LessThanOrEqual,
    /// `in`
    In,
    /// `not-in`
    NotIn,
}

impl NativeOperator {
    /// Wire representation understood by the store
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::GreaterThan => ">",
            Self::LessThan => "<",
            Self::GreaterThanOrEqual => ">=",
            Self::LessThanOrEqual => "<=",
            Self::In => "in",
            Self::NotIn => "not-in",
        }
    }
}

impl fmt::Display for NativeOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_mapping_is_bijective() {
        let natives: HashSet<NativeOperator> =
            FilterOperator::ALL.iter().map(|op| op.to_native()).collect();
        assert_eq!(natives.len(), FilterOperator::ALL.len());

        let wire: HashSet<&str> = natives.iter().map(|op| op.as_str()).collect();
        assert_eq!(wire.len(), FilterOperator::ALL.len());
    }

    #[test]
    fn test_native_syntax() {
        assert_eq!(FilterOperator::Eq.to_native().as_str(), "==");
        assert_eq!(FilterOperator::Ne.to_native().as_str(), "!=");
        assert_eq!(FilterOperator::Gt.to_native().as_str(), ">");
        assert_eq!(FilterOperator::Lt.to_native().as_str(), "<");
        assert_eq!(FilterOperator::Gte.to_native().as_str(), ">=");
        assert_eq!(FilterOperator::Lte.to_native().as_str(), "<=");
        assert_eq!(FilterOperator::In.to_native().as_str(), "in");
        assert_eq!(FilterOperator::NotIn.to_native().as_str(), "not-in");
    }

    #[test]
    fn test_parse_operator_names() {
        assert_eq!("eq".parse::<FilterOperator>(), Ok(FilterOperator::Eq));
        assert_eq!("$gte".parse::<FilterOperator>(), Ok(FilterOperator::Gte));
        assert_eq!("notIn".parse::<FilterOperator>(), Ok(FilterOperator::NotIn));
        assert_eq!("$notin".parse::<FilterOperator>(), Ok(FilterOperator::NotIn));

        for op in FilterOperator::ALL {
            assert_eq!(op.as_str().parse::<FilterOperator>(), Ok(op));
        }
    }

    #[test]
    fn test_unknown_operator_is_rejected() {
        let err = "$cont".parse::<FilterOperator>().unwrap_err();
        assert_eq!(err.to_string(), "unknown filter operator '$cont'");
    }

    #[test]
    fn test_deserialize_aliases() {
        let op: FilterOperator = serde_json::from_str("\"$lte\"").unwrap();
        assert_eq!(op, FilterOperator::Lte);

        let op: FilterOperator = serde_json::from_str("\"notIn\"").unwrap();
        assert_eq!(op, FilterOperator::NotIn);

        assert!(serde_json::from_str::<FilterOperator>("\"between\"").is_err());
    }
}
