use core::cmp::Ordering;
use core::fmt;
use core::str::FromStr;

use thiserror::Error;

/// The relational operators a predicate can apply to an indexed attribute.
///
/// ```
/// use btree_index::RangeOp;
///
/// assert_eq!("<>".parse::<RangeOp>(), Ok(RangeOp::Ne));
/// assert_eq!(RangeOp::Le.to_string(), "<=");
/// assert!(RangeOp::Ge.matches(7.cmp(&7)));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RangeOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl RangeOp {
    pub const ALL: [RangeOp; 6] = [Self::Eq, Self::Ne, Self::Lt, Self::Le, Self::Gt, Self::Ge];

    /// Whether a stored key that compares as `ordering` against the probe key satisfies `self`.
    #[must_use]
    pub const fn matches(self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => ordering.is_eq(),
            Self::Ne => ordering.is_ne(),
            Self::Lt => ordering.is_lt(),
            Self::Le => ordering.is_le(),
            Self::Gt => ordering.is_gt(),
            Self::Ge => ordering.is_ge(),
        }
    }

    /// The SQL spelling of the operator.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

impl fmt::Display for RangeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Returned when a string is not one of the six relational operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("unknown relational operator")]
pub struct ParseRangeOpError;

impl FromStr for RangeOp {
    type Err = ParseRangeOpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "=" | "==" => Ok(Self::Eq),
            "!=" | "<>" => Ok(Self::Ne),
            "<" => Ok(Self::Lt),
            "<=" => Ok(Self::Le),
            ">" => Ok(Self::Gt),
            ">=" => Ok(Self::Ge),
            _ => Err(ParseRangeOpError),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_parses_back() {
        for op in RangeOp::ALL {
            assert_eq!(op.to_string().parse(), Ok(op));
        }
    }

    #[test]
    fn rejects_unknown_spellings() {
        assert_eq!("=<".parse::<RangeOp>(), Err(ParseRangeOpError));
        assert_eq!("".parse::<RangeOp>(), Err(ParseRangeOpError));
        assert_eq!(" >= ".parse::<RangeOp>(), Ok(RangeOp::Ge));
    }

    #[test]
    fn each_ordering_matches_three_operators() {
        for ordering in [Ordering::Less, Ordering::Equal, Ordering::Greater] {
            let matched = RangeOp::ALL.iter().filter(|op| op.matches(ordering)).count();
            assert_eq!(matched, 3, "{ordering:?}");
        }
    }
}
