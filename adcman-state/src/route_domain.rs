//! Route domain references.

use std::fmt;

/// Reference to a route domain, either by resolved id or by symbolic name.
///
/// The two forms are mutually exclusive by construction; symbolic names are
/// resolved on the device before any diffing happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDomainRef {
    Id(u32),
    Name(String),
}

impl RouteDomainRef {
    /// Parse a caller-supplied reference: all digits is an id, anything else
    /// a symbolic name.
    pub fn parse(reference: &str) -> Self {
        match reference.parse::<u32>() {
            Ok(id) => RouteDomainRef::Id(id),
            Err(_) => RouteDomainRef::Name(reference.to_string()),
        }
    }
}

impl fmt::Display for RouteDomainRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteDomainRef::Id(id) => write!(f, "{}", id),
            RouteDomainRef::Name(name) => f.write_str(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_parse_as_id() {
        assert_eq!(RouteDomainRef::parse("0"), RouteDomainRef::Id(0));
        assert_eq!(RouteDomainRef::parse("42"), RouteDomainRef::Id(42));
    }

    #[test]
    fn anything_else_parses_as_name() {
        assert_eq!(
            RouteDomainRef::parse("internal"),
            RouteDomainRef::Name("internal".to_string())
        );
        // Mixed forms are names, not ids
        assert_eq!(
            RouteDomainRef::parse("rd1"),
            RouteDomainRef::Name("rd1".to_string())
        );
    }
}
