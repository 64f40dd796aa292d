//! Addressable views.
//!
//! `/` is the connect form and `/explorer{path}` browses a directory.
//! Everything else maps back to the connect form.

use std::fmt;

use crate::storage::{normalize_path, parent_path};

const BROWSE_PREFIX: &str = "/explorer";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Connect,
    Browse(String),
}

impl Location {
    /// Parse an address. Unknown addresses resolve to [`Location::Connect`].
    pub fn parse(address: &str) -> Self {
        match address.strip_prefix(BROWSE_PREFIX) {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => {
                Self::Browse(normalize_path(rest))
            }
            _ => Self::Connect,
        }
    }

    /// Browsing requires a connection; without one the connect form is shown.
    pub fn resolve(self, connected: bool) -> Self {
        match self {
            Self::Browse(_) if !connected => Self::Connect,
            other => other,
        }
    }

    /// The browsed path, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Browse(path) => Some(path),
            Self::Connect => None,
        }
    }

    /// Path segments for breadcrumbs, root excluded.
    pub fn path_segments(&self) -> Vec<&str> {
        self.path()
            .map(|p| p.split('/').filter(|s| !s.is_empty()).collect())
            .unwrap_or_default()
    }

    /// One level up. `None` at the root or on the connect form.
    pub fn parent(&self) -> Option<Self> {
        self.path().and_then(parent_path).map(Self::Browse)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect => write!(f, "/"),
            Self::Browse(path) if path == "/" => write!(f, "{BROWSE_PREFIX}/"),
            Self::Browse(path) => write!(f, "{BROWSE_PREFIX}{path}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_addresses() {
        assert_eq!(Location::parse("/"), Location::Connect);
        assert_eq!(Location::parse("/explorer"), Location::Browse("/".into()));
        assert_eq!(Location::parse("/explorer/"), Location::Browse("/".into()));
        assert_eq!(
            Location::parse("/explorer/docs/2024/"),
            Location::Browse("/docs/2024".into())
        );
        assert_eq!(Location::parse("/explorers"), Location::Connect);
        assert_eq!(Location::parse("/settings"), Location::Connect);
    }

    #[test]
    fn display_round_trips() {
        for addr in ["/", "/explorer/", "/explorer/docs/a b"] {
            assert_eq!(Location::parse(addr).to_string(), addr);
        }
    }

    #[test]
    fn browse_redirects_when_disconnected() {
        let loc = Location::Browse("/docs".into());
        assert_eq!(loc.clone().resolve(false), Location::Connect);
        assert_eq!(loc.clone().resolve(true), loc);
        assert_eq!(Location::Connect.resolve(true), Location::Connect);
    }

    #[test]
    fn segments_and_parent() {
        let loc = Location::Browse("/docs/2024".into());
        assert_eq!(loc.path_segments(), vec!["docs", "2024"]);
        assert_eq!(loc.parent(), Some(Location::Browse("/docs".into())));
        assert_eq!(
            Location::Browse("/docs".into()).parent(),
            Some(Location::Browse("/".into()))
        );
        assert_eq!(Location::Browse("/".into()).parent(), None);
        assert!(Location::Browse("/".into()).path_segments().is_empty());
        assert_eq!(Location::Connect.parent(), None);
    }
}
