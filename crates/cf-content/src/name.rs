//! Fixed collection names.

use std::fmt;
use std::str::FromStr;

/// Name of one of the site's content collections.
///
/// The set is closed: every collection the site renders is listed here, and
/// reference fields name their target collection with this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CollectionName {
    /// Rule-table definitions read verbatim (`ruletables_raw`).
    RawDocuments,
    /// Rule-table pages (`ruletables`).
    RuleTables,
    /// Example scripts read verbatim (`code_raw`).
    RawCode,
    /// Application pages (`applications`).
    Applications,
    /// Bibliography entries (`references`).
    References,
    /// Documentation pages (`docs`).
    Docs,
}

impl CollectionName {
    /// All collections, in Phase 2 resolution order.
    pub const ALL: [Self; 6] = [
        Self::RawDocuments,
        Self::RuleTables,
        Self::RawCode,
        Self::Applications,
        Self::References,
        Self::Docs,
    ];

    /// Name as used in configuration and error messages.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RawDocuments => "ruletables_raw",
            Self::RuleTables => "ruletables",
            Self::RawCode => "code_raw",
            Self::Applications => "applications",
            Self::References => "references",
            Self::Docs => "docs",
        }
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown collection name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown collection '{0}'")]
pub struct UnknownCollection(pub String);

impl FromStr for CollectionName {
    type Err = UnknownCollection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| UnknownCollection(s.to_owned()))
    }
}
