use std::fmt;

use convert_case::{Case, Casing};

/// A node name: lowercase ASCII alphanumerics and underscores.
///
/// Names appear in tree dumps and log output; they carry no identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeName(String);

impl NodeName {
    /// Munge an arbitrary string into a valid name: snake case, invalid
    /// characters dropped, `node` if nothing is left.
    pub fn convert(name: &str) -> Self {
        let filtered: String = name
            .to_case(Case::Snake)
            .chars()
            .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_')
            .collect();
        if filtered.is_empty() {
            Self("node".into())
        } else {
            Self(filtered)
        }
    }

    /// The name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<&str> for NodeName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
