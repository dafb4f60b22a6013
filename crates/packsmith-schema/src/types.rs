//! Newtype wrappers for string identifiers, providing compile-time type safety.
//!
//! All newtypes serialize/deserialize as plain strings so persisted records
//! stay readable by hand.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new instance from a string.
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Return the inner string as a slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume self and return the inner `String`.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl PartialEq<String> for $name {
            fn eq(&self, other: &String) -> bool {
                self.0 == *other
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }
    };
}

string_newtype!(
    /// Caller-chosen name of one running instance of a pack.
    DeploymentName
);

string_newtype!(
    /// Name of a deployable pack inside a registry.
    PackName
);

string_newtype!(
    /// Local name under which a pack registry is registered with the tool.
    RegistryName
);

string_newtype!(
    /// Blake3 digest of a normalized deployment spec.
    SpecDigest
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deployment_name_display_and_as_ref() {
        let name = DeploymentName::new("d1");
        assert_eq!(name.to_string(), "d1");
        assert_eq!(name.as_str(), "d1");
        assert_eq!(AsRef::<str>::as_ref(&name), "d1");
    }

    #[test]
    fn pack_name_serde_is_transparent() {
        let pack = PackName::new("redis");
        let json = serde_json::to_string(&pack).unwrap();
        assert_eq!(json, "\"redis\"");
        let back: PackName = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pack);
    }

    #[test]
    fn registry_name_compares_with_str() {
        let reg = RegistryName::from("r1");
        assert_eq!(reg, "r1");
        assert_eq!(reg, "r1".to_owned());
    }

    #[test]
    fn into_inner_returns_string() {
        let digest = SpecDigest::new("abc".to_owned());
        assert_eq!(digest.into_inner(), "abc");
    }

    #[test]
    fn default_is_empty() {
        assert!(PackName::default().is_empty());
    }
}
