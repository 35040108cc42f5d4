//! Strongly-typed names for domain entities.
//!
//! # Architectural note
//!
//! Unlike a database-backed system where entities get a generated UUID, a
//! randomizer seed identifies every entity by the name the generator gave
//! it (`"Link's House"`, `"Progressive Sword"`, `"Hyrule Castle Secret Entrance Drop"`).
//! That name *is* the identifier: it is stable across a seed's lifetime and
//! is how the rules JSON, the spoiler log, and the UI all refer to the
//! entity. These newtypes exist so a `RegionName` can't be passed where a
//! `LocationName` is expected, not to add a layer of indirection over a
//! generated key.

use std::borrow::Borrow;
use std::fmt;

macro_rules! define_name {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(name: impl Into<String>) -> Self {
                Self(name.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

define_name!(RegionName);
define_name!(LocationName);
define_name!(ExitName);
define_name!(ItemName);
define_name!(DungeonName);
define_name!(GroupName);

/// A player slot id in a (potentially multiworld) seed. Stringified in the
/// rules JSON but handled as an integer everywhere else.
pub type PlayerId = u32;
