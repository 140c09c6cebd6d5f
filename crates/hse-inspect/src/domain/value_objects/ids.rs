//! Identifier value objects

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generate a fresh UUID v4 identifier
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn from_string(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
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

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

entity_id!(
    /// Globally unique template identifier
    TemplateId
);
entity_id!(
    /// Inspection instance identifier
    InspectionId
);
entity_id!(
    /// Assignment identifier
    AssignmentId
);
entity_id!(
    /// Authenticated user identifier
    UserId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_uuids() {
        let id = TemplateId::new();
        assert!(uuid::Uuid::parse_str(id.as_str()).is_ok());
        assert_ne!(TemplateId::new(), id);
    }

    #[test]
    fn test_id_serializes_as_plain_string() {
        let id = InspectionId::from_string("insp-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"insp-1\"");
    }
}
