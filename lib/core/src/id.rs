//! Strongly-typed identifiers for pipeline requests and inference calls.
//!
//! All IDs wrap a ULID so log lines for one request sort together by time.

use std::fmt;
use ulid::Ulid;

/// Macro to generate a strongly-typed ID wrapper around ULID.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(Ulid);

        impl $name {
            /// Creates a new ID with a randomly generated ULID.
            #[must_use]
            pub fn new() -> Self {
                Self(Ulid::new())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}_{}", $prefix, self.0)
            }
        }
    };
}

define_id!(
    /// Identifies one `build_form` orchestration.
    FormRequestId,
    "form"
);

define_id!(
    /// Identifies one `build_recommendation` orchestration.
    RecommendationRequestId,
    "rec"
);

define_id!(
    /// Identifies a single outbound inference call to one provider.
    LlmInvocationId,
    "llm"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_prefix() {
        assert!(FormRequestId::new().to_string().starts_with("form_"));
        assert!(RecommendationRequestId::new().to_string().starts_with("rec_"));
        assert!(LlmInvocationId::new().to_string().starts_with("llm_"));
    }

    #[test]
    fn display_suffix_is_a_ulid() {
        let id = FormRequestId::new().to_string();
        let suffix = id.strip_prefix("form_").expect("prefix");
        assert!(suffix.parse::<Ulid>().is_ok());
    }

    #[test]
    fn ids_are_distinct() {
        use std::collections::HashSet;

        let ids: HashSet<LlmInvocationId> = (0..16).map(|_| LlmInvocationId::new()).collect();
        assert_eq!(ids.len(), 16);
    }
}
