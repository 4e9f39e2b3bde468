//! Typed error enum for fatal failures in the `oas-codegen` pipeline.
//!
//! Fatal here means "the call cannot return a result at all" — malformed
//! input bytes, an unsupported `openapi` version, an unresolved `$ref`, or
//! a reference cycle with no boxable participant. Recoverable issues (an
//! unsupported schema feature, a duplicate name, an unknown content type)
//! are never raised as [`Error`] — they go through the
//! [`Diagnostics`](crate::diagnostics::Diagnostics) collector instead and
//! the pipeline continues.

/// Errors produced by `oas-codegen` library operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The input could not be parsed as YAML or JSON.
    #[error("failed to parse input document: {0}")]
    Parse(#[from] serde_yaml_ng::Error),

    /// The `openapi` version string is missing or not in the supported set.
    #[error("unsupported OpenAPI version '{found}'; expected one of {supported:?}")]
    UnsupportedVersion {
        /// The version string found in the document (empty if absent).
        found: String,
        /// The versions this parser accepts.
        supported: &'static [&'static str],
    },

    /// A `$ref` does not resolve within `#/components/...`.
    #[error("unresolved reference '{reference}'{}", location_suffix(.location))]
    UnresolvedReference {
        /// The raw `$ref` string.
        reference: String,
        /// Where the dangling reference was found, if known.
        location: Option<String>,
    },

    /// A schema reference cycle has no participant that can be boxed
    /// (indirected), so the cycle cannot be represented by finite-size
    /// target types.
    #[error("unrecoverable reference cycle among schemas: {}", .members.join(" -> "))]
    UnrecoverableCycle {
        /// The schema names participating in the cycle, in cycle order.
        members: Vec<String>,
    },

    /// An `error`-severity diagnostic was emitted while the throwing sink
    /// was active; the pipeline unwound at that point.
    #[error("{0}")]
    Diagnostic(String),
}

fn location_suffix(location: &Option<String>) -> String {
    match location {
        Some(loc) => format!(" (at {loc})"),
        None => String::new(),
    }
}

/// Convenience alias used throughout the library's public API.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time assertion that `Error` is `Send + Sync`.
    const _: () = {
        const fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    };

    #[test]
    fn unresolved_reference_with_location() {
        let err = Error::UnresolvedReference {
            reference: "#/components/schemas/Missing".to_string(),
            location: Some("#/paths/~1pets/get".to_string()),
        };
        let msg = err.to_string();
        assert!(msg.contains("#/components/schemas/Missing"));
        assert!(msg.contains("#/paths/~1pets/get"));
    }

    #[test]
    fn unresolved_reference_without_location() {
        let err = Error::UnresolvedReference {
            reference: "#/components/schemas/Missing".to_string(),
            location: None,
        };
        assert_eq!(
            err.to_string(),
            "unresolved reference '#/components/schemas/Missing'"
        );
    }

    #[test]
    fn unsupported_version_message() {
        let err = Error::UnsupportedVersion {
            found: "2.0".to_string(),
            supported: &["3.0.0", "3.0.1", "3.0.2", "3.0.3", "3.1.0"],
        };
        assert!(err.to_string().contains("2.0"));
        assert!(err.to_string().contains("3.1.0"));
    }
}
