//! Error types for the packet harness.
//!
//! One crate-wide error enum covers the three failure families the harness
//! deals with:
//!
//! - **Definition errors**: a packet layout that violates chain rules, a
//!   scalar decode over too few bytes, an unknown type tag. Always reported
//!   synchronously to the caller, never silently corrected.
//! - **Transport errors**: dial, write and read failures, plus the four ways
//!   an incoming frame can be malformed.
//! - **State errors**: sending against a target with no registered
//!   connection, or a store lookup that finds nothing.
//!
//! Errors expose [`HarnessError::is_retryable`] so callers can distinguish
//! transient transport trouble from definition mistakes:
//!
//! ```rust
//! use wirebench::HarnessError;
//!
//! let error = HarnessError::connection_failed("dial 10.0.0.1:9000 failed");
//! if error.is_retryable() {
//!     println!("worth retrying");
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for harness operations.
pub type Result<T, E = HarnessError> = std::result::Result<T, E>;

/// Main error type for harness operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum HarnessError {
    #[error("offset {offset}: chained run covers {actual} byte(s), type needs {expected}")]
    ChainLengthMismatch { offset: usize, expected: usize, actual: usize },

    #[error("unsupported field type tag {tag}")]
    UnsupportedType { tag: u8 },

    #[error("scalar decode needs {needed} byte(s), got {got}")]
    InsufficientBytes { needed: usize, got: usize },

    #[error("frame buffer is {len} byte(s), shorter than the {header} byte header")]
    FrameTooShort { len: usize, header: usize },

    #[error("bad frame magic: {found:#010x}")]
    BadMagic { found: u32 },

    #[error("truncated frame payload: header promises {expected} byte(s), buffer carries {got}")]
    TruncatedPayload { expected: usize, got: usize },

    #[error("frame checksum mismatch: stored {expected:#010x}, computed {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("no connection registered for target {target_id}")]
    NoConnection { target_id: u64 },

    #[error("connection error: {reason}")]
    Connection {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("I/O error during {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u64 },

    #[error("config error at {path}: {reason}")]
    Config { path: PathBuf, reason: String },
}

impl HarnessError {
    /// Returns whether this error is potentially recoverable through retry.
    ///
    /// Definition errors and missing entities are permanent until the caller
    /// changes its input; transport failures may clear on their own.
    pub fn is_retryable(&self) -> bool {
        match self {
            HarnessError::Connection { .. } => true,
            HarnessError::Io { .. } => true,
            HarnessError::ChainLengthMismatch { .. } => false,
            HarnessError::UnsupportedType { .. } => false,
            HarnessError::InsufficientBytes { .. } => false,
            HarnessError::FrameTooShort { .. } => false,
            HarnessError::BadMagic { .. } => false,
            HarnessError::TruncatedPayload { .. } => false,
            HarnessError::ChecksumMismatch { .. } => false,
            HarnessError::NoConnection { .. } => false,
            HarnessError::NotFound { .. } => false,
            HarnessError::Config { .. } => false,
        }
    }

    /// Helper constructor for connection errors without a source.
    pub fn connection_failed(reason: impl Into<String>) -> Self {
        HarnessError::Connection { reason: reason.into(), source: None }
    }

    /// Helper constructor for connection errors wrapping an underlying error.
    pub fn connection_failed_with_source(
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        HarnessError::Connection { reason: reason.into(), source: Some(source) }
    }

    /// Helper constructor for I/O errors with operation context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        HarnessError::Io { context: context.into(), source }
    }

    /// Helper constructor for store lookups that found nothing.
    pub fn not_found(entity: &'static str, id: u64) -> Self {
        HarnessError::NotFound { entity, id }
    }

    /// Helper constructor for configuration errors.
    pub fn config(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        HarnessError::Config { path: path.into(), reason: reason.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(test)]
    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn error_messages_contain_their_context(
                reason in ".*",
                target_id in 0u64..10_000u64,
                offset in 0usize..4096usize,
                expected in 1usize..9usize,
                actual in 1usize..9usize,
            ) {
                let connection = HarnessError::connection_failed(reason.clone());
                prop_assert!(connection.to_string().contains(&reason));

                let missing = HarnessError::NoConnection { target_id };
                prop_assert!(missing.to_string().contains(&target_id.to_string()));

                let chain = HarnessError::ChainLengthMismatch { offset, expected, actual };
                let msg = chain.to_string();
                prop_assert!(msg.contains(&offset.to_string()));
                prop_assert!(msg.contains(&expected.to_string()));
                prop_assert!(!msg.is_empty());
            }

            #[test]
            fn source_chains_are_traversable(depth in 1usize..4usize, base in ".*") {
                let mut current: Box<dyn std::error::Error + Send + Sync> =
                    Box::new(std::io::Error::other(base.clone()));
                for level in 0..depth {
                    current = Box::new(HarnessError::Connection {
                        reason: format!("level {level}"),
                        source: Some(current),
                    });
                }

                let mut hops = 0;
                let top: Box<dyn std::error::Error> = current;
                let mut next = top.source();
                let mut saw_base = false;
                while let Some(source) = next {
                    hops += 1;
                    if source.to_string().contains(&base) {
                        saw_base = true;
                    }
                    next = source.source();
                }
                prop_assert_eq!(hops, depth);
                prop_assert!(saw_base);
            }
        }
    }

    #[test]
    fn error_traits_validation() {
        fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<HarnessError>();

        let error = HarnessError::connection_failed("test");
        let _: &dyn std::error::Error = &error;
    }

    #[test]
    fn retryability_classification() {
        assert!(HarnessError::connection_failed("x").is_retryable());
        assert!(HarnessError::io("read", std::io::Error::other("boom")).is_retryable());
        assert!(!HarnessError::NoConnection { target_id: 1 }.is_retryable());
        assert!(
            !HarnessError::ChainLengthMismatch { offset: 0, expected: 2, actual: 1 }
                .is_retryable()
        );
        assert!(!HarnessError::ChecksumMismatch { expected: 1, actual: 2 }.is_retryable());
    }

    #[test]
    fn constructors_produce_expected_variants() {
        assert!(matches!(
            HarnessError::not_found("target", 7),
            HarnessError::NotFound { entity: "target", id: 7 }
        ));
        assert!(matches!(
            HarnessError::config("/tmp/x.yaml", "bad"),
            HarnessError::Config { .. }
        ));
    }
}
