//! # Error Handling
//!
//! This module defines the centralized error type for the Cauldron library.
//! It uses the `thiserror` library to build a single `Error` enum covering
//! every failure mode of the store, with messages that carry enough context
//! (descriptor, field, git command) to be shown to a user as-is.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum. The first group of variants mirrors the
//!   store's own failure taxonomy:
//!   - transaction state violations (`IllegalTransactionState`),
//!   - partial descriptors where a complete one is required (`PartialDescriptor`),
//!   - mutations of released versions (`ReleasedVersionImmutable`),
//!   - schema violations with field-level detail (`Validation`),
//!   - missing nodes (`NotFound`) and conflicting entries (`AlreadyExists`),
//!   - failures of the underlying git transport (`StoreTransport`).
//!
//!   The remaining variants wrap configuration problems and errors raised by
//!   the libraries the store is built on.
//!
//! - **`FieldError`**: A single schema violation, naming the offending field.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.
//!
//! Validation and state errors are always raised before the store is touched.
//! Transport errors are never retried here; they are returned to the caller,
//! which decides whether to retry the push or discard the transaction.

use std::fmt;

use thiserror::Error;

/// A single field-level schema violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Dotted path of the offending field (e.g. `nativeApps[0].platforms[1].name`).
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Main error type for Cauldron operations
#[derive(Error, Debug)]
pub enum Error {
    /// A transaction was begun while one is pending, or committed/discarded
    /// while none is.
    #[error("Illegal transaction state: {message}")]
    IllegalTransactionState { message: String },

    /// An operation needed a complete `name:platform:version` descriptor.
    #[error("Cannot work with a partial native application descriptor: {descriptor}")]
    PartialDescriptor { descriptor: String },

    /// A released native application version cannot have its dependencies
    /// or container mini-apps changed.
    #[error("{operation}: {descriptor} is released and cannot be modified")]
    ReleasedVersionImmutable {
        descriptor: String,
        operation: String,
    },

    /// A document or candidate record failed schema validation.
    #[error("Validation error: {}", join_field_errors(.errors))]
    Validation { errors: Vec<FieldError> },

    /// The requested application, platform, version or entry does not exist.
    #[error("Not found: {what}")]
    NotFound { what: String },

    /// An entry with the same identity but different content already exists.
    #[error("Already exists: {what}")]
    AlreadyExists { what: String },

    /// A git command against the working copy or the remote failed.
    ///
    /// Includes the command that was run, git's stderr, and an optional hint
    /// about how to recover.
    #[error("Git command failed: {command} - {stderr}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    StoreTransport {
        command: String,
        stderr: String,
        /// Optional hint for how to recover from the failure
        hint: Option<String>,
    },

    /// The CLI configuration file is missing information or is malformed.
    #[error("Configuration error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    Config {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// An error indicating that a mutex guarding shared state has been poisoned.
    #[error("Lock poisoned: {context}")]
    LockPoisoned { context: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON (de)serialization error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// A semantic versioning parsing error, wrapped from `semver::Error`.
    #[error("Semver parsing error: {0}")]
    Semver(#[from] semver::Error),
}

impl Error {
    /// Shorthand for a validation error on a single field.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Validation {
            errors: vec![FieldError::new(field, message)],
        }
    }

    /// Shorthand for a `NotFound` error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Error::NotFound { what: what.into() }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
