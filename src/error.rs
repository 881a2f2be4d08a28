//! Error types for JSV, JSON and CSV serialization and deserialization.
//!
//! ## Error Categories
//!
//! - **Syntax Errors**: malformed text (only raised for unterminated or unbalanced
//!   input when strict parsing is enabled, or for text that is not a map/list at all)
//! - **Parse Errors**: a scalar token could not be converted to its target type
//! - **Key-value pair errors**: a pair map carried a field other than `Key`/`Value`
//! - **Discriminator errors**: an abstract slot could not be resolved to a concrete type
//! - **I/O Errors**: reading from or writing to a stream failed
//!
//! All parse-related errors carry the target type name and the offending text.
//!
//! ## Examples
//!
//! ```rust
//! use jsv_text::{jsv, Error};
//!
//! let result: Result<i32, Error> = jsv::from_str("twelve");
//! assert!(matches!(result, Err(Error::Parse { .. })));
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all possible errors that can occur while writing or reading text.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// IO error during reading or writing
    #[error("IO error: {0}")]
    Io(String),

    /// Malformed text with position context
    #[error("Syntax error at line {line}, column {col}: {msg}\n{context}")]
    Syntax {
        line: usize,
        col: usize,
        msg: String,
        context: String,
    },

    /// A scalar token could not be converted to the target type
    #[error("Cannot parse `{input}` as {type_name}: {msg}")]
    Parse {
        type_name: String,
        input: String,
        msg: String,
    },

    /// A value of an unexpected runtime type reached a strategy
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// A key-value pair map carried an unrecognized field
    #[error("Invalid field `{field}` in key-value pair {type_name}; expected `Key` or `Value`")]
    InvalidPairField { type_name: String, field: String },

    /// An abstract slot was read without a type discriminator
    #[error("Cannot read abstract type {type_name}: no `{attr}` discriminator in input")]
    MissingDiscriminator { type_name: String, attr: String },

    /// The discriminator named a type that is not a registered implementor
    #[error("Unknown type `{discriminator}` for abstract type {type_name}")]
    UnknownType {
        type_name: String,
        discriminator: String,
    },

    /// The type has no readable shape
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates a syntax error for the given byte offset of `text`.
    ///
    /// Line and column are 1-based and computed from the offset; the context
    /// shows a short excerpt of the input starting at the offset.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use jsv_text::Error;
    ///
    /// let err = Error::syntax("{a:1\n,b", 6, "unexpected token");
    /// assert!(err.to_string().contains("line 2"));
    /// ```
    pub fn syntax(text: &str, offset: usize, msg: &str) -> Self {
        let offset = offset.min(text.len());
        let before = &text[..floor_boundary(text, offset)];
        let line = before.matches('\n').count() + 1;
        let col = before
            .rsplit('\n')
            .next()
            .map(|l| l.chars().count() + 1)
            .unwrap_or(1);
        let context: String = text[floor_boundary(text, offset)..].chars().take(32).collect();
        Error::Syntax {
            line,
            col,
            msg: msg.to_string(),
            context,
        }
    }

    /// Creates a parse error for a scalar that could not be converted.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use jsv_text::Error;
    ///
    /// let err = Error::parse("i32", "abc", "invalid digit found in string");
    /// assert!(err.to_string().contains("abc"));
    /// ```
    pub fn parse<M: fmt::Display>(type_name: &str, input: &str, msg: M) -> Self {
        Error::Parse {
            type_name: type_name.to_string(),
            input: input.to_string(),
            msg: msg.to_string(),
        }
    }

    /// Creates a type mismatch error.
    pub fn type_mismatch(expected: &str, found: &str) -> Self {
        Error::TypeMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    /// Creates an invalid key-value pair field error.
    pub fn invalid_pair_field(type_name: &str, field: &str) -> Self {
        Error::InvalidPairField {
            type_name: type_name.to_string(),
            field: field.to_string(),
        }
    }

    /// Creates a missing discriminator error.
    pub fn missing_discriminator(type_name: &str, attr: &str) -> Self {
        Error::MissingDiscriminator {
            type_name: type_name.to_string(),
            attr: attr.to_string(),
        }
    }

    /// Creates an unknown discriminator error.
    pub fn unknown_type(type_name: &str, discriminator: &str) -> Self {
        Error::UnknownType {
            type_name: type_name.to_string(),
            discriminator: discriminator.to_string(),
        }
    }

    /// Creates an unsupported type error.
    pub fn unsupported_type(msg: &str) -> Self {
        Error::UnsupportedType(msg.to_string())
    }

    /// Creates a custom error with a display message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use jsv_text::Error;
    ///
    /// let err = Error::custom("something went wrong");
    /// assert!(err.to_string().contains("something went wrong"));
    /// ```
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Creates an I/O error for stream reading/writing failures.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }
}

fn floor_boundary(text: &str, mut offset: usize) -> usize {
    while offset > 0 && !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
