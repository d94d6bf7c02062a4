//! Type definitions and aliases

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// Tag key attached to every books request sample
pub const BOOKS_TAG_KEY: &str = "books";

/// Endpoints exercised by the scenarios
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Endpoint {
    /// `GET /books`
    ListBooks,
    /// `GET /new-books`
    NewBooks,
}

impl Endpoint {
    pub const ALL: [Endpoint; 2] = [Endpoint::ListBooks, Endpoint::NewBooks];

    /// Request path relative to the base URL
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::ListBooks => "/books",
            Endpoint::NewBooks => "/new-books",
        }
    }

    /// Value of the `books` tag for samples of this endpoint
    pub fn tag(&self) -> &'static str {
        match self {
            Endpoint::ListBooks => "list-books",
            Endpoint::NewBooks => "new-books",
        }
    }

    /// Look up an endpoint by its tag value
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.tag() == tag)
    }

    /// Full request URL for the given base URL
    pub fn url(&self, base_url: &str) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), self.path())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", BOOKS_TAG_KEY, self.tag())
    }
}

/// What a single scenario iteration executes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecTarget {
    /// Both endpoints in order: list books, then new books
    Default,
    ListBooks,
    NewBooks,
}

impl ExecTarget {
    /// Endpoints requested by one iteration, in order
    pub fn endpoints(&self) -> &'static [Endpoint] {
        match self {
            ExecTarget::Default => &[Endpoint::ListBooks, Endpoint::NewBooks],
            ExecTarget::ListBooks => &[Endpoint::ListBooks],
            ExecTarget::NewBooks => &[Endpoint::NewBooks],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExecTarget::Default => "default",
            ExecTarget::ListBooks => "list_books",
            ExecTarget::NewBooks => "new_books",
        }
    }
}

impl FromStr for ExecTarget {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "default" => Ok(ExecTarget::Default),
            "list_books" => Ok(ExecTarget::ListBooks),
            "new_books" => Ok(ExecTarget::NewBooks),
            other => Err(AppError::parse(format!("Unknown exec function: {}", other))),
        }
    }
}

/// Iteration scheduling strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutorKind {
    /// Every VU runs a fixed number of iterations
    #[serde(rename = "per-vu-iterations")]
    PerVuIterations,
}

impl ExecutorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutorKind::PerVuIterations => "per-vu-iterations",
        }
    }
}

impl FromStr for ExecutorKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "per-vu-iterations" => Ok(ExecutorKind::PerVuIterations),
            other => Err(AppError::validation(format!(
                "Unsupported executor '{}': only per-vu-iterations is available",
                other
            ))),
        }
    }
}

/// Outcome of a single request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    /// A response was received (any status code)
    Completed,
    /// Transport failure before a response arrived
    Failed,
    /// Request exceeded the configured timeout
    Timeout,
}
