use std::fmt;
use std::io;

/// Custom error types for the wiki core
#[derive(Debug)]
pub enum WikiError {
    Io(io::Error),
    Db(rusqlite::Error),
    NotFound(String),
    PathTraversal(String),
    InvalidPattern(regex::Error),
}

impl From<io::Error> for WikiError {
    fn from(err: io::Error) -> Self {
        WikiError::Io(err)
    }
}

impl From<rusqlite::Error> for WikiError {
    fn from(err: rusqlite::Error) -> Self {
        WikiError::Db(err)
    }
}

impl From<regex::Error> for WikiError {
    fn from(err: regex::Error) -> Self {
        WikiError::InvalidPattern(err)
    }
}

impl fmt::Display for WikiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WikiError::Io(e) => write!(f, "I/O error: {}", e),
            WikiError::Db(e) => write!(f, "database error: {}", e),
            WikiError::NotFound(what) => write!(f, "not found: {}", what),
            WikiError::PathTraversal(target) => write!(
                f,
                "possible write attempt outside content directory: {}",
                target
            ),
            WikiError::InvalidPattern(e) => write!(f, "invalid search pattern: {}", e),
        }
    }
}

impl std::error::Error for WikiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WikiError::Io(e) => Some(e),
            WikiError::Db(e) => Some(e),
            WikiError::InvalidPattern(e) => Some(e),
            _ => None,
        }
    }
}
