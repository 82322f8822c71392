use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum TypesetError {
    #[error("Invalid markdown configuration: {0}")]
    Config(String),
    #[error("Headline render error: {0}")]
    Render(String),
}

impl From<fmt::Error> for TypesetError {
    fn from(x: fmt::Error) -> Self {
        TypesetError::Render(format!("{x}"))
    }
}
