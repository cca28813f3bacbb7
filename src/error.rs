use std::fmt;

#[derive(Debug)]
pub enum TextSplitError {
    InvalidConfiguration(String),
    SettleTimeout { polls: usize },
    NoContainer { index: usize, count: usize },
    Io(std::io::Error),
}

impl fmt::Display for TextSplitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextSplitError::InvalidConfiguration(message) => {
                write!(f, "invalid configuration: {}", message)
            }
            TextSplitError::SettleTimeout { polls } => {
                write!(f, "rendering did not settle after {} polls", polls)
            }
            TextSplitError::NoContainer { index, count } => {
                write!(f, "container {} requested but host has {}", index, count)
            }
            TextSplitError::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

impl std::error::Error for TextSplitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TextSplitError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TextSplitError {
    fn from(value: std::io::Error) -> Self {
        TextSplitError::Io(value)
    }
}
