use std::fmt;

/// The coordinate varied by a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    I,
    Q,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I => f.write_str("I"),
            Self::Q => f.write_str("Q"),
        }
    }
}
