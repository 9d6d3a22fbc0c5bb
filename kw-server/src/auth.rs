use std::fmt;

/// The single operator password guarding every mutating route.
///
/// An unset secret rejects everything.
#[derive(Clone, Default)]
pub struct SharedSecret {
    expected: Option<String>,
}

impl SharedSecret {
    pub fn new(expected: Option<String>) -> Self {
        Self {
            expected: expected.filter(|s| !s.is_empty()),
        }
    }

    pub fn is_set(&self) -> bool {
        self.expected.is_some()
    }

    pub fn verify(&self, provided: Option<&str>) -> bool {
        match (&self.expected, provided) {
            (Some(expected), Some(provided)) => !provided.is_empty() && expected == provided,
            _ => false,
        }
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.expected {
            Some(_) => write!(f, "SharedSecret(<redacted>)"),
            None => write!(f, "SharedSecret(<unset>)"),
        }
    }
}
