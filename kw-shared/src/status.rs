use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Service status as reported by the hosting platform.
///
/// The platform's enumeration is open ended, so anything not listed here is
/// carried through verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ServiceStatus {
    Running,
    Suspended,
    Starting,
    Stopping,
    Building,
    Crashed,
    Pending,
    Unknown,
    Other(String),
}

impl Default for ServiceStatus {
    fn default() -> Self {
        ServiceStatus::Unknown
    }
}

impl ServiceStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ServiceStatus::Running => "RUNNING",
            ServiceStatus::Suspended => "SUSPENDED",
            ServiceStatus::Starting => "STARTING",
            ServiceStatus::Stopping => "STOPPING",
            ServiceStatus::Building => "BUILDING",
            ServiceStatus::Crashed => "CRASHED",
            ServiceStatus::Pending => "PENDING",
            ServiceStatus::Unknown => "UNKNOWN",
            ServiceStatus::Other(s) => s,
        }
    }
}

impl From<String> for ServiceStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "RUNNING" => ServiceStatus::Running,
            "SUSPENDED" => ServiceStatus::Suspended,
            "STARTING" => ServiceStatus::Starting,
            "STOPPING" => ServiceStatus::Stopping,
            "BUILDING" => ServiceStatus::Building,
            "CRASHED" => ServiceStatus::Crashed,
            "PENDING" => ServiceStatus::Pending,
            "UNKNOWN" | "" => ServiceStatus::Unknown,
            _ => ServiceStatus::Other(s),
        }
    }
}

impl From<&str> for ServiceStatus {
    fn from(s: &str) -> Self {
        ServiceStatus::from(s.to_string())
    }
}

impl From<ServiceStatus> for String {
    fn from(status: ServiceStatus) -> Self {
        status.as_str().to_string()
    }
}

impl Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
