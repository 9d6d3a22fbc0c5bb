use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Operator-facing actions that can be dispatched against a configured service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Restart,
    Start,
    Stop,
    Redeploy,
}

impl Action {
    pub const ALL: [Action; 4] = [
        Action::Restart,
        Action::Start,
        Action::Stop,
        Action::Redeploy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Restart => "restart",
            Action::Start => "start",
            Action::Stop => "stop",
            Action::Redeploy => "redeploy",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "restart" => Ok(Action::Restart),
            "start" => Ok(Action::Start),
            "stop" => Ok(Action::Stop),
            "redeploy" => Ok(Action::Redeploy),
            _ => Err(format!(
                "Invalid action: {}. Choose from restart, start, stop, redeploy",
                s
            )),
        }
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
