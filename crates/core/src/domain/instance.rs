use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Semantic lifecycle state of an instance.
///
/// Always derived from a provider status code through [`InstanceState::classify`];
/// codes outside the known table become [`InstanceState::Unknown`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InstanceState {
    Pending,
    Running,
    Stopping,
    Stopped,
    /// Shutting down or terminated. No transition leads back out of it.
    Terminated,
    Unknown,
}

impl InstanceState {
    /// Known provider status codes. Only the low byte of a reported code
    /// carries the state; the high byte is provider-internal.
    const CODES: [(i32, InstanceState); 6] = [
        (0, InstanceState::Pending),
        (16, InstanceState::Running),
        (32, InstanceState::Terminated),
        (48, InstanceState::Terminated),
        (64, InstanceState::Stopping),
        (80, InstanceState::Stopped),
    ];

    pub fn classify(code: i32) -> Self {
        let code = code & 0xff;
        Self::CODES
            .iter()
            .find(|(known, _)| *known == code)
            .map(|(_, state)| *state)
            .unwrap_or(Self::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
            Self::Terminated => "terminated",
            Self::Unknown => "unknown",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "stopping" => Some(Self::Stopping),
            "stopped" => Some(Self::Stopped),
            "terminated" => Some(Self::Terminated),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }

    /// Whether an instance reporting this state can still reach `target`
    /// without another lifecycle call being issued.
    pub fn can_reach(&self, target: InstanceState) -> bool {
        match (self, target) {
            (Self::Terminated, _) => false,
            (current, target) if *current == target => true,
            (Self::Stopping, Self::Running) => false,
            _ => true,
        }
    }
}

impl std::fmt::Display for InstanceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single status reading for an instance as reported by the provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct InstanceStatus {
    pub instance_id: String,
    /// Raw provider status code
    pub code: i32,
    /// Provider's own name for the state (e.g. "shutting-down")
    pub name: String,
}

impl InstanceStatus {
    pub fn new(instance_id: impl Into<String>, code: i32, name: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            code,
            name: name.into(),
        }
    }

    /// Build a reading for a known state using its canonical code and name.
    pub fn of(instance_id: impl Into<String>, state: InstanceState) -> Self {
        let code = InstanceState::CODES
            .iter()
            .find(|(_, known)| *known == state)
            .map(|(code, _)| *code)
            .unwrap_or(-1);
        Self::new(instance_id, code, state.as_str())
    }

    pub fn state(&self) -> InstanceState {
        InstanceState::classify(self.code)
    }
}

/// One row of an instance listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct InstanceSummary {
    pub instance_id: String,
    pub instance_type: String,
    pub state: InstanceState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_known_codes() {
        assert_eq!(InstanceState::classify(0), InstanceState::Pending);
        assert_eq!(InstanceState::classify(16), InstanceState::Running);
        assert_eq!(InstanceState::classify(32), InstanceState::Terminated);
        assert_eq!(InstanceState::classify(48), InstanceState::Terminated);
        assert_eq!(InstanceState::classify(64), InstanceState::Stopping);
        assert_eq!(InstanceState::classify(80), InstanceState::Stopped);
    }

    #[test]
    fn test_classify_ignores_high_byte() {
        assert_eq!(InstanceState::classify(272), InstanceState::Running);
        assert_eq!(InstanceState::classify(336), InstanceState::Stopped);
        assert_eq!(InstanceState::classify(17), InstanceState::Unknown);
    }

    #[test]
    fn test_classify_is_total() {
        for code in -600..600 {
            let state = InstanceState::classify(code);
            let known = InstanceState::CODES.iter().any(|(c, _)| *c == code & 0xff);
            assert_eq!(state == InstanceState::Unknown, !known, "code {code}");
            assert_eq!(state, InstanceState::classify(code));
        }
    }

    #[test]
    fn test_state_parsing() {
        assert_eq!(
            InstanceState::parse("stopped"),
            Some(InstanceState::Stopped)
        );
        assert_eq!(InstanceState::parse("shutting-down"), None);
        assert_eq!(InstanceState::Running.as_str(), "running");
    }

    #[test]
    fn test_can_reach() {
        assert!(InstanceState::Running.can_reach(InstanceState::Stopped));
        assert!(InstanceState::Pending.can_reach(InstanceState::Running));
        assert!(InstanceState::Unknown.can_reach(InstanceState::Stopped));
        assert!(!InstanceState::Terminated.can_reach(InstanceState::Stopped));
        assert!(!InstanceState::Stopping.can_reach(InstanceState::Running));
    }

    #[test]
    fn test_status_of_uses_canonical_code() {
        let status = InstanceStatus::of("i-123", InstanceState::Stopped);
        assert_eq!(status.code, 80);
        assert_eq!(status.name, "stopped");
        assert_eq!(status.state(), InstanceState::Stopped);
    }

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_string(&InstanceState::Stopping).unwrap();
        assert_eq!(json, "\"stopping\"");
    }
}
