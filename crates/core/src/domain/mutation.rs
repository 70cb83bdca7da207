use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::instance::InstanceState;
use crate::error::CoreError;

/// The state an instance is in when a workflow begins.
///
/// Only these two states are accepted: an instance that is mid-transition
/// must never receive a stop or start call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OriginState {
    Running,
    Stopped,
}

impl OriginState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Stopped => "stopped",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s.trim() {
            "running" => Ok(Self::Running),
            "stopped" => Ok(Self::Stopped),
            other => Err(CoreError::InvalidOriginState(other.to_string())),
        }
    }

    pub fn from_state(state: InstanceState) -> Option<Self> {
        match state {
            InstanceState::Running => Some(Self::Running),
            InstanceState::Stopped => Some(Self::Stopped),
            _ => None,
        }
    }

    pub fn state(&self) -> InstanceState {
        match self {
            Self::Running => InstanceState::Running,
            Self::Stopped => InstanceState::Stopped,
        }
    }
}

/// The single configuration change applied while an instance is stopped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MutationSpec {
    /// Change the instance's machine-size class
    ResizeType { instance_type: String },
    /// Attach an elastic address allocation to the instance
    AssociateAddress { allocation_id: String },
}

impl MutationSpec {
    pub fn kind(&self) -> MutationKind {
        match self {
            Self::ResizeType { .. } => MutationKind::Resize,
            Self::AssociateAddress { .. } => MutationKind::Address,
        }
    }

    /// Short human description used in progress messages.
    pub fn describe(&self) -> String {
        match self {
            Self::ResizeType { instance_type } => format!("resize to {}", instance_type),
            Self::AssociateAddress { allocation_id } => {
                format!("associate address {}", allocation_id)
            }
        }
    }
}

/// Which mutation an endpoint performs; the target value arrives separately.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    Resize,
    Address,
}

impl MutationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Resize => "resize",
            Self::Address => "address",
        }
    }

    /// Build the mutation for a caller-supplied target string.
    pub fn with_target(&self, target: &str) -> Result<MutationSpec, CoreError> {
        let target = target.trim();
        if target.is_empty() {
            return Err(CoreError::Validation(format!(
                "{} target must not be empty",
                self.as_str()
            )));
        }

        Ok(match self {
            Self::Resize => MutationSpec::ResizeType {
                instance_type: target.to_string(),
            },
            Self::Address => MutationSpec::AssociateAddress {
                allocation_id: target.to_string(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_state_parsing() {
        assert_eq!(OriginState::parse("running"), Ok(OriginState::Running));
        assert_eq!(OriginState::parse(" stopped "), Ok(OriginState::Stopped));
        assert_eq!(
            OriginState::parse("stopping"),
            Err(CoreError::InvalidOriginState("stopping".to_string()))
        );
    }

    #[test]
    fn test_origin_from_state() {
        assert_eq!(
            OriginState::from_state(InstanceState::Running),
            Some(OriginState::Running)
        );
        assert_eq!(OriginState::from_state(InstanceState::Pending), None);
        assert_eq!(OriginState::Stopped.state(), InstanceState::Stopped);
    }

    #[test]
    fn test_mutation_with_target() {
        let spec = MutationKind::Resize.with_target(" m5.large ").unwrap();
        assert_eq!(
            spec,
            MutationSpec::ResizeType {
                instance_type: "m5.large".to_string()
            }
        );
        assert_eq!(spec.kind(), MutationKind::Resize);

        let spec = MutationKind::Address.with_target("eipalloc-1").unwrap();
        assert_eq!(spec.kind(), MutationKind::Address);
        assert!(spec.describe().contains("eipalloc-1"));
    }

    #[test]
    fn test_mutation_rejects_empty_target() {
        assert!(MutationKind::Resize.with_target("   ").is_err());
    }

    #[test]
    fn test_mutation_serialization() {
        let spec = MutationSpec::AssociateAddress {
            allocation_id: "eipalloc-1".to_string(),
        };
        let json = serde_json::to_string(&spec).unwrap();
        assert!(json.contains("\"kind\":\"associate_address\""));
    }
}
