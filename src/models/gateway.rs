// Gateway elements - named branch points, display-only

//! # Gateway Model
//!
//! A [`Gateway`] is a named branch point placed on the same position axis as
//! statuses. It is a layout/annotation element only: the transition engine
//! never consults gateways to pick among outgoing transitions. Conditional
//! branching is expressed as multiple guarded transitions out of one status,
//! decided by the guard evaluator.

use serde::{Deserialize, Serialize};

use super::ids::GatewayId;

/// Display tag for a gateway, mirroring the BPMN shapes it exports as.
/// Has no runtime branching or join semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GatewayKind {
    Exclusive,
    Parallel,
}

/// A named branch-point display element in the workflow graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gateway {
    pub id: GatewayId,
    pub name: String,
    pub kind: GatewayKind,
    /// Slot on the shared status/gateway position axis used by the exporter
    pub position: i32,
}

impl Gateway {
    pub fn new<I, N>(id: I, name: N, kind: GatewayKind, position: i32) -> Self
    where
        I: Into<GatewayId>,
        N: Into<String>,
    {
        Gateway {
            id: id.into(),
            name: name.into(),
            kind,
            position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_round_trips_through_json() {
        let gateway = Gateway::new("approval_gate", "Approval?", GatewayKind::Exclusive, 3);
        let json = serde_json::to_string(&gateway).unwrap();
        let back: Gateway = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, gateway.id);
        assert_eq!(back.kind, GatewayKind::Exclusive);
        assert_eq!(back.position, 3);
    }
}
