use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Engine-wide information returned by the `info` endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct HostInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub server_version: String,
    #[serde(default)]
    pub containers: u64,
    #[serde(default)]
    pub images: u64,
    #[serde(default, rename = "NCPU")]
    pub ncpu: u64,
    #[serde(default)]
    pub mem_total: u64,
    #[serde(default)]
    pub swarm: Option<SwarmInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SwarmInfo {
    // Empty outside a swarm. Only its truthiness matters, whatever the JSON type.
    #[serde(rename = "NodeID", default)]
    pub node_id: Value,
    #[serde(rename = "LocalNodeState", default)]
    pub local_node_state: String,
}

impl HostInfo {
    /// True when the host belongs to a cluster and exposes services.
    pub fn is_swarm_member(&self) -> bool {
        self.swarm.as_ref().is_some_and(|s| truthy(&s.node_id))
    }
}

/// `null`, `false`, zero and the empty string count as unset.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ServiceSummary {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Spec", default)]
    pub spec: ServiceSpec,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceSpec {
    #[serde(default)]
    pub name: String,
}
