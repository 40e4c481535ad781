//! Sparkplug Node/Device birth-death state, per §3 and §4.2/§4.6.

use std::collections::HashMap;

/// Lifecycle status of a Sparkplug Node or Device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    /// No birth has been observed yet, or a death has not yet been followed
    /// by a rebirth.
    Offline,
    /// A valid NBIRTH/DBIRTH has been accepted; data frames are expected.
    Birthed,
    /// NDEATH was received, or the broker detected an uncleanly
    /// disconnected will; the node must rebirth before data resumes.
    Lost,
}

/// Describes a metric as declared in a birth frame: its alias and datatype,
/// enough to interpret subsequent NDATA/DDATA references.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricDescriptor {
    /// The metric's name as declared in the birth frame.
    pub name: String,
    /// The Sparkplug datatype ordinal (see `oee_sparkplug::DataType`).
    pub datatype: u32,
}

/// Per-(`group_id`, `node_id`) state owned by the Decoder (C6), per §3.
#[derive(Debug, Clone)]
pub struct NodeState {
    /// The Sparkplug group this node belongs to.
    pub group_id: String,
    /// The edge node identifier.
    pub node_id: String,
    /// Current lifecycle status.
    pub status: NodeStatus,
    /// Birth/death sequence, pairing this node's NBIRTH with its NDEATH.
    pub bd_seq: u64,
    /// Last accepted Sparkplug `seq`, advancing strictly by 1 mod 256.
    pub last_seq: Option<u8>,
    /// Alias → metric descriptor, valid only while `status == Birthed`.
    pub alias_table: HashMap<u64, MetricDescriptor>,
    /// Devices owned by this node, keyed by `device_id`.
    pub devices: HashMap<String, DeviceState>,
}

impl NodeState {
    /// Creates a new, offline node state.
    pub fn new(group_id: impl Into<String>, node_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            node_id: node_id.into(),
            status: NodeStatus::Offline,
            bd_seq: 0,
            last_seq: None,
            alias_table: HashMap::new(),
            devices: HashMap::new(),
        }
    }

    /// Applies a valid NBIRTH: overwrites the alias table, resets `last_seq`
    /// to the birth frame's seq (conventionally 0), and marks the node
    /// Birthed. Per §4.2, also cascades to clear the alias tables of any
    /// existing devices until they rebirth.
    pub fn on_nbirth(&mut self, bd_seq: u64, seq: u8, aliases: HashMap<u64, MetricDescriptor>) {
        self.bd_seq = bd_seq;
        self.last_seq = Some(seq);
        self.alias_table = aliases;
        self.status = NodeStatus::Birthed;
        for device in self.devices.values_mut() {
            device.status = NodeStatus::Offline;
            device.alias_table.clear();
        }
    }

    /// Applies an NDEATH: marks the node Lost, flushes its alias table, and
    /// cascades to all child devices (§4.2: "death of parent Node implicitly
    /// kills all children").
    pub fn on_ndeath(&mut self) {
        self.status = NodeStatus::Lost;
        self.alias_table.clear();
        for device in self.devices.values_mut() {
            device.status = NodeStatus::Lost;
            device.alias_table.clear();
        }
    }

    /// Validates and accepts an NDATA sequence number. Returns `true` if the
    /// frame is in sequence (`seq == (last_seq + 1) mod 256`) and advances
    /// `last_seq`; returns `false` (without advancing state) on a gap, at
    /// which point the caller marks the node Lost and requests a rebirth.
    pub fn accept_seq(&mut self, seq: u8) -> bool {
        let expected = self.last_seq.map(|s| s.wrapping_add(1)).unwrap_or(seq);
        if self.last_seq.is_none() || seq == expected {
            self.last_seq = Some(seq);
            true
        } else {
            false
        }
    }
}

/// Per-(`group_id`, `node_id`, `device_id`) state, scoped under a
/// [`NodeState`].
#[derive(Debug, Clone, Default)]
pub struct DeviceState {
    /// Current lifecycle status.
    pub status: NodeStatus,
    /// Last accepted Sparkplug `seq` for DDATA on this device.
    pub last_seq: Option<u8>,
    /// Alias → metric descriptor for this device.
    pub alias_table: HashMap<u64, MetricDescriptor>,
}

impl Default for NodeStatus {
    fn default() -> Self {
        NodeStatus::Offline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seq_advances_strictly_by_one_mod_256() {
        let mut node = NodeState::new("Plant1", "Line1");
        node.on_nbirth(1, 0, HashMap::new());
        assert!(node.accept_seq(1));
        assert!(node.accept_seq(2));
        assert_eq!(node.last_seq, Some(2));
    }

    #[test]
    fn seq_wraps_from_255_to_0() {
        let mut node = NodeState::new("Plant1", "Line1");
        node.last_seq = Some(255);
        assert!(node.accept_seq(0));
    }

    #[test]
    fn seq_gap_is_rejected_without_advancing_state() {
        let mut node = NodeState::new("Plant1", "Line1");
        node.on_nbirth(1, 0, HashMap::new());
        assert!(node.accept_seq(1));
        assert!(!node.accept_seq(3));
        assert_eq!(node.last_seq, Some(1));
    }

    #[test]
    fn ndeath_cascades_to_child_devices() {
        let mut node = NodeState::new("Plant1", "Line1");
        node.devices.insert("Dev1".into(), DeviceState::default());
        node.devices.get_mut("Dev1").unwrap().status = NodeStatus::Birthed;
        node.on_ndeath();
        assert_eq!(node.status, NodeStatus::Lost);
        assert_eq!(node.devices["Dev1"].status, NodeStatus::Lost);
    }
}
