//! Encode/decode between [`oee_domain::Sample`] and Sparkplug B
//! [`Payload`] frames, per §4.2.

use std::collections::HashMap;

use oee_domain::{DeviceState, MetricDescriptor, NodeState, Quality, Sample};

use crate::{
    error::SparkplugError,
    payload::{DataType, Metric, Payload},
};

/// Builds an NBIRTH/DBIRTH payload declaring the given metrics, assigning
/// each a stable alias in declaration order.
///
/// Aliases MUST NOT be reused within the birth session (§4.2); callers keep
/// the returned alias assignment and feed it to [`NodeState::on_nbirth`] (or
/// the equivalent device call) so later [`decode`] calls can resolve them.
pub fn encode_birth(timestamp_ms: i64, metrics: &[(String, DataType)]) -> (Payload, HashMap<u64, MetricDescriptor>) {
    let mut payload_metrics = Vec::with_capacity(metrics.len());
    let mut aliases = HashMap::with_capacity(metrics.len());
    for (alias, (name, datatype)) in metrics.iter().enumerate() {
        let alias = alias as u64;
        payload_metrics.push(Metric {
            name: Some(name.clone()),
            alias: Some(alias),
            timestamp: Some(timestamp_ms as u64),
            datatype: *datatype as u32,
            is_null: None,
            int_value: None,
            double_value: None,
            string_value: None,
        });
        aliases.insert(alias, MetricDescriptor { name: name.clone(), datatype: *datatype as u32 });
    }
    let payload = Payload {
        timestamp: Some(timestamp_ms as u64),
        metrics: payload_metrics,
        seq: Some(0),
    };
    (payload, aliases)
}

/// Builds an NDATA/DDATA payload for a single sample, referencing its
/// metric by alias only, per §4.2 ("NDATA/DDATA reference metrics by alias
/// only").
pub fn encode_data(seq: u8, alias: u64, sample: &Sample, datatype: DataType) -> Payload {
    let mut metric = Metric {
        name: None,
        alias: Some(alias),
        timestamp: Some(sample.timestamp_ms as u64),
        datatype: datatype as u32,
        is_null: None,
        int_value: None,
        double_value: None,
        string_value: None,
    };
    if sample.quality != Quality::GOOD {
        metric.is_null = Some(true);
    }
    match datatype {
        DataType::Float | DataType::Double => metric.double_value = Some(sample.value),
        DataType::Boolean => metric.int_value = Some(if sample.value != 0.0 { 1 } else { 0 }),
        _ => metric.int_value = Some(sample.value as u64),
    }
    Payload {
        timestamp: Some(sample.timestamp_ms as u64),
        metrics: vec![metric],
        seq: Some(seq as u64),
    }
}

/// Extracts a metric's scalar value as `f64`, regardless of which union
/// field carries it.
fn metric_value(metric: &Metric) -> f64 {
    if let Some(v) = metric.double_value {
        return v;
    }
    if let Some(v) = metric.int_value {
        return v as f64;
    }
    0.0
}

/// Decodes an NDATA/DDATA payload into [`Sample`]s, resolving each metric's
/// alias against `node`'s (or, for a device frame, `device`'s) alias table.
///
/// Enforces seq continuity per §4.2: on a gap, returns
/// [`SparkplugError::SequenceGap`] without mutating `node`'s alias table —
/// the caller is responsible for marking the node LOST and requesting a
/// rebirth. An unresolvable alias yields
/// [`SparkplugError::UnknownAlias`] for that call; the whole frame is
/// dropped, not partially queued (§4.2, §4.6).
pub fn decode(
    group_id: &str,
    node_id: &str,
    node: &mut NodeState,
    device: Option<&mut DeviceState>,
    payload: &Payload,
) -> Result<Vec<Sample>, SparkplugError> {
    let seq = payload.seq.unwrap_or(0) as u8;
    let accepted = match &device {
        Some(device_state) => {
            let expected = device_state.last_seq.map(|s| s.wrapping_add(1)).unwrap_or(seq);
            device_state.last_seq.is_none() || seq == expected
        }
        None => node.accept_seq(seq),
    };
    if !accepted {
        let expected = node.last_seq.map(|s| s.wrapping_add(1)).unwrap_or(seq);
        return Err(SparkplugError::SequenceGap {
            group_id: group_id.to_string(),
            node_id: node_id.to_string(),
            expected,
            actual: seq,
        });
    }
    let alias_table = match device {
        Some(device_state) => {
            device_state.last_seq = Some(seq);
            &device_state.alias_table
        }
        None => &node.alias_table,
    };

    let mut samples = Vec::with_capacity(payload.metrics.len());
    for metric in &payload.metrics {
        let alias = metric.alias.ok_or_else(|| SparkplugError::UnknownAlias {
            group_id: group_id.to_string(),
            node_id: node_id.to_string(),
            alias: 0,
        })?;
        let descriptor = alias_table.get(&alias).ok_or(SparkplugError::UnknownAlias {
            group_id: group_id.to_string(),
            node_id: node_id.to_string(),
            alias,
        })?;
        let quality = if metric.is_null.unwrap_or(false) { Quality::BAD } else { Quality::GOOD };
        let timestamp_ms = metric.timestamp.unwrap_or(payload.timestamp.unwrap_or(0)) as i64;
        samples.push(Sample::new(timestamp_ms, descriptor.name.clone(), metric_value(metric), quality));
    }
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn birth_assigns_aliases_in_declaration_order() {
        let (_, aliases) = encode_birth(0, &[("Temp".into(), DataType::Double), ("Run".into(), DataType::Boolean)]);
        assert_eq!(aliases[&0].name, "Temp");
        assert_eq!(aliases[&1].name, "Run");
    }

    #[test]
    fn decode_resolves_alias_against_node_table() {
        let mut node = NodeState::new("Plant1", "Line1");
        let (_, aliases) = encode_birth(0, &[("Good".into(), DataType::UInt32)]);
        node.on_nbirth(1, 0, aliases);

        let payload = encode_data(1, 0, &Sample::new(1_000, "Good", 110.0, Quality::GOOD), DataType::UInt32);
        let samples = decode("Plant1", "Line1", &mut node, None, &payload).unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].source_address, "Good");
        assert_eq!(samples[0].value, 110.0);
    }

    #[test]
    fn decode_rejects_sequence_gap_without_mutating_state() {
        let mut node = NodeState::new("Plant1", "Line1");
        let (_, aliases) = encode_birth(0, &[("Good".into(), DataType::UInt32)]);
        node.on_nbirth(1, 0, aliases);

        let gapped = Payload { timestamp: Some(0), metrics: vec![], seq: Some(3) };
        let err = decode("Plant1", "Line1", &mut node, None, &gapped).unwrap_err();
        assert!(matches!(err, SparkplugError::SequenceGap { expected: 1, actual: 3, .. }));
        assert_eq!(node.last_seq, Some(0));
    }

    #[test]
    fn decode_rejects_unknown_alias() {
        let mut node = NodeState::new("Plant1", "Line1");
        node.on_nbirth(1, 0, HashMap::new());
        let payload = encode_data(1, 99, &Sample::new(0, "ns", 1.0, Quality::GOOD), DataType::UInt32);
        let err = decode("Plant1", "Line1", &mut node, None, &payload).unwrap_err();
        assert!(matches!(err, SparkplugError::UnknownAlias { alias: 99, .. }));
    }
}
