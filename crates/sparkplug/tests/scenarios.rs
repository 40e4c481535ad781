//! Cross-component Sparkplug scenarios from spec.md §8.

use oee_domain::{NodeState, Quality, Sample};
use oee_sparkplug::{decode, encode_birth, encode_data, DataType, SparkplugError};

/// S1 (happy path): one declared counter, two samples after NBIRTH, decoded
/// back out with their original timestamps and values.
#[test]
fn s1_happy_path_round_trips_two_samples_after_birth() {
    let mut node = NodeState::new("Plant1", "M1");
    let (_, aliases) = encode_birth(0, &[("ns=2;s=Good".into(), DataType::UInt32)]);
    node.on_nbirth(0, 0, aliases);

    let first = encode_data(1, 0, &Sample::new(0, "ns=2;s=Good", 100.0, Quality::GOOD), DataType::UInt32);
    let second = encode_data(2, 0, &Sample::new(1_000, "ns=2;s=Good", 110.0, Quality::GOOD), DataType::UInt32);

    let decoded_first = decode("Plant1", "M1", &mut node, None, &first).unwrap();
    let decoded_second = decode("Plant1", "M1", &mut node, None, &second).unwrap();

    assert_eq!(decoded_first.len(), 1);
    assert_eq!(decoded_first[0].timestamp_ms, 0);
    assert_eq!(decoded_first[0].value, 100.0);
    assert_eq!(decoded_second.len(), 1);
    assert_eq!(decoded_second[0].timestamp_ms, 1_000);
    assert_eq!(decoded_second[0].value, 110.0);
}

/// S2 (sequence gap): a gapped frame is rejected and the node's alias table
/// is untouched, so the caller can rebirth and repopulate it from scratch —
/// the gapped frame itself never reaches the sink.
#[test]
fn s2_sequence_gap_rejects_the_frame_and_preserves_prior_state() {
    let mut node = NodeState::new("Plant1", "M1");
    let (_, aliases) = encode_birth(0, &[("ns=2;s=Good".into(), DataType::UInt32)]);
    node.on_nbirth(0, 0, aliases.clone());

    let accepted = encode_data(1, 0, &Sample::new(0, "ns=2;s=Good", 100.0, Quality::GOOD), DataType::UInt32);
    assert!(decode("Plant1", "M1", &mut node, None, &accepted).is_ok());

    // seq jumps from 1 to 3, skipping 2.
    let gapped = encode_data(3, 0, &Sample::new(2_000, "ns=2;s=Good", 120.0, Quality::GOOD), DataType::UInt32);
    let error = decode("Plant1", "M1", &mut node, None, &gapped).unwrap_err();
    assert!(matches!(error, SparkplugError::SequenceGap { expected: 2, actual: 3, .. }));

    // The alias table is exactly what on_nbirth set; the gap didn't touch it.
    assert_eq!(node.alias_table, aliases);

    // A fresh NBIRTH (simulating the rebirth the decoder would request)
    // clears and repopulates the alias table, after which data resumes.
    let (_, rebirth_aliases) = encode_birth(3_000, &[("ns=2;s=Good".into(), DataType::UInt32)]);
    node.on_nbirth(1, 0, rebirth_aliases);
    let resumed = encode_data(1, 0, &Sample::new(3_000, "ns=2;s=Good", 130.0, Quality::GOOD), DataType::UInt32);
    let decoded = decode("Plant1", "M1", &mut node, None, &resumed).unwrap();
    assert_eq!(decoded[0].value, 130.0);
}
