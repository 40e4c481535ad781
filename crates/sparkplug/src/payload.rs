//! Hand-derived protobuf types for the Sparkplug B `Payload` message, per
//! the Eclipse Tahu `sparkplug_b.proto` schema referenced by §6.
//!
//! These mirror the wire schema exactly (field numbers included) so that
//! `prost` encodes/decodes byte-compatibly with any other Sparkplug B
//! implementation, without depending on a `build.rs`/`protoc` step.

use prost::Message;

/// Sparkplug metric datatypes (`DataType` in the Tahu schema), restricted to
/// the subset §6 lists as supported: Int8/16/32/64, UInt variants, Float,
/// Double, Boolean, String, DateTime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum DataType {
    /// 8-bit signed integer.
    Int8 = 1,
    /// 16-bit signed integer.
    Int16 = 2,
    /// 32-bit signed integer.
    Int32 = 3,
    /// 64-bit signed integer.
    Int64 = 4,
    /// 8-bit unsigned integer.
    UInt8 = 5,
    /// 16-bit unsigned integer.
    UInt16 = 6,
    /// 32-bit unsigned integer.
    UInt32 = 7,
    /// 64-bit unsigned integer.
    UInt64 = 8,
    /// IEEE-754 single precision.
    Float = 9,
    /// IEEE-754 double precision.
    Double = 10,
    /// Boolean.
    Boolean = 11,
    /// UTF-8 string.
    String = 12,
    /// Milliseconds since the Unix epoch.
    DateTime = 13,
}

impl DataType {
    /// Converts a raw wire ordinal into a known [`DataType`], if recognized.
    pub fn from_u32(value: u32) -> Option<Self> {
        Some(match value {
            1 => DataType::Int8,
            2 => DataType::Int16,
            3 => DataType::Int32,
            4 => DataType::Int64,
            5 => DataType::UInt8,
            6 => DataType::UInt16,
            7 => DataType::UInt32,
            8 => DataType::UInt64,
            9 => DataType::Float,
            10 => DataType::Double,
            11 => DataType::Boolean,
            12 => DataType::String,
            13 => DataType::DateTime,
            _ => return None,
        })
    }
}

/// A single metric within a [`Payload`], field-compatible with Tahu's
/// `Payload.Metric`.
#[derive(Clone, PartialEq, Message)]
pub struct Metric {
    /// Metric name. Present on birth frames; omitted on data frames that
    /// address the metric by alias only.
    #[prost(string, optional, tag = "1")]
    pub name: Option<String>,
    /// Metric alias, assigned by the birth frame and referenced by
    /// subsequent data frames.
    #[prost(uint64, optional, tag = "2")]
    pub alias: Option<u64>,
    /// Milliseconds since the Unix epoch this metric value was captured.
    #[prost(uint64, optional, tag = "3")]
    pub timestamp: Option<u64>,
    /// Wire ordinal of the metric's [`DataType`].
    #[prost(uint32, tag = "4")]
    pub datatype: u32,
    /// Set when the metric's value is not currently known/valid; absence
    /// means `GOOD` quality, per Tahu convention.
    #[prost(bool, optional, tag = "5")]
    pub is_null: Option<bool>,
    /// Integer-valued payload, used for Int8/16/32, UInt8/16/32, Boolean
    /// (as 0/1), and DateTime.
    #[prost(uint64, optional, tag = "6")]
    pub int_value: Option<u64>,
    /// Floating-point payload, used for Float and Double.
    #[prost(double, optional, tag = "7")]
    pub double_value: Option<f64>,
    /// String payload.
    #[prost(string, optional, tag = "8")]
    pub string_value: Option<String>,
}

/// The top-level Sparkplug B frame body, field-compatible with Tahu's
/// `Payload` message.
#[derive(Clone, PartialEq, Message)]
pub struct Payload {
    /// Milliseconds since the Unix epoch this frame was constructed.
    #[prost(uint64, optional, tag = "1")]
    pub timestamp: Option<u64>,
    /// The metrics carried by this frame.
    #[prost(message, repeated, tag = "2")]
    pub metrics: Vec<Metric>,
    /// Sequence number, `[0, 255]`, incrementing mod 256; reset to 0 by
    /// NBIRTH/DBIRTH.
    #[prost(uint64, optional, tag = "3")]
    pub seq: Option<u64>,
}

/// The well-known metric name Sparkplug B uses to carry `bd_seq` within an
/// NBIRTH's metric list (there is no dedicated `Payload` field for it).
pub const BD_SEQ_METRIC_NAME: &str = "bdSeq";

/// NCMD/DCMD metric name for the `Device Control/Acknowledge Fault` command,
/// per §6.
pub const ACK_FAULT_METRIC_NAME: &str = "Device Control/Acknowledge Fault";
/// NCMD/DCMD metric name for the `Device Control/Resolve Fault` command,
/// per §6.
pub const RESOLVE_FAULT_METRIC_NAME: &str = "Device Control/Resolve Fault";
/// Companion string metric carrying the target asset reference an
/// `ACK_FAULT_METRIC_NAME`/`RESOLVE_FAULT_METRIC_NAME` command applies to.
pub const ASSET_REF_METRIC_NAME: &str = "asset_ref";
/// Companion string metric carrying the fault code an
/// `ACK_FAULT_METRIC_NAME`/`RESOLVE_FAULT_METRIC_NAME` command applies to.
pub const FAULT_CODE_METRIC_NAME: &str = "fault_code";
