//! The closed vocabulary of tag signal types.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// The closed set of signal kinds a Tag Binding can be mapped to.
///
/// This is a closed enum rather than a string so that components which must
/// special-case certain kinds (the Backpressure Controller suppressing
/// `Temperature`/`Vibration`, the Normalizer bypassing deadband for
/// `State*`/`Counter*`/`Fault*`) can match exhaustively instead of comparing
/// strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    /// `counter.total`
    CounterTotal,
    /// `counter.good`
    CounterGood,
    /// `counter.scrap`
    CounterScrap,
    /// `cycle.time_actual`
    CycleTimeActual,
    /// `cycle.time_ideal`
    CycleTimeIdeal,
    /// `state.run`
    StateRun,
    /// `state.idle`
    StateIdle,
    /// `state.down`
    StateDown,
    /// `fault.code`
    FaultCode,
    /// `fault.active`
    FaultActive,
    /// `rate.instant`
    RateInstant,
    /// `temperature`
    Temperature,
    /// `pressure`
    Pressure,
    /// `vibration`
    Vibration,
    /// `state.backpressure` — synthetic signal emitted by the Backpressure
    /// Controller on every state transition (not part of the PLC-facing
    /// vocabulary, but carried through the same Normalized Metric channel).
    StateBackpressure,
    /// `rollup.oee` — synthetic signal emitted by the OEE Calculator on
    /// every window tick.
    RollupOee,
}

impl SignalType {
    /// Returns the wire/config name of this signal type, e.g. `counter.total`.
    pub fn as_str(self) -> &'static str {
        match self {
            SignalType::CounterTotal => "counter.total",
            SignalType::CounterGood => "counter.good",
            SignalType::CounterScrap => "counter.scrap",
            SignalType::CycleTimeActual => "cycle.time_actual",
            SignalType::CycleTimeIdeal => "cycle.time_ideal",
            SignalType::StateRun => "state.run",
            SignalType::StateIdle => "state.idle",
            SignalType::StateDown => "state.down",
            SignalType::FaultCode => "fault.code",
            SignalType::FaultActive => "fault.active",
            SignalType::RateInstant => "rate.instant",
            SignalType::Temperature => "temperature",
            SignalType::Pressure => "pressure",
            SignalType::Vibration => "vibration",
            SignalType::StateBackpressure => "state.backpressure",
            SignalType::RollupOee => "rollup.oee",
        }
    }

    /// Signal types that the Normalizer MUST NOT deadband-suppress (state,
    /// counter, and fault signals), per §4.7.
    pub fn bypasses_deadband(self) -> bool {
        matches!(
            self,
            SignalType::CounterTotal
                | SignalType::CounterGood
                | SignalType::CounterScrap
                | SignalType::StateRun
                | SignalType::StateIdle
                | SignalType::StateDown
                | SignalType::FaultCode
                | SignalType::FaultActive
        )
    }

    /// Low-priority signal types the Backpressure Controller suppresses in
    /// the critical regime, per §4.5.
    pub fn is_low_priority(self) -> bool {
        matches!(self, SignalType::Temperature | SignalType::Vibration)
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unrecognized signal type string.
#[derive(Debug, thiserror::Error)]
#[error("unknown signal type: {0}")]
pub struct UnknownSignalType(pub String);

impl FromStr for SignalType {
    type Err = UnknownSignalType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "counter.total" => SignalType::CounterTotal,
            "counter.good" => SignalType::CounterGood,
            "counter.scrap" => SignalType::CounterScrap,
            "cycle.time_actual" => SignalType::CycleTimeActual,
            "cycle.time_ideal" => SignalType::CycleTimeIdeal,
            "state.run" => SignalType::StateRun,
            "state.idle" => SignalType::StateIdle,
            "state.down" => SignalType::StateDown,
            "fault.code" => SignalType::FaultCode,
            "fault.active" => SignalType::FaultActive,
            "rate.instant" => SignalType::RateInstant,
            "temperature" => SignalType::Temperature,
            "pressure" => SignalType::Pressure,
            "vibration" => SignalType::Vibration,
            "state.backpressure" => SignalType::StateBackpressure,
            "rollup.oee" => SignalType::RollupOee,
            other => return Err(UnknownSignalType(other.to_string())),
        })
    }
}
