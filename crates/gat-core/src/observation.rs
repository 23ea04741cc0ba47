use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{GatError, GatResult};

/// End of a power line a flow/voltage measurement refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineSide {
    Origin,
    Extremity,
}

impl LineSide {
    pub const ALL: [LineSide; 2] = [LineSide::Origin, LineSide::Extremity];

    pub fn as_str(&self) -> &'static str {
        match self {
            LineSide::Origin => "or",
            LineSide::Extremity => "ex",
        }
    }
}

/// Per-side line quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowQuantity {
    /// Active power (MW)
    Active,
    /// Reactive power (MVAr)
    Reactive,
    /// Current magnitude (A)
    Current,
    /// Voltage magnitude (kV)
    Voltage,
}

impl FlowQuantity {
    pub const ALL: [FlowQuantity; 4] = [
        FlowQuantity::Active,
        FlowQuantity::Reactive,
        FlowQuantity::Current,
        FlowQuantity::Voltage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FlowQuantity::Active => "active",
            FlowQuantity::Reactive => "reactive",
            FlowQuantity::Current => "current",
            FlowQuantity::Voltage => "voltage",
        }
    }
}

/// Full measured grid state at one timestep.
///
/// Vectors are positional: entry `i` of `load_p` is the load named
/// `load_names[i]` in the owning episode, and likewise for generators and
/// lines. `topo_vect` holds one bus assignment per connectable element
/// (`1`/`2` for a bus, `0` or negative when disconnected).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour_of_day: u32,
    pub minute_of_hour: u32,

    pub load_p: Vec<f32>,
    pub prod_p: Vec<f32>,
    pub rho: Vec<f32>,
    pub topo_vect: Vec<i32>,

    pub p_or: Vec<f32>,
    pub q_or: Vec<f32>,
    pub a_or: Vec<f32>,
    pub v_or: Vec<f32>,
    pub p_ex: Vec<f32>,
    pub q_ex: Vec<f32>,
    pub a_ex: Vec<f32>,
    pub v_ex: Vec<f32>,
}

impl Observation {
    /// Wall-clock time of the snapshot, minute resolution.
    pub fn timestamp(&self, timestep: usize) -> GatResult<NaiveDateTime> {
        let invalid = |reason: String| GatError::InvalidTimestamp { timestep, reason };
        let date = NaiveDate::from_ymd_opt(self.year, self.month, self.day).ok_or_else(|| {
            invalid(format!(
                "{:04}-{:02}-{:02} is not a calendar date",
                self.year, self.month, self.day
            ))
        })?;
        date.and_hms_opt(self.hour_of_day, self.minute_of_hour, 0)
            .ok_or_else(|| {
                invalid(format!(
                    "{:02}:{:02} is not a time of day",
                    self.hour_of_day, self.minute_of_hour
                ))
            })
    }

    pub fn line_quantity(&self, side: LineSide, quantity: FlowQuantity) -> &[f32] {
        match (side, quantity) {
            (LineSide::Origin, FlowQuantity::Active) => &self.p_or,
            (LineSide::Origin, FlowQuantity::Reactive) => &self.q_or,
            (LineSide::Origin, FlowQuantity::Current) => &self.a_or,
            (LineSide::Origin, FlowQuantity::Voltage) => &self.v_or,
            (LineSide::Extremity, FlowQuantity::Active) => &self.p_ex,
            (LineSide::Extremity, FlowQuantity::Reactive) => &self.q_ex,
            (LineSide::Extremity, FlowQuantity::Current) => &self.a_ex,
            (LineSide::Extremity, FlowQuantity::Voltage) => &self.v_ex,
        }
    }
}
