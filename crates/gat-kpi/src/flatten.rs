//! Long-format reshaping of per-timestep equipment vectors.
//!
//! A signal of cardinality `n` observed over `T` timesteps becomes `T × n`
//! rows ordered by `(timestep, equipment_id)`. Rows for one timestep are
//! contiguous, so `(timestep, equipment_id)` lookups are index arithmetic.

use chrono::NaiveDateTime;
use gat_core::{FlowQuantity, GatError, GatResult, LineSide, Observation};

/// Scalar per-equipment signals carried by an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Load active power, one value per load
    Load,
    /// Generation active power, one value per generator
    Production,
    /// Line loading ratio, one value per line
    Rho,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Load => "load_p",
            Signal::Production => "prod_p",
            Signal::Rho => "rho",
        }
    }

    pub fn values<'o>(&self, obs: &'o Observation) -> &'o [f32] {
        match self {
            Signal::Load => &obs.load_p,
            Signal::Production => &obs.prod_p,
            Signal::Rho => &obs.rho,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LongFormatRecord {
    pub timestep: usize,
    pub timestamp: NaiveDateTime,
    pub equipment_id: usize,
    pub equipment_name: String,
    pub value: f64,
}

/// Long-format table for one signal.
#[derive(Debug, Clone)]
pub struct LongFormatTable {
    signal: &'static str,
    names: Vec<String>,
    rows: Vec<LongFormatRecord>,
}

impl LongFormatTable {
    /// Empty table sized for `size` timesteps of `names.len()` values.
    pub fn with_capacity(signal: &'static str, names: &[String], size: usize) -> Self {
        Self {
            signal,
            names: names.to_vec(),
            rows: Vec::with_capacity(size * names.len()),
        }
    }

    /// Append the rows of the next timestep.
    ///
    /// Values are widened to `f64` whatever their source type. Timesteps must
    /// be pushed in order.
    pub fn push_timestep<T>(
        &mut self,
        timestep: usize,
        timestamp: NaiveDateTime,
        values: &[T],
    ) -> GatResult<()>
    where
        T: Copy + Into<f64>,
    {
        check_cardinality(self.signal, timestep, values.len(), self.names.len())?;
        let expected = self.rows.len() / self.names.len().max(1);
        if !self.names.is_empty() && timestep != expected {
            return Err(GatError::inconsistency(format!(
                "{} rows pushed for timestep {timestep}, expected timestep {expected}",
                self.signal
            )));
        }
        self.rows.extend(
            values
                .iter()
                .zip(&self.names)
                .enumerate()
                .map(|(equipment_id, (&value, name))| LongFormatRecord {
                    timestep,
                    timestamp,
                    equipment_id,
                    equipment_name: name.clone(),
                    value: value.into(),
                }),
        );
        Ok(())
    }

    pub fn signal(&self) -> &'static str {
        self.signal
    }

    pub fn cardinality(&self) -> usize {
        self.names.len()
    }

    pub fn equipment_names(&self) -> &[String] {
        &self.names
    }

    pub fn rows(&self) -> &[LongFormatRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, timestep: usize, equipment_id: usize) -> Option<&LongFormatRecord> {
        if equipment_id >= self.names.len() {
            return None;
        }
        self.rows.get(timestep * self.names.len() + equipment_id)
    }

    pub fn value(&self, timestep: usize, equipment_id: usize) -> Option<f64> {
        self.get(timestep, equipment_id).map(|row| row.value)
    }

    /// All rows of one timestep.
    pub fn timestep(&self, timestep: usize) -> &[LongFormatRecord] {
        let n = self.names.len();
        let start = (timestep * n).min(self.rows.len());
        let end = (start + n).min(self.rows.len());
        &self.rows[start..end]
    }
}

/// Flatten a complete series of per-timestep vectors in one call.
///
/// Timestep `t` is the position of the vector in `series`.
pub fn flatten<'a, T, I>(signal: &'static str, series: I, names: &[String]) -> GatResult<LongFormatTable>
where
    T: Copy + Into<f64> + 'a,
    I: IntoIterator<Item = (NaiveDateTime, &'a [T])>,
{
    let series = series.into_iter();
    let mut table = LongFormatTable::with_capacity(signal, names, series.size_hint().0);
    for (timestep, (timestamp, values)) in series.enumerate() {
        table.push_timestep(timestep, timestamp, values)?;
    }
    Ok(table)
}

/// Composite key of a flow/voltage measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlowVoltageKey {
    pub side: LineSide,
    pub quantity: FlowQuantity,
    pub line_id: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlowVoltageRecord {
    pub timestep: usize,
    pub timestamp: NaiveDateTime,
    pub key: FlowVoltageKey,
    pub line_name: String,
    pub value: f64,
}

/// Long-format table of the eight per-side line quantities.
///
/// Rows of a timestep are ordered by side, then quantity, then line, in the
/// order of [`LineSide::ALL`] and [`FlowQuantity::ALL`].
#[derive(Debug, Clone)]
pub struct FlowVoltageTable {
    line_names: Vec<String>,
    rows: Vec<FlowVoltageRecord>,
}

const QUANTITIES_PER_LINE: usize = LineSide::ALL.len() * FlowQuantity::ALL.len();

impl FlowVoltageTable {
    pub fn with_capacity(line_names: &[String], size: usize) -> Self {
        Self {
            line_names: line_names.to_vec(),
            rows: Vec::with_capacity(size * QUANTITIES_PER_LINE * line_names.len()),
        }
    }

    pub fn push_observation(
        &mut self,
        timestep: usize,
        timestamp: NaiveDateTime,
        obs: &Observation,
    ) -> GatResult<()> {
        let n_lines = self.line_names.len();
        for side in LineSide::ALL {
            for quantity in FlowQuantity::ALL {
                let values = obs.line_quantity(side, quantity);
                check_cardinality(quantity.as_str(), timestep, values.len(), n_lines)?;
                self.rows.extend(values.iter().zip(&self.line_names).enumerate().map(
                    |(line_id, (&value, name))| FlowVoltageRecord {
                        timestep,
                        timestamp,
                        key: FlowVoltageKey {
                            side,
                            quantity,
                            line_id,
                        },
                        line_name: name.clone(),
                        value: f64::from(value),
                    },
                ));
            }
        }
        Ok(())
    }

    pub fn rows(&self) -> &[FlowVoltageRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, timestep: usize, key: FlowVoltageKey) -> Option<&FlowVoltageRecord> {
        let n_lines = self.line_names.len();
        if key.line_id >= n_lines {
            return None;
        }
        let side = LineSide::ALL.iter().position(|s| *s == key.side)?;
        let quantity = FlowQuantity::ALL.iter().position(|q| *q == key.quantity)?;
        let offset = (side * FlowQuantity::ALL.len() + quantity) * n_lines + key.line_id;
        self.rows
            .get(timestep * QUANTITIES_PER_LINE * n_lines + offset)
    }

    /// Rows matching every key part that is given.
    pub fn select(
        &self,
        side: Option<LineSide>,
        quantity: Option<FlowQuantity>,
        line_id: Option<usize>,
    ) -> impl Iterator<Item = &FlowVoltageRecord> {
        self.rows.iter().filter(move |row| {
            side.map_or(true, |s| row.key.side == s)
                && quantity.map_or(true, |q| row.key.quantity == q)
                && line_id.map_or(true, |l| row.key.line_id == l)
        })
    }
}

fn check_cardinality(signal: &str, timestep: usize, found: usize, expected: usize) -> GatResult<()> {
    if found != expected {
        return Err(GatError::inconsistency(format!(
            "{signal} has {found} value(s) at timestep {timestep}, expected {expected}"
        )));
    }
    Ok(())
}
