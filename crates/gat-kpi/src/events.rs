//! Hazard and maintenance tables from the sparse environment event list.
//!
//! Timesteps without an event contribute no rows. A timestep with an event
//! contributes one row per line to both tables, and both tables share one
//! key list built once.

use chrono::NaiveDateTime;
use gat_core::{EnvEvent, GatError, GatResult};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventKey {
    pub timestep: usize,
    pub timestamp: NaiveDateTime,
    pub line_id: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvEventRecord<'a> {
    pub timestep: usize,
    pub timestamp: NaiveDateTime,
    pub line_id: usize,
    pub line_name: &'a str,
    pub value: bool,
}

#[derive(Debug, Clone, Default)]
pub struct EnvEventTables {
    line_names: Vec<String>,
    keys: Vec<EventKey>,
    hazards: Vec<bool>,
    maintenances: Vec<bool>,
}

/// Read-only view of one of the two event tables.
#[derive(Debug, Clone, Copy)]
pub struct EventTableView<'a> {
    line_names: &'a [String],
    keys: &'a [EventKey],
    values: &'a [bool],
}

impl EnvEventTables {
    pub fn hazards(&self) -> EventTableView<'_> {
        self.view(&self.hazards)
    }

    pub fn maintenances(&self) -> EventTableView<'_> {
        self.view(&self.maintenances)
    }

    pub fn keys(&self) -> &[EventKey] {
        &self.keys
    }

    fn view<'a>(&'a self, values: &'a [bool]) -> EventTableView<'a> {
        EventTableView {
            line_names: &self.line_names,
            keys: &self.keys,
            values,
        }
    }
}

impl<'a> EventTableView<'a> {
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = EnvEventRecord<'a>> + 'a {
        let line_names = self.line_names;
        let keys = self.keys;
        keys.iter()
            .zip(self.values)
            .map(move |(key, &value)| EnvEventRecord {
                timestep: key.timestep,
                timestamp: key.timestamp,
                line_id: key.line_id,
                line_name: line_names[key.line_id].as_str(),
                value,
            })
    }

    pub fn values(&self) -> &'a [bool] {
        self.values
    }

    /// Value for `(timestep, line_id)`; `None` when that timestep recorded no event.
    pub fn get(&self, timestep: usize, line_id: usize) -> Option<bool> {
        let idx = self
            .keys
            .binary_search_by(|key| (key.timestep, key.line_id).cmp(&(timestep, line_id)))
            .ok()?;
        self.values.get(idx).copied()
    }

    /// Number of `true` cells.
    pub fn count_active(&self) -> usize {
        self.values.iter().filter(|&&active| active).count()
    }
}

/// Flatten the environment events of the first `played` timesteps.
///
/// `timestamps[t]` is reused as the timestamp of timestep `t`, so event
/// rows join with the other tables on `(timestep, timestamp)`.
pub fn extract_env_events(
    env_actions: &[Option<EnvEvent>],
    timestamps: &[NaiveDateTime],
    line_names: &[String],
    played: usize,
) -> GatResult<EnvEventTables> {
    let n_lines = line_names.len();
    let horizon = played.min(env_actions.len());
    if env_actions.len() > horizon {
        debug!(
            skipped = env_actions.len() - horizon,
            "ignoring environment events past the played horizon"
        );
    }
    let recorded = env_actions[..horizon].iter().flatten().count();
    let capacity = recorded * n_lines;

    let mut tables = EnvEventTables {
        line_names: line_names.to_vec(),
        keys: Vec::with_capacity(capacity),
        hazards: Vec::with_capacity(capacity),
        maintenances: Vec::with_capacity(capacity),
    };

    for (timestep, event) in env_actions[..horizon].iter().enumerate() {
        let Some(event) = event else {
            continue;
        };
        let timestamp = *timestamps.get(timestep).ok_or_else(|| {
            GatError::inconsistency(format!("no timestamp for event at timestep {timestep}"))
        })?;
        for (field, found) in [
            ("hazards", event.hazards.len()),
            ("maintenance", event.maintenance.len()),
        ] {
            if found != n_lines {
                return Err(GatError::inconsistency(format!(
                    "{field} has {found} value(s) at timestep {timestep}, expected {n_lines}"
                )));
            }
        }
        tables.keys.extend((0..n_lines).map(|line_id| EventKey {
            timestep,
            timestamp,
            line_id,
        }));
        tables.hazards.extend_from_slice(&event.hazards);
        tables.maintenances.extend_from_slice(&event.maintenance);
    }

    Ok(tables)
}
