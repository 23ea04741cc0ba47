//! One-pass construction of the episode table set.
//!
//! **Algorithm:**
//! 1. Validate the episode shape ([`Episode::validate`]).
//! 2. Walk `(observation[t], action[t])` for `t` in `0..size` once: derive
//!    the timestamp, append load/production/rho/flow-voltage rows, resolve
//!    the action impact, accumulate the reward and compute the topology
//!    distance.
//! 3. Walk the sparse environment events, reusing the timestamps of step 2.
//!
//! Every output table is pre-sized from `size × cardinality` before the pass.

use std::time::Instant;

use chrono::NaiveDateTime;
use gat_core::{Action, Diagnostics, Episode, GatError, GatResult};
use tracing::{debug, info, warn};

use crate::config::KpiConfig;
use crate::events::{extract_env_events, EnvEventTables, EventTableView};
use crate::flatten::{FlowVoltageTable, LongFormatTable, Signal};
use crate::impact::ActionImpactResolver;
use crate::metrics::topology_distance;
use crate::reward::{RewardAccumulator, RewardRow};

#[derive(Debug, Clone, PartialEq)]
pub struct ActionSummaryRow {
    pub timestep: usize,
    pub timestamp: NaiveDateTime,
    pub timestep_reward: f64,
    pub action_line: usize,
    pub action_subs: usize,
    pub line_name: Option<String>,
    pub sub_name: Option<String>,
    pub action_id: Option<u32>,
    /// Topology-vector entries off the reference bus
    pub distance: usize,
    pub lines_modified: Vec<String>,
    pub subs_modified: Vec<String>,
}

/// The eight analytics tables of one episode.
#[derive(Debug, Clone)]
pub struct EpisodeTables {
    pub load: LongFormatTable,
    pub production: LongFormatTable,
    pub rho: LongFormatTable,
    pub action_summary: Vec<ActionSummaryRow>,
    pub reward: Vec<RewardRow>,
    pub flow_voltage: FlowVoltageTable,
    pub env_events: EnvEventTables,
    /// One timestamp per timestep, in timestep order
    pub timestamps: Vec<NaiveDateTime>,
    /// Distinct actions; `distinct_actions[id]` is the action with `action_id == id`
    pub distinct_actions: Vec<Action>,
    pub diagnostics: Diagnostics,
}

impl EpisodeTables {
    pub fn size(&self) -> usize {
        self.timestamps.len()
    }

    pub fn timesteps(&self) -> Vec<usize> {
        (0..self.size()).collect()
    }

    pub fn hazards(&self) -> EventTableView<'_> {
        self.env_events.hazards()
    }

    pub fn maintenances(&self) -> EventTableView<'_> {
        self.env_events.maintenances()
    }

    pub fn nb_hazards(&self) -> usize {
        self.hazards().count_active()
    }

    pub fn nb_maintenances(&self) -> usize {
        self.maintenances().count_active()
    }
}

pub struct EpisodeTableBuilder<'e> {
    episode: &'e Episode,
    config: &'e KpiConfig,
}

impl<'e> EpisodeTableBuilder<'e> {
    pub fn new(episode: &'e Episode, config: &'e KpiConfig) -> Self {
        Self { episode, config }
    }

    pub fn build(self) -> GatResult<EpisodeTables> {
        let start = Instant::now();
        let episode = self.episode;
        episode.validate()?;

        let size = episode.size();
        let names = &episode.names;
        info!(
            size,
            loads = names.n_loads(),
            prods = names.n_prods(),
            lines = names.n_lines(),
            "building episode tables"
        );

        let mut load = LongFormatTable::with_capacity(Signal::Load.as_str(), &names.load_names, size);
        let mut production =
            LongFormatTable::with_capacity(Signal::Production.as_str(), &names.prod_names, size);
        let mut rho = LongFormatTable::with_capacity(Signal::Rho.as_str(), &names.line_names, size);
        let mut flow_voltage = FlowVoltageTable::with_capacity(&names.line_names, size);
        let mut action_summary = Vec::with_capacity(size);
        let mut rewards = RewardAccumulator::with_capacity(size);
        let mut timestamps = Vec::with_capacity(size);
        let mut resolver = ActionImpactResolver::new(names, self.config.separator.as_str());
        let mut diagnostics = Diagnostics::new();

        let steps = episode.observations.iter().zip(&episode.actions).enumerate();
        for (timestep, (obs, action)) in steps {
            let timestamp = obs.timestamp(timestep)?;
            timestamps.push(timestamp);

            load.push_timestep(timestep, timestamp, Signal::Load.values(obs))?;
            production.push_timestep(timestep, timestamp, Signal::Production.values(obs))?;
            rho.push_timestep(timestep, timestamp, Signal::Rho.values(obs))?;
            flow_voltage.push_observation(timestep, timestamp, obs)?;

            let resolved = resolver.resolve(action)?;
            for issue in &resolved.issues {
                record_issue(&mut diagnostics, timestep, issue);
            }

            let reward = rewards.push(timestamp, episode.rewards[timestep]);
            action_summary.push(ActionSummaryRow {
                timestep,
                timestamp,
                timestep_reward: reward.reward,
                action_line: resolved.impact.action_line,
                action_subs: resolved.impact.action_subs,
                line_name: resolved.impact.line_name,
                sub_name: resolved.impact.sub_name,
                action_id: resolved.impact.action_id,
                distance: topology_distance(&obs.topo_vect, self.config.reference_bus),
                lines_modified: resolved.lines_modified,
                subs_modified: resolved.subs_modified,
            });
        }
        debug!(rows = load.len() + production.len() + rho.len(), "environment pass complete");

        let env_events = extract_env_events(
            &episode.env_actions,
            &timestamps,
            &names.line_names,
            episode.meta.nb_timestep_played,
        )?;
        debug!(rows = env_events.keys().len(), "hazards/maintenances pass complete");

        let distinct_actions = resolver.into_distinct_actions();
        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            distinct_actions = distinct_actions.len(),
            diagnostics = %diagnostics.summary(),
            "episode tables built"
        );

        Ok(EpisodeTables {
            load,
            production,
            rho,
            action_summary,
            reward: rewards.finish(),
            flow_voltage,
            env_events,
            timestamps,
            distinct_actions,
            diagnostics,
        })
    }
}

/// Build all tables of `episode` with `config`.
pub fn build_episode_tables(episode: &Episode, config: &KpiConfig) -> GatResult<EpisodeTables> {
    EpisodeTableBuilder::new(episode, config).build()
}

fn record_issue(diagnostics: &mut Diagnostics, timestep: usize, issue: &GatError) {
    match issue {
        GatError::MalformedActionEffect { channel, reason } => {
            warn!(timestep, channel, %reason, "skipping malformed action channel");
            diagnostics.add_warning_at_timestep("action", reason, channel, timestep);
        }
        other => {
            let message = other.to_string();
            warn!(timestep, %message, "action channel ignored");
            diagnostics.add_warning_at_timestep("action", &message, "action", timestep);
        }
    }
}
