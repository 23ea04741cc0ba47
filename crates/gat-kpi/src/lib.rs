//! # gat-kpi: episode analytics tables
//!
//! Turns a recorded [`gat_core::Episode`] into eight long-format tables keyed
//! by `(timestep, timestamp, entity)`:
//!
//! - **load / production / rho**: one row per timestep and equipment
//! - **action_summary**: per-timestep action impact, reward and topology distance
//! - **reward**: instantaneous and cumulative reward
//! - **flow_voltage**: p/q/a/v at both line ends
//! - **hazards / maintenances**: sparse environment events
//!
//! ```ignore
//! use gat_kpi::{build_episode_tables, persist_frames, KpiConfig};
//!
//! let config = KpiConfig::default();
//! let tables = build_episode_tables(&episode, &config)?;
//! let frames = tables.to_frames(&config.separator)?;
//! persist_frames(frames, Path::new("out"), &config.output)?;
//! ```

pub mod builder;
pub mod config;
pub mod events;
pub mod flatten;
pub mod frames;
pub mod impact;
pub mod io;
pub mod metrics;
pub mod reward;

pub use builder::{build_episode_tables, ActionSummaryRow, EpisodeTableBuilder, EpisodeTables};
pub use config::{KpiConfig, LoggingConfig, OutputConfig, OutputFormat};
pub use events::{EnvEventRecord, EnvEventTables, EventKey, EventTableView};
pub use flatten::{
    flatten, FlowVoltageKey, FlowVoltageRecord, FlowVoltageTable, LongFormatRecord,
    LongFormatTable, Signal,
};
pub use frames::{EpisodeFrames, TableKind};
pub use impact::{
    first_substation_touched, format_topological_impact, topological_impact, ActionImpact,
    ActionImpactResolver, ResolvedAction, TopologicalImpact,
};
pub use io::{persist_dataframe, persist_frames, read_frame, staged_output_path};
pub use metrics::{dedup_preserving_order, format_elements_impacted, topology_distance};
pub use reward::{RewardAccumulator, RewardRow};
