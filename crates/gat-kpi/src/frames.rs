//! Polars `DataFrame` form of the episode tables.
//!
//! Column schemas:
//!
//! | table | columns |
//! |-------|---------|
//! | load, production, rho | `timestep, timestamp, equipment_id, equipment_name, value` |
//! | action_summary | `timestep, timestamp, timestep_reward, action_line, action_subs, line_name, sub_name, action_id, distance, lines_modified, subs_modified` |
//! | reward | `timestep, timestamp, rewards, cum_rewards` |
//! | flow_voltage | `timestep, timestamp, side, quantity, line_id, line_name, value` |
//! | hazards, maintenances | `timestep, timestamp, line_id, line_name, value` |
//!
//! `timestamp` is `Datetime(ms)`; `line_name`, `sub_name`, `action_id`,
//! `lines_modified` and `subs_modified` are nullable.

use chrono::NaiveDateTime;
use gat_core::{GatError, GatResult};
use polars::prelude::*;

use crate::builder::EpisodeTables;
use crate::events::EventTableView;
use crate::flatten::LongFormatTable;
use crate::metrics::format_elements_impacted;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    Load,
    Production,
    Rho,
    ActionSummary,
    Reward,
    FlowVoltage,
    Hazards,
    Maintenances,
}

impl TableKind {
    pub const ALL: [TableKind; 8] = [
        TableKind::Load,
        TableKind::Production,
        TableKind::Rho,
        TableKind::ActionSummary,
        TableKind::Reward,
        TableKind::FlowVoltage,
        TableKind::Hazards,
        TableKind::Maintenances,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TableKind::Load => "load",
            TableKind::Production => "production",
            TableKind::Rho => "rho",
            TableKind::ActionSummary => "action_summary",
            TableKind::Reward => "reward",
            TableKind::FlowVoltage => "flow_voltage",
            TableKind::Hazards => "hazards",
            TableKind::Maintenances => "maintenances",
        }
    }
}

#[derive(Debug, Clone)]
pub struct EpisodeFrames {
    pub load: DataFrame,
    pub production: DataFrame,
    pub rho: DataFrame,
    pub action_summary: DataFrame,
    pub reward: DataFrame,
    pub flow_voltage: DataFrame,
    pub hazards: DataFrame,
    pub maintenances: DataFrame,
}

impl EpisodeFrames {
    pub fn get(&self, kind: TableKind) -> &DataFrame {
        match kind {
            TableKind::Load => &self.load,
            TableKind::Production => &self.production,
            TableKind::Rho => &self.rho,
            TableKind::ActionSummary => &self.action_summary,
            TableKind::Reward => &self.reward,
            TableKind::FlowVoltage => &self.flow_voltage,
            TableKind::Hazards => &self.hazards,
            TableKind::Maintenances => &self.maintenances,
        }
    }

    pub fn into_tables(self) -> Vec<(TableKind, DataFrame)> {
        vec![
            (TableKind::Load, self.load),
            (TableKind::Production, self.production),
            (TableKind::Rho, self.rho),
            (TableKind::ActionSummary, self.action_summary),
            (TableKind::Reward, self.reward),
            (TableKind::FlowVoltage, self.flow_voltage),
            (TableKind::Hazards, self.hazards),
            (TableKind::Maintenances, self.maintenances),
        ]
    }
}

impl EpisodeTables {
    /// Convert every table; `separator` joins the modified-element lists.
    pub fn to_frames(&self, separator: &str) -> GatResult<EpisodeFrames> {
        Ok(EpisodeFrames {
            load: long_format_frame(&self.load)?,
            production: long_format_frame(&self.production)?,
            rho: long_format_frame(&self.rho)?,
            action_summary: self.action_summary_frame(separator)?,
            reward: self.reward_frame()?,
            flow_voltage: self.flow_voltage_frame()?,
            hazards: event_frame(self.hazards())?,
            maintenances: event_frame(self.maintenances())?,
        })
    }

    fn action_summary_frame(&self, separator: &str) -> GatResult<DataFrame> {
        let rows = &self.action_summary;
        let columns = vec![
            index_series("timestep", rows.iter().map(|r| r.timestep)),
            timestamp_series(rows.iter().map(|r| r.timestamp))?,
            Series::new(
                "timestep_reward",
                rows.iter().map(|r| r.timestep_reward).collect::<Vec<f64>>(),
            ),
            index_series("action_line", rows.iter().map(|r| r.action_line)),
            index_series("action_subs", rows.iter().map(|r| r.action_subs)),
            Series::new(
                "line_name",
                rows.iter()
                    .map(|r| r.line_name.as_deref())
                    .collect::<Vec<Option<&str>>>(),
            ),
            Series::new(
                "sub_name",
                rows.iter()
                    .map(|r| r.sub_name.as_deref())
                    .collect::<Vec<Option<&str>>>(),
            ),
            Series::new(
                "action_id",
                rows.iter().map(|r| r.action_id).collect::<Vec<Option<u32>>>(),
            ),
            index_series("distance", rows.iter().map(|r| r.distance)),
            Series::new(
                "lines_modified",
                rows.iter()
                    .map(|r| format_elements_impacted(&r.lines_modified, separator))
                    .collect::<Vec<Option<String>>>(),
            ),
            Series::new(
                "subs_modified",
                rows.iter()
                    .map(|r| format_elements_impacted(&r.subs_modified, separator))
                    .collect::<Vec<Option<String>>>(),
            ),
        ];
        DataFrame::new(columns).map_err(frame_err)
    }

    fn reward_frame(&self) -> GatResult<DataFrame> {
        let rows = &self.reward;
        DataFrame::new(vec![
            index_series("timestep", rows.iter().map(|r| r.timestep)),
            timestamp_series(rows.iter().map(|r| r.timestamp))?,
            Series::new("rewards", rows.iter().map(|r| r.reward).collect::<Vec<f64>>()),
            Series::new(
                "cum_rewards",
                rows.iter().map(|r| r.cum_reward).collect::<Vec<f64>>(),
            ),
        ])
        .map_err(frame_err)
    }

    fn flow_voltage_frame(&self) -> GatResult<DataFrame> {
        let rows = self.flow_voltage.rows();
        DataFrame::new(vec![
            index_series("timestep", rows.iter().map(|r| r.timestep)),
            timestamp_series(rows.iter().map(|r| r.timestamp))?,
            Series::new(
                "side",
                rows.iter().map(|r| r.key.side.as_str()).collect::<Vec<&str>>(),
            ),
            Series::new(
                "quantity",
                rows.iter()
                    .map(|r| r.key.quantity.as_str())
                    .collect::<Vec<&str>>(),
            ),
            index_series("line_id", rows.iter().map(|r| r.key.line_id)),
            Series::new(
                "line_name",
                rows.iter().map(|r| r.line_name.as_str()).collect::<Vec<&str>>(),
            ),
            Series::new("value", rows.iter().map(|r| r.value).collect::<Vec<f64>>()),
        ])
        .map_err(frame_err)
    }
}

fn long_format_frame(table: &LongFormatTable) -> GatResult<DataFrame> {
    let rows = table.rows();
    DataFrame::new(vec![
        index_series("timestep", rows.iter().map(|r| r.timestep)),
        timestamp_series(rows.iter().map(|r| r.timestamp))?,
        index_series("equipment_id", rows.iter().map(|r| r.equipment_id)),
        Series::new(
            "equipment_name",
            rows.iter()
                .map(|r| r.equipment_name.as_str())
                .collect::<Vec<&str>>(),
        ),
        Series::new("value", rows.iter().map(|r| r.value).collect::<Vec<f64>>()),
    ])
    .map_err(frame_err)
}

fn event_frame(view: EventTableView<'_>) -> GatResult<DataFrame> {
    let rows: Vec<_> = view.iter().collect();
    DataFrame::new(vec![
        index_series("timestep", rows.iter().map(|r| r.timestep)),
        timestamp_series(rows.iter().map(|r| r.timestamp))?,
        index_series("line_id", rows.iter().map(|r| r.line_id)),
        Series::new(
            "line_name",
            rows.iter().map(|r| r.line_name).collect::<Vec<&str>>(),
        ),
        Series::new("value", rows.iter().map(|r| r.value).collect::<Vec<bool>>()),
    ])
    .map_err(frame_err)
}

fn index_series(name: &str, values: impl Iterator<Item = usize>) -> Series {
    Series::new(name, values.map(|v| v as u64).collect::<Vec<u64>>())
}

fn timestamp_series(values: impl Iterator<Item = NaiveDateTime>) -> GatResult<Series> {
    let millis: Vec<i64> = values.map(|ts| ts.and_utc().timestamp_millis()).collect();
    Series::new("timestamp", millis)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
        .map_err(frame_err)
}

fn frame_err(err: PolarsError) -> GatError {
    GatError::Frame(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_episode_tables;
    use crate::config::KpiConfig;
    use gat_core::{Action, EnvEvent, Episode, EpisodeMeta, EquipmentNames, Observation};

    fn observation(step: u32) -> Observation {
        let lines = |base: f32| vec![base + step as f32, base + 0.5 + step as f32];
        Observation {
            year: 2020,
            month: 2,
            day: 29,
            hour_of_day: 12,
            minute_of_hour: step * 5,
            load_p: vec![1.0 + step as f32],
            prod_p: vec![2.0 + step as f32],
            rho: lines(0.0),
            topo_vect: vec![1, 1],
            p_or: lines(10.0),
            q_or: lines(20.0),
            a_or: lines(30.0),
            v_or: lines(40.0),
            p_ex: lines(50.0),
            q_ex: lines(60.0),
            a_ex: lines(70.0),
            v_ex: lines(80.0),
        }
    }

    fn episode() -> Episode {
        Episode {
            names: EquipmentNames {
                load_names: vec!["load_0".into()],
                prod_names: vec!["gen_0".into()],
                line_names: vec!["line_0".into(), "line_1".into()],
                sub_names: vec!["sub_0".into()],
            },
            dim_topo: 2,
            observations: (0..3).map(observation).collect(),
            actions: vec![Action::noop().disconnect_lines(&[1]), Action::noop()],
            rewards: vec![0.5, 0.25],
            env_actions: vec![
                None,
                Some(EnvEvent {
                    hazards: vec![false, true],
                    maintenance: vec![false, false],
                }),
            ],
            meta: EpisodeMeta {
                nb_timestep_played: 2,
            },
            gen_types: None,
        }
    }

    fn frames() -> EpisodeFrames {
        build_episode_tables(&episode(), &KpiConfig::default())
            .unwrap()
            .to_frames(" - ")
            .unwrap()
    }

    #[test]
    fn frame_heights_match_tables() {
        let frames = frames();
        assert_eq!(frames.load.height(), 2);
        assert_eq!(frames.production.height(), 2);
        assert_eq!(frames.rho.height(), 4);
        assert_eq!(frames.action_summary.height(), 2);
        assert_eq!(frames.reward.height(), 2);
        assert_eq!(frames.flow_voltage.height(), 2 * 8 * 2);
        assert_eq!(frames.hazards.height(), 2);
        assert_eq!(frames.maintenances.height(), 2);
    }

    #[test]
    fn long_format_schema() {
        let frames = frames();
        assert_eq!(
            frames.load.get_column_names(),
            vec!["timestep", "timestamp", "equipment_id", "equipment_name", "value"]
        );
        assert_eq!(
            frames.load.column("timestamp").unwrap().dtype(),
            &DataType::Datetime(TimeUnit::Milliseconds, None)
        );
    }

    #[test]
    fn action_summary_nulls() {
        let frames = frames();
        let ids = frames.action_summary.column("action_id").unwrap().u32().unwrap();
        assert_eq!(ids.get(0), Some(0));
        assert_eq!(ids.get(1), None);
        let lines = frames.action_summary.column("line_name").unwrap().utf8().unwrap();
        assert_eq!(lines.get(0), Some("Disconnect: line_1"));
        assert_eq!(lines.get(1), None);
    }

    #[test]
    fn rho_values_select_by_timestep_and_id() {
        let frames = frames();
        let selected = frames
            .rho
            .clone()
            .lazy()
            .filter(col("timestep").eq(lit(1u64)).and(col("equipment_id").eq(lit(1u64))))
            .collect()
            .unwrap();
        assert_eq!(selected.height(), 1);
        let value = selected.column("value").unwrap().f64().unwrap().get(0);
        assert_eq!(value, Some(1.5));
    }

    #[test]
    fn flow_voltage_selectable_by_side() {
        let frames = frames();
        let extremity = frames
            .flow_voltage
            .clone()
            .lazy()
            .filter(col("side").eq(lit("ex")))
            .collect()
            .unwrap();
        assert_eq!(extremity.height(), 2 * 4 * 2);
    }

    #[test]
    fn hazards_frame_values() {
        let frames = frames();
        let values = frames.hazards.column("value").unwrap().bool().unwrap();
        assert_eq!(values.get(0), Some(false));
        assert_eq!(values.get(1), Some(true));
    }
}
