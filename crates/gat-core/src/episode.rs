use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::error::{GatError, GatResult};
use crate::observation::{FlowQuantity, LineSide, Observation};

/// Static equipment names of the grid an episode was played on.
///
/// Names are positional; id `i` of a class always denotes `names[i]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EquipmentNames {
    pub load_names: Vec<String>,
    pub prod_names: Vec<String>,
    pub line_names: Vec<String>,
    pub sub_names: Vec<String>,
}

impl EquipmentNames {
    pub fn n_loads(&self) -> usize {
        self.load_names.len()
    }

    pub fn n_prods(&self) -> usize {
        self.prod_names.len()
    }

    pub fn n_lines(&self) -> usize {
        self.line_names.len()
    }

    pub fn n_subs(&self) -> usize {
        self.sub_names.len()
    }

    pub fn line_name(&self, id: usize) -> Option<&str> {
        self.line_names.get(id).map(String::as_str)
    }

    pub fn sub_name(&self, id: usize) -> Option<&str> {
        self.sub_names.get(id).map(String::as_str)
    }
}

/// Exogenous line outages recorded for one timestep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvEvent {
    /// One entry per line, `true` while a forced outage is active
    pub hazards: Vec<bool>,
    /// One entry per line, `true` while a scheduled maintenance is active
    pub maintenance: Vec<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeMeta {
    /// Number of timesteps the agent actually played
    pub nb_timestep_played: usize,
}

/// One complete recorded run of an agent.
///
/// `observations` has one more entry than `actions`: the last snapshot has
/// no following action. `size()` is the number of actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub names: EquipmentNames,
    /// Number of connectable elements, the length of every `topo_vect`
    pub dim_topo: usize,
    pub observations: Vec<Observation>,
    pub actions: Vec<Action>,
    pub rewards: Vec<f64>,
    #[serde(default)]
    pub env_actions: Vec<Option<EnvEvent>>,
    pub meta: EpisodeMeta,
    /// Generator types ("nuclear", "wind", ...) parallel to `prod_names`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gen_types: Option<Vec<String>>,
}

impl Episode {
    pub fn size(&self) -> usize {
        self.actions.len()
    }

    /// Check the declared shape of the episode against its records.
    ///
    /// Every failure is a [`GatError::EpisodeInconsistency`].
    pub fn validate(&self) -> GatResult<()> {
        let size = self.size();
        if self.observations.len() != size + 1 {
            return Err(GatError::inconsistency(format!(
                "{} action(s) require {} observation(s), found {}",
                size,
                size + 1,
                self.observations.len()
            )));
        }
        if self.rewards.len() < size {
            return Err(GatError::inconsistency(format!(
                "{} action(s) but only {} reward(s)",
                size,
                self.rewards.len()
            )));
        }
        if self.env_actions.len() > size {
            return Err(GatError::inconsistency(format!(
                "{} environment event slot(s) for {} timestep(s)",
                self.env_actions.len(),
                size
            )));
        }
        if self.meta.nb_timestep_played > size {
            return Err(GatError::inconsistency(format!(
                "nb_timestep_played = {} exceeds {} recorded timestep(s)",
                self.meta.nb_timestep_played, size
            )));
        }
        if let Some(types) = &self.gen_types {
            expect_len("gen_types", None, types.len(), self.names.n_prods())?;
        }
        for (timestep, obs) in self.observations.iter().enumerate().take(size) {
            self.validate_observation(timestep, obs)?;
        }
        for (timestep, event) in self.env_actions.iter().enumerate() {
            if let Some(event) = event {
                let n_lines = self.names.n_lines();
                expect_len("hazards", Some(timestep), event.hazards.len(), n_lines)?;
                expect_len("maintenance", Some(timestep), event.maintenance.len(), n_lines)?;
            }
        }
        Ok(())
    }

    fn validate_observation(&self, timestep: usize, obs: &Observation) -> GatResult<()> {
        let t = Some(timestep);
        expect_len("load_p", t, obs.load_p.len(), self.names.n_loads())?;
        expect_len("prod_p", t, obs.prod_p.len(), self.names.n_prods())?;
        expect_len("rho", t, obs.rho.len(), self.names.n_lines())?;
        expect_len("topo_vect", t, obs.topo_vect.len(), self.dim_topo)?;
        for side in LineSide::ALL {
            for quantity in FlowQuantity::ALL {
                let field = format!("{}_{}", quantity.as_str(), side.as_str());
                expect_len(
                    &field,
                    t,
                    obs.line_quantity(side, quantity).len(),
                    self.names.n_lines(),
                )?;
            }
        }
        Ok(())
    }

    /// Generator name to declared generator type; empty when the episode
    /// carries no types.
    pub fn production_types(&self) -> Vec<(String, String)> {
        match &self.gen_types {
            Some(types) => self
                .names
                .prod_names
                .iter()
                .cloned()
                .zip(types.iter().cloned())
                .collect(),
            None => Vec::new(),
        }
    }
}

fn expect_len(field: &str, timestep: Option<usize>, found: usize, expected: usize) -> GatResult<()> {
    if found == expected {
        return Ok(());
    }
    let at = timestep
        .map(|t| format!(" at timestep {t}"))
        .unwrap_or_default();
    Err(GatError::inconsistency(format!(
        "{field} has length {found}{at}, expected {expected}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observation(n_lines: usize) -> Observation {
        let lines = vec![0.5f32; n_lines];
        Observation {
            year: 2019,
            month: 1,
            day: 1,
            hour_of_day: 0,
            minute_of_hour: 0,
            load_p: vec![1.0],
            prod_p: vec![1.0],
            rho: lines.clone(),
            topo_vect: vec![1, 1, 1],
            p_or: lines.clone(),
            q_or: lines.clone(),
            a_or: lines.clone(),
            v_or: lines.clone(),
            p_ex: lines.clone(),
            q_ex: lines.clone(),
            a_ex: lines.clone(),
            v_ex: lines,
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
            dim_topo: 3,
            observations: vec![observation(2), observation(2)],
            actions: vec![Action::noop()],
            rewards: vec![1.0],
            env_actions: vec![None],
            meta: EpisodeMeta {
                nb_timestep_played: 1,
            },
            gen_types: Some(vec!["wind".into()]),
        }
    }

    #[test]
    fn well_formed_episode_validates() {
        assert!(episode().validate().is_ok());
    }

    #[test]
    fn observation_count_must_exceed_actions_by_one() {
        let mut ep = episode();
        ep.observations.pop();
        let err = ep.validate().unwrap_err();
        assert!(matches!(err, GatError::EpisodeInconsistency(_)));
    }

    #[test]
    fn vector_length_is_checked_against_names() {
        let mut ep = episode();
        ep.observations[0].v_ex.push(1.0);
        let err = ep.validate().unwrap_err();
        assert!(err.to_string().contains("voltage_ex"));
        assert!(err.to_string().contains("timestep 0"));
    }

    #[test]
    fn event_vector_length_is_checked() {
        let mut ep = episode();
        ep.env_actions = vec![Some(EnvEvent {
            hazards: vec![false],
            maintenance: vec![false, false],
        })];
        assert!(ep.validate().is_err());
    }

    #[test]
    fn production_types_pair_names() {
        let ep = episode();
        assert_eq!(
            ep.production_types(),
            vec![("gen_0".to_string(), "wind".to_string())]
        );
    }
}
