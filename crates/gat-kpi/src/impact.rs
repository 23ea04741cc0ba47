//! Action impact summaries and episode-scoped action identities.
//!
//! [`ActionImpactResolver`] turns each agent action into an
//! [`ActionImpact`]: how many lines and substations it touches, their display
//! names, and an interned `action_id`. Ids are handed out in order of first
//! appearance starting at 0; structurally equal actions share an id and the
//! do-nothing action has none.
//!
//! Interning is hash based ([`Action`] derives `Hash`), which gives the
//! same ids as a first-seen linear scan over the distinct actions.

use std::collections::{BTreeSet, HashMap};

use gat_core::{Action, EffectChannel, EquipmentNames, GatError, GatResult};

use crate::metrics::{dedup_preserving_order, format_elements_impacted};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionImpact {
    /// Lines touched, summed over the reconnect, disconnect and toggle channels
    pub action_line: usize,
    /// Substations touched, summed over both bus channels
    pub action_subs: usize,
    /// `"Reconnect: a - Disconnect: b - Change: c"`, `None` when no line moved
    pub line_name: Option<String>,
    /// Deduplicated substation names, `None` when no substation moved
    pub sub_name: Option<String>,
    pub action_id: Option<u32>,
}

/// Everything derived from one action.
#[derive(Debug, Default)]
pub struct ResolvedAction {
    pub impact: ActionImpact,
    /// Line names in channel order; a line may repeat across channels
    pub lines_modified: Vec<String>,
    /// Substation names in channel order, not deduplicated
    pub subs_modified: Vec<String>,
    /// Channels skipped because they were malformed
    pub issues: Vec<GatError>,
}

pub struct ActionImpactResolver<'n> {
    names: &'n EquipmentNames,
    separator: String,
    ids: HashMap<Action, u32>,
    distinct: Vec<Action>,
}

impl<'n> ActionImpactResolver<'n> {
    pub fn new(names: &'n EquipmentNames, separator: impl Into<String>) -> Self {
        Self {
            names,
            separator: separator.into(),
            ids: HashMap::new(),
            distinct: Vec::new(),
        }
    }

    /// Impact of `action`; a malformed channel lands in `issues` instead of
    /// failing the call. Fails only when the id space is exhausted.
    pub fn resolve(&mut self, action: &Action) -> GatResult<ResolvedAction> {
        let mut resolved = ResolvedAction::default();
        let mut segments = Vec::new();

        for channel in EffectChannel::LINE_CHANNELS {
            match self.channel_names(action, channel, Element::Line) {
                None => {}
                Some(Err(err)) => resolved.issues.push(err),
                Some(Ok(names)) => {
                    resolved.impact.action_line += names.len();
                    if !names.is_empty() {
                        segments.push(format!("{}: {}", channel.label(), names.join(", ")));
                    }
                    resolved.lines_modified.extend(names);
                }
            }
        }

        for channel in EffectChannel::SUBSTATION_CHANNELS {
            match self.channel_names(action, channel, Element::Substation) {
                None => {}
                Some(Err(err)) => resolved.issues.push(err),
                Some(Ok(names)) => {
                    resolved.impact.action_subs += names.len();
                    resolved.subs_modified.extend(names);
                }
            }
        }

        resolved.impact.line_name = format_elements_impacted(&segments, &self.separator);
        resolved.impact.sub_name = format_elements_impacted(
            &dedup_preserving_order(&resolved.subs_modified),
            &self.separator,
        );
        resolved.impact.action_id = self.intern(action)?;
        Ok(resolved)
    }

    /// Stable id of the action's effect shape; `None` when it has no effect.
    pub fn intern(&mut self, action: &Action) -> GatResult<Option<u32>> {
        if action.is_noop() {
            return Ok(None);
        }
        if let Some(&id) = self.ids.get(action) {
            return Ok(Some(id));
        }
        let id = u32::try_from(self.distinct.len()).map_err(|_| {
            GatError::inconsistency(format!(
                "more than {} distinct actions in one episode",
                u32::MAX
            ))
        })?;
        self.ids.insert(action.clone(), id);
        self.distinct.push(action.clone());
        Ok(Some(id))
    }

    /// Distinct non-empty actions seen so far; index `i` has id `i`.
    pub fn distinct_actions(&self) -> &[Action] {
        &self.distinct
    }

    pub fn into_distinct_actions(self) -> Vec<Action> {
        self.distinct
    }

    fn channel_names(
        &self,
        action: &Action,
        channel: EffectChannel,
        element: Element,
    ) -> Option<GatResult<Vec<String>>> {
        let ids = action.channel_ids(channel)?;
        Some(ids.and_then(|ids| {
            ids.iter()
                .map(|&id| {
                    element.name(self.names, id).map(str::to_string).ok_or_else(|| {
                        GatError::malformed(
                            channel.as_str(),
                            format!("{} id {id} is out of range", element.as_str()),
                        )
                    })
                })
                .collect()
        }))
    }
}

#[derive(Debug, Clone, Copy)]
enum Element {
    Line,
    Substation,
}

impl Element {
    fn as_str(&self) -> &'static str {
        match self {
            Element::Line => "line",
            Element::Substation => "substation",
        }
    }

    fn name<'a>(&self, names: &'a EquipmentNames, id: usize) -> Option<&'a str> {
        match self {
            Element::Line => names.line_name(id),
            Element::Substation => names.sub_name(id),
        }
    }
}

/// Line and substation ids an action touches, each sorted and unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopologicalImpact {
    pub line_ids: Vec<usize>,
    pub substation_ids: Vec<usize>,
}

/// Union of the ids of every well-formed channel of `action`.
pub fn topological_impact(action: &Action) -> TopologicalImpact {
    let collect = |channels: &[EffectChannel]| -> Vec<usize> {
        channels
            .iter()
            .filter_map(|&channel| action.channel_ids(channel).and_then(Result::ok))
            .flatten()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    };
    TopologicalImpact {
        line_ids: collect(&EffectChannel::LINE_CHANNELS[..]),
        substation_ids: collect(&EffectChannel::SUBSTATION_CHANNELS[..]),
    }
}

/// Display strings `(substations, lines)` of a topological impact.
///
/// Ids the episode does not name are left out.
pub fn format_topological_impact(
    impact: &TopologicalImpact,
    names: &EquipmentNames,
    separator: &str,
) -> (Option<String>, Option<String>) {
    let subs: Vec<&str> = impact
        .substation_ids
        .iter()
        .filter_map(|&id| names.sub_name(id))
        .collect();
    let lines: Vec<&str> = impact
        .line_ids
        .iter()
        .filter_map(|&id| names.line_name(id))
        .collect();
    (
        format_elements_impacted(&subs, separator),
        format_elements_impacted(&lines, separator),
    )
}

/// Name of the lowest-id substation the action rewires.
///
/// A substation counts when an absolute assignment moves one of its
/// elements to bus `1` or `-1`, or when it appears in the bus-swap channel.
/// Bus values are compared by value.
pub fn first_substation_touched<'a>(action: &Action, names: &'a EquipmentNames) -> Option<&'a str> {
    (0..names.n_subs())
        .find(|&sub| {
            let assigned = action.set_bus_vect.as_ref().is_some_and(|set| {
                set.modif_elems
                    .iter()
                    .any(|elem| elem.substation_id == sub && matches!(elem.new_bus, Some(1) | Some(-1)))
            });
            let swapped = action.change_bus_vect.as_ref().is_some_and(|swap| {
                swap.modif_elems.iter().any(|elem| elem.substation_id == sub)
                    || swap
                        .modif_subs_id
                        .as_deref()
                        .is_some_and(|ids| ids.contains(&sub))
            });
            assigned || swapped
        })
        .and_then(|sub| names.sub_name(sub))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gat_core::{BusChange, LineStatusChange};

    fn names() -> EquipmentNames {
        EquipmentNames {
            load_names: vec![],
            prod_names: vec![],
            line_names: (0..4).map(|i| format!("line_{i}")).collect(),
            sub_names: (0..3).map(|i| format!("sub_{i}")).collect(),
        }
    }

    fn elem(sub: usize, id: usize, bus: Option<i32>) -> BusChange {
        BusChange {
            substation_id: sub,
            element_type: "line_or".into(),
            element_id: id,
            new_bus: bus,
        }
    }

    #[test]
    fn noop_has_zero_impact_and_no_id() {
        let names = names();
        let mut resolver = ActionImpactResolver::new(&names, " - ");
        let resolved = resolver.resolve(&Action::noop()).unwrap();
        assert_eq!(resolved.impact, ActionImpact::default());
        assert!(resolved.lines_modified.is_empty());
        assert!(resolver.distinct_actions().is_empty());
    }

    #[test]
    fn present_but_empty_channels_get_no_id() {
        let names = names();
        let mut resolver = ActionImpactResolver::new(&names, " - ");
        let toggle_nothing = Action {
            change_line_status: Some(LineStatusChange {
                nb_changed: Some(0),
                changed_id: Some(vec![]),
            }),
            ..Action::noop()
        };
        for action in [toggle_nothing, Action::noop().reconnect_lines(&[])] {
            let resolved = resolver.resolve(&action).unwrap();
            assert_eq!(resolved.impact.action_line, 0);
            assert_eq!(resolved.impact.action_subs, 0);
            assert_eq!(resolved.impact.action_id, None);
        }
        assert!(resolver.distinct_actions().is_empty());

        let real = resolver.resolve(&Action::noop().toggle_lines(&[2])).unwrap();
        assert_eq!(real.impact.action_id, Some(0));
    }

    #[test]
    fn line_channels_are_labelled_and_summed() {
        let names = names();
        let mut resolver = ActionImpactResolver::new(&names, " - ");
        let action = Action::noop()
            .reconnect_lines(&[1])
            .disconnect_lines(&[0, 2])
            .toggle_lines(&[1]);
        let resolved = resolver.resolve(&action).unwrap();

        assert_eq!(resolved.impact.action_line, 4);
        assert_eq!(
            resolved.impact.line_name.as_deref(),
            Some("Reconnect: line_1 - Disconnect: line_0, line_2 - Change: line_1")
        );
        assert_eq!(
            resolved.lines_modified,
            vec!["line_1", "line_0", "line_2", "line_1"]
        );
        assert_eq!(resolved.impact.action_subs, 0);
        assert_eq!(resolved.impact.sub_name, None);
        assert_eq!(resolved.impact.action_id, Some(0));
    }

    #[test]
    fn substation_names_are_deduplicated_for_display() {
        let names = names();
        let mut resolver = ActionImpactResolver::new(&names, " - ");
        let action = Action::noop()
            .set_bus(&[2, 1], vec![elem(2, 0, Some(2))])
            .swap_bus(&[2], vec![]);
        let resolved = resolver.resolve(&action).unwrap();

        assert_eq!(resolved.impact.action_subs, 3);
        assert_eq!(resolved.subs_modified, vec!["sub_2", "sub_1", "sub_2"]);
        assert_eq!(resolved.impact.sub_name.as_deref(), Some("sub_2 - sub_1"));
        assert_eq!(resolved.impact.line_name, None);
    }

    #[test]
    fn ids_follow_first_appearance() {
        let names = names();
        let mut resolver = ActionImpactResolver::new(&names, " - ");
        let a = Action::noop().disconnect_lines(&[0]);
        let b = Action::noop().set_bus(&[1], vec![elem(1, 3, Some(2))]);
        let c = Action::noop().toggle_lines(&[3]);

        let ids: Vec<Option<u32>> = [&a, &b, &a, &Action::noop(), &c, &b]
            .iter()
            .map(|action| resolver.intern(action).unwrap())
            .collect();
        assert_eq!(ids, vec![Some(0), Some(1), Some(0), None, Some(2), Some(1)]);
        assert_eq!(resolver.distinct_actions(), &[a, b, c]);
    }

    #[test]
    fn malformed_channel_contributes_nothing() {
        let names = names();
        let mut resolver = ActionImpactResolver::new(&names, " - ");
        let action = Action {
            change_line_status: Some(LineStatusChange {
                nb_changed: None,
                changed_id: Some(vec![1]),
            }),
            ..Action::noop().disconnect_lines(&[3])
        };
        let resolved = resolver.resolve(&action).unwrap();

        assert_eq!(resolved.impact.action_line, 1);
        assert_eq!(
            resolved.impact.line_name.as_deref(),
            Some("Disconnect: line_3")
        );
        assert_eq!(resolved.issues.len(), 1);
        assert!(matches!(
            resolved.issues[0],
            GatError::MalformedActionEffect {
                channel: "status_toggle",
                ..
            }
        ));
        assert!(resolved.impact.action_id.is_some());
    }

    #[test]
    fn unknown_line_id_is_malformed() {
        let names = names();
        let mut resolver = ActionImpactResolver::new(&names, " - ");
        let resolved = resolver.resolve(&Action::noop().disconnect_lines(&[9])).unwrap();
        assert_eq!(resolved.impact.action_line, 0);
        assert_eq!(resolved.impact.line_name, None);
        assert!(resolved.issues[0].to_string().contains("line id 9"));
    }

    #[test]
    fn topological_impact_is_a_sorted_union() {
        let names = names();
        let action = Action::noop()
            .disconnect_lines(&[2, 0])
            .toggle_lines(&[2])
            .set_bus(&[1], vec![])
            .swap_bus(&[1, 0], vec![]);
        let impact = topological_impact(&action);
        assert_eq!(impact.line_ids, vec![0, 2]);
        assert_eq!(impact.substation_ids, vec![0, 1]);

        let (subs, lines) = format_topological_impact(&impact, &names, " - ");
        assert_eq!(subs.as_deref(), Some("sub_0 - sub_1"));
        assert_eq!(lines.as_deref(), Some("line_0 - line_2"));

        let (subs, lines) = format_topological_impact(&TopologicalImpact::default(), &names, " - ");
        assert_eq!((subs, lines), (None, None));
    }

    #[test]
    fn first_substation_uses_bus_values() {
        let names = names();
        let to_bus_two = Action::noop().set_bus(&[0], vec![elem(0, 1, Some(2))]);
        assert_eq!(first_substation_touched(&to_bus_two, &names), None);

        let to_bus_one = Action::noop().set_bus(&[2], vec![elem(2, 1, Some(1))]);
        assert_eq!(first_substation_touched(&to_bus_one, &names), Some("sub_2"));

        let disconnect = Action::noop().set_bus(&[1], vec![elem(1, 1, Some(-1))]);
        assert_eq!(first_substation_touched(&disconnect, &names), Some("sub_1"));

        let swap = Action::noop().swap_bus(&[1], vec![]);
        assert_eq!(first_substation_touched(&swap, &names), Some("sub_1"));
    }
}
