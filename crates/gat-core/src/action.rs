//! Agent action effect descriptors.
//!
//! An [`Action`] carries up to four optional sub-records mirroring the
//! simulator's dictionary view of an action. They expose five effect
//! channels ([`EffectChannel`]): the line-status record splits into a
//! reconnect and a disconnect channel. Two actions are the same action iff
//! they compare equal structurally, so `Action` derives `Eq` and `Hash`.

use serde::{Deserialize, Serialize};

use crate::error::{GatError, GatResult};

/// One independent way an action can modify the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectChannel {
    Reconnect,
    Disconnect,
    StatusToggle,
    BusAssignment,
    BusSwap,
}

impl EffectChannel {
    pub const LINE_CHANNELS: [EffectChannel; 3] = [
        EffectChannel::Reconnect,
        EffectChannel::Disconnect,
        EffectChannel::StatusToggle,
    ];
    pub const SUBSTATION_CHANNELS: [EffectChannel; 2] =
        [EffectChannel::BusAssignment, EffectChannel::BusSwap];

    pub fn as_str(&self) -> &'static str {
        match self {
            EffectChannel::Reconnect => "reconnect",
            EffectChannel::Disconnect => "disconnect",
            EffectChannel::StatusToggle => "status_toggle",
            EffectChannel::BusAssignment => "bus_assignment",
            EffectChannel::BusSwap => "bus_swap",
        }
    }

    /// Display label used in line impact strings.
    pub fn label(&self) -> &'static str {
        match self {
            EffectChannel::Reconnect => "Reconnect",
            EffectChannel::Disconnect => "Disconnect",
            EffectChannel::StatusToggle => "Change",
            EffectChannel::BusAssignment => "Set bus",
            EffectChannel::BusSwap => "Change bus",
        }
    }
}

/// Absolute line status assignment (reconnect and disconnect sets).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineStatusSet {
    pub nb_connected: Option<usize>,
    pub nb_disconnected: Option<usize>,
    pub connected_id: Option<Vec<usize>>,
    pub disconnected_id: Option<Vec<usize>>,
}

/// Line status toggle set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineStatusChange {
    pub nb_changed: Option<usize>,
    pub changed_id: Option<Vec<usize>>,
}

/// Substation bus reassignment, used by both the absolute assignment and the
/// bus-swap channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BusReassignment {
    pub nb_modif_subs: Option<usize>,
    pub modif_subs_id: Option<Vec<usize>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modif_elems: Vec<BusChange>,
}

/// A single element moved by a bus reassignment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BusChange {
    pub substation_id: usize,
    pub element_type: String,
    pub element_id: usize,
    /// Target bus for absolute assignments; absent for swaps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_bus: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Action {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_line_status: Option<LineStatusSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_line_status: Option<LineStatusChange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_bus_vect: Option<BusReassignment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_bus_vect: Option<BusReassignment>,
}

impl Action {
    /// The do-nothing action.
    pub fn noop() -> Self {
        Self::default()
    }

    /// True when no channel lists an id or a moved element.
    ///
    /// Present but empty channels (`nb_changed: 0, changed_id: []`) count as
    /// no effect, so they compare as a no-op even though they are not
    /// structurally equal to [`Action::noop`].
    pub fn is_noop(&self) -> bool {
        let listed = |ids: &Option<Vec<usize>>| ids.as_ref().is_some_and(|ids| !ids.is_empty());
        let lines = self
            .set_line_status
            .as_ref()
            .is_some_and(|set| listed(&set.connected_id) || listed(&set.disconnected_id))
            || self
                .change_line_status
                .as_ref()
                .is_some_and(|change| listed(&change.changed_id));
        let buses = [&self.set_bus_vect, &self.change_bus_vect]
            .into_iter()
            .flatten()
            .any(|bus| listed(&bus.modif_subs_id) || !bus.modif_elems.is_empty());
        !(lines || buses)
    }

    pub fn reconnect_lines(mut self, ids: &[usize]) -> Self {
        let set = self.set_line_status.get_or_insert_with(LineStatusSet::empty);
        set.nb_connected = Some(ids.len());
        set.connected_id = Some(ids.to_vec());
        self
    }

    pub fn disconnect_lines(mut self, ids: &[usize]) -> Self {
        let set = self.set_line_status.get_or_insert_with(LineStatusSet::empty);
        set.nb_disconnected = Some(ids.len());
        set.disconnected_id = Some(ids.to_vec());
        self
    }

    pub fn toggle_lines(mut self, ids: &[usize]) -> Self {
        self.change_line_status = Some(LineStatusChange {
            nb_changed: Some(ids.len()),
            changed_id: Some(ids.to_vec()),
        });
        self
    }

    pub fn set_bus(mut self, substation_ids: &[usize], elems: Vec<BusChange>) -> Self {
        self.set_bus_vect = Some(BusReassignment::new(substation_ids, elems));
        self
    }

    pub fn swap_bus(mut self, substation_ids: &[usize], elems: Vec<BusChange>) -> Self {
        self.change_bus_vect = Some(BusReassignment::new(substation_ids, elems));
        self
    }

    /// Ids touched by one channel.
    ///
    /// Returns `None` when the action does not carry the channel at all and
    /// `Some(Err(GatError::MalformedActionEffect))` when the channel is
    /// present but incomplete.
    pub fn channel_ids(&self, channel: EffectChannel) -> Option<GatResult<&[usize]>> {
        match channel {
            EffectChannel::Reconnect => self.set_line_status.as_ref().map(|set| {
                checked_ids(
                    channel,
                    set.nb_connected,
                    set.connected_id.as_deref(),
                    ("nb_connected", "connected_id"),
                )
            }),
            EffectChannel::Disconnect => self.set_line_status.as_ref().map(|set| {
                checked_ids(
                    channel,
                    set.nb_disconnected,
                    set.disconnected_id.as_deref(),
                    ("nb_disconnected", "disconnected_id"),
                )
            }),
            EffectChannel::StatusToggle => self.change_line_status.as_ref().map(|change| {
                checked_ids(
                    channel,
                    change.nb_changed,
                    change.changed_id.as_deref(),
                    ("nb_changed", "changed_id"),
                )
            }),
            EffectChannel::BusAssignment => self
                .set_bus_vect
                .as_ref()
                .map(|bus| bus.checked_subs(channel)),
            EffectChannel::BusSwap => self
                .change_bus_vect
                .as_ref()
                .map(|bus| bus.checked_subs(channel)),
        }
    }

}

impl LineStatusSet {
    fn empty() -> Self {
        Self {
            nb_connected: Some(0),
            nb_disconnected: Some(0),
            connected_id: Some(Vec::new()),
            disconnected_id: Some(Vec::new()),
        }
    }
}

impl BusReassignment {
    pub fn new(substation_ids: &[usize], modif_elems: Vec<BusChange>) -> Self {
        Self {
            nb_modif_subs: Some(substation_ids.len()),
            modif_subs_id: Some(substation_ids.to_vec()),
            modif_elems,
        }
    }

    fn checked_subs(&self, channel: EffectChannel) -> GatResult<&[usize]> {
        checked_ids(
            channel,
            self.nb_modif_subs,
            self.modif_subs_id.as_deref(),
            ("nb_modif_subs", "modif_subs_id"),
        )
    }
}

fn checked_ids<'a>(
    channel: EffectChannel,
    count: Option<usize>,
    ids: Option<&'a [usize]>,
    fields: (&str, &str),
) -> GatResult<&'a [usize]> {
    let (count_field, ids_field) = fields;
    let count =
        count.ok_or_else(|| GatError::malformed(channel.as_str(), format!("missing {count_field}")))?;
    let ids =
        ids.ok_or_else(|| GatError::malformed(channel.as_str(), format!("missing {ids_field}")))?;
    if count != ids.len() {
        return Err(GatError::malformed(
            channel.as_str(),
            format!(
                "{count_field} = {count} but {ids_field} lists {} id(s)",
                ids.len()
            ),
        ));
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_has_no_channels() {
        let action = Action::noop();
        assert!(action.is_noop());
        for channel in EffectChannel::LINE_CHANNELS {
            assert!(action.channel_ids(channel).is_none());
        }
    }

    #[test]
    fn disconnect_only_keeps_empty_reconnect_channel() {
        let action = Action::noop().disconnect_lines(&[0]);
        assert!(!action.is_noop());
        let reconnect = action.channel_ids(EffectChannel::Reconnect).unwrap().unwrap();
        assert!(reconnect.is_empty());
        let disconnect = action.channel_ids(EffectChannel::Disconnect).unwrap().unwrap();
        assert_eq!(disconnect, &[0]);
    }

    #[test]
    fn empty_channels_have_no_effect() {
        let toggle_nothing = Action {
            change_line_status: Some(LineStatusChange {
                nb_changed: Some(0),
                changed_id: Some(Vec::new()),
            }),
            ..Action::default()
        };
        assert!(toggle_nothing.is_noop());
        assert!(Action::noop().reconnect_lines(&[]).is_noop());
        assert!(Action::noop().swap_bus(&[], Vec::new()).is_noop());
        assert!(!Action::noop().swap_bus(&[0], Vec::new()).is_noop());
    }

    #[test]
    fn missing_ids_is_malformed() {
        let action = Action {
            change_line_status: Some(LineStatusChange {
                nb_changed: Some(1),
                changed_id: None,
            }),
            ..Action::default()
        };
        let err = action
            .channel_ids(EffectChannel::StatusToggle)
            .unwrap()
            .unwrap_err();
        assert!(err.to_string().contains("missing changed_id"));
    }

    #[test]
    fn count_mismatch_is_malformed() {
        let action = Action {
            set_bus_vect: Some(BusReassignment {
                nb_modif_subs: Some(2),
                modif_subs_id: Some(vec![3]),
                modif_elems: Vec::new(),
            }),
            ..Action::default()
        };
        assert!(action
            .channel_ids(EffectChannel::BusAssignment)
            .unwrap()
            .is_err());
    }

    #[test]
    fn structurally_equal_actions_compare_equal() {
        let a = Action::noop().set_bus(&[1], Vec::new()).toggle_lines(&[4]);
        let b = Action::noop().toggle_lines(&[4]).set_bus(&[1], Vec::new());
        assert_eq!(a, b);
        assert_ne!(a, Action::noop().toggle_lines(&[4]));
    }

    #[test]
    fn deserializes_partial_dictionary() {
        let json = r#"{"set_line_status": {"nb_connected": 0, "nb_disconnected": 1,
            "connected_id": [], "disconnected_id": [2]}}"#;
        let action: Action = serde_json::from_str(json).unwrap();
        assert_eq!(action, Action::noop().disconnect_lines(&[2]));
    }
}
