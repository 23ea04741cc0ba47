//! # gat-core: Episode Record Model
//!
//! Typed, read-only view of a recorded grid-operation episode as produced by
//! a simulator: one [`Observation`] per timestep, the agent's [`Action`]s,
//! rewards, optional exogenous [`EnvEvent`]s and the static
//! [`EquipmentNames`] of the grid.
//!
//! ## Shape
//!
//! ```text
//! observations: o_0  o_1  ...  o_{T-1}  o_T
//! actions:      a_0  a_1  ...  a_{T-1}
//! rewards:      r_0  r_1  ...  r_{T-1}
//! env_actions:  e_0? e_1? ...            (sparse, may be shorter)
//! ```
//!
//! [`Episode::validate`] checks this shape and the per-timestep vector
//! lengths against the declared equipment counts.
//!
//! ## Modules
//!
//! - [`action`] - Effect descriptors and their channels
//! - [`observation`] - Grid snapshots and per-side line quantities
//! - [`episode`] - The episode container and its validation
//! - [`diagnostics`] - Non-fatal issue collection
//! - [`error`] - [`GatError`] and [`GatResult`]

pub mod action;
pub mod diagnostics;
pub mod episode;
pub mod error;
pub mod observation;

pub use action::{Action, BusChange, BusReassignment, EffectChannel, LineStatusChange, LineStatusSet};
pub use diagnostics::{DiagnosticIssue, Diagnostics};
pub use episode::{EnvEvent, Episode, EpisodeMeta, EquipmentNames};
pub use error::{GatError, GatResult};
pub use observation::{FlowQuantity, LineSide, Observation};
