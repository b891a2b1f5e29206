mod builder;
mod domain;
mod error;
mod ids;
mod model;
mod simulator;
mod spec;

pub use builder::MdpBuilder;
pub use domain::{EnumerableModel, StepOutcome, Steppable, Transition};
pub use error::MdpError;
pub use ids::{ActionId, StateKey};
pub use model::{ActionModel, MdpModel};
pub use simulator::{MdpSimulator, unit_sample};
pub use spec::{ActionSpec, InitialSpec, MdpSpec, OutcomeSpec, StateSpec};
