//! Support modules for the poll cycle BDD tests.

pub(crate) mod state;

pub(crate) use state::PollCycleState;
