// Orchestration engine: an explicit stage enum, a run-state context passed by
// `&mut` into each transition, and a plain loop until `Stage::End`.

pub mod orchestrator;
pub mod stage;
pub mod state;

pub use orchestrator::{Engine, EngineError, EngineSettings, RunReport};
pub use state::RunState;
