// Submission sub-pipeline: ATS detection, form schema extraction, field mapping,
// filling and validation. The engine sequences these; nothing here keeps run state.

pub mod ats;
pub mod dry_run;
pub mod executor;
pub mod greenhouse;
pub mod mapper;
pub mod validator;

pub use ats::{detect_ats, AtsType};
pub use dry_run::DryRunExecutor;
pub use executor::{ExecutorError, ExecutorHandle, FormExecutor};
pub use greenhouse::GreenhouseExecutor;
pub use mapper::{CompiledSchema, MappingSources};
pub use validator::validate_mapping;
