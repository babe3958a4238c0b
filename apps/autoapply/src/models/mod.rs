pub mod cv;
pub mod form;
pub mod job;
pub mod optimized_cv;
pub mod profile;

pub use cv::Cv;
pub use form::{FieldMapping, FieldValue, FormField, FormFieldType, FormSchema};
pub use job::{Job, JobQueue};
pub use optimized_cv::OptimizedCv;
pub use profile::UserProfile;
