use serde::Serialize;

/// Position of the engine in the per-job pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    PopJob,
    Optimize,
    OptFailed,
    SubmitStart,
    DetectAts,
    ExtractSchema,
    MapFields,
    FillForm,
    ValidateForm,
    ConfirmSubmit,
    SubmitSuccess,
    SubmitFailed,
    End,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::PopJob => "POP_JOB",
            Stage::Optimize => "OPTIMIZE",
            Stage::OptFailed => "OPT_FAILED",
            Stage::SubmitStart => "SUBMIT_START",
            Stage::DetectAts => "DETECT_ATS",
            Stage::ExtractSchema => "EXTRACT_SCHEMA",
            Stage::MapFields => "MAP_FIELDS",
            Stage::FillForm => "FILL_FORM",
            Stage::ValidateForm => "VALIDATE_FORM",
            Stage::ConfirmSubmit => "CONFIRM_SUBMIT",
            Stage::SubmitSuccess => "SUBMIT_SUCCESS",
            Stage::SubmitFailed => "SUBMIT_FAILED",
            Stage::End => "END",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
