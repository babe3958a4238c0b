use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Applicant tracking systems the submission pipeline knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AtsType {
    Greenhouse,
}

impl AtsType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AtsType::Greenhouse => "greenhouse",
        }
    }
}

impl std::fmt::Display for AtsType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Host suffix → ATS.
const ATS_SIGNATURES: &[(&str, AtsType)] = &[("greenhouse.io", AtsType::Greenhouse)];

/// Classifies an apply URL by its host. Returns `None` for anything unsupported,
/// including URLs that do not parse.
pub fn detect_ats(apply_url: &str) -> Option<AtsType> {
    let url = Url::parse(apply_url.trim()).ok()?;
    let host = url.host_str()?.to_ascii_lowercase();

    ATS_SIGNATURES.iter().find_map(|(suffix, ats)| {
        let matches = host == *suffix || host.ends_with(&format!(".{suffix}"));
        matches.then_some(*ats)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_greenhouse_job_board_hosts() {
        assert_eq!(
            detect_ats("https://job-boards.greenhouse.io/acme/jobs/4079601009"),
            Some(AtsType::Greenhouse)
        );
        assert_eq!(
            detect_ats("https://boards.greenhouse.io/acme/jobs/1"),
            Some(AtsType::Greenhouse)
        );
    }

    #[test]
    fn test_host_match_is_case_insensitive() {
        assert_eq!(
            detect_ats("HTTPS://Boards.Greenhouse.IO/acme/jobs/1"),
            Some(AtsType::Greenhouse)
        );
    }

    #[test]
    fn test_unknown_hosts_are_unsupported() {
        assert_eq!(detect_ats("https://example.com/jobs/1"), None);
        assert_eq!(detect_ats("https://jobs.lever.co/acme/123"), None);
    }

    #[test]
    fn test_lookalike_hosts_are_unsupported() {
        assert_eq!(detect_ats("https://greenhouse.io.evil.com/jobs/1"), None);
        assert_eq!(detect_ats("https://notgreenhouse.io/jobs/1"), None);
    }

    #[test]
    fn test_unparseable_urls_are_unsupported() {
        assert_eq!(detect_ats("greenhouse.io/acme"), None);
        assert_eq!(detect_ats(""), None);
    }
}
