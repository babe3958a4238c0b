//! Field mapper: turns (form schema, data sources) into a field_id → value mapping.
//!
//! Mapping hints have the form `namespace.attribute` over three namespaces:
//! `cv`, `optimized_cv` and `user_profile`. Each hint is compiled once against a
//! fixed per-namespace accessor table, then applied to whatever sources are
//! present. Resolution never fails: an absent source, an unknown namespace or an
//! unknown attribute all resolve to `None`.
//!
//! Cross-source rules:
//! - first/last name: explicit `user_profile` names win; otherwise the CV's
//!   `full_name` is split (first token / remainder).
//! - resume path: the CV's path first, then the profile's.
//!
//! Fields without a hint get one inferred from their id and label.

use std::path::Path;

use tracing::{debug, info};

use crate::models::{Cv, FieldMapping, FieldValue, FormField, FormSchema, OptimizedCv, UserProfile};

/// The data a mapping can draw from. Any source may be absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct MappingSources<'a> {
    pub cv: Option<&'a Cv>,
    pub optimized_cv: Option<&'a OptimizedCv>,
    pub profile: Option<&'a UserProfile>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    Cv,
    OptimizedCv,
    UserProfile,
}

impl Namespace {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "cv" => Some(Namespace::Cv),
            "optimized_cv" => Some(Namespace::OptimizedCv),
            "user_profile" => Some(Namespace::UserProfile),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamePart {
    First,
    Last,
}

type CvAccessor = fn(&Cv) -> Option<FieldValue>;
type OptimizedAccessor = fn(&OptimizedCv) -> Option<FieldValue>;
type ProfileAccessor = fn(&UserProfile) -> Option<FieldValue>;

const CV_ATTRIBUTES: &[(&str, CvAccessor)] = &[
    ("full_name", |cv| text(Some(cv.full_name.as_str()))),
    ("email", |cv| text(cv.email.as_deref())),
    ("phone", |cv| text(cv.phone.as_deref())),
    ("location", |cv| text(cv.location.as_deref())),
    ("summary", |cv| text(cv.summary.as_deref())),
    ("skills", |cv| list(&cv.skills)),
    ("raw_text", |cv| text(cv.raw_text.as_deref())),
];

const OPTIMIZED_CV_ATTRIBUTES: &[(&str, OptimizedAccessor)] = &[
    ("tailored_summary", |o| text(o.tailored_summary.as_deref())),
    ("tailored_skills", |o| list(&o.tailored_skills)),
    ("tailored_experience", |o| text(o.tailored_experience.as_deref())),
    ("cover_letter", |o| text(o.cover_letter.as_deref())),
    ("full_text", |o| text(o.full_text.as_deref())),
];

const PROFILE_ATTRIBUTES: &[(&str, ProfileAccessor)] = &[
    ("email", |p| text(p.email.as_deref())),
    ("phone", |p| text(p.phone.as_deref())),
    ("country", |p| text(p.country.as_deref())),
    ("linkedin", |p| text(p.linkedin.as_deref())),
    ("website", |p| text(p.website.as_deref())),
];

/// Attributes with a cross-source rule, valid in every namespace.
const NAME_ATTRIBUTES: &[(&str, NamePart)] = &[
    ("first_name", NamePart::First),
    ("last_name", NamePart::Last),
];
const RESUME_ATTRIBUTES: &[&str] = &["resume_path", "resume", "file"];

/// A mapping hint bound to its accessor.
#[derive(Clone, Copy)]
pub enum CompiledHint {
    Cv(CvAccessor),
    OptimizedCv(OptimizedAccessor),
    Profile(ProfileAccessor),
    Name(NamePart),
    ResumePath,
    Unresolvable,
}

impl std::fmt::Debug for CompiledHint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompiledHint::Cv(_) => f.write_str("Cv(..)"),
            CompiledHint::OptimizedCv(_) => f.write_str("OptimizedCv(..)"),
            CompiledHint::Profile(_) => f.write_str("Profile(..)"),
            CompiledHint::Name(part) => write!(f, "Name({part:?})"),
            CompiledHint::ResumePath => f.write_str("ResumePath"),
            CompiledHint::Unresolvable => f.write_str("Unresolvable"),
        }
    }
}

/// Binds a `namespace.attribute` hint to an accessor.
pub fn compile_hint(hint: &str) -> CompiledHint {
    let Some((namespace, attribute)) = hint.trim().split_once('.') else {
        return CompiledHint::Unresolvable;
    };
    let Some(namespace) = Namespace::parse(namespace) else {
        return CompiledHint::Unresolvable;
    };

    if let Some((_, part)) = NAME_ATTRIBUTES.iter().find(|(name, _)| *name == attribute) {
        return CompiledHint::Name(*part);
    }
    if RESUME_ATTRIBUTES.contains(&attribute) {
        return CompiledHint::ResumePath;
    }

    let compiled = match namespace {
        Namespace::Cv => lookup(CV_ATTRIBUTES, attribute).map(CompiledHint::Cv),
        Namespace::OptimizedCv => {
            lookup(OPTIMIZED_CV_ATTRIBUTES, attribute).map(CompiledHint::OptimizedCv)
        }
        Namespace::UserProfile => lookup(PROFILE_ATTRIBUTES, attribute).map(CompiledHint::Profile),
    };
    compiled.unwrap_or(CompiledHint::Unresolvable)
}

fn lookup<T: Copy>(table: &[(&str, T)], attribute: &str) -> Option<T> {
    table
        .iter()
        .find(|(name, _)| *name == attribute)
        .map(|(_, accessor)| *accessor)
}

impl CompiledHint {
    pub fn resolve(&self, sources: &MappingSources<'_>) -> Option<FieldValue> {
        match self {
            CompiledHint::Cv(accessor) => sources.cv.and_then(*accessor),
            CompiledHint::OptimizedCv(accessor) => sources.optimized_cv.and_then(*accessor),
            CompiledHint::Profile(accessor) => sources.profile.and_then(*accessor),
            CompiledHint::Name(part) => resolve_name_part(*part, sources),
            CompiledHint::ResumePath => resolve_resume_path(sources),
            CompiledHint::Unresolvable => None,
        }
    }
}

/// Explicit profile names outrank a split of the CV's full name.
fn resolve_name_part(part: NamePart, sources: &MappingSources<'_>) -> Option<FieldValue> {
    let explicit = sources.profile.and_then(|p| match part {
        NamePart::First => p.first_name.as_deref(),
        NamePart::Last => p.last_name.as_deref(),
    });
    if let Some(value) = text(explicit) {
        return Some(value);
    }

    let (first, last) = split_full_name(&sources.cv?.full_name);
    match part {
        NamePart::First => text(Some(first)),
        NamePart::Last => text(Some(last)),
    }
}

/// First whitespace-separated token → first name; the remainder (possibly empty) → last name.
pub fn split_full_name(full_name: &str) -> (&str, &str) {
    let trimmed = full_name.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((first, rest)) => (first, rest.trim()),
        None => (trimmed, ""),
    }
}

fn resolve_resume_path(sources: &MappingSources<'_>) -> Option<FieldValue> {
    let from_cv = sources.cv.and_then(|cv| cv.resume_path.as_deref());
    let from_profile = sources.profile.and_then(|p| p.resume_path.as_deref());
    path_text(from_cv).or_else(|| path_text(from_profile))
}

/// Keyword rules for fields without an explicit hint, checked in order.
/// Each rule yields candidate hints; the first that resolves wins.
const INFERENCE_RULES: &[(&[&str], &[&str])] = &[
    (&["resume", "cv"], &["cv.resume_path"]),
    (&["first name", "given name", "firstname"], &["user_profile.first_name"]),
    (&["last name", "surname", "family name", "lastname"], &["user_profile.last_name"]),
    (&["full name"], &["cv.full_name"]),
    (&["email", "e-mail"], &["user_profile.email", "cv.email"]),
    (&["phone", "mobile"], &["user_profile.phone", "cv.phone"]),
    (&["linkedin"], &["user_profile.linkedin"]),
    (&["website", "portfolio"], &["user_profile.website"]),
    (&["cover letter"], &["optimized_cv.cover_letter"]),
    (&["country"], &["user_profile.country", "cv.location"]),
    (&["location", "city"], &["cv.location", "user_profile.country"]),
    (&["summary"], &["optimized_cv.tailored_summary", "cv.summary"]),
    (&["skills", "skill"], &["optimized_cv.tailored_skills", "cv.skills"]),
];

/// Candidate hints for a field with no explicit `mapping_hint`.
pub fn infer_hints(field: &FormField) -> &'static [&'static str] {
    let haystack = format!(
        " {} {} ",
        normalize(&field.field_id),
        normalize(&field.label)
    );

    INFERENCE_RULES
        .iter()
        .find(|(keywords, _)| {
            keywords
                .iter()
                .any(|kw| haystack.contains(&format!(" {kw} ")))
        })
        .map(|(_, hints)| *hints)
        .unwrap_or(&[])
}

/// Lowercases and collapses punctuation to single spaces so keywords match on word boundaries.
fn normalize(raw: &str) -> String {
    raw.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '-'))
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Binds one field to its candidate accessors: its explicit hint if present,
/// otherwise the hints inferred from its id and label, in rule order.
pub fn compile_field(field: &FormField) -> Vec<CompiledHint> {
    match field.mapping_hint.as_deref() {
        Some(hint) => vec![compile_hint(hint)],
        None => infer_hints(field).iter().map(|hint| compile_hint(hint)).collect(),
    }
}

#[derive(Debug, Clone)]
struct CompiledField {
    field_id: String,
    candidates: Vec<CompiledHint>,
}

/// A form schema with every field bound to its accessors.
///
/// Built once per extracted form and applied on every remap of that form.
#[derive(Debug, Clone)]
pub struct CompiledSchema {
    fields: Vec<CompiledField>,
}

impl CompiledSchema {
    pub fn compile(schema: &FormSchema) -> Self {
        let fields = schema
            .fields()
            .iter()
            .map(|field| CompiledField {
                field_id: field.field_id.clone(),
                candidates: compile_field(field),
            })
            .collect();
        Self { fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Maps every field in schema order. Pure: identical sources give an identical mapping.
    pub fn apply(&self, sources: &MappingSources<'_>) -> FieldMapping {
        info!("Mapping CV to fields | fields={}", self.fields.len());

        self.fields
            .iter()
            .map(|field| {
                let value = field
                    .candidates
                    .iter()
                    .find_map(|hint| hint.resolve(sources));
                debug!(
                    "Mapped field | id={} | value={}",
                    field.field_id,
                    if value.is_some() { "SET" } else { "MISSING" }
                );
                (field.field_id.clone(), value)
            })
            .collect()
    }
}

fn text(value: Option<&str>) -> Option<FieldValue> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| FieldValue::Text(v.to_string()))
}

fn list(values: &[String]) -> Option<FieldValue> {
    let items: Vec<String> = values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();
    (!items.is_empty()).then_some(FieldValue::List(items))
}

fn path_text(path: Option<&Path>) -> Option<FieldValue> {
    text(path.and_then(Path::to_str))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FormFieldType, Job};
    use std::path::PathBuf;
    use std::sync::Arc;

    fn cv(full_name: &str) -> Cv {
        Cv {
            full_name: full_name.into(),
            email: Some("jane@cv.dev".into()),
            skills: vec!["Rust".into(), "SQL".into()],
            ..Default::default()
        }
    }

    fn text_value(s: &str) -> Option<FieldValue> {
        Some(FieldValue::Text(s.to_string()))
    }

    fn resolve_mapping_hint(hint: &str, sources: &MappingSources<'_>) -> Option<FieldValue> {
        compile_hint(hint).resolve(sources)
    }

    fn map_field(field: &FormField, sources: &MappingSources<'_>) -> Option<FieldValue> {
        compile_field(field)
            .iter()
            .find_map(|hint| hint.resolve(sources))
    }

    fn map_fields(schema: &FormSchema, sources: &MappingSources<'_>) -> FieldMapping {
        CompiledSchema::compile(schema).apply(sources)
    }

    #[test]
    fn test_split_full_name_first_token_and_remainder() {
        assert_eq!(split_full_name("Jane Mary Doe"), ("Jane", "Mary Doe"));
        assert_eq!(split_full_name("  Cher  "), ("Cher", ""));
        assert_eq!(split_full_name("Jane   Doe"), ("Jane", "Doe"));
    }

    #[test]
    fn test_name_split_without_profile_names() {
        let cv = cv("Jane Mary Doe");
        let sources = MappingSources {
            cv: Some(&cv),
            ..Default::default()
        };
        assert_eq!(resolve_mapping_hint("user_profile.first_name", &sources), text_value("Jane"));
        assert_eq!(resolve_mapping_hint("user_profile.last_name", &sources), text_value("Mary Doe"));
        assert_eq!(resolve_mapping_hint("cv.first_name", &sources), text_value("Jane"));
    }

    #[test]
    fn test_profile_name_wins_over_cv_split() {
        let cv = cv("B C");
        let profile = UserProfile {
            first_name: Some("A".into()),
            ..Default::default()
        };
        let sources = MappingSources {
            cv: Some(&cv),
            optimized_cv: None,
            profile: Some(&profile),
        };
        assert_eq!(resolve_mapping_hint("cv.first_name", &sources), text_value("A"));
        assert_eq!(resolve_mapping_hint("user_profile.first_name", &sources), text_value("A"));
        // No explicit last name: falls back to the split.
        assert_eq!(resolve_mapping_hint("user_profile.last_name", &sources), text_value("C"));
    }

    #[test]
    fn test_blank_profile_name_does_not_shadow_split() {
        let cv = cv("Jane Doe");
        let profile = UserProfile {
            first_name: Some("  ".into()),
            ..Default::default()
        };
        let sources = MappingSources {
            cv: Some(&cv),
            optimized_cv: None,
            profile: Some(&profile),
        };
        assert_eq!(resolve_mapping_hint("user_profile.first_name", &sources), text_value("Jane"));
    }

    #[test]
    fn test_single_token_name_leaves_last_name_unresolved() {
        let cv = cv("Cher");
        let sources = MappingSources {
            cv: Some(&cv),
            ..Default::default()
        };
        assert_eq!(resolve_mapping_hint("cv.last_name", &sources), None);
    }

    #[test]
    fn test_resume_path_prefers_cv_then_profile() {
        let mut with_path = cv("Jane Doe");
        with_path.resume_path = Some(PathBuf::from("/cv/jane.pdf"));
        let profile = UserProfile {
            resume_path: Some(PathBuf::from("/profile/jane.pdf")),
            ..Default::default()
        };

        let both = MappingSources {
            cv: Some(&with_path),
            optimized_cv: None,
            profile: Some(&profile),
        };
        assert_eq!(resolve_mapping_hint("user_profile.resume_path", &both), text_value("/cv/jane.pdf"));

        let without_path = cv("Jane Doe");
        let profile_only = MappingSources {
            cv: Some(&without_path),
            optimized_cv: None,
            profile: Some(&profile),
        };
        assert_eq!(
            resolve_mapping_hint("cv.resume_path", &profile_only),
            text_value("/profile/jane.pdf")
        );

        let neither = MappingSources {
            cv: Some(&without_path),
            ..Default::default()
        };
        assert_eq!(resolve_mapping_hint("cv.resume_path", &neither), None);
    }

    #[test]
    fn test_unknown_namespace_or_attribute_resolves_to_none() {
        let cv = cv("Jane Doe");
        let sources = MappingSources {
            cv: Some(&cv),
            ..Default::default()
        };
        assert_eq!(resolve_mapping_hint("env.HOME", &sources), None);
        assert_eq!(resolve_mapping_hint("cv.shoe_size", &sources), None);
        assert_eq!(resolve_mapping_hint("no_dot", &sources), None);
        assert_eq!(resolve_mapping_hint("", &sources), None);
    }

    #[test]
    fn test_absent_source_resolves_to_none() {
        let sources = MappingSources::default();
        assert_eq!(resolve_mapping_hint("optimized_cv.cover_letter", &sources), None);
        assert_eq!(resolve_mapping_hint("user_profile.email", &sources), None);
        assert_eq!(resolve_mapping_hint("cv.first_name", &sources), None);
    }

    #[test]
    fn test_optimized_cv_attributes_resolve() {
        let cv = Arc::new(cv("Jane Doe"));
        let optimized = OptimizedCv {
            original_cv: Arc::clone(&cv),
            job: Job::new("Engineer", "Acme"),
            tailored_summary: None,
            tailored_skills: vec!["Rust".into()],
            tailored_experience: None,
            cover_letter: Some("Dear Acme".into()),
            full_text: None,
        };
        let sources = MappingSources {
            cv: Some(cv.as_ref()),
            optimized_cv: Some(&optimized),
            profile: None,
        };
        assert_eq!(
            resolve_mapping_hint("optimized_cv.cover_letter", &sources),
            text_value("Dear Acme")
        );
        assert_eq!(
            resolve_mapping_hint("optimized_cv.tailored_skills", &sources),
            Some(FieldValue::List(vec!["Rust".into()]))
        );
        assert_eq!(resolve_mapping_hint("optimized_cv.full_text", &sources), None);
    }

    #[test]
    fn test_inference_by_label_and_id() {
        let first = FormField::new("question_1", "Given Name", FormFieldType::Text, true);
        let email = FormField::new("email", "E-mail address", FormFieldType::Email, true);
        let resume = FormField::new("attachment", "Resume/CV", FormFieldType::FileUpload, true);
        let linkedin = FormField::new("question_9", "LinkedIn Profile", FormFieldType::Url, false);
        let unknown = FormField::new("question_5", "Favourite colour", FormFieldType::Text, false);

        assert_eq!(infer_hints(&first), &["user_profile.first_name"]);
        assert_eq!(infer_hints(&email), &["user_profile.email", "cv.email"]);
        assert_eq!(infer_hints(&resume), &["cv.resume_path"]);
        assert_eq!(infer_hints(&linkedin), &["user_profile.linkedin"]);
        assert!(infer_hints(&unknown).is_empty());
    }

    #[test]
    fn test_inference_matches_whole_words_only() {
        let field = FormField::new("cvv_code", "Card CVV", FormFieldType::Text, false);
        assert!(infer_hints(&field).is_empty());
    }

    #[test]
    fn test_explicit_hint_beats_inference() {
        let cv = cv("Jane Doe");
        let sources = MappingSources {
            cv: Some(&cv),
            ..Default::default()
        };
        let field =
            FormField::new("email", "Email", FormFieldType::Text, true).with_hint("cv.full_name");
        assert_eq!(map_field(&field, &sources), text_value("Jane Doe"));
    }

    #[test]
    fn test_inferred_email_falls_back_to_cv() {
        let cv = cv("Jane Doe");
        let profile = UserProfile::default();
        let sources = MappingSources {
            cv: Some(&cv),
            optimized_cv: None,
            profile: Some(&profile),
        };
        let field = FormField::new("email", "Email", FormFieldType::Email, true);
        assert_eq!(map_field(&field, &sources), text_value("jane@cv.dev"));
    }

    #[test]
    fn test_map_fields_is_deterministic_and_schema_ordered() {
        let cv = cv("Jane Mary Doe");
        let sources = MappingSources {
            cv: Some(&cv),
            ..Default::default()
        };
        let schema = FormSchema::new(
            "greenhouse",
            "https://x",
            vec![
                FormField::new("last_name", "Last Name", FormFieldType::Text, true),
                FormField::new("first_name", "First Name", FormFieldType::Text, true),
                FormField::new("skills", "Skills", FormFieldType::Text, false),
                FormField::new("cover_letter", "Cover Letter", FormFieldType::Textarea, false),
            ],
        )
        .unwrap();

        let first = map_fields(&schema, &sources);
        let second = map_fields(&schema, &sources);
        assert_eq!(first, second);

        let ids: Vec<_> = first.keys().map(String::as_str).collect();
        assert_eq!(ids, vec!["last_name", "first_name", "skills", "cover_letter"]);
        assert_eq!(first["first_name"], text_value("Jane"));
        assert_eq!(first["last_name"], text_value("Mary Doe"));
        assert_eq!(
            first["skills"],
            Some(FieldValue::List(vec!["Rust".into(), "SQL".into()]))
        );
        assert_eq!(first["cover_letter"], None);
    }

    #[test]
    fn test_padded_hint_passes_schema_and_resolves() {
        let schema = FormSchema::new(
            "greenhouse",
            "https://x",
            vec![FormField::new("contact", "Contact", FormFieldType::Email, true).with_hint("  cv.email ")],
        )
        .unwrap();
        let cv = cv("Jane Doe");
        let mapping = map_fields(&schema, &MappingSources {
            cv: Some(&cv),
            ..Default::default()
        });
        assert_eq!(mapping["contact"], text_value("jane@cv.dev"));
    }

    #[test]
    fn test_compiled_schema_is_reused_across_sources() {
        let schema = FormSchema::new(
            "greenhouse",
            "https://x",
            vec![
                FormField::new("first_name", "First Name", FormFieldType::Text, true),
                FormField::new("motivation", "Why us?", FormFieldType::Textarea, false)
                    .with_hint("optimized_cv.cover_letter"),
            ],
        )
        .unwrap();
        let compiled = CompiledSchema::compile(&schema);
        assert_eq!(compiled.len(), 2);

        let cv = Arc::new(cv("Jane Mary Doe"));
        let before = compiled.apply(&MappingSources {
            cv: Some(cv.as_ref()),
            ..Default::default()
        });
        assert_eq!(before["motivation"], None);

        let optimized = OptimizedCv {
            original_cv: Arc::clone(&cv),
            job: Job::new("Engineer", "Acme"),
            tailored_summary: None,
            tailored_skills: vec![],
            tailored_experience: None,
            cover_letter: Some("Dear Acme".into()),
            full_text: None,
        };
        let profile = UserProfile {
            first_name: Some("Janey".into()),
            ..Default::default()
        };
        let after = compiled.apply(&MappingSources {
            cv: Some(cv.as_ref()),
            optimized_cv: Some(&optimized),
            profile: Some(&profile),
        });
        assert_eq!(after["first_name"], text_value("Janey"));
        assert_eq!(after["motivation"], text_value("Dear Acme"));
        assert_eq!(after, map_fields(&schema, &MappingSources {
            cv: Some(cv.as_ref()),
            optimized_cv: Some(&optimized),
            profile: Some(&profile),
        }));
    }
}
