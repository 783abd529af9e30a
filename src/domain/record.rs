use serde::Deserialize;

/// A single employment entry of a parsed résumé.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Experience {
    pub company: String,
    pub duration: String,
    #[serde(default)]
    pub skills: Option<Vec<String>>,
    #[serde(default)]
    pub impact: Option<Vec<String>>,
}

/// Structured view of a résumé or job description.
///
/// Every list field is either absent (`None`) or present with its values.
/// An explicitly empty list is still "present" and is handled by the corpus
/// builder.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct StructuredRecord {
    #[serde(default)]
    pub skills: Option<Vec<String>>,
    #[serde(default)]
    pub education: Option<Vec<String>>,
    #[serde(default)]
    pub projects: Option<Vec<String>>,
    #[serde(default)]
    pub project_skills: Option<Vec<String>>,
    #[serde(default)]
    pub achievements: Option<Vec<String>>,
    #[serde(default)]
    pub experience: Vec<Experience>,
}
