//! Job and talent records as seen by the scoring engine.
//!
//! The surrounding application owns these entities; this crate only needs an id and
//! a skill list from each. [`SkillProfile`] is the text form fed to the embedder.

use serde::{Deserialize, Serialize};

use crate::hashing::skills_fingerprint;

/// A job posting: identity plus required skills.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, alias = "requiredSkills")]
    pub required_skills: Vec<String>,
}

impl Job {
    pub fn new<I, S>(id: impl Into<String>, required_skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            title: None,
            required_skills: required_skills.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn skill_profile(&self) -> SkillProfile {
        SkillProfile::from_skills(&self.required_skills)
    }

    pub fn fingerprint(&self) -> u64 {
        skills_fingerprint(&self.required_skills)
    }
}

/// A talent: identity plus skills.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Talent {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
}

impl Talent {
    pub fn new<I, S>(id: impl Into<String>, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            name: None,
            skills: skills.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn skill_profile(&self) -> SkillProfile {
        SkillProfile::from_skills(&self.skills)
    }

    pub fn fingerprint(&self) -> u64 {
        skills_fingerprint(&self.skills)
    }
}

/// Space-joined skill text. Blank tokens are dropped, so an all-blank list is empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SkillProfile(String);

impl SkillProfile {
    pub fn from_skills<S: AsRef<str>>(skills: &[S]) -> Self {
        let text = skills
            .iter()
            .map(|s| s.as_ref().trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        Self(text)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for SkillProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
