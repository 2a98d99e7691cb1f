use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::duration::DurationSpan;

/// Label -> value pairs from the contact info overlay ("Email", "Phone", ...),
/// in display order.
pub type ContactInfo = IndexMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EducationEntry {
    #[serde(rename = "Institute")]
    pub institute: String,
    #[serde(rename = "Qualification")]
    pub qualification: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ExperienceEntry {
    /// Empty for grouped entries, where one employer holds several roles.
    pub role: String,
    pub company: String,
    #[serde(rename = "year")]
    pub period: String,
    #[serde(rename = "skill", default)]
    pub skills: Vec<String>,
}

// Key names (typos included) are the ones existing exports already use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Profile {
    #[serde(rename = "Profile Link")]
    pub profile_link: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "Contact_info")]
    pub contact_info: ContactInfo,
    #[serde(rename = "Education")]
    pub education: Vec<EducationEntry>,
    #[serde(rename = "Total_Experiance")]
    pub total_experience: DurationSpan,
    #[serde(rename = "Experience")]
    pub experience: Vec<ExperienceEntry>,
    #[serde(rename = "Competancy")]
    pub competency: String,
}

impl EducationEntry {
    /// "Institute: Qualification", as used in the flattened CSV column.
    pub fn summary(&self) -> String {
        format!("{}: {}", self.institute, self.qualification)
    }
}

impl ExperienceEntry {
    /// "role at company (period)"; grouped entries keep the empty role prefix.
    pub fn summary(&self) -> String {
        format!("{} at {} ({})", self.role, self.company, self.period)
    }
}
