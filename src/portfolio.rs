use std::fmt;

use log::{error, info};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use crate::api::ApiClient;

pub const DEFAULT_NAME: &str = "Adam El Amrani";
pub const DEFAULT_TAGLINE: &str = "Engineering student specializing in AI and Big Data";
pub const DEFAULT_GITHUB: &str = "https://github.com/agrias-adm";
pub const DEFAULT_LINKEDIN: &str = "https://www.linkedin.com/in/adam-el-amrani-1b5575372/";
pub const DEFAULT_EMAIL: &str = "adam.elamrani04@gmail.com";

/// Everything the home view shows, as served by `/api/portfolio`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PortfolioData {
    pub profile: Profile,
    pub education: Option<Education>,
    pub projects: Vec<Project>,
    pub experience: Vec<Experience>,
    #[serde(deserialize_with = "ordered_skills")]
    pub skills: Vec<SkillCategory>,
    pub contact: Contact,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub name: Option<String>,
    pub title: Option<String>,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Education {
    pub program: Option<String>,
    pub institution: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Project {
    pub name: String,
    pub description: String,
    pub details: Vec<String>,
    pub technologies: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Experience {
    pub title: String,
    pub company: String,
    pub location: String,
    pub date: String,
    pub tasks: Vec<String>,
    pub technologies: Vec<String>,
    pub report: Option<String>,
}

/// One skills category, in the order the server listed it
#[derive(Debug, Clone, PartialEq)]
pub struct SkillCategory {
    pub category: String,
    pub skills: Vec<String>,
}

impl SkillCategory {
    /// `machine_learning` -> `Machine Learning`
    pub fn display_name(&self) -> String {
        self.category
            .replace('_', " ")
            .split_whitespace()
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            })
            .collect::<Vec<String>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Contact {
    pub github: Option<String>,
    pub linkedin: Option<String>,
    pub email: Option<String>,
}

impl Contact {
    pub fn github(&self) -> &str {
        non_empty(&self.github).unwrap_or(DEFAULT_GITHUB)
    }

    pub fn linkedin(&self) -> &str {
        non_empty(&self.linkedin).unwrap_or(DEFAULT_LINKEDIN)
    }

    pub fn email(&self) -> &str {
        non_empty(&self.email).unwrap_or(DEFAULT_EMAIL)
    }
}

impl PortfolioData {
    pub fn name(&self) -> &str {
        non_empty(&self.profile.name).unwrap_or(DEFAULT_NAME)
    }

    pub fn tagline(&self) -> &str {
        non_empty(&self.profile.title).unwrap_or(DEFAULT_TAGLINE)
    }

    pub fn education_line(&self) -> Option<&str> {
        self.education
            .as_ref()
            .and_then(|e| non_empty(&e.program).or(non_empty(&e.institution)))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Deserialize a `{category: [skills]}` object without losing key order
fn ordered_skills<'de, D>(deserializer: D) -> Result<Vec<SkillCategory>, D::Error>
where
    D: Deserializer<'de>,
{
    struct SkillsVisitor;

    impl<'de> Visitor<'de> for SkillsVisitor {
        type Value = Vec<SkillCategory>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a map of skill category to skill names")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut categories = Vec::new();
            while let Some((category, skills)) = map.next_entry::<String, Vec<String>>()? {
                categories.push(SkillCategory { category, skills });
            }
            Ok(categories)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(SkillsVisitor)
}

/// Fetch the portfolio once. Any failure leaves the data absent.
pub async fn load_portfolio(client: &ApiClient) -> Option<PortfolioData> {
    match client.portfolio().await {
        Ok(data) => {
            info!(
                "Loaded portfolio: {} projects, {} experience entries, {} skill categories",
                data.projects.len(),
                data.experience.len(),
                data.skills.len()
            );
            Some(data)
        }
        Err(e) => {
            error!("Error loading portfolio data: {}", e);
            None
        }
    }
}
