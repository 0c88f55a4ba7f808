use serde::{Deserialize, Serialize};
use std::fmt;

/// Aggregate capacity bucket that tasks draw from and specialties feed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SkillPool {
    Frontend,
    Backend,
    Mobile,
    DevOps,
    #[serde(rename = "QA")]
    Qa,
    Design,
    Data,
}

impl SkillPool {
    pub const ALL: [SkillPool; 7] = [
        SkillPool::Frontend,
        SkillPool::Backend,
        SkillPool::Mobile,
        SkillPool::DevOps,
        SkillPool::Qa,
        SkillPool::Design,
        SkillPool::Data,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SkillPool::Frontend => "Frontend",
            SkillPool::Backend => "Backend",
            SkillPool::Mobile => "Mobile",
            SkillPool::DevOps => "DevOps",
            SkillPool::Qa => "QA",
            SkillPool::Design => "Design",
            SkillPool::Data => "Data",
        }
    }

    /// Resolves a tag or pool label, case-insensitively, including common aliases.
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized = label.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "frontend" | "front-end" | "front end" | "fe" | "web" => Some(SkillPool::Frontend),
            "backend" | "back-end" | "back end" | "be" | "api" | "server" => {
                Some(SkillPool::Backend)
            }
            "mobile" | "ios" | "android" => Some(SkillPool::Mobile),
            "devops" | "dev-ops" | "infra" | "infrastructure" | "ops" | "sre" => {
                Some(SkillPool::DevOps)
            }
            "qa" | "test" | "testing" | "quality" => Some(SkillPool::Qa),
            "design" | "ux" | "ui" | "ui/ux" | "ux/ui" => Some(SkillPool::Design),
            "data" | "ml" | "ai" | "ai/ml" | "analytics" => Some(SkillPool::Data),
            _ => None,
        }
    }

    /// Reads the `[Tag]` prefix of a task display name.
    ///
    /// Only used while building the work tree; allocation reads
    /// `Task::required_skill` instead.
    pub fn from_task_name(name: &str) -> Option<Self> {
        let rest = name.trim_start().strip_prefix('[')?;
        let (tag, _) = rest.split_once(']')?;
        Self::from_label(tag)
    }
}

impl fmt::Display for SkillPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A team member's specialty label, resolved through a fixed lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Specialty {
    /// Splits capacity evenly between Frontend and Backend.
    FullStack,
    Single(SkillPool),
    /// A label the lookup does not know; contributes to no pool.
    Unknown(String),
}

const ROLE_SUFFIXES: [&str; 5] = [" developer", " engineer", " designer", " specialist", " dev"];

impl Specialty {
    pub fn from_label(label: &str) -> Self {
        let normalized = label.trim().to_ascii_lowercase();
        if matches!(
            normalized.as_str(),
            "full-stack" | "fullstack" | "full stack" | "full-stack developer"
                | "fullstack developer" | "full stack developer" | "full-stack engineer"
        ) {
            return Specialty::FullStack;
        }
        let stem = ROLE_SUFFIXES
            .iter()
            .find_map(|suffix| normalized.strip_suffix(suffix))
            .unwrap_or(normalized.as_str());
        match SkillPool::from_label(stem) {
            Some(pool) => Specialty::Single(pool),
            None => Specialty::Unknown(label.trim().to_string()),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Specialty::FullStack => "Full-stack".to_string(),
            Specialty::Single(pool) => pool.as_str().to_string(),
            Specialty::Unknown(label) => label.clone(),
        }
    }

    /// Pool shares this specialty feeds, as `(pool, fraction of capacity)`.
    pub fn contributions(&self) -> Vec<(SkillPool, f64)> {
        match self {
            Specialty::FullStack => vec![(SkillPool::Frontend, 0.5), (SkillPool::Backend, 0.5)],
            Specialty::Single(pool) => vec![(*pool, 1.0)],
            Specialty::Unknown(_) => Vec::new(),
        }
    }

    /// Whether a person with this specialty can pick up work from `pool`.
    pub fn serves(&self, pool: SkillPool) -> bool {
        match self {
            Specialty::FullStack => matches!(pool, SkillPool::Frontend | SkillPool::Backend),
            Specialty::Single(own) => *own == pool,
            Specialty::Unknown(_) => false,
        }
    }
}

impl From<String> for Specialty {
    fn from(value: String) -> Self {
        Specialty::from_label(&value)
    }
}

impl From<Specialty> for String {
    fn from(value: Specialty) -> Self {
        value.label()
    }
}

impl fmt::Display for Specialty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}
