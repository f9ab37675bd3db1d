use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque event identifier, unique within a calendar and stable for the
/// lifetime of the event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub String);

impl EventId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for EventId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EventId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Event category label.
///
/// The four built-in labels cover the common cases; anything else is kept
/// verbatim in `Custom` so user-defined categories survive a reload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    #[default]
    General,
    Work,
    Personal,
    Important,
    Custom(String),
}

impl Category {
    pub fn builtin() -> [Category; 4] {
        [
            Category::General,
            Category::Work,
            Category::Personal,
            Category::Important,
        ]
    }

    pub fn as_str(&self) -> &str {
        match self {
            Category::General => "General",
            Category::Work => "Work",
            Category::Personal => "Personal",
            Category::Important => "Important",
            Category::Custom(label) => label,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Category {
    fn from(s: &str) -> Self {
        let trimmed = s.trim();
        match trimmed {
            "" | "General" => Category::General,
            "Work" => Category::Work,
            "Personal" => Category::Personal,
            "Important" => Category::Important,
            other => Category::Custom(other.to_string()),
        }
    }
}

impl From<String> for Category {
    fn from(s: String) -> Self {
        Category::from(s.as_str())
    }
}

impl From<Category> for String {
    fn from(c: Category) -> Self {
        match c {
            Category::Custom(label) => label,
            other => other.as_str().to_string(),
        }
    }
}
