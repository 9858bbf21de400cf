use std::fmt;

/// The operation a request is dispatched to
///
/// The action drives the query selector: only [`Action::ListDeleted`]
/// widens the scope to soft-deleted rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Action {
    /// No action selected yet
    #[default]
    Unspecified,
    List,
    ListDeleted,
    Retrieve,
    Create,
    Update,
    Destroy,
    /// A registered extra action, by name
    Custom(String),
}

impl Action {
    /// Canonical name, as used in logs and error bodies
    pub fn as_str(&self) -> &str {
        match self {
            Self::Unspecified => "",
            Self::List => "List",
            Self::ListDeleted => "ListDeleted",
            Self::Retrieve => "Retrieve",
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Destroy => "Destroy",
            Self::Custom(name) => name,
        }
    }
}

impl From<&str> for Action {
    fn from(name: &str) -> Self {
        match name {
            "" => Self::Unspecified,
            "List" => Self::List,
            "ListDeleted" => Self::ListDeleted,
            "Retrieve" => Self::Retrieve,
            "Create" => Self::Create,
            "Update" => Self::Update,
            "Destroy" => Self::Destroy,
            other => Self::Custom(other.to_string()),
        }
    }
}

impl From<String> for Action {
    fn from(name: String) -> Self {
        Self::from(name.as_str())
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
