/// The fixed category set supported by the ExpenseFlow API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum Category {
    Food,
    Transport,
    Bills,
    Shopping,
    Health,
    Entertainment,
    Other,
}

impl Category {
    pub(crate) fn all() -> &'static [Category] {
        &[
            Self::Food,
            Self::Transport,
            Self::Bills,
            Self::Shopping,
            Self::Health,
            Self::Entertainment,
            Self::Other,
        ]
    }

    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Food => "Food",
            Self::Transport => "Transport",
            Self::Bills => "Bills",
            Self::Shopping => "Shopping",
            Self::Health => "Health",
            Self::Entertainment => "Entertainment",
            Self::Other => "Other",
        }
    }

    /// Lenient parse for server payloads: anything unrecognized maps to Other.
    pub(crate) fn parse(s: &str) -> Category {
        Self::from_input(s).unwrap_or(Self::Other)
    }

    /// Strict parse for user input (case-insensitive).
    pub(crate) fn from_input(s: &str) -> Option<Category> {
        let lower = s.trim().to_lowercase();
        Self::all()
            .iter()
            .find(|c| c.as_str().to_lowercase() == lower)
            .copied()
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
