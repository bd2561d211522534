use serde::{Deserialize, Serialize};

/// A progression track, each catalogued independently
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// The main level line
    Main,
    /// Special levels unlocked by main-line progress
    Special,
    /// Single-stage daily challenge
    Daily,
}

impl ContentType {
    /// All tracks in boot order
    pub const ALL: [ContentType; 3] = [ContentType::Main, ContentType::Special, ContentType::Daily];

    /// Lowercase identifier used in config and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Main => "main",
            ContentType::Special => "special",
            ContentType::Daily => "daily",
        }
    }

    /// Log tag, also the progress key the current level is stored under
    pub fn tag(&self) -> &'static str {
        match self {
            ContentType::Main => "MainLevel",
            ContentType::Special => "SpecialLevel",
            ContentType::Daily => "DailyLevel",
        }
    }

    /// File prefix for bundled and saved catalogs/stages
    pub fn prefix(&self) -> &'static str {
        match self {
            ContentType::Main => "",
            ContentType::Special => "s_",
            ContentType::Daily => "d_",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "main" => Ok(ContentType::Main),
            "special" => Ok(ContentType::Special),
            "daily" => Ok(ContentType::Daily),
            other => Err(format!("unknown content type: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("Special".parse::<ContentType>().unwrap(), ContentType::Special);
        assert!("weekly".parse::<ContentType>().is_err());
    }

    #[test]
    fn test_prefixes_are_distinct() {
        assert_eq!(ContentType::Main.prefix(), "");
        assert_ne!(ContentType::Special.prefix(), ContentType::Daily.prefix());
    }
}
