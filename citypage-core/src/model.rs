use serde::{Deserialize, Serialize};

/// One entry of the site list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityRecord {
    pub english_name: String,
    pub site_code: String,
    pub province_code: String,
    pub french_name: String,
}

/// Language of a per-city weather document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    French,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::English => "english",
            Language::French => "french",
        }
    }

    /// Suffix appended to the site code in a document URL.
    pub fn document_suffix(&self) -> &'static str {
        match self {
            Language::English => "_e.xml",
            Language::French => "_f.xml",
        }
    }

    pub const fn all() -> &'static [Language] {
        &[Language::English, Language::French]
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Language {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "english" | "en" | "e" => Ok(Language::English),
            "french" | "fr" | "f" => Ok(Language::French),
            _ => Err(format!("Unknown language '{value}'. Supported languages: english, french.")),
        }
    }
}
