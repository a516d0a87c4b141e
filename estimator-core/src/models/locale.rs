use serde::{Deserialize, Serialize};

/// Language used to resolve material names and format amounts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Es,
    En,
}

impl Locale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Es => "es",
            Self::En => "en",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "es" => Some(Self::Es),
            "en" => Some(Self::En),
            _ => None,
        }
    }
}

/// A name carried in both supported locales.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedName {
    pub es: String,
    pub en: String,
}

impl LocalizedName {
    pub fn new(
        es: impl Into<String>,
        en: impl Into<String>,
    ) -> Self {
        Self {
            es: es.into(),
            en: en.into(),
        }
    }

    pub fn resolve(
        &self,
        locale: Locale,
    ) -> &str {
        match locale {
            Locale::Es => &self.es,
            Locale::En => &self.en,
        }
    }
}
