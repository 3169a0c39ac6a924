use std::fmt;

/// Which backend contract a widget talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Provider {
    /// Gemini `generateContent`, résumé text embedded in the prompt
    #[default]
    Gemini,
    /// Local API server at `<base>/chat`, history sent as structured turns
    Hosted,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Gemini => "gemini",
            Provider::Hosted => "hosted",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "direct" => Some(Provider::Gemini),
            "hosted" | "api" | "local" => Some(Provider::Hosted),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::Gemini => "Gemini (Direct)",
            Provider::Hosted => "Chat API (Hosted)",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_aliases() {
        assert_eq!(Provider::parse("Gemini"), Some(Provider::Gemini));
        assert_eq!(Provider::parse(" local "), Some(Provider::Hosted));
        assert_eq!(Provider::parse("ollama"), None);
    }

    #[test]
    fn test_parse_round_trips_as_str() {
        for provider in [Provider::Gemini, Provider::Hosted] {
            assert_eq!(Provider::parse(provider.as_str()), Some(provider));
        }
    }
}
