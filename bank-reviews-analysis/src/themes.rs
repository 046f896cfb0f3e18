use {
    std::{collections::HashSet, fmt},
    serde::Serialize,
    bank_reviews_core::{
        features::{extract, TextFeatures},
        stemming::stem,
        tokenization::{is_stopword, matching_text},
    },
};

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Theme {
    #[serde(rename = "UI UX Issues")]
    UiUxIssues,
    #[serde(rename = "Performance Issues")]
    PerformanceIssues,
    #[serde(rename = "Transaction Issues")]
    TransactionIssues,
    #[serde(rename = "Security Features")]
    SecurityFeatures,
    #[serde(rename = "Network Connectivity")]
    NetworkConnectivity,
    #[serde(rename = "Customer Support")]
    CustomerSupport,
    #[serde(rename = "Feature Requests")]
    FeatureRequests,
    #[serde(rename = "Account Access")]
    AccountAccess,
}

impl Theme {
    /// Declaration order, also used to break ties.
    pub const ALL: [Theme; 8] = [
        Theme::UiUxIssues,
        Theme::PerformanceIssues,
        Theme::TransactionIssues,
        Theme::SecurityFeatures,
        Theme::NetworkConnectivity,
        Theme::CustomerSupport,
        Theme::FeatureRequests,
        Theme::AccountAccess,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Theme::UiUxIssues => "UI UX Issues",
            Theme::PerformanceIssues => "Performance Issues",
            Theme::TransactionIssues => "Transaction Issues",
            Theme::SecurityFeatures => "Security Features",
            Theme::NetworkConnectivity => "Network Connectivity",
            Theme::CustomerSupport => "Customer Support",
            Theme::FeatureRequests => "Feature Requests",
            Theme::AccountAccess => "Account Access",
        }
    }

    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Theme::UiUxIssues => &[
                "interface", "design", "layout", "navigation", "menu", "button", "screen",
                "user experience", "ux", "ui", "confusing", "difficult", "hard to use",
                "complicated", "intuitive", "easy", "simple", "clean", "messy",
            ],
            Theme::PerformanceIssues => &[
                "slow", "fast", "speed", "loading", "lag", "freeze", "crash", "hang",
                "performance", "quick", "responsive", "unresponsive", "timeout",
                "delay", "wait", "stuck", "frozen",
            ],
            Theme::TransactionIssues => &[
                "transaction", "transfer", "payment", "send money", "receive money",
                "balance", "account", "deposit", "withdrawal", "failed transaction",
                "pending", "successful", "error", "declined", "approved",
            ],
            Theme::SecurityFeatures => &[
                "security", "safe", "secure", "password", "pin", "fingerprint",
                "biometric", "authentication", "login", "logout", "privacy",
                "protection", "fraud", "hack", "breach", "trust",
            ],
            Theme::NetworkConnectivity => &[
                "network", "internet", "connection", "offline", "online",
                "connectivity", "signal", "wifi", "data", "mobile data",
                "server", "down", "unavailable", "maintenance",
            ],
            Theme::CustomerSupport => &[
                "support", "help", "customer service", "assistance", "contact",
                "call center", "helpdesk", "response", "staff", "representative",
                "service", "helpful", "unhelpful", "rude", "polite",
            ],
            Theme::FeatureRequests => &[
                "feature", "add", "include", "wish", "want", "need", "missing",
                "should have", "would like", "suggestion", "improvement",
                "update", "upgrade", "new feature", "functionality",
            ],
            Theme::AccountAccess => &[
                "login", "access", "account", "username", "password", "forgot",
                "locked", "blocked", "suspended", "activate", "deactivate",
                "register", "signup", "sign up", "verification",
            ],
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

struct ThemeKeywords {
    theme: Theme,
    // stemmed single words, compared against the stemmed review tokens
    words: HashSet<String>,
    // space-padded, compared against the padded matching text
    phrases: Vec<String>,
}

/// Tags reviews with every theme that has at least one keyword in the text.
pub struct ThemeMatcher {
    themes: Vec<ThemeKeywords>,
}

impl Default for ThemeMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ThemeMatcher {
    pub fn new() -> Self {
        let themes = Theme::ALL.iter()
            .map(|theme| {
                let mut words = HashSet::new();
                let mut phrases = Vec::new();

                for keyword in theme.keywords() {
                    let normalized = matching_text(keyword);
                    // stopwords never survive tokenization
                    if normalized.contains(' ') || is_stopword(&normalized) {
                        phrases.push(format!(" {} ", normalized));
                    } else {
                        words.insert(stem(&normalized));
                    }
                }

                ThemeKeywords {
                    theme: *theme,
                    words,
                    phrases,
                }
            })
            .collect();

        Self {
            themes,
        }
    }

    /// Matching themes in declaration order.
    pub fn match_features(&self, features: &TextFeatures) -> Vec<Theme> {
        let padded = format!(" {} ", features.matching_text);

        self.themes.iter()
            .filter(|keywords| {
                features.tokens.iter().any(|token| keywords.words.contains(token))
                    || keywords.phrases.iter().any(|phrase| padded.contains(phrase.as_str()))
            })
            .map(|keywords| keywords.theme)
            .collect()
    }

    pub fn match_text(&self, text: &str) -> Vec<Theme> {
        self.match_features(&extract(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fast_review_is_about_performance() {
        assert_eq!(ThemeMatcher::new().match_text("Great app, fast!"), vec![Theme::PerformanceIssues]);
    }

    #[test]
    fn inflected_keywords_match() {
        let themes = ThemeMatcher::new().match_text("The app crashes after every transfers");

        assert_eq!(themes, vec![Theme::PerformanceIssues, Theme::TransactionIssues]);
    }

    #[test]
    fn verb_forms_match_their_keyword() {
        let matcher = ThemeMatcher::new();

        assert_eq!(matcher.match_text("App keeps crashing and freezing"), vec![Theme::PerformanceIssues]);
        assert_eq!(matcher.match_text("It crashed again"), vec![Theme::PerformanceIssues]);
        assert_eq!(matcher.match_text("Money transferred but never arrived"), vec![Theme::TransactionIssues]);
        assert!(matcher.match_text("My account got hacked").contains(&Theme::SecurityFeatures));
        assert!(matcher.match_text("Lagging all day").contains(&Theme::PerformanceIssues));
    }

    #[test]
    fn phrases_match_on_word_boundaries() {
        let matcher = ThemeMatcher::new();

        assert_eq!(matcher.match_text("It is so HARD to use!"), vec![Theme::UiUxIssues]);
        assert_eq!(matcher.match_text("The server is down again"), vec![Theme::NetworkConnectivity]);
        assert!(matcher.match_text("countdown timer").is_empty());
    }

    #[test]
    fn keywords_only_match_whole_words() {
        // "pin" inside "shopping", "add" inside "address"
        assert!(ThemeMatcher::new().match_text("shopping address").is_empty());
    }

    #[test]
    fn one_keyword_can_tag_several_themes() {
        let themes = ThemeMatcher::new().match_text("Cannot login");

        assert_eq!(themes, vec![Theme::SecurityFeatures, Theme::AccountAccess]);
    }

    #[test]
    fn identical_text_gives_identical_themes() {
        let matcher = ThemeMatcher::new();
        let text = "Customer service never answers and the app is slow";

        assert_eq!(matcher.match_text(text), matcher.match_text(text));
        assert_eq!(matcher.match_text(text), vec![Theme::PerformanceIssues, Theme::CustomerSupport]);
    }

    #[test]
    fn unrelated_text_has_no_theme() {
        assert!(ThemeMatcher::new().match_text("Bravo").is_empty());
    }
}
