//! Display strings for the `en` and `fr` locales.
//!
//! Keys are dotted paths into the embedded JSON tables (`hero.responseRate`).
//! Values may contain `{{placeholder}}` segments filled from a parameter map.
//! Lookups fall back to `en`, then to the key itself.

use std::collections::HashMap;

use handlebars::Handlebars;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

const EN_TABLE: &str = include_str!("locales/en.json");
const FR_TABLE: &str = include_str!("locales/fr.json");

/// Supported display locales
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Fr,
}

impl Locale {
    pub const FALLBACK: Locale = Locale::En;

    pub fn all() -> &'static [Locale] {
        &[Locale::En, Locale::Fr]
    }

    pub fn code(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Fr => "fr",
        }
    }

    /// Parse a language tag such as `fr`, `fr-CA` or `EN_us`
    pub fn from_tag(tag: &str) -> Option<Self> {
        let primary = tag
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match primary.as_str() {
            "en" => Some(Locale::En),
            "fr" => Some(Locale::Fr),
            _ => None,
        }
    }

    /// Pick the first supported locale from an `Accept-Language` header value
    pub fn from_accept_language(header: &str) -> Option<Self> {
        let mut tags: Vec<(f32, &str)> = header
            .split(',')
            .filter_map(|part| {
                let mut pieces = part.split(';');
                let tag = pieces.next()?.trim();
                let quality = pieces
                    .find_map(|p| p.trim().strip_prefix("q="))
                    .and_then(|q| q.parse::<f32>().ok())
                    .unwrap_or(1.0);
                Some((quality, tag))
            })
            .collect();
        // Stable sort keeps header order among equal weights
        tags.sort_by(|a, b| b.0.total_cmp(&a.0));
        tags.into_iter().find_map(|(_, tag)| Self::from_tag(tag))
    }
}

/// Error building the translation tables
#[derive(Debug, thiserror::Error)]
#[error("invalid locale table for '{locale}': {source}")]
pub struct LocaleTableError {
    locale: &'static str,
    #[source]
    source: serde_json::Error,
}

/// Translation lookup with placeholder interpolation
pub struct Translator {
    tables: HashMap<Locale, Value>,
    renderer: Handlebars<'static>,
}

impl Translator {
    /// Load the embedded `en` and `fr` tables
    pub fn embedded() -> Result<Self, LocaleTableError> {
        Self::from_tables(EN_TABLE, FR_TABLE)
    }

    fn from_tables(en: &str, fr: &str) -> Result<Self, LocaleTableError> {
        let parse = |locale: Locale, raw: &str| {
            serde_json::from_str::<Value>(raw).map_err(|source| LocaleTableError {
                locale: locale.code(),
                source,
            })
        };

        let mut tables = HashMap::new();
        tables.insert(Locale::En, parse(Locale::En, en)?);
        tables.insert(Locale::Fr, parse(Locale::Fr, fr)?);

        let mut renderer = Handlebars::new();
        // Strings are plain text, not HTML
        renderer.register_escape_fn(handlebars::no_escape);

        Ok(Self { tables, renderer })
    }

    /// Whole table for a locale, for clients that translate locally
    pub fn table(&self, locale: Locale) -> Option<&Value> {
        self.tables.get(&locale)
    }

    fn raw(&self, locale: Locale, key: &str) -> Option<&str> {
        let mut node = self.tables.get(&locale)?;
        for segment in key.split('.') {
            node = node.get(segment)?;
        }
        node.as_str()
    }

    /// Look up `key` without interpolation
    pub fn t(&self, locale: Locale, key: &str) -> String {
        self.t_with(locale, key, &HashMap::new())
    }

    /// Look up `key` and fill `{{placeholder}}` segments from `params`
    pub fn t_with(&self, locale: Locale, key: &str, params: &HashMap<&str, String>) -> String {
        let Some(template) = self
            .raw(locale, key)
            .or_else(|| self.raw(Locale::FALLBACK, key))
        else {
            tracing::debug!(locale = locale.code(), key, "missing translation");
            return key.to_string();
        };

        if !template.contains("{{") {
            return template.to_string();
        }

        match self.renderer.render_template(template, params) {
            Ok(rendered) => rendered,
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to interpolate translation");
                template.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translator() -> Translator {
        Translator::embedded().expect("embedded tables parse")
    }

    #[test]
    fn test_lookup_nested_key() {
        let t = translator();
        assert_eq!(t.t(Locale::En, "nav.signIn"), "Sign In");
        assert_eq!(t.t(Locale::Fr, "nav.signIn"), "Connexion");
        assert_eq!(
            t.t(Locale::En, "features.builder.title"),
            "Intuitive Survey Builder"
        );
    }

    #[test]
    fn test_interpolation() {
        let t = translator();
        let params = HashMap::from([("rate", "87%".to_string())]);
        assert_eq!(
            t.t_with(Locale::En, "hero.responseRate", &params),
            "Response rate: 87%"
        );
        assert_eq!(
            t.t_with(Locale::Fr, "hero.responseRate", &params),
            "Taux de réponse : 87%"
        );
    }

    #[test]
    fn test_interpolation_does_not_escape() {
        let t = translator();
        let params = HashMap::from([("message", "a < b & 'c'".to_string())]);
        assert_eq!(
            t.t_with(Locale::En, "errors.remote", &params),
            "The request could not be completed: a < b & 'c'"
        );
    }

    #[test]
    fn test_falls_back_to_english() {
        let t = Translator::from_tables(
            r#"{"notifications": {"saved": "Saved", "gone": "Gone", "hello": "Hello {{name}}"}}"#,
            r#"{"notifications": {"saved": "Enregistré"}}"#,
        )
        .unwrap();
        assert_eq!(t.t(Locale::Fr, "notifications.saved"), "Enregistré");
        assert_eq!(t.t(Locale::Fr, "notifications.gone"), "Gone");
        let params = HashMap::from([("name", "RH".to_string())]);
        assert_eq!(t.t_with(Locale::Fr, "notifications.hello", &params), "Hello RH");
    }

    #[test]
    fn test_embedded_tables_have_same_keys() {
        fn leaves(value: &Value, prefix: &str, out: &mut Vec<String>) {
            match value.as_object() {
                Some(map) => {
                    for (k, v) in map {
                        leaves(v, &format!("{prefix}{k}."), out);
                    }
                }
                None => out.push(prefix.trim_end_matches('.').to_string()),
            }
        }
        let t = translator();
        let (mut en, mut fr) = (Vec::new(), Vec::new());
        leaves(t.table(Locale::En).unwrap(), "", &mut en);
        leaves(t.table(Locale::Fr).unwrap(), "", &mut fr);
        en.sort();
        fr.sort();
        assert_eq!(en, fr);
    }

    #[test]
    fn test_missing_key_returns_key() {
        let t = translator();
        assert_eq!(t.t(Locale::Fr, "nope.nothing"), "nope.nothing");
        // Non-leaf keys are not strings
        assert_eq!(t.t(Locale::En, "nav"), "nav");
    }

    #[test]
    fn test_locale_from_tag() {
        assert_eq!(Locale::from_tag("fr-CA"), Some(Locale::Fr));
        assert_eq!(Locale::from_tag("EN_us"), Some(Locale::En));
        assert_eq!(Locale::from_tag("de"), None);
    }

    #[test]
    fn test_locale_from_accept_language() {
        assert_eq!(
            Locale::from_accept_language("de-DE, fr-CA;q=0.8, en;q=0.5"),
            Some(Locale::Fr)
        );
        assert_eq!(
            Locale::from_accept_language("en;q=0.4, fr;q=0.9"),
            Some(Locale::Fr)
        );
        assert_eq!(Locale::from_accept_language("de, es"), None);
    }
}
