use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Language, optional script, region and variant.
///
/// Parsed from either a BCP-47 tag (`ru-RU`, `sr-Latn-RS`) or the segmented form
/// `language_REGION_VARIANT` (`en_US_POSIX`, at most three segments).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Locale {
    language: String,
    script: String,
    region: String,
    variant: String,
}

impl Locale {
    pub fn new(language: &str, region: &str, variant: &str) -> Self {
        Self {
            language: language.to_ascii_lowercase(),
            script: String::new(),
            region: region.to_ascii_uppercase(),
            variant: variant.to_owned(),
        }
    }

    /// Parses a hyphenated BCP-47 tag. Extension and private-use subtags are rejected.
    pub fn for_language_tag(tag: &str) -> Result<Self, String> {
        let tag = tag.trim();
        let mut subtags = tag.split('-').peekable();
        let language = subtags
            .next()
            .filter(|subtag| is_language(subtag))
            .ok_or_else(|| format!("'{tag}' does not start with a language subtag"))?;

        let mut locale = Self {
            language: language.to_ascii_lowercase(),
            ..Self::default()
        };

        if let Some(script) = subtags.next_if(|subtag| is_script(subtag)) {
            locale.script = title_case(script);
        }
        if let Some(region) = subtags.next_if(|subtag| is_region(subtag)) {
            locale.region = region.to_ascii_uppercase();
        }

        let mut variants = Vec::new();
        for subtag in subtags {
            if !is_variant(subtag) {
                return Err(format!("unsupported subtag '{subtag}' in '{tag}'"));
            }
            variants.push(subtag);
        }
        locale.variant = variants.join("_");
        Ok(locale)
    }

    /// Parses `language[_REGION[_VARIANT]]`; anything after the second `_` is the variant.
    pub fn from_segments(value: &str) -> Result<Self, String> {
        let segments: Vec<&str> = value.splitn(3, '_').map(str::trim).collect();
        let language = segments.first().copied().unwrap_or_default();
        let region = segments.get(1).copied().unwrap_or_default();
        let variant = segments.get(2).copied().unwrap_or_default();

        if language.is_empty() && region.is_empty() {
            return Err(format!("'{value}' has neither language nor region"));
        }
        if !language.chars().all(|ch| ch.is_ascii_alphabetic()) {
            return Err(format!("invalid language '{language}' in '{value}'"));
        }
        if !region.chars().all(|ch| ch.is_ascii_alphanumeric()) {
            return Err(format!("invalid region '{region}' in '{value}'"));
        }

        Ok(Self::new(language, region, variant))
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn script(&self) -> &str {
        &self.script
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn variant(&self) -> &str {
        &self.variant
    }

    /// Hyphenated BCP-47 rendering, the inverse of [`Locale::for_language_tag`].
    pub fn to_language_tag(&self) -> String {
        let language = if self.language.is_empty() {
            "und"
        } else {
            self.language.as_str()
        };
        let mut parts = vec![language.to_owned()];
        if !self.script.is_empty() {
            parts.push(self.script.clone());
        }
        if !self.region.is_empty() {
            parts.push(self.region.clone());
        }
        if !self.variant.is_empty() {
            parts.extend(self.variant.split('_').map(str::to_owned));
        }
        parts.join("-")
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.trim().is_empty() {
            return Err("locale is blank".to_owned());
        }
        if value.contains('-') {
            Self::for_language_tag(value)
        } else {
            Self::from_segments(value)
        }
    }
}

/// Segmented rendering (`en_US_POSIX`), the inverse of [`Locale::from_segments`].
impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.language)?;
        if !self.region.is_empty() || !self.variant.is_empty() {
            write!(f, "_{}", self.region)?;
        }
        if !self.variant.is_empty() {
            write!(f, "_{}", self.variant)?;
        }
        Ok(())
    }
}

fn is_language(subtag: &str) -> bool {
    (2..=8).contains(&subtag.len()) && subtag.chars().all(|ch| ch.is_ascii_alphabetic())
}

fn is_script(subtag: &str) -> bool {
    subtag.len() == 4 && subtag.chars().all(|ch| ch.is_ascii_alphabetic())
}

fn is_region(subtag: &str) -> bool {
    (subtag.len() == 2 && subtag.chars().all(|ch| ch.is_ascii_alphabetic()))
        || (subtag.len() == 3 && subtag.chars().all(|ch| ch.is_ascii_digit()))
}

fn is_variant(subtag: &str) -> bool {
    let alphanumeric = subtag.chars().all(|ch| ch.is_ascii_alphanumeric());
    alphanumeric
        && ((5..=8).contains(&subtag.len())
            || (subtag.len() == 4 && subtag.starts_with(|ch: char| ch.is_ascii_digit())))
}

fn title_case(subtag: &str) -> String {
    let lower = subtag.to_ascii_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::Locale;

    #[test]
    fn hyphenated_tags_take_the_bcp47_path() {
        let locale: Locale = "ru-RU".parse().expect("valid tag");
        assert_eq!(locale.language(), "ru");
        assert_eq!(locale.region(), "RU");
        assert_eq!(locale.to_language_tag(), "ru-RU");

        let serbian: Locale = "sr-latn-rs".parse().expect("valid tag");
        assert_eq!(serbian.script(), "Latn");
        assert_eq!(serbian.to_language_tag(), "sr-Latn-RS");
    }

    #[test]
    fn underscore_values_take_the_segmented_path() {
        let one: Locale = "de".parse().expect("language only");
        let two: Locale = "en_US".parse().expect("language and region");
        let three: Locale = "ja_JP_JP".parse().expect("with variant");

        assert_eq!((one.language(), one.region()), ("de", ""));
        assert_eq!((two.language(), two.region()), ("en", "US"));
        assert_eq!(three.variant(), "JP");
    }

    #[test]
    fn segmented_form_limits_to_three_parts() {
        let locale: Locale = "th_TH_TH_extra".parse().expect("variant keeps the rest");
        assert_eq!(locale.variant(), "TH_extra");
        assert_eq!(locale.to_string(), "th_TH_TH_extra");
    }

    #[test]
    fn both_forms_round_trip() {
        for tag in ["ru-RU", "en-US", "sr-Latn-RS", "de-CH-1996", "es-419"] {
            let locale: Locale = tag.parse().expect("valid tag");
            assert_eq!(locale.to_language_tag(), tag);
        }
        for segmented in ["de", "en_US", "en_US_POSIX", "en__POSIX", "_US"] {
            let locale: Locale = segmented.parse().expect("valid segments");
            assert_eq!(locale.to_string(), segmented);
        }
    }

    #[test]
    fn rejects_blank_and_malformed_values() {
        assert!("   ".parse::<Locale>().is_err());
        assert!("en-US-x-private".parse::<Locale>().is_err());
        assert!("1n_US".parse::<Locale>().is_err());
    }
}
