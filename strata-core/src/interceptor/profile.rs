use crate::config::ConfigValue;
use crate::error::Result;
use crate::interceptor::{Interceptor, InterceptorContext, PROFILE_INTERCEPTOR_PRIORITY};

/// Serves `%profile.key` in place of `key` while `profile` is active.
#[derive(Debug, Clone)]
pub struct ProfileInterceptor {
    profiles: Vec<String>,
}

impl ProfileInterceptor {
    pub fn new(profiles: Vec<String>) -> Self {
        Self { profiles }
    }

    pub fn profiles(&self) -> &[String] {
        &self.profiles
    }
}

impl Interceptor for ProfileInterceptor {
    fn name(&self) -> &str {
        "profile"
    }

    fn priority(&self) -> i32 {
        PROFILE_INTERCEPTOR_PRIORITY
    }

    fn intercept(
        &self,
        context: &InterceptorContext<'_>,
        name: &str,
    ) -> Result<Option<ConfigValue>> {
        if name.starts_with('%') {
            return context.proceed(name);
        }

        // last listed profile wins
        for profile in self.profiles.iter().rev() {
            if let Some(value) = context.proceed(&profile_key(profile, name))? {
                return Ok(Some(value.with_name(name)));
            }
        }
        context.proceed(name)
    }
}

pub fn profile_key(profile: &str, name: &str) -> String {
    format!("%{profile}.{name}")
}

/// The unprefixed name of `name` if it is prefixed with one of `profiles`.
pub fn strip_active_profile<'n>(name: &'n str, profiles: &[String]) -> Option<&'n str> {
    let rest = name.strip_prefix('%')?;
    let (profile, key) = rest.split_once('.')?;
    (!key.is_empty() && profiles.iter().any(|active| active == profile)).then_some(key)
}

/// Splits a comma-separated profile list, dropping blanks.
pub fn parse_profiles(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|profile| !profile.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::interceptor::InterceptorChain;
    use crate::source::ConfigSource;

    fn chain(profiles: &[&str]) -> InterceptorChain {
        let profiles = profiles.iter().map(|profile| (*profile).to_owned()).collect();
        InterceptorChain::new(vec![Arc::new(ProfileInterceptor::new(profiles))])
    }

    fn sources() -> Vec<ConfigSource> {
        vec![
            ConfigSource::from_pairs("high", 300, [("db.url", "prod-db")]),
            ConfigSource::from_pairs(
                "low",
                100,
                [("%dev.db.url", "dev-db"), ("%test.db.url", "test-db")],
            ),
        ]
    }

    #[test]
    fn active_profile_overrides_unprefixed_key_from_any_source() {
        let value = chain(&["dev"])
            .resolve(&sources(), "db.url")
            .expect("lookup")
            .expect("present");
        assert_eq!(value.value(), "dev-db");
        assert_eq!(value.name(), "db.url");
        assert_eq!(value.source_name(), "low");
    }

    #[test]
    fn last_listed_profile_wins() {
        let value = chain(&["dev", "test"])
            .resolve(&sources(), "db.url")
            .expect("lookup")
            .expect("present");
        assert_eq!(value.value(), "test-db");
    }

    #[test]
    fn inactive_profiles_fall_back_to_plain_key() {
        let value = chain(&["staging"])
            .resolve(&sources(), "db.url")
            .expect("lookup")
            .expect("present");
        assert_eq!(value.value(), "prod-db");
    }

    #[test]
    fn profile_lists_and_prefixes_parse() {
        assert_eq!(parse_profiles(" dev, ,test "), vec!["dev", "test"]);
        let active = vec!["dev".to_owned()];
        assert_eq!(strip_active_profile("%dev.db.url", &active), Some("db.url"));
        assert_eq!(strip_active_profile("%prod.db.url", &active), None);
        assert_eq!(strip_active_profile("db.url", &active), None);
    }
}
