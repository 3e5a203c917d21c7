use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::config::{lookup_raw, Config, PROFILE_PROPERTY};
use crate::convert::builtin::extended_converters;
use crate::convert::{ConvertFn, ConverterRegistry, TypeTag, TypedValue, EXTENDED_CONVERTER_ORDINAL};
use crate::error::{Error, Result};
use crate::interceptor::profile::parse_profiles;
use crate::interceptor::{
    Base64SecretHandler, ExpressionInterceptor, Interceptor, InterceptorChain, ProfileInterceptor,
    SecretKeysHandler,
};
use crate::provider::{SearchPath, SourceProvider};
use crate::source::ConfigSource;
use crate::validate::{self, Validator};

/// Sources and providers keep their relative registration order; it breaks ordinal ties.
enum Registration {
    Source(ConfigSource),
    Provider(Box<dyn SourceProvider>),
}

/// Collects sources, converters, interceptors and a validator, then builds a [`Config`].
pub struct ConfigBuilder {
    registrations: Vec<Registration>,
    search_path: SearchPath,
    converters: Vec<(TypeTag, i32, ConvertFn)>,
    default_converters: bool,
    interceptors: Vec<Arc<dyn Interceptor>>,
    default_interceptors: bool,
    secret_handlers: Vec<Arc<dyn SecretKeysHandler>>,
    profiles: Option<Vec<String>>,
    validator: Option<Arc<dyn Validator>>,
    validate_unknown: bool,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            registrations: Vec::new(),
            search_path: SearchPath::default(),
            converters: Vec::new(),
            default_converters: false,
            interceptors: Vec::new(),
            default_interceptors: false,
            secret_handlers: Vec::new(),
            profiles: None,
            validator: None,
            validate_unknown: false,
        }
    }

    /// Where providers look for files.
    pub fn with_search_path(mut self, search_path: SearchPath) -> Self {
        self.search_path = search_path;
        self
    }

    pub fn with_source(mut self, source: ConfigSource) -> Self {
        self.registrations.push(Registration::Source(source));
        self
    }

    pub fn with_sources(mut self, sources: impl IntoIterator<Item = ConfigSource>) -> Self {
        self.registrations
            .extend(sources.into_iter().map(Registration::Source));
        self
    }

    pub fn with_provider(mut self, provider: impl SourceProvider + 'static) -> Self {
        self.registrations
            .push(Registration::Provider(Box::new(provider)));
        self
    }

    pub fn with_boxed_provider(mut self, provider: Box<dyn SourceProvider>) -> Self {
        self.registrations.push(Registration::Provider(provider));
        self
    }

    /// System properties (400) and the environment (300). `environment` replaces the
    /// process environment when given.
    pub fn with_default_sources(
        self,
        environment: Option<BTreeMap<String, String>>,
        system_properties: BTreeMap<String, String>,
    ) -> Self {
        self.with_source(ConfigSource::system_properties(system_properties))
            .with_source(ConfigSource::environment(environment))
    }

    pub fn with_converter<F>(mut self, tag: TypeTag, ordinal: i32, convert: F) -> Self
    where
        F: Fn(&str) -> std::result::Result<TypedValue, String> + Send + Sync + 'static,
    {
        self.converters.push((tag, ordinal, Arc::new(convert)));
        self
    }

    /// Text, date/time pattern, charset and locale converters at ordinal 101.
    pub fn with_default_converters(mut self) -> Self {
        self.default_converters = true;
        self
    }

    pub fn with_interceptor(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Reads active profiles from `strata.config.profile` unless set explicitly.
    pub fn with_default_interceptors(mut self) -> Self {
        self.default_interceptors = true;
        self
    }

    pub fn with_secret_handler(mut self, handler: impl SecretKeysHandler + 'static) -> Self {
        self.secret_handlers.push(Arc::new(handler));
        self
    }

    pub fn with_profiles<I, S>(mut self, profiles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.profiles = Some(profiles.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Whatever validator this build was compiled with; none without the `validation` feature.
    pub fn with_discovered_validator(mut self) -> Self {
        self.validator = validate::discovered_validator();
        self
    }

    /// Fail the build on names the validator does not know. Off by default.
    pub fn with_validate_unknown(mut self, validate_unknown: bool) -> Self {
        self.validate_unknown = validate_unknown;
        self
    }

    pub fn build(self) -> Result<Config> {
        let mut sources = Vec::new();
        for registration in self.registrations {
            match registration {
                Registration::Source(source) => sources.push(source),
                Registration::Provider(provider) => {
                    let discovered = provider.discover(&self.search_path)?;
                    debug!(
                        provider = provider.name(),
                        sources = discovered.len(),
                        "provider discovery finished"
                    );
                    sources.extend(discovered);
                }
            }
        }
        sources.sort_by_key(|source| Reverse(source.ordinal()));

        let mut converters = ConverterRegistry::with_builtins();
        if self.default_converters {
            for (tag, convert) in extended_converters() {
                converters.register_fn(tag, EXTENDED_CONVERTER_ORDINAL, convert)?;
            }
        }
        for (tag, ordinal, convert) in self.converters {
            converters.register_fn(tag, ordinal, convert)?;
        }

        let mut handlers: BTreeMap<String, Arc<dyn SecretKeysHandler>> = BTreeMap::new();
        let builtin: Arc<dyn SecretKeysHandler> = Arc::new(Base64SecretHandler);
        for handler in std::iter::once(builtin).chain(self.secret_handlers) {
            let name = handler.name().to_owned();
            if handlers.insert(name.clone(), handler).is_some() {
                return Err(Error::Config(format!(
                    "secret handler '{name}' is registered more than once"
                )));
            }
        }

        let profiles = match self.profiles {
            Some(profiles) => profiles,
            None if self.default_interceptors => lookup_raw(&sources, PROFILE_PROPERTY)
                .map(|value| parse_profiles(value.raw_value()))
                .unwrap_or_default(),
            None => Vec::new(),
        };

        let mut interceptors = self.interceptors;
        interceptors.push(Arc::new(ExpressionInterceptor::new(handlers)));
        if !profiles.is_empty() {
            interceptors.push(Arc::new(ProfileInterceptor::new(profiles.clone())));
        }

        let config = Config::assemble(
            sources,
            converters,
            InterceptorChain::new(interceptors),
            self.validator,
            profiles,
        );

        if self.validate_unknown {
            match config.validator() {
                Some(validator) => {
                    if let Some(failure) = validator
                        .check_unknown(config.property_names())
                        .into_iter()
                        .next()
                    {
                        return Err(Error::ValidationError(failure));
                    }
                }
                None => debug!("unknown-key validation requested without a validator"),
            }
        }

        debug!(
            sources = config.sources().len(),
            properties = config.property_names().len(),
            interceptors = ?config.interceptor_names(),
            profiles = ?config.profiles(),
            validator = config.validator().is_some(),
            "configuration built"
        );
        Ok(config)
    }
}
