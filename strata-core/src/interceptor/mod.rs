pub mod expression;
pub mod profile;
pub mod secret;

use std::cell::RefCell;
use std::cmp::Reverse;
use std::fmt;
use std::sync::Arc;

pub use expression::{ExpressionInterceptor, MAX_EXPANSION_DEPTH};
pub use profile::ProfileInterceptor;
pub use secret::{Base64SecretHandler, SecretKeysHandler};

use crate::config::{lookup_raw, ConfigValue};
use crate::error::{Error, Result};
use crate::source::ConfigSource;

pub const DEFAULT_INTERCEPTOR_PRIORITY: i32 = 1000;
pub const PROFILE_INTERCEPTOR_PRIORITY: i32 = 1200;
pub const EXPRESSION_INTERCEPTOR_PRIORITY: i32 = 1300;

/// One pass over a lookup. Higher priority runs first and sees the value the
/// lower passes (and finally the sources) produce through
/// [`InterceptorContext::proceed`].
pub trait Interceptor: Send + Sync {
    fn name(&self) -> &str;

    fn priority(&self) -> i32 {
        DEFAULT_INTERCEPTOR_PRIORITY
    }

    fn intercept(
        &self,
        context: &InterceptorContext<'_>,
        name: &str,
    ) -> Result<Option<ConfigValue>>;
}

/// Position in the chain for a single lookup, plus the keys currently being expanded.
#[derive(Clone, Copy)]
pub struct InterceptorContext<'a> {
    interceptors: &'a [Arc<dyn Interceptor>],
    position: usize,
    sources: &'a [ConfigSource],
    visiting: &'a RefCell<Vec<String>>,
}

impl<'a> InterceptorContext<'a> {
    /// Hands `name` to the next interceptor, or to the sources once the chain is exhausted.
    pub fn proceed(&self, name: &str) -> Result<Option<ConfigValue>> {
        match self.interceptors.get(self.position) {
            Some(interceptor) => {
                let next = Self {
                    position: self.position + 1,
                    ..*self
                };
                interceptor.intercept(&next, name)
            }
            None => Ok(lookup_raw(self.sources, name)),
        }
    }

    /// Looks `name` up through the whole chain again, as a nested reference.
    pub fn resolve(&self, name: &str) -> Result<Option<ConfigValue>> {
        {
            let visiting = self.visiting.borrow();
            if let Some(start) = visiting.iter().position(|key| key == name) {
                let mut chain = visiting[start..].to_vec();
                chain.push(name.to_owned());
                return Err(Error::CircularExpression { chain });
            }
            if visiting.len() >= MAX_EXPANSION_DEPTH {
                let mut chain = visiting.clone();
                chain.push(name.to_owned());
                return Err(Error::CircularExpression { chain });
            }
        }

        self.visiting.borrow_mut().push(name.to_owned());
        let restart = Self {
            position: 0,
            ..*self
        };
        let result = restart.proceed(name);
        self.visiting.borrow_mut().pop();
        result
    }

    /// Keys whose expansion is in progress, outermost first.
    pub fn visiting(&self) -> Vec<String> {
        self.visiting.borrow().clone()
    }
}

/// Interceptors sorted by descending priority; equal priorities keep registration order.
#[derive(Clone, Default)]
pub struct InterceptorChain {
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl InterceptorChain {
    pub fn new(mut interceptors: Vec<Arc<dyn Interceptor>>) -> Self {
        interceptors.sort_by_key(|interceptor| Reverse(interceptor.priority()));
        Self { interceptors }
    }

    pub fn names(&self) -> Vec<&str> {
        self.interceptors
            .iter()
            .map(|interceptor| interceptor.name())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    pub fn resolve(&self, sources: &[ConfigSource], name: &str) -> Result<Option<ConfigValue>> {
        let visiting = RefCell::new(Vec::new());
        let context = InterceptorContext {
            interceptors: &self.interceptors,
            position: 0,
            sources,
            visiting: &visiting,
        };
        context.resolve(name)
    }
}

impl fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
