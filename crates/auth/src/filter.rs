//! Framework-agnostic authorization filter.
//!
//! [`AuthorizeFilter`] sits between routing and handler invocation. It is
//! parameterised by the [`Pipeline`] it runs in (HTTP middleware, command
//! interceptor, ...) and by the [`DecisionEngine`] it delegates to. It keeps
//! no per-request state: every call returns its [`FilterOutcome`].

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use warden_core::OperationId;

use crate::{AllowList, Decision, DecisionEngine, Denial, PolicyRegistry, Principal, StandardEngine};

/// Misuse of the filter by the hosting pipeline. Never an authorization outcome.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContractViolation {
    #[error("operation '{0}' is not registered with the policy registry")]
    UnknownOperation(OperationId),

    #[error("request reached the authorization filter without a resolvable operation")]
    UnresolvedOperation,

    #[error("authorization cannot run inside a cache that does not support revalidation")]
    RevalidationUnsupported,
}

/// The request-processing API a filter adapts to.
pub trait Pipeline: 'static {
    /// What the pipeline hands to the filter (and later to revalidation).
    type Context: 'static;

    /// The principal the upstream authentication step attached, if any.
    fn principal(ctx: &Self::Context) -> Option<&dyn Principal>;
}

/// Answer of a revalidation callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheValidation {
    /// The cached response may be served to this request.
    Valid,
    /// Do not serve the cached response to this request.
    Invalid,
}

/// Callback the cache layer runs before serving a cached response.
///
/// Must be callable from any task; it only sees the context it is given.
pub trait Revalidate<C>: Send + Sync {
    fn revalidate(&self, ctx: &C) -> CacheValidation;
}

/// Response caching hooks offered by a pipeline for the current request.
pub trait CachePolicy<C> {
    /// Max-age for shared (proxy) caches.
    fn set_shared_max_age(&self, max_age: Duration);

    fn add_validation_callback(&self, callback: Arc<dyn Revalidate<C>>);

    /// Caches that cannot call back before serving must say so.
    fn supports_revalidation(&self) -> bool {
        true
    }
}

/// Result of running the filter for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FilterOutcome {
    /// The bypass marker applies; no decision was made.
    Bypassed,
    /// No allow-list guards the operation.
    Unprotected,
    /// Proceed. `revalidation` is true when a cache callback was registered.
    Accepted { revalidation: bool },
    /// Short-circuit with the corresponding failure response.
    Denied { denial: Denial },
}

impl FilterOutcome {
    /// Whether the protected operation may run.
    pub fn proceeds(&self) -> bool {
        !matches!(self, FilterOutcome::Denied { .. })
    }
}

/// Re-runs the decision for a later request that would be served from cache.
pub struct Revalidator<P: Pipeline, E: DecisionEngine = StandardEngine> {
    engine: Arc<E>,
    operation: OperationId,
    allow_lists: Arc<[AllowList]>,
    _pipeline: PhantomData<fn() -> P>,
}

impl<P: Pipeline, E: DecisionEngine> Revalidator<P, E> {
    pub fn decide(&self, ctx: &P::Context) -> Decision {
        self.engine.decide_all(P::principal(ctx), &self.allow_lists)
    }
}

impl<P: Pipeline, E: DecisionEngine> Revalidate<P::Context> for Revalidator<P, E> {
    fn revalidate(&self, ctx: &P::Context) -> CacheValidation {
        let decision = self.decide(ctx);
        tracing::debug!(
            operation = %self.operation,
            decision = %decision,
            "cached response revalidated"
        );
        if decision.is_accepted() {
            CacheValidation::Valid
        } else {
            CacheValidation::Invalid
        }
    }
}

/// Authorization filter for one pipeline.
pub struct AuthorizeFilter<P: Pipeline, E: DecisionEngine = StandardEngine> {
    engine: Arc<E>,
    registry: Arc<PolicyRegistry>,
    _pipeline: PhantomData<fn() -> P>,
}

impl<P: Pipeline> AuthorizeFilter<P, StandardEngine> {
    pub fn new(registry: Arc<PolicyRegistry>) -> Self {
        Self::with_engine(Arc::new(StandardEngine), registry)
    }
}

impl<P: Pipeline, E: DecisionEngine> Clone for AuthorizeFilter<P, E> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            registry: Arc::clone(&self.registry),
            _pipeline: PhantomData,
        }
    }
}

impl<P: Pipeline, E: DecisionEngine> AuthorizeFilter<P, E> {
    pub fn with_engine(engine: Arc<E>, registry: Arc<PolicyRegistry>) -> Self {
        Self {
            engine,
            registry,
            _pipeline: PhantomData,
        }
    }

    pub fn registry(&self) -> &PolicyRegistry {
        &self.registry
    }

    /// Authorize `ctx` for `operation`.
    ///
    /// When `cache` is given and the request is accepted, shared caches are
    /// told the response is immediately stale and a [`Revalidator`] is
    /// registered so the cache re-decides before serving anyone else.
    pub fn authorize(
        &self,
        ctx: &P::Context,
        operation: &OperationId,
        cache: Option<&dyn CachePolicy<P::Context>>,
    ) -> Result<FilterOutcome, ContractViolation> {
        let policy = self
            .registry
            .resolve(operation)
            .ok_or_else(|| ContractViolation::UnknownOperation(operation.clone()))?;

        if policy.bypass {
            return Ok(FilterOutcome::Bypassed);
        }
        if policy.is_unprotected() {
            return Ok(FilterOutcome::Unprotected);
        }

        let decision = self.engine.decide_all(P::principal(ctx), &policy.allow_lists);
        match decision.denial() {
            Some(denial) => Ok(FilterOutcome::Denied { denial }),
            None => {
                let Some(cache) = cache else {
                    return Ok(FilterOutcome::Accepted { revalidation: false });
                };
                if !cache.supports_revalidation() {
                    return Err(ContractViolation::RevalidationUnsupported);
                }

                cache.set_shared_max_age(Duration::ZERO);
                cache.add_validation_callback(Arc::new(Revalidator::<P, E> {
                    engine: Arc::clone(&self.engine),
                    operation: operation.clone(),
                    allow_lists: Arc::clone(&policy.allow_lists),
                    _pipeline: PhantomData,
                }));
                Ok(FilterOutcome::Accepted { revalidation: true })
            }
        }
    }
}
