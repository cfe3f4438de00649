//! `warden-auth`: the authorization decision engine and its filter core.
//!
//! This crate is intentionally decoupled from HTTP and storage: pipelines
//! plug in through [`Pipeline`] and [`CachePolicy`].

pub mod allow_list;
pub mod authorize;
pub mod decision;
pub mod filter;
pub mod policy;
pub mod principal;
pub mod roles;
pub mod token;

pub use allow_list::{AllowList, split_list};
pub use authorize::{
    DecisionEngine, DecisionExplanation, FailedCheck, PrincipalState, StandardEngine, decide,
    decide_all, explain,
};
pub use decision::{Decision, Denial};
pub use filter::{
    AuthorizeFilter, CachePolicy, CacheValidation, ContractViolation, FilterOutcome, Pipeline,
    Revalidate, Revalidator,
};
pub use policy::{GroupPolicy, OperationPolicy, PolicyRegistry, RegistryError, ResolvedPolicy};
pub use principal::{Principal, UserPrincipal};
pub use roles::Role;
pub use token::{
    Hs256Verifier, SessionClaims, TokenError, TokenValidationError, TokenVerifier, validate_claims,
};
