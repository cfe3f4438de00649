//! Pipelines the authorization filter runs in.
//!
//! - [`HttpPipeline`]: axum middleware; the principal is the
//!   [`UserPrincipal`] request extension set by `authenticate`.
//! - [`CommandPipeline`]: in-process command invocation, checked before the
//!   command runs.

use axum::extract::Request;
use thiserror::Error;

use warden_auth::{
    AuthorizeFilter, ContractViolation, Denial, FilterOutcome, Pipeline, Principal, UserPrincipal,
};
use warden_core::OperationId;

/// HTTP request pipeline.
pub enum HttpPipeline {}

impl Pipeline for HttpPipeline {
    type Context = Request;

    fn principal(ctx: &Request) -> Option<&dyn Principal> {
        ctx.extensions()
            .get::<UserPrincipal>()
            .map(|p| p as &dyn Principal)
    }
}

/// A command about to be invoked on behalf of `principal`.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub principal: Option<UserPrincipal>,
    pub operation: OperationId,
}

impl CommandContext {
    pub fn new(principal: Option<UserPrincipal>, operation: OperationId) -> Self {
        Self {
            principal,
            operation,
        }
    }
}

/// Command invocation pipeline.
pub enum CommandPipeline {}

impl Pipeline for CommandPipeline {
    type Context = CommandContext;

    fn principal(ctx: &CommandContext) -> Option<&dyn Principal> {
        ctx.principal.as_ref().map(|p| p as &dyn Principal)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandAuthzError {
    #[error("command denied: {0}")]
    Denied(Denial),

    #[error(transparent)]
    Contract(#[from] ContractViolation),
}

/// Check authorization for a command.
///
/// This is intended to be called **before** the command runs. Commands are
/// never cached, so no revalidation is registered.
pub fn authorize_command(
    filter: &AuthorizeFilter<CommandPipeline>,
    ctx: &CommandContext,
) -> Result<FilterOutcome, CommandAuthzError> {
    match filter.authorize(ctx, &ctx.operation, None)? {
        FilterOutcome::Denied { denial } => Err(CommandAuthzError::Denied(denial)),
        outcome => Ok(outcome),
    }
}
