//! Navigation hooks.
//!
//! Listeners are called in registration order, one at a time, for every hook.

use std::fmt;

use async_trait::async_trait;

use crate::navigation::error::HostError;
use crate::navigation::spec::Spec;
use crate::navigation::validation::ValidationResult;
use crate::routing::{RouteInfo, RouteRequest};

/// Points in a navigation where listeners run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    BeforeValidate,
    DoCheckValidity,
    DoValidate,
    AfterValidate,
    BeforeNormalizeUrl,
    DoNormalizeUrl,
    AfterNormalizeUrl,
    BeforePopState,
    AfterPopState,
    AfterSpecLoad,
    BeforeRefresh,
    DoRefresh,
    AfterRefresh,
}

impl Hook {
    pub const ALL: [Hook; 13] = [
        Hook::BeforeValidate,
        Hook::DoCheckValidity,
        Hook::DoValidate,
        Hook::AfterValidate,
        Hook::BeforeNormalizeUrl,
        Hook::DoNormalizeUrl,
        Hook::AfterNormalizeUrl,
        Hook::BeforePopState,
        Hook::AfterPopState,
        Hook::AfterSpecLoad,
        Hook::BeforeRefresh,
        Hook::DoRefresh,
        Hook::AfterRefresh,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Hook::BeforeValidate => "beforeValidate",
            Hook::DoCheckValidity => "doCheckValidity",
            Hook::DoValidate => "doValidate",
            Hook::AfterValidate => "afterValidate",
            Hook::BeforeNormalizeUrl => "beforeNormalizeURL",
            Hook::DoNormalizeUrl => "doNormalizeURL",
            Hook::AfterNormalizeUrl => "afterNormalizeURL",
            Hook::BeforePopState => "beforePopState",
            Hook::AfterPopState => "afterPopState",
            Hook::AfterSpecLoad => "afterSpecLoad",
            Hook::BeforeRefresh => "beforeRefresh",
            Hook::DoRefresh => "doRefresh",
            Hook::AfterRefresh => "afterRefresh",
        }
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a listener sees, and may change, during a hook.
pub struct HookContext<'a> {
    pub hook: Hook,
    pub route: &'a RouteInfo,
    pub url: &'a str,
    /// The spec just loaded, for `afterSpecLoad`.
    pub spec: Option<&'a Spec>,
    /// The running verdict, for validation hooks.
    pub validation: Option<&'a mut ValidationResult>,
    replacement: Option<RouteRequest>,
}

impl<'a> HookContext<'a> {
    pub fn new(hook: Hook, route: &'a RouteInfo, url: &'a str) -> Self {
        Self {
            hook,
            route,
            url,
            spec: None,
            validation: None,
            replacement: None,
        }
    }

    pub fn with_spec(mut self, spec: &'a Spec) -> Self {
        self.spec = Some(spec);
        self
    }

    pub fn with_validation(mut self, validation: &'a mut ValidationResult) -> Self {
        self.validation = Some(validation);
        self
    }

    /// Ask the controller to replace the current URL after this hook.
    /// The last request wins.
    pub fn request_replace(&mut self, request: RouteRequest) {
        self.replacement = Some(request);
    }

    pub fn take_replacement(&mut self) -> Option<RouteRequest> {
        self.replacement.take()
    }
}

/// Receives navigation hooks.
#[async_trait]
pub trait HookListener: Send + Sync {
    async fn on_hook(&self, ctx: &mut HookContext<'_>) -> Result<(), HostError>;
}
