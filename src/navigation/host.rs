//! View host contract.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::navigation::error::HostError;
use crate::navigation::spec::Spec;
use crate::routing::RouteInfo;

/// A mounted view that can re-render for a route.
#[async_trait]
pub trait RefreshTarget: Send + Sync {
    async fn refresh(&self, route: &RouteInfo) -> Result<(), HostError>;
}

/// The component tree hosting the routed views.
#[async_trait]
pub trait ViewHost: Send + Sync {
    /// Remove the organizers a spec attached.
    async fn detach_organizers(&self, spec: &Spec) -> Result<(), HostError>;

    /// Attach a spec's organizers, configured with the effective settings.
    async fn attach_organizers(&self, spec: &Spec, settings: &Value) -> Result<(), HostError>;

    /// The mounted view for a component, if any.
    fn mounted(&self, component: &str) -> Option<Arc<dyn RefreshTarget>>;
}

/// A host without views. Organizer changes are only logged.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadlessHost;

#[async_trait]
impl ViewHost for HeadlessHost {
    async fn detach_organizers(&self, spec: &Spec) -> Result<(), HostError> {
        tracing::debug!(spec = %spec.name, "Organizers detached");
        Ok(())
    }

    async fn attach_organizers(&self, spec: &Spec, _settings: &Value) -> Result<(), HostError> {
        tracing::debug!(
            spec = %spec.name,
            organizers = spec.organizers.len(),
            "Organizers attached"
        );
        Ok(())
    }

    fn mounted(&self, _component: &str) -> Option<Arc<dyn RefreshTarget>> {
        None
    }
}
