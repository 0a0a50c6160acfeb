//! Navigation state machine.
//!
//! # Responsibilities
//! - Turn navigation requests into history entries and resolved routes
//! - Validate, auto-fix and normalize the current URL
//! - Switch specs and refresh the mounted view
//! - Follow back/forward navigation
//!
//! # State Machine
//! ```text
//! UNINITIALIZED ──start──▶ IDLE ──open──▶ VALIDATING ──▶ (SWITCHING_SPEC) ──▶ REFRESHING ──▶ IDLE
//!                           │                  │                 │                  │
//!                           └──────────────────┴───── jump ──────┴──────────────────┴──▶ UNLOADING
//! ```
//!
//! # Design Decisions
//! - One navigation at a time; a concurrent call fails with `Busy`
//! - The history entry is pushed before validation and never rolled back
//! - Shared state lives behind `ArcSwap`, so readers never block a navigation
//! - Route registration copies the table and swaps it in whole

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use arc_swap::{ArcSwap, ArcSwapOption};
use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::Instrument;
use url::Url;

use crate::config::overlay::{resolve_config, ResolvedSettings};
use crate::config::schema::{RouteConfig, RouterConfig, RouterSettings};
use crate::navigation::error::{NavigationError, RouteValidationError};
use crate::navigation::history::{HistoryAdapter, HistoryState, PopStateEvent};
use crate::navigation::hooks::{Hook, HookContext, HookListener};
use crate::navigation::host::ViewHost;
use crate::navigation::spec::{Spec, SpecLoadOptions, SpecLoader};
use crate::navigation::state::NavigationState;
use crate::navigation::validation::{
    fix_parameters, log_failures, ValidationGateway, ValidationRequest, ValidationResult,
};
use crate::observability::metrics;
use crate::observability::tracing::navigation_span;
use crate::routing::{
    parse_query, NavigationOptions, RouteInfo, RouteRequest, RouteTable, RoutingError, UrlBuilder,
};

/// External collaborators the controller drives.
#[derive(Clone)]
pub struct Collaborators {
    pub history: Arc<dyn HistoryAdapter>,
    pub validator: Arc<dyn ValidationGateway>,
    pub specs: Arc<dyn SpecLoader>,
    pub host: Arc<dyn ViewHost>,
}

/// How a navigation ended.
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationOutcome {
    /// The route was opened in place.
    Opened(Arc<RouteInfo>),
    /// A full page load of this URL was requested.
    Jumped(String),
    /// An initial popstate was ignored.
    Suppressed,
}

/// Resets the controller when a navigation ends, however it ends.
struct InFlight<'a> {
    controller: &'a NavigationController,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.controller.set_state(NavigationState::Idle);
        self.controller.in_flight.store(false, Ordering::Release);
    }
}

/// Drives navigation for one page.
pub struct NavigationController {
    base_settings: RouterSettings,
    base_url: Url,
    table: ArcSwap<RouteTable>,
    current: ArcSwap<RouteInfo>,
    settings: ArcSwap<ResolvedSettings>,
    active_spec: ArcSwapOption<Spec>,
    specs: DashMap<String, Arc<Spec>>,
    history: Arc<dyn HistoryAdapter>,
    validator: Arc<dyn ValidationGateway>,
    loader: Arc<dyn SpecLoader>,
    host: Arc<dyn ViewHost>,
    listeners: Vec<Arc<dyn HookListener>>,
    state: AtomicU8,
    in_flight: AtomicBool,
    generation: AtomicU64,
    suppress_popstate: AtomicBool,
    registration: Mutex<()>,
}

impl NavigationController {
    /// Build a controller. Compiles every route and resolves the current
    /// location; a bad route fails here.
    pub fn new(config: &RouterConfig, collaborators: Collaborators) -> Result<Self, NavigationError> {
        let table = RouteTable::from_config(&config.routes, &config.patterns)?;
        let base_url = Url::parse(&config.settings.app_base_url).map_err(|source| RoutingError::InvalidUrl {
            url: config.settings.app_base_url.clone(),
            source,
        })?;

        let specs = DashMap::new();
        for (name, spec) in &config.specs {
            let mut spec = spec.clone();
            if spec.name.is_empty() {
                spec.name = name.clone();
            }
            specs.insert(name.clone(), Arc::new(spec));
        }

        let current = table.resolve_str(&collaborators.history.current_url(), &base_url)?;
        let settings = ResolvedSettings::base(&config.settings)?;

        tracing::info!(
            routes = table.len(),
            specs = specs.len(),
            url = %current.url,
            route = ?current.name,
            "Navigation controller created"
        );

        Ok(Self {
            base_settings: config.settings.clone(),
            base_url,
            table: ArcSwap::from_pointee(table),
            current: ArcSwap::from_pointee(current),
            settings: ArcSwap::from_pointee(settings),
            active_spec: ArcSwapOption::empty(),
            specs,
            history: collaborators.history,
            validator: collaborators.validator,
            loader: collaborators.specs,
            host: collaborators.host,
            listeners: Vec::new(),
            state: AtomicU8::new(NavigationState::Uninitialized as u8),
            in_flight: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            suppress_popstate: AtomicBool::new(config.settings.suppress_initial_popstate),
            registration: Mutex::new(()),
        })
    }

    /// Register a hook listener. Listeners run in registration order.
    pub fn with_listener(mut self, listener: Arc<dyn HookListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    // --- Accessors ---

    pub fn state(&self) -> NavigationState {
        NavigationState::from(self.state.load(Ordering::Acquire))
    }

    pub fn current_route(&self) -> Arc<RouteInfo> {
        self.current.load_full()
    }

    pub fn active_spec(&self) -> Option<Arc<Spec>> {
        self.active_spec.load_full()
    }

    /// Settings in effect for the active spec.
    pub fn settings(&self) -> Arc<ResolvedSettings> {
        self.settings.load_full()
    }

    pub fn table(&self) -> Arc<RouteTable> {
        self.table.load_full()
    }

    /// Number of completed navigations.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// A cached spec.
    pub fn spec(&self, name: &str) -> Option<Arc<Spec>> {
        self.specs.get(name).map(|entry| entry.value().clone())
    }

    // --- Lifecycle ---

    /// Stamp the current history entry, activate the current route's spec and
    /// open the current location.
    pub async fn start(&self, options: NavigationOptions) -> Result<NavigationOutcome, NavigationError> {
        match self.state() {
            NavigationState::Uninitialized => {}
            NavigationState::Unloading => return Err(NavigationError::Unloading),
            _ => return Err(NavigationError::AlreadyStarted),
        }

        self.history.replace_entry(HistoryState::new("connect"), None)?;
        self.state
            .compare_exchange(
                NavigationState::Uninitialized as u8,
                NavigationState::Idle as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map_err(|_| NavigationError::AlreadyStarted)?;
        tracing::info!(url = %self.history.current_url(), "Router started");

        let current = self.current_route();
        if let Some(spec_name) = current.spec_name.as_deref() {
            let span = navigation_span("start", spec_name);
            async {
                let _guard = self.begin()?;
                self.set_state(NavigationState::SwitchingSpec);
                self.switch_spec(spec_name, &options).await
            }
            .instrument(span)
            .await?;
        }

        self.open_route(None, options).await
    }

    /// Listen for popstate events until `shutdown` fires.
    pub async fn run(self: Arc<Self>, shutdown: broadcast::Receiver<()>) {
        let events = self.history.subscribe();
        self.listen(events, shutdown).await;
    }

    /// Subscribe to popstate events now and listen on a new task.
    pub fn spawn(self: &Arc<Self>, shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        let events = self.history.subscribe();
        let controller = Arc::clone(self);
        tokio::spawn(async move { controller.listen(events, shutdown).await })
    }

    async fn listen(&self, mut events: broadcast::Receiver<PopStateEvent>, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!("Popstate listener starting");

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Ok(event) => {
                        if let Err(e) = self.handle_pop_state(event).await {
                            tracing::warn!(error = %e, "Popstate navigation failed");
                        }
                        if self.state() == NavigationState::Unloading {
                            tracing::info!("Page unloading, popstate listener exiting");
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Popstate listener lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                _ = shutdown.recv() => {
                    tracing::info!("Popstate listener received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    // --- Route registration ---

    /// Register a route on the live table.
    pub fn add_route(&self, route: &RouteConfig, prepend: bool) -> Result<(), NavigationError> {
        let _lock = self.registration.lock().expect("registration mutex poisoned");
        let mut table = RouteTable::clone(&self.table.load());
        table.add_route(route, prepend)?;
        self.table.store(Arc::new(table));
        Ok(())
    }

    /// Swap in a whole new table.
    pub fn replace_route_table(&self, table: RouteTable) {
        let _lock = self.registration.lock().expect("registration mutex poisoned");
        tracing::info!(routes = table.len(), "Route table replaced");
        self.table.store(Arc::new(table));
    }

    /// Rebuild the table from a reloaded configuration.
    pub fn reload_routes(&self, config: &RouterConfig) -> Result<(), NavigationError> {
        let table = RouteTable::from_config(&config.routes, &config.patterns)?;
        self.replace_route_table(table);
        Ok(())
    }

    // --- Navigation ---

    /// Navigate to `request`, or re-open the current location when `None`.
    pub async fn open_route(
        &self,
        request: Option<RouteRequest>,
        options: NavigationOptions,
    ) -> Result<NavigationOutcome, NavigationError> {
        let target = describe(request.as_ref());
        let result = async {
            let _guard = self.begin()?;
            self.open_inner(request, &options).await
        }
        .instrument(navigation_span("open", &target))
        .await;

        record_outcome(&result);
        result
    }

    async fn open_inner(
        &self,
        request: Option<RouteRequest>,
        options: &NavigationOptions,
    ) -> Result<NavigationOutcome, NavigationError> {
        let push_state = options.push_state.unwrap_or(request.is_some());
        let current = self.current.load_full();

        let (url, target, display_url) = match request {
            Some(request) => {
                let url = UrlBuilder::build(&request, &current, options);
                let target = Arc::new(self.resolve(&url)?);
                (url, target, request.display_url)
            }
            None => (self.history.current_url(), Arc::clone(&current), None),
        };

        if self.must_jump(options, &current, &target) {
            self.jump_to(&url)?;
            return Ok(NavigationOutcome::Jumped(url));
        }

        if push_state {
            self.history.push_entry(HistoryState::new("openRoute"), &url)?;
        }
        self.current.store(Arc::clone(&target));
        tracing::info!(url = %url, route = ?target.name, push_state, "Opening route");

        self.set_state(NavigationState::Validating);
        self.validate_route(&url).await?;

        if current.spec_name != target.spec_name {
            self.update_route(&current, &target, options).await?;
        }

        self.set_state(NavigationState::Refreshing);
        self.refresh_route().await?;

        self.normalize_route(&self.history.current_url()).await?;

        if let Some(display_url) = display_url {
            let state = HistoryState::derive("displayUrl", self.history.current_state().as_ref());
            self.history.replace_entry(state, Some(&display_url))?;
        }

        self.generation.fetch_add(1, Ordering::AcqRel);
        Ok(NavigationOutcome::Opened(self.current.load_full()))
    }

    fn must_jump(&self, options: &NavigationOptions, current: &RouteInfo, target: &RouteInfo) -> bool {
        let in_place = self.settings.load().router.in_place_spec_switch;
        options.jump
            || !target.is_routed()
            || current.component_name != target.component_name
            || (!in_place && current.spec_name != target.spec_name)
    }

    /// Request a full page load of the URL built from `request`.
    pub fn jump_route(&self, request: RouteRequest, options: NavigationOptions) -> Result<String, NavigationError> {
        self.ensure_active()?;
        let url = UrlBuilder::build(&request, &self.current_route(), &options);
        self.jump_to(&url)?;
        metrics::record_navigation("jumped");
        Ok(url)
    }

    fn jump_to(&self, url: &str) -> Result<(), NavigationError> {
        self.history.assign(url)?;
        self.state.store(NavigationState::Unloading as u8, Ordering::Release);
        tracing::info!(url = %url, "Jumping to URL");
        Ok(())
    }

    /// Replace the current history entry and re-resolve the current route.
    pub fn replace_route(&self, request: RouteRequest) -> Result<Arc<RouteInfo>, NavigationError> {
        self.ensure_active()?;
        let current = self.current.load_full();
        let url = UrlBuilder::build(&request, &current, &NavigationOptions::default());
        let state = HistoryState::derive("replaceRoute", self.history.current_state().as_ref());
        self.history.replace_entry(state, Some(&url))?;

        let info = Arc::new(self.resolve(&self.history.current_url())?);
        self.current.store(Arc::clone(&info));
        tracing::debug!(url = %info.url, "Route replaced");
        Ok(info)
    }

    /// Validate the query parameters of `url`, auto-fixing when enabled.
    pub async fn validate_route(&self, url: &str) -> Result<(), NavigationError> {
        let settings = self.settings.load_full();
        let mut verdict = ValidationResult::passing();

        let route = self.current.load_full();
        self.emit(HookContext::new(Hook::BeforeValidate, &route, url).with_validation(&mut verdict))
            .await?;
        self.emit(HookContext::new(Hook::DoCheckValidity, &route, url).with_validation(&mut verdict))
            .await?;

        let params = parse_query(url);
        let report = self
            .validator
            .check(ValidationRequest {
                item: &params,
                validation_name: settings.router.validation_name.as_deref(),
            })
            .await?;
        verdict.merge(report);

        if !verdict.result && settings.router.auto_fix_url {
            match fix_parameters(&params, &verdict) {
                Some(fixed) => {
                    let info = self.replace_route(RouteRequest::query_parameters(fixed))?;
                    tracing::info!(url = %info.url, "URL auto-fixed");
                    verdict.result = true;
                }
                None => tracing::debug!(url = %url, "URL cannot be auto-fixed"),
            }
        }

        let route = self.current.load_full();
        self.emit(HookContext::new(Hook::DoValidate, &route, url).with_validation(&mut verdict))
            .await?;
        self.emit(HookContext::new(Hook::AfterValidate, &route, url).with_validation(&mut verdict))
            .await?;

        if !verdict.result {
            log_failures(url, &verdict);
            return Err(RouteValidationError {
                url: url.to_string(),
                invalids: verdict.invalids.into_values().collect(),
            }
            .into());
        }
        Ok(())
    }

    /// Run the normalize hooks. A listener may ask for the URL to be
    /// replaced; the replacement is applied right after its hook.
    pub async fn normalize_route(&self, url: &str) -> Result<(), NavigationError> {
        for hook in [Hook::BeforeNormalizeUrl, Hook::DoNormalizeUrl, Hook::AfterNormalizeUrl] {
            let route = self.current.load_full();
            if let Some(request) = self.emit(HookContext::new(hook, &route, url)).await? {
                tracing::debug!(hook = %hook, "Listener requested URL replacement");
                self.replace_route(request)?;
            }
        }
        Ok(())
    }

    /// Move from the previous route's spec to the target's.
    pub async fn update_route(
        &self,
        previous: &RouteInfo,
        target: &RouteInfo,
        options: &NavigationOptions,
    ) -> Result<(), NavigationError> {
        self.set_state(NavigationState::SwitchingSpec);

        if let Some(spec) = previous.spec_name.as_deref().and_then(|name| self.spec(name)) {
            self.host.detach_organizers(&spec).await?;
        }

        match target.spec_name.as_deref() {
            Some(name) => {
                self.switch_spec(name, options).await?;
            }
            None => {
                self.active_spec.store(None);
                self.settings.store(Arc::new(ResolvedSettings::base(&self.base_settings)?));
            }
        }
        Ok(())
    }

    /// Activate a spec, loading it first unless cached.
    pub async fn switch_spec(&self, name: &str, options: &NavigationOptions) -> Result<Arc<Spec>, NavigationError> {
        let spec = match self.spec(name) {
            Some(spec) => {
                metrics::record_spec_load("cache");
                spec
            }
            None => {
                let settings = self.settings.load_full();
                let load_options = SpecLoadOptions {
                    base_path: settings.router.spec_path.clone(),
                    query: options.query.clone().or_else(|| settings.router.query.clone()),
                };
                let spec = Arc::new(self.loader.load(name, &load_options).await?);
                metrics::record_spec_load("loader");
                self.specs.insert(name.to_string(), Arc::clone(&spec));
                spec
            }
        };

        let resolved = Arc::new(resolve_config(&self.base_settings, &spec.settings)?);
        self.settings.store(Arc::clone(&resolved));
        self.active_spec.store(Some(Arc::clone(&spec)));
        self.host.attach_organizers(&spec, &resolved.values).await?;

        let route = self.current.load_full();
        self.emit(HookContext::new(Hook::AfterSpecLoad, &route, &route.url).with_spec(&spec))
            .await?;

        tracing::info!(spec = %name, "Spec switched");
        Ok(spec)
    }

    /// Re-render the mounted view for the current route. Does nothing when
    /// no view is mounted for its component.
    pub async fn refresh_route(&self) -> Result<(), NavigationError> {
        let route = self.current.load_full();
        let Some(target) = route.component_name.as_deref().and_then(|c| self.host.mounted(c)) else {
            tracing::debug!(component = ?route.component_name, "Nothing mounted, refresh skipped");
            return Ok(());
        };

        self.emit(HookContext::new(Hook::BeforeRefresh, &route, &route.url)).await?;
        self.emit(HookContext::new(Hook::DoRefresh, &route, &route.url)).await?;
        target.refresh(&route).await?;
        self.emit(HookContext::new(Hook::AfterRefresh, &route, &route.url)).await?;
        Ok(())
    }

    /// Follow a back/forward navigation.
    pub async fn handle_pop_state(&self, event: PopStateEvent) -> Result<NavigationOutcome, NavigationError> {
        self.ensure_active()?;

        // Only the initial open has completed: nothing to go back to yet.
        if self.suppress_popstate.swap(false, Ordering::AcqRel) && self.generation() <= 1 {
            tracing::debug!(url = %event.url, "Initial popstate suppressed");
            metrics::record_navigation("suppressed");
            return Ok(NavigationOutcome::Suppressed);
        }

        let result = async {
            // Held across both pop-state hooks so they never interleave with
            // another navigation.
            let _guard = self.begin()?;

            let route = self.current.load_full();
            self.emit(HookContext::new(Hook::BeforePopState, &route, &event.url)).await?;

            let url = self.history.current_url();
            let outcome = self
                .open_inner(Some(RouteRequest::url(url)), &NavigationOptions::without_push())
                .await?;

            let route = self.current.load_full();
            self.emit(HookContext::new(Hook::AfterPopState, &route, &event.url)).await?;
            Ok::<_, NavigationError>(outcome)
        }
        .instrument(navigation_span("popstate", &event.url))
        .await;

        record_outcome(&result);
        result
    }

    // --- Internals ---

    fn resolve(&self, url: &str) -> Result<RouteInfo, RoutingError> {
        let base = Url::parse(&self.history.current_url()).unwrap_or_else(|_| self.base_url.clone());
        self.table.load().resolve_str(url, &base)
    }

    fn ensure_active(&self) -> Result<(), NavigationError> {
        match self.state() {
            NavigationState::Uninitialized => Err(NavigationError::NotStarted),
            NavigationState::Unloading => Err(NavigationError::Unloading),
            _ => Ok(()),
        }
    }

    fn begin(&self) -> Result<InFlight<'_>, NavigationError> {
        self.ensure_active()?;
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| NavigationError::Busy)?;
        Ok(InFlight { controller: self })
    }

    /// Move to `next`. UNLOADING is never left.
    fn set_state(&self, next: NavigationState) {
        let result = self.state.fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
            if current == NavigationState::Unloading as u8 {
                None
            } else {
                Some(next as u8)
            }
        });
        if let Ok(previous) = result {
            if previous != next as u8 {
                tracing::debug!(from = %NavigationState::from(previous), to = %next, "State transition");
            }
        }
    }

    /// Run every listener for one hook. Returns the last replacement request.
    async fn emit(&self, mut ctx: HookContext<'_>) -> Result<Option<RouteRequest>, NavigationError> {
        let hook = ctx.hook;
        let mut replacement = None;
        for listener in &self.listeners {
            listener
                .on_hook(&mut ctx)
                .await
                .map_err(|source| NavigationError::Hook { hook, source })?;
            if let Some(request) = ctx.take_replacement() {
                replacement = Some(request);
            }
        }
        Ok(replacement)
    }
}

fn describe(request: Option<&RouteRequest>) -> String {
    request
        .and_then(|r| r.url.clone().or_else(|| r.path.clone()))
        .unwrap_or_default()
}

fn record_outcome(result: &Result<NavigationOutcome, NavigationError>) {
    let outcome = match result {
        Ok(NavigationOutcome::Opened(_)) => "opened",
        Ok(NavigationOutcome::Jumped(_)) => "jumped",
        Ok(NavigationOutcome::Suppressed) => "suppressed",
        Err(e) => e.label(),
    };
    metrics::record_navigation(outcome);
}
