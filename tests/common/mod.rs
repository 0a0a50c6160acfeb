//! Shared fixtures for the navigation integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Notify;

use navigation_router::config::{RouteConfig, RouterConfig};
use navigation_router::navigation::{
    Collaborators, FailedRule, Hook, HookContext, HookListener, HostError, InvalidItem, MemoryHistory,
    NavigationController, RefreshTarget, Spec, SpecLoadError, SpecLoadOptions, SpecLoader, ValidationGateway,
    ValidationRequest, ValidationResult, Validity, ViewHost,
};
use navigation_router::routing::{QueryValue, RouteInfo, RouteRequest};

pub const BASE: &str = "https://app.test/";

/// Routes used across the flow tests. Everything but `admin` renders in the
/// `Shell` component.
pub fn routes() -> Vec<RouteConfig> {
    vec![
        RouteConfig::new("home", "/").with_spec("home").with_component("Shell"),
        RouteConfig::new("search", "/search").with_spec("home").with_component("Shell"),
        RouteConfig::new("user", "/users/:id")
            .with_spec("user-{{:id}}")
            .with_component("Shell"),
        RouteConfig::new("admin", "/admin/:section?")
            .with_spec("admin")
            .with_component("Admin"),
    ]
}

pub fn config() -> RouterConfig {
    let mut config = RouterConfig::default();
    config.settings.app_base_url = BASE.to_string();
    config.routes = routes();
    config
}

/// Validator answering from a per-key script.
#[derive(Default)]
pub struct ScriptedValidator {
    reports: Mutex<HashMap<String, InvalidItem>>,
    calls: Mutex<Vec<(Vec<String>, Option<String>)>>,
    block_next: AtomicBool,
    pub entered: Notify,
    pub release: Notify,
}

impl ScriptedValidator {
    /// Report `key` invalid whenever it is present.
    pub fn reject(&self, key: &str, fix: Option<&str>, validity: Validity) {
        let item = InvalidItem {
            key: key.to_string(),
            value: QueryValue::Absent,
            fix: fix.map(QueryValue::from),
            failed: vec![FailedRule {
                rule: format!("{}-rule", key),
                validity,
            }],
        };
        self.reports.lock().unwrap().insert(key.to_string(), item);
    }

    /// Park the next check until `release` is notified.
    pub fn block_next(&self) {
        self.block_next.store(true, Ordering::SeqCst);
    }

    /// Parameter keys and validation name of every check, in order.
    pub fn calls(&self) -> Vec<(Vec<String>, Option<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ValidationGateway for ScriptedValidator {
    async fn check(&self, request: ValidationRequest<'_>) -> Result<ValidationResult, HostError> {
        self.calls.lock().unwrap().push((
            request.item.keys().cloned().collect(),
            request.validation_name.map(str::to_string),
        ));

        if self.block_next.swap(false, Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }

        let mut result = ValidationResult::passing();
        let reports = self.reports.lock().unwrap().clone();
        for (key, value) in request.item {
            if let Some(item) = reports.get(key) {
                let mut item = item.clone();
                item.value = value.clone();
                result.add_invalid(item);
            }
        }
        Ok(result)
    }
}

/// Loader serving specs from memory.
#[derive(Default)]
pub struct StaticSpecLoader {
    specs: HashMap<String, Spec>,
    loads: Mutex<Vec<(String, SpecLoadOptions)>>,
}

impl StaticSpecLoader {
    pub fn new() -> Self {
        let mut loader = Self::default();
        loader.insert("home", json!({"validation_name": "home-form"}), &[]);
        loader.insert("user-7", json!({"title": "User 7"}), &["FormOrganizer"]);
        loader.insert("user-8", json!({"title": "User 8"}), &["FormOrganizer"]);
        loader
    }

    pub fn insert(&mut self, name: &str, settings: Value, organizers: &[&str]) {
        let spec = Spec {
            name: name.to_string(),
            settings,
            organizers: organizers.iter().map(|o| (o.to_string(), json!({}))).collect(),
        };
        self.specs.insert(name.to_string(), spec);
    }

    pub fn loads(&self) -> Vec<(String, SpecLoadOptions)> {
        self.loads.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpecLoader for StaticSpecLoader {
    async fn load(&self, name: &str, options: &SpecLoadOptions) -> Result<Spec, SpecLoadError> {
        self.loads.lock().unwrap().push((name.to_string(), options.clone()));
        self.specs
            .get(name)
            .cloned()
            .ok_or_else(|| SpecLoadError::NotFound(name.to_string()))
    }
}

/// A mounted view that records what it rendered.
#[derive(Default)]
pub struct RecordingView {
    refreshed: Mutex<Vec<String>>,
}

impl RecordingView {
    pub fn refreshed(&self) -> Vec<String> {
        self.refreshed.lock().unwrap().clone()
    }
}

#[async_trait]
impl RefreshTarget for RecordingView {
    async fn refresh(&self, route: &RouteInfo) -> Result<(), HostError> {
        self.refreshed.lock().unwrap().push(route.url.clone());
        Ok(())
    }
}

/// View host with a `Shell` view mounted.
pub struct RecordingHost {
    pub view: Arc<RecordingView>,
    mounted: HashSet<String>,
    attached: Mutex<Vec<(String, Value)>>,
    detached: Mutex<Vec<String>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self {
            view: Arc::new(RecordingView::default()),
            mounted: HashSet::from(["Shell".to_string()]),
            attached: Mutex::new(Vec::new()),
            detached: Mutex::new(Vec::new()),
        }
    }

    pub fn attached(&self) -> Vec<(String, Value)> {
        self.attached.lock().unwrap().clone()
    }

    pub fn detached(&self) -> Vec<String> {
        self.detached.lock().unwrap().clone()
    }
}

#[async_trait]
impl ViewHost for RecordingHost {
    async fn detach_organizers(&self, spec: &Spec) -> Result<(), HostError> {
        self.detached.lock().unwrap().push(spec.name.clone());
        Ok(())
    }

    async fn attach_organizers(&self, spec: &Spec, settings: &Value) -> Result<(), HostError> {
        self.attached.lock().unwrap().push((spec.name.clone(), settings.clone()));
        Ok(())
    }

    fn mounted(&self, component: &str) -> Option<Arc<dyn RefreshTarget>> {
        if self.mounted.contains(component) {
            Some(self.view.clone())
        } else {
            None
        }
    }
}

/// Listener recording every hook, optionally asking for one URL replacement.
#[derive(Default)]
pub struct HookRecorder {
    hooks: Mutex<Vec<String>>,
    replacement: Mutex<Option<RouteRequest>>,
}

impl HookRecorder {
    /// Request `request` on the next `doNormalizeURL`.
    pub fn replace_on_normalize(&self, request: RouteRequest) {
        *self.replacement.lock().unwrap() = Some(request);
    }

    pub fn hooks(&self) -> Vec<String> {
        self.hooks.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.hooks.lock().unwrap().clear();
    }
}

#[async_trait]
impl HookListener for HookRecorder {
    async fn on_hook(&self, ctx: &mut HookContext<'_>) -> Result<(), HostError> {
        self.hooks.lock().unwrap().push(ctx.hook.to_string());
        if ctx.hook == Hook::DoNormalizeUrl {
            if let Some(request) = self.replacement.lock().unwrap().take() {
                ctx.request_replace(request);
            }
        }
        Ok(())
    }
}

/// A controller wired to recording collaborators.
pub struct Harness {
    pub history: Arc<MemoryHistory>,
    pub validator: Arc<ScriptedValidator>,
    pub loader: Arc<StaticSpecLoader>,
    pub host: Arc<RecordingHost>,
    pub hooks: Arc<HookRecorder>,
    pub controller: Arc<NavigationController>,
}

impl Harness {
    pub fn new(start_path: &str) -> Self {
        Self::with_config(start_path, config())
    }

    pub fn with_config(start_path: &str, config: RouterConfig) -> Self {
        let start = format!("{}{}", BASE.trim_end_matches('/'), start_path);
        let history = Arc::new(MemoryHistory::new(&start).unwrap());
        let validator = Arc::new(ScriptedValidator::default());
        let loader = Arc::new(StaticSpecLoader::new());
        let host = Arc::new(RecordingHost::new());
        let hooks = Arc::new(HookRecorder::default());

        let controller = NavigationController::new(
            &config,
            Collaborators {
                history: history.clone(),
                validator: validator.clone(),
                specs: loader.clone(),
                host: host.clone(),
            },
        )
        .unwrap()
        .with_listener(hooks.clone());

        Self {
            history,
            validator,
            loader,
            host,
            hooks,
            controller: Arc::new(controller),
        }
    }
}

/// Poll `condition` until it holds or a second passes.
pub async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
