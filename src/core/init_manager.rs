//! # Initialization Manager - 의존성 기반 비동기 초기화
//!
//! 서비스 이름별 비동기 초기화 함수와 의존성 목록을 보관하고,
//! 의존성 순서대로 정확히 한 번씩 실행합니다.
//!
//! ## 초기화 상태
//!
//! 프로세스 전역 상태는 서로 겹치지 않는 세 집합으로 나뉩니다.
//! - `initialized`: 초기화 함수가 정확히 한 번 성공적으로 실행됨
//! - `initializing`: 실행 중 (순환 감지 및 진행 중 실행 공유)
//! - 그 외: 시작 전
//!
//! ## `initialize_service` 처리 과정
//!
//! ```text
//! 1. initialized?           → 즉시 반환 (멱등)
//! 2. 호출 체인에 이미 있음?   → 순환 재진입: lenient면 경고 후 반환, strict면 에러
//! 3. 다른 호출자가 실행 중?   → 같은 실행(Shared future)을 함께 기다림
//! 4. 초기화 함수 없음?        → MissingInitializer
//! 5. initializing 표시
//! 6. 의존성을 순서대로 하나씩 초기화 (앞선 실패 시 중단)
//! 7. 초기화 함수 실행 (인스턴스 생성 후 Registry.register)
//! 8. 성공: initialized로 이동 / 실패: 시작 전 상태로 복귀 후 에러 전파
//! ```
//!
//! ## 순환 재진입 감지
//!
//! 의존성 순회 중의 호출 체인은 인자로, 초기화 함수 내부에서의 지연 조회는
//! task-local 체인으로 전달됩니다. 서로 다른 태스크가 교차로 기다리는 경우
//! (태스크 1이 X를 잡고 Y를, 태스크 2가 Y를 잡고 X를 기다림)는
//! `waiting_on` 그래프를 따라가 같은 순환으로 취급합니다.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use log::{debug, error, info, warn};
use serde::Serialize;

use crate::config::BootstrapConfig;
use crate::core::dependencies::DependencyTable;
use crate::core::errors::{BoxError, RegistryError, Result};
use crate::core::init_order::{find_cycle, initialization_order};
use crate::core::module::ServiceModule;
use crate::core::registry::ServiceRegistry;
use crate::core::report::{BootstrapReport, InitState, ServiceStatus};
use crate::utils::display_terminal::{
    print_boxed_title, print_final_summary, print_step_complete, print_step_start, print_sub_task,
};

/// 초기화 함수가 반환하는 future
pub type InitFuture = BoxFuture<'static, std::result::Result<(), BoxError>>;

/// 인자 없는 비동기 초기화 함수
pub type InitFn = Arc<dyn Fn() -> InitFuture + Send + Sync>;

type SharedInit = Shared<BoxFuture<'static, Result<()>>>;

tokio::task_local! {
    /// 현재 태스크에서 실행 중인 초기화 함수들의 체인 (바깥쪽 → 안쪽)
    static INIT_CHAIN: Vec<String>;
}

/// 순환 재진입 처리 정책
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CyclePolicy {
    /// 경고만 남기고 재진입 호출을 즉시 반환 (상대편 완료를 보장하지 않음)
    #[default]
    Lenient,
    /// `CircularDependency` 에러로 즉시 실패
    Strict,
}

impl CyclePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CyclePolicy::Lenient => "lenient",
            CyclePolicy::Strict => "strict",
        }
    }
}

impl fmt::Display for CyclePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CyclePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lenient" => Ok(CyclePolicy::Lenient),
            "strict" => Ok(CyclePolicy::Strict),
            other => Err(format!("Unknown cycle policy: {}", other)),
        }
    }
}

/// `initialize_all` 옵션
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InitializeAllOptions {
    /// `true`면 위상 정렬 순서, `false`면 등록 순서로 시도합니다.
    pub use_topological_order: bool,
}

impl InitializeAllOptions {
    pub fn topological() -> Self {
        Self {
            use_topological_order: true,
        }
    }
}

struct InitializerEntry {
    init_fn: InitFn,
    dependencies: Vec<String>,
}

#[derive(Default)]
struct Initializers {
    order: Vec<String>,
    entries: HashMap<String, InitializerEntry>,
}

#[derive(Default)]
struct InitProgress {
    /// 완료 순서
    initialized: Vec<String>,
    initializing: HashSet<String>,
    in_flight: HashMap<String, SharedInit>,
    /// 실행 중인 서비스 → 그 서비스가 현재 기다리는 서비스
    waiting_on: HashMap<String, String>,
}

impl InitProgress {
    fn is_initialized(&self, name: &str) -> bool {
        self.initialized.iter().any(|entry| entry == name)
    }

    /// `name`의 대기 사슬이 호출 체인으로 되돌아오면 그 순환 경로를 반환합니다.
    fn wait_cycle(&self, name: &str, chain: &[String]) -> Option<Vec<String>> {
        let mut path = vec![name.to_string()];
        let mut current = name;

        while let Some(next) = self.waiting_on.get(current) {
            if let Some(start) = chain.iter().position(|entry| entry == next) {
                let mut cycle = chain[start..].to_vec();
                cycle.extend(path);
                cycle.push(next.clone());
                return Some(cycle);
            }
            if path.iter().any(|entry| entry == next) {
                return None;
            }
            path.push(next.clone());
            current = next;
        }
        None
    }
}

enum Step {
    Done,
    Await(SharedInit),
}

struct ManagerInner {
    registry: ServiceRegistry,
    table: DependencyTable,
    cycle_policy: CyclePolicy,
    show_banner: bool,
    initializers: RwLock<Initializers>,
    progress: Mutex<InitProgress>,
}

/// [`InitManager`] 빌더
pub struct InitManagerBuilder {
    registry: ServiceRegistry,
    table: Option<DependencyTable>,
    cycle_policy: CyclePolicy,
    show_banner: bool,
}

impl InitManagerBuilder {
    /// 정적 의존성 테이블을 지정합니다. 기본값은 [`DependencyTable::declared`]입니다.
    pub fn dependency_table(mut self, table: DependencyTable) -> Self {
        self.table = Some(table);
        self
    }

    pub fn cycle_policy(mut self, policy: CyclePolicy) -> Self {
        self.cycle_policy = policy;
        self
    }

    pub fn show_banner(mut self, show: bool) -> Self {
        self.show_banner = show;
        self
    }

    /// 부트스트랩 설정의 정책을 적용합니다.
    pub fn config(self, config: &BootstrapConfig) -> Self {
        self.cycle_policy(config.cycle_policy)
            .show_banner(config.show_banner)
    }

    pub fn build(self) -> InitManager {
        InitManager {
            inner: Arc::new(ManagerInner {
                registry: self.registry,
                table: self.table.unwrap_or_else(DependencyTable::declared),
                cycle_policy: self.cycle_policy,
                show_banner: self.show_banner,
                initializers: RwLock::new(Initializers::default()),
                progress: Mutex::new(InitProgress::default()),
            }),
        }
    }
}

/// 의존성 기반 비동기 초기화 매니저
///
/// 복제 비용이 `Arc` 하나 수준이며, 복제본은 같은 상태를 공유합니다.
///
/// # Examples
///
/// ```rust,ignore
/// let registry = ServiceRegistry::new();
/// let manager = InitManager::new(registry.clone());
///
/// manager.register_service(AUTH_SERVICE, || async { Ok(Arc::new(AuthService::connect().await?)) });
/// manager.register_service_with_dependencies(BOOK_SERVICE, [AUTH_SERVICE], || async {
///     Ok(Arc::new(BookService::connect().await?))
/// });
///
/// manager.initialize_all(InitializeAllOptions::topological()).await?;
/// let book: Arc<BookService> = registry.get(BOOK_SERVICE).expect("initialized above");
/// ```
#[derive(Clone)]
pub struct InitManager {
    inner: Arc<ManagerInner>,
}

impl InitManager {
    /// 선언된 의존성 테이블과 lenient 정책으로 매니저를 생성합니다.
    pub fn new(registry: ServiceRegistry) -> Self {
        Self::builder(registry).build()
    }

    pub fn builder(registry: ServiceRegistry) -> InitManagerBuilder {
        InitManagerBuilder {
            registry,
            table: None,
            cycle_policy: CyclePolicy::default(),
            show_banner: false,
        }
    }

    /// 초기화 함수가 인스턴스를 등록하는 레지스트리
    pub fn registry(&self) -> &ServiceRegistry {
        &self.inner.registry
    }

    pub fn cycle_policy(&self) -> CyclePolicy {
        self.inner.cycle_policy
    }

    fn progress(&self) -> MutexGuard<'_, InitProgress> {
        self.inner.progress.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn initializers(&self) -> RwLockReadGuard<'_, Initializers> {
        self.inner.initializers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn initializers_mut(&self) -> RwLockWriteGuard<'_, Initializers> {
        self.inner.initializers.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// 초기화 함수를 등록합니다. 의존성은 선언 테이블에서 가져옵니다.
    ///
    /// 재등록은 초기화 함수와 의존성을 덮어쓰지만 완료 상태는 유지합니다.
    pub fn register<F, Fut>(&self, name: impl Into<String>, init_fn: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<(), BoxError>> + Send + 'static,
    {
        self.insert_initializer(name.into(), boxed_init_fn(init_fn), None);
    }

    /// 명시적 의존성 목록과 함께 초기화 함수를 등록합니다.
    ///
    /// 의존성은 주어진 순서대로 하나씩 초기화됩니다.
    pub fn register_with_dependencies<F, Fut, I, S>(
        &self,
        name: impl Into<String>,
        dependencies: I,
        init_fn: F,
    ) where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<(), BoxError>> + Send + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let dependencies = dependencies.into_iter().map(Into::into).collect();
        self.insert_initializer(name.into(), boxed_init_fn(init_fn), Some(dependencies));
    }

    /// 인스턴스 팩토리를 등록합니다.
    ///
    /// 생성된 인스턴스는 초기화 시점에 이 매니저의 레지스트리에 등록됩니다.
    pub fn register_service<T, F, Fut>(&self, name: impl Into<String>, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<Arc<T>, BoxError>> + Send + 'static,
    {
        let name = name.into();
        let init_fn = self.registering_init_fn(name.clone(), factory);
        self.insert_initializer(name, init_fn, None);
    }

    /// 명시적 의존성 목록과 함께 인스턴스 팩토리를 등록합니다.
    pub fn register_service_with_dependencies<T, F, Fut, I, S>(
        &self,
        name: impl Into<String>,
        dependencies: I,
        factory: F,
    ) where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<Arc<T>, BoxError>> + Send + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let dependencies = dependencies.into_iter().map(Into::into).collect();
        let init_fn = self.registering_init_fn(name.clone(), factory);
        self.insert_initializer(name, init_fn, Some(dependencies));
    }

    /// [`ServiceModule`] 구현체를 등록합니다.
    pub fn register_module(&self, module: Arc<dyn ServiceModule>) {
        let name = module.name().to_string();
        let dependencies = module.dependencies();
        let registry = self.inner.registry.clone();

        let init_fn: InitFn = Arc::new(move || {
            let module = module.clone();
            let registry = registry.clone();
            async move {
                let instance = module.create().await?;
                registry.register_instance(module.name(), instance);
                Ok(())
            }
            .boxed()
        });

        self.insert_initializer(name, init_fn, dependencies);
    }

    fn registering_init_fn<T, F, Fut>(&self, name: String, factory: F) -> InitFn
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<Arc<T>, BoxError>> + Send + 'static,
    {
        let registry = self.inner.registry.clone();

        Arc::new(move || {
            let created = factory();
            let registry = registry.clone();
            let name = name.clone();
            async move {
                let instance = created.await?;
                registry.register(name, instance);
                Ok(())
            }
            .boxed()
        })
    }

    fn insert_initializer(&self, name: String, init_fn: InitFn, dependencies: Option<Vec<String>>) {
        let dependencies = dependencies.unwrap_or_else(|| {
            self.inner
                .table
                .dependencies_of(&name)
                .map(<[String]>::to_vec)
                .unwrap_or_default()
        });

        info!(
            "Registering initialization function for {} (dependencies: [{}])",
            name,
            dependencies.join(", ")
        );

        let mut initializers = self.initializers_mut();
        if !initializers.entries.contains_key(&name) {
            initializers.order.push(name.clone());
        }
        initializers.entries.insert(
            name,
            InitializerEntry {
                init_fn,
                dependencies,
            },
        );
        debug!(
            "Available services for initialization: {}",
            initializers.order.join(", ")
        );
    }

    /// 서비스와 그 의존성을 초기화합니다.
    ///
    /// # Errors
    ///
    /// * `RegistryError::MissingInitializer` - 서비스 또는 의존성에 초기화 함수가 없음
    /// * `RegistryError::InitializationFailed` - 서비스 또는 의존성의 초기화 함수 실패
    /// * `RegistryError::CircularDependency` - strict 정책에서 순환 재진입
    pub async fn initialize_service(&self, name: &str) -> Result<()> {
        let chain = INIT_CHAIN.try_with(Clone::clone).unwrap_or_default();
        self.initialize_in_chain(name.to_string(), chain).await
    }

    fn initialize_in_chain(&self, name: String, chain: Vec<String>) -> BoxFuture<'static, Result<()>> {
        let manager = self.clone();

        async move {
            let pending = match manager.plan(&name, &chain)? {
                Step::Done => return Ok(()),
                Step::Await(pending) => pending,
            };

            let outcome = pending.await;

            if let Some(parent) = chain.last() {
                let mut progress = manager.progress();
                if progress.waiting_on.get(parent) == Some(&name) {
                    progress.waiting_on.remove(parent);
                }
            }
            outcome
        }
        .boxed()
    }

    /// 잠금 안에서 다음 동작을 결정합니다. 새 실행이 필요하면 여기서 시작합니다.
    fn plan(&self, name: &str, chain: &[String]) -> Result<Step> {
        let mut progress = self.progress();

        if progress.is_initialized(name) {
            debug!("Service {} already initialized", name);
            return Ok(Step::Done);
        }

        if let Some(start) = chain.iter().position(|entry| entry == name) {
            let mut cycle = chain[start..].to_vec();
            cycle.push(name.to_string());
            return self.on_cycle(cycle);
        }

        let pending = match progress.in_flight.get(name) {
            Some(pending) => {
                if let Some(cycle) = progress.wait_cycle(name, chain) {
                    return self.on_cycle(cycle);
                }
                debug!("Waiting for in-flight initialization of {}", name);
                pending.clone()
            }
            None => {
                let (init_fn, dependencies) = self.initializer(name)?;

                info!("Initializing service: {}", name);
                progress.initializing.insert(name.to_string());

                let mut own_chain = chain.to_vec();
                own_chain.push(name.to_string());
                let pending = self
                    .clone()
                    .run(name.to_string(), own_chain, init_fn, dependencies)
                    .boxed()
                    .shared();
                progress.in_flight.insert(name.to_string(), pending.clone());
                pending
            }
        };

        if let Some(parent) = chain.last() {
            progress.waiting_on.insert(parent.clone(), name.to_string());
        }
        Ok(Step::Await(pending))
    }

    fn initializer(&self, name: &str) -> Result<(InitFn, Vec<String>)> {
        let initializers = self.initializers();
        match initializers.entries.get(name) {
            Some(entry) => Ok((entry.init_fn.clone(), entry.dependencies.clone())),
            None => {
                error!("No initialization function registered for service: {}", name);
                error!("Available services: {}", initializers.order.join(", "));
                Err(RegistryError::MissingInitializer(name.to_string()))
            }
        }
    }

    fn on_cycle(&self, cycle: Vec<String>) -> Result<Step> {
        match self.inner.cycle_policy {
            CyclePolicy::Lenient => {
                warn!(
                    "Circular initialization detected for service: {} ({})",
                    cycle.last().map(String::as_str).unwrap_or_default(),
                    cycle.join(" -> ")
                );
                Ok(Step::Done)
            }
            CyclePolicy::Strict => {
                let err = RegistryError::CircularDependency(cycle);
                error!("{}", err);
                Err(err)
            }
        }
    }

    async fn run(
        self,
        name: String,
        chain: Vec<String>,
        init_fn: InitFn,
        dependencies: Vec<String>,
    ) -> Result<()> {
        let outcome = INIT_CHAIN
            .scope(chain.clone(), async {
                for dependency in &dependencies {
                    self.initialize_in_chain(dependency.clone(), chain.clone())
                        .await?;
                }

                debug!("Executing initialization function for {}", name);
                init_fn()
                    .await
                    .map_err(|err| RegistryError::initialization_failed(name.as_str(), err))
            })
            .await;

        self.finish(&name, &outcome);
        outcome
    }

    fn finish(&self, name: &str, outcome: &Result<()>) {
        let mut progress = self.progress();
        progress.initializing.remove(name);
        progress.in_flight.remove(name);
        progress.waiting_on.remove(name);

        match outcome {
            Ok(()) => {
                if !progress.is_initialized(name) {
                    progress.initialized.push(name.to_string());
                }
                info!("✅ Service {} initialized successfully", name);
            }
            Err(err) => {
                error!("Error initializing service {}: {}", name, err);
            }
        }
    }

    /// 등록된 모든 서비스를 초기화합니다.
    ///
    /// 옵션에 따라 등록 순서 또는 위상 정렬 순서로 `initialize_service`를
    /// 차례로 호출하며, 첫 실패에서 중단하고 에러를 전파합니다.
    /// 순서는 예측 가능성을 위한 힌트일 뿐이며, 의존성 보장은
    /// `initialize_service`의 의존성 순회가 담당합니다.
    pub async fn initialize_all(&self, options: InitializeAllOptions) -> Result<()> {
        info!("Initializing all services");

        let services = if options.use_topological_order {
            let graph = self.dependency_graph();
            if let Some(cycle) = find_cycle(&graph) {
                warn!("Dependency graph contains a cycle: {}", cycle.join(" -> "));
            }
            let services: Vec<String> = initialization_order(&graph)
                .into_iter()
                .filter(|name| self.has_init_function(name))
                .collect();
            info!("Using topological order: {}", services.join(", "));
            services
        } else {
            let services = self.get_registered_services();
            info!("Using registration order: {}", services.join(", "));
            services
        };

        let banner = self.inner.show_banner;
        if banner {
            print_boxed_title("🔄 INITIALIZING SERVICES");
            let ordering = if options.use_topological_order {
                "topological"
            } else {
                "registration"
            };
            print_step_start(1, &format!("Initializing {} services ({} order)", services.len(), ordering));
        }

        for service in &services {
            match self.initialize_service(service).await {
                Ok(()) if banner => print_sub_task(service, "✓ Initialized"),
                Ok(()) => {}
                Err(err) => {
                    if banner {
                        print_sub_task(service, "✗ Failed");
                    }
                    return Err(err);
                }
            }
        }

        if banner {
            print_step_complete(1, "Services initialized", services.len());
            print_final_summary(
                self.get_registered_services().len(),
                self.get_initialized_services().len(),
                self.inner.registry.list_services().len(),
            );
        }

        info!("All services initialized successfully");
        Ok(())
    }

    /// 위상 정렬 대상 그래프: 등록된 초기화 함수의 실제 의존성 + 선언 테이블
    fn dependency_graph(&self) -> DependencyTable {
        let mut graph = DependencyTable::new();
        {
            let initializers = self.initializers();
            for name in &initializers.order {
                if let Some(entry) = initializers.entries.get(name) {
                    graph.insert(name.clone(), entry.dependencies.iter().cloned());
                }
            }
        }
        for (name, dependencies) in self.inner.table.iter() {
            if !graph.contains(name) {
                graph.insert(name, dependencies.iter().cloned());
            }
        }
        graph
    }

    pub fn is_initialized(&self, name: &str) -> bool {
        self.progress().is_initialized(name)
    }

    /// 초기화가 완료된 서비스 이름 (완료 순서)
    pub fn get_initialized_services(&self) -> Vec<String> {
        self.progress().initialized.clone()
    }

    /// 초기화 함수가 등록된 서비스 이름 (등록 순서)
    pub fn get_registered_services(&self) -> Vec<String> {
        self.initializers().order.clone()
    }

    pub fn has_init_function(&self, name: &str) -> bool {
        self.initializers().entries.contains_key(name)
    }

    /// 등록된 초기화 함수의 의존성 목록
    pub fn dependencies_of(&self, name: &str) -> Option<Vec<String>> {
        self.initializers()
            .entries
            .get(name)
            .map(|entry| entry.dependencies.clone())
    }

    /// 현재 상태의 진단 스냅샷을 생성합니다.
    pub fn report(&self) -> BootstrapReport {
        let registered: Vec<(String, Vec<String>)> = {
            let initializers = self.initializers();
            initializers
                .order
                .iter()
                .filter_map(|name| {
                    initializers
                        .entries
                        .get(name)
                        .map(|entry| (name.clone(), entry.dependencies.clone()))
                })
                .collect()
        };

        let (initialized, initializing) = {
            let progress = self.progress();
            (progress.initialized.clone(), progress.initializing.clone())
        };

        let registry = &self.inner.registry;
        let services = registered
            .into_iter()
            .map(|(name, dependencies)| {
                let state = if initialized.contains(&name) {
                    InitState::Initialized
                } else if initializing.contains(&name) {
                    InitState::Initializing
                } else {
                    InitState::NotStarted
                };
                ServiceStatus {
                    has_instance: registry.has(&name),
                    name,
                    dependencies,
                    state,
                }
            })
            .collect::<Vec<_>>();

        let unmanaged_instances = registry
            .list_services()
            .into_iter()
            .filter(|name| !self.has_init_function(name))
            .collect();

        BootstrapReport {
            generated_at: Utc::now(),
            cycle_policy: self.inner.cycle_policy,
            services,
            initialized,
            unmanaged_instances,
        }
    }
}

fn boxed_init_fn<F, Fut>(init_fn: F) -> InitFn
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = std::result::Result<(), BoxError>> + Send + 'static,
{
    Arc::new(move || init_fn().boxed())
}
