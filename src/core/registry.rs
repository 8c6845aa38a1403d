//! # Service Registry - 이름 기반 서비스 인스턴스 저장소
//!
//! 애플리케이션 전체에서 "현재 어떤 이름의 인스턴스가 존재하는가"에 대한
//! 단일 진실 공급원(single source of truth)입니다.
//!
//! ## 주요 구성 요소
//!
//! ### 엔트리 상태
//! 각 이름은 두 가지 상태 중 하나를 가집니다.
//! - **Factory**: 아직 생성되지 않은 비동기 팩토리 (지연 초기화 대상)
//! - **Resolved**: 생성이 끝난 인스턴스
//!
//! 전이는 `Factory → Resolved` 한 방향뿐이며, 한 번 등록된 서비스는
//! 제거되지 않습니다.
//!
//! ### 타입 소거 저장소
//! 서로 다른 타입의 인스턴스를 문자열 키 하나로 관리하기 위해 내부적으로
//! `Arc<dyn Any + Send + Sync>`로 저장하고, 타입 안전성은
//! [`ServiceRegistry::get`]의 제네릭 파라미터로 호출 지점에 맡깁니다.
//!
//! ## 동작 방식
//!
//! ```text
//! get::<T>(name)                  ← 동기 조회, 초기화를 트리거하지 않음
//!    └─ Resolved? → Some(Arc<T>)
//!
//! get_or_initialize::<T>(name, manager)
//!    ├─ Resolved?  → 즉시 반환
//!    ├─ Factory?   → get_service() (진행 중인 실행을 공유)
//!    └─ 그 외      → manager.initialize_service(name) 후 재조회
//! ```
//!
//! ## 사용 예제
//!
//! ```rust,ignore
//! let registry = ServiceRegistry::new();
//! registry.register(AUTH_SERVICE, Arc::new(AuthService::connect().await?));
//!
//! let auth: Arc<AuthService> = registry.get(AUTH_SERVICE).expect("registered above");
//! let book: Arc<BookService> = registry.get_or_initialize(BOOK_SERVICE, &manager).await?;
//! ```

use std::any::{Any, type_name};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use log::{debug, error, info, warn};

use crate::core::errors::{BoxError, RegistryError, Result};
use crate::core::init_manager::InitManager;

/// 레지스트리에 저장되는 타입 소거 인스턴스
pub type ServiceInstance = Arc<dyn Any + Send + Sync>;

/// 인스턴스를 비동기로 생성하는 팩토리
pub type ServiceFactory =
    Arc<dyn Fn() -> BoxFuture<'static, std::result::Result<ServiceInstance, BoxError>> + Send + Sync>;

/// 여러 호출자가 함께 기다리는 진행 중인 팩토리 실행
type SharedResolution = Shared<BoxFuture<'static, Result<ServiceInstance>>>;

enum ServiceEntry {
    Factory {
        factory: ServiceFactory,
        in_flight: Option<SharedResolution>,
    },
    Resolved(ServiceInstance),
}

#[derive(Default)]
struct RegistryState {
    entries: HashMap<String, ServiceEntry>,
    /// 최초 등록 순서
    order: Vec<String>,
}

impl RegistryState {
    fn upsert(&mut self, name: String, entry: ServiceEntry) {
        if !self.entries.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.entries.insert(name, entry);
    }

    fn names_where(&self, predicate: impl Fn(&ServiceEntry) -> bool) -> Vec<String> {
        self.order
            .iter()
            .filter(|name| self.entries.get(*name).is_some_and(&predicate))
            .cloned()
            .collect()
    }
}

/// 이름 기반 서비스 레지스트리
///
/// 복제 비용이 `Arc` 하나 수준이므로 필요한 곳마다 `clone()`해서 주입합니다.
/// 테스트는 케이스마다 새 레지스트리를 만들어 사용합니다.
#[derive(Clone, Default)]
pub struct ServiceRegistry {
    state: Arc<RwLock<RegistryState>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// 인스턴스를 등록합니다. 같은 이름이 있으면 덮어쓰며 실패하지 않습니다.
    pub fn register<T: Any + Send + Sync>(&self, name: impl Into<String>, instance: Arc<T>) {
        self.register_instance(name, instance);
    }

    /// 이미 타입 소거된 인스턴스를 등록합니다.
    pub fn register_instance(&self, name: impl Into<String>, instance: ServiceInstance) {
        let name = name.into();
        self.write().upsert(name.clone(), ServiceEntry::Resolved(instance));
        info!("📦 Service \"{}\" registered successfully", name);
    }

    /// 지연 초기화용 팩토리를 등록합니다.
    ///
    /// 이미 인스턴스가 존재하는 이름에는 등록하지 않습니다
    /// (`Resolved → Factory` 역전이는 허용되지 않음).
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// registry.register_factory(DICTIONARY_SERVICE, || async {
    ///     Ok(Arc::new(DictionaryService::connect().await?))
    /// });
    /// ```
    pub fn register_factory<T, F, Fut>(&self, name: impl Into<String>, factory: F)
    where
        T: Any + Send + Sync,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<Arc<T>, BoxError>> + Send + 'static,
    {
        let factory: ServiceFactory = Arc::new(move || {
            let created = factory();
            async move { created.await.map(|instance| instance as ServiceInstance) }.boxed()
        });
        self.register_factory_boxed(name, factory);
    }

    /// 이미 타입 소거된 팩토리를 등록합니다.
    pub fn register_factory_boxed(&self, name: impl Into<String>, factory: ServiceFactory) {
        let name = name.into();
        let mut state = self.write();

        if let Some(ServiceEntry::Resolved(_)) = state.entries.get(&name) {
            warn!(
                "Ignoring factory for service \"{}\": an instance is already registered",
                name
            );
            return;
        }

        state.upsert(
            name.clone(),
            ServiceEntry::Factory {
                factory,
                in_flight: None,
            },
        );
        info!("Initializer for service \"{}\" registered successfully", name);
    }

    /// 인스턴스가 존재하는지 확인합니다.
    pub fn has(&self, name: &str) -> bool {
        matches!(self.read().entries.get(name), Some(ServiceEntry::Resolved(_)))
    }

    /// 아직 실행되지 않은 팩토리가 있는지 확인합니다.
    pub fn has_factory(&self, name: &str) -> bool {
        matches!(self.read().entries.get(name), Some(ServiceEntry::Factory { .. }))
    }

    /// 인스턴스를 동기적으로 조회합니다.
    ///
    /// 등록되지 않았거나 타입이 다르면 `None`을 반환하며,
    /// 초기화를 트리거하지 않습니다.
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        match self.try_get::<T>(name) {
            Ok(instance) => Some(instance),
            Err(err @ RegistryError::TypeMismatch { .. }) => {
                warn!("{}", err);
                None
            }
            Err(_) => None,
        }
    }

    /// 인스턴스를 동기적으로 조회하고, 실패 사유를 에러로 돌려줍니다.
    ///
    /// # Errors
    ///
    /// * `RegistryError::NotRegistered` - 인스턴스가 없음
    /// * `RegistryError::TypeMismatch` - 등록된 인스턴스가 `T`가 아님
    pub fn try_get<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
        let instance = self
            .get_instance(name)
            .ok_or_else(|| RegistryError::NotRegistered(name.to_string()))?;
        downcast::<T>(name, instance)
    }

    /// 타입 소거된 인스턴스를 조회합니다.
    pub fn get_instance(&self, name: &str) -> Option<ServiceInstance> {
        match self.read().entries.get(name) {
            Some(ServiceEntry::Resolved(instance)) => Some(instance.clone()),
            _ => None,
        }
    }

    /// 인스턴스를 반환하고, 팩토리 상태라면 실행해서 인스턴스로 전이합니다.
    ///
    /// 같은 이름에 대한 동시 호출은 하나의 팩토리 실행을 함께 기다립니다.
    /// 실행이 실패하면 엔트리는 팩토리 상태로 남아 다음 호출에서 재시도됩니다.
    ///
    /// # Errors
    ///
    /// * `RegistryError::MissingInitializer` - 인스턴스도 팩토리도 없음
    /// * `RegistryError::InitializationFailed` - 팩토리 실패
    /// * `RegistryError::TypeMismatch` - 생성된 인스턴스가 `T`가 아님
    pub async fn get_service<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
        let resolution = {
            let mut state = self.write();
            match state.entries.get_mut(name) {
                Some(ServiceEntry::Resolved(instance)) => {
                    return downcast::<T>(name, instance.clone());
                }
                Some(ServiceEntry::Factory { factory, in_flight }) => match in_flight {
                    Some(shared) => {
                        debug!("Waiting for service \"{}\" initialization to complete", name);
                        shared.clone()
                    }
                    None => {
                        let shared = self.spawn_resolution(name, factory.clone());
                        *in_flight = Some(shared.clone());
                        shared
                    }
                },
                None => {
                    let err = RegistryError::MissingInitializer(name.to_string());
                    error!("{}", err);
                    return Err(err);
                }
            }
        };

        let instance = resolution.await?;
        downcast::<T>(name, instance)
    }

    fn spawn_resolution(&self, name: &str, factory: ServiceFactory) -> SharedResolution {
        let state = Arc::downgrade(&self.state);
        let name = name.to_string();

        async move {
            info!("Initializing service \"{}\"", name);
            let created = factory()
                .await
                .map_err(|err| RegistryError::initialization_failed(name.as_str(), err));
            complete_resolution(&state, &name, created)
        }
        .boxed()
        .shared()
    }

    /// 인스턴스를 얻거나, 없으면 초기화 매니저에 위임한 뒤 다시 조회합니다.
    ///
    /// # Errors
    ///
    /// * `RegistryError::MissingInitializer` - 팩토리도 초기화 함수도 없음
    /// * `RegistryError::NotRegistered` - 초기화 후에도 인스턴스가 없음
    ///   (초기화 함수가 등록을 빠뜨렸거나 순환 재진입으로 건너뛴 경우)
    /// * 초기화 과정의 모든 에러
    pub async fn get_or_initialize<T: Any + Send + Sync>(
        &self,
        name: &str,
        manager: &InitManager,
    ) -> Result<Arc<T>> {
        if self.has(name) {
            return self.try_get(name);
        }

        if self.has_factory(name) {
            return self.get_service(name).await;
        }

        manager.initialize_service(name).await?;
        self.try_get(name).inspect_err(|err| error!("{}", err))
    }

    /// 서비스를 얻어 콜백을 실행합니다.
    ///
    /// ```rust,ignore
    /// let stats = registry
    ///     .with_service(STATISTICS_SERVICE, &manager, |service: Arc<StatisticsService>| async move {
    ///         service.reading_stats(user_id).await
    ///     })
    ///     .await?;
    /// ```
    pub async fn with_service<T, R, F, Fut>(
        &self,
        name: &str,
        manager: &InitManager,
        callback: F,
    ) -> Result<R>
    where
        T: Any + Send + Sync,
        F: FnOnce(Arc<T>) -> Fut,
        Fut: Future<Output = R>,
    {
        let service = self.get_or_initialize::<T>(name, manager).await?;
        Ok(callback(service).await)
    }

    /// 인스턴스가 존재하는 서비스 이름 (최초 등록 순서)
    pub fn list_services(&self) -> Vec<String> {
        self.read()
            .names_where(|entry| matches!(entry, ServiceEntry::Resolved(_)))
    }

    /// 팩토리 상태로 남아 있는 서비스 이름 (최초 등록 순서)
    pub fn list_factories(&self) -> Vec<String> {
        self.read()
            .names_where(|entry| matches!(entry, ServiceEntry::Factory { .. }))
    }
}

fn complete_resolution(
    state: &Weak<RwLock<RegistryState>>,
    name: &str,
    created: Result<ServiceInstance>,
) -> Result<ServiceInstance> {
    let Some(state) = state.upgrade() else {
        return created;
    };
    let mut state = state.write().unwrap_or_else(PoisonError::into_inner);

    match created {
        Ok(instance) => {
            // 실행 도중 register()로 직접 등록된 인스턴스가 있으면 그쪽을 유지
            if let Some(ServiceEntry::Resolved(existing)) = state.entries.get(name) {
                return Ok(existing.clone());
            }
            state.upsert(name.to_string(), ServiceEntry::Resolved(instance.clone()));
            info!("📦 Service \"{}\" registered successfully", name);
            Ok(instance)
        }
        Err(err) => {
            if let Some(ServiceEntry::Factory { in_flight, .. }) = state.entries.get_mut(name) {
                *in_flight = None;
            }
            error!("{}", err);
            Err(err)
        }
    }
}

fn downcast<T: Any + Send + Sync>(name: &str, instance: ServiceInstance) -> Result<Arc<T>> {
    instance
        .downcast::<T>()
        .map_err(|_| RegistryError::TypeMismatch {
            name: name.to_string(),
            expected: type_name::<T>(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use futures_util::future::join_all;

    #[derive(Debug)]
    struct BookService {
        title: &'static str,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("remote unavailable")]
    struct RemoteUnavailable;

    #[test]
    fn test_get_returns_same_instance() {
        let registry = ServiceRegistry::new();
        let book = Arc::new(BookService { title: "Alice" });
        registry.register("bookService", book.clone());

        let first: Arc<BookService> = registry.get("bookService").unwrap();
        let second: Arc<BookService> = registry.get("bookService").unwrap();

        assert!(Arc::ptr_eq(&first, &book));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.title, "Alice");
    }

    #[test]
    fn test_get_unregistered_is_none() {
        let registry = ServiceRegistry::new();

        assert!(registry.get::<BookService>("bookService").is_none());
        assert!(!registry.has("bookService"));
        assert!(matches!(
            registry.try_get::<BookService>("bookService"),
            Err(RegistryError::NotRegistered(name)) if name == "bookService"
        ));
    }

    #[test]
    fn test_type_mismatch() {
        let registry = ServiceRegistry::new();
        registry.register("bookService", Arc::new(42_u32));

        assert!(registry.get::<BookService>("bookService").is_none());
        assert!(matches!(
            registry.try_get::<BookService>("bookService"),
            Err(RegistryError::TypeMismatch { .. })
        ));
        assert_eq!(*registry.get::<u32>("bookService").unwrap(), 42);
    }

    #[test]
    fn test_register_overwrites() {
        let registry = ServiceRegistry::new();
        registry.register("bookService", Arc::new(BookService { title: "first" }));
        registry.register("bookService", Arc::new(BookService { title: "second" }));

        assert_eq!(registry.get::<BookService>("bookService").unwrap().title, "second");
        assert_eq!(registry.list_services(), vec!["bookService"]);
    }

    #[test]
    fn test_list_services_in_registration_order() {
        let registry = ServiceRegistry::new();
        registry.register("authService", Arc::new(1_u8));
        registry.register_factory("dictionaryService", || async { Ok(Arc::new(2_u8)) });
        registry.register("bookService", Arc::new(3_u8));

        assert_eq!(registry.list_services(), vec!["authService", "bookService"]);
        assert_eq!(registry.list_factories(), vec!["dictionaryService"]);
        assert!(registry.has_factory("dictionaryService"));
        assert!(!registry.has("dictionaryService"));
    }

    #[tokio::test]
    async fn test_factory_runs_once_for_concurrent_callers() {
        let registry = ServiceRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = calls.clone();
        registry.register_factory("bookService", move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok(Arc::new(BookService { title: "shared" }))
            }
        });

        let results = join_all((0..5).map(|_| registry.get_service::<BookService>("bookService"))).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let first = results[0].as_ref().unwrap();
        for result in &results {
            assert!(Arc::ptr_eq(first, result.as_ref().unwrap()));
        }
        assert!(registry.has("bookService"));
        assert!(registry.list_factories().is_empty());
    }

    #[tokio::test]
    async fn test_failed_factory_can_be_retried() {
        let registry = ServiceRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = calls.clone();
        registry.register_factory("authService", move || {
            let attempt = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt == 0 {
                    Err(Box::new(RemoteUnavailable) as BoxError)
                } else {
                    Ok(Arc::new(BookService { title: "retried" }))
                }
            }
        });

        let err = registry.get_service::<BookService>("authService").await.unwrap_err();
        assert!(err.is_retryable());
        assert!(err.to_string().contains("authService"));
        assert!(registry.has_factory("authService"));

        let service = registry.get_service::<BookService>("authService").await.unwrap();
        assert_eq!(service.title, "retried");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_get_service_without_factory_fails() {
        let registry = ServiceRegistry::new();

        let err = registry.get_service::<BookService>("doesNotExist").await.unwrap_err();

        assert!(matches!(err, RegistryError::MissingInitializer(_)));
        assert!(err.to_string().contains("doesNotExist"));
    }

    #[test]
    fn test_factory_ignored_when_instance_exists() {
        let registry = ServiceRegistry::new();
        registry.register("bookService", Arc::new(BookService { title: "ready" }));
        registry.register_factory("bookService", || async {
            Ok(Arc::new(BookService { title: "factory" }))
        });

        assert!(!registry.has_factory("bookService"));
        assert_eq!(registry.get::<BookService>("bookService").unwrap().title, "ready");
    }

    #[tokio::test]
    async fn test_get_or_initialize_prefers_existing_and_factory() {
        let registry = ServiceRegistry::new();
        let manager = InitManager::new(registry.clone());
        registry.register("authService", Arc::new(BookService { title: "auth" }));
        registry.register_factory("bookService", || async {
            Ok(Arc::new(BookService { title: "book" }))
        });

        let auth: Arc<BookService> = registry.get_or_initialize("authService", &manager).await.unwrap();
        let book: Arc<BookService> = registry.get_or_initialize("bookService", &manager).await.unwrap();

        assert_eq!(auth.title, "auth");
        assert_eq!(book.title, "book");
        assert!(manager.get_initialized_services().is_empty());
    }

    #[tokio::test]
    async fn test_get_or_initialize_unknown_name_fails_clearly() {
        let registry = ServiceRegistry::new();
        let manager = InitManager::new(registry.clone());

        let err = registry
            .get_or_initialize::<BookService>("doesNotExist", &manager)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("doesNotExist"));
    }

    #[tokio::test]
    async fn test_with_service_runs_callback() {
        let registry = ServiceRegistry::new();
        let manager = InitManager::new(registry.clone());
        registry.register("bookService", Arc::new(BookService { title: "Wonderland" }));

        let length = registry
            .with_service("bookService", &manager, |book: Arc<BookService>| async move {
                book.title.len()
            })
            .await
            .unwrap();

        assert_eq!(length, 10);
    }
}
