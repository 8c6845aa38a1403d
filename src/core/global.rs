//! 프로세스 전역 레지스트리와 초기화 매니저
//!
//! 애플리케이션 코드가 인스턴스를 주고받지 않고 이름만으로 서비스를 찾을 수
//! 있도록 하나의 [`ServiceRegistry`]와 그것을 공유하는 [`InitManager`]를
//! 첫 접근 시점에 생성합니다. 매니저 정책은 그 시점의 환경 변수
//! ([`BootstrapConfig::from_env`])로 결정됩니다.
//!
//! 테스트는 전역 상태를 공유하지 않도록 `ServiceRegistry::new()`와
//! `InitManager::new()`로 독립 인스턴스를 만들어 사용합니다.
//!
//! ```rust,ignore
//! use service_bootstrap::core::global;
//!
//! global::manager().register_service(AUTH_SERVICE, || async { Ok(Arc::new(AuthService::new())) });
//! global::manager().initialize_all(InitializeAllOptions::default()).await?;
//!
//! let auth: Arc<AuthService> = global::registry().get(AUTH_SERVICE).expect("initialized");
//! ```

use once_cell::sync::Lazy;

use crate::config::BootstrapConfig;
use crate::core::init_manager::InitManager;
use crate::core::registry::ServiceRegistry;

static REGISTRY: Lazy<ServiceRegistry> = Lazy::new(ServiceRegistry::new);

static MANAGER: Lazy<InitManager> = Lazy::new(|| {
    let config = BootstrapConfig::from_env();
    InitManager::builder(REGISTRY.clone()).config(&config).build()
});

/// 전역 서비스 레지스트리
pub fn registry() -> &'static ServiceRegistry {
    &REGISTRY
}

/// 전역 레지스트리를 공유하는 초기화 매니저
pub fn manager() -> &'static InitManager {
    &MANAGER
}

