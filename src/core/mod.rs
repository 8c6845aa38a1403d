//! # Core Bootstrap Module
//!
//! 서비스 부트스트랩의 핵심 기능을 제공하는 모듈입니다.
//! 이름 기반 서비스 레지스트리와, 그 위에서 동작하는 의존성 기반
//! 비동기 초기화 매니저로 구성됩니다.
//!
//! ## 모듈 구성
//!
//! ### [`registry`] - 서비스 레지스트리
//! - **이름 → 인스턴스**: 타입 소거 저장 + 호출 지점의 제네릭 다운캐스트
//! - **지연 팩토리**: 첫 조회 시 생성, 동시 호출은 하나의 실행을 공유
//! - **매니저 위임**: `get_or_initialize`로 초기화 매니저에 생성 요청
//!
//! ### [`init_manager`] - 초기화 매니저
//! - **정확히 한 번**: 서비스별 초기화 함수는 성공 기준으로 한 번만 실행
//! - **의존성 우선**: 선언 순서대로 의존성을 먼저 초기화
//! - **순환 감지**: 재진입을 감지해 lenient/strict 정책에 따라 처리
//!
//! ### [`dependencies`] / [`init_order`] - 의존성 선언과 정렬
//! - `inventory` 기반 선언 수집, DFS 위상 정렬, 순환 경로 탐색
//!
//! ### [`errors`] - 에러 타입
//! - `thiserror` 기반 [`RegistryError`]와 안정적인 에러 코드
//!
//! ## 전체 흐름
//!
//! ```text
//! ┌──────────────────┐  register(name, deps, init_fn)
//! │   InitManager    │◀──────────────────────────────── 기능 모듈
//! └──────────────────┘
//!          │ initialize_service / initialize_all
//!          ▼
//!   의존성 DFS → init_fn() → registry.register(name, instance)
//!          │
//!          ▼
//! ┌──────────────────┐  get / get_or_initialize
//! │ ServiceRegistry  │◀──────────────────────────────── 애플리케이션 코드
//! └──────────────────┘
//! ```
//!
//! ## 사용 패턴
//!
//! ```rust,ignore
//! use service_bootstrap::core::{InitManager, InitializeAllOptions, ServiceRegistry};
//!
//! let registry = ServiceRegistry::new();
//! let manager = InitManager::new(registry.clone());
//!
//! manager.register_service(AUTH_SERVICE, || async { Ok(Arc::new(AuthService::connect().await?)) });
//! manager.initialize_all(InitializeAllOptions::topological()).await?;
//! ```

pub mod dependencies;
pub mod errors;
pub mod global;
pub mod init_manager;
pub mod init_order;
pub mod module;
pub mod registry;
pub mod report;
pub mod service_names;

pub use dependencies::{DependencyDeclaration, DependencyTable};
pub use errors::{BoxError, ErrorCode, RegistryError, Result};
pub use init_manager::{CyclePolicy, InitFn, InitManager, InitManagerBuilder, InitializeAllOptions};
pub use init_order::{find_cycle, initialization_order};
pub use module::ServiceModule;
pub use registry::{ServiceFactory, ServiceInstance, ServiceRegistry};
pub use report::{BootstrapReport, InitState, ServiceStatus};
