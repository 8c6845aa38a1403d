//! 서비스 부트스트랩 라이브러리
//!
//! 이름 기반 서비스 레지스트리와 의존성 기반 비동기 초기화 매니저를 제공합니다.
//! 기능 모듈(인증, 콘텐츠, 통계 등)은 초기화 함수와 의존성만 선언하고,
//! 인스턴스 생성 순서와 중복 실행 방지는 매니저가 책임집니다.
//!
//! # Features
//!
//! - **서비스 레지스트리**: 문자열 키 기반 인스턴스 저장, 지연 팩토리
//! - **초기화 매니저**: 정확히 한 번 실행, 의존성 우선, 진행 중 실행 공유
//! - **순환 감지**: 재진입 감지 후 lenient(경고) / strict(에러) 정책 적용
//! - **위상 정렬**: 선언된 의존성 그래프 기반 초기화 순서 계산
//! - **진단 리포트**: 초기화 상태의 JSON 스냅샷
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  Feature Modules│ ← 초기화 함수 + 의존성 선언
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │   InitManager   │ ← 의존성 순서, 중복 방지, 순환 감지
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ ServiceRegistry │ ← 이름 → 인스턴스
//! └─────────────────┘
//! ```
//!
//! # Examples
//!
//! ```rust,ignore
//! use service_bootstrap::core::{global, InitializeAllOptions};
//!
//! global::manager().register_service(AUTH_SERVICE, || async { Ok(Arc::new(AuthService::new())) });
//! global::manager().initialize_all(InitializeAllOptions::topological()).await?;
//!
//! let auth: Arc<AuthService> = global::registry().get(AUTH_SERVICE).expect("initialized");
//! ```

pub mod core;
pub mod config;
pub mod utils;
