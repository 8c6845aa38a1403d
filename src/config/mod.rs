//! # Configuration Module
//!
//! 서비스 부트스트랩의 설정 관리를 담당하는 모듈입니다.
//! 환경 변수 기반의 설정값을 한곳에서 읽어 초기화 매니저에 전달합니다.
//!
//! ## 모듈 구성
//!
//! - [`bootstrap_config`] - 실행 환경, 순환 정책, 초기화 순서, 진행 배너 설정
//!
//! ## 사용 예제
//!
//! ```rust,ignore
//! use service_bootstrap::config::BootstrapConfig;
//! use service_bootstrap::core::{InitManager, ServiceRegistry};
//!
//! let config = BootstrapConfig::from_env();
//! let manager = InitManager::builder(ServiceRegistry::new())
//!     .config(&config)
//!     .build();
//!
//! manager.initialize_all(config.initialize_all_options()).await?;
//! ```
//!
//! ## 환경 변수 설정 가이드
//!
//! ```bash
//! # 환경 설정
//! export ENVIRONMENT="development"      # development, test, staging, production
//!
//! # 초기화 정책
//! export SERVICE_CYCLE_POLICY="strict"  # lenient, strict
//! export SERVICE_INIT_ORDER="topological"
//! export SERVICE_BOOTSTRAP_BANNER="false"
//! ```

pub mod bootstrap_config;

pub use bootstrap_config::*;
