//! 부트스트랩 설정 관리 모듈
//!
//! 실행 환경과 서비스 초기화 정책(순환 처리, 초기화 순서, 진행 배너)을 관리합니다.

use std::env;

use log::error;

use crate::core::init_manager::{CyclePolicy, InitializeAllOptions};

/// 애플리케이션 실행 환경
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Environment {
    /// 개발 환경 - 초기화 진행 배너 출력
    Development,
    /// 테스트 환경 - 자동화된 테스트용 설정
    Test,
    /// 스테이징 환경 - 프로덕션 유사 환경
    Staging,
    /// 프로덕션 환경
    Production,
}

impl Environment {
    /// 현재 실행 환경을 감지합니다.
    ///
    /// `ENVIRONMENT` 또는 `NODE_ENV` 환경 변수를 확인하며,
    /// 설정되지 않은 경우 `Production`을 기본값으로 사용합니다.
    pub fn current() -> Self {
        Self::from_lookup(&|key: &str| env::var(key).ok())
    }

    fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Self {
        let name = lookup("ENVIRONMENT")
            .or_else(|| lookup("NODE_ENV"))
            .unwrap_or_else(|| "production".to_string());
        Self::from_str(&name)
    }

    /// 문자열에서 Environment를 생성합니다.
    ///
    /// # Arguments
    ///
    /// * `s` - 환경 이름 문자열 (대소문자 무관)
    ///
    /// # Returns
    ///
    /// 해당하는 Environment 값. 알 수 없는 값인 경우 `Production`을 반환합니다.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Environment::Development,
            "test" | "testing" => Environment::Test,
            "staging" | "stage" => Environment::Staging,
            _ => Environment::Production,
        }
    }
}

/// 서비스 부트스트랩 설정
///
/// # Environment Variables
///
/// - `SERVICE_CYCLE_POLICY`: `lenient` (기본값) | `strict`
/// - `SERVICE_INIT_ORDER`: `registration` (기본값) | `topological`
/// - `SERVICE_BOOTSTRAP_BANNER`: `true` | `false` (기본값: 개발 환경에서만 `true`)
///
/// # Examples
///
/// ```bash
/// # .env.dev
/// SERVICE_CYCLE_POLICY=strict
/// SERVICE_INIT_ORDER=topological
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapConfig {
    pub environment: Environment,
    pub cycle_policy: CyclePolicy,
    pub use_topological_order: bool,
    pub show_banner: bool,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Production,
            cycle_policy: CyclePolicy::Lenient,
            use_topological_order: false,
            show_banner: false,
        }
    }
}

impl BootstrapConfig {
    /// 프로세스 환경 변수에서 설정을 로드합니다.
    pub fn from_env() -> Self {
        Self::from_lookup(|key: &str| env::var(key).ok())
    }

    /// 임의의 키 조회 함수로 설정을 로드합니다.
    ///
    /// 잘못된 값은 에러 로그를 남기고 기본값으로 대체합니다.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let environment = Environment::from_lookup(&lookup);

        let cycle_policy = match lookup("SERVICE_CYCLE_POLICY") {
            None => CyclePolicy::Lenient,
            Some(value) => value.parse().unwrap_or_else(|e| {
                error!("SERVICE_CYCLE_POLICY 파싱 실패: {}. 기본값 lenient 사용", e);
                CyclePolicy::Lenient
            }),
        };

        let use_topological_order = match lookup("SERVICE_INIT_ORDER").as_deref() {
            None => false,
            Some(value) => match value.to_lowercase().as_str() {
                "topological" | "topo" => true,
                "registration" => false,
                other => {
                    error!("SERVICE_INIT_ORDER 파싱 실패: {}. 기본값 registration 사용", other);
                    false
                }
            },
        };

        let banner_default = environment == Environment::Development;
        let show_banner = match lookup("SERVICE_BOOTSTRAP_BANNER") {
            None => banner_default,
            Some(value) => value.parse::<bool>().unwrap_or_else(|e| {
                error!("SERVICE_BOOTSTRAP_BANNER 파싱 실패: {}. 기본값 {} 사용", e, banner_default);
                banner_default
            }),
        };

        Self {
            environment,
            cycle_policy,
            use_topological_order,
            show_banner,
        }
    }

    /// 설정된 순서 정책으로 `initialize_all` 옵션을 생성합니다.
    pub fn initialize_all_options(&self) -> InitializeAllOptions {
        InitializeAllOptions {
            use_topological_order: self.use_topological_order,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| values.get(key).cloned()
    }

    #[test]
    fn test_environment_from_string() {
        assert_eq!(
            Environment::from_str("development"),
            Environment::Development
        );
        assert_eq!(Environment::from_str("DEV"), Environment::Development);
        assert_eq!(Environment::from_str("test"), Environment::Test);
        assert_eq!(Environment::from_str("production"), Environment::Production);
        assert_eq!(Environment::from_str("unknown"), Environment::Production);
    }

    #[test]
    fn test_defaults_without_variables() {
        let config = BootstrapConfig::from_lookup(lookup_from(&[]));

        assert_eq!(config, BootstrapConfig::default());
        assert!(!config.initialize_all_options().use_topological_order);
    }

    #[test]
    fn test_node_env_fallback_enables_banner_in_development() {
        let config = BootstrapConfig::from_lookup(lookup_from(&[("NODE_ENV", "development")]));

        assert_eq!(config.environment, Environment::Development);
        assert!(config.show_banner);
    }

    #[test]
    fn test_explicit_values() {
        let config = BootstrapConfig::from_lookup(lookup_from(&[
            ("ENVIRONMENT", "staging"),
            ("SERVICE_CYCLE_POLICY", "STRICT"),
            ("SERVICE_INIT_ORDER", "topological"),
            ("SERVICE_BOOTSTRAP_BANNER", "true"),
        ]));

        assert_eq!(config.environment, Environment::Staging);
        assert_eq!(config.cycle_policy, CyclePolicy::Strict);
        assert!(config.initialize_all_options().use_topological_order);
        assert!(config.show_banner);
    }

    #[test]
    fn test_invalid_values_fall_back_to_defaults() {
        let config = BootstrapConfig::from_lookup(lookup_from(&[
            ("ENVIRONMENT", "development"),
            ("SERVICE_CYCLE_POLICY", "paranoid"),
            ("SERVICE_INIT_ORDER", "random"),
            ("SERVICE_BOOTSTRAP_BANNER", "yes please"),
        ]));

        assert_eq!(config.cycle_policy, CyclePolicy::Lenient);
        assert!(!config.use_topological_order);
        assert!(config.show_banner);
    }
}
