//! # Service Bootstrap Error System
//!
//! 서비스 레지스트리와 초기화 매니저가 공유하는 에러 타입입니다.
//! `thiserror`로 `Error` trait을 구현하며, 하나의 초기화 실패를 같은 서비스를
//! 기다리던 모든 호출자에게 그대로 전달할 수 있도록 `Clone`을 지원합니다.
//!
//! ## 에러 분류
//!
//! | RegistryError | ErrorCode | 재시도 | 사용 시나리오 |
//! |---------------|-----------|--------|---------------|
//! | `NotRegistered` | `ServiceError` | ✗ | 등록되지 않은 이름 조회 |
//! | `MissingInitializer` | `ServiceInitializationError` | ✗ | 초기화 함수 없이 초기화 요청 |
//! | `InitializationFailed` | `ServiceInitializationError` | ✓ | 팩토리/초기화 함수 실패 |
//! | `CircularDependency` | `CircularDependency` | ✗ | strict 정책에서 순환 감지 |
//! | `TypeMismatch` | `ServiceError` | ✗ | 등록된 타입과 요청 타입 불일치 |
//!
//! ## 사용 패턴
//!
//! ```rust,ignore
//! use service_bootstrap::core::errors::RegistryError;
//!
//! match manager.initialize_service("bookService").await {
//!     Ok(()) => {}
//!     Err(e) if e.is_retryable() => retry_later(e.service_name()),
//!     Err(e) => return Err(e),
//! }
//! ```

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

/// 초기화 함수와 팩토리가 반환하는 에러 타입
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// 레지스트리 연산 결과 타입
pub type Result<T> = std::result::Result<T, RegistryError>;

/// 에러 분류 코드
///
/// 상위 계층(부트스트랩 화면, 기능별 에러 상태)이 메시지 파싱 없이
/// 에러 종류를 구분할 때 사용합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// 조회/타입 관련 설정 오류
    ServiceError,
    /// 초기화 단계 오류
    ServiceInitializationError,
    /// 순환 의존성
    CircularDependency,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ServiceError => "SERVICE_ERROR",
            ErrorCode::ServiceInitializationError => "SERVICE_INITIALIZATION_ERROR",
            ErrorCode::CircularDependency => "CIRCULAR_DEPENDENCY",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 레지스트리/초기화 매니저 전역 에러 타입
#[derive(Error, Debug, Clone)]
pub enum RegistryError {
    /// 인스턴스도 초기화 경로도 없는 서비스 조회
    #[error("Service \"{0}\" not registered")]
    NotRegistered(String),

    /// 초기화 함수가 등록되지 않은 서비스의 초기화 요청
    ///
    /// 설정 오류이므로 재시도하지 않고 즉시 호출자에게 보고합니다.
    #[error("No initialization function registered for service: {0}")]
    MissingInitializer(String),

    /// 초기화 함수 또는 팩토리 실패
    ///
    /// 실패한 서비스는 "시작 전" 상태로 돌아가므로 이후 재시도가 가능합니다.
    #[error("Failed to initialize service \"{name}\": {source}")]
    InitializationFailed {
        name: String,
        #[source]
        source: Arc<dyn StdError + Send + Sync>,
    },

    /// strict 정책에서 감지된 순환 의존성 (`A -> B -> A`)
    #[error("Circular dependency detected: {}", .0.join(" -> "))]
    CircularDependency(Vec<String>),

    /// 등록된 인스턴스가 요청한 타입이 아님
    #[error("Type mismatch for service \"{name}\": expected {expected}")]
    TypeMismatch { name: String, expected: &'static str },
}

impl RegistryError {
    /// 초기화 실패 에러를 생성합니다.
    ///
    /// 이미 `RegistryError`인 원인(예: 초기화 함수 안에서 다른 서비스를
    /// 지연 초기화하다 실패한 경우)은 다시 감싸지 않고 그대로 돌려줍니다.
    pub fn initialization_failed(name: impl Into<String>, source: BoxError) -> Self {
        match source.downcast::<RegistryError>() {
            Ok(inner) => *inner,
            Err(source) => RegistryError::InitializationFailed {
                name: name.into(),
                source: Arc::from(source),
            },
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            RegistryError::NotRegistered(_) | RegistryError::TypeMismatch { .. } => {
                ErrorCode::ServiceError
            }
            RegistryError::MissingInitializer(_) | RegistryError::InitializationFailed { .. } => {
                ErrorCode::ServiceInitializationError
            }
            RegistryError::CircularDependency(_) => ErrorCode::CircularDependency,
        }
    }

    /// 같은 요청을 다시 시도할 의미가 있는지 여부
    pub fn is_retryable(&self) -> bool {
        matches!(self, RegistryError::InitializationFailed { .. })
    }

    /// 에러와 연관된 서비스 이름
    ///
    /// 순환 의존성의 경우 순환을 닫은 (재진입된) 서비스를 반환합니다.
    pub fn service_name(&self) -> Option<&str> {
        match self {
            RegistryError::NotRegistered(name)
            | RegistryError::MissingInitializer(name)
            | RegistryError::InitializationFailed { name, .. }
            | RegistryError::TypeMismatch { name, .. } => Some(name),
            RegistryError::CircularDependency(chain) => chain.last().map(String::as_str),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("connection refused")]
    struct ConnectError;

    #[test]
    fn test_messages_name_the_service() {
        let err = RegistryError::MissingInitializer("doesNotExist".to_string());
        assert!(err.to_string().contains("doesNotExist"));

        let err = RegistryError::NotRegistered("bookService".to_string());
        assert_eq!(err.to_string(), "Service \"bookService\" not registered");
    }

    #[test]
    fn test_initialization_failed_keeps_cause() {
        let err = RegistryError::initialization_failed("authService", Box::new(ConnectError));

        assert_eq!(
            err.to_string(),
            "Failed to initialize service \"authService\": connection refused"
        );
        assert!(err.source().is_some());
        assert!(err.is_retryable());
        assert_eq!(err.code(), ErrorCode::ServiceInitializationError);
        assert_eq!(err.service_name(), Some("authService"));
    }

    #[test]
    fn test_initialization_failed_does_not_rewrap_registry_errors() {
        let inner = RegistryError::MissingInitializer("dictionaryService".to_string());
        let err = RegistryError::initialization_failed("bookService", Box::new(inner));

        assert!(matches!(err, RegistryError::MissingInitializer(ref name) if name == "dictionaryService"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_circular_dependency_message() {
        let err = RegistryError::CircularDependency(vec![
            "A".to_string(),
            "B".to_string(),
            "A".to_string(),
        ]);

        assert_eq!(err.to_string(), "Circular dependency detected: A -> B -> A");
        assert_eq!(err.code(), ErrorCode::CircularDependency);
        assert_eq!(err.code().as_str(), "CIRCULAR_DEPENDENCY");
        assert_eq!(err.service_name(), Some("A"));
    }
}
