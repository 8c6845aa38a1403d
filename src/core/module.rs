//! 서비스 모듈 인터페이스
//!
//! 각 기능 모듈(인증, 콘텐츠, 통계 등)이 초기화 매니저에 자신을 등록할 때
//! 구현하는 trait입니다. 모듈은 원격 설정을 수행하고 인스턴스를 돌려줄 뿐이며,
//! 레지스트리 등록과 의존성 순서는 매니저가 책임집니다.

use async_trait::async_trait;

use crate::core::errors::BoxError;
use crate::core::registry::ServiceInstance;

/// 비동기 생성 로직을 가진 서비스 모듈
///
/// # Examples
///
/// ```rust,ignore
/// struct BookModule;
///
/// #[async_trait]
/// impl ServiceModule for BookModule {
///     fn name(&self) -> &str {
///         BOOK_SERVICE
///     }
///
///     fn dependencies(&self) -> Option<Vec<String>> {
///         Some(vec![AUTH_SERVICE.to_string()])
///     }
///
///     async fn create(&self) -> Result<ServiceInstance, BoxError> {
///         Ok(Arc::new(BookService::connect().await?))
///     }
/// }
///
/// manager.register_module(Arc::new(BookModule));
/// ```
#[async_trait]
pub trait ServiceModule: Send + Sync {
    /// 레지스트리 키로 사용되는 서비스 이름
    fn name(&self) -> &str;

    /// 명시적 의존성 목록
    ///
    /// `None`이면 의존성 선언 테이블을 사용합니다.
    fn dependencies(&self) -> Option<Vec<String>> {
        None
    }

    /// 인스턴스를 생성합니다.
    async fn create(&self) -> Result<ServiceInstance, BoxError>;
}
