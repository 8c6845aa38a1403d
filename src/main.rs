//! 서비스 부트스트랩 데모 애플리케이션
//!
//! 전역 초기화 매니저에 예제 기능 모듈들을 등록하고, 설정된 순서로
//! 모두 초기화한 뒤 진단 리포트를 출력합니다.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dotenv::dotenv;
use env_logger::Env;
use log::{error, info};
use service_bootstrap::config::BootstrapConfig;
use service_bootstrap::core::dependencies::DependencyDeclaration;
use service_bootstrap::core::service_names::{
    AUTH_SERVICE, BOOK_SERVICE, DATABASE_SERVICE, DICTIONARY_SERVICE, STATISTICS_SERVICE,
};
use service_bootstrap::core::{global, BoxError, ServiceInstance, ServiceModule};

inventory::submit! { DependencyDeclaration::new(DATABASE_SERVICE, &[]) }
inventory::submit! { DependencyDeclaration::new(AUTH_SERVICE, &[DATABASE_SERVICE]) }
inventory::submit! { DependencyDeclaration::new(BOOK_SERVICE, &[AUTH_SERVICE, DATABASE_SERVICE]) }
inventory::submit! { DependencyDeclaration::new(DICTIONARY_SERVICE, &[AUTH_SERVICE]) }
inventory::submit! { DependencyDeclaration::new(STATISTICS_SERVICE, &[BOOK_SERVICE]) }

/// 원격 연결을 흉내 내는 예제 서비스
#[derive(Debug)]
struct DemoService {
    name: &'static str,
}

impl DemoService {
    async fn connect(name: &'static str) -> Result<Arc<Self>, BoxError> {
        tokio::time::sleep(Duration::from_millis(10)).await;
        info!("🔌 {} connected", name);
        Ok(Arc::new(Self { name }))
    }
}

/// 다른 서비스를 지연 조회하는 모듈 예제
struct StatisticsModule;

#[async_trait]
impl ServiceModule for StatisticsModule {
    fn name(&self) -> &str {
        STATISTICS_SERVICE
    }

    async fn create(&self) -> Result<ServiceInstance, BoxError> {
        let book: Arc<DemoService> = global::registry()
            .get_or_initialize(BOOK_SERVICE, global::manager())
            .await?;
        info!("📊 statistics bound to {}", book.name);
        Ok(DemoService::connect(STATISTICS_SERVICE).await?)
    }
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // 환경 설정 및 로깅 초기화
    load_env_file();
    init_logging();

    info!("🚀 서비스 부트스트랩 시작중...");

    let config = BootstrapConfig::from_env();
    info!("부트스트랩 설정 로드됨: {:?}", config);

    register_services();

    let manager = global::manager();
    if let Err(err) = manager.initialize_all(config.initialize_all_options()).await {
        error!("❌ 서비스 초기화 실패 [{}]: {}", err.code(), err);
        println!("{}", manager.report().to_json()?);
        return Err(err.into());
    }

    info!("✅ 모든 서비스가 성공적으로 초기화되었습니다!");
    println!("{}", manager.report().to_json()?);
    Ok(())
}

/// 예제 서비스들을 전역 매니저에 등록합니다
///
/// 의존성 목록은 `inventory`로 선언된 테이블에서 가져옵니다.
fn register_services() {
    let manager = global::manager();

    manager.register_service(DATABASE_SERVICE, || DemoService::connect(DATABASE_SERVICE));
    manager.register_service(AUTH_SERVICE, || DemoService::connect(AUTH_SERVICE));
    manager.register_service(BOOK_SERVICE, || DemoService::connect(BOOK_SERVICE));
    manager.register_service(DICTIONARY_SERVICE, || DemoService::connect(DICTIONARY_SERVICE));
    manager.register_module(Arc::new(StatisticsModule));
}

/// 환경별 설정 파일을 로드합니다
///
/// # Environment Variables
///
/// * `PROFILE=dev` - .env.dev 파일 로드 (기본값)
/// * `PROFILE=prod` - .env.prod 파일 로드
/// * 기타 - 기본 .env 파일 로드
fn load_env_file() {
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "dev".to_string());

    match profile.as_str() {
        "prod" => {
            if let Err(e) = dotenv::from_filename(".env.prod") {
                eprintln!(".env.prod 파일 로드 실패: {}", e);
            }
        }
        "dev" => {
            if let Err(e) = dotenv::from_filename(".env.dev") {
                eprintln!(".env.dev 파일 로드 실패: {}", e);
            }
        }
        _ => {
            dotenv().ok();
        }
    }
}

/// 로깅 시스템을 초기화합니다
///
/// * `RUST_LOG` - 로깅 레벨 설정 (기본값: "info")
///
/// ```bash
/// RUST_LOG=service_bootstrap::core::init_manager=debug cargo run
/// ```
fn init_logging() {
    env_logger::init_from_env(Env::default().default_filter_or("info"));
}
