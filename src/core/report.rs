//! 부트스트랩 진단 리포트
//!
//! 초기화 매니저의 현재 상태를 직렬화 가능한 형태로 스냅샷합니다.
//! 진단 화면이나 로그 출력용입니다.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::init_manager::CyclePolicy;

/// 서비스 초기화 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InitState {
    NotStarted,
    Initializing,
    Initialized,
}

/// 서비스 하나의 상태
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceStatus {
    pub name: String,
    pub dependencies: Vec<String>,
    pub state: InitState,
    /// 레지스트리에 인스턴스가 있는지 여부
    pub has_instance: bool,
}

/// 초기화 매니저 스냅샷
#[derive(Debug, Clone, Serialize)]
pub struct BootstrapReport {
    pub generated_at: DateTime<Utc>,
    pub cycle_policy: CyclePolicy,
    /// 초기화 함수 등록 순서
    pub services: Vec<ServiceStatus>,
    /// 초기화 완료 순서
    pub initialized: Vec<String>,
    /// 초기화 함수 없이 레지스트리에만 존재하는 인스턴스
    pub unmanaged_instances: Vec<String>,
}

impl BootstrapReport {
    /// 아직 초기화되지 않은 서비스 이름
    pub fn pending(&self) -> Vec<&str> {
        self.services
            .iter()
            .filter(|status| status.state != InitState::Initialized)
            .map(|status| status.name.as_str())
            .collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
