//! 서비스 이름 상수
//!
//! 레지스트리 키로 사용되는 서비스 이름입니다. 문자열 오타로 인한
//! "service not registered" 에러를 줄이기 위해 상수로 관리합니다.

pub const AUTH_SERVICE: &str = "authService";
pub const BOOK_SERVICE: &str = "bookService";
pub const AI_SERVICE: &str = "aiService";
pub const DICTIONARY_SERVICE: &str = "dictionaryService";
pub const FEEDBACK_SERVICE: &str = "feedbackService";
pub const TRIGGER_SERVICE: &str = "triggerService";
pub const STATISTICS_SERVICE: &str = "statisticsService";
pub const CONSULTANT_SERVICE: &str = "consultantService";
pub const INTERACTION_SERVICE: &str = "interactionService";
pub const MONITORING_SERVICE: &str = "monitoringService";
pub const DATABASE_SERVICE: &str = "databaseService";
pub const ANALYTICS_SERVICE: &str = "analyticsService";
pub const SAMPLE_SERVICE: &str = "sampleService";

/// 알려진 모든 서비스 이름
pub const ALL: &[&str] = &[
    AUTH_SERVICE,
    BOOK_SERVICE,
    AI_SERVICE,
    DICTIONARY_SERVICE,
    FEEDBACK_SERVICE,
    TRIGGER_SERVICE,
    STATISTICS_SERVICE,
    CONSULTANT_SERVICE,
    INTERACTION_SERVICE,
    MONITORING_SERVICE,
    DATABASE_SERVICE,
    ANALYTICS_SERVICE,
    SAMPLE_SERVICE,
];
