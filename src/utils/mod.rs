//! 공통 유틸리티 함수 모듈
//!
//! 부트스트랩 과정에서 사용되는 공통 유틸리티 함수들을 제공합니다.
//!
//! # Modules
//!
//! - [`display_terminal`] - 터미널 출력 포맷팅 함수들
//!
//! # Examples
//!
//! ```rust,ignore
//! use crate::utils::display_terminal::print_boxed_title;
//!
//! print_boxed_title("System Initialized");
//! ```

pub mod display_terminal;
