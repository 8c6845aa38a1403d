//! 터미널 출력 포맷팅 유틸리티
//!
//! 서비스 부트스트랩 과정에서 사용되는 터미널 출력 함수들을 제공합니다.
//! 박스 형태의 제목, 진행 단계 표시, 완료 요약 등을 시각적으로 표현합니다.

/// 박스 형태로 둘러싸인 제목을 출력합니다
///
/// Unicode 박스 문자를 사용하여 시각적으로 눈에 띄는 제목을 출력합니다.
/// 텍스트는 자동으로 중앙 정렬됩니다.
///
/// Output:
/// ```text
/// ╔══════════════════════════════════════════════════╗
/// ║           🔄 INITIALIZING SERVICES               ║
/// ╚══════════════════════════════════════════════════╝
/// ```
pub fn print_boxed_title(title: &str) {
    println!("{}", boxed_title(title));
}

fn boxed_title(title: &str) -> String {
    // 고정 너비 50칸 사용 (박스 내부 콘텐츠)
    let content_width = 50;
    let border = "═".repeat(content_width);

    format!("╔{}╗\n║{:^49}║\n╚{}╝", border, title, border)
}

/// 진행 단계 시작을 표시합니다
///
/// ```text
/// → Step 1: Resolving topological order
/// ```
pub fn print_step_start(step: u8, description: &str) {
    println!("→ Step {}: {}", step, description);
}

/// 진행 단계 완료를 표시합니다
///
/// ```text
/// ✓ Step 2: Services initialized (5 items)
/// ```
pub fn print_step_complete(step: u8, description: &str, count: usize) {
    println!("✓ Step {}: {} ({} items)", step, description, count);
}

/// 서브 작업의 상태를 표시합니다
///
/// ```text
///    ├─ authService: ✓ Initialized
///    ├─ bookService: ✓ Initialized
/// ```
pub fn print_sub_task(name: &str, status: &str) {
    println!("   ├─ {}: {}", name, status);
}

/// 최종 완료 요약을 출력합니다
///
/// ```text
/// ╔══════════════════════════════════════════════════╗
/// ║             🎉 SERVICES INITIALIZED              ║
/// ╚══════════════════════════════════════════════════╝
///    🔧 Registered: 5
///    ✅ Initialized: 5
///    📦 Instances: 6
/// ```
pub fn print_final_summary(registered: usize, initialized: usize, instances: usize) {
    println!();
    print_boxed_title("🎉 SERVICES INITIALIZED");
    println!("   🔧 Registered: {}", registered);
    println!("   ✅ Initialized: {}", initialized);
    println!("   📦 Instances: {}", instances);
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boxed_title_layout() {
        let boxed = boxed_title("READY");
        let lines: Vec<&str> = boxed.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with('╔') && lines[0].ends_with('╗'));
        assert!(lines[1].contains("READY"));
        assert_eq!(lines[0].chars().count(), 52);
    }
}
