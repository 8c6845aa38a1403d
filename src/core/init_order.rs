//! # Topological Order Resolver
//!
//! 의존성 테이블을 "모든 서비스가 자신의 의존성 뒤에 오는" 순서로 선형화합니다.
//! 결과는 `initialize_all`의 후보 순서로만 쓰이며, 실제 안전성은 초기화
//! 매니저의 의존성 순회와 `initializing` 가드가 보장합니다.

use std::collections::HashSet;

use log::{error, info};

use crate::core::dependencies::DependencyTable;

/// DFS 기반 위상 정렬로 초기화 순서를 계산합니다.
///
/// - 키 삽입 순서대로 방문을 시작하며, 의존성을 먼저 방문합니다.
/// - 테이블에 키로 없는 의존성도 잎 노드로 취급해 결과에 포함합니다.
/// - 순환에 참여한 노드는 에러 로그만 남기고 DFS 발견 순서대로 배출합니다.
///
/// # Examples
///
/// ```rust,ignore
/// let table = DependencyTable::new()
///     .with("C", ["B"])
///     .with("B", ["A"])
///     .with("A", [] as [&str; 0]);
///
/// assert_eq!(initialization_order(&table), vec!["A", "B", "C"]);
/// ```
pub fn initialization_order(table: &DependencyTable) -> Vec<String> {
    let mut visited = HashSet::new();
    let mut path = Vec::new();
    let mut order = Vec::with_capacity(table.len());

    for name in table.names() {
        if !visited.contains(name) {
            visit(table, name, &mut visited, &mut path, &mut order);
        }
    }

    info!("Initialization order: {}", order.join(", "));
    order
}

fn visit(
    table: &DependencyTable,
    name: &str,
    visited: &mut HashSet<String>,
    path: &mut Vec<String>,
    order: &mut Vec<String>,
) {
    if path.iter().any(|entry| entry == name) {
        error!(
            "Circular dependency detected: {} -> {}",
            path.join(" -> "),
            name
        );
        return;
    }

    if visited.contains(name) {
        return;
    }

    path.push(name.to_string());
    for dependency in table.dependencies_of(name).unwrap_or(&[]) {
        visit(table, dependency, visited, path, order);
    }
    path.pop();

    visited.insert(name.to_string());
    order.push(name.to_string());
}

/// 테이블에서 처음 발견되는 순환 경로를 반환합니다.
///
/// 반환 경로는 순환을 닫는 노드로 끝납니다 (`["X", "Y", "X"]`).
pub fn find_cycle(table: &DependencyTable) -> Option<Vec<String>> {
    let mut visited = HashSet::new();

    for name in table.names() {
        let mut path = Vec::new();
        if let Some(cycle) = find_cycle_from(table, name, &mut visited, &mut path) {
            return Some(cycle);
        }
    }
    None
}

fn find_cycle_from(
    table: &DependencyTable,
    name: &str,
    visited: &mut HashSet<String>,
    path: &mut Vec<String>,
) -> Option<Vec<String>> {
    if let Some(start) = path.iter().position(|entry| entry == name) {
        let mut cycle = path[start..].to_vec();
        cycle.push(name.to_string());
        return Some(cycle);
    }

    if !visited.insert(name.to_string()) {
        return None;
    }

    path.push(name.to_string());
    for dependency in table.dependencies_of(name).unwrap_or(&[]) {
        if let Some(cycle) = find_cycle_from(table, dependency, visited, path) {
            return Some(cycle);
        }
    }
    path.pop();

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_deps() -> [&'static str; 0] {
        []
    }

    #[test]
    fn test_chain_resolves_dependencies_first() {
        let table = DependencyTable::new()
            .with("C", ["B"])
            .with("B", ["A"])
            .with("A", no_deps());

        assert_eq!(initialization_order(&table), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_every_name_follows_its_dependencies() {
        let table = DependencyTable::new()
            .with("statisticsService", ["bookService", "authService"])
            .with("feedbackService", ["authService"])
            .with("bookService", ["authService", "dictionaryService"])
            .with("authService", no_deps())
            .with("dictionaryService", no_deps());

        let order = initialization_order(&table);
        let position = |name: &str| order.iter().position(|entry| entry == name).unwrap();

        assert_eq!(order.len(), 5);
        for (name, dependencies) in table.iter() {
            for dependency in dependencies {
                assert!(position(dependency.as_str()) < position(name), "{dependency} before {name}");
            }
        }
    }

    #[test]
    fn test_undeclared_dependency_is_emitted_as_leaf() {
        let table = DependencyTable::new().with("bookService", ["authService"]);

        assert_eq!(initialization_order(&table), vec!["authService", "bookService"]);
    }

    #[test]
    fn test_cycle_members_are_still_emitted_once() {
        let table = DependencyTable::new()
            .with("X", ["Y"])
            .with("Y", ["X"])
            .with("Z", ["X"]);

        assert_eq!(initialization_order(&table), vec!["Y", "X", "Z"]);
    }

    #[test]
    fn test_find_cycle_reports_closing_path() {
        let table = DependencyTable::new()
            .with("A", no_deps())
            .with("X", ["Y"])
            .with("Y", ["X"]);

        assert_eq!(
            find_cycle(&table),
            Some(vec!["X".to_string(), "Y".to_string(), "X".to_string()])
        );
    }

    #[test]
    fn test_find_cycle_none_for_acyclic_table() {
        let table = DependencyTable::new()
            .with("C", ["B", "A"])
            .with("B", ["A"])
            .with("A", no_deps());

        assert_eq!(find_cycle(&table), None);
    }
}
