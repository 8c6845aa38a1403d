//! # Dependency Declaration Table
//!
//! 서비스 이름 → 의존 서비스 이름 목록의 정적 매핑입니다.
//! 초기화 함수를 등록할 때 의존성 목록을 명시하지 않으면
//! [`InitManager`](crate::core::init_manager::InitManager)가 이 테이블을 참조합니다.
//!
//! ## 선언 방법
//!
//! 각 기능 모듈은 `inventory`를 통해 자신의 의존성을 선언하고,
//! [`DependencyTable::declared`]가 실행 시점에 모든 선언을 수집합니다.
//!
//! ```rust,ignore
//! use service_bootstrap::core::dependencies::DependencyDeclaration;
//! use service_bootstrap::core::service_names::{AUTH_SERVICE, BOOK_SERVICE};
//!
//! inventory::submit! {
//!     DependencyDeclaration::new(BOOK_SERVICE, &[AUTH_SERVICE])
//! }
//! ```

use std::collections::HashMap;

/// 컴파일 타임에 수집되는 의존성 선언
pub struct DependencyDeclaration {
    /// 서비스 이름
    pub name: &'static str,
    /// 먼저 초기화되어야 하는 서비스 이름들 (선언 순서대로 초기화)
    pub dependencies: &'static [&'static str],
}

impl DependencyDeclaration {
    pub const fn new(name: &'static str, dependencies: &'static [&'static str]) -> Self {
        Self { name, dependencies }
    }
}

inventory::collect!(DependencyDeclaration);

/// 삽입 순서를 보존하는 의존성 테이블
///
/// 위상 정렬의 DFS 발견 순서가 키 순서를 따르므로 `HashMap`만으로는
/// 결정적인 순서를 얻을 수 없어 키 순서를 별도로 유지합니다.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DependencyTable {
    order: Vec<String>,
    entries: HashMap<String, Vec<String>>,
}

impl DependencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// `inventory`로 제출된 모든 선언으로 테이블을 구성합니다.
    ///
    /// 링크 순서에 따라 수집 순서가 달라지므로 이름 순으로 정렬합니다.
    /// 같은 이름이 여러 번 선언되면 마지막 선언이 남습니다.
    pub fn declared() -> Self {
        let mut declarations: Vec<&'static DependencyDeclaration> =
            inventory::iter::<DependencyDeclaration>().collect();
        declarations.sort_by_key(|declaration| declaration.name);

        let mut table = Self::new();
        for declaration in declarations {
            table.insert(declaration.name, declaration.dependencies.iter().copied());
        }

        log::debug!("Dependency table built from {} declarations", table.len());
        table
    }

    /// 빌더 스타일 선언
    ///
    /// ```rust,ignore
    /// let table = DependencyTable::new()
    ///     .with("C", ["B"])
    ///     .with("B", ["A"])
    ///     .with("A", [] as [&str; 0]);
    /// ```
    pub fn with<I, S>(mut self, name: impl Into<String>, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(name, dependencies);
        self
    }

    /// 의존성 목록을 설정합니다. 기존 항목은 순서를 유지한 채 덮어씁니다.
    pub fn insert<I, S>(&mut self, name: impl Into<String>, dependencies: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let dependencies = dependencies.into_iter().map(Into::into).collect();

        if !self.entries.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.entries.insert(name, dependencies);
    }

    /// 선언된 의존성 목록. 선언이 없으면 `None`
    pub fn dependencies_of(&self, name: &str) -> Option<&[String]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// 삽입 순서대로 서비스 이름을 반환합니다.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// 삽입 순서대로 `(이름, 의존성)` 쌍을 반환합니다.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.order.iter().map(move |name| {
            let dependencies = self.entries.get(name).map(Vec::as_slice).unwrap_or(&[]);
            (name.as_str(), dependencies)
        })
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    inventory::submit! {
        DependencyDeclaration::new("declaredTableTestService", &["declaredTableTestBase"])
    }

    #[test]
    fn test_insert_preserves_first_insertion_order() {
        let mut table = DependencyTable::new()
            .with("book", ["auth"])
            .with("auth", [] as [&str; 0])
            .with("stats", ["book"]);

        table.insert("book", ["auth", "dictionary"]);

        let names: Vec<&str> = table.names().collect();
        assert_eq!(names, vec!["book", "auth", "stats"]);
        assert_eq!(
            table.dependencies_of("book"),
            Some(&["auth".to_string(), "dictionary".to_string()][..])
        );
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_missing_entry_is_none() {
        let table = DependencyTable::new().with("auth", [] as [&str; 0]);

        assert_eq!(table.dependencies_of("auth"), Some(&[][..]));
        assert_eq!(table.dependencies_of("unknown"), None);
        assert!(!table.contains("unknown"));
    }

    #[test]
    fn test_declared_collects_inventory_submissions() {
        let table = DependencyTable::declared();

        assert_eq!(
            table.dependencies_of("declaredTableTestService"),
            Some(&["declaredTableTestBase".to_string()][..])
        );
    }
}
