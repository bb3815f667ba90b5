//! Department hierarchy rules.
//!
//! Departments nest at most one level: a sub-department points at a
//! top-level department of the same church.

use serde::Serialize;

use crate::error::CoreError;
use crate::types::DbId;

/// The facts about a prospective parent needed to validate nesting.
#[derive(Debug, Clone, Copy)]
pub struct ParentInfo {
    pub id: DbId,
    pub church_id: DbId,
    pub parent_id: Option<DbId>,
}

/// Validate that `parent` may hold the department `child_id` (None while
/// creating) of `church_id`.
///
/// `child_has_children` must be true when the department being moved already
/// has sub-departments of its own.
pub fn validate_parent(
    church_id: DbId,
    child_id: Option<DbId>,
    child_has_children: bool,
    parent: Option<ParentInfo>,
) -> Result<(), CoreError> {
    let Some(parent) = parent else {
        return Ok(());
    };

    if Some(parent.id) == child_id {
        return Err(CoreError::Validation(
            "A department can not be its own parent".into(),
        ));
    }
    if parent.church_id != church_id {
        return Err(CoreError::other_tenant("Department", parent.id));
    }
    if parent.parent_id.is_some() {
        return Err(CoreError::Validation(
            "Sub-departments can not have sub-departments of their own".into(),
        ));
    }
    if child_has_children {
        return Err(CoreError::Conflict(
            "A department with sub-departments can not become a sub-department".into(),
        ));
    }
    Ok(())
}

/// Rows that can be arranged into a one-level tree.
pub trait Hierarchical {
    fn id(&self) -> DbId;
    fn parent_id(&self) -> Option<DbId>;
}

/// A top-level department with its direct children.
#[derive(Debug, Clone, Serialize)]
pub struct DepartmentNode<T> {
    #[serde(flatten)]
    pub department: T,
    pub children: Vec<T>,
}

/// Group a flat, already ordered list into top-level nodes.
///
/// Children whose parent is missing from `items` are promoted to the top
/// level so nothing disappears from listings.
pub fn nest<T: Hierarchical + Clone>(items: &[T]) -> Vec<DepartmentNode<T>> {
    let top_ids: Vec<DbId> = items
        .iter()
        .filter(|d| d.parent_id().is_none())
        .map(Hierarchical::id)
        .collect();

    items
        .iter()
        .filter(|d| match d.parent_id() {
            None => true,
            Some(parent) => !top_ids.contains(&parent),
        })
        .map(|d| DepartmentNode {
            department: d.clone(),
            children: items
                .iter()
                .filter(|c| c.parent_id() == Some(d.id()))
                .cloned()
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Dept {
        id: DbId,
        parent: Option<DbId>,
    }

    impl Hierarchical for Dept {
        fn id(&self) -> DbId {
            self.id
        }
        fn parent_id(&self) -> Option<DbId> {
            self.parent
        }
    }

    fn top(id: DbId) -> ParentInfo {
        ParentInfo {
            id,
            church_id: 1,
            parent_id: None,
        }
    }

    #[test]
    fn no_parent_is_always_valid() {
        assert!(validate_parent(1, None, false, None).is_ok());
    }

    #[test]
    fn top_level_parent_in_same_church_is_valid() {
        assert!(validate_parent(1, None, false, Some(top(10))).is_ok());
        assert!(validate_parent(1, Some(5), false, Some(top(10))).is_ok());
    }

    #[test]
    fn self_parent_is_rejected() {
        assert_matches!(
            validate_parent(1, Some(10), false, Some(top(10))),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn parent_from_another_church_looks_missing() {
        let foreign = ParentInfo {
            church_id: 2,
            ..top(10)
        };
        assert_matches!(
            validate_parent(1, None, false, Some(foreign)),
            Err(CoreError::NotFound { .. })
        );
    }

    #[test]
    fn only_one_level_of_nesting() {
        let child = ParentInfo {
            parent_id: Some(3),
            ..top(10)
        };
        assert_matches!(
            validate_parent(1, None, false, Some(child)),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            validate_parent(1, Some(4), true, Some(top(10))),
            Err(CoreError::Conflict(_))
        );
    }

    #[test]
    fn nest_groups_children_under_parents() {
        let items = vec![
            Dept { id: 1, parent: None },
            Dept { id: 2, parent: Some(1) },
            Dept { id: 3, parent: None },
            Dept { id: 4, parent: Some(1) },
        ];
        let tree = nest(&items);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].department.id, 1);
        assert_eq!(tree[0].children.len(), 2);
        assert!(tree[1].children.is_empty());
    }

    #[test]
    fn orphans_are_promoted() {
        let items = vec![Dept { id: 2, parent: Some(99) }];
        let tree = nest(&items);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].department.id, 2);
    }
}
