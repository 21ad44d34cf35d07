//! Department tree editing.
//!
//! New nodes always receive a fresh id and there is no operation that moves
//! an existing node, so the structure stays a tree.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::types::Department;

/// Partial update for a department node
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct DepartmentPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub size: Option<u32>,
}

impl Department {
    /// Create an empty department with a fresh id
    pub fn new(name: impl Into<String>, size: u32) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            name: name.into(),
            size,
            sub_departments: Vec::new(),
        }
    }

    /// Headcount of this node plus all descendants
    pub fn total_size(&self) -> u64 {
        u64::from(self.size)
            + self
                .sub_departments
                .iter()
                .map(Department::total_size)
                .sum::<u64>()
    }
}

/// Append a top-level department and return its id
pub fn add_department(tree: &mut Vec<Department>, name: impl Into<String>, size: u32) -> String {
    let dept = Department::new(name, size);
    let id = dept.id.clone();
    tree.push(dept);
    id
}

/// Append a child under `parent_id`. Returns the new id, or `None` if the
/// parent does not exist.
pub fn add_sub_department(
    tree: &mut [Department],
    parent_id: &str,
    name: impl Into<String>,
    size: u32,
) -> Option<String> {
    let parent = find_mut(tree, parent_id)?;
    let dept = Department::new(name, size);
    let id = dept.id.clone();
    parent.sub_departments.push(dept);
    Some(id)
}

/// Apply a patch to the node with `id`. Returns false if not found.
pub fn update_department(tree: &mut [Department], id: &str, patch: DepartmentPatch) -> bool {
    let Some(dept) = find_mut(tree, id) else {
        return false;
    };
    if let Some(name) = patch.name {
        dept.name = name;
    }
    if let Some(size) = patch.size {
        dept.size = size;
    }
    true
}

/// Remove the node with `id` and its whole subtree. Returns false if not found.
pub fn remove_department(tree: &mut Vec<Department>, id: &str) -> bool {
    let before = tree.len();
    tree.retain(|d| d.id != id);
    if tree.len() != before {
        return true;
    }
    tree.iter_mut()
        .any(|d| remove_department(&mut d.sub_departments, id))
}

pub fn find<'a>(tree: &'a [Department], id: &str) -> Option<&'a Department> {
    for dept in tree {
        if dept.id == id {
            return Some(dept);
        }
        if let Some(found) = find(&dept.sub_departments, id) {
            return Some(found);
        }
    }
    None
}

fn find_mut<'a>(tree: &'a mut [Department], id: &str) -> Option<&'a mut Department> {
    for dept in tree.iter_mut() {
        if dept.id == id {
            return Some(dept);
        }
        if let Some(found) = find_mut(&mut dept.sub_departments, id) {
            return Some(found);
        }
    }
    None
}

/// Visit every node depth-first
pub fn walk(tree: &[Department], visit: &mut impl FnMut(&Department)) {
    for dept in tree {
        visit(dept);
        walk(&dept.sub_departments, visit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_nest() {
        let mut tree = Vec::new();
        let ops = add_department(&mut tree, "Opérations", 40);
        let child = add_sub_department(&mut tree, &ops, "Logistique", 12).unwrap();

        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].sub_departments[0].id, child);
        assert_eq!(tree[0].total_size(), 52);
        assert_ne!(ops, child);
    }

    #[test]
    fn test_add_sub_department_unknown_parent() {
        let mut tree = Vec::new();
        add_department(&mut tree, "RH", 3);
        assert!(add_sub_department(&mut tree, "missing", "x", 1).is_none());
    }

    #[test]
    fn test_update_nested_department() {
        let mut tree = Vec::new();
        let root = add_department(&mut tree, "TI", 10);
        let child = add_sub_department(&mut tree, &root, "", 0).unwrap();

        let updated = update_department(
            &mut tree,
            &child,
            DepartmentPatch {
                name: Some("Soutien".to_string()),
                size: None,
            },
        );
        assert!(updated);
        let node = find(&tree, &child).unwrap();
        assert_eq!(node.name, "Soutien");
        assert_eq!(node.size, 0);
    }

    #[test]
    fn test_remove_subtree() {
        let mut tree = Vec::new();
        let root = add_department(&mut tree, "Finance", 5);
        let child = add_sub_department(&mut tree, &root, "Paie", 2).unwrap();
        add_sub_department(&mut tree, &child, "Paie horaire", 1).unwrap();

        assert!(remove_department(&mut tree, &child));
        assert!(tree[0].sub_departments.is_empty());
        assert!(!remove_department(&mut tree, &child));

        assert!(remove_department(&mut tree, &root));
        assert!(tree.is_empty());
    }

    #[test]
    fn test_walk_visits_all_nodes() {
        let mut tree = Vec::new();
        let a = add_department(&mut tree, "A", 1);
        add_department(&mut tree, "B", 1);
        add_sub_department(&mut tree, &a, "A1", 1).unwrap();

        let mut names = Vec::new();
        walk(&tree, &mut |d| names.push(d.name.clone()));
        assert_eq!(names, vec!["A", "A1", "B"]);
    }
}
