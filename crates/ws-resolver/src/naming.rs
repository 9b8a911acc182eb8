// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::{HashMap, HashSet};
use std::fmt::Display;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum PathRoot {
    Parameter(String),
    Return,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum PathStep {
    Field(String),
    Element,
}

/// Location of a descriptor node within a function signature, such as `criteria.users[].email`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    root: PathRoot,
    steps: Vec<PathStep>,
}

impl FieldPath {
    pub fn parameter(name: &str) -> Self {
        Self {
            root: PathRoot::Parameter(name.to_string()),
            steps: vec![],
        }
    }

    pub fn returns() -> Self {
        Self {
            root: PathRoot::Return,
            steps: vec![],
        }
    }

    pub fn field(&self, name: &str) -> Self {
        self.with_step(PathStep::Field(name.to_string()))
    }

    pub fn element(&self) -> Self {
        self.with_step(PathStep::Element)
    }

    fn with_step(&self, step: PathStep) -> Self {
        let mut steps = self.steps.clone();
        steps.push(step);
        Self {
            root: self.root.clone(),
            steps,
        }
    }

    /// The root prefix composite type names under this path are derived from.
    pub fn root_prefix(&self, function: &str) -> String {
        match &self.root {
            PathRoot::Parameter(name) => format!("{function}__{name}Data"),
            PathRoot::Return => format!("{function}__returnType"),
        }
    }
}

impl Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.root {
            PathRoot::Parameter(name) => write!(f, "{name}")?,
            PathRoot::Return => write!(f, "return")?,
        }
        for step in &self.steps {
            match step {
                PathStep::Field(name) => write!(f, ".{name}")?,
                PathStep::Element => write!(f, "[]")?,
            }
        }
        Ok(())
    }
}

/// Hands out composite type names that are unique for the lifetime of one registry.
///
/// Names are derived from a caller-supplied base; when the base is already taken by another
/// `(function, path)` the allocator appends `_2`, `_3`, ... until it finds a free name. Asking
/// again for the same `(function, path)` returns the name allocated the first time.
#[derive(Debug, Default)]
pub struct NameAllocator {
    allocated: HashMap<(String, FieldPath), String>,
    taken: HashSet<String>,
}

impl NameAllocator {
    pub fn allocate(&mut self, function: &str, path: &FieldPath, base: &str) -> String {
        let key = (function.to_string(), path.clone());
        if let Some(name) = self.allocated.get(&key) {
            return name.clone();
        }

        let mut candidate = base.to_string();
        let mut suffix = 2;
        while self.taken.contains(&candidate) {
            candidate = format!("{base}_{suffix}");
            suffix += 1;
        }

        self.taken.insert(candidate.clone());
        self.allocated.insert(key, candidate.clone());
        candidate
    }

    pub fn len(&self) -> usize {
        self.taken.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taken.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use multiplatform_test::multiplatform_test;

    #[multiplatform_test]
    fn path_display() {
        let path = FieldPath::parameter("criteria")
            .field("users")
            .element()
            .field("email");
        assert_eq!(path.to_string(), "criteria.users[].email");
        assert_eq!(FieldPath::returns().element().to_string(), "return[]");
    }

    #[multiplatform_test]
    fn root_prefixes() {
        assert_eq!(
            FieldPath::parameter("criteria").root_prefix("get_users"),
            "get_users__criteriaData"
        );
        assert_eq!(
            FieldPath::returns().field("x").root_prefix("get_users"),
            "get_users__returnType"
        );
    }

    #[multiplatform_test]
    fn stable_and_unique() {
        let mut names = NameAllocator::default();
        let path = FieldPath::parameter("p").field("items");

        let first = names.allocate("f", &path, "f__pData_items");
        assert_eq!(first, "f__pData_items");
        assert_eq!(names.allocate("f", &path, "ignored"), first);

        // Same base, different path
        let other = FieldPath::parameter("p").field("other");
        assert_eq!(
            names.allocate("f", &other, "f__pData_items"),
            "f__pData_items_2"
        );
        assert_eq!(
            names.allocate("g", &path, "f__pData_items"),
            "f__pData_items_3"
        );
        assert_eq!(names.len(), 3);
    }
}
