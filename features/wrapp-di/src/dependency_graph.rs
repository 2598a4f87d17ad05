use std::{
    any::TypeId,
    borrow::Cow,
    collections::{HashMap, HashSet},
};

use thiserror::Error;

use crate::{
    builder::DiBuilder,
    component::ComponentDef,
    types::{ComponentKey, DependencyInfo, TypeInfo},
};

/// Graph of all registered components
/// Used to check missing and circular dependencies before a container is built
pub struct DependencyGraph {
    entries: Vec<DependencyGraphEntry>,
    by_name: HashMap<Cow<'static, str>, usize>,
    by_type: HashMap<TypeId, Vec<usize>>,
}
impl DependencyGraph {
    pub fn new(builder: &DiBuilder) -> Result<Self, DependencyGraphError> {
        let mut graph = Self {
            entries: Vec::new(),
            by_name: HashMap::new(),
            by_type: HashMap::new(),
        };

        for component in &builder.registered_components {
            graph.add(component)?;
        }

        Ok(graph)
    }

    pub(crate) fn add(&mut self, component: &ComponentDef) -> Result<(), DependencyGraphError> {
        let index = self.entries.len();
        if let Some(name) = &component.name {
            if let Some(existing) = self.by_name.insert(name.clone(), index) {
                return Err(DependencyGraphError::Duplicate {
                    name: name.to_string(),
                    first: self.entries[existing].info,
                    second: component.info,
                });
            }
        }

        let provides = component.exposed_types();
        for info in &provides {
            self.by_type.entry(info.type_id).or_default().push(index);
        }

        self.entries.push(DependencyGraphEntry {
            info: component.info,
            dependencies: component.dependencies.clone(),
        });

        Ok(())
    }

    fn lookup(&self, key: &ComponentKey) -> &[usize] {
        match key {
            ComponentKey::Name(name) => self
                .by_name
                .get(name)
                .map(std::slice::from_ref)
                .unwrap_or_default(),
            ComponentKey::Type(info) => self
                .by_type
                .get(&info.type_id)
                .map(Vec::as_slice)
                .unwrap_or_default(),
        }
    }

    /// Validate the graph
    ///
    /// Returns a list of all issues
    pub fn check(&self) -> Result<(), DependencyGraphErrors> {
        let mut checked = HashSet::new();
        let mut errors = Vec::new();
        for index in 0..self.entries.len() {
            let mut dependency_chain = Vec::new();
            check_recurse(self, &mut checked, &mut errors, &mut dependency_chain, index);
        }

        if !errors.is_empty() {
            return Err(DependencyGraphErrors { errors });
        }

        return Ok(());

        fn check_recurse(
            graph: &DependencyGraph,
            checked: &mut HashSet<usize>,
            errors: &mut Vec<DependencyGraphError>,
            dependency_chain: &mut Vec<usize>,
            index: usize,
        ) {
            let entry = &graph.entries[index];

            // Circular Dependency Check
            if let Some(start) = dependency_chain.iter().position(|i| *i == index) {
                let mut chain: Vec<TypeInfo> = dependency_chain[start..]
                    .iter()
                    .map(|i| graph.entries[*i].info)
                    .collect();
                chain.push(entry.info); // Add current so chain is complete

                errors.push(DependencyGraphError::CircularDependency {
                    from: chain[0],
                    to: entry.info,
                    chain,
                });
                return;
            }

            // Skip other checks if already checked
            if !checked.insert(index) {
                return;
            };

            dependency_chain.push(index);

            for dependency in &entry.dependencies {
                let candidates = graph.lookup(&dependency.key);
                let next = match candidates {
                    [] => {
                        if !dependency.optional {
                            errors.push(DependencyGraphError::MissingDependency {
                                dependency: dependency.key.clone(),
                                required_by: entry.info,
                            });
                        }
                        continue;
                    }
                    [single] => *single,
                    many => {
                        errors.push(DependencyGraphError::AmbiguousDependency {
                            dependency: dependency.key.clone(),
                            required_by: entry.info,
                            count: many.len(),
                        });
                        continue;
                    }
                };

                if dependency.lazy {
                    // Don't recurse, this will be checked by itself
                    continue;
                }

                check_recurse(graph, checked, errors, dependency_chain, next);
            }

            dependency_chain.pop();
        }
    }
}

struct DependencyGraphEntry {
    info: TypeInfo,
    dependencies: Vec<DependencyInfo>,
}

#[derive(Error, Debug, Clone)]
pub enum DependencyGraphError {
    #[error("The name '{name}' has been registered twice: '{first}' and '{second}'")]
    Duplicate {
        name: String,
        first: TypeInfo,
        second: TypeInfo,
    },
    #[error("'{required_by}' needs {dependency} but it is missing")]
    MissingDependency {
        dependency: ComponentKey,
        required_by: TypeInfo,
    },
    #[error("'{required_by}' needs {dependency} but {count} components provide it")]
    AmbiguousDependency {
        dependency: ComponentKey,
        required_by: TypeInfo,
        count: usize,
    },
    #[error(
        "A Circular Dependency exists between '{from}' and '{to}' through {chain:?} - \
         Consider using `Lazy`"
    )]
    CircularDependency {
        from: TypeInfo,
        to: TypeInfo,
        chain: Vec<TypeInfo>,
    },
}
impl std::fmt::Display for DependencyGraphErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut display = Vec::new();
        display.push("The dependency graph had one or more errors:".to_string());
        for error in &self.errors {
            display.push(format!("- {}", error));
        }
        f.write_str(&display.join("\n"))
    }
}

#[derive(Error, Debug, Clone)]
pub struct DependencyGraphErrors {
    pub errors: Vec<DependencyGraphError>,
}
