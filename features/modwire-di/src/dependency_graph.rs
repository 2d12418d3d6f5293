use std::{collections::HashMap, fmt};

use indexmap::IndexMap;
use thiserror::Error;

use crate::config::BuildConfig;

/// Graph of all configured modules
/// Used to find a build order and enables visualization of the configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    map: IndexMap<String, Vec<String>>,
}
impl DependencyGraph {
    /// Derives the graph from a configuration, in module insertion order
    ///
    /// Renamed dependencies contribute the name of the module they point to.
    pub fn from_config(config: &BuildConfig) -> Self {
        let map = config
            .modules()
            .map(|(name, module)| {
                let dependencies = module
                    .dependencies
                    .as_ref()
                    .map(|dependencies| dependencies.names())
                    .unwrap_or_default();
                (name.clone(), dependencies)
            })
            .collect();

        Self { map }
    }

    pub fn dependencies_of(&self, name: &str) -> Option<&[String]> {
        self.map.get(name).map(Vec::as_slice)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns an order in which every module comes after its dependencies
    pub fn sort(&self) -> Result<Vec<String>, GraphError> {
        topological_sort(&self.map)
    }

    /// Renders the graph in the Graphviz DOT language
    pub fn to_dot(&self) -> String {
        Dot(self).to_string()
    }
}
impl FromIterator<(String, Vec<String>)> for DependencyGraph {
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        Self {
            map: iter.into_iter().collect(),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

/// Depth first topological sort
///
/// Roots are visited in insertion order, so unrelated nodes keep their relative order.
/// Dependencies which are not a key of the graph are skipped, reporting them is up to the caller.
/// The walk keeps its own stack, so deep dependency chains do not exhaust the thread stack.
pub fn topological_sort(graph: &IndexMap<String, Vec<String>>) -> Result<Vec<String>, GraphError> {
    let mut marks: HashMap<&str, Mark> = HashMap::with_capacity(graph.len());
    let mut order = Vec::with_capacity(graph.len());
    // Nodes in progress, each with the index of the next dependency to visit
    let mut stack: Vec<(&str, usize)> = Vec::new();

    for root in graph.keys() {
        if marks.contains_key(root.as_str()) {
            continue;
        }
        marks.insert(root.as_str(), Mark::InProgress);
        stack.push((root.as_str(), 0));

        while let Some((node, next)) = stack.last_mut() {
            let node = *node;
            let dependencies = graph.get(node).map(Vec::as_slice).unwrap_or_default();

            let Some(dependency) = dependencies.get(*next) else {
                stack.pop();
                marks.insert(node, Mark::Done);
                order.push(node.to_string());
                continue;
            };
            *next += 1;

            if !graph.contains_key(dependency) {
                continue;
            }
            match marks.get(dependency.as_str()).copied() {
                Some(Mark::Done) => {}
                Some(Mark::InProgress) => return Err(cycle(&stack, dependency)),
                None => {
                    marks.insert(dependency.as_str(), Mark::InProgress);
                    stack.push((dependency.as_str(), 0));
                }
            }
        }
    }

    Ok(order)
}

/// Builds the cycle error for re-entering `node`, which is still on the stack
fn cycle(stack: &[(&str, usize)], node: &str) -> GraphError {
    let start = stack.iter().position(|(n, _)| *n == node).unwrap_or(0);
    let mut chain: Vec<String> = stack[start..].iter().map(|(n, _)| n.to_string()).collect();
    chain.push(node.to_string()); // Close the loop so the chain is complete

    GraphError::CyclicalDependency {
        node: node.to_string(),
        chain,
    }
}

struct Dot<'a>(&'a DependencyGraph);
impl fmt::Display for Dot<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "digraph {{")?;
        for node in self.0.nodes() {
            writeln!(f, "  \"{}\";", escape(node))?;
        }
        for (node, dependencies) in &self.0.map {
            for dependency in dependencies {
                writeln!(f, "  \"{}\" -> \"{}\";", escape(node), escape(dependency))?;
            }
        }
        write!(f, "}}")
    }
}

fn escape(id: &str) -> String {
    id.replace('\\', "\\\\").replace('"', "\\\"")
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("cyclical dependency detected at module: {node} (through {})", .chain.join(" -> "))]
    CyclicalDependency { node: String, chain: Vec<String> },
}
