//! Dependency graph and bottom-up scheduling
//!
//! Edges come purely from path nesting: a repository depends on every
//! repository whose nearest containing repository it is. Children therefore
//! always precede their parents in the schedule.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::error::{GroveError, Result};
use crate::git::Repository;

/// Repository path -> paths that must be processed before it
pub type DependencyGraph = BTreeMap<PathBuf, BTreeSet<PathBuf>>;

/// Nearest proper ancestor of `path` that is in `known`
fn nearest_ancestor<'a>(path: &'a Path, known: &HashSet<&Path>) -> Option<&'a Path> {
    path.ancestors().skip(1).find(|p| known.contains(p))
}

/// Builds the graph for `repos`; every repository gets an entry
pub fn build_graph(repos: &[Repository]) -> DependencyGraph {
    let known: HashSet<&Path> = repos.iter().map(|r| r.path.as_path()).collect();
    let mut graph: DependencyGraph = repos
        .iter()
        .map(|r| (r.path.clone(), BTreeSet::new()))
        .collect();

    for repo in repos {
        if let Some(parent) = nearest_ancestor(&repo.path, &known) {
            if let Some(children) = graph.get_mut(parent) {
                children.insert(repo.path.clone());
            }
        }
    }

    graph
}

/// Sets each repository's `parent` to the index of its nearest container
pub fn set_parent_relationships(repos: &mut [Repository]) {
    let index: HashMap<PathBuf, usize> = repos
        .iter()
        .enumerate()
        .map(|(i, r)| (r.path.clone(), i))
        .collect();

    for repo in repos.iter_mut() {
        repo.parent = repo
            .path
            .ancestors()
            .skip(1)
            .find_map(|p| index.get(p).copied());
    }
}

/// Indices of the direct children of `repos[parent]`
pub fn children_of(repos: &[Repository], parent: usize) -> Vec<usize> {
    repos
        .iter()
        .enumerate()
        .filter(|(_, r)| r.parent == Some(parent))
        .map(|(i, _)| i)
        .collect()
}

/// Linearizes `graph` so every node follows all of its dependencies.
///
/// Kahn's algorithm with an ordered ready set, so the result depends only on
/// the graph's contents. A cycle is an internal error.
pub fn order_graph(graph: &DependencyGraph) -> Result<Vec<PathBuf>> {
    let mut pending: BTreeMap<&Path, usize> = graph
        .iter()
        .map(|(node, deps)| (node.as_path(), deps.iter().filter(|d| graph.contains_key(*d)).count()))
        .collect();

    let mut dependents: BTreeMap<&Path, Vec<&Path>> = BTreeMap::new();
    for (node, deps) in graph {
        for dep in deps.iter().filter(|d| graph.contains_key(*d)) {
            dependents.entry(dep.as_path()).or_default().push(node.as_path());
        }
    }

    let mut ready: BTreeSet<&Path> = pending
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(node, _)| *node)
        .collect();
    let mut order = Vec::with_capacity(graph.len());

    while let Some(node) = ready.pop_first() {
        order.push(node.to_path_buf());
        for dependent in dependents.get(node).into_iter().flatten() {
            if let Some(count) = pending.get_mut(dependent) {
                *count -= 1;
                if *count == 0 {
                    ready.insert(*dependent);
                }
            }
        }
    }

    if order.len() != graph.len() {
        let stuck = pending
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .map(|(node, _)| node.to_path_buf())
            .collect();
        return Err(GroveError::DependencyCycle(stuck));
    }

    Ok(order)
}

/// Orders repositories children-first
pub fn topological_sort(repos: Vec<Repository>) -> Result<Vec<Repository>> {
    let graph = build_graph(&repos);
    let order = order_graph(&graph)?;

    let mut by_path: HashMap<PathBuf, Repository> =
        repos.into_iter().map(|r| (r.path.clone(), r)).collect();
    let mut sorted: Vec<Repository> = order
        .into_iter()
        .filter_map(|path| by_path.remove(&path))
        .collect();

    // Parent indices refer to the old positions
    set_parent_relationships(&mut sorted);
    Ok(sorted)
}
