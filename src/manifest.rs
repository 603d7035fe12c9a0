// src/manifest.rs

//! Explicit ordering manifests for bundled scripts and rendered templates.
//!
//! Order is declared, not inferred from file names alone:
//! - every file declared in `after` comes after the files it lists,
//! - the entry file comes after every other file,
//! - everything else falls back to path order, so numbered prefixes
//!   (`01.jquery.js`, `02.plugins.js`) still sort as expected.

use std::collections::{BTreeMap, BTreeSet};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;
use tracing::debug;

use crate::errors::{AssetflowError, Result};

/// Ordering rules for one category. Names are paths relative to the
/// category's source base, with forward slashes.
#[derive(Debug, Clone)]
pub struct OrderManifest<'a> {
    entry: &'a str,
    after: &'a BTreeMap<String, Vec<String>>,
}

impl<'a> OrderManifest<'a> {
    pub fn new(entry: &'a str, after: &'a BTreeMap<String, Vec<String>>) -> Self {
        Self { entry, after }
    }

    pub fn entry(&self) -> &str {
        self.entry
    }

    /// Check the declared rules on their own, independent of which files
    /// exist. Used at config load time.
    pub fn check_acyclic(&self) -> Result<()> {
        let mut names: BTreeSet<&str> = BTreeSet::new();
        names.insert(self.entry);
        for (file, deps) in self.after.iter() {
            names.insert(file.as_str());
            names.extend(deps.iter().map(|d| d.as_str()));
        }

        let graph = self.build_graph(&names);

        match toposort(&graph, None) {
            Ok(_) => Ok(()),
            Err(cycle) => Err(AssetflowError::ManifestCycle(format!(
                "ordering cycle involving '{}'",
                cycle.node_id()
            ))),
        }
    }

    /// Order the given files. Declared dependencies on files that are not
    /// present are ignored (a file may be deleted while watching).
    pub fn order(&self, files: &[String]) -> Result<Vec<String>> {
        let names: BTreeSet<&str> = files.iter().map(|f| f.as_str()).collect();
        let graph = self.build_graph(&names);

        // Kahn's algorithm with a sorted ready set keeps the result stable.
        let mut indegree: BTreeMap<&str, usize> = names
            .iter()
            .map(|n| (*n, graph.neighbors_directed(*n, Direction::Incoming).count()))
            .collect();

        let mut ready: BTreeSet<&str> = indegree
            .iter()
            .filter(|(_, d)| **d == 0)
            .map(|(n, _)| *n)
            .collect();

        let mut ordered = Vec::with_capacity(names.len());
        while let Some(next) = ready.pop_first() {
            ordered.push(next.to_string());
            for succ in graph.neighbors_directed(next, Direction::Outgoing) {
                if let Some(d) = indegree.get_mut(succ) {
                    *d -= 1;
                    if *d == 0 {
                        ready.insert(succ);
                    }
                }
            }
        }

        if ordered.len() != names.len() {
            let stuck = indegree
                .iter()
                .find(|(_, d)| **d > 0)
                .map(|(n, _)| n.to_string())
                .unwrap_or_default();
            return Err(AssetflowError::ManifestCycle(format!(
                "ordering cycle involving '{stuck}'"
            )));
        }

        debug!(entry = %self.entry, ?ordered, "resolved manifest order");
        Ok(ordered)
    }

    /// Edge direction: predecessor -> successor.
    fn build_graph<'n>(&self, names: &BTreeSet<&'n str>) -> DiGraphMap<&'n str, ()> {
        let mut graph: DiGraphMap<&'n str, ()> = DiGraphMap::new();
        for name in names.iter() {
            graph.add_node(*name);
        }

        for (file, deps) in self.after.iter() {
            let Some(&file) = names.get(file.as_str()) else {
                continue;
            };
            for dep in deps {
                match names.get(dep.as_str()) {
                    Some(&dep) => {
                        graph.add_edge(dep, file, ());
                    }
                    None => debug!(file = %file, dep = %dep, "declared dependency not present"),
                }
            }
        }

        if let Some(&entry) = names.get(self.entry) {
            for name in names.iter().filter(|n| **n != entry) {
                graph.add_edge(*name, entry, ());
            }
        }

        graph
    }
}
