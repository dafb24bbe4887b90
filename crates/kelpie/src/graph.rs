//! Compound graph container.
//!
//! The layout engine only needs a small capability set from its graph input:
//! enumerate vertices and directed edges, query neighbors, and query the
//! containment overlay (parent/children). Vertices are identified by strings.
//! Containment forms a forest on top of the graph: a vertex has at most one
//! parent and no containment cycles.

use crate::error::{Error, Result};
use indexmap::IndexSet;
use rustc_hash::FxHashMap;

pub type VertexId = String;

#[derive(Debug, Clone)]
pub struct Edge {
    pub id: String,
    pub source: VertexId,
    pub target: VertexId,
}

#[derive(Debug, Clone, Default)]
pub struct CompoundGraph {
    vertices: IndexSet<VertexId>,
    edges: Vec<Edge>,
    parents: FxHashMap<VertexId, VertexId>,
    children: FxHashMap<VertexId, Vec<VertexId>>,
}

impl CompoundGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_vertex(&mut self, id: impl Into<VertexId>) {
        self.vertices.insert(id.into());
    }

    /// Removes a vertex together with its incident edges; children are
    /// detached (they become roots), not removed.
    pub fn remove_vertex(&mut self, id: &str) -> bool {
        if !self.vertices.shift_remove(id) {
            return false;
        }
        self.edges.retain(|e| e.source != id && e.target != id);
        if let Some(parent) = self.parents.remove(id) {
            if let Some(siblings) = self.children.get_mut(&parent) {
                siblings.retain(|c| c != id);
            }
        }
        if let Some(orphans) = self.children.remove(id) {
            for c in orphans {
                self.parents.remove(&c);
            }
        }
        true
    }

    pub fn add_edge(
        &mut self,
        id: impl Into<String>,
        source: impl Into<VertexId>,
        target: impl Into<VertexId>,
    ) {
        self.edges.push(Edge {
            id: id.into(),
            source: source.into(),
            target: target.into(),
        });
    }

    pub fn remove_edge(&mut self, id: &str) -> bool {
        let before = self.edges.len();
        self.edges.retain(|e| e.id != id);
        self.edges.len() != before
    }

    /// Attaches `child` under `parent` in the containment forest. Both must
    /// already be vertices; a containment cycle is rejected.
    pub fn set_parent(&mut self, child: &str, parent: &str) -> Result<()> {
        if !self.vertices.contains(child) {
            return Err(Error::MissingVertex {
                vertex: child.to_string(),
            });
        }
        if !self.vertices.contains(parent) {
            return Err(Error::MissingVertex {
                vertex: parent.to_string(),
            });
        }
        // Walking up from the prospective parent must not reach the child.
        let mut cursor = Some(parent.to_string());
        while let Some(v) = cursor {
            if v == child {
                return Err(Error::CyclicContainment {
                    vertex: child.to_string(),
                });
            }
            cursor = self.parents.get(&v).cloned();
        }

        self.clear_parent(child);
        self.parents.insert(child.to_string(), parent.to_string());
        self.children
            .entry(parent.to_string())
            .or_default()
            .push(child.to_string());
        Ok(())
    }

    pub fn clear_parent(&mut self, child: &str) {
        if let Some(old) = self.parents.remove(child) {
            if let Some(siblings) = self.children.get_mut(&old) {
                siblings.retain(|c| c != child);
            }
        }
    }

    pub fn contains_vertex(&self, id: &str) -> bool {
        self.vertices.contains(id)
    }

    pub fn vertex_ids(&self) -> impl Iterator<Item = &VertexId> {
        self.vertices.iter()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn parent(&self, id: &str) -> Option<&VertexId> {
        self.parents.get(id)
    }

    pub fn children(&self, id: &str) -> &[VertexId] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_compound(&self, id: &str) -> bool {
        !self.children(id).is_empty()
    }

    /// Vertices with no containment parent, in insertion order.
    pub fn roots(&self) -> Vec<&VertexId> {
        self.vertices
            .iter()
            .filter(|v| !self.parents.contains_key(v.as_str()))
            .collect()
    }

    /// Distinct adjacent vertices (either edge direction), in edge order.
    pub fn neighbors(&self, id: &str) -> Vec<&VertexId> {
        let mut seen: IndexSet<&VertexId> = IndexSet::new();
        for e in &self.edges {
            if e.source == id && e.target != id {
                seen.insert(&e.target);
            } else if e.target == id && e.source != id {
                seen.insert(&e.source);
            }
        }
        seen.into_iter().collect()
    }

    /// Checks the structural invariants: every edge endpoint exists and the
    /// containment overlay is acyclic.
    pub fn validate(&self) -> Result<()> {
        for e in &self.edges {
            if !self.vertices.contains(&e.source) || !self.vertices.contains(&e.target) {
                return Err(Error::MissingEndpoint {
                    edge_id: e.id.clone(),
                });
            }
        }

        for v in &self.vertices {
            // The parent chain from any vertex must terminate within
            // vertex_count steps; a longer walk means a cycle.
            let mut cursor = self.parents.get(v);
            let mut steps = 0usize;
            while let Some(p) = cursor {
                steps += 1;
                if steps > self.vertices.len() {
                    return Err(Error::CyclicContainment { vertex: v.clone() });
                }
                cursor = self.parents.get(p);
            }
        }
        Ok(())
    }
}
