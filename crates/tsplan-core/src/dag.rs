//! The plan graph: an arena-indexed DAG of plan nodes.
//!
//! Nodes live in slots addressed by `NodeId`; each slot keeps its ordered
//! predecessor and successor lists, which together form the edge list. A
//! removed node's slot is emptied, so a stale `NodeId` resolves to nothing
//! rather than to some other node.
//!
//! Mutation goes through three primitives only:
//! - `set_spec`: swap a node's spec in place (identity and edges unchanged).
//! - `replace`: collapse a connected set of nodes into one, rewiring external
//!   edges to it and dropping internal ones.
//! - `elide`: remove a node with a single predecessor, reconnecting that
//!   predecessor to the node's successors.
//!
//! None of them can introduce a cycle or reorder unrelated siblings.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::hash::{hash_serde, Hash256};
use crate::id::NodeId;
use crate::spec::OpSpec;

/// Whether a node is bound to a physical execution strategy yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Logical,
    Physical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanNode {
    pub id: String,
    pub kind: NodeKind,
    pub spec: OpSpec,
}

impl PlanNode {
    pub fn logical(id: impl Into<String>, spec: OpSpec) -> Self {
        Self {
            id: id.into(),
            kind: NodeKind::Logical,
            spec,
        }
    }

    pub fn physical(id: impl Into<String>, spec: OpSpec) -> Self {
        Self {
            id: id.into(),
            kind: NodeKind::Physical,
            spec,
        }
    }
}

#[derive(Debug, Clone)]
struct Slot {
    node: PlanNode,
    preds: Vec<NodeId>,
    succs: Vec<NodeId>,
}

#[derive(Debug, Clone, Default)]
pub struct PlanGraph {
    slots: Vec<Option<Slot>>,
    names: HashMap<String, NodeId>,
}

/// Canonical, name-based view of a plan used for hashing and comparison.
/// Nodes are sorted by name and edges by (parent, child).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSnapshot {
    pub nodes: Vec<PlanNode>,
    pub edges: Vec<(String, String)>,
}

impl PlanGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn add_node(&mut self, node: PlanNode) -> Result<NodeId> {
        if self.names.contains_key(&node.id) {
            return Err(Error::DuplicateNode(node.id));
        }
        let id = NodeId::new(
            u32::try_from(self.slots.len())
                .map_err(|_| Error::Invariant("plan graph slot space exhausted".into()))?,
        );
        self.names.insert(node.id.clone(), id);
        self.slots.push(Some(Slot {
            node,
            preds: Vec::new(),
            succs: Vec::new(),
        }));
        Ok(id)
    }

    /// Add `parent -> child`. Duplicate edges and cycles are rejected.
    pub fn add_edge(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.slot(parent)?;
        self.slot(child)?;
        if self.successors(parent).contains(&child) {
            return Err(Error::DuplicateEdge {
                parent: self.name(parent).to_string(),
                child: self.name(child).to_string(),
            });
        }
        if parent == child || self.reaches(child, parent) {
            return Err(Error::Cycle {
                parent: self.name(parent).to_string(),
                child: self.name(child).to_string(),
            });
        }
        self.slot_mut(parent)?.succs.push(child);
        self.slot_mut(child)?.preds.push(parent);
        Ok(())
    }

    /// `add_edge` by node name.
    pub fn connect(&mut self, parent: &str, child: &str) -> Result<()> {
        let p = self.require(parent)?;
        let c = self.require(child)?;
        self.add_edge(p, c)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.slots.get(id.index()).map_or(false, Option::is_some)
    }

    pub fn node(&self, id: NodeId) -> Option<&PlanNode> {
        self.slots.get(id.index())?.as_ref().map(|s| &s.node)
    }

    /// Look a node up by its name.
    pub fn lookup(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    pub fn require(&self, name: &str) -> Result<NodeId> {
        self.lookup(name)
            .ok_or_else(|| Error::UnknownNode(name.to_string()))
    }

    /// Name of a live node; empty for a dead slot.
    pub fn name(&self, id: NodeId) -> &str {
        self.node(id).map_or("", |n| n.id.as_str())
    }

    pub fn predecessors(&self, id: NodeId) -> &[NodeId] {
        self.slots
            .get(id.index())
            .and_then(Option::as_ref)
            .map(|s| s.preds.as_slice())
            .unwrap_or(&[])
    }

    pub fn successors(&self, id: NodeId) -> &[NodeId] {
        self.slots
            .get(id.index())
            .and_then(Option::as_ref)
            .map(|s| s.succs.as_slice())
            .unwrap_or(&[])
    }

    pub fn sole_predecessor(&self, id: NodeId) -> Option<NodeId> {
        match self.predecessors(id) {
            [p] => Some(*p),
            _ => None,
        }
    }

    pub fn sole_successor(&self, id: NodeId) -> Option<NodeId> {
        match self.successors(id) {
            [s] => Some(*s),
            _ => None,
        }
    }

    /// Live node ids in slot order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, s)| {
            s.as_ref().map(|_| NodeId::new(i as u32))
        })
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &PlanNode)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|s| (NodeId::new(i as u32), &s.node)))
    }

    /// All edges, grouped by parent in slot order, children in insertion order.
    pub fn edges(&self) -> Vec<(NodeId, NodeId)> {
        self.ids()
            .flat_map(|p| self.successors(p).iter().map(move |&c| (p, c)))
            .collect()
    }

    pub fn roots(&self) -> Vec<NodeId> {
        self.ids().filter(|&id| self.predecessors(id).is_empty()).collect()
    }

    pub fn sinks(&self) -> Vec<NodeId> {
        self.ids().filter(|&id| self.successors(id).is_empty()).collect()
    }

    /// True if a directed path leads from `from` to `to` (or they are equal).
    pub fn reaches(&self, from: NodeId, to: NodeId) -> bool {
        let mut stack = vec![from];
        let mut seen = HashSet::new();
        while let Some(cur) = stack.pop() {
            if cur == to {
                return true;
            }
            if seen.insert(cur) {
                stack.extend(self.successors(cur).iter().copied());
            }
        }
        false
    }

    /// Parents before children; ties broken by slot order so the result is
    /// deterministic.
    pub fn topological_order(&self) -> Vec<NodeId> {
        let mut in_degree: HashMap<NodeId, usize> = self
            .ids()
            .map(|id| (id, self.predecessors(id).len()))
            .collect();
        let mut ready: BinaryHeap<Reverse<NodeId>> = in_degree
            .iter()
            .filter(|(_, deg)| **deg == 0)
            .map(|(&id, _)| Reverse(id))
            .collect();

        let mut order = Vec::with_capacity(in_degree.len());
        while let Some(Reverse(id)) = ready.pop() {
            order.push(id);
            for &child in self.successors(id) {
                if let Some(deg) = in_degree.get_mut(&child) {
                    *deg -= 1;
                    if *deg == 0 {
                        ready.push(Reverse(child));
                    }
                }
            }
        }
        order
    }

    /// Swap a node's spec and kind in place.
    pub fn set_spec(&mut self, id: NodeId, spec: OpSpec, kind: NodeKind) -> Result<()> {
        let slot = self.slot_mut(id)?;
        slot.node.spec = spec;
        slot.node.kind = kind;
        Ok(())
    }

    /// Collapse `members` into `node`. The new node takes over the slot of
    /// `members[0]`; the other members are removed. Edges from outside into
    /// any member now point at the new node (and likewise for outgoing
    /// edges), keeping each neighbour's sibling order. Internal edges vanish.
    pub fn replace(&mut self, members: &[NodeId], node: PlanNode) -> Result<NodeId> {
        let keep = *members
            .first()
            .ok_or_else(|| Error::Invariant("replace called with no members".into()))?;
        for &m in members {
            self.slot(m)?;
        }
        let set: HashSet<NodeId> = members.iter().copied().collect();
        if set.len() != members.len() {
            return Err(Error::Invariant("replace called with repeated members".into()));
        }
        if let Some(existing) = self.lookup(&node.id) {
            if !set.contains(&existing) {
                return Err(Error::DuplicateNode(node.id));
            }
        }

        let mut ext_preds = Vec::new();
        let mut ext_succs = Vec::new();
        for &m in members {
            for &p in self.predecessors(m) {
                if !set.contains(&p) && !ext_preds.contains(&p) {
                    ext_preds.push(p);
                }
            }
            for &s in self.successors(m) {
                if !set.contains(&s) && !ext_succs.contains(&s) {
                    ext_succs.push(s);
                }
            }
        }

        // A path leaving the set and re-entering it would close a loop
        // through the merged node.
        for &s in &ext_succs {
            if members.iter().any(|&m| self.reaches(s, m)) {
                return Err(Error::Cycle {
                    parent: node.id.clone(),
                    child: self.name(s).to_string(),
                });
            }
        }

        for &p in &ext_preds {
            rewire(&mut self.slot_mut(p)?.succs, &set, keep);
        }
        for &s in &ext_succs {
            rewire(&mut self.slot_mut(s)?.preds, &set, keep);
        }

        for &m in members {
            if let Some(old) = self.slots[m.index()].as_ref() {
                self.names.remove(&old.node.id);
            }
            if m != keep {
                self.slots[m.index()] = None;
            }
        }

        self.names.insert(node.id.clone(), keep);
        self.slots[keep.index()] = Some(Slot {
            node,
            preds: ext_preds,
            succs: ext_succs,
        });
        Ok(keep)
    }

    /// Remove a node that has exactly one predecessor, connecting that
    /// predecessor directly to each of the node's successors at the position
    /// the node used to occupy.
    pub fn elide(&mut self, id: NodeId) -> Result<()> {
        let pred = self.sole_predecessor(id).ok_or_else(|| {
            Error::Invariant(format!(
                "cannot elide {}: it must have exactly one predecessor",
                self.name(id)
            ))
        })?;
        let succs = self.slot(id)?.succs.clone();

        {
            let pred_succs = &mut self.slot_mut(pred)?.succs;
            let pos = pred_succs
                .iter()
                .position(|&s| s == id)
                .ok_or_else(|| Error::Invariant("adjacency lists out of sync".into()))?;
            pred_succs.remove(pos);
            let mut at = pos;
            for &s in &succs {
                if !pred_succs.contains(&s) {
                    pred_succs.insert(at, s);
                    at += 1;
                }
            }
        }
        let gone: HashSet<NodeId> = [id].into_iter().collect();
        for &s in &succs {
            rewire(&mut self.slot_mut(s)?.preds, &gone, pred);
        }

        if let Some(slot) = self.slots[id.index()].take() {
            self.names.remove(&slot.node.id);
        }
        Ok(())
    }

    pub fn snapshot(&self) -> PlanSnapshot {
        let mut nodes: Vec<PlanNode> = self.nodes().map(|(_, n)| n.clone()).collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        let mut edges: Vec<(String, String)> = self
            .edges()
            .into_iter()
            .map(|(p, c)| (self.name(p).to_string(), self.name(c).to_string()))
            .collect();
        edges.sort();
        PlanSnapshot { nodes, edges }
    }

    /// Stable hash of the canonical snapshot.
    pub fn fingerprint(&self) -> Result<Hash256> {
        hash_serde(&self.snapshot())
    }

    /// One line per node in topological order:
    /// `name [kind] spec -> child, child`.
    pub fn explain(&self) -> String {
        let mut out = String::new();
        for id in self.topological_order() {
            let Some(node) = self.node(id) else { continue };
            let kind = match node.kind {
                NodeKind::Logical => "logical",
                NodeKind::Physical => "physical",
            };
            let _ = write!(out, "{} [{}] {}", node.id, kind, node.spec);
            let succs = self.successors(id);
            if !succs.is_empty() {
                let names: Vec<&str> = succs.iter().map(|&s| self.name(s)).collect();
                let _ = write!(out, " -> {}", names.join(", "));
            }
            out.push('\n');
        }
        out
    }

    fn slot(&self, id: NodeId) -> Result<&Slot> {
        self.slots
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or_else(|| Error::UnknownNode(id.to_string()))
    }

    fn slot_mut(&mut self, id: NodeId) -> Result<&mut Slot> {
        self.slots
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or_else(|| Error::UnknownNode(id.to_string()))
    }
}

/// Point the first occurrence of any `from` member at `to`, drop later
/// occurrences, and keep everything else in place.
fn rewire(list: &mut Vec<NodeId>, from: &HashSet<NodeId>, to: NodeId) {
    let mut placed = !from.contains(&to) && list.contains(&to);
    list.retain_mut(|id| {
        if !from.contains(id) {
            return true;
        }
        if placed {
            return false;
        }
        *id = to;
        placed = true;
        true
    });
}
