//! Synthetic Active Directory graph
//!
//! Builds a random edge list (users, computers, groups) and reduces it to
//! per-node degree counts. A node is `high_risk` when it holds admin
//! rights directly or through a group it belongs to.

use std::collections::{BTreeMap, BTreeSet};

use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::Rng;

use crate::logic::features::RawRecord;
use super::sampling::chance;
use super::DatasetGenerator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EdgeType {
    MemberOf,
    Admin,
    Session,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub src: String,
    pub dst: String,
    pub edge_type: EdgeType,
}

#[derive(Debug, Default, Clone)]
struct NodeStats {
    node_type: &'static str,
    in_degree: i64,
    out_degree: i64,
    admin: i64,
    member_of: i64,
    session: i64,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct GraphGenerator;

impl GraphGenerator {
    /// Random AD edge list with roughly `n` nodes.
    /// Returns (nodes with their type, edges).
    pub fn generate_edges(n: usize, rng: &mut StdRng) -> (Vec<(String, &'static str)>, Vec<Edge>) {
        let n_groups = (n / 10).max(1);
        let n_computers = (n / 5).max(1);
        let n_users = n.saturating_sub(n_groups + n_computers).max(1);

        let users: Vec<String> = (0..n_users).map(|i| format!("user:u{:04}", i)).collect();
        let computers: Vec<String> = (0..n_computers).map(|i| format!("computer:c{:04}", i)).collect();
        let groups: Vec<String> = (0..n_groups).map(|i| format!("group:g{:03}", i)).collect();

        let mut edges = Vec::new();
        let mut edge = |src: &str, dst: &str, edge_type| {
            edges.push(Edge { src: src.to_string(), dst: dst.to_string(), edge_type });
        };

        for user in &users {
            let k = rng.gen_range(1..=3usize).min(groups.len());
            for g in sample(rng, groups.len(), k).into_iter() {
                edge(user, &groups[g], EdgeType::MemberOf);
            }
            if chance(rng, 0.08) {
                let k = rng.gen_range(1..=3usize).min(computers.len());
                for c in sample(rng, computers.len(), k).into_iter() {
                    edge(user, &computers[c], EdgeType::Admin);
                }
            }
        }

        for group in &groups {
            if chance(rng, 0.2) {
                let k = rng.gen_range(1..=4usize).min(computers.len());
                for c in sample(rng, computers.len(), k).into_iter() {
                    edge(group, &computers[c], EdgeType::Admin);
                }
            }
        }

        for computer in &computers {
            let k = rng.gen_range(0..=2usize).min(users.len());
            for u in sample(rng, users.len(), k).into_iter() {
                edge(computer, &users[u], EdgeType::Session);
            }
        }

        let nodes = users
            .into_iter()
            .map(|u| (u, "user"))
            .chain(computers.into_iter().map(|c| (c, "computer")))
            .chain(groups.into_iter().map(|g| (g, "group")))
            .collect();

        (nodes, edges)
    }

    /// Per-node degree features plus the risk label
    pub fn node_features(nodes: &[(String, &'static str)], edges: &[Edge]) -> Vec<RawRecord> {
        let mut stats: BTreeMap<&str, NodeStats> = nodes
            .iter()
            .map(|(name, node_type)| (name.as_str(), NodeStats { node_type, ..NodeStats::default() }))
            .collect();

        let admin_groups: BTreeSet<&str> = edges
            .iter()
            .filter(|e| e.edge_type == EdgeType::Admin && e.src.starts_with("group:"))
            .map(|e| e.src.as_str())
            .collect();
        let mut inherited_admin: BTreeSet<&str> = BTreeSet::new();

        for e in edges {
            if let Some(src) = stats.get_mut(e.src.as_str()) {
                src.out_degree += 1;
                match e.edge_type {
                    EdgeType::Admin => src.admin += 1,
                    EdgeType::MemberOf => src.member_of += 1,
                    EdgeType::Session => src.session += 1,
                }
            }
            if let Some(dst) = stats.get_mut(e.dst.as_str()) {
                dst.in_degree += 1;
            }
            if e.edge_type == EdgeType::MemberOf && admin_groups.contains(e.dst.as_str()) {
                inherited_admin.insert(e.src.as_str());
            }
        }

        stats
            .into_iter()
            .map(|(node, s)| {
                let risky = s.admin > 0 || inherited_admin.contains(node);
                RawRecord::new()
                    .with("node", node)
                    .with("node_type", s.node_type)
                    .with("degree", s.in_degree + s.out_degree)
                    .with("in_degree", s.in_degree)
                    .with("out_degree", s.out_degree)
                    .with("num_admin_edges", s.admin)
                    .with("num_group_edges", s.member_of)
                    .with("num_session_edges", s.session)
                    .with("label", if risky { "high_risk" } else { "low_risk" })
            })
            .collect()
    }
}

impl DatasetGenerator for GraphGenerator {
    fn name(&self) -> &'static str {
        "graph"
    }

    fn generate(&self, n: usize, rng: &mut StdRng) -> Vec<RawRecord> {
        let (nodes, edges) = Self::generate_edges(n, rng);
        Self::node_features(&nodes, &edges)
    }
}
