//! Connectivity view over a corpus and its links.
//!
//! [LinkGraph] keeps the corpus order of node ids so every derived listing (orphans, clusters,
//! degree tables) is deterministic. Links whose endpoints are not both known, and self links,
//! never contribute to connectivity.

use petgraph::{
    graphmap::UnGraphMap,
    visit::{depth_first_search, DfsEvent},
};
use std::collections::{BTreeMap, BTreeSet};

use crate::properties::GraphLink;

#[derive(Debug, Clone)]
pub struct LinkGraph<'a> {
    ids: Vec<&'a str>,
    undirected: UnGraphMap<&'a str, ()>,
    in_degree: BTreeMap<&'a str, usize>,
    out_degree: BTreeMap<&'a str, usize>,
    dangling: Vec<&'a GraphLink>,
}

impl<'a> LinkGraph<'a> {
    pub fn new(ids: impl IntoIterator<Item = &'a str>, links: &'a [GraphLink]) -> Self {
        let mut seen = BTreeSet::new();
        let ids: Vec<&'a str> = ids.into_iter().filter(|id| seen.insert(*id)).collect();

        let mut undirected = UnGraphMap::new();
        for id in ids.iter() {
            undirected.add_node(*id);
        }
        let mut in_degree = BTreeMap::new();
        let mut out_degree = BTreeMap::new();
        let mut dangling = Vec::new();
        for link in links {
            let source = link.source.as_str();
            let target = link.target.as_str();
            if !(seen.contains(source) && seen.contains(target)) {
                dangling.push(link);
                continue;
            }
            if source == target {
                continue;
            }
            *out_degree.entry(source).or_insert(0) += 1;
            *in_degree.entry(target).or_insert(0) += 1;
            undirected.add_edge(source, target, ());
        }

        LinkGraph {
            ids,
            undirected,
            in_degree,
            out_degree,
            dangling,
        }
    }

    pub fn node_count(&self) -> usize {
        self.ids.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|known| *known == id)
    }

    /// In-degree plus out-degree, counting parallel links separately.
    pub fn degree(&self, id: &str) -> usize {
        self.in_degree.get(id).copied().unwrap_or(0) + self.out_degree.get(id).copied().unwrap_or(0)
    }

    /// Links with an endpoint outside the node set.
    pub fn dangling(&self) -> &[&'a GraphLink] {
        &self.dangling
    }

    /// Nodes with no incoming or outgoing link, in corpus order.
    pub fn orphans(&self) -> Vec<&'a str> {
        self.ids
            .iter()
            .copied()
            .filter(|id| self.degree(id) == 0)
            .collect()
    }

    pub fn connected(&self) -> Vec<&'a str> {
        self.ids
            .iter()
            .copied()
            .filter(|id| self.degree(id) > 0)
            .collect()
    }

    /// Weakly connected components, each in discovery order, seeded in corpus order.
    pub fn clusters(&self) -> Vec<Vec<&'a str>> {
        let mut visited: BTreeSet<&'a str> = BTreeSet::new();
        let mut clusters = Vec::new();
        for id in self.ids.iter().copied() {
            if visited.contains(id) {
                continue;
            }
            let mut members = Vec::new();
            depth_first_search(&self.undirected, Some(id), |event| {
                if let DfsEvent::Discover(member, _) = event {
                    members.push(member);
                }
            });
            visited.extend(members.iter().copied());
            clusters.push(members);
        }
        clusters
    }

    /// Ids whose in+out degree exceeds `max`.
    pub fn over_connected(&self, max: usize) -> Vec<(&'a str, usize)> {
        self.ids
            .iter()
            .map(|id| (*id, self.degree(id)))
            .filter(|(_, degree)| *degree > max)
            .collect()
    }
}
