//! A memoizing, cycle-aware walker over caller-supplied directed graphs.
//!
//! The walk is an iterative variant of Tarjan's strongly-connected-components
//! algorithm driven by a double-ended queue. Every node of a strongly-connected
//! component ends up sharing one cached value set, so later searches that reach
//! any member reuse it without expanding the graph again.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::mem;

use indexmap::IndexSet;

/// A graph whose nodes produce values and successors on demand.
pub trait DirectedGraph<N, T> {
    type Error;

    /// Add the values of `node` to `values` and its successors to `successors`.
    fn node_values(
        &mut self,
        node: &N,
        values: &mut IndexSet<T>,
        successors: &mut Vec<N>,
    ) -> Result<(), Self::Error>;

    /// Add values carried by the edge `from -> to`.
    fn edge_values(&mut self, _from: &N, _to: &N, _values: &mut IndexSet<T>) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl<N, T, E, F> DirectedGraph<N, T> for F
where
    F: FnMut(&N, &mut IndexSet<T>, &mut Vec<N>) -> Result<(), E>,
{
    type Error = E;

    fn node_values(
        &mut self,
        node: &N,
        values: &mut IndexSet<T>,
        successors: &mut Vec<N>,
    ) -> Result<(), E> {
        self(node, values, successors)
    }
}

/// Walks a [`DirectedGraph`] and collects the values reachable from a set of
/// start nodes.
pub struct CachingDirectedGraphWalker<N, T, G> {
    graph: G,
    start_nodes: Vec<N>,
    cached_sets: Vec<IndexSet<T>>,
    cached_index: HashMap<N, usize>,
    strong_components: Vec<IndexSet<N>>,
}

struct NodeDetails<N, T> {
    node: N,
    min_seen: usize,
    values: IndexSet<T>,
    successors: Vec<N>,
    members: Vec<usize>,
    strongly_connected: bool,
    completed: bool,
    merged_into: Option<usize>,
    cached: Option<usize>,
}

impl<N, T> NodeDetails<N, T> {
    fn new(node: N, component: usize) -> Self {
        Self {
            node,
            min_seen: component,
            values: IndexSet::new(),
            successors: Vec::new(),
            members: vec![component],
            strongly_connected: false,
            completed: false,
            merged_into: None,
            cached: None,
        }
    }
}

/// Per-search bookkeeping, indexed by component id (discovery order).
struct Search<N, T> {
    seen: HashMap<N, usize>,
    details: Vec<NodeDetails<N, T>>,
}

impl<N, T> Search<N, T> {
    fn representative(&self, mut component: usize) -> usize {
        while let Some(next) = self.details[component].merged_into {
            component = next;
        }
        component
    }
}

impl<N, T, G> CachingDirectedGraphWalker<N, T, G>
where
    N: Clone + Eq + Hash,
    T: Clone + Eq + Hash,
    G: DirectedGraph<N, T>,
{
    pub fn new(graph: G) -> Self {
        Self {
            graph,
            start_nodes: Vec::new(),
            cached_sets: Vec::new(),
            cached_index: HashMap::new(),
            strong_components: Vec::new(),
        }
    }

    /// Queue start nodes for the next search.
    pub fn add(&mut self, nodes: impl IntoIterator<Item = N>) -> &mut Self {
        self.start_nodes.extend(nodes);
        self
    }

    /// The values reachable from the queued start nodes, which are consumed.
    pub fn find_values(&mut self) -> Result<IndexSet<T>, G::Error> {
        let start = mem::take(&mut self.start_nodes);
        self.strong_components.clear();

        let mut search = Search {
            seen: HashMap::new(),
            details: Vec::new(),
        };
        let mut queue: VecDeque<N> = start.iter().cloned().collect();

        while let Some(node) = queue.front().cloned() {
            match search.seen.get(&node).copied() {
                None => self.visit(&mut search, &mut queue, node)?,
                Some(component) => {
                    queue.pop_front();
                    if !search.details[component].completed {
                        self.complete(&mut search, component)?;
                    }
                }
            }
        }

        let mut values = IndexSet::new();
        for node in &start {
            if let Some(values_of_node) = self.cached_values(node) {
                values.extend(values_of_node.iter().cloned());
            }
        }
        Ok(values)
    }

    /// Strongly-connected components (including self-loops) found by the last search.
    ///
    /// Runs a search first if start nodes are queued.
    pub fn find_cycles(&mut self) -> Result<Vec<IndexSet<N>>, G::Error> {
        if !self.start_nodes.is_empty() {
            self.find_values()?;
        }
        Ok(self.strong_components.clone())
    }

    /// The cached value set of a node completed by an earlier search.
    pub fn cached_values(&self, node: &N) -> Option<&IndexSet<T>> {
        self.cached_index.get(node).map(|&slot| &self.cached_sets[slot])
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut G {
        &mut self.graph
    }

    pub fn into_graph(self) -> G {
        self.graph
    }

    // First visit: the node stays at the front of the queue until its
    // successors have been dealt with.
    fn visit(
        &mut self,
        search: &mut Search<N, T>,
        queue: &mut VecDeque<N>,
        node: N,
    ) -> Result<(), G::Error> {
        let component = search.details.len();
        search.seen.insert(node.clone(), component);
        let mut details = NodeDetails::new(node, component);

        if let Some(&slot) = self.cached_index.get(&details.node) {
            details.cached = Some(slot);
            details.completed = true;
            search.details.push(details);
            queue.pop_front();
            return Ok(());
        }

        self.graph
            .node_values(&details.node, &mut details.values, &mut details.successors)?;

        for successor in details.successors.iter().rev() {
            match search.seen.get(successor) {
                None => queue.push_front(successor.clone()),
                Some(&other) => {
                    if other == component || search.details[other].cached.is_none() {
                        details.strongly_connected = true;
                    }
                }
            }
        }
        search.details.push(details);
        Ok(())
    }

    fn complete(&mut self, search: &mut Search<N, T>, component: usize) -> Result<(), G::Error> {
        let successors = mem::take(&mut search.details[component].successors);
        let mut values = mem::take(&mut search.details[component].values);
        let mut min_seen = search.details[component].min_seen;
        let mut connected = search.details[component].strongly_connected;

        for successor in &successors {
            let Some(&other) = search.seen.get(successor) else {
                continue;
            };
            match search.details[other].cached {
                Some(slot) => values.extend(self.cached_sets[slot].iter().cloned()),
                None => {
                    min_seen = min_seen.min(search.representative(search.details[other].min_seen));
                    connected = true;
                }
            }
            self.graph
                .edge_values(&search.details[component].node, successor, &mut values)?;
        }

        let details = &mut search.details[component];
        details.successors = successors;
        details.min_seen = min_seen;
        details.completed = true;

        if min_seen != component {
            let root = search.representative(min_seen);
            let members = mem::take(&mut search.details[component].members);
            search.details[component].merged_into = Some(root);
            let target = &mut search.details[root];
            target.values.extend(values);
            target.members.extend(members);
            target.strongly_connected |= connected;
            return Ok(());
        }

        let slot = self.cached_sets.len();
        self.cached_sets.push(values);
        let members = mem::take(&mut search.details[component].members);
        let mut cycle = IndexSet::with_capacity(members.len());
        for member in members {
            let details = &mut search.details[member];
            details.cached = Some(slot);
            self.cached_index.insert(details.node.clone(), slot);
            cycle.insert(details.node.clone());
        }
        if connected {
            self.strong_components.push(cycle);
        }
        Ok(())
    }
}
