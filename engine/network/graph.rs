use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::arc::{Arc, ArcHandle};
use crate::node::{Node, NodeHandle};

/**
 * Directed multigraph with dense ids. Node and arc handles are indices into the owning
 * vectors; removals swap the last element into the freed slot, so handles held across a
 * removal may be invalidated.
 */
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiGraph<N, A> {
    nodes: Vec<Node<N>>,
    arcs: Vec<Arc<A>>,
}

impl<N, A> Default for DiGraph<N, A> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            arcs: Vec::new(),
        }
    }
}

impl<N, A> DiGraph<N, A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn arc_count(&self) -> usize {
        self.arcs.len()
    }

    pub fn node(&self, id: NodeHandle) -> &Node<N> {
        self.nodes.get(id.0).expect("invalid node handle")
    }

    pub fn node_mut(&mut self, id: NodeHandle) -> &mut Node<N> {
        self.nodes.get_mut(id.0).expect("invalid node handle")
    }

    pub fn arc(&self, id: ArcHandle) -> &Arc<A> {
        self.arcs.get(id.0).expect("invalid arc handle")
    }

    pub fn arc_mut(&mut self, id: ArcHandle) -> &mut Arc<A> {
        self.arcs.get_mut(id.0).expect("invalid arc handle")
    }

    pub fn contains_node(&self, id: NodeHandle) -> bool {
        id.0 < self.nodes.len()
    }

    pub fn nodes(&self) -> &[Node<N>] {
        &self.nodes
    }

    pub fn arcs(&self) -> &[Arc<A>] {
        &self.arcs
    }

    pub fn node_handles(&self) -> impl Iterator<Item = NodeHandle> {
        (0..self.nodes.len()).map(NodeHandle)
    }

    pub fn arc_handles(&self) -> impl Iterator<Item = ArcHandle> {
        (0..self.arcs.len()).map(ArcHandle)
    }

    pub fn add_node(&mut self, data: N) -> NodeHandle {
        let id = NodeHandle(self.nodes.len());
        self.nodes.push(Node::new(id, data));
        id
    }

    pub fn add_arc(&mut self, source: NodeHandle, target: NodeHandle, data: A) -> ArcHandle {
        let id = ArcHandle(self.arcs.len());
        self.arcs.push(Arc::new(id, data, source, target));
        self.node_mut(source).add_outgoing(id);
        self.node_mut(target).add_incoming(id);
        id
    }

    pub fn outgoing<'a>(&'a self, node: NodeHandle) -> impl Iterator<Item = &'a Arc<A>> + 'a {
        self.node(node)
            .outgoing_arcs()
            .iter()
            .map(move |arc| self.arc(*arc))
    }

    pub fn incoming<'a>(&'a self, node: NodeHandle) -> impl Iterator<Item = &'a Arc<A>> + 'a {
        self.node(node)
            .incoming_arcs()
            .iter()
            .map(move |arc| self.arc(*arc))
    }

    /** Nodes adjacent to `node` in either direction, possibly with repeats. */
    pub fn neighbors<'a>(&'a self, node: NodeHandle) -> impl Iterator<Item = NodeHandle> + 'a {
        self.outgoing(node)
            .map(|arc| arc.target)
            .chain(self.incoming(node).map(|arc| arc.source))
    }

    pub fn find_arc(&self, source: NodeHandle, target: NodeHandle) -> Option<ArcHandle> {
        self.outgoing(source)
            .find(|arc| arc.target == target)
            .map(|arc| arc.id)
    }

    /** The reverse arc of `id`, found by searching the adjacency of its target. */
    pub fn twin(&self, id: ArcHandle) -> Option<ArcHandle> {
        let arc = self.arc(id);
        self.find_arc(arc.target, arc.source)
    }

    /**
     * Removes an arc by swapping the last arc into its slot. The arc that previously had the
     * highest id is renamed to `id`.
     */
    pub fn remove_arc(&mut self, id: ArcHandle) -> Arc<A> {
        let (source, target) = {
            let arc = self.arc(id);
            (arc.source, arc.target)
        };
        self.node_mut(source).remove_outgoing(id);
        self.node_mut(target).remove_incoming(id);

        let last = ArcHandle(self.arcs.len() - 1);
        let removed = self.arcs.swap_remove(id.0);
        if id != last {
            let (moved_source, moved_target) = {
                let moved = &mut self.arcs[id.0];
                moved.id = id;
                (moved.source, moved.target)
            };
            self.node_mut(moved_source).rename_arc(last, id);
            if moved_target != moved_source {
                self.node_mut(moved_target).rename_arc(last, id);
            }
        }
        removed
    }

    /**
     * Removes a node together with its arcs. The node with the highest id is renamed to `id`;
     * the returned handle is its old id, if any node was moved.
     */
    pub fn remove_node(&mut self, id: NodeHandle) -> (N, Option<NodeHandle>) {
        while let Some(arc) = self
            .node(id)
            .outgoing_arcs()
            .first()
            .or_else(|| self.node(id).incoming_arcs().first())
            .copied()
        {
            self.remove_arc(arc);
        }

        let last = NodeHandle(self.nodes.len() - 1);
        let removed = self.nodes.swap_remove(id.0);
        if id == last {
            return (removed.data, None);
        }

        self.nodes[id.0].id = id;
        let touched: Vec<ArcHandle> = self.nodes[id.0]
            .incoming_arcs()
            .iter()
            .chain(self.nodes[id.0].outgoing_arcs().iter())
            .copied()
            .collect();
        for arc in touched {
            let arc = &mut self.arcs[arc.0];
            if arc.source == last {
                arc.source = id;
            }
            if arc.target == last {
                arc.target = id;
            }
        }
        (removed.data, Some(last))
    }

    /**
     * Drops every arc for which `keep` returns false in one pass, then compacts the ids.
     */
    pub fn retain_arcs<F>(&mut self, mut keep: F)
    where
        F: FnMut(&Arc<A>) -> bool,
    {
        self.arcs.retain(|arc| keep(arc));
        self.update_ids();
    }

    /**
     * Re-establishes dense arc ids `[0, m)` and rebuilds every adjacency list from the arc
     * endpoints. Adjacency order follows arc ids afterwards.
     */
    pub fn update_ids(&mut self) {
        for node in self.nodes.iter_mut() {
            node.clear_arcs();
        }
        for index in 0..self.arcs.len() {
            let id = ArcHandle(index);
            let (source, target) = {
                let arc = &mut self.arcs[index];
                arc.id = id;
                (arc.source, arc.target)
            };
            self.nodes[source.0].add_outgoing(id);
            self.nodes[target.0].add_incoming(id);
        }
    }

    /**
     * Sorts every node's outgoing list. The comparator gets the node list so it can look at
     * positions.
     */
    pub fn sort_outgoing_by<F>(&mut self, mut compare: F)
    where
        F: FnMut(&[Node<N>], &Arc<A>, &Arc<A>) -> Ordering,
    {
        for index in 0..self.nodes.len() {
            let mut outgoing = std::mem::take(self.nodes[index].outgoing_mut());
            outgoing.sort_by(|a, b| compare(&self.nodes, &self.arcs[a.0], &self.arcs[b.0]));
            *self.nodes[index].outgoing_mut() = outgoing;
        }
    }

    pub fn map<N2, A2, FN, FA>(&self, mut node_f: FN, mut arc_f: FA) -> DiGraph<N2, A2>
    where
        FN: FnMut(&Node<N>) -> N2,
        FA: FnMut(&Arc<A>) -> A2,
    {
        let mut graph = DiGraph::new();
        for node in &self.nodes {
            graph.add_node(node_f(node));
        }
        for arc in &self.arcs {
            graph.add_arc(arc.source, arc.target, arc_f(arc));
        }
        graph
    }

    /**
     * Validates the graph.
     *
     * Specifically, makes sure that:
     *  - node and arc ids match their positions
     *  - every adjacency entry refers to an existing arc with the matching endpoint
     *  - every arc is listed by both of its endpoints
     *
     * Panics if an issue is found. This is also not very performant, so should
     * only be used in tests and things like that.
     */
    pub fn validate(&self) {
        let mut issue_count = 0;

        for (index, node) in self.nodes.iter().enumerate() {
            if node.id.0 != index {
                log::error!("node at {} has id {}", index, node.id);
                issue_count += 1;
            }
            for incoming in node.incoming_arcs() {
                match self.arcs.get(incoming.0) {
                    Some(arc) if arc.target == node.id => {}
                    Some(_) => {
                        log::error!(
                            "node {} lists incoming arc {}, but arc doesn't agree",
                            node.id,
                            incoming
                        );
                        issue_count += 1;
                    }
                    None => {
                        log::error!(
                            "node {} lists incoming arc {}, but that arc doesn't exist",
                            node.id,
                            incoming
                        );
                        issue_count += 1;
                    }
                }
            }
            for outgoing in node.outgoing_arcs() {
                match self.arcs.get(outgoing.0) {
                    Some(arc) if arc.source == node.id => {}
                    Some(_) => {
                        log::error!(
                            "node {} lists outgoing arc {}, but arc doesn't agree",
                            node.id,
                            outgoing
                        );
                        issue_count += 1;
                    }
                    None => {
                        log::error!(
                            "node {} lists outgoing arc {}, but that arc doesn't exist",
                            node.id,
                            outgoing
                        );
                        issue_count += 1;
                    }
                }
            }
        }

        for (index, arc) in self.arcs.iter().enumerate() {
            if arc.id.0 != index {
                log::error!("arc at {} has id {}", index, arc.id);
                issue_count += 1;
            }
            match self.nodes.get(arc.source.0) {
                Some(source) if source.outgoing_arcs().contains(&arc.id) => {}
                _ => {
                    log::error!("arc {} is not listed by its source {}", arc.id, arc.source);
                    issue_count += 1;
                }
            }
            match self.nodes.get(arc.target.0) {
                Some(target) if target.incoming_arcs().contains(&arc.id) => {}
                _ => {
                    log::error!("arc {} is not listed by its target {}", arc.id, arc.target);
                    issue_count += 1;
                }
            }
        }

        if issue_count > 0 {
            panic!("Found {} issues", issue_count);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::arc::ArcHandle;
    use crate::graph::*;
    use crate::node::NodeHandle;

    fn triangle() -> DiGraph<&'static str, u32> {
        let mut graph = DiGraph::new();
        let a = graph.add_node("a");
        let b = graph.add_node("b");
        let c = graph.add_node("c");
        graph.add_arc(a, b, 0);
        graph.add_arc(b, a, 1);
        graph.add_arc(b, c, 2);
        graph.add_arc(c, a, 3);
        graph
    }

    #[test]
    fn twin_lookup() {
        let graph = triangle();
        assert_eq!(graph.twin(ArcHandle(0)), Some(ArcHandle(1)));
        assert_eq!(graph.twin(ArcHandle(1)), Some(ArcHandle(0)));
        assert_eq!(graph.twin(ArcHandle(2)), None);
        assert_eq!(
            graph.find_arc(NodeHandle(2), NodeHandle(0)),
            Some(ArcHandle(3))
        );
        graph.validate();
    }

    #[test]
    fn swap_remove_arc() {
        let mut graph = triangle();
        let removed = graph.remove_arc(ArcHandle(1));
        assert_eq!(removed.data, 1);
        assert_eq!(graph.arc_count(), 3);

        // the last arc (c -> a) takes the freed id
        let moved = graph.arc(ArcHandle(1));
        assert_eq!(moved.data, 3);
        assert_eq!(moved.source(), NodeHandle(2));
        assert_eq!(graph.find_arc(NodeHandle(2), NodeHandle(0)), Some(ArcHandle(1)));
        assert_eq!(graph.twin(ArcHandle(0)), None);
        graph.validate();
    }

    #[test]
    fn remove_last_arc() {
        let mut graph = triangle();
        graph.remove_arc(ArcHandle(3));
        assert_eq!(graph.arc_count(), 3);
        assert_eq!(graph.node(NodeHandle(0)).incoming_arcs(), &[ArcHandle(1)]);
        graph.validate();
    }

    #[test]
    fn remove_node() {
        let mut graph = triangle();
        let (data, moved) = graph.remove_node(NodeHandle(0));
        assert_eq!(data, "a");
        assert_eq!(moved, Some(NodeHandle(2)));
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.arc_count(), 1);
        assert_eq!(graph.node(NodeHandle(0)).data, "c");
        assert_eq!(graph.arcs()[0].data, 2);
        assert_eq!(graph.arcs()[0].target(), NodeHandle(0));
        graph.validate();
    }

    #[test]
    fn retain_compacts_ids() {
        let mut graph = triangle();
        graph.retain_arcs(|arc| arc.data % 2 == 1);
        assert_eq!(
            graph.arcs().iter().map(|arc| arc.data).collect::<Vec<_>>(),
            vec![1, 3]
        );
        assert_eq!(graph.arc(ArcHandle(1)).data, 3);
        graph.validate();
    }

    #[test]
    fn sort_outgoing() {
        let mut graph = triangle();
        graph.add_arc(NodeHandle(1), NodeHandle(1), 9);
        graph.sort_outgoing_by(|_, a, b| b.data.cmp(&a.data));
        let order: Vec<u32> = graph.outgoing(NodeHandle(1)).map(|arc| arc.data).collect();
        assert_eq!(order, vec![9, 2, 1]);
        graph.validate();
    }
}
