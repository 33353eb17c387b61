use crate::topology::GridTopology;

const UNVISITED: usize = usize::MAX;

/// Undirected graph as adjacency lists without self-loops or duplicate
/// edges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimpleGraph {
    neighbours: Vec<Vec<usize>>,
}

impl SimpleGraph {
    pub fn with_nodes(node_count: usize) -> Self {
        Self {
            neighbours: vec![Vec::new(); node_count],
        }
    }

    pub fn add_edge(&mut self, a: usize, b: usize) {
        if a == b || self.neighbours[a].contains(&b) {
            return;
        }
        self.neighbours[a].push(b);
        self.neighbours[b].push(a);
    }

    pub fn node_count(&self) -> usize {
        self.neighbours.len()
    }

    pub fn neighbours(&self, node: usize) -> &[usize] {
        &self.neighbours[node]
    }

    /// One node per active cell, joined to its neighbours.
    pub fn cells(topology: &GridTopology) -> Self {
        let mut graph = Self::with_nodes(topology.index_count());
        for cell in (0..topology.index_count()).filter(|&c| topology.is_active(c)) {
            for direction in topology.directions().directions() {
                if let Some(neighbour) = topology.try_move(cell, direction) {
                    graph.add_edge(cell, neighbour);
                }
            }
        }
        graph
    }

    /// Per cell, one node for each exit direction followed by a centre
    /// node. Each exit is joined to its centre and to the facing exit of
    /// the neighbouring cell.
    pub fn edged(topology: &GridTopology) -> Self {
        let directions = topology.directions();
        let stride = directions.count() + 1;
        let mut graph = Self::with_nodes(topology.index_count() * stride);
        for cell in (0..topology.index_count()).filter(|&c| topology.is_active(c)) {
            let centre = cell * stride + directions.count();
            for direction in directions.directions() {
                let exit = cell * stride + direction;
                graph.add_edge(centre, exit);
                if let Some(neighbour) = topology.try_move(cell, direction) {
                    graph.add_edge(exit, neighbour * stride + directions.inverse(direction));
                }
            }
        }
        graph
    }
}

/// Result of [`articulation_points`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Articulation {
    /// Component of each node reached from a relevant node.
    pub component: Vec<Option<usize>>,
    pub component_count: usize,
    /// Nodes whose removal separates relevant nodes from each other.
    pub is_articulation: Vec<bool>,
}

struct Frame {
    node: usize,
    parent: Option<usize>,
    cursor: usize,
}

/// Finds the walkable nodes that every route between some pair of relevant
/// nodes must pass through.
///
/// Components are grown from relevant walkable nodes only. The depth-first
/// search keeps discovery and low-link numbers on an explicit stack, and
/// tracks how many relevant nodes each subtree holds. A node is an
/// articulation point when removing it leaves relevant nodes in at least two
/// separate pieces.
pub fn articulation_points(graph: &SimpleGraph, walkable: &[bool], relevant: &[bool]) -> Articulation {
    let node_count = graph.node_count();
    let mut discovery = vec![UNVISITED; node_count];
    let mut low = vec![UNVISITED; node_count];
    let mut subtree_relevant = vec![0usize; node_count];
    let mut separated_relevant = vec![0usize; node_count];
    let mut separated_pieces = vec![0usize; node_count];
    let mut component = vec![None; node_count];
    let mut component_totals = Vec::new();
    let mut time = 0;
    let mut stack: Vec<Frame> = Vec::new();

    for root in 0..node_count {
        if !walkable[root] || !relevant[root] || discovery[root] != UNVISITED {
            continue;
        }
        let id = component_totals.len();
        discovery[root] = time;
        low[root] = time;
        time += 1;
        subtree_relevant[root] = 1;
        component[root] = Some(id);
        stack.push(Frame {
            node: root,
            parent: None,
            cursor: 0,
        });

        while let Some(frame) = stack.last_mut() {
            let node = frame.node;
            if let Some(&next) = graph.neighbours(node).get(frame.cursor) {
                frame.cursor += 1;
                if !walkable[next] {
                    continue;
                }
                if discovery[next] == UNVISITED {
                    discovery[next] = time;
                    low[next] = time;
                    time += 1;
                    subtree_relevant[next] = usize::from(relevant[next]);
                    component[next] = Some(id);
                    stack.push(Frame {
                        node: next,
                        parent: Some(node),
                        cursor: 0,
                    });
                } else if frame.parent != Some(next) {
                    low[node] = low[node].min(discovery[next]);
                }
                continue;
            }

            let parent = frame.parent;
            stack.pop();
            if let Some(parent) = parent {
                low[parent] = low[parent].min(low[node]);
                subtree_relevant[parent] += subtree_relevant[node];
                if low[node] >= discovery[parent] {
                    separated_relevant[parent] += subtree_relevant[node];
                    if subtree_relevant[node] > 0 {
                        separated_pieces[parent] += 1;
                    }
                }
            }
        }
        component_totals.push(subtree_relevant[root]);
    }

    let is_articulation = (0..node_count)
        .map(|node| {
            let Some(id) = component[node] else {
                return false;
            };
            let own = usize::from(relevant[node]);
            let rest = component_totals[id] - separated_relevant[node] - own;
            separated_pieces[node] + usize::from(rest > 0) >= 2
        })
        .collect();

    Articulation {
        component,
        component_count: component_totals.len(),
        is_articulation,
    }
}

/// Labels the connected components of the walkable nodes.
pub fn components(graph: &SimpleGraph, walkable: &[bool]) -> Vec<Option<usize>> {
    let mut component = vec![None; graph.node_count()];
    let mut next_id = 0;
    let mut stack = Vec::new();
    for start in 0..graph.node_count() {
        if !walkable[start] || component[start].is_some() {
            continue;
        }
        component[start] = Some(next_id);
        stack.push(start);
        while let Some(node) = stack.pop() {
            for &next in graph.neighbours(node) {
                if walkable[next] && component[next].is_none() {
                    component[next] = Some(next_id);
                    stack.push(next);
                }
            }
        }
        next_id += 1;
    }
    component
}

/// Returns a node that lies on a cycle of walkable nodes, if there is one.
pub fn find_cycle(graph: &SimpleGraph, walkable: &[bool]) -> Option<usize> {
    let mut visited = vec![false; graph.node_count()];
    let mut stack: Vec<Frame> = Vec::new();
    for root in 0..graph.node_count() {
        if !walkable[root] || visited[root] {
            continue;
        }
        visited[root] = true;
        stack.push(Frame {
            node: root,
            parent: None,
            cursor: 0,
        });
        while let Some(frame) = stack.last_mut() {
            let node = frame.node;
            let Some(&next) = graph.neighbours(node).get(frame.cursor) else {
                stack.pop();
                continue;
            };
            frame.cursor += 1;
            if !walkable[next] || frame.parent == Some(next) {
                continue;
            }
            if visited[next] {
                return Some(next);
            }
            visited[next] = true;
            stack.push(Frame {
                node: next,
                parent: Some(node),
                cursor: 0,
            });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use wfc_rules::DirectionSet;

    fn path_graph(n: usize) -> SimpleGraph {
        let mut graph = SimpleGraph::with_nodes(n);
        for i in 1..n {
            graph.add_edge(i - 1, i);
        }
        graph
    }

    #[test]
    fn inner_nodes_of_a_line_separate_its_ends() {
        let graph = path_graph(5);
        let walkable = vec![true; 5];
        let relevant = vec![true, false, false, false, true];
        let result = articulation_points(&graph, &walkable, &relevant);
        assert_eq!(result.component_count, 1);
        assert_eq!(result.is_articulation, vec![false, true, true, true, false]);
    }

    #[test]
    fn nodes_off_the_route_are_not_articulation_points() {
        // 0 - 1 - 2 with a spur 1 - 3; only 0 and 2 are relevant.
        let mut graph = SimpleGraph::with_nodes(4);
        graph.add_edge(0, 1);
        graph.add_edge(1, 2);
        graph.add_edge(1, 3);
        let relevant = vec![true, false, true, false];
        let result = articulation_points(&graph, &[true; 4], &relevant);
        assert_eq!(result.is_articulation, vec![false, true, false, false]);
    }

    #[test]
    fn cycles_have_no_articulation_points() {
        let mut graph = path_graph(4);
        graph.add_edge(3, 0);
        let result = articulation_points(&graph, &[true; 4], &[true; 4]);
        assert!(result.is_articulation.iter().all(|&a| !a));
        assert!(find_cycle(&graph, &[true; 4]).is_some());
        assert_eq!(find_cycle(&graph, &[true, true, false, true]), None);
    }

    #[test]
    fn blocked_nodes_split_components() {
        let graph = path_graph(5);
        let walkable = vec![true, true, false, true, true];
        let result = articulation_points(&graph, &walkable, &[true, false, false, false, true]);
        assert_eq!(result.component_count, 2);
        assert_eq!(result.component[3], Some(1));
        assert_eq!(result.component[2], None);
        let labels = components(&graph, &walkable);
        assert_eq!(labels, vec![Some(0), Some(0), None, Some(1), Some(1)]);
    }

    #[test]
    fn long_lines_do_not_recurse() {
        let n = 200_000;
        let graph = path_graph(n);
        let mut relevant = vec![false; n];
        relevant[0] = true;
        relevant[n - 1] = true;
        let result = articulation_points(&graph, &vec![true; n], &relevant);
        assert!(result.is_articulation[n / 2]);
    }

    #[test]
    fn topology_graphs_skip_duplicate_wraps() {
        let topology =
            GridTopology::new_2d(DirectionSet::Cartesian2d, 2, 1).with_periodicity(true, false, false);
        let graph = SimpleGraph::cells(&topology);
        assert_eq!(graph.neighbours(0), &[1]);

        let edged = SimpleGraph::edged(&GridTopology::new_2d(DirectionSet::Cartesian2d, 2, 1));
        // Cell 0's +x exit meets cell 1's -x exit.
        assert_eq!(edged.neighbours(0), &[4, 6]);
        assert_eq!(edged.neighbours(4), &[0, 1, 2, 3]);
    }
}
