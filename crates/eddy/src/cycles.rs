//! Cycle Classifier: decide which links close a cycle and must be routed as circular links.
//!
//! Every elementary circuit contributes exactly one circular link: the edge that returns to the
//! circuit's least node. Circuits are found with Johnson's algorithm, so the choice does not depend
//! on traversal luck. Self-loops are always circular.

use crate::config::{ColumnOrdering, SankeyConfig};
use crate::error::{Error, Result};
use crate::model::SankeyGraph;
use rustc_hash::FxHashSet;

pub fn run(g: &mut SankeyGraph, config: &SankeyConfig) -> Result<()> {
    let circular: Vec<bool> = match config.column_ordering {
        ColumnOrdering::Key => classify_by_key(g)?,
        ColumnOrdering::Topological => classify_by_circuits(g),
    };

    let mut next_id = 0usize;
    for (li, is_circular) in circular.into_iter().enumerate() {
        let link = &mut g.links[li];
        link.circular = is_circular;
        link.circular_id = None;
        if is_circular {
            link.circular_id = Some(next_id);
            next_id += 1;
            let (s, t) = (link.source, link.target);
            g.nodes[s].part_of_cycle = true;
            g.nodes[t].part_of_cycle = true;
        }
    }

    tracing::debug!(circular = next_id, links = g.links.len(), "classified circular links");
    Ok(())
}

fn classify_by_key(g: &SankeyGraph) -> Result<Vec<bool>> {
    let key = |ni: usize| {
        g.nodes[ni].column_key.ok_or_else(|| Error::MissingColumnKey {
            node: format!("#{ni}"),
        })
    };
    g.links
        .iter()
        .map(|l| Ok(l.is_self() || key(l.source)? >= key(l.target)?))
        .collect()
}

fn classify_by_circuits(g: &SankeyGraph) -> Vec<bool> {
    let mut adj: Vec<Vec<usize>> = vec![Vec::new(); g.nodes.len()];
    for l in g.active_links() {
        if l.is_self() {
            continue;
        }
        if !adj[l.source].contains(&l.target) {
            adj[l.source].push(l.target);
        }
    }

    let mut circuits = elementary_circuits(&adj);
    circuits.sort_by_key(|c| c.len());

    let mut closing: FxHashSet<(usize, usize)> = FxHashSet::default();
    for c in &circuits {
        if let (Some(&last), Some(&first)) = (c.last(), c.first()) {
            closing.insert((last, first));
        }
    }
    tracing::trace!(circuits = circuits.len(), closing = closing.len(), "circuit search");

    g.links
        .iter()
        .map(|l| l.is_self() || closing.contains(&(l.source, l.target)))
        .collect()
}

/// All elementary circuits of a directed graph (Johnson, 1975).
///
/// Each circuit is listed from its least vertex, without repeating it at the end; the closing
/// edge is `(circuit.last(), circuit[0])`. Self-loops in `adj` are ignored.
pub fn elementary_circuits(adj: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let n = adj.len();
    let mut out: Vec<Vec<usize>> = Vec::new();
    let mut start = 0usize;

    while start < n {
        let components = strongly_connected_components(adj, start);
        let least = components
            .iter()
            .filter(|c| c.len() > 1)
            .filter_map(|c| c.iter().min().copied().map(|m| (m, c)))
            .min_by_key(|(m, _)| *m);
        let Some((s, component)) = least else {
            break;
        };

        let mut in_component = vec![false; n];
        for &v in component {
            in_component[v] = true;
        }
        let mut search = CircuitSearch {
            adj,
            in_component,
            start: s,
            blocked: vec![false; n],
            blocked_by: vec![Vec::new(); n],
            stack: Vec::new(),
            out: &mut out,
        };
        search.circuit(s);
        start = s + 1;
    }
    out
}

struct CircuitSearch<'a> {
    adj: &'a [Vec<usize>],
    in_component: Vec<bool>,
    start: usize,
    blocked: Vec<bool>,
    blocked_by: Vec<Vec<usize>>,
    stack: Vec<usize>,
    out: &'a mut Vec<Vec<usize>>,
}

impl CircuitSearch<'_> {
    fn neighbors(&self, v: usize) -> impl Iterator<Item = usize> + '_ {
        self.adj[v]
            .iter()
            .copied()
            .filter(move |&w| w != v && self.in_component[w])
    }

    fn circuit(&mut self, v: usize) -> bool {
        let mut found = false;
        self.stack.push(v);
        self.blocked[v] = true;

        let next: Vec<usize> = self.neighbors(v).collect();
        for &w in &next {
            if w == self.start {
                self.out.push(self.stack.clone());
                found = true;
            } else if !self.blocked[w] && self.circuit(w) {
                found = true;
            }
        }

        if found {
            self.unblock(v);
        } else {
            for &w in &next {
                if !self.blocked_by[w].contains(&v) {
                    self.blocked_by[w].push(v);
                }
            }
        }
        self.stack.pop();
        found
    }

    fn unblock(&mut self, u: usize) {
        self.blocked[u] = false;
        while let Some(w) = self.blocked_by[u].pop() {
            if self.blocked[w] {
                self.unblock(w);
            }
        }
    }
}

/// Tarjan's strongly connected components of the subgraph induced by vertices `>= from`.
fn strongly_connected_components(adj: &[Vec<usize>], from: usize) -> Vec<Vec<usize>> {
    struct Tarjan<'a> {
        adj: &'a [Vec<usize>],
        from: usize,
        counter: usize,
        index: Vec<Option<usize>>,
        low: Vec<usize>,
        on_stack: Vec<bool>,
        stack: Vec<usize>,
        components: Vec<Vec<usize>>,
    }

    impl Tarjan<'_> {
        fn visit(&mut self, v: usize) {
            self.index[v] = Some(self.counter);
            self.low[v] = self.counter;
            self.counter += 1;
            self.stack.push(v);
            self.on_stack[v] = true;

            for i in 0..self.adj[v].len() {
                let w = self.adj[v][i];
                if w < self.from {
                    continue;
                }
                match self.index[w] {
                    None => {
                        self.visit(w);
                        self.low[v] = self.low[v].min(self.low[w]);
                    }
                    Some(wi) if self.on_stack[w] => {
                        self.low[v] = self.low[v].min(wi);
                    }
                    Some(_) => {}
                }
            }

            if Some(self.low[v]) == self.index[v] {
                let mut component = Vec::new();
                while let Some(w) = self.stack.pop() {
                    self.on_stack[w] = false;
                    component.push(w);
                    if w == v {
                        break;
                    }
                }
                self.components.push(component);
            }
        }
    }

    let n = adj.len();
    let mut t = Tarjan {
        adj,
        from,
        counter: 0,
        index: vec![None; n],
        low: vec![0; n],
        on_stack: vec![false; n],
        stack: Vec::new(),
        components: Vec::new(),
    };
    for v in from..n {
        if t.index[v].is_none() {
            t.visit(v);
        }
    }
    t.components
}
