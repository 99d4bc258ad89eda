//! EDR and EDD resolution.
//!
//! # Order
//!
//! A node can be resolved once all of its children are.  [`resolution_order`]
//! computes that order once with Kahn's algorithm run against the edge
//! direction: every node starts with a pending count equal to its number of
//! children, childless nodes seed the worklist, and resolving a node
//! decrements each of its parents.  The destination is childless, so it comes
//! first; the root comes last.
//!
//! # Forwarding model
//!
//! A node meets its forwarding-set children `c_1 … c_n` in encounter order
//! and hands the packet to the first one it actually meets:
//!
//! ```text
//! P_forward(i) = p_i · Π_{j<i} (1 − p_j)
//! EDR(node)    = Σ P_forward(i) · EDR(c_i)
//! Q(i)         = P_forward(i) · EDR(c_i) / EDR(node)
//! EDD(node)    = Σ Q(i) · (delay_i + EDD(c_i))
//! ```
//!
//! Under full fan-out the forwarding set is every child.  The optimal
//! subsequence variant picks the order-preserving subset that maximises EDR.
//! EDD always uses the full fan-out terms: every child, weighted by the
//! full fan-out EDR of the node and of each child.

use std::collections::VecDeque;

use tracing::trace;

use tpd_core::{EdrVariant, VehicleId};

use crate::{EncounterGraph, GraphError, GraphResult};

/// EDR values at or below this are treated as "never delivered".
pub const EDR_EPSILON: f64 = 1e-12;

/// Vehicles ordered so that every node follows all of its children.
pub fn resolution_order(graph: &EncounterGraph) -> GraphResult<Vec<VehicleId>> {
    let mut pending = vec![0usize; graph.capacity()];
    let mut worklist = VecDeque::new();
    for node in graph.nodes() {
        pending[node.vehicle.index()] = node.neighbors.len();
        if node.neighbors.is_empty() {
            worklist.push_back(node.vehicle);
        }
    }

    let mut order = Vec::with_capacity(graph.len());
    while let Some(v) = worklist.pop_front() {
        order.push(v);
        for parent in &graph.require(v)?.parents {
            let p = parent.peer.index();
            if pending.get(p).copied().unwrap_or(0) == 0 {
                return Err(GraphError::inconsistent(
                    parent.peer,
                    "parent entry without a matching neighbor entry",
                ));
            }
            pending[p] -= 1;
            if pending[p] == 0 {
                worklist.push_back(parent.peer);
            }
        }
    }

    if order.len() != graph.len() {
        return Err(GraphError::unresolved(graph.len() - order.len()));
    }
    Ok(order)
}

/// Expected delivery ratio of a first-success forwarding sequence of
/// `(encounter probability, child EDR)` pairs.
pub fn sequence_edr(children: impl IntoIterator<Item = (f64, f64)>) -> f64 {
    let mut miss = 1.0;
    let mut edr = 0.0;
    for (p, child_edr) in children {
        edr += miss * p * child_edr;
        miss *= 1.0 - p;
    }
    edr
}

/// Choose the order-preserving subsequence of `children` that maximises
/// [`sequence_edr`].  Returns the inclusion flags and the resulting EDR.
///
/// The last child is always included.  Walking backwards, each earlier child
/// is tentatively put in front of the current best subsequence and kept only
/// if that strictly raises the EDR.  Prepending `(p, r)` to a sequence with
/// EDR `E` gives `p·r + (1 − p)·E`, and that is increasing in `E`, so keeping
/// the best suffix at every step yields the global optimum.
pub fn optimal_subsequence(children: &[(f64, f64)]) -> (Vec<bool>, f64) {
    let n = children.len();
    let mut flags = vec![false; n];
    let Some(&(p_last, r_last)) = children.last() else {
        return (flags, 0.0);
    };
    flags[n - 1] = true;
    let mut best = p_last * r_last;
    for i in (0..n - 1).rev() {
        let (p, r) = children[i];
        let candidate = p * r + (1.0 - p) * best;
        if candidate > best {
            flags[i] = true;
            best = candidate;
        }
    }
    (flags, best)
}

/// Compute EDR for every node, children before parents.
pub fn resolve_edr(graph: &mut EncounterGraph, order: &[VehicleId], variant: EdrVariant) -> GraphResult<()> {
    let destination = graph.target();
    let mut children: Vec<(f64, f64)> = Vec::new();
    let mut children_full: Vec<(f64, f64)> = Vec::new();

    for &v in order {
        children.clear();
        children_full.clear();
        for edge in &graph.require(v)?.neighbors {
            let child = graph.require(edge.peer)?;
            if !child.edr_resolved {
                return Err(GraphError::inconsistent(v, "child EDR unresolved"));
            }
            children.push((edge.probability(), child.edr));
            children_full.push((edge.probability(), child.edr_full));
        }

        let (flags, edr, edr_full) = if v == destination {
            (vec![true; children.len()], 1.0, 1.0)
        } else {
            let full = sequence_edr(children_full.iter().copied());
            match variant {
                EdrVariant::FullFanOut => (vec![true; children.len()], full, full),
                EdrVariant::OptimalSubsequence => {
                    let (flags, edr) = optimal_subsequence(&children);
                    (flags, edr, full)
                }
            }
        };

        let node = graph.require_mut(v)?;
        for (edge, flag) in node.neighbors.iter_mut().zip(flags) {
            edge.in_subsequence = flag;
        }
        node.edr = edr.clamp(0.0, 1.0);
        node.edr_full = edr_full.clamp(0.0, 1.0);
        node.edr_resolved = true;
        trace!(vehicle = %v, edr = node.edr, edr_full = node.edr_full, "EDR resolved");
    }
    Ok(())
}

/// Compute EDD for every node from the full fan-out EDR already resolved.
pub fn resolve_edd(graph: &mut EncounterGraph, order: &[VehicleId]) -> GraphResult<()> {
    let destination = graph.target();

    for &v in order {
        let node = graph.require(v)?;
        if !node.edr_resolved {
            return Err(GraphError::inconsistent(v, "EDD requested before EDR"));
        }

        let edd = if v == destination || node.edr_full <= EDR_EPSILON {
            0.0
        } else {
            let mut miss = 1.0;
            let mut edd = 0.0;
            for edge in &node.neighbors {
                let child = graph.require(edge.peer)?;
                if !child.edd_resolved {
                    return Err(GraphError::inconsistent(v, "child EDD unresolved"));
                }
                let p = edge.probability();
                let q = miss * p * child.edr_full / node.edr_full;
                edd += q * (edge.delay() + child.edd);
                miss *= 1.0 - p;
            }
            edd
        };

        let node = graph.require_mut(v)?;
        node.edd = edd.max(0.0);
        node.edd_resolved = true;
        trace!(vehicle = %v, edd = node.edd, "EDD resolved");
    }
    Ok(())
}
