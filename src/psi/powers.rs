//! Power-computation scheduling for homomorphic polynomial evaluation.
//!
//! Given the exponents a query supplies directly (sources) and the exponents
//! evaluation needs (targets), [`PowersDag::configure`] plans how to derive
//! every missing power as a product or square of two earlier powers, keeping
//! the multiplicative depth of the deepest derivation minimal. The DAG is an
//! arena of nodes addressed by exponent; parent links are exponents, and each
//! computed power is written exactly once before any dependent reads it.

use std::collections::BTreeSet;

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::ring::HeRing;

/// One node of the scheduling graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowersNode {
    /// The exponent this node produces.
    pub exponent: u32,
    /// `None` for a source (externally supplied) power; `Some((a, b))` with
    /// `a + b == exponent` for a derived one.
    pub parents: Option<(u32, u32)>,
    /// Multiplicative depth of this node: 0 for sources, otherwise one more
    /// than the deeper parent.
    pub depth: u32,
}

impl PowersNode {
    /// Whether this power is supplied by the query rather than derived.
    pub fn is_source(&self) -> bool {
        self.parents.is_none()
    }
}

/// The whole scheduling graph for a target exponent set. Immutable once
/// configured.
#[derive(Debug, Clone)]
pub struct PowersDag {
    /// Arena indexed by `exponent - 1`; `None` where no power is needed.
    nodes: Vec<Option<PowersNode>>,
    depth: u32,
}

impl PowersDag {
    /// Plans the derivation of every exponent in `targets` from `sources`.
    ///
    /// Targets already present in the source set are trimmed. Each remaining
    /// exponent `e`, in increasing order, picks the split `(a, e - a)` over
    /// already-planned exponents that minimizes the resulting depth. Nodes
    /// that end up neither targets nor ancestors of targets are pruned.
    ///
    /// # Errors
    ///
    /// `Error::Config` if either set contains 0, or if some target cannot be
    /// reached from the sources (e.g. exponent 1 is needed but not supplied).
    pub fn configure(sources: &BTreeSet<u32>, targets: &BTreeSet<u32>) -> Result<Self> {
        if sources.contains(&0) || targets.contains(&0) {
            return Err(Error::config("exponent 0 is not a valid power"));
        }
        let max_exp = match sources.iter().chain(targets.iter()).max() {
            Some(&m) => m as usize,
            None => return Err(Error::config("source and target sets are both empty")),
        };

        let mut nodes: Vec<Option<PowersNode>> = vec![None; max_exp];
        for &s in sources {
            nodes[s as usize - 1] = Some(PowersNode {
                exponent: s,
                parents: None,
                depth: 0,
            });
        }

        for e in 1..=max_exp as u32 {
            if nodes[e as usize - 1].is_some() {
                continue;
            }
            let mut best: Option<(u32, u32, u32)> = None;
            for a in 1..=e / 2 {
                let b = e - a;
                if let (Some(na), Some(nb)) =
                    (&nodes[a as usize - 1], &nodes[b as usize - 1])
                {
                    let depth = na.depth.max(nb.depth) + 1;
                    if best.map_or(true, |(_, _, d)| depth < d) {
                        best = Some((a, b, depth));
                    }
                }
            }
            match best {
                Some((a, b, depth)) => {
                    nodes[e as usize - 1] = Some(PowersNode {
                        exponent: e,
                        parents: Some((a, b)),
                        depth,
                    });
                }
                None if targets.contains(&e) => {
                    return Err(Error::config(format!(
                        "target power {} is unreachable from the source set",
                        e
                    )));
                }
                None => {}
            }
        }

        // Keep only targets, sources, and ancestors of targets.
        let mut needed = vec![false; max_exp];
        for &t in targets {
            needed[t as usize - 1] = true;
        }
        for e in (1..=max_exp).rev() {
            if !needed[e - 1] {
                continue;
            }
            if let Some(node) = &nodes[e - 1] {
                if let Some((a, b)) = node.parents {
                    needed[a as usize - 1] = true;
                    needed[b as usize - 1] = true;
                }
            }
        }
        for &s in sources {
            needed[s as usize - 1] = true;
        }
        for (i, node) in nodes.iter_mut().enumerate() {
            if !needed[i] {
                *node = None;
            }
        }

        let depth = nodes
            .iter()
            .flatten()
            .map(|n| n.depth)
            .max()
            .unwrap_or(0);

        Ok(Self { nodes, depth })
    }

    /// Maximum multiplicative depth any derived power requires.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Largest exponent the DAG covers.
    pub fn max_exponent(&self) -> u32 {
        self.nodes.len() as u32
    }

    /// Node for `exponent`, if the DAG needs it.
    pub fn node(&self, exponent: u32) -> Option<&PowersNode> {
        self.nodes
            .get(exponent as usize - 1)
            .and_then(|n| n.as_ref())
    }

    /// Source exponents the query must supply.
    pub fn sources(&self) -> impl Iterator<Item = u32> + '_ {
        self.nodes
            .iter()
            .flatten()
            .filter(|n| n.is_source())
            .map(|n| n.exponent)
    }

    /// Derived exponents grouped by depth, shallowest first. Within a level
    /// every node depends only on shallower levels, so a level's nodes can be
    /// evaluated in parallel; the level order is a topological order.
    pub fn levels(&self) -> Vec<Vec<u32>> {
        let mut levels: Vec<Vec<u32>> = vec![Vec::new(); self.depth as usize];
        for node in self.nodes.iter().flatten() {
            if node.depth > 0 {
                levels[node.depth as usize - 1].push(node.exponent);
            }
        }
        levels
    }
}

/// Fills `powers[e - 1]` for every exponent `e` the DAG covers.
///
/// Source entries must already be present (placed from the query); derived
/// entries are computed level by level, in parallel within a level, using
/// `square` when a node's parents coincide and `mult` otherwise. This is the
/// only place power derivation consumes ciphertext multiplicative depth, so
/// `dag.depth()` bounds the budget it needs.
pub fn compute_all_powers<R: HeRing>(
    ring: &R,
    dag: &PowersDag,
    powers: &mut [Option<R::Ciphertext>],
) -> Result<()> {
    if (powers.len() as u32) < dag.max_exponent() {
        return Err(Error::config(format!(
            "powers buffer holds {} entries but the DAG needs {}",
            powers.len(),
            dag.max_exponent()
        )));
    }
    for s in dag.sources() {
        if powers[s as usize - 1].is_none() {
            return Err(Error::config(format!(
                "source power {} was not supplied",
                s
            )));
        }
    }

    for level in dag.levels() {
        let computed: Vec<(u32, R::Ciphertext)> = level
            .par_iter()
            .map(|&e| {
                let (a, b) = dag
                    .node(e)
                    .and_then(|n| n.parents)
                    .ok_or_else(|| Error::config(format!("power {} has no parents", e)))?;
                let pa = powers[a as usize - 1]
                    .as_ref()
                    .ok_or_else(|| Error::config(format!("parent power {} missing", a)))?;
                let value = if a == b {
                    ring.square(pa)?
                } else {
                    let pb = powers[b as usize - 1]
                        .as_ref()
                        .ok_or_else(|| Error::config(format!("parent power {} missing", b)))?;
                    ring.mult(pa, pb)?
                };
                Ok((e, value))
            })
            .collect::<Result<Vec<_>>>()?;
        for (e, value) in computed {
            powers[e as usize - 1] = Some(value);
        }
    }
    Ok(())
}
