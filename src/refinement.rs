//! Concurrent multi-target refinement (spec.md §4.5, §5), grounded on
//! `original_source/aicpp/src/aicpp/Brain.cpp`'s `learn()` main loop: a
//! per-target ordered frontier of `Pair`s, advanced round-by-round by
//! parallel tasks racing to beat the current baseline within `eps`.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Mutex;

use tracing::{debug, info};

use crate::connection::Connection;
use crate::error::EngineResult;
use crate::heuristic;
use crate::odometer::Odometer;
use crate::value::{TypeTag, Value};

/// `(heuristic distance, structural cost, skeleton id, filled Connection)`
/// (spec.md §4.5/GLOSSARY). Ordered lexicographically by `(cost_h,
/// cost_struct)`; equality (used for multiset convergence) compares the
/// skeleton identity and the underlying Connection, per spec.md §5's "the
/// frontier merge deduplicates by Pair equality, which compares underlying
/// Connections".
#[derive(Clone, Debug)]
pub struct Pair {
    pub cost_h: f64,
    pub cost_struct: usize,
    pub skeleton_id: usize,
    pub connection: Connection,
}

impl PartialEq for Pair {
    fn eq(&self, other: &Self) -> bool {
        self.skeleton_id == other.skeleton_id && self.connection == other.connection
    }
}
impl Eq for Pair {}

impl PartialOrd for Pair {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Pair {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cost_h
            .total_cmp(&other.cost_h)
            .then_with(|| self.cost_struct.cmp(&other.cost_struct))
    }
}

struct SkeletonInfo {
    id: usize,
    connection: Connection,
    pools: Vec<Vec<Value>>,
}

#[cfg(feature = "rayon")]
fn map_indices<T: Send>(n: usize, f: impl Fn(usize) -> T + Sync) -> Vec<T> {
    use rayon::prelude::*;
    (0..n).into_par_iter().map(f).collect()
}
#[cfg(not(feature = "rayon"))]
fn map_indices<T>(n: usize, f: impl Fn(usize) -> T) -> Vec<T> {
    (0..n).map(f).collect()
}

#[cfg(feature = "rayon")]
fn map_frontier<T: Send>(frontier: &[Pair], f: impl Fn(&Pair) -> T + Sync) -> Vec<T> {
    use rayon::prelude::*;
    frontier.par_iter().map(f).collect()
}
#[cfg(not(feature = "rayon"))]
fn map_frontier<T>(frontier: &[Pair], f: impl Fn(&Pair) -> T) -> Vec<T> {
    frontier.iter().map(f).collect()
}

/// Run spec.md §4.5's Phases A-D. Returns one Connection per target in
/// `targets` order, or an empty Vec if no skeleton had a usable parameter
/// pool or any target's frontier ended up empty — the two "empty result"
/// cases spec.md §7 deliberately leaves indistinguishable.
#[tracing::instrument(skip(skeletons, parameters, targets))]
pub fn refine(
    skeletons: &[Connection],
    parameters: &HashMap<TypeTag, Vec<Value>>,
    targets: &[Value],
    eps: f64,
) -> EngineResult<Vec<Connection>> {
    // Phase A
    let mut infos: Vec<SkeletonInfo> = Vec::new();
    for (id, c) in skeletons.iter().enumerate() {
        let mut pools = Vec::with_capacity(c.input_types().len());
        let mut usable = true;
        for t in c.input_types() {
            match parameters.get(&t) {
                Some(p) if !p.is_empty() => pools.push(p.clone()),
                _ => {
                    usable = false;
                    break;
                }
            }
        }
        if usable {
            infos.push(SkeletonInfo { id, connection: c.clone(), pools });
        }
    }

    debug!(usable_skeletons = infos.len(), total_skeletons = skeletons.len(), "phase A complete");

    if infos.is_empty() || targets.is_empty() {
        return Ok(Vec::new());
    }

    // Phase B: one shared draw per skeleton, broadcast to every target.
    let mut shared_enumerators: Vec<Odometer> = infos.iter().map(|info| Odometer::new(info.pools.clone())).collect();
    let mut frontiers: Vec<Vec<Pair>> = vec![Vec::new(); targets.len()];

    for (k, info) in infos.iter().enumerate() {
        if let Some(tuple) = shared_enumerators[k].next() {
            let mut candidate = info.connection.clone();
            candidate.apply_inputs(tuple)?;
            let output = candidate.output()?;
            for (j, target) in targets.iter().enumerate() {
                frontiers[j].push(Pair {
                    cost_h: heuristic::h(&output, target),
                    cost_struct: info.connection.cost(),
                    skeleton_id: info.id,
                    connection: candidate.clone(),
                });
            }
        }
    }
    for frontier in frontiers.iter_mut() {
        frontier.sort();
    }

    // one enumerator per (skeleton, target) pair from here on (§5).
    let mut enumerators: Vec<HashMap<usize, Mutex<Odometer>>> = targets
        .iter()
        .map(|_| {
            infos
                .iter()
                .zip(shared_enumerators.iter())
                .map(|(info, od)| (info.id, Mutex::new(od.clone())))
                .collect()
        })
        .collect();

    // Phase C
    let mut finished = vec![false; targets.len()];
    let mut round = 0usize;
    loop {
        if finished.iter().all(|&f| f) {
            break;
        }
        round += 1;

        let updates: Vec<Option<(Vec<Pair>, bool)>> = map_indices(targets.len(), |j| {
            if finished[j] {
                return None;
            }
            let frontier = &frontiers[j];
            if frontier.is_empty() {
                return Some((Vec::new(), true));
            }
            if frontier[0].cost_h < eps {
                return Some((frontier.clone(), true));
            }

            let target = &targets[j];
            let target_enumerators = &enumerators[j];
            let process = AtomicBool::new(true);

            let mut new_frontier: Vec<Pair> = map_frontier(frontier, |baseline| {
                run_task(baseline, &infos, target_enumerators, target, eps, &process)
            });
            new_frontier.sort();

            let mut old_sorted = frontier.clone();
            old_sorted.sort();
            let converged = new_frontier == old_sorted;
            Some((new_frontier, converged))
        });

        for (j, update) in updates.into_iter().enumerate() {
            if let Some((new_frontier, done)) = update {
                frontiers[j] = new_frontier;
                finished[j] = done;
            }
        }
    }

    info!(rounds = round, "refinement converged");

    // Phase D
    let mut results = Vec::with_capacity(targets.len());
    for frontier in &frontiers {
        match select(frontier, eps) {
            Some(c) => results.push(c),
            None => return Ok(Vec::new()),
        }
    }
    Ok(results)
}

fn run_task(
    baseline: &Pair,
    infos: &[SkeletonInfo],
    enumerators: &HashMap<usize, Mutex<Odometer>>,
    target: &Value,
    eps: f64,
    process: &AtomicBool,
) -> Pair {
    let info = match infos.iter().find(|i| i.id == baseline.skeleton_id) {
        Some(info) => info,
        None => return baseline.clone(),
    };
    let odometer = match enumerators.get(&baseline.skeleton_id) {
        Some(o) => o,
        None => return baseline.clone(),
    };

    while process.load(AtomicOrdering::Relaxed) {
        let tuple = {
            let mut guard = odometer.lock().expect("odometer mutex poisoned");
            guard.next()
        };
        let Some(tuple) = tuple else {
            break;
        };

        let mut candidate = info.connection.clone();
        if candidate.apply_inputs(tuple).is_err() {
            continue;
        }
        let Ok(output) = candidate.output() else {
            continue;
        };
        let cost_h = heuristic::h(&output, target);
        if cost_h < baseline.cost_h + eps {
            process.store(false, AtomicOrdering::Relaxed);
            return Pair {
                cost_h,
                cost_struct: info.connection.cost(),
                skeleton_id: info.id,
                connection: candidate,
            };
        }
    }

    baseline.clone()
}

/// Phase D: of the eps-tie set around the frontier's best entry, the
/// cheapest structural cost wins (ties broken by expression text for
/// determinism).
fn select(frontier: &[Pair], eps: f64) -> Option<Connection> {
    let best = frontier.first()?;
    let threshold = best.cost_h + eps;

    let mut tie_set: Vec<&Pair> = frontier.iter().filter(|p| p.cost_h < threshold).collect();
    tie_set.sort_by(|a, b| {
        a.cost_struct
            .cmp(&b.cost_struct)
            .then_with(|| a.connection.expression().cmp(&b.connection.expression()))
    });
    tie_set.first().map(|p| p.connection.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enumerator::enumerate;
    use crate::neuron::{ConstOp, Neuron, NeuronOp};
    use std::sync::Arc as StdArc;

    #[derive(Debug)]
    struct AddFn;
    impl NeuronOp for AddFn {
        fn call(&self, args: &[Value]) -> EngineResult<Value> {
            match (&args[0], &args[1]) {
                (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a + b)),
                _ => unreachable!(),
            }
        }
    }

    fn digit_library() -> Vec<StdArc<Neuron>> {
        let mut neurons: Vec<StdArc<Neuron>> = (0..10)
            .map(|d| StdArc::new(Neuron::new(d.to_string(), vec![], TypeTag::Int, ConstOp(Value::Int(d)))))
            .collect();
        neurons.push(StdArc::new(Neuron::new("add", vec![TypeTag::Int, TypeTag::Int], TypeTag::Int, AddFn)));
        neurons
    }

    #[test]
    fn synthesizes_five_from_digits_and_add() {
        let neurons = digit_library();
        let enumeration = enumerate(&neurons, &[], 1).unwrap();
        let targets = vec![Value::Int(5)];
        let result = refine(&enumeration.skeletons, &enumeration.parameters, &targets, 0.001).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].output().unwrap(), Value::Int(5));
    }

    #[test]
    fn empty_targets_yield_empty_result() {
        let neurons = digit_library();
        let enumeration = enumerate(&neurons, &[], 1).unwrap();
        let result = refine(&enumeration.skeletons, &enumeration.parameters, &[], 0.001).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn no_usable_skeleton_yields_empty_result() {
        let parameters: HashMap<TypeTag, Vec<Value>> = HashMap::new();
        let five = StdArc::new(Neuron::new("five", vec![], TypeTag::Int, ConstOp(Value::Int(5))));
        let leaf = Connection::make(five, vec![]).unwrap();
        let result = refine(&[leaf], &parameters, &[Value::Int(1)], 0.001).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn pair_ordering_is_lexicographic_by_cost_then_structural_cost() {
        let five = StdArc::new(Neuron::new("five", vec![], TypeTag::Int, ConstOp(Value::Int(5))));
        let c = Connection::make(five, vec![]).unwrap();
        let a = Pair { cost_h: 1.0, cost_struct: 5, skeleton_id: 0, connection: c.clone() };
        let b = Pair { cost_h: 1.0, cost_struct: 2, skeleton_id: 1, connection: c };
        assert!(b < a);
    }
}
