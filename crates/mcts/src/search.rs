//! Oracle-guided Monte Carlo Tree Search with PUCT selection.
//!
//! One call to [`SearchEngine::search`] builds a fresh tree, expands the root,
//! runs the requested number of simulations and reports the visit
//! distribution over the root's legal moves. Each simulation:
//!
//! 1. **Select**: walk down expanded nodes, maximising
//!    `Q + c * P * sqrt(N_parent) / (1 + N_child)`.
//! 2. **Evaluate**: a terminal leaf scores its outcome; any other leaf is
//!    expanded with the oracle's priors and scores the oracle's value.
//! 3. **Backpropagate**: add the value along the path, negating it whenever
//!    the side to move changes.
//!
//! Priors of children that repeat a position already seen on the path from
//! the root are damped, which steers the search away from shuffling moves.

use crate::{
    config::SearchConfig,
    node::{Node, NodeId},
    oracle::Oracle,
    tree::Tree,
};
use lilichest_core::{Error, Position, Result, Value};
use rand::Rng;
use rand_distr::{Dirichlet, Distribution};
use std::cmp::Ordering;
use std::marker::PhantomData;

/// Result of a search.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchResult<M> {
    /// Visit fraction of every root child, sorted by descending fraction.
    /// Ties keep the order in which legal moves were generated.
    /// Empty if the search could not run.
    pub distribution: Vec<(M, f32)>,

    /// Raw visit count of every root child, in legal-move order.
    pub visit_counts: Vec<(M, u32)>,

    /// Value estimate at root (from perspective of the side to move).
    pub root_value: f32,

    /// Number of nodes built during the search.
    pub tree_size: usize,

    /// Oracle failures that were absorbed by retries.
    pub failed_evaluations: u32,
}

impl<M: Copy + PartialEq> SearchResult<M> {
    fn empty(root_value: f32) -> Self {
        Self {
            distribution: Vec::new(),
            visit_counts: Vec::new(),
            root_value,
            tree_size: 1,
            failed_evaluations: 0,
        }
    }

    /// Whether the search produced no moves.
    pub fn is_empty(&self) -> bool {
        self.distribution.is_empty()
    }

    /// Most visited move, first in generation order on ties.
    pub fn best(&self) -> Option<M> {
        self.distribution.first().map(|&(mv, _)| mv)
    }

    /// Visit fraction of `mv`, zero if it is not a root move.
    pub fn fraction(&self, mv: M) -> f32 {
        self.distribution
            .iter()
            .find(|(m, _)| *m == mv)
            .map_or(0.0, |&(_, f)| f)
    }

    /// Select a move using temperature-based sampling.
    ///
    /// - temperature = 0: always return best move (greedy)
    /// - temperature = 1: sample proportional to visit fractions
    /// - temperature > 1: more uniform distribution
    /// - temperature < 1: more peaked distribution
    ///
    /// Formula: P(a) ∝ f(a)^(1/τ) where τ is temperature
    pub fn select_move<R: Rng>(&self, temperature: f32, rng: &mut R) -> Option<M> {
        let best = self.best()?;
        if temperature <= 0.0 || self.distribution.len() == 1 {
            return Some(best);
        }

        let inv_temp = 1.0 / temperature as f64;
        let adjusted: Vec<f64> = self
            .distribution
            .iter()
            .map(|&(_, f)| (f as f64).powf(inv_temp))
            .collect();

        let sum: f64 = adjusted.iter().sum();
        if !(sum > 0.0) || !sum.is_finite() {
            return Some(best);
        }

        let threshold = rng.gen::<f64>() * sum;
        let mut cumulative = 0.0;
        for (&(mv, _), &weight) in self.distribution.iter().zip(&adjusted) {
            cumulative += weight;
            if cumulative >= threshold && weight > 0.0 {
                return Some(mv);
            }
        }
        Some(best)
    }

    /// Spread the distribution over the dense action index space of
    /// `position`, as a training target.
    pub fn dense_policy<P: Position<Move = M>>(&self, position: &P) -> Vec<f32> {
        let mut policy = vec![0.0; P::NUM_ACTIONS];
        for &(mv, fraction) in &self.distribution {
            if let Some(slot) = position.action_index(mv).and_then(|i| policy.get_mut(i)) {
                *slot = fraction;
            }
        }
        policy
    }
}

/// Oracle-guided MCTS.
///
/// Generic over:
/// - `P`: The position type being searched
/// - `O`: The oracle (rollouts, uniform or a neural network)
/// - `R`: The random number generator, used for root noise only
pub struct SearchEngine<P: Position, O: Oracle<P>, R: Rng> {
    config: SearchConfig,
    oracle: O,
    rng: R,
    _position: PhantomData<P>,
}

impl<P, O, R> SearchEngine<P, O, R>
where
    P: Position,
    O: Oracle<P>,
    R: Rng,
{
    /// Create a new search engine.
    pub fn new(config: SearchConfig, oracle: O, rng: R) -> Self {
        Self {
            config,
            oracle,
            rng,
            _position: PhantomData,
        }
    }

    /// Search with the simulation count and exploration constant from the
    /// engine's config.
    pub fn run(&mut self, root: &P) -> Result<SearchResult<P::Move>> {
        let simulations = self.config.num_simulations;
        let c = self.config.exploration_constant;
        self.search(root, simulations, c)
    }

    /// Run `num_simulations` simulations from `root`.
    ///
    /// Returns an empty result when `num_simulations` is zero or the root is
    /// terminal. Fails with [`Error::InvalidPosition`] if the root is
    /// malformed, and with [`Error::Evaluation`] once the oracle has failed
    /// more times in a row than the config tolerates.
    pub fn search(
        &mut self,
        root: &P,
        num_simulations: usize,
        exploration_constant: f32,
    ) -> Result<SearchResult<P::Move>> {
        root.validate()?;

        if let Some(outcome) = root.outcome() {
            return Ok(SearchResult::empty(outcome.value().get()));
        }
        if num_simulations == 0 {
            return Ok(SearchResult::empty(0.0));
        }

        let mut tree = Tree::new(root.clone());
        let mut failed = 0;

        // The root expansion counts as the root's first visit
        self.retrying(&mut failed, || {
            let value = self.expand(&mut tree, NodeId::ROOT)?;
            tree.backpropagate(NodeId::ROOT, value);
            Ok(())
        })?;

        self.add_root_noise(&mut tree);

        for _ in 0..num_simulations {
            self.retrying(&mut failed, || self.simulate(&mut tree, exploration_constant))?;
        }

        Ok(self.extract_results(&tree, failed))
    }

    /// Repeat `attempt` while it fails with an oracle error, up to the
    /// configured number of consecutive failures. Other errors pass through.
    fn retrying(&self, failed: &mut u32, mut attempt: impl FnMut() -> Result<()>) -> Result<()> {
        let mut consecutive = 0;
        loop {
            match attempt() {
                Err(Error::Evaluation(err)) => {
                    *failed += 1;
                    consecutive += 1;
                    if consecutive > self.config.max_evaluation_retries {
                        return Err(Error::Evaluation(err));
                    }
                }
                other => return other,
            }
        }
    }

    /// Run a single simulation: select -> evaluate -> backpropagate.
    ///
    /// On error nothing has been written to the tree.
    fn simulate(&self, tree: &mut Tree<P>, exploration_constant: f32) -> Result<()> {
        let mut current = NodeId::ROOT;
        while tree.get(current).expanded {
            match self.select_child(tree, current, exploration_constant) {
                Some(child) => current = child,
                None => break,
            }
        }

        let value = match tree.get_mut(current).terminal_value() {
            Some(value) => value,
            None => self.expand(tree, current)?,
        };

        tree.backpropagate(current, value);
        Ok(())
    }

    /// Select the child maximising the PUCT score, first on ties.
    fn select_child(&self, tree: &Tree<P>, node_id: NodeId, c: f32) -> Option<NodeId> {
        let node = tree.get(node_id);
        let side = node.position.side_to_move();
        let sqrt_parent = (node.stats.visit_count as f32).sqrt();
        let eps = self.config.value_epsilon;

        let mut best = None;
        let mut best_score = f32::NEG_INFINITY;

        for &child_id in &node.children {
            let child = tree.get(child_id);
            let stats = &child.stats;

            // Child values are stored from the child's side to move
            let q = if child.position.side_to_move() == side {
                stats.mean_value(eps)
            } else {
                -stats.mean_value(eps)
            };
            let u = c * stats.prior * sqrt_parent / (1.0 + stats.visit_count as f32);

            let score = q + u;
            if best.is_none() || score > best_score {
                best_score = score;
                best = Some(child_id);
            }
        }

        best
    }

    /// Expand a leaf: ask the oracle, create one child per legal move and
    /// return the oracle's value clamped to [-1, 1].
    ///
    /// The tree is only touched once the evaluation has been accepted.
    fn expand(&self, tree: &mut Tree<P>, node_id: NodeId) -> Result<Value> {
        let node = tree.get(node_id);
        if node.expanded {
            return Err(Error::InvalidPosition("node is already expanded".into()));
        }

        let position = &node.position;
        let evaluation = self.oracle.evaluate(position, position.recent_moves())?;
        evaluation.check(P::NUM_ACTIONS)?;

        let legal = position.legal_moves();
        if legal.is_empty() {
            return Err(Error::InvalidPosition(
                "position has no legal moves but no outcome".into(),
            ));
        }

        let priors = prior_distribution(
            position,
            &legal,
            &evaluation.policy,
            self.config.unknown_prior,
        );
        let path = tree.path_hashes(node_id);

        let children: Vec<Node<P>> = legal
            .iter()
            .zip(priors)
            .map(|(&mv, prior)| {
                let child = position.apply_move(mv);
                let hash = child.structural_hash();
                let occurrences = path.iter().filter(|&&h| h == hash).count();
                let prior = prior * self.config.repetition_damping(occurrences);
                Node::child(child, mv, node_id, prior)
            })
            .collect();

        for child in children {
            tree.add_child(node_id, child);
        }
        tree.get_mut(node_id).expanded = true;

        Ok(Value::clamped(evaluation.value))
    }

    /// Mix Dirichlet noise into the root priors, if configured.
    fn add_root_noise(&mut self, tree: &mut Tree<P>) {
        let Some(noise) = self.config.root_noise else {
            return;
        };
        let children = tree.root().children.clone();

        // Dirichlet requires at least 2 elements
        if children.len() < 2 || noise.fraction <= 0.0 {
            return;
        }

        let alpha = vec![noise.alpha; children.len()];
        let Ok(dirichlet) = Dirichlet::new(&alpha) else {
            return;
        };
        let sample: Vec<f32> = dirichlet.sample(&mut self.rng);

        for (&child_id, eta) in children.iter().zip(sample) {
            let stats = &mut tree.get_mut(child_id).stats;
            stats.prior = (1.0 - noise.fraction) * stats.prior + noise.fraction * eta;
        }
    }

    /// Extract search results from root node.
    fn extract_results(&self, tree: &Tree<P>, failed_evaluations: u32) -> SearchResult<P::Move> {
        let root = tree.root();
        let side = root.position.side_to_move();

        let visit_counts: Vec<(P::Move, u32)> = root
            .children
            .iter()
            .filter_map(|&id| {
                let child = tree.get(id);
                child.mv.map(|mv| (mv, child.stats.visit_count))
            })
            .collect();

        let total: u32 = visit_counts.iter().map(|&(_, n)| n).sum();

        let mut distribution: Vec<(P::Move, f32)> = visit_counts
            .iter()
            .map(|&(mv, n)| {
                let fraction = if total > 0 { n as f32 / total as f32 } else { 0.0 };
                (mv, fraction)
            })
            .collect();
        // Stable sort keeps generation order among ties
        distribution.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        // Visit-weighted child values, seen from the root
        let root_value = if total > 0 {
            let weighted: f32 = root
                .children
                .iter()
                .map(|&id| {
                    let child = tree.get(id);
                    if child.position.side_to_move() == side {
                        child.stats.value_sum
                    } else {
                        -child.stats.value_sum
                    }
                })
                .sum();
            weighted / total as f32
        } else {
            root.stats.mean_value(self.config.value_epsilon)
        };

        SearchResult {
            distribution,
            visit_counts,
            root_value,
            tree_size: tree.len(),
            failed_evaluations,
        }
    }
}

/// Prior for each legal move, in the same order.
///
/// Each move reads the oracle's entry at its action index. Moves without an
/// index, or with a negative or non-finite entry, get `unknown_prior`. The
/// result is renormalised to sum to 1, falling back to uniform when the raw
/// mass is negligible.
pub fn prior_distribution<P: Position>(
    position: &P,
    legal: &[P::Move],
    policy: &[f32],
    unknown_prior: f32,
) -> Vec<f32> {
    let raw: Vec<f32> = legal
        .iter()
        .map(|&mv| {
            position
                .action_index(mv)
                .and_then(|i| policy.get(i).copied())
                .filter(|p| p.is_finite() && *p >= 0.0)
                .unwrap_or(unknown_prior)
        })
        .collect();

    let total: f32 = raw.iter().sum();
    if total > 1e-8 {
        raw.into_iter().map(|p| p / total).collect()
    } else {
        vec![1.0 / legal.len().max(1) as f32; legal.len()]
    }
}
