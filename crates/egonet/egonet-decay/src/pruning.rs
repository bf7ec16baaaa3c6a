/// Weak-edge pruning rule.
///
/// An edge is pruned when its tie strength is strictly below the threshold;
/// an edge scoring exactly the threshold survives.
pub fn should_prune(tie_strength: f64, threshold: f64) -> bool {
    tie_strength < threshold
}

/// Pruning decision with metadata for logging.
#[derive(Debug, Clone, PartialEq)]
pub struct PruneDecision {
    pub src: String,
    pub dst: String,
    pub tie_strength: f64,
    pub threshold: f64,
    pub prune: bool,
}

/// Evaluate one edge against `threshold`.
pub fn evaluate(src: &str, dst: &str, tie_strength: f64, threshold: f64) -> PruneDecision {
    PruneDecision {
        src: src.to_string(),
        dst: dst.to_string(),
        tie_strength,
        threshold,
        prune: should_prune(tie_strength, threshold),
    }
}
