use std::sync::Arc;

/// Type alias for a JIT-compiled function that evaluates multiple expressions at once.
///
/// This represents a function that:
/// - Takes a slice of input values corresponding to the system's variables, in order
/// - Takes a mutable slice to store the results
/// - Evaluates every expression and writes results into the output slice
/// - Is both Send and Sync so seeds can be evaluated from a rayon pool
pub type CombinedJITFunction = Arc<dyn Fn(&[f64], &mut [f64]) + Send + Sync>;
