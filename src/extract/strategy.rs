//! Priority-ordered fallback chains
//!
//! Every heuristic in the extractors is a pure `(input) -> Option<T>`
//! function. A [`StrategyChain`] tries them in order and stops at the first
//! one that produces a value; later strategies are never invoked.

/// A named extraction heuristic
pub struct Strategy<'a, I: ?Sized, T> {
    name: &'static str,
    apply: Box<dyn Fn(&'a I) -> Option<T> + 'a>,
}

impl<'a, I: ?Sized, T> Strategy<'a, I, T> {
    pub fn new(name: &'static str, apply: impl Fn(&'a I) -> Option<T> + 'a) -> Self {
        Self {
            name,
            apply: Box::new(apply),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Result of running a chain
#[derive(Debug, Clone, PartialEq)]
pub struct ChainOutcome<T> {
    /// Value produced by the winning strategy
    pub value: Option<T>,

    /// Name of the winning strategy
    pub strategy: Option<&'static str>,

    /// Number of strategies invoked, winner included
    pub attempts: usize,
}

impl<T> ChainOutcome<T> {
    pub fn is_miss(&self) -> bool {
        self.value.is_none()
    }
}

/// Ordered list of strategies tried until one succeeds
///
/// # Example
///
/// ```
/// use folio_harvest::extract::StrategyChain;
///
/// let chain = StrategyChain::new()
///     .with("even", |n: &u32| (n % 2 == 0).then(|| "even"))
///     .with("any", |_: &u32| Some("odd"));
///
/// let outcome = chain.run(&4);
/// assert_eq!(outcome.value, Some("even"));
/// assert_eq!(outcome.attempts, 1);
/// ```
pub struct StrategyChain<'a, I: ?Sized, T> {
    strategies: Vec<Strategy<'a, I, T>>,
}

impl<'a, I: ?Sized, T> StrategyChain<'a, I, T> {
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Appends a strategy with the lowest priority so far
    pub fn with(mut self, name: &'static str, apply: impl Fn(&'a I) -> Option<T> + 'a) -> Self {
        self.strategies.push(Strategy::new(name, apply));
        self
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Names in priority order
    pub fn names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(Strategy::name).collect()
    }

    /// Runs strategies in order, short-circuiting on the first `Some`
    pub fn run(&self, input: &'a I) -> ChainOutcome<T> {
        let mut attempts = 0;

        for strategy in &self.strategies {
            attempts += 1;
            if let Some(value) = (strategy.apply)(input) {
                tracing::trace!("Strategy '{}' matched after {} attempt(s)", strategy.name, attempts);
                return ChainOutcome {
                    value: Some(value),
                    strategy: Some(strategy.name),
                    attempts,
                };
            }
        }

        ChainOutcome {
            value: None,
            strategy: None,
            attempts,
        }
    }
}

impl<'a, I: ?Sized, T> Default for StrategyChain<'a, I, T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Turns an empty collection into `None` so it counts as a miss
pub fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}
