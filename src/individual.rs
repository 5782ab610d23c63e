//! Individual structure and choice behavior.

/// Which of the two resources
pub type Resource = bool;

/// Which of the two habitats
pub type Habitat = bool;

/// Feeding efficiency on a resource whose optimum lies at `optimum`
fn efficiency(trait_value: f64, optimum: f64, tradeoff: f64) -> f64 {
    (-tradeoff * (trait_value - optimum).powi(2)).exp()
}

/// Baseline probability of picking the better resource, before accuracy.
///
/// Blends a fair coin with the relative abundance of the better resource,
/// weighted by `alpha`.
pub fn baseline_probability(better_amount: f64, total_amount: f64, alpha: f64) -> f64 {
    let relative = if total_amount > 0.0 {
        better_amount / total_amount
    } else {
        0.5
    };
    0.5 * (1.0 - alpha) + alpha * relative
}

/// Probability of picking the better resource given choice accuracy `beta`
pub fn best_probability(baseline: f64, beta: f64) -> f64 {
    (1.0 - beta) * baseline + beta
}

/// An individual in the population
#[derive(Clone, Debug, PartialEq)]
pub struct Individual {
    trait_value: f64,
    eff1: f64,
    eff2: f64,

    habitat: Habitat,
    ecotype: bool,

    // Transient feeding state, overwritten every round
    choice: Resource,
    rank: usize,
    expected_fitness_gap: f64,

    alive: bool,
}

impl Individual {
    /// Create a founder in the first habitat
    pub fn new(trait_value: f64, tradeoff: f64) -> Self {
        let mut individual = Self {
            trait_value,
            eff1: 0.0,
            eff2: 0.0,
            habitat: false,
            ecotype: false,
            choice: false,
            rank: 0,
            expected_fitness_gap: 0.0,
            alive: true,
        };
        individual.develop(tradeoff);
        individual
    }

    /// Derive feeding efficiencies from the trait value.
    ///
    /// Resource 1 is best exploited at trait -1, resource 2 at trait +1.
    fn develop(&mut self, tradeoff: f64) {
        self.eff1 = efficiency(self.trait_value, -1.0, tradeoff);
        self.eff2 = efficiency(self.trait_value, 1.0, tradeoff);
        debug_assert!(self.eff1 >= 0.0 && self.eff2 >= 0.0);
    }

    /// Shift the trait value and re-derive efficiencies
    pub fn mutate(&mut self, effect: f64, tradeoff: f64) {
        self.trait_value += effect;
        self.develop(tradeoff);
    }

    /// Move to the other habitat
    pub fn disperse(&mut self) {
        self.habitat = !self.habitat;
    }

    /// Choose a resource given expected fitnesses and resource amounts.
    ///
    /// `accept_best` is the outcome of the Bernoulli draw with probability
    /// [`Individual::best_probability_for`]. Ties count resource 1 as the
    /// better one.
    pub fn make_choice(&mut self, fit1: f64, fit2: f64, accept_best: bool) {
        let best = fit2 > fit1;
        self.choice = if accept_best { best } else { !best };
    }

    /// Probability of picking the resource with the higher expected fitness
    pub fn best_probability_for(
        fit1: f64,
        fit2: f64,
        alpha: f64,
        beta: f64,
        amount1: f64,
        amount2: f64,
    ) -> f64 {
        let better_amount = if fit2 > fit1 { amount2 } else { amount1 };
        let baseline = baseline_probability(better_amount, amount1 + amount2, alpha);
        best_probability(baseline, beta)
    }

    /// Label the individual relative to the population mean trait
    pub fn set_ecotype(&mut self, mean_trait: f64) {
        self.ecotype = self.trait_value > mean_trait;
    }

    pub fn set_rank(&mut self, rank: usize) {
        self.rank = rank;
    }

    pub fn set_expected_fitness_gap(&mut self, gap: f64) {
        self.expected_fitness_gap = gap;
    }

    /// Mark the individual as replaced by the next generation
    pub fn kill(&mut self) {
        self.alive = false;
    }

    /// Mark a clone as a living newborn
    pub fn be_born(&mut self) {
        self.alive = true;
    }

    pub fn trait_value(&self) -> f64 {
        self.trait_value
    }

    /// Feeding efficiency on a resource
    pub fn efficiency(&self, resource: Resource) -> f64 {
        if resource {
            self.eff2
        } else {
            self.eff1
        }
    }

    pub fn habitat(&self) -> Habitat {
        self.habitat
    }

    pub fn ecotype(&self) -> bool {
        self.ecotype
    }

    pub fn choice(&self) -> Resource {
        self.choice
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn expected_fitness_gap(&self) -> f64 {
        self.expected_fitness_gap
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }
}
