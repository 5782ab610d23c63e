//! The feeding market: several rounds of sequential resource choice and
//! competitive sharing within each habitat.

use crate::config::Config;
use crate::individual::Individual;
use crate::output::{OutputSink, Series};
use crate::random::RandomSource;
use rand::Rng;

/// Amount of resource found by a group with total efficiency `effort`.
///
/// Saturates towards `amount` as effort grows; zero when any input is zero.
pub fn discover(amount: f64, delta: f64, effort: f64) -> f64 {
    if amount == 0.0 || delta == 0.0 || effort == 0.0 {
        return 0.0;
    }
    amount * (1.0 - (-delta * effort).exp())
}

/// Share of `discovered` obtained by a feeder of efficiency `efficiency`
/// among `feeders` feeders of total efficiency `effort`.
///
/// When nobody is efficient the food is split evenly.
pub fn share(discovered: f64, efficiency: f64, effort: f64, feeders: usize) -> f64 {
    if effort == 0.0 {
        if feeders == 0 {
            return 0.0;
        }
        return discovered / feeders as f64;
    }
    discovered * efficiency / effort
}

/// Running totals for each habitat × resource cell during a round
#[derive(Clone, Debug, Default)]
struct Cells {
    effort: [[f64; 2]; 2],
    feeders: [[usize; 2]; 2],
    trait_sum: [[f64; 2]; 2],
}

impl Cells {
    fn add(&mut self, habitat: usize, resource: usize, efficiency: f64, trait_value: f64) {
        self.effort[habitat][resource] += efficiency;
        self.feeders[habitat][resource] += 1;
        self.trait_sum[habitat][resource] += trait_value;
    }

    fn mean_trait(&self, habitat: usize, resource: usize) -> f64 {
        match self.feeders[habitat][resource] {
            0 => 0.0,
            n => self.trait_sum[habitat][resource] / n as f64,
        }
    }

    fn total_trait(&self) -> f64 {
        self.trait_sum.iter().flatten().sum()
    }
}

/// Resource pools and foraging parameters
#[derive(Clone, Debug, PartialEq)]
pub struct Market {
    /// Pool sizes, indexed `[habitat][resource]`
    resources: [[f64; 2]; 2],
    alpha: f64,
    beta: f64,
    delta: f64,
    rounds: usize,
}

impl Market {
    pub fn new(habitat_symmetry: f64, alpha: f64, beta: f64, delta: f64, rounds: usize) -> Self {
        Self {
            resources: [[1.0, habitat_symmetry], [habitat_symmetry, 1.0]],
            alpha,
            beta,
            delta,
            rounds,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let f = &config.feeding;
        Self::new(f.habitat_symmetry, f.alpha, f.beta, f.delta, f.rounds)
    }

    pub fn resources(&self) -> &[[f64; 2]; 2] {
        &self.resources
    }

    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Run every feeding round of a time step.
    ///
    /// Adds each individual's food to `fitness` (indexed like `individuals`)
    /// and assigns ecotypes during the first round. Per-round series are sent
    /// to `sink` when `sampled` is set.
    pub fn feed<R, S>(
        &self,
        individuals: &mut [Individual],
        fitness: &mut [f64],
        random: &mut RandomSource<R>,
        sink: &mut S,
        sampled: bool,
    ) where
        R: Rng,
        S: OutputSink + ?Sized,
    {
        debug_assert_eq!(individuals.len(), fitness.len());

        let mut order: Vec<usize> = (0..individuals.len()).collect();
        for round in 0..self.rounds {
            self.round(individuals, fitness, &mut order, round == 0, random, sink, sampled);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn round<R, S>(
        &self,
        individuals: &mut [Individual],
        fitness: &mut [f64],
        order: &mut [usize],
        first: bool,
        random: &mut RandomSource<R>,
        sink: &mut S,
        sampled: bool,
    ) where
        R: Rng,
        S: OutputSink + ?Sized,
    {
        random.shuffle(order);

        let mut cells = Cells::default();

        for (rank, &i) in order.iter().enumerate() {
            let ind = &mut individuals[i];
            ind.set_rank(rank);

            let h = ind.habitat() as usize;
            let [fit1, fit2] = [false, true].map(|resource| {
                let k = resource as usize;
                let eff = ind.efficiency(resource);
                let effort = cells.effort[h][k] + eff;
                let found = discover(self.resources[h][k], self.delta, effort);
                debug_assert!(found >= 0.0 && found <= self.resources[h][k]);
                share(found, eff, effort, cells.feeders[h][k] + 1)
            });
            debug_assert!(fit1 >= 0.0 && fit2 >= 0.0);

            ind.set_expected_fitness_gap(fit2 - fit1);

            let p = Individual::best_probability_for(
                fit1,
                fit2,
                self.alpha,
                self.beta,
                self.resources[h][0],
                self.resources[h][1],
            );
            let accept_best = random.bernoulli(p);
            ind.make_choice(fit1, fit2, accept_best);

            let choice = ind.choice();
            cells.add(h, choice as usize, ind.efficiency(choice), ind.trait_value());
        }

        if sampled {
            for h in 0..2 {
                for k in 0..2 {
                    sink.save(Series::ResourceCensus, cells.feeders[h][k] as f64);
                    sink.save(Series::ResourceMeanTraitValue, cells.mean_trait(h, k));
                }
            }
        }

        let mut discovered = [[0.0; 2]; 2];
        for (h, row) in discovered.iter_mut().enumerate() {
            for (k, found) in row.iter_mut().enumerate() {
                *found = discover(self.resources[h][k], self.delta, cells.effort[h][k]);
            }
        }

        let mean_trait = cells.total_trait() / individuals.len() as f64;

        for (ind, total) in individuals.iter_mut().zip(fitness.iter_mut()) {
            let h = ind.habitat() as usize;
            let choice = ind.choice();
            let k = choice as usize;

            let food = share(
                discovered[h][k],
                ind.efficiency(choice),
                cells.effort[h][k],
                cells.feeders[h][k],
            );
            debug_assert!(food >= 0.0);
            *total += food;

            if sampled {
                sink.save(Series::IndividualExpectedFitnessDifference, ind.expected_fitness_gap());
                sink.save(Series::IndividualChoice, k as f64);
                sink.save(Series::IndividualRealizedFitness, food);
                sink.save(Series::IndividualRank, ind.rank() as f64);
            }

            if first {
                ind.set_ecotype(mean_trait);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{MemorySink, NullSink};
    use proptest::prelude::*;

    fn population(traits: &[f64], tradeoff: f64) -> Vec<Individual> {
        traits.iter().map(|x| Individual::new(*x, tradeoff)).collect()
    }

    #[test]
    fn test_discover_edge_cases() {
        assert_eq!(discover(0.0, 1.0, 1.0), 0.0);
        assert_eq!(discover(1.0, 0.0, 1.0), 0.0);
        assert_eq!(discover(1.0, 1.0, 0.0), 0.0);
        assert_eq!(discover(1.0, 1e6, 100.0), 1.0);
        assert!((discover(2.0, 1.0, 1.0) - 2.0 * (1.0 - (-1.0f64).exp())).abs() < 1e-12);
    }

    #[test]
    fn test_share_edge_cases() {
        assert_eq!(share(1.0, 0.0, 0.0, 10), 0.1);
        assert_eq!(share(1.0, 0.0, 0.0, 0), 0.0);
        assert_eq!(share(1.0, 1.0, 1.0, 1), 1.0);
        assert_eq!(share(1.0, 1.0, 4.0, 3), 0.25);
    }

    #[test]
    fn test_resource_matrix() {
        let market = Market::new(0.3, 0.0, 1.0, 1.0, 1);
        assert_eq!(market.resources(), &[[1.0, 0.3], [0.3, 1.0]]);
    }

    #[test]
    fn test_full_accuracy_picks_best_resource() {
        let market = Market::new(0.7, 0.5, 1.0, 1.0, 3);
        let mut individuals = population(&[-1.2, -0.5, 0.0, 0.1, 0.8, 1.5, 2.0], 1.0);
        individuals[2].disperse();
        individuals[5].disperse();
        let mut fitness = vec![0.0; individuals.len()];
        let mut random = RandomSource::seeded(11);

        market.feed(&mut individuals, &mut fitness, &mut random, &mut NullSink, false);

        for ind in &individuals {
            // Last round's choice must follow the last recorded gap
            assert_eq!(ind.choice(), ind.expected_fitness_gap() > 0.0);
        }
    }

    #[test]
    fn test_specialists_take_their_resource() {
        let market = Market::new(0.5, 0.0, 1.0, 1.0, 1);
        let mut individuals = population(&[-1.0; 5], 1.0);
        let mut fitness = vec![0.0; 5];
        let mut random = RandomSource::seeded(3);

        market.feed(&mut individuals, &mut fitness, &mut random, &mut NullSink, false);

        assert!(individuals.iter().all(|ind| !ind.choice()));
        // Equal efficiencies split the discovered food evenly
        let expected = (1.0 - (-5.0f64).exp()) / 5.0;
        for f in &fitness {
            assert!((f - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_ranks_form_a_permutation() {
        let market = Market::new(1.0, 0.0, 0.5, 1.0, 2);
        let mut individuals = population(&[0.0; 6], 1.0);
        let mut fitness = vec![0.0; 6];
        let mut random = RandomSource::seeded(5);

        market.feed(&mut individuals, &mut fitness, &mut random, &mut NullSink, false);

        let mut ranks: Vec<usize> = individuals.iter().map(Individual::rank).collect();
        ranks.sort_unstable();
        assert_eq!(ranks, (0..6).collect::<Vec<_>>());
    }

    #[test]
    fn test_ecotypes_set_against_mean() {
        let market = Market::new(1.0, 0.0, 1.0, 1.0, 2);
        let mut individuals = population(&[-1.0, -0.5, 0.5, 1.0], 1.0);
        let mut fitness = vec![0.0; 4];
        let mut random = RandomSource::seeded(9);

        market.feed(&mut individuals, &mut fitness, &mut random, &mut NullSink, false);

        let ecotypes: Vec<bool> = individuals.iter().map(Individual::ecotype).collect();
        assert_eq!(ecotypes, vec![false, false, true, true]);
    }

    #[test]
    fn test_sampled_round_output_counts() {
        let market = Market::new(1.0, 0.0, 1.0, 1.0, 2);
        let mut individuals = population(&[0.0; 5], 1.0);
        let mut fitness = vec![0.0; 5];
        let mut random = RandomSource::seeded(1);
        let mut sink = MemorySink::new();

        market.feed(&mut individuals, &mut fitness, &mut random, &mut sink, true);

        assert_eq!(sink.len(Series::ResourceCensus), 8);
        assert_eq!(sink.len(Series::ResourceMeanTraitValue), 8);
        assert_eq!(sink.len(Series::IndividualChoice), 10);
        assert_eq!(sink.len(Series::IndividualRank), 10);
        assert_eq!(sink.len(Series::IndividualRealizedFitness), 10);
        assert_eq!(sink.len(Series::IndividualExpectedFitnessDifference), 10);

        // Everyone lives in the first habitat
        let census = sink.values(Series::ResourceCensus);
        assert_eq!(census[0] + census[1], 5.0);
        assert_eq!(census[2] + census[3], 0.0);
    }

    #[test]
    fn test_unsampled_rounds_emit_nothing() {
        let market = Market::new(1.0, 0.0, 1.0, 1.0, 2);
        let mut individuals = population(&[0.0; 3], 1.0);
        let mut fitness = vec![0.0; 3];
        let mut sink = MemorySink::new();

        market.feed(&mut individuals, &mut fitness, &mut RandomSource::seeded(1), &mut sink, false);

        assert!(sink.is_empty());
    }

    proptest! {
        #[test]
        fn prop_discover_bounded(
            amount in 0.0f64..10.0,
            delta in 0.0f64..100.0,
            effort in 0.0f64..1000.0,
        ) {
            let found = discover(amount, delta, effort);
            prop_assert!(found >= 0.0);
            prop_assert!(found <= amount);
        }

        #[test]
        fn prop_share_non_negative(
            discovered in 0.0f64..10.0,
            efficiency in 0.0f64..1.0,
            others in 0.0f64..50.0,
            feeders in 0usize..50,
        ) {
            let effort = efficiency + others;
            let food = share(discovered, efficiency, effort, feeders);
            prop_assert!(food >= 0.0);
            prop_assert!(food <= discovered + 1e-12);
        }

        #[test]
        fn prop_food_never_exceeds_resources(
            cells in prop::collection::vec((-2.0f64..2.0, any::<bool>()), 1..30),
            symmetry in 0.0f64..=1.0,
            alpha in 0.0f64..=1.0,
            beta in 0.0f64..=1.0,
            seed in any::<u64>(),
        ) {
            let rounds = 3;
            let n = cells.len();
            let market = Market::new(symmetry, alpha, beta, 1.0, rounds);
            let mut individuals: Vec<Individual> = cells
                .iter()
                .map(|&(x, moved)| {
                    let mut ind = Individual::new(x, 1.0);
                    if moved {
                        ind.disperse();
                    }
                    ind
                })
                .collect();
            let mut fitness = vec![0.0; n];
            let mut sink = MemorySink::new();
            let mut random = RandomSource::seeded(seed);

            market.feed(&mut individuals, &mut fitness, &mut random, &mut sink, true);

            let food = sink.values(Series::IndividualRealizedFitness);
            let choice = sink.values(Series::IndividualChoice);
            prop_assert_eq!(food.len(), rounds * n);
            prop_assert!(food.iter().all(|f| *f >= 0.0));

            // Within a round, the food shared in a cell never exceeds its pool
            for (round_food, round_choice) in food.chunks(n).zip(choice.chunks(n)) {
                let mut eaten = [[0.0; 2]; 2];
                for ((ind, f), k) in individuals.iter().zip(round_food).zip(round_choice) {
                    eaten[ind.habitat() as usize][*k as usize] += f;
                }
                for h in 0..2 {
                    for k in 0..2 {
                        prop_assert!(eaten[h][k] <= market.resources()[h][k] + 1e-9);
                    }
                }
            }
        }
    }
}
