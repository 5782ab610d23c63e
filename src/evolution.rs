//! Selection and reproduction.

use crate::config::{Config, ConfigError};
use crate::individual::Individual;
use crate::output::{OutputSink, Series};
use crate::random::{ParentSampler, RandomSource};
use crate::stats::CellTable;
use rand::Rng;
use rand_distr::Normal;

/// Evolution engine turning one generation into the next
#[derive(Clone, Debug)]
pub struct EvolutionEngine {
    pub mutation_rate: f64,
    pub dispersal: f64,
    pub tradeoff: f64,
    mutation: Normal<f64>,
}

impl EvolutionEngine {
    pub fn new(mutation_rate: f64, mutation_sd: f64, dispersal: f64, tradeoff: f64) -> Result<Self, ConfigError> {
        // Normal::new accepts a negative standard deviation
        if !(mutation_sd >= 0.0 && mutation_sd.is_finite()) {
            return Err(ConfigError::Invalid {
                field: "evolution.mutation_sd",
                constraint: "must be positive".to_string(),
            });
        }
        let mutation = Normal::new(0.0, mutation_sd).map_err(|e| ConfigError::Invalid {
            field: "evolution.mutation_sd",
            constraint: e.to_string(),
        })?;
        Ok(Self {
            mutation_rate,
            dispersal,
            tradeoff,
            mutation,
        })
    }

    /// Create evolution engine from config
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Self::new(
            config.evolution.mutation_rate,
            config.evolution.mutation_sd,
            config.evolution.dispersal,
            config.population.tradeoff,
        )
    }

    /// Produce one offspring from `parent`
    pub fn offspring<R: Rng>(&self, parent: &Individual, random: &mut RandomSource<R>) -> Individual {
        let mut child = parent.clone();
        child.be_born();
        if random.bernoulli(self.mutation_rate) {
            child.mutate(random.gaussian(&self.mutation), self.tradeoff);
        }
        if random.bernoulli(self.dispersal) {
            child.disperse();
        }
        child
    }

    /// Fill `newborns` with as many offspring as there are `adults`, parents
    /// drawn with replacement in proportion to `fitness`.
    ///
    /// Every adult is killed along the way and described in the returned
    /// table. Per-adult series go to `sink` when `sampled` is set.
    pub fn reproduce<R, S>(
        &self,
        adults: &mut [Individual],
        newborns: &mut Vec<Individual>,
        fitness: &[f64],
        random: &mut RandomSource<R>,
        sink: &mut S,
        sampled: bool,
    ) -> CellTable
    where
        R: Rng,
        S: OutputSink + ?Sized,
    {
        debug_assert_eq!(adults.len(), fitness.len());
        debug_assert!(newborns.is_empty());

        let sampler = ParentSampler::new(fitness);
        if sampler.is_uniform() {
            log::debug!("No food found this step, sampling parents uniformly");
        }

        newborns.reserve(adults.len());
        let mut table = CellTable::new();

        for i in 0..adults.len() {
            let parent = random.discrete(&sampler);
            newborns.push(self.offspring(&adults[parent], random));

            let adult = &mut adults[i];
            adult.kill();
            table.record(adult.habitat(), adult.ecotype(), adult.trait_value());

            if sampled {
                sink.save(Series::IndividualHabitat, adult.habitat() as u8 as f64);
                sink.save(Series::IndividualTraitValue, adult.trait_value());
                sink.save(Series::IndividualTotalFitness, fitness[i]);
                sink.save(Series::IndividualEcotype, adult.ecotype() as u8 as f64);
            }
        }

        debug_assert_eq!(newborns.len(), adults.len());
        table
    }
}
