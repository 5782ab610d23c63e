//! The population life cycle: feeding, reproduction and census, one time
//! step at a time.

use crate::config::{Config, ConfigError};
use crate::evolution::EvolutionEngine;
use crate::individual::{Habitat, Individual};
use crate::market::Market;
use crate::output::{OutputSink, Series};
use crate::random::RandomSource;
use crate::stats::StepSummary;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// Two generation buffers; `active` holds the current adults.
#[derive(Clone, Debug)]
struct Generations {
    buffers: [Vec<Individual>; 2],
    active: usize,
}

impl Generations {
    fn new(founders: Vec<Individual>) -> Self {
        let capacity = founders.len();
        Self {
            buffers: [founders, Vec::with_capacity(capacity)],
            active: 0,
        }
    }

    fn adults(&self) -> &[Individual] {
        &self.buffers[self.active]
    }

    /// Current adults and the spare buffer for their offspring
    fn split_mut(&mut self) -> (&mut [Individual], &mut Vec<Individual>) {
        let [first, second] = &mut self.buffers;
        if self.active == 0 {
            (first.as_mut_slice(), second)
        } else {
            (second.as_mut_slice(), first)
        }
    }

    /// Newborns become adults; the old adults are dropped
    fn turnover(&mut self) {
        self.active = 1 - self.active;
        self.buffers[1 - self.active].clear();
    }
}

/// A fixed-size population evolving in two habitats
pub struct Population<R = ChaCha8Rng> {
    generations: Generations,
    fitness: Vec<f64>,
    market: Market,
    evolution: EvolutionEngine,
    random: RandomSource<R>,

    size: usize,
    horizon: u64,
    save_interval: u64,
    verbose: bool,

    time: u64,
}

impl Population<ChaCha8Rng> {
    /// Create a population with its own seeded random stream
    pub fn with_seed(config: &Config, seed: u64) -> Result<Self, ConfigError> {
        Self::new(config, RandomSource::seeded(seed))
    }
}

impl<R: Rng> Population<R> {
    /// Create a population of identical founders in the first habitat
    pub fn new(config: &Config, random: RandomSource<R>) -> Result<Self, ConfigError> {
        config.validate()?;

        let size = config.population.size;
        let founders = (0..size)
            .map(|_| Individual::new(config.population.initial_trait, config.population.tradeoff))
            .collect();

        Ok(Self {
            generations: Generations::new(founders),
            fitness: vec![0.0; size],
            market: Market::from_config(config),
            evolution: EvolutionEngine::from_config(config)?,
            random,
            size,
            horizon: config.run.horizon,
            save_interval: config.run.save_interval,
            verbose: config.logging.verbose,
            time: 0,
        })
    }

    /// Run one full life cycle and move time forward.
    ///
    /// Series are sent to `sink` only on sampled steps, when the sink is on
    /// and the time is a multiple of the save interval.
    pub fn advance_one_step<S: OutputSink + ?Sized>(&mut self, sink: &mut S) -> StepSummary {
        let sampled = sink.is_on() && self.time % self.save_interval == 0;
        if sampled {
            sink.save(Series::Time, self.time as f64);
        }

        self.fitness.iter_mut().for_each(|f| *f = 0.0);

        let (adults, newborns) = self.generations.split_mut();
        debug_assert_eq!(adults.len(), self.size);

        self.market
            .feed(adults, &mut self.fitness, &mut self.random, sink, sampled);

        let table = self.evolution.reproduce(
            adults,
            newborns,
            &self.fitness,
            &mut self.random,
            sink,
            sampled,
        );

        let summary = StepSummary::from_table(self.time, &table);

        if sampled {
            for habitat in 0..2 {
                sink.save(Series::HabitatCensus, table.habitat_count(habitat) as f64);
                sink.save(Series::HabitatMeanTraitValue, table.habitat_mean(habitat));
            }
            sink.save(Series::EcologicalIsolation, summary.ecological_isolation);
            sink.save(Series::SpatialIsolation, summary.spatial_isolation);
            sink.save(Series::TraitStandardDeviation, summary.trait_sd);
        }

        if self.verbose {
            log::info!("{}", summary.summary());
        } else {
            log::debug!("{}", summary.summary());
        }

        self.generations.turnover();
        debug_assert_eq!(self.generations.adults().len(), self.size);

        self.time += 1;
        summary
    }

    pub fn time(&self) -> u64 {
        self.time
    }

    /// Whether the horizon is not yet passed
    pub fn keep_on(&self) -> bool {
        self.time <= self.horizon
    }

    pub fn is_done(&self) -> bool {
        !self.keep_on()
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn horizon(&self) -> u64 {
        self.horizon
    }

    pub fn market(&self) -> &Market {
        &self.market
    }

    /// Current adults
    pub fn individuals(&self) -> &[Individual] {
        self.generations.adults()
    }

    pub fn habitat(&self, i: usize) -> Habitat {
        self.individuals()[i].habitat()
    }

    pub fn trait_value(&self, i: usize) -> f64 {
        self.individuals()[i].trait_value()
    }

    /// Mean trait of the current adults
    pub fn mean_trait(&self) -> f64 {
        self.individuals().iter().map(Individual::trait_value).sum::<f64>() / self.size as f64
    }
}
