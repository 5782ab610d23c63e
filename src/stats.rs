//! Isolation statistics computed once per time step.
//!
//! Both statistics are pure functions of a habitat × ecotype table of counts,
//! trait sums and trait sums of squares.

/// Variances closer to zero than this are floating-point noise
pub const PRECISION: f64 = 1e-6;

/// Counts and trait moments per habitat × ecotype cell, indexed `[habitat][ecotype]`
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CellTable {
    pub n: [[usize; 2]; 2],
    pub sum: [[f64; 2]; 2],
    pub sum_sq: [[f64; 2]; 2],
}

impl CellTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one individual to a cell
    pub fn record(&mut self, habitat: bool, ecotype: bool, trait_value: f64) {
        let (h, e) = (habitat as usize, ecotype as usize);
        self.n[h][e] += 1;
        self.sum[h][e] += trait_value;
        self.sum_sq[h][e] += trait_value * trait_value;
    }

    pub fn total(&self) -> usize {
        self.n[0][0] + self.n[0][1] + self.n[1][0] + self.n[1][1]
    }

    /// Individuals in a habitat
    pub fn habitat_count(&self, habitat: usize) -> usize {
        self.n[habitat][0] + self.n[habitat][1]
    }

    /// Mean trait in a habitat, 0 if empty
    pub fn habitat_mean(&self, habitat: usize) -> f64 {
        let n = self.habitat_count(habitat);
        if n == 0 {
            0.0
        } else {
            (self.sum[habitat][0] + self.sum[habitat][1]) / n as f64
        }
    }

    /// Mean trait over the whole table, 0 if empty
    pub fn mean(&self) -> f64 {
        let n = self.total();
        if n == 0 {
            0.0
        } else {
            self.sum.iter().flatten().sum::<f64>() / n as f64
        }
    }

    /// Population trait standard deviation
    pub fn standard_deviation(&self) -> f64 {
        let n = self.total();
        if n == 0 {
            return 0.0;
        }
        let sum: f64 = self.sum.iter().flatten().sum();
        let sum_sq: f64 = self.sum_sq.iter().flatten().sum();
        variance(n, sum, sum_sq).sqrt()
    }

    pub fn ecological_isolation(&self) -> f64 {
        ecological_isolation(&self.n, &self.sum, &self.sum_sq)
    }

    pub fn spatial_isolation(&self) -> f64 {
        spatial_isolation(&self.n)
    }
}

/// Set values within [`PRECISION`] of zero to exactly zero
fn correct(x: f64) -> f64 {
    if x.abs() < PRECISION {
        0.0
    } else {
        x
    }
}

/// Population variance from count, sum and sum of squares
fn variance(n: usize, sum: f64, sum_sq: f64) -> f64 {
    let n = n as f64;
    let mean = sum / n;
    correct(sum_sq / n - mean * mean)
}

/// Ecological isolation: share of trait variance explained by ecotype.
///
/// `EI = 1 - (n1 var1 + n2 var2) / (n0 var0)` where 1 and 2 are the ecotypes
/// pooled across habitats. Zero when either ecotype is empty or the
/// population has no variance.
pub fn ecological_isolation(n: &[[usize; 2]; 2], sum: &[[f64; 2]; 2], sum_sq: &[[f64; 2]; 2]) -> f64 {
    let n1 = n[0][0] + n[1][0];
    let n2 = n[0][1] + n[1][1];
    let n0 = n1 + n2;

    if n1 == 0 || n2 == 0 {
        return 0.0;
    }

    let var0 = variance(
        n0,
        sum[0][0] + sum[0][1] + sum[1][0] + sum[1][1],
        sum_sq[0][0] + sum_sq[0][1] + sum_sq[1][0] + sum_sq[1][1],
    );
    let var1 = variance(n1, sum[0][0] + sum[1][0], sum_sq[0][0] + sum_sq[1][0]);
    let var2 = variance(n2, sum[0][1] + sum[1][1], sum_sq[0][1] + sum_sq[1][1]);

    debug_assert!(var0 >= 0.0 && var1 >= 0.0 && var2 >= 0.0);

    if var0 <= 0.0 {
        return 0.0;
    }

    let within = n1 as f64 * var1 + n2 as f64 * var2;
    let total = n0 as f64 * var0;
    debug_assert!(
        within <= total * (1.0 + 1e-9) + 1e-9,
        "within-ecotype variance exceeds total: {} > {}",
        within,
        total
    );

    (1.0 - within / total).clamp(0.0, 1.0)
}

/// Spatial isolation: association between habitat and ecotype.
///
/// `SI = |n11 n22 - n12 n21| / sqrt(n1. n2. n.1 n.2)`, zero when any margin
/// is empty.
pub fn spatial_isolation(n: &[[usize; 2]; 2]) -> f64 {
    let n11 = n[0][0] as f64;
    let n12 = n[0][1] as f64;
    let n21 = n[1][0] as f64;
    let n22 = n[1][1] as f64;

    let prod = (n11 + n12) * (n21 + n22) * (n11 + n21) * (n12 + n22);
    if prod == 0.0 {
        return 0.0;
    }

    // Cross products are kept as separate intermediates
    let a = n11 * n22;
    let b = n12 * n21;
    let si = ((a - b) / prod.sqrt()).abs();

    debug_assert!(
        (0.0..=1.0 + PRECISION).contains(&si),
        "spatial isolation out of range: {}",
        si
    );

    si.min(1.0)
}

/// Population summary of one time step
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepSummary {
    pub time: u64,
    pub mean_trait: f64,
    pub trait_sd: f64,
    pub ecological_isolation: f64,
    pub spatial_isolation: f64,
    pub habitat_census: [usize; 2],
}

impl StepSummary {
    pub fn from_table(time: u64, table: &CellTable) -> Self {
        Self {
            time,
            mean_trait: table.mean(),
            trait_sd: table.standard_deviation(),
            ecological_isolation: table.ecological_isolation(),
            spatial_isolation: table.spatial_isolation(),
            habitat_census: [table.habitat_count(0), table.habitat_count(1)],
        }
    }

    /// Format as a one-line summary
    pub fn summary(&self) -> String {
        format!(
            "t = {}, meanx = {:.4}, EI = {:.4}, SI = {:.4}",
            self.time, self.mean_trait, self.ecological_isolation, self.spatial_isolation
        )
    }
}
