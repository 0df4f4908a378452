//! Distribution helpers over a uniform RNG

use rand::rngs::StdRng;
use rand::Rng;

/// Exponential with the given mean (inverse CDF)
pub fn exponential(rng: &mut StdRng, mean: f64) -> f64 {
    let u: f64 = rng.gen();
    -mean * (1.0 - u).ln()
}

/// Poisson via Knuth's multiplication method (fine for small lambda)
pub fn poisson(rng: &mut StdRng, lambda: f64) -> u64 {
    let limit = (-lambda).exp();
    let mut k = 0u64;
    let mut p = 1.0;
    loop {
        p *= rng.gen::<f64>();
        if p <= limit {
            return k;
        }
        k += 1;
    }
}

/// Normal via Box-Muller
pub fn normal(rng: &mut StdRng, mean: f64, std_dev: f64) -> f64 {
    let u1: f64 = rng.gen::<f64>().max(f64::MIN_POSITIVE);
    let u2: f64 = rng.gen();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    mean + std_dev * z
}

/// Round to `places` decimals
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

pub fn chance(rng: &mut StdRng, p: f64) -> bool {
    rng.gen::<f64>() < p
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_sample_means_are_close() {
        let mut rng = StdRng::seed_from_u64(42);
        let n = 20_000;

        let exp_mean = (0..n).map(|_| exponential(&mut rng, 8000.0)).sum::<f64>() / n as f64;
        assert!((exp_mean - 8000.0).abs() < 400.0, "exp mean {}", exp_mean);

        let poisson_mean = (0..n).map(|_| poisson(&mut rng, 15.0) as f64).sum::<f64>() / n as f64;
        assert!((poisson_mean - 15.0).abs() < 0.5, "poisson mean {}", poisson_mean);

        let normal_mean = (0..n).map(|_| normal(&mut rng, 5.5, 0.4)).sum::<f64>() / n as f64;
        assert!((normal_mean - 5.5).abs() < 0.05, "normal mean {}", normal_mean);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(5.4567, 2), 5.46);
        assert_eq!(round_to(120.04, 1), 120.0);
    }
}
