/// Stochastic mechanics: RNG helpers for latency, error injection and noise.
/// Note: generic over `RngCore`; callers own a seeded `bevy_prng::WyRand`
/// so every stochastic decision is reproducible from its seed.
use rand_core::RngCore;

/// Uniform [0, 1) with 53 bits of precision.
#[inline]
pub fn unit<R: RngCore>(rng: &mut R) -> f64 {
    ((rng.next_u64() >> 11) as f64) / ((1u64 << 53) as f64)
}

/// Uniform in [lo, hi]; degenerate ranges collapse to `lo`.
#[inline]
pub fn uniform<R: RngCore>(rng: &mut R, lo: f64, hi: f64) -> f64 {
    if hi <= lo {
        return lo;
    }
    lo + (hi - lo) * unit(rng)
}

/// Gaussian(0,1) via Box–Muller.
#[inline]
pub fn gaussian01<R: RngCore>(rng: &mut R) -> f64 {
    let u1 = unit(rng).max(f64::MIN_POSITIVE);
    let u2 = unit(rng);
    let r = (-2.0 * u1.ln()).sqrt();
    let t = 2.0 * std::f64::consts::PI * u2;
    r * t.cos()
}

/// Bernoulli(p).
#[inline]
pub fn bernoulli<R: RngCore>(rng: &mut R, p: f64) -> bool {
    unit(rng) < p.clamp(0.0, 1.0)
}

/// Uniform index in 0..n (n > 0).
#[inline]
pub fn index<R: RngCore>(rng: &mut R, n: usize) -> usize {
    ((unit(rng) * n as f64) as usize).min(n.saturating_sub(1))
}

/// ±1 with equal odds.
#[inline]
pub fn sign<R: RngCore>(rng: &mut R) -> f64 {
    if bernoulli(rng, 0.5) { 1.0 } else { -1.0 }
}

/// Multiplicative jitter: clamp(1 + N(0,1) * jitter, lo, hi).
#[inline]
pub fn jitter<R: RngCore>(rng: &mut R, jitter: f64, lo: f64, hi: f64) -> f64 {
    (1.0 + gaussian01(rng) * jitter).clamp(lo, hi)
}
