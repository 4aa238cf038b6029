//! Pure, non-allocating complex/real vector kernels (spec §4.1).
//!
//! Every function here takes its array length explicitly through the
//! slice and performs no allocation. Operations that tolerate `dst ==
//! src` document it; the rest require disjoint buffers and will produce
//! garbage (not a panic) if aliased.

use num_complex::Complex32;

pub type Cpx = Complex32;

/// Element-wise product: `dst[i] = a[i] * b[i]`. `dst` may alias `a` or `b`.
///
/// # Panics
/// If the three slices differ in length.
pub fn vec_prod(a: &[Cpx], b: &[Cpx], dst: &mut [Cpx]) {
    assert_eq!(a.len(), b.len());
    assert_eq!(a.len(), dst.len());
    for i in 0..a.len() {
        dst[i] = a[i] * b[i];
    }
}

/// Element-wise conjugate product: `dst[i] = a[i] * conj(b[i])`.
/// `dst` may alias `a` or `b`.
pub fn vec_prod_conj(a: &[Cpx], b: &[Cpx], dst: &mut [Cpx]) {
    assert_eq!(a.len(), b.len());
    assert_eq!(a.len(), dst.len());
    for i in 0..a.len() {
        dst[i] = a[i] * b[i].conj();
    }
}

/// Complex dot product `sum(a[i] * conj(b[i]))`.
pub fn dot_prod_conj(a: &[Cpx], b: &[Cpx]) -> Cpx {
    assert_eq!(a.len(), b.len());
    a.iter().zip(b.iter()).map(|(&x, &y)| x * y.conj()).sum()
}

/// Mean squared magnitude (average power) of a complex vector.
pub fn avg_power(x: &[Cpx]) -> f32 {
    if x.is_empty() {
        return 0.0;
    }
    x.iter().map(|c| c.norm_sqr()).sum::<f32>() / x.len() as f32
}

/// Arithmetic mean of a complex vector.
pub fn mean(x: &[Cpx]) -> Cpx {
    if x.is_empty() {
        return Cpx::new(0.0, 0.0);
    }
    x.iter().sum::<Cpx>() / x.len() as f32
}

/// Scaled addition: `dst[i] = a[i] + scale * b[i]`. `dst` may alias `a`.
pub fn axpy(a: &[Cpx], b: &[Cpx], scale: Cpx, dst: &mut [Cpx]) {
    assert_eq!(a.len(), b.len());
    assert_eq!(a.len(), dst.len());
    for i in 0..a.len() {
        dst[i] = a[i] + scale * b[i];
    }
}

/// Element-wise complex exponential `dst[i] = exp(j * phase[i])`, used
/// for CFO/window-offset phase correction. `dst` may alias `phase`'s
/// backing storage only if reinterpreted; in practice callers pass a
/// separate output buffer.
pub fn cexp(phase: &[f32], dst: &mut [Cpx]) {
    assert_eq!(phase.len(), dst.len());
    for i in 0..phase.len() {
        dst[i] = Cpx::new(phase[i].cos(), phase[i].sin());
    }
}

/// Apply a lookup-table permutation: `dst[i] = src[lut[i]]`. Requires
/// disjoint `src`/`dst` since every output position reads from a
/// potentially-already-overwritten input position.
///
/// # Panics
/// If any `lut` entry is out of range of `src`, or lengths mismatch.
pub fn lut_permute<T: Copy>(src: &[T], lut: &[usize], dst: &mut [T]) {
    assert_eq!(lut.len(), dst.len());
    for (d, &i) in dst.iter_mut().zip(lut.iter()) {
        *d = src[i];
    }
}

/// Smallest strictly-positive representable `f32`, substituted for a
/// zero noise estimate to avoid division singularities downstream
/// (spec §3, Channel-estimate result invariant).
pub fn floor_positive(x: f32) -> f32 {
    if x > 0.0 && x.is_finite() {
        x
    } else {
        f32::MIN_POSITIVE
    }
}
