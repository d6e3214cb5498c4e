//! Release decay curve builder.

/*
Click-free release
==================

Cutting a note's amplitude straight to zero produces a click: the sudden
discontinuity smears energy across the whole spectrum. Ramping linearly
to zero fixes the discontinuity in the level itself but leaves corners in
its slope at both ends of the ramp, which can still read as a soft "tick"
on pure tones.

The release here is a smoothstep ease instead:

    ease(t) = t² (3 − 2t)        for t in [0, 1]

  Level
    g ┐●
      │  ●
      │    ●
      │      ●●
      │         ●●
      │            ●●●
    ε └───────────────●●●●●──→ t
      0                     1

Smoothstep starts and ends with zero slope, so played back linearly over
the release duration the amplitude leaves its current level gently and
settles gently at the floor.

The curve ends at a small positive floor rather than zero. Generators
dislike exact-zero and negative amplitudes (denormals, sign flips), and
the final silencing is the generator teardown's job anyway; the floor is
well below audibility.
*/

/// Amplitude floor every decay curve settles at. Never zero.
pub const CURVE_FLOOR: f32 = 1e-4;

/// Points sampled per decay curve.
pub const CURVE_POINTS: usize = 256;

/// Sample a monotonically non-increasing decay from `start` down to
/// `floor` with a smoothstep ease, `points` samples long.
///
/// `start` is clamped to at least `floor`, so degenerate inputs
/// (zero or negative) yield a flat curve at the floor rather than
/// anything a generator could object to.
pub fn decay_curve(start: f32, floor: f32, points: usize) -> Vec<f32> {
    let start = start.max(floor);
    if points < 2 {
        return vec![start; points];
    }

    (0..points)
        .map(|i| {
            let t = i as f32 / (points - 1) as f32;
            let ease = t * t * (3.0 - 2.0 * t);
            start + (floor - start) * ease
        })
        .collect()
}

/// [`decay_curve`] with the standard floor and resolution.
pub fn default_decay_curve(start: f32) -> Vec<f32> {
    decay_curve(start, CURVE_FLOOR, CURVE_POINTS)
}
