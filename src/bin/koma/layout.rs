//! Key layout: demo scale fragments and the key/column → step mapping.
//!
//! A fragment is what an external scale resolver hands the engine: an
//! ordered list of relative steps spanning one octave, both endpoints
//! included. The layout unrolls two octaves of it across the keyboard
//! rows; the same strip is hit-tested for mouse gestures.

use koma::tuning::STEPS_PER_OCTAVE;

/// An ordered one-octave run of relative steps.
pub struct ScaleFragment {
    pub name: &'static str,
    /// Relative steps from 0 to 53 inclusive.
    pub steps: &'static [i32],
}

/// Rast: tanini-heavy, the makam usually taught first.
pub fn rast() -> ScaleFragment {
    ScaleFragment {
        name: "Rast",
        steps: &[0, 9, 17, 22, 31, 40, 48, 53],
    }
}

/// Hicaz: the wide augmented second between its 2nd and 3rd degrees.
pub fn hicaz() -> ScaleFragment {
    ScaleFragment {
        name: "Hicaz",
        steps: &[0, 5, 17, 22, 31, 39, 44, 53],
    }
}

/// Uşşak: flattened second degree, a comma under the Rast one.
pub fn ussak() -> ScaleFragment {
    ScaleFragment {
        name: "Ussak",
        steps: &[0, 8, 13, 22, 31, 40, 44, 53],
    }
}

/// Bottom keyboard row, bound first (low octave).
pub const HOME_ROW: &[char] = &['a', 's', 'd', 'f', 'g', 'h', 'j', 'k', 'l', ';'];
/// Second row continues where the home row runs out.
pub const TOP_ROW: &[char] = &['q', 'w', 'e', 'r', 't', 'y', 'u', 'i', 'o', 'p'];

/// One playable position on the strip.
pub struct Key {
    pub binding: char,
    /// Absolute step relative to the instrument base.
    pub step: i32,
}

pub struct Layout {
    pub scale_name: &'static str,
    keys: Vec<Key>,
}

impl Layout {
    /// Unroll two octaves of `fragment` left to right and bind them to
    /// the keyboard rows. Positions beyond the available bindings are
    /// dropped.
    pub fn build(fragment: &ScaleFragment) -> Self {
        let degrees = &fragment.steps[..fragment.steps.len().saturating_sub(1)];

        let mut steps: Vec<i32> = Vec::new();
        for octave in 0..2 {
            for &degree in degrees {
                steps.push(degree + octave * STEPS_PER_OCTAVE);
            }
        }
        steps.push(2 * STEPS_PER_OCTAVE);

        let bindings = HOME_ROW.iter().chain(TOP_ROW.iter());
        let keys = bindings
            .zip(steps)
            .map(|(&binding, step)| Key { binding, step })
            .collect();

        Self {
            scale_name: fragment.name,
            keys,
        }
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn step_for_key(&self, binding: char) -> Option<i32> {
        self.keys
            .iter()
            .find(|key| key.binding == binding)
            .map(|key| key.step)
    }

    pub fn step_at(&self, index: usize) -> Option<i32> {
        self.keys.get(index).map(|key| key.step)
    }
}
