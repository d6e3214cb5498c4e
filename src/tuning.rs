//! 53-tone equal temperament step math and note naming.

/*
The 53-comma octave
===================

This instrument divides the octave into 53 equal steps instead of the
familiar 12. One step is a Holdrian comma, 1200/53 ≈ 22.64 cents, and the
division is no arbitrary choice: 53-EDO approximates both the pure fifth
(31 steps = 701.89 cents, vs 701.96 pure) and the pure major third
(17 steps = 384.9 cents, vs 386.3 pure) far better than 12-EDO does,
which is why Turkish makam theory counts its intervals in commas.

Useful step counts inside one octave:

    9 steps   tanini (whole tone, ~203.8 cents)
    5 steps   bakiye (limma, ~113.2 cents)
    4 steps   small half step (~90.6 cents)
    31 steps  perfect fifth
    22 steps  perfect fourth
    53 steps  octave (exactly 2:1)

Frequencies follow the usual equal-temperament formula with 53 in the
denominator:

    f(step) = base × 2^(step / 53)

`base` is the pitch of step 0 and is a runtime parameter (a 12-tone
transposition of the D4 reference below). Steps are plain integers,
unbounded in either direction; a negative step simply lands below the
base. There are no fractional steps anywhere in the engine.

All of the math here is done in f64 and narrowed at the audio boundary,
so octave identities hold to well under a cent of error.
*/

/// Steps in one octave of the tuning grid.
pub const STEPS_PER_OCTAVE: i32 = 53;

/// Size of one step (one Holdrian comma) in cents.
pub const CENTS_PER_STEP: f64 = 1200.0 / 53.0;

/// Reference pitch for step 0 of an untransposed layout: D4 at concert
/// pitch (A4 = 440 Hz).
pub const REFERENCE_FREQ: f64 = 293.664_767_9;

/// MIDI note number of [`REFERENCE_FREQ`] (D4).
pub const REFERENCE_MIDI: i32 = 62;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Frequency in Hz of `step` above (or below, for negative steps) `base`.
#[inline]
pub fn step_frequency(step: i32, base: f64) -> f64 {
    base * 2.0_f64.powf(step as f64 / STEPS_PER_OCTAVE as f64)
}

/// Interval of `step` from step 0, in cents.
#[inline]
pub fn step_cents(step: i32) -> f64 {
    step as f64 * CENTS_PER_STEP
}

/// Base frequency for a 12-tone transposition of the reference pitch.
///
/// `semitones` shifts the whole layout: 0 keeps step 0 on D4, +2 moves it
/// to E4, -2 to C4, and so on.
#[inline]
pub fn transposed_base(semitones: i32) -> f64 {
    REFERENCE_FREQ * 2.0_f64.powf(semitones as f64 / 12.0)
}

/// Conventional note name and octave for a 12-tone semitone offset from
/// the D4 reference.
///
/// Octaves follow the MIDI convention (C4 = 60 sits in octave 4).
/// Euclidean division keeps negative offsets on the correct octave:
/// an offset of -3 is B3, not B4.
pub fn note_name(semitone_offset: i32) -> (&'static str, i32) {
    let midi = REFERENCE_MIDI + semitone_offset;
    let name = NOTE_NAMES[midi.rem_euclid(12) as usize];
    let octave = midi.div_euclid(12) - 1;
    (name, octave)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: f64 = REFERENCE_FREQ;

    #[test]
    fn octave_doubling_law() {
        for step in [-106, -53, -11, 0, 1, 26, 52, 53, 106] {
            let low = step_frequency(step - 53, BASE);
            let here = step_frequency(step, BASE);
            assert!(
                (here - low * 2.0).abs() / here < 1e-9,
                "octave below step {step} should be exactly half"
            );

            let above = step_frequency(step + 53, BASE);
            assert!(
                (above / here - 2.0).abs() < 1e-9,
                "octave above step {step} should double the frequency"
            );
        }
    }

    #[test]
    fn step_zero_is_the_base() {
        assert_eq!(step_frequency(0, BASE), BASE);
        assert_eq!(step_frequency(0, 100.0), 100.0);
    }

    #[test]
    fn cents_endpoints() {
        assert_eq!(step_cents(0), 0.0);
        assert!((step_cents(53) - 1200.0).abs() < 1e-9);
    }

    #[test]
    fn fifth_is_31_steps() {
        // D4 plus a 53-EDO fifth lands a hair above A4: 440.497 Hz.
        let fifth = step_frequency(31, BASE);
        assert!(
            (fifth - 440.497).abs() < 0.5,
            "expected ~440.5 Hz, got {fifth}"
        );
    }

    #[test]
    fn transposition_is_twelve_tone() {
        assert_eq!(transposed_base(0), REFERENCE_FREQ);
        assert!((transposed_base(12) - REFERENCE_FREQ * 2.0).abs() < 1e-9);
        // -14 semitones from D4 lands on C3.
        assert!((transposed_base(-14) - REFERENCE_FREQ / 2.0 / 2.0_f64.powf(2.0 / 12.0)).abs() < 1e-6);
    }

    #[test]
    fn note_names_resolve_around_the_reference() {
        assert_eq!(note_name(0), ("D", 4));
        assert_eq!(note_name(7), ("A", 4));
        assert_eq!(note_name(-2), ("C", 4));
        assert_eq!(note_name(-3), ("B", 3));
        assert_eq!(note_name(-14), ("C", 3));
        assert_eq!(note_name(10), ("C", 5));
        assert_eq!(note_name(-26), ("C", 2));
    }
}
