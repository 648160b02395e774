//! Per-step event rules for the generated accompaniment. Everything in
//! this module is a pure function of the step index, so one pass around
//! the loop makes exactly the same decisions as the next.
//!
//! Step grid: sixteenth notes. 4 steps = one beat, 16 steps = one 4/4
//! bar.

/// Which rhythmic feel drives the picking bed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Groove {
    Straight,
    Shuffle,
}

impl Groove {
    /// Pick a groove from a free-text style label. Anything that smells
    /// swung gets the shuffle; everything else plays straight eighths.
    pub fn from_style(label: &str) -> Groove {
        let label = label.to_lowercase();
        if label.contains("shuffle") || label.contains("swing") || label.contains("blues") {
            Groove::Shuffle
        } else {
            Groove::Straight
        }
    }

    /// Picking-bed trigger for this step, as a fractional offset in step
    /// units (0.0 = exactly on the step). Straight picks every eighth on
    /// the grid; shuffle keeps the downbeat eighth and delays the
    /// off-beat one by two thirds of a step, landing it on the last
    /// triplet of the beat.
    pub fn pick_offset(&self, step: usize) -> Option<f32> {
        match self {
            Groove::Straight => (step % 2 == 0).then_some(0.0),
            Groove::Shuffle => match step % 4 {
                0 => Some(0.0),
                2 => Some(2.0 / 3.0),
                _ => None,
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hat {
    Closed,
    Open,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BassNote {
    Root,
    Fifth,
}

/// Everything that sounds on one sixteenth step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepPlan {
    pub kick: bool,
    pub snare: bool,
    pub hat: Option<Hat>,
    pub bass: Option<BassNote>,
    pub pick_offset: Option<f32>,
}

/// Plan one step of the loop:
/// - kick and snare alternate on whole beats,
/// - hats subdivide on eighths, opening on the last eighth of every
///   second bar,
/// - bass plays the root on beat starts, substituting the fifth on the
///   last beat of each four-beat group,
/// - the picking bed follows the groove's micro-timing.
pub fn plan_step(groove: Groove, step: usize) -> StepPlan {
    let on_beat = step % 4 == 0;
    let beat = step / 4;

    let hat = (step % 2 == 0).then(|| {
        if step % 32 == 30 {
            Hat::Open
        } else {
            Hat::Closed
        }
    });

    let bass = on_beat.then(|| {
        if beat % 4 == 3 {
            BassNote::Fifth
        } else {
            BassNote::Root
        }
    });

    StepPlan {
        kick: on_beat && beat % 2 == 0,
        snare: on_beat && beat % 2 == 1,
        hat,
        bass,
        pick_offset: groove.pick_offset(step),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_selection() {
        assert_eq!(Groove::from_style("Texas shuffle"), Groove::Shuffle);
        assert_eq!(Groove::from_style("slow blues"), Groove::Shuffle);
        assert_eq!(Groove::from_style("Swing feel"), Groove::Shuffle);
        assert_eq!(Groove::from_style("straight rock"), Groove::Straight);
        assert_eq!(Groove::from_style(""), Groove::Straight);
    }

    #[test]
    fn test_kick_snare_alternate_on_beats() {
        let p0 = plan_step(Groove::Straight, 0);
        assert!(p0.kick && !p0.snare);
        let p4 = plan_step(Groove::Straight, 4);
        assert!(!p4.kick && p4.snare);
        let p8 = plan_step(Groove::Straight, 8);
        assert!(p8.kick && !p8.snare);
    }

    #[test]
    fn test_no_drums_off_beat() {
        for step in [1, 2, 3, 5, 6, 7] {
            let p = plan_step(Groove::Straight, step);
            assert!(!p.kick && !p.snare, "step {step}");
        }
    }

    #[test]
    fn test_hats_on_eighths_only() {
        for step in 0..32 {
            let p = plan_step(Groove::Straight, step);
            assert_eq!(p.hat.is_some(), step % 2 == 0, "step {step}");
        }
    }

    #[test]
    fn test_open_hat_is_periodic() {
        assert_eq!(plan_step(Groove::Straight, 30).hat, Some(Hat::Open));
        assert_eq!(plan_step(Groove::Straight, 62).hat, Some(Hat::Open));
        assert_eq!(plan_step(Groove::Straight, 14).hat, Some(Hat::Closed));
    }

    #[test]
    fn test_bass_root_and_fifth() {
        assert_eq!(plan_step(Groove::Straight, 0).bass, Some(BassNote::Root));
        assert_eq!(plan_step(Groove::Straight, 4).bass, Some(BassNote::Root));
        assert_eq!(plan_step(Groove::Straight, 8).bass, Some(BassNote::Root));
        assert_eq!(plan_step(Groove::Straight, 12).bass, Some(BassNote::Fifth));
        assert_eq!(plan_step(Groove::Straight, 13).bass, None);
    }

    #[test]
    fn test_straight_picks_every_eighth_on_grid() {
        for step in 0..16 {
            let expected = (step % 2 == 0).then_some(0.0);
            assert_eq!(plan_step(Groove::Straight, step).pick_offset, expected);
        }
    }

    #[test]
    fn test_shuffle_delays_offbeat_eighth() {
        assert_eq!(plan_step(Groove::Shuffle, 0).pick_offset, Some(0.0));
        let swung = plan_step(Groove::Shuffle, 2).pick_offset.unwrap();
        assert!((swung - 2.0 / 3.0).abs() < f32::EPSILON);
        assert_eq!(plan_step(Groove::Shuffle, 1).pick_offset, None);
        assert_eq!(plan_step(Groove::Shuffle, 3).pick_offset, None);
    }

    #[test]
    fn test_plan_is_loop_idempotent() {
        // Same step index, same plan — every pass around a 32-step loop
        // schedules identically.
        for step in 0..32 {
            assert_eq!(
                plan_step(Groove::Shuffle, step),
                plan_step(Groove::Shuffle, step),
            );
        }
    }
}
