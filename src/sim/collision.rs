//! Collision and scoring
//!
//! [`evaluate`] is a pure function of the world: it reports whether the round
//! must end and which pipes have just been passed, and leaves applying the
//! score latches to the caller.

use super::state::{Bird, Pipe};
use crate::consts::{BIRD_SIZE, BIRD_X, FIELD_HEIGHT};

/// Result of checking one world state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollisionReport {
    /// The bird hit the field edge or a pipe (never set in test mode)
    pub terminate: bool,
    /// Indices of pipes passed for the first time
    pub newly_scored: Vec<usize>,
}

impl CollisionReport {
    pub fn score_delta(&self) -> u32 {
        self.newly_scored.len() as u32
    }
}

/// Left and right edge of the bird's collision band
#[inline]
pub fn bird_band() -> (f32, f32) {
    (BIRD_X - BIRD_SIZE / 2.0, BIRD_X + BIRD_SIZE / 2.0)
}

/// Bird touches or leaves the top/bottom of the field
pub fn hits_field_edge(bird: &Bird) -> bool {
    bird.top() <= 0.0 || bird.bottom() >= FIELD_HEIGHT
}

/// Bird overlaps the pipe horizontally while outside its gap
pub fn hits_pipe(bird: &Bird, pipe: &Pipe) -> bool {
    let (left, right) = bird_band();
    let overlaps = !(right < pipe.x || left > pipe.trailing_edge());
    overlaps && (bird.top() < pipe.gap_top || bird.bottom() > pipe.gap_bottom())
}

/// Check the world for a terminating collision and newly passed pipes
pub fn evaluate(bird: &Bird, pipes: &[Pipe], test_mode: bool) -> CollisionReport {
    let terminate =
        !test_mode && (hits_field_edge(bird) || pipes.iter().any(|pipe| hits_pipe(bird, pipe)));

    let (left, _) = bird_band();
    let newly_scored = pipes
        .iter()
        .enumerate()
        .filter(|(_, pipe)| !pipe.scored && pipe.trailing_edge() < left)
        .map(|(i, _)| i)
        .collect();

    CollisionReport {
        terminate,
        newly_scored,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{GAP_HEIGHT, PIPE_WIDTH};
    use proptest::prelude::*;

    fn bird_at(y: f32) -> Bird {
        Bird {
            y,
            ..Bird::default()
        }
    }

    #[test]
    fn test_field_edges_terminate() {
        assert!(evaluate(&bird_at(-5.0), &[], false).terminate);
        assert!(evaluate(&bird_at(BIRD_SIZE / 2.0), &[], false).terminate);
        assert!(evaluate(&bird_at(FIELD_HEIGHT + 1.0), &[], false).terminate);
        assert!(!evaluate(&bird_at(FIELD_HEIGHT / 2.0), &[], false).terminate);
    }

    #[test]
    fn test_test_mode_never_terminates() {
        let pipe = Pipe::new(BIRD_X - 10.0, 400.0);
        assert!(!evaluate(&bird_at(-50.0), &[pipe], true).terminate);
        assert!(!evaluate(&bird_at(100.0), &[pipe], true).terminate);
    }

    #[test]
    fn test_pipe_collision_outside_gap() {
        let pipe = Pipe::new(BIRD_X - 10.0, 200.0);
        let inside_gap = bird_at(200.0 + GAP_HEIGHT / 2.0);
        let above_gap = bird_at(150.0);
        let below_gap = bird_at(200.0 + GAP_HEIGHT);

        assert!(!hits_pipe(&inside_gap, &pipe));
        assert!(hits_pipe(&above_gap, &pipe));
        assert!(hits_pipe(&below_gap, &pipe));
        assert!(evaluate(&above_gap, &[pipe], false).terminate);
    }

    #[test]
    fn test_no_collision_without_horizontal_overlap() {
        let (_, right) = bird_band();
        let pipe = Pipe::new(right + 1.0, 200.0);
        assert!(!hits_pipe(&bird_at(50.0), &pipe));
    }

    #[test]
    fn test_scoring_counts_passed_pipes_once() {
        let (left, _) = bird_band();
        let mut pipes = vec![
            Pipe::new(left - PIPE_WIDTH - 1.0, 200.0),
            Pipe::new(left - PIPE_WIDTH + 1.0, 200.0),
            Pipe::new(300.0, 200.0),
        ];
        let bird = bird_at(280.0);

        let report = evaluate(&bird, &pipes, false);
        assert_eq!(report.newly_scored, vec![0]);
        assert_eq!(report.score_delta(), 1);

        pipes[0].scored = true;
        let report = evaluate(&bird, &pipes, false);
        assert_eq!(report.score_delta(), 0);
    }

    #[test]
    fn test_scoring_in_test_mode() {
        let (left, _) = bird_band();
        let pipes = [Pipe::new(left - PIPE_WIDTH - 5.0, 200.0)];
        let report = evaluate(&bird_at(-40.0), &pipes, true);
        assert!(!report.terminate);
        assert_eq!(report.score_delta(), 1);
    }

    proptest! {
        #[test]
        fn test_latch_never_rescores(
            y in -50.0f32..650.0,
            xs in prop::collection::vec(-200.0f32..600.0, 0..8),
            test_mode in any::<bool>(),
        ) {
            let bird = bird_at(y);
            let mut pipes: Vec<Pipe> = xs.into_iter().map(|x| Pipe::new(x, 220.0)).collect();

            let first = evaluate(&bird, &pipes, test_mode);
            for &i in &first.newly_scored {
                prop_assert!(!pipes[i].scored);
                pipes[i].scored = true;
            }
            for _ in 0..3 {
                let again = evaluate(&bird, &pipes, test_mode);
                prop_assert_eq!(again.score_delta(), 0);
                prop_assert_eq!(again.terminate, first.terminate);
            }
        }
    }
}
