use glam::dvec2;

use crate::physics::{
    BALL_SIZE, BALL_SPEED_RATE, BALL_SPEED_X, BALL_SPEED_Y, Ball, MAX_BALL_SPEED_FACTOR,
    PADDLE_HEIGHT, PADDLE_WIDTH, Paddle, effective_step,
};

/// Which paddle and boundary a peer owns. Fixed for the lifetime of a
/// session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

/// The full state of one match as seen by one peer: two paddles, the
/// ball, both scores and the serve tie-break flag.
#[derive(Debug, Clone)]
pub struct MatchState {
    pub left_paddle: Paddle,
    pub right_paddle: Paddle,
    pub ball: Ball,
    pub left_score: u32,
    pub right_score: u32,
    /// Decides the next serve: the side that was scored upon serves,
    /// toward its own half.
    pub left_scored_last: bool,
    pub left_name: String,
    pub right_name: String,
}

impl MatchState {
    pub fn new(left_name: impl Into<String>, right_name: impl Into<String>) -> Self {
        Self {
            left_paddle: Self::initial_left_paddle(),
            right_paddle: Self::initial_right_paddle(),
            ball: Self::initial_ball(),
            left_score: 0,
            right_score: 0,
            left_scored_last: false,
            left_name: left_name.into(),
            right_name: right_name.into(),
        }
    }

    fn initial_ball() -> Ball {
        Ball::new(
            dvec2(0.5, 0.5),
            BALL_SIZE,
            glam::DVec2::ZERO,
            BALL_SPEED_RATE,
            MAX_BALL_SPEED_FACTOR,
        )
    }

    fn initial_left_paddle() -> Paddle {
        Paddle::new(0.0, 0.5, PADDLE_WIDTH, PADDLE_HEIGHT)
    }

    fn initial_right_paddle() -> Paddle {
        Paddle::new(1.0 - PADDLE_WIDTH, 0.5, PADDLE_WIDTH, PADDLE_HEIGHT)
    }

    /// Re-centers the ball (stationary until the next serve) and both
    /// paddles, as after every point.
    pub fn reset_figures(&mut self) {
        self.ball = Self::initial_ball();
        self.left_paddle = Self::initial_left_paddle();
        self.right_paddle = Self::initial_right_paddle();
    }

    pub fn paddle(&self, side: Side) -> &Paddle {
        match side {
            Side::Left => &self.left_paddle,
            Side::Right => &self.right_paddle,
        }
    }

    pub fn paddle_mut(&mut self, side: Side) -> &mut Paddle {
        match side {
            Side::Left => &mut self.left_paddle,
            Side::Right => &mut self.right_paddle,
        }
    }

    pub fn score(&self, side: Side) -> u32 {
        match side {
            Side::Left => self.left_score,
            Side::Right => self.right_score,
        }
    }

    pub fn set_score(&mut self, side: Side, score: u32) {
        match side {
            Side::Left => self.left_score = score,
            Side::Right => self.right_score = score,
        }
    }

    pub fn set_name(&mut self, side: Side, name: impl Into<String>) {
        match side {
            Side::Left => self.left_name = name.into(),
            Side::Right => self.right_name = name.into(),
        }
    }

    pub fn name(&self, side: Side) -> &str {
        match side {
            Side::Left => &self.left_name,
            Side::Right => &self.right_name,
        }
    }

    /// Detects the ball exiting a boundary. Exactly one counter is
    /// incremented per exit, `left_scored_last` flips to match the
    /// scoring side, and all figures reset. Returns the scoring side.
    pub fn check_scored(&mut self) -> Option<Side> {
        let scorer = if self.ball.body.pos.x <= 0.0 {
            Side::Right
        } else if self.ball.body.pos.x + self.ball.body.size.x >= 1.0 {
            Side::Left
        } else {
            return None;
        };

        match scorer {
            Side::Left => self.left_score += 1,
            Side::Right => self.right_score += 1,
        }
        self.left_scored_last = scorer == Side::Left;
        self.reset_figures();
        Some(scorer)
    }

    /// Launches the stationary ball toward the side that did not score
    /// last, with a random vertical component.
    pub fn serve(&mut self) {
        let sign = if self.left_scored_last { 1.0 } else { -1.0 };
        self.ball.body.vel.x = effective_step(BALL_SPEED_X) * sign;
        self.ball.body.vel.y = effective_step(BALL_SPEED_Y * (rand_unit() * 2.0 - 1.0));
    }
}

fn rand_unit() -> f64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    use std::time::Instant;

    let mut hasher = DefaultHasher::new();
    Instant::now().hash(&mut hasher);
    (hasher.finish() % 10000) as f64 / 10000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn left_exit_scores_right() {
        let mut state = MatchState::new("a", "b");
        state.ball.body.pos.x = -0.001;
        state.ball.body.vel.x = -0.015;

        let scorer = state.check_scored();
        assert_eq!(scorer, Some(Side::Right));
        assert_eq!(state.right_score, 1);
        assert_eq!(state.left_score, 0);
        assert!(!state.left_scored_last);

        // Figures are back at their reset positions, ball stationary.
        assert_eq!(state.ball.body.center(), glam::dvec2(0.5, 0.5));
        assert_eq!(state.ball.body.vel, glam::DVec2::ZERO);
        assert_eq!(state.left_paddle.body.center().y, 0.5);
        assert_eq!(state.right_paddle.body.center().y, 0.5);
    }

    #[test]
    fn right_exit_scores_left() {
        let mut state = MatchState::new("a", "b");
        state.ball.body.pos.x = 1.0 - state.ball.body.size.x;

        assert_eq!(state.check_scored(), Some(Side::Left));
        assert_eq!(state.left_score, 1);
        assert!(state.left_scored_last);
    }

    #[test]
    fn interior_ball_does_not_score() {
        let mut state = MatchState::new("a", "b");
        state.ball.body.pos.x = 0.5;
        assert_eq!(state.check_scored(), None);
        assert_eq!(state.left_score, 0);
        assert_eq!(state.right_score, 0);
    }

    #[test]
    fn serve_goes_toward_the_side_that_did_not_score() {
        let mut state = MatchState::new("a", "b");

        state.left_scored_last = true;
        state.serve();
        assert!(state.ball.body.vel.x > 0.0);

        state.reset_figures();
        state.left_scored_last = false;
        state.serve();
        assert!(state.ball.body.vel.x < 0.0);
        assert!(state.ball.body.vel.y.abs() <= effective_step(BALL_SPEED_Y) + 1e-12);
    }
}
