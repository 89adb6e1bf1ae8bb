use glam::dvec2;

use crate::court::{MatchState, Side};
use crate::net::protocol::{BallHandoff, BallPosition, Frame, StateFrame};

/// Who simulates the ball right now. Authority follows the ball:
/// whichever peer the ball travels toward is the single writer of ball
/// state for that leg of play, and the other peer takes incoming ball
/// positions as ground truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Ours,
    Theirs,
}

/// The authoritative-handoff protocol for one peer.
///
/// Ownership is explicit tagged state, transferred only by the
/// dedicated `[BOUNCE]` frame (never inferred from timing) and
/// pre-assigned to the serving side at each serve.
pub struct HandoffSync {
    side: Side,
    ownership: Ownership,
    ping_ms: u64,
    last_timestamp: u64,
}

impl HandoffSync {
    /// The host (left side) owns the ball when a rally first starts;
    /// the client begins as the non-owner.
    pub fn new(side: Side) -> Self {
        Self {
            side,
            ownership: match side {
                Side::Left => Ownership::Ours,
                Side::Right => Ownership::Theirs,
            },
            ping_ms: 0,
            last_timestamp: 0,
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn ownership(&self) -> Ownership {
        self.ownership
    }

    pub fn owns_ball(&self) -> bool {
        self.ownership == Ownership::Ours
    }

    /// Latency estimate for display, from the gap between consecutive
    /// received state frames.
    pub fn ping_ms(&self) -> u64 {
        self.ping_ms
    }

    /// One owner-side ball tick: integrate, bounce off walls, then
    /// test our own paddle (while owned, the ball can only reach the
    /// paddle on our side). A paddle bounce flips ownership exactly
    /// once and yields the handoff to send; a wall bounce never does.
    pub fn tick_ball(&mut self, state: &mut MatchState) -> Option<BallHandoff> {
        if !self.owns_ball() {
            return None;
        }

        state.ball.step();
        state.ball.bounce_on_walls();

        let paddle = *state.paddle(self.side);
        if state.ball.bounce_on_paddle(&paddle) {
            self.ownership = Ownership::Theirs;
            let ball = &state.ball.body;
            return Some(BallHandoff {
                x: ball.pos.x,
                y: ball.pos.y,
                speed_x: ball.vel.x,
                speed_y: ball.vel.y,
            });
        }
        None
    }

    /// Boundary detection, owner only: the single-writer property that
    /// keeps scoring exclusive. An exit while we own the ball means
    /// the opponent scored.
    pub fn check_scored(&mut self, state: &mut MatchState) -> bool {
        if !self.owns_ball() {
            return false;
        }

        let ball = &state.ball.body;
        if ball.pos.x <= 0.0 || ball.pos.x + ball.size.x >= 1.0 {
            let opponent = self.side.opposite();
            state.set_score(opponent, state.score(opponent) + 1);
            state.left_scored_last = opponent == Side::Left;
            state.reset_figures();
            log::debug!("{} scored, {}:{}", opponent, state.left_score, state.right_score);
            true
        } else {
            false
        }
    }

    /// Serve gating: only the side that was just scored upon serves,
    /// and only while the ball is stationary with no serve pending.
    pub fn should_serve(&self, state: &MatchState, serve_pending: bool) -> bool {
        let opponent_scored_last = state.left_scored_last == (self.side != Side::Left);
        state.ball.body.vel.x == 0.0 && !serve_pending && opponent_scored_last
    }

    /// The serving side owns the ball for the opening leg of the
    /// rally.
    pub fn on_serve(&mut self) {
        self.ownership = Ownership::Ours;
    }

    /// The per-tick broadcast: our paddle, the ball (meaningful only
    /// while we own it, sent unconditionally), our view of the
    /// opponent's score, and a local timestamp.
    pub fn make_state_frame(&self, state: &MatchState, timestamp: u64) -> StateFrame {
        StateFrame {
            opponent_paddle_y: state.paddle(self.side).y(),
            ball: BallPosition {
                x: state.ball.body.pos.x,
                y: state.ball.body.pos.y,
            },
            score: state.score(self.side.opposite()),
            timestamp,
        }
    }

    pub fn apply_frame(&mut self, state: &mut MatchState, frame: &Frame) {
        match frame {
            Frame::Handshake(name) => {
                state.set_name(self.side.opposite(), name.clone());
            }
            Frame::Bounce(handoff) => self.apply_bounce(state, handoff),
            Frame::State(peer) => self.apply_state(state, peer),
        }
    }

    /// The one-shot authority transfer. From here on we are the single
    /// writer, which also guards the fresh handoff state against any
    /// stale periodic frame still in flight.
    fn apply_bounce(&mut self, state: &mut MatchState, handoff: &BallHandoff) {
        self.ownership = Ownership::Ours;
        state.ball.body.pos = dvec2(handoff.x, handoff.y);
        state.ball.body.vel = dvec2(handoff.speed_x, handoff.speed_y);
    }

    fn apply_state(&mut self, state: &mut MatchState, peer: &StateFrame) {
        // The frame carries the sender's view of *our* score; a higher
        // value is the news that we just scored on their side. Scores
        // never decrease, so a lower value is a reordered pre-score
        // frame and must not drag the counter back.
        if peer.score > state.score(self.side) {
            state.left_scored_last = self.side == Side::Left;
            state.set_score(self.side, peer.score);
            state.reset_figures();
        }

        state
            .paddle_mut(self.side.opposite())
            .set_y(peer.opponent_paddle_y);

        if self.last_timestamp != 0 {
            self.ping_ms = peer.timestamp.saturating_sub(self.last_timestamp);
        }
        self.last_timestamp = peer.timestamp;

        // Their ball positions are ground truth only while they own
        // the ball.
        if !self.owns_ball() {
            state.ball.body.pos = dvec2(peer.ball.x, peer.ball.y);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::BALL_SPEED_RATE;

    fn owner_with_incoming_ball() -> (HandoffSync, MatchState) {
        let mut sync = HandoffSync::new(Side::Left);
        assert!(sync.owns_ball());
        let mut state = MatchState::new("us", "them");
        // Ball just in front of our paddle, heading at its center.
        state.ball.body.pos = dvec2(0.0255, 0.495);
        state.ball.body.vel = dvec2(-0.015, 0.0);
        (sync, state)
    }

    #[test]
    fn paddle_bounce_flips_ownership_exactly_once() {
        let (mut sync, mut state) = owner_with_incoming_ball();

        let mut handoffs = 0;
        for _ in 0..8 {
            if sync.tick_ball(&mut state).is_some() {
                handoffs += 1;
            }
        }
        assert_eq!(handoffs, 1);
        assert_eq!(sync.ownership(), Ownership::Theirs);
        // Once handed off, we no longer simulate.
        let pos = state.ball.body.pos;
        assert!(sync.tick_ball(&mut state).is_none());
        assert_eq!(state.ball.body.pos, pos);
    }

    #[test]
    fn wall_bounce_does_not_transfer_ownership() {
        let mut sync = HandoffSync::new(Side::Left);
        let mut state = MatchState::new("us", "them");
        state.ball.body.pos = dvec2(0.5, 0.001);
        state.ball.body.vel = dvec2(0.0, -0.01);

        assert!(sync.tick_ball(&mut state).is_none());
        assert!(sync.owns_ball());
        assert!(state.ball.body.vel.y > 0.0);
    }

    #[test]
    fn handoff_carries_exact_post_bounce_state() {
        let (mut sync, mut state) = owner_with_incoming_ball();

        let handoff = (0..8).find_map(|_| sync.tick_ball(&mut state)).unwrap();
        assert_eq!(handoff.x, state.ball.body.pos.x);
        assert_eq!(handoff.y, state.ball.body.pos.y);
        assert_eq!(handoff.speed_x, state.ball.body.vel.x);
        assert_eq!(handoff.speed_y, state.ball.body.vel.y);
        assert!(handoff.speed_x > 0.0);
        assert!((state.ball.body.vel.length() - 0.015 * BALL_SPEED_RATE).abs() < 1e-9);
    }

    #[test]
    fn bounce_frame_wins_over_stale_state_frame() {
        let mut sync = HandoffSync::new(Side::Right);
        let mut state = MatchState::new("them", "us");
        assert!(!sync.owns_ball());

        sync.apply_frame(
            &mut state,
            &Frame::Bounce(BallHandoff {
                x: 0.9,
                y: 0.5,
                speed_x: 0.02,
                speed_y: 0.01,
            }),
        );
        assert!(sync.owns_ball());
        assert_eq!(state.ball.body.pos, dvec2(0.9, 0.5));
        assert_eq!(state.ball.body.vel, dvec2(0.02, 0.01));

        // A periodic frame sent before the handoff arrives late; it
        // must not clobber the adopted ball state.
        sync.apply_frame(
            &mut state,
            &Frame::State(StateFrame {
                opponent_paddle_y: 0.4,
                ball: BallPosition { x: 0.2, y: 0.2 },
                score: 0,
                timestamp: 10,
            }),
        );
        assert_eq!(state.ball.body.pos, dvec2(0.9, 0.5));
        assert_eq!(state.left_paddle.y(), 0.4);
    }

    #[test]
    fn non_owner_adopts_peer_ball_positions() {
        let mut sync = HandoffSync::new(Side::Right);
        let mut state = MatchState::new("them", "us");

        sync.apply_frame(
            &mut state,
            &Frame::State(StateFrame {
                opponent_paddle_y: 0.3,
                ball: BallPosition { x: 0.25, y: 0.75 },
                score: 0,
                timestamp: 5,
            }),
        );
        assert_eq!(state.ball.body.pos, dvec2(0.25, 0.75));
    }

    #[test]
    fn score_mismatch_means_we_scored() {
        let mut sync = HandoffSync::new(Side::Right);
        let mut state = MatchState::new("them", "us");
        state.ball.body.pos = dvec2(0.3, 0.3);

        sync.apply_frame(
            &mut state,
            &Frame::State(StateFrame {
                opponent_paddle_y: 0.4,
                ball: BallPosition { x: 0.3, y: 0.3 },
                score: 1,
                timestamp: 5,
            }),
        );
        assert_eq!(state.right_score, 1);
        assert_eq!(state.left_score, 0);
        assert!(!state.left_scored_last);
        // Scoring resets the rally.
        assert_eq!(state.ball.body.center(), dvec2(0.5, 0.5));
    }

    #[test]
    fn reordered_pre_score_frame_cannot_lower_the_score() {
        let mut sync = HandoffSync::new(Side::Right);
        let mut state = MatchState::new("them", "us");

        let frame = |score, timestamp| {
            Frame::State(StateFrame {
                opponent_paddle_y: 0.4,
                ball: BallPosition { x: 0.5, y: 0.5 },
                score,
                timestamp,
            })
        };

        sync.apply_frame(&mut state, &frame(1, 10));
        assert_eq!(state.right_score, 1);

        // The rally is back underway when a frame sent before the
        // point straggles in.
        state.right_paddle.set_y(0.1);
        sync.apply_frame(&mut state, &frame(0, 5));

        // Score stays monotonic and nothing resets mid-play.
        assert_eq!(state.right_score, 1);
        assert!(!state.left_scored_last);
        assert_eq!(state.right_paddle.y(), 0.1);
    }

    #[test]
    fn owner_boundary_exit_scores_for_the_opponent() {
        let mut sync = HandoffSync::new(Side::Left);
        let mut state = MatchState::new("us", "them");
        state.ball.body.pos = dvec2(-0.001, 0.5);

        assert!(sync.check_scored(&mut state));
        assert_eq!(state.right_score, 1);
        assert!(!state.left_scored_last);
        // Authority stays with us: the scored-upon side serves next.
        assert!(sync.owns_ball());
        assert!(sync.should_serve(&state, false));
    }

    #[test]
    fn non_owner_never_detects_scores() {
        let mut sync = HandoffSync::new(Side::Right);
        let mut state = MatchState::new("them", "us");
        state.ball.body.pos = dvec2(-0.5, 0.5);

        assert!(!sync.check_scored(&mut state));
        assert_eq!(state.left_score, 0);
        assert_eq!(state.right_score, 0);
    }

    #[test]
    fn serve_gating_requires_stationary_ball_and_conceded_point() {
        let mut state = MatchState::new("us", "them");
        let left = HandoffSync::new(Side::Left);
        let right = HandoffSync::new(Side::Right);

        // Right scored last: left was scored upon, left serves.
        state.left_scored_last = false;
        assert!(left.should_serve(&state, false));
        assert!(!right.should_serve(&state, false));

        // Not while a serve is already pending.
        assert!(!left.should_serve(&state, true));

        // Not while the ball is in motion.
        state.ball.body.vel.x = 0.01;
        assert!(!left.should_serve(&state, false));
    }

    #[test]
    fn state_frame_reports_opponent_score_and_own_paddle() {
        let mut state = MatchState::new("us", "them");
        state.left_score = 3;
        state.right_score = 5;
        state.left_paddle.set_y(0.12);

        let sync = HandoffSync::new(Side::Left);
        let frame = sync.make_state_frame(&state, 1234);
        assert_eq!(frame.opponent_paddle_y, 0.12);
        assert_eq!(frame.score, 5);
        assert_eq!(frame.timestamp, 1234);
    }

    #[test]
    fn ping_is_the_gap_between_received_timestamps() {
        let mut sync = HandoffSync::new(Side::Right);
        let mut state = MatchState::new("them", "us");

        let frame = |timestamp| {
            Frame::State(StateFrame {
                opponent_paddle_y: 0.4,
                ball: BallPosition { x: 0.5, y: 0.5 },
                score: 0,
                timestamp,
            })
        };

        sync.apply_frame(&mut state, &frame(1000));
        assert_eq!(sync.ping_ms(), 0);
        sync.apply_frame(&mut state, &frame(1034));
        assert_eq!(sync.ping_ms(), 34);
    }

    #[test]
    fn handshake_updates_opponent_name_idempotently() {
        let mut sync = HandoffSync::new(Side::Left);
        let mut state = MatchState::new("us", "-");

        sync.apply_frame(&mut state, &Frame::Handshake("peer".to_string()));
        assert_eq!(state.right_name, "peer");
        sync.apply_frame(&mut state, &Frame::Handshake("peer".to_string()));
        assert_eq!(state.right_name, "peer");
        assert_eq!(state.left_name, "us");
    }
}
