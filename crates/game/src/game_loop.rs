use crate::court::{MatchState, Side};
use crate::input::{InputEvent, PaddleButtons, PlayerSlot};
use crate::net::protocol::Frame;
use crate::net::session::{PeerSession, SessionState};
use crate::physics::{DRAW_EVERY_N_TICKS, PADDLE_STEP_SIZE, TICK_RATE, effective_step};
use crate::surface::{DrawSurface, TextField};
use crate::sync::{FixedTimestep, HandoffSync};

/// The capability set of a game: local input bindings, ball-authority
/// policy and transport are all decided here, at construction.
pub enum GameMode {
    /// One local player on the left, an AI paddle on the right.
    Solo,
    /// Two local players on one keyboard.
    LocalDuel,
    /// One local player; the other paddle lives on the peer.
    Remote {
        session: PeerSession,
        sync: HandoffSync,
    },
}

/// The single game loop driving every variant. One instance per peer;
/// all state mutation happens on the tick path.
pub struct GameLoop {
    state: MatchState,
    mode: GameMode,
    timestep: FixedTimestep,
    tick: u64,
    serve_countdown: Option<u32>,
}

impl GameLoop {
    pub fn solo(player_name: impl Into<String>) -> Self {
        Self::new(MatchState::new(player_name, "Computer"), GameMode::Solo)
    }

    pub fn local_duel(left_name: impl Into<String>, right_name: impl Into<String>) -> Self {
        Self::new(MatchState::new(left_name, right_name), GameMode::LocalDuel)
    }

    /// Wraps an open session. The host plays left and owns the ball
    /// for the opening rally; the client plays right.
    pub fn remote(session: PeerSession) -> Self {
        let side = session.side();
        let local = session.local_name().to_string();
        let opponent = session.opponent_name().unwrap_or("-").to_string();
        let state = match side {
            Side::Left => MatchState::new(local, opponent),
            Side::Right => MatchState::new(opponent, local),
        };
        let sync = HandoffSync::new(side);
        Self::new(state, GameMode::Remote { session, sync })
    }

    fn new(state: MatchState, mode: GameMode) -> Self {
        Self {
            state,
            mode,
            timestep: FixedTimestep::new(TICK_RATE),
            tick: 0,
            serve_countdown: None,
        }
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn session_state(&self) -> Option<SessionState> {
        match &self.mode {
            GameMode::Remote { session, .. } => Some(session.state()),
            _ => None,
        }
    }

    /// Which paddle a player slot drives in the current mode.
    fn slot_side(&self, slot: PlayerSlot) -> Option<Side> {
        match (&self.mode, slot) {
            (GameMode::Solo, PlayerSlot::Primary) => Some(Side::Left),
            (GameMode::Solo, PlayerSlot::Secondary) => None,
            (GameMode::LocalDuel, PlayerSlot::Primary) => Some(Side::Right),
            (GameMode::LocalDuel, PlayerSlot::Secondary) => Some(Side::Left),
            (GameMode::Remote { session, .. }, PlayerSlot::Primary) => Some(session.side()),
            (GameMode::Remote { .. }, PlayerSlot::Secondary) => None,
        }
    }

    /// Applies discrete key events to paddle velocities. Holding both
    /// directions cancels out.
    pub fn apply_input(&mut self, events: &[InputEvent], held: &mut [PaddleButtons; 2]) {
        for event in events {
            let index = match event.slot {
                PlayerSlot::Primary => 0,
                PlayerSlot::Secondary => 1,
            };
            held[index].set(event.button, event.pressed);
        }

        for (index, slot) in [(0, PlayerSlot::Primary), (1, PlayerSlot::Secondary)] {
            let Some(side) = self.slot_side(slot) else {
                continue;
            };
            let buttons = held[index];
            let mut dir = 0.0;
            if buttons.contains(PaddleButtons::UP) {
                dir -= 1.0;
            }
            if buttons.contains(PaddleButtons::DOWN) {
                dir += 1.0;
            }
            self.state
                .paddle_mut(side)
                .set_speed(dir * effective_step(PADDLE_STEP_SIZE));
        }
    }

    /// Consumes elapsed wall time and runs the due ticks. Returns how
    /// many ran.
    pub fn update(&mut self) -> u32 {
        self.timestep.accumulate();
        let mut ticks_run = 0;
        while self.timestep.consume_tick() {
            self.tick_once();
            ticks_run += 1;
        }
        ticks_run
    }

    /// One simulation tick, in fixed order: incoming frames, paddle
    /// movement, collisions, scoring, serve gating, broadcast.
    pub fn tick_once(&mut self) {
        self.tick += 1;

        if let GameMode::Remote { session, sync } = &mut self.mode {
            for frame in session.poll() {
                sync.apply_frame(&mut self.state, &frame);
            }
        }

        match &mut self.mode {
            GameMode::Solo => {
                Self::drive_ai(&mut self.state);
                self.state.left_paddle.step();
                self.state.right_paddle.step();
                self.state.ball.step();
            }
            GameMode::LocalDuel => {
                self.state.left_paddle.step();
                self.state.right_paddle.step();
                self.state.ball.step();
            }
            GameMode::Remote { session, sync } => {
                self.state.paddle_mut(sync.side()).step();
                if let Some(handoff) = sync.tick_ball(&mut self.state) {
                    session.send(&Frame::Bounce(handoff));
                }
            }
        }

        if !matches!(self.mode, GameMode::Remote { .. }) {
            // The ball can only meet the paddle it is moving toward.
            let paddle = if self.state.ball.body.vel.x < 0.0 {
                self.state.left_paddle
            } else {
                self.state.right_paddle
            };
            self.state.ball.bounce_on_paddle(&paddle);
            self.state.ball.bounce_on_walls();
        }

        match &mut self.mode {
            GameMode::Remote { sync, .. } => {
                sync.check_scored(&mut self.state);
            }
            _ => {
                self.state.check_scored();
            }
        }

        let serve_due = match &self.mode {
            GameMode::Remote { sync, .. } => {
                sync.should_serve(&self.state, self.serve_countdown.is_some())
            }
            _ => self.state.ball.body.vel.x == 0.0 && self.serve_countdown.is_none(),
        };
        if serve_due {
            // Fixed one-second delay between reset and serve.
            self.serve_countdown = Some(TICK_RATE);
        }
        if let Some(remaining) = &mut self.serve_countdown {
            if *remaining == 0 {
                self.serve_countdown = None;
                self.state.serve();
                if let GameMode::Remote { sync, .. } = &mut self.mode {
                    sync.on_serve();
                }
            } else {
                *remaining -= 1;
            }
        }

        if let GameMode::Remote { session, sync } = &self.mode {
            if session.state() == SessionState::Open {
                session.send(&Frame::State(sync.make_state_frame(&self.state, now_ms())));
            }
        }
    }

    fn drive_ai(state: &mut MatchState) {
        let ball_center = state.ball.body.center().y;
        let paddle_center = state.right_paddle.body.center().y;
        let step = effective_step(PADDLE_STEP_SIZE);
        let speed = if ball_center > paddle_center {
            step
        } else if ball_center < paddle_center {
            -step
        } else {
            0.0
        };
        state.right_paddle.set_speed(speed);
    }

    pub fn should_draw(&self) -> bool {
        self.tick % DRAW_EVERY_N_TICKS as u64 == 0
    }

    /// Batches the whole scene onto the surface and flushes once.
    pub fn render(&self, surface: &mut dyn DrawSurface) {
        surface.clear();
        surface.set_text(TextField::LeftName, &self.state.left_name);
        surface.set_text(TextField::RightName, &self.state.right_name);
        surface.set_text(TextField::LeftScore, &self.state.left_score.to_string());
        surface.set_text(TextField::RightScore, &self.state.right_score.to_string());

        if let GameMode::Remote { session, sync } = &self.mode {
            surface.set_text(TextField::Ping, &format!("{} ms", sync.ping_ms()));
            if session.side() == Side::Left {
                surface.set_text(TextField::SessionId, session.session_id());
            }
        }

        surface.draw_middle_line();
        for body in [
            self.state.left_paddle.body,
            self.state.right_paddle.body,
            self.state.ball.body,
        ] {
            surface.fill_rect(body.pos.x, body.pos.y, body.size.x, body.size.y);
        }
        surface.flush();
    }

    /// Stops the session, if any. Nothing in flight is awaited.
    pub fn close(&mut self) {
        if let GameMode::Remote { session, .. } = &mut self.mode {
            session.close();
        }
    }
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::dvec2;

    #[test]
    fn solo_ai_tracks_the_ball() {
        let mut game = GameLoop::solo("p1");
        game.state.ball.body.pos = dvec2(0.5, 0.9);
        game.tick_once();
        assert!(game.state.right_paddle.body.vel.y > 0.0);

        game.state.ball.body.pos = dvec2(0.5, 0.05);
        game.tick_once();
        assert!(game.state.right_paddle.body.vel.y < 0.0);
    }

    #[test]
    fn stationary_ball_serves_after_one_second() {
        let mut game = GameLoop::local_duel("a", "b");
        assert_eq!(game.state.ball.body.vel, glam::DVec2::ZERO);

        for _ in 0..(TICK_RATE + 2) {
            game.tick_once();
        }
        // Nobody scored yet, so the opening serve goes left.
        assert!(game.state.ball.body.vel.x < 0.0);
    }

    #[test]
    fn input_slots_map_per_mode() {
        let mut game = GameLoop::local_duel("a", "b");
        let mut held = [PaddleButtons::empty(); 2];
        let events = [
            InputEvent {
                slot: PlayerSlot::Primary,
                button: PaddleButtons::UP,
                pressed: true,
            },
            InputEvent {
                slot: PlayerSlot::Secondary,
                button: PaddleButtons::DOWN,
                pressed: true,
            },
        ];
        game.apply_input(&events, &mut held);
        assert!(game.state.right_paddle.body.vel.y < 0.0);
        assert!(game.state.left_paddle.body.vel.y > 0.0);

        // Release cancels the motion.
        let release = [InputEvent {
            slot: PlayerSlot::Primary,
            button: PaddleButtons::UP,
            pressed: false,
        }];
        game.apply_input(&release, &mut held);
        assert_eq!(game.state.right_paddle.body.vel.y, 0.0);
    }

    #[test]
    fn opposed_buttons_cancel() {
        let mut game = GameLoop::solo("p1");
        let mut held = [PaddleButtons::empty(); 2];
        let events = [
            InputEvent {
                slot: PlayerSlot::Primary,
                button: PaddleButtons::UP,
                pressed: true,
            },
            InputEvent {
                slot: PlayerSlot::Primary,
                button: PaddleButtons::DOWN,
                pressed: true,
            },
        ];
        game.apply_input(&events, &mut held);
        assert_eq!(game.state.left_paddle.body.vel.y, 0.0);
    }

    #[test]
    fn local_rally_scores_and_resets() {
        let mut game = GameLoop::local_duel("a", "b");
        game.state.ball.body.pos = dvec2(0.002, 0.5);
        game.state.ball.body.vel = dvec2(-0.015, 0.0);
        // Park the left paddle away from the ball so it cannot save.
        game.state.left_paddle.set_y(0.75);

        game.tick_once();
        assert_eq!(game.state.right_score, 1);
        assert!(!game.state.left_scored_last);
        assert_eq!(game.state.ball.body.vel, glam::DVec2::ZERO);
    }
}
