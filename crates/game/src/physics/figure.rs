use glam::DVec2;

/// An axis-aligned rectangle with a velocity, the shared shape of
/// paddles and the ball.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Figure {
    pub pos: DVec2,
    pub size: DVec2,
    pub vel: DVec2,
}

impl Figure {
    pub fn new(pos: DVec2, size: DVec2, vel: DVec2) -> Self {
        Self { pos, size, vel }
    }

    pub fn center(&self) -> DVec2 {
        self.pos + self.size / 2.0
    }

    pub fn intersects(&self, other: &Figure) -> bool {
        self.pos.x < other.pos.x + other.size.x
            && self.pos.x + self.size.x > other.pos.x
            && self.pos.y < other.pos.y + other.size.y
            && self.pos.y + self.size.y > other.pos.y
    }

    /// One Euler step. No bounds handling here; walls and paddles have
    /// their own rules.
    pub fn step(&mut self) {
        self.pos += self.vel;
    }
}
