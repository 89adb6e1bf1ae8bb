use glam::{DVec2, dvec2};

use super::figure::Figure;
use super::paddle::Paddle;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ball {
    pub body: Figure,
    pub speed_increment_ratio: f64,
    pub max_speed_increment: f64,
    /// Cumulative speed multiplier applied so far, capped at
    /// `max_speed_increment`.
    pub total_speed_increment: f64,
}

impl Ball {
    pub fn new(
        center: DVec2,
        size: f64,
        vel: DVec2,
        speed_increment_ratio: f64,
        max_speed_increment: f64,
    ) -> Self {
        Self {
            body: Figure::new(center - size / 2.0, dvec2(size, size), vel),
            speed_increment_ratio,
            max_speed_increment,
            total_speed_increment: 1.0,
        }
    }

    pub fn step(&mut self) {
        self.body.step();
    }

    /// Pure reflection off the floor (`y = 0`) or ceiling (`y = 1`),
    /// clamping back into the field.
    pub fn bounce_on_walls(&mut self) {
        if self.body.pos.y <= 0.0 || self.body.pos.y + self.body.size.y >= 1.0 {
            self.body.vel.y = -self.body.vel.y;
            self.body.pos.y = self.body.pos.y.clamp(0.0, 1.0 - self.body.size.y);
        }
    }

    /// Tests the ball against a paddle and, on hit, redirects it.
    ///
    /// The collision point (0 = top edge of the blade, 1 = bottom)
    /// maps to a bounce angle of up to 45 degrees either way; a center
    /// hit leaves straight. Speed compounds by the increment ratio per
    /// bounce until the cumulative cap. Returns whether a bounce
    /// happened, which is also the ownership-transfer signal for the
    /// synchronization engine.
    pub fn bounce_on_paddle(&mut self, paddle: &Paddle) -> bool {
        if !self.body.intersects(&paddle.body) {
            return false;
        }

        let collision_point = (self.body.center().y - paddle.body.pos.y) / paddle.body.size.y;
        self.body.vel.x = -self.body.vel.x;

        let angle = (collision_point - 0.5) * std::f64::consts::FRAC_PI_2;

        let new_total =
            (self.total_speed_increment * self.speed_increment_ratio).min(self.max_speed_increment);
        let increment = new_total / self.total_speed_increment;
        self.total_speed_increment = new_total;

        let speed = self.body.vel.length() * increment;
        self.body.vel.x = speed * angle.cos() * self.body.vel.x.signum();
        self.body.vel.y = speed * angle.sin();

        true
    }
}
