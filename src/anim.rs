use crate::config::AnimationType;
use crate::foundation::core::{Affine, Rect, Vec2};

/// Avatar transform parameters sampled at one instant.
///
/// Every field is a stateless periodic function of elapsed time, so any timestamp can be sampled
/// in any order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AvatarMotion {
    pub scale: f64,
    /// Radians.
    pub rotation: f64,
    /// Vertical displacement in pixels; never positive (never pushes the avatar down).
    pub offset_y: f64,
    pub slide_x: f64,
}

impl AvatarMotion {
    pub const IDENTITY: AvatarMotion = AvatarMotion {
        scale: 1.0,
        rotation: 0.0,
        offset_y: 0.0,
        slide_x: 0.0,
    };

    pub fn sample(kind: AnimationType, time_ms: f64) -> Self {
        let t = time_ms / 1000.0;
        let mut m = Self::IDENTITY;
        match kind {
            AnimationType::None => {}
            AnimationType::Breathe => m.scale = 1.0 + 0.05 * (t * 3.0).sin(),
            AnimationType::Bounce => m.offset_y = -10.0 * (t * 4.0).sin().abs(),
            AnimationType::Wave => m.rotation = 0.05 * (t * 3.0).sin(),
            AnimationType::Slide => m.slide_x = 20.0 * (t * 2.0).sin(),
        }
        m
    }

    /// Untransformed avatar box: `base` moved by the slide and bounce offsets.
    pub fn placed_box(&self, base: Rect) -> Rect {
        base + Vec2::new(self.slide_x, self.offset_y)
    }

    /// Rotation and scale about the centre of `placed` (translate, rotate, scale, translate back).
    pub fn transform_about(&self, placed: Rect) -> Affine {
        let c = placed.center().to_vec2();
        Affine::translate(c)
            * Affine::rotate(self.rotation)
            * Affine::scale(self.scale)
            * Affine::translate(-c)
    }

    /// Axis-aligned bounds of the avatar box after the full transform.
    pub fn bounds(&self, base: Rect) -> Rect {
        let placed = self.placed_box(base);
        self.transform_about(placed).transform_rect_bbox(placed)
    }
}

/// Period in milliseconds of each animation, `None` for the static one.
pub fn period_ms(kind: AnimationType) -> Option<f64> {
    let angular = match kind {
        AnimationType::None => return None,
        AnimationType::Breathe | AnimationType::Wave => 3.0,
        // |sin| repeats every half turn.
        AnimationType::Bounce => 8.0,
        AnimationType::Slide => 2.0,
    };
    Some(std::f64::consts::TAU / angular * 1000.0)
}

#[cfg(test)]
#[path = "../tests/unit/animation/motion.rs"]
mod tests;
