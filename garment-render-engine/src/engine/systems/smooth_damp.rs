use constants::customizer::{DAMPING_EPSILON, DAMPING_SMOOTH_TIME};

/// Critically damped spring toward a moving target, one velocity per channel.
///
/// Framerate independent for a fixed smooth time. Channels within `epsilon` of
/// their target snap onto it and stop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothDamp<const N: usize> {
    pub smooth_time: f32,
    pub epsilon: f32,
    velocity: [f32; N],
}

impl<const N: usize> Default for SmoothDamp<N> {
    fn default() -> Self {
        Self::new(DAMPING_SMOOTH_TIME, DAMPING_EPSILON)
    }
}

impl<const N: usize> SmoothDamp<N> {
    pub fn new(smooth_time: f32, epsilon: f32) -> Self {
        Self {
            smooth_time,
            epsilon,
            velocity: [0.0; N],
        }
    }

    pub fn velocity(&self) -> [f32; N] {
        self.velocity
    }

    /// Advance `current` toward `target` by `delta` seconds.
    ///
    /// Returns true while any channel is still moving. A non-positive delta
    /// leaves everything untouched.
    pub fn step(&mut self, current: &mut [f32; N], target: [f32; N], delta: f32) -> bool {
        if delta <= 0.0 {
            return current.iter().zip(target).any(|(c, t)| *c != t);
        }

        let mut moving = false;
        for i in 0..N {
            if (current[i] - target[i]).abs() <= self.epsilon {
                current[i] = target[i];
                self.velocity[i] = 0.0;
                continue;
            }
            current[i] = damp_channel(current[i], target[i], &mut self.velocity[i], self.smooth_time, delta);
            moving = true;
        }
        moving
    }
}

fn damp_channel(current: f32, target: f32, velocity: &mut f32, smooth_time: f32, delta: f32) -> f32 {
    let smooth_time = smooth_time.max(0.0001);
    let omega = 2.0 / smooth_time;
    let x = omega * delta;
    // Cheap approximation of exp(-x).
    let exp = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let change = current - target;
    let temp = (*velocity + omega * change) * delta;
    *velocity = (*velocity - omega * temp) * exp;
    let mut output = target + (change + temp) * exp;

    // Never overshoot.
    if (target - current > 0.0) == (output > target) {
        output = target;
        *velocity = 0.0;
    }
    output
}
