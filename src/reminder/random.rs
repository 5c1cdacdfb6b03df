use rand::Rng;

/// Source of the randomly drawn work-break duration.
pub trait RandomSource: Send {
    /// Uniform sample over `min..=max`. Returns `min` when the range is empty.
    fn uniform(&mut self, min: u32, max: u32) -> u32;
}

#[derive(Debug, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn uniform(&mut self, min: u32, max: u32) -> u32 {
        if min >= max {
            return min;
        }
        rand::thread_rng().gen_range(min..=max)
    }
}
