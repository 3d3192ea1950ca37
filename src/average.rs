//! Moving average over the most recent samples

/// Circular buffer of the last `N` samples, indexed by a seconds counter.
///
/// The sample taken at second `t` lands in slot `t % N`, so the buffer position follows the clock
/// rather than an internal cursor. Slots whose second was skipped stay empty and are left out of
/// the average, so until `N` samples have been taken it only covers the samples seen so far.
#[derive(Clone, Debug)]
pub struct MovingAverage<const N: usize> {
    samples: [Option<i32>; N],
}

impl<const N: usize> MovingAverage<N> {
    /// Empty buffer
    pub const fn new() -> Self {
        MovingAverage { samples: [None; N] }
    }

    /// Store the sample taken at second `seconds`
    pub fn push(&mut self, seconds: u32, value: i32) {
        if N == 0 {
            return;
        }
        self.samples[seconds as usize % N] = Some(value);
    }

    /// Mark second `seconds` as not sampled, dropping what its slot held from the previous lap
    pub fn skip(&mut self, seconds: u32) {
        if N == 0 {
            return;
        }
        self.samples[seconds as usize % N] = None;
    }

    /// Number of samples the average currently covers
    pub fn len(&self) -> usize {
        self.samples.iter().flatten().count()
    }

    /// Whether no sample has been taken since the last reset
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.iter().all(Option::is_none)
    }

    /// Mean of the stored samples, truncated toward zero. `None` when empty.
    pub fn average(&self) -> Option<i32> {
        let (sum, count) = self
            .samples
            .iter()
            .flatten()
            .fold((0i32, 0i32), |(sum, count), &v| (sum + v, count + 1));
        sum.checked_div(count)
    }

    /// Forget every sample
    pub fn reset(&mut self) {
        self.samples = [None; N];
    }
}

impl<const N: usize> Default for MovingAverage<N> {
    fn default() -> Self {
        Self::new()
    }
}
