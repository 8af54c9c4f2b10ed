use rand::Rng;

// ─── RandomSource ───────────────────────────────────────────────────────────

/// The only randomness the crate consumes.
///
/// Any `rand::RngCore` is a source, so a seeded `StdRng` gives reproducible
/// campaigns. The trait is object safe; every random operation in the crate
/// takes `&mut dyn RandomSource` so a single handle can be threaded through.
pub trait RandomSource {
    /// Uniform integer in `0..bound`. Returns 0 when `bound` is 0.
    fn next_uint(&mut self, bound: u64) -> u64;

    fn fill_random_bytes(&mut self, buf: &mut [u8]);

    #[inline]
    fn next_bool(&mut self) -> bool {
        self.next_uint(2) == 1
    }

    /// Uniform index in `0..len`. Returns 0 for an empty range.
    #[inline]
    fn next_index(&mut self, len: usize) -> usize {
        self.next_uint(len as u64) as usize
    }

    /// Uniform signed integer in `-magnitude..=magnitude`.
    fn next_signed(&mut self, magnitude: u64) -> i64 {
        let magnitude = magnitude.min(i64::MAX as u64 - 1);
        let span = magnitude * 2 + 1;
        (self.next_uint(span) as i128 - magnitude as i128) as i64
    }

    /// Random bytes, length in `min_len..=max_len`.
    fn random_bytes(&mut self, min_len: usize, max_len: usize) -> Vec<u8> {
        let span = max_len.saturating_sub(min_len);
        let len = min_len + self.next_index(span.saturating_add(1));
        let mut buf = vec![0u8; len];
        self.fill_random_bytes(&mut buf);
        buf
    }

    /// Printable ASCII string, length in `min_len..=max_len`.
    fn random_string(&mut self, min_len: usize, max_len: usize) -> String {
        self.random_bytes(min_len, max_len)
            .into_iter()
            .map(|b| char::from(b' ' + b % 95))
            .collect()
    }
}

impl<R: rand::RngCore> RandomSource for R {
    #[inline]
    fn next_uint(&mut self, bound: u64) -> u64 {
        if bound == 0 {
            return 0;
        }
        self.gen_range(0..bound)
    }

    #[inline]
    fn fill_random_bytes(&mut self, buf: &mut [u8]) {
        self.fill_bytes(buf);
    }
}
