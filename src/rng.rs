use std::collections::HashMap;

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

/// Master generator that hands each stage its own stream.
///
/// A stream is derived from the master the first time its name is requested,
/// so results depend only on the seed and the order stages are first run.
pub struct RngManager {
    master: ChaCha8Rng,
    streams: HashMap<String, ChaCha8Rng>,
}

impl RngManager {
    pub fn new(seed: u64) -> Self {
        Self {
            master: ChaCha8Rng::seed_from_u64(seed),
            streams: HashMap::new(),
        }
    }

    pub fn stream(&mut self, name: &str) -> StageRng<'_> {
        let master = &mut self.master;
        let inner = self.streams.entry(name.to_string()).or_insert_with(|| {
            let mut seed_bytes = [0u8; 8];
            master.fill_bytes(&mut seed_bytes);
            let seed = u64::from_le_bytes(seed_bytes);
            debug!(stream = name, seed, "derived stage rng stream");
            ChaCha8Rng::seed_from_u64(seed)
        });
        StageRng {
            name: name.to_string(),
            inner,
        }
    }
}

/// A stage's view of its named stream.
pub struct StageRng<'a> {
    name: String,
    inner: &'a mut ChaCha8Rng,
}

impl StageRng<'_> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position in the stream, in 32-bit words drawn since it was derived.
    pub fn word_pos(&self) -> u128 {
        self.inner.get_word_pos()
    }
}

impl<'a> RngCore for StageRng<'a> {
    fn next_u32(&mut self) -> u32 {
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.inner.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.inner.try_fill_bytes(dest)
    }
}
