//! FIFO replay buffer with uniform random batch sampling.
use super::{ReplayBufferConfig, Transition, TransitionBatch};
use crate::TrpoError;
use anyhow::Result;
use log::info;
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

/// Serialized form of the buffer contents.
///
/// Transitions are stored oldest-first, so a round-trip through
/// [`ReplayBuffer::save`] and [`ReplayBuffer::load`] preserves insertion
/// order. The capacity is recorded so that a load into a buffer of a
/// different size can be rejected.
#[derive(Deserialize, Serialize)]
struct BufferState {
    capacity: usize,
    transitions: Vec<Transition>,
}

/// A fixed-capacity FIFO experience replay buffer.
///
/// Transitions are kept in a ring; once `capacity` transitions have been
/// pushed, every further push overwrites the oldest entry. Batches are drawn
/// uniformly at random without replacement over the currently stored range.
#[derive(Debug)]
pub struct ReplayBuffer {
    /// Maximum number of transitions that can be stored.
    capacity: usize,

    /// Current insertion index.
    i: usize,

    /// Current number of stored transitions.
    size: usize,

    /// Ring storage, at most `capacity` entries.
    entries: Vec<Transition>,

    /// Random number generator for sampling.
    rng: StdRng,
}

impl ReplayBuffer {
    /// Creates a new replay buffer with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TrpoError::InvalidCapacity`] if the configured capacity is
    /// zero.
    pub fn build(config: &ReplayBufferConfig) -> Result<Self> {
        if config.capacity == 0 {
            return Err(TrpoError::InvalidCapacity(config.capacity).into());
        }

        Ok(Self {
            capacity: config.capacity,
            i: 0,
            size: 0,
            entries: Vec::with_capacity(config.capacity),
            rng: StdRng::seed_from_u64(config.seed),
        })
    }

    /// Returns the current number of stored transitions.
    pub fn len(&self) -> usize {
        self.size
    }

    /// Returns `true` if no transitions are stored.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns the maximum number of transitions that can be stored.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Adds a transition to the buffer, evicting the oldest one when full.
    pub fn push(&mut self, tr: Transition) {
        if self.entries.len() < self.capacity {
            self.entries.push(tr);
        } else {
            self.entries[self.i] = tr;
        }

        self.i = (self.i + 1) % self.capacity;
        self.size += 1;
        if self.size >= self.capacity {
            self.size = self.capacity;
        }
    }

    /// Iterates over the stored transitions, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        let start = if self.size < self.capacity { 0 } else { self.i };
        (0..self.size).map(move |k| &self.entries[(start + k) % self.capacity])
    }

    /// Samples a batch of transitions uniformly at random without replacement.
    ///
    /// A batch size of zero yields an empty batch.
    ///
    /// # Errors
    ///
    /// Returns [`TrpoError::InsufficientData`] if `size` exceeds the number
    /// of stored transitions.
    pub fn batch(&mut self, size: usize) -> Result<TransitionBatch> {
        if size > self.size {
            return Err(TrpoError::InsufficientData {
                requested: size,
                available: self.size,
            }
            .into());
        }

        let ixs = rand::seq::index::sample(&mut self.rng, self.size, size);

        let mut obs = Vec::with_capacity(size);
        let mut act = Vec::with_capacity(size);
        let mut reward = Vec::with_capacity(size);
        let mut next_obs = Vec::with_capacity(size);
        let mut is_terminated = Vec::with_capacity(size);

        for ix in ixs.iter() {
            let tr = &self.entries[ix];
            obs.push(tr.obs.clone());
            act.push(tr.act.clone());
            reward.push(tr.reward);
            next_obs.push(tr.next_obs.clone());
            is_terminated.push(tr.is_terminated as f32);
        }

        Ok(TransitionBatch {
            obs,
            act,
            reward,
            next_obs,
            is_terminated,
        })
    }

    /// Saves the stored transitions to a binary file, oldest first.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let state = BufferState {
            capacity: self.capacity,
            transitions: self.iter().cloned().collect(),
        };
        let file = File::create(path.as_ref())?;
        bincode::serialize_into(BufWriter::new(file), &state)?;
        info!(
            "Save replay buffer ({} transitions) to {:?}",
            state.transitions.len(),
            path.as_ref()
        );
        Ok(())
    }

    /// Restores transitions persisted with [`ReplayBuffer::save`], replacing
    /// the current contents.
    ///
    /// # Errors
    ///
    /// Returns [`TrpoError::CapacityMismatch`] if the stored state was saved
    /// from a buffer of a different capacity. The live buffer is left
    /// untouched in that case.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::open(path.as_ref())?;
        let state: BufferState = bincode::deserialize_from(BufReader::new(file))?;

        if state.capacity != self.capacity {
            return Err(TrpoError::CapacityMismatch {
                expected: self.capacity,
                found: state.capacity,
            }
            .into());
        }

        self.size = state.transitions.len();
        self.i = self.size % self.capacity;
        self.entries = state.transitions;
        info!(
            "Load replay buffer ({} transitions) from {:?}",
            self.size,
            path.as_ref()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    fn tr(tag: f32) -> Transition {
        Transition {
            obs: vec![tag, tag + 0.1],
            act: vec![0.0],
            reward: tag,
            next_obs: vec![tag + 0.2, tag + 0.3],
            is_terminated: 0,
        }
    }

    #[test]
    fn zero_capacity_rejected() {
        let err = ReplayBuffer::build(&ReplayBufferConfig::default().capacity(0)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TrpoError>(),
            Some(TrpoError::InvalidCapacity(0))
        ));
    }

    #[test]
    fn fifo_eviction_keeps_most_recent() -> Result<()> {
        let mut buffer = ReplayBuffer::build(&ReplayBufferConfig::default().capacity(3))?;
        for k in 1..=5 {
            buffer.push(tr(k as f32));
            assert!(buffer.len() <= 3);
        }

        assert_eq!(buffer.len(), 3);
        let rewards: Vec<f32> = buffer.iter().map(|t| t.reward).collect();
        assert_eq!(rewards, vec![3.0, 4.0, 5.0]);
        Ok(())
    }

    #[test]
    fn batch_draws_distinct_transitions() -> Result<()> {
        let mut buffer = ReplayBuffer::build(&ReplayBufferConfig::default().capacity(16))?;
        for k in 0..10 {
            buffer.push(tr(k as f32));
        }

        let batch = buffer.batch(10)?;
        assert_eq!(batch.len(), 10);
        let mut rewards = batch.reward.clone();
        rewards.sort_by(|a, b| a.partial_cmp(b).unwrap());
        rewards.dedup();
        assert_eq!(rewards.len(), 10);
        Ok(())
    }

    #[test]
    fn batch_is_roughly_uniform() -> Result<()> {
        let mut buffer = ReplayBuffer::build(&ReplayBufferConfig::default().capacity(8))?;
        for k in 0..8 {
            buffer.push(tr(k as f32));
        }

        let mut counts = [0usize; 8];
        for _ in 0..1000 {
            let batch = buffer.batch(2)?;
            for r in batch.reward {
                counts[r as usize] += 1;
            }
        }

        // 2000 draws over 8 slots, 250 expected per slot.
        for &c in counts.iter() {
            assert!(c > 150 && c < 350, "counts not near uniform: {:?}", counts);
        }
        Ok(())
    }

    #[test]
    fn oversized_batch_fails() -> Result<()> {
        let mut buffer = ReplayBuffer::build(&ReplayBufferConfig::default().capacity(4))?;
        buffer.push(tr(0.0));

        let err = buffer.batch(2).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TrpoError>(),
            Some(TrpoError::InsufficientData {
                requested: 2,
                available: 1
            })
        ));
        Ok(())
    }

    #[test]
    fn empty_batch_is_ok() -> Result<()> {
        let mut buffer = ReplayBuffer::build(&ReplayBufferConfig::default().capacity(4))?;
        let batch = buffer.batch(0)?;
        assert!(batch.is_empty());
        Ok(())
    }

    #[test]
    fn save_load_round_trip() -> Result<()> {
        let dir = TempDir::new("replay_buffer")?;
        let path = dir.path().join("buffer.bincode");

        let mut buffer = ReplayBuffer::build(&ReplayBufferConfig::default().capacity(3))?;
        for k in 1..=5 {
            buffer.push(tr(k as f32));
        }
        buffer.save(&path)?;

        let mut restored = ReplayBuffer::build(&ReplayBufferConfig::default().capacity(3))?;
        restored.load(&path)?;

        assert_eq!(restored.len(), 3);
        let original: Vec<Transition> = buffer.iter().cloned().collect();
        let loaded: Vec<Transition> = restored.iter().cloned().collect();
        assert_eq!(original, loaded);
        Ok(())
    }

    #[test]
    fn load_with_different_capacity_fails() -> Result<()> {
        let dir = TempDir::new("replay_buffer")?;
        let path = dir.path().join("buffer.bincode");

        let mut buffer = ReplayBuffer::build(&ReplayBufferConfig::default().capacity(3))?;
        buffer.push(tr(1.0));
        buffer.save(&path)?;

        let mut other = ReplayBuffer::build(&ReplayBufferConfig::default().capacity(5))?;
        let err = other.load(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TrpoError>(),
            Some(TrpoError::CapacityMismatch {
                expected: 5,
                found: 3
            })
        ));
        // The failed load must not clobber the live buffer.
        assert_eq!(other.len(), 0);
        Ok(())
    }

    #[test]
    fn push_after_load_continues_fifo() -> Result<()> {
        let dir = TempDir::new("replay_buffer")?;
        let path = dir.path().join("buffer.bincode");

        let mut buffer = ReplayBuffer::build(&ReplayBufferConfig::default().capacity(3))?;
        for k in 1..=2 {
            buffer.push(tr(k as f32));
        }
        buffer.save(&path)?;

        let mut restored = ReplayBuffer::build(&ReplayBufferConfig::default().capacity(3))?;
        restored.load(&path)?;
        for k in 3..=4 {
            restored.push(tr(k as f32));
        }

        let rewards: Vec<f32> = restored.iter().map(|t| t.reward).collect();
        assert_eq!(rewards, vec![2.0, 3.0, 4.0]);
        Ok(())
    }
}
