//! Virtual cursor: a short rolling history of paint hits.
//!
//! The history is used to infer which way the user is painting, so the
//! reference cursor can flow ahead of the stroke onto the next cell. It resets
//! whenever the stroke doubles back.

use glam::Vec3;

use crate::constants::VIRTUAL_CURSOR_CAPACITY;

/// What happened to a sample passed to [`VirtualCursor::add_sample`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOutcome {
    /// History was empty; the sample starts a new run
    Started,
    /// Sample continued the current direction
    Appended,
    /// Sample reversed direction; history was cleared before recording it
    Reset,
    /// Sample was too close to the previous one and was dropped
    Ignored,
}

/// Fixed-capacity ring buffer of world-space hit positions
#[derive(Debug, Clone)]
pub struct VirtualCursor {
    samples: [Vec3; VIRTUAL_CURSOR_CAPACITY],
    /// Index of the oldest sample
    head: usize,
    len: usize,
    min_motion: f32,
}

impl VirtualCursor {
    /// Create an empty history that ignores moves shorter than `min_motion`
    pub fn new(min_motion: f32) -> Self {
        Self {
            samples: [Vec3::ZERO; VIRTUAL_CURSOR_CAPACITY],
            head: 0,
            len: 0,
            min_motion,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    /// Sample at logical position `index` (0 = oldest)
    pub fn get(&self, index: usize) -> Option<Vec3> {
        (index < self.len).then(|| self.samples[(self.head + index) % VIRTUAL_CURSOR_CAPACITY])
    }

    /// Most recent sample
    pub fn last(&self) -> Option<Vec3> {
        self.len.checked_sub(1).and_then(|i| self.get(i))
    }

    /// Samples from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = Vec3> + '_ {
        (0..self.len).filter_map(|i| self.get(i))
    }

    /// Record a hit position.
    ///
    /// Moves shorter than the motion threshold are ignored. A move that
    /// points against the current direction clears the history first.
    pub fn add_sample(&mut self, position: Vec3) -> SampleOutcome {
        let Some(last) = self.last() else {
            self.push(position);
            return SampleOutcome::Started;
        };

        let step = position - last;
        if step.length() < self.min_motion {
            return SampleOutcome::Ignored;
        }

        let outcome = if self.direction().dot(step) < 0.0 {
            self.clear();
            SampleOutcome::Reset
        } else {
            SampleOutcome::Appended
        };
        self.push(position);
        outcome
    }

    fn push(&mut self, position: Vec3) {
        if self.len < VIRTUAL_CURSOR_CAPACITY {
            self.samples[(self.head + self.len) % VIRTUAL_CURSOR_CAPACITY] = position;
            self.len += 1;
        } else {
            // Overwrite the oldest sample
            self.samples[self.head] = position;
            self.head = (self.head + 1) % VIRTUAL_CURSOR_CAPACITY;
        }
    }

    /// Mean of the steps between consecutive samples (zero with fewer than two)
    pub fn direction(&self) -> Vec3 {
        if self.len < 2 {
            return Vec3::ZERO;
        }
        let mut sum = Vec3::ZERO;
        for i in 0..self.len - 1 {
            if let (Some(a), Some(b)) = (self.get(i), self.get(i + 1)) {
                sum += b - a;
            }
        }
        sum / (self.len - 1) as f32
    }

    /// Predict where the cursor goes next on a face.
    ///
    /// Scores each vertex (world space) by `|1 - dot(unit(vertex - cursor), travel)|`
    /// and returns the best-aligned one. Returns `None` with fewer than two
    /// samples or no usable direction.
    pub fn predict_next_on_face(&self, face_vertices: &[Vec3], cursor: Vec3) -> Option<Vec3> {
        if self.len <= 1 {
            return None;
        }
        let travel = self.direction().normalize_or_zero();
        if travel == Vec3::ZERO {
            return None;
        }

        face_vertices
            .iter()
            .map(|&vertex| {
                let to_vertex = (vertex - cursor).normalize_or_zero();
                (vertex, (1.0 - to_vertex.dot(travel)).abs())
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(vertex, _)| vertex)
    }
}
