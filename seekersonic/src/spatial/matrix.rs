/// Output level table of a voice: one gain per (source channel, destination channel).
#[derive(Debug, Clone, PartialEq)]
pub struct GainMatrix {
    source_channels: usize,
    dest_channels: usize,
    /// Row-major by destination: `levels[dst * source_channels + src]`
    levels: Vec<f32>,
}

impl GainMatrix {
    /// All-zero matrix, the silent-output result.
    pub fn silent(source_channels: usize, dest_channels: usize) -> Self {
        Self {
            source_channels,
            dest_channels,
            levels: vec![0.0; source_channels * dest_channels],
        }
    }

    /// Single-source-channel matrix with the given per-destination gains.
    pub fn from_row(gains: Vec<f32>) -> Self {
        Self {
            source_channels: 1,
            dest_channels: gains.len(),
            levels: gains,
        }
    }

    /// Default routing of an unplaced voice.
    ///
    /// Mono fans out to every destination at full level, a source with as many
    /// channels as the destination maps straight through, anything else wraps.
    pub fn passthrough(source_channels: usize, dest_channels: usize) -> Self {
        let mut matrix = Self::silent(source_channels, dest_channels);
        if source_channels == 1 {
            matrix.levels.fill(1.0);
            return matrix;
        }
        for src in 0..source_channels {
            if dest_channels > 0 {
                matrix.set(src, src % dest_channels, 1.0);
            }
        }
        matrix
    }

    pub fn source_channels(&self) -> usize {
        self.source_channels
    }

    pub fn dest_channels(&self) -> usize {
        self.dest_channels
    }

    #[inline]
    pub fn level(&self, src: usize, dst: usize) -> f32 {
        if src >= self.source_channels || dst >= self.dest_channels {
            return 0.0;
        }
        self.levels[dst * self.source_channels + src]
    }

    pub fn set(&mut self, src: usize, dst: usize, level: f32) {
        if src < self.source_channels && dst < self.dest_channels {
            self.levels[dst * self.source_channels + src] = level;
        }
    }

    /// Gains of source channel 0, one per destination.
    pub fn row(&self) -> Vec<f32> {
        (0..self.dest_channels).map(|dst| self.level(0, dst)).collect()
    }

    pub fn is_silent(&self) -> bool {
        self.levels.iter().all(|&l| l == 0.0)
    }

    /// Repeat a single-channel matrix for a source with `source_channels` channels.
    ///
    /// A matrix that already has that many source channels is returned unchanged.
    pub fn broadcast_to(&self, source_channels: usize) -> Self {
        if self.source_channels == source_channels || self.source_channels != 1 {
            return self.clone();
        }
        let mut out = Self::silent(source_channels, self.dest_channels);
        for dst in 0..self.dest_channels {
            for src in 0..source_channels {
                out.set(src, dst, self.level(0, dst));
            }
        }
        out
    }

    /// Every level multiplied by `gain`.
    pub fn scaled(&self, gain: f32) -> Self {
        Self {
            source_channels: self.source_channels,
            dest_channels: self.dest_channels,
            levels: self.levels.iter().map(|l| l * gain).collect(),
        }
    }
}
