/// Log-spaced band edges in spectrum-bin units, computed once per `(sample_rate, frame_len)`.
#[derive(Clone, Debug)]
pub struct BandLayout {
    edges: Vec<usize>,
    low_hz: f64,
    high_hz: f64,
    bin_hz: f64,
}

/// Energy per band for one frame: sum of squared magnitudes over the band's bins.
#[derive(Clone, Debug, PartialEq)]
pub struct BandEnergies(pub Vec<f64>);

impl BandLayout {
    /// `edge[m] = floor(low * (high/low)^(m/bands) / (sample_rate / frame_len))` for m in `0..=bands`.
    pub fn new(sample_rate: u32, frame_len: usize, low_hz: f64, high_hz: f64, bands: usize) -> Self {
        let edges = (0..=bands)
            .map(|m| {
                let hz = band_edge_hz(low_hz, high_hz, m, bands);
                // hz / (rate / len), written so integral products stay exact
                (hz * frame_len as f64 / sample_rate as f64).floor() as usize
            })
            .collect();

        Self {
            edges,
            low_hz,
            high_hz,
            bin_hz: sample_rate as f64 / frame_len as f64,
        }
    }

    pub fn band_count(&self) -> usize {
        self.edges.len() - 1
    }

    pub fn edges(&self) -> &[usize] {
        &self.edges
    }

    /// Nominal frequency range of band `b` in Hz, before rounding to bins.
    pub fn band_range_hz(&self, b: usize) -> (f64, f64) {
        let bands = self.band_count();
        (
            band_edge_hz(self.low_hz, self.high_hz, b, bands),
            band_edge_hz(self.low_hz, self.high_hz, b + 1, bands),
        )
    }

    pub fn bin_hz(&self) -> f64 {
        self.bin_hz
    }

    /// Reduce a magnitude spectrum to per-band energies. Bins past the end
    /// of `magnitudes` are treated as absent; empty bands have energy 0.
    pub fn energies(&self, magnitudes: &[f64]) -> BandEnergies {
        let available = magnitudes.len();
        BandEnergies(
            self.edges
                .windows(2)
                .map(|edge| {
                    let lo = edge[0].min(available);
                    let hi = edge[1].min(available);
                    magnitudes[lo..hi].iter().map(|m| m * m).sum()
                })
                .collect(),
        )
    }
}

fn band_edge_hz(low_hz: f64, high_hz: f64, m: usize, bands: usize) -> f64 {
    low_hz * (high_hz / low_hz).powf(m as f64 / bands as f64)
}

impl BandEnergies {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Index of the band holding the most energy, or `None` when every band is zero.
    #[allow(dead_code)]
    pub fn dominant_band(&self) -> Option<usize> {
        let (idx, peak) = self
            .0
            .iter()
            .copied()
            .enumerate()
            .fold((0, 0.0f64), |best, (i, e)| if e > best.1 { (i, e) } else { best });
        (peak > 0.0).then_some(idx)
    }
}
