/// A data point of one scan that cleared both the noise level and the
/// chromatographic threshold of its m/z bin.
///
/// Lives only for the scan it was detected in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OneDimPeak {
    pub scan_index: usize,
    /// Position of the point in the scan arrays.
    pub datapoint_index: usize,
    pub mz: f64,
    pub intensity: f64,
    connected: bool,
}

impl OneDimPeak {
    pub fn new(scan_index: usize, datapoint_index: usize, mz: f64, intensity: f64) -> Self {
        Self {
            scan_index,
            datapoint_index,
            mz,
            intensity,
            connected: false,
        }
    }

    pub fn set_connected(&mut self) {
        self.connected = true;
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }
}
