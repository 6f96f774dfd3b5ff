use ndarray::ArrayView3;

/// A single captured frame: contiguous pixel bytes in row-major order.
///
/// Video sources and image loaders produce RGBA (4 channels). Conversion
/// from decoder formats happens at I/O boundaries only.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    /// Sources are not trusted to size `data` correctly; consumers check
    /// [`Frame::is_well_formed`] before indexing into it.
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    /// Convenience constructor for the 4-channel layout used by capture sources.
    pub fn rgba(data: Vec<u8>, width: u32, height: u32, index: usize) -> Self {
        Self::new(data, width, height, 4, index)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.data.is_empty()
    }

    /// At least one channel and exactly `width * height * channels` bytes.
    pub fn is_well_formed(&self) -> bool {
        let (h, w, c) = self.shape();
        c > 0 && self.data.len() == w * h * c
    }

    /// Whether two frames share dimensions and channel layout.
    pub fn same_layout(&self, other: &Frame) -> bool {
        self.width == other.width && self.height == other.height && self.channels == other.channels
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Packed RGB bytes with any alpha channel dropped.
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        let channels = self.channels as usize;
        if channels == 3 {
            return self.data.clone();
        }
        let mut rgb = Vec::with_capacity((self.width as usize) * (self.height as usize) * 3);
        for px in self.data.chunks_exact(channels) {
            match channels {
                1 | 2 => rgb.extend_from_slice(&[px[0], px[0], px[0]]),
                _ => rgb.extend_from_slice(&px[..3]),
            }
        }
        rgb
    }

    /// Copies the rectangle `(x, y, w, h)` into a new frame, clamped to bounds.
    pub fn crop(&self, x: u32, y: u32, w: u32, h: u32) -> Frame {
        let x = x.min(self.width);
        let y = y.min(self.height);
        let w = w.min(self.width - x);
        let h = h.min(self.height - y);
        let channels = self.channels as usize;
        let row_bytes = self.width as usize * channels;

        let mut data = Vec::with_capacity(w as usize * h as usize * channels);
        for row in y..y + h {
            let start = row as usize * row_bytes + x as usize * channels;
            data.extend_from_slice(&self.data[start..start + w as usize * channels]);
        }
        Frame::new(data, w, h, self.channels, self.index)
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}
