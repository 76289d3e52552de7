use ndarray::ArrayView3;

use crate::shared::region::Region;

/// A single captured frame: contiguous pixel bytes in row-major order.
///
/// One channel means gray, three means RGB. Format conversion happens at
/// I/O boundaries; everything downstream works on this type.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
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
        self.width == 0 || self.height == 0
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Single-channel copy of this frame.
    ///
    /// RGB uses BT.601 weights in 14-bit fixed point so the result is
    /// bit-exact across platforms. For one or two channels the first
    /// channel is taken as-is.
    pub fn to_gray(&self) -> Frame {
        let channels = self.channels.max(1) as usize;
        if channels == 1 {
            return self.clone();
        }
        let gray: Vec<u8> = self
            .data
            .chunks_exact(channels)
            .map(|px| {
                if channels < 3 {
                    px[0]
                } else {
                    let r = px[0] as u32;
                    let g = px[1] as u32;
                    let b = px[2] as u32;
                    ((r * 4899 + g * 9617 + b * 1868 + (1 << 13)) >> 14) as u8
                }
            })
            .collect();
        Frame::new(gray, self.width, self.height, 1, self.index)
    }

    /// Copies the part of the frame covered by `region`.
    ///
    /// The region is clamped to the frame first; a region entirely outside
    /// the frame yields an empty frame.
    pub fn crop(&self, region: &Region) -> Frame {
        let channels = self.channels as usize;
        let Some(r) = region.clamp_to(self.width, self.height) else {
            return Frame::new(Vec::new(), 0, 0, self.channels, self.index);
        };

        let x1 = r.x as usize;
        let y1 = r.y as usize;
        let w = r.width as usize;
        let h = r.height as usize;
        let stride = self.width as usize * channels;

        let mut data = Vec::with_capacity(w * h * channels);
        for row in y1..y1 + h {
            let start = row * stride + x1 * channels;
            data.extend_from_slice(&self.data[start..start + w * channels]);
        }

        Frame::new(data, w as u32, h as u32, self.channels, self.index)
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}
