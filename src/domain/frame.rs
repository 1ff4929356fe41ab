use image::{ImageBuffer, Rgb, RgbImage};

/// 像素緩衝區的通道排列
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOrder {
    Bgr,
    Rgb,
}

impl ChannelOrder {
    /// Writes an RGB color in this channel order.
    pub fn pixel(self, rgb: [u8; 3]) -> Rgb<u8> {
        match self {
            ChannelOrder::Rgb => Rgb(rgb),
            ChannelOrder::Bgr => Rgb([rgb[2], rgb[1], rgb[0]]),
        }
    }
}

/// A caller-owned 8-bit, three-channel pixel buffer.
///
/// Construction never rejects a buffer; whether it is usable is decided by
/// frame validation, so a malformed capture surfaces as feedback instead of a
/// constructor error.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    width: u32,
    height: u32,
    order: ChannelOrder,
    data: Vec<u8>,
}

impl Frame {
    pub const CHANNELS: usize = 3;

    pub fn from_raw(width: u32, height: u32, order: ChannelOrder, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            order,
            data,
        }
    }

    pub fn from_rgb_image(image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self::from_raw(width, height, ChannelOrder::Rgb, image.into_raw())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn order(&self) -> ChannelOrder {
        self.order
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn byte_size(&self) -> usize {
        self.data.len()
    }

    /// 依寬高推算的位元組數；溢位時為 None
    pub fn expected_size(&self) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)?
            .checked_mul(Self::CHANNELS)
    }

    pub fn has_consistent_size(&self) -> bool {
        self.expected_size() == Some(self.data.len())
    }

    /// Copies the buffer into RGB order for the detector.
    pub fn to_rgb_image(&self) -> Option<RgbImage> {
        if !self.has_consistent_size() {
            return None;
        }
        let data = match self.order {
            ChannelOrder::Rgb => self.data.clone(),
            ChannelOrder::Bgr => self
                .data
                .chunks_exact(Self::CHANNELS)
                .flat_map(|px| [px[2], px[1], px[0]])
                .collect(),
        };
        ImageBuffer::from_raw(self.width, self.height, data)
    }

    /// In-place view over the raw channels, in this frame's own order.
    pub fn as_image_mut(&mut self) -> Option<ImageBuffer<Rgb<u8>, &mut [u8]>> {
        if !self.has_consistent_size() {
            return None;
        }
        ImageBuffer::from_raw(self.width, self.height, self.data.as_mut_slice())
    }
}
