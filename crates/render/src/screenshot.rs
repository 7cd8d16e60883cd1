//! Copying rendered frames back to the CPU and saving them as PNG.

use std::path::Path;
use std::sync::mpsc;

use anyhow::{bail, Context, Result};

/// A captured frame as tightly packed RGBA8 rows, top row first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameCapture {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// RGBA8 pixels.
    pub rgba: Vec<u8>,
}

impl FrameCapture {
    /// Queue a copy of `target` into a mappable buffer on `encoder`.
    ///
    /// Submit the encoder, then call [`PendingCapture::finish`].
    pub fn record(
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::Texture,
    ) -> Result<PendingCapture> {
        let swap_red_blue = match target.format() {
            wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Rgba8UnormSrgb => false,
            wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb => true,
            other => bail!("cannot capture frames in {other:?}"),
        };

        let (width, height) = (target.width(), target.height());
        // Buffer rows must be aligned; the padding is dropped in `finish`.
        let row_pitch = (width * 4).next_multiple_of(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Frame Capture Buffer"),
            size: u64::from(row_pitch) * u64::from(height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        encoder.copy_texture_to_buffer(
            target.as_image_copy(),
            wgpu::ImageCopyBuffer {
                buffer: &buffer,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(row_pitch),
                    rows_per_image: Some(height),
                },
            },
            target.size(),
        );

        Ok(PendingCapture {
            buffer,
            row_pitch,
            width,
            height,
            swap_red_blue,
        })
    }

    /// RGBA of the pixel at (`x`, `y`), or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = ((y * self.width + x) * 4) as usize;
        self.rgba.get(offset..offset + 4)?.try_into().ok()
    }

    /// Save the frame as a PNG, whatever the extension of `path`.
    pub fn save_png(&self, path: &Path) -> Result<()> {
        image::save_buffer_with_format(
            path,
            &self.rgba,
            self.width,
            self.height,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .with_context(|| format!("failed to write {}", path.display()))
    }
}

/// A frame copy that has been recorded but not yet read.
pub struct PendingCapture {
    buffer: wgpu::Buffer,
    row_pitch: u32,
    width: u32,
    height: u32,
    swap_red_blue: bool,
}

impl PendingCapture {
    /// Wait for the copy and unpack it into a [`FrameCapture`].
    pub fn finish(self, device: &wgpu::Device) -> Result<FrameCapture> {
        let slice = self.buffer.slice(..);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .context("frame capture was dropped before mapping")?
            .context("failed to map frame capture buffer")?;

        let row_bytes = (self.width * 4) as usize;
        let mut rgba = Vec::with_capacity(row_bytes * self.height as usize);
        {
            let mapped = slice.get_mapped_range();
            for row in mapped.chunks(self.row_pitch as usize) {
                rgba.extend_from_slice(&row[..row_bytes]);
            }
        }
        self.buffer.unmap();

        if self.swap_red_blue {
            rgba.chunks_exact_mut(4).for_each(|pixel| pixel.swap(0, 2));
        }

        Ok(FrameCapture {
            width: self.width,
            height: self.height,
            rgba,
        })
    }
}
