use crate::env::{RgbFrame, ScreenDims};
use crate::error::{Error, Result};
use image::{ExtendedColorType, codecs::jpeg::JpegEncoder};
use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

/// Receives the frames of one video and finalizes the container.
pub trait VideoSink {
    fn write_frame(&mut self, frame: &RgbFrame) -> Result<()>;

    /// Flushes and closes the container. Must run on every exit path; a sink
    /// dropped without `finish` finalizes best-effort.
    fn finish(&mut self) -> Result<()>;
}

/// Opens video sinks at a path, frame rate and frame size.
pub trait VideoBackend {
    type Sink: VideoSink;

    fn open(&self, path: &Path, fps: u32, dims: ScreenDims) -> Result<Self::Sink>;
}

/// MJPG-in-AVI backend: frames are JPEG encoded and muxed into a RIFF/AVI
/// container with an `idx1` index.
#[derive(Debug, Clone, Copy)]
pub struct MjpgAvi {
    pub quality: u8,
}

impl Default for MjpgAvi {
    fn default() -> Self {
        Self { quality: 90 }
    }
}

impl VideoBackend for MjpgAvi {
    type Sink = AviWriter;

    fn open(&self, path: &Path, fps: u32, dims: ScreenDims) -> Result<AviWriter> {
        AviWriter::create(path, fps, dims, self.quality)
    }
}

const AVIF_HASINDEX: u32 = 0x10;
const AVIIF_KEYFRAME: u32 = 0x10;

// Byte offsets of the header fields patched on finish. The header layout is
// fixed: one MJPG video stream, 224 bytes up to the start of `movi` data.
const RIFF_SIZE_POS: u64 = 4;
const TOTAL_FRAMES_POS: u64 = 48;
const AVIH_BUF_POS: u64 = 60;
const STRH_LENGTH_POS: u64 = 140;
const STRH_BUF_POS: u64 = 144;
const MOVI_SIZE_POS: u64 = 216;
const MOVI_FOURCC_POS: u64 = 220;

pub struct AviWriter {
    out: BufWriter<File>,
    dims: ScreenDims,
    quality: u8,
    // (offset relative to the `movi` fourcc, chunk size) per frame
    index: Vec<(u32, u32)>,
    max_frame: u32,
    finished: bool,
}

impl AviWriter {
    pub fn create(path: &Path, fps: u32, dims: ScreenDims, quality: u8) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out = BufWriter::new(File::create(path)?);
        let (w, h) = (dims.width, dims.height);
        let usec_per_frame = if fps == 0 { 0 } else { 1_000_000 / fps };

        out.write_all(b"RIFF")?;
        out.write_all(&0u32.to_le_bytes())?;
        out.write_all(b"AVI ")?;

        out.write_all(b"LIST")?;
        out.write_all(&192u32.to_le_bytes())?;
        out.write_all(b"hdrl")?;
        out.write_all(b"avih")?;
        out.write_all(&56u32.to_le_bytes())?;
        // microsec/frame, max bytes/sec, padding, flags, total frames,
        // initial frames, streams, buffer size, width, height, reserved[4]
        for value in [
            usec_per_frame,
            0,
            0,
            AVIF_HASINDEX,
            0,
            0,
            1,
            0,
            w,
            h,
            0,
            0,
            0,
            0,
        ] {
            out.write_all(&value.to_le_bytes())?;
        }

        out.write_all(b"LIST")?;
        out.write_all(&116u32.to_le_bytes())?;
        out.write_all(b"strl")?;
        out.write_all(b"strh")?;
        out.write_all(&56u32.to_le_bytes())?;
        out.write_all(b"vids")?;
        out.write_all(b"MJPG")?;
        // flags, priority+language, initial frames, scale, rate, start,
        // length, buffer size, quality, sample size
        for value in [0u32, 0, 0, 1, fps, 0, 0, 0, u32::MAX, 0] {
            out.write_all(&value.to_le_bytes())?;
        }
        for value in [0u16, 0, w as u16, h as u16] {
            out.write_all(&value.to_le_bytes())?;
        }
        out.write_all(b"strf")?;
        out.write_all(&40u32.to_le_bytes())?;
        for value in [40u32, w, h] {
            out.write_all(&value.to_le_bytes())?;
        }
        for value in [1u16, 24] {
            out.write_all(&value.to_le_bytes())?;
        }
        out.write_all(b"MJPG")?;
        for value in [w * h * 3, 0, 0, 0, 0] {
            out.write_all(&value.to_le_bytes())?;
        }

        out.write_all(b"LIST")?;
        out.write_all(&0u32.to_le_bytes())?;
        out.write_all(b"movi")?;

        Ok(Self {
            out,
            dims,
            quality,
            index: Vec::new(),
            max_frame: 0,
            finished: false,
        })
    }

    fn patch(&mut self, pos: u64, value: u32) -> Result<()> {
        self.out.seek(SeekFrom::Start(pos))?;
        self.out.write_all(&value.to_le_bytes())?;
        Ok(())
    }
}

impl VideoSink for AviWriter {
    fn write_frame(&mut self, frame: &RgbFrame) -> Result<()> {
        if (frame.width, frame.height) != (self.dims.width, self.dims.height) {
            return Err(Error::Environment(format!(
                "frame {}x{} does not match video dimensions {}",
                frame.width, frame.height, self.dims
            )));
        }
        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, self.quality).encode(
            &frame.data,
            frame.width,
            frame.height,
            ExtendedColorType::Rgb8,
        )?;
        let size = jpeg.len() as u32;
        let pos = self.out.stream_position()?;
        self.index.push(((pos - MOVI_FOURCC_POS) as u32, size));
        self.out.write_all(b"00dc")?;
        self.out.write_all(&size.to_le_bytes())?;
        self.out.write_all(&jpeg)?;
        if size % 2 == 1 {
            self.out.write_all(&[0])?;
        }
        self.max_frame = self.max_frame.max(size);
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        let movi_end = self.out.stream_position()?;
        let movi_size = (movi_end - MOVI_FOURCC_POS) as u32;
        self.out.write_all(b"idx1")?;
        self.out
            .write_all(&((self.index.len() * 16) as u32).to_le_bytes())?;
        for &(offset, size) in &self.index {
            self.out.write_all(b"00dc")?;
            self.out.write_all(&AVIIF_KEYFRAME.to_le_bytes())?;
            self.out.write_all(&offset.to_le_bytes())?;
            self.out.write_all(&size.to_le_bytes())?;
        }
        let file_end = self.out.stream_position()?;
        let frames = self.index.len() as u32;
        let max_frame = self.max_frame;
        self.patch(RIFF_SIZE_POS, (file_end - 8) as u32)?;
        self.patch(TOTAL_FRAMES_POS, frames)?;
        self.patch(AVIH_BUF_POS, max_frame)?;
        self.patch(STRH_LENGTH_POS, frames)?;
        self.patch(STRH_BUF_POS, max_frame)?;
        self.patch(MOVI_SIZE_POS, movi_size)?;
        self.out.seek(SeekFrom::Start(file_end))?;
        self.out.flush()?;
        self.finished = true;
        Ok(())
    }
}

impl Drop for AviWriter {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.finish();
        }
    }
}
