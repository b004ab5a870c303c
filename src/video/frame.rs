//! Video frames.
//!
//! A frame is one inbound message of the frame channel, kept exactly as
//! received. Text frames are normally data URLs such as
//! `data:image/jpeg;base64,/9j/4AAQ...`; binary frames hold encoded image
//! bytes.

// ============================================================================
// Imports
// ============================================================================

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Instant;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::DynamicImage;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

const DATA_URL_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

// ============================================================================
// FrameData
// ============================================================================

/// Frame payload as received.
///
/// Cheap to clone; the payload is shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameData {
    /// Text frame, normally a data URL.
    Text(Arc<str>),
    /// Binary frame holding encoded image bytes.
    Binary(Arc<[u8]>),
}

// ============================================================================
// Frame
// ============================================================================

/// One received frame.
#[derive(Debug, Clone)]
pub struct Frame {
    data: FrameData,
    sequence: u64,
    received_at: Instant,
}

impl Frame {
    /// Creates a frame stamped with the current time.
    #[must_use]
    pub fn new(data: FrameData, sequence: u64) -> Self {
        Self {
            data,
            sequence,
            received_at: Instant::now(),
        }
    }

    /// Returns the raw payload.
    #[inline]
    #[must_use]
    pub fn data(&self) -> &FrameData {
        &self.data
    }

    /// Returns the 1-based position of the frame in its stream.
    #[inline]
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Returns when the frame arrived.
    #[inline]
    #[must_use]
    pub fn received_at(&self) -> Instant {
        self.received_at
    }

    /// Returns the payload size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        match &self.data {
            FrameData::Text(text) => text.len(),
            FrameData::Binary(bytes) => bytes.len(),
        }
    }

    /// Returns `true` if the payload is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the frame's MIME type.
    ///
    /// Taken from the data URL header for text frames, sniffed from the
    /// magic bytes for binary frames.
    #[must_use]
    pub fn mime_type(&self) -> Option<&str> {
        match &self.data {
            FrameData::Text(text) => {
                let header = text.strip_prefix(DATA_URL_PREFIX)?;
                let end = header.find([';', ','])?;
                Some(&header[..end]).filter(|mime| !mime.is_empty())
            }
            FrameData::Binary(bytes) => image::guess_format(&bytes[..])
                .ok()
                .map(|format| format.to_mime_type()),
        }
    }

    /// Returns the encoded image bytes.
    ///
    /// # Errors
    ///
    /// - [`Error::Frame`] if a text frame is not a base64 data URL
    /// - [`Error::Base64`] if the base64 body is invalid
    pub fn decode_bytes(&self) -> Result<Cow<'_, [u8]>> {
        match &self.data {
            FrameData::Binary(bytes) => Ok(Cow::Borrowed(&bytes[..])),
            FrameData::Text(text) => {
                let body = text
                    .strip_prefix(DATA_URL_PREFIX)
                    .and_then(|rest| rest.split_once(BASE64_MARKER))
                    .map(|(_, body)| body)
                    .ok_or_else(|| Error::frame("text frame is not a base64 data URL"))?;

                Ok(Cow::Owned(STANDARD.decode(body)?))
            }
        }
    }

    /// Decodes the frame into an image.
    ///
    /// # Errors
    ///
    /// - Any error of [`decode_bytes`](Self::decode_bytes)
    /// - [`Error::Image`] if the bytes are not a supported image
    pub fn decode_image(&self) -> Result<DynamicImage> {
        let bytes = self.decode_bytes()?;
        Ok(image::load_from_memory(&bytes)?)
    }

    /// Returns the decoded image's width and height.
    ///
    /// # Errors
    ///
    /// Same as [`decode_image`](Self::decode_image).
    pub fn dimensions(&self) -> Result<(u32, u32)> {
        let image = self.decode_image()?;
        Ok((image.width(), image.height()))
    }
}

// ============================================================================
// Tests
// ============================================================================
