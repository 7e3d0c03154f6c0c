//! Multipart messages.

use std::fmt;

use bytes::Bytes;
use smallvec::SmallVec;

use crate::error::Result;
use crate::frame::Frame;

/// Inline capacity for frame storage; most messages are an envelope plus a
/// body or two.
const INLINE_FRAMES: usize = 4;

/// An ordered sequence of frames forming one logical message.
///
/// The last frame is the only one without the more-flag. Dropping the
/// message releases every frame it still holds.
#[derive(Default)]
pub struct Multipart {
    frames: SmallVec<[Frame; INLINE_FRAMES]>,
}

impl Multipart {
    pub(crate) fn from_frames(frames: SmallVec<[Frame; INLINE_FRAMES]>) -> Self {
        Self { frames }
    }

    /// The payload of every frame, in order.
    ///
    /// `parts()[i]` is always `frames()[i].data()`.
    pub fn parts(&self) -> Vec<&[u8]> {
        self.iter().collect()
    }

    /// Iterate over frame payloads.
    pub fn iter(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.frames.iter().map(Frame::data)
    }

    /// The frames themselves.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns true if the message holds no frames.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Copy every payload into owned buffers.
    pub fn to_vec(&self) -> Vec<Bytes> {
        self.frames.iter().map(Frame::to_bytes).collect()
    }

    /// Detach the first frame.
    pub(crate) fn pop_front(&mut self) -> Option<Frame> {
        if self.frames.is_empty() {
            None
        } else {
            Some(self.frames.remove(0))
        }
    }

    /// Release every frame.
    ///
    /// Every frame is visited even after a failure; the first error is the
    /// one returned.
    pub fn close(&mut self) -> Result<()> {
        let mut first = None;
        for frame in &mut self.frames {
            if let Err(e) = frame.close() {
                first.get_or_insert(e);
            }
        }
        first.map_or(Ok(()), Err)
    }
}

impl fmt::Debug for Multipart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.frames.iter()).finish()
    }
}
