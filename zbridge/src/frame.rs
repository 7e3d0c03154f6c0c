//! Received frames.
//!
//! A [`Frame`] holds one received transport message without copying it.
//! The transport buffer stays alive until the frame is released, either
//! explicitly with [`Frame::close`] or implicitly on drop. Release happens at
//! most once: the wrapper goes back to its pool exactly one time, so two
//! receives can never end up sharing it.

use std::fmt;
use std::ops::Deref;

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::pool::FramePool;

/// One received unit of data.
pub struct Frame {
    msg: Option<Box<zmq::Message>>,
    more: bool,
    pool: FramePool,
}

impl Frame {
    pub(crate) fn new(msg: Box<zmq::Message>, more: bool, pool: FramePool) -> Self {
        Self {
            msg: Some(msg),
            more,
            pool,
        }
    }

    /// Frame payload. Empty once the frame is released.
    #[inline]
    pub fn data(&self) -> &[u8] {
        match &self.msg {
            Some(msg) => &msg[..],
            None => &[],
        }
    }

    /// Whether another frame of the same message follows.
    #[inline]
    pub fn has_more(&self) -> bool {
        self.more
    }

    /// Payload length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.data().len()
    }

    /// Returns true if the payload is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data().is_empty()
    }

    /// Returns true once the frame has been released.
    pub fn is_released(&self) -> bool {
        self.msg.is_none()
    }

    /// Copy the payload into an owned buffer.
    pub fn to_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(self.data())
    }

    /// Release the transport buffer and return the wrapper to its pool.
    ///
    /// Fails with [`Error::FrameReleased`] if the frame was already
    /// released; the failed call has no other effect.
    pub fn close(&mut self) -> Result<()> {
        match self.msg.take() {
            Some(msg) => {
                self.pool.release(msg);
                Ok(())
            }
            None => Err(Error::FrameReleased),
        }
    }
}

impl Drop for Frame {
    fn drop(&mut self) {
        if let Some(msg) = self.msg.take() {
            self.pool.release(msg);
        }
    }
}

impl Deref for Frame {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.data()
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        self.data()
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("len", &self.len())
            .field("more", &self.more)
            .field("released", &self.is_released())
            .finish()
    }
}
