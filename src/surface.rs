//! The transferable drawing target for the particle layer.
//!
//! `offscreen_surface` hands out two ends. [`OffscreenSurface`] is the only
//! thing that may draw; it is not `Clone`, so moving it into a setup message
//! gives the worker exclusive ownership for good. [`SurfaceView`] is what the
//! window compositor keeps: it can look at finished frames and nothing else.
//! Frames travel through a one-slot mailbox that keeps the newest frame.

use std::sync::Arc;

use crossbeam_queue::ArrayQueue;

use crate::types::RgbaBuffer;

pub struct OffscreenSurface {
    back: RgbaBuffer,
    mailbox: Arc<ArrayQueue<RgbaBuffer>>,
    presented: u64,
}

pub struct SurfaceView {
    mailbox: Arc<ArrayQueue<RgbaBuffer>>,
    latest: RgbaBuffer,
}

pub fn offscreen_surface(width: usize, height: usize) -> (OffscreenSurface, SurfaceView) {
    let mailbox = Arc::new(ArrayQueue::new(1));
    let surface = OffscreenSurface {
        back: RgbaBuffer::new(width, height),
        mailbox: Arc::clone(&mailbox),
        presented: 0,
    };
    let view = SurfaceView { mailbox, latest: RgbaBuffer::new(width, height) };
    (surface, view)
}

impl OffscreenSurface {
    pub fn size(&self) -> (usize, usize) {
        (self.back.width, self.back.height)
    }

    /// Assigning a size always wipes the surface, even if it did not change.
    pub fn set_size(&mut self, width: usize, height: usize) {
        self.back.reset(width, height);
    }

    pub fn buffer(&self) -> &RgbaBuffer {
        &self.back
    }

    pub fn buffer_mut(&mut self) -> &mut RgbaBuffer {
        &mut self.back
    }

    /// Publish the current contents; an unread older frame is replaced.
    pub fn present(&mut self) {
        let _stale = self.mailbox.force_push(self.back.clone());
        self.presented += 1;
    }

    pub fn presented_frames(&self) -> u64 {
        self.presented
    }
}

impl SurfaceView {
    /// Newest presented frame (or the last one seen if nothing new arrived).
    pub fn latest(&mut self) -> &RgbaBuffer {
        while let Some(frame) = self.mailbox.pop() {
            self.latest = frame;
        }
        &self.latest
    }
}
