//! Report filtering for packet streams

use futures::{Stream, ready};
use pin_project_lite::pin_project;
use std::collections::VecDeque;
use std::ops::Deref;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::settings::AnalyzerSettings;
use crate::types::{Frame, Packet};

/// Extension trait to flatten packet streams into report frames
pub trait ReportExt: Stream {
    /// Emit the frames of every packet that the settings' report toggles
    /// keep, in packet order.
    fn report_frames(self, settings: &AnalyzerSettings) -> ReportFrames<Self>
    where
        Self: Sized,
    {
        ReportFrames::new(self, settings.clone())
    }
}

impl<T> ReportExt for T
where
    T: Stream,
    T::Item: Deref<Target = Packet>,
{
}

pin_project! {
    /// A stream combinator that turns packets into filtered frames
    pub struct ReportFrames<S> {
        #[pin]
        stream: S,
        settings: AnalyzerSettings,
        pending: VecDeque<Frame>,
    }
}

impl<S> ReportFrames<S> {
    pub fn new(stream: S, settings: AnalyzerSettings) -> Self {
        Self { stream, settings, pending: VecDeque::new() }
    }
}

impl<S> Stream for ReportFrames<S>
where
    S: Stream,
    S::Item: Deref<Target = Packet>,
{
    type Item = Frame;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            if let Some(frame) = this.pending.pop_front() {
                return Poll::Ready(Some(frame));
            }

            // packets whose frames are all hidden yield nothing; keep pulling
            match ready!(this.stream.as_mut().poll_next(cx)) {
                Some(packet) => {
                    let settings = &*this.settings;
                    this.pending.extend(packet.frames.iter().filter(|frame| settings.shows(frame)));
                }
                None => return Poll::Ready(None),
            }
        }
    }
}
