//! Byte sinks the encoder writes into.
//!
//! A sink accepts byte slices in call order and hands back whatever
//! acknowledgement it likes. Failures live in that acknowledgement; the
//! encoder never inspects it.

use std::io::{self, Write};

pub trait Sink {
    type Output;

    fn write(&mut self, bytes: &[u8]) -> Self::Output;
}

impl Sink for Vec<u8> {
    type Output = ();

    fn write(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }
}

impl<T: Sink + ?Sized> Sink for &mut T {
    type Output = T::Output;

    fn write(&mut self, bytes: &[u8]) -> T::Output {
        (**self).write(bytes)
    }
}

/// Adapts any [`io::Write`] into a sink; each call is a `write_all`.
#[derive(Debug)]
pub struct IoSink<W> {
    inner: W,
}

impl<W: Write> IoSink<W> {
    pub fn new(inner: W) -> Self {
        IoSink { inner }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Sink for IoSink<W> {
    type Output = io::Result<()>;

    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.inner.write_all(bytes)
    }
}

/// Adapts a closure into a sink.
pub struct FnSink<F>(pub F);

impl<F, T> Sink for FnSink<F>
where
    F: FnMut(&[u8]) -> T,
{
    type Output = T;

    fn write(&mut self, bytes: &[u8]) -> T {
        (self.0)(bytes)
    }
}
