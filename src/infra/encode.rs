//! PNG encoding that streams bytes to the HTTP body as they are produced.
//!
//! Encoding runs on a blocking worker and writes through [`ChunkWriter`],
//! which hands fixed-size chunks to a bounded channel. A slow client fills the
//! channel and stalls the encoder; a dropped client closes the channel and the
//! next write fails, ending the encode early.

use std::{
    convert::Infallible,
    io::{self, Write},
};

use async_stream::stream;
use bytes::Bytes;
use futures::Stream;
use image::{ExtendedColorType, ImageEncoder, RgbaImage, codecs::png::PngEncoder};
use thiserror::Error;
use tokio::sync::mpsc;

pub const CHUNK_SIZE: usize = 16 * 1024;
const CHANNEL_DEPTH: usize = 4;

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("png encoding failed: {0}")]
    Png(#[from] image::ImageError),
    #[error("client went away before the image was sent")]
    Disconnected,
}

/// Encode `surface` as PNG into any writer.
pub fn encode_png<W: Write>(surface: &RgbaImage, writer: W) -> Result<(), EncodeError> {
    PngEncoder::new(writer).write_image(
        surface.as_raw(),
        surface.width(),
        surface.height(),
        ExtendedColorType::Rgba8,
    )?;
    Ok(())
}

/// Buffers writes and forwards them downstream in `CHUNK_SIZE` pieces.
pub struct ChunkWriter {
    buffer: Vec<u8>,
    sender: mpsc::Sender<Bytes>,
    closed: bool,
}

impl ChunkWriter {
    pub fn new(sender: mpsc::Sender<Bytes>) -> Self {
        Self {
            buffer: Vec::with_capacity(CHUNK_SIZE),
            sender,
            closed: false,
        }
    }

    fn send_buffer(&mut self) -> io::Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let chunk = std::mem::replace(&mut self.buffer, Vec::with_capacity(CHUNK_SIZE));
        self.sender.blocking_send(Bytes::from(chunk)).map_err(|_| {
            self.closed = true;
            io::Error::new(io::ErrorKind::BrokenPipe, "image receiver dropped")
        })
    }

    /// True once the receiving side has gone away.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Write for ChunkWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let room = CHUNK_SIZE - self.buffer.len();
        let take = room.min(buf.len());
        self.buffer.extend_from_slice(&buf[..take]);
        if self.buffer.len() == CHUNK_SIZE {
            self.send_buffer()?;
        }
        Ok(take)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.send_buffer()
    }
}

/// Run `produce` on a blocking worker and stream the PNG it returns.
///
/// The returned stream ends when encoding finishes. Encoding failures are
/// reported through `on_error`; the stream simply ends short.
pub fn stream_png<F, E>(produce: F, on_error: E) -> impl Stream<Item = Result<Bytes, Infallible>>
where
    F: FnOnce() -> RgbaImage + Send + 'static,
    E: FnOnce(EncodeError) + Send + 'static,
{
    let (sender, mut receiver) = mpsc::channel::<Bytes>(CHANNEL_DEPTH);

    tokio::task::spawn_blocking(move || {
        let surface = produce();
        if let Err(err) = encode_into(&surface, &mut ChunkWriter::new(sender)) {
            on_error(err);
        }
    });

    stream! {
        while let Some(chunk) = receiver.recv().await {
            yield Ok::<Bytes, Infallible>(chunk);
        }
    }
}

/// Encode and flush the tail chunk, reporting a closed channel as a disconnect.
pub fn encode_into(surface: &RgbaImage, writer: &mut ChunkWriter) -> Result<(), EncodeError> {
    let result = encode_png(surface, &mut *writer)
        .and_then(|()| writer.flush().map_err(|err| EncodeError::Png(err.into())));
    match result {
        Err(_) if writer.is_closed() => Err(EncodeError::Disconnected),
        other => other,
    }
}
