//! Stream drainer for child process pipes.
//!
//! A drainer owns one readable stream (a child's stdout or stderr) and reads
//! it on a dedicated thread in bounded chunks. The owner pulls the chunks back
//! with [`StreamDrainer::fetch_chunk`] in the order they were read.
//!
//! Two drainers per child keep both pipes moving at once: a child that fills
//! the pipe the parent is not currently reading would otherwise block forever.

use crate::error::{ExecError, Result};
use std::io::{ErrorKind, Read};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, trace};

/// Default number of bytes read from the stream per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 128;

/// Message sent from the reader thread to the owner.
type ChunkMessage = std::io::Result<Vec<u8>>;

/// Lifecycle of a [`StreamDrainer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainerState {
    /// Bound to a stream, reader thread not started.
    Created,
    /// Reader thread started; chunks can be fetched.
    Running,
    /// Stream released; no more chunks will be produced.
    Closed,
}

/// Outcome of [`StreamDrainer::fetch_chunk_timeout`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetch {
    /// The next chunk, in arrival order.
    Chunk(Vec<u8>),
    /// The stream has ended; every later fetch reports this too.
    End,
    /// Nothing arrived within the timeout; the stream may still produce data.
    Pending,
}

/// Reads one stream on its own thread and hands out the data in chunks.
pub struct StreamDrainer {
    name: String,
    program: Option<String>,
    chunk_size: usize,
    reader: Option<Box<dyn Read + Send>>,
    receiver: Option<Receiver<ChunkMessage>>,
    handle: Option<JoinHandle<()>>,
    exhausted: bool,
    closed: bool,
}

impl StreamDrainer {
    /// Bind a drainer to `reader` using [`DEFAULT_CHUNK_SIZE`].
    ///
    /// `name` labels the reader thread and error messages (e.g. `"stdout"`).
    pub fn new<R>(name: impl Into<String>, reader: R) -> Self
    where
        R: Read + Send + 'static,
    {
        Self {
            name: name.into(),
            program: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            reader: Some(Box::new(reader)),
            receiver: None,
            handle: None,
            exhausted: false,
            closed: false,
        }
    }

    /// Set the maximum number of bytes read per chunk.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(ExecError::InvalidArgument(format!(
                "chunk size for '{}' must be greater than 0",
                self.name
            )));
        }
        self.chunk_size = chunk_size;
        Ok(self)
    }

    /// Name the program whose stream this is, for error messages.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = Some(program.into());
        self
    }

    /// The label given at construction.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Maximum bytes per chunk.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Current lifecycle state.
    pub fn state(&self) -> DrainerState {
        if self.closed {
            DrainerState::Closed
        } else if self.receiver.is_some() {
            DrainerState::Running
        } else {
            DrainerState::Created
        }
    }

    /// Returns true once [`close`](Self::close) has run.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Start the reader thread.
    ///
    /// The thread performs blocking reads of at most `chunk_size` bytes until
    /// end-of-stream, a read error, or the owner going away.
    pub fn start(&mut self) -> Result<()> {
        if self.closed {
            return Err(ExecError::InvalidArgument(format!(
                "drainer '{}' is closed and cannot be started",
                self.name
            )));
        }
        let Some(reader) = self.reader.take() else {
            return Err(ExecError::InvalidArgument(format!(
                "drainer '{}' was already started",
                self.name
            )));
        };

        let (tx, rx) = mpsc::channel();
        let chunk_size = self.chunk_size;
        let handle = thread::Builder::new()
            .name(format!("{}-drainer", self.name))
            .spawn(move || drain(reader, chunk_size, tx))
            .map_err(|e| {
                ExecError::io(format!("failed to start drainer thread for {}", self.name), e)
            })?;

        trace!(stream = %self.name, chunk_size, "drainer started");
        self.receiver = Some(rx);
        self.handle = Some(handle);
        Ok(())
    }

    /// Fetch the next chunk read from the stream.
    ///
    /// Blocks until a chunk is available. Returns `Ok(None)` once the stream
    /// has ended, and keeps returning `Ok(None)` on every later call. A read
    /// error is returned exactly once; after it the stream counts as ended.
    pub fn fetch_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        if self.closed || self.exhausted {
            return Ok(None);
        }
        let Some(receiver) = self.receiver.as_ref() else {
            return Err(ExecError::InvalidArgument(format!(
                "drainer '{}' has not been started",
                self.name
            )));
        };

        match receiver.recv() {
            Ok(Ok(chunk)) => Ok(Some(chunk)),
            Ok(Err(source)) => Err(self.read_failed(source)),
            // Sender dropped: the reader thread hit end-of-stream.
            Err(_) => {
                self.exhausted = true;
                Ok(None)
            }
        }
    }

    /// Like [`fetch_chunk`](Self::fetch_chunk), but waits at most `timeout`.
    ///
    /// Returns [`Fetch::Pending`] when nothing arrived in time, which leaves
    /// the drainer usable for further fetches.
    pub fn fetch_chunk_timeout(&mut self, timeout: Duration) -> Result<Fetch> {
        if self.closed || self.exhausted {
            return Ok(Fetch::End);
        }
        let Some(receiver) = self.receiver.as_ref() else {
            return Err(ExecError::InvalidArgument(format!(
                "drainer '{}' has not been started",
                self.name
            )));
        };

        match receiver.recv_timeout(timeout) {
            Ok(Ok(chunk)) => Ok(Fetch::Chunk(chunk)),
            Ok(Err(source)) => Err(self.read_failed(source)),
            Err(RecvTimeoutError::Timeout) => Ok(Fetch::Pending),
            Err(RecvTimeoutError::Disconnected) => {
                self.exhausted = true;
                Ok(Fetch::End)
            }
        }
    }

    fn read_failed(&mut self, source: std::io::Error) -> ExecError {
        self.exhausted = true;
        let context = match &self.program {
            Some(program) => format!("failed to read {} of '{}'", self.name, program),
            None => format!("failed to read {}", self.name),
        };
        ExecError::io(context, source)
    }

    /// Release the stream and the reader thread. Never fails; safe to repeat.
    ///
    /// A reader thread that already finished is joined. One still blocked in
    /// a read is detached; it exits and drops the stream when the write end
    /// of the pipe closes.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.reader = None;
        self.receiver = None;

        if let Some(handle) = self.handle.take() {
            if self.exhausted || handle.is_finished() {
                if handle.join().is_err() {
                    debug!(stream = %self.name, "drainer thread panicked");
                }
            } else {
                debug!(stream = %self.name, "detaching drainer thread still blocked in read");
            }
        }
        trace!(stream = %self.name, "drainer closed");
    }
}

impl Drop for StreamDrainer {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for StreamDrainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamDrainer")
            .field("name", &self.name)
            .field("program", &self.program)
            .field("chunk_size", &self.chunk_size)
            .field("state", &self.state())
            .field("exhausted", &self.exhausted)
            .finish()
    }
}

/// Reader thread body.
fn drain(mut reader: Box<dyn Read + Send>, chunk_size: usize, tx: Sender<ChunkMessage>) {
    let mut buf = vec![0u8; chunk_size];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                if tx.send(Ok(buf[..n].to_vec())).is_err() {
                    // Owner closed the drainer.
                    break;
                }
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                let _ = tx.send(Err(e));
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor, Write};

    /// Yields its data once, then fails every read.
    struct FailingReader {
        data: Option<Vec<u8>>,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.data.take() {
                Some(data) => {
                    buf[..data.len()].copy_from_slice(&data);
                    Ok(data.len())
                }
                None => Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe went away")),
            }
        }
    }

    /// Reports `Interrupted` on the first read, then behaves like its cursor.
    struct InterruptedOnce {
        interrupted: bool,
        inner: Cursor<Vec<u8>>,
    }

    impl Read for InterruptedOnce {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(io::Error::from(io::ErrorKind::Interrupted));
            }
            self.inner.read(buf)
        }
    }

    /// In-process pipe: bytes written to the sender are read from the reader.
    fn pipe_pair() -> (ChannelWriter, ChannelReader) {
        let (tx, rx) = mpsc::channel();
        (
            ChannelWriter { tx },
            ChannelReader {
                rx,
                pending: Vec::new(),
            },
        )
    }

    struct ChannelWriter {
        tx: Sender<Vec<u8>>,
    }

    impl Write for ChannelWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.tx
                .send(buf.to_vec())
                .map_err(|_| io::Error::from(io::ErrorKind::BrokenPipe))?;
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct ChannelReader {
        rx: Receiver<Vec<u8>>,
        pending: Vec<u8>,
    }

    impl Read for ChannelReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.pending.is_empty() {
                match self.rx.recv() {
                    Ok(data) => self.pending = data,
                    Err(_) => return Ok(0),
                }
            }
            let n = buf.len().min(self.pending.len());
            buf[..n].copy_from_slice(&self.pending[..n]);
            self.pending.drain(..n);
            Ok(n)
        }
    }

    fn collect(drainer: &mut StreamDrainer) -> Vec<Vec<u8>> {
        let mut chunks = Vec::new();
        while let Some(chunk) = drainer.fetch_chunk().unwrap() {
            chunks.push(chunk);
        }
        chunks
    }

    #[test]
    fn chunks_arrive_in_order_and_bounded() {
        let mut drainer = StreamDrainer::new("stdout", Cursor::new(b"abcdefghij".to_vec()))
            .with_chunk_size(4)
            .unwrap();
        drainer.start().unwrap();

        let chunks = collect(&mut drainer);
        assert!(chunks.iter().all(|c| !c.is_empty() && c.len() <= 4));
        assert_eq!(chunks.concat(), b"abcdefghij");
    }

    #[test]
    fn default_chunk_size_is_small() {
        let drainer = StreamDrainer::new("stdout", io::empty());
        assert_eq!(drainer.chunk_size(), DEFAULT_CHUNK_SIZE);
        assert_eq!(drainer.chunk_size(), 128);
    }

    #[test]
    fn sentinel_is_idempotent_after_end_of_stream() {
        let mut drainer = StreamDrainer::new("stderr", Cursor::new(b"x".to_vec()));
        drainer.start().unwrap();

        assert_eq!(drainer.fetch_chunk().unwrap(), Some(b"x".to_vec()));
        for _ in 0..5 {
            assert_eq!(drainer.fetch_chunk().unwrap(), None);
        }
    }

    #[test]
    fn empty_stream_yields_sentinel_immediately() {
        let mut drainer = StreamDrainer::new("stdout", io::empty());
        drainer.start().unwrap();
        assert_eq!(drainer.fetch_chunk().unwrap(), None);
    }

    #[test]
    fn read_error_is_reported_once_then_treated_as_end() {
        let reader = FailingReader {
            data: Some(b"partial".to_vec()),
        };
        let mut drainer = StreamDrainer::new("stdout", reader);
        drainer.start().unwrap();

        assert_eq!(drainer.fetch_chunk().unwrap(), Some(b"partial".to_vec()));

        let err = drainer.fetch_chunk().unwrap_err();
        assert!(matches!(err, ExecError::Io { .. }));
        assert!(err.to_string().contains("failed to read stdout"));

        assert_eq!(drainer.fetch_chunk().unwrap(), None);
        assert_eq!(drainer.fetch_chunk().unwrap(), None);
    }

    #[test]
    fn read_error_names_the_program() {
        let reader = FailingReader { data: None };
        let mut drainer = StreamDrainer::new("stderr", reader).with_program("r.watershed");
        drainer.start().unwrap();

        let err = drainer.fetch_chunk().unwrap_err();
        assert_eq!(
            err.to_string(),
            "failed to read stderr of 'r.watershed': pipe went away"
        );
    }

    #[test]
    fn bounded_fetch_reports_pending_then_data() {
        let (mut writer, reader) = pipe_pair();
        let mut drainer = StreamDrainer::new("stdout", reader);
        drainer.start().unwrap();

        assert_eq!(
            drainer.fetch_chunk_timeout(Duration::from_millis(50)).unwrap(),
            Fetch::Pending
        );

        writer.write_all(b"late").unwrap();
        drop(writer);

        let mut data = Vec::new();
        loop {
            match drainer.fetch_chunk_timeout(Duration::from_secs(5)).unwrap() {
                Fetch::Chunk(chunk) => data.extend(chunk),
                Fetch::End => break,
                Fetch::Pending => panic!("writer closed, stream should end"),
            }
        }
        assert_eq!(data, b"late");
        assert_eq!(
            drainer.fetch_chunk_timeout(Duration::from_millis(1)).unwrap(),
            Fetch::End
        );
    }

    #[test]
    fn bounded_fetch_before_start_is_rejected() {
        let mut drainer = StreamDrainer::new("stdout", io::empty());
        assert!(matches!(
            drainer.fetch_chunk_timeout(Duration::from_millis(1)),
            Err(ExecError::InvalidArgument(_))
        ));
    }

    #[test]
    fn interrupted_reads_are_retried() {
        let reader = InterruptedOnce {
            interrupted: false,
            inner: Cursor::new(b"after interrupt".to_vec()),
        };
        let mut drainer = StreamDrainer::new("stdout", reader);
        drainer.start().unwrap();

        assert_eq!(collect(&mut drainer).concat(), b"after interrupt");
    }

    #[test]
    fn fetch_before_start_is_rejected() {
        let mut drainer = StreamDrainer::new("stdout", io::empty());
        let err = drainer.fetch_chunk().unwrap_err();
        assert!(matches!(err, ExecError::InvalidArgument(_)));
    }

    #[test]
    fn starting_twice_is_rejected() {
        let mut drainer = StreamDrainer::new("stdout", io::empty());
        drainer.start().unwrap();
        let err = drainer.start().unwrap_err();
        assert!(matches!(err, ExecError::InvalidArgument(_)));
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        let err = StreamDrainer::new("stdout", io::empty())
            .with_chunk_size(0)
            .unwrap_err();
        assert!(matches!(err, ExecError::InvalidArgument(_)));
    }

    #[test]
    fn lifecycle_moves_from_created_to_closed() {
        let mut drainer = StreamDrainer::new("stdout", Cursor::new(b"data".to_vec()));
        assert_eq!(drainer.state(), DrainerState::Created);

        drainer.start().unwrap();
        assert_eq!(drainer.state(), DrainerState::Running);

        let _ = collect(&mut drainer);
        drainer.close();
        assert_eq!(drainer.state(), DrainerState::Closed);
        assert!(drainer.is_closed());
    }

    #[test]
    fn close_is_idempotent_and_stops_fetching() {
        let mut drainer = StreamDrainer::new("stdout", Cursor::new(b"unread".to_vec()));
        drainer.start().unwrap();

        drainer.close();
        drainer.close();
        assert_eq!(drainer.fetch_chunk().unwrap(), None);
    }

    #[test]
    fn closed_drainer_cannot_start() {
        let mut drainer = StreamDrainer::new("stdout", io::empty());
        drainer.close();
        assert!(drainer.start().is_err());
    }

    #[test]
    fn reader_thread_is_named_after_stream() {
        struct ThreadNameReader {
            done: bool,
        }
        impl Read for ThreadNameReader {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                if self.done {
                    return Ok(0);
                }
                self.done = true;
                let name = thread::current().name().unwrap_or_default().to_string();
                buf[..name.len()].copy_from_slice(name.as_bytes());
                Ok(name.len())
            }
        }

        let mut drainer = StreamDrainer::new("stderr", ThreadNameReader { done: false });
        drainer.start().unwrap();
        assert_eq!(collect(&mut drainer).concat(), b"stderr-drainer");
    }
}
