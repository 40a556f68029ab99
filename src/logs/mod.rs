//! Log Interceptor.
//!
//! The process writes its text output through a [`StreamTap`] (installed as
//! the `tracing_subscriber` writer by the binary). Until the interceptor is
//! armed the tap is a plain pass-through; once armed every write is also sent
//! to the debugger as an `app.console-log` event together with a captured
//! backtrace.

use std::backtrace::Backtrace;
use std::io::{self, Write};
use std::sync::{Arc, OnceLock};

use tracing_subscriber::fmt::MakeWriter;

use crate::transport::{OutboundEvent, Transport};

#[derive(Clone, Default)]
pub struct LogInterceptor {
    armed: Arc<OnceLock<Arc<dyn Transport>>>,
}

impl LogInterceptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start forwarding to `transport`. Only the first call has an effect;
    /// returns whether this call armed the interceptor.
    pub fn arm(&self, transport: Arc<dyn Transport>) -> bool {
        self.armed.set(transport).is_ok()
    }

    pub fn is_armed(&self) -> bool {
        self.armed.get().is_some()
    }

    /// Forward one chunk of output. Failures are swallowed: this runs inside
    /// the log sink and cannot report anything itself.
    fn forward(&self, buf: &[u8]) {
        let Some(transport) = self.armed.get() else {
            return;
        };
        if buf.is_empty() || !transport.is_connected() {
            return;
        }
        let _ = transport.emit(OutboundEvent::ConsoleLog {
            text: String::from_utf8_lossy(buf).into_owned(),
            stack: Backtrace::force_capture().to_string(),
        });
    }

    /// Wrap a writer factory so its output is forwarded once armed.
    pub fn tap<M>(&self, inner: M) -> StreamTap<M> {
        StreamTap {
            interceptor: self.clone(),
            inner,
        }
    }

    /// Tap for the process's standard output.
    pub fn stdout(&self) -> StreamTap<fn() -> io::Stdout> {
        self.tap(io::stdout as fn() -> io::Stdout)
    }

    /// Tap for the process's standard error.
    pub fn stderr(&self) -> StreamTap<fn() -> io::Stderr> {
        self.tap(io::stderr as fn() -> io::Stderr)
    }
}

/// Writer that forwards every write before passing it through unchanged.
pub struct ForwardingWriter<W> {
    inner: W,
    interceptor: LogInterceptor,
}

impl<W: Write> ForwardingWriter<W> {
    pub fn new(inner: W, interceptor: LogInterceptor) -> Self {
        Self { inner, interceptor }
    }
}

impl<W: Write> Write for ForwardingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.interceptor.forward(buf);
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// `MakeWriter` adapter producing [`ForwardingWriter`]s.
#[derive(Clone)]
pub struct StreamTap<M> {
    interceptor: LogInterceptor,
    inner: M,
}

impl<'a, M> MakeWriter<'a> for StreamTap<M>
where
    M: MakeWriter<'a>,
{
    type Writer = ForwardingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        ForwardingWriter::new(self.inner.make_writer(), self.interceptor.clone())
    }
}
