use crate::wire_format::WireFormat;
use crate::{Error, Result};
use bytes::Bytes;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{
    AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter, ReadBuf,
};
use tokio::net::TcpStream;

#[cfg(feature = "tls")]
use crate::ssl::SSLOptions;
#[cfg(feature = "tls")]
use std::sync::Arc;

/// Default buffer sizes for reading and writing
const DEFAULT_READ_BUFFER_SIZE: usize = 8192;
const DEFAULT_WRITE_BUFFER_SIZE: usize = 8192;

/// Timeouts and transport options applied when establishing and using a
/// [`Connection`]. `Duration::ZERO` means "no timeout" (infinite) for each of
/// the three fields, matching this crate's documented default: callers
/// running in production should set explicit values.
#[derive(Clone, Debug)]
pub struct ConnectionOptions {
    /// Upper bound on the TCP (and, if `tls` is set, TLS handshake) connect
    /// phase. Zero means infinite.
    pub connect_timeout: Duration,
    /// Upper bound on any single write to the socket. Zero means infinite.
    pub send_timeout: Duration,
    /// Upper bound on any single read from the socket. Zero means infinite.
    pub recv_timeout: Duration,
    /// Wrap the TCP stream in TLS after connecting.
    pub tls: bool,
    /// TLS configuration, used only when `tls` is true and the `tls` feature
    /// is compiled in.
    #[cfg(feature = "tls")]
    pub ssl_options: SSLOptions,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::ZERO,
            send_timeout: Duration::ZERO,
            recv_timeout: Duration::ZERO,
            tls: false,
            #[cfg(feature = "tls")]
            ssl_options: SSLOptions::default(),
        }
    }
}

impl ConnectionOptions {
    /// Create new connection options with all timeouts set to infinite and
    /// TLS disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the send (write) timeout.
    pub fn send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    /// Set the receive (read) timeout.
    pub fn recv_timeout(mut self, timeout: Duration) -> Self {
        self.recv_timeout = timeout;
        self
    }

    /// Enable or disable TLS.
    pub fn tls(mut self, enabled: bool) -> Self {
        self.tls = enabled;
        self
    }

    /// Set TLS options (implies `tls(true)`).
    #[cfg(feature = "tls")]
    pub fn ssl_options(mut self, options: SSLOptions) -> Self {
        self.ssl_options = options;
        self.tls = true;
        self
    }
}

/// Either a plain TCP stream or, with the `tls` feature, a TLS stream over
/// one. Kept as an enum rather than a trait object so the hot read/write
/// path stays a static dispatch match rather than a vtable call.
enum MaybeTlsStream {
    Plain(TcpStream),
    #[cfg(feature = "tls")]
    Tls(Box<tokio_rustls::client::TlsStream<TcpStream>>),
}

impl AsyncRead for MaybeTlsStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            MaybeTlsStream::Plain(s) => Pin::new(s).poll_read(cx, buf),
            #[cfg(feature = "tls")]
            MaybeTlsStream::Tls(s) => Pin::new(s.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for MaybeTlsStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        match self.get_mut() {
            MaybeTlsStream::Plain(s) => Pin::new(s).poll_write(cx, buf),
            #[cfg(feature = "tls")]
            MaybeTlsStream::Tls(s) => Pin::new(s.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            MaybeTlsStream::Plain(s) => Pin::new(s).poll_flush(cx),
            #[cfg(feature = "tls")]
            MaybeTlsStream::Tls(s) => Pin::new(s.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            MaybeTlsStream::Plain(s) => Pin::new(s).poll_shutdown(cx),
            #[cfg(feature = "tls")]
            MaybeTlsStream::Tls(s) => Pin::new(s.as_mut()).poll_shutdown(cx),
        }
    }
}

/// Async connection wrapper for a TCP (optionally TLS) socket.
/// This is the async I/O boundary - all socket operations are async, and
/// every read/write is bounded by the configured send/recv timeout.
pub struct Connection {
    reader: BufReader<tokio::io::ReadHalf<MaybeTlsStream>>,
    writer: BufWriter<tokio::io::WriteHalf<MaybeTlsStream>>,
    send_timeout: Duration,
    recv_timeout: Duration,
}

/// Runs `$fut` (a future resolving to a `Result<T, E>` convertible into
/// [`Error`]) bounded by `$dur`; `Duration::ZERO` means no bound. On
/// expiry, produces [`Error::io_timeout`].
macro_rules! bounded {
    ($dur:expr, $fut:expr) => {{
        let dur = $dur;
        if dur.is_zero() {
            $fut.await.map_err(Into::into)
        } else {
            match tokio::time::timeout(dur, $fut).await {
                Ok(result) => result.map_err(Into::into),
                Err(_) => Err(Error::io_timeout(dur)),
            }
        }
    }};
}

impl Connection {
    /// Create a new connection from an already-connected TCP stream, with no
    /// timeouts applied.
    pub fn new(stream: TcpStream) -> Self {
        Self::from_options(stream, &ConnectionOptions::default())
    }

    fn wrap(stream: MaybeTlsStream, options: &ConnectionOptions) -> Self {
        let (read_half, write_half) = tokio::io::split(stream);
        Self {
            reader: BufReader::with_capacity(DEFAULT_READ_BUFFER_SIZE, read_half),
            writer: BufWriter::with_capacity(DEFAULT_WRITE_BUFFER_SIZE, write_half),
            send_timeout: options.send_timeout,
            recv_timeout: options.recv_timeout,
        }
    }

    fn from_options(stream: TcpStream, options: &ConnectionOptions) -> Self {
        Self::wrap(MaybeTlsStream::Plain(stream), options)
    }

    /// Connect to a ClickHouse server with default (infinite) timeouts and
    /// no TLS.
    pub async fn connect(host: &str, port: u16) -> Result<Self> {
        Self::connect_with_options(host, port, &ConnectionOptions::default()).await
    }

    /// Connect to a ClickHouse server, applying `options`'s connect timeout
    /// and, if requested, wrapping the stream in TLS.
    pub async fn connect_with_options(
        host: &str,
        port: u16,
        options: &ConnectionOptions,
    ) -> Result<Self> {
        let addr = format!("{}:{}", host, port);
        let connect_fut = TcpStream::connect(&addr);
        let stream = if options.connect_timeout.is_zero() {
            connect_fut.await
        } else {
            match tokio::time::timeout(options.connect_timeout, connect_fut).await {
                Ok(result) => result,
                Err(_) => return Err(Error::connect_timeout(options.connect_timeout)),
            }
        }
        .map_err(|e| Error::Connection(format!("Failed to connect to {}: {}", addr, e)))?;

        stream
            .set_nodelay(true)
            .map_err(|e| Error::Connection(format!("Failed to set TCP_NODELAY: {}", e)))?;

        if options.tls {
            #[cfg(feature = "tls")]
            {
                let server_name = options
                    .ssl_options
                    .server_name
                    .clone()
                    .unwrap_or_else(|| host.to_string());
                let config = options.ssl_options.build_client_config()?;
                let connector = tokio_rustls::TlsConnector::from(config);
                let dns_name =
                    rustls::ServerName::try_from(server_name.as_str()).map_err(|e| {
                        Error::Connection(format!("Invalid server name for TLS: {}", e))
                    })?;

                let tls_fut = connector.connect(dns_name, stream);
                let tls_stream = if options.connect_timeout.is_zero() {
                    tls_fut.await
                } else {
                    match tokio::time::timeout(options.connect_timeout, tls_fut).await {
                        Ok(result) => result,
                        Err(_) => {
                            return Err(Error::connect_timeout(options.connect_timeout))
                        }
                    }
                }
                .map_err(|e| Error::Connection(format!("TLS handshake failed: {}", e)))?;

                return Ok(Self::wrap(
                    MaybeTlsStream::Tls(Box::new(tls_stream)),
                    options,
                ));
            }
            #[cfg(not(feature = "tls"))]
            {
                return Err(Error::Validation(
                    "TLS was requested but this build was compiled without the `tls` feature"
                        .to_string(),
                ));
            }
        }

        Ok(Self::from_options(stream, options))
    }

    /// Read a varint-encoded u64
    pub async fn read_varint(&mut self) -> Result<u64> {
        bounded!(self.recv_timeout, WireFormat::read_varint64(&mut self.reader))
    }

    /// Write a varint-encoded u64
    pub async fn write_varint(&mut self, value: u64) -> Result<()> {
        bounded!(self.send_timeout, WireFormat::write_varint64(&mut self.writer, value))
    }

    /// Read a fixed-size value
    pub async fn read_u8(&mut self) -> Result<u8> {
        bounded!(self.recv_timeout, self.reader.read_u8())
    }

    pub async fn read_u16(&mut self) -> Result<u16> {
        bounded!(self.recv_timeout, self.reader.read_u16_le())
    }

    pub async fn read_u32(&mut self) -> Result<u32> {
        bounded!(self.recv_timeout, self.reader.read_u32_le())
    }

    pub async fn read_u64(&mut self) -> Result<u64> {
        bounded!(self.recv_timeout, self.reader.read_u64_le())
    }

    pub async fn read_i8(&mut self) -> Result<i8> {
        bounded!(self.recv_timeout, self.reader.read_i8())
    }

    pub async fn read_i16(&mut self) -> Result<i16> {
        bounded!(self.recv_timeout, self.reader.read_i16_le())
    }

    pub async fn read_i32(&mut self) -> Result<i32> {
        bounded!(self.recv_timeout, self.reader.read_i32_le())
    }

    pub async fn read_i64(&mut self) -> Result<i64> {
        bounded!(self.recv_timeout, self.reader.read_i64_le())
    }

    /// Write fixed-size values
    pub async fn write_u8(&mut self, value: u8) -> Result<()> {
        bounded!(self.send_timeout, self.writer.write_u8(value))
    }

    pub async fn write_u16(&mut self, value: u16) -> Result<()> {
        bounded!(self.send_timeout, self.writer.write_u16_le(value))
    }

    pub async fn write_u32(&mut self, value: u32) -> Result<()> {
        bounded!(self.send_timeout, self.writer.write_u32_le(value))
    }

    pub async fn write_u64(&mut self, value: u64) -> Result<()> {
        bounded!(self.send_timeout, self.writer.write_u64_le(value))
    }

    pub async fn write_i8(&mut self, value: i8) -> Result<()> {
        bounded!(self.send_timeout, self.writer.write_i8(value))
    }

    pub async fn write_i16(&mut self, value: i16) -> Result<()> {
        bounded!(self.send_timeout, self.writer.write_i16_le(value))
    }

    pub async fn write_i32(&mut self, value: i32) -> Result<()> {
        bounded!(self.send_timeout, self.writer.write_i32_le(value))
    }

    pub async fn write_i64(&mut self, value: i64) -> Result<()> {
        bounded!(self.send_timeout, self.writer.write_i64_le(value))
    }

    /// Read a length-prefixed string
    pub async fn read_string(&mut self) -> Result<String> {
        bounded!(self.recv_timeout, WireFormat::read_string(&mut self.reader))
    }

    /// Write a length-prefixed string
    pub async fn write_string(&mut self, s: &str) -> Result<()> {
        bounded!(self.send_timeout, WireFormat::write_string(&mut self.writer, s))
    }

    /// Read exact number of bytes into a buffer
    pub async fn read_bytes(&mut self, len: usize) -> Result<Bytes> {
        let mut buf = vec![0u8; len];
        bounded!(self.recv_timeout, self.reader.read_exact(&mut buf))?;
        Ok(Bytes::from(buf))
    }

    /// Read bytes into an existing buffer
    pub async fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        bounded!(self.recv_timeout, self.reader.read_exact(buf))?;
        Ok(())
    }

    /// Write bytes
    pub async fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        bounded!(self.send_timeout, self.writer.write_all(data))
    }

    /// Flush the write buffer
    pub async fn flush(&mut self) -> Result<()> {
        bounded!(self.send_timeout, self.writer.flush())
    }
}
