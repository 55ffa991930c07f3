use crate::block::Block;
use crate::connection::{Connection, ConnectionOptions};
use crate::io::{BlockReader, BlockWriter};
use crate::protocol::{ClientCode, CompressionMethod, ServerCode};
use crate::query::{ClientInfo, Exception, Progress, Query, ServerInfo};
use crate::{Error, Result};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, trace, warn};

/// `DBMS_MIN_PROTOCOL_VERSION_WITH_ADDENDUM`: server expects an (empty) quota
/// key addendum after Hello.
const MIN_REVISION_WITH_ADDENDUM: u64 = 54458;
/// `DBMS_MIN_REVISION_WITH_CLIENT_INFO`.
const MIN_REVISION_WITH_CLIENT_INFO: u64 = 54032;
/// `DBMS_MIN_REVISION_WITH_SERVER_TIMEZONE`.
const MIN_REVISION_WITH_SERVER_TIMEZONE: u64 = 54058;
/// `DBMS_MIN_REVISION_WITH_QUOTA_KEY_IN_CLIENT_INFO`.
const MIN_REVISION_WITH_QUOTA_KEY: u64 = 54060;
/// `DBMS_MIN_REVISION_WITH_VERSION_PATCH`.
const MIN_REVISION_WITH_VERSION_PATCH: u64 = 54401;
/// `DBMS_MIN_REVISION_WITH_SERVER_DISPLAY_NAME`.
const MIN_REVISION_WITH_DISPLAY_NAME: u64 = 54372;
/// `DBMS_MIN_REVISION_WITH_SETTINGS_SERIALIZED_AS_STRINGS`.
const MIN_REVISION_WITH_SETTINGS_AS_STRINGS: u64 = 54429;
/// `DBMS_MIN_REVISION_WITH_INTERSERVER_SECRET`.
const MIN_REVISION_WITH_INTERSERVER_SECRET: u64 = 54441;
/// `DBMS_MIN_REVISION_WITH_OPENTELEMETRY`.
const MIN_REVISION_WITH_OPENTELEMETRY: u64 = 54442;
/// `DBMS_MIN_REVISION_WITH_DISTRIBUTED_DEPTH`.
const MIN_REVISION_WITH_DISTRIBUTED_DEPTH: u64 = 54448;
/// `DBMS_MIN_REVISION_WITH_INITIAL_QUERY_START_TIME`.
const MIN_REVISION_WITH_INITIAL_QUERY_START_TIME: u64 = 54449;
/// `DBMS_MIN_REVISION_WITH_PARALLEL_REPLICAS`.
const MIN_REVISION_WITH_PARALLEL_REPLICAS: u64 = 54453;
/// `DBMS_MIN_REVISION_WITH_TEMPORARY_TABLES`.
const MIN_REVISION_WITH_TEMPORARY_TABLES: u64 = 50264;
/// `DBMS_MIN_PROTOCOL_VERSION_WITH_PARAMETERS`.
const MIN_REVISION_WITH_PARAMETERS: u64 = 54459;

/// Options controlling how a [`Client`] connects and authenticates.
#[derive(Clone, Debug)]
pub struct ClientOptions {
    /// Server host.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Database name.
    pub database: String,
    /// Username.
    pub user: String,
    /// Password.
    pub password: String,
    /// Compression method applied to blocks. `None` disables compression.
    pub compression: Option<CompressionMethod>,
    /// Client identification sent during the handshake.
    pub client_info: ClientInfo,
    /// Transport-level timeouts and TLS settings.
    pub connection_options: ConnectionOptions,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 9000,
            database: "default".to_string(),
            user: "default".to_string(),
            password: String::new(),
            compression: Some(CompressionMethod::Lz4),
            client_info: ClientInfo::default(),
            connection_options: ConnectionOptions::default(),
        }
    }
}

impl ClientOptions {
    /// Create new client options with host and port.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Set the database.
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Set the username.
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    /// Set the password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Set compression method.
    pub fn compression(mut self, method: Option<CompressionMethod>) -> Self {
        self.compression = method;
        self
    }

    /// Set the client name reported during the handshake.
    pub fn client_name(mut self, name: impl Into<String>) -> Self {
        self.client_info.client_name = name.into();
        self
    }

    /// Set the connect timeout. Zero means infinite.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connection_options = self.connection_options.connect_timeout(timeout);
        self
    }

    /// Set the send (write) timeout. Zero means infinite.
    pub fn send_timeout(mut self, timeout: Duration) -> Self {
        self.connection_options = self.connection_options.send_timeout(timeout);
        self
    }

    /// Set the receive (read) timeout. Zero means infinite.
    pub fn recv_timeout(mut self, timeout: Duration) -> Self {
        self.connection_options = self.connection_options.recv_timeout(timeout);
        self
    }

    /// Enable TLS using the given options (requires the `tls` feature).
    #[cfg(feature = "tls")]
    pub fn ssl_options(mut self, options: crate::ssl::SSLOptions) -> Self {
        self.connection_options = self.connection_options.ssl_options(options);
        self
    }
}

/// ClickHouse native protocol client.
///
/// A `Client` owns a single TCP (optionally TLS) connection. The socket is
/// wrapped in a `tokio::sync::Mutex` so that concurrent callers queue up
/// rather than interleave packets on the wire; the native protocol does not
/// support multiplexing multiple queries on one connection.
pub struct Client {
    conn: Mutex<Connection>,
    server_info: ServerInfo,
    block_reader: BlockReader,
    block_writer: BlockWriter,
    options: ClientOptions,
    last_profile: Option<crate::query::Profile>,
    last_progress: Option<Progress>,
}

impl Client {
    /// Connect to a ClickHouse server and perform the handshake.
    pub async fn connect(options: ClientOptions) -> Result<Self> {
        let mut conn = Connection::connect_with_options(
            &options.host,
            options.port,
            &options.connection_options,
        )
        .await?;

        Self::send_hello(&mut conn, &options).await?;
        let server_info = Self::receive_hello(&mut conn).await?;

        if server_info.revision >= MIN_REVISION_WITH_ADDENDUM {
            debug!("sending quota key addendum");
            conn.write_string("").await?;
            conn.flush().await?;
        }

        let mut block_reader = BlockReader::new(server_info.revision);
        let mut block_writer = BlockWriter::new(server_info.revision);

        if let Some(compression) = options.compression {
            block_reader = block_reader.with_compression(compression);
            block_writer = block_writer.with_compression(compression);
        }

        debug!(
            server = %server_info.name,
            revision = server_info.revision,
            "connected to ClickHouse server"
        );

        Ok(Self {
            conn: Mutex::new(conn),
            server_info,
            block_reader,
            block_writer,
            options,
            last_profile: None,
            last_progress: None,
        })
    }

    async fn send_hello(conn: &mut Connection, options: &ClientOptions) -> Result<()> {
        trace!("sending client hello");
        conn.write_varint(ClientCode::Hello as u64).await?;

        conn.write_string(&options.client_info.client_name).await?;
        conn.write_varint(options.client_info.client_version_major)
            .await?;
        conn.write_varint(options.client_info.client_version_minor)
            .await?;
        conn.write_varint(options.client_info.client_revision)
            .await?;

        conn.write_string(&options.database).await?;
        conn.write_string(&options.user).await?;
        conn.write_string(&options.password).await?;

        conn.flush().await?;
        Ok(())
    }

    async fn receive_hello(conn: &mut Connection) -> Result<ServerInfo> {
        trace!("reading server hello");
        let packet_type = conn.read_varint().await?;

        if packet_type != ServerCode::Hello as u64 {
            if packet_type == ServerCode::Exception as u64 {
                let exception = read_exception(conn).await?;
                return Err(Error::Server(exception));
            }
            return Err(Error::Protocol(format!(
                "expected Hello packet during handshake, got packet type {}",
                packet_type
            )));
        }

        let name = conn.read_string().await?;
        let version_major = conn.read_varint().await?;
        let version_minor = conn.read_varint().await?;
        let revision = conn.read_varint().await?;

        let timezone = if revision >= MIN_REVISION_WITH_SERVER_TIMEZONE {
            conn.read_string().await?
        } else {
            String::new()
        };

        let display_name = if revision >= MIN_REVISION_WITH_DISPLAY_NAME {
            conn.read_string().await?
        } else {
            String::new()
        };

        let version_patch = if revision >= MIN_REVISION_WITH_VERSION_PATCH {
            conn.read_varint().await?
        } else {
            0
        };

        debug!(%name, version_major, version_minor, revision, "received server hello");

        Ok(ServerInfo {
            name,
            version_major,
            version_minor,
            version_patch,
            revision,
            timezone,
            display_name,
        })
    }

    /// Execute a query and collect all result blocks.
    ///
    /// For streaming large results or observing progress as it happens,
    /// attach callbacks to the [`Query`] instead (`on_data`, `on_progress`,
    /// etc.) -- they fire as packets arrive, before this method returns.
    pub async fn query(&mut self, query: impl Into<Query>) -> Result<QueryResult> {
        let query = query.into();
        let mut conn = self.conn.lock().await;

        self.send_query(&mut conn, &query).await?;

        let mut blocks = Vec::new();
        let mut progress_info = Progress::default();

        loop {
            let packet_type = conn.read_varint().await?;

            match packet_type {
                code if code == ServerCode::Data as u64 => {
                    if self.server_info.revision >= MIN_REVISION_WITH_TEMPORARY_TABLES {
                        let _temp_table = conn.read_string().await?;
                    }
                    let block = self.block_reader.read_block(&mut conn).await?;
                    if !block.is_empty() {
                        if let Some(cb) = query.get_on_data() {
                            cb(&block);
                        }
                        if let Some(cb) = query.get_on_data_cancelable() {
                            if !cb(&block) {
                                self.send_cancel(&mut conn).await?;
                            }
                        }
                        blocks.push(block);
                    }
                }
                code if code == ServerCode::Progress as u64 => {
                    progress_info = read_progress(&mut conn, self.server_info.revision).await?;
                    self.last_progress = Some(progress_info.clone());
                    if let Some(cb) = query.get_on_progress() {
                        cb(&progress_info);
                    }
                }
                code if code == ServerCode::EndOfStream as u64 => {
                    break;
                }
                code if code == ServerCode::ProfileInfo as u64 => {
                    let profile = read_profile(&mut conn).await?;
                    self.last_profile = Some(profile.clone());
                    if let Some(cb) = query.get_on_profile() {
                        cb(&profile);
                    }
                }
                code if code == ServerCode::Log as u64 => {
                    let _log_tag = conn.read_string().await?;
                    let uncompressed_reader = BlockReader::new(self.server_info.revision);
                    let block = uncompressed_reader.read_block(&mut conn).await?;
                    trace_log_block(&block);
                    if let Some(cb) = query.get_on_server_log() {
                        cb(&block);
                    }
                }
                code if code == ServerCode::ProfileEvents as u64 => {
                    let _table_name = conn.read_string().await?;
                    let uncompressed_reader = BlockReader::new(self.server_info.revision);
                    let block = uncompressed_reader.read_block(&mut conn).await?;
                    if let Some(cb) = query.get_on_profile_events() {
                        cb(&block);
                    }
                }
                code if code == ServerCode::TableColumns as u64 => {
                    let _table_name = conn.read_string().await?;
                    let _columns_metadata = conn.read_string().await?;
                }
                code if code == ServerCode::Exception as u64 => {
                    let exception = read_exception(&mut conn).await?;
                    if let Some(cb) = query.get_on_exception() {
                        cb(&exception);
                    }
                    return Err(Error::Server(exception));
                }
                other => {
                    warn!(packet_type = other, "unexpected packet type in query response");
                    return Err(Error::Protocol(format!("unexpected packet type: {}", other)));
                }
            }
        }

        Ok(QueryResult {
            blocks,
            progress: progress_info,
        })
    }

    /// Execute a query, discarding any returned rows.
    ///
    /// Intended for DDL and other statements whose result set does not
    /// matter (`CREATE TABLE`, `INSERT ... SELECT`, etc).
    pub async fn execute(&mut self, query: impl Into<Query>) -> Result<()> {
        self.query(query).await?;
        Ok(())
    }

    /// Execute a query tagged with an explicit query ID, discarding any
    /// returned rows.
    pub async fn execute_with_id(
        &mut self,
        query: impl Into<String>,
        query_id: impl Into<String>,
    ) -> Result<()> {
        let query = Query::new(query.into()).with_query_id(query_id);
        self.execute(query).await
    }

    /// Execute a query tagged with an explicit query ID and collect all
    /// result blocks.
    pub async fn query_with_id(
        &mut self,
        query: impl Into<String>,
        query_id: impl Into<String>,
    ) -> Result<QueryResult> {
        let query = Query::new(query.into()).with_query_id(query_id);
        self.query(query).await
    }

    /// Insert a single block of data into `table_name`, tagging the
    /// underlying INSERT with an explicit query ID.
    pub async fn insert_with_id(
        &mut self,
        table_name: &str,
        query_id: impl Into<String>,
        block: Block,
    ) -> Result<()> {
        self.insert_many_with_id(table_name, query_id, std::iter::once(block))
            .await
    }

    /// Reset the client's settings and pending state back to defaults.
    ///
    /// The connection itself is left open; only in-memory client-side
    /// options (such as a previously negotiated compression override) are
    /// reset to what [`ClientOptions`] originally specified.
    pub fn reset(&mut self) {
        let mut block_reader = BlockReader::new(self.server_info.revision);
        let mut block_writer = BlockWriter::new(self.server_info.revision);
        if let Some(compression) = self.options.compression {
            block_reader = block_reader.with_compression(compression);
            block_writer = block_writer.with_compression(compression);
        }
        self.block_reader = block_reader;
        self.block_writer = block_writer;
        self.last_profile = None;
        self.last_progress = None;
    }

    /// Send a Cancel packet, asking the server to stop the currently
    /// running query. The caller should keep draining packets (as `query`
    /// does internally) until EndOfStream arrives.
    pub async fn cancel(&mut self) -> Result<()> {
        let mut conn = self.conn.lock().await;
        self.send_cancel(&mut conn).await
    }

    async fn send_cancel(&self, conn: &mut Connection) -> Result<()> {
        debug!("sending cancel");
        conn.write_varint(ClientCode::Cancel as u64).await?;
        conn.flush().await
    }

    async fn send_query(&self, conn: &mut Connection, query: &Query) -> Result<()> {
        trace!(query = query.text(), "sending query");
        conn.write_varint(ClientCode::Query as u64).await?;
        conn.write_string(query.id()).await?;

        let revision = self.server_info.revision;
        if revision >= MIN_REVISION_WITH_CLIENT_INFO {
            let info = &self.options.client_info;

            conn.write_u8(1).await?; // query_kind = 1 (initial query)
            conn.write_string(&info.initial_user).await?;
            conn.write_string(&info.initial_query_id).await?;
            conn.write_string("0.0.0.0:0").await?; // initial_address

            if revision >= MIN_REVISION_WITH_INITIAL_QUERY_START_TIME {
                conn.write_i64(0).await?; // initial_query_start_time_microseconds
            }

            conn.write_u8(info.interface_type).await?;
            conn.write_string(&info.os_user).await?;
            conn.write_string(&info.client_hostname).await?;
            conn.write_string(&info.client_name).await?;
            conn.write_varint(info.client_version_major).await?;
            conn.write_varint(info.client_version_minor).await?;
            conn.write_varint(info.client_revision).await?;

            if revision >= MIN_REVISION_WITH_QUOTA_KEY {
                conn.write_string(&info.quota_key).await?;
            }
            if revision >= MIN_REVISION_WITH_DISTRIBUTED_DEPTH {
                conn.write_varint(0).await?; // distributed_depth
            }
            if revision >= MIN_REVISION_WITH_VERSION_PATCH {
                conn.write_varint(info.client_version_patch).await?;
            }
            if revision >= MIN_REVISION_WITH_OPENTELEMETRY {
                if let Some(ctx) = query.tracing_context().filter(|c| c.is_enabled()) {
                    conn.write_u8(1).await?;
                    conn.write_bytes(&ctx.trace_id.to_be_bytes()).await?;
                    conn.write_u64(ctx.span_id).await?;
                    conn.write_string(&ctx.tracestate).await?;
                    conn.write_u8(ctx.trace_flags).await?;
                } else {
                    conn.write_u8(0).await?; // no OpenTelemetry
                }
            }
            if revision >= MIN_REVISION_WITH_PARALLEL_REPLICAS {
                conn.write_varint(0).await?; // collaborate_with_initiator
                conn.write_varint(0).await?; // count_participating_replicas
                conn.write_varint(0).await?; // number_of_current_replica
            }
        }

        if revision >= MIN_REVISION_WITH_SETTINGS_AS_STRINGS {
            for (key, field) in query.settings() {
                conn.write_string(key).await?;
                conn.write_varint(field.flags()).await?;
                conn.write_string(&field.value).await?;
            }
        }
        conn.write_string("").await?; // end of settings

        if revision >= MIN_REVISION_WITH_INTERSERVER_SECRET {
            conn.write_string("").await?;
        }

        conn.write_varint(2).await?; // Stage::Complete
        let compression_enabled = if self.options.compression.is_some() { 1u64 } else { 0u64 };
        conn.write_varint(compression_enabled).await?;
        conn.write_string(query.text()).await?;

        if revision >= MIN_REVISION_WITH_PARAMETERS {
            for (key, value) in query.parameters() {
                conn.write_string(key).await?;
                conn.write_varint(2).await?; // Custom type
                conn.write_string(value).await?;
            }
            conn.write_string("").await?; // end of parameters
        }

        // An empty block always follows a Query packet, finalizing it.
        conn.write_varint(ClientCode::Data as u64).await?;
        let empty_block = Block::new();
        let writer = match self.options.compression {
            Some(method) => BlockWriter::new(revision).with_compression(method),
            None => BlockWriter::new(revision),
        };
        writer.write_block(conn, &empty_block).await?;

        conn.flush().await?;
        Ok(())
    }

    /// Insert a single block of data into `table_name`.
    ///
    /// The column names in `block` are used verbatim to build the `INSERT
    /// INTO table (cols...) VALUES` statement; types are validated against
    /// the server's own column description before the data is sent.
    pub async fn insert(&mut self, table_name: &str, block: Block) -> Result<()> {
        self.insert_many(table_name, std::iter::once(block)).await
    }

    /// Insert multiple blocks of data into `table_name` over a single
    /// INSERT statement. All blocks must share the same column names.
    pub async fn insert_many(
        &mut self,
        table_name: &str,
        blocks: impl IntoIterator<Item = Block>,
    ) -> Result<()> {
        self.insert_many_with_id(table_name, "", blocks).await
    }

    /// Insert multiple blocks of data into `table_name` over a single
    /// INSERT statement tagged with an explicit query ID.
    pub async fn insert_many_with_id(
        &mut self,
        table_name: &str,
        query_id: impl Into<String>,
        blocks: impl IntoIterator<Item = Block>,
    ) -> Result<()> {
        let mut blocks = blocks.into_iter();
        let first = blocks.next().ok_or_else(|| {
            Error::InvalidArgument("insert_many requires at least one block".to_string())
        })?;

        let col_names: Vec<String> = (0..first.column_count())
            .filter_map(|i| first.column_name(i))
            .map(|n| format!("`{}`", n.replace('`', "``")))
            .collect();

        if col_names.is_empty() {
            return Err(Error::Validation("block has no columns".to_string()));
        }

        let query_text = format!(
            "INSERT INTO {} ({}) VALUES",
            table_name,
            col_names.join(", ")
        );

        let query = Query::new(query_text).with_query_id(query_id);
        let mut conn = self.conn.lock().await;
        self.send_query(&mut conn, &query).await?;

        // The server replies with a (likely empty) sample Data packet whose
        // columns describe the table schema; it must be consumed, and its
        // schema is used to validate every block we are about to send.
        let sample = loop {
            let packet_type = conn.read_varint().await?;

            match packet_type {
                code if code == ServerCode::Data as u64 => {
                    if self.server_info.revision >= MIN_REVISION_WITH_TEMPORARY_TABLES {
                        let _temp_table = conn.read_string().await?;
                    }
                    break self.block_reader.read_block(&mut conn).await?;
                }
                code if code == ServerCode::Progress as u64 => {
                    let progress_info =
                        read_progress(&mut conn, self.server_info.revision).await?;
                    self.last_progress = Some(progress_info);
                }
                code if code == ServerCode::TableColumns as u64 => {
                    let _table_name = conn.read_string().await?;
                    let _columns_metadata = conn.read_string().await?;
                }
                code if code == ServerCode::Exception as u64 => {
                    let exception = read_exception(&mut conn).await?;
                    return Err(Error::Server(exception));
                }
                other => {
                    return Err(Error::Protocol(format!(
                        "unexpected packet type while waiting for insert sample block: {}",
                        other
                    )));
                }
            }
        };

        validate_insert_schema(&sample, &first)?;

        conn.write_varint(ClientCode::Data as u64).await?;
        self.block_writer.write_block(&mut conn, &first).await?;

        for block in blocks {
            validate_insert_schema(&sample, &block)?;
            conn.write_varint(ClientCode::Data as u64).await?;
            self.block_writer.write_block(&mut conn, &block).await?;
        }

        // Empty block signals end of data.
        conn.write_varint(ClientCode::Data as u64).await?;
        self.block_writer.write_block(&mut conn, &Block::new()).await?;
        conn.flush().await?;

        loop {
            let packet_type = conn.read_varint().await?;

            match packet_type {
                code if code == ServerCode::EndOfStream as u64 => {
                    break;
                }
                code if code == ServerCode::Data as u64 => {
                    if self.server_info.revision >= MIN_REVISION_WITH_TEMPORARY_TABLES {
                        let _temp_table = conn.read_string().await?;
                    }
                    let _block = self.block_reader.read_block(&mut conn).await?;
                }
                code if code == ServerCode::Progress as u64 => {
                    let progress_info =
                        read_progress(&mut conn, self.server_info.revision).await?;
                    self.last_progress = Some(progress_info);
                }
                code if code == ServerCode::ProfileEvents as u64 => {
                    let _table_name = conn.read_string().await?;
                    let uncompressed_reader = BlockReader::new(self.server_info.revision);
                    let _block = uncompressed_reader.read_block(&mut conn).await?;
                }
                code if code == ServerCode::TableColumns as u64 => {
                    let _table_name = conn.read_string().await?;
                    let _columns_metadata = conn.read_string().await?;
                }
                code if code == ServerCode::Exception as u64 => {
                    let exception = read_exception(&mut conn).await?;
                    return Err(Error::Server(exception));
                }
                other => {
                    warn!(packet_type = other, "ignoring unexpected packet after insert data");
                }
            }
        }

        Ok(())
    }

    /// Ping the server and wait for the Pong reply.
    pub async fn ping(&mut self) -> Result<()> {
        let mut conn = self.conn.lock().await;
        conn.write_varint(ClientCode::Ping as u64).await?;
        conn.flush().await?;

        let packet_type = conn.read_varint().await?;

        if packet_type == ServerCode::Pong as u64 {
            Ok(())
        } else if packet_type == ServerCode::Exception as u64 {
            let exception = read_exception(&mut conn).await?;
            Err(Error::Server(exception))
        } else {
            Err(Error::Protocol(format!("expected Pong, got packet type {}", packet_type)))
        }
    }

    /// The server's handshake info (name, version, revision, timezone).
    pub fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    /// Alias for [`Client::server_info`], matching this crate's naming for
    /// the other "most recent snapshot" accessors below.
    pub fn last_server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    /// The most recent `ProfileInfo` reported by a `query`/`execute` call,
    /// if any has been observed yet.
    pub fn last_profile(&self) -> Option<&crate::query::Profile> {
        self.last_profile.as_ref()
    }

    /// The most recent `Progress` totals reported by a `query`/`execute`
    /// call, if any has been observed yet.
    pub fn last_progress(&self) -> Option<&Progress> {
        self.last_progress.as_ref()
    }

    /// The server's negotiated protocol revision.
    pub fn server_revision(&self) -> u64 {
        self.server_info.revision
    }

    /// The server's version as `(major, minor, patch)`.
    pub fn server_version(&self) -> (u64, u64, u64) {
        (
            self.server_info.version_major,
            self.server_info.version_minor,
            self.server_info.version_patch,
        )
    }

    /// The options this client was constructed with.
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }
}

/// Validate that a block to be inserted matches the server's sample block:
/// same column names, in the same order, with the same types.
fn validate_insert_schema(sample: &Block, block: &Block) -> Result<()> {
    if sample.column_count() == 0 {
        // Some servers/table engines return an empty sample; nothing to
        // check against.
        return Ok(());
    }

    // The caller's block may supply columns in any order and may omit
    // template columns entirely (the server resolves the rest by name).
    // Every column the caller DOES supply must exist in the template under
    // the same name and with the same type.
    for i in 0..block.column_count() {
        let actual_name = block.column_name(i).unwrap_or_default();
        let actual_type = block.column(i).unwrap().column_type().name();

        let expected_type = match sample.column_by_name(actual_name) {
            Some(col) => col.column_type().name(),
            None => {
                return Err(Error::Validation(format!(
                    "insert block column '{}' is not present in the server's table schema",
                    actual_name
                )));
            }
        };

        if expected_type != actual_type {
            return Err(Error::TypeMismatch {
                expected: expected_type,
                actual: actual_type,
            });
        }
    }

    Ok(())
}

async fn read_progress(conn: &mut Connection, server_revision: u64) -> Result<Progress> {
    let rows = conn.read_varint().await?;
    let bytes = conn.read_varint().await?;
    let total_rows = conn.read_varint().await?;

    let (written_rows, written_bytes) = if server_revision >= 54405 {
        (conn.read_varint().await?, conn.read_varint().await?)
    } else {
        (0, 0)
    };

    Ok(Progress {
        rows,
        bytes,
        total_rows,
        written_rows,
        written_bytes,
    })
}

/// Re-emits each row of a server `Log` block through `tracing`, at a level
/// derived from the row's `priority` column (syslog-style: 1-3 error-ish,
/// 4 warning, 5-6 info-ish, 7-8 debug/trace).
fn trace_log_block(block: &Block) {
    use crate::column::numeric::{ColumnInt8, ColumnUInt64};
    use crate::column::string::ColumnString;

    let priority = block.column_by_name("priority");
    let query_id = block.column_by_name("query_id");
    let thread_id = block.column_by_name("thread_id");
    let source = block.column_by_name("source");
    let text = block.column_by_name("text");

    for row in 0..block.row_count() {
        let priority_val = priority
            .as_ref()
            .and_then(|c| c.as_any().downcast_ref::<ColumnInt8>())
            .map(|c| c.at(row))
            .unwrap_or(6);
        let query_id_val = query_id
            .as_ref()
            .and_then(|c| c.as_any().downcast_ref::<ColumnString>())
            .map(|c| c.at(row))
            .unwrap_or_default();
        let thread_id_val = thread_id
            .as_ref()
            .and_then(|c| c.as_any().downcast_ref::<ColumnUInt64>())
            .map(|c| c.at(row))
            .unwrap_or(0);
        let source_val = source
            .as_ref()
            .and_then(|c| c.as_any().downcast_ref::<ColumnString>())
            .map(|c| c.at(row))
            .unwrap_or_default();
        let text_val = text
            .as_ref()
            .and_then(|c| c.as_any().downcast_ref::<ColumnString>())
            .map(|c| c.at(row))
            .unwrap_or_default();

        match priority_val {
            1..=3 => tracing::event!(
                tracing::Level::WARN,
                query_id = %query_id_val,
                thread_id = thread_id_val,
                source = %source_val,
                "{}",
                text_val
            ),
            4 => tracing::event!(
                tracing::Level::DEBUG,
                query_id = %query_id_val,
                thread_id = thread_id_val,
                source = %source_val,
                "{}",
                text_val
            ),
            _ => tracing::event!(
                tracing::Level::TRACE,
                query_id = %query_id_val,
                thread_id = thread_id_val,
                source = %source_val,
                "{}",
                text_val
            ),
        }
    }
}

async fn read_profile(conn: &mut Connection) -> Result<crate::query::Profile> {
    let rows = conn.read_varint().await?;
    let blocks = conn.read_varint().await?;
    let bytes = conn.read_varint().await?;
    let applied_limit = conn.read_u8().await? != 0;
    let rows_before_limit = conn.read_varint().await?;
    let calculated_rows_before_limit = conn.read_u8().await? != 0;

    Ok(crate::query::Profile {
        rows,
        blocks,
        bytes,
        rows_before_limit,
        applied_limit,
        calculated_rows_before_limit,
    })
}

fn read_exception<'a>(
    conn: &'a mut Connection,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Exception>> + Send + 'a>> {
    Box::pin(async move {
        let code = conn.read_i32().await?;
        let name = conn.read_string().await?;
        let display_text = conn.read_string().await?;
        let stack_trace = conn.read_string().await?;

        let has_nested = conn.read_u8().await?;
        let nested = if has_nested != 0 {
            Some(Box::new(read_exception(conn).await?))
        } else {
            None
        };

        Ok(Exception {
            code,
            name,
            display_text,
            stack_trace,
            nested,
        })
    })
}

/// The result of a [`Client::query`] call: all returned blocks plus the
/// final progress totals reported by the server.
pub struct QueryResult {
    /// Result blocks, in arrival order.
    pub blocks: Vec<Block>,
    /// Progress information (rows/bytes read and written).
    pub progress: Progress,
}

impl QueryResult {
    /// All result blocks.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Final progress totals.
    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    /// Total number of rows across all blocks.
    pub fn total_rows(&self) -> usize {
        self.blocks.iter().map(|b| b.row_count()).sum()
    }
}
