use crate::block::{Block, BlockInfo};
use crate::column::ColumnRef;
use crate::compression::{compress, decompress};
use crate::connection::Connection;
use crate::protocol::CompressionMethod;
use crate::types::Type;
use crate::{Error, Result};
use bytes::{Buf, BufMut, BytesMut};
use std::sync::Arc;

/// Minimum revision constants
const DBMS_MIN_REVISION_WITH_TEMPORARY_TABLES: u64 = 50264;
const DBMS_MIN_REVISION_WITH_BLOCK_INFO: u64 = 51903;
const DBMS_MIN_REVISION_WITH_CUSTOM_SERIALIZATION: u64 = 54454;

/// Matches `types::parser::MAX_TYPE_NESTING_DEPTH`; re-checked here because
/// a `Type` can also be built programmatically (not just parsed from a
/// wire string), so column construction needs its own guard.
const MAX_COLUMN_NESTING_DEPTH: usize = crate::types::MAX_TYPE_NESTING_DEPTH;

fn type_nesting_depth(type_: &Type) -> usize {
    match type_ {
        Type::Array { item_type } => 1 + type_nesting_depth(item_type),
        Type::Nullable { nested_type } => 1 + type_nesting_depth(nested_type),
        Type::LowCardinality { nested_type } => 1 + type_nesting_depth(nested_type),
        Type::Map { key_type, value_type } => {
            1 + type_nesting_depth(key_type).max(type_nesting_depth(value_type))
        }
        Type::Tuple { item_types } => {
            1 + item_types.iter().map(type_nesting_depth).max().unwrap_or(0)
        }
        _ => 0,
    }
}

/// Create a column instance for the given type
/// This is used internally by column types like Array and Nullable
pub fn create_column(type_: &Type) -> Result<ColumnRef> {
    if type_nesting_depth(type_) > MAX_COLUMN_NESTING_DEPTH {
        return Err(Error::Validation(format!(
            "type nesting exceeds {} levels: {}",
            MAX_COLUMN_NESTING_DEPTH,
            type_.name()
        )));
    }
    use crate::column::array::ColumnArray;
    use crate::column::date::{ColumnDate, ColumnDate32, ColumnDateTime, ColumnDateTime64};
    use crate::column::decimal::ColumnDecimal;
    use crate::column::enum_column::{ColumnEnum16, ColumnEnum8};
    use crate::column::ipv4::ColumnIpv4;
    use crate::column::ipv6::ColumnIpv6;
    use crate::column::lowcardinality::ColumnLowCardinality;
    use crate::column::map::ColumnMap;
    use crate::column::nothing::ColumnNothing;
    use crate::column::nullable::ColumnNullable;
    use crate::column::numeric::*;
    use crate::column::string::{ColumnFixedString, ColumnString};
    use crate::column::uuid::ColumnUuid;

    match type_ {
        Type::Simple(code) => {
            use crate::types::TypeCode;
            match code {
                TypeCode::UInt8 => Ok(Arc::new(ColumnUInt8::new(type_.clone()))),
                TypeCode::UInt16 => Ok(Arc::new(ColumnUInt16::new(type_.clone()))),
                TypeCode::UInt32 => Ok(Arc::new(ColumnUInt32::new(type_.clone()))),
                TypeCode::UInt64 => Ok(Arc::new(ColumnUInt64::new(type_.clone()))),
                TypeCode::Int8 => Ok(Arc::new(ColumnInt8::new(type_.clone()))),
                TypeCode::Int16 => Ok(Arc::new(ColumnInt16::new(type_.clone()))),
                TypeCode::Int32 => Ok(Arc::new(ColumnInt32::new(type_.clone()))),
                TypeCode::Int64 => Ok(Arc::new(ColumnInt64::new(type_.clone()))),
                TypeCode::Float32 => Ok(Arc::new(ColumnFloat32::new(type_.clone()))),
                TypeCode::Float64 => Ok(Arc::new(ColumnFloat64::new(type_.clone()))),
                TypeCode::String => Ok(Arc::new(ColumnString::new(type_.clone()))),
                TypeCode::Date => Ok(Arc::new(ColumnDate::new(type_.clone()))),
                TypeCode::Date32 => Ok(Arc::new(ColumnDate32::new(type_.clone()))),
                TypeCode::UUID => Ok(Arc::new(ColumnUuid::new(type_.clone()))),
                TypeCode::IPv4 => Ok(Arc::new(ColumnIpv4::new(type_.clone()))),
                TypeCode::IPv6 => Ok(Arc::new(ColumnIpv6::new(type_.clone()))),
                TypeCode::Void => Ok(Arc::new(ColumnNothing::new(type_.clone()))),
                _ => Err(Error::Protocol(format!("Unsupported type: {}", type_.name()))),
            }
        }
        Type::FixedString { .. } => Ok(Arc::new(ColumnFixedString::new(type_.clone()))),
        Type::DateTime { .. } => Ok(Arc::new(ColumnDateTime::new(type_.clone()))),
        Type::DateTime64 { .. } => Ok(Arc::new(ColumnDateTime64::new(type_.clone()))),
        Type::Enum8 { .. } => Ok(Arc::new(ColumnEnum8::try_new(type_.clone())?)),
        Type::Enum16 { .. } => Ok(Arc::new(ColumnEnum16::new(type_.clone()))),
        Type::Decimal { .. } => Ok(Arc::new(ColumnDecimal::new(type_.clone()))),
        Type::Nullable { .. } => Ok(Arc::new(ColumnNullable::new(type_.clone()))),
        Type::Array { .. } => Ok(Arc::new(ColumnArray::new(type_.clone()))),
        Type::Map { .. } => Ok(Arc::new(ColumnMap::new(type_.clone()))),
        Type::LowCardinality { .. } => Ok(Arc::new(ColumnLowCardinality::new(type_.clone()))),
        Type::Tuple { item_types } => {
            let mut columns = Vec::new();
            for item_type in item_types {
                columns.push(create_column(item_type)?);
            }
            Ok(Arc::new(crate::column::ColumnTuple::new(type_.clone(), columns)))
        }
    }
}

/// Fixed on-wire byte width of a row for terminal, non-variable-length
/// types. `None` for types whose width can't be known without reading
/// the data itself (String, Array, Map, LowCardinality, Nullable, Tuple of
/// variable-width elements).
fn fixed_row_width(type_: &Type) -> Option<usize> {
    use crate::types::TypeCode;
    match type_ {
        Type::Simple(code) => match code {
            TypeCode::UInt8 | TypeCode::Int8 => Some(1),
            TypeCode::UInt16 | TypeCode::Int16 | TypeCode::Date => Some(2),
            TypeCode::UInt32
            | TypeCode::Int32
            | TypeCode::Float32
            | TypeCode::Date32
            | TypeCode::IPv4 => Some(4),
            TypeCode::UInt64 | TypeCode::Int64 | TypeCode::Float64 => Some(8),
            TypeCode::UUID | TypeCode::IPv6 => Some(16),
            TypeCode::Void => Some(1),
            _ => None,
        },
        Type::FixedString { size } => Some(*size),
        Type::DateTime { .. } => Some(4),
        Type::DateTime64 { .. } => Some(8),
        Type::Enum8 { .. } => Some(1),
        Type::Enum16 { .. } => Some(2),
        Type::Decimal { precision, .. } => {
            if *precision <= 9 {
                Some(4)
            } else if *precision <= 18 {
                Some(8)
            } else {
                Some(16)
            }
        }
        Type::Tuple { item_types } => {
            let mut total = 0;
            for item in item_types {
                total += fixed_row_width(item)?;
            }
            Some(total)
        }
        _ => None,
    }
}

/// Reader for blocks from network
pub struct BlockReader {
    server_revision: u64,
    compression: Option<CompressionMethod>,
}

impl BlockReader {
    /// Create a new block reader
    pub fn new(server_revision: u64) -> Self {
        Self { server_revision, compression: None }
    }

    /// Enable compression
    pub fn with_compression(mut self, method: CompressionMethod) -> Self {
        self.compression = Some(method);
        self
    }

    /// Read a block from the connection.
    /// Note: Caller is responsible for skipping temp table name if needed (matches C++ ReadBlock)
    pub async fn read_block(&self, conn: &mut Connection) -> Result<Block> {
        if self.compression.is_some() {
            let block_data = self.read_compressed_frame(conn).await?;
            self.parse_block_from_buffer(&mut &block_data[..])
        } else {
            self.read_block_direct(conn).await
        }
    }

    /// Read one compressed frame (checksum + header + payload) and decompress it.
    async fn read_compressed_frame(&self, conn: &mut Connection) -> Result<bytes::Bytes> {
        let checksum = conn.read_bytes(16).await?;
        let method = conn.read_u8().await?;
        let compressed_size = conn.read_u32().await? as usize;
        let uncompressed_size = conn.read_u32().await?;

        let compressed_data_len = compressed_size.saturating_sub(9);
        let compressed_data = conn.read_bytes(compressed_data_len).await?;

        let mut full_frame = BytesMut::with_capacity(16 + 9 + compressed_data_len);
        full_frame.extend_from_slice(&checksum);
        full_frame.put_u8(method);
        full_frame.put_u32_le(compressed_size as u32);
        full_frame.put_u32_le(uncompressed_size);
        full_frame.extend_from_slice(&compressed_data);

        decompress(&full_frame)
    }

    /// Read block directly from connection (uncompressed).
    ///
    /// The wire layout for an uncompressed block is byte-identical to what
    /// [`parse_block_from_buffer`] expects, so this tees every byte it reads
    /// off the socket into a buffer as it walks the column type tree, then
    /// hands that buffer to the same buffer-based column parser the
    /// compressed path uses. This avoids maintaining two independent
    /// decoders for every column type.
    async fn read_block_direct(&self, conn: &mut Connection) -> Result<Block> {
        let mut buffer = BytesMut::new();

        if self.server_revision >= DBMS_MIN_REVISION_WITH_BLOCK_INFO {
            self.tee_block_info(conn, &mut buffer).await?;
        }

        let num_columns = tee_varint(conn, &mut buffer).await? as usize;
        let num_rows = tee_varint(conn, &mut buffer).await? as usize;

        for _ in 0..num_columns {
            tee_string(conn, &mut buffer).await?;
            let type_name = tee_string_value(conn, &mut buffer).await?;

            if self.server_revision >= DBMS_MIN_REVISION_WITH_CUSTOM_SERIALIZATION {
                let custom_len = conn.read_u8().await?;
                buffer.put_u8(custom_len);
                if custom_len > 0 {
                    return Err(Error::Protocol(
                        "Custom serialization not supported".to_string(),
                    ));
                }
            }

            let column_type = Type::parse(&type_name)?;
            if num_rows > 0 {
                tee_column(conn, &column_type, num_rows, &mut buffer).await?;
            }
        }

        let mut cursor: &[u8] = &buffer[..];
        self.parse_block_from_buffer(&mut cursor)
    }

    async fn tee_block_info(
        &self,
        conn: &mut Connection,
        out: &mut BytesMut,
    ) -> Result<()> {
        tee_varint(conn, out).await?;
        let is_overflows = conn.read_u8().await?;
        out.put_u8(is_overflows);
        tee_varint(conn, out).await?;
        let bucket_num = conn.read_i32().await?;
        out.put_i32_le(bucket_num);
        tee_varint(conn, out).await?;
        Ok(())
    }

    /// Parse block from buffer (already-decompressed or teed bytes)
    fn parse_block_from_buffer(&self, buffer: &mut &[u8]) -> Result<Block> {
        let mut block = Block::new();

        if self.server_revision >= DBMS_MIN_REVISION_WITH_BLOCK_INFO {
            let info = self.read_block_info_from_buffer(buffer)?;
            block.set_info(info);
        }

        let num_columns = read_varint(buffer)? as usize;
        let num_rows = read_varint(buffer)? as usize;

        for _ in 0..num_columns {
            let name = read_string(buffer)?;
            let type_name = read_string(buffer)?;

            if self.server_revision >= DBMS_MIN_REVISION_WITH_CUSTOM_SERIALIZATION {
                if buffer.is_empty() {
                    return Err(Error::Protocol("Unexpected end of block data".to_string()));
                }
                let custom_len = buffer[0];
                buffer.advance(1);

                if custom_len > 0 {
                    return Err(Error::Protocol(
                        "Custom serialization not supported".to_string(),
                    ));
                }
            }

            let column_type = Type::parse(&type_name)?;
            let mut column = create_column(&column_type)?;

            if num_rows > 0 {
                let column_mut = Arc::get_mut(&mut column)
                    .ok_or_else(|| Error::Protocol("Column not mutable".to_string()))?;
                column_mut.load_prefix(buffer, num_rows)?;
                column_mut.load_from_buffer(buffer, num_rows)?;
            }

            block.append_column(name, column)?;
        }

        Ok(block)
    }

    /// Read block info from buffer
    fn read_block_info_from_buffer(&self, buffer: &mut &[u8]) -> Result<BlockInfo> {
        let _num1 = read_varint(buffer)?;

        if buffer.is_empty() {
            return Err(Error::Protocol("Unexpected end reading block info".to_string()));
        }
        let is_overflows = buffer[0];
        buffer.advance(1);

        let _num2 = read_varint(buffer)?;

        if buffer.len() < 4 {
            return Err(Error::Protocol("Unexpected end reading bucket_num".to_string()));
        }
        let bucket_num = i32::from_le_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]);
        buffer.advance(4);

        let _num3 = read_varint(buffer)?;

        Ok(BlockInfo { is_overflows, bucket_num })
    }
}

/// Tee a varint off the connection into `out`, returning its decoded value.
async fn tee_varint(conn: &mut Connection, out: &mut BytesMut) -> Result<u64> {
    let mut result: u64 = 0;
    let mut shift = 0;

    loop {
        let byte = conn.read_u8().await?;
        out.put_u8(byte);
        result |= ((byte & 0x7F) as u64) << shift;

        if byte & 0x80 == 0 {
            break;
        }

        shift += 7;
        if shift >= 64 {
            return Err(Error::Protocol("Varint overflow".to_string()));
        }
    }

    Ok(result)
}

/// Tee `len` raw bytes off the connection into `out`.
async fn tee_bytes(conn: &mut Connection, len: usize, out: &mut BytesMut) -> Result<()> {
    let data = conn.read_bytes(len).await?;
    out.put_slice(&data);
    Ok(())
}

/// Tee a length-prefixed string, discarding the decoded value.
async fn tee_string(conn: &mut Connection, out: &mut BytesMut) -> Result<()> {
    let len = tee_varint(conn, out).await? as usize;
    tee_bytes(conn, len, out).await
}

/// Tee a length-prefixed string, returning the decoded value (used for type names).
async fn tee_string_value(conn: &mut Connection, out: &mut BytesMut) -> Result<String> {
    let len = tee_varint(conn, out).await? as usize;
    let start = out.len();
    tee_bytes(conn, len, out).await?;
    String::from_utf8(out[start..].to_vec())
        .map_err(|e| Error::Protocol(format!("Invalid UTF-8 in type name: {}", e)))
}

/// Tee exactly the bytes one column's on-wire body occupies for `rows` rows,
/// without materializing typed values. The teed bytes are later parsed by
/// the buffer-based [`crate::column::Column::load_from_buffer`], so this
/// must mirror each column's wire layout exactly, including prefixes for
/// composite types.
fn tee_column<'a>(
    conn: &'a mut Connection,
    type_: &'a Type,
    rows: usize,
    out: &'a mut BytesMut,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<()>> + Send + 'a>> {
    Box::pin(async move {
        if let Some(width) = fixed_row_width(type_) {
            return tee_bytes(conn, rows * width, out).await;
        }

        match type_ {
            Type::Simple(code) => {
                use crate::types::TypeCode;
                match code {
                    TypeCode::String => {
                        for _ in 0..rows {
                            tee_string(conn, out).await?;
                        }
                        Ok(())
                    }
                    _ => Err(Error::Protocol(format!(
                        "Uncompressed reading not implemented for type: {}",
                        type_.name()
                    ))),
                }
            }
            Type::Nullable { nested_type } => {
                tee_bytes(conn, rows, out).await?; // null mask, one byte/row
                tee_column(conn, nested_type, rows, out).await
            }
            Type::Array { item_type } => {
                let mut offsets = Vec::with_capacity(rows);
                for _ in 0..rows {
                    let before = out.len();
                    tee_bytes(conn, 8, out).await?;
                    let offset = u64::from_le_bytes(out[before..before + 8].try_into().unwrap());
                    offsets.push(offset);
                }
                let total_items = offsets.last().copied().unwrap_or(0) as usize;
                tee_column(conn, item_type, total_items, out).await
            }
            Type::Map { key_type, value_type } => {
                let tuple_type = Type::Tuple {
                    item_types: vec![key_type.as_ref().clone(), value_type.as_ref().clone()],
                };
                let array_type = Type::Array { item_type: Box::new(tuple_type) };
                tee_column(conn, &array_type, rows, out).await
            }
            Type::Tuple { item_types } => {
                for item_type in item_types {
                    tee_column(conn, item_type, rows, out).await?;
                }
                Ok(())
            }
            Type::LowCardinality { nested_type } => tee_low_cardinality(conn, nested_type, rows, out).await,
            _ => Err(Error::Protocol(format!(
                "Uncompressed reading not implemented for type: {}",
                type_.name()
            ))),
        }
    })
}

/// Tees the LowCardinality prefix + body, mirroring
/// [`crate::column::lowcardinality::ColumnLowCardinality::load_from_buffer`].
async fn tee_low_cardinality<'a>(
    conn: &'a mut Connection,
    nested_type: &'a Type,
    rows: usize,
    out: &'a mut BytesMut,
) -> Result<()> {
    const INDEX_TYPE_MASK: u64 = 0xFF;

    // Prefix: key serialization version
    tee_bytes(conn, 8, out).await?;

    // Body: index_serialization_type
    let before = out.len();
    tee_bytes(conn, 8, out).await?;
    let index_serialization_type =
        u64::from_le_bytes(out[before..before + 8].try_into().unwrap());
    let index_type = index_serialization_type & INDEX_TYPE_MASK;

    // number_of_keys
    let before = out.len();
    tee_bytes(conn, 8, out).await?;
    let number_of_keys = u64::from_le_bytes(out[before..before + 8].try_into().unwrap()) as usize;

    // Dictionary data. A Nullable dictionary stores only the nested column
    // (no null mask on the wire).
    if number_of_keys > 0 {
        let dict_type = match nested_type {
            Type::Nullable { nested_type } => nested_type.as_ref(),
            other => other,
        };
        tee_column(conn, dict_type, number_of_keys, out).await?;
    }

    // number_of_rows
    tee_bytes(conn, 8, out).await?;

    // index data
    let index_width = match index_type {
        0 => 1,
        1 => 2,
        2 => 4,
        3 => 8,
        other => {
            return Err(Error::Protocol(format!(
                "Unknown LowCardinality index type: {}",
                other
            )))
        }
    };
    tee_bytes(conn, rows * index_width, out).await
}

/// Writer for blocks to network
pub struct BlockWriter {
    server_revision: u64,
    compression: Option<CompressionMethod>,
}

impl BlockWriter {
    /// Create a new block writer
    pub fn new(server_revision: u64) -> Self {
        Self { server_revision, compression: None }
    }

    /// Enable compression
    pub fn with_compression(mut self, method: CompressionMethod) -> Self {
        self.compression = Some(method);
        self
    }

    /// Write a block to the connection
    pub async fn write_block(&self, conn: &mut Connection, block: &Block) -> Result<()> {
        tracing::trace!(
            columns = block.column_count(),
            rows = block.row_count(),
            "writing block"
        );

        if self.server_revision >= DBMS_MIN_REVISION_WITH_TEMPORARY_TABLES {
            conn.write_string("").await?;
        }

        let mut buffer = BytesMut::new();
        self.write_block_to_buffer(&mut buffer, block)?;

        if let Some(compression_method) = self.compression {
            let compressed = compress(compression_method, &buffer)?;
            conn.write_bytes(&compressed).await?;
        } else {
            conn.write_bytes(&buffer).await?;
        }

        conn.flush().await?;
        Ok(())
    }

    /// Write block to buffer
    fn write_block_to_buffer(&self, buffer: &mut BytesMut, block: &Block) -> Result<()> {
        if self.server_revision >= DBMS_MIN_REVISION_WITH_BLOCK_INFO {
            write_varint(buffer, 1);
            buffer.put_u8(block.info().is_overflows);
            write_varint(buffer, 2);
            buffer.put_i32_le(block.info().bucket_num);
            write_varint(buffer, 0);
        }

        write_varint(buffer, block.column_count() as u64);
        write_varint(buffer, block.row_count() as u64);

        for (name, type_, column) in block.iter() {
            write_string(buffer, name);
            write_string(buffer, &type_.name());

            if self.server_revision >= DBMS_MIN_REVISION_WITH_CUSTOM_SERIALIZATION {
                buffer.put_u8(0); // No custom serialization
            }

            if block.row_count() > 0 {
                column.save_prefix(buffer)?;
                column.save_to_buffer(buffer)?;
            }
        }

        Ok(())
    }
}

// Helper functions
fn read_varint(buffer: &mut &[u8]) -> Result<u64> {
    let mut result: u64 = 0;
    let mut shift = 0;

    loop {
        if buffer.is_empty() {
            return Err(Error::Protocol(
                "Unexpected end of buffer reading varint".to_string(),
            ));
        }

        let byte = buffer[0];
        buffer.advance(1);

        result |= ((byte & 0x7F) as u64) << shift;

        if byte & 0x80 == 0 {
            break;
        }

        shift += 7;
        if shift >= 64 {
            return Err(Error::Protocol("Varint overflow".to_string()));
        }
    }

    Ok(result)
}

fn write_varint(buffer: &mut BytesMut, mut value: u64) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;

        if value != 0 {
            byte |= 0x80;
        }

        buffer.put_u8(byte);

        if value == 0 {
            break;
        }
    }
}

fn read_string(buffer: &mut &[u8]) -> Result<String> {
    let len = read_varint(buffer)? as usize;

    if buffer.len() < len {
        return Err(Error::Protocol(format!(
            "Not enough data for string: need {}, have {}",
            len,
            buffer.len()
        )));
    }

    let string_data = &buffer[..len];
    let s = String::from_utf8(string_data.to_vec())
        .map_err(|e| Error::Protocol(format!("Invalid UTF-8 in string: {}", e)))?;

    buffer.advance(len);
    Ok(s)
}

fn write_string(buffer: &mut BytesMut, s: &str) {
    write_varint(buffer, s.len() as u64);
    buffer.put_slice(s.as_bytes());
}
