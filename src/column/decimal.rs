use super::{
    Column,
    ColumnInt128,
    ColumnInt32,
    ColumnInt64,
    ColumnRef,
};
use crate::{
    types::Type,
    Error,
    Result,
};
use bytes::BytesMut;
use std::sync::Arc;

/// Column for Decimal types with precision and scale
/// Stores values as integers (scaled by 10^scale)
///
/// Uses efficient internal representation based on precision:
/// - precision <= 9: ColumnInt32 (4 bytes per value)
/// - precision <= 18: ColumnInt64 (8 bytes per value)
/// - precision > 18: ColumnInt128 (16 bytes per value)
pub struct ColumnDecimal {
    type_: Type,
    precision: usize,
    scale: usize,
    data: ColumnRef, // Internally delegates to ColumnInt32/Int64/Int128
}

impl ColumnDecimal {
    /// Create a new empty decimal column for the given `Decimal` type.
    ///
    /// # Panics
    ///
    /// Panics if `type_` is not a `Type::Decimal`.
    pub fn new(type_: Type) -> Self {
        let (precision, scale) = match &type_ {
            Type::Decimal { precision, scale } => (*precision, *scale),
            _ => panic!("ColumnDecimal requires Decimal type"),
        };

        // Choose appropriate storage type based on precision (like C++
        // implementation)
        let data: ColumnRef = if precision <= 9 {
            Arc::new(ColumnInt32::new(Type::int32()))
        } else if precision <= 18 {
            Arc::new(ColumnInt64::new(Type::int64()))
        } else {
            Arc::new(ColumnInt128::new(Type::int128()))
        };

        Self { type_, precision, scale, data }
    }

    /// Set the column data from a vector of raw scaled `i128` values.
    pub fn with_data(mut self, data: Vec<i128>) -> Self {
        // Convert Vec<i128> to the appropriate column type
        if self.precision <= 9 {
            let mut col = ColumnInt32::new(Type::int32());
            for value in data {
                col.append(value as i32);
            }
            self.data = Arc::new(col);
        } else if self.precision <= 18 {
            let mut col = ColumnInt64::new(Type::int64());
            for value in data {
                col.append(value as i64);
            }
            self.data = Arc::new(col);
        } else {
            let mut col = ColumnInt128::new(Type::int128());
            for value in data {
                col.append(value);
            }
            self.data = Arc::new(col);
        }
        self
    }

    /// Append a decimal value parsed from a string like `"123.45"`.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid decimal or the
    /// fractional part exceeds the column's scale.
    pub fn append_from_string(&mut self, s: &str) -> Result<()> {
        let value = parse_decimal(s, self.scale)?;
        self.append(value);
        Ok(())
    }

    /// Append decimal from i128 (raw scaled value)
    pub fn append(&mut self, value: i128) {
        // Delegate to the underlying column based on precision
        let data_mut =
            Arc::get_mut(&mut self.data).expect("Cannot modify shared column");

        if self.precision <= 9 {
            let col = data_mut
                .as_any_mut()
                .downcast_mut::<ColumnInt32>()
                .expect("Expected ColumnInt32");
            col.append(value as i32);
        } else if self.precision <= 18 {
            let col = data_mut
                .as_any_mut()
                .downcast_mut::<ColumnInt64>()
                .expect("Expected ColumnInt64");
            col.append(value as i64);
        } else {
            let col = data_mut
                .as_any_mut()
                .downcast_mut::<ColumnInt128>()
                .expect("Expected ColumnInt128");
            col.append(value);
        }
    }

    /// Get decimal at index as i128 (raw scaled value)
    pub fn at(&self, index: usize) -> i128 {
        if self.precision <= 9 {
            let col = self
                .data
                .as_any()
                .downcast_ref::<ColumnInt32>()
                .expect("Expected ColumnInt32");
            col.at(index) as i128
        } else if self.precision <= 18 {
            let col = self
                .data
                .as_any()
                .downcast_ref::<ColumnInt64>()
                .expect("Expected ColumnInt64");
            col.at(index) as i128
        } else {
            let col = self
                .data
                .as_any()
                .downcast_ref::<ColumnInt128>()
                .expect("Expected ColumnInt128");
            col.at(index)
        }
    }

    /// Format decimal at index as string
    pub fn as_string(&self, index: usize) -> String {
        format_decimal(self.at(index), self.scale)
    }

    /// Returns the precision (total number of digits) of this decimal column.
    pub fn precision(&self) -> usize {
        self.precision
    }

    /// Returns the scale (digits after the decimal point) of this decimal column.
    pub fn scale(&self) -> usize {
        self.scale
    }

    /// Returns the number of values in this column.
    pub fn len(&self) -> usize {
        self.data.size()
    }

    /// Returns `true` if the column contains no values.
    pub fn is_empty(&self) -> bool {
        self.data.size() == 0
    }
}

impl Column for ColumnDecimal {
    fn column_type(&self) -> &Type {
        &self.type_
    }

    fn size(&self) -> usize {
        self.data.size()
    }

    fn clear(&mut self) {
        let data_mut =
            Arc::get_mut(&mut self.data).expect("Cannot modify shared column");
        data_mut.clear();
    }

    fn reserve(&mut self, new_cap: usize) {
        let data_mut =
            Arc::get_mut(&mut self.data).expect("Cannot modify shared column");
        data_mut.reserve(new_cap);
    }

    fn append_column(&mut self, other: ColumnRef) -> Result<()> {
        let other = other
            .as_any()
            .downcast_ref::<ColumnDecimal>()
            .ok_or_else(|| Error::TypeMismatch {
                expected: self.type_.name(),
                actual: other.column_type().name(),
            })?;

        if self.precision != other.precision || self.scale != other.scale {
            return Err(Error::TypeMismatch {
                expected: format!(
                    "Decimal({}, {})",
                    self.precision, self.scale
                ),
                actual: format!(
                    "Decimal({}, {})",
                    other.precision, other.scale
                ),
            });
        }

        // Delegate to underlying column's append_column
        let data_mut =
            Arc::get_mut(&mut self.data).expect("Cannot modify shared column");
        data_mut.append_column(other.data.clone())?;
        Ok(())
    }

    fn load_from_buffer(
        &mut self,
        buffer: &mut &[u8],
        rows: usize,
    ) -> Result<()> {
        // Delegate to the underlying column - it knows how to load its data
        // efficiently
        let data_mut =
            Arc::get_mut(&mut self.data).expect("Cannot modify shared column");
        data_mut.load_from_buffer(buffer, rows)
    }

    fn save_to_buffer(&self, buffer: &mut BytesMut) -> Result<()> {
        // Delegate to the underlying column - it knows how to save its data
        // efficiently
        self.data.save_to_buffer(buffer)
    }

    fn clone_empty(&self) -> ColumnRef {
        Arc::new(ColumnDecimal::new(self.type_.clone()))
    }

    fn slice(&self, begin: usize, len: usize) -> Result<ColumnRef> {
        if begin + len > self.data.size() {
            return Err(Error::InvalidArgument(format!(
                "Slice out of bounds: begin={}, len={}, size={}",
                begin,
                len,
                self.data.size()
            )));
        }

        // Create a new ColumnDecimal with the sliced underlying data
        let sliced_data = self.data.slice(begin, len)?;
        let mut result = ColumnDecimal::new(self.type_.clone());
        result.data = sliced_data;
        Ok(Arc::new(result))
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

/// Parse decimal string to scaled integer
/// "123.45" with scale 2 -> 12345
fn parse_decimal(s: &str, scale: usize) -> Result<i128> {
    let s = s.trim();
    let (sign, s) = if let Some(stripped) = s.strip_prefix('-') {
        (-1, stripped)
    } else if let Some(stripped) = s.strip_prefix('+') {
        (1, stripped)
    } else {
        (1, s)
    };

    let parts: Vec<&str> = s.split('.').collect();
    if parts.len() > 2 {
        return Err(Error::Protocol(format!("Invalid decimal format: {}", s)));
    }

    let integer_part = parts[0].parse::<i128>().map_err(|e| {
        Error::Protocol(format!("Invalid decimal integer part: {}", e))
    })?;

    let fractional_part = if parts.len() == 2 {
        let frac_str = parts[1];
        if frac_str.len() > scale {
            return Err(Error::Protocol(format!(
                "Decimal fractional part exceeds scale: {} > {}",
                frac_str.len(),
                scale
            )));
        }

        // Pad with zeros to match scale
        let mut padded = frac_str.to_string();
        while padded.len() < scale {
            padded.push('0');
        }

        padded.parse::<i128>().map_err(|e| {
            Error::Protocol(format!("Invalid decimal fractional part: {}", e))
        })?
    } else {
        0
    };

    // Calculate scaled value: integer_part * 10^scale + fractional_part
    let scale_multiplier = 10_i128.pow(scale as u32);
    let scaled_value = integer_part * scale_multiplier + fractional_part;

    Ok(sign * scaled_value)
}

/// Format scaled integer to decimal string
/// 12345 with scale 2 -> "123.45"
fn format_decimal(value: i128, scale: usize) -> String {
    let (sign, abs_value) =
        if value < 0 { ("-", -value) } else { ("", value) };

    let scale_divisor = 10_i128.pow(scale as u32);
    let integer_part = abs_value / scale_divisor;
    let fractional_part = abs_value % scale_divisor;

    if scale > 0 {
        format!(
            "{}{}.{:0width$}",
            sign,
            integer_part,
            fractional_part,
            width = scale
        )
    } else {
        format!("{}{}", sign, integer_part)
    }
}
