use tracing::trace;

use super::layout::{POINTER_SIZE, array, string};
use super::value::{ArrayValue, Scalar, ScalarType, ScalarValue, Shape, Value};
use super::{Process, read_full_at};
use crate::error::{Error, LengthKind, Result};
use crate::expr::{AddressExpr, VariableResolver};

/// Typed reads from a process
///
/// All multi-byte values are little-endian. Length-prefixed collections are
/// bounds-checked before anything is allocated, so a stale pointer chain
/// cannot turn into a multi-gigabyte allocation.
pub struct MemoryReader<'a, P: Process + ?Sized> {
    process: &'a P,
}

impl<'a, P: Process + ?Sized> MemoryReader<'a, P> {
    pub fn new(process: &'a P) -> Self {
        Self { process }
    }

    pub fn process(&self) -> &'a P {
        self.process
    }

    /// Fill `buf` from `address` or fail
    pub fn read_exact(&self, address: u64, buf: &mut [u8]) -> Result<()> {
        let n = read_full_at(self.process, buf, address)
            .map_err(|e| Error::read_failed(address, e.to_string()))?;
        if n < buf.len() {
            return Err(Error::read_failed(
                address,
                format!("short read ({} of {} bytes)", n, buf.len()),
            ));
        }
        Ok(())
    }

    pub fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; size];
        self.read_exact(address, &mut buf)?;
        Ok(buf)
    }

    pub fn read<T: Scalar>(&self, address: u64) -> Result<T> {
        let mut buf = [0u8; 8];
        let width = T::TYPE.width();
        self.read_exact(address, &mut buf[..width])?;
        Ok(T::from_le_slice(&buf[..width]))
    }

    /// Read a 4-byte pointer
    pub fn read_ptr(&self, address: u64) -> Result<u64> {
        let mut buf = [0u8; POINTER_SIZE];
        self.read_exact(address, &mut buf)?;
        Ok(u32::from_le_bytes(buf) as u64)
    }

    /// Read a `List<T>` whose object starts at `address`
    pub fn read_array<T: Scalar>(&self, address: u64) -> Result<Vec<T>> {
        let length = self.read::<i32>(address + array::LENGTH)?;
        let count = check_length(LengthKind::Array, length, array::MAX_LENGTH)?;
        if count == 0 {
            return Ok(Vec::new());
        }

        let items = self.read_ptr(address + array::ITEMS)?;
        let width = T::TYPE.width();
        let bytes = self.read_bytes(items + array::DATA, count * width)?;

        Ok(bytes.chunks_exact(width).map(T::from_le_slice).collect())
    }

    /// Read a `System.String` whose object starts at `address`
    pub fn read_string(&self, address: u64) -> Result<String> {
        let length = self.read::<i32>(address + string::LENGTH)?;
        let count = check_length(LengthKind::String, length, string::MAX_LENGTH)?;
        if count == 0 {
            return Ok(String::new());
        }

        let bytes = self.read_bytes(address + string::DATA, count * 2)?;
        let (decoded, _) = encoding_rs::UTF_16LE.decode_without_bom_handling(&bytes);
        Ok(decoded.into_owned())
    }

    pub fn read_scalar(&self, address: u64, ty: ScalarType) -> Result<ScalarValue> {
        Ok(match ty {
            ScalarType::I8 => ScalarValue::I8(self.read(address)?),
            ScalarType::I16 => ScalarValue::I16(self.read(address)?),
            ScalarType::I32 => ScalarValue::I32(self.read(address)?),
            ScalarType::I64 => ScalarValue::I64(self.read(address)?),
            ScalarType::U8 => ScalarValue::U8(self.read(address)?),
            ScalarType::U16 => ScalarValue::U16(self.read(address)?),
            ScalarType::U32 => ScalarValue::U32(self.read(address)?),
            ScalarType::U64 => ScalarValue::U64(self.read(address)?),
            ScalarType::F32 => ScalarValue::F32(self.read(address)?),
            ScalarType::F64 => ScalarValue::F64(self.read(address)?),
        })
    }

    pub fn read_array_value(&self, address: u64, ty: ScalarType) -> Result<ArrayValue> {
        Ok(match ty {
            ScalarType::I8 => ArrayValue::I8(self.read_array(address)?),
            ScalarType::I16 => ArrayValue::I16(self.read_array(address)?),
            ScalarType::I32 => ArrayValue::I32(self.read_array(address)?),
            ScalarType::I64 => ArrayValue::I64(self.read_array(address)?),
            ScalarType::U8 => ArrayValue::U8(self.read_array(address)?),
            ScalarType::U16 => ArrayValue::U16(self.read_array(address)?),
            ScalarType::U32 => ArrayValue::U32(self.read_array(address)?),
            ScalarType::U64 => ArrayValue::U64(self.read_array(address)?),
            ScalarType::F32 => ArrayValue::F32(self.read_array(address)?),
            ScalarType::F64 => ArrayValue::F64(self.read_array(address)?),
        })
    }

    /// Decode whatever `shape` describes at `address`
    pub fn read_value(&self, address: u64, shape: Shape) -> Result<Value> {
        match shape {
            Shape::Scalar(ty) => self.read_scalar(address, ty).map(Value::Scalar),
            Shape::Array(ty) => self.read_array_value(address, ty).map(Value::Array),
            Shape::String => self.read_string(address).map(Value::String),
        }
    }

    /// Evaluate an address expression against this process
    ///
    /// Brackets dereference 4-byte pointers. The result must be a
    /// non-negative address.
    pub fn evaluate<R>(&self, expr: &AddressExpr, resolver: &R) -> Result<u64>
    where
        R: VariableResolver + ?Sized,
    {
        let value = expr.evaluate(resolver, |address: i64| {
            let address = to_address(address)?;
            let pointer = self.read_ptr(address)?;
            trace!("read pointer [{:#x}] = {:#x}", address, pointer);
            Ok(pointer as i64)
        })?;
        to_address(value)
    }
}

/// Validate a length prefix against its cap
fn check_length(kind: LengthKind, length: i32, max: i32) -> Result<usize> {
    if length < 0 {
        return Err(Error::InvalidLength { kind, length });
    }
    if length > max {
        return Err(Error::TooLong { kind, length, max });
    }
    Ok(length as usize)
}

fn to_address(value: i64) -> Result<u64> {
    u64::try_from(value).map_err(|_| Error::read_failed(value as u64, "negative address"))
}
