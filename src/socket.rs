use crate::{errors::SlpProtocolError, varint::VarIntDecoder};
use async_trait::async_trait;
use std::io::{Error, ErrorKind};
use tokio::io::{AsyncRead, AsyncReadExt, Result};

/// Largest string a status response may carry, per wiki.vg (32767 chars of
/// up to 3 bytes each, plus slack for the length prefix).
const MAX_STRING_LEN: i32 = 32767 * 3 + 3;

/// Extension trait for reading Server List Ping data types from a stream.
///
/// The formats are specified [in this table in wiki.vg](https://wiki.vg/Protocol#Data_types).
#[async_trait]
pub(crate) trait ReadSlpTypes {
    /// Read a `VarInt` from the stream.
    async fn read_varint(&mut self) -> Result<i32>;

    /// Read a UTF-8 string prefixed with its size in bytes as a `VarInt`.
    async fn read_mc_string(&mut self) -> Result<String>;
}

#[async_trait]
impl<T> ReadSlpTypes for T
where
    T: AsyncRead + Unpin + Send,
{
    async fn read_varint(&mut self) -> Result<i32> {
        let mut decoder = VarIntDecoder::default();

        loop {
            let current = self.read_u8().await?;

            if let Some(value) = decoder.push(current).map_err(Error::from)? {
                return Ok(value);
            }
        }
    }

    async fn read_mc_string(&mut self) -> Result<String> {
        let len = self.read_varint().await?;

        if !(0..=MAX_STRING_LEN).contains(&len) {
            return Err(SlpProtocolError::InvalidLength(len).into());
        }

        let mut buffer = vec![0; len as usize];
        self.read_exact(&mut buffer).await?;

        String::from_utf8(buffer).map_err(|err| Error::new(ErrorKind::InvalidData, err))
    }
}
