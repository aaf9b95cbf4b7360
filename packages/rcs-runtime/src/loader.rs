//! Loads a resource blob from a reader into an owned buffer.

use std::io::{Read, Seek, SeekFrom};

use crate::error::{Result, RuntimeError};
use crate::view::{ResourceView, ViewAt};
use crate::wire::{Flat, SizeType, HEADER_WIDTH};

/// Owns the bytes of exactly one resource blob.
#[derive(Debug, Clone)]
pub struct ResourceLoader {
    data: Vec<u8>,
}

impl ResourceLoader {
    /// Reads one blob starting at the reader's current position.
    ///
    /// The length header is peeked first, then the reader is rewound and
    /// the whole blob, header included, is read in one go. The reader is
    /// left positioned right after the blob.
    pub fn load<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        let start = reader.stream_position()?;
        let mut header = [0u8; HEADER_WIDTH];
        reader.read_exact(&mut header)?;
        reader.seek(SeekFrom::Start(start))?;

        let payload = SizeType::read_from(&header) as usize;
        let total = payload
            .checked_add(HEADER_WIDTH)
            .ok_or(RuntimeError::CapacityOverflow {
                operation: "resource load",
            })?;

        let mut data = vec![0u8; total];
        reader.read_exact(&mut data)?;
        tracing::debug!(bytes = total, "Loaded resource");

        Ok(Self { data })
    }

    /// Takes ownership of a blob already in memory.
    ///
    /// # Errors
    /// Fails if the header claims more bytes than `data` holds.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        ResourceView::new(&data)?;
        Ok(Self { data })
    }

    /// The loaded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Views the loaded blob as the root resource.
    pub fn view(&self) -> Result<ResourceView<'_>> {
        ResourceView::new(&self.data)
    }

    /// The root resource. Construction already checked the header, so this
    /// cannot fail.
    pub fn resource(&self) -> ResourceView<'_> {
        let payload = SizeType::read_from(&self.data[..HEADER_WIDTH]) as usize;
        ResourceView::from_span(&self.data[..HEADER_WIDTH + payload])
    }

    /// Views the loaded blob as `V`, typically a generated view type.
    pub fn deserialize<'a, V: ViewAt<'a>>(&'a self) -> Result<V> {
        V::view_at(&self.data, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn load_reads_exactly_one_blob() {
        let mut bytes = vec![4, 0, 0, 0, 1, 2, 3, 4];
        bytes.extend_from_slice(&[0xaa; 3]);
        let mut cursor = Cursor::new(bytes);

        let loader = ResourceLoader::load(&mut cursor).unwrap();
        assert_eq!(loader.as_bytes(), &[4, 0, 0, 0, 1, 2, 3, 4]);
        assert_eq!(cursor.position(), 8);
        assert_eq!(loader.view().unwrap().read::<u32>(0), 0x0403_0201);
        assert_eq!(loader.resource().byte_size(), 4);
    }

    #[test]
    fn load_from_middle_of_stream() {
        let mut cursor = Cursor::new(vec![9, 9, 1, 0, 0, 0, 7]);
        cursor.set_position(2);
        let loader = ResourceLoader::load(&mut cursor).unwrap();
        assert_eq!(loader.view().unwrap().read::<u8>(0), 7);
    }

    #[test]
    fn truncated_blob_is_io_error() {
        let mut cursor = Cursor::new(vec![16, 0, 0, 0, 1, 2]);
        assert!(matches!(
            ResourceLoader::load(&mut cursor),
            Err(RuntimeError::Io(_))
        ));
    }

    #[test]
    fn from_bytes_checks_header() {
        assert!(ResourceLoader::from_bytes(vec![0, 0, 0, 0]).is_ok());
        // trailing bytes are kept but are not part of the resource
        let loader = ResourceLoader::from_bytes(vec![1, 0, 0, 0, 5, 6]).unwrap();
        assert_eq!(loader.resource().as_bytes(), &[1, 0, 0, 0, 5]);
        assert!(ResourceLoader::from_bytes(vec![8, 0, 0, 0]).is_err());
        assert!(ResourceLoader::from_bytes(vec![]).is_err());
    }
}
