//! Pixel storage backing a [`Surface`](crate::Surface).
//!
//! A surface either owns its pixel memory on the heap or borrows it from
//! an OS memory mapping of a display device. Release behavior follows the
//! variant: the owned buffer frees itself, the mapping unmaps on drop.

/// Storage variants for surface pixel memory.
#[derive(Debug)]
pub enum PixelStore {
    /// Heap-allocated buffer owned by the surface.
    Owned(Vec<u8>),
    /// Device memory owned by an OS mapping (see [`Screen`](crate::Screen)).
    #[cfg(target_os = "linux")]
    Mapped(crate::screen::Mapping),
}

impl PixelStore {
    /// The full backing buffer.
    pub fn bytes(&self) -> &[u8] {
        match self {
            PixelStore::Owned(buf) => buf,
            #[cfg(target_os = "linux")]
            PixelStore::Mapped(map) => map.as_slice(),
        }
    }

    /// The full backing buffer, mutably.
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        match self {
            PixelStore::Owned(buf) => buf,
            #[cfg(target_os = "linux")]
            PixelStore::Mapped(map) => map.as_mut_slice(),
        }
    }

    /// Buffer length in bytes.
    pub fn len(&self) -> usize {
        self.bytes().len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owned_store_exposes_buffer() {
        let mut store = PixelStore::Owned(vec![0u8; 8]);
        assert_eq!(store.len(), 8);
        store.bytes_mut()[3] = 0xaa;
        assert_eq!(store.bytes()[3], 0xaa);
    }
}
