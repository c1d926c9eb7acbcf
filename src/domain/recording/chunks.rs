//! Buffered media fragments

use thiserror::Error;

/// One encoded media fragment
pub type Fragment = Vec<u8>;

/// Error when appending to a frozen buffer
#[derive(Debug, Clone, Error)]
#[error("Chunk buffer is frozen; start a new recording first")]
pub struct BufferFrozen;

/// Append-only fragment buffer for the active recording.
///
/// Lifecycle per recording: `clear` on start, `append` while recording,
/// `freeze` on stop. A fresh buffer starts frozen so nothing can be appended
/// before the first recording.
#[derive(Debug)]
pub struct ChunkBuffer {
    fragments: Vec<Fragment>,
    frozen: bool,
}

impl ChunkBuffer {
    /// Create a frozen, empty buffer
    pub fn new() -> Self {
        Self {
            fragments: Vec::new(),
            frozen: true,
        }
    }

    /// Discard any content and open the buffer for appending
    pub fn clear(&mut self) {
        self.fragments = Vec::new();
        self.frozen = false;
    }

    /// Append a fragment in capture order
    pub fn append(&mut self, fragment: Fragment) -> Result<(), BufferFrozen> {
        if self.frozen {
            return Err(BufferFrozen);
        }
        self.fragments.push(fragment);
        Ok(())
    }

    /// Close the buffer and hand out its content
    pub fn freeze(&mut self) -> ChunkSequence {
        self.frozen = true;
        ChunkSequence {
            fragments: std::mem::take(&mut self.fragments),
        }
    }

    /// Number of buffered fragments
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// Check if no fragment is buffered
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Check if appends are currently rejected
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }
}

impl Default for ChunkBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Frozen, read-only fragments of one finished recording
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkSequence {
    fragments: Vec<Fragment>,
}

impl ChunkSequence {
    /// Fragments in capture order
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// Number of fragments
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// Check if the recording produced no data at all
    pub fn is_empty(&self) -> bool {
        self.total_bytes() == 0
    }

    /// Total payload size in bytes
    pub fn total_bytes(&self) -> usize {
        self.fragments.iter().map(Vec::len).sum()
    }

    /// Concatenate all fragments into one blob
    pub fn concat(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.total_bytes());
        for fragment in &self.fragments {
            out.extend_from_slice(fragment);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_rejects_appends() {
        let mut buffer = ChunkBuffer::new();
        assert!(buffer.is_frozen());
        assert!(buffer.append(vec![1]).is_err());
        assert!(buffer.is_empty());
    }

    #[test]
    fn clear_opens_buffer() {
        let mut buffer = ChunkBuffer::new();
        buffer.clear();
        buffer.append(vec![1, 2]).unwrap();
        buffer.append(vec![3]).unwrap();
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn freeze_keeps_order_and_closes() {
        let mut buffer = ChunkBuffer::new();
        buffer.clear();
        buffer.append(vec![1, 2]).unwrap();
        buffer.append(vec![3]).unwrap();
        buffer.append(vec![4, 5, 6]).unwrap();

        let sequence = buffer.freeze();
        assert_eq!(sequence.fragments(), &[vec![1, 2], vec![3], vec![4, 5, 6]]);
        assert_eq!(sequence.concat(), vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(sequence.total_bytes(), 6);

        assert!(buffer.append(vec![7]).is_err());
        assert!(buffer.is_empty());
    }

    #[test]
    fn clear_discards_previous_content() {
        let mut buffer = ChunkBuffer::new();
        buffer.clear();
        buffer.append(vec![9]).unwrap();
        buffer.clear();
        assert!(buffer.is_empty());
        assert!(buffer.freeze().is_empty());
    }

    #[test]
    fn sequence_of_empty_fragments_is_empty() {
        let mut buffer = ChunkBuffer::new();
        buffer.clear();
        buffer.append(Vec::new()).unwrap();
        let sequence = buffer.freeze();
        assert_eq!(sequence.len(), 1);
        assert!(sequence.is_empty());
    }
}
