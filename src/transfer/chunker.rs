use bytes::Bytes;

use super::envelope::{MAX_CHUNK_SIZE, TransferEnvelope};
use super::errors::TransferError;
use super::source::FileSource;

/// Number of chunks needed for `size` bytes; zero for an empty file.
///
/// `None` when the count does not fit the 32-bit chunk index.
pub fn chunk_count(size: u64, chunk_size: usize) -> Option<u32> {
    let chunk_size = chunk_size.clamp(1, MAX_CHUNK_SIZE) as u64;
    u32::try_from(size.div_ceil(chunk_size)).ok()
}

/// The envelopes that carry one file: `Meta`, every `Chunk` in order, `Complete`.
///
/// Chunks are zero-copy slices of the source.
#[derive(Debug, Clone)]
pub struct ChunkPlan {
    file_name: String,
    data: Bytes,
    chunk_size: usize,
    total_chunks: u32,
    next: Step,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Meta,
    Chunk(u32),
    Complete,
    Done,
}

impl ChunkPlan {
    pub fn new(source: &FileSource, chunk_size: usize) -> Result<Self, TransferError> {
        let chunk_size = chunk_size.clamp(1, MAX_CHUNK_SIZE);
        let Some(total_chunks) = chunk_count(source.size(), chunk_size) else {
            return Err(TransferError::TooManyChunks {
                file_name: source.name().to_owned(),
                size: source.size(),
            });
        };
        Ok(Self {
            file_name: source.name().to_owned(),
            data: source.data().clone(),
            chunk_size,
            total_chunks,
            next: Step::Meta,
        })
    }

    pub fn total_chunks(&self) -> u32 {
        self.total_chunks
    }

    fn chunk(&self, index: u32) -> TransferEnvelope {
        let start = index as usize * self.chunk_size;
        let end = (start + self.chunk_size).min(self.data.len());
        TransferEnvelope::Chunk {
            file_name: self.file_name.clone(),
            index,
            total_chunks: self.total_chunks,
            data: self.data.slice(start..end),
        }
    }
}

impl Iterator for ChunkPlan {
    type Item = TransferEnvelope;

    fn next(&mut self) -> Option<Self::Item> {
        let (item, next) = match self.next {
            Step::Meta => (
                TransferEnvelope::Meta {
                    file_name: self.file_name.clone(),
                    size: self.data.len() as u64,
                },
                if self.total_chunks == 0 {
                    Step::Complete
                } else {
                    Step::Chunk(0)
                },
            ),
            Step::Chunk(i) => (
                self.chunk(i),
                if i + 1 < self.total_chunks {
                    Step::Chunk(i + 1)
                } else {
                    Step::Complete
                },
            ),
            Step::Complete => (
                TransferEnvelope::Complete {
                    file_name: self.file_name.clone(),
                },
                Step::Done,
            ),
            Step::Done => return None,
        };
        self.next = next;
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    fn chunk_lens(plan: ChunkPlan) -> Vec<usize> {
        plan.filter_map(|e| match e {
            TransferEnvelope::Chunk { data, .. } => Some(data.len()),
            _ => None,
        })
        .collect()
    }

    #[test]
    fn splits_150000_bytes_into_three_chunks() {
        let src = FileSource::from_bytes("a.bin", vec![7u8; 150_000]);
        let plan = ChunkPlan::new(&src, 65_536).unwrap();
        assert_eq!(plan.total_chunks(), 3);
        assert_eq!(chunk_lens(plan), vec![65_536, 65_536, 18_928]);
    }

    #[test]
    fn meta_first_complete_last() {
        let src = FileSource::from_bytes("a.bin", vec![1u8; 10]);
        let all: Vec<_> = ChunkPlan::new(&src, 4).unwrap().collect();
        assert_eq!(all.len(), 5);
        assert!(matches!(&all[0], TransferEnvelope::Meta { size: 10, .. }));
        assert!(matches!(&all[4], TransferEnvelope::Complete { .. }));
        match &all[3] {
            TransferEnvelope::Chunk {
                index,
                total_chunks,
                data,
                ..
            } => {
                assert_eq!((*index, *total_chunks, data.len()), (2, 3, 2));
            }
            other => panic!("expected last chunk, got {:?}", other),
        }
    }

    #[test]
    fn empty_file_has_zero_chunks() {
        let src = FileSource::from_bytes("empty", Vec::new());
        let plan = ChunkPlan::new(&src, 65_536).unwrap();
        assert_eq!(plan.total_chunks(), 0);
        let kinds: Vec<_> = plan.map(|e| e.kind_name()).collect();
        assert_eq!(kinds, vec!["meta", "complete"]);
    }

    #[test]
    fn chunk_size_is_capped() {
        assert_eq!(chunk_count(200_000, 1 << 20), Some(4));
        assert_eq!(chunk_count(0, 0), Some(0));
    }

    #[test]
    fn chunk_count_refuses_to_wrap_the_index() {
        let five_gib = 5 * 1024 * 1024 * 1024;
        assert_eq!(chunk_count(five_gib, 1), None);
        assert_eq!(chunk_count(u64::from(u32::MAX), 1), Some(u32::MAX));
        assert_eq!(chunk_count(u64::from(u32::MAX) + 1, 1), None);
        assert_eq!(chunk_count(five_gib, 65_536), Some(81_920));
    }
}
