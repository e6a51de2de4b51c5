//! Per-pack block index for blockpack.
//!
//! Records, for one physical pack, where each content block lives: inline in
//! the index, at an offset/size in the pack body, or nowhere (a tombstone).
//!
//! # Architecture
//!
//! - **Codec**: offset and size packed into one `u64` (4 GiB ceiling each)
//! - **BlockInfo**: per-block record; exactly one storage mode unless deleted
//! - **PackIndexBuilder**: single-owner accumulator, sealed once by `finish_pack`
//! - **SealedPackIndex**: immutable snapshot, shared via `Arc` for concurrent reads
//! - **PackIndexRecord**: what a sealed pack hands to the aggregate collection
//!
//! Tombstones stay visible: `get_block` and `iterate` report them with
//! `is_deleted() == true` so compaction can tell "never stored here" apart
//! from "stored, then removed".

pub mod builder;
pub mod codec;
pub mod config;
pub mod error;
pub mod index;
pub mod info;
pub mod record;
pub mod sealed;

pub use builder::PackIndexBuilder;
pub use codec::{
    checked_pack_offset_and_size, pack_offset_and_size, unpack_offset_and_size, PackedLocation,
};
pub use config::PackIndexConfig;
pub use error::{IndexError, IndexResult};
pub use index::{is_index_empty, Iteration, PackIndex, Visit};
pub use info::{BlockInfo, BlockStorage};
pub use record::{IndexSink, PackIndexRecord, RecordEntry};
pub use sealed::SealedPackIndex;

#[cfg(test)]
mod tests {
    use super::*;
    use blockpack_types::{ContentId, PhysicalBlockId};
    use proptest::prelude::*;
    use std::collections::{BTreeMap, HashSet};
    use std::convert::Infallible;
    use std::sync::Arc;

    const FORMAT_V1: i32 = 1;

    fn collect_ids<I: PackIndex>(index: &I) -> Vec<ContentId> {
        let mut ids = Vec::new();
        index
            .iterate(|info| {
                ids.push(*info.content_id());
                Ok::<_, Infallible>(Visit::Continue)
            })
            .unwrap();
        ids
    }

    #[test]
    fn assemble_pack_graduating_inline_blocks() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let blocks: Vec<Vec<u8>> = (0..5).map(|i| format!("block-{i}").into_bytes()).collect();
        let mut builder = PackIndexBuilder::new();
        for data in &blocks {
            builder
                .add_inline_block(ContentId::from_bytes(data), data.clone())
                .unwrap();
        }

        // Lay the inline payloads out in the pack body and re-add them as packed.
        let mut body = Vec::new();
        for (id, payload) in builder.clear_inline_blocks().unwrap() {
            let offset = body.len() as u64;
            body.extend_from_slice(&payload);
            builder
                .add_packed_block(id, offset, payload.len() as u64)
                .unwrap();
        }
        assert_eq!(builder.inline_bytes(), 0);

        let sealed = builder
            .finish_pack(PhysicalBlockId::random(), body.len() as u64, FORMAT_V1)
            .unwrap();

        for data in &blocks {
            let info = sealed.get_block(&ContentId::from_bytes(data)).unwrap();
            let loc = info.location().unwrap();
            let bytes = &body[loc.offset() as usize..loc.end() as usize];
            assert_eq!(bytes, data.as_slice());
        }
    }

    #[test]
    fn empty_index_reports_not_found() {
        let sealed = PackIndexBuilder::new()
            .finish_pack(PhysicalBlockId::random(), 0, FORMAT_V1)
            .unwrap();
        assert!(is_index_empty(&*sealed));
        let id = ContentId::from_bytes(b"anything");
        assert_eq!(sealed.get_block(&id), Err(IndexError::NotFound(id)));
    }

    #[test]
    fn sealed_tombstones_survive_the_aggregate() {
        let mut builder = PackIndexBuilder::new();
        let kept = ContentId::from_bytes(b"kept");
        let dropped = ContentId::from_bytes(b"dropped");
        builder.add_packed_block(kept, 0, 4).unwrap();
        builder.add_packed_block(dropped, 4, 4).unwrap();
        builder.delete_block(dropped).unwrap();
        builder
            .finish_pack(PhysicalBlockId::new("pagg").unwrap(), 8, FORMAT_V1)
            .unwrap();

        let mut collection: Vec<PackIndexRecord> = Vec::new();
        builder.add_to_indexes(&mut collection).unwrap();
        assert_eq!(collection.len(), 1);

        let record = &collection[0];
        assert_eq!(record.pack_block_id.as_str(), "pagg");
        assert_eq!(record.pack_length, 8);
        assert_eq!(record.format_version, FORMAT_V1);
        assert_eq!(record.entries.len(), 2);

        let json = serde_json::to_string(record).unwrap();
        let parsed: PackIndexRecord = serde_json::from_str(&json).unwrap();
        let restored = SealedPackIndex::from_record(parsed).unwrap();
        assert!(restored.get_block(&dropped).unwrap().is_deleted());
        assert_eq!(restored.get_block(&kept).unwrap().offset(), Some(0));
        assert_eq!(restored.create_time_nanos(), builder.create_time_nanos());
    }

    #[test]
    fn emptiness_probe_sees_tombstones() {
        let mut builder = PackIndexBuilder::new();
        builder.delete_block(ContentId::from_bytes(b"x")).unwrap();
        assert!(!is_index_empty(&builder));
    }

    #[test]
    fn sealed_index_is_shared_across_threads() {
        let mut builder = PackIndexBuilder::new();
        for i in 0..64u32 {
            builder
                .add_packed_block(ContentId::from_bytes(&i.to_be_bytes()), i as u64 * 16, 16)
                .unwrap();
        }
        let sealed = builder
            .finish_pack(PhysicalBlockId::random(), 64 * 16, FORMAT_V1)
            .unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let index = Arc::clone(&sealed);
                std::thread::spawn(move || {
                    (0..64u32)
                        .filter(|i| index.contains(&ContentId::from_bytes(&i.to_be_bytes())))
                        .count()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 64);
        }
    }

    #[test]
    fn visitor_fault_is_not_a_stop() {
        let mut builder = PackIndexBuilder::new();
        builder
            .add_packed_block(ContentId::from_bytes(b"a"), 0, 1)
            .unwrap();
        let outcome = builder.iterate(|info| {
            Err::<Visit, _>(IndexError::NotFound(*info.content_id()))
        });
        assert!(matches!(outcome, Err(IndexError::NotFound(_))));
    }

    proptest! {
        #[test]
        fn iterate_visits_each_entry_once(
            seeds in prop::collection::hash_set(any::<[u8; 32]>(), 0..64),
            sizes in prop::collection::vec(1u32..4096, 64),
        ) {
            let mut builder = PackIndexBuilder::new();
            let mut expected = BTreeMap::new();
            let mut offset = 0u64;
            for (seed, size) in seeds.iter().zip(&sizes) {
                let id = ContentId::from_hash(*seed);
                builder.add_packed_block(id, offset, *size as u64).unwrap();
                expected.insert(id, (offset as u32, *size));
                offset += *size as u64;
            }

            let mut seen = HashSet::new();
            builder.iterate(|info| {
                prop_assert!(seen.insert(*info.content_id()), "duplicate visit");
                let want = expected.get(info.content_id()).copied();
                prop_assert_eq!(want, Some((info.offset().unwrap(), info.size().unwrap())));
                Ok(Visit::Continue)
            })?;
            prop_assert_eq!(seen.len(), seeds.len());

            let sealed = builder.finish_pack(PhysicalBlockId::random(), offset, FORMAT_V1).unwrap();
            prop_assert_eq!(collect_ids(&*sealed), expected.keys().copied().collect::<Vec<_>>());
            prop_assert_eq!(is_index_empty(&*sealed), seeds.is_empty());
        }
    }
}
