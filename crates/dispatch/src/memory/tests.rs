#[cfg(test)]
mod tests {
    use crate::error::MemoryError;
    use crate::memory::{BlockInfo, MemoryAllocator};

    fn layout(alloc: &MemoryAllocator) -> Vec<(usize, usize, bool)> {
        alloc
            .blocks()
            .into_iter()
            .map(|BlockInfo { offset, size, allocated }| (offset, size, allocated))
            .collect()
    }

    #[test]
    fn new_allocator_is_one_free_block() {
        let alloc = MemoryAllocator::new(1024).unwrap();
        assert_eq!(layout(&alloc), vec![(0, 1024, false)]);
        assert_eq!(alloc.free_memory(), 1024);
        alloc.validate().unwrap();
    }

    #[test]
    fn zero_capacity_rejected() {
        assert_eq!(MemoryAllocator::new(0).unwrap_err(), MemoryError::ZeroCapacity);
    }

    #[test]
    fn reserve_then_allocate_lands_after_reservation() {
        let mut alloc = MemoryAllocator::new(1024).unwrap();
        let rt = alloc.reserve(64).unwrap();
        let user = alloc.allocate(200).unwrap();

        assert_eq!(alloc.block(rt).unwrap().offset, 0);
        assert_eq!(alloc.block(user).unwrap().offset, 64);
        assert_eq!(alloc.block(user).unwrap().size, 200);
        assert_eq!(alloc.free_memory(), 760);
        assert_eq!(
            layout(&alloc),
            vec![(0, 64, true), (64, 200, true), (264, 760, false)]
        );
        alloc.validate().unwrap();
    }

    #[test]
    fn exact_fit_leaves_no_empty_remainder() {
        let mut alloc = MemoryAllocator::new(100).unwrap();
        alloc.allocate(100).unwrap();
        assert_eq!(layout(&alloc), vec![(0, 100, true)]);
        assert!(!alloc.check(1).unwrap());
        alloc.validate().unwrap();
    }

    #[test]
    fn first_fit_picks_lowest_address() {
        let mut alloc = MemoryAllocator::new(1000).unwrap();
        let a = alloc.allocate(100).unwrap();
        let _b = alloc.allocate(100).unwrap();
        let c = alloc.allocate(300).unwrap();
        let _d = alloc.allocate(100).unwrap();
        alloc.free(a).unwrap();
        alloc.free(c).unwrap();

        // Holes at [0,100) and [200,500); a 150 request skips the first.
        let e = alloc.allocate(150).unwrap();
        assert_eq!(alloc.block(e).unwrap().offset, 200);

        // An 80 request takes the first hole.
        let f = alloc.allocate(80).unwrap();
        assert_eq!(alloc.block(f).unwrap().offset, 0);
        alloc.validate().unwrap();
    }

    #[test]
    fn free_merges_both_neighbours() {
        let mut alloc = MemoryAllocator::new(300).unwrap();
        let a = alloc.allocate(100).unwrap();
        let b = alloc.allocate(100).unwrap();
        let c = alloc.allocate(100).unwrap();

        alloc.free(a).unwrap();
        alloc.free(c).unwrap();
        assert_eq!(
            layout(&alloc),
            vec![(0, 100, false), (100, 100, true), (200, 100, false)]
        );

        alloc.free(b).unwrap();
        assert_eq!(layout(&alloc), vec![(0, 300, false)]);
        assert_eq!(alloc.free_memory(), 300);
        alloc.validate().unwrap();
    }

    #[test]
    fn split_then_free_restores_layout() {
        let mut alloc = MemoryAllocator::new(1024).unwrap();
        alloc.reserve(64).unwrap();
        let before = layout(&alloc);

        let id = alloc.allocate(333).unwrap();
        alloc.free(id).unwrap();

        assert_eq!(layout(&alloc), before);
        alloc.validate().unwrap();
    }

    #[test]
    fn double_free_is_error() {
        let mut alloc = MemoryAllocator::new(300).unwrap();
        let _a = alloc.allocate(100).unwrap();
        let b = alloc.allocate(100).unwrap();
        let _c = alloc.allocate(100).unwrap();

        // b has no free neighbours, so its handle survives the free.
        alloc.free(b).unwrap();
        assert_eq!(
            alloc.free(b).unwrap_err(),
            MemoryError::DoubleFree { offset: 100 }
        );
        alloc.validate().unwrap();
    }

    #[test]
    fn stale_handle_after_merge_is_unknown() {
        let mut alloc = MemoryAllocator::new(300).unwrap();
        let a = alloc.allocate(100).unwrap();
        let b = alloc.allocate(100).unwrap();
        alloc.free(a).unwrap();
        // b merges into a's free block, so b's handle dies.
        alloc.free(b).unwrap();
        assert_eq!(alloc.free(b).unwrap_err(), MemoryError::UnknownBlock);
        assert!(alloc.block(b).is_none());
    }

    #[test]
    fn pinned_block_cannot_be_freed() {
        let mut alloc = MemoryAllocator::new(1024).unwrap();
        let rt = alloc.reserve(64).unwrap();
        assert_eq!(alloc.free(rt).unwrap_err(), MemoryError::Pinned { offset: 0 });
        assert_eq!(alloc.free_memory(), 960);
    }

    #[test]
    fn zero_and_oversized_requests() {
        let mut alloc = MemoryAllocator::new(100).unwrap();
        assert_eq!(alloc.allocate(0).unwrap_err(), MemoryError::InvalidSize);
        assert!(!alloc.check(0).unwrap());
        assert_eq!(
            alloc.allocate(101).unwrap_err(),
            MemoryError::OutOfMemory { requested: 101, free: 100 }
        );
    }

    #[test]
    fn fragmentation_blocks_large_request() {
        let mut alloc = MemoryAllocator::new(300).unwrap();
        let a = alloc.allocate(100).unwrap();
        let _b = alloc.allocate(100).unwrap();
        alloc.free(a).unwrap();

        // 200 free in total, but split into two 100 holes.
        assert_eq!(alloc.free_memory(), 200);
        assert!(!alloc.check(150).unwrap());
        assert!(matches!(
            alloc.allocate(150),
            Err(MemoryError::OutOfMemory { requested: 150, free: 200 })
        ));
        assert!(alloc.check(100).unwrap());
    }

    #[test]
    fn corruption_is_detected() {
        let mut alloc = MemoryAllocator::new(300).unwrap();
        let _a = alloc.allocate(100).unwrap();
        let b = alloc.allocate(100).unwrap();
        alloc.corrupt_offset(b, 150);

        assert!(matches!(
            alloc.validate(),
            Err(MemoryError::CorruptedPartition { offset: 150, .. })
        ));
        assert!(matches!(
            alloc.allocate(50),
            Err(MemoryError::CorruptedPartition { .. })
        ));
        assert!(matches!(
            alloc.check(50),
            Err(MemoryError::CorruptedPartition { .. })
        ));
    }

    #[test]
    fn conservation_over_mixed_workload() {
        let mut alloc = MemoryAllocator::new(1024).unwrap();
        alloc.reserve(64).unwrap();
        let mut live = Vec::new();

        for (i, size) in [10, 200, 33, 64, 128, 5, 300, 17].into_iter().enumerate() {
            live.push((alloc.allocate(size).unwrap(), size));
            if i % 3 == 2 {
                let (id, _) = live.remove(0);
                alloc.free(id).unwrap();
            }
            let held: usize = live.iter().map(|(_, s)| s).sum();
            assert_eq!(alloc.free_memory() + held + 64, 1024);
            alloc.validate().unwrap();
        }

        for (id, _) in live.drain(..) {
            alloc.free(id).unwrap();
        }
        assert_eq!(layout(&alloc), vec![(0, 64, true), (64, 960, false)]);
    }
}
