use thiserror::Error;

/// Errors that can occur during arena sub-allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AllocError {
    /// No placement fits the request, even after coalescing free space
    #[error("arena cannot place {requested} bytes ({live} bytes live of {capacity})")]
    ArenaFull {
        requested: u16,
        live: u16,
        capacity: u16,
    },

    /// The slot handle is outside the allocator's handle space
    #[error("slot {slot} is out of range (allocator has {slots} slots)")]
    SlotOutOfRange { slot: usize, slots: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Region {
    offset: u16,
    length: u16,
}

impl Region {
    fn end(&self) -> u16 {
        self.offset + self.length
    }
}

/// Sub-allocates disjoint byte regions of a fixed arena, addressed by
/// caller-supplied slot handles.
///
/// Placement is first-fit over a free list with a bump tail. When nothing
/// fits, adjacent free regions are coalesced (a gap touching the bump head
/// pulls the head back) and placement is retried once before the arena-full
/// condition surfaces. Live regions are never moved: callers hold offsets
/// into the arena.
pub struct IndexAllocator {
    capacity: u16,
    regions: Vec<Option<Region>>,
    free: Vec<Region>,
    head: u16,
}

impl IndexAllocator {
    pub fn new(capacity: u16, slots: usize) -> Self {
        Self {
            capacity,
            regions: vec![None; slots],
            free: Vec::new(),
            head: 0,
        }
    }

    /// Place `length` bytes for `slot` and return the region's offset.
    ///
    /// The slot must not currently hold a region; release it with
    /// [`Self::deallocate`] first when reallocating.
    pub fn allocate(&mut self, slot: usize, length: u16) -> Result<u16, AllocError> {
        if slot >= self.regions.len() {
            return Err(AllocError::SlotOutOfRange {
                slot,
                slots: self.regions.len(),
            });
        }
        debug_assert!(
            self.regions[slot].is_none(),
            "slot must be released before reallocation"
        );
        debug_assert!(length > 0, "zero-length regions are never allocated");

        let offset = match self.place(length) {
            Some(offset) => offset,
            None => {
                self.coalesce();
                self.place(length).ok_or(AllocError::ArenaFull {
                    requested: length,
                    live: self.live_bytes(),
                    capacity: self.capacity,
                })?
            }
        };
        self.regions[slot] = Some(Region { offset, length });
        Ok(offset)
    }

    fn place(&mut self, length: u16) -> Option<u16> {
        // first fit over the free list
        for index in 0..self.free.len() {
            let gap = self.free[index];
            if gap.length < length {
                continue;
            }
            if gap.length == length {
                self.free.swap_remove(index);
            } else {
                self.free[index] = Region {
                    offset: gap.offset + length,
                    length: gap.length - length,
                };
            }
            return Some(gap.offset);
        }

        // bump tail
        if self.capacity - self.head >= length {
            let offset = self.head;
            self.head += length;
            return Some(offset);
        }

        None
    }

    /// Release the region held by `slot`. A slot without a region is a
    /// no-op.
    pub fn deallocate(&mut self, slot: usize) {
        let Some(Some(region)) = self.regions.get(slot).copied() else {
            return;
        };
        self.regions[slot] = None;

        if region.end() == self.head {
            self.head = region.offset;
        } else {
            self.free.push(region);
        }
    }

    fn coalesce(&mut self) {
        self.free.sort_unstable_by_key(|gap| gap.offset);

        let mut merged: Vec<Region> = Vec::with_capacity(self.free.len());
        for gap in self.free.drain(..) {
            match merged.last_mut() {
                Some(last) if last.end() == gap.offset => last.length += gap.length,
                _ => merged.push(gap),
            }
        }

        if let Some(last) = merged.last() {
            if last.end() == self.head {
                self.head = last.offset;
                merged.pop();
            }
        }

        self.free = merged;
    }

    /// Return to the empty state; every handle becomes invalid.
    pub fn reset(&mut self) {
        self.regions.iter_mut().for_each(|region| *region = None);
        self.free.clear();
        self.head = 0;
    }

    /// The smallest offset `R` such that every live region lies in `[0, R)`.
    pub fn range(&self) -> u16 {
        self.regions
            .iter()
            .flatten()
            .map(Region::end)
            .max()
            .unwrap_or(0)
    }

    /// The region held by `slot`, as `(offset, length)`.
    pub fn region(&self, slot: usize) -> Option<(u16, u16)> {
        let region = self.regions.get(slot).copied().flatten()?;
        Some((region.offset, region.length))
    }

    fn live_bytes(&self) -> u16 {
        self.regions.iter().flatten().map(|region| region.length).sum()
    }
}
