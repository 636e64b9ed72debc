//! Typed hit records and the fixed-capacity hit buffer.
//!
//! Sessions write hits into a caller-owned [`HitBuffer`]. The buffer never
//! grows past the capacity it was created with; a session that finds more
//! visible candidates than fit reports an overflow instead.
//!
//! Callers that still speak the flat `[hit, near, far, id]` layout can go
//! through [`HitBuffer::to_legacy`] / [`HitBuffer::from_legacy`].

use std::fmt;

/// Depth placeholder meaning "not computed in this pass".
pub const DEPTH_UNKNOWN: u32 = 0xFFFF;

/// One picked candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HitRecord {
    /// Object id handed to `load_id` when the candidate was drawn.
    pub id: u32,
    /// Hit indicator (`1` for every record a pass produces).
    pub hit: u32,
    /// Near depth, or [`DEPTH_UNKNOWN`].
    pub near: u32,
    /// Far depth, or [`DEPTH_UNKNOWN`].
    pub far: u32,
}

impl HitRecord {
    /// A visible candidate whose depth range is unknown.
    #[must_use]
    pub fn visible(id: u32) -> Self {
        Self {
            id,
            hit: 1,
            near: DEPTH_UNKNOWN,
            far: DEPTH_UNKNOWN,
        }
    }

    /// Whether a nearest second pass resolved this record as the closest.
    #[must_use]
    pub fn is_nearest(&self) -> bool {
        self.near == 0 && self.far == 0
    }

    /// Flat `[hit, near, far, id]` form.
    #[must_use]
    pub fn to_legacy(self) -> [u32; 4] {
        [self.hit, self.near, self.far, self.id]
    }

    /// Inverse of [`HitRecord::to_legacy`].
    #[must_use]
    pub fn from_legacy([hit, near, far, id]: [u32; 4]) -> Self {
        Self { id, hit, near, far }
    }
}

/// Returned when a hit does not fit in the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityExceeded {
    /// Capacity of the buffer that rejected the record.
    pub capacity: usize,
}

impl fmt::Display for CapacityExceeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hit buffer full ({} records)", self.capacity)
    }
}

impl std::error::Error for CapacityExceeded {}

/// Fixed-capacity, ordered list of hits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HitBuffer {
    records: Vec<HitRecord>,
    capacity: usize,
}

impl HitBuffer {
    /// Create an empty buffer holding at most `capacity` records.
    ///
    /// Storage grows with the records actually pushed, so a large limit
    /// costs nothing up front.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::new(),
            capacity,
        }
    }

    /// Maximum number of records.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of records currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` when no records are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns `true` when another record would be rejected.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.records.len() >= self.capacity
    }

    /// Append a record.
    ///
    /// # Errors
    ///
    /// Returns [`CapacityExceeded`] if the buffer is already full.
    pub fn try_push(
        &mut self,
        record: HitRecord,
    ) -> Result<(), CapacityExceeded> {
        if self.is_full() {
            return Err(CapacityExceeded {
                capacity: self.capacity,
            });
        }
        self.records.push(record);
        Ok(())
    }

    /// Drop every record, keeping the capacity.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Iterate over records in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, HitRecord> {
        self.records.iter()
    }

    /// Record at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&HitRecord> {
        self.records.get(index)
    }

    /// Ids of all records, in order.
    #[must_use]
    pub fn ids(&self) -> Vec<u32> {
        self.records.iter().map(|r| r.id).collect()
    }

    /// Zero the depth placeholders of every record with `id` among the
    /// first `limit` records. Returns how many records were marked.
    pub fn mark_nearest(&mut self, id: u32, limit: usize) -> usize {
        let limit = limit.min(self.records.len());
        let mut marked = 0;
        for record in self.records[..limit].iter_mut().filter(|r| r.id == id)
        {
            record.near = 0;
            record.far = 0;
            marked += 1;
        }
        marked
    }

    /// Record with the smallest near depth; the earliest wins ties.
    #[must_use]
    pub fn nearest(&self) -> Option<&HitRecord> {
        self.records
            .iter()
            .enumerate()
            .min_by_key(|(i, r)| (r.near, *i))
            .map(|(_, r)| r)
    }

    /// Flat `[hit, near, far, id]` records.
    #[must_use]
    pub fn to_legacy(&self) -> Vec<[u32; 4]> {
        self.records.iter().map(|r| r.to_legacy()).collect()
    }

    /// Flat records as native-endian bytes, four `u32` per record.
    #[must_use]
    pub fn to_legacy_bytes(&self) -> Vec<u8> {
        bytemuck::cast_slice(&self.to_legacy()).to_vec()
    }

    /// Build a buffer from flat records.
    ///
    /// # Errors
    ///
    /// Returns [`CapacityExceeded`] if `legacy` holds more than `capacity`
    /// records.
    pub fn from_legacy(
        legacy: &[[u32; 4]],
        capacity: usize,
    ) -> Result<Self, CapacityExceeded> {
        let mut buffer = Self::with_capacity(capacity);
        for &raw in legacy {
            buffer.try_push(HitRecord::from_legacy(raw))?;
        }
        Ok(buffer)
    }
}

impl<'a> IntoIterator for &'a HitBuffer {
    type Item = &'a HitRecord;
    type IntoIter = std::slice::Iter<'a, HitRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_stops_at_capacity() {
        let mut buffer = HitBuffer::with_capacity(2);
        buffer.try_push(HitRecord::visible(1)).unwrap();
        buffer.try_push(HitRecord::visible(2)).unwrap();
        assert!(buffer.is_full());
        assert_eq!(
            buffer.try_push(HitRecord::visible(3)),
            Err(CapacityExceeded { capacity: 2 })
        );
        assert_eq!(buffer.ids(), vec![1, 2]);
    }

    #[test]
    fn huge_capacity_allocates_lazily() {
        let mut buffer = HitBuffer::with_capacity(usize::MAX);
        assert_eq!(buffer.capacity(), usize::MAX);
        assert!(!buffer.is_full());
        buffer.try_push(HitRecord::visible(1)).unwrap();
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn zero_capacity_rejects_everything() {
        let mut buffer = HitBuffer::with_capacity(0);
        assert!(buffer.is_full());
        assert!(buffer.try_push(HitRecord::visible(7)).is_err());
        assert!(buffer.is_empty());
    }

    #[test]
    fn legacy_layout_puts_id_last() {
        let record = HitRecord::visible(42);
        assert_eq!(record.to_legacy(), [1, DEPTH_UNKNOWN, DEPTH_UNKNOWN, 42]);

        let mut buffer = HitBuffer::with_capacity(4);
        buffer.try_push(record).unwrap();
        let bytes = buffer.to_legacy_bytes();
        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[12..16], &42u32.to_ne_bytes());
    }

    #[test]
    fn from_legacy_respects_capacity() {
        let raw = [[1, 0, 0, 5], [1, DEPTH_UNKNOWN, DEPTH_UNKNOWN, 9]];
        let buffer = HitBuffer::from_legacy(&raw, 2).unwrap();
        assert_eq!(buffer.ids(), vec![5, 9]);
        assert!(buffer.get(0).unwrap().is_nearest());
        assert!(HitBuffer::from_legacy(&raw, 1).is_err());
    }

    #[test]
    fn mark_nearest_only_touches_prefix() {
        let mut buffer = HitBuffer::with_capacity(4);
        for id in [3, 8, 3] {
            buffer.try_push(HitRecord::visible(id)).unwrap();
        }
        assert_eq!(buffer.mark_nearest(3, 2), 1);
        assert!(buffer.get(0).unwrap().is_nearest());
        assert!(!buffer.get(2).unwrap().is_nearest());
        assert_eq!(buffer.mark_nearest(99, 3), 0);
    }

    #[test]
    fn nearest_prefers_marked_then_earliest() {
        let mut buffer = HitBuffer::with_capacity(4);
        assert!(buffer.nearest().is_none());
        for id in [10, 11, 12] {
            buffer.try_push(HitRecord::visible(id)).unwrap();
        }
        assert_eq!(buffer.nearest().map(|r| r.id), Some(10));
        let _ = buffer.mark_nearest(12, 3);
        assert_eq!(buffer.nearest().map(|r| r.id), Some(12));
    }
}
