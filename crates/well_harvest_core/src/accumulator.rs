use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::hash::BuildHasher;

use crate::record::CandidateRecord;

/// Deduplicating, insertion-ordered set of discovered records.
///
/// Records are stored once; the index maps the hash of a record's
/// [`RecordKey`](crate::RecordKey) to the positions of records with that hash.
/// Grows monotonically for the lifetime of one harvest run.
#[derive(Debug, Default)]
pub struct Accumulator {
    hasher: RandomState,
    index: HashMap<u64, Vec<usize>>,
    records: Vec<CandidateRecord>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the record was not seen before.
    pub fn insert(&mut self, record: CandidateRecord) -> bool {
        let hash = self.hasher.hash_one(record.key());
        let slots = self.index.entry(hash).or_default();
        if slots
            .iter()
            .any(|&pos| self.records[pos].key() == record.key())
        {
            return false;
        }
        slots.push(self.records.len());
        self.records.push(record);
        true
    }

    pub fn contains(&self, record: &CandidateRecord) -> bool {
        let hash = self.hasher.hash_one(record.key());
        self.index.get(&hash).is_some_and(|slots| {
            slots
                .iter()
                .any(|&pos| self.records[pos].key() == record.key())
        })
    }

    /// Inserts every record and returns how many were new.
    pub fn extend<I>(&mut self, records: I) -> usize
    where
        I: IntoIterator<Item = CandidateRecord>,
    {
        records
            .into_iter()
            .map(|record| usize::from(self.insert(record)))
            .sum()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[CandidateRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<CandidateRecord> {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colliding_slots_still_compare_whole_records() {
        let mut acc = Accumulator::new();
        let a = CandidateRecord::new("Doc", "/a", vec!["x".into()]);
        let b = CandidateRecord::new("Doc", "/a", vec!["y".into()]);

        // Force both records into one slot list.
        let hash = acc.hasher.hash_one(a.key());
        acc.index.insert(hash, Vec::new());
        assert!(acc.insert(a.clone()));
        let slot = acc.index.remove(&hash).unwrap_or_default();
        acc.index.insert(acc.hasher.hash_one(b.key()), slot);

        assert!(acc.insert(b.clone()));
        assert!(acc.contains(&b));
        assert_eq!(acc.len(), 2);
    }
}
