/// Append-only store of every classified record seen on the current GDB
/// session, plus the cursor machinery the state machine and interceptor use
/// to delimit a scripted command's reply range.
use crate::types::{ClassifiedRecord, RecordFlags};

/// Opaque position into the `RecordStore`. Cheap to copy, stable across
/// pushes (indices are never renumbered).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cursor(usize);

pub struct RecordStore {
    records: Vec<ClassifiedRecord>,
    /// Cursor left behind by `mark_last_result_handled`: the index one past
    /// the most recently consumed `Result` record.
    mark: Cursor,
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            mark: Cursor(0),
        }
    }

    pub fn push(&mut self, record: ClassifiedRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn end(&self) -> Cursor {
        Cursor(self.records.len())
    }

    pub fn mark(&self) -> Cursor {
        self.mark
    }

    /// Records between `from` (inclusive) and `to` (exclusive).
    pub fn range(&self, from: Cursor, to: Cursor) -> &[ClassifiedRecord] {
        &self.records[from.0.min(self.records.len())..to.0.min(self.records.len())]
    }

    pub fn since(&self, from: Cursor) -> &[ClassifiedRecord] {
        self.range(from, self.end())
    }

    /// Reverse-scan for the most recent record whose flags match
    /// `include_mask` and do not intersect `exclude_mask`.
    pub fn getlast(&self, include_mask: RecordFlags, exclude_mask: RecordFlags) -> Option<(Cursor, &ClassifiedRecord)> {
        self.records
            .iter()
            .enumerate()
            .rev()
            .find(|(_, r)| r.flags.intersects(include_mask) && !r.flags.intersects(exclude_mask))
            .map(|(i, r)| (Cursor(i), r))
    }

    /// The most recent `Result` record (`^done`/`^error`/...), if any.
    pub fn latest_result(&self) -> Option<(Cursor, &ClassifiedRecord)> {
        self.getlast(RecordFlags::RESULT, RecordFlags::NONE)
    }

    /// Mark a `Result` record as handled by setting `RecordFlags::HANDLED`
    /// on it, and advance `mark` past it so a later `getlast` scoped to
    /// "since last command" does not re-find the same reply. With
    /// `all == false`, only the most recent `Result` record is marked; with
    /// `all == true`, every `Result` record from the current `mark` onward
    /// is marked and `mark` advances to the end of the store. Once set,
    /// `HANDLED` is never cleared except by this "handle all" sweep
    /// replacing `mark` wholesale.
    pub fn mark_last_result_handled(&mut self, all: bool) {
        if all {
            let from = self.mark.0.min(self.records.len());
            for record in &mut self.records[from..] {
                if record.flags.contains(RecordFlags::RESULT) {
                    record.flags.insert(RecordFlags::HANDLED);
                }
            }
            self.mark = self.end();
        } else if let Some((cursor, _)) = self.latest_result() {
            self.records[cursor.0].flags.insert(RecordFlags::HANDLED);
            self.mark = Cursor(cursor.0 + 1);
        }
    }

    pub fn record_at(&self, cursor: Cursor) -> Option<&ClassifiedRecord> {
        self.records.get(cursor.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push(store: &mut RecordStore, text: &str, flags: RecordFlags) {
        store.push(ClassifiedRecord::new(text, flags));
    }

    #[test]
    fn getlast_finds_most_recent_matching() {
        let mut store = RecordStore::new();
        push(&mut store, "running", RecordFlags::EXEC);
        push(&mut store, "done", RecordFlags::RESULT);
        push(&mut store, "stopped", RecordFlags::EXEC);

        let (cursor, record) = store.getlast(RecordFlags::EXEC, RecordFlags::NONE).unwrap();
        assert_eq!(cursor, Cursor(2));
        assert_eq!(record.text, "stopped");
    }

    #[test]
    fn exclude_mask_skips_matching_records() {
        let mut store = RecordStore::new();
        push(&mut store, "error,msg=\"x\"", RecordFlags::RESULT | RecordFlags::ERROR);
        push(&mut store, "done", RecordFlags::RESULT);

        let found = store.getlast(RecordFlags::RESULT, RecordFlags::ERROR);
        assert_eq!(found.unwrap().1.text, "done");
    }

    #[test]
    fn mark_advances_past_latest_result() {
        let mut store = RecordStore::new();
        push(&mut store, "running", RecordFlags::EXEC);
        push(&mut store, "done", RecordFlags::RESULT);
        store.mark_last_result_handled(false);
        assert_eq!(store.mark(), Cursor(2));
        assert!(store.record_at(Cursor(1)).unwrap().flags.contains(RecordFlags::HANDLED));

        push(&mut store, "stopped", RecordFlags::EXEC);
        let since_mark = store.since(store.mark());
        assert_eq!(since_mark.len(), 1);
        assert_eq!(since_mark[0].text, "stopped");
    }

    #[test]
    fn handle_all_marks_every_unhandled_result_since_mark() {
        let mut store = RecordStore::new();
        push(&mut store, "done1", RecordFlags::RESULT);
        push(&mut store, "out", RecordFlags::EXEC);
        push(&mut store, "done2", RecordFlags::RESULT);
        store.mark_last_result_handled(true);
        assert!(store.record_at(Cursor(0)).unwrap().flags.contains(RecordFlags::HANDLED));
        assert!(store.record_at(Cursor(2)).unwrap().flags.contains(RecordFlags::HANDLED));
        assert_eq!(store.mark(), store.end());
    }

    #[test]
    fn range_clamps_to_store_length() {
        let mut store = RecordStore::new();
        push(&mut store, "a", RecordFlags::LOG);
        let out_of_range = store.range(Cursor(0), Cursor(50));
        assert_eq!(out_of_range.len(), 1);
    }
}
