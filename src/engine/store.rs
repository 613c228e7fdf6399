use std::collections::{BTreeMap, BTreeSet, HashSet};
use log::{debug, error, warn};
use crate::{Error, Record, Result};
use crate::engine::{Filter, Slot, SortKey, View};
use crate::engine::view::page_count;

/// Outcome of [`CollectionStore::import`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportReport {
    pub added: usize,
    /// Records whose id was already present.
    pub skipped: usize,
}

/// An ordered, id-unique collection of records with derived views.
///
/// Every operation that changes `items` writes the whole list to the bound
/// [`Slot`] before returning. Failures of the slot are logged and remembered
/// in [`last_storage_error`](Self::last_storage_error) but never returned:
/// the store keeps working in memory.
///
/// Filter, sort, page and selection state is view-local and never persisted.
#[derive(Debug)]
pub struct CollectionStore<T: Record> {
    items: Vec<T>,
    filters: BTreeMap<String, Filter>,
    sort: SortKey,
    page: usize,
    page_size: usize,
    selection: BTreeSet<T::Id>,
    slot: Option<Slot>,
    last_storage_error: Option<String>,
}

impl<T: Record> CollectionStore<T> {
    /// Opens a store backed by `slot`.
    ///
    /// If the slot has never been written, `seed` provides the initial records
    /// and they are persisted immediately. If the slot cannot be read or
    /// decoded, the store starts empty.
    pub fn open<F>(slot: Slot, page_size: usize, seed: F) -> Self
    where
        F: FnOnce() -> Vec<T>,
    {
        let mut store = Self::with_parts(Vec::new(), Some(slot), page_size);
        match store.read_slot() {
            Some(Some(items)) => store.items = unique(items),
            Some(None) => {
                store.items = unique(seed());
                debug!("Seeding slot with {} records", store.items.len());
                store.persist();
            }
            None => {}
        }
        store
    }

    /// Creates a store with no durable slot.
    pub fn in_memory(items: Vec<T>, page_size: usize) -> Self {
        Self::with_parts(unique(items), None, page_size)
    }

    fn with_parts(items: Vec<T>, slot: Option<Slot>, page_size: usize) -> Self {
        let page_size = if page_size == 0 {
            warn!("Page size 0 is not allowed, using 1");
            1
        } else {
            page_size
        };
        Self {
            items,
            filters: BTreeMap::new(),
            sort: SortKey::default(),
            page: 1,
            page_size,
            selection: BTreeSet::new(),
            slot,
            last_storage_error: None,
        }
    }

    /// `None` when reading failed; `Some(None)` when the slot is missing.
    fn read_slot(&mut self) -> Option<Option<Vec<T>>> {
        let slot = self.slot.as_ref()?;
        match slot.load::<T>() {
            Ok(loaded) => Some(loaded),
            Err(e) => {
                warn!("Could not load slot {}: {}", slot.key(), e);
                self.last_storage_error = Some(e.to_string());
                None
            }
        }
    }

    /// Re-reads the slot, replacing the in-memory records.
    ///
    /// A missing slot empties the store. If reading fails the current records
    /// are kept and `false` is returned.
    pub fn reload(&mut self) -> bool {
        if self.slot.is_none() {
            return false;
        }
        match self.read_slot() {
            Some(loaded) => {
                self.items = unique(loaded.unwrap_or_default());
                let items = &self.items;
                self.selection.retain(|id| items.iter().any(|r| r.id() == id));
                self.clamp_page();
                true
            }
            None => false,
        }
    }

    fn persist(&mut self) {
        if let Some(slot) = &self.slot {
            match slot.save(&self.items) {
                Ok(()) => self.last_storage_error = None,
                Err(e) => {
                    error!("Failed to persist slot {}: {}", slot.key(), e);
                    self.last_storage_error = Some(e.to_string());
                }
            }
        }
    }

    fn position(&self, id: &T::Id) -> Option<usize> {
        self.items.iter().position(|r| r.id() == id)
    }

    pub fn get(&self, id: &T::Id) -> Option<&T> {
        self.items.iter().find(|r| r.id() == id)
    }

    pub fn contains(&self, id: &T::Id) -> bool {
        self.position(id).is_some()
    }

    /// All records in insertion order, ignoring filters.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Appends a record. Fails with [`Error::DuplicateId`] if its id is taken.
    pub fn add(&mut self, record: T) -> Result<&T> {
        self.insert_at(self.items.len(), record)
    }

    /// Inserts a record at the front, for lists that show newest first.
    pub fn prepend(&mut self, record: T) -> Result<&T> {
        self.insert_at(0, record)
    }

    fn insert_at(&mut self, index: usize, record: T) -> Result<&T> {
        if self.contains(record.id()) {
            return Err(Error::DuplicateId(record.id().to_string()));
        }
        debug!("Adding record {}", record.id());
        self.items.insert(index, record);
        self.persist();
        Ok(&self.items[index])
    }

    /// Removes a record. Removing an absent id is a no-op returning `None`.
    pub fn remove(&mut self, id: &T::Id) -> Option<T> {
        let index = self.position(id)?;
        let removed = self.items.remove(index);
        self.selection.remove(id);
        debug!("Removed record {}", id);
        self.persist();
        self.clamp_page();
        Some(removed)
    }

    /// Applies `patch` to the record with `id`.
    ///
    /// The patch runs on a copy; if it moves the record onto an id that is
    /// already taken the original is left untouched.
    pub fn update<F>(&mut self, id: &T::Id, patch: F) -> Result<&T>
    where
        F: FnOnce(&mut T),
    {
        let index = self.position(id).ok_or_else(|| Error::NotFound(id.to_string()))?;
        let mut patched = self.items[index].clone();
        patch(&mut patched);

        if patched.id() != id {
            if self.contains(patched.id()) {
                return Err(Error::DuplicateId(patched.id().to_string()));
            }
            if self.selection.remove(id) {
                self.selection.insert(patched.id().clone());
            }
        }

        self.items[index] = patched;
        debug!("Updated record {}", id);
        self.persist();
        self.clamp_page();
        Ok(&self.items[index])
    }

    /// Appends every record whose id is not present yet.
    pub fn import(&mut self, records: Vec<T>) -> ImportReport {
        let mut report = ImportReport::default();
        for record in records {
            if self.contains(record.id()) {
                warn!("Skipping imported record with duplicate id {}", record.id());
                report.skipped += 1;
            } else {
                self.items.push(record);
                report.added += 1;
            }
        }
        if report.added > 0 {
            self.persist();
        }
        report
    }

    /// All records as a pretty-printed JSON array.
    pub fn export(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.items)?)
    }

    /// Removes every record matching `pred`, returning how many went.
    pub fn remove_where<F>(&mut self, pred: F) -> usize
    where
        F: Fn(&T) -> bool,
    {
        let before = self.items.len();
        self.items.retain(|r| !pred(r));
        let removed = before - self.items.len();
        if removed > 0 {
            let items = &self.items;
            self.selection.retain(|id| items.iter().any(|r| r.id() == id));
            self.persist();
            self.clamp_page();
        }
        removed
    }

    pub fn count_where<F>(&self, pred: F) -> usize
    where
        F: Fn(&T) -> bool,
    {
        self.items.iter().filter(|r| pred(*r)).count()
    }

    pub fn sum_by<F>(&self, f: F) -> f64
    where
        F: Fn(&T) -> f64,
    {
        self.items.iter().map(f).sum()
    }

    // View parameters

    /// Sets (or replaces) a named filter and returns to page 1.
    pub fn set_filter(&mut self, name: &str, filter: Filter) {
        debug!("Filter {} = {}", name, filter);
        self.filters.insert(name.to_string(), filter);
        self.page = 1;
    }

    pub fn clear_filter(&mut self, name: &str) -> Option<Filter> {
        let removed = self.filters.remove(name);
        self.page = 1;
        removed
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
        self.page = 1;
    }

    pub fn filter(&self, name: &str) -> Option<&Filter> {
        self.filters.get(name)
    }

    /// Filters that currently constrain the view, by name.
    pub fn active_filters(&self) -> impl Iterator<Item = (&str, &Filter)> + '_ {
        self.filters
            .iter()
            .filter(|(_, f)| f.is_active())
            .map(|(name, f)| (name.as_str(), f))
    }

    pub fn set_sort(&mut self, key: SortKey) {
        self.sort = key;
    }

    pub fn sort(&self) -> &SortKey {
        &self.sort
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page_count(&self) -> usize {
        page_count(self.filtered_count(), self.page_size)
    }

    /// Moves to page `n` if it exists. Out-of-range pages are ignored.
    pub fn set_page(&mut self, n: usize) -> bool {
        if n >= 1 && n <= self.page_count() {
            self.page = n;
            true
        } else {
            debug!("Ignoring out-of-range page {}", n);
            false
        }
    }

    pub fn next_page(&mut self) -> bool {
        self.set_page(self.page + 1)
    }

    pub fn prev_page(&mut self) -> bool {
        match self.page.checked_sub(1) {
            Some(n) => self.set_page(n),
            None => false,
        }
    }

    fn clamp_page(&mut self) {
        self.page = self.page.min(self.page_count());
    }

    // Selection

    /// Flips the selection state of `id`, returning whether it is now selected.
    pub fn toggle_selection(&mut self, id: &T::Id) -> Result<bool> {
        if !self.contains(id) {
            return Err(Error::NotFound(id.to_string()));
        }
        if self.selection.remove(id) {
            Ok(false)
        } else {
            self.selection.insert(id.clone());
            Ok(true)
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn selection(&self) -> &BTreeSet<T::Id> {
        &self.selection
    }

    pub fn is_selected(&self, id: &T::Id) -> bool {
        self.selection.contains(id)
    }

    /// Selects every record on the current page.
    pub fn select_all_visible(&mut self) -> usize {
        let ids: Vec<T::Id> = self.view().items.iter().map(|r| r.id().clone()).collect();
        let count = ids.len();
        self.selection.extend(ids);
        count
    }

    /// Deletes the selected records and clears the selection.
    pub fn remove_selected(&mut self) -> usize {
        let selection = std::mem::take(&mut self.selection);
        let before = self.items.len();
        self.items.retain(|r| !selection.contains(r.id()));
        let removed = before - self.items.len();
        if removed > 0 {
            self.persist();
            self.clamp_page();
        }
        removed
    }

    /// Applies `patch` to each selected record and clears the selection.
    ///
    /// A patch that would change a record's id is discarded for that record.
    pub fn update_selected<F>(&mut self, mut patch: F) -> usize
    where
        F: FnMut(&mut T),
    {
        let selection = std::mem::take(&mut self.selection);
        let mut updated = 0;
        for record in self.items.iter_mut().filter(|r| selection.contains(r.id())) {
            let mut patched = record.clone();
            patch(&mut patched);
            if patched.id() == record.id() {
                *record = patched;
                updated += 1;
            } else {
                warn!("Discarding bulk update that changed id of {}", record.id());
            }
        }
        if updated > 0 {
            self.persist();
            self.clamp_page();
        }
        updated
    }

    // Derived views

    fn passes(&self, record: &T) -> bool {
        self.filters.values().all(|f| f.matches(record))
    }

    pub fn filtered_count(&self) -> usize {
        self.items.iter().filter(|r| self.passes(r)).count()
    }

    /// Every record passing the filters, sorted, without pagination.
    pub fn filtered(&self) -> Vec<&T> {
        let mut records: Vec<&T> = self.items.iter().filter(|r| self.passes(r)).collect();
        self.sort.apply(&mut records);
        records
    }

    /// The current page of the filtered, sorted records.
    pub fn view(&self) -> View<'_, T> {
        View::paginate(self.filtered(), self.page, self.page_size)
    }

    pub fn slot(&self) -> Option<&Slot> {
        self.slot.as_ref()
    }

    /// Message of the most recent slot failure, cleared by the next successful write.
    pub fn last_storage_error(&self) -> Option<&str> {
        self.last_storage_error.as_deref()
    }
}

/// Keeps the first record for each id.
fn unique<T: Record>(records: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| {
            let fresh = seen.insert(r.id().clone());
            if !fresh {
                warn!("Dropping record with duplicate id {}", r.id());
            }
            fresh
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::engine::MemoryStorage;
    use crate::models::{sample_catalog, Product};
    use crate::{DurableStorage, SlotEnumeration, SlotReader, SlotWriter};

    struct BrokenStorage;

    impl SlotReader for BrokenStorage {
        fn read(&self, _key: &str) -> Result<Option<String>> {
            Err(Error::Io(std::io::Error::other("device unavailable")))
        }
    }

    impl SlotWriter for BrokenStorage {
        fn write(&self, _key: &str, _payload: &str) -> Result<()> {
            Err(Error::Io(std::io::Error::other("quota exceeded")))
        }

        fn delete(&self, _key: &str) -> Result<()> {
            Ok(())
        }
    }

    impl SlotEnumeration for BrokenStorage {
        fn keys(&self) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
    }

    fn ids(view: &View<'_, Product>) -> Vec<u64> {
        view.items.iter().map(|p| p.id).collect()
    }

    fn two_products() -> Vec<Product> {
        vec![
            Product::new(1, "b", "Acme", "misc", 10.0, 4.0),
            Product::new(2, "a", "Acme", "misc", 20.0, 4.0),
        ]
    }

    #[test]
    fn test_add_rejects_duplicate_id() {
        let mut store = CollectionStore::in_memory(two_products(), 12);
        let res = store.add(Product::new(1, "dup", "Acme", "misc", 1.0, 1.0));
        assert!(matches!(res, Err(Error::DuplicateId(ref id)) if id == "1"));
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(&1).unwrap().name, "b");
    }

    #[test]
    fn test_add_and_prepend_order() {
        let mut store = CollectionStore::in_memory(two_products(), 12);
        store.add(Product::new(3, "c", "Acme", "misc", 1.0, 1.0)).unwrap();
        store.prepend(Product::new(4, "d", "Acme", "misc", 1.0, 1.0)).unwrap();
        assert_eq!(ids(&store.view()), vec![4, 1, 2, 3]);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut store = CollectionStore::in_memory(two_products(), 12);
        assert!(store.remove(&99).is_none());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_remove_drops_selection() {
        let mut store = CollectionStore::in_memory(two_products(), 12);
        assert!(store.toggle_selection(&1).unwrap());
        let removed = store.remove(&1).unwrap();
        assert_eq!(removed.id, 1);
        assert!(store.selection().is_empty());
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let mut store = CollectionStore::in_memory(two_products(), 12);
        let res = store.update(&7, |p| p.price = 1.0);
        assert!(matches!(res, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_update_cannot_collide_ids() {
        let mut store = CollectionStore::in_memory(two_products(), 12);
        let res = store.update(&1, |p| {
            p.id = 2;
            p.name = "changed".into();
        });
        assert!(matches!(res, Err(Error::DuplicateId(_))));
        assert_eq!(store.get(&1).unwrap().name, "b");

        let updated = store.update(&1, |p| p.price = 15.0).unwrap();
        assert_eq!(updated.price, 15.0);
    }

    #[test]
    fn test_update_moves_selection_with_new_id() {
        let mut store = CollectionStore::in_memory(two_products(), 12);
        store.toggle_selection(&1).unwrap();
        store.update(&1, |p| p.id = 10).unwrap();
        assert!(store.is_selected(&10));
        assert!(!store.is_selected(&1));
    }

    #[test]
    fn test_sort_example_scenario() {
        let mut store = CollectionStore::in_memory(two_products(), 12);
        store.set_sort("name".parse().unwrap());
        assert_eq!(ids(&store.view()), vec![2, 1]);
        store.set_sort("price-high".parse().unwrap());
        assert_eq!(ids(&store.view()), vec![2, 1]);
        store.set_sort(SortKey::Insertion);
        assert_eq!(ids(&store.view()), vec![1, 2]);
    }

    #[test]
    fn test_filters_narrow_conjunctively() {
        let mut store = CollectionStore::in_memory(sample_catalog(), 12);
        assert_eq!(store.view().filtered_count, 12);

        store.set_filter("category", Filter::exact("category", "laptops"));
        let laptops = store.view().filtered_count;
        assert_eq!(laptops, 4);

        store.set_filter("price", Filter::parse_range("price", "1000-1400").unwrap());
        let narrowed = store.view().filtered_count;
        assert!(narrowed <= laptops);
        assert_eq!(narrowed, 2);

        store.set_filter("category", Filter::exact("category", "all"));
        assert_eq!(store.active_filters().count(), 1);
    }

    #[test]
    fn test_set_filter_resets_page() {
        let mut store = CollectionStore::in_memory(sample_catalog(), 5);
        assert!(store.set_page(3));
        store.set_filter("q", Filter::search(["name"], ""));
        assert_eq!(store.page(), 1);
    }

    #[test]
    fn test_set_page_bounds() {
        let mut store = CollectionStore::in_memory(sample_catalog(), 5);
        assert_eq!(store.page_count(), 3);
        assert!(!store.set_page(0));
        assert!(!store.set_page(4));
        assert_eq!(store.page(), 1);
        assert!(store.set_page(3));
        assert_eq!(store.view().items.len(), 2);
        assert!(!store.next_page());
        assert!(store.prev_page());
        assert_eq!(store.page(), 2);
    }

    #[test]
    fn test_page_clamped_after_removals() {
        let mut store = CollectionStore::in_memory(sample_catalog(), 5);
        store.set_page(3);
        store.remove_where(|p| p.id > 9);
        assert_eq!(store.page(), 2);
        assert_eq!(store.view().page, 2);
    }

    #[test]
    fn test_toggle_selection_unknown_id() {
        let mut store = CollectionStore::in_memory(two_products(), 12);
        assert!(matches!(store.toggle_selection(&5), Err(Error::NotFound(_))));
        assert!(store.toggle_selection(&2).unwrap());
        assert!(!store.toggle_selection(&2).unwrap());
    }

    #[test]
    fn test_bulk_selection_operations() {
        let mut store = CollectionStore::in_memory(sample_catalog(), 4);
        assert_eq!(store.select_all_visible(), 4);
        assert_eq!(store.update_selected(|p| p.in_stock = false), 4);
        assert!(store.selection().is_empty());
        assert_eq!(store.count_where(|p| !p.in_stock), 5);

        store.toggle_selection(&11).unwrap();
        store.toggle_selection(&12).unwrap();
        assert_eq!(store.remove_selected(), 2);
        assert_eq!(store.len(), 10);
    }

    #[test]
    fn test_update_selected_discards_id_changes() {
        let mut store = CollectionStore::in_memory(two_products(), 12);
        store.toggle_selection(&1).unwrap();
        assert_eq!(store.update_selected(|p| p.id += 100), 0);
        assert!(store.contains(&1));
    }

    #[test]
    fn test_import_skips_duplicates() {
        let mut store = CollectionStore::in_memory(two_products(), 12);
        let report = store.import(vec![
            Product::new(2, "again", "Acme", "misc", 1.0, 1.0),
            Product::new(3, "new", "Acme", "misc", 1.0, 1.0),
        ]);
        assert_eq!(report, ImportReport { added: 1, skipped: 1 });
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_in_memory_dedups_initial_items() {
        let mut items = two_products();
        items.push(Product::new(1, "shadow", "Acme", "misc", 1.0, 1.0));
        let store = CollectionStore::in_memory(items, 12);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(&1).unwrap().name, "b");
    }

    #[test]
    fn test_open_seeds_and_persists() {
        let storage: Arc<dyn DurableStorage> = Arc::new(MemoryStorage::new());
        let store = CollectionStore::open(Slot::new(storage.clone(), "products"), 12, two_products);
        assert_eq!(store.len(), 2);
        assert!(storage.read("products").unwrap().is_some());

        let reopened: CollectionStore<Product> =
            CollectionStore::open(Slot::new(storage, "products"), 12, Vec::new);
        assert_eq!(reopened.len(), 2);
    }

    #[test]
    fn test_open_malformed_falls_back_to_empty() {
        let storage = Arc::new(MemoryStorage::with_slots([("cart", "[{broken")]));
        let store: CollectionStore<Product> =
            CollectionStore::open(Slot::new(storage, "cart"), 12, two_products);
        assert!(store.is_empty());
        assert!(store.last_storage_error().is_some());
    }

    #[test]
    fn test_storage_failures_are_swallowed() {
        let mut store: CollectionStore<Product> =
            CollectionStore::open(Slot::new(Arc::new(BrokenStorage), "cart"), 12, two_products);
        assert!(store.is_empty());

        store.add(Product::new(3, "c", "Acme", "misc", 1.0, 1.0)).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.last_storage_error().unwrap().contains("quota exceeded"));

        assert!(!store.reload());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_reload_sees_external_writes() {
        let storage: Arc<dyn DurableStorage> = Arc::new(MemoryStorage::new());
        let mut store = CollectionStore::open(Slot::new(storage.clone(), "p"), 12, two_products);
        store.toggle_selection(&2).unwrap();

        storage.write("p", r#"[{"id":1,"name":"b","brand":"Acme","category":"misc","price":10.0,"rating":4.0}]"#).unwrap();
        assert!(store.reload());
        assert_eq!(store.len(), 1);
        assert!(store.selection().is_empty());
    }

    #[test]
    fn test_zero_page_size_is_coerced() {
        let store = CollectionStore::in_memory(two_products(), 0);
        assert_eq!(store.page_size(), 1);
        assert_eq!(store.page_count(), 2);
    }
}
