// 💾 Expense Store - identifiers, persistence and queries
//
// Layout inside the key-value substrate:
//   "id"          -> last identifier handed out ("0" before the first save)
//   "1", "2", ... -> JSON-encoded expenses
//
// Identifiers only ever grow. A deleted identifier leaves a hole that
// listings skip and that is never handed out again.

use crate::error::{Result, StoreError};
use crate::record::{Expense, ExpenseFilter, StoredExpense};
use crate::storage::KeyValueStore;

pub const COUNTER_KEY: &str = "id";

pub struct ExpenseStore<S: KeyValueStore> {
    storage: S,
}

impl<S: KeyValueStore> ExpenseStore<S> {
    /// Wrap a substrate, writing the "0" counter sentinel on first use
    pub fn new(mut storage: S) -> Result<Self> {
        if storage.get(COUNTER_KEY)?.is_none() {
            storage.set(COUNTER_KEY, "0")?;
            tracing::debug!("Initialized expense id counter");
        }

        Ok(ExpenseStore { storage })
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_inner(self) -> S {
        self.storage
    }

    fn counter(&self) -> Result<u64> {
        match self.storage.get(COUNTER_KEY)? {
            None => Ok(0),
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| StoreError::InvalidCounter(raw)),
        }
    }

    /// Identifier the next save will use. Does not advance the counter.
    pub fn next_available_id(&self) -> Result<u64> {
        let counter = self.counter()?;
        counter
            .checked_add(1)
            .ok_or_else(|| StoreError::InvalidCounter(counter.to_string()))
    }

    /// Persist a complete expense and return its identifier.
    ///
    /// The record and the advanced counter go out in one `set_many` call so
    /// the counter never lags behind a saved record.
    pub fn save(&mut self, expense: &Expense) -> Result<u64> {
        if !expense.validate() {
            return Err(StoreError::Incomplete {
                missing: expense.missing_fields(),
            });
        }

        let id = self.next_available_id()?;
        let key = id.to_string();
        let json = serde_json::to_string(expense)?;

        self.storage
            .set_many(&[(key.as_str(), json.as_str()), (COUNTER_KEY, key.as_str())])?;

        tracing::debug!(id, category = %expense.category, "Saved expense");
        Ok(id)
    }

    pub fn get(&self, id: u64) -> Result<Option<Expense>> {
        match self.storage.get(&id.to_string())? {
            None => Ok(None),
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        }
    }

    /// Every stored expense in ascending identifier order
    pub fn list_all(&self) -> Result<Vec<StoredExpense>> {
        let end = self.next_available_id()?;
        let mut expenses = Vec::new();

        for id in 1..end {
            let json = match self.storage.get(&id.to_string())? {
                Some(json) => json,
                None => continue,
            };

            match serde_json::from_str::<Expense>(&json) {
                Ok(expense) => expenses.push(StoredExpense { id, expense }),
                Err(e) => {
                    tracing::warn!(id, error = %e, "Skipping unreadable expense record");
                }
            }
        }

        Ok(expenses)
    }

    /// Expenses matching every non-empty criterion, in identifier order
    pub fn filter(&self, criteria: &ExpenseFilter) -> Result<Vec<StoredExpense>> {
        let mut expenses = self.list_all()?;
        expenses.retain(|stored| criteria.matches(&stored.expense));
        Ok(expenses)
    }

    /// Remove an expense. The counter is left alone; unknown ids are a no-op.
    pub fn delete(&mut self, id: u64) -> Result<()> {
        self.storage.remove(&id.to_string())?;
        tracing::debug!(id, "Deleted expense");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, SqliteStorage};

    /// Helper function to create test expenses with all required fields
    fn create_test_expense(day: &str, category: &str, description: &str, amount: &str) -> Expense {
        Expense::new("2023", "1", day, category, description, amount)
    }

    fn lunch() -> Expense {
        create_test_expense("1", "1", "Lunch", "20")
    }

    fn course() -> Expense {
        create_test_expense("2", "2", "Course", "500")
    }

    #[test]
    fn test_new_store_writes_sentinel() {
        let store = ExpenseStore::new(MemoryStorage::new()).unwrap();

        assert_eq!(store.storage().get(COUNTER_KEY).unwrap().as_deref(), Some("0"));
        assert_eq!(store.next_available_id().unwrap(), 1);
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_new_store_keeps_existing_counter() {
        let mut storage = MemoryStorage::new();
        storage.set(COUNTER_KEY, "7").unwrap();

        let store = ExpenseStore::new(storage).unwrap();
        assert_eq!(store.next_available_id().unwrap(), 8);
    }

    #[test]
    fn test_next_available_id_has_no_side_effect() {
        let store = ExpenseStore::new(MemoryStorage::new()).unwrap();

        assert_eq!(store.next_available_id().unwrap(), 1);
        assert_eq!(store.next_available_id().unwrap(), 1);
    }

    #[test]
    fn test_save_list_filter_delete_walkthrough() {
        let mut store = ExpenseStore::new(MemoryStorage::new()).unwrap();

        assert_eq!(store.save(&lunch()).unwrap(), 1);
        assert_eq!(store.save(&course()).unwrap(), 2);

        let all = store.list_all().unwrap();
        assert_eq!(
            all,
            vec![
                StoredExpense { id: 1, expense: lunch() },
                StoredExpense { id: 2, expense: course() },
            ]
        );

        let education = store
            .filter(&ExpenseFilter::default().category("2"))
            .unwrap();
        assert_eq!(education, vec![StoredExpense { id: 2, expense: course() }]);

        store.delete(1).unwrap();
        assert_eq!(
            store.list_all().unwrap(),
            vec![StoredExpense { id: 2, expense: course() }]
        );

        println!("✅ Save/list/filter/delete walkthrough PASSED");
    }

    #[test]
    fn test_save_assigns_prior_counter_plus_one() {
        let mut store = ExpenseStore::new(MemoryStorage::new()).unwrap();
        store.save(&lunch()).unwrap();
        store.save(&lunch()).unwrap();

        let before = store.next_available_id().unwrap();
        let id = store.save(&course()).unwrap();

        assert_eq!(id, before);
        let matching: Vec<_> = store
            .list_all()
            .unwrap()
            .into_iter()
            .filter(|stored| stored.expense == course())
            .collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].id, before);
    }

    #[test]
    fn test_ids_never_reused_after_delete() {
        let mut store = ExpenseStore::new(MemoryStorage::new()).unwrap();

        let first = store.save(&lunch()).unwrap();
        let second = store.save(&course()).unwrap();
        store.delete(second).unwrap();
        store.delete(first).unwrap();

        let third = store.save(&lunch()).unwrap();

        assert!(first < second && second < third);
        assert_eq!(third, 3);
        assert_eq!(store.storage().get(COUNTER_KEY).unwrap().as_deref(), Some("3"));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let mut store = ExpenseStore::new(MemoryStorage::new()).unwrap();
        store.save(&lunch()).unwrap();
        store.save(&course()).unwrap();

        store.delete(1).unwrap();
        let after_first = store.list_all().unwrap();

        store.delete(1).unwrap();
        store.delete(42).unwrap();

        assert_eq!(store.list_all().unwrap(), after_first);
        assert_eq!(store.next_available_id().unwrap(), 3);
    }

    #[test]
    fn test_incomplete_expense_is_never_persisted() {
        let mut store = ExpenseStore::new(MemoryStorage::new()).unwrap();

        let mut expense = lunch();
        expense.amount.clear();

        match store.save(&expense) {
            Err(StoreError::Incomplete { missing }) => assert_eq!(missing, vec!["amount"]),
            other => panic!("expected Incomplete, got {:?}", other),
        }

        assert_eq!(store.next_available_id().unwrap(), 1);
        assert_eq!(store.storage().len(), 1, "only the counter should be stored");
    }

    #[test]
    fn test_filter_preserves_order_over_mixed_categories() {
        let mut store = ExpenseStore::new(MemoryStorage::new()).unwrap();
        store.save(&create_test_expense("1", "2", "Books", "80")).unwrap();
        store.save(&create_test_expense("2", "1", "Dinner", "45")).unwrap();
        store.save(&create_test_expense("3", "2", "Tuition", "900")).unwrap();
        store.save(&create_test_expense("4", "5", "Bus", "4")).unwrap();

        let education = store
            .filter(&ExpenseFilter::default().category("2"))
            .unwrap();
        let ids: Vec<u64> = education.iter().map(|stored| stored.id).collect();
        assert_eq!(ids, vec![1, 3]);

        let narrowed = store
            .filter(&ExpenseFilter::default().category("2").day("3"))
            .unwrap();
        assert_eq!(narrowed.len(), 1);
        assert_eq!(narrowed[0].expense.description, "Tuition");

        // Empty criteria behave like list_all
        assert_eq!(
            store.filter(&ExpenseFilter::default()).unwrap(),
            store.list_all().unwrap()
        );
    }

    #[test]
    fn test_records_beyond_counter_are_not_listed() {
        let mut storage = MemoryStorage::new();
        storage.set(COUNTER_KEY, "1").unwrap();
        storage
            .set("1", &serde_json::to_string(&lunch()).unwrap())
            .unwrap();
        // Written without advancing the counter
        storage
            .set("2", &serde_json::to_string(&course()).unwrap())
            .unwrap();

        let mut store = ExpenseStore::new(storage).unwrap();
        assert_eq!(store.list_all().unwrap().len(), 1);

        // The next save lands on the orphaned slot
        assert_eq!(store.save(&lunch()).unwrap(), 2);
        assert_eq!(store.get(2).unwrap(), Some(lunch()));
    }

    #[test]
    fn test_unreadable_record_is_skipped() {
        let mut store = ExpenseStore::new(MemoryStorage::new()).unwrap();
        store.save(&lunch()).unwrap();
        store.save(&course()).unwrap();

        let mut storage = store.into_inner();
        storage.set("1", "not json").unwrap();
        let store = ExpenseStore::new(storage).unwrap();

        let all = store.list_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, 2);
    }

    #[test]
    fn test_invalid_counter_is_reported() {
        let mut storage = MemoryStorage::new();
        storage.set(COUNTER_KEY, "abc").unwrap();
        let mut store = ExpenseStore::new(storage).unwrap();

        assert!(matches!(
            store.next_available_id(),
            Err(StoreError::InvalidCounter(_))
        ));
        assert!(matches!(
            store.list_all(),
            Err(StoreError::InvalidCounter(_))
        ));
        assert!(matches!(
            store.save(&lunch()),
            Err(StoreError::InvalidCounter(_))
        ));
    }

    #[test]
    fn test_exhausted_counter_is_reported() {
        let mut storage = MemoryStorage::new();
        storage.set(COUNTER_KEY, &u64::MAX.to_string()).unwrap();
        let mut store = ExpenseStore::new(storage).unwrap();

        assert!(matches!(
            store.next_available_id(),
            Err(StoreError::InvalidCounter(_))
        ));
        assert!(matches!(
            store.save(&lunch()),
            Err(StoreError::InvalidCounter(_))
        ));
        assert!(matches!(
            store.list_all(),
            Err(StoreError::InvalidCounter(_))
        ));
        assert_eq!(
            store.storage().get(COUNTER_KEY).unwrap(),
            Some(u64::MAX.to_string()),
            "counter must not wrap"
        );
        assert_eq!(store.storage().len(), 1);
    }

    #[test]
    fn test_numeric_json_record_is_listed() {
        let mut storage = MemoryStorage::new();
        storage.set(COUNTER_KEY, "1").unwrap();
        storage
            .set(
                "1",
                r#"{"year":2023,"month":1,"day":1,"category":"1","description":"Lunch","amount":20}"#,
            )
            .unwrap();

        let store = ExpenseStore::new(storage).unwrap();
        let all = store.list_all().unwrap();

        assert_eq!(all, vec![StoredExpense { id: 1, expense: lunch() }]);
        assert_eq!(
            store.filter(&ExpenseFilter::default().year("2023").amount("20")).unwrap().len(),
            1
        );
    }

    #[test]
    fn test_sqlite_backed_store() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let mut store = ExpenseStore::new(storage).unwrap();

        store.save(&lunch()).unwrap();
        store.save(&course()).unwrap();
        store.delete(1).unwrap();

        let all = store.list_all().unwrap();
        assert_eq!(all, vec![StoredExpense { id: 2, expense: course() }]);
        assert_eq!(store.get(1).unwrap(), None);
        assert_eq!(store.storage().count().unwrap(), 2, "counter + one record");

        println!("✅ SQLite-backed store test PASSED");
    }
}
