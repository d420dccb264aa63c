//! In-memory backing: insertion-ordered records behind a `RwLock`.

use super::StudentStore;
use crate::error::AppError;
use crate::student::{Student, StudentChanges};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct MemoryStudentStore {
    records: RwLock<Vec<Student>>,
}

impl MemoryStudentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StudentStore for MemoryStudentStore {
    async fn create(&self, student: &Student) -> Result<Student, AppError> {
        let mut records = self.records.write().await;
        if records.iter().any(|s| s.id == student.id) {
            return Err(AppError::Storage(format!("duplicate id {}", student.id)));
        }
        records.push(student.clone());
        Ok(student.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Student, AppError> {
        self.records
            .read()
            .await
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(id.to_string()))
    }

    async fn find_all(&self) -> Result<Vec<Student>, AppError> {
        Ok(self.records.read().await.clone())
    }

    async fn update(&self, id: Uuid, changes: &StudentChanges, at: DateTime<Utc>) -> Result<Student, AppError> {
        let mut records = self.records.write().await;
        let student = records
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| AppError::NotFound(id.to_string()))?;
        student.apply(changes, at);
        Ok(student.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut records = self.records.write().await;
        let pos = records
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| AppError::NotFound(id.to_string()))?;
        records.remove(pos);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::student::{now, NewStudent};
    use serde_json::json;
    use std::sync::Arc;

    fn student(name: &str) -> Student {
        let new: NewStudent = serde_json::from_value(json!({ "name": name })).unwrap();
        Student::create(new, now())
    }

    #[tokio::test]
    async fn create_then_find() {
        let store = MemoryStudentStore::new();
        let s = store.create(&student("Ana")).await.unwrap();
        assert_eq!(store.find_by_id(s.id).await.unwrap(), s);
    }

    #[tokio::test]
    async fn duplicate_id_is_a_storage_error() {
        let store = MemoryStudentStore::new();
        let s = student("Ana");
        store.create(&s).await.unwrap();
        assert!(matches!(store.create(&s).await, Err(AppError::Storage(_))));
    }

    #[tokio::test]
    async fn find_all_keeps_insertion_order() {
        let store = MemoryStudentStore::new();
        let names = ["a", "b", "c"];
        for n in names {
            store.create(&student(n)).await.unwrap();
        }
        let all = store.find_all().await.unwrap();
        assert_eq!(all.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(), names);
    }

    #[tokio::test]
    async fn update_and_delete_missing_are_not_found() {
        let store = MemoryStudentStore::new();
        let id = Uuid::new_v4();
        assert!(matches!(
            store.update(id, &StudentChanges::default(), now()).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(store.delete(id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_removes_record() {
        let store = MemoryStudentStore::new();
        let s = store.create(&student("Ana")).await.unwrap();
        store.delete(s.id).await.unwrap();
        assert!(matches!(store.find_by_id(s.id).await, Err(AppError::NotFound(_))));
        assert!(store.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_updates_are_not_lost() {
        let store = Arc::new(MemoryStudentStore::new());
        let s = store.create(&student("Ana")).await.unwrap();
        let id = s.id;
        let mut tasks = Vec::new();
        for age in 1..=32 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                let changes: StudentChanges = serde_json::from_value(json!({ "age": age })).unwrap();
                store.update(id, &changes, now()).await.unwrap()
            }));
        }
        for t in tasks {
            t.await.unwrap();
        }
        let after = store.find_by_id(s.id).await.unwrap();
        assert!((1..=32).contains(&after.age));
        assert!(after.updated_at >= s.updated_at);
        assert_eq!(store.find_all().await.unwrap().len(), 1);
    }
}
