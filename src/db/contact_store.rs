//! Contact Store

use super::row;
use super::Database;
use crate::domain::aggregates::{Contact, NewContact};
use crate::domain::events::StoreEvent;
use crate::error::{StoreError, StoreResult};
use crate::live::{live_query, LiveStream};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

const COLUMNS: &str = "id, name, email, phone, message, is_read, responded, created_at";

impl<'r> FromRow<'r, SqliteRow> for Contact {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            message: row.try_get("message")?,
            is_read: row.try_get("is_read")?,
            responded: row.try_get("responded")?,
            created_at: row::timestamp(row, "created_at")?,
        })
    }
}

#[derive(Clone)]
pub struct ContactStore {
    db: Database,
}

impl ContactStore {
    pub fn new(db: Database) -> Self { Self { db } }

    pub async fn insert(&self, contact: &NewContact) -> StoreResult<i64> {
        let result = sqlx::query(
            "INSERT INTO contacts (name, email, phone, message, is_read, responded, created_at) VALUES (?, ?, ?, ?, 0, 0, ?)",
        )
        .bind(&contact.name)
        .bind(&contact.email)
        .bind(&contact.phone)
        .bind(&contact.message)
        .bind(row::now_millis())
        .execute(self.db.pool())
        .await?;
        self.db.publish(StoreEvent::ContactsChanged);
        Ok(result.last_insert_rowid())
    }

    pub async fn find_by_id(&self, id: i64) -> StoreResult<Option<Contact>> {
        let contact = sqlx::query_as::<_, Contact>(&format!("SELECT {COLUMNS} FROM contacts WHERE id = ?"))
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(contact)
    }

    pub async fn list_all(&self) -> StoreResult<Vec<Contact>> {
        let contacts = sqlx::query_as::<_, Contact>(&format!(
            "SELECT {COLUMNS} FROM contacts ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.db.pool())
        .await?;
        Ok(contacts)
    }

    pub async fn list_by_read(&self, is_read: bool) -> StoreResult<Vec<Contact>> {
        let contacts = sqlx::query_as::<_, Contact>(&format!(
            "SELECT {COLUMNS} FROM contacts WHERE is_read = ? ORDER BY created_at DESC, id DESC"
        ))
        .bind(is_read)
        .fetch_all(self.db.pool())
        .await?;
        Ok(contacts)
    }

    pub async fn unread_count(&self) -> StoreResult<i64> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM contacts WHERE is_read = 0")
            .fetch_one(self.db.pool())
            .await?)
    }

    pub async fn count(&self) -> StoreResult<i64> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM contacts").fetch_one(self.db.pool()).await?)
    }

    pub async fn mark_read(&self, id: i64, is_read: bool) -> StoreResult<()> {
        self.set_flag("is_read", id, is_read).await
    }

    pub async fn mark_responded(&self, id: i64, responded: bool) -> StoreResult<()> {
        self.set_flag("responded", id, responded).await
    }

    pub async fn delete(&self, id: i64) -> StoreResult<()> {
        let rows = sqlx::query("DELETE FROM contacts WHERE id = ?").bind(id).execute(self.db.pool()).await?;
        if rows.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("Contact {id} not found")));
        }
        self.db.publish(StoreEvent::ContactsChanged);
        Ok(())
    }

    /// Live inbox, newest first.
    pub fn watch_all(&self) -> LiveStream<Vec<Contact>> {
        let store = self.clone();
        live_query(
            self.db.subscribe(),
            |event| *event == StoreEvent::ContactsChanged,
            move || {
                let store = store.clone();
                async move { store.list_all().await }
            },
        )
    }

    // `column` is one of two literals above, never user input.
    async fn set_flag(&self, column: &'static str, id: i64, value: bool) -> StoreResult<()> {
        let rows = sqlx::query(&format!("UPDATE contacts SET {column} = ? WHERE id = ?"))
            .bind(value)
            .bind(id)
            .execute(self.db.pool())
            .await?;
        if rows.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("Contact {id} not found")));
        }
        self.db.publish(StoreEvent::ContactsChanged);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support;
    use futures::StreamExt;

    fn inquiry(name: &str) -> NewContact {
        NewContact {
            name: name.into(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone: None,
            message: "Do you have this in stock?".into(),
        }
    }

    #[tokio::test]
    async fn test_inbox_flags() {
        let t = test_support::open().await;
        let contacts = t.db.contacts();
        let first = contacts.insert(&inquiry("Ana")).await.unwrap();
        contacts.insert(&inquiry("Luis")).await.unwrap();

        assert_eq!(contacts.count().await.unwrap(), 2);
        assert_eq!(contacts.unread_count().await.unwrap(), 2);

        contacts.mark_read(first, true).await.unwrap();
        contacts.mark_responded(first, true).await.unwrap();
        let stored = contacts.find_by_id(first).await.unwrap().unwrap();
        assert!(stored.is_read && stored.responded);
        assert_eq!(contacts.unread_count().await.unwrap(), 1);
        assert_eq!(contacts.list_by_read(false).await.unwrap()[0].name, "Luis");

        let names: Vec<_> = contacts.list_all().await.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Luis", "Ana"]);

        assert!(matches!(contacts.mark_read(404, true).await, Err(StoreError::NotFound(_))));
        contacts.delete(first).await.unwrap();
        assert_eq!(contacts.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_watch_inbox() {
        let t = test_support::open().await;
        let contacts = t.db.contacts();
        let mut live = contacts.watch_all();
        assert!(live.next().await.unwrap().unwrap().is_empty());
        contacts.insert(&inquiry("Ana")).await.unwrap();
        assert_eq!(live.next().await.unwrap().unwrap().len(), 1);
    }
}
