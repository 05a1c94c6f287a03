//! `PostgreSQL` repository storing work items as JSONB documents.

use super::models::DocumentRow;
use crate::sprint::{
    domain::{BacklogTask, Sprint, SprintId, UserStory, UserStoryId},
    ports::{
        ChangeSet, WorkItemKind, WorkItemRepository, WorkItemRepositoryError,
        WorkItemRepositoryResult,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sql_types::{Jsonb, Timestamptz, Varchar};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

/// `PostgreSQL` connection pool type used by work-item adapters.
pub type WorkItemPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed work-item repository.
///
/// Each collection is a table of `(id, document, updated_at)` rows. Listings
/// are ordered by id.
#[derive(Debug, Clone)]
pub struct PostgresWorkItemRepository {
    pool: WorkItemPgPool,
}

impl PostgresWorkItemRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: WorkItemPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> WorkItemRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> WorkItemRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(WorkItemRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(WorkItemRepositoryError::persistence)?
    }
}

/// Record type stored in one of the document collections.
pub(super) trait Document: Serialize + DeserializeOwned + Clone + Send + 'static {
    const KIND: WorkItemKind;

    fn key(&self) -> String;

    fn last_modified(&self) -> DateTime<Utc>;
}

impl Document for Sprint {
    const KIND: WorkItemKind = WorkItemKind::Sprint;

    fn key(&self) -> String {
        self.id().to_string()
    }

    fn last_modified(&self) -> DateTime<Utc> {
        self.updated_at()
    }
}

impl Document for UserStory {
    const KIND: WorkItemKind = WorkItemKind::UserStory;

    fn key(&self) -> String {
        self.id().to_string()
    }

    fn last_modified(&self) -> DateTime<Utc> {
        self.updated_at()
    }
}

impl Document for BacklogTask {
    const KIND: WorkItemKind = WorkItemKind::BacklogTask;

    fn key(&self) -> String {
        self.id().to_string()
    }

    fn last_modified(&self) -> DateTime<Utc> {
        self.updated_at()
    }
}

pub(super) fn encode<D: Document>(record: &D) -> WorkItemRepositoryResult<Value> {
    serde_json::to_value(record).map_err(WorkItemRepositoryError::persistence)
}

pub(super) fn decode<D: Document>(row: DocumentRow) -> WorkItemRepositoryResult<D> {
    let DocumentRow {
        id,
        document,
        updated_at,
    } = row;
    serde_json::from_value(document).map_err(|err| {
        tracing::warn!(
            collection = D::KIND.collection(),
            %id,
            %updated_at,
            error = %err,
            "undecodable work-item document"
        );
        WorkItemRepositoryError::persistence(err)
    })
}

fn list_documents<D: Document>(connection: &mut PgConnection) -> WorkItemRepositoryResult<Vec<D>> {
    let sql = format!(
        "SELECT id, document, updated_at FROM {} ORDER BY id",
        D::KIND.collection()
    );
    diesel::sql_query(sql)
        .load::<DocumentRow>(connection)
        .map_err(WorkItemRepositoryError::persistence)?
        .into_iter()
        .map(decode)
        .collect()
}

fn find_document<D: Document>(
    connection: &mut PgConnection,
    id: &str,
) -> WorkItemRepositoryResult<Option<D>> {
    let sql = format!(
        "SELECT id, document, updated_at FROM {} WHERE id = $1",
        D::KIND.collection()
    );
    diesel::sql_query(sql)
        .bind::<Varchar, _>(id)
        .get_result::<DocumentRow>(connection)
        .optional()
        .map_err(WorkItemRepositoryError::persistence)?
        .map(decode)
        .transpose()
}

fn insert_document<D: Document>(
    connection: &mut PgConnection,
    record: &D,
) -> WorkItemRepositoryResult<()> {
    let sql = format!(
        "INSERT INTO {} (id, document, updated_at) VALUES ($1, $2, $3)",
        D::KIND.collection()
    );
    let key = record.key();
    diesel::sql_query(sql)
        .bind::<Varchar, _>(key.as_str())
        .bind::<Jsonb, _>(encode(record)?)
        .bind::<Timestamptz, _>(record.last_modified())
        .execute(connection)
        .map_err(|err| match err {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                WorkItemRepositoryError::Duplicate {
                    kind: D::KIND,
                    id: key.clone(),
                }
            }
            _ => WorkItemRepositoryError::persistence(err),
        })?;
    Ok(())
}

fn replace_document<D: Document>(
    connection: &mut PgConnection,
    record: &D,
) -> WorkItemRepositoryResult<()> {
    let sql = format!(
        "UPDATE {} SET document = $2, updated_at = $3 WHERE id = $1",
        D::KIND.collection()
    );
    let key = record.key();
    let affected = diesel::sql_query(sql)
        .bind::<Varchar, _>(key.as_str())
        .bind::<Jsonb, _>(encode(record)?)
        .bind::<Timestamptz, _>(record.last_modified())
        .execute(connection)
        .map_err(WorkItemRepositoryError::persistence)?;
    if affected == 0 {
        return Err(WorkItemRepositoryError::NotFound {
            kind: D::KIND,
            id: key,
        });
    }
    Ok(())
}

/// Error carried out of a diesel transaction.
#[derive(Debug)]
enum CommitError {
    Repository(WorkItemRepositoryError),
    Diesel(DieselError),
}

impl From<DieselError> for CommitError {
    fn from(err: DieselError) -> Self {
        Self::Diesel(err)
    }
}

fn commit_changes(connection: &mut PgConnection, changes: &ChangeSet) -> WorkItemRepositoryResult<()> {
    connection
        .transaction::<_, CommitError, _>(|tx| {
            for sprint in changes.sprints() {
                replace_document(tx, sprint).map_err(CommitError::Repository)?;
            }
            for story in changes.user_stories() {
                replace_document(tx, story).map_err(CommitError::Repository)?;
            }
            for task in changes.backlog_tasks() {
                replace_document(tx, task).map_err(CommitError::Repository)?;
            }
            Ok(())
        })
        .map_err(|err| match err {
            CommitError::Repository(inner) => inner,
            CommitError::Diesel(inner) => WorkItemRepositoryError::persistence(inner),
        })
}

#[async_trait]
impl WorkItemRepository for PostgresWorkItemRepository {
    async fn list_sprints(&self) -> WorkItemRepositoryResult<Vec<Sprint>> {
        self.run_blocking(list_documents::<Sprint>).await
    }

    async fn find_sprint(&self, id: &SprintId) -> WorkItemRepositoryResult<Option<Sprint>> {
        let key = id.to_string();
        self.run_blocking(move |connection| find_document::<Sprint>(connection, &key))
            .await
    }

    async fn store_sprint(&self, sprint: &Sprint) -> WorkItemRepositoryResult<()> {
        let record = sprint.clone();
        self.run_blocking(move |connection| insert_document(connection, &record))
            .await
    }

    async fn update_sprint(&self, sprint: &Sprint) -> WorkItemRepositoryResult<()> {
        let record = sprint.clone();
        self.run_blocking(move |connection| replace_document(connection, &record))
            .await
    }

    async fn list_user_stories(&self) -> WorkItemRepositoryResult<Vec<UserStory>> {
        self.run_blocking(list_documents::<UserStory>).await
    }

    async fn find_user_story(
        &self,
        id: &UserStoryId,
    ) -> WorkItemRepositoryResult<Option<UserStory>> {
        let key = id.to_string();
        self.run_blocking(move |connection| find_document::<UserStory>(connection, &key))
            .await
    }

    async fn store_user_story(&self, story: &UserStory) -> WorkItemRepositoryResult<()> {
        let record = story.clone();
        self.run_blocking(move |connection| insert_document(connection, &record))
            .await
    }

    async fn list_backlog_tasks(&self) -> WorkItemRepositoryResult<Vec<BacklogTask>> {
        self.run_blocking(list_documents::<BacklogTask>).await
    }

    async fn store_backlog_task(&self, task: &BacklogTask) -> WorkItemRepositoryResult<()> {
        let record = task.clone();
        self.run_blocking(move |connection| insert_document(connection, &record))
            .await
    }

    async fn commit(&self, changes: &ChangeSet) -> WorkItemRepositoryResult<()> {
        if changes.is_empty() {
            return Ok(());
        }
        let owned = changes.clone();
        self.run_blocking(move |connection| commit_changes(connection, &owned))
            .await
    }
}
