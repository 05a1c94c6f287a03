//! In-memory repository for sprint, story and task documents.

use crate::sprint::{
    domain::{BacklogTask, BacklogTaskId, Sprint, SprintId, UserStory, UserStoryId},
    ports::{
        ChangeSet, WorkItemKind, WorkItemRepository, WorkItemRepositoryError,
        WorkItemRepositoryResult,
    },
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Thread-safe in-memory work-item repository.
///
/// Listings preserve insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorkItemRepository {
    state: Arc<RwLock<InMemoryWorkItemState>>,
}

#[derive(Debug, Default)]
struct InMemoryWorkItemState {
    sprints: Collection<SprintId, Sprint>,
    user_stories: Collection<UserStoryId, UserStory>,
    backlog_tasks: Collection<BacklogTaskId, BacklogTask>,
}

#[derive(Debug)]
struct Collection<K, V> {
    records: HashMap<K, V>,
    order: Vec<K>,
}

impl<K, V> Default for Collection<K, V> {
    fn default() -> Self {
        Self {
            records: HashMap::new(),
            order: Vec::new(),
        }
    }
}

impl<K: Clone + Eq + Hash, V: Clone> Collection<K, V> {
    fn list(&self) -> Vec<V> {
        self.order
            .iter()
            .filter_map(|key| self.records.get(key).cloned())
            .collect()
    }

    fn get(&self, key: &K) -> Option<V> {
        self.records.get(key).cloned()
    }

    fn contains(&self, key: &K) -> bool {
        self.records.contains_key(key)
    }

    fn insert_new(&mut self, key: K, value: V) -> bool {
        if self.records.contains_key(&key) {
            return false;
        }
        self.order.push(key.clone());
        self.records.insert(key, value);
        true
    }

    fn replace(&mut self, key: K, value: V) -> bool {
        match self.records.get_mut(&key) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

impl InMemoryWorkItemRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> WorkItemRepositoryResult<RwLockReadGuard<'_, InMemoryWorkItemState>> {
        self.state.read().map_err(|err| {
            WorkItemRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> WorkItemRepositoryResult<RwLockWriteGuard<'_, InMemoryWorkItemState>> {
        self.state.write().map_err(|err| {
            WorkItemRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

fn duplicate(kind: WorkItemKind, id: &impl ToString) -> WorkItemRepositoryError {
    WorkItemRepositoryError::Duplicate {
        kind,
        id: id.to_string(),
    }
}

/// Checks every record of the change set exists before anything is written.
fn ensure_all_exist(
    state: &InMemoryWorkItemState,
    changes: &ChangeSet,
) -> WorkItemRepositoryResult<()> {
    if let Some(missing) = changes
        .sprints()
        .iter()
        .find(|sprint| !state.sprints.contains(sprint.id()))
    {
        return Err(WorkItemRepositoryError::sprint_not_found(missing.id()));
    }
    if let Some(missing) = changes
        .user_stories()
        .iter()
        .find(|story| !state.user_stories.contains(story.id()))
    {
        return Err(WorkItemRepositoryError::user_story_not_found(missing.id()));
    }
    if let Some(missing) = changes
        .backlog_tasks()
        .iter()
        .find(|task| !state.backlog_tasks.contains(task.id()))
    {
        return Err(WorkItemRepositoryError::backlog_task_not_found(missing.id()));
    }
    Ok(())
}

#[async_trait]
impl WorkItemRepository for InMemoryWorkItemRepository {
    async fn list_sprints(&self) -> WorkItemRepositoryResult<Vec<Sprint>> {
        Ok(self.read()?.sprints.list())
    }

    async fn find_sprint(&self, id: &SprintId) -> WorkItemRepositoryResult<Option<Sprint>> {
        Ok(self.read()?.sprints.get(id))
    }

    async fn store_sprint(&self, sprint: &Sprint) -> WorkItemRepositoryResult<()> {
        let mut state = self.write()?;
        if !state.sprints.insert_new(sprint.id().clone(), sprint.clone()) {
            return Err(duplicate(WorkItemKind::Sprint, sprint.id()));
        }
        Ok(())
    }

    async fn update_sprint(&self, sprint: &Sprint) -> WorkItemRepositoryResult<()> {
        let mut state = self.write()?;
        if !state.sprints.replace(sprint.id().clone(), sprint.clone()) {
            return Err(WorkItemRepositoryError::sprint_not_found(sprint.id()));
        }
        Ok(())
    }

    async fn list_user_stories(&self) -> WorkItemRepositoryResult<Vec<UserStory>> {
        Ok(self.read()?.user_stories.list())
    }

    async fn find_user_story(
        &self,
        id: &UserStoryId,
    ) -> WorkItemRepositoryResult<Option<UserStory>> {
        Ok(self.read()?.user_stories.get(id))
    }

    async fn store_user_story(&self, story: &UserStory) -> WorkItemRepositoryResult<()> {
        let mut state = self.write()?;
        if !state.user_stories.insert_new(story.id().clone(), story.clone()) {
            return Err(duplicate(WorkItemKind::UserStory, story.id()));
        }
        Ok(())
    }

    async fn list_backlog_tasks(&self) -> WorkItemRepositoryResult<Vec<BacklogTask>> {
        Ok(self.read()?.backlog_tasks.list())
    }

    async fn store_backlog_task(&self, task: &BacklogTask) -> WorkItemRepositoryResult<()> {
        let mut state = self.write()?;
        if !state.backlog_tasks.insert_new(task.id().clone(), task.clone()) {
            return Err(duplicate(WorkItemKind::BacklogTask, task.id()));
        }
        Ok(())
    }

    async fn commit(&self, changes: &ChangeSet) -> WorkItemRepositoryResult<()> {
        let mut state = self.write()?;
        ensure_all_exist(&state, changes)?;

        for sprint in changes.sprints() {
            state.sprints.replace(sprint.id().clone(), sprint.clone());
        }
        for story in changes.user_stories() {
            state.user_stories.replace(story.id().clone(), story.clone());
        }
        for task in changes.backlog_tasks() {
            state.backlog_tasks.replace(task.id().clone(), task.clone());
        }
        Ok(())
    }
}
