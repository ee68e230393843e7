use crate::models::Comment;
use crate::thread::Thread;
use ahash::{AHashMap, AHashSet};
use time::Date;

/// A broken parent chain. Every variant indicates upstream data corruption;
/// day-level enumeration catches these, marks the comment processed, and
/// moves on so one bad record never aborts a whole day.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
    #[error("comment {id} has an invalid or no parent_id")]
    InvalidParentId { id: String },

    #[error("comment {id} references unknown parent {parent_id}")]
    UnknownParent { id: String, parent_id: String },

    #[error("comment {id} sits on a cyclic parent chain")]
    CyclicParentChain { id: String },
}

/// In-memory index over one or more days of comments: by id, by day, by
/// author, and children-by-parent. Additive only — indexing a new day never
/// clears previous entries, and re-adding an id overwrites its slot without
/// duplicating bucket entries.
#[derive(Default)]
pub struct CommentsIndex {
    comments_by_id: AHashMap<String, Comment>,
    comment_ids_by_dt_date: AHashMap<Date, Vec<String>>,
    comment_ids_by_author: AHashMap<String, Vec<String>>,
    comment_ids_by_parent: AHashMap<String, Vec<String>>,
}

impl CommentsIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(&self) -> usize {
        self.comments_by_id.len()
    }

    pub fn get(&self, id: &str) -> Option<&Comment> {
        self.comments_by_id.get(id)
    }

    pub fn comments(&self) -> impl Iterator<Item = &Comment> {
        self.comments_by_id.values()
    }

    /// True once `index_comments` has seen this day (used for lazy per-day
    /// loading by the store).
    pub fn has_day(&self, dt_date: Date) -> bool {
        self.comment_ids_by_dt_date.contains_key(&dt_date)
    }

    pub fn day_ids(&self, dt_date: Date) -> &[String] {
        self.comment_ids_by_dt_date.get(&dt_date).map_or(&[], Vec::as_slice)
    }

    pub fn author_ids(&self, author: &str) -> &[String] {
        self.comment_ids_by_author.get(author).map_or(&[], Vec::as_slice)
    }

    pub fn get_by_ids<'a, I>(&self, id_list: I) -> Vec<&Comment>
    where
        I: IntoIterator<Item = &'a String>,
    {
        id_list
            .into_iter()
            .filter_map(|id| self.comments_by_id.get(id))
            .collect()
    }

    /// Index a batch of comments. The day bucket is keyed by the comment's
    /// UTC calendar date. The children bucket is populated only when the
    /// parent is another comment (`t1_`), never the root submission.
    pub fn index_comments<I>(&mut self, comments: I)
    where
        I: IntoIterator<Item = Comment>,
    {
        for comment in comments {
            if self.comments_by_id.contains_key(&comment.id) {
                // Same id seen again: overwrite the slot. The buckets already
                // reference this id, so appending again would duplicate them.
                self.comments_by_id.insert(comment.id.clone(), comment);
                continue;
            }

            self.comment_ids_by_author
                .entry(comment.author.clone())
                .or_default()
                .push(comment.id.clone());

            self.comment_ids_by_dt_date
                .entry(comment.created_utc.date())
                .or_default()
                .push(comment.id.clone());

            if let Some(parent) = comment.parent_id.as_deref().and_then(|p| p.strip_prefix("t1_")) {
                self.comment_ids_by_parent
                    .entry(parent.to_string())
                    .or_default()
                    .push(comment.id.clone());
            }

            self.comments_by_id.insert(comment.id.clone(), comment);
        }
    }

    /// Find the top-level ancestor of any given comment: the one whose parent
    /// is the root submission. Returns the input comment if it's already
    /// top-level. Idempotent, and terminates in at most chain-depth steps;
    /// corrupt chains (no/invalid parent, dangling reference, cycle) fail
    /// with a typed error rather than a silent default.
    pub fn get_top_level_parent<'a>(&'a self, comment: &'a Comment) -> Result<&'a Comment, IndexError> {
        let mut seen: AHashSet<&str> = AHashSet::new();
        let mut current = comment;
        loop {
            if !seen.insert(current.id.as_str()) {
                return Err(IndexError::CyclicParentChain { id: current.id.clone() });
            }
            let parent_id = current.parent_id.as_deref().unwrap_or("");
            if parent_id.starts_with("t3_") {
                return Ok(current);
            }
            let Some(rest) = parent_id.strip_prefix("t1_") else {
                return Err(IndexError::InvalidParentId { id: current.id.clone() });
            };
            current = self.comments_by_id.get(rest).ok_or_else(|| IndexError::UnknownParent {
                id: current.id.clone(),
                parent_id: parent_id.to_string(),
            })?;
        }
    }

    /// Build the entire reply-tree containing `comment`, rooted at its
    /// top-level ancestor. Each comment in the thread is visited once via the
    /// children buckets.
    pub fn get_thread(&self, comment: &Comment) -> Result<Thread, IndexError> {
        tracing::debug!("building thread for comment {}", comment.id);
        let root = self.get_top_level_parent(comment)?;
        tracing::debug!("top level parent for comment {} is {}", comment.id, root.id);
        Ok(self.build_subtree(root, None))
    }

    fn build_subtree(&self, comment: &Comment, parent: Option<&str>) -> Thread {
        let mut thread = Thread::new(comment.clone(), parent.map(String::from));
        if let Some(child_ids) = self.comment_ids_by_parent.get(&comment.id) {
            for child_id in child_ids {
                if let Some(child) = self.comments_by_id.get(child_id) {
                    thread.children.push(self.build_subtree(child, Some(&comment.id)));
                }
            }
        }
        thread
    }
}
