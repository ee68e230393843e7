use crate::models::Comment;
use time::format_description::well_known::Rfc3339;

/// A reconstructed reply-tree node. Children are owned; the upward reference
/// is the parent node's comment id only, so a subtree can be dropped without
/// touching its ancestor chain. Threads are ephemeral snapshots built from
/// the index per query, never persisted as live objects.
#[derive(Clone, Debug)]
pub struct Thread {
    pub comment: Comment,
    pub parent: Option<String>,
    pub children: Vec<Thread>,
}

impl Thread {
    pub fn new(comment: Comment, parent: Option<String>) -> Self {
        Self { comment, parent, children: Vec::new() }
    }

    /// Depth-first ids of every comment in the subtree.
    pub fn get_comment_ids(&self) -> Vec<String> {
        let mut ids = vec![self.comment.id.clone()];
        for child in &self.children {
            ids.extend(child.get_comment_ids());
        }
        ids
    }

    /// Total character count of all comment bodies in the subtree.
    pub fn get_size(&self) -> usize {
        self.comment.body.chars().count() + self.children.iter().map(Thread::get_size).sum::<usize>()
    }

    /// Integer-truncated recursive average: own score plus each child
    /// subtree's already-averaged score, divided by (child count + 1).
    /// NOTE: this is not the true mean over all descendants — deep subtrees
    /// are weighted the same as single replies. Kept for compatibility with
    /// historical outputs; see `true_mean_score` for the unbiased figure.
    pub fn get_avg_score(&self) -> i64 {
        let mut total = self.comment.score;
        for child in &self.children {
            total += child.get_avg_score();
        }
        total / (self.children.len() as i64 + 1)
    }

    /// Unweighted mean score across every comment in the subtree.
    pub fn true_mean_score(&self) -> f64 {
        let (sum, count) = self.score_sum_and_count();
        sum as f64 / count as f64
    }

    fn score_sum_and_count(&self) -> (i64, usize) {
        let mut sum = self.comment.score;
        let mut count = 1;
        for child in &self.children {
            let (s, c) = child.score_sum_and_count();
            sum += s;
            count += c;
        }
        (sum, count)
    }

    /// Indented plaintext rendering for prompt construction. The timestamp
    /// header appears only at the top call (`layer == 0`).
    pub fn to_slim_text(&self, layer: usize) -> String {
        let mut out = String::new();
        if layer == 0 {
            let ts = self.comment.created_utc.format(&Rfc3339).unwrap_or_default();
            out.push_str(&format!("[{ts}]\n"));
        }
        let indent = "  ".repeat(layer);
        let flair = self.comment.author_flair_text.as_deref().unwrap_or("");
        out.push_str(&format!("{indent}{} ({flair}): {}\n", self.comment.author, self.comment.body));
        for child in &self.children {
            out.push_str(&child.to_slim_text(layer + 1));
        }
        out
    }

    /// Recursive membership test by comment id.
    pub fn contains(&self, comment: &Comment) -> bool {
        self.comment.id == comment.id || self.children.iter().any(|c| c.contains(comment))
    }
}
