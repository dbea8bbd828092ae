use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Comment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Append a comment to the list and return its auto-generated ID.
///
/// `seq` is a monotonic counter stored on the owning `Task`, so ids stay
/// unique even if comments are ever dropped from the list.
pub fn add_comment(
    comments: &mut Vec<Comment>,
    seq: &mut u32,
    body: impl Into<String>,
    author: Option<String>,
) -> Comment {
    *seq += 1;
    let comment = Comment {
        id: format!("C{}", *seq),
        author,
        body: body.into(),
        created_at: Utc::now(),
    };
    comments.push(comment.clone());
    comment
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
