use crate::{
    error::{KanbanError, Result},
    swimlane::{self, Swimlane},
    task::Task,
};
use serde::Serialize;
use tantivy::{
    collector::TopDocs,
    query::QueryParser,
    schema::{Field, Schema, Value, STORED, STRING, TEXT},
    Index, IndexWriter, ReloadPolicy, TantivyDocument,
};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct TaskSearchResult {
    pub task_id: String,
    pub name: String,
    pub swimlane: String,
    pub priority: String,
    pub score: f32,
}

// ---------------------------------------------------------------------------
// TaskSearch
// ---------------------------------------------------------------------------

struct Fields {
    task_id: Field,
    name: Field,
    swimlane: Field,
    priority: Field,
    assignee: Field,
    description: Field,
    body: Field,
}

pub struct TaskSearch {
    index: Index,
    reader: tantivy::IndexReader,
    fields: Fields,
}

impl TaskSearch {
    /// Build an ephemeral in-RAM index over one project's tasks.
    ///
    /// Indexed fields:
    /// - `task_id`     STRING (exact-match, stored)
    /// - `name`        TEXT (tokenized, stored) - primary full-text field
    /// - `swimlane`    STRING (stored) - lane name, lowercased, for `swimlane:done`
    /// - `priority`    STRING (stored) - `priority:P0`
    /// - `assignee`    STRING - `assignee:alice`
    /// - `description` TEXT
    /// - `body`        TEXT - comments, commit hashes and messages, artifact names
    pub fn build(tasks: &[Task], lanes: &[Swimlane]) -> Result<Self> {
        let (schema, fields) = build_schema();

        let index = Index::create_in_ram(schema);

        let mut writer: IndexWriter = index
            .writer(15_000_000)
            .map_err(|e| KanbanError::Search(e.to_string()))?;

        for task in tasks {
            let lane_name = swimlane::find(lanes, &task.swimlane)
                .map(|l| l.name.to_lowercase())
                .unwrap_or_else(|| task.swimlane.clone());

            let mut doc = TantivyDocument::default();
            doc.add_text(fields.task_id, &task.id);
            doc.add_text(fields.name, &task.name);
            doc.add_text(fields.swimlane, &lane_name);
            doc.add_text(fields.priority, task.priority.as_str());
            if let Some(who) = &task.assigned_to {
                doc.add_text(fields.assignee, who);
            }
            if !task.description.is_empty() {
                doc.add_text(fields.description, &task.description);
            }

            let body_parts: Vec<&str> = task
                .comments
                .iter()
                .map(|c| c.body.as_str())
                .chain(task.commits.iter().map(|c| c.hash.as_str()))
                .chain(task.commits.iter().filter_map(|c| c.message.as_deref()))
                .chain(task.artifacts.iter().map(|a| a.name.as_str()))
                .chain(task.assigned_to.as_deref())
                .filter(|s| !s.is_empty())
                .collect();
            doc.add_text(fields.body, body_parts.join(" "));

            writer
                .add_document(doc)
                .map_err(|e| KanbanError::Search(e.to_string()))?;
        }

        writer
            .commit()
            .map_err(|e| KanbanError::Search(e.to_string()))?;

        // Manual reload: the only commit happened above.
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e: tantivy::TantivyError| KanbanError::Search(e.to_string()))?;

        Ok(Self {
            index,
            reader,
            fields,
        })
    }

    /// BM25 full-text search. Returns up to `limit` results sorted by score descending.
    ///
    /// Supported query syntax:
    /// - Bare terms: `login form`            (AND by default)
    /// - Phrase:     `"implement login"`
    /// - Boolean:    `login OR signup`, `auth NOT legacy`
    /// - Field scope: `priority:P0`, `swimlane:done`, `assignee:alice`
    /// - Prefix:     `login*`
    ///
    /// A query that fails to parse yields no results.
    pub fn search(&self, query_str: &str, limit: usize) -> Result<Vec<TaskSearchResult>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let searcher = self.reader.searcher();

        let default_fields = vec![self.fields.name, self.fields.description, self.fields.body];
        let mut parser = QueryParser::for_index(&self.index, default_fields);
        parser.set_conjunction_by_default();

        let query = match parser.parse_query(query_str) {
            Ok(q) => q,
            Err(e) => {
                tracing::debug!(query = query_str, error = %e, "unparseable search query");
                return Ok(vec![]);
            }
        };

        let top_docs = searcher
            .search(&query, &TopDocs::with_limit(limit))
            .map_err(|e| KanbanError::Search(e.to_string()))?;

        let mut results = Vec::with_capacity(top_docs.len());
        for (score, doc_addr) in top_docs {
            let doc: TantivyDocument = searcher
                .doc(doc_addr)
                .map_err(|e| KanbanError::Search(e.to_string()))?;

            let text = |field: Field| {
                doc.get_first(field)
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string()
            };

            results.push(TaskSearchResult {
                task_id: text(self.fields.task_id),
                name: text(self.fields.name),
                swimlane: text(self.fields.swimlane),
                priority: text(self.fields.priority),
                score,
            });
        }

        Ok(results)
    }
}

fn build_schema() -> (Schema, Fields) {
    let mut builder = Schema::builder();

    let task_id = builder.add_text_field("task_id", STRING | STORED);
    let name = builder.add_text_field("name", TEXT | STORED);
    let swimlane = builder.add_text_field("swimlane", STRING | STORED);
    let priority = builder.add_text_field("priority", STRING | STORED);
    let assignee = builder.add_text_field("assignee", STRING);
    let description = builder.add_text_field("description", TEXT);
    let body = builder.add_text_field("body", TEXT);

    let schema = builder.build();
    let fields = Fields {
        task_id,
        name,
        swimlane,
        priority,
        assignee,
        description,
        body,
    };
    (schema, fields)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comment::add_comment;
    use crate::config::Config;
    use crate::swimlane::from_templates;
    use crate::types::Priority;

    fn fixture() -> (Vec<Task>, Vec<Swimlane>) {
        let lanes = from_templates(&Config::default().default_swimlanes);
        let todo = lanes[0].id.clone();
        let done = lanes[2].id.clone();

        let mut login = Task::new("Implement login form", &todo, Priority::P0);
        login.description = "OAuth via the identity provider".into();
        login.assigned_to = Some("alice".into());

        let mut billing = Task::new("Billing export", &done, Priority::P2);
        billing.link_commit("deadbeef", Some("stripe webhook retry".into()), None);

        let mut docs = Task::new("Write onboarding docs", &todo, Priority::P3);
        add_comment(
            &mut docs.comments,
            &mut docs.next_comment_seq,
            "mention the kubernetes quickstart",
            None,
        );

        (vec![login, billing, docs], lanes)
    }

    #[test]
    fn search_by_name_word() {
        let (tasks, lanes) = fixture();
        let index = TaskSearch::build(&tasks, &lanes).unwrap();
        let results = index.search("login", 10).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Implement login form");
        assert_eq!(results[0].swimlane, "to do");
    }

    #[test]
    fn search_description_and_body() {
        let (tasks, lanes) = fixture();
        let index = TaskSearch::build(&tasks, &lanes).unwrap();
        assert_eq!(index.search("oauth", 10).unwrap().len(), 1);
        assert_eq!(index.search("stripe", 10).unwrap()[0].name, "Billing export");
        assert_eq!(
            index.search("kubernetes", 10).unwrap()[0].name,
            "Write onboarding docs"
        );
    }

    #[test]
    fn search_field_scoped() {
        let (tasks, lanes) = fixture();
        let index = TaskSearch::build(&tasks, &lanes).unwrap();
        assert_eq!(index.search("priority:P0", 10).unwrap().len(), 1);
        assert_eq!(index.search("swimlane:done", 10).unwrap().len(), 1);
        assert_eq!(index.search("assignee:alice", 10).unwrap().len(), 1);
    }

    #[test]
    fn search_respects_limit() {
        let (tasks, lanes) = fixture();
        let index = TaskSearch::build(&tasks, &lanes).unwrap();
        let results = index.search("login OR billing OR onboarding", 2).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].score >= results[1].score);
    }

    #[test]
    fn search_no_match_and_bad_query() {
        let (tasks, lanes) = fixture();
        let index = TaskSearch::build(&tasks, &lanes).unwrap();
        assert!(index.search("helicopter", 10).unwrap().is_empty());
        assert!(index.search("name:(", 10).unwrap().is_empty());
    }

    #[test]
    fn search_empty_index() {
        let index = TaskSearch::build(&[], &[]).unwrap();
        assert!(index.search("anything", 10).unwrap().is_empty());
    }
}
