use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::db::{Database, NewSnippet, Snippet};
use crate::error::{AppError, AppResult};

/// Display labels for the syntax highlighter of the UI layer, keyed by the
/// snippet's stored extension value.
static EXTENSION_LABELS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("python", ".py"),
        ("javascript", ".js"),
        ("typescript", ".ts"),
        ("html", ".html"),
        ("css", ".css"),
        ("sql", ".sql"),
        ("json", ".json"),
        ("markdown", ".md"),
        ("yaml", ".yml"),
        ("dockerfile", ".dockerfile"),
        ("shell", ".sh"),
        ("powershell", ".ps1"),
        ("rust", ".rs"),
        ("go", ".go"),
        ("cpp", ".cpp"),
        ("c", ".c"),
        ("java", ".java"),
        ("php", ".php"),
        ("ruby", ".rb"),
    ])
});

pub fn extension_label(extension: &str) -> Option<&'static str> {
    EXTENSION_LABELS.get(extension).copied()
}

/// Facade over the vault for everything the popup window does with snippets:
/// listing, searching, saving, editing, deleting, and bulk archiving.
pub struct SnippetStore {
    db: Arc<Database>,
}

impl SnippetStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn list(&self, snippet_type: Option<&str>, archived: bool) -> AppResult<Vec<Snippet>> {
        Ok(self.db.list_snippets(snippet_type, archived)?)
    }

    pub fn types(&self, archived: bool) -> AppResult<Vec<String>> {
        Ok(self.db.snippet_types(archived)?)
    }

    /// Case-insensitive substring search over the listing for the given
    /// archive state. An empty query returns the whole listing. A query
    /// containing `*` has the first `*` removed and matches content as well;
    /// a plain query matches name and description only.
    ///
    /// Snippet counts are small enough for a personal vault that filtering
    /// in memory beats maintaining a search index.
    pub fn search(&self, query: &str, archived: bool) -> AppResult<Vec<Snippet>> {
        let snippets = self.db.list_snippets(None, archived)?;
        if query.is_empty() {
            return Ok(snippets);
        }

        let (needle, match_content) = match query.find('*') {
            Some(pos) => {
                let mut stripped = query.to_string();
                stripped.remove(pos);
                (stripped.to_lowercase(), true)
            }
            None => (query.to_lowercase(), false),
        };

        Ok(snippets
            .into_iter()
            .filter(|snippet| {
                snippet.name.to_lowercase().contains(&needle)
                    || snippet.description.to_lowercase().contains(&needle)
                    || (match_content && snippet.content.to_lowercase().contains(&needle))
            })
            .collect())
    }

    pub fn save(&self, snippet: &NewSnippet<'_>) -> AppResult<Snippet> {
        if snippet.snippet_type.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "snippet type must not be empty".to_string(),
            ));
        }
        Ok(self.db.insert_snippet(snippet)?)
    }

    pub fn update(&self, id: i64, snippet: &NewSnippet<'_>) -> AppResult<Snippet> {
        if snippet.snippet_type.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "snippet type must not be empty".to_string(),
            ));
        }
        self.db.update_snippet(id, snippet)?.ok_or(AppError::NotFound)
    }

    pub fn delete(&self, id: i64) -> AppResult<Snippet> {
        self.db.delete_snippet(id)?.ok_or(AppError::NotFound)
    }

    pub fn archive_type(&self, snippet_type: &str) -> AppResult<usize> {
        Ok(self.db.archive_type(snippet_type)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SnippetStore {
        SnippetStore::new(Arc::new(Database::open_in_memory().expect("db init")))
    }

    fn seed(store: &SnippetStore, name: &str, description: &str, content: &str) -> Snippet {
        store
            .save(&NewSnippet {
                name,
                snippet_type: "notes",
                description,
                content,
                extension: None,
            })
            .expect("save")
    }

    #[test]
    fn empty_query_matches_unfiltered_listing() {
        let store = store();
        seed(&store, "one", "first", "alpha");
        seed(&store, "two", "second", "beta");

        let listed = store.list(None, false).expect("list");
        let searched = store.search("", false).expect("search");
        assert_eq!(listed, searched);
    }

    #[test]
    fn plain_query_matches_name_and_description_only() {
        let store = store();
        let by_name = seed(&store, "deploy helper", "misc", "nothing here");
        let by_description = seed(&store, "other", "redeploy steps", "nothing here");
        seed(&store, "hidden", "misc", "deploy inside content");

        let results = store.search("deploy", false).expect("search");
        let ids: Vec<i64> = results.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![by_name.id, by_description.id]);
    }

    #[test]
    fn wildcard_query_also_matches_content() {
        let store = store();
        seed(&store, "hidden", "misc", "deploy inside content");

        assert!(store.search("deploy", false).expect("plain").is_empty());
        let results = store.search("*deploy", false).expect("wildcard");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "hidden");
    }

    #[test]
    fn search_is_case_insensitive() {
        let store = store();
        seed(&store, "Git Rebase", "misc", "git rebase -i");

        let results = store.search("REBASE", false).expect("search");
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn search_respects_archive_state() {
        let store = store();
        seed(&store, "active", "visible", "alpha");
        seed(&store, "parked", "visible", "beta");
        store.archive_type("notes").expect("archive");

        assert!(store.search("visible", false).expect("default").is_empty());
        assert_eq!(store.search("visible", true).expect("archived").len(), 2);
    }

    #[test]
    fn save_rejects_empty_type() {
        let store = store();
        let result = store.save(&NewSnippet {
            name: "bad",
            snippet_type: "  ",
            description: "",
            content: "",
            extension: None,
        });
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn update_missing_snippet_is_not_found() {
        let store = store();
        let result = store.update(
            99,
            &NewSnippet {
                name: "ghost",
                snippet_type: "notes",
                description: "",
                content: "",
                extension: None,
            },
        );
        assert!(matches!(result, Err(AppError::NotFound)));
    }

    #[test]
    fn known_extensions_map_to_labels() {
        assert_eq!(extension_label("python"), Some(".py"));
        assert_eq!(extension_label("rust"), Some(".rs"));
        assert_eq!(extension_label("fortran"), None);
    }
}
