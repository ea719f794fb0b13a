pub const CREATE_SNIPPETS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS snippets (
  id INTEGER PRIMARY KEY,
  name TEXT NOT NULL,
  type TEXT NOT NULL CHECK (length(type) > 0),
  description TEXT NOT NULL,
  content TEXT NOT NULL,
  extension TEXT,
  archived TEXT CHECK (archived IS NULL OR archived IN ('Y', 'N'))
);
"#;

pub const CREATE_HOTKEYS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS hotkeys (
  id INTEGER PRIMARY KEY CHECK (id = 1),
  hotkey TEXT NOT NULL
);
"#;

pub const CREATE_DEFAULT_THEME_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS default_theme (
  id INTEGER PRIMARY KEY CHECK (id = 1),
  theme TEXT NOT NULL
);
"#;

pub const CREATE_RELEASE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS release (
  release TEXT NOT NULL,
  lst_updt_ts DATE NOT NULL
);
"#;

pub const CREATE_INDEX_TYPE: &str =
    "CREATE INDEX IF NOT EXISTS idx_snippets_type ON snippets(type);";
