//! Static configuration tables loaded from JSON files.
//!
//! Each record type declares the file tag it is loaded from and its primary
//! key. At startup [`ConfigTables::load_dir`] walks a directory, matches each
//! file by the part of its name before the first `.`, and parses the JSON
//! array inside into a keyed [`Table`]:
//!
//! ```text
//! cfg/
//! ├── item.json      -> Table<Item>   keyed by Item::id
//! ├── monster.json   -> Table<Monster>
//! └── notes.txt      -> no table registered, skipped
//! ```
//!
//! # Example
//!
//! ```
//! use leafwire::tables::{ConfigTables, TableRecord};
//!
//! #[derive(Debug, serde::Deserialize)]
//! struct Item {
//!     id: u32,
//!     name: String,
//! }
//!
//! impl TableRecord for Item {
//!     const FILE: &'static str = "item";
//!     type Key = u32;
//!
//!     fn key(&self) -> u32 {
//!         self.id
//!     }
//! }
//!
//! let mut tables = ConfigTables::new();
//! tables.register::<Item>().unwrap();
//! tables
//!     .load_str("item", r#"[{"id": 1, "name": "sword"}]"#)
//!     .unwrap();
//! assert_eq!(tables.get::<Item>().unwrap().get(&1).unwrap().name, "sword");
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;
use walkdir::WalkDir;

/// Errors raised while registering or loading tables.
///
/// All of them are startup errors.
#[derive(Debug, Error)]
pub enum TableError {
    /// Directory or file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// Offending path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// File is not a JSON array of the record type.
    #[error("failed to parse {source_name}: {source}")]
    Json {
        /// File path or tag.
        source_name: String,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// A record's primary key has its zero value.
    #[error("{source_name}: record {index} of {type_name} has an unset primary key")]
    ZeroKey {
        /// File path or tag.
        source_name: String,
        /// Record type.
        type_name: &'static str,
        /// Position in the array.
        index: usize,
    },

    /// Two record types claim the same file tag.
    #[error("file tag {tag:?} already registered to {existing}")]
    DuplicateTag {
        /// File tag.
        tag: &'static str,
        /// Type already registered for it.
        existing: &'static str,
    },

    /// No table registered for the tag.
    #[error("no table registered for file tag {0:?}")]
    NotRegistered(String),
}

/// A record type loadable from a JSON table file.
pub trait TableRecord: DeserializeOwned + Send + Sync + 'static {
    /// File tag (file name without extension).
    const FILE: &'static str;

    /// Primary key type. Its `Default` value means "unset".
    type Key: Eq + Hash + Default + Clone + fmt::Debug + Send + Sync + 'static;

    /// Primary key of this record.
    fn key(&self) -> Self::Key;
}

/// Records of one type keyed by primary key.
pub struct Table<R: TableRecord> {
    rows: HashMap<R::Key, R>,
}

impl<R: TableRecord> Table<R> {
    fn new() -> Self {
        Self {
            rows: HashMap::new(),
        }
    }

    /// Record with primary key `key`.
    pub fn get(&self, key: &R::Key) -> Option<&R> {
        self.rows.get(key)
    }

    /// Whether `key` is present.
    pub fn contains(&self, key: &R::Key) -> bool {
        self.rows.contains_key(key)
    }

    /// Iterate over all records.
    pub fn iter(&self) -> impl Iterator<Item = (&R::Key, &R)> {
        self.rows.iter()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<R: TableRecord> fmt::Debug for Table<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("type", &std::any::type_name::<R>())
            .field("rows", &self.rows.len())
            .finish()
    }
}

trait ErasedTable: Send + Sync {
    fn load(&mut self, source_name: &str, data: &[u8]) -> Result<usize, TableError>;
    fn type_name(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
}

impl<R: TableRecord> ErasedTable for Table<R> {
    fn load(&mut self, source_name: &str, data: &[u8]) -> Result<usize, TableError> {
        let records: Vec<R> =
            serde_json::from_slice(data).map_err(|source| TableError::Json {
                source_name: source_name.to_string(),
                source,
            })?;

        // Validate before touching the table so a bad file leaves it intact
        let zero = R::Key::default();
        if let Some(index) = records.iter().position(|r| r.key() == zero) {
            return Err(TableError::ZeroKey {
                source_name: source_name.to_string(),
                type_name: std::any::type_name::<R>(),
                index,
            });
        }

        let count = records.len();
        for record in records {
            if let Some(previous) = self.rows.insert(record.key(), record) {
                tracing::warn!(
                    source = source_name,
                    key = ?previous.key(),
                    "duplicate primary key, keeping last record"
                );
            }
        }
        Ok(count)
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<R>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Registry of static configuration tables, keyed by file tag.
#[derive(Default)]
pub struct ConfigTables {
    tables: HashMap<&'static str, Box<dyn ErasedTable>>,
}

impl ConfigTables {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a record type under its file tag.
    pub fn register<R: TableRecord>(&mut self) -> Result<(), TableError> {
        if let Some(existing) = self.tables.get(R::FILE) {
            return Err(TableError::DuplicateTag {
                tag: R::FILE,
                existing: existing.type_name(),
            });
        }
        self.tables.insert(R::FILE, Box::new(Table::<R>::new()));
        Ok(())
    }

    /// Table for `R`, if registered.
    pub fn get<R: TableRecord>(&self) -> Option<&Table<R>> {
        self.tables
            .get(R::FILE)
            .and_then(|t| t.as_any().downcast_ref::<Table<R>>())
    }

    /// Registered file tags.
    pub fn tags(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.tables.keys().copied()
    }

    /// Load JSON text into the table registered for `tag`.
    ///
    /// Returns the number of records read.
    pub fn load_str(&mut self, tag: &str, json: &str) -> Result<usize, TableError> {
        let table = self
            .tables
            .get_mut(tag)
            .ok_or_else(|| TableError::NotRegistered(tag.to_string()))?;
        table.load(tag, json.as_bytes())
    }

    /// Load every matching file under `dir`, recursively.
    ///
    /// Files whose tag has no registered table are logged and skipped.
    /// Symbolic links are not followed. Returns the number of files loaded.
    pub fn load_dir(&mut self, dir: impl AsRef<Path>) -> Result<usize, TableError> {
        let files = collect_files(dir.as_ref())?;

        let mut loaded = 0;
        for path in files {
            if self.load_file(&path)? {
                loaded += 1;
            }
        }
        Ok(loaded)
    }

    /// Load one file. Returns `false` if no table matches it.
    pub fn load_file(&mut self, path: &Path) -> Result<bool, TableError> {
        let tag = file_tag(path);
        let Some(table) = self.tables.get_mut(tag.as_str()) else {
            tracing::info!(path = %path.display(), tag = %tag, "no table registered, skipping");
            return Ok(false);
        };

        let data = std::fs::read(path).map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let count = table.load(&path.display().to_string(), &data)?;
        tracing::debug!(path = %path.display(), records = count, "loaded table");
        Ok(true)
    }
}

impl fmt::Debug for ConfigTables {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.tables.iter().map(|(tag, t)| (tag, t.type_name())))
            .finish()
    }
}

/// File name up to the first `.`.
fn file_tag(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy())
        .and_then(|name| name.split('.').next().map(str::to_string))
        .unwrap_or_default()
}

fn collect_files(dir: &Path) -> Result<Vec<PathBuf>, TableError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|err| {
            let path = err.path().unwrap_or(dir).to_path_buf();
            TableError::Io {
                path,
                source: err.into(),
            }
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::fs;

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct Item {
        id: u32,
        name: String,
        price: u32,
    }

    impl TableRecord for Item {
        const FILE: &'static str = "item";
        type Key = u32;

        fn key(&self) -> u32 {
            self.id
        }
    }

    #[derive(Debug, Deserialize)]
    struct Monster {
        code: String,
        hp: i64,
    }

    impl TableRecord for Monster {
        const FILE: &'static str = "monster";
        type Key = String;

        fn key(&self) -> String {
            self.code.clone()
        }
    }

    #[derive(Debug, Deserialize)]
    struct OtherItem {
        id: u32,
    }

    impl TableRecord for OtherItem {
        const FILE: &'static str = "item";
        type Key = u32;

        fn key(&self) -> u32 {
            self.id
        }
    }

    fn tables() -> ConfigTables {
        let mut tables = ConfigTables::new();
        tables.register::<Item>().unwrap();
        tables.register::<Monster>().unwrap();
        tables
    }

    #[test]
    fn test_load_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("item.json"),
            r#"[{"id": 1, "name": "sword", "price": 10}, {"id": 2, "name": "shield", "price": 7}]"#,
        )
        .unwrap();
        fs::create_dir(dir.path().join("npc")).unwrap();
        fs::write(
            dir.path().join("npc").join("monster.json"),
            r#"[{"code": "orc", "hp": 30}]"#,
        )
        .unwrap();
        fs::write(dir.path().join("readme.txt"), "not a table").unwrap();

        let mut tables = tables();
        assert_eq!(tables.load_dir(dir.path()).unwrap(), 2);

        let items = tables.get::<Item>().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items.get(&2).unwrap().name, "shield");
        assert!(items.get(&3).is_none());

        let monsters = tables.get::<Monster>().unwrap();
        assert_eq!(monsters.get(&"orc".to_string()).unwrap().hp, 30);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_dir_cycle_loads_once() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("item.json"),
            r#"[{"id": 4, "name": "bow", "price": 9}]"#,
        )
        .unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        std::os::unix::fs::symlink(dir.path(), dir.path().join("sub").join("loop")).unwrap();

        let mut tables = tables();
        assert_eq!(tables.load_dir(dir.path()).unwrap(), 1);
        assert_eq!(tables.get::<Item>().unwrap().len(), 1);
    }

    #[test]
    fn test_tag_is_name_before_first_dot() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("item.v2.json"),
            r#"[{"id": 5, "name": "axe", "price": 3}]"#,
        )
        .unwrap();

        let mut tables = tables();
        assert_eq!(tables.load_dir(dir.path()).unwrap(), 1);
        assert!(tables.get::<Item>().unwrap().contains(&5));
    }

    #[test]
    fn test_zero_key_is_fatal() {
        let mut tables = tables();
        let err = tables
            .load_str("item", r#"[{"id": 3, "name": "a", "price": 1}, {"id": 0, "name": "b", "price": 1}]"#)
            .unwrap_err();
        assert!(matches!(err, TableError::ZeroKey { index: 1, .. }));

        // Nothing from the rejected file was kept
        assert!(tables.get::<Item>().unwrap().is_empty());

        let err = tables
            .load_str("monster", r#"[{"code": "", "hp": 1}]"#)
            .unwrap_err();
        assert!(matches!(err, TableError::ZeroKey { .. }));
    }

    #[test]
    fn test_parse_error_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("item.json"), r#"{"id": 1}"#).unwrap();

        let mut tables = tables();
        let err = tables.load_dir(dir.path()).unwrap_err();
        assert!(matches!(err, TableError::Json { .. }));
        assert!(err.to_string().contains("item.json"));
    }

    #[test]
    fn test_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = tables().load_dir(dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, TableError::Io { .. }));
    }

    #[test]
    fn test_duplicate_tag_rejected() {
        let mut tables = tables();
        let err = tables.register::<OtherItem>().unwrap_err();
        assert!(matches!(err, TableError::DuplicateTag { tag: "item", .. }));
        assert!(tables.get::<OtherItem>().is_none());
    }

    #[test]
    fn test_unregistered_tag() {
        let err = tables().load_str("quest", "[]").unwrap_err();
        assert!(matches!(err, TableError::NotRegistered(tag) if tag == "quest"));
    }

    #[test]
    fn test_later_duplicate_key_wins() {
        let mut tables = tables();
        tables
            .load_str(
                "item",
                r#"[{"id": 1, "name": "old", "price": 1}, {"id": 1, "name": "new", "price": 2}]"#,
            )
            .unwrap();
        let items = tables.get::<Item>().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items.get(&1).unwrap().name, "new");
    }

    #[test]
    fn test_tags() {
        let mut tags: Vec<_> = tables().tags().collect();
        tags.sort();
        assert_eq!(tags, vec!["item", "monster"]);
    }
}
