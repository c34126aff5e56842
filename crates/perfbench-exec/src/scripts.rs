//! Shell and SQL script assets

use crate::error::ScriptError;
use perfbench_report::CommandKind;
use std::path::{Path, PathBuf};

/// Two fixed directories holding script bodies, addressed by file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptStore {
    shell_dir: PathBuf,
    sql_dir: PathBuf,
}

impl ScriptStore {
    /// Create a store over the given directories
    #[must_use]
    pub fn new(shell_dir: impl Into<PathBuf>, sql_dir: impl Into<PathBuf>) -> Self {
        Self {
            shell_dir: shell_dir.into(),
            sql_dir: sql_dir.into(),
        }
    }

    /// Shell scripts directory
    #[inline]
    #[must_use]
    pub fn shell_dir(&self) -> &Path {
        &self.shell_dir
    }

    /// SQL scripts directory
    #[inline]
    #[must_use]
    pub fn sql_dir(&self) -> &Path {
        &self.sql_dir
    }

    /// Full path of a script, `None` for callback commands
    #[must_use]
    pub fn resolve(&self, kind: CommandKind, name: &str) -> Option<PathBuf> {
        match kind {
            CommandKind::Shell => Some(self.shell_dir.join(name)),
            CommandKind::Sql => Some(self.sql_dir.join(name)),
            CommandKind::Python => None,
        }
    }

    /// Read a shell script body
    ///
    /// # Errors
    /// Returns [`ScriptError`] when the file is missing or unreadable.
    pub async fn shell(&self, name: &str) -> Result<String, ScriptError> {
        read_script(self.shell_dir.join(name)).await
    }

    /// Read a SQL script body
    ///
    /// # Errors
    /// Returns [`ScriptError`] when the file is missing or unreadable.
    pub async fn sql(&self, name: &str) -> Result<String, ScriptError> {
        read_script(self.sql_dir.join(name)).await
    }
}

async fn read_script(path: PathBuf) -> Result<String, ScriptError> {
    match tokio::fs::read_to_string(&path).await {
        Ok(text) => Ok(text),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            Err(ScriptError::NotFound { path })
        }
        Err(source) => Err(ScriptError::Read { path, source }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_script_by_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("uname.sh"), "uname -a").unwrap();
        let store = ScriptStore::new(dir.path(), dir.path());
        assert_eq!(store.shell("uname.sh").await.unwrap(), "uname -a");
    }

    #[tokio::test]
    async fn missing_script_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = ScriptStore::new(dir.path(), dir.path());
        let err = store.sql("absent.sql").await.unwrap_err();
        assert!(matches!(err, ScriptError::NotFound { ref path } if path.ends_with("absent.sql")));
    }

    #[test]
    fn callbacks_have_no_script_path() {
        let store = ScriptStore::new("/sh", "/sql");
        assert_eq!(
            store.resolve(CommandKind::Sql, "a.sql"),
            Some(PathBuf::from("/sql/a.sql"))
        );
        assert_eq!(store.resolve(CommandKind::Python, "args"), None);
    }
}
