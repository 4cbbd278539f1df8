use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Temporary documents and index directories for driving [`crate::try_run`].
pub struct TestDirs {
    temp: TempDir,
    pub documents: PathBuf,
    pub index: PathBuf,
}

impl TestDirs {
    pub fn new() -> Self {
        let temp = tempfile::tempdir().unwrap();
        let documents = temp.path().join("documents");
        let index = temp.path().join("index");
        Self { temp, documents, index }
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    /// Run `serene <args>` against these directories and return stdout.
    pub async fn run(&self, args: &[&str]) -> anyhow::Result<String> {
        let documents = self.documents.to_string_lossy().into_owned();
        let index = self.index.to_string_lossy().into_owned();
        let mut argv =
            vec!["serene", "--documents-dir", documents.as_str(), "--index-dir", index.as_str()];
        argv.extend_from_slice(args);

        let mut out = Vec::new();
        crate::try_run(&argv, &mut out).await?;
        Ok(String::from_utf8(out)?)
    }
}
