//! Job-unique names for intermediate files.

use std::path::{Path, PathBuf};

use uuid::Uuid;

/// Directory and token from which every intermediate path of one job is derived.
///
/// Concurrent jobs get distinct tokens, so their files never collide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactScope {
    work_dir: PathBuf,
    stem: String,
    token: String,
}

impl ArtifactScope {
    /// Scope with a fresh random token.
    pub fn new(work_dir: impl Into<PathBuf>, stem: impl Into<String>) -> Self {
        let token = Uuid::new_v4().simple().to_string();
        Self::with_token(work_dir, stem, &token[..12])
    }

    /// Scope with an explicit token.
    pub fn with_token(
        work_dir: impl Into<PathBuf>,
        stem: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            work_dir: work_dir.into(),
            stem: stem.into(),
            token: token.into(),
        }
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Synthesized black segment.
    pub fn black_clip(&self) -> PathBuf {
        self.artifact("black", "mp4")
    }

    /// Concatenation manifest.
    pub fn concat_list(&self) -> PathBuf {
        self.artifact("concat", "txt")
    }

    /// Source video with the black segment appended.
    pub fn extended_video(&self) -> PathBuf {
        self.artifact("extended", "mp4")
    }

    /// Rendered preview window.
    pub fn preview_window(&self) -> PathBuf {
        self.artifact("preview", "mp4")
    }

    /// Stem for per-job files kept outside the work directory, such as the job log.
    pub fn job_stem(&self) -> String {
        format!("{}_{}", self.stem, self.token)
    }

    /// Whether `path` is a file this scope could have produced.
    pub fn owns(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        path.parent() == Some(self.work_dir.as_path())
            && name.starts_with(&format!("{}_", self.stem))
            && name.contains(&format!("_{}.", self.token))
    }

    fn artifact(&self, kind: &str, ext: &str) -> PathBuf {
        self.work_dir
            .join(format!("{}_{}_{}.{}", self.stem, kind, self.token, ext))
    }
}
