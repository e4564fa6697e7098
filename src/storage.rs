//! Crash-safe output files for ciphertext and plaintext written by the CLI.

use anyhow::{Context, Result};
use getrandom::fill;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A destination file that is only ever replaced whole.
#[derive(Debug, Clone)]
pub struct OutputFile {
    path: PathBuf,
}

impl OutputFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `data` to a sibling temp file, syncs it, then swaps it into
    /// place. Readers see either the previous contents or all of `data`.
    ///
    /// Missing parent directories are created.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory or the temporary file cannot be
    /// created, written or synced, or if the final replace fails. The temp
    /// file is removed when the replace fails.
    pub fn write(&self, data: &[u8]) -> Result<()> {
        if let Some(parent) = self.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let tmp_path = self.random_tmp_path()?;
        let mut tmp_file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&tmp_path)
            .context("failed to create temporary file")?;
        tmp_file.write_all(data)?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        if let Err(e) = self.replace_with(&tmp_path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        if let Some(parent) = self.parent() {
            File::open(parent)?.sync_all()?;
        }

        debug!(path = %self.path.display(), len = data.len(), "wrote output file");
        Ok(())
    }

    fn parent(&self) -> Option<&Path> {
        self.path.parent().filter(|p| !p.as_os_str().is_empty())
    }

    /// `<file name>.tmp.<16 random hex digits>` next to the target.
    fn random_tmp_path(&self) -> Result<PathBuf> {
        let mut suffix = [0u8; 8];
        fill(&mut suffix).map_err(|_| anyhow::anyhow!("OS random generator unavailable"))?;

        let file_name = self
            .path
            .file_name()
            .context("output path has no file name")?
            .to_string_lossy();

        Ok(self
            .path
            .with_file_name(format!("{file_name}.tmp.{}", hex::encode(suffix))))
    }

    /// `ReplaceFileW` with write-through when the target exists, a plain
    /// rename otherwise (`ReplaceFileW` needs an existing target).
    #[cfg(target_os = "windows")]
    fn replace_with(&self, tmp_path: &Path) -> Result<()> {
        use std::ffi::OsStr;
        use std::os::windows::ffi::OsStrExt;
        use windows_sys::Win32::Storage::FileSystem::{REPLACEFILE_WRITE_THROUGH, ReplaceFileW};

        if !self.path.exists() {
            fs::rename(tmp_path, &self.path).context("failed to move output into place")?;
            return Ok(());
        }

        fn wide(s: &OsStr) -> Vec<u16> {
            s.encode_wide().chain(std::iter::once(0)).collect()
        }
        let target = wide(self.path.as_os_str());
        let replacement = wide(tmp_path.as_os_str());

        // SAFETY: both buffers are NUL-terminated UTF-16 that outlive the
        // call, and the remaining pointer arguments are documented as optional.
        let ok = unsafe {
            ReplaceFileW(
                target.as_ptr(),
                replacement.as_ptr(),
                std::ptr::null(),
                REPLACEFILE_WRITE_THROUGH,
                std::ptr::null(),
                std::ptr::null(),
            )
        };
        if ok == 0 {
            return Err(std::io::Error::last_os_error()).context("atomic replace failed");
        }
        Ok(())
    }

    /// `rename()` is atomic within one filesystem, and the temp file is a sibling.
    #[cfg(not(target_os = "windows"))]
    fn replace_with(&self, tmp_path: &Path) -> Result<()> {
        fs::rename(tmp_path, &self.path).context("failed to move output into place")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn write_creates_file_with_data() {
        let dir = tempdir().unwrap();
        let out = OutputFile::new(dir.path().join("cipher.bin"));
        out.write(b"ciphertext").unwrap();
        assert_eq!(fs::read(out.path()).unwrap(), b"ciphertext");
    }

    #[test]
    fn write_replaces_previous_contents() {
        let dir = tempdir().unwrap();
        let out = OutputFile::new(dir.path().join("cipher.bin"));
        out.write(b"a much longer first version").unwrap();
        out.write(b"second").unwrap();
        assert_eq!(fs::read(out.path()).unwrap(), b"second");
    }

    #[test]
    fn no_temp_files_are_left_behind() {
        let dir = tempdir().unwrap();
        OutputFile::new(dir.path().join("out.bin"))
            .write(b"data")
            .unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec!["out.bin"]);
    }

    #[test]
    fn missing_parents_are_created() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("x").join("y").join("out.bin");
        OutputFile::new(&nested).write(b"data").unwrap();
        assert!(nested.exists());
    }

    #[test]
    fn tmp_paths_are_unique_siblings() {
        let dir = tempdir().unwrap();
        let out = OutputFile::new(dir.path().join("out.bin"));
        let a = out.random_tmp_path().unwrap();
        let b = out.random_tmp_path().unwrap();
        assert_ne!(a, b);
        assert_eq!(a.parent(), out.path().parent());
        assert!(a.to_string_lossy().contains("out.bin.tmp."));
    }
}
