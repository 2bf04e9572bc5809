//! Icon extraction from self-extracting AppImages.
use std::collections::VecDeque;
use std::fs;
use std::io::Read as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::DesktopError;
use crate::exec::Executor;
use crate::resources::helpers::fs::ensure_parent_dir;

/// Offset of the AppImage magic within the ELF header padding.
const MAGIC_OFFSET: usize = 8;

/// Type 2 AppImage magic: `AI` followed by the format version.
const TYPE2_MAGIC: &[u8; 3] = b"AI\x02";

/// Directory the AppImage runtime extracts into.
const EXTRACT_ROOT: &str = "squashfs-root";

/// Pulls an application icon out of an installed artifact.
pub trait IconExtractor: Send + Sync + std::fmt::Debug {
    /// Extract an icon from `artifact` and store it at `dest`.
    ///
    /// # Errors
    ///
    /// Returns [`DesktopError::IconExtraction`] if no icon could be stored.
    fn extract(&self, artifact: &Path, dest: &Path) -> Result<(), DesktopError>;
}

/// Check for the type 2 AppImage magic, which marks support for
/// `--appimage-extract`.
#[must_use]
pub fn is_self_extracting(artifact: &Path) -> bool {
    let mut header = [0_u8; MAGIC_OFFSET + TYPE2_MAGIC.len()];
    fs::File::open(artifact)
        .and_then(|mut f| f.read_exact(&mut header))
        .is_ok()
        && header.get(MAGIC_OFFSET..) == Some(TYPE2_MAGIC.as_slice())
}

/// Return the first `.png` under `root`, breadth-first with each directory
/// visited in sorted order. Broken links are skipped.
#[must_use]
pub fn find_first_png(root: &Path) -> Option<PathBuf> {
    let mut queue = VecDeque::from([root.to_path_buf()]);
    while let Some(dir) = queue.pop_front() {
        let Ok(read) = fs::read_dir(&dir) else {
            continue;
        };
        let mut entries: Vec<PathBuf> = read.filter_map(|e| e.ok().map(|e| e.path())).collect();
        entries.sort();

        for path in entries {
            let is_png = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
            if is_png && path.is_file() {
                return Some(path);
            }
            let is_real_dir = path
                .symlink_metadata()
                .is_ok_and(|m| m.file_type().is_dir());
            if is_real_dir {
                queue.push_back(path);
            }
        }
    }
    None
}

/// [`IconExtractor`] that asks the AppImage runtime to unpack its PNGs into
/// a scratch directory.
#[derive(Debug, Clone)]
pub struct AppImageIconExtractor {
    executor: Arc<dyn Executor>,
}

impl AppImageIconExtractor {
    /// Create an extractor that runs artifacts through `executor`.
    #[must_use]
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self { executor }
    }
}

impl IconExtractor for AppImageIconExtractor {
    fn extract(&self, artifact: &Path, dest: &Path) -> Result<(), DesktopError> {
        let fail = DesktopError::IconExtraction;

        if !is_self_extracting(artifact) {
            return Err(fail(format!(
                "{} is not a type 2 AppImage",
                artifact.display()
            )));
        }

        // Removed on drop, whichever way this function returns.
        let scratch = tempfile::Builder::new()
            .prefix("orca-nightly-icon-")
            .tempdir()
            .map_err(|e| fail(format!("cannot create scratch directory: {e}")))?;

        self.executor
            .run_in(scratch.path(), artifact, &["--appimage-extract", "*.png"])
            .map_err(|e| fail(format!("{e:#}")))?;

        let png = find_first_png(&scratch.path().join(EXTRACT_ROOT))
            .ok_or_else(|| fail("artifact contains no PNG".to_string()))?;

        ensure_parent_dir(dest).map_err(|e| fail(format!("{e:#}")))?;
        fs::copy(&png, dest)
            .map_err(|e| fail(format!("copy {} to {}: {e}", png.display(), dest.display())))?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::exec::fake::FakeExecutor;

    fn write_appimage(path: &Path) {
        let mut bytes = b"\x7fELF\x02\x01\x01\x00AI\x02".to_vec();
        bytes.extend_from_slice(&[0; 32]);
        fs::write(path, bytes).unwrap();
    }

    #[test]
    fn magic_is_detected_at_offset_eight() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.AppImage");
        write_appimage(&good);
        let bad = dir.path().join("bad.AppImage");
        fs::write(&bad, b"\x7fELF\x02\x01\x01\x00AI\x01rest").unwrap();
        let short = dir.path().join("short");
        fs::write(&short, b"AI").unwrap();

        assert!(is_self_extracting(&good));
        assert!(!is_self_extracting(&bad));
        assert!(!is_self_extracting(&short));
        assert!(!is_self_extracting(&dir.path().join("missing")));
    }

    #[test]
    fn first_png_is_breadth_first_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("usr/share/icons")).unwrap();
        fs::write(root.join("usr/share/icons/a.png"), "deep").unwrap();
        fs::write(root.join("z.png"), "z").unwrap();
        fs::write(root.join("b.png"), "b").unwrap();
        fs::write(root.join("a.txt"), "not an icon").unwrap();

        assert_eq!(find_first_png(root), Some(root.join("b.png")));
    }

    #[test]
    fn nested_png_found_when_top_level_has_none() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("b/deeper")).unwrap();
        fs::create_dir_all(root.join("c")).unwrap();
        fs::write(root.join("b/deeper/x.png"), "x").unwrap();
        fs::write(root.join("c/y.PNG"), "y").unwrap();

        assert_eq!(find_first_png(root), Some(root.join("c/y.PNG")));
    }

    #[cfg(unix)]
    #[test]
    fn broken_png_link_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::os::unix::fs::symlink(root.join("missing.png"), root.join("a.png")).unwrap();
        fs::write(root.join("b.png"), "b").unwrap();

        assert_eq!(find_first_png(root), Some(root.join("b.png")));
    }

    #[test]
    fn no_png_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(find_first_png(dir.path()), None);
        assert_eq!(find_first_png(&dir.path().join("absent")), None);
    }

    #[test]
    fn non_appimage_is_rejected_without_running_it() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("x.AppImage");
        fs::write(&artifact, "not an elf").unwrap();
        let executor = Arc::new(FakeExecutor::new());

        let extractor = AppImageIconExtractor::new(executor.clone());
        let err = extractor
            .extract(&artifact, &dir.path().join("icon.png"))
            .unwrap_err();

        assert!(err.to_string().contains("not a type 2 AppImage"));
        assert!(executor.calls().is_empty());
    }

    #[test]
    fn failed_extraction_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("x.AppImage");
        write_appimage(&artifact);
        let executor = Arc::new(FakeExecutor::new().with_response(false, ""));

        let extractor = AppImageIconExtractor::new(executor.clone());
        let result = extractor.extract(&artifact, &dir.path().join("icon.png"));

        assert!(matches!(result, Err(DesktopError::IconExtraction(_))));
        let calls = executor.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].ends_with("x.AppImage --appimage-extract *.png"));
    }

    #[test]
    fn successful_run_without_png_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("x.AppImage");
        write_appimage(&artifact);
        let executor = Arc::new(FakeExecutor::new().with_response(true, ""));

        let extractor = AppImageIconExtractor::new(executor);
        let err = extractor
            .extract(&artifact, &dir.path().join("icon.png"))
            .unwrap_err();
        assert!(err.to_string().contains("no PNG"));
    }
}
