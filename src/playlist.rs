use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::FolderEntry;

/// Extensions the decoder is expected to handle, compared case-insensitively.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "bmp", "gif", "webp", "tif", "tiff", "tga", "ico", "pnm", "avif",
];

pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Sorted, de-duplicated image paths under `folder`. A missing folder yields nothing.
pub fn list_images(folder: &Path, recursive: bool) -> Vec<PathBuf> {
    let mut found = BTreeSet::new();
    collect(folder, recursive, &mut found);
    found.into_iter().collect()
}

fn collect(dir: &Path, recursive: bool, out: &mut BTreeSet<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(folder = %dir.display(), error = %e, "cannot read folder");
            return;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if recursive {
                collect(&path, true, out);
            }
        } else if path.is_file() && is_supported(&path) {
            out.insert(path);
        }
    }
}

/// The ordered list of image paths a session plays through.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Playlist {
    paths: Vec<PathBuf>,
}

impl Playlist {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    pub fn from_folders<R: Rng + ?Sized>(
        folders: &[FolderEntry],
        random_order: bool,
        rng: &mut R,
    ) -> Self {
        let mut seen = BTreeSet::new();
        let mut paths = Vec::new();
        for folder in folders {
            for path in list_images(folder.path(), folder.recursive()) {
                if seen.insert(path.clone()) {
                    paths.push(path);
                }
            }
        }
        if random_order {
            paths.shuffle(rng);
        }
        debug!(count = paths.len(), random_order, "playlist built");
        Self { paths }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Path> {
        self.paths.get(index).map(PathBuf::as_path)
    }

    pub fn remove_at(&mut self, index: usize) -> Option<PathBuf> {
        (index < self.paths.len()).then(|| self.paths.remove(index))
    }

    pub fn position(&self, path: &Path) -> Option<usize> {
        self.paths.iter().position(|p| p == path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(PathBuf::as_path)
    }
}

impl From<Vec<PathBuf>> for Playlist {
    fn from(paths: Vec<PathBuf>) -> Self {
        Self::new(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn lists_supported_files_sorted() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("b.JPG"));
        touch(&dir.path().join("a.png"));
        touch(&dir.path().join("notes.txt"));
        fs::create_dir(dir.path().join("sub")).unwrap();
        touch(&dir.path().join("sub/c.webp"));

        let flat = list_images(dir.path(), false);
        let names: Vec<_> = flat
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.png", "b.JPG"]);

        let deep = list_images(dir.path(), true);
        assert_eq!(deep.len(), 3);
    }

    #[test]
    fn missing_folder_is_empty() {
        assert!(list_images(Path::new("/definitely/not/here"), true).is_empty());
    }

    #[test]
    fn folders_are_merged_without_duplicates() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("a.png"));
        touch(&dir.path().join("b.png"));
        let folders = vec![
            FolderEntry::Path(dir.path().to_path_buf()),
            FolderEntry::WithRecursion(dir.path().to_path_buf(), true),
        ];
        let mut rng = StdRng::seed_from_u64(1);
        let playlist = Playlist::from_folders(&folders, false, &mut rng);
        assert_eq!(playlist.len(), 2);
        assert_eq!(playlist.position(&dir.path().join("b.png")), Some(1));
    }

    #[test]
    fn shuffle_keeps_membership() {
        let dir = tempdir().unwrap();
        for i in 0..20 {
            touch(&dir.path().join(format!("{i:02}.png")));
        }
        let folders = vec![FolderEntry::Path(dir.path().to_path_buf())];
        let mut rng = StdRng::seed_from_u64(9);
        let shuffled = Playlist::from_folders(&folders, true, &mut rng);
        let mut sorted: Vec<_> = shuffled.iter().map(Path::to_path_buf).collect();
        sorted.sort();
        assert_eq!(sorted, list_images(dir.path(), false));
    }

    #[test]
    fn remove_out_of_range_is_none() {
        let mut playlist = Playlist::new(vec![PathBuf::from("a.png")]);
        assert_eq!(playlist.remove_at(3), None);
        assert_eq!(playlist.remove_at(0), Some(PathBuf::from("a.png")));
        assert!(playlist.is_empty());
    }
}
