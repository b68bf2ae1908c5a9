use std::path::{Path, PathBuf};

pub const DB_DIR: &str = ".retouch";
pub const DB_FILE: &str = "session.sqlite3";

/// Files SQLite may leave next to the database.
const SIDECAR_SUFFIXES: [&str; 3] = ["-wal", "-shm", "-journal"];

#[must_use]
pub fn default_db_path(cwd: &Path) -> PathBuf {
    cwd.join(DB_DIR).join(DB_FILE)
}

/// The database file followed by its sidecars.
#[must_use]
pub fn database_files(path: &Path) -> Vec<PathBuf> {
    let mut files = vec![path.to_path_buf()];
    files.extend(SIDECAR_SUFFIXES.iter().map(|suffix| {
        let mut name = path.as_os_str().to_os_string();
        name.push(suffix);
        PathBuf::from(name)
    }));
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sidecars_append_suffixes_to_the_full_file_name() {
        let files = database_files(Path::new("/tmp/x/session.sqlite3"));

        assert_eq!(
            files,
            vec![
                PathBuf::from("/tmp/x/session.sqlite3"),
                PathBuf::from("/tmp/x/session.sqlite3-wal"),
                PathBuf::from("/tmp/x/session.sqlite3-shm"),
                PathBuf::from("/tmp/x/session.sqlite3-journal"),
            ]
        );
        assert_eq!(
            default_db_path(Path::new("/work")),
            PathBuf::from("/work/.retouch/session.sqlite3")
        );
    }
}
