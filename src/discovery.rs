use std::{
    fs,
    path::{Path, PathBuf},
};

use glob::Pattern;

use crate::error::{Error, Result};

/// Lists the files in `dir` which name matches `pattern` and, if given, `pattern2`
///
/// The patterns are shell wildcards like `*.ms.norm.npy` or `*_1.*`.
/// The paths are sorted by name.
pub fn get_filenames<P: AsRef<Path>>(
    dir: P,
    pattern: &str,
    pattern2: Option<&str>,
) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let pattern = Pattern::new(pattern)?;
    let pattern2 = pattern2.map(Pattern::new).transpose()?;
    let mut paths = vec![];
    for entry in fs::read_dir(dir).map_err(|e| Error::Io(e, dir.to_path_buf()))? {
        let entry = entry.map_err(|e| Error::Io(e, dir.to_path_buf()))?;
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        if pattern.matches(name) && pattern2.as_ref().map_or(true, |p| p.matches(name)) {
            paths.push(entry.path());
        }
    }
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::{
        env,
        sync::atomic::{AtomicUsize, Ordering},
    };

    static DIR_COUNT: AtomicUsize = AtomicUsize::new(0);

    /// Creates a new empty directory in the system temporary directory
    pub fn scratch_dir(name: &str) -> PathBuf {
        let path = env::temp_dir().join(format!(
            "nod-combination_{}_{}_{}",
            std::process::id(),
            DIR_COUNT.fetch_add(1, Ordering::SeqCst),
            name
        ));
        if path.exists() {
            fs::remove_dir_all(&path).unwrap();
        }
        fs::create_dir_all(&path).unwrap();
        path
    }

    #[test]
    fn sorted_double_match() {
        let dir = scratch_dir("discovery");
        for name in [
            "CRIRE.2012-04-05T01-10-23.000_2.ms.norm.npy",
            "CRIRE.2012-04-05T01-02-11.000_1.ms.norm.npy",
            "CRIRE.2012-04-05T01-06-48.000_1.ms.norm.npy",
            "CRIRE.2012-04-05T01-06-48.000_1.ms.npy",
            "notes_1.txt",
        ] {
            fs::write(dir.join(name), b"").unwrap();
        }
        let names: Vec<_> = get_filenames(&dir, "CRIRE*.ms.norm.npy", Some("*_1.*"))
            .unwrap()
            .into_iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "CRIRE.2012-04-05T01-02-11.000_1.ms.norm.npy",
                "CRIRE.2012-04-05T01-06-48.000_1.ms.norm.npy"
            ]
        );
        assert_eq!(get_filenames(&dir, "*.txt", None).unwrap().len(), 1);
        fs::remove_dir_all(&dir).unwrap();
    }
    #[test]
    fn missing_dir() {
        let dir = env::temp_dir().join("nod-combination_no_such_dir");
        assert!(matches!(
            get_filenames(&dir, "*", None),
            Err(Error::Io(_, path)) if path == dir
        ));
    }
    #[test]
    fn bad_pattern() {
        assert!(matches!(
            get_filenames(env::temp_dir(), "[", None),
            Err(Error::Pattern(_))
        ));
    }
}
