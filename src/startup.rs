//! Picks the model to open from the command line.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Extensions the viewer will open from the command line.
pub const MODEL_EXTENSIONS: &[&str] = &["drc", "glb"];

/// Returns true if `path` ends in one of the [`MODEL_EXTENSIONS`].
pub fn is_model_path(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| MODEL_EXTENSIONS.iter().any(|m| ext.eq_ignore_ascii_case(m)))
}

/// Scans startup arguments for the first existing model file.
///
/// Tokens starting with `--` are flags and are skipped. Everything else is
/// made absolute against the current directory and accepted if it names a
/// regular file with a model extension.
pub fn resolve_model_path<I, S>(args: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    for arg in args {
        let arg = arg.as_ref();
        if arg.as_encoded_bytes().starts_with(b"--") {
            continue;
        }

        let resolved = match std::path::absolute(arg) {
            Ok(resolved) => resolved,
            Err(err) => {
                warn!("Error resolving path {:?}: {}", arg, err);
                continue;
            }
        };

        debug!("Checking path {:?}", &resolved);

        if is_model_path(&resolved) && resolved.is_file() {
            info!("Found model to load: {:?}", &resolved);
            return Some(resolved);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn skips_flags_and_resolves_model() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("model.drc");
        fs::write(&model, b"DRACO").unwrap();

        let args = vec![
            "--flag".to_string(),
            model.to_string_lossy().into_owned(),
        ];

        let resolved = resolve_model_path(&args).unwrap();
        assert_eq!(resolved, std::path::absolute(&model).unwrap());
    }

    #[test]
    fn flag_naming_a_model_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("--model.glb");
        fs::write(&model, b"glTF").unwrap();

        assert_eq!(resolve_model_path([model.file_name().unwrap()]), None);
    }

    #[test]
    fn no_model_resolves_to_none() {
        let dir = tempfile::tempdir().unwrap();
        let text = dir.path().join("notes.txt");
        fs::write(&text, b"hello").unwrap();
        let missing = dir.path().join("missing.glb");

        assert_eq!(resolve_model_path([text.as_os_str(), missing.as_os_str()]), None);
        assert_eq!(resolve_model_path(Vec::<String>::new()), None);
    }

    #[test]
    fn directories_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("scene.glb");
        fs::create_dir(&fake).unwrap();

        assert_eq!(resolve_model_path([fake.as_os_str()]), None);
    }

    #[test]
    fn first_match_wins() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.glb");
        let second = dir.path().join("b.drc");
        fs::write(&first, b"glTF").unwrap();
        fs::write(&second, b"DRACO").unwrap();

        let resolved = resolve_model_path([second.as_os_str(), first.as_os_str()]).unwrap();
        assert_eq!(resolved, second);
    }

    #[test]
    fn extension_is_case_insensitive() {
        assert!(is_model_path(Path::new("/tmp/Bunny.DRC")));
        assert!(is_model_path(Path::new("scene.Glb")));
        assert!(!is_model_path(Path::new("scene.gltf")));
        assert!(!is_model_path(Path::new("drc")));
    }
}
