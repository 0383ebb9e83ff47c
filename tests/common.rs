// Common helpers for xacro2unity integration tests
//
// - Fixture packages: a `<name>_description` folder in a tempdir
// - Fake expanders: tiny shell scripts standing in for xacro
// - Output inspection: mesh filenames of the generated URDF
//
// Tests that spawn expanders hold `serial()` for their whole body. Writing an
// executable while another thread forks can make exec fail with ETXTBSY.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, Once};
use tempfile::TempDir;
use xmltree::Element;

static INIT: Once = Once::new();
static SERIAL: Mutex<()> = Mutex::new(());

/// Initialize logging once per test binary.
#[allow(dead_code)]
pub fn test_init() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

/// Serialize tests that create and run scripts.
#[allow(dead_code)]
pub fn serial() -> MutexGuard<'static, ()> {
    SERIAL.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A description package laid out in a temporary directory.
#[allow(dead_code)]
pub struct Package {
    _tmp: TempDir,
    pub root: PathBuf,
    pub tools: PathBuf,
}

#[allow(dead_code)]
impl Package {
    /// Create `<tmp>/<mesh_name>/` with nothing in it.
    pub fn empty(mesh_name: &str) -> Self {
        let tmp = tempfile::tempdir().expect("Failed to create tempdir");
        let root = tmp.path().join(mesh_name);
        let tools = tmp.path().join("tools");
        fs::create_dir_all(&root).expect("Failed to create package root");
        fs::create_dir_all(&tools).expect("Failed to create tools dir");
        Self {
            _tmp: tmp,
            root,
            tools,
        }
    }

    /// Create a package with `urdf/<robot>.xacro` holding `xacro`.
    pub fn with_xacro(
        mesh_name: &str,
        xacro: &str,
    ) -> Self {
        let pkg = Self::empty(mesh_name);
        let robot = mesh_name.strip_suffix("_description").unwrap_or(mesh_name);
        pkg.write(&format!("urdf/{robot}.xacro"), xacro);
        pkg
    }

    /// Write `content` at `rel` under the package root, creating parents.
    pub fn write(
        &self,
        rel: &str,
        content: &str,
    ) -> PathBuf {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        fs::write(&path, content).expect("Failed to write fixture file");
        path
    }

    pub fn read(
        &self,
        rel: &str,
    ) -> String {
        fs::read_to_string(self.root.join(rel))
            .unwrap_or_else(|e| panic!("Failed to read {}: {}", rel, e))
    }

    /// Canonical root, as reported back by the converter
    pub fn canonical_root(&self) -> PathBuf {
        self.root.canonicalize().expect("Package root should exist")
    }

    /// An expander that copies its input to the `-o` target.
    #[cfg(unix)]
    pub fn copying_expander(&self) -> PathBuf {
        self.script("xacro", "cp \"$3\" \"$2\"")
    }

    /// An expander that always exits with `code`.
    #[cfg(unix)]
    pub fn failing_expander(
        &self,
        code: i32,
    ) -> PathBuf {
        self.script("xacro-fail", &format!("echo 'xacro: boom' >&2\nexit {code}"))
    }

    /// Write an executable shell script into the tools dir.
    #[cfg(unix)]
    pub fn script(
        &self,
        name: &str,
        body: &str,
    ) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = self.tools.join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("Failed to write script");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .expect("Failed to make script executable");
        path
    }
}

/// All `<mesh filename="...">` values in a URDF document.
#[allow(dead_code)]
pub fn mesh_filenames(urdf: &str) -> Vec<String> {
    fn collect(
        elem: &Element,
        out: &mut Vec<String>,
    ) {
        if elem.name == "mesh" {
            if let Some(filename) = elem.attributes.get("filename") {
                out.push(filename.clone());
            }
        }
        for child in &elem.children {
            if let Some(child) = child.as_element() {
                collect(child, out);
            }
        }
    }

    let root = Element::parse(urdf.as_bytes()).expect("Output should be valid XML");
    let mut out = Vec::new();
    collect(&root, &mut out);
    out
}

/// Relative paths and contents of every file below `dir`, sorted.
#[allow(dead_code)]
pub fn snapshot_tree(dir: &Path) -> Vec<(PathBuf, Vec<u8>)> {
    fn walk(
        base: &Path,
        dir: &Path,
        out: &mut Vec<(PathBuf, Vec<u8>)>,
    ) {
        for entry in fs::read_dir(dir).expect("Failed to read dir") {
            let path = entry.expect("Failed to read entry").path();
            if path.is_dir() {
                walk(base, &path, out);
            } else {
                let rel = path.strip_prefix(base).unwrap().to_path_buf();
                out.push((rel, fs::read(&path).expect("Failed to read file")));
            }
        }
    }

    let mut out = Vec::new();
    walk(dir, dir, &mut out);
    out.sort();
    out
}

/// Assert a path exists, with a readable message.
#[macro_export]
macro_rules! assert_exists {
    ($path:expr) => {{
        let owned = $path;
        let path: &std::path::Path = owned.as_ref();
        assert!(path.exists(), "Expected '{}' to exist", path.display());
    }};
}

/// Assert a path does not exist, with a readable message.
#[macro_export]
macro_rules! assert_missing {
    ($path:expr) => {{
        let owned = $path;
        let path: &std::path::Path = owned.as_ref();
        assert!(!path.exists(), "Expected '{}' to be gone", path.display());
    }};
}
