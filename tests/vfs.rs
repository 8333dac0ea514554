extern crate crayon_res;

use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use crayon_res::prelude::*;

struct TempDir(PathBuf);

impl TempDir {
    fn new() -> Self {
        let path = std::env::temp_dir().join(format!("crayon-res-{}", rand::random::<u64>()));
        fs::create_dir_all(&path).unwrap();
        TempDir(path)
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

#[test]
fn memory() {
    let mount = MemoryMount::new()
        .with("a.txt", "a")
        .with("b/c.txt", "bc")
        .with("b/d/e.txt", "bde");

    assert_eq!(mount.len(), 3);
    assert_eq!(mount.read("b/c.txt"), b"bc");
    assert!(mount.read("b").is_empty());
    assert!(mount.read("missing.txt").is_empty());

    let items = mount.enumerate("");
    assert_eq!(items.len(), 2);
    assert_eq!((items[0].name.as_str(), items[0].kind), ("a.txt", ItemKind::File));
    assert_eq!((items[1].name.as_str(), items[1].kind), ("b", ItemKind::Directory));

    let items = mount.enumerate("b/");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].name, "c.txt");
    assert_eq!(items[0].size, 2);
    assert_eq!(items[1].name, "d");
    assert_eq!(items[1].kind, ItemKind::Directory);
    assert!(mount.enumerate("missing").is_empty());

    mount.write("b/c.txt", b"cb").unwrap();
    assert_eq!(mount.read("b/c.txt"), b"cb");

    assert!(mount.delete("b/d").is_ok());
    assert!(mount.read("b/d/e.txt").is_empty());
    assert!(mount.delete("b/d").is_err());
    assert!(mount.delete("a.txt").is_ok());
    assert_eq!(mount.len(), 1);
}

#[test]
fn directory() {
    let tmp = TempDir::new();

    assert!(Directory::new(tmp.0.join("missing")).is_err());
    fs::write(tmp.0.join("file"), b"file").unwrap();
    assert!(Directory::new(tmp.0.join("file")).is_err());

    let mount = Directory::new(&tmp.0).unwrap();
    assert_eq!(mount.root(), tmp.0.as_path());
    assert_eq!(mount.read("file"), b"file");
    assert_eq!(mount.read("/file"), b"file");
    assert!(mount.read("missing").is_empty());

    mount.write("a/b/c.txt", b"abc").unwrap();
    assert_eq!(mount.read("a/b/c.txt"), b"abc");

    let items = mount.enumerate("");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].name, "a");
    assert_eq!(items[0].kind, ItemKind::Directory);
    assert_eq!(items[1].name, "file");
    assert_eq!(items[1].kind, ItemKind::File);
    assert_eq!(items[1].size, 4);
    assert!(items[1].mtime > 0);
    assert!(mount.enumerate("missing").is_empty());

    mount.delete("a/b/c.txt").unwrap();
    assert!(mount.read("a/b/c.txt").is_empty());
    mount.delete("a").unwrap();
    assert!(mount.delete("a").is_err());
    assert_eq!(mount.enumerate("").len(), 1);
}

#[test]
fn directory_stays_inside_root() {
    let tmp = TempDir::new();
    fs::create_dir_all(tmp.0.join("root")).unwrap();
    fs::write(tmp.0.join("secret.txt"), b"outside").unwrap();

    let mount = Directory::new(tmp.0.join("root")).unwrap();
    assert!(mount.read("../secret.txt").is_empty());
    assert!(mount.read("a/../../secret.txt").is_empty());
    assert!(mount.enumerate("..").is_empty());

    assert!(mount.write("../escaped.txt", b"escaped").is_err());
    assert!(!tmp.0.join("escaped.txt").exists());

    assert!(mount.delete("../secret.txt").is_err());
    assert!(mount.delete("").is_err());
    assert!(mount.delete("/").is_err());
    assert!(tmp.0.join("secret.txt").exists());
    assert!(tmp.0.join("root").is_dir());

    // Plain relative paths and leading separators still resolve under the root.
    mount.write("./a.txt", b"a").unwrap();
    assert_eq!(mount.read("/a.txt"), b"a");
}

#[derive(Default)]
struct Bytes(Vec<u8>);

impl Asset for Bytes {}

struct BytesLoader;

impl Loader for BytesLoader {
    fn extensions(&self) -> &[&str] {
        &["bin"]
    }

    fn load(&self, _: &ServiceShared, scope: &mut Scope, bytes: &[u8]) -> Result<()> {
        if let Some(v) = scope.target_as::<Bytes>() {
            v.write().0 = bytes.to_vec();
        }

        Ok(())
    }
}

#[test]
fn service_with_directory() {
    let tmp = TempDir::new();

    let mut service = Service::new(ServiceParams::default()).unwrap();
    service
        .add_mount("disk", Directory::new(&tmp.0).unwrap())
        .unwrap();
    service.add_mount("mem", MemoryMount::new()).unwrap();
    service.add_loader(BytesLoader).unwrap();

    assert!(service.save(&"mem://a.bin".into(), b"0123"));
    assert!(service.copy(&"mem://a.bin".into(), &"disk://data/a.bin".into()));
    assert_eq!(fs::read(tmp.0.join("data/a.bin")).unwrap(), b"0123");

    let items = service.enumerate(&"disk://data".into());
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name, "a.bin");

    let bytes: Tracker<Bytes> = service.load("disk://data/a.bin", None);
    let deadline = Instant::now() + Duration::from_secs(10);
    while service.pending() > 0 {
        service.on_tick();
        assert!(Instant::now() < deadline);
        thread::sleep(Duration::from_millis(1));
    }

    assert_eq!(bytes.status(), Status::Loaded);
    assert_eq!(bytes.read().0, b"0123");

    assert!(!service.save(&"disk://../escaped.bin".into(), b"0"));
    assert!(service.find(&"disk://../escaped.bin".into()).is_empty());

    assert!(service.delete(&"disk://data".into()));
    assert!(service.enumerate(&"disk://".into()).is_empty());
}
