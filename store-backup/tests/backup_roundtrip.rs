use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use store_backup::{
    ArchiveCodec, BackupError, BackupOrchestrator, ContentStore, FileStore, StorePaths,
};
use tempfile::TempDir;

/// Every file and directory below `root`, relative, with file contents.
fn tree_contents(root: &Path) -> BTreeMap<String, Option<Vec<u8>>> {
    let mut out = BTreeMap::new();
    for entry in walkdir::WalkDir::new(root).min_depth(1) {
        let entry = entry.unwrap();
        let rel = entry
            .path()
            .strip_prefix(root)
            .unwrap()
            .to_string_lossy()
            .replace('\\', "/");
        let data = if entry.file_type().is_file() {
            Some(fs::read(entry.path()).unwrap())
        } else {
            None
        };
        out.insert(rel, data);
    }
    out
}

struct Shop {
    _root: TempDir,
    paths: StorePaths,
    content: Arc<FileStore>,
    templates: Arc<FileStore>,
}

impl Shop {
    fn new() -> Self {
        let root = TempDir::new().unwrap();
        let paths = StorePaths {
            content_store: root.path().join("data/contentStore"),
            template_store: root.path().join("data/templateStore"),
            images: root.path().join("static/images"),
            template_tree: root.path().join("static/templates"),
            tree_exclude: Vec::new(),
        };
        let content = Arc::new(FileStore::open(&paths.content_store).unwrap());
        let templates = Arc::new(FileStore::open(&paths.template_store).unwrap());
        Self {
            _root: root,
            paths,
            content,
            templates,
        }
    }

    fn orchestrator(&self) -> BackupOrchestrator {
        BackupOrchestrator::new(
            self.paths.clone(),
            self.content.clone(),
            self.templates.clone(),
        )
        .with_codec(ArchiveCodec::new(3))
    }

    fn populate(&self) {
        self.content.save("about", br#"{"title":"About us"}"#).unwrap();
        self.content.save("home", br#"{"title":"Home"}"#).unwrap();
        self.templates.save("active", br#"{"name":"hestia"}"#).unwrap();

        fs::create_dir_all(&self.paths.images).unwrap();
        fs::write(self.paths.images.join("logo.png"), [0x89, b'P', b'N', b'G']).unwrap();
        fs::write(self.paths.images.join("banner.jpg"), vec![0xffu8; 4096]).unwrap();

        let tree = &self.paths.template_tree;
        fs::create_dir_all(tree.join("hestia/js")).unwrap();
        fs::create_dir_all(tree.join("hestia/css")).unwrap();
        fs::create_dir_all(tree.join("hestia/partials/empty")).unwrap();
        fs::write(tree.join("hestia/index.html"), b"<html>{{.Title}}</html>").unwrap();
        fs::write(tree.join("hestia/js/custom.js"), b"$(function(){});").unwrap();
        fs::write(tree.join("hestia/css/site.css"), b"body{margin:0}").unwrap();
    }
}

#[test]
fn full_backup_restores_into_fresh_installation() {
    let source = Shop::new();
    source.populate();

    let download = source.orchestrator().download().unwrap();
    assert!(download.template_tree_listed);
    assert!(download.report.is_complete());
    assert_eq!(download.report.content_store.processed, 2);
    assert_eq!(download.report.images.processed, 2);

    let target = Shop::new();
    let report = target.orchestrator().upload(&download.blob).unwrap();
    assert!(report.is_complete());

    // Reload made the restored records visible without reopening the stores.
    assert_eq!(
        target.content.read("about").as_deref(),
        Some(&br#"{"title":"About us"}"#[..])
    );
    assert_eq!(target.content.read_all().len(), 2);
    assert!(target.templates.read("active").is_some());

    for (from, to) in [
        (&source.paths.content_store, &target.paths.content_store),
        (&source.paths.template_store, &target.paths.template_store),
        (&source.paths.images, &target.paths.images),
        (&source.paths.template_tree, &target.paths.template_tree),
    ] {
        assert_eq!(tree_contents(from), tree_contents(to), "{} differs", to.display());
    }
}

#[test]
fn restore_discards_files_missing_from_backup() {
    let shop = Shop::new();
    shop.populate();
    let blob = shop.orchestrator().download().unwrap().blob;

    shop.content.save("draft", b"{}").unwrap();
    fs::write(shop.paths.images.join("new.gif"), b"gif").unwrap();
    fs::write(shop.paths.template_tree.join("hestia/extra.html"), b"x").unwrap();

    shop.orchestrator().upload(&blob).unwrap();

    assert!(shop.content.read("draft").is_none());
    assert!(!shop.paths.images.join("new.gif").exists());
    assert!(!shop.paths.template_tree.join("hestia/extra.html").exists());
    assert!(shop.paths.template_tree.join("hestia/index.html").is_file());
}

#[test]
fn truncated_blob_touches_nothing() {
    let shop = Shop::new();
    shop.populate();
    let blob = shop.orchestrator().download().unwrap().blob;
    let before: Vec<_> = [
        &shop.paths.content_store,
        &shop.paths.template_store,
        &shop.paths.images,
        &shop.paths.template_tree,
    ]
    .iter()
    .map(|dir| tree_contents(dir))
    .collect();

    let step = (blob.len() / 16).max(1);
    for cut in (0..blob.len()).step_by(step) {
        let result = shop.orchestrator().upload(&blob[..cut]);
        assert!(matches!(result, Err(BackupError::Decode(_))), "cut {}", cut);
    }

    let after: Vec<_> = [
        &shop.paths.content_store,
        &shop.paths.template_store,
        &shop.paths.images,
        &shop.paths.template_tree,
    ]
    .iter()
    .map(|dir| tree_contents(dir))
    .collect();
    assert_eq!(before, after);
}

#[test]
fn empty_installation_round_trips() {
    let source = Shop::new();
    let download = source.orchestrator().download().unwrap();
    // The template tree root was never created.
    assert!(!download.template_tree_listed);

    let envelope = ArchiveCodec::new(3).decode(&download.blob).unwrap();
    assert!(envelope.content_store_files.is_empty());
    assert!(envelope.template_store_files.is_empty());
    assert!(envelope.image_files.is_empty());

    let target = Shop::new();
    target.content.save("leftover", b"{}").unwrap();
    let report = target.orchestrator().upload(&download.blob).unwrap();
    assert_eq!(report.total_processed(), 0);
    assert!(target.content.is_empty());
    assert!(target.paths.template_tree.is_dir());
}
