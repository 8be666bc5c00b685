use super::*;

#[tokio::test]
async fn open_documents_shadow_disk() {
    let workspace = tempfile::tempdir().unwrap();
    let file = workspace.path().join("a.ts");
    std::fs::write(&file, "export const onDisk = 1;").unwrap();

    let documents = Arc::new(DocumentStore::new());
    let overlay = SourceOverlay::new(Arc::clone(&documents), vec![workspace.path().to_path_buf()]);
    assert_eq!(overlay.read(&file).await.as_deref(), Some("export const onDisk = 1;"));

    let uri = Url::from_file_path(&file).unwrap();
    documents.open(uri.clone(), "export const inEditor = 1;".to_string(), 1);
    assert_eq!(overlay.read(&file).await.as_deref(), Some("export const inEditor = 1;"));

    documents.close(&uri);
    assert_eq!(overlay.read(&file).await.as_deref(), Some("export const onDisk = 1;"));
}

#[tokio::test]
async fn disk_reads_are_cached_until_invalidated() {
    let workspace = tempfile::tempdir().unwrap();
    let file = workspace.path().join("b.ts");
    std::fs::write(&file, "v1").unwrap();

    let overlay = SourceOverlay::new(Arc::new(DocumentStore::new()), vec![workspace.path().to_path_buf()]);
    assert_eq!(overlay.read(&file).await.as_deref(), Some("v1"));

    std::fs::write(&file, "v2").unwrap();
    assert_eq!(overlay.read(&file).await.as_deref(), Some("v1"));

    overlay.invalidate(&file);
    assert_eq!(overlay.read(&file).await.as_deref(), Some("v2"));
}

#[tokio::test]
async fn files_outside_workspace_are_refused() {
    let workspace = tempfile::tempdir().unwrap();
    let outside = tempfile::tempdir().unwrap();
    let file = outside.path().join("secret.ts");
    std::fs::write(&file, "nope").unwrap();

    let overlay = SourceOverlay::new(Arc::new(DocumentStore::new()), vec![workspace.path().to_path_buf()]);
    assert!(overlay.read(&file).await.is_none());
    assert!(overlay.read(&workspace.path().join("missing.ts")).await.is_none());
}

#[tokio::test]
async fn compiler_libraries_are_readable_anywhere() {
    let workspace = tempfile::tempdir().unwrap();
    let global = tempfile::tempdir().unwrap();
    let lib = global.path().join("node_modules/typescript/lib/lib.es5.d.ts");
    std::fs::create_dir_all(lib.parent().unwrap()).unwrap();
    std::fs::write(&lib, "interface Array<T> {}").unwrap();

    let overlay = SourceOverlay::new(Arc::new(DocumentStore::new()), vec![workspace.path().to_path_buf()]);
    assert_eq!(overlay.read(&lib).await.as_deref(), Some("interface Array<T> {}"));
    assert!(!overlay.is_readable(&global.path().join("node_modules/lodash/index.js")));
}
