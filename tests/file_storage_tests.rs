use concours_server::interfaces::file_storage::FileStorageInterface;
use concours_server::utils::file::local_file_storage::LocalFileStorage;

#[tokio::test]
async fn local_storage_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let storage = LocalFileStorage::new(
        dir.path().to_string_lossy().to_string(),
        "http://localhost/media".to_string(),
    );

    let payload = b"binary payload".to_vec();
    let url = storage
        .upload(
            payload.clone(),
            Some("participation_1"),
            "video.mp4",
            Some("video/mp4"),
        )
        .await
        .unwrap();
    assert_eq!(url, "http://localhost/media/participation_1/video.mp4");

    let downloaded = storage
        .download(Some("participation_1"), "video.mp4")
        .await
        .unwrap();
    assert_eq!(downloaded, payload);

    storage
        .delete(Some("participation_1"), "video.mp4")
        .await
        .unwrap();
    assert!(storage
        .download(Some("participation_1"), "video.mp4")
        .await
        .is_err());
}

#[tokio::test]
async fn upload_without_namespace_lands_at_root() {
    let dir = tempfile::tempdir().unwrap();
    let storage = LocalFileStorage::new(
        dir.path().to_string_lossy().to_string(),
        "http://localhost/media".to_string(),
    );

    let url = storage
        .upload(b"x".to_vec(), None, "entete.png", Some("image/png"))
        .await
        .unwrap();
    assert_eq!(url, "http://localhost/media/entete.png");
    assert!(dir.path().join("entete.png").exists());
}
