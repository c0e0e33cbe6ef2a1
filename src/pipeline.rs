use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::album::Album;
use crate::archive::create_archive;
use crate::error::{GalleryError, Result};
use crate::gallery::render_gallery;
use crate::resize::{SizeMode, SourceImage};
use crate::s3::{
    ensure_no_collision, AccessPolicy, CollisionTarget, ObjectStore, Payload, StorageTier,
    UploadArtifact, UploadOrchestrator, UploadOutcome, UploadState,
};
use crate::select::{select_jpegs, SourceFile};

/// What a run produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Zip, display images, thumbnails and an index page
    Gallery,
    /// Only the zip archive
    Flat,
}

/// Everything a run needs to know, resolved from flags and environment
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub bucket: String,
    pub album: Option<Album>,
    pub directory: PathBuf,
    /// Destination for the archive in flat mode
    pub key_name: Option<String>,
    pub force: bool,
    pub mode: RunMode,
    pub display: SizeMode,
    pub thumbnail: SizeMode,
    pub storage_class: StorageTier,
    pub access: AccessPolicy,
    pub public_host: String,
}

impl RunOptions {
    /// Check that the chosen mode has the names it needs
    pub fn validate(&self) -> Result<()> {
        match self.mode {
            RunMode::Gallery if self.album.is_none() => Err(GalleryError::Argument(
                "Album name must be specified".to_string(),
            )),
            RunMode::Gallery if self.key_name.is_some() => Err(GalleryError::Argument(
                "A key name only applies to --flat uploads".to_string(),
            )),
            RunMode::Flat if self.album.is_none() && self.key_name.is_none() => {
                Err(GalleryError::Argument(
                    "Either an album name or a key name must be specified".to_string(),
                ))
            }
            _ => Ok(()),
        }
    }

    fn artifact(&self, key: String, payload: Payload) -> UploadArtifact {
        UploadArtifact::new(key, payload)
            .with_storage(self.storage_class)
            .with_access(self.access)
    }

    pub fn public_url(&self, key: &str) -> String {
        format!("http://{}/{}/{}", self.public_host, self.bucket, key)
    }

    fn album(&self) -> Result<&Album> {
        self.album
            .as_ref()
            .ok_or_else(|| GalleryError::Argument("Album name must be specified".to_string()))
    }

    fn zip_key(&self) -> Result<String> {
        match &self.key_name {
            Some(key) if self.mode == RunMode::Flat => Ok(key.clone()),
            _ => Ok(self.album()?.zip_key()),
        }
    }

    /// Gallery runs refuse anything under the album's name; flat runs only
    /// refuse their exact destination key
    fn collision_targets(&self) -> Result<Vec<CollisionTarget>> {
        Ok(match self.mode {
            RunMode::Gallery => {
                let album = self.album()?;
                vec![
                    CollisionTarget::Prefix(album.name().to_string()),
                    CollisionTarget::Prefix(album.prefix()),
                ]
            }
            RunMode::Flat => vec![CollisionTarget::Key(self.zip_key()?)],
        })
    }
}

/// Outcome of a finished run
#[derive(Debug)]
pub struct RunReport {
    pub files: usize,
    pub uploads: Vec<UploadOutcome>,
    /// Shareable link; `None` when there was nothing to upload
    pub link: Option<String>,
    pub elapsed: Duration,
}

/// Keys a run would write, without touching the bucket
pub fn plan(options: &RunOptions) -> Result<(Vec<SourceFile>, Vec<String>)> {
    options.validate()?;
    let files = select_jpegs(&options.directory)?;
    if files.is_empty() {
        return Ok((files, Vec::new()));
    }

    let mut keys = vec![options.zip_key()?];
    if options.mode == RunMode::Gallery {
        let album = options.album()?;
        for file in &files {
            keys.push(album.image_key(&file.name));
            keys.push(album.thumbnail_key(&file.name));
        }
        keys.push(album.page_key());
    }
    Ok((files, keys))
}

/// Select, package and upload, then wait for every upload to land
///
/// Nothing is uploaded if the collision check fails. Any error drops the
/// orchestrator, which aborts uploads still in flight.
pub async fn run<S: ObjectStore>(store: Arc<S>, options: &RunOptions) -> Result<RunReport> {
    let start = Instant::now();
    options.validate()?;

    let files = select_jpegs(&options.directory)?;
    if files.is_empty() {
        println!(
            "{}",
            style(format!(
                "No jpg files found in {}",
                options.directory.display()
            ))
            .yellow()
        );
        return Ok(RunReport {
            files: 0,
            uploads: Vec::new(),
            link: None,
            elapsed: start.elapsed(),
        });
    }
    info!("Found {} jpg files in {}", files.len(), options.directory.display());

    let mut uploads = UploadOrchestrator::new(store, options.bucket.clone());

    uploads.store().ensure_bucket(&options.bucket).await?;
    ensure_no_collision(
        uploads.store(),
        &options.bucket,
        &options.collision_targets()?,
        options.force,
    )
    .await?;

    let zip_key = options.zip_key()?;
    status(format!("📦 Zipping {} files...", files.len()));
    let archive = create_archive(&files)?;
    uploads.submit(options.artifact(zip_key.clone(), Payload::Temp(archive)));

    let link_key = match options.mode {
        RunMode::Flat => zip_key,
        RunMode::Gallery => {
            let album = options.album()?;
            submit_derivatives(&mut uploads, album, &files, options)?;

            let names: Vec<String> = files.iter().map(|f| f.name.clone()).collect();
            let html = render_gallery(album.name(), &options.public_url(&zip_key), &names);
            let page_key = album.page_key();
            uploads.submit(options.artifact(page_key.clone(), Payload::Bytes(html.into_bytes())));
            page_key
        }
    };

    status(format!("⚡ Waiting for {} uploads to finish...", uploads.pending()));
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    let outcomes = uploads.await_all(Some(&pb)).await;
    pb.finish_and_clear();

    let outcomes = match outcomes {
        Ok(outcomes) => outcomes,
        Err(e) => {
            for outcome in uploads.outcomes() {
                if let UploadState::Failed(reason) = &outcome.state {
                    warn!("Not uploaded: {} ({})", outcome.key, reason);
                }
            }
            return Err(e);
        }
    };

    Ok(RunReport {
        files: files.len(),
        uploads: outcomes,
        link: Some(options.public_url(&link_key)),
        elapsed: start.elapsed(),
    })
}

/// Decode every source once and submit its display copy and thumbnail
fn submit_derivatives<S: ObjectStore>(
    uploads: &mut UploadOrchestrator<S>,
    album: &Album,
    files: &[SourceFile],
    options: &RunOptions,
) -> Result<()> {
    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} Resizing [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    for file in files {
        pb.set_message(file.name.clone());

        let image = SourceImage::open(&file.path)?;

        let display = image.derive(options.display)?;
        uploads.submit(options.artifact(album.image_key(&file.name), Payload::Temp(display)));

        let thumbnail = image.derive(options.thumbnail)?;
        uploads.submit(options.artifact(
            album.thumbnail_key(&file.name),
            Payload::Temp(thumbnail),
        ));

        pb.inc(1);
    }

    pb.finish_and_clear();
    info!(
        "Resized {} images (display {}, thumbnail {})",
        files.len(),
        options.display,
        options.thumbnail
    );
    Ok(())
}

fn status(message: String) {
    println!("{}", style(message).cyan());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::s3::memory::MemoryStore;
    use image::{Rgb, RgbImage};
    use std::fs;
    use std::path::Path;

    fn write_jpeg(dir: &Path, name: &str, width: u32, height: u32) {
        RgbImage::from_pixel(width, height, Rgb([10, 120, 200]))
            .save_with_format(dir.join(name), image::ImageFormat::Jpeg)
            .unwrap();
    }

    fn options(dir: &Path, mode: RunMode) -> RunOptions {
        RunOptions {
            bucket: "photos".to_string(),
            album: Some(Album::new("vacation").unwrap()),
            directory: dir.to_path_buf(),
            key_name: None,
            force: false,
            mode,
            display: SizeMode::ConstrainLongerDimension(64),
            thumbnail: SizeMode::ConstrainHeight(16),
            storage_class: StorageTier::ReducedRedundancy,
            access: AccessPolicy::PublicRead,
            public_host: "s3.amazonaws.com".to_string(),
        }
    }

    fn vacation_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        write_jpeg(dir.path(), "a.jpg", 120, 80); // wider than tall
        write_jpeg(dir.path(), "b.jpg", 80, 120); // taller than wide
        fs::write(dir.path().join("notes.txt"), b"skip me").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_gallery_run_uploads_every_artifact() {
        let dir = vacation_dir();
        let store = MemoryStore::new().into_shared();

        let report = run(Arc::clone(&store), &options(dir.path(), RunMode::Gallery))
            .await
            .unwrap();

        assert_eq!(
            store.keys(),
            vec![
                "pictures/vacation/images/a.jpg.jpg",
                "pictures/vacation/images/b.jpg.jpg",
                "pictures/vacation/index.html",
                "pictures/vacation/thumbnails/a.jpg.jpg",
                "pictures/vacation/thumbnails/b.jpg.jpg",
                "pictures/vacation/vacation.zip",
            ]
        );
        assert_eq!(report.files, 2);
        assert_eq!(report.uploads.len(), 6);
        assert!(report.uploads.iter().all(|u| u.state == UploadState::Completed));
        assert_eq!(
            report.link.as_deref(),
            Some("http://s3.amazonaws.com/photos/pictures/vacation/index.html")
        );

        let thumb = store.object("pictures/vacation/thumbnails/b.jpg.jpg").unwrap();
        assert_eq!(thumb.content_type.as_deref(), Some("image/jpeg"));
        let thumb = image::load_from_memory(&thumb.body).unwrap();
        assert_eq!((thumb.width(), thumb.height()), (11, 16));

        let display = store.object("pictures/vacation/images/a.jpg.jpg").unwrap();
        let display = image::load_from_memory(&display.body).unwrap();
        assert_eq!((display.width(), display.height()), (64, 43));

        let page = store.object("pictures/vacation/index.html").unwrap();
        let page = String::from_utf8(page.body).unwrap();
        assert!(page.contains("http://s3.amazonaws.com/photos/pictures/vacation/vacation.zip"));
        assert!(page.find("a.jpg.jpg").unwrap() < page.find("b.jpg.jpg").unwrap());

        let zip = store.object("pictures/vacation/vacation.zip").unwrap();
        assert_eq!(zip.content_type.as_deref(), Some("application/zip"));
        let archive = zip::ZipArchive::new(std::io::Cursor::new(zip.body)).unwrap();
        let entries: Vec<_> = archive.file_names().collect();
        assert_eq!(entries.len(), 2);
        assert!(entries.contains(&"a.jpg") && entries.contains(&"b.jpg"));
    }

    #[tokio::test]
    async fn test_collision_aborts_before_any_upload() {
        let dir = vacation_dir();
        let store = MemoryStore::new().with_object("vacation-old.zip").into_shared();

        let err = run(Arc::clone(&store), &options(dir.path(), RunMode::Gallery))
            .await
            .unwrap_err();

        assert!(matches!(err, GalleryError::CollisionDetected { .. }));
        assert!(store.completion_order().is_empty());
        assert_eq!(store.keys(), vec!["vacation-old.zip"]);
    }

    #[tokio::test]
    async fn test_existing_album_prefix_collides() {
        let dir = vacation_dir();
        let store = MemoryStore::new()
            .with_object("pictures/vacation/index.html")
            .into_shared();

        let err = run(store, &options(dir.path(), RunMode::Gallery))
            .await
            .unwrap_err();
        assert!(matches!(err, GalleryError::CollisionDetected { .. }));
    }

    #[tokio::test]
    async fn test_force_overwrites() {
        let dir = vacation_dir();
        let store = MemoryStore::new().with_object("vacation-old.zip").into_shared();
        let mut opts = options(dir.path(), RunMode::Gallery);
        opts.force = true;

        run(Arc::clone(&store), &opts).await.unwrap();
        assert_eq!(store.completion_order().len(), 6);
    }

    #[tokio::test]
    async fn test_flat_run_uploads_only_archive() {
        let dir = vacation_dir();
        // A neighbouring key under the album prefix does not block a flat upload
        let store = MemoryStore::new()
            .with_object("backups/vacation.zip.old")
            .into_shared();
        let mut opts = options(dir.path(), RunMode::Flat);
        opts.key_name = Some("backups/vacation.zip".to_string());

        let report = run(Arc::clone(&store), &opts).await.unwrap();

        assert_eq!(store.completion_order(), vec!["backups/vacation.zip"]);
        assert_eq!(
            report.link.as_deref(),
            Some("http://s3.amazonaws.com/photos/backups/vacation.zip")
        );
    }

    #[tokio::test]
    async fn test_flat_run_refuses_exact_key() {
        let dir = vacation_dir();
        let store = MemoryStore::new()
            .with_object("pictures/vacation/vacation.zip")
            .into_shared();

        let err = run(store, &options(dir.path(), RunMode::Flat))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GalleryError::CollisionDetected { ref existing, .. }
                if existing == "pictures/vacation/vacation.zip"
        ));
    }

    #[tokio::test]
    async fn test_empty_directory_uploads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::new().into_shared();

        let report = run(Arc::clone(&store), &options(dir.path(), RunMode::Gallery))
            .await
            .unwrap();

        assert_eq!(report.files, 0);
        assert!(report.link.is_none());
        assert!(store.keys().is_empty());
    }

    #[tokio::test]
    async fn test_undecodable_image_fails_run() {
        let dir = vacation_dir();
        fs::write(dir.path().join("c.jpg"), b"not an image").unwrap();
        let store = MemoryStore::new().into_shared();

        let err = run(store, &options(dir.path(), RunMode::Gallery))
            .await
            .unwrap_err();
        assert!(matches!(err, GalleryError::DecodeFailed { .. }));
    }

    #[tokio::test]
    async fn test_upload_failure_fails_run() {
        let dir = vacation_dir();
        let store = MemoryStore::new()
            .failing_on("pictures/vacation/index.html")
            .into_shared();

        let err = run(Arc::clone(&store), &options(dir.path(), RunMode::Gallery))
            .await
            .unwrap_err();

        assert!(matches!(err, GalleryError::RemoteWriteFailed { .. }));
        // Everything else still landed
        assert_eq!(store.keys().len(), 5);
    }

    #[test]
    fn test_validate_requires_names() {
        let dir = tempfile::tempdir().unwrap();

        let mut opts = options(dir.path(), RunMode::Gallery);
        opts.album = None;
        assert!(matches!(opts.validate(), Err(GalleryError::Argument(_))));

        opts.mode = RunMode::Flat;
        assert!(matches!(opts.validate(), Err(GalleryError::Argument(_))));

        opts.key_name = Some("a.zip".to_string());
        assert!(opts.validate().is_ok());
    }

    #[tokio::test]
    async fn test_key_name_rejected_in_gallery_mode() {
        let dir = vacation_dir();
        let store = MemoryStore::new().into_shared();
        let mut opts = options(dir.path(), RunMode::Gallery);
        opts.key_name = Some("backups/trip.zip".to_string());

        assert!(matches!(opts.validate(), Err(GalleryError::Argument(_))));
        assert!(matches!(plan(&opts), Err(GalleryError::Argument(_))));
        let err = run(Arc::clone(&store), &opts).await.unwrap_err();
        assert!(matches!(err, GalleryError::Argument(_)));
        assert!(store.keys().is_empty());
    }

    #[test]
    fn test_plan_lists_keys() {
        let dir = vacation_dir();
        let (files, keys) = plan(&options(dir.path(), RunMode::Gallery)).unwrap();

        assert_eq!(files.len(), 2);
        assert_eq!(
            keys,
            vec![
                "pictures/vacation/vacation.zip",
                "pictures/vacation/images/a.jpg.jpg",
                "pictures/vacation/thumbnails/a.jpg.jpg",
                "pictures/vacation/images/b.jpg.jpg",
                "pictures/vacation/thumbnails/b.jpg.jpg",
                "pictures/vacation/index.html",
            ]
        );
    }
}
