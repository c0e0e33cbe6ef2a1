use tracing::{info, warn};

use super::store::ObjectStore;
use crate::error::{GalleryError, Result};

/// What counts as "already there"
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollisionTarget {
    /// A remote key equal to this one
    Key(String),
    /// Any remote key starting with this prefix
    Prefix(String),
}

impl CollisionTarget {
    fn candidate(&self) -> &str {
        match self {
            Self::Key(key) | Self::Prefix(key) => key,
        }
    }

    fn matches(&self, remote_key: &str) -> bool {
        match self {
            Self::Key(key) => remote_key == key,
            Self::Prefix(prefix) => remote_key.starts_with(prefix.as_str()),
        }
    }
}

/// First remote key that collides with any of `targets`
pub fn find_collision<'a>(
    remote_keys: &'a [String],
    targets: &[CollisionTarget],
) -> Option<(&'a str, String)> {
    remote_keys.iter().find_map(|remote| {
        targets
            .iter()
            .find(|target| target.matches(remote))
            .map(|target| (remote.as_str(), target.candidate().to_string()))
    })
}

/// List the bucket and fail with `CollisionDetected` if anything matches
///
/// With `force` set the listing is skipped entirely. A listing failure
/// always aborts: without it there is no way to tell what would be overwritten.
pub async fn ensure_no_collision<S: ObjectStore>(
    store: &S,
    bucket: &str,
    targets: &[CollisionTarget],
    force: bool,
) -> Result<()> {
    if force {
        warn!("Force upload set, existing objects may be overwritten");
        return Ok(());
    }

    let remote_keys = store.list_keys(bucket).await?;
    match find_collision(&remote_keys, targets) {
        Some((existing, candidate)) => Err(GalleryError::CollisionDetected {
            candidate,
            existing: existing.to_string(),
        }),
        None => {
            info!(
                "No collisions among {} existing objects in {}",
                remote_keys.len(),
                bucket
            );
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::s3::memory::MemoryStore;

    fn keys(keys: &[&str]) -> Vec<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn test_exact_key_match() {
        let remote = keys(&["pictures/vacation/vacation.zip", "other.zip"]);
        let exact = [CollisionTarget::Key("pictures/vacation/vacation.zip".to_string())];
        assert_eq!(
            find_collision(&remote, &exact),
            Some((
                "pictures/vacation/vacation.zip",
                "pictures/vacation/vacation.zip".to_string()
            ))
        );

        // A longer key is not an exact match
        let remote = keys(&["pictures/vacation/vacation.zip.bak"]);
        assert_eq!(find_collision(&remote, &exact), None);
    }

    #[test]
    fn test_prefix_match() {
        let prefix = [CollisionTarget::Prefix("vacation".to_string())];

        assert!(find_collision(&keys(&["vacation/a.jpg"]), &prefix).is_some());
        assert!(find_collision(&keys(&["vacation"]), &prefix).is_some());
        assert!(find_collision(&keys(&["pictures/vacation/a.jpg"]), &prefix).is_none());
        assert!(find_collision(&[], &prefix).is_none());
    }

    #[tokio::test]
    async fn test_collision_blocks_unless_forced() {
        let store = MemoryStore::new().with_object("vacation.zip");
        let targets = [CollisionTarget::Prefix("vacation".to_string())];

        let err = ensure_no_collision(&store, "photos", &targets, false)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GalleryError::CollisionDetected { ref existing, .. } if existing == "vacation.zip"
        ));

        assert!(ensure_no_collision(&store, "photos", &targets, true).await.is_ok());
    }

    #[tokio::test]
    async fn test_listing_failure_aborts() {
        let store = MemoryStore::new().failing_listing();
        let targets = [CollisionTarget::Key("a.zip".to_string())];

        let err = ensure_no_collision(&store, "photos", &targets, false)
            .await
            .unwrap_err();
        assert!(matches!(err, GalleryError::RemoteListFailed { .. }));
    }
}
