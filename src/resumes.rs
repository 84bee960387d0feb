//! Resume File-Lifecycle Manager
//!
//! Binds an uploaded binary artifact to a database row with a generated
//! identity and keeps the two in lockstep: create writes the artifact first
//! and only keeps it once the row commits; delete removes the artifact (if
//! still there) before the row. Per-resume states are `absent → active`
//! (create), `active → active` (update) and `active → absent` (delete);
//! operating on an unknown id is `NotFound`.

use crate::artifacts::ArtifactStore;
use crate::error::ApiError;
use crate::store::Store;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resume {
    pub id: String,
    pub job_title: String,
    pub field: String,
    /// On-disk artifact name, `{id}_{original-upload-name}`.
    pub filename: String,
    /// Retrieval locator derived from `filename`.
    pub url: String,
}

/// Upload: identity, artifact, then row. The guard deletes the artifact on
/// any exit path that does not reach a committed insert.
pub fn create_resume(
    store: &Store,
    artifacts: &ArtifactStore,
    job_title: String,
    field: String,
    original_name: &str,
    bytes: &[u8],
) -> Result<Resume, ApiError> {
    let id = Uuid::new_v4().to_string();
    let filename = artifacts.artifact_name(&id, original_name);
    let guard = artifacts.write_guarded(&filename, bytes)?;

    let resume = Resume {
        url: artifacts.url_for(&filename),
        id,
        job_title,
        field,
        filename,
    };
    store.insert_resume(&resume)?;
    guard.commit();

    log::info!("stored resume {} ({})", resume.id, resume.filename);
    Ok(resume)
}

/// Metadata is always replaced; the artifact only when a new file arrives.
/// A replacement keeps the existing id in the derived name, and the
/// superseded artifact is removed best-effort once the row is committed.
pub fn update_resume(
    store: &Store,
    artifacts: &ArtifactStore,
    id: &str,
    job_title: String,
    field: String,
    file: Option<(String, Vec<u8>)>,
) -> Result<Resume, ApiError> {
    let mut resume = store.get_resume(id)?;
    resume.job_title = job_title;
    resume.field = field;

    match file {
        Some((original_name, bytes)) => {
            let previous = resume.filename.clone();
            let filename = artifacts.artifact_name(&resume.id, &original_name);
            resume.url = artifacts.url_for(&filename);
            resume.filename = filename;

            if resume.filename == previous {
                // Same upload name: the artifact is replaced in place and
                // there is nothing to roll back to.
                artifacts.write(&resume.filename, &bytes)?;
                store.update_resume(&resume)?;
            } else {
                let guard = artifacts.write_guarded(&resume.filename, &bytes)?;
                store.update_resume(&resume)?;
                guard.commit();
                if let Err(err) = artifacts.remove(&previous) {
                    log::warn!("leaving superseded artifact {}: {}", previous, err);
                }
            }
        }
        None => store.update_resume(&resume)?,
    }

    Ok(resume)
}

/// Artifact first (absence is fine, removal failure is logged and the orphan
/// accepted), then the row.
pub fn delete_resume(
    store: &Store,
    artifacts: &ArtifactStore,
    id: &str,
) -> Result<Resume, ApiError> {
    let resume = store.get_resume(id)?;
    if let Err(err) = artifacts.remove(&resume.filename) {
        log::warn!("leaving orphan artifact {}: {}", resume.filename, err);
    }
    store.delete_resume(id)?;
    log::info!("deleted resume {} ({})", resume.id, resume.filename);
    Ok(resume)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn fixtures(dir: &std::path::Path) -> (Store, ArtifactStore) {
        (
            Store::in_memory().unwrap(),
            ArtifactStore::new(dir, "http://localhost:8080").unwrap(),
        )
    }

    #[test]
    fn test_create_derives_filename_and_stores_bytes() {
        let dir = tempdir().unwrap();
        let (store, artifacts) = fixtures(dir.path());

        let resume = create_resume(
            &store,
            &artifacts,
            "Engineer".to_string(),
            "Software".to_string(),
            "cv.pdf",
            b"pdf bytes",
        )
        .unwrap();

        assert_eq!(resume.filename, format!("{}_cv.pdf", resume.id));
        assert_eq!(
            resume.url,
            format!("http://localhost:8080/resumes/download/{}", resume.filename)
        );
        // Byte-identical download round-trip.
        assert_eq!(artifacts.read(&resume.filename).unwrap(), b"pdf bytes");
        assert_eq!(store.get_resume(&resume.id).unwrap(), resume);
    }

    #[test]
    fn test_metadata_update_keeps_artifact() {
        let dir = tempdir().unwrap();
        let (store, artifacts) = fixtures(dir.path());
        let created = create_resume(
            &store,
            &artifacts,
            "Engineer".to_string(),
            "Software".to_string(),
            "cv.pdf",
            b"pdf bytes",
        )
        .unwrap();

        let updated = update_resume(
            &store,
            &artifacts,
            &created.id,
            "Senior Engineer".to_string(),
            "Software".to_string(),
            None,
        )
        .unwrap();

        assert_eq!(updated.job_title, "Senior Engineer");
        assert_eq!(updated.filename, created.filename);
        assert_eq!(artifacts.read(&created.filename).unwrap(), b"pdf bytes");
    }

    #[test]
    fn test_file_replacement_swaps_artifact() {
        let dir = tempdir().unwrap();
        let (store, artifacts) = fixtures(dir.path());
        let created = create_resume(
            &store,
            &artifacts,
            "Engineer".to_string(),
            "Software".to_string(),
            "cv.pdf",
            b"old bytes",
        )
        .unwrap();

        let updated = update_resume(
            &store,
            &artifacts,
            &created.id,
            "Engineer".to_string(),
            "Software".to_string(),
            Some(("cv_v2.pdf".to_string(), b"new bytes".to_vec())),
        )
        .unwrap();

        assert_eq!(updated.filename, format!("{}_cv_v2.pdf", created.id));
        assert_eq!(artifacts.read(&updated.filename).unwrap(), b"new bytes");
        // The superseded artifact is purged.
        assert!(!artifacts.contains(&created.filename));
        assert_eq!(store.get_resume(&created.id).unwrap(), updated);
    }

    #[test]
    fn test_replacement_with_same_name_overwrites_in_place() {
        let dir = tempdir().unwrap();
        let (store, artifacts) = fixtures(dir.path());
        let created = create_resume(
            &store,
            &artifacts,
            "Engineer".to_string(),
            "Software".to_string(),
            "cv.pdf",
            b"old bytes",
        )
        .unwrap();

        let updated = update_resume(
            &store,
            &artifacts,
            &created.id,
            "Engineer".to_string(),
            "Software".to_string(),
            Some(("cv.pdf".to_string(), b"new bytes".to_vec())),
        )
        .unwrap();

        assert_eq!(updated.filename, created.filename);
        assert_eq!(artifacts.read(&created.filename).unwrap(), b"new bytes");
    }

    #[test]
    fn test_update_unknown_id_is_not_found() {
        let dir = tempdir().unwrap();
        let (store, artifacts) = fixtures(dir.path());
        let err = update_resume(
            &store,
            &artifacts,
            "missing",
            "Engineer".to_string(),
            "Software".to_string(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn test_delete_removes_row_and_artifact() {
        let dir = tempdir().unwrap();
        let (store, artifacts) = fixtures(dir.path());
        let created = create_resume(
            &store,
            &artifacts,
            "Engineer".to_string(),
            "Software".to_string(),
            "cv.pdf",
            b"pdf bytes",
        )
        .unwrap();

        delete_resume(&store, &artifacts, &created.id).unwrap();
        assert!(!artifacts.contains(&created.filename));
        assert!(matches!(
            store.get_resume(&created.id).unwrap_err(),
            ApiError::NotFound(_)
        ));
    }

    #[test]
    fn test_delete_succeeds_when_artifact_already_gone() {
        let dir = tempdir().unwrap();
        let (store, artifacts) = fixtures(dir.path());
        let created = create_resume(
            &store,
            &artifacts,
            "Engineer".to_string(),
            "Software".to_string(),
            "cv.pdf",
            b"pdf bytes",
        )
        .unwrap();

        artifacts.remove(&created.filename).unwrap();
        let deleted = delete_resume(&store, &artifacts, &created.id).unwrap();
        assert_eq!(deleted.id, created.id);
        assert!(store.list_resumes().unwrap().is_empty());
    }

    #[test]
    fn test_failed_row_commit_cleans_up_artifact() {
        let dir = tempdir().unwrap();
        let (store, artifacts) = fixtures(dir.path());
        let first = create_resume(
            &store,
            &artifacts,
            "Engineer".to_string(),
            "Software".to_string(),
            "cv.pdf",
            b"pdf bytes",
        )
        .unwrap();

        // Replay the create sequence with an id that collides with the
        // existing row: the insert fails and the guard must take the
        // freshly written artifact with it.
        let filename = artifacts.artifact_name(&first.id, "other.pdf");
        let guard = artifacts.write_guarded(&filename, b"pdf bytes").unwrap();
        let colliding = Resume {
            id: first.id.clone(),
            job_title: "Engineer".to_string(),
            field: "Software".to_string(),
            filename: filename.clone(),
            url: artifacts.url_for(&filename),
        };
        assert!(matches!(
            store.insert_resume(&colliding).unwrap_err(),
            ApiError::Conflict(_)
        ));
        drop(guard);

        assert!(!artifacts.contains(&filename));
        assert!(artifacts.contains(&first.filename));
    }
}
