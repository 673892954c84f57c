use crate::error::Result;
use crate::models::ActorProfile;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Load/save boundary for actor profiles across process restarts.
pub trait ProfileRepository: Send + Sync {
    fn load_all(&self) -> Result<Vec<ActorProfile>>;

    fn save(&self, profile: &ActorProfile) -> Result<()>;
}

/// One `<hex actor id>.json` file per profile in a directory.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    dir: PathBuf,
}

impl JsonFileRepository {
    /// Creates the directory if it does not exist yet.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, profile: &ActorProfile) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(profile.actor_id.as_str())))
    }
}

/// Lower-case hex of the id bytes. Distinct ids always get distinct file
/// names, including on case-insensitive file systems.
fn file_stem(actor_id: &str) -> String {
    hex::encode(actor_id.as_bytes())
}

impl ProfileRepository for JsonFileRepository {
    fn load_all(&self) -> Result<Vec<ActorProfile>> {
        let mut profiles = Vec::new();

        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }

            let raw = fs::read_to_string(&path)?;
            match serde_json::from_str::<ActorProfile>(&raw) {
                Ok(profile) => profiles.push(profile),
                Err(e) => warn!("Skipping unreadable profile {}: {}", path.display(), e),
            }
        }

        profiles.sort_by(|a, b| a.actor_id.cmp(&b.actor_id));
        debug!("Loaded {} profiles from {}", profiles.len(), self.dir.display());
        Ok(profiles)
    }

    fn save(&self, profile: &ActorProfile) -> Result<()> {
        let path = self.path_for(profile);
        let tmp = path.with_extension("json.tmp");

        fs::write(&tmp, serde_json::to_vec_pretty(profile)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::*;

    fn profile(id: &str, likes: usize) -> ActorProfile {
        let actor = ActorId::new(id).unwrap();
        let mut profile = ActorProfile::new(actor.clone());
        for i in 0..likes {
            let item = Item::new(ItemId::new(format!("item{}", i)).unwrap(), "Museum", "Museum")
                .with_tags(["art"])
                .with_rating(4.5, 10);
            profile.behavior_history.push(BehaviorEvent::new(actor.clone(), item, Action::Like));
        }
        profile.learning_metrics = LearningMetrics::for_history(likes, 50);
        profile
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path()).unwrap();

        repo.save(&profile("user_b", 1)).unwrap();
        repo.save(&profile("user_a", 2)).unwrap();

        let loaded = repo.load_all().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].actor_id.as_str(), "user_a");
        assert_eq!(loaded[0].behavior_history.len(), 2);
        assert_eq!(loaded[0].behavior_history[1].item_id.as_str(), "item1");
        assert_eq!(loaded[1].actor_id.as_str(), "user_b");
    }

    #[test]
    fn test_save_overwrites_previous_version() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path()).unwrap();

        repo.save(&profile("user_a", 1)).unwrap();
        repo.save(&profile("user_a", 3)).unwrap();

        let loaded = repo.load_all().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].total_interactions(), 3);
    }

    #[test]
    fn test_unsafe_ids_stay_inside_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path()).unwrap();

        repo.save(&profile("../escape/me", 1)).unwrap();
        assert!(dir.path().join("2e2e2f6573636170652f6d65.json").exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
        assert_eq!(repo.load_all().unwrap()[0].actor_id.as_str(), "../escape/me");
    }

    #[test]
    fn test_similar_ids_keep_separate_files() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path()).unwrap();

        repo.save(&profile("alice.smith", 3)).unwrap();
        repo.save(&profile("alice_smith", 1)).unwrap();
        repo.save(&profile("Alice_Smith", 2)).unwrap();

        let loaded = repo.load_all().unwrap();
        let counts: Vec<(&str, usize)> = loaded
            .iter()
            .map(|profile| (profile.actor_id.as_str(), profile.total_interactions()))
            .collect();
        assert_eq!(counts, vec![("Alice_Smith", 2), ("alice.smith", 3), ("alice_smith", 1)]);
    }

    #[test]
    fn test_unreadable_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path()).unwrap();

        fs::write(dir.path().join("broken.json"), "{not json").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        repo.save(&profile("user_a", 1)).unwrap();

        assert_eq!(repo.load_all().unwrap().len(), 1);
    }
}
