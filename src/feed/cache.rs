use std::{
    fs::{self, File},
    io::BufReader,
    path::PathBuf,
};

use log::{info, warn};

use crate::model::Publication;

const FEED_CACHE: &str = "feed.json";

/// Last feed seen from the backend, kept on disk for offline reads.
#[derive(Debug, Clone, Default)]
pub struct FeedCache {
    dir: Option<PathBuf>,
}

impl FeedCache {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    pub fn disabled() -> Self {
        Self { dir: None }
    }

    fn path(&self) -> Option<PathBuf> {
        self.dir.as_ref().map(|dir| dir.join(FEED_CACHE))
    }

    pub fn load(&self) -> Option<Vec<Publication>> {
        let path = self.path()?;
        if !path.exists() {
            return None;
        }

        info!("Loading cache {:?}", &path);
        let file = File::open(&path)
            .map_err(|e| warn!("Cannot open cache {:?}: {}", &path, e))
            .ok()?;
        serde_json::from_reader(BufReader::new(file))
            .map_err(|e| warn!("Ignoring broken cache {:?}: {}", &path, e))
            .ok()
    }

    pub fn save(&self, publications: &[Publication]) {
        let Some(path) = self.path() else {
            return;
        };

        let result = path
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|_| File::create(&path))
            .map_err(|e| e.to_string())
            .and_then(|file| serde_json::to_writer(file, publications).map_err(|e| e.to_string()));
        match result {
            Ok(()) => info!("Saving cache {:?}", &path),
            Err(e) => warn!("Cannot write cache {:?}: {}", &path, e),
        }
    }
}
