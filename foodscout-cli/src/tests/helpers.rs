//! Test helpers for writing fixtures and temporary workspaces.

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

/// Two recorded pages with three restaurants near Taipei Main Station.
pub(super) const STATION_FIXTURE: &str = r#"[
  {
    "status": "OK",
    "next_page_token": "recorded",
    "results": [
      {
        "geometry": {"location": {"lat": 25.0503, "lng": 121.5302}},
        "name": "Yongkang Beef Noodles",
        "place_id": "beef-noodles",
        "vicinity": "Jinshan South Road",
        "rating": 4.3,
        "opening_hours": {"open_now": true}
      },
      {
        "geometry": {"location": {"lat": 25.0497, "lng": 121.5297}},
        "name": "Station Dumpling House",
        "place_id": "dumpling-house",
        "vicinity": "Zhongxiao West Road",
        "rating": 4.1
      }
    ]
  },
  {
    "status": "OK",
    "results": [
      {
        "geometry": {"location": {"lat": 25.0499, "lng": 121.5306}},
        "name": "Corner Tea Stand",
        "place_id": "tea-stand",
        "vicinity": "Exit M4"
      }
    ]
  }
]"#;

pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        Self { _dir: dir, root }
    }

    pub(super) fn path(&self, name: &str) -> Utf8PathBuf {
        self.root.join(name)
    }

    /// Write [`STATION_FIXTURE`] and return its path.
    pub(super) fn station_fixture(&self) -> Utf8PathBuf {
        let path = self.path("places.json");
        write_utf8(&path, STATION_FIXTURE.as_bytes());
        path
    }
}

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent directories");
    }
    std::fs::write(path, contents).expect("write file");
}
