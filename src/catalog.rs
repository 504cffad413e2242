use std::path::Path;

use crate::engine::ResourceLookup;
use crate::model::Resource;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid catalog {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("duplicate resource id in catalog: {0}")]
    Duplicate(String),
}

/// Fixed resource list loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    resources: Vec<Resource>,
}

impl StaticCatalog {
    pub fn new(resources: Vec<Resource>) -> Result<Self, CatalogError> {
        for (i, r) in resources.iter().enumerate() {
            if resources[..i].iter().any(|other| other.id == r.id) {
                return Err(CatalogError::Duplicate(r.id.clone()));
            }
        }
        Ok(Self { resources })
    }

    /// The built-in rooms and equipment used when no catalog file is configured.
    pub fn sample() -> Self {
        Self {
            resources: vec![
                Resource::new("conf-room-a", "Conference Room A", "Meeting Room"),
                Resource::new("conf-room-b", "Conference Room B", "Meeting Room"),
                Resource::new("projector-1", "Projector #1", "Equipment"),
                Resource::new("laptop-cart", "Laptop Cart", "Equipment"),
                Resource::new("video-studio", "Video Studio", "Studio"),
            ],
        }
    }

    /// Load a JSON array of `{id, name, type}` objects.
    pub fn from_json_file(path: &Path) -> Result<Self, CatalogError> {
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: display.clone(),
            source,
        })?;
        let resources: Vec<Resource> =
            serde_json::from_str(&raw).map_err(|source| CatalogError::Parse {
                path: display,
                source,
            })?;
        Self::new(resources)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl ResourceLookup for StaticCatalog {
    fn get(&self, resource_id: &str) -> Option<Resource> {
        self.resources.iter().find(|r| r.id == resource_id).cloned()
    }

    fn all(&self) -> Vec<Resource> {
        self.resources.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str, contents: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join("slotkeeper_test_catalog");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn sample_has_five_resources() {
        let c = StaticCatalog::sample();
        assert_eq!(c.len(), 5);
        assert!(c.exists("conf-room-a"));
        assert!(c.exists("video-studio"));
        assert!(!c.exists("Conference Room A"));
        assert_eq!(c.get("projector-1").unwrap().kind, "Equipment");
    }

    #[test]
    fn load_from_json() {
        let path = temp_file(
            "ok.json",
            r#"[{"id":"lab-1","name":"Lab One","type":"Lab"},{"id":"van","name":"Van","type":"Vehicle"}]"#,
        );
        let c = StaticCatalog::from_json_file(&path).unwrap();
        assert_eq!(c.len(), 2);
        assert_eq!(c.get("van").unwrap().name, "Van");
    }

    #[test]
    fn duplicate_ids_rejected() {
        let path = temp_file(
            "dup.json",
            r#"[{"id":"a","name":"A","type":"x"},{"id":"a","name":"A2","type":"x"}]"#,
        );
        let err = StaticCatalog::from_json_file(&path).unwrap_err();
        assert!(matches!(err, CatalogError::Duplicate(ref id) if id == "a"));
    }

    #[test]
    fn malformed_json_rejected() {
        let path = temp_file("bad.json", "{not json");
        assert!(matches!(
            StaticCatalog::from_json_file(&path),
            Err(CatalogError::Parse { .. })
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let path = std::env::temp_dir().join("slotkeeper_no_such_catalog.json");
        assert!(matches!(
            StaticCatalog::from_json_file(&path),
            Err(CatalogError::Io { .. })
        ));
    }
}
