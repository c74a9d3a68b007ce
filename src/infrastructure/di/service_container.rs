//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::DefinitionService;
use crate::config::Settings;
use crate::infrastructure::error::{InfraError, InfraResult};
use crate::infrastructure::traits::{FileSystem, RealFileSystem};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Experiment definition service
    pub definitions: DefinitionService,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> InfraResult<Self> {
        Self::with_deps(settings, Arc::new(RealFileSystem))
    }

    /// Create a service container with custom dependencies (for testing).
    ///
    /// The configured log directory is created up front.
    pub fn with_deps(settings: Settings, fs: Arc<dyn FileSystem>) -> InfraResult<Self> {
        if let Some(dir) = &settings.log_dir {
            fs.create_dir_all(dir).map_err(|e| {
                InfraError::io(format!("create log directory {}", dir.display()), e)
            })?;
        }

        let settings = Arc::new(settings);
        let definitions = DefinitionService::new(Arc::clone(&fs), Arc::clone(&settings));

        Ok(Self {
            settings,
            fs,
            definitions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn given_log_dir_when_creating_container_then_directory_exists() {
        let temp = TempDir::new().unwrap();
        let logs = temp.path().join("nested/logs");
        let settings = Settings {
            log_dir: Some(logs.clone()),
            ..Settings::default()
        };

        let container = ServiceContainer::new(settings).unwrap();

        assert!(logs.is_dir());
        assert_eq!(container.definitions.settings().log_dir, Some(logs));
    }

    #[test]
    fn given_log_dir_below_a_file_when_creating_container_then_io_error() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("plain");
        std::fs::write(&file, "x").unwrap();
        let settings = Settings {
            log_dir: Some(file.join("logs")),
            ..Settings::default()
        };

        let err = ServiceContainer::new(settings).err().unwrap();

        assert!(matches!(err, InfraError::Io { .. }));
    }
}
