//! Experiment definition service
//!
//! Applies situation overrides to every experiment definition of a document:
//! the situation tree of each `RESULTS` node is flattened and the entries are
//! appended to that node's values.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info, info_span, instrument};

use crate::application::log::{clean_log_dir, ExperimentLog};
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::builder::{BODY_NODE, SITUATION_NODE};
use crate::domain::{build_tree, merge_all_with, ConfigNode, MultiMap, SituationNode};
use crate::infrastructure::traits::FileSystem;

/// Result of applying one experiment definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentSummary {
    pub id: String,
    pub entries_added: usize,
}

/// Transformed document and what was applied to it.
#[derive(Debug, Clone)]
pub struct ApplyOutput {
    /// Source file, None for documents passed as text
    pub path: Option<PathBuf>,
    pub document: ConfigNode,
    pub experiments: Vec<ExperimentSummary>,
}

impl ApplyOutput {
    pub fn to_cfg_string(&self) -> String {
        self.document.to_cfg_string()
    }

    pub fn entries_added(&self) -> usize {
        self.experiments.iter().map(|e| e.entries_added).sum()
    }
}

/// Flattened entries of one experiment, in merge order.
#[derive(Debug, Clone)]
pub struct FlattenedExperiment {
    pub id: String,
    pub entries: MultiMap<String, String>,
}

/// Situation trees of one experiment, for display.
#[derive(Debug, Clone)]
pub struct ExperimentTrees {
    pub id: String,
    pub roots: Vec<SituationNode>,
}

/// Service applying situation overrides to experiment definitions.
pub struct DefinitionService {
    fs: Arc<dyn FileSystem>,
    settings: Arc<Settings>,
}

impl DefinitionService {
    /// Create a new definition service.
    pub fn new(fs: Arc<dyn FileSystem>, settings: Arc<Settings>) -> Self {
        Self { fs, settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Removes old log files when a log directory is configured and cleaning is enabled.
    pub fn prepare_logs(&self) -> ApplicationResult<usize> {
        match (&self.settings.log_dir, self.settings.clean_logs) {
            (Some(dir), true) => clean_log_dir(self.fs.as_ref(), dir),
            _ => Ok(0),
        }
    }

    /// Definition files below `path` (or `path` itself), sorted.
    pub fn collect_files(&self, path: &Path) -> ApplicationResult<Vec<PathBuf>> {
        if self.fs.is_file(path) {
            return Ok(vec![path.to_path_buf()]);
        }
        if !self.fs.is_dir(path) {
            return Err(ApplicationError::InputNotFound(path.to_path_buf()));
        }
        let files = self
            .fs
            .find_files(path, &self.settings.file_extension, None)
            .with_path_context("scan definitions", path)?;
        debug!("collect_files: {} files in {}", files.len(), path.display());
        Ok(files)
    }

    /// Applies every experiment definition in `content`.
    ///
    /// Experiments are processed in document order and the first failure stops
    /// processing. A failing experiment leaves its own `RESULTS` node untouched.
    pub fn apply_document(
        &self,
        content: &str,
        source: Option<&Path>,
    ) -> ApplicationResult<ApplyOutput> {
        let mut document = ConfigNode::parse(content)?;
        let mut experiments = Vec::new();

        let definition_node = self.settings.definition_node.clone();
        for definition in document.get_nodes_mut(&definition_node) {
            let (id, mut entries) = self.run_experiment(definition)?;

            let results = definition
                .get_node_mut(&self.settings.results_node)
                .ok_or_else(|| ApplicationError::MissingNode {
                    node: self.settings.results_node.clone(),
                    context: format!("experiment {id}"),
                })?;
            let entries_added = entries.len();
            results.values.append(&mut entries);

            if self.settings.strip_sources {
                let stripped =
                    results.remove_nodes(SITUATION_NODE) + results.remove_nodes(BODY_NODE);
                debug!("{}: stripped {} source nodes", id, stripped);
            }

            info!("{}: added {} entries", id, entries_added);
            experiments.push(ExperimentSummary { id, entries_added });
        }

        Ok(ApplyOutput {
            path: source.map(Path::to_path_buf),
            document,
            experiments,
        })
    }

    /// Applies the definitions of a single file. The file itself is not modified.
    #[instrument(level = "debug", skip(self))]
    pub fn apply_file(&self, path: &Path) -> ApplicationResult<ApplyOutput> {
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read definitions", path)?;
        self.apply_document(&content, Some(path))
            .map_err(|e| in_document(path, e))
    }

    /// Applies all definition files below `path` in parallel.
    ///
    /// Every file is processed independently; the first error in file order is returned.
    pub fn apply_path(&self, path: &Path) -> ApplicationResult<Vec<ApplyOutput>> {
        let files = self.collect_files(path)?;

        let results: Vec<ApplicationResult<ApplyOutput>> =
            files.par_iter().map(|file| self.apply_file(file)).collect();

        results.into_iter().collect()
    }

    /// Writes each output back to its source file.
    ///
    /// Files without experiment definitions are left untouched, comments and
    /// formatting included.
    pub fn write_in_place(&self, outputs: &[ApplyOutput]) -> ApplicationResult<usize> {
        let mut written = 0;
        for output in outputs {
            if output.experiments.is_empty() {
                continue;
            }
            if let Some(path) = &output.path {
                self.fs
                    .write_atomic(path, &output.to_cfg_string())
                    .with_path_context("write definitions", path)?;
                written += 1;
            }
        }
        Ok(written)
    }

    /// Flattened entries of every experiment in `content`, without applying them.
    pub fn flatten_document(&self, content: &str) -> ApplicationResult<Vec<FlattenedExperiment>> {
        let document = ConfigNode::parse(content)?;
        document
            .get_nodes(&self.settings.definition_node)
            .map(|definition| {
                self.run_experiment(definition)
                    .map(|(id, entries)| FlattenedExperiment { id, entries })
            })
            .collect()
    }

    /// Flattened entries of every experiment below `path`, in file order.
    pub fn flatten_path(&self, path: &Path) -> ApplicationResult<Vec<FlattenedExperiment>> {
        let mut flattened = Vec::new();
        for file in self.collect_files(path)? {
            let content = self
                .fs
                .read_to_string(&file)
                .with_path_context("read definitions", &file)?;
            let experiments = self
                .flatten_document(&content)
                .map_err(|e| in_document(&file, e))?;
            flattened.extend(experiments);
        }
        Ok(flattened)
    }

    /// Situation trees of every experiment below `path`.
    pub fn situation_trees(&self, path: &Path) -> ApplicationResult<Vec<ExperimentTrees>> {
        let mut trees = Vec::new();
        for file in self.collect_files(path)? {
            let content = self
                .fs
                .read_to_string(&file)
                .with_path_context("read definitions", &file)?;
            let document = ConfigNode::parse(&content)
                .map_err(|e| in_document(&file, e.into()))?;

            for definition in document.get_nodes(&self.settings.definition_node) {
                let id = self
                    .experiment_id(definition)
                    .map_err(|e| in_document(&file, e))?;
                let roots = self
                    .results_of(definition, &id)
                    .and_then(|results| build_tree(results).map_err(ApplicationError::from))
                    .map_err(|e| in_document(&file, e))?;
                trees.push(ExperimentTrees { id, roots });
            }
        }
        Ok(trees)
    }

    /// Flattens one definition into a fresh map, logging to the experiment's own log.
    fn run_experiment(
        &self,
        definition: &ConfigNode,
    ) -> ApplicationResult<(String, MultiMap<String, String>)> {
        let id = self.experiment_id(definition)?;
        let span = info_span!("experiment", id = %id);
        let _enter = span.enter();

        let mut log = ExperimentLog::open(
            Arc::clone(&self.fs),
            self.settings.log_dir.as_deref(),
            &id,
        );

        match self.flatten_definition(definition, &id, &mut log) {
            Ok(entries) => {
                log.log(format!("Flattened {} entries", entries.len()));
                Ok((id, entries))
            }
            Err(e) => {
                log.log_error(&e);
                Err(ApplicationError::Experiment {
                    id,
                    source: Box::new(e),
                })
            }
        }
    }

    fn flatten_definition(
        &self,
        definition: &ConfigNode,
        id: &str,
        log: &mut ExperimentLog,
    ) -> ApplicationResult<MultiMap<String, String>> {
        let results = self.results_of(definition, id)?;
        let roots = build_tree(results)?;

        let mut scratch = MultiMap::new();
        merge_all_with(&roots, &mut scratch, "", log)?;
        Ok(scratch)
    }

    fn experiment_id(&self, definition: &ConfigNode) -> ApplicationResult<String> {
        definition
            .get_value(&self.settings.id_key)
            .map(str::to_string)
            .ok_or_else(|| ApplicationError::MissingValue {
                key: self.settings.id_key.clone(),
                node: self.settings.definition_node.clone(),
            })
    }

    fn results_of<'a>(
        &self,
        definition: &'a ConfigNode,
        id: &str,
    ) -> ApplicationResult<&'a ConfigNode> {
        definition
            .get_node(&self.settings.results_node)
            .ok_or_else(|| ApplicationError::MissingNode {
                node: self.settings.results_node.clone(),
                context: format!("experiment {id}"),
            })
    }
}

fn in_document(path: &Path, source: ApplicationError) -> ApplicationError {
    ApplicationError::Document {
        path: path.to_path_buf(),
        source: Box::new(source),
    }
}
