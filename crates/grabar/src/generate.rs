//! Spec generation: steps + locator choices + parameter bindings become a
//! test bundle on disk.
//!
//! Generation is deterministic: identical inputs produce byte-identical
//! spec and metadata content. The only timestamped field (`lastRunAt`) is
//! written by the execution collaborator, never here.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use grabar_script::emit::{emit_spec_file, emit_stmt, validate_param_name};
use grabar_script::stmt::{Arg, Stmt};

use crate::bundle::{bundle_paths, write_artifact, BundleGuard, TestBundle};
use crate::index::merge_index;
use crate::locator::Locator;
use crate::result::{GrabarError, GrabarResult};
use crate::step::RecordedStep;

/// Outcome of a prior run, recorded by the execution collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Last run passed
    Passed,
    /// Last run failed
    Failed,
    /// Last run was skipped
    Skipped,
    /// No run recorded
    Unknown,
}

/// One extracted parameter in metadata: the name used in the spec and the
/// literal it replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSpec {
    /// Parameter name (`data.<name>` in the spec)
    pub name: String,
    /// Original literal value
    pub source: String,
}

/// One assertion carried by the test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionSpec {
    /// Human-readable description
    pub description: String,
}

/// The structured metadata document, consumed by execution and diagnosis
/// collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestMeta {
    /// Display name of the test
    pub test_name: String,
    /// Functional module the test belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    /// Extracted parameters
    pub parameters: Vec<ParameterSpec>,
    /// Assertions the test makes
    pub assertions: Vec<AssertionSpec>,
    /// Relative path of the companion data file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_file_ref: Option<String>,
    /// When the test last ran (set by the execution collaborator)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Outcome of the last run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_status: Option<RunStatus>,
    /// Links to tracker issues and dashboards
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub external_links: Vec<String>,
}

/// Binding of one step's literal value to a named parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterBinding {
    /// Order of the step whose value is bound
    pub step_order: u32,
    /// Parameter name
    pub name: String,
    /// The literal value being replaced
    pub source: String,
}

/// Everything the generator needs for one bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    /// Display name of the test
    pub test_name: String,
    /// Functional module
    #[serde(default)]
    pub module: Option<String>,
    /// Steps in capture order
    pub steps: Vec<RecordedStep>,
    /// Chosen locator per step order; falls back to the step's best
    /// candidate
    #[serde(default)]
    pub selected_locators: BTreeMap<u32, Locator>,
    /// Confirmed parameter bindings
    #[serde(default)]
    pub bindings: Vec<ParameterBinding>,
    /// Links to carry into metadata
    #[serde(default)]
    pub external_links: Vec<String>,
}

/// Assembles and writes test bundles under one root directory.
#[derive(Debug, Clone)]
pub struct SpecGenerator {
    root: PathBuf,
}

impl SpecGenerator {
    /// Generator over a bundle root.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The bundle root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Generate a bundle. Existing bundle artifacts for the same slug are
    /// replaced; an existing data file is never overwritten.
    pub fn generate(&self, request: &GenerateRequest) -> GrabarResult<TestBundle> {
        let slug = crate::bundle::slug(&request.test_name);
        if slug.is_empty() {
            return Err(GrabarError::InvalidName {
                name: request.test_name.clone(),
                reason: "no slug-safe characters".to_string(),
            });
        }
        for binding in &request.bindings {
            validate_param_name(&binding.name).map_err(|e| GrabarError::InvalidName {
                name: binding.name.clone(),
                reason: e.to_string(),
            })?;
        }

        let paths = bundle_paths(&self.root, &slug);
        let _guard = BundleGuard::acquire(&paths.dir, &slug)?;

        let mut steps: Vec<&RecordedStep> = request.steps.iter().collect();
        steps.sort_by_key(|s| s.order);

        let bindings_by_step: BTreeMap<u32, &ParameterBinding> = request
            .bindings
            .iter()
            .map(|b| (b.step_order, b))
            .collect();

        let mut body = Vec::new();
        let mut assertions = Vec::new();
        let mut chosen_locators = Vec::new();
        for step in &steps {
            let chosen = request.selected_locators.get(&step.order);
            let value_arg = bindings_by_step
                .get(&step.order)
                .map(|b| Arg::DataRef(b.name.clone()));
            let Some(stmt) = step.to_stmt(chosen, value_arg) else {
                tracing::warn!(order = step.order, "skipping incoherent step");
                continue;
            };
            if let Stmt::Expectation { check, .. } = &stmt {
                assertions.push(AssertionSpec {
                    description: check.describe(),
                });
            }
            if let Some(locator) = chosen.or_else(|| step.primary_locator()) {
                chosen_locators.push(locator.clone());
            }
            body.push(format!("// @step:{} {}", step.fingerprint(), step.title()));
            body.push(emit_stmt(&stmt));
        }

        let data_ref = (!request.bindings.is_empty())
            .then(|| format!("../data/{slug}Data.json"));
        let spec_source = emit_spec_file(&request.test_name, data_ref.as_deref(), &body);

        let meta = TestMeta {
            test_name: request.test_name.clone(),
            module: request.module.clone(),
            parameters: request
                .bindings
                .iter()
                .map(|b| ParameterSpec {
                    name: b.name.clone(),
                    source: b.source.clone(),
                })
                .collect(),
            assertions,
            data_file_ref: data_ref.clone(),
            last_run_at: None,
            last_status: None,
            external_links: request.external_links.clone(),
        };
        let mut meta_json = serde_json::to_string_pretty(&meta)?;
        meta_json.push('\n');

        let meta_md = meta_markdown(request, &slug, &steps);

        std::fs::create_dir_all(&paths.dir).map_err(|e| GrabarError::ArtifactWrite {
            slug: slug.clone(),
            path: paths.dir.clone(),
            operation: "generate",
            message: e.to_string(),
        })?;

        write_artifact(&slug, "generate", &paths.spec, &spec_source)?;
        write_artifact(&slug, "generate", &paths.meta_json, &meta_json)?;
        write_artifact(&slug, "generate", &paths.meta_md, &meta_md)?;

        let mut has_data_file = paths.data_file.is_file();
        if data_ref.is_some() && !has_data_file {
            let parent = paths.data_file.parent().expect("data file has a parent");
            std::fs::create_dir_all(parent).map_err(|e| GrabarError::ArtifactWrite {
                slug: slug.clone(),
                path: parent.to_path_buf(),
                operation: "generate",
                message: e.to_string(),
            })?;
            let row: BTreeMap<&str, &str> = request
                .bindings
                .iter()
                .map(|b| (b.name.as_str(), b.source.as_str()))
                .collect();
            let mut data_json = serde_json::to_string_pretty(&vec![row])?;
            data_json.push('\n');
            write_artifact(&slug, "generate", &paths.data_file, &data_json)?;
            has_data_file = true;
        }

        merge_index(&self.root, &slug, &chosen_locators)?;

        tracing::info!(slug = %slug, steps = steps.len(), "bundle generated");
        Ok(TestBundle {
            paths,
            has_data_file,
        })
    }
}

/// The free-text summary document for the diagnosis collaborator.
fn meta_markdown(request: &GenerateRequest, slug: &str, steps: &[&RecordedStep]) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {}\n\n", request.test_name));
    if let Some(module) = &request.module {
        out.push_str(&format!("Module: {module}\n\n"));
    }
    out.push_str("## Intent\n\n");
    out.push_str(&format!(
        "Recorded flow \"{}\" ({} steps, {} parameters). Bundle slug: `{slug}`.\n\n",
        request.test_name,
        steps.len(),
        request.bindings.len()
    ));
    out.push_str("## Steps\n\n");
    for (idx, step) in steps.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", idx + 1, step.title()));
    }
    if !request.bindings.is_empty() {
        out.push_str("\n## Parameters\n\n");
        for binding in &request.bindings {
            out.push_str(&format!("- `{}` (from '{}')\n", binding.name, binding.source));
        }
    }
    out
}
