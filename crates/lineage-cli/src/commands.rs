//! Handlers for the version subcommands.
//!
//! Every handler takes a [`Context`] (resolved project and store) and a
//! writer for its output. Structured results are printed as pretty JSON.

use crate::cli::{Command, Direction, Order, Preset};
use crate::config::LineageConfig;
use crate::{Error, Result};
use lineage::graph::{Diagnostics, LayoutMode, ParentIndex};
use lineage::{
    Assembler, JsonFileStore, KeyValueStore, MetricKey, RelationshipStore, VersionNode,
    layout_versions, sort_versions_by_metric, visible_versions,
};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Resolved state shared by the version subcommands.
pub struct Context<'a, S> {
    /// Relationship store.
    pub store: RelationshipStore<S>,
    /// Selected project, if any.
    pub project: Option<String>,
    /// Effective configuration.
    pub config: &'a LineageConfig,
}

impl<'a> Context<'a, JsonFileStore> {
    /// Opens the file-backed store under the configured data directory.
    pub fn open(config: &'a LineageConfig, project: Option<String>) -> Result<Self> {
        let store = RelationshipStore::new(JsonFileStore::open(config.data_dir.clone())?);
        Ok(Self {
            store,
            project: project.or_else(|| config.default_project.clone()),
            config,
        })
    }
}

impl<S: KeyValueStore> Context<'_, S> {
    fn project(&self) -> Result<String> {
        self.project.clone().ok_or(Error::MissingProject)
    }
}

/// Runs a version subcommand. `config` subcommands are handled elsewhere.
pub fn run<S: KeyValueStore>(
    ctx: &mut Context<'_, S>,
    command: Command,
    out: &mut dyn Write,
) -> Result<()> {
    match command {
        Command::Add { id, parent } => cmd_add(ctx, &id, parent.as_deref(), out),
        Command::Delete { ids } => cmd_delete(ctx, &ids, out),
        Command::Archive { id, set } => cmd_archive(ctx, &id, set, out),
        Command::Archived => cmd_archived(ctx, out),
        Command::Cleanup { ids, versions } => cmd_cleanup(ctx, ids, versions.as_deref(), out),
        Command::Inspect { version, json } => cmd_inspect(ctx, version.as_deref(), json, out),
        Command::Layout {
            versions,
            preset,
            sort_by,
            metric_type,
            order,
            direction,
            include_archived,
        } => {
            let options = LayoutOptions {
                preset,
                sort: sort_by.map(|title| (MetricKey::new(title, metric_type), order)),
                direction,
                include_archived,
            };
            cmd_layout(ctx, &versions, &options, out)
        }
        Command::Enrich { versions, from_store } => cmd_enrich(ctx, &versions, from_store, out),
        Command::Config { .. } => {
            Err(lineage::Error::config("config subcommands are not version commands").into())
        }
    }
}

// ============================================================================
// Relationship commands
// ============================================================================

/// `add`
pub fn cmd_add<S: KeyValueStore>(
    ctx: &mut Context<'_, S>,
    id: &str,
    parent: Option<&str>,
    out: &mut dyn Write,
) -> Result<()> {
    let project = ctx.project()?;
    if ctx.store.add_version(&project, id, parent)? {
        line(out, format_args!("added {id}"))
    } else {
        line(out, format_args!("{id} already recorded"))
    }
}

/// `delete`
pub fn cmd_delete<S: KeyValueStore>(
    ctx: &mut Context<'_, S>,
    ids: &[String],
    out: &mut dyn Write,
) -> Result<()> {
    let project = ctx.project()?;
    let deletions = ctx.store.delete_versions(&project, ids)?;
    for deletion in &deletions {
        match &deletion.parent {
            Some(parent) if !deletion.children.is_empty() => line(
                out,
                format_args!(
                    "deleted {}; children {} moved under {parent}",
                    deletion.version_id,
                    deletion.children.join(", ")
                ),
            )?,
            None if !deletion.children.is_empty() => line(
                out,
                format_args!(
                    "deleted {}; children {} are now roots",
                    deletion.version_id,
                    deletion.children.join(", ")
                ),
            )?,
            _ => line(out, format_args!("deleted {}", deletion.version_id))?,
        }
    }
    let missing = ids.len() - deletions.len();
    if missing > 0 {
        line(out, format_args!("{missing} id(s) had no entry"))?;
    }
    Ok(())
}

/// `archive`
pub fn cmd_archive<S: KeyValueStore>(
    ctx: &mut Context<'_, S>,
    id: &str,
    set: Option<bool>,
    out: &mut dyn Write,
) -> Result<()> {
    let project = ctx.project()?;
    let archived = match set {
        Some(flag) => {
            ctx.store.set_archived(&project, id, flag)?;
            flag
        }
        None => ctx.store.toggle_archive(&project, id)?,
    };
    let state = if archived { "archived" } else { "active" };
    line(out, format_args!("{id} {state}"))
}

/// `archived`
pub fn cmd_archived<S: KeyValueStore>(ctx: &mut Context<'_, S>, out: &mut dyn Write) -> Result<()> {
    let project = ctx.project()?;
    for id in ctx.store.get_archived_versions(&project)? {
        line(out, id)?;
    }
    Ok(())
}

/// `cleanup`
pub fn cmd_cleanup<S: KeyValueStore>(
    ctx: &mut Context<'_, S>,
    ids: Vec<String>,
    versions: Option<&Path>,
    out: &mut dyn Write,
) -> Result<()> {
    let project = ctx.project()?;
    let valid = match versions {
        Some(path) => read_versions(path)?.into_iter().map(|v| v.id).collect(),
        None => ids,
    };
    let removed = ctx.store.cleanup_orphans(&project, &valid)?;
    line(out, format_args!("removed {removed} reference(s)"))
}

// ============================================================================
// Inspection
// ============================================================================

/// One version's neighbourhood.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionReport {
    /// Version id.
    pub id: String,
    /// Parent id.
    pub parent: Option<String>,
    /// Direct children.
    pub children: Vec<String>,
    /// Ancestors, oldest first.
    pub ancestors: Vec<String>,
    /// Archive flag.
    pub archived: bool,
}

/// `inspect`
pub fn cmd_inspect<S: KeyValueStore>(
    ctx: &mut Context<'_, S>,
    version: Option<&str>,
    json: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let project = ctx.project()?;
    match version {
        Some(id) => {
            let report = VersionReport {
                id: id.to_string(),
                parent: ctx.store.get_parent(&project, id)?,
                children: ctx.store.get_children(&project, id)?,
                ancestors: ctx.store.ancestor_chain(&project, id)?,
                archived: ctx.store.is_archived(&project, id)?,
            };
            if json {
                return print_json(out, &report);
            }
            line(out, format_args!("version:   {}", report.id))?;
            line(out, format_args!("parent:    {}", report.parent.as_deref().unwrap_or("-")))?;
            line(out, format_args!("children:  {}", report.children.join(", ")))?;
            line(out, format_args!("ancestors: {}", report.ancestors.join(" -> ")))?;
            line(out, format_args!("archived:  {}", report.archived))
        }
        None => {
            let report = ctx.store.diagnostics(&project)?;
            if json {
                print_json(out, &report)
            } else {
                print_diagnostics(out, &project, &report)
            }
        }
    }
}

fn print_diagnostics(out: &mut dyn Write, project: &str, report: &Diagnostics) -> Result<()> {
    line(out, format_args!("project {project}"))?;
    line(out, format_args!("  roots:   {}", report.roots.join(", ")))?;
    line(out, format_args!("  orphans: {}", report.orphans.join(", ")))?;
    for cycle in &report.cycles {
        line(out, format_args!("  cycle:   {}", cycle.join(" -> ")))?;
    }
    if !report.multi_parent.is_empty() {
        line(out, format_args!("  multi-parent: {}", report.multi_parent.join(", ")))?;
    }
    let verdict = if report.is_healthy() { "healthy" } else { "issues found" };
    line(out, format_args!("  {verdict}"))
}

// ============================================================================
// Layout and enrichment
// ============================================================================

/// Options of the `layout` command.
#[derive(Clone, Debug)]
pub struct LayoutOptions {
    /// Spacing preset.
    pub preset: Preset,
    /// Metric to sort by, switching to the linear layout.
    pub sort: Option<(MetricKey, Order)>,
    /// Direction of the linear layout.
    pub direction: Direction,
    /// Keep archived versions.
    pub include_archived: bool,
}

/// `layout`
pub fn cmd_layout<S: KeyValueStore>(
    ctx: &mut Context<'_, S>,
    versions_path: &Path,
    options: &LayoutOptions,
    out: &mut dyn Write,
) -> Result<()> {
    let mut versions = read_versions(versions_path)?;

    if !options.include_archived
        && let Some(project) = ctx.project.as_deref()
    {
        versions = visible_versions(&versions, &ctx.store.archives(project)?);
    }

    let presets = &ctx.config.layout;
    let config = options.preset.select(&presets.detail, &presets.miniature);
    let mode = match &options.sort {
        Some((key, order)) => {
            sort_versions_by_metric(&mut versions, key, (*order).into());
            LayoutMode::Linear(options.direction.into())
        }
        None => LayoutMode::Tree,
    };

    print_json(out, &layout_versions(&versions, &config, mode))
}

/// `enrich`
pub fn cmd_enrich<S: KeyValueStore>(
    ctx: &mut Context<'_, S>,
    versions_path: &Path,
    from_store: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let versions = read_versions(versions_path)?;
    let project = ctx.project.clone().unwrap_or_default();

    let index = if from_store {
        ctx.store.parent_index(&ctx.project()?)?
    } else {
        ParentIndex::from_nodes(&versions)
    };
    let enriched = Assembler::new().enrich_with_index(&project, &versions, &index);
    print_json(out, &enriched)
}

// ============================================================================
// Helpers
// ============================================================================

/// Reads a `[{id, parentId, metrics}]` file.
pub fn read_versions(path: &Path) -> Result<Vec<VersionNode>> {
    let text = std::fs::read_to_string(path).map_err(|e| lineage::Error::io_with_path(e, path))?;
    serde_json::from_str(&text)
        .map_err(|e| lineage::Error::parse(format!("versions file {}: {e}", path.display())).into())
}

fn print_json<T: Serialize>(out: &mut dyn Write, value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    line(out, text)
}

fn line(out: &mut dyn Write, text: impl std::fmt::Display) -> Result<()> {
    writeln!(out, "{text}").map_err(|e| Error::from(lineage::Error::from(e)))
}
