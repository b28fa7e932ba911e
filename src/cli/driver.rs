use anyhow::{Context, Result, bail};
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info_span};

use super::args::CliArgs;
use super::config::{StubirConfig, resolve_config};
use stubir_ir::{BoundModule, DeclId, DeclKind, Origin};
use stubir_metadata::{ForeignRef, Manifest, MetadataIndex, MetadataReader};
use stubir_names::{NameAmbiguityResolver, UniqueNames};
use stubir_provider::{SessionStats, StubError, StubSession};
use stubir_serialization::{DeclarationTable, IdentitySource, UniqId};

/// Result of one run over a manifest.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub module: String,
    pub library: String,
    pub declarations: Vec<ReportedDecl>,
    pub renamed: Vec<RenamedProperty>,
    pub stats: SessionStats,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportedDecl {
    pub depth: usize,
    pub kind: &'static str,
    /// Name after disambiguation.
    pub name: String,
    pub fq_name: String,
    pub origin: Origin,
    pub uniq_id: UniqId,
    pub identity: IdentitySource,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenamedProperty {
    pub fq_name: String,
    pub from: String,
    pub to: String,
}

pub fn load_manifest(path: &Path) -> Result<MetadataIndex> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read manifest {}", path.display()))?;
    Manifest::from_json(&text)
        .and_then(|manifest| manifest.build())
        .with_context(|| format!("failed to load manifest {}", path.display()))
}

/// Run the CLI pipeline described by `args`.
pub fn run(args: &CliArgs, cwd: &Path) -> Result<Report> {
    let config = resolve_config(args, cwd)?;
    let index = load_manifest(&cwd.join(&args.manifest))?;
    let requested = requested_entities(&index, &config, &args.entities)?;
    materialize(&index, &config, &requested)
}

/// Entities to materialize: the explicit list, or every top-level
/// interop entity that is not special-cased.
pub fn requested_entities(
    index: &MetadataIndex,
    config: &StubirConfig,
    names: &[String],
) -> Result<Vec<ForeignRef>> {
    if names.is_empty() {
        let special: FxHashSet<&str> = config.special.iter().map(String::as_str).collect();
        return Ok(index
            .top_level()
            .filter(|&entity| {
                index
                    .descriptor(entity)
                    .is_some_and(|d| d.origin.is_from_interop_library())
                    && !special.contains(index.fq_name(entity).as_str())
            })
            .collect());
    }
    let mut entities = Vec::with_capacity(names.len());
    for name in names {
        match index.lookup(name) {
            Some(entity) => entities.push(entity),
            None => bail!("unknown entity `{name}` in library `{}`", index.library()),
        }
    }
    Ok(entities)
}

/// Materialize `requested`, then resolve names and export identities.
pub fn materialize(index: &MetadataIndex, config: &StubirConfig, requested: &[ForeignRef]) -> Result<Report> {
    let span = info_span!("materialize", library = index.library(), entities = requested.len());
    let _guard = span.enter();

    let special: FxHashSet<String> = config.special.iter().cloned().collect();
    let mut session = StubSession::new(config.module_name(), index)
        .with_options(config.provider.clone())
        .with_special_case(move |entity, _| special.contains(&index.fq_name(entity)));

    let mut roots = Vec::with_capacity(requested.len());
    for &entity in requested {
        let decl = session
            .materialize(entity)
            .with_context(|| format!("failed to materialize `{}`", index.fq_name(entity)))?;
        roots.push(decl);
    }
    force_structure(&mut session, &roots).context("failed to materialize members")?;
    let stats = session.stats();
    let module = session.finish();
    debug!(decls = module.arena().len(), files = module.files().len(), "module finished");

    let names = NameAmbiguityResolver::new(config.names.clone()).resolve_module(&module);
    let mut table = DeclarationTable::new(&module, index);
    let identities = table.export_all().context("failed to export identities")?;

    let mut depths = Vec::with_capacity(identities.len());
    module.walk(|_, depth| depths.push(depth));

    let mut declarations = Vec::with_capacity(identities.len());
    for ((id, uniq_id), depth) in identities.into_iter().zip(depths) {
        declarations.push(reported(&module, &names, &mut table, id, uniq_id, depth)?);
    }
    let renamed = names
        .iter()
        .map(|(id, to)| RenamedProperty {
            fq_name: module.fq_name(id),
            from: module.arena().name(id).to_string(),
            to: to.to_string(),
        })
        .collect();

    Ok(Report {
        module: module.name().to_string(),
        library: index.library().to_string(),
        declarations,
        renamed,
        stats,
    })
}

/// Force class members and property accessors below `roots` so the whole
/// tree is visible to later passes.
fn force_structure(session: &mut StubSession<'_>, roots: &[DeclId]) -> Result<(), StubError> {
    let mut pending = roots.to_vec();
    let mut seen = FxHashSet::default();
    while let Some(id) = pending.pop() {
        if !seen.insert(id) {
            continue;
        }
        match session.arena().get(id).map(|d| d.kind()) {
            Some(DeclKind::Class) => pending.extend(session.members_of(id)?),
            Some(DeclKind::Property) => {
                let accessors = session.accessors_of(id)?;
                pending.extend(accessors.getter);
                pending.extend(accessors.setter);
            }
            _ => {}
        }
    }
    Ok(())
}

fn reported(
    module: &BoundModule,
    names: &UniqueNames,
    table: &mut DeclarationTable<'_>,
    id: DeclId,
    uniq_id: UniqId,
    depth: usize,
) -> Result<ReportedDecl> {
    let decl = module
        .decl(id)
        .with_context(|| format!("declaration {id} missing from module"))?;
    Ok(ReportedDecl {
        depth,
        kind: decl.kind().as_str(),
        name: names.unique_name_for(module.arena(), id).to_string(),
        fq_name: module.fq_name(id),
        origin: decl.origin,
        uniq_id,
        identity: table.source_of(id)?,
    })
}
