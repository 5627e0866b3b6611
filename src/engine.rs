//! The link-graph engine.
//!
//! Full-vault builds and bounded traversals are the same breadth-first walk with different seeds
//! and policies:
//!
//! - [`GraphEngine::build_full_graph`] seeds every listed note at depth 0 and registers all of
//!   them as nodes up front, so node order is listing order and nothing is ever enqueued twice.
//! - [`GraphEngine::traverse_from_node`] seeds one note and discovers the rest lazily, level by
//!   level, until the depth bound.
//!
//! What happens to unresolved references, how far expansion goes and which resolver tiers apply
//! are all carried by [`TraversalConfig`].
//!
//! Fetches inside one BFS level run concurrently (bounded by `fetch_concurrency`) but results are
//! consumed in submission order, so the output never depends on which fetch finishes first.
use futures::{stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

use crate::{
    config::VaultConfig,
    diagnostic::{isolate, ScanDiagnostic},
    error::VaultError,
    graph::{GraphData, GraphLink, GraphNode, GroupRules, PHANTOM_GROUP},
    paths::{NoteIdentity, NoteNaming},
    repository::NoteRepository,
    resolve::{PathResolver, ResolveMode},
    wikilink,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhantomPolicy {
    /// Unresolved references become phantom nodes (`exists = false`) with a link to them.
    Create,
    /// Unresolved references are dropped.
    Drop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpansionBound {
    /// Follow references until nothing new is reachable.
    Full,
    /// Stop expanding at this many reference hops from the seed.
    Depth(u32),
}

impl ExpansionBound {
    fn allows_expansion(&self, depth: u32) -> bool {
        match self {
            ExpansionBound::Full => true,
            ExpansionBound::Depth(max) => depth < *max,
        }
    }

    fn admits(&self, depth: u32) -> bool {
        match self {
            ExpansionBound::Full => true,
            ExpansionBound::Depth(max) => depth <= *max,
        }
    }
}

/// Initial `size_hint` values and per-incoming-link growth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeSizing {
    /// Start note of a traversal, or every listed note of a full build.
    pub seed: f64,
    /// Real notes first seen as a link target.
    pub discovered: f64,
    pub phantom: f64,
    /// Added to a node for every link pointing at it.
    pub increment: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraversalConfig {
    pub phantoms: PhantomPolicy,
    pub bound: ExpansionBound,
    pub resolver: ResolveMode,
    pub sizing: NodeSizing,
    pub fetch_concurrency: usize,
    pub progress_interval: usize,
}

impl TraversalConfig {
    /// Whole-vault graph: no phantoms, permissive resolution.
    pub fn full_graph() -> TraversalConfig {
        TraversalConfig {
            phantoms: PhantomPolicy::Drop,
            bound: ExpansionBound::Full,
            resolver: ResolveMode::Permissive,
            sizing: NodeSizing {
                seed: 1.0,
                discovered: 1.0,
                phantom: 1.0,
                increment: 0.5,
            },
            fetch_concurrency: 8,
            progress_interval: 50,
        }
    }

    /// Neighbourhood graph around one note: phantoms, strict resolution, depth-limited.
    pub fn bounded(max_depth: u32) -> TraversalConfig {
        TraversalConfig {
            phantoms: PhantomPolicy::Create,
            bound: ExpansionBound::Depth(max_depth),
            resolver: ResolveMode::Strict,
            sizing: NodeSizing {
                seed: 4.0,
                discovered: 2.0,
                phantom: 1.0,
                increment: 0.5,
            },
            fetch_concurrency: 8,
            progress_interval: 50,
        }
    }

    pub fn with_phantoms(mut self, phantoms: PhantomPolicy) -> TraversalConfig {
        self.phantoms = phantoms;
        self
    }

    pub fn with_resolver(mut self, resolver: ResolveMode) -> TraversalConfig {
        self.resolver = resolver;
        self
    }

    /// Take fetch and logging settings from the vault configuration.
    pub fn tuned_by(mut self, config: &VaultConfig) -> TraversalConfig {
        self.fetch_concurrency = config.fetch_concurrency.max(1);
        self.progress_interval = config.progress_interval;
        self
    }
}

/// Builds graphs from a [`NoteRepository`]. Holds only naming and classification rules; every
/// call owns its own node map, visited set and queue.
#[derive(Debug, Clone, Default)]
pub struct GraphEngine {
    naming: NoteNaming,
    groups: GroupRules,
}

impl GraphEngine {
    pub fn new(naming: NoteNaming, groups: GroupRules) -> GraphEngine {
        GraphEngine { naming, groups }
    }

    pub fn from_config(config: &VaultConfig) -> GraphEngine {
        GraphEngine::new(config.naming(), config.groups.clone())
    }

    pub fn naming(&self) -> &NoteNaming {
        &self.naming
    }

    /// Graph over the whole vault. Fails only if the listing itself fails or the repository
    /// becomes unavailable; unreadable notes are skipped and reported in `diagnostics`.
    #[tracing::instrument(skip_all)]
    pub async fn build_full_graph<R: NoteRepository>(
        &self,
        repo: &R,
        config: &TraversalConfig,
    ) -> Result<GraphData, VaultError> {
        let all_paths = repo.list_all_notes().await?;
        tracing::info!("Building graph over {} notes", all_paths.len());

        let mut walk = Walk::new(self, &all_paths, config);
        for path in all_paths.iter() {
            walk.register_real(path, config.sizing.seed);
        }
        let seeds = all_paths.iter().map(|p| (p.clone(), 0)).collect();
        walk.run(repo, seeds).await?;

        let graph = walk.finish();
        tracing::info!(
            "Graph built: {} nodes, {} links, {} skipped",
            graph.nodes.len(),
            graph.links.len(),
            graph.diagnostics.len()
        );
        Ok(graph)
    }

    /// Breadth-first neighbourhood of `start`. A depth bound of 0 yields the start note alone.
    #[tracing::instrument(skip(self, repo, config))]
    pub async fn traverse_from_node<R: NoteRepository>(
        &self,
        repo: &R,
        start: &str,
        config: &TraversalConfig,
    ) -> Result<GraphData, VaultError> {
        let all_paths = repo.list_all_notes().await?;

        // Accept a start path that differs from the listing only by case.
        let start_id = self.naming.identity(start);
        let start = all_paths
            .iter()
            .find(|p| p.as_str() == start)
            .or_else(|| {
                all_paths
                    .iter()
                    .find(|p| self.naming.identity(p) == start_id)
            })
            .cloned()
            .unwrap_or_else(|| start.to_string());

        let mut walk = Walk::new(self, &all_paths, config);
        walk.run(repo, VecDeque::from([(start, 0)])).await?;

        let graph = walk.finish();
        tracing::debug!(
            "Traversal built: {} nodes, {} links",
            graph.nodes.len(),
            graph.links.len()
        );
        Ok(graph)
    }
}

/// Identity-keyed nodes in discovery order.
#[derive(Debug, Default)]
struct NodeMap {
    nodes: Vec<GraphNode>,
    index: HashMap<NoteIdentity, usize>,
}

impl NodeMap {
    fn get_mut(&mut self, id: &NoteIdentity) -> Option<&mut GraphNode> {
        self.index.get(id).map(|idx| &mut self.nodes[*idx])
    }

    fn insert(&mut self, node: GraphNode) {
        self.index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
    }
}

/// State of one engine call.
struct Walk<'a> {
    engine: &'a GraphEngine,
    config: &'a TraversalConfig,
    resolver: PathResolver<'a>,
    nodes: NodeMap,
    links: Vec<GraphLink>,
    visited: HashSet<String>,
    diagnostics: Vec<ScanDiagnostic>,
    processed: usize,
    total: usize,
}

impl<'a> Walk<'a> {
    fn new(
        engine: &'a GraphEngine,
        all_paths: &'a [String],
        config: &'a TraversalConfig,
    ) -> Walk<'a> {
        Walk {
            engine,
            config,
            resolver: PathResolver::new(all_paths, &engine.naming, config.resolver),
            nodes: NodeMap::default(),
            links: Vec::new(),
            visited: HashSet::new(),
            diagnostics: Vec::new(),
            processed: 0,
            total: all_paths.len(),
        }
    }

    async fn run<R: NoteRepository>(
        &mut self,
        repo: &R,
        mut queue: VecDeque<(String, u32)>,
    ) -> Result<(), VaultError> {
        while !queue.is_empty() {
            // The queue only ever holds one BFS level at a time.
            let mut level = Vec::with_capacity(queue.len());
            for (path, depth) in queue.drain(..) {
                if !self.config.bound.admits(depth) || !self.visited.insert(path.clone()) {
                    continue;
                }
                level.push((path, depth));
            }

            let mut fetches = stream::iter(level.into_iter().map(|(path, depth)| async move {
                let content = repo.get_content(&path).await;
                (path, depth, content)
            }))
            .buffered(self.config.fetch_concurrency.max(1));

            while let Some((path, depth, content)) = fetches.next().await {
                match content {
                    Ok(text) => {
                        let discovered = self.scan(&path, depth, &text);
                        queue.extend(discovered);
                    }
                    Err(e) => isolate(&mut self.diagnostics, &path, e)?,
                }
                self.processed += 1;
                if self.config.progress_interval > 0
                    && self.processed % self.config.progress_interval == 0
                {
                    tracing::info!("Graph: processed {}/{} notes", self.processed, self.total);
                }
            }
        }
        Ok(())
    }

    /// Register `path` as a scanned note and follow its references. Returns the newly reachable
    /// notes for the next level.
    fn scan(&mut self, path: &str, depth: u32, text: &str) -> Vec<(String, u32)> {
        let source = self.register_real(path, self.config.sizing.seed);
        let mut next = Vec::new();
        if !self.config.bound.allows_expansion(depth) {
            return next;
        }

        for link in wikilink::extract(text) {
            match self.resolver.resolve(&link.target) {
                Some(target_path) => {
                    let target = self.register_real(target_path, self.config.sizing.discovered);
                    self.push_link(source.clone(), target);
                    if !self.visited.contains(target_path) {
                        next.push((target_path.to_string(), depth + 1));
                    }
                }
                None => {
                    if self.config.phantoms == PhantomPolicy::Create {
                        if let Some(phantom) = self.register_phantom(&link.target) {
                            self.push_link(source.clone(), phantom);
                        }
                    } else {
                        tracing::debug!("{}: dropping unresolved [[{}]]", path, link.target);
                    }
                }
            }
        }
        next
    }

    /// First registration wins, except that a phantom claimed by a real note is upgraded in place.
    fn register_real(&mut self, path: &str, size_hint: f64) -> NoteIdentity {
        let id = self.engine.naming.identity(path);
        let name = self.engine.naming.display_name(path);
        let group = self.engine.groups.classify(path);
        match self.nodes.get_mut(&id) {
            Some(node) if node.is_phantom() => {
                tracing::debug!("Upgrading phantom '{}' to real note {}", id, path);
                node.exists = true;
                node.path = path.to_string();
                node.name = name;
                node.group = group;
            }
            Some(_) => {}
            None => self.nodes.insert(GraphNode {
                id: id.clone(),
                name,
                path: path.to_string(),
                group,
                size_hint,
                exists: true,
            }),
        }
        id
    }

    fn register_phantom(&mut self, target: &str) -> Option<NoteIdentity> {
        let id = self.engine.naming.identity(target);
        if id.as_str().is_empty() {
            return None;
        }
        if self.nodes.get_mut(&id).is_none() {
            self.nodes.insert(GraphNode {
                id: id.clone(),
                name: target.to_string(),
                path: self.engine.naming.with_extension(target),
                group: PHANTOM_GROUP,
                size_hint: self.config.sizing.phantom,
                exists: false,
            });
        }
        Some(id)
    }

    fn push_link(&mut self, source: NoteIdentity, target: NoteIdentity) {
        if let Some(node) = self.nodes.get_mut(&target) {
            node.size_hint += self.config.sizing.increment;
        }
        self.links.push(GraphLink { source, target });
    }

    fn finish(self) -> GraphData {
        let graph = GraphData {
            nodes: self.nodes.nodes,
            links: self.links,
            diagnostics: self.diagnostics,
        };
        debug_assert!(graph.dangling_links().is_empty());
        graph
    }
}
