//! End-to-end behaviour of the query surface over a vault directory on disk.

mod common;

use common::{create_test_vault, init_logging};
use tempfile::TempDir;
use test_log::test;
use vault_graph::{
    config::VaultConfig,
    engine::PhantomPolicy,
    repository::{FsRepository, NoteRepository},
    service::{VaultService, NEW_NOTE_TEMPLATE},
    VaultError,
};

fn service(temp_dir: &TempDir) -> VaultService<FsRepository> {
    init_logging();
    let root = create_test_vault(temp_dir);
    let config = VaultConfig::default();
    let repo = FsRepository::new(&root, config.naming()).unwrap();
    VaultService::new(repo, config).unwrap()
}

fn edges(graph: &vault_graph::graph::GraphData) -> Vec<(String, String)> {
    graph
        .links
        .iter()
        .map(|l| (l.source.to_string(), l.target.to_string()))
        .collect()
}

#[test(tokio::test)]
async fn listing_skips_hidden_and_foreign_files() {
    let temp_dir = TempDir::new().unwrap();
    let svc = service(&temp_dir);
    let notes = svc.repository().list_all_notes().await.unwrap();
    assert_eq!(
        notes,
        vec![
            "index.md",
            "log/2024-01-01.md",
            "projects/alpha.md",
            "projects/beta.md"
        ]
    );
}

#[test(tokio::test)]
async fn full_graph_over_directory() {
    let temp_dir = TempDir::new().unwrap();
    let svc = service(&temp_dir);

    let graph = svc.build_full_graph().await.unwrap();
    let ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(
        ids,
        vec!["index", "log/2024-01-01", "projects/alpha", "projects/beta"]
    );
    assert_eq!(
        edges(&graph),
        vec![
            ("index".to_string(), "projects/alpha".to_string()),
            ("index".to_string(), "projects/beta".to_string()),
            ("log/2024-01-01".to_string(), "projects/alpha".to_string()),
            ("projects/alpha".to_string(), "index".to_string()),
        ]
    );
    assert!(!graph.is_degraded());

    let with_phantoms = svc
        .build_full_graph_with(PhantomPolicy::Create)
        .await
        .unwrap();
    assert_eq!(with_phantoms.stats().phantoms, 1);
    assert_eq!(with_phantoms.nodes[4].path, "missing.md");
}

#[test(tokio::test)]
async fn creating_a_note_resolves_its_phantom() {
    let temp_dir = TempDir::new().unwrap();
    let svc = service(&temp_dir);

    let before = svc.traverse_from_node("index.md", Some(1)).await.unwrap();
    let missing = before.nodes.iter().find(|n| n.name == "missing").unwrap();
    assert!(missing.is_phantom());

    let receipt = svc.create_note("missing.md", None).await.unwrap();
    assert_eq!(receipt.path, "missing.md");
    let note = svc.read_note("missing.md").await.unwrap();
    assert_eq!(note.text, NEW_NOTE_TEMPLATE);

    let after = svc.traverse_from_node("index.md", Some(1)).await.unwrap();
    let missing = after.nodes.iter().find(|n| n.name == "missing").unwrap();
    assert!(missing.exists);
    assert_eq!(after.stats().phantoms, 0);
}

#[test(tokio::test)]
async fn stale_updates_are_conflicts() {
    let temp_dir = TempDir::new().unwrap();
    let svc = service(&temp_dir);

    let note = svc.read_note("projects/beta.md").await.unwrap();
    let first = svc
        .update_note("projects/beta.md", "Now see [[alpha]].\n", &note.revision)
        .await
        .unwrap();
    let err = svc
        .update_note("projects/beta.md", "lost write", &note.revision)
        .await
        .unwrap_err();
    assert!(matches!(err, VaultError::Conflict { .. }));
    assert_eq!(err.status_code(), http::StatusCode::CONFLICT);

    let backlinks = svc.find_backlinks("projects/alpha.md").await.unwrap();
    let paths: Vec<&str> = backlinks.backlinks.iter().map(|b| b.path.as_str()).collect();
    assert_eq!(
        paths,
        vec!["index.md", "log/2024-01-01.md", "projects/beta.md"]
    );
    assert_eq!(backlinks.backlinks[2].context, "Now see [[alpha]].");
    assert_eq!(
        svc.read_note("projects/beta.md").await.unwrap().revision,
        first.revision
    );
}

#[test(tokio::test)]
async fn paths_outside_the_vault_are_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let svc = service(&temp_dir);
    assert!(matches!(
        svc.read_note("../secrets.md").await,
        Err(VaultError::InvalidRequest(_))
    ));
    assert!(matches!(
        svc.create_note("/etc/passwd.md", Some("x")).await,
        Err(VaultError::InvalidRequest(_))
    ));
}

#[test(tokio::test)]
async fn search_and_index() {
    let temp_dir = TempDir::new().unwrap();
    let svc = service(&temp_dir);

    let hits = svc.search("ALPHA", None).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "alpha");

    let index = svc.build_index().await.unwrap();
    assert_eq!(index.files.len(), 4);
    assert_eq!(
        index.all_wikilinks,
        vec!["projects/alpha", "Beta", "missing", "alpha", "index"]
    );
    assert!(!index.wikilinks.contains_key("projects/beta.md"));
}

#[test(tokio::test)]
async fn missing_vault_root_is_unavailable() {
    let temp_dir = TempDir::new().unwrap();
    let result = FsRepository::new(temp_dir.path().join("nope"), Default::default());
    assert!(matches!(result, Err(VaultError::RepositoryUnavailable(_))));
}
