//! Facade behaviour: index lifecycle, removal consistency and shared use.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use tessera_common::types::{PropertyId, Value};
use tessera_common::utils::Error;
use tessera_core::graph::Element;
use tessera_core::index::FulltextPredicate;
use tessera_core::path::{LevelSynchronousBfs, ShortestPathRequest};
use tessera_engine::{Config, TesseraDB};

const ROAD: PropertyId = PropertyId::new(1);

#[test]
fn index_lifecycle() {
    let db = TesseraDB::with_config(Config::default().with_default_index_type("RangeIndex")).unwrap();

    let index = db.create_default_index("scores").unwrap();
    assert_eq!(index.type_name(), "RangeIndex");
    assert!(matches!(
        db.create_index("scores", "DictionaryIndex"),
        Err(Error::IndexExists(name)) if name == "scores"
    ));
    assert!(matches!(
        db.create_index("other", "BTreeIndex"),
        Err(Error::UnknownPlugin(name)) if name == "BTreeIndex"
    ));

    assert!(db.drop_index("scores").unwrap());
    assert!(!db.drop_index("scores").unwrap());
    assert!(db.index("scores").is_none());
}

#[test]
fn clear_drops_everything() {
    let db = TesseraDB::new_in_memory();
    let a = db.create_vertex().unwrap().id();
    let b = db.create_vertex().unwrap().id();
    db.create_edge(a, b, ROAD).unwrap();
    db.create_default_index("names").unwrap();

    db.clear().unwrap();
    assert_eq!(db.vertex_count().unwrap(), 0);
    assert_eq!(db.edge_count().unwrap(), 0);
    assert!(db.indices().is_empty());
}

#[test]
fn removed_neighbour_disappears_from_paths_and_indices() {
    let db = TesseraDB::new_in_memory();
    let ids: Vec<_> = (0..4).map(|_| db.create_vertex().unwrap()).collect();
    // 0 -> 1 -> 3 and 0 -> 2 -> 3.
    for (from, to) in [(0, 1), (1, 3), (0, 2), (2, 3)] {
        db.create_edge(ids[from].id(), ids[to].id(), ROAD).unwrap();
    }
    let hops = db.create_default_index("hops").unwrap();
    for edge in db.store().edges().unwrap() {
        hops.add_or_update(&Value::Int64(1), Element::Edge(edge)).unwrap();
    }
    assert_eq!(hops.count_of_values().unwrap(), 4);

    assert!(db.remove_vertex(ids[1].id()).unwrap());
    assert_eq!(hops.count_of_values().unwrap(), 2);

    let request = ShortestPathRequest::new(ids[0].id(), ids[3].id()).with_max_results(5);
    let paths = db.shortest_paths(LevelSynchronousBfs::NAME, request).unwrap();
    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0].vertex_ids(), vec![ids[0].id(), ids[2].id(), ids[3].id()]);
}

#[test]
fn collided_purge_is_kept_and_retried() {
    let config = Config::default()
        .with_lock_attempts(1)
        .with_lock_timeout(Duration::from_millis(1));
    let db = TesseraDB::with_config(config).unwrap();
    let a = db.create_vertex().unwrap();
    let b = db.create_vertex().unwrap();
    let ab = db.create_edge(a.id(), b.id(), ROAD).unwrap();

    let names = db.create_default_index("names").unwrap();
    names.add_or_update(&Value::from("a"), Element::Vertex(a.clone())).unwrap();
    names.add_or_update(&Value::from("ab"), Element::Edge(ab)).unwrap();
    let bios = db.create_index("bios", "RegExIndex").unwrap();
    bios.add_or_update(&Value::from("likes hiking"), Element::Vertex(a.clone())).unwrap();

    // The predicate runs while the fulltext index is read-locked.
    let outcome = Mutex::new(None);
    let remove_while_reading: FulltextPredicate<'_> = &|_, _| {
        *outcome.lock().unwrap() = Some(db.remove_vertex(a.id()));
        true
    };
    bios.as_fulltext()
        .unwrap()
        .try_query_with("hiking", remove_while_reading)
        .unwrap();
    let outcome = outcome.into_inner().unwrap().unwrap();
    assert!(outcome.unwrap_err().is_collision());

    assert!(db.get_vertex(a.id()).unwrap().is_none());
    assert_eq!(names.count_of_keys().unwrap(), 0);
    assert_eq!(bios.count_of_keys().unwrap(), 1);
    assert_eq!(db.pending_purge_count(), 2);

    // Removing it again finds nothing in the store but finishes the purge.
    assert!(!db.remove_vertex(a.id()).unwrap());
    assert_eq!(bios.count_of_keys().unwrap(), 0);
    assert_eq!(db.pending_purge_count(), 0);
    db.retry_purge().unwrap();
}

#[test]
fn export_during_removals_always_imports() {
    let config = Config::default()
        .with_lock_attempts(400)
        .with_lock_timeout(Duration::from_millis(5));
    let db = Arc::new(TesseraDB::with_config(config).unwrap());
    let ids: Vec<_> = (0..200).map(|_| db.create_vertex().unwrap().id()).collect();
    for pair in ids.windows(2) {
        db.create_edge(pair[0], pair[1], ROAD).unwrap();
    }

    let remover = {
        let db = Arc::clone(&db);
        let ids = ids.clone();
        thread::spawn(move || {
            for id in ids.into_iter().step_by(2) {
                db.remove_vertex(id).unwrap();
            }
        })
    };
    for _ in 0..20 {
        let bytes = db.export_snapshot().unwrap();
        TesseraDB::import_snapshot(&bytes).unwrap();
    }
    remover.join().unwrap();

    let restored = TesseraDB::import_snapshot(&db.export_snapshot().unwrap()).unwrap();
    assert_eq!(restored.vertex_count().unwrap(), 100);
    assert_eq!(restored.edge_count().unwrap(), 0);
}

#[test]
fn shared_across_threads() {
    let config = Config::default()
        .with_lock_attempts(400)
        .with_lock_timeout(Duration::from_millis(5));
    let db = Arc::new(TesseraDB::with_config(config).unwrap());
    let names = db.create_default_index("names").unwrap();

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let db = Arc::clone(&db);
            thread::spawn(move || {
                let index = db.index("names").unwrap();
                for i in 0..25 {
                    let key = Value::from(format!("v{t}-{i}"));
                    let v = db.create_vertex_with_props([(PropertyId::new(0), key.clone())]).unwrap();
                    index.add_or_update(&key, Element::Vertex(v)).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(db.vertex_count().unwrap(), 100);
    assert_eq!(names.count_of_keys().unwrap(), 100);
}

#[test]
fn debug_lists_indices_and_algorithms() {
    let db = TesseraDB::new_in_memory();
    db.create_default_index("names").unwrap();
    let rendered = format!("{db:?}");
    assert!(rendered.contains("names"));
    assert!(rendered.contains("LevelSynchronousBfs"));
}
