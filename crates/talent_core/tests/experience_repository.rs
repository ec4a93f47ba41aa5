use rusqlite::Connection;
use std::collections::HashSet;
use talent_core::db::open_db_in_memory;
use talent_core::{
    ErrorKind, Experience, ExperienceRepository, MemorySink, QueryContext, RepoError, RepoEvent,
    RowId, SqlExperienceRepository, SqlTalentRepository, Talent, TalentRepository,
};

fn seed_talent(conn: &Connection, name: &str) -> RowId {
    SqlTalentRepository::new(conn)
        .create(&QueryContext::background(), &Talent::new(name))
        .expect("seed talent")
}

#[test]
fn find_talent_experiences_returns_exactly_the_owner_rows() {
    let mut conn = open_db_in_memory().expect("open in-memory db");
    let ada = seed_talent(&conn, "Ada");
    let grace = seed_talent(&conn, "Grace");
    let tx = conn.transaction().expect("begin transaction");
    let repo = SqlExperienceRepository::new(&tx);
    let ctx = QueryContext::background();

    let acme = repo.create(&ctx, &Experience::new("Acme", ada)).expect("create row");
    let initech = repo.create(&ctx, &Experience::new("Initech", ada)).expect("create row");
    repo.create(&ctx, &Experience::new("Navy", grace)).expect("create row");

    let found = repo.find_talent_experiences(&ctx, ada).expect("list experiences");
    let ids: HashSet<RowId> = found.iter().map(|exp| exp.id).collect();
    assert_eq!(ids, HashSet::from([acme, initech]));
    assert!(found.iter().all(|exp| exp.talent_id == ada));
}

#[test]
fn find_talent_experiences_without_rows_is_empty_not_error() {
    let mut conn = open_db_in_memory().expect("open in-memory db");
    let tx = conn.transaction().expect("begin transaction");
    let repo = SqlExperienceRepository::new(&tx);

    let found = repo
        .find_talent_experiences(&QueryContext::background(), 77)
        .expect("list experiences");
    assert!(found.is_empty());
}

#[test]
fn find_experience_maps_columns_in_order() {
    let mut conn = open_db_in_memory().expect("open in-memory db");
    let ada = seed_talent(&conn, "Ada");
    let tx = conn.transaction().expect("begin transaction");
    let repo = SqlExperienceRepository::new(&tx);
    let ctx = QueryContext::background();

    let id = repo.create(&ctx, &Experience::new("Acme", ada)).expect("create row");
    let loaded = repo.find_experience(&ctx, id).expect("load experience");
    assert_eq!(
        loaded,
        Experience {
            id,
            company: "Acme".to_string(),
            talent_id: ada
        }
    );
}

#[test]
fn find_missing_experience_is_not_found_not_zero_value() {
    let mut conn = open_db_in_memory().expect("open in-memory db");
    let tx = conn.transaction().expect("begin transaction");
    let repo = SqlExperienceRepository::new(&tx);

    let err = repo
        .find_experience(&QueryContext::background(), 404)
        .expect_err("lookup should fail");
    assert!(matches!(
        err,
        RepoError::NotFound {
            entity: "experience",
            id: 404
        }
    ));
}

#[test]
fn row_mapping_mismatch_is_a_store_read_failure() {
    let mut conn = open_db_in_memory().expect("open in-memory db");
    conn.execute_batch(
        "PRAGMA foreign_keys = OFF;
         INSERT INTO talent (id, name) VALUES (1, 'Ada');
         INSERT INTO experience (id, company, talent_id) VALUES (1, 'Acme', 'not-a-number');",
    )
    .expect("seed malformed row");
    let tx = conn.transaction().expect("begin transaction");
    let repo = SqlExperienceRepository::new(&tx);

    let err = repo
        .find_experience(&QueryContext::background(), 1)
        .expect_err("mapping should fail");
    assert_eq!(err.kind(), ErrorKind::StoreRead);
}

#[test]
fn update_changes_only_company() {
    let mut conn = open_db_in_memory().expect("open in-memory db");
    let ada = seed_talent(&conn, "Ada");
    let tx = conn.transaction().expect("begin transaction");
    let repo = SqlExperienceRepository::new(&tx);
    let ctx = QueryContext::background();

    let id = repo.create(&ctx, &Experience::new("Acme", ada)).expect("create row");
    let change = Experience {
        id,
        company: "NewCo".to_string(),
        talent_id: ada + 100,
    };
    repo.update(&ctx, &change).expect("update experience");

    let loaded = repo.find_experience(&ctx, id).expect("load experience");
    assert_eq!(loaded.id, id);
    assert_eq!(loaded.company, "NewCo");
    assert_eq!(loaded.talent_id, ada);
}

#[test]
fn update_of_missing_row_succeeds_silently() {
    let mut conn = open_db_in_memory().expect("open in-memory db");
    let tx = conn.transaction().expect("begin transaction");
    let repo = SqlExperienceRepository::new(&tx);

    let ghost = Experience {
        id: 999,
        company: "Nowhere".to_string(),
        talent_id: 1,
    };
    repo.update(&QueryContext::background(), &ghost).expect("update experience");
}

#[test]
fn delete_is_owner_scoped_and_idempotent() {
    let mut conn = open_db_in_memory().expect("open in-memory db");
    let ada = seed_talent(&conn, "Ada");
    let grace = seed_talent(&conn, "Grace");
    let tx = conn.transaction().expect("begin transaction");
    let repo = SqlExperienceRepository::new(&tx);
    let ctx = QueryContext::background();

    repo.create(&ctx, &Experience::new("Acme", ada)).expect("create row");
    repo.create(&ctx, &Experience::new("Initech", ada)).expect("create row");
    let navy = repo.create(&ctx, &Experience::new("Navy", grace)).expect("create row");

    assert_eq!(repo.delete(&ctx, ada).expect("delete experiences"), 2);
    assert!(repo.find_talent_experiences(&ctx, ada).expect("list experiences").is_empty());
    assert_eq!(repo.delete(&ctx, ada).expect("delete experiences"), 0);

    let remaining = repo.find_talent_experiences(&ctx, grace).expect("list experiences");
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, navy);
}

#[test]
fn dangling_talent_reference_is_rejected_by_the_store() {
    let mut conn = open_db_in_memory().expect("open in-memory db");
    let tx = conn.transaction().expect("begin transaction");
    let sink = MemorySink::new();
    let repo = SqlExperienceRepository::with_sink(&tx, &sink);

    let err = repo
        .create(&QueryContext::background(), &Experience::new("Acme", 12345))
        .expect_err("create should fail");
    assert_eq!(err.kind(), ErrorKind::StoreWrite);
    assert!(sink.events().is_empty());
}

#[test]
fn create_emits_experience_event() {
    let mut conn = open_db_in_memory().expect("open in-memory db");
    let ada = seed_talent(&conn, "Ada");
    let tx = conn.transaction().expect("begin transaction");
    let sink = MemorySink::new();
    let repo = SqlExperienceRepository::with_sink(&tx, &sink);

    let id = repo
        .create(&QueryContext::background(), &Experience::new("Acme", ada))
        .expect("create experience");
    assert_eq!(
        sink.events(),
        vec![RepoEvent::ExperienceCreated {
            id,
            talent_id: ada,
            company: "Acme".to_string()
        }]
    );
}

#[test]
fn cancelled_context_is_distinct_from_store_failures() {
    let mut conn = open_db_in_memory().expect("open in-memory db");
    let tx = conn.transaction().expect("begin transaction");
    let repo = SqlExperienceRepository::new(&tx);
    let ctx = QueryContext::background();
    ctx.cancel();

    let read = repo.find_talent_experiences(&ctx, 1).expect_err("listing should fail");
    let lookup = repo.find_experience(&ctx, 1).expect_err("lookup should fail");
    let write = repo.delete(&ctx, 1).expect_err("delete should fail");
    for err in [read, lookup, write] {
        assert_eq!(err.kind(), ErrorKind::Cancelled);
    }
}
