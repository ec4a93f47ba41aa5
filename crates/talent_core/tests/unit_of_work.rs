use talent_core::db::open_db_in_memory;
use talent_core::{
    ErrorKind, ExperienceRepository, MemorySink, QueryContext, RepoError, RepoEvent,
    SqlExperienceRepository, SqlTalentRepository, Talent, TalentRepository, TalentService,
};

#[test]
fn register_talent_commits_talent_and_experiences() {
    let mut conn = open_db_in_memory().expect("open in-memory db");
    let ctx = QueryContext::background();

    let talent_id = {
        let mut service = TalentService::new(&mut conn);
        service
            .register_talent(&ctx, "Ada", &["Acme", "Initech"])
            .expect("register talent")
    };

    let experiences = SqlExperienceRepository::new(&conn)
        .find_talent_experiences(&ctx, talent_id)
        .expect("list experiences");
    let mut companies: Vec<_> = experiences.into_iter().map(|exp| exp.company).collect();
    companies.sort();
    assert_eq!(companies, vec!["Acme", "Initech"]);
}

#[test]
fn failing_work_rolls_back_every_write() {
    let mut conn = open_db_in_memory().expect("open in-memory db");
    let ctx = QueryContext::background();

    let err = {
        let mut service = TalentService::new(&mut conn);
        service
            .register_talent(&ctx, "Ada", &["Acme", "  "])
            .expect_err("registration should fail")
    };
    assert_eq!(err.kind(), ErrorKind::Validation);

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM talent", [], |row| row.get(0))
        .expect("count talents");
    assert_eq!(count, 0);
}

#[test]
fn run_hands_work_repositories_bound_to_one_transaction() {
    let mut conn = open_db_in_memory().expect("open in-memory db");
    let ctx = QueryContext::background();
    let mut service = TalentService::with_sink(&mut conn, MemorySink::new());

    let profile_id = service
        .run(&ctx, |repos| {
            let id = repos.talents.create(&ctx, &Talent::new("Grace"))?;
            repos
                .experiences
                .create(&ctx, &talent_core::Experience::new("Navy", id))?;
            Ok(id)
        })
        .expect("run unit of work");

    let profile = service.profile(&ctx, profile_id).expect("load profile");
    assert_eq!(profile.talent.name, "Grace");
    assert_eq!(profile.experiences.len(), 1);

    let events = service.sink().events();
    assert_eq!(events.len(), 2);
    assert!(matches!(&events[0], RepoEvent::TalentCreated { name, .. } if name == "Grace"));
}

#[test]
fn replace_experiences_swaps_whole_history() {
    let mut conn = open_db_in_memory().expect("open in-memory db");
    let ctx = QueryContext::background();
    let mut service = TalentService::new(&mut conn);

    let talent_id = service.register_talent(&ctx, "Ada", &["Acme"]).expect("register talent");
    let ids = service
        .replace_experiences(&ctx, talent_id, &["Initech", "Globex"])
        .expect("replace experiences");
    assert_eq!(ids.len(), 2);

    let profile = service.profile(&ctx, talent_id).expect("load profile");
    let mut companies: Vec<_> = profile
        .experiences
        .iter()
        .map(|exp| exp.company.as_str())
        .collect();
    companies.sort();
    assert_eq!(companies, vec!["Globex", "Initech"]);
}

#[test]
fn replace_experiences_for_unknown_talent_is_not_found() {
    let mut conn = open_db_in_memory().expect("open in-memory db");
    let ctx = QueryContext::background();
    let mut service = TalentService::new(&mut conn);

    let err = service
        .replace_experiences(&ctx, 5, &["Acme"])
        .expect_err("replace should fail");
    assert!(err.is_not_found());
}

#[test]
fn cancelled_context_never_opens_a_transaction() {
    let mut conn = open_db_in_memory().expect("open in-memory db");
    let ctx = QueryContext::background();
    ctx.cancel();
    let mut service = TalentService::new(&mut conn);

    let err = service.register_talent(&ctx, "Ada", &[]).expect_err("registration should fail");
    assert!(matches!(err, RepoError::Cancelled));
    drop(service);

    assert!(conn.is_autocommit());
    let repo = SqlTalentRepository::new(&conn);
    assert!(repo
        .find_talent(&QueryContext::background(), 1)
        .expect_err("lookup should fail")
        .is_not_found());
}
