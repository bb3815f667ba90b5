//! Integration tests for the tenant-scoped repositories.
//!
//! Exercises the repository layer against a real database:
//! - Church creation and per-church stats
//! - Department hierarchy listing and tenant isolation
//! - Membership uniqueness
//! - Scale lifecycle and attached rows
//! - Candidate statistics aggregation
//! - Single-use refresh sessions

use chrono::NaiveDate;
use koinonia_core::roles;
use koinonia_db::models::church::CreateChurch;
use koinonia_db::models::department::{CreateDepartment, UpdateDepartment};
use koinonia_db::models::membership::CreateMembership;
use koinonia_db::models::profile::CreateProfile;
use koinonia_db::models::scale::{CreateAgendaItem, CreateScale, CreateScaleMember, ScaleFilter};
use koinonia_db::models::session::CreateSession;
use koinonia_db::models::user::CreateUser;
use koinonia_db::repositories::{
    AgendaItemRepo, CandidateRepo, ChurchRepo, DepartmentRepo, MembershipRepo, ProfileRepo,
    RoleRepo, ScaleMemberRepo, ScaleRepo, SessionRepo, UserRepo,
};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn new_church(pool: &PgPool, name: &str, slug: &str) -> i64 {
    let input = CreateChurch {
        name: name.to_string(),
        slug: None,
        city: Some("Recife".to_string()),
        state: Some("PE".to_string()),
        address: None,
        phone: None,
        email: None,
        logo_url: None,
    };
    ChurchRepo::create(pool, &input, slug).await.unwrap().id
}

async fn new_member(pool: &PgPool, church_id: i64, username: &str, functions: &[&str]) -> i64 {
    let role = RoleRepo::find_by_name(pool, roles::ROLE_MEMBER)
        .await
        .unwrap()
        .unwrap();
    let user = UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: "not-a-real-hash".to_string(),
            role_id: role.id,
            church_id: Some(church_id),
        },
    )
    .await
    .unwrap();
    ProfileRepo::create(
        pool,
        user.id,
        church_id,
        &CreateProfile {
            full_name: format!("{username} da Silva"),
            phone: None,
            birth_date: None,
            functions: functions.iter().map(|f| f.to_string()).collect(),
            skill_level: Some("intermediário".to_string()),
            preferred_times: vec!["09:00".to_string()],
            notes: None,
        },
    )
    .await
    .unwrap();
    user.id
}

fn new_department(name: &str, parent_id: Option<i64>) -> CreateDepartment {
    CreateDepartment {
        name: name.to_string(),
        description: None,
        color: Some("#3366ff".to_string()),
        parent_id,
        leader_user_id: None,
    }
}

fn new_scale(department_id: i64, date: NaiveDate) -> CreateScale {
    CreateScale {
        department_id,
        service_type_id: None,
        title: "Culto de domingo".to_string(),
        scale_date: date,
        scale_time: "09:00".to_string(),
        notes: None,
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn roles_are_seeded(pool: PgPool) {
    let names: Vec<String> = RoleRepo::list(&pool)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(names, vec!["master", "admin", "leader", "member"]);
}

#[sqlx::test(migrations = "./migrations")]
async fn duplicate_church_slug_is_rejected(pool: PgPool) {
    new_church(&pool, "Igreja Central", "igreja-central").await;
    let input = CreateChurch {
        name: "Outra".to_string(),
        slug: None,
        city: None,
        state: None,
        address: None,
        phone: None,
        email: None,
        logo_url: None,
    };
    let err = ChurchRepo::create(&pool, &input, "igreja-central")
        .await
        .unwrap_err();
    let db_err = err.as_database_error().unwrap();
    assert_eq!(db_err.constraint(), Some("uq_churches_slug"));
}

#[sqlx::test(migrations = "./migrations")]
async fn church_stats_count_per_tenant(pool: PgPool) {
    let a = new_church(&pool, "A", "a").await;
    let b = new_church(&pool, "B", "b").await;
    new_member(&pool, a, "ana", &["Vocal"]).await;
    new_member(&pool, a, "bia", &["Violão"]).await;
    DepartmentRepo::create(&pool, a, &new_department("Louvor", None))
        .await
        .unwrap();

    let stats = ChurchRepo::list_with_stats(&pool).await.unwrap();
    let a_stats = stats.iter().find(|s| s.church.id == a).unwrap();
    let b_stats = stats.iter().find(|s| s.church.id == b).unwrap();
    assert_eq!(a_stats.member_count, 2);
    assert_eq!(a_stats.department_count, 1);
    assert_eq!(b_stats.member_count, 0);
    assert_eq!(b_stats.scale_count, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn departments_are_scoped_to_their_church(pool: PgPool) {
    let a = new_church(&pool, "A", "a").await;
    let b = new_church(&pool, "B", "b").await;
    let louvor = DepartmentRepo::create(&pool, a, &new_department("Louvor", None))
        .await
        .unwrap();

    assert!(DepartmentRepo::find_in_church(&pool, louvor.id, a)
        .await
        .unwrap()
        .is_some());
    assert!(DepartmentRepo::find_in_church(&pool, louvor.id, b)
        .await
        .unwrap()
        .is_none());
    assert!(!DepartmentRepo::delete(&pool, louvor.id, b).await.unwrap());
    assert!(DepartmentRepo::list_by_church(&pool, b).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn department_list_puts_parents_first_and_detach_clears_parent(pool: PgPool) {
    let church = new_church(&pool, "A", "a").await;
    let louvor = DepartmentRepo::create(&pool, church, &new_department("Louvor", None))
        .await
        .unwrap();
    let coral = DepartmentRepo::create(&pool, church, &new_department("Coral", Some(louvor.id)))
        .await
        .unwrap();

    let list = DepartmentRepo::list_by_church(&pool, church).await.unwrap();
    assert_eq!(list[0].id, louvor.id);
    assert_eq!(list[1].parent_id, Some(louvor.id));
    assert!(DepartmentRepo::has_children(&pool, louvor.id).await.unwrap());

    let detached = DepartmentRepo::update(
        &pool,
        coral.id,
        church,
        &UpdateDepartment {
            parent_id: Some(None),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(detached.parent_id, None);
    assert_eq!(detached.name, "Coral");
}

#[sqlx::test(migrations = "./migrations")]
async fn duplicate_membership_is_rejected(pool: PgPool) {
    let church = new_church(&pool, "A", "a").await;
    let user = new_member(&pool, church, "ana", &["Vocal"]).await;
    let dept = DepartmentRepo::create(&pool, church, &new_department("Louvor", None))
        .await
        .unwrap();
    let input = CreateMembership {
        user_id: user,
        is_leader: false,
    };

    assert!(!MembershipRepo::is_member(&pool, dept.id, user).await.unwrap());
    MembershipRepo::add(&pool, dept.id, &input).await.unwrap();
    assert!(MembershipRepo::is_member(&pool, dept.id, user).await.unwrap());
    let err = MembershipRepo::add(&pool, dept.id, &input).await.unwrap_err();
    assert_eq!(
        err.as_database_error().unwrap().constraint(),
        Some("uq_user_departments_user_department")
    );

    let dept = DepartmentRepo::find_in_church(&pool, dept.id, church)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(dept.member_count, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn scale_status_stamps_published_at(pool: PgPool) {
    let church = new_church(&pool, "A", "a").await;
    let author = new_member(&pool, church, "ana", &["Vocal"]).await;
    let dept = DepartmentRepo::create(&pool, church, &new_department("Louvor", None))
        .await
        .unwrap();
    let scale = ScaleRepo::create(&pool, church, author, &new_scale(dept.id, date(2026, 3, 1)))
        .await
        .unwrap();
    assert_eq!(scale.status, "draft");
    assert!(scale.published_at.is_none());

    let published = ScaleRepo::set_status(&pool, scale.id, church, "draft", "published")
        .await
        .unwrap()
        .unwrap();
    assert!(published.published_at.is_some());

    let back = ScaleRepo::set_status(&pool, scale.id, church, "published", "draft")
        .await
        .unwrap()
        .unwrap();
    assert!(back.published_at.is_none());

    let filtered = ScaleRepo::list_by_church(
        &pool,
        church,
        &ScaleFilter {
            status: Some("published".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert!(filtered.is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn completed_scale_refuses_stale_writes(pool: PgPool) {
    let church = new_church(&pool, "A", "a").await;
    let author = new_member(&pool, church, "ana", &["Vocal"]).await;
    let dept = DepartmentRepo::create(&pool, church, &new_department("Louvor", None))
        .await
        .unwrap();
    let scale = ScaleRepo::create(&pool, church, author, &new_scale(dept.id, date(2026, 3, 1)))
        .await
        .unwrap();
    let item = AgendaItemRepo::add(
        &pool,
        scale.id,
        &CreateAgendaItem {
            title: "Abertura".to_string(),
            duration_minutes: 10,
            position: None,
            responsible: None,
        },
    )
    .await
    .unwrap()
    .unwrap();
    ScaleRepo::set_status(&pool, scale.id, church, "draft", "published")
        .await
        .unwrap()
        .unwrap();

    // Two leaders both saw `published`; one completes the scale first.
    ScaleRepo::set_status(&pool, scale.id, church, "published", "completed")
        .await
        .unwrap()
        .unwrap();
    let stale = ScaleRepo::set_status(&pool, scale.id, church, "published", "draft")
        .await
        .unwrap();
    assert!(stale.is_none());

    let added = ScaleMemberRepo::add(
        &pool,
        scale.id,
        &CreateScaleMember {
            user_id: author,
            function_name: "Vocal".to_string(),
        },
    )
    .await
    .unwrap();
    assert!(added.is_none());
    assert!(!AgendaItemRepo::remove(&pool, scale.id, item.id).await.unwrap());
    assert!(!ScaleRepo::delete(&pool, scale.id, church).await.unwrap());

    let current = ScaleRepo::find_in_church(&pool, scale.id, church)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(current.status, "completed");
    assert_eq!(AgendaItemRepo::list_for_scale(&pool, scale.id).await.unwrap().len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn agenda_items_append_in_order(pool: PgPool) {
    let church = new_church(&pool, "A", "a").await;
    let author = new_member(&pool, church, "ana", &["Vocal"]).await;
    let dept = DepartmentRepo::create(&pool, church, &new_department("Louvor", None))
        .await
        .unwrap();
    let scale = ScaleRepo::create(&pool, church, author, &new_scale(dept.id, date(2026, 3, 1)))
        .await
        .unwrap();

    for title in ["Abertura", "Louvor", "Palavra"] {
        AgendaItemRepo::add(
            &pool,
            scale.id,
            &CreateAgendaItem {
                title: title.to_string(),
                duration_minutes: 15,
                position: None,
                responsible: None,
            },
        )
        .await
        .unwrap()
        .unwrap();
    }

    let items = AgendaItemRepo::list_for_scale(&pool, scale.id).await.unwrap();
    let positions: Vec<i32> = items.iter().map(|i| i.position).collect();
    assert_eq!(positions, vec![0, 1, 2]);
    assert_eq!(items[2].title, "Palavra");
}

#[sqlx::test(migrations = "./migrations")]
async fn candidate_stats_aggregate_history(pool: PgPool) {
    let church = new_church(&pool, "A", "a").await;
    let ana = new_member(&pool, church, "ana", &["Vocal"]).await;
    let bia = new_member(&pool, church, "bia", &["Bateria"]).await;
    let dept = DepartmentRepo::create(&pool, church, &new_department("Louvor", None))
        .await
        .unwrap();
    for user_id in [ana, bia] {
        MembershipRepo::add(
            &pool,
            dept.id,
            &CreateMembership {
                user_id,
                is_leader: false,
            },
        )
        .await
        .unwrap();
    }

    // Two past published scales for Ana: one confirmed, one declined.
    for (day, answer) in [(1, "confirmed"), (8, "declined")] {
        let scale = ScaleRepo::create(&pool, church, ana, &new_scale(dept.id, date(2026, 3, day)))
            .await
            .unwrap();
        ScaleMemberRepo::add(
            &pool,
            scale.id,
            &CreateScaleMember {
                user_id: ana,
                function_name: "Vocal".to_string(),
            },
        )
        .await
        .unwrap();
        ScaleRepo::set_status(&pool, scale.id, church, "draft", "published")
            .await
            .unwrap();
        ScaleMemberRepo::respond(&pool, scale.id, ana, answer)
            .await
            .unwrap();
    }

    let stats = CandidateRepo::list_stats(&pool, church, Some(dept.id), date(2026, 3, 20))
        .await
        .unwrap();
    assert_eq!(stats.len(), 2);

    let ana_stats = stats.iter().find(|s| s.user_id == ana).unwrap();
    assert_eq!(ana_stats.total_scales, 2);
    assert_eq!(ana_stats.confirmed_count, 1);
    assert_eq!(ana_stats.declined_count, 1);
    assert_eq!(ana_stats.last_participation, Some(date(2026, 3, 8)));

    let bia_profile = stats
        .into_iter()
        .find(|s| s.user_id == bia)
        .unwrap()
        .into_profile();
    assert_eq!(bia_profile.total_scales, 0);
    assert_eq!(bia_profile.confirmation_rate, 0.0);
    assert_eq!(bia_profile.functions, vec!["Bateria".to_string()]);
    assert!(bia_profile.last_participation.is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn refresh_sessions_are_single_use_and_revoked_with_the_church(pool: PgPool) {
    let church = new_church(&pool, "Igreja Central", "igreja-central").await;
    let user_id = new_member(&pool, church, "joana", &[]).await;

    for hash in ["hash-a", "hash-b"] {
        SessionRepo::create(
            &pool,
            &CreateSession {
                user_id,
                church_id: Some(church),
                refresh_token_hash: hash.to_string(),
                expires_at: chrono::Utc::now() + chrono::Duration::days(7),
            },
        )
        .await
        .unwrap();
    }
    assert_eq!(SessionRepo::count_live_for_user(&pool, user_id).await.unwrap(), 2);

    let used = SessionRepo::consume(&pool, "hash-a").await.unwrap().unwrap();
    assert_eq!(used.user_id, user_id);
    assert!(!used.is_live(chrono::Utc::now()));
    assert!(SessionRepo::consume(&pool, "hash-a").await.unwrap().is_none());

    assert_eq!(SessionRepo::revoke_all_for_church(&pool, church).await.unwrap(), 1);
    assert_eq!(SessionRepo::count_live_for_user(&pool, user_id).await.unwrap(), 0);
    assert!(SessionRepo::consume(&pool, "hash-b").await.unwrap().is_none());
}
