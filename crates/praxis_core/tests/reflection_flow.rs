use chrono::NaiveDate;
use praxis_core::db::open_db_in_memory;
use praxis_core::{
    Classification, ClassifyError, FixedClock, GoalCreateRequest, GoalService, GoalTargetType,
    GoalType, ReflectionClassifier, ReflectionIntakeRequest, ReflectionService, ScoringConfig,
    ServiceError, UnavailableClassifier, DEFAULT_DOMAIN,
};
use rusqlite::Connection;
use uuid::Uuid;

const TODAY: fn() -> NaiveDate = || NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();

fn sandbox_config() -> ScoringConfig {
    ScoringConfig {
        auto_provision_users: true,
        ..ScoringConfig::default()
    }
}

fn request(user_id: Uuid, text: &str, domains: Vec<String>) -> ReflectionIntakeRequest {
    ReflectionIntakeRequest {
        user_id,
        primary_response: text.to_string(),
        domains,
        ..ReflectionIntakeRequest::default()
    }
}

struct FixedClassifier(Result<Classification, ClassifyError>);

impl ReflectionClassifier for FixedClassifier {
    fn classify(&self, _text: &str) -> Result<Classification, ClassifyError> {
        self.0.clone()
    }
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

#[test]
fn short_primary_response_is_rejected_without_writes() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = ReflectionService::try_new(
        &mut conn,
        sandbox_config(),
        FixedClock::at_day(TODAY()),
        &UnavailableClassifier,
    )
    .unwrap();

    let err = service
        .create(&request(Uuid::new_v4(), "too short", vec![]))
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidRequest(_)));
    drop(service);

    assert_eq!(count(&conn, "reflections"), 0);
    assert_eq!(count(&conn, "xp_ledger"), 0);
    assert_eq!(count(&conn, "users"), 0);
}

#[test]
fn create_persists_reflection_with_zero_xp_ledger_entry() {
    let mut conn = open_db_in_memory().unwrap();
    let user_id = Uuid::new_v4();
    let mut service = ReflectionService::try_new(
        &mut conn,
        sandbox_config(),
        FixedClock::at_day(TODAY()),
        &UnavailableClassifier,
    )
    .unwrap();

    let result = service
        .create(&request(
            user_id,
            "tried a longer wait time before cold calling today",
            vec!["instruction".to_string()],
        ))
        .unwrap();
    drop(service);

    assert_eq!(result.xp_earned, 0);
    assert_eq!(result.reflection.domains, vec!["instruction".to_string()]);
    assert!(result.goals_updated.is_empty());

    let (amount, source_type): (i64, String) = conn
        .query_row(
            "SELECT amount, source_type FROM xp_ledger WHERE user_id = ?1;",
            [user_id.to_string()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(amount, 0);
    assert_eq!(source_type, "reflection");

    let (total_xp, streak): (i64, u32) = conn
        .query_row(
            "SELECT total_xp, current_streak FROM users WHERE id = ?1;",
            [user_id.to_string()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(total_xp, 0);
    assert_eq!(streak, 1);
}

#[test]
fn missing_domains_fall_back_to_default_when_classifier_unavailable() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = ReflectionService::try_new(
        &mut conn,
        sandbox_config(),
        FixedClock::at_day(TODAY()),
        &UnavailableClassifier,
    )
    .unwrap();

    let result = service
        .create(&request(
            Uuid::new_v4(),
            "students settled much faster after the new routine",
            vec![],
        ))
        .unwrap();
    assert_eq!(result.reflection.domains, vec![DEFAULT_DOMAIN.to_string()]);
}

#[test]
fn classifier_supplies_domain_and_skill_when_absent() {
    let mut conn = open_db_in_memory().unwrap();
    let classifier = FixedClassifier(Ok(Classification {
        domain: "assessment".to_string(),
        skill_id: Some("exit-tickets".to_string()),
        skill_name: Some("Exit tickets".to_string()),
    }));
    let mut service = ReflectionService::try_new(
        &mut conn,
        sandbox_config(),
        FixedClock::at_day(TODAY()),
        &classifier,
    )
    .unwrap();

    let result = service
        .create(&request(
            Uuid::new_v4(),
            "collected exit tickets and sorted misconceptions",
            vec![],
        ))
        .unwrap();
    assert_eq!(result.reflection.domains, vec!["assessment".to_string()]);
    assert_eq!(result.reflection.skill_id.as_deref(), Some("exit-tickets"));
}

#[test]
fn classifier_failure_degrades_to_default_domain() {
    let mut conn = open_db_in_memory().unwrap();
    let classifier = FixedClassifier(Err(ClassifyError::Timeout));
    let mut service = ReflectionService::try_new(
        &mut conn,
        sandbox_config(),
        FixedClock::at_day(TODAY()),
        &classifier,
    )
    .unwrap();

    let result = service
        .create(&request(
            Uuid::new_v4(),
            "the classifier was down but this still saved fine",
            vec![],
        ))
        .unwrap();
    assert_eq!(result.reflection.domains, vec![DEFAULT_DOMAIN.to_string()]);
}

#[test]
fn deletion_reverses_xp_but_not_goal_progress_or_streak() {
    let mut conn = open_db_in_memory().unwrap();
    let config = sandbox_config();
    let user_id = Uuid::new_v4();
    let clock = FixedClock::at_day(TODAY());

    let mut goal_service = GoalService::try_new(&mut conn, config.clone(), clock).unwrap();
    let goal = goal_service
        .create(&GoalCreateRequest {
            user_id,
            title: "reflect on instruction".to_string(),
            goal_type: GoalType::Weekly,
            target_type: GoalTargetType::DomainFocus,
            target_value: 3,
            target_skill_id: None,
            target_domain: Some("instruction".to_string()),
            due_date: None,
        })
        .unwrap();
    drop(goal_service);

    let mut service =
        ReflectionService::try_new(&mut conn, config, clock, &UnavailableClassifier).unwrap();
    let created = service
        .create(&request(
            user_id,
            "narrated positive behavior during independent work",
            vec!["instruction".to_string()],
        ))
        .unwrap();
    assert_eq!(created.goals_updated.len(), 1);

    let deleted = service.delete(user_id, created.reflection.id).unwrap();
    assert_eq!(deleted.xp_removed, 0);
    drop(service);

    assert_eq!(count(&conn, "reflections"), 0);
    assert_eq!(count(&conn, "xp_ledger"), 0);

    // Goal progress and streak both survive the deletion.
    let current_value: i64 = conn
        .query_row(
            "SELECT current_value FROM goals WHERE id = ?1;",
            [goal.id.to_string()],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(current_value, 1);

    let streak: u32 = conn
        .query_row(
            "SELECT current_streak FROM users WHERE id = ?1;",
            [user_id.to_string()],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(streak, 1);
}

#[test]
fn deletion_requires_ownership() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = Uuid::new_v4();
    let intruder = Uuid::new_v4();
    let mut service = ReflectionService::try_new(
        &mut conn,
        sandbox_config(),
        FixedClock::at_day(TODAY()),
        &UnavailableClassifier,
    )
    .unwrap();

    let created = service
        .create(&request(
            owner,
            "tried three-column notes with the second block",
            vec!["instruction".to_string()],
        ))
        .unwrap();

    let err = service.delete(intruder, created.reflection.id).unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    let err = service.delete(owner, Uuid::new_v4()).unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}
