use breccia_core::db::open_db_in_memory;
use breccia_core::model::answer_set::{AnswerSetInput, AnswerSetOwner};
use breccia_core::model::person::{NewPerson, Person};
use breccia_core::model::question::{NewQuestion, QuestionScope};
use breccia_core::model::relationship::RelationshipState;
use breccia_core::model::ValidationError;
use breccia_core::repo::answer_set_repo::{AnswerSetRepository, SqliteAnswerSetRepository};
use breccia_core::repo::person_repo::{PersonRepository, SqlitePersonRepository};
use breccia_core::repo::question_repo::{QuestionRepository, SqliteQuestionRepository};
use breccia_core::repo::relationship_repo::{RelationshipRepository, SqliteRelationshipRepository};
use breccia_core::repo::RepoError;
use breccia_core::service::answer_set_service::{AnswerSetService, AnswerSetServiceError};
use breccia_core::service::relationship_service::RelationshipService;
use chrono::{Duration, Utc};
use rusqlite::Connection;

fn person(conn: &Connection, name: &str) -> Person {
    SqlitePersonRepository::new(conn)
        .create_person(&NewPerson {
            name: name.to_string(),
            user_id: None,
        })
        .unwrap()
}

fn service(
    conn: &Connection,
) -> RelationshipService<SqliteRelationshipRepository<'_>, SqliteAnswerSetRepository<'_>> {
    RelationshipService::new(
        SqliteRelationshipRepository::new(conn),
        SqliteAnswerSetRepository::new(conn),
    )
}

#[test]
fn unknown_pair_has_no_relationship() {
    let conn = open_db_in_memory().unwrap();
    let ada = person(&conn, "Ada");
    let grace = person(&conn, "Grace");

    assert_eq!(
        service(&conn).relationship_state(ada.id, grace.id).unwrap(),
        RelationshipState::None
    );
}

#[test]
fn relationship_without_answers_is_not_current() {
    let conn = open_db_in_memory().unwrap();
    let ada = person(&conn, "Ada");
    let grace = person(&conn, "Grace");
    let relationship = service(&conn).create_relationship(ada.id, grace.id).unwrap();

    let state = service(&conn).relationship_state(ada.id, grace.id).unwrap();
    assert_eq!(state, RelationshipState::NotCurrent(relationship));
    assert!(!state.is_current());

    assert_eq!(
        service(&conn).relationship_state(grace.id, ada.id).unwrap(),
        RelationshipState::None
    );
}

#[test]
fn relationship_with_current_answers_is_current() {
    let conn = open_db_in_memory().unwrap();
    let ada = person(&conn, "Ada");
    let grace = person(&conn, "Grace");
    let relationship = service(&conn).create_relationship(ada.id, grace.id).unwrap();

    SqliteAnswerSetRepository::new(&conn)
        .replace_current(
            AnswerSetOwner::Relationship(relationship.id),
            &AnswerSetInput::default(),
            Utc::now(),
        )
        .unwrap();

    let state = service(&conn).relationship_state(ada.id, grace.id).unwrap();
    assert!(state.is_current());
    assert_eq!(state.relationship(), Some(&relationship));
}

#[test]
fn duplicate_and_self_relationships_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    let ada = person(&conn, "Ada");
    let grace = person(&conn, "Grace");
    service(&conn).create_relationship(ada.id, grace.id).unwrap();

    let duplicate = service(&conn).create_relationship(ada.id, grace.id).unwrap_err();
    assert!(matches!(duplicate, RepoError::Conflict(_)));

    let own = service(&conn).create_relationship(ada.id, ada.id).unwrap_err();
    assert!(matches!(
        own,
        RepoError::Validation(ValidationError::SelfRelationship)
    ));

    let missing = service(&conn).create_relationship(ada.id, 404).unwrap_err();
    assert!(matches!(missing, RepoError::NotFound { id: 404, .. }));
}

#[test]
fn target_ids_follow_outgoing_edges() {
    let conn = open_db_in_memory().unwrap();
    let ada = person(&conn, "Ada");
    let grace = person(&conn, "Grace");
    let alan = person(&conn, "Alan");
    let repo = SqliteRelationshipRepository::new(&conn);
    repo.create_relationship(ada.id, grace.id, Utc::now()).unwrap();
    repo.create_relationship(ada.id, alan.id, Utc::now()).unwrap();
    repo.create_relationship(grace.id, ada.id, Utc::now()).unwrap();

    let targets: Vec<i64> = repo.target_ids(ada.id).unwrap().into_iter().collect();
    let mut expected = vec![grace.id, alan.id];
    expected.sort_unstable();
    assert_eq!(targets, expected);
}

#[test]
fn relationship_stays_current_when_clock_steps_backwards() {
    let conn = open_db_in_memory().unwrap();
    let ada = person(&conn, "Ada");
    let grace = person(&conn, "Grace");
    let relationship = service(&conn).create_relationship(ada.id, grace.id).unwrap();
    let owner = AnswerSetOwner::Relationship(relationship.id);
    let repo = SqliteAnswerSetRepository::new(&conn);
    let now = Utc::now();

    repo.replace_current(owner, &AnswerSetInput::default(), now)
        .unwrap();
    let second = repo
        .replace_current(
            owner,
            &AnswerSetInput::default(),
            now - Duration::seconds(1),
        )
        .unwrap();

    assert_eq!(
        repo.latest_answer_set(owner).unwrap().map(|set| set.id),
        Some(second.answer_set.id)
    );
    assert!(service(&conn)
        .relationship_state(ada.id, grace.id)
        .unwrap()
        .is_current());
}

#[test]
fn relationship_answers_are_validated_against_relationship_questions() {
    let conn = open_db_in_memory().unwrap();
    let ada = person(&conn, "Ada");
    let grace = person(&conn, "Grace");
    let relationship = service(&conn).create_relationship(ada.id, grace.id).unwrap();
    let questions = SqliteQuestionRepository::new(&conn);
    let closeness = questions
        .create_question(
            &NewQuestion::new(QuestionScope::Relationship, "How close are you?")
                .with_choices(["Acquaintance", "Colleague", "Friend"]),
        )
        .unwrap();
    let answers = AnswerSetService::new(
        SqliteQuestionRepository::new(&conn),
        SqliteAnswerSetRepository::new(&conn),
    );

    let mut foreign = AnswerSetInput::default();
    foreign.answers.insert(closeness.id, vec![9_999]);
    foreign.answers.insert(closeness.id + 100, vec![closeness.choices[0].id]);
    match answers
        .update_relationship_answers(relationship.id, &foreign)
        .unwrap_err()
    {
        AnswerSetServiceError::Invalid(errors) => assert_eq!(errors.len(), 2),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(
        service(&conn).relationship_state(ada.id, grace.id).unwrap(),
        RelationshipState::NotCurrent(relationship.clone())
    );

    let mut valid = AnswerSetInput::default();
    valid
        .answers
        .insert(closeness.id, vec![closeness.choices[2].id]);
    let replacement = answers
        .update_relationship_answers(relationship.id, &valid)
        .unwrap();
    assert_eq!(replacement.replaced, 0);
    assert_eq!(
        replacement.answer_set.choice_ids,
        vec![closeness.choices[2].id]
    );
    assert_eq!(
        service(&conn).relationship_state(ada.id, grace.id).unwrap(),
        RelationshipState::Current(relationship)
    );
}
