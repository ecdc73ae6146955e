//! Login-only people pages.

use super::super::request::{parse_answer_set_form, Method, Request};
use super::super::response::{PERSON_CREATE_TEMPLATE, PERSON_LIST_TEMPLATE, PERSON_UPDATE_TEMPLATE};
use super::super::{Mapper, PageContext, Response, ViewResult, INDEX_URL};
use crate::model::answer_set::{AnswerSetInput, AnswerSetOwner};
use crate::model::person::{Person, PersonId, User};
use crate::permission::can_edit;
use crate::repo::answer_set_repo::SqliteAnswerSetRepository;
use crate::repo::person_repo::SqlitePersonRepository;
use crate::repo::question_repo::SqliteQuestionRepository;
use crate::repo::relationship_repo::SqliteRelationshipRepository;
use crate::service::answer_set_service::{
    AnswerSetService, AnswerSetServiceError, InitialAnswers,
};
use crate::service::map::map_marker;
use crate::service::person_service::PersonService;
use crate::service::profile_service::{ProfileOutcome, ProfileService};
use crate::service::FieldError;
use log::warn;

/// Query key that links a newly created person to the viewer.
const LINK_USER_QUERY: &str = "user";

type SqliteAnswerSetService<'conn> =
    AnswerSetService<SqliteQuestionRepository<'conn>, SqliteAnswerSetRepository<'conn>>;

fn person_service<'conn>(
    mapper: &Mapper<'conn>,
) -> PersonService<SqlitePersonRepository<'conn>, SqliteRelationshipRepository<'conn>> {
    PersonService::new(
        SqlitePersonRepository::new(mapper.conn()),
        SqliteRelationshipRepository::new(mapper.conn()),
    )
}

fn answer_set_service<'conn>(mapper: &Mapper<'conn>) -> SqliteAnswerSetService<'conn> {
    AnswerSetService::new(
        SqliteQuestionRepository::new(mapper.conn()),
        SqliteAnswerSetRepository::new(mapper.conn()),
    )
}

pub(in crate::web) fn person_list(mapper: &Mapper<'_>, viewer: &User) -> ViewResult {
    let listing = person_service(mapper).list_for_viewer(viewer)?;
    Ok(mapper.render(
        PERSON_LIST_TEMPLATE,
        PageContext::PersonList {
            person_list: listing.persons,
            existing_relationships: listing.existing_relationships,
        },
    ))
}

pub(in crate::web) fn person_create(
    mapper: &Mapper<'_>,
    viewer: &User,
    request: &Request,
) -> ViewResult {
    if request.method == Method::Get {
        return Ok(create_form(mapper, String::new(), Vec::new()));
    }

    let name = request.form.first("name").unwrap_or_default().to_string();
    let link_to_viewer = request.query.contains_key(LINK_USER_QUERY);
    match person_service(mapper).create_person(viewer, &name, link_to_viewer)? {
        Ok(person) => Ok(Response::redirect(person.profile_url())),
        Err(errors) => Ok(create_form(mapper, name, errors)),
    }
}

fn create_form(mapper: &Mapper<'_>, name: String, errors: Vec<FieldError>) -> Response {
    mapper.render(PERSON_CREATE_TEMPLATE, PageContext::PersonCreate { name, errors })
}

pub(in crate::web) fn profile(
    mapper: &Mapper<'_>,
    viewer: &User,
    pk: Option<PersonId>,
) -> ViewResult {
    let service = ProfileService::new(
        SqlitePersonRepository::new(mapper.conn()),
        SqliteQuestionRepository::new(mapper.conn()),
        SqliteAnswerSetRepository::new(mapper.conn()),
    );
    match service.resolve_profile(viewer, pk)? {
        ProfileOutcome::NotFound => Ok(Response::redirect(INDEX_URL)),
        ProfileOutcome::RedirectToUpdate(person) => Ok(Response::redirect(person.update_url())),
        ProfileOutcome::Show(page) => {
            let template = page.template;
            Ok(mapper.render(template, PageContext::Profile(page)))
        }
    }
}

pub(in crate::web) fn person_update(
    mapper: &Mapper<'_>,
    viewer: &User,
    pk: PersonId,
    request: &Request,
) -> ViewResult {
    let Some(person) = person_service(mapper).get_person(pk)? else {
        return Ok(Response::redirect(INDEX_URL));
    };
    if !can_edit(viewer, &person) {
        warn!(
            "event=person_update module=web status=forbidden viewer_id={} person_id={}",
            viewer.id, person.id
        );
        return Ok(Response::Forbidden);
    }

    let service = answer_set_service(mapper);
    if request.method == Method::Get {
        return update_form(mapper, &service, person, None, Vec::new());
    }

    let input = match parse_answer_set_form(&request.form) {
        Ok(input) => input,
        Err(errors) => return update_form(mapper, &service, person, None, errors),
    };
    match service.update_person_answers(person.id, &input) {
        Ok(_) => Ok(Response::redirect(person.profile_url())),
        Err(AnswerSetServiceError::Invalid(errors)) => {
            update_form(mapper, &service, person, Some(&input), errors)
        }
        Err(AnswerSetServiceError::Repo(err)) => Err(err.into()),
    }
}

/// Renders the update form, echoing `submitted` when it was rejected.
fn update_form(
    mapper: &Mapper<'_>,
    service: &SqliteAnswerSetService<'_>,
    person: Person,
    submitted: Option<&AnswerSetInput>,
    errors: Vec<FieldError>,
) -> ViewResult {
    let initial = match submitted {
        Some(input) => InitialAnswers::from_submission(person.id, input),
        None => service.initial_for_person(person.id)?,
    };
    let current = service.current_answers(AnswerSetOwner::Person(person.id))?;
    let map_markers = vec![map_marker(&person, current.as_ref())];
    Ok(mapper.render(
        PERSON_UPDATE_TEMPLATE,
        PageContext::PersonUpdate {
            person,
            initial,
            errors,
            map_markers,
        },
    ))
}
