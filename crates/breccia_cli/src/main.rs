//! Breccia command-line entry point.
//!
//! # Responsibility
//! - Load settings, start logging and open the configured database.
//! - Seed users, people, questions and activities.
//! - Drive the view layer for one request and print the response as JSON.

use anyhow::{anyhow, bail, Context, Result};
use breccia_core::config::{init_settings, settings, DatabaseLocation, Settings};
use breccia_core::db::migrations::current_version;
use breccia_core::model::activity::NewActivity;
use breccia_core::model::person::{NewPerson, User};
use breccia_core::model::question::{NewQuestion, QuestionScope};
use breccia_core::model::relationship::RelationshipState;
use breccia_core::repo::activity_repo::{ActivityRepository, SqliteActivityRepository};
use breccia_core::repo::answer_set_repo::SqliteAnswerSetRepository;
use breccia_core::repo::person_repo::{PersonRepository, SqlitePersonRepository};
use breccia_core::repo::question_repo::{QuestionRepository, SqliteQuestionRepository};
use breccia_core::repo::relationship_repo::SqliteRelationshipRepository;
use breccia_core::repo::user_repo::{SqliteUserRepository, UserRepository};
use breccia_core::service::relationship_service::RelationshipService;
use breccia_core::web::{FormData, Mapper, Request};
use breccia_core::{init_logging, open_db, open_db_in_memory};
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use rusqlite::Connection;
use std::path::PathBuf;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Parser)]
#[command(name = "breccia")]
#[command(about = "Community mapper: people, survey answers and activities")]
struct Cli {
    /// Settings file; environment variables take precedence over it.
    #[arg(long, default_value = "settings.toml")]
    settings: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending schema migrations
    Migrate,
    /// Create a login identity
    CreateUser {
        username: String,
        #[arg(long)]
        superuser: bool,
    },
    /// Create a person, optionally linked to a user
    CreatePerson {
        name: String,
        #[arg(long)]
        user: Option<String>,
    },
    /// Define a survey question with its choices
    CreateQuestion {
        #[arg(long, value_enum, default_value_t = Scope::Person)]
        scope: Scope,
        text: String,
        #[arg(long = "choice", required = true)]
        choices: Vec<String>,
        #[arg(long)]
        public: bool,
        #[arg(long)]
        hardcoded: bool,
        #[arg(long)]
        multiple: bool,
        #[arg(long, default_value_t = 0)]
        order: i64,
    },
    /// Create a directed relationship between two people
    CreateRelationship { source: i64, target: i64 },
    /// Report whether a relationship exists and is current
    RelationshipStatus { source: i64, target: i64 },
    /// Create an activity series
    CreateSeries {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Schedule an activity; times use `YYYY-MM-DD HH:MM`
    CreateActivity {
        name: String,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        series: Option<i64>,
        #[arg(long)]
        online: bool,
        #[arg(long)]
        location: Option<String>,
    },
    /// Run one request through the view layer
    Request {
        path: String,
        /// Send as POST with the given `key=value` form fields
        #[arg(long)]
        post: bool,
        #[arg(long = "field")]
        fields: Vec<String>,
        #[arg(long = "query")]
        query: Vec<String>,
        /// Username of the viewer; anonymous when omitted
        #[arg(long = "as")]
        viewer: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Scope {
    Person,
    Relationship,
}

impl From<Scope> for QuestionScope {
    fn from(value: Scope) -> Self {
        match value {
            Scope::Person => Self::Person,
            Scope::Relationship => Self::Relationship,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = Settings::load(Some(&cli.settings))
        .with_context(|| format!("failed to load settings from `{}`", cli.settings.display()))?;
    init_settings(loaded)?;
    let settings = settings().context("settings were not initialized")?;
    init_logging(&settings.log_level, &settings.log_filename, settings.log_days)
        .map_err(|err| anyhow!(err))
        .context("failed to initialize logging")?;

    let conn = match &settings.database {
        DatabaseLocation::File(path) => open_db(path)
            .with_context(|| format!("failed to open database `{}`", path.display()))?,
        DatabaseLocation::Memory => open_db_in_memory()?,
    };

    run(cli.command, &conn)
}

fn run(command: Commands, conn: &Connection) -> Result<()> {
    match command {
        Commands::Migrate => {
            println!("schema version {}", current_version(conn)?);
        }
        Commands::CreateUser {
            username,
            superuser,
        } => {
            let user = SqliteUserRepository::new(conn).create_user(&username, superuser)?;
            print_json(&user)?;
        }
        Commands::CreatePerson { name, user } => {
            let user_id = match user {
                Some(username) => Some(find_user(conn, &username)?.id),
                None => None,
            };
            let person = SqlitePersonRepository::new(conn).create_person(&NewPerson {
                name,
                user_id,
            })?;
            print_json(&person)?;
        }
        Commands::CreateQuestion {
            scope,
            text,
            choices,
            public,
            hardcoded,
            multiple,
            order,
        } => {
            let mut question = NewQuestion::new(scope.into(), text)
                .with_choices(choices)
                .ordered(order);
            question.answer_is_public = public;
            question.is_hardcoded = hardcoded;
            question.allow_multiple = multiple;
            let question = SqliteQuestionRepository::new(conn).create_question(&question)?;
            print_json(&question)?;
        }
        Commands::CreateRelationship { source, target } => {
            let relationship = relationship_service(conn).create_relationship(source, target)?;
            print_json(&relationship)?;
        }
        Commands::RelationshipStatus { source, target } => {
            match relationship_service(conn).relationship_state(source, target)? {
                RelationshipState::None => println!("none"),
                RelationshipState::Current(relationship) => {
                    println!("current relationship_id={}", relationship.id)
                }
                RelationshipState::NotCurrent(relationship) => {
                    println!("not_current relationship_id={}", relationship.id)
                }
            }
        }
        Commands::CreateSeries { name, description } => {
            let series = SqliteActivityRepository::new(conn).create_series(&name, &description)?;
            print_json(&series)?;
        }
        Commands::CreateActivity {
            name,
            start,
            end,
            series,
            online,
            location,
        } => {
            let mut activity = NewActivity::new(name, parse_datetime(&start)?);
            activity.end_time = end.as_deref().map(parse_datetime).transpose()?;
            activity.series_id = series;
            activity.is_online = online;
            activity.location = location;
            let activity = SqliteActivityRepository::new(conn).create_activity(&activity)?;
            print_json(&activity)?;
        }
        Commands::Request {
            path,
            post,
            fields,
            query,
            viewer,
        } => {
            let mut request = if post {
                let mut form = FormData::new();
                for field in &fields {
                    let (key, value) = split_pair(field)?;
                    form.append(key, value);
                }
                Request::post(path, form)
            } else {
                Request::get(path)
            };
            for pair in &query {
                let (key, value) = split_pair(pair)?;
                request = request.with_query(key, value);
            }
            if let Some(username) = viewer {
                request = request.as_user(find_user(conn, &username)?);
            }

            let response = Mapper::configured(conn).handle(&request)?;
            info!(
                "event=cli_request module=cli status=ok code={}",
                response.status_code()
            );
            print_json(&response)?;
        }
    }
    Ok(())
}

fn relationship_service(
    conn: &Connection,
) -> RelationshipService<SqliteRelationshipRepository<'_>, SqliteAnswerSetRepository<'_>> {
    RelationshipService::new(
        SqliteRelationshipRepository::new(conn),
        SqliteAnswerSetRepository::new(conn),
    )
}

fn find_user(conn: &Connection, username: &str) -> Result<User> {
    SqliteUserRepository::new(conn)
        .get_user_by_username(username)?
        .ok_or_else(|| anyhow!("no user named `{username}`"))
}

fn split_pair(pair: &str) -> Result<(&str, &str)> {
    match pair.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key, value)),
        _ => bail!("expected `key=value`, got `{pair}`"),
    }
}

fn parse_datetime(value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, DATETIME_FORMAT)
        .with_context(|| format!("`{value}` does not match {DATETIME_FORMAT}"))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
