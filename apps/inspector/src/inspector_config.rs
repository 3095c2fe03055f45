use std::env;

use accessgate_application::{EntityListRequest, MAX_PAGE_SIZE, ParentContext};
use accessgate_core::{ActorId, AppError, AppResult, EntityId, EntityTypeCode};
use accessgate_domain::PermissionLevel;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: accessgate-inspector <command>
  migrate
  max-level <actor-id> <entity-type> <entity-id|all>
  accessible <actor-id> <entity-type> [min-level]
  check <actor-id> <entity-type> <entity-id> [min-level]
  list <actor-id> <entity-type> [--parent <type>:<id>] [--relation <kind>] [--search <term>]
       [--active-only] [--min-level <level>] [--limit <n>] [--offset <n>]";

/// Sub-command selected on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InspectorCommand {
    Migrate,
    MaxLevel {
        actor_id: ActorId,
        entity_type: EntityTypeCode,
        entity_id: EntityId,
    },
    Accessible {
        actor_id: ActorId,
        entity_type: EntityTypeCode,
        min_level: PermissionLevel,
    },
    Check {
        actor_id: ActorId,
        entity_type: EntityTypeCode,
        entity_id: EntityId,
        min_level: PermissionLevel,
    },
    List {
        actor_id: ActorId,
        request: EntityListRequest,
    },
}

impl InspectorCommand {
    /// Parses arguments following the program name.
    pub fn parse(args: &[String]) -> AppResult<Self> {
        let Some((command, rest)) = args.split_first() else {
            return Err(usage_error("missing command"));
        };

        match command.as_str() {
            "migrate" => Ok(Self::Migrate),
            "max-level" => {
                let [actor_id, entity_type, entity_id] = rest else {
                    return Err(usage_error("max-level takes three arguments"));
                };
                Ok(Self::MaxLevel {
                    actor_id: ActorId::parse(actor_id)?,
                    entity_type: EntityTypeCode::new(entity_type.as_str())?,
                    entity_id: parse_entity_id(entity_id)?,
                })
            }
            "accessible" => match rest {
                [actor_id, entity_type] | [actor_id, entity_type, _] => Ok(Self::Accessible {
                    actor_id: ActorId::parse(actor_id)?,
                    entity_type: EntityTypeCode::new(entity_type.as_str())?,
                    min_level: parse_optional_level(rest.get(2))?,
                }),
                _ => Err(usage_error("accessible takes two or three arguments")),
            },
            "check" => match rest {
                [actor_id, entity_type, entity_id] | [actor_id, entity_type, entity_id, _] => {
                    Ok(Self::Check {
                        actor_id: ActorId::parse(actor_id)?,
                        entity_type: EntityTypeCode::new(entity_type.as_str())?,
                        entity_id: EntityId::parse(entity_id)?,
                        min_level: parse_optional_level(rest.get(3))?,
                    })
                }
                _ => Err(usage_error("check takes three or four arguments")),
            },
            "list" => parse_list(rest),
            other => Err(usage_error(&format!("unknown command '{other}'"))),
        }
    }
}

fn parse_list(args: &[String]) -> AppResult<InspectorCommand> {
    let [actor_id, entity_type, options @ ..] = args else {
        return Err(usage_error("list takes an actor and an entity type"));
    };

    let mut request = EntityListRequest::new(EntityTypeCode::new(entity_type.as_str())?);
    let mut relation_kind = None;
    let mut options = options.iter();
    while let Some(option) = options.next() {
        if option == "--active-only" {
            request.active_only = true;
            continue;
        }

        let value = options
            .next()
            .ok_or_else(|| usage_error(&format!("{option} requires a value")))?;
        match option.as_str() {
            "--parent" => request.parent = Some(parse_parent(value)?),
            "--relation" => relation_kind = Some(value.clone()),
            "--search" => request.search = Some(value.clone()),
            "--min-level" => request.min_level = PermissionLevel::parse_transport(value)?,
            "--limit" => request.limit = parse_count(option, value)?,
            "--offset" => request.offset = parse_count(option, value)?,
            other => return Err(usage_error(&format!("unknown list option '{other}'"))),
        }
    }

    if let Some(relation_kind) = relation_kind {
        let Some(parent) = request.parent.as_mut() else {
            return Err(usage_error("--relation requires --parent"));
        };
        parent.relation_kind = Some(relation_kind);
    }

    if request.limit > MAX_PAGE_SIZE {
        return Err(AppError::Validation(format!(
            "--limit must not exceed {MAX_PAGE_SIZE}"
        )));
    }

    Ok(InspectorCommand::List {
        actor_id: ActorId::parse(actor_id)?,
        request,
    })
}

fn parse_parent(value: &str) -> AppResult<ParentContext> {
    let Some((parent_type, parent_id)) = value.split_once(':') else {
        return Err(usage_error("--parent expects <type>:<id>"));
    };

    Ok(ParentContext {
        parent_type: EntityTypeCode::new(parent_type)?,
        parent_id: EntityId::parse(parent_id)?,
        relation_kind: None,
    })
}

fn parse_entity_id(value: &str) -> AppResult<EntityId> {
    if value.eq_ignore_ascii_case("all") {
        return Ok(EntityId::ALL);
    }

    EntityId::parse(value)
}

fn parse_optional_level(value: Option<&String>) -> AppResult<PermissionLevel> {
    value.map_or(Ok(PermissionLevel::View), |value| {
        PermissionLevel::parse_transport(value)
    })
}

fn parse_count(name: &str, value: &str) -> AppResult<usize> {
    value.parse::<usize>().map_err(|error| {
        AppError::Validation(format!("invalid {name} value '{value}': {error}"))
    })
}

fn usage_error(message: &str) -> AppError {
    AppError::Validation(format!("{message}\n{USAGE}"))
}

/// Runtime configuration for the inspector binary.
#[derive(Debug, Clone)]
pub struct InspectorConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub entity_schema: String,
    pub command: InspectorCommand,
}

impl InspectorConfig {
    pub fn load() -> AppResult<Self> {
        let args = env::args().skip(1).collect::<Vec<_>>();
        let command = InspectorCommand::parse(&args)?;

        let database_url = required_env("DATABASE_URL")?;
        let max_connections = match env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(value) => value.parse::<u32>().map_err(|error| {
                AppError::Validation(format!(
                    "invalid DATABASE_MAX_CONNECTIONS value '{value}': {error}"
                ))
            })?,
            Err(_) => 5,
        };
        if max_connections == 0 {
            return Err(AppError::Validation(
                "DATABASE_MAX_CONNECTIONS must be greater than zero".to_owned(),
            ));
        }

        let entity_schema = env::var("ENTITY_SCHEMA")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| "app".to_owned());

        Ok(Self {
            database_url,
            max_connections,
            entity_schema,
            command,
        })
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .init();
}

fn required_env(name: &str) -> AppResult<String> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}
