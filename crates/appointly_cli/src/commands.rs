use anyhow::{Context, Result};
use appointly_core::db::{open_db, Connection};
use appointly_core::{
    core_version, AppConfig, AppointmentService, CreateAppointmentRequest, CreateUserRequest,
    SqliteAppointmentRepository, SqliteUserRepository, UpdateUserRequest, UserService,
    WorkingHoursValidator,
};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "appointly", about = "Timezone-aware appointment scheduling")]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Manage users and their preferred timezones.
    #[command(subcommand)]
    User(UserCommand),
    /// Create, inspect and delete appointments.
    #[command(subcommand)]
    Appointment(AppointmentCommand),
    /// Check UTC instants against the working window without storing anything.
    Check(CheckArgs),
    /// Print the core version.
    Version,
}

#[derive(Debug, Subcommand)]
enum UserCommand {
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        username: String,
        /// IANA timezone; defaults to APPOINTLY_DEFAULT_TIMEZONE.
        #[arg(long)]
        timezone: Option<String>,
    },
    List,
    Update {
        id: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        timezone: Option<String>,
    },
    Remove {
        id: Uuid,
    },
}

#[derive(Debug, Subcommand)]
enum AppointmentCommand {
    Create {
        #[arg(long = "as")]
        caller: Uuid,
        #[arg(long)]
        title: String,
        /// Wall-clock start in the caller's timezone, e.g. 2024-01-15T09:00:00.
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
        #[arg(long = "participant")]
        participants: Vec<Uuid>,
    },
    List {
        #[arg(long = "as")]
        caller: Uuid,
    },
    Show {
        #[arg(long = "as")]
        caller: Uuid,
        id: Uuid,
    },
    Delete {
        #[arg(long = "as")]
        caller: Uuid,
        id: Uuid,
    },
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// RFC 3339 instant.
    #[arg(long)]
    start: DateTime<Utc>,
    #[arg(long)]
    end: DateTime<Utc>,
    /// Timezones to check, in order.
    #[arg(long = "tz", required = true)]
    timezones: Vec<String>,
}

impl Cli {
    pub fn execute(self, config: &AppConfig) -> Result<()> {
        match self.command {
            Command::User(command) => run_user(command, config),
            Command::Appointment(command) => run_appointment(command, config),
            Command::Check(args) => run_check(args, config),
            Command::Version => {
                println!("appointly_core version={}", core_version());
                Ok(())
            }
        }
    }
}

fn open_store(config: &AppConfig) -> Result<Connection> {
    open_db(&config.db_path)
        .with_context(|| format!("failed to open database `{}`", config.db_path.display()))
}

fn run_user(command: UserCommand, config: &AppConfig) -> Result<()> {
    let conn = open_store(config)?;
    let service = UserService::new(
        SqliteUserRepository::try_new(&conn)?,
        config.default_timezone.as_str(),
    );

    match command {
        UserCommand::Add {
            name,
            username,
            timezone,
        } => print_json(&service.create_user(&CreateUserRequest {
            name,
            username,
            preferred_timezone: timezone,
        })?),
        UserCommand::List => print_json(&service.list_users()?),
        UserCommand::Update {
            id,
            name,
            username,
            timezone,
        } => print_json(&service.update_user(
            id,
            &UpdateUserRequest {
                name,
                username,
                preferred_timezone: timezone,
            },
        )?),
        UserCommand::Remove { id } => {
            service.delete_user(id)?;
            println!("user {id} removed");
            Ok(())
        }
    }
}

fn run_appointment(command: AppointmentCommand, config: &AppConfig) -> Result<()> {
    let conn = open_store(config)?;
    let service = AppointmentService::new(
        SqliteUserRepository::try_new(&conn)?,
        SqliteAppointmentRepository::try_new(&conn)?,
        WorkingHoursValidator::new(config.working_window),
        config.timezone_scope,
    );

    match command {
        AppointmentCommand::Create {
            caller,
            title,
            start,
            end,
            participants,
        } => print_json(&service.create(
            caller,
            &CreateAppointmentRequest {
                title,
                start,
                end,
                participant_ids: participants,
            },
        )?),
        AppointmentCommand::List { caller } => print_json(&service.list_for(caller)?),
        AppointmentCommand::Show { caller, id } => print_json(&service.get(caller, id)?),
        AppointmentCommand::Delete { caller, id } => {
            service.delete(caller, id)?;
            println!("appointment {id} deleted");
            Ok(())
        }
    }
}

fn run_check(args: CheckArgs, config: &AppConfig) -> Result<()> {
    let validator = WorkingHoursValidator::new(config.working_window);
    let verdicts = validator.evaluate(args.start, args.end, args.timezones.as_slice())?;
    print_json(&verdicts)?;
    validator.validate_all_participants(args.start, args.end, args.timezones.as_slice())?;
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
