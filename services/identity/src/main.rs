//! Operator CLI for the identity service.
//!
//! ```bash
//! identity user create ada --first-name Ada --last-name Lovelace \
//!     --email ada@example.com --gid 5000
//! printf 'secret\n' | identity user passwd ada
//! identity group add-member staff ada
//! ```
//!
//! Records are printed to stdout as JSON; logs go to stderr.

use std::io::BufRead as _;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context as _, Result};
use clap::{Args, Parser, Subcommand};
use sea_orm::Database;
use sea_orm_migration::MigratorTrait as _;
use serde_json::json;
use tracing::info;

use dirsync_core::config::Config as _;
use dirsync_core::tracing::init_tracing;
use dirsync_identity::config::IdentityConfig;
use dirsync_identity::domain::types::{
    CreateGroupInput, CreateUserInput, UpdateGroupInput, UpdateUserInput, UserSaved,
};
use dirsync_identity::error::IdentityError;
use dirsync_identity::infra::db::DbLocalAccountStore;
use dirsync_identity::infra::ldap::LdapDirectory;
use dirsync_identity::service::IdentityService;
use dirsync_identity_migration::Migrator;

type Service = IdentityService<LdapDirectory, DbLocalAccountStore>;

#[derive(Parser)]
#[command(name = "identity", about = "Manage directory users, groups and samba domains")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(subcommand)]
    User(UserCommand),
    #[command(subcommand)]
    Group(GroupCommand),
    #[command(subcommand)]
    Domain(DomainCommand),
    /// Apply pending local account store migrations
    Migrate,
}

#[derive(Subcommand)]
enum UserCommand {
    Create(UserCreateArgs),
    Update(UserUpdateArgs),
    Show {
        username: String,
    },
    List,
    /// Set a password read from stdin, or generate one with --reset
    Passwd {
        username: String,
        /// Generate a random password and print it once
        #[arg(long, conflicts_with = "verify_current")]
        reset: bool,
        /// Read the current password from stdin first and require it to match
        #[arg(long)]
        verify_current: bool,
    },
    /// Verify a password read from stdin; exits non-zero on mismatch
    CheckPassword {
        username: String,
    },
    /// Copy the user into the local account store again
    Resync {
        username: String,
    },
}

#[derive(Args)]
struct UserCreateArgs {
    username: String,
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    #[arg(long)]
    email: String,
    /// Primary group id
    #[arg(long)]
    gid: u32,
    #[arg(long)]
    uid: Option<u32>,
    #[arg(long, default_value = "")]
    full_name: String,
    #[arg(long, default_value = "")]
    gecos: String,
    #[arg(long, default_value = "")]
    home_directory: String,
    #[arg(long)]
    login_shell: Option<String>,
    #[arg(long, default_value = "")]
    phone: String,
    #[arg(long)]
    mobile_phone: Option<String>,
    /// JPEG file stored as the user's photo
    #[arg(long)]
    photo: Option<PathBuf>,
    /// Samba domain (compatibility subsystem only)
    #[arg(long)]
    domain: Option<String>,
    /// Read the initial password from stdin instead of generating one
    #[arg(long)]
    password_stdin: bool,
}

#[derive(Args)]
struct UserUpdateArgs {
    username: String,
    #[arg(long)]
    uid: Option<u32>,
    #[arg(long)]
    gid: Option<u32>,
    #[arg(long)]
    first_name: Option<String>,
    #[arg(long)]
    last_name: Option<String>,
    /// Pass an empty string to derive it again
    #[arg(long)]
    full_name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    mobile_phone: Option<String>,
    #[arg(long)]
    photo: Option<PathBuf>,
    #[arg(long)]
    gecos: Option<String>,
    #[arg(long)]
    home_directory: Option<String>,
    #[arg(long)]
    login_shell: Option<String>,
    #[arg(long)]
    domain: Option<String>,
    #[arg(long)]
    acct_flags: Option<String>,
}

#[derive(Subcommand)]
enum GroupCommand {
    Create {
        name: String,
        #[arg(long)]
        gid: Option<u32>,
        #[arg(long = "member")]
        members: Vec<String>,
    },
    Update {
        name: String,
        #[arg(long)]
        gid: Option<u32>,
        /// Replace the member list (comma separated)
        #[arg(long, value_delimiter = ',')]
        members: Option<Vec<String>>,
    },
    Show {
        name: String,
    },
    List,
    AddMember {
        name: String,
        username: String,
    },
    RemoveMember {
        name: String,
        username: String,
    },
}

#[derive(Subcommand)]
enum DomainCommand {
    Create {
        domain_name: String,
        /// Domain SID, e.g. S-1-5-21-1004336348-1177238915-682003330
        security_identifier_prefix: String,
    },
    List,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            match err.downcast_ref::<IdentityError>() {
                Some(identity) => eprintln!(
                    "{}",
                    json!({
                        "error": identity.kind(),
                        "field": identity.field(),
                        "message": identity.to_string(),
                    })
                ),
                None => eprintln!("error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = IdentityConfig::from_env().context("load configuration")?;
    init_tracing(config.log_format);

    let db = Database::connect(&config.database_url)
        .await
        .context("connect to local account database")?;

    if let Command::Migrate = cli.command {
        Migrator::up(&db, None).await.context("apply migrations")?;
        info!("local account migrations applied");
        return Ok(ExitCode::SUCCESS);
    }

    let service: Service = IdentityService::new(
        LdapDirectory::new(config.ldap_settings()),
        DbLocalAccountStore { db },
        config.policy(),
    );

    match cli.command {
        Command::User(command) => user(&service, command).await,
        Command::Group(command) => group(&service, command).await,
        Command::Domain(command) => domain(&service, command).await,
        Command::Migrate => Ok(ExitCode::SUCCESS),
    }
}

async fn user(service: &Service, command: UserCommand) -> Result<ExitCode> {
    match command {
        UserCommand::Create(args) => {
            let password = if args.password_stdin {
                Some(read_secret()?)
            } else {
                None
            };
            let input = CreateUserInput {
                uid: args.uid,
                full_name: args.full_name,
                gecos: args.gecos,
                home_directory: args.home_directory,
                login_shell: args.login_shell,
                phone: args.phone,
                mobile_phone: args.mobile_phone,
                photo: args.photo.as_deref().map(read_photo).transpose()?,
                password,
                domain: args.domain,
                ..CreateUserInput::new(
                    args.username,
                    args.first_name,
                    args.last_name,
                    args.email,
                    args.gid,
                )
            };
            print_saved(service.create_user(input).await?)
        }
        UserCommand::Update(args) => {
            let input = UpdateUserInput {
                uid: args.uid,
                gid: args.gid,
                first_name: args.first_name,
                last_name: args.last_name,
                full_name: args.full_name,
                email: args.email,
                phone: args.phone,
                mobile_phone: args.mobile_phone,
                photo: args.photo.as_deref().map(read_photo).transpose()?,
                gecos: args.gecos,
                home_directory: args.home_directory,
                login_shell: args.login_shell,
                domain: args.domain,
                acct_flags: args.acct_flags,
                password: None,
            };
            anyhow::ensure!(!input.is_empty(), "nothing to update for {}", args.username);
            print_saved(service.update_user(&args.username, input).await?)
        }
        UserCommand::Show { username } => print(&service.get_user(&username).await?),
        UserCommand::List => print(&service.list_users().await?),
        UserCommand::Passwd {
            username,
            reset,
            verify_current,
        } => {
            if reset {
                let reset = service.reset_password(&username).await?;
                println!("{}", json!({ "password": reset.secret }));
                return print_saved(reset.saved);
            }
            let saved = if verify_current {
                let current = read_secret()?;
                let new = read_secret()?;
                service.change_password(&username, &current, &new).await?
            } else {
                service.set_password(&username, &read_secret()?).await?
            };
            print_saved(saved)
        }
        UserCommand::CheckPassword { username } => {
            let ok = service.check_password(&username, &read_secret()?).await?;
            println!("{}", json!({ "username": username, "valid": ok }));
            Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
        UserCommand::Resync { username } => {
            let outcome = service.resync_local_account(&username).await?;
            println!("{}", json!({ "username": username, "local_account": outcome }));
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn group(service: &Service, command: GroupCommand) -> Result<ExitCode> {
    match command {
        GroupCommand::Create { name, gid, members } => print(
            &service
                .create_group(CreateGroupInput {
                    name,
                    gid,
                    member_usernames: members,
                })
                .await?,
        ),
        GroupCommand::Update { name, gid, members } => print(
            &service
                .update_group(
                    &name,
                    UpdateGroupInput {
                        gid,
                        member_usernames: members,
                    },
                )
                .await?,
        ),
        GroupCommand::Show { name } => print(&service.get_group(&name).await?),
        GroupCommand::List => print(&service.list_groups().await?),
        GroupCommand::AddMember { name, username } => {
            print(&service.add_group_member(&name, &username).await?)
        }
        GroupCommand::RemoveMember { name, username } => {
            print(&service.remove_group_member(&name, &username).await?)
        }
    }
}

async fn domain(service: &Service, command: DomainCommand) -> Result<ExitCode> {
    match command {
        DomainCommand::Create {
            domain_name,
            security_identifier_prefix,
        } => print(
            &service
                .create_domain(&domain_name, &security_identifier_prefix)
                .await?,
        ),
        DomainCommand::List => print(&service.list_domains().await?),
    }
}

fn print<T: serde::Serialize>(value: &T) -> Result<ExitCode> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(ExitCode::SUCCESS)
}

/// Print the saved user. A failed local account sync is reported but does not
/// fail the command, since the directory write already happened.
fn print_saved(saved: UserSaved) -> Result<ExitCode> {
    let local_account = match &saved.mirror {
        Ok(outcome) => json!(outcome),
        Err(err) => json!({ "error": format!("{err}: {}", err.source) }),
    };
    print(&json!({ "user": saved.user, "local_account": local_account }))
}

fn read_secret() -> Result<String> {
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("read password from stdin")?;
    let secret = line.trim_end_matches(['\r', '\n']).to_owned();
    anyhow::ensure!(!secret.is_empty(), "empty password on stdin");
    Ok(secret)
}

fn read_photo(path: &std::path::Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("read photo {}", path.display()))
}
