//! User DAO built on `SqlTemplate`, driven from the command line.
//!
//! ```text
//! cargo run --example user_dao -- --db users.db register alice pw1 a@x.com
//! cargo run --example user_dao -- --db users.db login alice pw1
//! cargo run --example user_dao -- --db users.db list
//! ```

use clap::{Parser, Subcommand};
use sql_template::prelude::*;
use tracing::Level;

#[derive(Debug, Parser)]
#[command(about = "Register, log in and list users through SqlTemplate")]
struct Args {
    /// SQLite database file (created if missing)
    #[arg(long, default_value = "users.db")]
    db: String,

    /// Busy timeout in milliseconds
    #[arg(long, default_value_t = 5000)]
    busy_timeout_ms: u64,

    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Register {
        account: String,
        password: String,
        email: String,
    },
    Login {
        account: String,
        password: String,
    },
    ChangePassword {
        account: String,
        password: String,
    },
    Show {
        id: i64,
    },
    List,
}

#[derive(Debug, Clone, PartialEq)]
struct User {
    id: Option<i64>,
    account: String,
    password: String,
    email: String,
}

impl User {
    fn check_password(&self, password: &str) -> bool {
        self.password == password
    }
}

fn user_mapper(row: &DbRow, _row_num: usize) -> Result<User, MappingError> {
    Ok(User {
        id: Some(row.get_i64("id")?),
        account: row.get_text("account")?,
        password: row.get_text("password")?,
        email: row.get_text("email")?,
    })
}

struct UserDao<P> {
    template: SqlTemplate<P>,
}

impl<P: ConnectionProvider> UserDao<P> {
    fn new(template: SqlTemplate<P>) -> Self {
        Self { template }
    }

    fn insert(&self, user: &User) -> Result<(), SqlTemplateError> {
        self.template.insert(
            "insert into users (account, password, email) values (?, ?, ?)",
            &[
                user.account.as_str().into(),
                user.password.as_str().into(),
                user.email.as_str().into(),
            ],
        )?;
        Ok(())
    }

    fn update(&self, user: &User) -> Result<(), SqlTemplateError> {
        self.template.update(
            "update users set password = ?, email = ? where account = ?",
            &[
                user.password.as_str().into(),
                user.email.as_str().into(),
                user.account.as_str().into(),
            ],
        )?;
        Ok(())
    }

    fn find_all(&self) -> Result<Vec<User>, SqlTemplateError> {
        self.template.query(
            "select id, account, password, email from users",
            user_mapper,
            &[],
        )
    }

    fn find_by_id(&self, id: i64) -> Result<User, SqlTemplateError> {
        self.template.query_for_object(
            "select id, account, password, email from users where id = ?",
            user_mapper,
            &[id.into()],
        )
    }

    fn find_by_account(&self, account: &str) -> Result<Option<User>, SqlTemplateError> {
        self.template.query_for_optional(
            "select id, account, password, email from users where account = ?",
            user_mapper,
            &[account.into()],
        )
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let opts = SqliteOptions::builder(args.db)
        .busy_timeout(std::time::Duration::from_millis(args.busy_timeout_ms))
        .finish();
    let config_json = serde_json::to_string_pretty(&opts).unwrap_or_else(|_| "{}".to_string());
    tracing::info!("config: {}", config_json);

    opts.open()?.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            account TEXT NOT NULL UNIQUE,
            password TEXT NOT NULL,
            email TEXT NOT NULL
        );",
    )?;
    let dao = UserDao::new(SqlTemplate::new(SqliteDataSource::new(opts)));

    match args.command {
        Command::Register {
            account,
            password,
            email,
        } => {
            dao.insert(&User {
                id: None,
                account,
                password,
                email,
            })?;
            println!("registered");
        }
        Command::Login { account, password } => match dao.find_by_account(&account)? {
            Some(user) if user.check_password(&password) => println!("welcome, {}", user.account),
            _ => println!("invalid account or password"),
        },
        Command::ChangePassword { account, password } => match dao.find_by_account(&account)? {
            Some(user) => {
                dao.update(&User { password, ..user })?;
                println!("password changed");
            }
            None => println!("no such account: {account}"),
        },
        Command::Show { id } => match dao.find_by_id(id) {
            Ok(user) => println!("{user:?}"),
            Err(SqlTemplateError::EmptyResult) => println!("no user with id {id}"),
            Err(e) => return Err(e.into()),
        },
        Command::List => {
            for user in dao.find_all()? {
                println!("{:>4}  {:<16} {}", user.id.unwrap_or_default(), user.account, user.email);
            }
        }
    }
    Ok(())
}

fn main() {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    if let Err(err) = run(args) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
