//! todo-sync command-line client
//!
//! Each invocation restores the persisted session, runs one command against
//! the backend and shuts the stores down again.
//!
//! # Usage
//!
//! ```bash
//! # Point at a backend (or put this in .env)
//! export TODO_API_URL=http://localhost:3000
//!
//! todo-sync login ada@example.com --password hunter2
//! todo-sync add "Buy milk"
//! todo-sync list --completed
//! todo-sync toggle 65f1c0e2
//! todo-sync logout
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use todo_sync::{
    ClientConfig, FileStorage, HttpBackend, Notice, Todo, TodoApp, TodoFilter, TodoId,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type App = TodoApp<HttpBackend, FileStorage>;

/// To-do list client for a REST backend
#[derive(Parser)]
#[command(name = "todo-sync")]
#[command(about = "Manage your todos from the terminal", long_about = None)]
#[command(version)]
struct Cli {
    /// Backend base URL (overrides TODO_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account and sign in with it
    Register {
        /// Display name
        name: String,

        /// Account email
        email: String,

        /// Account password
        #[arg(long, env = "TODO_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Sign in and remember the session
    Login {
        /// Account email
        email: String,

        /// Account password
        #[arg(long, env = "TODO_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Sign out and forget the session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// List todos
    List {
        /// Only completed todos
        #[arg(long, conflicts_with = "incomplete")]
        completed: bool,

        /// Only open todos
        #[arg(long)]
        incomplete: bool,
    },

    /// Show one todo
    Show {
        /// Todo id
        id: String,
    },

    /// Add a todo
    Add {
        /// Todo name
        name: String,
    },

    /// Flip a todo between open and completed
    Toggle {
        /// Todo id
        id: String,
    },

    /// Rename a todo or set its completion flag
    Edit {
        /// Todo id
        id: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New completion flag
        #[arg(long)]
        completed: Option<bool>,
    },

    /// Delete a todo
    Rm {
        /// Todo id
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,todo_sync=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env().context("Invalid configuration")?;
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
        config.validate().context("Invalid --api-url")?;
    }
    tracing::debug!(api_url = %config.api_url, "Configuration loaded");

    let app = TodoApp::from_config(&config);
    app.start().await;

    let outcome = run(&app, cli.command).await;

    if let Err(error) = app.shutdown(config.shutdown_timeout).await {
        tracing::warn!(%error, "Shutdown did not complete cleanly");
    }

    outcome
}

async fn run(app: &App, command: Commands) -> Result<()> {
    match command {
        Commands::Register {
            name,
            email,
            password,
        } => {
            if !app.session().register(&name, &email, &password).await {
                return session_failure(app).await;
            }
            if let Some(user) = app.session().user().await {
                println!("Registered and signed in as {} <{}>", user.name, user.email);
            }
        },
        Commands::Login { email, password } => {
            if !app.session().login(&email, &password).await {
                return session_failure(app).await;
            }
            if let Some(user) = app.session().user().await {
                println!("Signed in as {} <{}>", user.name, user.email);
            }
        },
        Commands::Logout => {
            app.session().logout().await;
            println!("Signed out");
        },
        Commands::Whoami => match app.session().user().await {
            Some(user) => println!("{} <{}> ({})", user.name, user.email, user.id),
            None => println!("Not signed in"),
        },
        Commands::List {
            completed,
            incomplete,
        } => {
            require_session(app).await?;
            let filter = if completed {
                TodoFilter::Completed
            } else if incomplete {
                TodoFilter::Incomplete
            } else {
                TodoFilter::All
            };
            let todos = match filter {
                TodoFilter::All => app.todos().fetch_all().await,
                TodoFilter::Completed => app.todos().fetch_completed().await,
                TodoFilter::Incomplete => app.todos().fetch_incomplete().await,
            };
            todo_failure(app).await?;

            if todos.is_empty() {
                println!("No todos");
            }
            for todo in &todos {
                print_todo(todo);
            }
        },
        Commands::Show { id } => {
            let todo = cached(app, &TodoId::new(id)).await?;
            app.todos().fetch_one(&todo.id).await;
            todo_failure(app).await?;
            if let Some(todo) = app.todos().get(&todo.id).await {
                print_todo(&todo);
            }
        },
        Commands::Add { name } => {
            require_session(app).await?;
            app.todos().create(&name).await;
            todo_failure(app).await?;
            if let Some(todo) = app.todos().todos().await.last() {
                print_todo(todo);
            }
        },
        Commands::Toggle { id } => {
            let todo = cached(app, &TodoId::new(id)).await?;
            app.todos().toggle(&todo.id).await;
            todo_failure(app).await?;
            if let Some(todo) = app.todos().get(&todo.id).await {
                print_todo(&todo);
            }
        },
        Commands::Edit {
            id,
            name,
            completed,
        } => {
            let todo = cached(app, &TodoId::new(id)).await?;
            let name = name.unwrap_or_else(|| todo.name.clone());
            let completed = completed.unwrap_or(todo.is_completed);
            app.todos().update(&todo.id, &name, completed).await;
            todo_failure(app).await?;
            if let Some(todo) = app.todos().get(&todo.id).await {
                print_todo(&todo);
            }
        },
        Commands::Rm { id } => {
            let todo = cached(app, &TodoId::new(id)).await?;
            app.todos().delete(&todo.id).await;
            todo_failure(app).await?;
            println!("Deleted {}", todo.id);
        },
    }

    Ok(())
}

async fn require_session(app: &App) -> Result<()> {
    if app.session().is_logged_in().await {
        Ok(())
    } else {
        bail!("Not signed in. Run `todo-sync login` first.")
    }
}

/// Load the list and look `id` up in it; mutations only act on cached todos
async fn cached(app: &App, id: &TodoId) -> Result<Todo> {
    require_session(app).await?;
    app.todos().fetch_all().await;
    todo_failure(app).await?;
    app.todos()
        .get(id)
        .await
        .with_context(|| format!("No todo with id {id}"))
}

async fn session_failure(app: &App) -> Result<()> {
    match app.session().notice().await {
        Some(notice) => bail!(describe(&notice)),
        None => bail!("Request failed"),
    }
}

async fn todo_failure(app: &App) -> Result<()> {
    match app.todos().notice().await {
        Some(notice) => bail!(describe(&notice)),
        None => Ok(()),
    }
}

fn describe(notice: &Notice) -> String {
    format!("{}: {}", notice.title, notice.detail)
}

fn print_todo(todo: &Todo) {
    let status = if todo.is_completed { "x" } else { " " };
    println!("[{status}] {}  {}", todo.id, todo.name);
}
