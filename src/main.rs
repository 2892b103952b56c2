use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use indexer_ui::client::{FileUpload, RagClient};
use indexer_ui::config::ClientConfig;
use indexer_ui::models::{ProgressSummary, TaskFilter, UploadBatch};
use indexer_ui::services::poller::TaskPoller;
use indexer_ui::state::{AppStore, PersistedState};
use indexer_ui::utils::format::format_date;
use indexer_ui::{AppState, create_app};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to config.json (overrides CONFIG_PATH)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve config.json to the browser front-end
    Serve {
        #[arg(short, long, default_value_t = 3000)]
        port: u16,
    },
    /// Check a token against the backend and store it
    Login { token: String },
    /// Forget the stored token
    Logout,
    /// Show the current user and quota
    Whoami,
    /// List partitions
    Partitions,
    DeletePartition { partition: String },
    /// List the files of a partition
    Files { partition: String },
    /// Show a file and its extracts
    File { partition: String, file_id: String },
    Extract { extract_id: String },
    /// List indexing tasks
    Tasks {
        /// QUEUED, SERIALIZING, CHUNKING, INSERTING, COMPLETED, FAILED or ACTIVE
        #[arg(short, long)]
        status: Option<TaskFilter>,
    },
    Task { task_id: String },
    /// Submit files for indexing as one batch
    Upload {
        partition: String,
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// JSON metadata attached to every file
        #[arg(long)]
        metadata: Option<String>,
        /// Follow progress until the batch finishes
        #[arg(short, long)]
        watch: bool,
    },
    DeleteFile { partition: String, file_id: String },
    /// Show progress of active uploads
    Progress {
        #[arg(short, long)]
        follow: bool,
    },
    /// List backend actors
    Actors,
    RestartActor { name: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "indexer_ui=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ClientConfig::load(args.config)?;

    match args.command {
        Command::Serve { port } => serve(config, port).await,
        command => run_client(config, command).await,
    }
}

async fn serve(config: ClientConfig, port: u16) -> anyhow::Result<()> {
    info!(
        "🚀 Serving front-end config from {}",
        config.config_path.display()
    );

    let app = create_app(AppState::new(config.config_path))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!("✅ Server ready at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("🛑 Server shut down gracefully.");
    Ok(())
}

async fn run_client(config: ClientConfig, command: Command) -> anyhow::Result<()> {
    let client = RagClient::new(&config)?;
    let persisted = PersistedState::load(&config.state_path, config.auth_token_ttl())?;
    let store = Arc::new(AppStore::new(Arc::new(client), persisted));

    let logged_in = store.restore_session().await?;
    if !logged_in && !matches!(command, Command::Login { .. }) {
        tracing::warn!("No valid auth token stored, requests are sent anonymously");
    }

    let api = store.api().clone();
    match command {
        Command::Serve { .. } => anyhow::bail!("serve does not talk to the indexer"),
        Command::Login { token } => {
            store.login(token).await?;
            println!("Logged in.");
        }
        Command::Logout => {
            store.logout().await?;
            println!("Logged out.");
        }
        Command::Whoami => {
            let user = api.fetch_user_info().await?;
            let quota = match user.remaining_quota() {
                Some(left) => format!("{} of {} left", left, user.file_quota),
                None => "unlimited".to_string(),
            };
            println!(
                "{} ({}){}\nfiles: {} indexed, {} pending, quota {}",
                user.display_name,
                user.id,
                if user.is_admin { " [admin]" } else { "" },
                user.file_count,
                user.pending_files,
                quota
            );
        }
        Command::Partitions => {
            for partition in store.refresh_partitions().await? {
                println!(
                    "{}\t{}",
                    partition.partition,
                    format_date(partition.created_at)
                );
            }
        }
        Command::DeletePartition { partition } => {
            store.delete_partition(&partition).await?;
            println!("Partition \"{}\" deleted.", partition);
        }
        Command::Files { partition } => {
            for file in store.select_partition(&partition).await? {
                println!(
                    "{}\t{}\t{}\t{}",
                    file.file_id, file.filename, file.file_size, file.created_at
                );
            }
        }
        Command::File { partition, file_id } => {
            let file = store.select_file(&partition, &file_id).await?;
            println!(
                "{} ({})\npartition: {}\nsource: {}\npages: {}\nsize: {}\ncreated: {}",
                file.metadata.filename,
                file.metadata.file_id,
                file.metadata.partition,
                file.metadata.source,
                file.metadata.page,
                file.metadata.file_size,
                file.metadata.created_at
            );
            for extract_id in file.extract_ids() {
                println!("  extract {}", extract_id);
            }
        }
        Command::Extract { extract_id } => {
            let extract = api.fetch_extract(&extract_id).await?;
            println!(
                "{} page {} ({})\n\n{}",
                extract.metadata.filename,
                extract.metadata.page,
                extract.metadata.partition,
                extract.page_content
            );
        }
        Command::Tasks { status } => {
            for task in api.fetch_tasks(status).await? {
                println!(
                    "{}\t{}\t{}/{}",
                    task.task_id,
                    task.state,
                    task.partition(),
                    task.file_id()
                );
            }
        }
        Command::Task { task_id } => {
            let task = api.fetch_task(&task_id).await?;
            println!(
                "{}\t{}\t{}/{}",
                task.task_id, task.task_state, task.details.partition, task.details.file_id
            );
        }
        Command::Upload {
            partition,
            paths,
            metadata,
            watch,
        } => {
            let mut files = Vec::with_capacity(paths.len());
            for path in &paths {
                files.push((Uuid::new_v4().to_string(), FileUpload::from_path(path).await?));
            }

            let outcome = store.submit_upload(&partition, files, metadata).await?;
            for (file_id, error) in &outcome.failures {
                eprintln!("{}: {}", file_id, error);
            }
            println!(
                "Submitted {} of {} file(s) to \"{}\".",
                outcome.batch.file_ids.len(),
                paths.len(),
                partition
            );

            if watch && !outcome.batch.file_ids.is_empty() {
                follow_uploads(&store, &config).await?;
            }
        }
        Command::DeleteFile { partition, file_id } => {
            store.delete_file(&partition, &file_id).await?;
            println!("File \"{}\" deleted.", file_id);
        }
        Command::Progress { follow } => {
            store.refresh_tasks().await?;
            let uploads = store.active_upload_progress().await;
            if uploads.is_empty() {
                println!("No active uploads.");
            }
            for (batch, summary) in &uploads {
                print_progress(batch, summary);
            }
            if follow && !uploads.is_empty() {
                follow_uploads(&store, &config).await?;
            } else {
                store.prune_finished_uploads().await?;
            }
        }
        Command::Actors => {
            for actor in api.fetch_actors().await? {
                println!(
                    "{}\t{}\t{}\t{}",
                    actor.name, actor.class_name, actor.namespace, actor.state
                );
            }
        }
        Command::RestartActor { name } => {
            api.restart_actor(&name).await?;
            println!("Actor {} restarted.", name);
        }
    }

    Ok(())
}

fn print_progress(batch: &UploadBatch, summary: &ProgressSummary) {
    println!(
        "{}\t{}\t{:>3}%\t{} done, {} failed, {} total",
        batch.partition,
        summary.status,
        summary.progress,
        summary.completed_files,
        summary.failed_files,
        batch.file_ids.len()
    );
}

/// Poll until every active upload finished or Ctrl+C is pressed.
async fn follow_uploads(store: &Arc<AppStore>, config: &ClientConfig) -> anyhow::Result<()> {
    let period = Duration::from_secs(config.poll_interval_secs);
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let (finished_tx, mut finished_rx) = tokio::sync::mpsc::unbounded_channel();
    let poller = TaskPoller::new(store.clone(), period, shutdown_rx).report_finished(finished_tx);
    let handle = tokio::spawn(poller.run());

    let ctrl_c = signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("⌨️  Ctrl+C received, stopping");
                break;
            }
            Some((batch, summary)) = finished_rx.recv() => {
                print_progress(&batch, &summary);
                while let Ok((batch, summary)) = finished_rx.try_recv() {
                    print_progress(&batch, &summary);
                }
                if store.active_upload_progress().await.is_empty() {
                    println!("All uploads finished.");
                    break;
                }
            }
            _ = tokio::time::sleep(period) => {
                for (batch, summary) in store.active_upload_progress().await {
                    print_progress(&batch, &summary);
                }
            }
        }
    }

    let _ = shutdown_tx.send(true);
    handle.await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("⌨️  Ctrl+C received, starting graceful shutdown...");
        },
        _ = terminate => {
            info!("💤 SIGTERM received, starting graceful shutdown...");
        },
    }
}
