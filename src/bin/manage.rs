//! Maintenance commands for the portfolio database and object store.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use portfolio_projects::{
    db::postgres::{create_pool, run_migrations},
    entities::project::ProjectInsert,
    repositories::{project::ProjectRepository, sqlx_repo::SqlxProjectRepo},
    settings::AppConfig,
    storage::{supabase::SupabaseStorage, MediaStorage},
    telemetry::init_tracing,
};
use tracing::info;

#[derive(Parser)]
#[command(name = "manage")]
#[command(version)]
#[command(about = "Portfolio projects maintenance commands")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    Migrate,

    /// Insert the sample projects
    Seed {
        /// Delete every existing project first
        #[arg(long)]
        reset: bool,
    },

    /// Check that the object store is reachable and the bucket exists
    CheckStorage,

    /// Strip trailing '?' from stored image and media URLs
    FixUrls,
}

fn sample_projects() -> Vec<ProjectInsert> {
    let project = |title: &str, description: &str, github: &str, demo: &str, techs: &[&str]| ProjectInsert {
        title: title.to_string(),
        description: description.to_string(),
        github_url: github.to_string(),
        demo_url: demo.to_string(),
        image_url: "https://via.placeholder.com/400x300".to_string(),
        technologies: techs.iter().map(|t| t.to_string()).collect(),
        demo_media: Vec::new(),
    };

    vec![
        project(
            "Portfolio Website",
            "A responsive portfolio website. Features project showcase, contact form, and admin panel.",
            "https://github.com/yourusername/portfolio",
            "https://yourportfolio.com",
            &["Rust", "actix-web", "PostgreSQL", "HTML", "CSS"],
        ),
        project(
            "E-commerce API",
            "RESTful API for an e-commerce platform with user authentication, product management, and order processing.",
            "https://github.com/yourusername/ecommerce-api",
            "",
            &["Python", "Flask", "SQLAlchemy", "JWT", "REST API"],
        ),
        project(
            "Task Management App",
            "A full-stack task management application with user authentication, real-time updates, and team collaboration features.",
            "https://github.com/yourusername/task-manager",
            "https://taskmanager-demo.com",
            &["React", "Node.js", "MongoDB", "Socket.io", "Express"],
        ),
    ]
}

async fn connect(config: &AppConfig) -> Result<SqlxProjectRepo> {
    let pool = create_pool(&config.database_url, 2)
        .await
        .context("Failed to connect to the database")?;
    Ok(SqlxProjectRepo::new(pool))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::new().context("Invalid configuration")?;
    init_tracing(false);

    match cli.command {
        Commands::Migrate => {
            let repo = connect(&config).await?;
            run_migrations(&repo.pool).await?;
            let count = repo.count_projects().await?;
            info!("✅ Schema ready, {} projects stored", count);
        }
        Commands::Seed { reset } => {
            let repo = connect(&config).await?;
            run_migrations(&repo.pool).await?;

            if reset {
                for project in repo.list_projects().await? {
                    repo.delete_project(project.id).await?;
                }
                info!("Removed existing projects");
            }

            for sample in sample_projects() {
                let id = repo.create_project(&sample).await?;
                info!("Created project {} '{}' with {} technologies", id, sample.title, sample.technologies.len());
            }
            info!("✅ Sample data created");
        }
        Commands::CheckStorage => {
            let storage = SupabaseStorage::from_config(&config, reqwest::Client::new())?;
            if !storage.check_connection().await? {
                bail!("Bucket '{}' does not exist; create it and make it public", storage.bucket());
            }
            info!("✅ Object store reachable, bucket '{}' found", storage.bucket());
        }
        Commands::FixUrls => {
            let repo = connect(&config).await?;
            let fixed = repo.normalize_media_urls().await?;
            info!("✅ Fixed {} URLs", fixed);
        }
    }

    Ok(())
}
