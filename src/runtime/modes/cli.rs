//! CLI mode
//!
//! One-shot commands sharing the server's service layer: dashboard counts,
//! CSV exports and sample config generation.

use anyhow::{Context, Result};
use colored::Colorize;
use std::fs::File;
use std::io::BufWriter;
use std::sync::Arc;
use tracing::debug;

use crate::cli::{Commands, ExportKind};
use crate::config::{StaticConfig, get_config};
use crate::pagination::{
    InfiniteList, ListParams, MAX_PAGE_SIZE, SubjectFilter, UserFilter,
};
use crate::runtime::lifetime;
use crate::services::AdminService;
use crate::utils::csv_handler::{generate_export_filename, write_subjects_csv, write_users_csv};

/// Run a non-server command
pub async fn run_cli(command: Commands) -> Result<()> {
    match command {
        Commands::Serve => crate::runtime::modes::run_server().await,
        Commands::Stats => print_stats().await,
        Commands::Export {
            kind,
            output,
            search,
            role,
            semester,
        } => {
            let params = ListParams {
                search,
                role,
                semester_filter: semester,
                ..Default::default()
            };
            let path = output.unwrap_or_else(|| generate_export_filename(kind.as_str()));
            export(kind, &params, &path).await
        }
        Commands::GenerateConfig { output } => {
            StaticConfig::default()
                .save_to_file(&output)
                .with_context(|| format!("Failed to write {}", output))?;
            println!("{} Sample configuration written to {}", "✓".green(), output);
            Ok(())
        }
    }
}

fn admin_service() -> Result<Arc<AdminService>> {
    let config = get_config();
    let ctx = lifetime::startup::prepare_services(&config)?;
    Ok(ctx.admin_service)
}

async fn print_stats() -> Result<()> {
    let service = admin_service()?;
    let stats = service
        .dashboard_stats()
        .await
        .context("Failed to load dashboard stats")?;

    println!("{}", "Study Stack".bold());
    println!("  Users:          {}", stats.total_users);
    println!(
        "    students {} / teachers {} / admins {}",
        stats.user_roles.students, stats.user_roles.teachers, stats.user_roles.admins
    );
    println!("  Notes:          {}", stats.total_notes);
    println!(
        "  Links:          {} (youtube {}, forms {})",
        stats.total_links, stats.total_youtube_links, stats.total_form_links
    );
    println!("  Subjects:       {}", stats.total_subjects);
    Ok(())
}

async fn export(kind: ExportKind, params: &ListParams, path: &str) -> Result<()> {
    let service = admin_service()?;
    let file = File::create(path).with_context(|| format!("Failed to create {}", path))?;
    let writer = BufWriter::new(file);

    let count = match kind {
        ExportKind::Users => {
            let filter = UserFilter::from_params(params)?;
            let mut list = InfiniteList::new(filter, MAX_PAGE_SIZE);
            while list
                .fetch_next(|filter, page| service.list_users(filter, page))
                .await?
            {
                debug!("Fetched {} users", list.fetched_count());
            }
            let items = list.items();
            write_users_csv(&items, writer)?;
            items.len()
        }
        ExportKind::Subjects => {
            let filter = SubjectFilter::from_params(params);
            let mut list = InfiniteList::new(filter, MAX_PAGE_SIZE);
            while list
                .fetch_next(|filter, page| service.list_subjects(filter, page))
                .await?
            {
                debug!("Fetched {} subjects", list.fetched_count());
            }
            let items = list.items();
            write_subjects_csv(&items, writer)?;
            items.len()
        }
    };

    println!(
        "{} Exported {} {} to {}",
        "✓".green(),
        count,
        kind.as_str(),
        path
    );
    Ok(())
}
