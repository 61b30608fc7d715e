use anyhow::{bail, Result};

use crate::aggregate::Report;
use crate::cli::Cli;
use crate::config::{AppConfig, ConfigManager};
use crate::dispatch::Dispatcher;
use crate::models::Target;
use crate::probe::SshConnector;
use crate::render::{self, DisplayMode};

/// Ties one invocation together: resolved targets, seed paths and flags.
#[derive(Debug)]
pub struct App {
    pub app_config: AppConfig,
    pub targets: Vec<Target>,
    pub seeds: Vec<String>,
    pub humanize: bool,
    pub recursive: bool,
}

impl App {
    pub fn new(cli: &Cli) -> Result<Self> {
        let config_manager = match &cli.targets_file {
            Some(path) => ConfigManager::with_targets_file(path.clone())?,
            None => ConfigManager::new()?,
        };
        let app_config = config_manager.load_config()?;

        let mut targets = config_manager.load_targets()?;
        if !cli.targets.is_empty() {
            targets.retain(|t| cli.targets.iter().any(|wanted| *wanted == t.address));
        }
        if targets.is_empty() {
            bail!(
                "no targets to query (configure them in {:?})",
                config_manager.get_targets_path()
            );
        }

        Ok(Self {
            app_config,
            targets,
            seeds: cli.paths.clone(),
            humanize: cli.humanize,
            recursive: cli.recursive,
        })
    }

    /// Fans out to every target, prints whatever succeeded, then fails the
    /// run if any target failed.
    pub async fn run(&self) -> Result<()> {
        let connector = SshConnector::new(self.app_config.connect_timeout);
        let dispatcher = Dispatcher::new(connector, self.seeds.clone(), self.recursive);

        let outcomes = dispatcher.run(&self.targets).await;
        let report = Report::from_outcomes(outcomes);

        let mode = if self.humanize {
            DisplayMode::Humanized
        } else {
            DisplayMode::Raw
        };
        print!("{}", render::render(&report, mode));

        if let Some(summary) = report.failure_summary() {
            bail!(summary);
        }
        Ok(())
    }
}
