//! Workflow engine CLI entry point.

use std::sync::Arc;

use abathur_workflow::cli::{self, Cli};
use abathur_workflow::infrastructure::adapters::{
    InMemoryFeeSink, InMemoryOperatorRegistry, InMemoryTaskMailbox,
};
use abathur_workflow::infrastructure::config::ConfigLoader;
use abathur_workflow::infrastructure::logging::LoggerImpl;
use abathur_workflow::services::{EventBus, WorkflowEngine};
use anyhow::{Context, Result};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::load().context("failed to load configuration")?;
    LoggerImpl::init(&config.logging).context("failed to initialize logging")?;

    let event_bus = Arc::new(EventBus::default());
    let mailbox = Arc::new(InMemoryTaskMailbox::default());
    let operator_registry = Arc::new(InMemoryOperatorRegistry::with_default(
        config.limits.default_operator_count,
    ));
    let fee_sink = Arc::new(InMemoryFeeSink::default());

    let engine = WorkflowEngine::new(&config, mailbox, operator_registry, fee_sink, event_bus);

    cli::run(cli.command, cli.json, &engine).await
}
