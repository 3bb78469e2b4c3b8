//! Command-line surface over [`crate::services::engine::WorkflowEngine`].
//!
//! Every public operation (§6) gets one subcommand. Binary payloads
//! (responses, monitoring updates, trigger data, phase metadata) are passed
//! as hex strings on the command line; there is no file upload surface here.

use std::collections::HashSet;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::domain::models::ids::{ContentId, ExecutionId, WorkflowId};
use crate::domain::models::principal::Principal;
use crate::domain::models::workflow::PhaseDefinition;
use crate::services::engine::WorkflowEngine;

#[derive(Debug, Parser)]
#[command(name = "abathur-workflow", about = "Deterministic multi-phase workflow orchestration engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Emit machine-readable JSON instead of human-readable text.
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Grant a principal permission to register workflows.
    AuthorizeCreator { creator: String },
    /// Grant a principal permission to fire CONDITIONAL phases on any workflow.
    AuthorizeTriggerSource { source: String },
    /// Update the creation and execution fee schedule.
    SetFees { creation_fee: u128, execution_fee: u128 },
    /// Register a new workflow from a JSON phase-list file.
    RegisterWorkflow {
        creator: String,
        name: String,
        /// Path to a JSON array of phase definitions.
        phases_file: std::path::PathBuf,
        /// Comma-separated hex principals authorized to trigger CONDITIONAL phases.
        #[arg(long, default_value = "")]
        authorized_triggers: String,
        #[arg(long, default_value_t = 0)]
        fee: u128,
    },
    /// Start an execution of a registered workflow.
    ExecuteWorkflow {
        workflow_id: String,
        initiator: String,
        /// Hex-encoded initial payload.
        #[arg(long, default_value = "")]
        payload: String,
        #[arg(long, default_value_t = 0)]
        fee: u128,
        #[arg(long, default_value_t = 0)]
        nonce: u64,
    },
    /// Submit one operator's response to a COORDINATION phase.
    SubmitCoordinationResponse {
        execution_id: String,
        phase_index: usize,
        responder: String,
        #[arg(long, default_value = "")]
        response: String,
    },
    /// Submit one operator's periodic update to a CONTINUOUS phase.
    SubmitMonitoringUpdate {
        execution_id: String,
        phase_index: usize,
        operator: String,
        #[arg(long, default_value = "")]
        update: String,
    },
    /// Fire a CONDITIONAL phase's external trigger.
    TriggerConditionalPhase {
        execution_id: String,
        phase_index: usize,
        caller: String,
        #[arg(long, default_value = "")]
        trigger_data: String,
    },
    /// Check whether a phase's deadline has passed and time it out if so.
    CheckPhaseTimeout { execution_id: String, phase_index: usize },
    /// Fetch a registered workflow definition.
    GetWorkflow { workflow_id: String },
    /// Fetch an execution's current state.
    GetExecution { execution_id: String },
    /// Fetch a single phase's status.
    GetPhaseStatus { execution_id: String, phase_index: usize },
    /// Fetch a single phase's stored result, if any.
    GetPhaseResult { execution_id: String, phase_index: usize },
}

fn parse_principal(s: &str) -> Result<Principal> {
    let bytes = hex::decode(s.trim_start_matches("0x")).context("invalid hex principal")?;
    Ok(Principal::from_bytes(&bytes))
}

fn parse_content_id(s: &str) -> Result<ContentId> {
    let bytes = hex::decode(s.trim_start_matches("0x")).context("invalid hex id")?;
    let array: [u8; 32] = bytes
        .try_into()
        .map_err(|_| anyhow::anyhow!("id must be exactly 32 bytes"))?;
    Ok(ContentId(array))
}

fn parse_hex_bytes(s: &str) -> Result<Vec<u8>> {
    if s.is_empty() {
        return Ok(Vec::new());
    }
    hex::decode(s.trim_start_matches("0x")).context("invalid hex payload")
}

fn parse_triggers(s: &str) -> Result<HashSet<Principal>> {
    s.split(',')
        .filter(|p| !p.is_empty())
        .map(parse_principal)
        .collect()
}

/// Dispatch a parsed command against a running engine and print the result.
pub async fn run(command: Commands, json: bool, engine: &WorkflowEngine) -> Result<()> {
    match command {
        Commands::AuthorizeCreator { creator } => {
            engine.authorize_workflow_creator(parse_principal(&creator)?).await;
            print_ok(json, "creator authorized");
        }
        Commands::AuthorizeTriggerSource { source } => {
            engine.authorize_trigger_source(parse_principal(&source)?).await;
            print_ok(json, "trigger source authorized");
        }
        Commands::SetFees { creation_fee, execution_fee } => {
            engine.set_fees(creation_fee, execution_fee).await;
            print_ok(json, "fees updated");
        }
        Commands::RegisterWorkflow {
            creator,
            name,
            phases_file,
            authorized_triggers,
            fee,
        } => {
            let raw = std::fs::read_to_string(&phases_file)
                .with_context(|| format!("reading {}", phases_file.display()))?;
            let phases: Vec<PhaseDefinition> =
                serde_json::from_str(&raw).context("parsing phase list")?;
            let id = engine
                .register_workflow(
                    parse_principal(&creator)?,
                    name,
                    phases,
                    parse_triggers(&authorized_triggers)?,
                    fee,
                )
                .await?;
            print_value(json, "workflow_id", &id.to_string());
        }
        Commands::ExecuteWorkflow {
            workflow_id,
            initiator,
            payload,
            fee,
            nonce,
        } => {
            let id = engine
                .execute_workflow(
                    WorkflowId(parse_content_id(&workflow_id)?),
                    parse_principal(&initiator)?,
                    parse_hex_bytes(&payload)?,
                    fee,
                    nonce,
                )
                .await?;
            print_value(json, "execution_id", &id.to_string());
        }
        Commands::SubmitCoordinationResponse {
            execution_id,
            phase_index,
            responder,
            response,
        } => {
            engine
                .submit_coordination_response(
                    ExecutionId(parse_content_id(&execution_id)?),
                    phase_index,
                    parse_principal(&responder)?,
                    parse_hex_bytes(&response)?,
                )
                .await?;
            print_ok(json, "response recorded");
        }
        Commands::SubmitMonitoringUpdate {
            execution_id,
            phase_index,
            operator,
            update,
        } => {
            engine
                .submit_monitoring_update(
                    ExecutionId(parse_content_id(&execution_id)?),
                    phase_index,
                    parse_principal(&operator)?,
                    parse_hex_bytes(&update)?,
                )
                .await?;
            print_ok(json, "update recorded");
        }
        Commands::TriggerConditionalPhase {
            execution_id,
            phase_index,
            caller,
            trigger_data,
        } => {
            engine
                .trigger_conditional_phase(
                    ExecutionId(parse_content_id(&execution_id)?),
                    phase_index,
                    parse_principal(&caller)?,
                    parse_hex_bytes(&trigger_data)?,
                )
                .await?;
            print_ok(json, "trigger activated");
        }
        Commands::CheckPhaseTimeout { execution_id, phase_index } => {
            engine
                .check_phase_timeout(ExecutionId(parse_content_id(&execution_id)?), phase_index)
                .await?;
            print_ok(json, "phase timed out");
        }
        Commands::GetWorkflow { workflow_id } => {
            let workflow = engine
                .get_workflow(WorkflowId(parse_content_id(&workflow_id)?))
                .await?;
            println!("{}", serde_json::to_string_pretty(&*workflow)?);
        }
        Commands::GetExecution { execution_id } => {
            let execution = engine
                .get_execution(ExecutionId(parse_content_id(&execution_id)?))
                .await?;
            println!("{}", serde_json::to_string_pretty(&execution)?);
        }
        Commands::GetPhaseStatus { execution_id, phase_index } => {
            let status = engine
                .get_phase_status(ExecutionId(parse_content_id(&execution_id)?), phase_index)
                .await?;
            print_value(json, "status", &status.to_string());
        }
        Commands::GetPhaseResult { execution_id, phase_index } => {
            let result = engine
                .get_phase_result(ExecutionId(parse_content_id(&execution_id)?), phase_index)
                .await?;
            match result {
                Some(bytes) => print_value(json, "result", &hex::encode(bytes)),
                None => print_ok(json, "no result yet"),
            }
        }
    }
    Ok(())
}

fn print_ok(json: bool, message: &str) {
    if json {
        println!(r#"{{"status":"ok","message":"{message}"}}"#);
    } else {
        println!("{message}");
    }
}

fn print_value(json: bool, key: &str, value: &str) {
    if json {
        println!(r#"{{"{key}":"{value}"}}"#);
    } else {
        println!("{key}: {value}");
    }
}
