//! Command-line entry point: run the incident-response pipeline over a
//! single incident payload.
//!
//! ```text
//! cordon '{"description": "suspicious login burst", "source_ip": "203.0.113.7", "host": "web-01"}'
//! ```
//!
//! The payload becomes the run's first human message and its top-level
//! fields seed the state's extra channel. The final state is printed as
//! JSON; the exit code is 0 only when the run completes.

use miette::IntoDiagnostic;
use serde_json::Value;
use tracing::info;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use cordon::capabilities::Collaborators;
use cordon::pipeline::build_pipeline;
use cordon::state::{RunStatus, WorkflowState};
use cordon::workflow::RuntimeConfig;

fn init_tracing() {
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,cordon=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(ErrorLayer::default())
        .init();
}

fn init_miette() {
    miette::set_panic_hook();
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    init_miette();
    init_tracing();

    let Some(payload) = std::env::args().nth(1) else {
        eprintln!("usage: cordon <incident-json>");
        std::process::exit(2);
    };
    let incident: Value = match serde_json::from_str(&payload) {
        Ok(value) => value,
        Err(err) => {
            eprintln!("invalid incident JSON: {err}");
            std::process::exit(2);
        }
    };

    let mut builder = WorkflowState::builder().with_human_message(&payload);
    if let Value::Object(fields) = &incident {
        for (key, value) in fields {
            builder = builder.with_extra(key.clone(), value.clone());
        }
    }
    let initial = builder.build();

    let collaborators = Collaborators::in_memory();
    let workflow = build_pipeline(&collaborators, RuntimeConfig::default())
        .map_err(miette::Report::from)?;

    info!(target: "cordon::cli", entry = workflow.entry_point(), "starting incident run");
    let mut run = workflow.stream(initial);
    while let Some(event) = run.next_event().await {
        let event = event.map_err(miette::Report::from)?;
        let note = event
            .snapshot
            .last_message()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        info!(target: "cordon::cli", node = %event.node, status = %event.snapshot.status, "{note}");
    }

    let final_state = run.into_state();
    println!(
        "{}",
        serde_json::to_string_pretty(&final_state).into_diagnostic()?
    );

    match final_state.status {
        RunStatus::Completed => Ok(()),
        status => {
            for err in &final_state.errors {
                eprintln!("{}", err.summary());
            }
            eprintln!("run ended {status}");
            std::process::exit(1);
        }
    }
}
