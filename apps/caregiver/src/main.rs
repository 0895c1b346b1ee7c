use std::{sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    load_client_config, ActionDispatcher, ChatSession, ClientConfig, DashboardSession,
    DashboardState, DeliveredNotification, FeedbackKind, HttpChatBackend, HttpGateway,
    LocalNotificationCenter, ReminderScheduler, RemoteDataGateway, SendOutcome,
};
use shared::domain::PredefinedAction;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_stream::{wrappers::WatchStream, StreamExt};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "caregiver", about = "Caregiver client for the patient sensor hub")]
struct Args {
    /// Overrides the hub address from caregiver.toml / AID4ALL_BASE_URL.
    #[arg(long)]
    base_url: Option<String>,
    #[arg(long)]
    chat_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Live sensor readout, refreshed on the poll interval.
    Dashboard {
        /// Stop after this many seconds; runs until Ctrl-C when omitted.
        #[arg(long)]
        duration_secs: Option<u64>,
    },
    /// Send a predefined action: `on-my-way`, `help-arranged`, or a raw label.
    Action { action: String },
    /// Send a free-text message to the patient device.
    Message { text: Vec<String> },
    /// Schedule medicine reminders and wait until they fire.
    Remind {
        #[arg(required = true)]
        times: Vec<String>,
    },
    /// Ask the assistant a question.
    Chat { text: Vec<String> },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    let args = Args::parse();

    let mut config = load_client_config().context("loading client config")?;
    if let Some(url) = &args.base_url {
        config = config.with_base_url(url)?;
    }
    if let Some(url) = &args.chat_url {
        config = config.with_chat_url(url)?;
    }
    let config = Arc::new(config);

    match args.command {
        Command::Dashboard { duration_secs } => {
            let gateway: Arc<dyn RemoteDataGateway> =
                Arc::new(HttpGateway::new(Arc::clone(&config)));
            run_dashboard(DashboardSession::mount(&config, gateway), duration_secs).await
        }
        Command::Action { action } => {
            let dispatcher = dispatcher(&config);
            report(dispatcher.send_action(&action_label(&action)).await)
        }
        Command::Message { text } => {
            let dispatcher = dispatcher(&config);
            dispatcher.set_draft(text.join(" "));
            if !dispatcher.can_send_custom_message() {
                bail!("message is empty");
            }
            report(dispatcher.send_custom_message().await)
        }
        Command::Remind { times } => run_reminders(&times).await,
        Command::Chat { text } => {
            let session = ChatSession::new(Arc::new(HttpChatBackend::new(Arc::clone(&config))));
            match session.send(&text.join(" ")).await {
                Some(reply) => {
                    println!("{}", reply.text);
                    Ok(())
                }
                None => bail!("nothing to ask"),
            }
        }
    }
}

fn dispatcher(config: &Arc<ClientConfig>) -> ActionDispatcher {
    let gateway = Arc::new(HttpGateway::new(Arc::clone(config)));
    ActionDispatcher::new(gateway, config.feedback_ttl)
}

fn action_label(raw: &str) -> String {
    match raw {
        "on-my-way" => PredefinedAction::OnMyWay.label().to_string(),
        "help-arranged" => PredefinedAction::HelpArranged.label().to_string(),
        other => other.to_string(),
    }
}

fn report(outcome: SendOutcome) -> Result<()> {
    match outcome {
        SendOutcome::Completed(feedback) => {
            println!("{}", feedback.message);
            if feedback.kind == FeedbackKind::Error {
                bail!("dispatch failed");
            }
            Ok(())
        }
        SendOutcome::Skipped => bail!("a send is already in progress"),
    }
}

async fn run_dashboard(session: DashboardSession, duration_secs: Option<u64>) -> Result<()> {
    let mut states = WatchStream::new(session.poller.subscribe());
    let deadline = async {
        match duration_secs {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    };
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            state = states.next() => match state {
                Some(state) => print_state(&state),
                None => break,
            },
        }
    }

    session.poller.stop();
    Ok(())
}

fn print_state(state: &DashboardState) {
    if state.is_loading {
        println!("{}", client_core::dashboard::LOADING_TEXT);
        return;
    }
    let readout = state.readout();
    println!(
        "Temperature: {:<10} Humidity: {:<8} Fall: {}",
        readout.temperature_text,
        readout.humidity_text,
        readout.fall_indicator.label()
    );
}

async fn run_reminders(times: &[String]) -> Result<()> {
    let center = Arc::new(LocalNotificationCenter::new());
    let mut delivered = center.subscribe_delivered();
    let mut scheduler = ReminderScheduler::new(center);
    if !scheduler.activate().await {
        bail!("notification permission refused");
    }

    for time in times {
        let entry = scheduler
            .schedule_reminder(time)
            .await
            .with_context(|| format!("scheduling reminder at {time}"))?;
        println!("{} scheduled for {}", entry.title, entry.display_date());
    }

    wait_for_deliveries(&mut scheduler, &mut delivered).await
}

/// Prints deliveries until every scheduled reminder has fired.
async fn wait_for_deliveries(
    scheduler: &mut ReminderScheduler,
    delivered: &mut broadcast::Receiver<DeliveredNotification>,
) -> Result<()> {
    while !scheduler.reminders().is_empty() {
        match delivered.recv().await {
            Ok(notification) => println!(
                "{}: {}",
                notification.content.title, notification.content.body
            ),
            Err(RecvError::Lagged(missed)) => warn!(missed, "skipped reminder deliveries"),
            Err(RecvError::Closed) => bail!("notification center shut down"),
        }
        scheduler.prune_fired().await?;
    }
    Ok(())
}
