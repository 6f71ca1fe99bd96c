//! Trippe command-line client
//!
//! Discovers nearby events and experiences, looks up bookings, and sends
//! registration emails through a running proxy.
//!
//! Usage:
//!   trippe-cli nearby --lat 32.24 --lng 77.19 --details
//!   trippe-cli event <id>
//!   trippe-cli bookings --token <jwt> --event-id <id>
//!   trippe-cli send-test-email --to me@example.com

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use trippe_gateway::domain::{format_event_date, BookingState, RegistrationEmail};
use trippe_gateway::infra::logging::init_tracing;
use trippe_gateway::infra::Config;
use trippe_gateway::io::{BookingClient, RegistrationEmailClient, SendOutcome};
use trippe_gateway::services::geolocation::{source_from_config, FixedLocation, LocationSource};
use trippe_gateway::services::{NearbyAggregator, PositionOptions};

#[derive(Parser, Debug)]
#[command(name = "trippe-cli", version)]
#[command(about = "Nearby content, bookings, and registration email client")]
struct Args {
    /// Path to TOML configuration file (default: $CONFIG_FILE, then config/dev.toml)
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Events and experiences near a location
    Nearby {
        /// Latitude; falls back to the configured location
        #[arg(long, requires = "lng", allow_negative_numbers = true)]
        lat: Option<f64>,
        /// Longitude; falls back to the configured location
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lng: Option<f64>,
        /// Search radius as understood by the vendor
        #[arg(long)]
        max_distance: Option<String>,
        /// Also fetch the full record of every result
        #[arg(long)]
        details: bool,
    },
    /// Full record of one event
    Event { id: String },
    /// Full record of one experience
    Experience { id: String },
    /// Bookings of the signed-in customer
    Bookings {
        /// Bearer token of the customer session
        #[arg(long)]
        token: String,
        /// Only the booking for this event
        #[arg(long)]
        event_id: Option<String>,
    },
    /// Send a registration email through the proxy
    SendEmail {
        #[arg(long)]
        to: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        event_name: String,
        /// `YYYY-MM-DD` or an ISO timestamp; other text is sent as-is
        #[arg(long)]
        event_date: String,
        #[arg(long)]
        event_address: String,
    },
    /// Send the fixed sample registration email through the proxy
    SendTestEmail {
        #[arg(long)]
        to: String,
    },
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_outcome(outcome: &SendOutcome) -> anyhow::Result<()> {
    print_json(&json!({
        "success": outcome.success,
        "messageId": outcome.message_id,
        "error": outcome.error,
    }))?;
    if !outcome.success {
        anyhow::bail!("email was not sent");
    }
    Ok(())
}

async fn nearby(
    config: &Config,
    coordinates: Option<(f64, f64)>,
    max_distance: Option<String>,
    details: bool,
) -> anyhow::Result<()> {
    let aggregator = NearbyAggregator::from_config(config);
    let source: Box<dyn LocationSource> = match coordinates {
        Some((lat, lng)) => Box::new(FixedLocation::new(lat, lng)),
        None => source_from_config(config),
    };

    let options = PositionOptions::from_config(config);
    let (here, content) =
        aggregator.discover_here(source.as_ref(), &options, max_distance.as_deref()).await?;

    if !details {
        return print_json(&json!({ "location": here, "nearby": content }));
    }

    let (events, experiences) = tokio::join!(
        aggregator.resolve_events(&content.events.events),
        aggregator.resolve_experiences(&content.experiences.experiences),
    );

    let events: Vec<_> = events
        .into_iter()
        .map(|(id, result)| match result {
            Ok(detail) => json!({ "id": id, "detail": detail }),
            Err(e) => json!({ "id": id, "error": e.to_string() }),
        })
        .collect();
    let experiences: Vec<_> = experiences
        .into_iter()
        .map(|(id, result)| match result {
            Ok(detail) => json!({ "id": id, "detail": detail }),
            Err(e) => json!({ "id": id, "error": e.to_string() }),
        })
        .collect();

    print_json(&json!({
        "location": here,
        "nearby": content,
        "event_details": events,
        "experience_details": experiences,
    }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing("warn", false);

    let config = Config::load(args.config.as_deref());

    match args.command {
        Command::Nearby { lat, lng, max_distance, details } => {
            let coordinates = lat.zip(lng);
            nearby(&config, coordinates, max_distance, details).await?;
        }
        Command::Event { id } => {
            let aggregator = NearbyAggregator::from_config(&config);
            let detail = aggregator
                .client()
                .event_details(&id)
                .await
                .with_context(|| format!("event {id}"))?;
            print_json(&detail)?;
        }
        Command::Experience { id } => {
            let aggregator = NearbyAggregator::from_config(&config);
            let detail = aggregator
                .client()
                .experience_details(&id)
                .await
                .with_context(|| format!("experience {id}"))?;
            print_json(&detail)?;
        }
        Command::Bookings { token, event_id } => {
            let client = BookingClient::new(config.booking_base_url());
            match event_id {
                Some(event_id) => {
                    let response = client.booking_status(&token, &event_id).await;
                    let state = BookingState::from_response(&response);
                    print_json(&json!({ "state": state, "response": response }))?;
                }
                None => print_json(&client.all_bookings(&token).await)?,
            }
        }
        Command::SendEmail { to, name, event_name, event_date, event_address } => {
            let client = RegistrationEmailClient::new(config.email_proxy_url());
            let email = RegistrationEmail {
                event_name,
                customer_name: name,
                customer_email: to,
                event_date: format_event_date(&event_date),
                event_address,
            };
            print_outcome(&client.send_registration_email(&email).await)?;
        }
        Command::SendTestEmail { to } => {
            let client = RegistrationEmailClient::new(config.email_proxy_url());
            print_outcome(&client.send_test_email(&to).await)?;
        }
    }

    Ok(())
}
