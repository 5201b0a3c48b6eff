use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use reasonscope::{
    config::Config,
    graph::NodeKind,
    overlay::MetricsPanel,
    scene::{OrbitCamera, Scene, SceneDiff},
    stream::{HttpTransport, StreamClient, SubscribeRequest},
    ConnectionPhase, ReasonGraph,
};

/// Watch a reasoning run as a live 3D scene.
#[derive(Debug, Parser)]
#[command(name = "reasonscope", version, about)]
struct Cli {
    /// The query to submit to the reasoning engine.
    query: String,

    /// Restrict the stream to these node kinds (e.g. planner,solver).
    #[arg(long, value_delimiter = ',')]
    filter: Vec<NodeKind>,

    /// Attach to an existing engine session instead of starting a new one.
    #[arg(long)]
    session: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        engine = %config.engine.base_url,
        "Reasonscope starting..."
    );

    let transport = match HttpTransport::new(&config.engine, &config.stream) {
        Ok(t) => Arc::new(t),
        Err(e) => {
            error!(error = %e, "Failed to build stream transport");
            return Err(e.into());
        }
    };

    let session = cli
        .session
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let request = SubscribeRequest::new(cli.query)
        .with_kinds(cli.filter)
        .with_session(session);

    let client = StreamClient::new(transport, request, &config.stream);
    let mut status = client.subscribe();
    client.start();

    let started = Instant::now();
    let mut camera = OrbitCamera::new(&config.scene);
    let mut previous: Option<Arc<ReasonGraph>> = None;
    let mut last_tick = Instant::now();

    loop {
        tokio::select! {
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = status.borrow_and_update().clone();

                if let Some(snapshot) = &current.snapshot {
                    let diff = SceneDiff::between(previous.as_deref(), snapshot);
                    let scene = Scene::build(snapshot, &config.scene, started.elapsed());
                    let live = current.streaming && snapshot.has_active_nodes();
                    camera.tick(last_tick.elapsed(), live);
                    last_tick = Instant::now();

                    let panel = MetricsPanel::project(snapshot);
                    info!(
                        nodes = scene.nodes.len(),
                        edges = scene.edges.len(),
                        activated = diff.any_activated(),
                        confidence = %panel.confidence,
                        ethical = %panel.ethical_score,
                        sri = %panel.secure_reasoning_index,
                        alignment = %panel.alignment.label,
                        "Snapshot"
                    );
                    previous = Some(Arc::clone(snapshot));
                }

                match current.phase {
                    ConnectionPhase::Completed => {
                        if let Some(snapshot) = &current.snapshot {
                            let panel = MetricsPanel::project(snapshot);
                            if let Some(answer) = &panel.final_answer {
                                info!(answer = %answer, alignment = %panel.alignment.label, "Run complete");
                            }
                        }
                        break;
                    }
                    ConnectionPhase::Failed => {
                        if let Some(err) = &current.error {
                            error!(error = %err, "Run failed; not retrying");
                        }
                        break;
                    }
                    ConnectionPhase::Reconnecting => {
                        warn!(
                            delay_ms = config.stream.reconnect_delay_ms,
                            "Connection lost; reconnecting"
                        );
                    }
                    _ => {}
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted; shutting down");
                client.stop();
                break;
            }
            _ = tokio::time::sleep(Duration::from_millis(100)) => {
                // Idle frame: keep the auto-rotation advancing between events.
                let live = {
                    let s = status.borrow();
                    s.streaming
                        && s.snapshot
                            .as_ref()
                            .is_some_and(|g| g.has_active_nodes())
                };
                camera.tick(last_tick.elapsed(), live);
                last_tick = Instant::now();
                tracing::trace!(yaw = camera.yaw, eye = ?camera.eye(), "Camera frame");
            }
        }
    }

    info!("Shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        reasonscope::config::LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        reasonscope::config::LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
