use std::process::ExitCode;

use clap::{Parser, Subcommand};
use obsws::prelude::*;
use obsws::protocol::Timecode;

#[derive(Parser)]
#[command(name = "scene-switcher")]
#[command(about = "List and switch scenes of a running OBS instance")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Host running the obs-websocket plugin
    #[arg(long, global = true, default_value = "localhost")]
    host: String,

    /// obs-websocket port
    #[arg(short, long, global = true, default_value_t = 4444)]
    port: u16,

    /// Log protocol traffic (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List scenes, marking the current one
    Scenes,
    /// Switch to a scene by name
    Switch {
        /// Scene name
        name: String,
    },
    /// Show streaming and recording status
    Status,
    /// Print events until interrupted
    Watch,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default_directive = if verbose { "debug" } else { "warn" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), ClientError> {
    let client = Client::builder()
        .host(cli.host)
        .port(cli.port)
        .connect()
        .await?;

    let result = match cli.command {
        Commands::Scenes => list_scenes(&client).await,
        Commands::Switch { name } => client.set_current_scene(name).await,
        Commands::Status => show_status(&client).await,
        Commands::Watch => watch(&client).await,
    };
    client.close().await;
    result
}

/// The key a scene is bound to in the interactive switcher: `1`-`9`
/// for the first nine scenes, `0` for the tenth.
fn scene_key(index: usize) -> Option<char> {
    match index {
        0..=8 => char::from_digit(index as u32 + 1, 10),
        9 => Some('0'),
        _ => None,
    }
}

async fn list_scenes(client: &Client) -> Result<(), ClientError> {
    let list = client.get_scene_list().await?;
    for (i, scene) in list.scenes.iter().enumerate() {
        let marker = if scene.name == list.current_scene { '*' } else { ' ' };
        let key = scene_key(i).unwrap_or(' ');
        println!("{marker} [{key}] {}", scene.name);
    }
    Ok(())
}

async fn show_status(client: &Client) -> Result<(), ClientError> {
    let status = client.get_streaming_status().await?;
    println!("streaming: {}{}", status.streaming, elapsed(status.stream_timecode));
    println!("recording: {}{}", status.recording, elapsed(status.rec_timecode));
    if status.preview_only {
        println!("preview only");
    }
    Ok(())
}

fn elapsed(timecode: Timecode) -> String {
    if timecode.is_absent() {
        String::new()
    } else {
        format!(" ({timecode})")
    }
}

async fn watch(client: &Client) -> Result<(), ClientError> {
    let events = client.subscribe_events().await?;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => return Ok(()),
            event = events.next() => match event {
                Some(Event::SwitchScenes(e)) => println!("switched to {}", e.scene_name),
                Some(event) => println!("{}", event.update_type()),
                None => return Err(ClientError::Closed),
            },
        }
    }
}
