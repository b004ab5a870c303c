//! Camera rig console.
//!
//! Demonstrates:
//! - Building a control link with a reconnect policy
//! - Observing connection and acknowledgment events
//! - Holding a gesture, firing one-shot actions and moving sliders
//! - Receiving the frame stream and reporting its frame rate
//!
//! Usage:
//!   cargo run --example rig_console
//!   cargo run --example rig_console -- --broker ws://192.168.1.59:8083
//!   cargo run --example rig_console -- --video ws://192.168.1.59:8765
//!   cargo run --example rig_console -- --debug --no-wait

mod common;

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use common::Args;
use rig_link::{
    AckTracker, Action, Axis, ConnectionManager, Dispatcher, Error, FrameReceiver,
    InboundMessage, LinkObserver,
};

// ============================================================================
// Constants
// ============================================================================

const CONNECT_WAIT: Duration = Duration::from_secs(10);
const HOLD_TIME: Duration = Duration::from_millis(500);
const ACK_TOPIC: &str = "forklift/control/+/ack";
const STATUS_TOPIC: &str = "forklift/control/status/+";

// ============================================================================
// Console Observer
// ============================================================================

/// Prints link events.
struct ConsoleObserver;

impl LinkObserver for ConsoleObserver {
    fn on_connect(&self) {
        println!("    [link] connected");
    }

    fn on_disconnect(&self) {
        println!("    [link] disconnected");
    }

    fn on_error(&self, error: &Error) {
        println!("    [link] error: {error}");
    }

    fn on_reconnect_exhausted(&self) {
        println!("    [link] reconnect failed");
    }

    fn on_ack(&self, message: &InboundMessage) {
        println!("    [ack]  {} {}", message.topic, message.payload);
    }

    fn on_status(&self, message: &InboundMessage) {
        println!("    [stat] {} {}", message.topic, message.payload);
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    common::init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e:#}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    println!("=== Rig Console ===\n");

    // ========================================================================
    // Connect
    // ========================================================================

    println!("[1] Connecting to {}...", args.broker);

    let link = ConnectionManager::builder()
        .url(&args.broker)
        .build()
        .context("invalid broker configuration")?;

    let acks = Arc::new(AckTracker::new());
    link.add_observer(acks.clone());
    link.add_observer(Arc::new(ConsoleObserver));
    link.subscribe(ACK_TOPIC)?;
    link.subscribe(STATUS_TOPIC)?;

    link.connect()?;
    link.wait_connected(CONNECT_WAIT)
        .await
        .with_context(|| format!("broker {} unreachable", args.broker))?;

    println!("    ✓ Link {} up\n", link.id());

    // ========================================================================
    // Commands
    // ========================================================================

    println!("[2] Sending commands...");

    let dispatcher = Dispatcher::new(Arc::new(link.clone()))?;
    dispatcher.follow(link.watch_status());

    link.request_camera_status();

    dispatcher.press(Action::TiltUp)?;
    tokio::time::sleep(HOLD_TIME).await;
    dispatcher.release();
    println!("    ✓ Held tilt_up for {}ms", HOLD_TIME.as_millis());

    dispatcher.fire(Action::PresetHome);
    println!("    ✓ Fired preset/home");

    if let Some(action) = dispatcher.set_level(Axis::Zoom, 80)? {
        println!("    ✓ Zoom slider -> {action}");
    }
    dispatcher.reset();
    println!("    ✓ Sliders centered\n");

    tokio::time::sleep(Duration::from_millis(200)).await;
    match acks.last_ack_label() {
        Some(label) => println!("    Last ack: {label}\n"),
        None => println!("    No ack received\n"),
    }

    // ========================================================================
    // Frames
    // ========================================================================

    let receiver = match &args.video {
        Some(url) => {
            println!("[3] Receiving frames from {url}...");
            let receiver = FrameReceiver::connect(url)
                .await
                .with_context(|| format!("frame source {url} unreachable"))?;
            spawn_fps_printer(&receiver);
            Some(receiver)
        }
        None => None,
    };

    common::wait_for_exit(args.no_wait).await;

    if let Some(receiver) = receiver {
        receiver.close().await;
    }
    drop(dispatcher);
    link.shutdown();

    println!("\n=== Done ===");
    Ok(())
}

/// Prints every frame rate report.
fn spawn_fps_printer(receiver: &FrameReceiver) {
    let mut fps = receiver.watch_fps();
    let frames = receiver.watch_frames();

    tokio::spawn(async move {
        while fps.changed().await.is_ok() {
            let rate = *fps.borrow_and_update();
            let size = frames.borrow().as_ref().map_or(0, |f| f.len());
            if let Some(rate) = rate {
                println!("    {rate:.1} fps ({size} bytes/frame)");
            }
        }
    });
}
