//! Simulate command - listen server and client in one process
//!
//! The client opens its overlay, selects the demo bot, cycles the bot's
//! path once and prints what its overlay shows at the end.

use anyhow::{Context, Result};
use clap::Args;
use dna_debugger_core::input::KeyEvent;
use dna_debugger_core::registry::SessionContext;
use dna_debugger_core::{
    DebuggerModule, Link, LoopbackLink, NetMode, Replicator, SessionManager, UdpLink, WorldId,
};
use dna_debugger_shared::{ActorId, ControllerId};
use winit::keyboard::KeyCode;

use crate::demo::{DemoWorld, TextCanvas, console_hud, register_demo_addons};

const HOST: ControllerId = ControllerId(1);
const REMOTE: ControllerId = ControllerId(2);
const BOT: ActorId = ActorId(42);

/// Seconds of game time per step
const STEP: f64 = 0.1;

/// Arguments for the simulate command
#[derive(Args)]
pub struct SimulateArgs {
    /// Number of 100ms frames to run
    #[arg(long, default_value = "300")]
    pub steps: usize,

    /// Fraction of unreliable messages lost in each direction (loopback only)
    #[arg(long, default_value = "0.2")]
    pub loss: f64,

    /// Seed for packet loss
    #[arg(long, default_value = "1")]
    pub seed: u64,

    /// Frame at which the client selects the demo bot
    #[arg(long, default_value = "50")]
    pub select_at: usize,

    /// Exchange messages over UDP sockets on localhost
    #[arg(long)]
    pub udp: bool,
}

fn links(args: &SimulateArgs) -> Result<(Box<dyn Link>, Box<dyn Link>)> {
    if args.udp {
        let mut server = UdpLink::bind("127.0.0.1:0", "127.0.0.1:0")
            .context("Failed to bind server socket")?;
        let client = UdpLink::bind("127.0.0.1:0", &server.local_addr().to_string())
            .context("Failed to bind client socket")?;
        server.set_peer(client.local_addr());
        tracing::info!(server = %server.local_addr(), client = %client.local_addr(), "using UDP");
        return Ok((Box::new(server), Box::new(client)));
    }
    let (server, client) = LoopbackLink::pair();
    Ok((
        Box::new(server.with_loss(args.loss, args.seed)),
        Box::new(client.with_loss(args.loss, args.seed.wrapping_add(1))),
    ))
}

fn module() -> DebuggerModule {
    let module = DebuggerModule::with_stored_config();
    register_demo_addons(&mut module.registry().borrow_mut(), console_hud());
    module
}

pub fn execute(args: SimulateArgs) -> Result<()> {
    let (mut server_link, mut client_link) = links(&args)?;

    let mut server_world = DemoWorld::new(WorldId(1), NetMode::ListenServer)
        .with_controller(HOST, true)
        .with_controller(REMOTE, false)
        .with_actor(BOT, "Grunt");
    let mut server_module = module();
    let server = server_module.session_manager(&server_world);

    let mut client_world =
        DemoWorld::new(WorldId(2), NetMode::Client).with_controller(REMOTE, true);
    let mut client_module = module();
    let client = client_module.session_manager(&client_world);
    {
        let registry = client_module.registry();
        let viewer = Replicator::new(
            REMOTE,
            &registry.borrow(),
            SessionContext {
                net_mode: NetMode::Client,
                simulating: false,
            },
            true,
        );
        client.borrow_mut().register_replicator(viewer, &client_world);
    }

    client
        .borrow_mut()
        .handle_key(REMOTE, KeyEvent::plain(KeyCode::Quote));

    for step in 0..args.steps {
        if step == args.select_at {
            tracing::info!(step, "client selects debug actor");
            if let Some(viewer) = client.borrow_mut().replicator_mut(REMOTE) {
                viewer.set_debug_actor(Some(BOT), &client_world);
            }
        }
        if step == args.select_at + 30 {
            tracing::info!(step, "client cycles the patrol path");
            client
                .borrow_mut()
                .handle_key(REMOTE, KeyEvent::plain(KeyCode::KeyC));
        }

        exchange(
            &mut server.borrow_mut(),
            &server_world,
            server_link.as_mut(),
            &mut client.borrow_mut(),
            &client_world,
            client_link.as_mut(),
        )?;

        server_world.advance(STEP);
        client_world.advance(STEP);
    }

    let mut canvas = TextCanvas::default();
    client
        .borrow_mut()
        .draw(REMOTE, &mut canvas, client_world.time());
    println!("{}", canvas.transcript());
    Ok(())
}

/// One frame: authority tick and send, viewer receive, viewer send,
/// authority receive.
fn exchange(
    server: &mut SessionManager,
    server_world: &DemoWorld,
    server_link: &mut dyn Link,
    client: &mut SessionManager,
    client_world: &DemoWorld,
    client_link: &mut dyn Link,
) -> Result<()> {
    server.tick(server_world);
    for (controller, message) in server.drain_outgoing() {
        if controller == REMOTE {
            server_link.send(&message)?;
        }
    }
    for message in client_link.poll_all() {
        client.handle_message(REMOTE, REMOTE, message);
    }

    client.tick(client_world);
    for (_, message) in client.drain_outgoing() {
        client_link.send(&message)?;
    }
    for message in server_link.poll_all() {
        server.handle_message(REMOTE, REMOTE, message);
    }
    Ok(())
}
