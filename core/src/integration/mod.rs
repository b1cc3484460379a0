//! Integration tests for the DNA debugger core
//!
//! Runs a listen server and a client side by side, each with its own
//! session manager and registry, connected through a lossy loopback link.


#[cfg(test)]
pub(crate) mod test_utils {
    use std::cell::RefCell;
    use std::rc::Rc;

    use dna_debugger_shared::{ActorId, ControllerId, DataPackPolicy};

    use crate::category::CategoryState;
    use crate::config::DebuggerConfig;
    use crate::input::KeyEvent;
    use crate::net::{Link, LoopbackLink};
    use crate::registry::{AddonRegistry, NO_SLOT, SessionContext};
    use crate::replicator::Replicator;
    use crate::session::SessionManager;
    use crate::test_utils::{ProbeCategory, ProbeLog, ScriptedWorld, quiet_category};
    use crate::world::NetMode;

    /// Player hosting the listen server
    pub const HOST: ControllerId = ControllerId(1);
    /// Player on the client machine
    pub const REMOTE: ControllerId = ControllerId(2);
    pub const BOT: ActorId = ActorId(9);

    fn registry(log: &Rc<RefCell<ProbeLog>>, policy: DataPackPolicy) -> Rc<RefCell<AddonRegistry>> {
        let mut registry = AddonRegistry::new(DebuggerConfig::default());
        registry.register_category(
            "Probe",
            ProbeCategory::factory(log.clone(), policy),
            CategoryState::default(),
            NO_SLOT,
        );
        registry.register_category("Quiet", quiet_category(), CategoryState::default(), NO_SLOT);
        registry.recompute_category_layout();
        Rc::new(RefCell::new(registry))
    }

    pub struct Network {
        pub server_world: ScriptedWorld,
        pub client_world: ScriptedWorld,
        pub server: SessionManager,
        pub client: SessionManager,
        pub server_link: LoopbackLink,
        pub client_link: LoopbackLink,
        pub server_log: Rc<RefCell<ProbeLog>>,
        pub client_log: Rc<RefCell<ProbeLog>>,
    }

    impl Network {
        pub fn new(policy: DataPackPolicy, loss: f64, seed: u64) -> Self {
            let server_log = Rc::new(RefCell::new(ProbeLog::default()));
            let client_log = Rc::new(RefCell::new(ProbeLog::default()));

            let mut server_world = ScriptedWorld::new(NetMode::ListenServer)
                .with_controller(HOST, true)
                .with_controller(REMOTE, false);
            server_world.spawn_actor(BOT, "Bot");
            let client_world = ScriptedWorld::new(NetMode::Client).with_controller(REMOTE, true);

            let mut server = SessionManager::new(registry(&server_log, policy));
            server.begin_play(&server_world);

            let client_registry = registry(&client_log, policy);
            let mut client = SessionManager::new(client_registry.clone());
            client.begin_play(&client_world);
            let viewer = Replicator::new(
                REMOTE,
                &client_registry.borrow(),
                SessionContext {
                    net_mode: NetMode::Client,
                    simulating: false,
                },
                true,
            );
            client.register_replicator(viewer, &client_world);

            let (server_link, client_link) = LoopbackLink::pair();
            Self {
                server_world,
                client_world,
                server,
                client,
                server_link: server_link.with_loss(loss, seed),
                client_link: client_link.with_loss(loss, seed.wrapping_add(1)),
                server_log,
                client_log,
            }
        }

        pub fn press(&mut self, event: KeyEvent) {
            self.client.handle_key(REMOTE, event);
        }

        /// Run both sides for `steps` frames of 100ms.
        pub fn pump(&mut self, steps: usize) {
            for _ in 0..steps {
                self.server.tick(&self.server_world);
                for (controller, message) in self.server.drain_outgoing() {
                    if controller == REMOTE {
                        self.server_link.send(&message).unwrap();
                    }
                }
                for message in self.client_link.poll_all() {
                    self.client.handle_message(REMOTE, REMOTE, message);
                }

                self.client.tick(&self.client_world);
                for (_, message) in self.client.drain_outgoing() {
                    self.client_link.send(&message).unwrap();
                }
                for message in self.server_link.poll_all() {
                    self.server.handle_message(REMOTE, REMOTE, message);
                }

                self.server_world.advance(0.1);
                self.client_world.advance(0.1);
            }
        }

        pub fn authority(&self) -> &Replicator {
            self.server.replicator(REMOTE).unwrap()
        }

        pub fn viewer(&self) -> &Replicator {
            self.client.replicator(REMOTE).unwrap()
        }
    }
}
