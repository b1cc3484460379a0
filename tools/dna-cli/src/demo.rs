//! Sample addons, world and canvas used by the commands

use std::cell::RefCell;
use std::rc::Rc;

use dna_debugger_core::canvas::{Canvas, CanvasContext};
use dna_debugger_core::category::{Category, CategoryControl, CategoryFactory, CollectContext};
use dna_debugger_core::extension::{GAME_HUD_EXTENSION, HudControl, HudExtension};
use dna_debugger_core::input::{InputMode, InputModifier};
use dna_debugger_core::registry::{AddonRegistry, NO_SLOT};
use dna_debugger_core::{CategoryState, NetMode, World, WorldId};
use dna_debugger_shared::{ActorId, Color, ControllerId, DataPackPolicy, Shape};
use glam::{Vec2, Vec3};
use hashbrown::HashMap;
use winit::keyboard::KeyCode;

// ============================================================================
// World
// ============================================================================

pub struct DemoWorld {
    id: WorldId,
    net_mode: NetMode,
    time: f64,
    controllers: Vec<(ControllerId, bool)>,
    actors: HashMap<ActorId, String>,
}

impl DemoWorld {
    pub fn new(id: WorldId, net_mode: NetMode) -> Self {
        Self {
            id,
            net_mode,
            time: 0.0,
            controllers: Vec::new(),
            actors: HashMap::new(),
        }
    }

    pub fn with_controller(mut self, controller: ControllerId, local: bool) -> Self {
        self.controllers.push((controller, local));
        self
    }

    pub fn with_actor(mut self, actor: ActorId, name: &str) -> Self {
        self.actors.insert(actor, name.to_string());
        self
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn advance(&mut self, seconds: f64) {
        self.time += seconds;
    }
}

impl World for DemoWorld {
    fn id(&self) -> WorldId {
        self.id
    }

    fn net_mode(&self) -> NetMode {
        self.net_mode
    }

    fn time_seconds(&self) -> f64 {
        self.time
    }

    fn controllers(&self) -> Vec<ControllerId> {
        self.controllers.iter().map(|(c, _)| *c).collect()
    }

    fn is_local_controller(&self, controller: ControllerId) -> bool {
        self.controllers.contains(&(controller, true))
    }

    fn actor_name(&self, actor: ActorId) -> Option<String> {
        self.actors.get(&actor).cloned()
    }
}

// ============================================================================
// Canvas
// ============================================================================

/// Monospace canvas that keeps drawn text as plain rows.
#[derive(Default)]
pub struct TextCanvas {
    rows: Vec<(f32, String)>,
    shapes: usize,
}

impl TextCanvas {
    pub fn transcript(&self) -> String {
        let mut out: Vec<String> = self.rows.iter().map(|(_, row)| row.clone()).collect();
        if self.shapes > 0 {
            out.push(format!("({} shapes)", self.shapes));
        }
        out.join("\n")
    }
}

impl Canvas for TextCanvas {
    fn draw_text(&mut self, position: Vec2, text: &str, _color: Color) {
        match self.rows.last_mut() {
            Some((y, row)) if *y == position.y => row.push_str(text),
            _ => self.rows.push((position.y, text.to_string())),
        }
    }

    fn text_size(&self, text: &str) -> Vec2 {
        Vec2::new(text.chars().count() as f32 * 8.0, 12.0)
    }

    fn line_height(&self) -> f32 {
        12.0
    }

    fn clip_size(&self) -> Vec2 {
        Vec2::new(1280.0, 720.0)
    }

    fn project(&self, location: Vec3) -> Vec2 {
        Vec2::new(location.x, location.y)
    }

    fn is_location_visible(&self, location: Vec3) -> bool {
        location.x >= 0.0 && location.y >= 0.0 && location.z >= 0.0
    }

    fn draw_shape(&mut self, _shape: &Shape) {
        self.shapes += 1;
    }
}

/// HUD switches that only log what the game would do.
#[derive(Default)]
pub struct ConsoleHud {
    messages_enabled: bool,
}

impl HudControl for ConsoleHud {
    fn set_game_hud_visible(&mut self, visible: bool) {
        log::info!("game HUD {}", if visible { "shown" } else { "hidden" });
    }

    fn set_debug_messages_enabled(&mut self, enabled: bool) {
        self.messages_enabled = enabled;
        log::info!("debug messages {}", if enabled { "on" } else { "off" });
    }

    fn debug_messages_enabled(&self) -> bool {
        self.messages_enabled
    }
}

// ============================================================================
// Categories
// ============================================================================

/// Patrol path of the debug actor, replicated as a data pack.
#[derive(Default)]
struct AiCategory {
    path: Vec<Vec3>,
    variant: u32,
}

impl AiCategory {
    fn factory() -> CategoryFactory {
        Box::new(|setup| {
            setup.add_data_pack(DataPackPolicy::ResetOnActorChange);
            setup.input.bind_configurable_key(
                "CyclePath",
                KeyCode::KeyC,
                InputModifier::NONE,
                InputMode::Replicated,
            );
            Box::new(AiCategory::default())
        })
    }
}

impl Category for AiCategory {
    fn collect(&mut self, ctx: &mut CollectContext<'_>) {
        let Some(actor) = ctx.debug_actor else {
            return;
        };
        let seed = actor.actor.map_or(0, |a| a.0) as f32;
        let points = 4 + self.variant as usize % 4;
        self.path = (0..points)
            .map(|i| {
                let t = i as f32;
                Vec3::new(seed + t * 100.0, 300.0 + (t * 0.7).sin() * 50.0, 0.0)
            })
            .collect();

        ctx.add_text_line(format!("{{white}}Controller: {{green}}{}", actor.name));
        ctx.add_text_line(format!("{{white}}Path variant: {{yellow}}{}", self.variant));
        for pair in self.path.windows(2) {
            ctx.add_shape(Shape::segment(pair[0], pair[1], 2.0, Color::CYAN));
        }
        if let Some(goal) = self.path.last() {
            ctx.add_shape(Shape::point(*goal, 6.0, Color::RED).with_description("goal"));
        }
    }

    fn draw(&mut self, _owner: ControllerId, canvas: &mut CanvasContext<'_>) {
        canvas.print(&format!("{{white}}Path points: {{yellow}}{}", self.path.len()));
    }

    fn write_data_pack(&self, _pack_id: usize, out: &mut Vec<u8>) {
        for point in &self.path {
            for coord in point.to_array() {
                out.extend_from_slice(&coord.to_le_bytes());
            }
        }
    }

    fn read_data_pack(&mut self, _pack_id: usize, bytes: &[u8]) {
        self.path = bytes
            .chunks_exact(12)
            .map(|point| {
                let coord = |i: usize| {
                    f32::from_le_bytes([point[i], point[i + 1], point[i + 2], point[i + 3]])
                };
                Vec3::new(coord(0), coord(4), coord(8))
            })
            .collect();
    }

    fn reset_data_pack(&mut self, _pack_id: usize) {
        self.path.clear();
    }

    fn on_input(&mut self, _handler_id: usize, control: &mut CategoryControl) {
        self.variant += 1;
        control.force_collect();
    }
}

struct PerceptionCategory;

impl PerceptionCategory {
    fn factory() -> CategoryFactory {
        Box::new(|setup| {
            setup.set_collect_interval(0.5);
            setup.settings.show_update_timer = true;
            setup.settings.show_only_with_debug_actor = false;
            Box::new(PerceptionCategory)
        })
    }
}

impl Category for PerceptionCategory {
    fn collect(&mut self, ctx: &mut CollectContext<'_>) {
        let stimuli = (ctx.world_time * 2.0) as u32 % 5;
        ctx.add_text_line(format!("{{white}}Stimuli: {{yellow}}{stimuli}"));
        ctx.add_text_line("{white}Senses: {green}sight{white}, {green}hearing");
    }
}

/// Cost grid around the player, rebuilt on every collection.
#[derive(Default)]
struct NavigationCategory {
    tiles: Vec<u8>,
}

const NAV_GRID: usize = 48;

impl NavigationCategory {
    fn factory() -> CategoryFactory {
        Box::new(|setup| {
            setup.add_data_pack(DataPackPolicy::ResetOnTick);
            setup.set_collect_interval(2.0);
            setup.settings.show_data_pack_replication = true;
            setup.settings.show_only_with_debug_actor = false;
            Box::new(NavigationCategory::default())
        })
    }
}

impl Category for NavigationCategory {
    fn collect(&mut self, ctx: &mut CollectContext<'_>) {
        let epoch = (ctx.world_time / 2.0) as usize;
        self.tiles = (0..NAV_GRID * NAV_GRID)
            .map(|i| {
                let (x, y) = (i % NAV_GRID, i / NAV_GRID);
                ((x * 31 + y * 17 + epoch * 13) ^ (x * y)) as u8
            })
            .collect();
        ctx.add_text_line(format!("{{white}}Grid: {{yellow}}{NAV_GRID}x{NAV_GRID}"));
    }

    fn draw(&mut self, _owner: ControllerId, canvas: &mut CanvasContext<'_>) {
        let blocked = self.tiles.iter().filter(|t| **t > 200).count();
        canvas.print(&format!(
            "{{white}}Tiles: {{yellow}}{}{{white}}, blocked: {{red}}{blocked}",
            self.tiles.len()
        ));
    }

    fn write_data_pack(&self, _pack_id: usize, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.tiles);
    }

    fn read_data_pack(&mut self, _pack_id: usize, bytes: &[u8]) {
        self.tiles = bytes.to_vec();
    }

    fn reset_data_pack(&mut self, _pack_id: usize) {
        self.tiles.clear();
    }
}

struct NetCategory;

impl Category for NetCategory {
    fn collect(&mut self, ctx: &mut CollectContext<'_>) {
        ctx.add_text_line(format!("{{white}}World time: {{yellow}}{:.1}s", ctx.world_time));
    }
}

/// Register the sample categories and the HUD extension.
pub fn register_demo_addons(registry: &mut AddonRegistry, hud: Rc<RefCell<dyn HudControl>>) {
    registry.register_category("AI", AiCategory::factory(), CategoryState::default(), NO_SLOT);
    registry.register_category(
        "Perception",
        PerceptionCategory::factory(),
        CategoryState::default(),
        2,
    );
    registry.register_category(
        "Navigation",
        NavigationCategory::factory(),
        CategoryState::EnabledInGame,
        2,
    );
    registry.register_category(
        "Net",
        Box::new(|setup| {
            setup.settings.show_only_with_debug_actor = false;
            Box::new(NetCategory)
        }),
        CategoryState::EnabledInSimulate,
        NO_SLOT,
    );
    registry.register_extension(GAME_HUD_EXTENSION, HudExtension::factory(hud));
    registry.recompute_category_layout();
}

pub fn console_hud() -> Rc<RefCell<dyn HudControl>> {
    Rc::new(RefCell::new(ConsoleHud::default()))
}
