//! Headless demo: grows a chain through the Bevy plugin and prints the map.
//!
//! Usage: `tile-chain-demo [library.ron] [appends]`
//! `TILE_CHAIN_CONFIG` names a generator config (RON or JSON) and
//! `TILE_CHAIN_SEED` pins the session seed.

use std::collections::HashMap;

use anyhow::{Context, Result};
use bevy::prelude::*;
use tracing::info;

use tile_chain::constants::DEFAULT_SESSION_SEED;
use tile_chain::logging::{init_tracing, TimingSpan};
use tile_chain::plugin::{GenerationCommand, PendingAppend, TileChainGenerator};
use tile_chain::{GeneratorConfig, GeneratorState, GridGenerator, LayoutLibrary, TileChainPlugin};

const DEFAULT_APPENDS: usize = 12;
const MAX_FRAMES_PER_APPEND: usize = 64;

fn main() -> Result<()> {
    let mut config = match std::env::var("TILE_CHAIN_CONFIG") {
        Ok(path) => GeneratorConfig::load(&path).with_context(|| format!("loading generator config {path}"))?,
        Err(_) => GeneratorConfig::default(),
    };
    init_tracing(&config.logging);

    let mut args = std::env::args().skip(1);
    let library = match args.next() {
        Some(path) => LayoutLibrary::load(&path).with_context(|| format!("loading layout library {path}"))?,
        None => LayoutLibrary::builtin(),
    };
    let appends: usize = match args.next() {
        Some(n) => n.parse().with_context(|| format!("invalid append count `{n}`"))?,
        None => DEFAULT_APPENDS,
    };
    match std::env::var("TILE_CHAIN_SEED") {
        Ok(s) => config.seed = Some(s.parse().context("TILE_CHAIN_SEED must be an integer")?),
        Err(_) => {
            config.seed.get_or_insert(DEFAULT_SESSION_SEED);
        }
    }

    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .add_plugins(TileChainPlugin { config, library });

    let _span = TimingSpan::new("demo");
    app.update();

    for i in 0..appends {
        if generator(&app).state() != GeneratorState::Ready {
            break;
        }
        // walk the open exits so the chain branches
        let exits = generator(&app).exits().open_count();
        app.world_mut().send_event(GenerationCommand::SelectExit(i % exits));
        app.world_mut().send_event(GenerationCommand::AppendNextAsync);
        for _ in 0..MAX_FRAMES_PER_APPEND {
            app.update();
            if app.world().resource::<PendingAppend>().0.is_none() {
                break;
            }
        }
    }

    let gen = generator(&app);
    info!(
        tiles = gen.chain().len(),
        open_exits = gen.exits().open_count(),
        spawns = gen.permanent_spawn_points().len(),
        state = ?gen.state(),
        "demo finished"
    );
    println!("{}", render_map(gen));
    Ok(())
}

fn generator(app: &App) -> &GridGenerator {
    &app.world().resource::<TileChainGenerator>().0
}

/// Top-down ASCII view: cell glyphs, `C` for the core, `A..` for open exits
fn render_map(gen: &GridGenerator) -> String {
    let orient = gen.orientation_service();
    let key = |p: Vec3| (p.x.round() as i32, p.z.round() as i32);
    let mut cells: HashMap<(i32, i32), char> = HashMap::new();
    for tile in gen.chain().iter() {
        for (cell, kind) in tile.layout.cells() {
            cells.insert(key(tile.cell_world(orient, cell)), kind.glyph());
        }
    }
    for (label, world) in gen.available_exits() {
        cells.insert(key(world), label.chars().next().unwrap_or('?'));
    }
    if let Some(core) = gen.core_position() {
        cells.insert(key(core), 'C');
    }
    let Some(min_x) = cells.keys().map(|k| k.0).min() else {
        return String::new();
    };
    let max_x = cells.keys().map(|k| k.0).max().unwrap_or(min_x);
    let min_z = cells.keys().map(|k| k.1).min().unwrap_or(0);
    let max_z = cells.keys().map(|k| k.1).max().unwrap_or(min_z);

    let mut out = String::new();
    for z in (min_z..=max_z).rev() {
        for x in min_x..=max_x {
            out.push(*cells.get(&(x, z)).unwrap_or(&' '));
        }
        out.push('\n');
    }
    out
}
