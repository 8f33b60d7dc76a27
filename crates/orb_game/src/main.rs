//! Headless stage runner.
//!
//! Usage: `orb_game [--config PATH] [--replay PATH] [--ticks N] [--kappler]`
//!
//! Without a replay the player idles for `--ticks` ticks (default 600). The
//! clock is simulated at 60 Hz and fed through `TickDriver`, so the run
//! exercises the same clamping a windowed host would.

use std::path::PathBuf;

use orb_core::input::Key;
use orb_core::time::TickDriver;
use orb_game::config::{load_config_from_path, GameConfig};
use orb_game::game::Game;
use orb_game::replay::{load_replay_from_path, ReplaySequence};

const DEFAULT_TICKS: usize = 600;
const HOST_FRAME_MS: f64 = 1000.0 / 60.0;
const STATUS_EVERY: u64 = 60;

struct Args {
    config: Option<PathBuf>,
    replay: Option<PathBuf>,
    ticks: usize,
    kappler: bool,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        config: None,
        replay: None,
        ticks: DEFAULT_TICKS,
        kappler: false,
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => args.config = Some(PathBuf::from(next_value(&mut iter, &arg)?)),
            "--replay" => args.replay = Some(PathBuf::from(next_value(&mut iter, &arg)?)),
            "--ticks" => {
                let raw = next_value(&mut iter, &arg)?;
                args.ticks = raw
                    .parse()
                    .map_err(|e| format!("Invalid --ticks '{}': {e}", raw))?;
            }
            "--kappler" => args.kappler = true,
            other => {
                return Err(format!(
                    "Unknown argument '{}'. Usage: orb_game [--config PATH] [--replay PATH] [--ticks N] [--kappler]",
                    other
                ))
            }
        }
    }
    Ok(args)
}

fn next_value(iter: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, String> {
    iter.next()
        .ok_or_else(|| format!("Missing value for {}", flag))
}

fn log_status(game: &Game) {
    if let Some(player) = game.player() {
        let position = player.motion.position;
        log::info!(
            "tick {:>5}: {} frame {} at angle {:.3} radius {:.1} ({})",
            game.tick_count(),
            player.animator.current_animation(),
            player.animator.frame_index(),
            position.angle,
            position.radius,
            if player.motion.is_grounded() {
                "grounded"
            } else {
                "airborne"
            }
        );
    }
}

fn main() -> Result<(), String> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = parse_args()?;
    let mut config = match &args.config {
        Some(path) => load_config_from_path(path)?,
        None => GameConfig::default(),
    };
    config.spawn_kappler |= args.kappler;

    let replay: Option<ReplaySequence> = match &args.replay {
        Some(path) => Some(load_replay_from_path(path)?),
        None => None,
    };

    let mut game = Game::new(config)?;
    let ready = game.resources.load_pending();
    log::info!("{} sprite sheet(s) ready", ready);

    let frames: Vec<&[Key]> = match &replay {
        Some(replay) => replay.expanded_keys(),
        None => vec![&[][..]; args.ticks],
    };
    let host_step = replay.as_ref().map_or(HOST_FRAME_MS, |r| r.fixed_dt_ms);

    let mut driver = TickDriver::new(game.config.max_step_ms);
    let mut now = 0.0;
    driver.run(now);
    for keys in frames {
        now += host_step;
        let Some(dt) = driver.tick(now) else {
            break;
        };
        game.input.sync_held(keys);
        game.advance(dt).map_err(|e| e.to_string())?;
        if game.tick_count() % STATUS_EVERY == 0 {
            log_status(&game);
        }
    }
    driver.stop();

    log_status(&game);
    log::info!(
        "Ran {} ticks ({:.0} ms simulated, {} clamped)",
        driver.tick_count,
        driver.total_time_ms,
        driver.clamped_ticks
    );
    for snapshot in game.render_snapshots() {
        log::debug!("{:?}", snapshot);
    }
    Ok(())
}
