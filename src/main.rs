//! Elementary CA CLI - Run automata from JSON configuration.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use elementary_ca::{
    compute::{Automaton, Row, Word, grown_length},
    history::{HistoryRecorder, RecorderConfig},
    schema::{AutomatonConfig, RenderConfig, WordBits},
};

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <config.json> [generations]", args[0]);
        eprintln!();
        eprintln!("Run an elementary cellular automaton from JSON configuration.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json  Path to run configuration file");
        eprintln!("  generations  Overrides the configured generation count");
        eprintln!();
        eprintln!("Example configuration is generated with --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_config();
        return;
    }

    let config_path = PathBuf::from(&args[1]);

    let config_str = fs::read_to_string(&config_path).unwrap_or_else(|e| {
        eprintln!("Error reading config file: {}", e);
        std::process::exit(1);
    });

    let mut config: AutomatonConfig = serde_json::from_str(&config_str).unwrap_or_else(|e| {
        eprintln!("Error parsing config: {}", e);
        std::process::exit(1);
    });

    if let Some(arg) = args.get(2) {
        config.generations = arg.parse().unwrap_or_else(|e| {
            eprintln!("Invalid generation count {:?}: {}", arg, e);
            std::process::exit(1);
        });
    }

    if let Err(e) = config.validate() {
        eprintln!("Invalid config: {}", e);
        std::process::exit(1);
    }

    let result = match config.word_bits {
        WordBits::W8 => run::<u8>(&config),
        WordBits::W16 => run::<u16>(&config),
        WordBits::W32 => run::<u32>(&config),
        WordBits::W64 => run::<u64>(&config),
        WordBits::W128 => run::<u128>(&config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run<W: Word>(config: &AutomatonConfig) -> Result<(), Box<dyn Error>> {
    let rule = config.rule()?;
    let generations = config.generations;
    let seed: Row<W> = config.seed.generate()?;
    let final_len = grown_length(seed.len(), generations)?;

    eprintln!("Elementary Cellular Automaton");
    eprintln!("=============================");
    eprintln!("{} ({:?} stepper, {}-bit words)", rule, config.stepper, W::BITS);
    eprintln!("Generations: {}", generations);
    eprintln!("Length: {} -> {}", seed.len(), final_len);
    eprintln!();

    let mut recorder = match &config.history {
        Some(history) => Some(HistoryRecorder::<W>::create(
            &history.path,
            rule,
            0,
            RecorderConfig {
                compression: history.compression,
                frame_skip: history.frame_skip,
                max_frames: history.max_frames,
            },
        )?),
        None => None,
    };

    let render = &config.render;
    if render.print_rows {
        print_row(&seed, final_len, render);
    }
    if let Some(recorder) = recorder.as_mut() {
        recorder.record(&seed)?;
    }

    let mut automaton = Automaton::from_row(seed).with_stepper(config.stepper);
    let mut record_error = None;

    let start = Instant::now();
    automaton.advance_with(rule, generations, |_, row| {
        if render.print_rows {
            print_row(row, final_len, render);
        }
        if record_error.is_some() {
            return;
        }
        if let Some(recorder) = recorder.as_mut() {
            if let Err(e) = recorder.record(row) {
                record_error = Some(e);
            }
        }
    })?;
    let elapsed = start.elapsed();

    if let Some(e) = record_error {
        return Err(e.into());
    }

    if !render.print_rows {
        print_row(automaton.row(), final_len, render);
    }

    let stats = automaton.stats();
    eprintln!();
    eprintln!("Final generation {}:", stats.generation);
    eprintln!("  Length: {} ({} words)", stats.length, stats.words);
    eprintln!("  Population: {} (density {:.4})", stats.population, stats.density);

    if let Some(recorder) = recorder {
        let history_stats = recorder.finalize()?;
        if let Some(history) = &config.history {
            eprintln!("  History: {} -> {}", history.path.display(), history_stats);
        }
    }

    eprintln!(
        "Time: {:.3}s ({:.1} generations/s)",
        elapsed.as_secs_f32(),
        generations as f32 / elapsed.as_secs_f32().max(f32::EPSILON)
    );
    Ok(())
}

fn print_row<W: Word>(row: &Row<W>, final_len: usize, render: &RenderConfig) {
    let cells = row.render(render.alive, render.dead);
    if render.centered {
        let pad = (final_len - row.len()) / 2;
        let margin: String = std::iter::repeat_n(render.dead, pad).collect();
        println!("{}{}{}", margin, cells, margin);
    } else {
        println!("{}", cells);
    }
}

fn print_example_config() {
    let config = AutomatonConfig::default();

    match serde_json::to_string_pretty(&config) {
        Ok(json) => {
            println!("Example configuration (config.json):");
            println!("{}", json);
        }
        Err(e) => {
            eprintln!("Error serializing example config: {}", e);
            std::process::exit(1);
        }
    }
}
