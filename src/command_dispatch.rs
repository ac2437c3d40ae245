//! Purpose: Hold top-level CLI command dispatch for `benchsort`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Each command builds its config once and emits one JSON report on success.

use super::*;

pub(super) fn dispatch_command(command: Command) -> Result<RunOutcome, Error> {
    match command {
        Command::Gen(args) => {
            let dir = resolve_dir(args.dir)?;
            let config = GenConfig::new(dir, args.key_size, args.val_size, args.scale, args.seed)?;
            let store = DataStore::new(&config.dir);

            let start = Instant::now();
            let summary = store.write_generated(&config)?;
            let elapsed = elapsed_ms(start);

            emit_json(json!({
                "gen": {
                    "path": summary.path.display().to_string(),
                    "rows": summary.rows,
                    "key_size": config.layout.key_size,
                    "val_size": config.layout.val_size,
                    "bytes": summary.bytes,
                    "seed": config.seed,
                    "elapsed_ms": elapsed,
                }
            }));
            Ok(RunOutcome::ok())
        }
        Command::Run(args) => {
            let dir = resolve_dir(args.dir)?;
            let config = RunConfig::new(dir, args.buf_size, args.input_ratio, args.output_ratio)?;
            let store = DataStore::new(&config.dir);

            let start = Instant::now();
            let loaded = store.read()?;
            let elapsed = elapsed_ms(start);
            let rows_per_sec = if elapsed > 0.0 {
                loaded.rows.len() as f64 / (elapsed / 1000.0)
            } else {
                0.0
            };

            emit_json(json!({
                "run": {
                    "path": store.path().display().to_string(),
                    "rows": loaded.rows.len(),
                    "key_size": loaded.layout.key_size,
                    "val_size": loaded.layout.val_size,
                    "elapsed_ms": elapsed,
                    "rows_per_sec": rows_per_sec,
                    "params": {
                        "buf_size": config.buf_size,
                        "input_ratio": config.input_ratio,
                        "output_ratio": config.output_ratio,
                    },
                }
            }));
            Ok(RunOutcome::ok())
        }
    }
}
