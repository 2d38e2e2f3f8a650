use clap::Parser;
use clearmarkup_config::config::Config;
use clearmarkup_db::{Result, SqliteDatabase};
use cli::Args;
use logging::setup_logging;
use tracing::debug;
use utils::COLOR;

mod cli;
mod commands;
mod logging;
mod utils;

fn handle_cli() -> Result<()> {
    let args = Args::parse();

    setup_logging(&args);

    if args.no_color {
        if let Ok(mut color) = COLOR.write() {
            *color = false;
        }
    }

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(database) = args.database {
        config.db.database = Some(database);
    }

    let db = SqliteDatabase::from_config(&config.db)?;
    commands::run(&db, args.command, args.json)?;

    if config.debug() {
        for query in db.log() {
            debug!("{}", query);
        }
    }

    Ok(())
}

fn main() {
    // Install miette's fancy error handler for beautiful error output
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))
    .ok();

    if let Err(err) = handle_cli() {
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(1);
    }
}
