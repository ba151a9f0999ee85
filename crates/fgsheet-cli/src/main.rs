// SPDX-License-Identifier: AGPL-3.0-or-later
use anyhow::Context;
use clap::Parser;
use fgsheet_cli::{convert_file, dump_json, print_sheet, write_sheet, Arguments, Configuration};
use tracing::debug;

fn main() -> anyhow::Result<()> {
    let arguments = Arguments::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fgsheet=info,fgsheet_cli=info,fgsheet_core=warn".into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = match &arguments.config_file {
        Some(path) => Configuration::load(path)?,
        None => Configuration::default(),
    }
    .with_arguments(&arguments);
    debug!(?config, "configuration loaded");

    if arguments.json {
        let json = dump_json(&arguments.input, arguments.max_size, &config)?;
        println!("{json}");
        return Ok(());
    }

    if arguments.stdout {
        let mut stdout = std::io::stdout().lock();
        print_sheet(&arguments.input, arguments.max_size, &config, &mut stdout)
            .context("Failed to write sheet to stdout")?;
        return Ok(());
    }

    let conversion = convert_file(&arguments.input, arguments.max_size, &config)?;
    let path = write_sheet(&conversion, arguments.output.as_deref())?;
    eprintln!("Wrote {}", path.display());
    Ok(())
}
