#[macro_use]
extern crate tracing;

use clap::Parser;
use drc_viewer::StartupArgs;
use std::ffi::OsString;

/// Viewer for Draco (.drc) and binary glTF (.glb) models
#[derive(Parser)]
#[command(name = "drc-viewer", version, about)]
struct Cli {
    /// Initial window width
    #[arg(long, default_value_t = StartupArgs::default().width)]
    width: u32,

    /// Initial window height
    #[arg(long, default_value_t = StartupArgs::default().height)]
    height: u32,

    /// Log filter directive, used when RUST_LOG is unset
    #[arg(long)]
    log_level: Option<String>,

    /// Model to open; the first existing .drc or .glb file is used and
    /// unknown `--` flags are skipped
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<OsString>,
}

fn main() {
    let cli = Cli::parse();

    drc_viewer::init_logging(cli.log_level.as_deref());

    debug!("Command line arguments: {:?}", &cli.args);

    let file = drc_viewer::startup::resolve_model_path(&cli.args);
    if file.is_none() {
        info!("No model given, starting empty");
    }

    drc_viewer::run(StartupArgs {
        file,
        width: cli.width,
        height: cli.height,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn known_options_are_parsed() {
        let cli = Cli::try_parse_from(["drc-viewer", "--width", "640", "model.glb"]).unwrap();
        assert_eq!(cli.width, 640);
        assert_eq!(cli.height, StartupArgs::default().height);
        assert_eq!(cli.args, vec![OsString::from("model.glb")]);
    }
}
