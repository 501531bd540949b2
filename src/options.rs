use clap::Parser;

use crate::commands::DownloadIconsOptions;

#[derive(Debug, Parser)]
#[clap(about = env!("CARGO_PKG_DESCRIPTION"))]
pub struct Options {
    #[command(flatten)]
    pub global: Global,

    #[command(flatten)]
    pub download: DownloadIconsOptions,
}

#[derive(Debug, Parser)]
pub struct Global {
    /// Sets verbosity level. Can be specified multiple times to increase the verbosity
    /// of this program.
    #[clap(long = "verbose", short, global(true), action(clap::ArgAction::Count))]
    pub verbosity: u8,
}
