mod download_icons;

pub use download_icons::*;
