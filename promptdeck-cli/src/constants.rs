/// Application name used for the configuration file.
pub const PROMPTDECK_CLI: &str = "promptdeck";
