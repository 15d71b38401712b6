//! Command-line argument parsing.

use clap::Parser;

use crate::params::RenderConfig;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "groundcam")]
#[command(about = "UAV downward-camera ground-patch simulator", long_about = None)]
pub struct Args {
    /// Window title
    #[arg(long, value_name = "TITLE", default_value = "groundcam - pixel to geo coordinate mapping")]
    pub title: String,

    /// Initial window width (pixels)
    #[arg(long, value_name = "PIXELS", default_value = "1280")]
    pub width: u32,

    /// Initial window height (pixels)
    #[arg(long, value_name = "PIXELS", default_value = "720")]
    pub height: u32,
}

impl Args {
    /// Render configuration with the window overrides applied
    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            window_width: self.width,
            window_height: self.height,
            ..RenderConfig::default()
        }
    }
}
