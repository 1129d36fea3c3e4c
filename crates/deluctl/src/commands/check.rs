//! The `check` command: connectivity and authentication diagnostic.

use deluctl_core::{SpeedToggle, ToggleConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

pub async fn handle(config: ToggleConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let toggle = SpeedToggle::new(config);
    let report = toggle.check_connection().await?;

    let rendered = output::render_single(
        global.output,
        &report,
        |r| r.to_string(),
        |r| r.endpoint.clone(),
    );
    output::print_output(&rendered, global.quiet);
    Ok(())
}
