//! Terminal presentation for the `cauldron` binary.
//!
//! Commands print one status line per change they publish (`[OK] Add
//! react-native@0.40.0 native dependency to MyApp:ios:1.0.0`) and show a
//! spinner while the working copy syncs with the remote Cauldron. Both are
//! decorated only when the terminal can show them: emojis replace the
//! bracketed markers and the spinner is drawn, otherwise the output stays
//! plain so it can be piped or asserted on in scripts.
//!
//! `--color=always|never|auto` picks the mode. In `auto`, `NO_COLOR`,
//! `CLICOLOR=0` and `TERM=dumb` turn decoration off, `CLICOLOR_FORCE=1`
//! turns it on, and a non-TTY stdout turns it off.

use std::env;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// How the CLI decorates its status lines.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Print emojis and draw sync spinners.
    pub use_color: bool,
}

impl OutputConfig {
    /// Resolve the `--color` flag against the environment.
    ///
    /// Unknown flag values behave like `auto`.
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    fn detect_color_support() -> bool {
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }

        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }

        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }

        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }

        console::Term::stdout().features().colors_supported()
    }

    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Returns the emoji when colors are enabled, the plain text otherwise.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}

/// A spinner showing `message`, hidden when colors are disabled.
///
/// Finish it with `finish_and_clear` once the operation completes.
pub fn spinner(config: &OutputConfig, message: impl Into<String>) -> ProgressBar {
    if !config.use_color {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(message.into());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}
