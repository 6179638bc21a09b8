// UI helpers: how response bodies are shown and the spinner displayed
// while a request is in flight. The spinner draws on stderr, so stdout
// stays clean for piping the JSON somewhere else.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Turn a raw response body into printable text. JSON bodies are
/// pretty-printed unless `raw` is set; anything else is shown as-is.
/// Key order and number text survive the round trip (serde_json is built
/// with `preserve_order` and `arbitrary_precision`).
pub fn render_body(body: &[u8], raw: bool) -> String {
    if body.is_empty() {
        return String::new();
    }
    if !raw {
        if let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) {
            if let Ok(pretty) = serde_json::to_string_pretty(&value) {
                return pretty;
            }
        }
    }
    String::from_utf8_lossy(body).into_owned()
}

/// Run `f` with a spinner showing `msg`. indicatif hides the spinner when
/// stderr is not a terminal.
pub fn with_spinner<T>(msg: &'static str, f: impl FnOnce() -> T) -> T {
    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(style);
    spinner.set_message(msg);
    spinner.enable_steady_tick(Duration::from_millis(100));
    let out = f();
    spinner.finish_and_clear();
    out
}
